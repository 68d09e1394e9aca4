//! Integration tests for configuration and domain validation.
//!
//! These tests verify the configuration system end to end, from raw
//! environment-style values to a shared, validated `AppConfig`.

use std::collections::HashMap;

use shopify_app_auth::{
    ApiKey, ApiSecretKey, AppConfig, AuthScopes, CallbackUrl, ConfigError, DomainValidator,
    SessionSecret,
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_full_workflow_create_newtypes_build_config_access_fields() {
    // Create validated newtypes
    let api_key = ApiKey::new("test-api-key").unwrap();
    let api_secret = ApiSecretKey::new("test-api-secret").unwrap();
    let scopes: AuthScopes = "read_products, write_orders".parse().unwrap();
    let callback = CallbackUrl::new("https://myapp.example.com/auth/callback").unwrap();

    // Build configuration
    let config = AppConfig::builder()
        .api_key(api_key)
        .api_secret_key(api_secret)
        .session_secret(SessionSecret::new("session-secret").unwrap())
        .scopes(scopes)
        .callback_url(callback)
        .state_ttl(chrono::Duration::minutes(5))
        .build()
        .unwrap();

    // Access fields and verify
    assert_eq!(config.api_key().as_ref(), "test-api-key");
    assert_eq!(config.callback_url().host_name(), "myapp.example.com");
    assert_eq!(config.state_ttl(), chrono::Duration::minutes(5));
    assert_eq!(config.session_ttl(), chrono::Duration::minutes(15));
    assert!(!config.session_secret_is_fallback());

    // Requested scopes are sent exactly as configured; implied scopes still count
    assert_eq!(config.scopes().to_string(), "read_products,write_orders");
    let read_orders: AuthScopes = "read_orders".parse().unwrap();
    assert!(config.scopes().covers(&read_orders));
}

#[test]
fn test_from_lookup_with_custom_domain_suffix() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("SHOPIFY_API_KEY", "key"),
        ("SHOPIFY_API_SECRET", "secret"),
        ("OAUTH_CALLBACK_URL", "http://localhost:8080/auth/callback"),
        ("SHOPIFY_DOMAIN_SUFFIX", "myshopify.test"),
    ]))
    .unwrap();

    let validator = config.domain_validator();
    assert_eq!(validator.suffix(), "myshopify.test");
    assert!(validator.parse("acme.myshopify.test").is_ok());
    assert!(validator.parse("acme.myshopify.com").is_err());

    // The session secret falls back to the API secret when unset
    assert!(config.session_secret_is_fallback());
    assert_eq!(config.session_secret().as_ref(), "secret");
}

#[test]
fn test_domain_validation_is_idempotent() {
    let validator = DomainValidator::default();

    for raw in [
        "acme.myshopify.com",
        "  ACME.MyShopify.com ",
        "shop-1.myshopify.com",
        "0store.myshopify.com",
    ] {
        let (normalized, valid) = validator.normalize_and_validate(raw);
        assert!(valid, "{raw:?} should be valid");
        assert_eq!(
            validator.normalize_and_validate(&normalized),
            (normalized.clone(), true)
        );
    }

    for raw in [
        "",
        "   ",
        "acme",
        "acme.example.com",
        "-acme.myshopify.com",
        "ac_me.myshopify.com",
        "myshopify.com",
        "acme.myshopify.com.evil.com",
    ] {
        let (_, valid) = validator.normalize_and_validate(raw);
        assert!(!valid, "{raw:?} should be rejected");
    }
}

#[test]
fn test_error_handling_invalid_inputs_produce_correct_errors() {
    // Empty API key
    let result = ApiKey::new("");
    assert!(matches!(result, Err(ConfigError::EmptyApiKey)));

    // Empty API secret key
    let result = ApiSecretKey::new("");
    assert!(matches!(result, Err(ConfigError::EmptyApiSecretKey)));

    // Invalid shop domain
    let result = DomainValidator::default().parse("invalid domain with spaces");
    assert!(matches!(result, Err(ConfigError::InvalidShopDomain { .. })));

    // Invalid callback URL
    let result = CallbackUrl::new("not-a-valid-url");
    assert!(matches!(result, Err(ConfigError::InvalidCallbackUrl { .. })));

    // Invalid scopes
    let result: Result<AuthScopes, _> = "read products!".parse();
    assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));

    // Missing required fields in builder
    let result = AppConfig::builder()
        .api_key(ApiKey::new("key").unwrap())
        .build();
    assert!(matches!(
        result,
        Err(ConfigError::MissingRequiredField {
            field: "api_secret_key"
        })
    ));
}

#[test]
fn test_config_can_be_cloned_and_shared() {
    let config = AppConfig::builder()
        .api_key(ApiKey::new("key").unwrap())
        .api_secret_key(ApiSecretKey::new("secret").unwrap())
        .callback_url(CallbackUrl::new("https://app.example.com/auth/callback").unwrap())
        .build()
        .unwrap();

    // Clone the config
    let config_clone = config.clone();

    // Both should have the same values
    assert_eq!(config.api_key().as_ref(), config_clone.api_key().as_ref());
    assert_eq!(config.scopes(), config_clone.scopes());

    // Verify Send + Sync by moving to thread (compile-time check)
    let handle = std::thread::spawn(move || {
        let _ = config_clone.api_key().as_ref();
    });
    handle.join().unwrap();
}
