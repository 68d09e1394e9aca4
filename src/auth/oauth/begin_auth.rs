//! OAuth authorization URL generation.
//!
//! The install flow starts by sending the merchant to the platform's
//! authorization endpoint on their shop:
//!
//! ```text
//! https://{shop}/admin/oauth/authorize?client_id=..&scope=..&redirect_uri=..&state=..
//! ```
//!
//! The `state` value must already be persisted through
//! [`NonceStore::create`](crate::auth::oauth::NonceStore::create) so the
//! callback can redeem it.

use crate::auth::oauth::state::StateParam;
use crate::config::{AppConfig, ShopDomain};

/// Path of the platform's authorization endpoint on a shop domain.
pub const AUTHORIZE_PATH: &str = "/admin/oauth/authorize";

/// Builds the authorization URL for `shop` carrying `state`.
///
/// Client id, requested scopes and redirect URI come from `config`. Keys and
/// values are percent-encoded.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::auth::oauth::{authorize_url, StateParam};
/// use shopify_app_auth::{ApiKey, ApiSecretKey, AppConfig, CallbackUrl, DomainValidator};
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .callback_url(CallbackUrl::new("https://app.example.com/auth/callback").unwrap())
///     .build()
///     .unwrap();
/// let shop = DomainValidator::default().parse("acme.myshopify.com").unwrap();
/// let state = StateParam::from_raw("nonce123");
///
/// let url = authorize_url(&config, &shop, &state);
/// assert!(url.starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
/// assert!(url.contains("client_id=api-key"));
/// assert!(url.contains("scope=read_products"));
/// assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"));
/// assert!(url.ends_with("state=nonce123"));
/// ```
#[must_use]
pub fn authorize_url(config: &AppConfig, shop: &ShopDomain, state: &StateParam) -> String {
    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", config.callback_url().as_ref().to_string()),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("https://{}{AUTHORIZE_PATH}?{query_string}", shop.as_ref())
}
