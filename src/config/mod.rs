//! Configuration for the install/auth flow.
//!
//! The main types in this module are:
//!
//! - [`AppConfig`]: immutable settings handed to [`AuthFlow`](crate::AuthFlow) at construction
//! - [`AppConfigBuilder`]: a builder for constructing [`AppConfig`] instances
//! - [`ApiKey`], [`ApiSecretKey`], [`SessionSecret`]: validated credential newtypes
//! - [`CallbackUrl`]: the OAuth `redirect_uri`
//! - [`DomainValidator`] and [`ShopDomain`]: tenant domain validation
//!
//! Nothing in the core reads the process environment. [`AppConfig::from_env`]
//! exists for the binary that wires the flow up, and is the only place
//! environment variables are consulted.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, CallbackUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .callback_url(CallbackUrl::new("https://myapp.example.com/auth/callback").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.scopes().to_string(), "read_products");
//! assert_eq!(config.session_ttl().num_seconds(), 900);
//! ```

mod domain;
mod newtypes;

pub use domain::{DomainValidator, ShopDomain, DEFAULT_DOMAIN_SUFFIX};
pub use newtypes::{ApiKey, ApiSecretKey, CallbackUrl, SessionSecret};

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use chrono::{DateTime, Duration, Utc};

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &str = "read_products";

/// Upper bound, in days, for `state_ttl` and `session_ttl`.
pub const MAX_TTL_DAYS: i64 = 365;

/// Returns `now + ttl`, saturating at the bounds of `DateTime<Utc>`.
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(if ttl < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Environment variables read by [`AppConfig::from_env`].
pub mod env {
    /// Client id of the app.
    pub const API_KEY: &str = "SHOPIFY_API_KEY";
    /// Shared secret used for request signatures and token exchange.
    pub const API_SECRET: &str = "SHOPIFY_API_SECRET";
    /// Previous shared secret, accepted for signatures during key rotation.
    pub const API_SECRET_OLD: &str = "SHOPIFY_API_SECRET_OLD";
    /// Dedicated session signing key.
    pub const SESSION_SECRET: &str = "APP_SESSION_SECRET";
    /// Comma-separated scopes to request.
    pub const SCOPES: &str = "SHOPIFY_SCOPES";
    /// Absolute OAuth callback URL.
    pub const CALLBACK_URL: &str = "OAUTH_CALLBACK_URL";
    /// Platform domain suffix, e.g. `myshopify.com`.
    pub const DOMAIN_SUFFIX: &str = "SHOPIFY_DOMAIN_SUFFIX";
}

/// Settings for the install/auth flow.
///
/// `AppConfig` is `Clone`, `Send`, and `Sync`. Its `Debug` output never
/// contains secret values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    session_secret: SessionSecret,
    session_secret_is_fallback: bool,
    scopes: AuthScopes,
    callback_url: CallbackUrl,
    domain_validator: DomainValidator,
    state_ttl: Duration,
    session_ttl: Duration,
    token_exchange_timeout: std::time::Duration,
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads configuration from the process environment.
    ///
    /// See [`env`] for the variable names. Empty variables are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required key is missing or a value
    /// fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder()
            .api_key(ApiKey::new(get(env::API_KEY).ok_or(
                ConfigError::MissingRequiredField {
                    field: env::API_KEY,
                },
            )?)?)
            .api_secret_key(ApiSecretKey::new(get(env::API_SECRET).ok_or(
                ConfigError::MissingRequiredField {
                    field: env::API_SECRET,
                },
            )?)?)
            .callback_url(CallbackUrl::new(get(env::CALLBACK_URL).ok_or(
                ConfigError::MissingRequiredField {
                    field: env::CALLBACK_URL,
                },
            )?)?);

        if let Some(old) = get(env::API_SECRET_OLD) {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(secret) = get(env::SESSION_SECRET) {
            builder = builder.session_secret(SessionSecret::new(secret)?);
        }
        if let Some(scopes) = get(env::SCOPES) {
            builder = builder.scopes(scopes.parse()?);
        }
        if let Some(suffix) = get(env::DOMAIN_SUFFIX) {
            builder = builder.domain_validator(DomainValidator::new(suffix)?);
        }

        builder.build()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous API secret key, if configured for key rotation.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the key used to sign session tokens.
    #[must_use]
    pub const fn session_secret(&self) -> &SessionSecret {
        &self.session_secret
    }

    /// Returns `true` when sessions are signed with the API secret because no
    /// dedicated session secret was configured.
    #[must_use]
    pub const fn session_secret_is_fallback(&self) -> bool {
        self.session_secret_is_fallback
    }

    /// Returns the scopes requested on the authorize redirect.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the OAuth callback URL.
    #[must_use]
    pub const fn callback_url(&self) -> &CallbackUrl {
        &self.callback_url
    }

    /// Returns the tenant domain validator.
    #[must_use]
    pub const fn domain_validator(&self) -> &DomainValidator {
        &self.domain_validator
    }

    /// Returns how long an issued OAuth state nonce stays consumable.
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Returns the lifetime of an issued session token.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Returns the timeout applied to the token exchange request.
    #[must_use]
    pub const fn token_exchange_timeout(&self) -> std::time::Duration {
        self.token_exchange_timeout
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for constructing [`AppConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key` and `callback_url`.
///
/// # Defaults
///
/// - `scopes`: `read_products`
/// - `session_secret`: the API secret key
/// - `domain_validator`: suffix `myshopify.com`
/// - `state_ttl`: 10 minutes
/// - `session_ttl`: 15 minutes
/// - `token_exchange_timeout`: 10 seconds
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    session_secret: Option<SessionSecret>,
    scopes: Option<AuthScopes>,
    callback_url: Option<CallbackUrl>,
    domain_validator: Option<DomainValidator>,
    state_ttl: Option<Duration>,
    session_ttl: Option<Duration>,
    token_exchange_timeout: Option<std::time::Duration>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous API secret key for key rotation support.
    ///
    /// Request signatures are checked against the primary key first, then
    /// against this one, so in-flight installs survive a rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets a dedicated session signing key.
    #[must_use]
    pub fn session_secret(mut self, secret: SessionSecret) -> Self {
        self.session_secret = Some(secret);
        self
    }

    /// Sets the OAuth scopes to request.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the OAuth callback URL (required).
    #[must_use]
    pub fn callback_url(mut self, url: CallbackUrl) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Sets the tenant domain validator.
    #[must_use]
    pub fn domain_validator(mut self, validator: DomainValidator) -> Self {
        self.domain_validator = Some(validator);
        self
    }

    /// Sets how long an OAuth state nonce stays consumable.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Sets the lifetime of issued session tokens.
    #[must_use]
    pub const fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Sets the timeout of the token exchange request.
    #[must_use]
    pub const fn token_exchange_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.token_exchange_timeout = Some(timeout);
        self
    }

    /// Builds the [`AppConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret_key` or `callback_url` are not set, and
    /// [`ConfigError::InvalidDuration`] for lifetimes that are not positive
    /// or exceed [`MAX_TTL_DAYS`].
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let callback_url = self
            .callback_url
            .ok_or(ConfigError::MissingRequiredField {
                field: "callback_url",
            })?;

        let state_ttl = positive("state_ttl", self.state_ttl.unwrap_or(Duration::minutes(10)))?;
        let session_ttl = positive(
            "session_ttl",
            self.session_ttl.unwrap_or(Duration::minutes(15)),
        )?;
        let token_exchange_timeout = self
            .token_exchange_timeout
            .unwrap_or(std::time::Duration::from_secs(10));
        if token_exchange_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "token_exchange_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        let session_secret_is_fallback = self.session_secret.is_none();
        let session_secret = self.session_secret.unwrap_or_else(|| {
            tracing::warn!(
                "No dedicated session secret configured; signing sessions with the API secret key"
            );
            SessionSecret::from_api_secret(&api_secret_key)
        });

        let scopes = match self.scopes {
            Some(scopes) => scopes,
            None => DEFAULT_SCOPES.parse()?,
        };

        Ok(AppConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            session_secret,
            session_secret_is_fallback,
            scopes,
            callback_url,
            domain_validator: self.domain_validator.unwrap_or_default(),
            state_ttl,
            session_ttl,
            token_exchange_timeout,
        })
    }
}

fn positive(field: &'static str, ttl: Duration) -> Result<Duration, ConfigError> {
    if ttl <= Duration::zero() {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: format!("must be positive, got {}s", ttl.num_seconds()),
        });
    }
    if ttl > Duration::days(MAX_TTL_DAYS) {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: format!("must not exceed {MAX_TTL_DAYS} days"),
        });
    }
    Ok(ttl)
}
