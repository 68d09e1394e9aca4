//! Configuration and validation errors.
//!
//! Every configuration constructor validates its input and returns
//! `Result<T, ConfigError>`, so a misconfigured process fails at startup
//! rather than on the first install. Messages name the offending setting and
//! never include secret values.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// A configuration value, or an untrusted value parsed with configuration
/// rules (such as a shop domain), was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API key (client id) is empty.
    #[error("API key is empty; set it to the app's client id")]
    EmptyApiKey,

    /// The API secret key is empty.
    #[error("API secret key is empty; set it to the app's client secret")]
    EmptyApiSecretKey,

    /// An explicitly provided session secret is empty.
    #[error("session secret is empty; unset it to fall back to the API secret key")]
    EmptySessionSecret,

    /// A shop domain does not match `label(.label)*.{suffix}`.
    #[error("invalid shop domain '{domain}', expected '<shop>.{suffix}'")]
    InvalidShopDomain {
        /// The normalized domain that was rejected.
        domain: String,
        /// The platform suffix the domain must end with.
        suffix: String,
    },

    /// The platform domain suffix is not a dotted host name.
    #[error("invalid platform domain suffix '{suffix}', expected a host name such as 'myshopify.com'")]
    InvalidDomainSuffix {
        /// The suffix that was provided.
        suffix: String,
    },

    /// A scope list could not be parsed.
    #[error("invalid scopes: {reason}")]
    InvalidScopes {
        /// What was wrong with the list.
        reason: String,
    },

    /// A required setting was never provided.
    #[error("required setting '{field}' is not set")]
    MissingRequiredField {
        /// The builder field or environment variable.
        field: &'static str,
    },

    /// The OAuth callback URL is not absolute.
    #[error("invalid callback URL '{url}', expected an absolute URL such as 'https://myapp.example.com/auth/callback'")]
    InvalidCallbackUrl {
        /// The rejected value.
        url: String,
    },

    /// A duration setting is out of range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidDuration {
        /// The setting that was rejected.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_setting() {
        let missing = ConfigError::MissingRequiredField {
            field: "OAUTH_CALLBACK_URL",
        };
        assert_eq!(
            missing.to_string(),
            "required setting 'OAUTH_CALLBACK_URL' is not set"
        );

        let ttl = ConfigError::InvalidDuration {
            field: "state_ttl",
            reason: "must be positive, got 0s".to_string(),
        };
        assert_eq!(
            ttl.to_string(),
            "invalid value for 'state_ttl': must be positive, got 0s"
        );
    }

    #[test]
    fn test_invalid_shop_domain_mentions_suffix() {
        let error = ConfigError::InvalidShopDomain {
            domain: "acme.example.com".to_string(),
            suffix: "myshopify.test".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid shop domain 'acme.example.com', expected '<shop>.myshopify.test'"
        );
    }

    #[test]
    fn test_is_std_error_and_send_sync() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&ConfigError::EmptySessionSecret);
    }
}
