//! Credential and URL newtypes.
//!
//! Each type is checked once when constructed. The secret-bearing ones mask
//! their `Debug` output so they can sit inside logged structs.

use crate::error::ConfigError;
use std::fmt;

/// A validated Shopify API key (the OAuth `client_id`).
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key.
///
/// This is the shared secret the platform uses to sign requests it sends to
/// the app, and the `client_secret` of the token exchange.
///
/// # Security
///
/// The `Debug` implementation masks the secret value, displaying only
/// `ApiSecretKey(*****)` instead of the actual key.
///
/// ```rust
/// use shopify_app_auth::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// The key used to sign and verify session tokens.
///
/// Kept distinct from [`ApiSecretKey`] at the type level so the two secrets
/// cannot be swapped by accident. Its `Debug` output is masked.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Creates a new session secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySessionSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySessionSecret);
        }
        Ok(Self(secret))
    }

    /// Derives a session secret from the API secret key.
    ///
    /// This is the degraded default used when no dedicated session secret
    /// is configured.
    #[must_use]
    pub fn from_api_secret(secret: &ApiSecretKey) -> Self {
        Self(secret.as_ref().to_string())
    }
}

impl AsRef<str> for SessionSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(*****)")
    }
}

/// The absolute URL the platform redirects to after the merchant approves
/// the installation (the OAuth `redirect_uri`).
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::CallbackUrl;
///
/// let url = CallbackUrl::new("https://myapp.example.com/auth/callback").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "myapp.example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl CallbackUrl {
    /// Creates a new validated callback URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCallbackUrl`] if the URL has no scheme
    /// or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidCallbackUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start || url[host_start..host_end].contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Returns `true` when the callback is served over TLS.
    ///
    /// Session cookies are marked `Secure` only in that case so local
    /// development over plain HTTP keeps working.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.scheme().eq_ignore_ascii_case("https")
    }
}

impl AsRef<str> for CallbackUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CallbackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
