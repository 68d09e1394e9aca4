//! OAuth `state` nonce generation.
//!
//! The state parameter proves that a callback corresponds to a Login this
//! app initiated. Each nonce carries 24 bytes from a cryptographically
//! secure RNG, encoded as unpadded base64url so it can travel in a query
//! string without escaping.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::StateParam;
//!
//! let state = StateParam::new();
//! assert_eq!(state.as_ref().len(), 32);
//! assert!(state
//!     .as_ref()
//!     .chars()
//!     .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
//! ```

use base64::prelude::*;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// A single-use OAuth state nonce.
#[derive(Clone, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    /// Number of random bytes drawn per nonce.
    pub const ENTROPY_BYTES: usize = 24;

    /// Generates a fresh nonce from the operating system's CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            value: BASE64_URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Wraps a state value received from the platform.
    ///
    /// No validation is performed; an unknown value simply fails to consume.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// Nonces are bearer material until consumed; keep them out of logs.
impl fmt::Debug for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateParam(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_encodes_24_bytes_url_safe() {
        let state = StateParam::new();
        let decoded = BASE64_URL_SAFE_NO_PAD.decode(state.as_ref()).unwrap();
        assert_eq!(decoded.len(), StateParam::ENTROPY_BYTES);
        assert!(!state.as_ref().contains(['+', '/', '=']));
    }

    #[test]
    fn test_new_generates_unique_values() {
        let values: HashSet<String> = (0..256).map(|_| StateParam::new().to_string()).collect();
        assert_eq!(values.len(), 256);
    }

    #[test]
    fn test_from_raw_preserves_value() {
        let state = StateParam::from_raw("abc-123");
        assert_eq!(state.as_ref(), "abc-123");
        assert_eq!(state.to_string(), "abc-123");
    }

    #[test]
    fn test_debug_is_masked() {
        let state = StateParam::from_raw("visible-nonce");
        assert_eq!(format!("{state:?}"), "StateParam(*****)");
    }
}
