//! HMAC validation of platform-originated requests.
//!
//! The platform signs the query string of every request it redirects to the
//! app. To verify it:
//!
//! 1. Drop the `hmac` parameter and the legacy `signature` parameter.
//! 2. Escape each remaining name and value: `%` becomes `%25` and `&`
//!    becomes `%26`; in names `=` additionally becomes `%3D`.
//! 3. Sort the pairs by name, byte-lexicographically (pairs sharing a name
//!    keep their arrival order).
//! 4. Join them as `name=value` with `&`.
//! 5. Compute HMAC-SHA256 over that string with the app's shared secret and
//!    compare it, in constant time, to the hex-decoded `hmac` parameter.
//!
//! # Security
//!
//! All comparisons are constant-time. Neither the secret nor the computed
//! digest is ever logged or embedded in an error.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::hmac::{sign_params, validate};
//! use shopify_app_auth::auth::oauth::QueryParams;
//!
//! let mut params = QueryParams::new()
//!     .with("shop", "acme.myshopify.com")
//!     .with("timestamp", "1700000000");
//! let signature = sign_params(&params, "my-secret");
//! params.push("hmac", signature);
//!
//! assert!(validate(&params, "my-secret").is_ok());
//! assert!(validate(&params, "other-secret").is_err());
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::hex;
use crate::auth::oauth::QueryParams;
use crate::auth::HmacError;
use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Name of the platform's signature parameter.
pub const SIGNATURE_PARAM: &str = "hmac";

/// Name of the legacy signature parameter, also excluded from signing input.
pub const LEGACY_SIGNATURE_PARAM: &str = "signature";

/// Computes the raw HMAC-SHA256 of `message`.
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub(crate) fn mac_bytes(message: &[u8], secret: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Computes an HMAC-SHA256 signature as lowercase hex.
///
/// ```rust
/// use shopify_app_auth::auth::oauth::hmac::compute_signature;
///
/// assert_eq!(
///     compute_signature("message", "key"),
///     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
/// );
/// ```
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(mac_bytes(message.as_bytes(), secret.as_bytes()))
}

/// Performs constant-time comparison of two byte strings.
#[must_use]
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Builds the canonical signing input for `params`.
#[must_use]
pub fn canonical_message(params: &QueryParams) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .filter(|(name, _)| *name != SIGNATURE_PARAM && *name != LEGACY_SIGNATURE_PARAM)
        .map(|(name, value)| (escape_name(name), escape_value(value)))
        .collect();

    // Stable, so repeated names keep their arrival order.
    pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn escape_value(value: &str) -> String {
    value.replace('%', "%25").replace('&', "%26")
}

fn escape_name(name: &str) -> String {
    escape_value(name).replace('=', "%3D")
}

/// Signs `params` the way the platform does, returning the hex signature.
///
/// Any existing `hmac`/`signature` parameters are ignored. Useful for tests
/// and for simulating platform redirects.
#[must_use]
pub fn sign_params(params: &QueryParams, secret: &str) -> String {
    compute_signature(&canonical_message(params), secret)
}

/// Validates the `hmac` parameter of `params` against `secret`.
///
/// # Errors
///
/// - [`HmacError::MissingSignature`] if no non-empty `hmac` parameter is present
/// - [`HmacError::MalformedSignature`] if it is not valid hex
/// - [`HmacError::SignatureMismatch`] if it does not match
pub fn validate(params: &QueryParams, secret: &str) -> Result<(), HmacError> {
    validate_any(params, &[secret])
}

/// Validates `params` against the configured API secret, falling back to the
/// previous secret during key rotation.
///
/// # Errors
///
/// Same as [`validate`].
pub fn validate_with_rotation(params: &QueryParams, config: &AppConfig) -> Result<(), HmacError> {
    let primary = config.api_secret_key().as_ref();
    match config.old_api_secret_key() {
        Some(old) => validate_any(params, &[primary, old.as_ref()]),
        None => validate_any(params, &[primary]),
    }
}

fn validate_any(params: &QueryParams, secrets: &[&str]) -> Result<(), HmacError> {
    let received = params
        .get_non_empty(SIGNATURE_PARAM)
        .ok_or(HmacError::MissingSignature)?;
    let received = hex::decode(received).ok_or(HmacError::MalformedSignature)?;

    let message = canonical_message(params);
    let matched = secrets.iter().any(|secret| {
        let expected = mac_bytes(message.as_bytes(), secret.as_bytes());
        constant_time_compare(&expected, &received)
    });

    if matched {
        Ok(())
    } else {
        Err(HmacError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, CallbackUrl};

    fn callback_params() -> QueryParams {
        QueryParams::new()
            .with("shop", "test-store.myshopify.com")
            .with("code", "abc")
            .with("state", "nonce")
            .with("timestamp", "1700000000")
    }

    fn signed(params: QueryParams, secret: &str) -> QueryParams {
        let signature = sign_params(&params, secret);
        params.with(SIGNATURE_PARAM, signature)
    }

    fn config(primary: &str, old: Option<&str>) -> AppConfig {
        let mut builder = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new(primary).unwrap())
            .callback_url(CallbackUrl::new("https://app.example.com/auth/callback").unwrap());
        if let Some(old) = old {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_compute_signature_matches_known_value() {
        // HMAC-SHA256("message", "key")
        assert_eq!(
            compute_signature("message", "key"),
            "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
        );
    }

    #[test]
    fn test_canonical_message_sorts_and_excludes_signatures() {
        let params = QueryParams::new()
            .with("timestamp", "1")
            .with("hmac", "ignored")
            .with("shop", "a.myshopify.com")
            .with("signature", "ignored")
            .with("code", "c");
        assert_eq!(
            canonical_message(&params),
            "code=c&shop=a.myshopify.com&timestamp=1"
        );
    }

    #[test]
    fn test_canonical_message_escapes_reserved_characters() {
        let params = QueryParams::new()
            .with("a=b", "x&y")
            .with("pct", "100%")
            .with("plain", "c=d");
        assert_eq!(
            canonical_message(&params),
            "a%3Db=x%26y&pct=100%25&plain=c=d"
        );
    }

    #[test]
    fn test_canonical_message_keeps_order_of_repeated_names() {
        let params = QueryParams::new()
            .with("ids", "2")
            .with("a", "0")
            .with("ids", "1");
        assert_eq!(canonical_message(&params), "a=0&ids=2&ids=1");
    }

    #[test]
    fn test_validate_round_trip() {
        let params = signed(callback_params(), "test_secret");
        assert_eq!(validate(&params, "test_secret"), Ok(()));
    }

    #[test]
    fn test_validate_accepts_uppercase_hex() {
        let mut params = callback_params();
        let signature = sign_params(&params, "test_secret").to_uppercase();
        params.push(SIGNATURE_PARAM, signature);
        assert_eq!(validate(&params, "test_secret"), Ok(()));
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let params = signed(callback_params(), "test_secret");
        assert_eq!(
            validate(&params, "other_secret"),
            Err(HmacError::SignatureMismatch)
        );
    }

    #[test]
    fn test_validate_rejects_any_tampered_value() {
        let params = signed(callback_params(), "test_secret");
        for name in ["shop", "code", "state", "timestamp"] {
            let mut tampered = params.clone();
            tampered.set(name, "evil");
            assert_eq!(
                validate(&tampered, "test_secret"),
                Err(HmacError::SignatureMismatch),
                "tampering with '{name}' must be detected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_added_parameter() {
        let params = signed(callback_params(), "test_secret").with("extra", "1");
        assert_eq!(
            validate(&params, "test_secret"),
            Err(HmacError::SignatureMismatch)
        );
    }

    #[test]
    fn test_validate_ignores_legacy_signature_param() {
        let params = signed(callback_params(), "test_secret").with("signature", "whatever");
        assert_eq!(validate(&params, "test_secret"), Ok(()));
    }

    #[test]
    fn test_validate_missing_signature() {
        assert_eq!(
            validate(&callback_params(), "s"),
            Err(HmacError::MissingSignature)
        );
        let empty = callback_params().with(SIGNATURE_PARAM, "");
        assert_eq!(validate(&empty, "s"), Err(HmacError::MissingSignature));
    }

    #[test]
    fn test_validate_malformed_signature() {
        let params = callback_params().with(SIGNATURE_PARAM, "not-hex!");
        assert_eq!(validate(&params, "s"), Err(HmacError::MalformedSignature));
    }

    #[test]
    fn test_validate_short_hex_is_mismatch() {
        let params = callback_params().with(SIGNATURE_PARAM, "abcd");
        assert_eq!(validate(&params, "s"), Err(HmacError::SignatureMismatch));
    }

    #[test]
    fn test_rotation_falls_back_to_old_secret() {
        let params = signed(callback_params(), "old-secret");
        assert!(validate_with_rotation(&params, &config("new-secret", Some("old-secret"))).is_ok());
        assert_eq!(
            validate_with_rotation(&params, &config("new-secret", None)),
            Err(HmacError::SignatureMismatch)
        );
    }

    #[test]
    fn test_rotation_prefers_primary_secret() {
        let params = signed(callback_params(), "new-secret");
        assert!(validate_with_rotation(&params, &config("new-secret", Some("old-secret"))).is_ok());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
