//! Stateless, self-signed app sessions.
//!
//! After a successful install (or a signed Login for an installed shop) the
//! app hands the browser a session token proving which shop it belongs to.
//! The token is verified without any server-side lookup:
//!
//! ```text
//! base64url(json {"shop": "...", "exp": <unix seconds>}) "." hex(hmac_sha256(payload))
//! ```
//!
//! The HMAC covers the *encoded* payload string, and is keyed with the
//! [`SessionSecret`], which should differ from the API secret.
//!
//! # Example
//!
//! ```rust
//! use chrono::Duration;
//! use shopify_app_auth::auth::SessionCodec;
//! use shopify_app_auth::{DomainValidator, SessionSecret};
//!
//! let codec = SessionCodec::new(SessionSecret::new("session-secret").unwrap());
//! let shop = DomainValidator::default().parse("acme.myshopify.com").unwrap();
//!
//! let token = codec.sign(&shop, Duration::minutes(15));
//! assert_eq!(codec.verify(&token).unwrap(), shop);
//! ```

use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::hex;
use crate::auth::oauth::hmac::{constant_time_compare, mac_bytes};
use crate::auth::SessionError;
use crate::config::{expiry_after, SessionSecret, ShopDomain};

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "app_session";

const SEPARATOR: char = '.';

/// The signed content of a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The shop the session was issued for.
    pub shop: ShopDomain,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Returns the expiry as a timestamp, if representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies session tokens.
///
/// `SessionCodec` is `Send + Sync` and holds no mutable state, so one
/// instance can serve every request.
#[derive(Clone, Debug)]
pub struct SessionCodec {
    secret: SessionSecret,
}

// Verify SessionCodec is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionCodec>();
};

impl SessionCodec {
    /// Creates a codec keyed with `secret`.
    #[must_use]
    pub const fn new(secret: SessionSecret) -> Self {
        Self { secret }
    }

    /// Issues a token for `shop` valid for `ttl` from now.
    #[must_use]
    pub fn sign(&self, shop: &ShopDomain, ttl: Duration) -> String {
        self.sign_at(shop, ttl, Utc::now())
    }

    /// Issues a token for `shop` valid for `ttl` from `now`.
    ///
    /// The expiry saturates at the bounds of `DateTime<Utc>`.
    #[must_use]
    pub fn sign_at(&self, shop: &ShopDomain, ttl: Duration, now: DateTime<Utc>) -> String {
        let exp = expiry_after(now, ttl).timestamp();
        let json = serde_json::json!({ "shop": shop.as_ref(), "exp": exp }).to_string();
        let payload = BASE64_URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac(&payload));
        format!("{payload}{SEPARATOR}{signature}")
    }

    /// Verifies `token` and returns the shop it was issued for.
    ///
    /// # Errors
    ///
    /// See [`verify_at`](Self::verify_at).
    pub fn verify(&self, token: &str) -> Result<ShopDomain, SessionError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as of `now`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MalformedToken`] if the token is not `payload.signature`
    /// - [`SessionError::InvalidSignature`] if the signature is not hex or does not match
    /// - [`SessionError::InvalidPayload`] if the payload does not decode to claims
    /// - [`SessionError::Expired`] if `now` is past the expiry
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<ShopDomain, SessionError> {
        let claims = self.decode_at(token, now)?;
        Ok(claims.shop)
    }

    /// Like [`verify_at`](Self::verify_at) but returns the full claims.
    ///
    /// # Errors
    ///
    /// Same as [`verify_at`](Self::verify_at).
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let mut parts = token.split(SEPARATOR);
        let (payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(payload), Some(signature), None)
                if !payload.is_empty() && !signature.is_empty() =>
            {
                (payload, signature)
            }
            _ => return Err(SessionError::MalformedToken),
        };

        let received = hex::decode(signature).ok_or(SessionError::InvalidSignature)?;
        if !constant_time_compare(&self.mac(payload), &received) {
            return Err(SessionError::InvalidSignature);
        }

        let json = BASE64_URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::InvalidPayload)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| SessionError::InvalidPayload)?;

        if now.timestamp() > claims.exp {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, payload: &str) -> [u8; 32] {
        mac_bytes(payload.as_bytes(), self.secret.as_ref().as_bytes())
    }
}

/// Builds the `Set-Cookie` value carrying a session token.
///
/// The cookie is `HttpOnly`, `SameSite=Lax`, scoped to `/`, and lives for
/// `ttl`. Set `secure` when the app is served over HTTPS.
///
/// ```rust
/// use chrono::Duration;
/// use shopify_app_auth::auth::session_cookie;
///
/// let cookie = session_cookie("token".to_string(), Duration::minutes(15), false);
/// assert_eq!(
///     cookie.to_string(),
///     "app_session=token; HttpOnly; SameSite=Lax; Path=/; Max-Age=900"
/// );
/// ```
#[must_use]
pub fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds().max(0)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DomainValidator;

    fn codec() -> SessionCodec {
        SessionCodec::new(SessionSecret::new("session-secret").unwrap())
    }

    fn shop() -> ShopDomain {
        DomainValidator::default().parse("acme.myshopify.com").unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        let verified = codec()
            .verify_at(&token, now() + Duration::minutes(14))
            .unwrap();
        assert_eq!(verified, shop());
    }

    #[test]
    fn test_expiry_boundary() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        assert!(codec()
            .verify_at(&token, now() + Duration::minutes(15))
            .is_ok());
        assert_eq!(
            codec().verify_at(&token, now() + Duration::minutes(15) + Duration::seconds(1)),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_token_format() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        let (payload, signature) = token.split_once('.').unwrap();

        assert_eq!(signature.len(), 64);
        let json = BASE64_URL_SAFE_NO_PAD.decode(payload).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(claims["shop"], "acme.myshopify.com");
        assert_eq!(claims["exp"], 1_700_000_900);
    }

    #[test]
    fn test_extreme_ttls_do_not_overflow() {
        let lasting = codec().sign_at(&shop(), Duration::MAX, now());
        let claims = codec().decode_at(&lasting, now()).unwrap();
        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());

        let stale = codec().sign_at(&shop(), Duration::MIN, now());
        assert_eq!(codec().verify_at(&stale, now()), Err(SessionError::Expired));
    }

    #[test]
    fn test_decode_returns_claims() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        let claims = codec().decode_at(&token, now()).unwrap();
        assert_eq!(claims.expires_at(), Some(now() + Duration::minutes(15)));
    }

    #[test]
    fn test_flipping_any_character_is_rejected() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        let separator = token.find('.').unwrap();

        for (i, c) in token.char_indices() {
            if i == separator {
                continue;
            }
            let replacement = if i < separator {
                if c == 'A' { 'B' } else { 'A' }
            } else if c == '0' {
                '1'
            } else {
                '0'
            };
            let mut tampered = token.clone();
            tampered.replace_range(i..=i, &replacement.to_string());

            assert_eq!(
                codec().verify_at(&tampered, now()),
                Err(SessionError::InvalidSignature),
                "flipping index {i} must be rejected"
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = codec().sign_at(&shop(), Duration::minutes(15), now());
        let other = SessionCodec::new(SessionSecret::new("other-secret").unwrap());
        assert_eq!(
            other.verify_at(&token, now()),
            Err(SessionError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "no-separator", "a.b.c", ".abc", "abc."] {
            assert_eq!(
                codec().verify_at(token, now()),
                Err(SessionError::MalformedToken),
                "{token:?}"
            );
        }
        assert_eq!(
            codec().verify_at("payload.not-hex", now()),
            Err(SessionError::InvalidSignature)
        );
    }

    #[test]
    fn test_correctly_signed_garbage_payload_is_invalid() {
        let codec = codec();
        let payload = BASE64_URL_SAFE_NO_PAD.encode(b"{\"not\":\"claims\"}");
        let token = format!("{payload}.{}", hex::encode(codec.mac(&payload)));
        assert_eq!(
            codec.verify_at(&token, now()),
            Err(SessionError::InvalidPayload)
        );

        let token = format!("!!!.{}", hex::encode(codec.mac("!!!")));
        assert_eq!(
            codec.verify_at(&token, now()),
            Err(SessionError::InvalidPayload)
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".to_string(), Duration::minutes(15), true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
    }
}
