//! Error types for the install and session flow.
//!
//! Failures are grouped by how the caller must react:
//!
//! - [`ClientInputError`]: the request is malformed; report it, never retry.
//! - [`AuthenticationError`]: a signature, nonce or session check failed;
//!   terminal for this attempt, the client restarts at Login.
//! - [`UpstreamError`]: the token exchange failed; surfaced as a server-side failure.
//! - [`StoreError`]: a backing store failed; fatal for the request and logged.
//!
//! [`FlowError`] wraps all of them. The HTTP layer renders it using
//! [`FlowError::status_code`] and [`FlowError::public_message`], neither of
//! which ever includes secret material.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::{AuthenticationError, ErrorKind, FlowError, HmacError};
//!
//! let error = FlowError::from(HmacError::SignatureMismatch);
//! assert_eq!(error.kind(), ErrorKind::Authentication);
//! assert_eq!(error.status_code(), 401);
//! assert_eq!(error.public_message(), "invalid hmac signature");
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Request signature validation failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HmacError {
    /// No `hmac` parameter was present.
    #[error("request signature is missing")]
    MissingSignature,

    /// The `hmac` parameter is not valid hexadecimal.
    #[error("request signature is not valid hex")]
    MalformedSignature,

    /// The signature does not match the parameters.
    #[error("request signature does not match")]
    SignatureMismatch,
}

/// Session token verification failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The token is not `payload.signature`.
    #[error("session token is malformed")]
    MalformedToken,

    /// The signature is undecodable or does not match the payload.
    #[error("session token signature is invalid")]
    InvalidSignature,

    /// The signed payload could not be decoded.
    #[error("session token payload is invalid")]
    InvalidPayload,

    /// The token's expiry has passed.
    #[error("session token has expired")]
    Expired,
}

/// Malformed requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientInputError {
    /// A required query parameter is absent or empty.
    #[error("missing required parameter '{name}'")]
    MissingParameter {
        /// The parameter name.
        name: &'static str,
    },

    /// The shop parameter is not a valid tenant domain.
    #[error("invalid shop domain '{domain}'")]
    InvalidShopDomain {
        /// The normalized value that was rejected.
        domain: String,
    },
}

/// Authentication failures. All are terminal for the current attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The platform signature on the request did not validate.
    #[error(transparent)]
    Signature(#[from] HmacError),

    /// The OAuth state was never issued, already consumed, or expired.
    #[error("OAuth state is invalid, expired or already used")]
    InvalidState,

    /// No session cookie accompanied the request.
    #[error("session cookie is missing")]
    MissingSession,

    /// The session cookie did not verify.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A valid session for one shop was presented for another.
    #[error("session belongs to a different shop")]
    SessionDomainMismatch,
}

/// Token exchange failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The request could not be sent or the connection failed.
    #[error("token exchange transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The identity provider did not answer within the configured timeout.
    #[error("token exchange timed out")]
    Timeout,

    /// The identity provider answered with a non-200 status.
    #[error("token exchange failed with status {status}: {body}")]
    Status {
        /// The HTTP status code returned.
        status: u16,
        /// The (truncated) response body.
        body: String,
    },

    /// The 200 response could not be parsed or lacked a credential.
    #[error("token exchange returned a malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong with the body.
        reason: String,
    },
}

/// Coarse classification of a [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request.
    ClientInput,
    /// Signature, nonce or session failure.
    Authentication,
    /// The shop has no installation record.
    NotFound,
    /// Token exchange failure.
    Upstream,
    /// Backing store failure.
    Store,
}

/// Any failure of a flow operation.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Malformed request.
    #[error(transparent)]
    ClientInput(#[from] ClientInputError),

    /// Authentication failure.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// Token exchange failure.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session is valid but the shop has no installation record.
    #[error("shop '{shop}' is not installed")]
    ShopNotInstalled {
        /// The shop domain.
        shop: String,
    },
}

impl FlowError {
    /// Returns the taxonomy entry of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientInput(_) => ErrorKind::ClientInput,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Store(_) => ErrorKind::Store,
            Self::ShopNotInstalled { .. } => ErrorKind::NotFound,
        }
    }

    /// Returns the HTTP status the boundary layer should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::ClientInput => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Upstream => 502,
            ErrorKind::Store => 500,
        }
    }

    /// Returns a short, fixed message that is safe to show to the user.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::ClientInput(ClientInputError::MissingParameter { .. }) => {
                "missing required parameters"
            }
            Self::ClientInput(ClientInputError::InvalidShopDomain { .. }) => "invalid shop domain",
            Self::Authentication(AuthenticationError::Signature(_)) => "invalid hmac signature",
            Self::Authentication(AuthenticationError::InvalidState) => {
                "invalid or expired state parameter"
            }
            Self::Authentication(AuthenticationError::MissingSession) => "missing session",
            Self::Authentication(AuthenticationError::Session(_)) => "invalid session",
            Self::Authentication(AuthenticationError::SessionDomainMismatch) => {
                "session-shop mismatch"
            }
            Self::Upstream(_) => "failed to exchange token",
            Self::Store(_) => "database error",
            Self::ShopNotInstalled { .. } => "shop not installed",
        }
    }
}

impl From<HmacError> for FlowError {
    fn from(error: HmacError) -> Self {
        Self::Authentication(error.into())
    }
}

impl From<SessionError> for FlowError {
    fn from(error: SessionError) -> Self {
        Self::Authentication(error.into())
    }
}

// Verify FlowError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FlowError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_status_codes() {
        let cases: Vec<(FlowError, ErrorKind, u16)> = vec![
            (
                ClientInputError::MissingParameter { name: "code" }.into(),
                ErrorKind::ClientInput,
                400,
            ),
            (
                AuthenticationError::InvalidState.into(),
                ErrorKind::Authentication,
                401,
            ),
            (SessionError::Expired.into(), ErrorKind::Authentication, 401),
            (UpstreamError::Timeout.into(), ErrorKind::Upstream, 502),
            (
                StoreError::Unavailable {
                    reason: "down".to_string(),
                }
                .into(),
                ErrorKind::Store,
                500,
            ),
            (
                FlowError::ShopNotInstalled {
                    shop: "a.myshopify.com".to_string(),
                },
                ErrorKind::NotFound,
                404,
            ),
        ];

        for (error, kind, status) in cases {
            assert_eq!(error.kind(), kind, "{error}");
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_session_mismatch_is_distinct_from_invalid_session() {
        let mismatch = FlowError::from(AuthenticationError::SessionDomainMismatch);
        let invalid = FlowError::from(SessionError::InvalidSignature);
        assert_ne!(mismatch.public_message(), invalid.public_message());
    }

    #[test]
    fn test_public_messages_do_not_echo_details() {
        let error = FlowError::from(UpstreamError::Status {
            status: 400,
            body: "client_secret=leaked".to_string(),
        });
        assert!(error.to_string().contains("400"));
        assert!(!error.public_message().contains("leaked"));
    }

    #[test]
    fn test_transparent_display() {
        let error = FlowError::from(HmacError::MissingSignature);
        assert_eq!(error.to_string(), "request signature is missing");
    }
}
