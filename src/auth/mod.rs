//! Authentication for the app install flow.
//!
//! # Overview
//!
//! - [`AuthFlow`]: Login, Callback, session checks and health, composed
//! - [`oauth`]: request signatures, state nonces, authorization and token exchange
//! - [`SessionCodec`]: stateless signed session tokens and their cookie
//! - [`AuthScopes`]: OAuth scope sets with implied scope handling
//! - [`FlowError`] and friends: the error taxonomy rendered by the HTTP layer
//!
//! # Lifecycle
//!
//! ```text
//! UNAUTHENTICATED --login--> PENDING_INSTALL --callback--> AUTHORIZED --> SESSION_ACTIVE
//!        ^                                                                    |
//!        +------------------------- session expiry ---------------------------+
//! ```
//!
//! A signed Login for an installed shop jumps straight to `SESSION_ACTIVE`.

mod error;
mod flow;
mod hex;
pub mod oauth;
mod scopes;
pub mod session;

pub use error::{
    AuthenticationError, ClientInputError, ErrorKind, FlowError, HmacError, SessionError,
    UpstreamError,
};
pub use flow::{
    dashboard_location, AuthFlow, HealthStatus, LoginOutcome, SessionRedirect, DASHBOARD_PATH,
};
pub use scopes::AuthScopes;
pub use session::{session_cookie, SessionClaims, SessionCodec, SESSION_COOKIE_NAME};
