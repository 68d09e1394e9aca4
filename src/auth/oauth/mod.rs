//! OAuth authorization code grant for installing the app on a shop.
//!
//! The building blocks of the install flow, each usable on its own:
//!
//! - [`QueryParams`], [`LoginQuery`], [`CallbackQuery`]: decoded request parameters
//! - [`hmac`]: validation of the platform's request signature
//! - [`StateParam`] and [`NonceStore`]: single-use CSRF nonces
//! - [`authorize_url`]: the redirect that starts authorization
//! - [`TokenExchanger`] and [`HttpTokenExchanger`]: trading the code for a token
//!
//! [`AuthFlow`](crate::auth::AuthFlow) composes them into Login and Callback.
//!
//! # Security Features
//!
//! - **HMAC Validation**: every callback must carry a valid HMAC-SHA256 signature
//! - **CSRF Protection**: the state nonce is redeemable once, for one shop, before it expires
//! - **Constant-Time Comparison**: signature checks never short-circuit on the first differing byte
//! - **Key Rotation Support**: an old API secret can be configured so in-flight
//!   installs survive a secret rotation
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::hmac::{sign_params, SIGNATURE_PARAM};
//! use shopify_app_auth::auth::oauth::{CallbackQuery, QueryParams};
//!
//! let mut params = QueryParams::parse("shop=acme.myshopify.com&code=abc&state=xyz&timestamp=1700000000");
//! let signature = sign_params(&params, "secret");
//! params.push(SIGNATURE_PARAM, signature);
//!
//! let query = CallbackQuery::from_query(params).unwrap();
//! assert_eq!(query.code, "abc");
//! ```

mod auth_query;
mod begin_auth;
pub mod hmac;
mod nonce_store;
mod state;
mod token_exchange;

pub use auth_query::{CallbackQuery, LoginQuery, QueryParams};
pub use begin_auth::{authorize_url, AUTHORIZE_PATH};
pub use nonce_store::NonceStore;
pub use state::StateParam;
pub use token_exchange::{
    AccessTokenResponse, HttpTokenExchanger, TokenExchanger, ACCESS_TOKEN_PATH,
};
