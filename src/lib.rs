//! # Shopify App Auth
//!
//! The install, CSRF and session protocol a Shopify app runs before it can
//! call the Admin API on a merchant's behalf.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - Tenant domain validation via [`DomainValidator`] and [`ShopDomain`]
//! - HMAC validation of platform-signed requests via [`auth::oauth::hmac`]
//! - Single-use OAuth state nonces via [`auth::oauth::NonceStore`]
//! - Authorization code exchange via [`auth::oauth::HttpTokenExchanger`]
//! - Stateless signed sessions via [`SessionCodec`]
//! - The Login / Callback / Dashboard flow via [`AuthFlow`]
//! - Storage contracts and in-memory implementations in [`store`]
//!
//! The HTTP layer is left to the application: every operation takes decoded
//! inputs and returns a typed outcome or a [`FlowError`] that knows its
//! status code and public message.
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::{LoginQuery, QueryParams, TokenExchanger};
//! use shopify_app_auth::auth::oauth::AccessTokenResponse;
//! use shopify_app_auth::store::{InMemoryShopRepository, InMemoryStateRepository};
//! use shopify_app_auth::{
//!     ApiKey, ApiSecretKey, AppConfig, AuthFlow, CallbackUrl, LoginOutcome, ShopDomain,
//!     UpstreamError,
//! };
//!
//! struct NoExchange;
//!
//! impl TokenExchanger for NoExchange {
//!     async fn exchange(
//!         &self,
//!         _shop: &ShopDomain,
//!         _code: &str,
//!     ) -> Result<AccessTokenResponse, UpstreamError> {
//!         Err(UpstreamError::Timeout)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .callback_url(CallbackUrl::new("https://myapp.example.com/auth/callback").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let flow = AuthFlow::new(
//!     config,
//!     InMemoryStateRepository::new(),
//!     InMemoryShopRepository::new(),
//!     NoExchange,
//! );
//!
//! let query = LoginQuery::from_query(QueryParams::parse("shop=acme.myshopify.com")).unwrap();
//! match flow.login(&query).await.unwrap() {
//!     LoginOutcome::Authorize { url, .. } => {
//!         assert!(url.starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
//!     }
//!     LoginOutcome::Session(_) => unreachable!(),
//! }
//! # });
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all types are `Send + Sync`
//! - **Async-first**: storage and token exchange are async traits
//! - **No secrets in output**: secret-bearing types mask their `Debug`, and
//!   public error messages are fixed strings

pub mod auth;
pub mod config;
pub mod error;
pub mod store;

// Re-export public types at crate root for convenience
pub use auth::{
    AuthFlow, AuthScopes, AuthenticationError, ClientInputError, ErrorKind, FlowError,
    HealthStatus, HmacError, LoginOutcome, SessionCodec, SessionError, SessionRedirect,
    UpstreamError,
};
pub use config::{
    ApiKey, ApiSecretKey, AppConfig, AppConfigBuilder, CallbackUrl, DomainValidator,
    SessionSecret, ShopDomain,
};
pub use error::ConfigError;
pub use store::StoreError;

// Re-export OAuth types for convenience
pub use auth::oauth::{
    authorize_url, CallbackQuery, HttpTokenExchanger, LoginQuery, NonceStore, QueryParams,
    StateParam, TokenExchanger,
};
