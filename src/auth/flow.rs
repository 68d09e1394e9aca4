//! The install and session flow.
//!
//! [`AuthFlow`] ties the components together into the four operations an
//! HTTP layer exposes:
//!
//! | Operation | Route | Result |
//! |-----------|-------|--------|
//! | [`login`](AuthFlow::login) | `GET /login?shop=..[&hmac=..]` | redirect to the platform, or straight to the dashboard |
//! | [`callback`](AuthFlow::callback) | `GET /auth/callback?shop=..&code=..&hmac=..&state=..` | session cookie + redirect to the dashboard |
//! | [`check_session`](AuthFlow::check_session) / [`dashboard`](AuthFlow::dashboard) | `GET /dashboard?shop=..` | the authenticated shop |
//! | [`health`](AuthFlow::health) | `GET /health` | `{"ok": true}` |
//!
//! Every failure is terminal for the attempt; the merchant restarts at Login.
//! Nothing is retried here.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopify_app_auth::auth::oauth::{HttpTokenExchanger, LoginQuery, QueryParams};
//! use shopify_app_auth::auth::{AuthFlow, LoginOutcome};
//! use shopify_app_auth::store::{InMemoryShopRepository, InMemoryStateRepository};
//! use shopify_app_auth::AppConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let exchanger = HttpTokenExchanger::new(&config)?;
//! let flow = Arc::new(AuthFlow::new(
//!     config,
//!     InMemoryStateRepository::new(),
//!     InMemoryShopRepository::new(),
//!     exchanger,
//! ));
//!
//! let query = LoginQuery::from_query(QueryParams::parse("shop=acme.myshopify.com"))?;
//! match flow.login(&query).await? {
//!     LoginOutcome::Authorize { url, .. } => println!("302 -> {url}"),
//!     LoginOutcome::Session(redirect) => println!("302 -> {}", redirect.location),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use cookie::Cookie;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::oauth::hmac::validate_with_rotation;
use crate::auth::oauth::{
    authorize_url, CallbackQuery, LoginQuery, NonceStore, QueryParams, StateParam,
    TokenExchanger,
};
use crate::auth::session::{session_cookie, SessionCodec};
use crate::auth::{
    AuthScopes, AuthenticationError, ClientInputError, FlowError, HmacError, UpstreamError,
};
use crate::config::{AppConfig, ShopDomain};
use crate::store::{Shop, ShopRepository, StateRepository, StoreError};

/// Path of the app's protected resource.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Where a successful Login or Callback sends the browser, with the session
/// it should carry.
#[derive(Clone)]
pub struct SessionRedirect {
    /// Relative redirect target, `/dashboard?shop=...`.
    pub location: String,
    /// The signed session token.
    pub token: String,
    /// The `Set-Cookie` carrying [`token`](Self::token).
    pub cookie: Cookie<'static>,
    /// The authenticated shop.
    pub shop: ShopDomain,
}

impl fmt::Debug for SessionRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRedirect")
            .field("location", &self.location)
            .field("token", &"*****")
            .field("shop", &self.shop)
            .finish_non_exhaustive()
    }
}

/// Result of [`AuthFlow::login`].
#[derive(Clone, Debug)]
pub enum LoginOutcome {
    /// The shop must (re)authorize the app: redirect to `url`.
    Authorize {
        /// The platform authorization URL.
        url: String,
        /// The nonce embedded in `url`, already persisted.
        state: StateParam,
    },
    /// The shop is installed and the request was signed: issue the session
    /// and skip the OAuth round-trip.
    Session(SessionRedirect),
}

/// Body of the health endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// Always `true` while the process is serving.
    pub ok: bool,
}

/// Orchestrates Login, Callback and session checks.
///
/// Generic over the state store `S`, the shop store `R` and the token
/// exchanger `T`. Holds no mutable state of its own; share it behind an
/// `Arc` across request handlers.
pub struct AuthFlow<S, R, T> {
    config: AppConfig,
    nonces: NonceStore<S>,
    shops: R,
    exchanger: T,
    sessions: SessionCodec,
}

impl<S, R, T> fmt::Debug for AuthFlow<S, R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, R, T> AuthFlow<S, R, T>
where
    S: StateRepository,
    R: ShopRepository,
    T: TokenExchanger,
{
    /// Creates the flow from its configuration and collaborators.
    #[must_use]
    pub fn new(config: AppConfig, states: S, shops: R, exchanger: T) -> Self {
        let sessions = SessionCodec::new(config.session_secret().clone());
        Self {
            config,
            nonces: NonceStore::new(states),
            shops,
            exchanger,
            sessions,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the nonce store, e.g. to run [`NonceStore::purge_expired`].
    #[must_use]
    pub const fn nonce_store(&self) -> &NonceStore<S> {
        &self.nonces
    }

    /// Returns the shop repository.
    #[must_use]
    pub const fn shops(&self) -> &R {
        &self.shops
    }

    /// Returns the session codec.
    #[must_use]
    pub const fn sessions(&self) -> &SessionCodec {
        &self.sessions
    }

    /// Handles `GET /login`.
    ///
    /// A signed request for an installed shop gets a session directly.
    /// Anything else starts an OAuth authorization: a nonce is persisted and
    /// the merchant is sent to the platform.
    ///
    /// # Errors
    ///
    /// - [`FlowError::ClientInput`] for an invalid shop domain
    /// - [`FlowError::Authentication`] if a signature is present but invalid
    /// - [`FlowError::Store`] if the shop lookup or nonce creation fails
    pub async fn login(&self, query: &LoginQuery) -> Result<LoginOutcome, FlowError> {
        let shop = self.parse_shop(&query.shop)?;

        if query.signed {
            self.authenticate_request(&shop, &query.params)?;
        }

        let installed = self
            .shops
            .get_by_domain(&shop)
            .await
            .map_err(|e| store_failure(&shop, "shop lookup", e))?;

        if installed.is_some() && query.signed {
            info!(shop = %shop, "Installed shop signed in, issuing session");
            return Ok(LoginOutcome::Session(self.issue_session(shop)));
        }

        let state = self
            .nonces
            .create(&shop, self.config.state_ttl())
            .await
            .map_err(|e| store_failure(&shop, "nonce creation", e))?;

        let url = authorize_url(&self.config, &shop, &state);
        info!(shop = %shop, "Redirecting to authorization");

        Ok(LoginOutcome::Authorize { url, state })
    }

    /// Handles `GET /auth/callback`.
    ///
    /// Validates the signature, redeems the state nonce, exchanges the code
    /// for an access token, stores it and issues a session. No session is
    /// issued and nothing is stored if any step fails.
    ///
    /// # Errors
    ///
    /// - [`FlowError::ClientInput`] for an invalid shop domain
    /// - [`FlowError::Authentication`] for a bad signature, or a state that is
    ///   unknown, expired or already used
    /// - [`FlowError::Upstream`] if the token exchange fails
    /// - [`FlowError::Store`] if the nonce or shop store fails
    pub async fn callback(&self, query: &CallbackQuery) -> Result<SessionRedirect, FlowError> {
        let shop = self.parse_shop(&query.shop)?;

        self.authenticate_request(&shop, &query.params)?;

        let redeemed = self
            .nonces
            .consume(&shop, &query.state)
            .await
            .map_err(|e| store_failure(&shop, "nonce consumption", e))?;
        if !redeemed {
            warn!(shop = %shop, "OAuth state invalid, expired or already used");
            return Err(AuthenticationError::InvalidState.into());
        }

        let token = self
            .exchanger
            .exchange(&shop, &query.code)
            .await
            .map_err(|e| upstream_failure(&shop, e))?;

        self.check_granted_scopes(&shop, &token.scope);

        self.shops
            .upsert(&shop, &token.access_token, &token.scope)
            .await
            .map_err(|e| store_failure(&shop, "shop upsert", e))?;

        info!(shop = %shop, scopes = %token.scope, "Shop installed");
        Ok(self.issue_session(shop))
    }

    /// Verifies that the request carries a valid session for `shop`.
    ///
    /// `cookie` is the value of the `app_session` cookie, `shop` the raw
    /// `shop` query parameter.
    ///
    /// # Errors
    ///
    /// - [`FlowError::ClientInput`] if `shop` is absent or invalid
    /// - [`FlowError::Authentication`] if the cookie is absent, does not
    ///   verify, or was issued for a different shop
    pub fn check_session(
        &self,
        cookie: Option<&str>,
        shop: Option<&str>,
    ) -> Result<ShopDomain, FlowError> {
        let raw_shop = shop
            .filter(|s| !s.is_empty())
            .ok_or(ClientInputError::MissingParameter { name: "shop" })?;
        let shop = self.parse_shop(raw_shop)?;

        let token = cookie
            .filter(|c| !c.is_empty())
            .ok_or(AuthenticationError::MissingSession)?;

        let session_shop = self.sessions.verify(token).map_err(|e| {
            warn!(shop = %shop, error = %e, "Session rejected");
            e
        })?;

        if session_shop != shop {
            warn!(
                shop = %shop,
                session_shop = %session_shop,
                "Session presented for a different shop"
            );
            return Err(AuthenticationError::SessionDomainMismatch.into());
        }

        Ok(shop)
    }

    /// Serves the protected resource: checks the session, then loads the
    /// installed shop.
    ///
    /// # Errors
    ///
    /// Everything [`check_session`](Self::check_session) returns, plus
    /// [`FlowError::ShopNotInstalled`] if the shop has no record and
    /// [`FlowError::Store`] if the lookup fails.
    pub async fn dashboard(
        &self,
        cookie: Option<&str>,
        shop: Option<&str>,
    ) -> Result<Shop, FlowError> {
        let shop = self.check_session(cookie, shop)?;

        self.shops
            .get_by_domain(&shop)
            .await
            .map_err(|e| store_failure(&shop, "shop lookup", e))?
            .ok_or_else(|| FlowError::ShopNotInstalled {
                shop: shop.to_string(),
            })
    }

    /// Liveness probe.
    #[must_use]
    pub const fn health(&self) -> HealthStatus {
        HealthStatus { ok: true }
    }

    fn parse_shop(&self, raw: &str) -> Result<ShopDomain, ClientInputError> {
        if raw.trim().is_empty() {
            return Err(ClientInputError::MissingParameter { name: "shop" });
        }
        self.config
            .domain_validator()
            .parse_normalized(raw)
            .map_err(|domain| ClientInputError::InvalidShopDomain { domain })
    }

    fn authenticate_request(
        &self,
        shop: &ShopDomain,
        params: &QueryParams,
    ) -> Result<(), HmacError> {
        validate_with_rotation(params, &self.config).map_err(|e| {
            warn!(shop = %shop, error = %e, "Request signature rejected");
            e
        })
    }

    fn check_granted_scopes(&self, shop: &ShopDomain, granted: &str) {
        match granted.parse::<AuthScopes>() {
            Ok(granted) if granted.covers(self.config.scopes()) => {}
            Ok(_) => warn!(
                shop = %shop,
                requested = %self.config.scopes(),
                granted = %granted,
                "Granted scopes do not cover the requested scopes"
            ),
            Err(e) => warn!(shop = %shop, error = %e, "Granted scopes could not be parsed"),
        }
    }

    fn issue_session(&self, shop: ShopDomain) -> SessionRedirect {
        let ttl = self.config.session_ttl();
        let token = self.sessions.sign(&shop, ttl);
        let cookie = session_cookie(token.clone(), ttl, self.config.callback_url().is_https());
        SessionRedirect {
            location: dashboard_location(&shop),
            token,
            cookie,
            shop,
        }
    }
}

/// Returns `/dashboard?shop={shop}` with the domain percent-encoded.
#[must_use]
pub fn dashboard_location(shop: &ShopDomain) -> String {
    format!(
        "{DASHBOARD_PATH}?shop={}",
        urlencoding::encode(shop.as_ref())
    )
}

fn store_failure(shop: &ShopDomain, operation: &'static str, e: StoreError) -> FlowError {
    error!(shop = %shop, operation, error = %e, "Store operation failed");
    e.into()
}

fn upstream_failure(shop: &ShopDomain, e: UpstreamError) -> FlowError {
    error!(shop = %shop, error = %e, "Token exchange failed");
    e.into()
}
