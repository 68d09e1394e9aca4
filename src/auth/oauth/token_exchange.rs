//! Authorization code exchange.
//!
//! After a successful callback the app trades the one-time authorization
//! code for a long-lived offline access token:
//!
//! ```text
//! POST https://{shop}/admin/oauth/access_token
//! Content-Type: application/json
//! Accept: application/json
//!
//! {"client_id": "...", "client_secret": "...", "code": "..."}
//! ```
//!
//! A 200 answer carries `{"access_token": "...", "scope": "..."}`. Anything
//! else is an [`UpstreamError`] and fails the callback without persisting
//! any credential.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::auth::UpstreamError;
use crate::config::{AppConfig, ShopDomain};

/// Path of the token endpoint on a shop domain.
pub const ACCESS_TOKEN_PATH: &str = "/admin/oauth/access_token";

/// Maximum number of characters of an error body kept in [`UpstreamError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// A successful token exchange answer.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessTokenResponse {
    /// The offline access token.
    pub access_token: String,
    /// Comma-separated scopes actually granted by the merchant.
    #[serde(default)]
    pub scope: String,
}

impl fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"*****")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Trades an authorization code for an access token.
///
/// Implemented by [`HttpTokenExchanger`]; tests and alternative transports
/// can provide their own.
pub trait TokenExchanger: Send + Sync + 'static {
    /// Exchanges `code` for `shop`.
    fn exchange(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> impl Future<Output = Result<AccessTokenResponse, UpstreamError>> + Send;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// [`TokenExchanger`] that calls the platform over HTTPS.
#[derive(Clone)]
pub struct HttpTokenExchanger {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    base_url: Option<String>,
}

impl fmt::Debug for HttpTokenExchanger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTokenExchanger")
            .field("client_id", &self.client_id)
            .field("client_secret", &"*****")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTokenExchanger {
    /// Creates an exchanger using the credentials and timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, UpstreamError> {
        let user_agent = format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.token_exchange_timeout())
            .user_agent(user_agent)
            .build()
            .map_err(|e| UpstreamError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            client_id: config.api_key().as_ref().to_string(),
            client_secret: config.api_secret_key().as_ref().to_string(),
            base_url: None,
        })
    }

    /// Sends every exchange to `base_url` instead of `https://{shop}`.
    ///
    /// Intended for egress proxies and tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn token_url(&self, shop: &ShopDomain) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{ACCESS_TOKEN_PATH}"),
            None => format!("https://{}{ACCESS_TOKEN_PATH}", shop.as_ref()),
        }
    }
}

impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, UpstreamError> {
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            code,
        };

        let response = self
            .client
            .post(self.token_url(shop))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if status != reqwest::StatusCode::OK {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        let token: AccessTokenResponse =
            serde_json::from_str(&text).map_err(|e| UpstreamError::MalformedResponse {
                reason: e.to_string(),
            })?;

        if token.access_token.is_empty() {
            return Err(UpstreamError::MalformedResponse {
                reason: "access_token is empty".to_string(),
            });
        }

        Ok(token)
    }
}

fn transport_error(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Transport {
            message: error.without_url().to_string(),
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTokenExchanger>();
    assert_send_sync::<AccessTokenResponse>();
};
