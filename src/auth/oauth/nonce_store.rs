//! Single-use OAuth state nonces.
//!
//! [`NonceStore`] issues a fresh [`StateParam`] at Login and redeems it at
//! Callback. Redemption succeeds at most once per nonce and only before the
//! record expires; the atomicity of that check lives in the backing
//! [`StateRepository`].
//!
//! # Example
//!
//! ```rust
//! use chrono::Duration;
//! use shopify_app_auth::auth::oauth::NonceStore;
//! use shopify_app_auth::store::InMemoryStateRepository;
//! use shopify_app_auth::DomainValidator;
//!
//! # tokio_test::block_on(async {
//! let shop = DomainValidator::default().parse("acme.myshopify.com").unwrap();
//! let store = NonceStore::new(InMemoryStateRepository::new());
//!
//! let state = store.create(&shop, Duration::minutes(10)).await.unwrap();
//! assert!(store.consume(&shop, state.as_ref()).await.unwrap());
//! assert!(!store.consume(&shop, state.as_ref()).await.unwrap());
//! # });
//! ```

use chrono::{Duration, Utc};

use crate::auth::oauth::StateParam;
use crate::config::{expiry_after, ShopDomain};
use crate::store::{OAuthStateRecord, StateRepository, StoreError};

/// Issues and redeems OAuth state nonces.
#[derive(Debug)]
pub struct NonceStore<R> {
    repository: R,
}

impl<R: StateRepository> NonceStore<R> {
    /// Creates a nonce store over `repository`.
    #[must_use]
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns the backing repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Generates a nonce for `shop`, persists it with a lifetime of `ttl`,
    /// and returns it.
    ///
    /// A zero or negative `ttl` produces a record that is already expired.
    /// The expiry saturates instead of overflowing for extreme values.
    /// Other outstanding nonces for the same shop are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be persisted.
    pub async fn create(&self, shop: &ShopDomain, ttl: Duration) -> Result<StateParam, StoreError> {
        let state = StateParam::new();
        let created_at = Utc::now();
        let record = OAuthStateRecord {
            shop: shop.clone(),
            nonce: state.to_string(),
            created_at,
            expires_at: expiry_after(created_at, ttl),
        };
        self.repository.insert(record).await?;
        Ok(state)
    }

    /// Redeems `nonce` for `shop`.
    ///
    /// Returns `Ok(true)` exactly once for a live nonce and removes it.
    /// Returns `Ok(false)` for nonces that are unknown, issued to another
    /// shop, already redeemed, or expired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for backend failures.
    pub async fn consume(&self, shop: &ShopDomain, nonce: &str) -> Result<bool, StoreError> {
        if nonce.is_empty() {
            return Ok(false);
        }
        self.repository.consume(shop, nonce, Utc::now()).await
    }

    /// Deletes expired records, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for backend failures.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        self.repository.purge_expired(Utc::now()).await
    }
}
