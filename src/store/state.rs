//! OAuth state record persistence.

use crate::config::ShopDomain;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// A pending install, created at Login and consumed at most once at Callback.
///
/// Records are never updated: consumption removes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthStateRecord {
    /// The tenant the nonce was issued for.
    pub shop: ShopDomain,
    /// The opaque, URL-safe nonce sent as the OAuth `state` parameter.
    pub nonce: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// The record is consumable only while `now < expires_at`.
    pub expires_at: DateTime<Utc>,
}

impl OAuthStateRecord {
    /// Returns `true` if the record can no longer be consumed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Durable storage behind the nonce store.
///
/// # Atomicity
///
/// [`consume`](Self::consume) must check and remove the record in a single
/// indivisible operation against the backend, for example
/// `DELETE ... WHERE shop = $1 AND nonce = $2 AND expires_at > $3 RETURNING id`.
/// Under concurrent calls with the same pair exactly one caller may observe
/// `Ok(true)`.
pub trait StateRepository: Send + Sync + 'static {
    /// Persists a new record. Several records may exist for one shop.
    fn insert(
        &self,
        record: OAuthStateRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically removes the matching, unexpired record.
    ///
    /// Returns `Ok(false)` when no such record exists, it was already
    /// consumed, or `expires_at <= now`.
    fn consume(
        &self,
        shop: &ShopDomain,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes records that expired at or before `now`, returning how many
    /// were removed. Intended for periodic housekeeping.
    fn purge_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// In-process [`StateRepository`] backed by a mutex-guarded map.
///
/// Suitable for tests and single-instance deployments. The check and the
/// removal in `consume` happen under one lock acquisition.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    records: Mutex<HashMap<(ShopDomain, String), OAuthStateRecord>>,
}

impl InMemoryStateRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records, consumed ones excluded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::poisoned("state"))?;
        Ok(records.len())
    }

    /// Returns `true` if no records are stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl StateRepository for InMemoryStateRepository {
    async fn insert(&self, record: OAuthStateRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::poisoned("state"))?;
        records.insert((record.shop.clone(), record.nonce.clone()), record);
        Ok(())
    }

    async fn consume(
        &self,
        shop: &ShopDomain,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::poisoned("state"))?;

        let key = (shop.clone(), nonce.to_string());
        let live = records
            .get(&key)
            .is_some_and(|record| !record.is_expired_at(now));
        if live {
            records.remove(&key);
        }
        Ok(live)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::poisoned("state"))?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok(before - records.len())
    }
}
