//! Installed-shop persistence.

use crate::config::ShopDomain;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;

/// A tenant that completed installation.
#[derive(Clone, PartialEq, Eq)]
pub struct Shop {
    /// The tenant domain.
    pub shop_domain: ShopDomain,
    /// Long-lived access credential returned by the token exchange.
    pub offline_access_token: String,
    /// Granted scopes, exactly as returned by the platform.
    pub scopes: String,
    /// When the shop was first installed.
    pub installed_at: DateTime<Utc>,
    /// When the credential was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Shop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shop")
            .field("shop_domain", &self.shop_domain)
            .field("offline_access_token", &"*****")
            .field("scopes", &self.scopes)
            .field("installed_at", &self.installed_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Lookup and upsert of installed shops.
///
/// # Example
///
/// ```rust,ignore
/// impl ShopRepository for PgShops {
///     async fn get_by_domain(&self, shop: &ShopDomain) -> Result<Option<Shop>, StoreError> {
///         sqlx::query_as("SELECT ... FROM shops WHERE shop_domain = $1")
///             .bind(shop.as_ref())
///             .fetch_optional(&self.pool)
///             .await
///             .map_err(|e| StoreError::backend("shop.get_by_domain", e))
///     }
///     // ...
/// }
/// ```
pub trait ShopRepository: Send + Sync + 'static {
    /// Returns the installed shop, or `Ok(None)` if it was never installed.
    fn get_by_domain(
        &self,
        shop: &ShopDomain,
    ) -> impl Future<Output = Result<Option<Shop>, StoreError>> + Send;

    /// Inserts the shop, or replaces its credential and scopes if it exists.
    ///
    /// `installed_at` is preserved on update; `updated_at` is refreshed.
    fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        scopes: &str,
    ) -> impl Future<Output = Result<Shop, StoreError>> + Send;
}

/// In-process [`ShopRepository`].
#[derive(Debug, Default)]
pub struct InMemoryShopRepository {
    shops: Mutex<HashMap<ShopDomain, Shop>>,
}

impl InMemoryShopRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShopRepository for InMemoryShopRepository {
    async fn get_by_domain(&self, shop: &ShopDomain) -> Result<Option<Shop>, StoreError> {
        let shops = self.shops.lock().map_err(|_| StoreError::poisoned("shop"))?;
        Ok(shops.get(shop).cloned())
    }

    async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        scopes: &str,
    ) -> Result<Shop, StoreError> {
        let mut shops = self.shops.lock().map_err(|_| StoreError::poisoned("shop"))?;
        let now = Utc::now();

        let entry = shops.entry(shop.clone()).or_insert_with(|| Shop {
            shop_domain: shop.clone(),
            offline_access_token: String::new(),
            scopes: String::new(),
            installed_at: now,
            updated_at: now,
        });
        entry.offline_access_token = access_token.to_string();
        entry.scopes = scopes.to_string();
        entry.updated_at = now;

        Ok(entry.clone())
    }
}
