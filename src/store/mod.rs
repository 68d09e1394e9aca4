//! Persistence contracts consumed by the auth flow.
//!
//! The flow owns no durable state. Pending installs live behind a
//! [`StateRepository`] and installed shops behind a [`ShopRepository`];
//! applications implement both against their database. In-process
//! implementations are provided for tests and single-instance deployments.

mod error;
mod shop;
mod state;

pub use error::StoreError;
pub use shop::{InMemoryShopRepository, Shop, ShopRepository};
pub use state::{InMemoryStateRepository, OAuthStateRecord, StateRepository};
