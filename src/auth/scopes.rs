//! OAuth access scopes.
//!
//! Scopes are requested on the authorize redirect and echoed back by the
//! token exchange as the granted set. The granted set may be narrower than
//! the requested one, which [`AuthScopes::covers`] detects.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes such as `read_products,write_orders`.
///
/// `write_foo` implies `read_foo`; implied scopes are taken into account by
/// [`covers`](Self::covers) but never added to the wire representation, so
/// the scope string sent to the platform is exactly what was configured.
///
/// ```rust
/// use shopify_app_auth::AuthScopes;
///
/// let granted: AuthScopes = "write_products, read_orders".parse().unwrap();
/// let required: AuthScopes = "read_products".parse().unwrap();
/// assert!(granted.covers(&required));
/// assert_eq!(granted.to_string(), "read_orders,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if every scope in `other` is held, directly or implied.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|wanted| {
            self.scopes.contains(wanted)
                || self
                    .scopes
                    .iter()
                    .filter_map(|held| implied_read_scope(held))
                    .any(|implied| &implied == wanted)
        })
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

fn implied_read_scope(scope: &str) -> Option<String> {
    scope
        .strip_prefix("unauthenticated_write_")
        .map(|rest| format!("unauthenticated_read_{rest}"))
        .or_else(|| scope.strip_prefix("write_").map(|rest| format!("read_{rest}")))
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }

        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.iter().collect::<Vec<_>>().join(",");
        f.write_str(&joined)
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
