//! Tenant (shop) domain normalization and validation.
//!
//! Every other component only accepts a [`ShopDomain`], and the only way to
//! obtain one from untrusted input is through a [`DomainValidator`]. The
//! validator is built once at process start and shared read-only.
//!
//! A valid domain is lowercase and has the shape `label(.label)*.suffix`,
//! where each label consists of ASCII letters, digits and hyphens and starts
//! with a letter or digit.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::DomainValidator;
//!
//! let validator = DomainValidator::default();
//!
//! let (normalized, valid) = validator.normalize_and_validate("  Acme.MyShopify.com ");
//! assert_eq!(normalized, "acme.myshopify.com");
//! assert!(valid);
//!
//! let shop = validator.parse("acme.myshopify.com").unwrap();
//! assert_eq!(shop.shop_name(), "acme");
//! ```

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The suffix used by production Shopify stores.
pub const DEFAULT_DOMAIN_SUFFIX: &str = "myshopify.com";

/// Normalizes and validates tenant domains against a fixed platform suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainValidator {
    // Stored with its leading dot, e.g. ".myshopify.com".
    dotted_suffix: String,
}

impl DomainValidator {
    /// Creates a validator for domains ending in `suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDomainSuffix`] if the suffix is not a
    /// dotted host name made of valid labels.
    pub fn new(suffix: impl Into<String>) -> Result<Self, ConfigError> {
        let suffix = suffix.into().trim().trim_start_matches('.').to_lowercase();

        let labels_ok = !suffix.is_empty() && suffix.split('.').all(is_valid_label);
        if !labels_ok || !suffix.contains('.') {
            return Err(ConfigError::InvalidDomainSuffix { suffix });
        }

        Ok(Self {
            dotted_suffix: format!(".{suffix}"),
        })
    }

    /// Returns the platform suffix without its leading dot.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.dotted_suffix[1..]
    }

    /// Trims and lowercases `raw`, then checks it against the domain pattern.
    ///
    /// Never fails: an empty or malformed input yields `false`. Callers must
    /// not hand an unvalidated domain to any other component.
    #[must_use]
    pub fn normalize_and_validate(&self, raw: &str) -> (String, bool) {
        let normalized = raw.trim().to_lowercase();
        let valid = self.matches(&normalized);
        (normalized, valid)
    }

    /// Parses untrusted input into a [`ShopDomain`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the normalized input does
    /// not match the domain pattern.
    pub fn parse(&self, raw: &str) -> Result<ShopDomain, ConfigError> {
        self.parse_normalized(raw)
            .map_err(|domain| ConfigError::InvalidShopDomain {
                domain,
                suffix: self.suffix().to_string(),
            })
    }

    /// Like [`parse`](Self::parse), but the error is just the rejected
    /// normalized domain.
    pub(crate) fn parse_normalized(&self, raw: &str) -> Result<ShopDomain, String> {
        let (normalized, valid) = self.normalize_and_validate(raw);
        if !valid {
            return Err(normalized);
        }
        Ok(ShopDomain::from_validated(normalized))
    }

    fn matches(&self, domain: &str) -> bool {
        domain
            .strip_suffix(&self.dotted_suffix)
            .is_some_and(|prefix| !prefix.is_empty() && prefix.split('.').all(is_valid_label))
    }
}

impl Default for DomainValidator {
    fn default() -> Self {
        Self {
            dotted_suffix: format!(".{DEFAULT_DOMAIN_SUFFIX}"),
        }
    }
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// A normalized, validated tenant domain such as `acme.myshopify.com`.
///
/// Used as the partition key for nonces and sessions. Obtain one through
/// [`DomainValidator::parse`].
///
/// # Serialization
///
/// `ShopDomain` serializes to and deserializes from the full domain string.
/// Deserialization re-checks the label structure but not the platform
/// suffix, which is a property of the validator that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain {
    full_domain: String,
    shop_name_end: usize,
}

impl ShopDomain {
    fn from_validated(full_domain: String) -> Self {
        let shop_name_end = full_domain.find('.').unwrap_or(full_domain.len());
        Self {
            full_domain,
            shop_name_end,
        }
    }

    /// Returns the first label of the domain.
    ///
    /// For `my-store.myshopify.com`, this returns `my-store`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.full_domain[..self.shop_name_end]
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_domain)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let well_formed =
            s.contains('.') && s.split('.').all(is_valid_label) && s == s.to_lowercase();
        if !well_formed {
            return Err(de::Error::custom(format!("invalid shop domain '{s}'")));
        }
        Ok(Self::from_validated(s))
    }
}
