//! Persistence errors.

use thiserror::Error;

/// A failure of a backing store.
///
/// This is a transient infrastructure failure, never a policy decision: a
/// nonce that does not exist or has expired is reported as `Ok(false)` by
/// [`StateRepository::consume`](super::StateRepository::consume), not as an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or is in an unusable state.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Operator-facing description.
        reason: String,
    },

    /// A store operation failed in the backend.
    #[error("store operation '{operation}' failed: {source}")]
    Backend {
        /// The operation that failed, e.g. `"state.insert"`.
        operation: &'static str,
        /// The backend's error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wraps a backend error for the named operation.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Unavailable {
            reason: format!("{what} lock poisoned"),
        }
    }
}

// Verify StoreError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StoreError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_source() {
        let error = StoreError::backend("shop.upsert", "connection reset");
        assert!(error.to_string().contains("shop.upsert"));
        assert!(error.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_poisoned_is_unavailable() {
        let error = StoreError::poisoned("state");
        assert!(matches!(error, StoreError::Unavailable { .. }));
        assert_eq!(error.to_string(), "store unavailable: state lock poisoned");
    }
}
