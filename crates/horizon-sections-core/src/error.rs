//! Error types for Horizon Sections.
//!
//! Most contract violations in this workspace are programmer errors and
//! panic immediately. The types here cover the cases a caller can choose to
//! handle: fallible registration through the `try_*` entry points, rejected
//! load-state transitions, and opaque content-load failures reported by leaf
//! providers.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Errors raised while composing or mutating a provider tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// The provider is already a child of this container.
    #[error("provider {provider} is already registered with {container}")]
    AlreadyRegistered { provider: u64, container: u64 },

    /// The provider is not a child of this container.
    #[error("provider {provider} is not registered with {container}")]
    NotRegistered { provider: u64, container: u64 },

    /// A container cannot be registered as its own child.
    #[error("provider {0} cannot be registered as its own child")]
    SelfRegistration(u64),

    /// A child index was outside the currently valid range.
    #[error("child index {index} is out of range (child count is {count})")]
    ChildOutOfRange { index: usize, count: usize },

    /// A load-state transition was not allowed from the current state.
    #[error("cannot transition load state from {from} to {to}")]
    InvalidLoadTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl CompositionError {
    /// Create an already-registered error.
    pub fn already_registered(provider: u64, container: u64) -> Self {
        Self::AlreadyRegistered {
            provider,
            container,
        }
    }

    /// Create a not-registered error.
    pub fn not_registered(provider: u64, container: u64) -> Self {
        Self::NotRegistered {
            provider,
            container,
        }
    }
}

/// An opaque content-load failure.
///
/// Leaf providers wrap whatever their loader reported. The composition engine
/// never inspects, retries or recovers from it; it is only carried upward in a
/// `Loaded` notification and stored in the provider's load state.
#[derive(Clone)]
pub struct LoadError {
    inner: Arc<dyn StdError + Send + Sync>,
}

impl LoadError {
    /// Wrap an arbitrary error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Create a load error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Access the wrapped error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// Returns `true` if both values wrap the same underlying error instance.
    pub fn ptr_eq(&self, other: &LoadError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoadError").field(&self.inner).finish()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content load failed: {}", self.inner)
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.inner)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MessageError(String);

/// A specialized Result type for Horizon Sections operations.
pub type Result<T> = std::result::Result<T, CompositionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_error_display() {
        let err = CompositionError::already_registered(3, 1);
        assert_eq!(
            err.to_string(),
            "provider 3 is already registered with 1"
        );

        let err = CompositionError::ChildOutOfRange { index: 4, count: 2 };
        assert_eq!(
            err.to_string(),
            "child index 4 is out of range (child count is 2)"
        );
    }

    #[test]
    fn test_load_error_message() {
        let err = LoadError::msg("network unreachable");
        assert_eq!(err.to_string(), "content load failed: network unreachable");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_load_error_clone_shares_inner() {
        let err = LoadError::msg("timeout");
        let copy = err.clone();
        assert!(err.ptr_eq(&copy));
        assert!(!err.ptr_eq(&LoadError::msg("timeout")));
    }

    #[test]
    fn test_load_error_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing feed");
        let err = LoadError::new(io);
        assert!(err.to_string().contains("missing feed"));
    }
}
