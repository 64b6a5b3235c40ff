//! Thread affinity checks for Horizon Sections.
//!
//! Provider trees are single-threaded: every provider records the thread it
//! was created on, and every mutating or notification-emitting operation
//! verifies that it is still running there. The types are `Send + Sync` only
//! so providers can sit behind `Arc`; nothing here makes concurrent mutation
//! safe.
//!
//! Checks are enabled by default in debug builds and disabled in release
//! builds. Call [`set_thread_checks_enabled`] to override.
//!
//! ```
//! use horizon_sections_core::thread_check::ThreadAffinity;
//!
//! struct Counter {
//!     affinity: ThreadAffinity,
//!     value: std::sync::atomic::AtomicUsize,
//! }
//!
//! impl Counter {
//!     fn bump(&self) {
//!         self.affinity.check("Counter::bump");
//!         self.value.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

/// Flag to enable/disable runtime thread checks globally.
static THREAD_CHECKS_ENABLED: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Enable or disable runtime thread checks.
///
/// By default, thread checks are enabled in debug builds and disabled in
/// release builds.
pub fn set_thread_checks_enabled(enabled: bool) {
    THREAD_CHECKS_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Check if runtime thread checks are currently enabled.
#[inline]
pub fn are_thread_checks_enabled() -> bool {
    THREAD_CHECKS_ENABLED.load(Ordering::Relaxed)
}

/// Thread affinity tracker for providers.
///
/// Records the thread on which a provider was created and verifies that
/// subsequent operations occur on the same thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Create a new thread affinity tracker for the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// Get the thread ID this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the affine thread, regardless of the global flag.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message if called from a different thread.
    pub fn assert_same_thread(&self, operation: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(operation);
        }
    }

    /// Assert that we are on the affine thread when thread checks are enabled.
    ///
    /// This is the check used by every provider mutation and notification.
    #[inline]
    pub fn check(&self, operation: &str) {
        if are_thread_checks_enabled() {
            self.assert_same_thread(operation);
        }
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, operation: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            THREAD AFFINITY VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {operation} called off the provider's thread\n\
            \n\
            Provider was created on thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            Provider trees must be mutated, and must emit change notifications,\n\
            only on the thread that created them. Asynchronous loaders have to\n\
            hop back to that thread before completing a load ticket.\n\
            \n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_thread_affinity_same_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        affinity.assert_same_thread("test");
        affinity.check("test");
    }

    #[test]
    fn test_thread_affinity_different_thread() {
        let affinity = ThreadAffinity::current();

        let result = Arc::new(AtomicBool::new(false));
        let result_clone = result.clone();

        let handle = std::thread::spawn(move || {
            result_clone.store(!affinity.is_same_thread(), Ordering::SeqCst);
        });

        handle.join().unwrap();
        assert!(
            result.load(Ordering::SeqCst),
            "is_same_thread() should return false from different thread"
        );
    }

    #[test]
    fn test_thread_affinity_panic_on_wrong_thread() {
        let affinity = ThreadAffinity::current();

        let result = std::thread::spawn(move || {
            affinity.assert_same_thread("notify_reloaded");
        })
        .join();

        assert!(result.is_err(), "Expected thread to panic with affinity violation");
    }

    #[test]
    fn test_thread_affinity_default() {
        let affinity = ThreadAffinity::default();
        assert!(affinity.is_same_thread());
    }

    #[test]
    fn test_thread_affinity_copy() {
        let affinity1 = ThreadAffinity::current();
        let affinity2 = affinity1;

        assert_eq!(affinity1.thread_id(), affinity2.thread_id());
        assert!(affinity2.is_same_thread());
    }
}
