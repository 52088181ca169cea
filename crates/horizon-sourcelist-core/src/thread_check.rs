//! Thread affinity verification for single-threaded state.
//!
//! The source-list engine serializes every mutation onto one logical thread.
//! [`ThreadAffinity`] records the thread an object was created on and lets
//! mutating methods verify that they are still called from it.
//!
//! ```
//! use horizon_sourcelist_core::thread_check::ThreadAffinity;
//!
//! struct Counter {
//!     affinity: ThreadAffinity,
//!     value: i32,
//! }
//!
//! impl Counter {
//!     fn increment(&mut self) {
//!         // In debug builds, panic if called from the wrong thread
//!         self.affinity.debug_assert_same_thread();
//!         self.value += 1;
//!     }
//! }
//!
//! let mut counter = Counter { affinity: ThreadAffinity::current(), value: 0 };
//! counter.increment();
//! ```

use std::thread::ThreadId;

/// Thread affinity tracker for objects.
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

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the same thread as the affinity.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message if called from a different thread.
    pub fn assert_same_thread(&self) {
        if !self.is_same_thread() {
            self.panic_wrong_thread();
        }
    }

    /// Debug-only assertion that we are on the same thread.
    ///
    /// This is a no-op in release builds.
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "thread affinity violation: object created on thread {:?} \
             was accessed from thread \"{current_name}\" ({current_id:?}); \
             source list mutations must stay on the thread that owns the list",
            self.thread_id
        )
    }
}
