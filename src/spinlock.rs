// SPDX-License-Identifier: MIT OR Apache-2.0
//! A simple spinlock for short-lived critical sections.
//!
//! Used internally to protect the lists of async task wakers parked on an
//! [`RwLock`](crate::RwLock). These critical sections are a handful of vector
//! operations, short enough that spinning beats parking.

use std::cell::UnsafeCell;

/// A spinlock protecting a short-lived critical section.
///
/// The only access path is [`with_mut`](Spinlock::with_mut), which keeps every
/// hold scoped to a closure and releases the lock on the way out.
#[derive(Debug)]
pub(crate) struct Spinlock<T> {
    data: UnsafeCell<T>,
    locked: std::sync::atomic::AtomicBool,
}

impl<T> Spinlock<T> {
    pub(crate) const fn new(data: T) -> Self {
        Spinlock {
            data: UnsafeCell::new(data),
            locked: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Executes a closure with exclusive access to the protected data.
    ///
    /// Spins until the lock is acquired; keep the closure short.
    pub(crate) fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        // Spin until we can acquire the lock
        while self.locked.swap(true, std::sync::atomic::Ordering::Acquire) {
            std::hint::spin_loop();
        }

        // SAFETY: We have exclusive access to the data now
        let result = unsafe { f(&mut *self.data.get()) };

        // Release the lock
        self.locked
            .store(false, std::sync::atomic::Ordering::Release);

        result
    }
}

unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}
