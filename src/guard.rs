// SPDX-License-Identifier: MIT OR Apache-2.0
//! Guard types for read and write acquisitions of an [`RwLock`].
//!
//! A guard proves the hold: the protected data is only reachable through a
//! live guard, and dropping the guard releases the lock.

use crate::rwlock::RwLock;

/// A guard that provides read-only access to the data protected by an
/// [`RwLock`].
///
/// Created by the read-locking methods on [`RwLock`]. When the guard drops,
/// the read acquisition is released; if it was the last one and a writer is
/// waiting, the writer is woken.
///
/// Multiple `ReadGuard`s can exist simultaneously for the same lock,
/// enabling concurrent read access.
///
/// # Examples
///
/// ```
/// use readfirst::RwLock;
///
/// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
///
/// {
///     let guard1 = rwlock.lock_sync_read().unwrap();
///     let guard2 = rwlock.lock_sync_read().unwrap();
///
///     // Both guards can read simultaneously
///     assert_eq!(guard1.len(), 3);
///     assert_eq!(guard2[0], 1);
/// } // Both guards dropped, read acquisitions released
/// ```
pub struct ReadGuard<'a, T> {
    pub(crate) lock: &'a RwLock<T>,
}

/// A guard that provides exclusive read-write access to the data protected
/// by an [`RwLock`].
///
/// Created by the write-locking methods on [`RwLock`]. When the guard drops,
/// the write acquisition is released and waiting readers (or, if none, one
/// waiting writer) are woken.
///
/// Only one `WriteGuard` can exist at a time for a given lock, and never
/// alongside a `ReadGuard`.
///
/// # Examples
///
/// ```
/// use readfirst::RwLock;
///
/// let rwlock = RwLock::new(String::from("hello")).unwrap();
///
/// {
///     let mut guard = rwlock.lock_sync_write().unwrap();
///     guard.push_str(", world!");
///     assert_eq!(&*guard, "hello, world!");
/// } // Guard dropped, write acquisition released
/// ```
pub struct WriteGuard<'a, T> {
    pub(crate) lock: &'a RwLock<T>,
}

impl<T> std::ops::Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: a live ReadGuard proves a read hold, so no writer can
        // alias this data; shared references among readers are fine.
        unsafe { &*self.lock.inner.get() }
    }
}

impl<T> std::ops::Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: a live WriteGuard proves the exclusive hold.
        unsafe { &*self.lock.inner.get() }
    }
}

impl<T> std::ops::DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: a live WriteGuard proves the exclusive hold.
        unsafe { &mut *self.lock.inner.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        // The guard proves the hold and the lock outlives its guards, so
        // the release can only fail if a primitive fails underneath.
        let released = self.lock.raw.unlock_read();
        debug_assert!(released.is_ok(), "read release failed: {released:?}");
        self.lock.did_unlock_read();
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let released = self.lock.raw.unlock_write();
        debug_assert!(released.is_ok(), "write release failed: {released:?}");
        self.lock.did_unlock_write();
    }
}

// ================================================================================================
// Boilerplate trait implementations
// ================================================================================================

impl<T> AsRef<T> for ReadGuard<'_, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> AsRef<T> for WriteGuard<'_, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> AsMut<T> for WriteGuard<'_, T> {
    fn as_mut(&mut self) -> &mut T {
        &mut *self
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("data", &**self)
            .finish_non_exhaustive()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard")
            .field("data", &**self)
            .finish_non_exhaustive()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&**self, f)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&**self, f)
    }
}
