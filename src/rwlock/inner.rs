// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::error::LockError;
use crate::raw::RawRwLock;
use crate::spinlock::Spinlock;
use std::cell::UnsafeCell;
use std::task::Waker;

/// A reader-preferring read/write lock around a value.
///
/// Any number of readers may hold the lock at once; a writer holds it alone.
/// When a writer releases, every waiting reader is admitted before the next
/// writer. When the last reader releases, one waiting writer is admitted.
/// Under a steady stream of readers a writer can therefore wait
/// indefinitely; use this lock where reads dominate and occasional writer
/// delay is acceptable.
///
/// The lock has a checked lifecycle. Construction can fail if the operating
/// system refuses a primitive, so [`new`](Self::new) returns a `Result`, and
/// every locking method reports [`LockError::Invalid`] if the underlying
/// lock has been torn down (see [`RawRwLock`] for the raw lifecycle).
/// Destruction here is simply `Drop`: dropping the `RwLock` consumes it, and
/// ownership guarantees no guard or future can outlive it.
///
/// # Locking strategies
///
/// Each access comes in four flavors, named by how they wait:
///
/// - `try_lock_read` / `try_lock_write`: return [`LockError::Busy`]
///   immediately when the lock cannot be had.
/// - `lock_spin_read` / `lock_spin_write`: spin until acquired. Cheap when
///   holds are short, pathological when they are not.
/// - `lock_sync_read` / `lock_sync_write`: block the calling thread.
/// - `lock_async_read` / `lock_async_write`: return a future that resolves
///   when the lock is acquired, without blocking the executor.
///
/// # Examples
///
/// ```
/// use readfirst::RwLock;
///
/// let rwlock = RwLock::new(5).unwrap();
///
/// // Many readers at once.
/// {
///     let r1 = rwlock.lock_sync_read().unwrap();
///     let r2 = rwlock.lock_sync_read().unwrap();
///     assert_eq!(*r1 + *r2, 10);
/// }
///
/// // One writer, alone.
/// {
///     let mut w = rwlock.lock_sync_write().unwrap();
///     *w += 1;
/// }
///
/// assert_eq!(rwlock.with_sync(|v| *v).unwrap(), 6);
/// ```
#[derive(Debug)]
pub struct RwLock<T> {
    pub(crate) inner: UnsafeCell<T>,
    pub(crate) raw: RawRwLock,
    pub(crate) waiting_async_read_tasks: Spinlock<Vec<Waker>>,
    pub(crate) waiting_async_write_tasks: Spinlock<Vec<Waker>>,
}

impl<T> RwLock<T> {
    /// Creates a new `RwLock` protecting the given value.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::ResourceExhausted`] or [`LockError::Sys`] if the
    /// operating system cannot provide the underlying primitives.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(42).unwrap();
    /// assert_eq!(*rwlock.lock_sync_read().unwrap(), 42);
    /// ```
    pub fn new(value: T) -> Result<Self, LockError> {
        Ok(RwLock {
            inner: UnsafeCell::new(value),
            raw: RawRwLock::new()?,
            waiting_async_read_tasks: Spinlock::new(Vec::new()),
            waiting_async_write_tasks: Spinlock::new(Vec::new()),
        })
    }

    /// Consumes the lock and returns the protected value.
    ///
    /// Ownership proves no guard or pending future exists, so this cannot
    /// fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(String::from("data")).unwrap();
    /// assert_eq!(rwlock.into_inner(), "data");
    /// ```
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Wakes tasks that may proceed after a read release.
    ///
    /// A read release can only unblock a writer, and only the raw lock knows
    /// whether this reader was the last; waking every waiting writer task
    /// and letting the losers re-register keeps this layer stateless.
    pub(crate) fn did_unlock_read(&self) {
        let tasks = self.waiting_async_write_tasks.with_mut(std::mem::take);
        for task in tasks {
            task.wake();
        }
    }

    /// Wakes tasks that may proceed after a write release.
    ///
    /// Readers are woken before writers, matching the preference the raw
    /// lock applies underneath.
    pub(crate) fn did_unlock_write(&self) {
        let tasks = self.waiting_async_read_tasks.with_mut(std::mem::take);
        for task in tasks {
            task.wake();
        }
        let tasks = self.waiting_async_write_tasks.with_mut(std::mem::take);
        for task in tasks {
            task.wake();
        }
    }
}

// SAFETY: sending the lock moves the value with it, so T must be Send.
unsafe impl<T: Send> Send for RwLock<T> {}
// SAFETY: sharing the lock hands out &T to concurrent readers (T: Sync) and
// lets any thread acquire a write guard and take &mut T (T: Send).
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

// ================================================================================================
// Boilerplate trait implementations
// ================================================================================================

impl<T: std::fmt::Display> std::fmt::Display for RwLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.try_lock_read() {
            Ok(guard) => write!(f, "RwLock {{ {guard} }}"),
            Err(_) => write!(f, "RwLock {{ <locked> }}"),
        }
    }
}
