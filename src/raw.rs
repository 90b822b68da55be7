// SPDX-License-Identifier: MIT OR Apache-2.0
//! The payload-free checked read/write lock.
//!
//! [`RawRwLock`] is the state machine underneath [`RwLock`](crate::RwLock):
//! an internal mutex guarding four counters, plus one condition variable for
//! waiting readers and one for waiting writers. It exposes the full
//! fallible acquire/release surface for callers that manage the protected
//! data themselves; most users want the guard-based [`RwLock`](crate::RwLock)
//! instead.

use crate::error::LockError;
use crate::sys;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(test)]
mod tests;

/// Marker value held while the lock is live. Destruction zeroes it.
const LIVE: u32 = 0xfacade;
const DEAD: u32 = 0;

/// Counters guarded by the internal mutex.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct State {
    pub(crate) waiting_readers: usize,
    pub(crate) waiting_writers: usize,
    pub(crate) active_readers: usize,
    pub(crate) writer_active: bool,
}

/// A reader-preferring read/write lock without a payload.
///
/// Any number of readers may hold the lock at once; a writer holds it alone.
/// The lock is *read-preferring*: releasing a write lock wakes every waiting
/// reader if there are any, and only otherwise wakes a single waiting writer.
/// Releasing a read lock wakes one waiting writer only when the last active
/// reader leaves. New readers are admitted even while writers wait, so under
/// sustained read traffic writers can starve. That behavior is deliberate;
/// choose a different lock if your workload needs writer fairness.
///
/// One more consequence of the wake policy is worth knowing: a woken writer
/// must reacquire the internal mutex before it can claim the lock, and a
/// fresh reader that arrives in that window gets in first. The writer then
/// goes back to waiting.
///
/// # Lifecycle
///
/// A `RawRwLock` is live from [`new`](RawRwLock::new) until a successful
/// [`destroy`](RawRwLock::destroy). `destroy` refuses with
/// [`Busy`](LockError::Busy) while any holder or waiter exists; afterwards
/// every operation reports [`Invalid`](LockError::Invalid). The liveness
/// check happens before the internal mutex is taken, so an acquire racing a
/// `destroy` can slip through the check; this window is documented rather
/// than closed, and callers are expected to quiesce a lock before destroying
/// it. The underlying primitives are torn down when the value is dropped.
///
/// # Errors
///
/// Failures of the underlying primitives propagate verbatim. When everything
/// else succeeded and only the trailing release of the internal mutex fails,
/// that failure is returned in place of success; the lock object should then
/// be considered unusable.
///
/// # Examples
///
/// ```
/// use readfirst::{LockError, RawRwLock};
///
/// let lock = RawRwLock::new().unwrap();
///
/// lock.lock_read().unwrap();
/// assert_eq!(lock.try_lock_write(), Err(LockError::Busy));
/// lock.unlock_read().unwrap();
///
/// lock.lock_write().unwrap();
/// assert_eq!(lock.try_lock_read(), Err(LockError::Busy));
/// lock.unlock_write().unwrap();
///
/// lock.destroy().unwrap();
/// assert_eq!(lock.lock_read(), Err(LockError::Invalid));
/// ```
pub struct RawRwLock {
    state: UnsafeCell<State>,
    live: AtomicU32,
    mutex: sys::Mutex,
    readers: sys::Condvar,
    writers: sys::Condvar,
}

// SAFETY: the state cell is only touched while the internal mutex is held,
// and the sys primitives are themselves thread-safe.
unsafe impl Send for RawRwLock {}
unsafe impl Sync for RawRwLock {}

impl std::fmt::Debug for RawRwLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRwLock").finish_non_exhaustive()
    }
}

impl RawRwLock {
    /// Creates a live lock with no holders and no waiters.
    ///
    /// Builds the internal mutex, then the reader condition, then the writer
    /// condition. A construction failure propagates after the primitives
    /// built so far are dropped, which tears them down.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RawRwLock;
    ///
    /// let lock = RawRwLock::new().unwrap();
    /// lock.destroy().unwrap();
    /// ```
    pub fn new() -> Result<RawRwLock, LockError> {
        let mutex = sys::Mutex::new()?;
        let readers = sys::Condvar::new()?;
        let writers = sys::Condvar::new()?;
        Ok(RawRwLock {
            state: UnsafeCell::new(State::default()),
            live: AtomicU32::new(LIVE),
            mutex,
            readers,
            writers,
        })
    }

    /// Retires the lock, after which every operation returns
    /// [`Invalid`](LockError::Invalid).
    ///
    /// Fails with [`Busy`](LockError::Busy) while any reader or writer holds
    /// the lock or waits for it. The underlying primitives are released when
    /// the `RawRwLock` value is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::{LockError, RawRwLock};
    ///
    /// let lock = RawRwLock::new().unwrap();
    /// lock.lock_read().unwrap();
    /// assert_eq!(lock.destroy(), Err(LockError::Busy));
    /// lock.unlock_read().unwrap();
    /// lock.destroy().unwrap();
    /// assert_eq!(lock.destroy(), Err(LockError::Invalid));
    /// ```
    pub fn destroy(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        // SAFETY: the internal mutex is held until the unlock below.
        let in_use = unsafe {
            (*s).active_readers > 0
                || (*s).writer_active
                || (*s).waiting_readers > 0
                || (*s).waiting_writers > 0
        };
        if in_use {
            // SAFETY: held by this thread.
            unsafe { self.mutex.unlock() }?;
            return Err(LockError::Busy);
        }
        self.live.store(DEAD, Ordering::Release);
        // SAFETY: held by this thread.
        unsafe { self.mutex.unlock() }
    }

    /// Acquires the lock for reading, blocking while a writer is active.
    ///
    /// Readers are admitted regardless of how many writers are waiting.
    /// A failed condition wait is propagated without acquiring.
    pub fn lock_read(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        let mut status = Ok(());
        // SAFETY: state accesses happen only while the internal mutex is
        // held; no reference into the cell lives across a condition wait.
        unsafe {
            if (*s).writer_active {
                (*s).waiting_readers += 1;
                while (*s).writer_active {
                    if let Err(e) = self.readers.wait(&self.mutex) {
                        status = Err(e);
                        break;
                    }
                }
                (*s).waiting_readers -= 1;
            }
            if status.is_ok() {
                (*s).active_readers += 1;
            }
        }
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        status
    }

    /// Acquires the lock for reading if no writer is active.
    ///
    /// Returns [`Busy`](LockError::Busy) without blocking and without side
    /// effects when a writer holds the lock.
    pub fn try_lock_read(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        // SAFETY: the internal mutex is held until the unlock below.
        let busy = unsafe {
            if (*s).writer_active {
                true
            } else {
                (*s).active_readers += 1;
                false
            }
        };
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        if busy { Err(LockError::Busy) } else { Ok(()) }
    }

    /// Releases a read acquisition.
    ///
    /// When the last active reader leaves and writers are waiting, exactly
    /// one writer is woken. Between that wake-up and the writer reacquiring
    /// the internal mutex a fresh reader can acquire the lock first; the
    /// writer then resumes waiting.
    ///
    /// Calling this without a matching successful read acquisition is a
    /// usage error; the reader count saturates at zero rather than wrapping.
    pub fn unlock_read(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        let mut status = Ok(());
        // SAFETY: the internal mutex is held until the unlock below.
        unsafe {
            (*s).active_readers = (*s).active_readers.saturating_sub(1);
            if (*s).active_readers == 0 && (*s).waiting_writers > 0 {
                status = self.writers.signal();
            }
        }
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        status
    }

    /// Acquires the lock for writing, blocking while readers or another
    /// writer are active.
    ///
    /// A failed condition wait is propagated without acquiring.
    pub fn lock_write(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        let mut status = Ok(());
        // SAFETY: state accesses happen only while the internal mutex is
        // held; no reference into the cell lives across a condition wait.
        unsafe {
            if (*s).writer_active || (*s).active_readers > 0 {
                (*s).waiting_writers += 1;
                while (*s).writer_active || (*s).active_readers > 0 {
                    if let Err(e) = self.writers.wait(&self.mutex) {
                        status = Err(e);
                        break;
                    }
                }
                (*s).waiting_writers -= 1;
            }
            if status.is_ok() {
                (*s).writer_active = true;
            }
        }
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        status
    }

    /// Acquires the lock for writing if no reader or writer is active.
    ///
    /// Returns [`Busy`](LockError::Busy) without blocking and without side
    /// effects when the lock is held in any mode.
    pub fn try_lock_write(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        // SAFETY: the internal mutex is held until the unlock below.
        let busy = unsafe {
            if (*s).writer_active || (*s).active_readers > 0 {
                true
            } else {
                (*s).writer_active = true;
                false
            }
        };
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        if busy { Err(LockError::Busy) } else { Ok(()) }
    }

    /// Releases a write acquisition.
    ///
    /// If readers are waiting, all of them are woken and the waiting writers
    /// stay asleep; only when no reader waits is a single writer woken. This
    /// is the read-preference policy.
    pub fn unlock_write(&self) -> Result<(), LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        let s = self.state.get();
        let mut status = Ok(());
        // SAFETY: the internal mutex is held until the unlock below.
        unsafe {
            (*s).writer_active = false;
            if (*s).waiting_readers > 0 {
                status = self.readers.broadcast();
            } else if (*s).waiting_writers > 0 {
                status = self.writers.signal();
            }
        }
        // SAFETY: held by this thread.
        let released = unsafe { self.mutex.unlock() };
        released?;
        status
    }

    /// Copies the counters out from under the internal mutex.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Result<State, LockError> {
        self.ensure_live()?;
        self.mutex.lock()?;
        // SAFETY: the internal mutex is held until the unlock below.
        let state = unsafe { *self.state.get() };
        // SAFETY: held by this thread.
        unsafe { self.mutex.unlock() }?;
        Ok(state)
    }

    fn ensure_live(&self) -> Result<(), LockError> {
        if self.live.load(Ordering::Acquire) != LIVE {
            return Err(LockError::Invalid);
        }
        Ok(())
    }
}
