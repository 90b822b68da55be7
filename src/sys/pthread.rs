// SPDX-License-Identifier: MIT OR Apache-2.0
//! pthread-backed mutex and condition variable.
//!
//! The pthread objects live behind a `Box` because they rely on a stable
//! address once in use; the box can be moved freely while its contents stay
//! put.

use crate::error::LockError;
use std::cell::UnsafeCell;

fn check(code: libc::c_int) -> Result<(), LockError> {
    match code {
        0 => Ok(()),
        libc::ENOMEM | libc::EAGAIN => Err(LockError::ResourceExhausted),
        other => Err(LockError::Sys(other)),
    }
}

pub(crate) struct Mutex {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

impl Mutex {
    pub(crate) fn new() -> Result<Mutex, LockError> {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));
        // SAFETY: the pointer is valid and uniquely owned; a null attribute
        // requests the default mutex kind. On failure the box is freed
        // without a destroy, since the object never became initialized.
        check(unsafe { libc::pthread_mutex_init(inner.get(), std::ptr::null()) })?;
        Ok(Mutex { inner })
    }

    pub(crate) fn lock(&self) -> Result<(), LockError> {
        // SAFETY: the mutex is initialized and heap-pinned.
        check(unsafe { libc::pthread_mutex_lock(self.inner.get()) })
    }

    /// # Safety
    ///
    /// The calling thread must hold this mutex.
    pub(crate) unsafe fn unlock(&self) -> Result<(), LockError> {
        // SAFETY: initialized, and held by the caller per this function's
        // contract.
        check(unsafe { libc::pthread_mutex_unlock(self.inner.get()) })
    }

    fn raw(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no thread holds or waits on the mutex.
        let code = unsafe { libc::pthread_mutex_destroy(self.inner.get()) };
        debug_assert_eq!(code, 0, "pthread_mutex_destroy failed: {code}");
    }
}

// SAFETY: the pthread mutex is a thread-safe primitive and the heap
// allocation keeps its address stable across moves of the wrapper.
unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

pub(crate) struct Condvar {
    inner: Box<UnsafeCell<libc::pthread_cond_t>>,
}

impl Condvar {
    pub(crate) fn new() -> Result<Condvar, LockError> {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER));
        // SAFETY: valid unique pointer; null attribute requests the default
        // clock. On failure the box is freed without a destroy.
        check(unsafe { libc::pthread_cond_init(inner.get(), std::ptr::null()) })?;
        Ok(Condvar { inner })
    }

    /// # Safety
    ///
    /// The calling thread must hold `mutex`. On return, including an error
    /// return, the mutex is held again. Wakeups may be spurious.
    pub(crate) unsafe fn wait(&self, mutex: &Mutex) -> Result<(), LockError> {
        // SAFETY: both objects are initialized and the caller holds the
        // mutex per this function's contract.
        check(unsafe { libc::pthread_cond_wait(self.inner.get(), mutex.raw()) })
    }

    pub(crate) fn signal(&self) -> Result<(), LockError> {
        // SAFETY: initialized; signaling does not require holding the mutex.
        check(unsafe { libc::pthread_cond_signal(self.inner.get()) })
    }

    pub(crate) fn broadcast(&self) -> Result<(), LockError> {
        // SAFETY: initialized; signaling does not require holding the mutex.
        check(unsafe { libc::pthread_cond_broadcast(self.inner.get()) })
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no thread is waiting on the condition.
        let code = unsafe { libc::pthread_cond_destroy(self.inner.get()) };
        debug_assert_eq!(code, 0, "pthread_cond_destroy failed: {code}");
    }
}

// SAFETY: same argument as for `Mutex`.
unsafe impl Send for Condvar {}
unsafe impl Sync for Condvar {}
