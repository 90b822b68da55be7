// SPDX-License-Identifier: MIT OR Apache-2.0
//! Park-based fallback mutex and condition variable for targets without
//! pthreads.
//!
//! The mutex is an atomic flag plus a parked-waiter list. The condition
//! variable hands each waiter its own wake flag, so a signal cannot be
//! consumed by an unrelated unpark (park tokens are shared per thread and a
//! waiter may also be unparked by the mutex it contends on).
//!
//! None of these operations can fail; they return `Result` to keep the same
//! signatures as the pthread backend.

use crate::error::LockError;
use crate::spinlock::Spinlock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

pub(crate) struct Mutex {
    locked: AtomicBool,
    waiters: Spinlock<Vec<Thread>>,
}

impl Mutex {
    pub(crate) fn new() -> Result<Mutex, LockError> {
        Ok(Mutex {
            locked: AtomicBool::new(false),
            waiters: Spinlock::new(Vec::new()),
        })
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn lock(&self) -> Result<(), LockError> {
        loop {
            // Registering under the waiter-list spinlock closes the window
            // against `unlock`, which drains the list under the same
            // spinlock after clearing the flag.
            let acquired = self.waiters.with_mut(|threads| {
                if self.try_lock() {
                    true
                } else {
                    threads.push(thread::current());
                    false
                }
            });
            if acquired {
                return Ok(());
            }
            thread::park();
        }
    }

    /// # Safety
    ///
    /// The calling thread must hold this mutex.
    pub(crate) unsafe fn unlock(&self) -> Result<(), LockError> {
        self.locked.store(false, Ordering::Release);
        let threads = self.waiters.with_mut(std::mem::take);
        for thread in threads {
            thread.unpark();
        }
        Ok(())
    }
}

pub(crate) struct Condvar {
    waiters: Spinlock<Vec<Waiter>>,
}

struct Waiter {
    thread: Thread,
    woken: Arc<AtomicBool>,
}

impl Condvar {
    pub(crate) fn new() -> Result<Condvar, LockError> {
        Ok(Condvar {
            waiters: Spinlock::new(Vec::new()),
        })
    }

    /// # Safety
    ///
    /// The calling thread must hold `mutex`. On return, including an error
    /// return, the mutex is held again.
    pub(crate) unsafe fn wait(&self, mutex: &Mutex) -> Result<(), LockError> {
        let woken = Arc::new(AtomicBool::new(false));
        self.waiters.with_mut(|waiters| {
            waiters.push(Waiter {
                thread: thread::current(),
                woken: woken.clone(),
            })
        });
        // Registered before the mutex is released, so a signal sent by the
        // next holder of the mutex cannot slip past us.
        // SAFETY: the caller holds the mutex per this function's contract.
        if let Err(e) = unsafe { mutex.unlock() } {
            self.waiters
                .with_mut(|waiters| waiters.retain(|w| !Arc::ptr_eq(&w.woken, &woken)));
            return Err(e);
        }
        while !woken.load(Ordering::Acquire) {
            // A park token banked by an unrelated unpark makes this return
            // early; the flag check sends us back to sleep.
            thread::park();
        }
        mutex.lock()
    }

    pub(crate) fn signal(&self) -> Result<(), LockError> {
        let waiter = self.waiters.with_mut(|waiters| {
            if waiters.is_empty() {
                None
            } else {
                Some(waiters.remove(0))
            }
        });
        if let Some(waiter) = waiter {
            waiter.woken.store(true, Ordering::Release);
            waiter.thread.unpark();
        }
        Ok(())
    }

    pub(crate) fn broadcast(&self) -> Result<(), LockError> {
        let waiters = self.waiters.with_mut(std::mem::take);
        for waiter in waiters {
            waiter.woken.store(true, Ordering::Release);
            waiter.thread.unpark();
        }
        Ok(())
    }
}
