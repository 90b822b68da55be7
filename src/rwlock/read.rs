// SPDX-License-Identifier: MIT OR Apache-2.0
use super::Attempt;
use crate::error::LockError;
use crate::guard::ReadGuard;
use crate::rwlock::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

impl<T> RwLock<T> {
    /// Attempts to acquire read access without waiting.
    ///
    /// Succeeds whenever no writer holds the lock, even if writers are
    /// waiting.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Busy`] if a writer currently holds the lock, and
    /// [`LockError::Invalid`] if the lock has been torn down.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::{LockError, RwLock};
    ///
    /// let rwlock = RwLock::new(42).unwrap();
    ///
    /// let guard = rwlock.try_lock_read().unwrap();
    /// assert_eq!(*guard, 42);
    ///
    /// // Readers share; a second try succeeds.
    /// let other = rwlock.try_lock_read().unwrap();
    /// drop((guard, other));
    ///
    /// // A writer excludes them.
    /// let w = rwlock.lock_sync_write().unwrap();
    /// assert_eq!(rwlock.try_lock_read().err(), Some(LockError::Busy));
    /// drop(w);
    /// ```
    pub fn try_lock_read(&self) -> Result<ReadGuard<'_, T>, LockError> {
        self.raw.try_lock_read()?;
        Ok(ReadGuard { lock: self })
    }

    /// Acquires read access, spinning until a writer releases.
    ///
    /// Burns CPU for the whole wait; prefer [`lock_sync_read`] or
    /// [`lock_async_read`] unless writer holds are known to be very short.
    ///
    /// [`lock_sync_read`]: Self::lock_sync_read
    /// [`lock_async_read`]: Self::lock_async_read
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Invalid`] if the lock has been torn down.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    /// let guard = rwlock.lock_spin_read().unwrap();
    /// assert_eq!(guard.len(), 3);
    /// ```
    pub fn lock_spin_read(&self) -> Result<ReadGuard<'_, T>, LockError> {
        loop {
            match self.try_lock_read() {
                Ok(guard) => return Ok(guard),
                Err(LockError::Busy) => std::hint::spin_loop(),
                Err(e) => return Err(e),
            }
        }
    }

    /// Acquires read access, blocking the calling thread until any writer
    /// releases.
    ///
    /// Do not call from async contexts; use [`lock_async_read`] there
    /// instead.
    ///
    /// [`lock_async_read`]: Self::lock_async_read
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Invalid`] if the lock has been torn down, and
    /// passes through any failure of the underlying primitives.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    /// use std::sync::Arc;
    ///
    /// let rwlock = Arc::new(RwLock::new(0u64).unwrap());
    ///
    /// let handles: Vec<_> = (0..4)
    ///     .map(|_| {
    ///         let rwlock = rwlock.clone();
    ///         std::thread::spawn(move || *rwlock.lock_sync_read().unwrap())
    ///     })
    ///     .collect();
    ///
    /// for handle in handles {
    ///     assert_eq!(handle.join().unwrap(), 0);
    /// }
    /// ```
    pub fn lock_sync_read(&self) -> Result<ReadGuard<'_, T>, LockError> {
        self.raw.lock_read()?;
        Ok(ReadGuard { lock: self })
    }

    /// Acquires read access asynchronously.
    ///
    /// The returned future resolves once no writer holds the lock. Dropping
    /// the future before it resolves abandons the wait without side effects.
    ///
    /// # Errors
    ///
    /// The future resolves to [`LockError::Invalid`] if the lock has been
    /// torn down.
    ///
    /// # Examples
    ///
    /// ```
    /// # futures::executor::block_on(async {
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    ///
    /// let guard = rwlock.lock_async_read().await.unwrap();
    /// assert_eq!(guard.len(), 3);
    /// # });
    /// ```
    pub fn lock_async_read(&self) -> ReadFuture<'_, T> {
        ReadFuture { lock: self }
    }

    /// Runs a closure with read access, blocking until acquired.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    /// let len = rwlock.with_sync(|v| v.len()).unwrap();
    /// assert_eq!(len, 3);
    /// ```
    pub fn with_sync<R, F: FnOnce(&T) -> R>(&self, f: F) -> Result<R, LockError> {
        let guard = self.lock_sync_read()?;
        Ok(f(&guard))
    }

    /// Runs a closure with read access, acquired asynchronously.
    ///
    /// # Examples
    ///
    /// ```
    /// # futures::executor::block_on(async {
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    /// let len = rwlock.with_async(|v| v.len()).await.unwrap();
    /// assert_eq!(len, 3);
    /// # });
    /// ```
    pub async fn with_async<R, F: FnOnce(&T) -> R>(&self, f: F) -> Result<R, LockError> {
        let guard = self.lock_async_read().await?;
        Ok(f(&guard))
    }
}

/// Future returned by [`RwLock::lock_async_read`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct ReadFuture<'a, T> {
    pub(crate) lock: &'a RwLock<T>,
}

impl<'a, T> Future for ReadFuture<'a, T> {
    type Output = Result<ReadGuard<'a, T>, LockError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let lock = self.lock;
        // Trying while the waiter list is held closes the race against a
        // writer that releases between a failed try and the registration:
        // its wakeup drains the list only after our waker is in it.
        let attempt = lock
            .waiting_async_read_tasks
            .with_mut(|tasks| match lock.raw.try_lock_read() {
                Ok(()) => Attempt::Acquired,
                Err(LockError::Busy) => {
                    tasks.push(cx.waker().clone());
                    Attempt::Pending
                }
                Err(e) => Attempt::Failed(e),
            });
        match attempt {
            Attempt::Acquired => Poll::Ready(Ok(ReadGuard { lock })),
            Attempt::Pending => Poll::Pending,
            Attempt::Failed(e) => Poll::Ready(Err(e)),
        }
    }
}
