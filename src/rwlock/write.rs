// SPDX-License-Identifier: MIT OR Apache-2.0
use super::Attempt;
use crate::error::LockError;
use crate::guard::WriteGuard;
use crate::rwlock::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

impl<T> RwLock<T> {
    /// Attempts to acquire write access without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Busy`] if any reader or writer holds the lock,
    /// and [`LockError::Invalid`] if the lock has been torn down.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::{LockError, RwLock};
    ///
    /// let rwlock = RwLock::new(42).unwrap();
    ///
    /// {
    ///     let mut guard = rwlock.try_lock_write().unwrap();
    ///     *guard = 43;
    /// }
    ///
    /// // Even a single reader blocks a writer.
    /// let r = rwlock.lock_sync_read().unwrap();
    /// assert_eq!(rwlock.try_lock_write().err(), Some(LockError::Busy));
    /// drop(r);
    /// ```
    pub fn try_lock_write(&self) -> Result<WriteGuard<'_, T>, LockError> {
        self.raw.try_lock_write()?;
        Ok(WriteGuard { lock: self })
    }

    /// Acquires write access, spinning until all holders release.
    ///
    /// Burns CPU for the whole wait, and unlike [`lock_sync_write`] it does
    /// not register as a waiting writer, so a release that prefers readers
    /// never counts it. Prefer the sync or async flavor for anything but
    /// the shortest holds.
    ///
    /// [`lock_sync_write`]: Self::lock_sync_write
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
    /// let rwlock = RwLock::new(0).unwrap();
    /// *rwlock.lock_spin_write().unwrap() = 7;
    /// assert_eq!(*rwlock.lock_sync_read().unwrap(), 7);
    /// ```
    pub fn lock_spin_write(&self) -> Result<WriteGuard<'_, T>, LockError> {
        loop {
            match self.try_lock_write() {
                Ok(guard) => return Ok(guard),
                Err(LockError::Busy) => std::hint::spin_loop(),
                Err(e) => return Err(e),
            }
        }
    }

    /// Acquires write access, blocking the calling thread until every
    /// reader and any writer have released.
    ///
    /// Readers arriving while this call waits are still admitted first;
    /// under a steady reader stream the wait is unbounded.
    ///
    /// Do not call from async contexts; use [`lock_async_write`] there
    /// instead.
    ///
    /// [`lock_async_write`]: Self::lock_async_write
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
    ///         std::thread::spawn(move || {
    ///             *rwlock.lock_sync_write().unwrap() += 1;
    ///         })
    ///     })
    ///     .collect();
    ///
    /// for handle in handles {
    ///     handle.join().unwrap();
    /// }
    /// assert_eq!(*rwlock.lock_sync_read().unwrap(), 4);
    /// ```
    pub fn lock_sync_write(&self) -> Result<WriteGuard<'_, T>, LockError> {
        self.raw.lock_write()?;
        Ok(WriteGuard { lock: self })
    }

    /// Acquires write access asynchronously.
    ///
    /// The returned future resolves once every reader and any writer have
    /// released. Dropping the future before it resolves abandons the wait
    /// without side effects.
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
    /// {
    ///     let mut guard = rwlock.lock_async_write().await.unwrap();
    ///     guard.push(4);
    /// }
    ///
    /// assert_eq!(rwlock.lock_async_read().await.unwrap().len(), 4);
    /// # });
    /// ```
    pub fn lock_async_write(&self) -> WriteFuture<'_, T> {
        WriteFuture { lock: self }
    }

    /// Runs a closure with exclusive access, blocking until acquired.
    ///
    /// # Examples
    ///
    /// ```
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    /// rwlock.with_mut_sync(|v| v.push(4)).unwrap();
    /// assert_eq!(rwlock.with_sync(|v| v.len()).unwrap(), 4);
    /// ```
    pub fn with_mut_sync<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Result<R, LockError> {
        let mut guard = self.lock_sync_write()?;
        Ok(f(&mut guard))
    }

    /// Runs a closure with exclusive access, acquired asynchronously.
    ///
    /// # Examples
    ///
    /// ```
    /// # futures::executor::block_on(async {
    /// use readfirst::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
    /// rwlock.with_mut_async(|v| v.push(4)).await.unwrap();
    /// assert_eq!(rwlock.with_async(|v| v.len()).await.unwrap(), 4);
    /// # });
    /// ```
    pub async fn with_mut_async<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Result<R, LockError> {
        let mut guard = self.lock_async_write().await?;
        Ok(f(&mut guard))
    }
}

/// Future returned by [`RwLock::lock_async_write`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct WriteFuture<'a, T> {
    pub(crate) lock: &'a RwLock<T>,
}

impl<'a, T> Future for WriteFuture<'a, T> {
    type Output = Result<WriteGuard<'a, T>, LockError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let lock = self.lock;
        // Same ordering as the read future: register under the waiter list
        // so a release draining it cannot slip between try and push.
        let attempt = lock
            .waiting_async_write_tasks
            .with_mut(|tasks| match lock.raw.try_lock_write() {
                Ok(()) => Attempt::Acquired,
                Err(LockError::Busy) => {
                    tasks.push(cx.waker().clone());
                    Attempt::Pending
                }
                Err(e) => Attempt::Failed(e),
            });
        match attempt {
            Attempt::Acquired => Poll::Ready(Ok(WriteGuard { lock })),
            Attempt::Pending => Poll::Pending,
            Attempt::Failed(e) => Poll::Ready(Err(e)),
        }
    }
}
