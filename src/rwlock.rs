// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reader-preferring read/write lock with multiple locking strategies.
//!
//! # The Core Problem
//!
//! Mutual exclusion is too blunt for read-mostly data. If ninety-nine
//! accesses in a hundred only look at the value, making them queue behind
//! one another serializes work that could run in parallel. What those
//! workloads want is many simultaneous readers, with writers taking the
//! lock alone only when the data actually changes.
//!
//! # The Solution
//!
//! [`RwLock`] admits any number of readers at once and exactly one writer
//! alone. Its release policy prefers readers: a finishing writer wakes
//! every waiting reader before the next writer, and new readers are
//! admitted even while writers wait. Reads are served with minimal latency;
//! the flip side is that a steady reader stream can delay a writer
//! indefinitely.
//!
//! Unlike most lock types, the lifecycle is checked. Construction asks the
//! operating system for primitives and can fail, so it returns a `Result`,
//! and a torn-down lock is detected and reported as
//! [`LockError::Invalid`](crate::LockError::Invalid) rather than silently
//! misbehaving.
//!
//! # Features
//!
//! - **Four locking strategies.** Each access comes as `try` (fail fast),
//!   `spin` (busy-wait), `sync` (block the thread), and `async` (await
//!   without blocking the executor).
//! - **Guard-based access.** Locking returns [`ReadGuard`] or
//!   [`WriteGuard`]; the data is only reachable through a guard, and
//!   dropping the guard releases the lock.
//! - **Closure helpers.** [`with_sync`](RwLock::with_sync),
//!   [`with_mut_sync`](RwLock::with_mut_sync) and their async counterparts
//!   scope the hold to a closure.
//!
//! [`ReadGuard`]: crate::ReadGuard
//! [`WriteGuard`]: crate::WriteGuard
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use readfirst::RwLock;
//!
//! let rwlock = RwLock::new(5).unwrap();
//!
//! {
//!     let r1 = rwlock.lock_sync_read().unwrap();
//!     let r2 = rwlock.lock_sync_read().unwrap();
//!     assert_eq!(*r1, 5);
//!     assert_eq!(*r2, 5);
//! } // read guards dropped here
//!
//! {
//!     let mut w = rwlock.lock_sync_write().unwrap();
//!     *w += 1;
//!     assert_eq!(*w, 6);
//! } // write guard dropped here
//! ```
//!
//! ## Try Lock
//!
//! ```
//! use readfirst::{LockError, RwLock};
//!
//! let rwlock = RwLock::new(5).unwrap();
//!
//! let w = rwlock.lock_sync_write().unwrap();
//! assert_eq!(rwlock.try_lock_read().err(), Some(LockError::Busy));
//! drop(w);
//! assert!(rwlock.try_lock_read().is_ok());
//! ```
//!
//! ## Async Usage
//!
//! ```
//! use readfirst::RwLock;
//!
//! futures::executor::block_on(async {
//!     let rwlock = RwLock::new(vec![1, 2, 3]).unwrap();
//!
//!     {
//!         let mut guard = rwlock.lock_async_write().await.unwrap();
//!         guard.push(4);
//!     }
//!
//!     let guard = rwlock.lock_async_read().await.unwrap();
//!     assert_eq!(*guard, [1, 2, 3, 4]);
//! });
//! ```
//!
//! ## Sharing Across Threads
//!
//! ```
//! use readfirst::RwLock;
//! use std::sync::Arc;
//!
//! let rwlock = Arc::new(RwLock::new(0u32).unwrap());
//!
//! let writers: Vec<_> = (0..2)
//!     .map(|_| {
//!         let rwlock = rwlock.clone();
//!         std::thread::spawn(move || {
//!             *rwlock.lock_sync_write().unwrap() += 1;
//!         })
//!     })
//!     .collect();
//!
//! for writer in writers {
//!     writer.join().unwrap();
//! }
//!
//! assert_eq!(*rwlock.lock_sync_read().unwrap(), 2);
//! ```

mod inner;
mod read;
mod write;


pub use inner::RwLock;
pub use read::ReadFuture;
pub use write::WriteFuture;

use crate::error::LockError;

/// Outcome of one try-acquire performed under a waiter-list lock.
pub(crate) enum Attempt {
    Acquired,
    Pending,
    Failed(LockError),
}
