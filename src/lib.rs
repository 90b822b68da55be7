// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reader-preferring read/write lock with multiple locking strategies and
//! a checked lifecycle.
//!
//! See [`RwLock`] for the typed, guard-based surface and [`RawRwLock`] for
//! the raw operation set underneath it.

mod error;
mod guard;
pub mod raw;
pub mod rwlock;
mod spinlock;
mod sys;

#[cfg(test)]
mod stress_tests;

pub use error::LockError;
pub use guard::{ReadGuard, WriteGuard};
pub use raw::RawRwLock;
pub use rwlock::{ReadFuture, RwLock, WriteFuture};
