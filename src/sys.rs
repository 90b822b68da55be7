// SPDX-License-Identifier: MIT OR Apache-2.0
//! Platform mutex and condition-variable primitives.
//!
//! The lock core is written against a small fallible interface: a mutex with
//! `new`/`lock`/`unlock` and a condition variable with
//! `new`/`wait`/`signal`/`broadcast`, every operation returning a `Result` so
//! primitive failures propagate instead of disappearing. Two backends provide
//! it:
//!
//! - **pthread** (`cfg(unix)`): thin wrappers over `pthread_mutex_t` and
//!   `pthread_cond_t`, which report real error codes.
//! - **portable** (everything else): atomics plus thread parking. Its
//!   operations cannot fail, but they keep the same signatures so the core
//!   does not care which backend it got.
//!
//! `unlock` and `wait` are `unsafe fn`s: the caller must hold the mutex, a
//! precondition the pthread backend cannot verify.

#[cfg(unix)]
mod pthread;
#[cfg(not(unix))]
mod portable;

#[cfg(unix)]
pub(crate) use pthread::{Condvar, Mutex};
#[cfg(not(unix))]
pub(crate) use portable::{Condvar, Mutex};
