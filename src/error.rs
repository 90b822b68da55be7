// SPDX-License-Identifier: MIT OR Apache-2.0
/// Error returned by lock operations.
///
/// Most callers only ever see [`Busy`](LockError::Busy), from the `try_lock`
/// family or from [`RawRwLock::destroy`](crate::RawRwLock::destroy) while the
/// lock is still in use. The remaining variants surface failures of the
/// underlying platform primitives, or use of a [`RawRwLock`](crate::RawRwLock)
/// after it was destroyed.
///
/// # Examples
///
/// ```
/// use readfirst::{LockError, RwLock};
///
/// let rwlock = RwLock::new(42).unwrap();
/// let _writer = rwlock.lock_sync_write().unwrap();
///
/// // Try to read while a writer holds the lock
/// match rwlock.try_lock_read() {
///     Ok(_) => panic!("should not succeed"),
///     Err(LockError::Busy) => println!("a writer is active"),
///     Err(other) => panic!("unexpected failure: {other}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockError {
    /// The lock is held or waited on in a conflicting way right now.
    ///
    /// Returned by the `try_lock` family when the acquisition would have to
    /// wait, and by [`RawRwLock::destroy`](crate::RawRwLock::destroy) while
    /// any holder or waiter exists.
    Busy,
    /// The lock was used after a successful
    /// [`destroy`](crate::RawRwLock::destroy).
    Invalid,
    /// An underlying primitive could not obtain the resources it needed.
    ///
    /// On the pthread backend this corresponds to `ENOMEM` or `EAGAIN` from
    /// `pthread_mutex_init` / `pthread_cond_init`.
    ResourceExhausted,
    /// Any other failure reported by an underlying primitive, carrying the
    /// raw platform error code verbatim.
    ///
    /// If this comes out of an unlock path the internal mutex could not be
    /// released and the lock object should be considered unusable.
    Sys(i32),
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockError::Busy => write!(f, "lock busy"),
            LockError::Invalid => write!(f, "lock used after destroy"),
            LockError::ResourceExhausted => {
                write!(f, "insufficient resources for lock primitive")
            }
            LockError::Sys(code) => write!(f, "lock primitive reported error {code}"),
        }
    }
}

impl std::error::Error for LockError {}

#[cfg(test)]
mod tests {
    use super::LockError;

    #[test]
    fn display_is_stable() {
        assert_eq!(LockError::Busy.to_string(), "lock busy");
        assert_eq!(LockError::Invalid.to_string(), "lock used after destroy");
        assert_eq!(
            LockError::ResourceExhausted.to_string(),
            "insufficient resources for lock primitive"
        );
        assert_eq!(
            LockError::Sys(22).to_string(),
            "lock primitive reported error 22"
        );
    }

    #[test]
    fn implements_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&LockError::Busy);
    }
}
