// SPDX-License-Identifier: MIT OR Apache-2.0
use super::{RawRwLock, State};
use crate::LockError;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Polls the counters until `pred` holds, failing the test after two seconds.
fn wait_for_state(lock: &RawRwLock, pred: impl Fn(&State) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let state = lock.snapshot().unwrap();
        if pred(&state) {
            return;
        }
        assert!(Instant::now() < deadline, "state never reached: {state:?}");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn fresh_lock_is_idle_and_destroyable() {
    let lock = RawRwLock::new().unwrap();
    let state = lock.snapshot().unwrap();
    assert_eq!(state.active_readers, 0);
    assert_eq!(state.waiting_readers, 0);
    assert_eq!(state.waiting_writers, 0);
    assert!(!state.writer_active);
    lock.destroy().unwrap();
}

#[test]
fn destroy_is_terminal() {
    let lock = RawRwLock::new().unwrap();
    lock.destroy().unwrap();
    assert_eq!(lock.lock_read(), Err(LockError::Invalid));
    assert_eq!(lock.try_lock_read(), Err(LockError::Invalid));
    assert_eq!(lock.unlock_read(), Err(LockError::Invalid));
    assert_eq!(lock.lock_write(), Err(LockError::Invalid));
    assert_eq!(lock.try_lock_write(), Err(LockError::Invalid));
    assert_eq!(lock.unlock_write(), Err(LockError::Invalid));
    assert_eq!(lock.destroy(), Err(LockError::Invalid));
}

#[test]
fn try_lock_conflicts() {
    let lock = RawRwLock::new().unwrap();

    lock.try_lock_read().unwrap();
    lock.try_lock_read().unwrap();
    assert_eq!(lock.try_lock_write(), Err(LockError::Busy));
    lock.unlock_read().unwrap();
    assert_eq!(lock.try_lock_write(), Err(LockError::Busy));
    lock.unlock_read().unwrap();

    lock.try_lock_write().unwrap();
    assert_eq!(lock.try_lock_read(), Err(LockError::Busy));
    assert_eq!(lock.try_lock_write(), Err(LockError::Busy));
    lock.unlock_write().unwrap();

    lock.try_lock_read().unwrap();
    lock.unlock_read().unwrap();
    lock.destroy().unwrap();
}

#[test]
fn busy_trylock_leaves_lock_usable() {
    let lock = RawRwLock::new().unwrap();
    lock.lock_write().unwrap();
    assert_eq!(lock.try_lock_read(), Err(LockError::Busy));
    assert_eq!(lock.try_lock_write(), Err(LockError::Busy));
    lock.unlock_write().unwrap();
    // A Busy trylock must have released the internal mutex on the way out.
    lock.try_lock_read().unwrap();
    lock.unlock_read().unwrap();
    lock.destroy().unwrap();
}

#[test]
fn destroy_busy_while_held() {
    let lock = RawRwLock::new().unwrap();
    lock.lock_write().unwrap();
    assert_eq!(lock.destroy(), Err(LockError::Busy));
    lock.unlock_write().unwrap();

    lock.lock_read().unwrap();
    assert_eq!(lock.destroy(), Err(LockError::Busy));
    lock.unlock_read().unwrap();

    lock.destroy().unwrap();
}

#[test]
fn destroy_busy_with_waiting_writer() {
    let lock = Arc::new(RawRwLock::new().unwrap());
    lock.lock_read().unwrap();

    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            lock.lock_write().unwrap();
            lock.unlock_write().unwrap();
        })
    };
    wait_for_state(&lock, |s| s.waiting_writers == 1);

    assert_eq!(lock.destroy(), Err(LockError::Busy));

    lock.unlock_read().unwrap();
    writer.join().unwrap();
    lock.destroy().unwrap();
}

#[test]
fn write_release_prefers_waiting_readers() {
    let lock = Arc::new(RawRwLock::new().unwrap());
    let (events_tx, events) = mpsc::channel::<&'static str>();

    lock.lock_write().unwrap();

    let writer = {
        let lock = Arc::clone(&lock);
        let events = events_tx.clone();
        thread::spawn(move || {
            lock.lock_write().unwrap();
            events.send("writer in").unwrap();
            lock.unlock_write().unwrap();
        })
    };
    wait_for_state(&lock, |s| s.waiting_writers == 1);

    let reader = {
        let lock = Arc::clone(&lock);
        let events = events_tx.clone();
        thread::spawn(move || {
            lock.lock_read().unwrap();
            events.send("reader in").unwrap();
            thread::sleep(Duration::from_millis(50));
            lock.unlock_read().unwrap();
        })
    };
    wait_for_state(&lock, |s| s.waiting_readers == 1);

    // Both parties wait; the reader must win the release.
    lock.unlock_write().unwrap();

    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).unwrap(),
        "reader in"
    );
    // The writer stays blocked while the reader holds the lock.
    assert!(events.recv_timeout(Duration::from_millis(20)).is_err());
    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).unwrap(),
        "writer in"
    );

    writer.join().unwrap();
    reader.join().unwrap();
    lock.destroy().unwrap();
}

#[test]
fn last_reader_release_wakes_one_writer() {
    let lock = Arc::new(RawRwLock::new().unwrap());
    lock.lock_read().unwrap();
    lock.lock_read().unwrap();

    let (events_tx, events) = mpsc::channel::<&'static str>();
    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            lock.lock_write().unwrap();
            events_tx.send("writer in").unwrap();
            lock.unlock_write().unwrap();
        })
    };
    wait_for_state(&lock, |s| s.waiting_writers == 1);

    lock.unlock_read().unwrap();
    // One reader still active; the writer keeps waiting.
    assert!(events.recv_timeout(Duration::from_millis(20)).is_err());

    lock.unlock_read().unwrap();
    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).unwrap(),
        "writer in"
    );
    writer.join().unwrap();

    let state = lock.snapshot().unwrap();
    assert_eq!(state.waiting_writers, 0);
    assert!(!state.writer_active);
    lock.destroy().unwrap();
}

#[test]
fn readers_admitted_while_writer_waits() {
    let lock = Arc::new(RawRwLock::new().unwrap());
    lock.lock_read().unwrap();

    let (events_tx, events) = mpsc::channel::<&'static str>();
    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            lock.lock_write().unwrap();
            events_tx.send("writer in").unwrap();
            lock.unlock_write().unwrap();
        })
    };
    wait_for_state(&lock, |s| s.waiting_writers == 1);

    // A waiting writer does not gate new readers; this is where writer
    // starvation comes from.
    lock.try_lock_read().unwrap();
    lock.lock_read().unwrap();

    let state = lock.snapshot().unwrap();
    assert_eq!(state.active_readers, 3);
    assert_eq!(state.waiting_writers, 1);
    assert!(events.try_recv().is_err());

    lock.unlock_read().unwrap();
    lock.unlock_read().unwrap();
    lock.unlock_read().unwrap();

    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).unwrap(),
        "writer in"
    );
    writer.join().unwrap();

    let state = lock.snapshot().unwrap();
    assert_eq!(state.active_readers, 0);
    assert_eq!(state.waiting_writers, 0);
    lock.destroy().unwrap();
}

#[test]
fn concurrent_readers_share_the_lock() {
    let lock = Arc::new(RawRwLock::new().unwrap());
    let mut releases = Vec::new();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let (release_tx, release) = mpsc::channel::<()>();
        releases.push(release_tx);
        let lock = Arc::clone(&lock);
        handles.push(thread::spawn(move || {
            lock.lock_read().unwrap();
            release.recv().unwrap();
            lock.unlock_read().unwrap();
        }));
    }

    // All four must be inside at the same time.
    wait_for_state(&lock, |s| s.active_readers == 4);

    for release in releases {
        release.send(()).unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    wait_for_state(&lock, |s| s.active_readers == 0);
    lock.destroy().unwrap();
}
