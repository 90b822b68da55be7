// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-module workload tests driving the lock from many threads at once.

use crate::RwLock;
use std::sync::Arc;

const WORKERS: usize = 5;
const CELLS: usize = 15;
const ITERATIONS: usize = 10_000;
const PERIODS: [usize; WORKERS] = [7, 13, 29, 41, 53];

/// Multiplier tying a cell's checksum to its value. A read that observes a
/// half-finished write sees a pair that fails this relation.
const STAMP: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Default)]
struct Cell {
    value: u64,
    check: u64,
    updates: u64,
}

fn worker(cells: &[RwLock<Cell>], index: usize) -> u64 {
    let period = PERIODS[index];
    let mut element = index;
    let mut updates = 0u64;

    for iteration in 0..ITERATIONS {
        let cell = &cells[element % CELLS];
        if iteration % period == 0 {
            cell.with_mut_sync(|c| {
                c.value = c.value.wrapping_add(1);
                c.check = c.value.wrapping_mul(STAMP);
                c.updates += 1;
            })
            .unwrap();
            updates += 1;
        } else {
            cell.with_sync(|c| {
                assert_eq!(c.check, c.value.wrapping_mul(STAMP), "torn read");
            })
            .unwrap();
        }
        element += 1;
    }

    updates
}

#[test]
fn workload_keeps_counts_consistent() {
    let cells: Arc<Vec<RwLock<Cell>>> = Arc::new(
        (0..CELLS)
            .map(|_| RwLock::new(Cell::default()).unwrap())
            .collect(),
    );

    let handles: Vec<_> = (0..WORKERS)
        .map(|index| {
            let cells = cells.clone();
            std::thread::spawn(move || worker(&cells, index))
        })
        .collect();

    let mut thread_updates = 0u64;
    for (index, handle) in handles.into_iter().enumerate() {
        let updates = handle.join().unwrap();
        let expected = ((ITERATIONS - 1) / PERIODS[index] + 1) as u64;
        assert_eq!(updates, expected, "worker {index} update count");
        thread_updates += updates;
    }

    let mut cell_updates = 0u64;
    let mut cell_values = 0u64;
    for cell in cells.iter() {
        let guard = cell.lock_sync_read().unwrap();
        assert_eq!(guard.check, guard.value.wrapping_mul(STAMP));
        cell_updates += guard.updates;
        cell_values += guard.value;
    }

    assert_eq!(cell_updates, thread_updates);
    assert_eq!(cell_values, thread_updates);
}

#[test]
fn mixed_sync_and_async_traffic() {
    const WRITES: u64 = 1_000;

    let counter = Arc::new(RwLock::new((0u64, 0u64)).unwrap());

    let writer = {
        let counter = counter.clone();
        std::thread::spawn(move || {
            for _ in 0..WRITES {
                counter
                    .with_mut_sync(|(value, check)| {
                        *value += 1;
                        *check = value.wrapping_mul(STAMP);
                    })
                    .unwrap();
            }
        })
    };

    let mut last_seen = 0;
    while last_seen < WRITES {
        last_seen = futures::executor::block_on(async {
            counter
                .with_async(|(value, check)| {
                    assert_eq!(*check, value.wrapping_mul(STAMP), "torn read");
                    *value
                })
                .await
                .unwrap()
        });
    }

    writer.join().unwrap();
    assert_eq!(counter.with_sync(|(value, _)| *value).unwrap(), WRITES);
}
