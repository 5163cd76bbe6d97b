//! Bounded-concurrency runner over an item list.
//!
//! A fixed number of workers share one cursor; each takes the next unclaimed
//! index as soon as it is free, so a slow item only holds up its own worker.
//! Results are written into per-item slots, never appended in completion
//! order.

use std::future::Future;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

/// One write-once slot per input item.
#[derive(Debug)]
pub struct SlotTable<T> {
    slots: Vec<OnceLock<T>>,
}

impl<T> SlotTable<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store the result for `index`.
    ///
    /// Returns `false` if the slot was already filled or does not exist.
    pub fn fill(&self, index: usize, value: T) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.set(value).is_ok())
    }

    pub fn is_filled(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of filled slots right now.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// Copy out the slots filled so far, in item order.
    ///
    /// Does not wait for in-flight workers.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.slots.iter().filter_map(|s| s.get().cloned()).collect()
    }

    /// Consume the table; unfilled slots are `None`.
    pub fn into_slots(self) -> Vec<Option<T>> {
        self.slots.into_iter().map(OnceLock::into_inner).collect()
    }
}

/// Number of workers for `items` items: `concurrency`, at least one, and
/// never more than there are items.
pub fn worker_count(concurrency: usize, items: usize) -> usize {
    concurrency.min(items).max(1)
}

/// Run `worker` once for every item, at most `concurrency` at a time.
///
/// Workers run on the calling task and interleave at their await points.
pub async fn for_each_indexed<'a, T, F, Fut>(items: &'a [T], concurrency: usize, worker: F)
where
    F: Fn(usize, &'a T) -> Fut,
    Fut: Future<Output = ()>,
{
    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let worker = &worker;

    let workers = (0..worker_count(concurrency, items.len())).map(|_| async move {
        loop {
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(index) else {
                break;
            };
            worker(index, item).await;
        }
    });

    join_all(workers).await;
}
