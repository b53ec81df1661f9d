//! Shared pools - available and completed item sets behind one coarse lock

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;
use parking_lot::{Mutex, MutexGuard};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::Item;

struct PoolState {
    available: Vec<Item>,
    completed: HashSet<Item>,
    // Taken from `available` but not yet recorded as completed.
    in_flight: usize,
    duplicates: usize,
}

/// Copy of the pools taken under a single lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct PoolSnapshot {
    pub available: Vec<Item>,
    pub completed: HashSet<Item>,
    pub in_flight: usize,
}

/// The input and output pools, both serialized by the same lock.
///
/// Nothing here ever calls into the chain, so the two locks are never
/// held together.
///
/// `outstanding` mirrors `available.len() + in_flight`. It is written under
/// the lock and read without it. Takes leave it unchanged and records only
/// lower it, so once it reads zero it stays zero.
pub struct SharedPools {
    state: Mutex<PoolState>,
    outstanding: CachePadded<AtomicUsize>,
    acquisitions: CachePadded<AtomicU64>,
    contended: CachePadded<AtomicU64>,
}

impl SharedPools {
    pub fn new(available: Vec<Item>) -> Self {
        let outstanding = available.len();
        Self {
            state: Mutex::new(PoolState {
                available,
                completed: HashSet::new(),
                in_flight: 0,
                duplicates: 0,
            }),
            outstanding: CachePadded::new(AtomicUsize::new(outstanding)),
            acquisitions: CachePadded::new(AtomicU64::new(0)),
            contended: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Seeds `available` with a uniformly random permutation of `1..=universe`.
    pub fn shuffled<R: Rng + ?Sized>(universe: Item, rng: &mut R) -> Self {
        let mut items: Vec<Item> = (1..=universe).collect();
        items.shuffle(rng);
        Self::new(items)
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        match self.state.try_lock() {
            Some(guard) => guard,
            None => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                self.state.lock()
            }
        }
    }

    /// Removes and returns some remaining item, or `None` when drained.
    pub fn take_available(&self) -> Option<Item> {
        let mut state = self.lock();
        let item = state.available.pop()?;
        state.in_flight += 1;
        Some(item)
    }

    pub fn record_completed(&self, value: Item) {
        let mut state = self.lock();
        if !state.completed.insert(value) {
            state.duplicates += 1;
        }
        state.in_flight = state.in_flight.saturating_sub(1);
        self.outstanding
            .store(state.available.len() + state.in_flight, Ordering::Relaxed);
    }

    /// True while any item is still available or taken but not yet recorded.
    /// Reads the outstanding mirror, so it never takes the lock.
    pub fn has_pending_work(&self) -> bool {
        self.outstanding.load(Ordering::Relaxed) > 0
    }

    pub fn available_is_empty(&self) -> bool {
        self.lock().available.is_empty()
    }

    pub fn available_len(&self) -> usize {
        self.lock().available.len()
    }

    pub fn completed_len(&self) -> usize {
        self.lock().completed.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Completion records that named an item already recorded.
    pub fn duplicate_records(&self) -> usize {
        self.lock().duplicates
    }

    /// Moves the completed set out, leaving it empty.
    pub fn take_completed(&self) -> HashSet<Item> {
        std::mem::take(&mut self.lock().completed)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock();
        PoolSnapshot {
            available: state.available.clone(),
            completed: state.completed.clone(),
            in_flight: state.in_flight,
        }
    }

    /// Total lock acquisitions, contended or not.
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    pub fn contention_count(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SharedPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPools")
            .field("contended", &self.contention_count())
            .finish_non_exhaustive()
    }
}
