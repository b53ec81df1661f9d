//! Ordered chain - sorted singly-linked sequence behind one lock
//!
//! Nodes live in an index arena owned by the chain, so every `next` link is a
//! slot index rather than a pointer. Every public operation takes the chain's
//! lock once and holds it for its whole body.

mod arena;
mod invariants;

pub use invariants::ChainViolation;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;
use parking_lot::{Mutex, MutexGuard};

use crate::Item;
use arena::{NodeArena, NodeId};

// ============================================================================
// CHAIN STATE - Everything the lock protects
// ============================================================================

struct ChainState {
    arena: NodeArena,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    count: usize,
}

impl ChainState {
    fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            head: None,
            tail: None,
            count: 0,
        }
    }

    fn insert(&mut self, value: Item) {
        let node = self.arena.alloc(value);

        match self.head {
            None => {
                self.head = Some(node);
                self.tail = Some(node);
            }
            Some(head) if value <= self.arena.value(head) => {
                self.arena.set_next(node, Some(head));
                self.head = Some(node);
            }
            Some(head) => {
                // Stop at the last node whose successor is still smaller.
                let mut current = head;
                while let Some(next) = self.arena.next(current) {
                    if self.arena.value(next) >= value {
                        break;
                    }
                    current = next;
                }

                let successor = self.arena.next(current);
                self.arena.set_next(node, successor);
                self.arena.set_next(current, Some(node));
                if successor.is_none() {
                    self.tail = Some(node);
                }
            }
        }

        self.count += 1;
    }

    fn pop_head(&mut self) -> Option<Item> {
        let head = self.head?;
        let node = self.arena.release(head);

        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.count -= 1;

        Some(node.value)
    }

    fn values(&self) -> Values<'_> {
        Values {
            arena: &self.arena,
            cursor: self.head,
        }
    }
}

struct Values<'a> {
    arena: &'a NodeArena,
    cursor: Option<NodeId>,
}

impl Iterator for Values<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let id = self.cursor?;
        self.cursor = self.arena.next(id);
        Some(self.arena.value(id))
    }
}

// ============================================================================
// ORDERED CHAIN - Thread-safe public surface
// ============================================================================

/// A sorted chain of items guarded by a single exclusive lock.
///
/// `len` and `is_empty` read an advisory copy of the count that is written
/// under the lock but read without it. They are good enough for loop
/// heuristics; anything that must be exact goes through the lock.
pub struct OrderedChain {
    state: Mutex<ChainState>,
    len: CachePadded<AtomicUsize>,
    contended: CachePadded<AtomicU64>,
}

impl OrderedChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::new()),
            len: CachePadded::new(AtomicUsize::new(0)),
            contended: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Counts the acquisition as contended when the lock is already held.
    fn lock(&self) -> MutexGuard<'_, ChainState> {
        match self.state.try_lock() {
            Some(guard) => guard,
            None => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                self.state.lock()
            }
        }
    }

    /// Inserts `value` keeping the chain non-decreasing.
    ///
    /// A value equal to existing ones lands in front of them.
    pub fn insert(&self, value: Item) {
        let mut state = self.lock();
        state.insert(value);
        self.len.store(state.count, Ordering::Relaxed);
    }

    /// Linear scan for `value`. Sortedness is not used to stop early.
    pub fn search(&self, value: Item) -> bool {
        let state = self.lock();
        state.values().any(|v| v == value)
    }

    /// Detaches the smallest item, or returns `None` when the chain is empty.
    pub fn remove_head(&self) -> Option<Item> {
        let mut state = self.lock();
        let value = state.pop_head()?;
        self.len.store(state.count, Ordering::Relaxed);
        Some(value)
    }

    pub fn peek_head(&self) -> Option<Item> {
        let state = self.lock();
        state.head.map(|id| state.arena.value(id))
    }

    pub fn peek_tail(&self) -> Option<Item> {
        let state = self.lock();
        state.tail.map(|id| state.arena.value(id))
    }

    /// Advisory element count, read without the lock.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-order copy of the chain's values.
    pub fn snapshot(&self) -> Vec<Item> {
        let state = self.lock();
        let mut out = Vec::with_capacity(state.count);
        out.extend(state.values());
        out
    }

    /// Walks the whole chain under the lock and checks its structural invariants.
    pub fn check_invariants(&self) -> Result<(), ChainViolation> {
        self.lock().verify()
    }

    /// Number of lock acquisitions that found the lock already held.
    pub fn contention_count(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }
}

impl Default for OrderedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedChain")
            .field("len", &self.len())
            .field("contended", &self.contention_count())
            .finish_non_exhaustive()
    }
}
