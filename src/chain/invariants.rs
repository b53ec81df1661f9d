//! Structural checks for a chain, run under its lock
//!
//! | Check      | Description                                         |
//! |------------|-----------------------------------------------------|
//! | Sorted     | every adjacent pair a -> b has a <= b               |
//! | Count      | cached count equals nodes reachable from head       |
//! | Tail       | tail is the last reachable node, or none when empty |
//! | NoLeaks    | arena slots in use equal reachable nodes            |
//! | Acyclic    | the walk from head terminates                       |

use thiserror::Error;

use super::ChainState;
use crate::Item;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("order broken at position {position}: {prev} is followed by {next}")]
    Unsorted { position: usize, prev: Item, next: Item },

    #[error("cached count {cached} but {reachable} nodes reachable from head")]
    CountMismatch { cached: usize, reachable: usize },

    #[error("tail holds {actual:?} but the last reachable node holds {expected:?}")]
    StaleTail {
        expected: Option<Item>,
        actual: Option<Item>,
    },

    #[error("{live} arena slots in use but {reachable} nodes reachable")]
    LeakedNodes { live: usize, reachable: usize },

    #[error("walk from head exceeded {limit} steps")]
    Cycle { limit: usize },
}

impl ChainState {
    pub(super) fn verify(&self) -> Result<(), ChainViolation> {
        let limit = self.arena.capacity();
        let mut reachable = 0usize;
        let mut last = None;
        let mut cursor = self.head;

        while let Some(id) = cursor {
            if reachable == limit {
                return Err(ChainViolation::Cycle { limit });
            }
            let value = self.arena.value(id);
            if let Some(prev) = last {
                if prev > value {
                    return Err(ChainViolation::Unsorted {
                        position: reachable,
                        prev,
                        next: value,
                    });
                }
            }
            last = Some(value);
            reachable += 1;
            cursor = self.arena.next(id);
        }

        if reachable != self.count {
            return Err(ChainViolation::CountMismatch {
                cached: self.count,
                reachable,
            });
        }

        let actual = self.tail.map(|id| self.arena.value(id));
        let tail_is_last = match (self.tail, last) {
            (None, None) => true,
            (Some(id), Some(_)) => self.arena.next(id).is_none() && actual == last,
            _ => false,
        };
        if !tail_is_last {
            return Err(ChainViolation::StaleTail {
                expected: last,
                actual,
            });
        }

        let live = self.arena.live();
        if live != reachable {
            return Err(ChainViolation::LeakedNodes { live, reachable });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_tail_after_manual_unlink_is_reported() {
        let mut state = ChainState::new();
        state.insert(3);
        state.insert(7);

        // Drop the last node without touching the tail.
        let head = state.head.unwrap();
        let last = state.arena.next(head).unwrap();
        state.arena.set_next(head, None);
        state.arena.release(last);
        state.count -= 1;

        assert!(matches!(
            state.verify(),
            Err(ChainViolation::StaleTail { expected: Some(3), .. })
        ));
    }

    #[test]
    fn count_drift_is_reported() {
        let mut state = ChainState::new();
        state.insert(1);
        state.count = 2;

        assert_eq!(
            state.verify(),
            Err(ChainViolation::CountMismatch { cached: 2, reachable: 1 })
        );
    }

    #[test]
    fn out_of_order_link_is_reported() {
        let mut state = ChainState::new();
        state.insert(1);
        state.insert(2);
        let head = state.head.unwrap();
        let second = state.arena.next(head).unwrap();

        // Swap the stored values to break ordering while keeping the links.
        let a = state.arena.release(head).value;
        let b = state.arena.release(second).value;
        let first = state.arena.alloc(b);
        let tail = state.arena.alloc(a);
        state.arena.set_next(first, Some(tail));
        state.head = Some(first);
        state.tail = Some(tail);

        assert!(matches!(
            state.verify(),
            Err(ChainViolation::Unsorted { position: 1, prev: 2, next: 1 })
        ));
    }
}
