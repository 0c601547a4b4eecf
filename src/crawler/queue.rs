//! FIFO queue of fetch targets

use crate::target::FetchTarget;
use crate::QueueError;
use std::collections::VecDeque;

/// Ordered queue of targets, consumed strictly front to back
///
/// No deduplication happens here: a target queued twice is fetched twice.
#[derive(Debug, Clone, Default)]
pub struct TargetQueue {
    items: VecDeque<FetchTarget>,
}

impl TargetQueue {
    /// Creates a queue holding `targets` in order
    pub fn new(targets: impl IntoIterator<Item = FetchTarget>) -> Self {
        Self {
            items: targets.into_iter().collect(),
        }
    }

    /// Returns whether anything is left to pop
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Removes the front target
    ///
    /// Callers are expected to check [`has_items`](Self::has_items) first;
    /// popping an empty queue is a logic error reported as `QueueError::Empty`.
    pub fn pop(&mut self) -> Result<FetchTarget, QueueError> {
        self.items.pop_front().ok_or(QueueError::Empty)
    }

    /// Appends a target to the back
    pub fn push(&mut self, target: FetchTarget) {
        self.items.push_back(target);
    }

    /// Number of queued targets
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
