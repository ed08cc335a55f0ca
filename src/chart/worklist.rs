//! Pending-item queue for the closure fixpoint
//!
//! Items are processed in creation order (FIFO), which keeps the order of
//! packed links, and therefore derivation enumeration, deterministic.

use super::item::ItemId;
use hashbrown::HashSet;
use std::collections::VecDeque;

/// FIFO queue with membership tracking
#[derive(Debug, Default)]
pub struct Worklist {
    queue: VecDeque<ItemId>,
    queued: HashSet<ItemId>,
}

impl Worklist {
    /// Create an empty worklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a freshly created item
    #[inline]
    pub fn push(&mut self, id: ItemId) {
        self.queued.insert(id);
        self.queue.push_back(id);
    }

    /// Enqueue `id` unless it is already waiting; returns whether it was added
    #[inline]
    pub fn push_unique(&mut self, id: ItemId) -> bool {
        if !self.queued.insert(id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// Take the oldest pending item
    #[inline]
    pub fn pop(&mut self) -> Option<ItemId> {
        let id = self.queue.pop_front()?;
        self.queued.remove(&id);
        Some(id)
    }

    /// Whether `id` is waiting
    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.queued.contains(&id)
    }

    /// Number of pending items
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut worklist = Worklist::new();
        worklist.push(ItemId::new(0, 0));
        worklist.push(ItemId::new(0, 1));
        worklist.push(ItemId::new(0, 2));
        assert_eq!(worklist.pop(), Some(ItemId::new(0, 0)));
        assert_eq!(worklist.pop(), Some(ItemId::new(0, 1)));
        assert_eq!(worklist.len(), 1);
    }

    #[test]
    fn test_push_unique() {
        let mut worklist = Worklist::new();
        assert!(worklist.push_unique(ItemId::new(1, 3)));
        assert!(!worklist.push_unique(ItemId::new(1, 3)));
        assert!(worklist.contains(ItemId::new(1, 3)));
        assert_eq!(worklist.pop(), Some(ItemId::new(1, 3)));
        assert!(!worklist.contains(ItemId::new(1, 3)));
        assert!(worklist.push_unique(ItemId::new(1, 3)));
        worklist.clear();
        assert!(worklist.is_empty());
        assert_eq!(worklist.pop(), None);
    }
}
