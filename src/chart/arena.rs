//! Arena allocator for chart items
//!
//! Every item created during a parse run lives in one [`ItemArena`]. Slots
//! are handed out from a free list first and otherwise from storage that
//! grows in blocks of [`ITEM_BLOCK_SIZE`], so allocation is O(1) amortized
//! and no item is individually heap-allocated. Columns give their slots back
//! when they are torn down; the arena keeps its capacity for the next run.

use super::item::Item;
use std::mem;

/// Number of item slots added whenever the arena grows
pub const ITEM_BLOCK_SIZE: usize = 1024;

/// Handle to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    /// Raw slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of item slots with a free list
#[derive(Debug)]
pub struct ItemArena {
    slots: Vec<Item>,
    /// Whether each slot is currently handed out
    in_use: Vec<bool>,
    free: Vec<Slot>,
    live: usize,
    peak: usize,
}

impl Default for ItemArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemArena {
    /// Create an arena with one block of capacity
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(ITEM_BLOCK_SIZE)
    }

    /// Create an arena with the given slot capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            in_use: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
            peak: 0,
        }
    }

    /// Create an arena sized for an expected token count
    ///
    /// Charts typically hold a few dozen items per column.
    #[inline]
    pub fn for_tokens(tokens: usize) -> Self {
        let estimated = (tokens + 1).saturating_mul(32);
        let blocks = estimated.div_ceil(ITEM_BLOCK_SIZE).clamp(1, 1024);
        Self::with_capacity(blocks * ITEM_BLOCK_SIZE)
    }

    /// Hand out a slot holding a zero-initialized item
    pub fn allocate(&mut self) -> Slot {
        self.live += 1;
        self.peak = self.peak.max(self.live);
        if let Some(slot) = self.free.pop() {
            self.in_use[slot.index()] = true;
            return slot;
        }
        if self.slots.len() == self.slots.capacity() {
            self.slots.reserve_exact(ITEM_BLOCK_SIZE);
            self.in_use.reserve_exact(ITEM_BLOCK_SIZE);
        }
        let slot = Slot(self.slots.len() as u32);
        self.slots.push(Item::default());
        self.in_use.push(true);
        slot
    }

    /// Return a slot to the free list
    ///
    /// The item is cleared but its link storage keeps its capacity.
    pub fn release(&mut self, slot: Slot) {
        debug_assert!(self.in_use[slot.index()], "slot released twice");
        if !mem::replace(&mut self.in_use[slot.index()], false) {
            return;
        }
        self.slots[slot.index()].clear();
        self.free.push(slot);
        self.live -= 1;
    }

    /// Borrow the item in a slot
    #[inline]
    pub fn get(&self, slot: Slot) -> &Item {
        &self.slots[slot.index()]
    }

    /// Mutably borrow the item in a slot
    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> &mut Item {
        &mut self.slots[slot.index()]
    }

    /// Number of live items
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Highest live count since creation or the last reset
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Whether no item is live
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slot capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Drop every item at once, keeping capacity
    ///
    /// Every slot must have been released first.
    pub(crate) fn reset(&mut self) {
        debug_assert_eq!(self.live, 0, "arena reset with live slots");
        self.slots.clear();
        self.in_use.clear();
        self.free.clear();
        self.live = 0;
        self.peak = 0;
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        let links: usize = self.slots.iter().map(Item::heap_size).sum();
        self.slots.capacity() * mem::size_of::<Item>()
            + self.in_use.capacity()
            + self.free.capacity() * mem::size_of::<Slot>()
            + links
    }
}
