//! Chart columns
//!
//! Column `j` holds every item valid after the first `j` tokens. Items are
//! filed by the symbol they expect next so the scanner and the completer can
//! find their candidates without walking the whole column:
//!
//! - slot 0 lists items whose dot is at the end of their rule
//! - slot `s` lists items waiting on symbol `s`
//!
//! A second per-nonterminal table records zero-width completions (end-of-rule
//! items that started in this very column). When an item that waits on `B` is
//! added after `B` already completed here, those completions are queued again
//! so the new item is advanced too.

use super::arena::{ItemArena, Slot};
use super::grammar::{Grammar, RuleId, SymbolId};
use super::item::{Item, ItemId, ItemKey, Link};
use super::worklist::Worklist;
use crate::lexer::Token;
use hashbrown::HashMap;

/// Fields of an item about to be created
#[derive(Debug, Clone, Copy)]
pub struct NewItem {
    /// Rule being matched
    pub rule: RuleId,
    /// Dot position
    pub dot: u32,
    /// Column where the match began
    pub origin: u32,
    /// Accumulated correction cost
    pub error_cost: u32,
    /// Derivation step, `None` for predictions and seeds
    pub link: Option<Link>,
}

impl NewItem {
    /// Identity key of the item
    #[inline]
    pub fn key(&self) -> ItemKey {
        ItemKey {
            rule: self.rule,
            dot: self.dot,
            origin: self.origin,
        }
    }
}

/// The items valid at one input position
#[derive(Debug)]
pub struct Column {
    index: u32,
    /// Token that opened this column (`None` for column 0)
    token: Option<Token>,
    /// Arena slots in `seq` order
    slots: Vec<Slot>,
    /// Item seqs per expected symbol; slot 0 holds end-of-rule items
    by_symbol: Vec<Vec<u32>>,
    /// Whether a symbol's productions were already predicted here
    predicted: Vec<bool>,
    /// Zero-width completions per nonterminal index
    nullable: Vec<Vec<u32>>,
    keys: HashMap<ItemKey, u32>,
    completed: bool,
}

impl Column {
    /// Create an empty column sized for `grammar`
    pub fn new(grammar: &Grammar, index: u32, token: Option<Token>) -> Self {
        let symbols = grammar.num_symbols() + 1;
        Self {
            index,
            token,
            slots: Vec::new(),
            by_symbol: vec![Vec::new(); symbols],
            predicted: vec![false; symbols],
            nullable: vec![Vec::new(); grammar.num_nonterminals()],
            keys: HashMap::new(),
            completed: false,
        }
    }

    /// Position of this column in the chart
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Token that opened this column
    #[inline]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Number of items
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the column holds no items
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether a completed start item rooted at column 0 is present
    #[inline]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Chart id of the item with sequence number `seq`
    #[inline]
    pub fn id(&self, seq: u32) -> ItemId {
        ItemId::new(self.index, seq)
    }

    /// Arena slot of the item with sequence number `seq`
    #[inline]
    pub fn slot(&self, seq: u32) -> Option<Slot> {
        self.slots.get(seq as usize).copied()
    }

    /// Borrow the item with sequence number `seq`
    #[inline]
    pub fn get<'a>(&self, arena: &'a ItemArena, seq: u32) -> Option<&'a Item> {
        self.slot(seq).map(|slot| arena.get(slot))
    }

    /// Items in creation order
    pub fn items<'a>(&'a self, arena: &'a ItemArena) -> impl Iterator<Item = &'a Item> + 'a {
        self.slots.iter().map(move |&slot| arena.get(slot))
    }

    /// Sequence number of the item with `key`, if present
    #[inline]
    pub fn find(&self, key: ItemKey) -> Option<u32> {
        self.keys.get(&key).copied()
    }

    /// Items waiting on `symbol`
    #[inline]
    pub fn waiting_on(&self, symbol: SymbolId) -> &[u32] {
        self.by_symbol
            .get(symbol as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Items whose dot is at the end of their rule
    #[inline]
    pub fn ends(&self) -> &[u32] {
        &self.by_symbol[0]
    }

    /// Terminals some item in this column is waiting on
    pub fn expected_terminals(&self, grammar: &Grammar) -> Vec<SymbolId> {
        grammar
            .terminals()
            .filter(|&t| !self.waiting_on(t).is_empty())
            .collect()
    }

    /// Mark `symbol` as predicted; returns `false` if it already was
    #[inline]
    pub fn mark_predicted(&mut self, symbol: SymbolId) -> bool {
        let flag = &mut self.predicted[symbol as usize];
        !std::mem::replace(flag, true)
    }

    /// Queue again every zero-width completion of `symbol`
    pub fn requeue_nullable(&self, grammar: &Grammar, symbol: SymbolId, worklist: &mut Worklist) {
        if !grammar.is_nonterminal(symbol) {
            return;
        }
        for &seq in &self.nullable[grammar.nonterminal_index(symbol)] {
            worklist.push_unique(self.id(seq));
        }
    }

    /// Create an item and queue it
    ///
    /// The caller is responsible for checking [`Column::find`] first; keys
    /// must stay unique within a column.
    pub fn add_item(
        &mut self,
        arena: &mut ItemArena,
        worklist: &mut Worklist,
        grammar: &Grammar,
        new: NewItem,
    ) -> ItemId {
        debug_assert!(self.find(new.key()).is_none(), "duplicate item key");
        let seq = self.slots.len() as u32;
        let slot = arena.allocate();
        let item = arena.get_mut(slot);
        item.rule = new.rule;
        item.dot = new.dot;
        item.origin = new.origin;
        item.error_cost = new.error_cost;
        item.column = self.index;
        item.seq = seq;
        item.links.extend(new.link);

        self.slots.push(slot);
        self.keys.insert(new.key(), seq);
        let id = self.id(seq);
        worklist.push(id);

        match grammar.rhs(new.rule, new.dot) {
            None => {
                self.by_symbol[0].push(seq);
                let lhs = grammar.lhs(new.rule);
                if new.origin == self.index {
                    self.nullable[grammar.nonterminal_index(lhs)].push(seq);
                }
                if lhs == grammar.start() && new.origin == 0 {
                    self.completed = true;
                }
            }
            Some(symbol) => {
                self.by_symbol[symbol as usize].push(seq);
                self.requeue_nullable(grammar, symbol, worklist);
            }
        }
        id
    }

    /// Give every slot back to the arena
    ///
    /// Calling this twice is harmless; the second call finds nothing to free.
    pub fn teardown(&mut self, arena: &mut ItemArena) {
        for slot in self.slots.drain(..) {
            arena.release(slot);
        }
        self.by_symbol.iter_mut().for_each(Vec::clear);
        self.nullable.iter_mut().for_each(Vec::clear);
        self.predicted.iter_mut().for_each(|p| *p = false);
        self.keys.clear();
        self.completed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::item::Step;

    fn grammar() -> Grammar {
        Grammar::builder()
            .terminals(["a", "b"])
            .rule("S", ["a", "S", "b"])
            .epsilon("S")
            .build()
            .unwrap()
    }

    fn new_item(rule: RuleId, dot: u32, origin: u32) -> NewItem {
        NewItem {
            rule,
            dot,
            origin,
            error_cost: 0,
            link: None,
        }
    }

    #[test]
    fn test_new_column_is_sized() {
        let g = grammar();
        let column = Column::new(&g, 0, None);
        assert!(column.is_empty());
        assert_eq!(column.by_symbol.len(), g.num_symbols() + 1);
        assert_eq!(column.nullable.len(), 1);
        assert!(column.waiting_on(99).is_empty());
    }

    #[test]
    fn test_add_item_files_by_expected_symbol() {
        let g = grammar();
        let mut arena = ItemArena::new();
        let mut worklist = Worklist::new();
        let mut column = Column::new(&g, 0, None);

        let a = column.add_item(&mut arena, &mut worklist, &g, new_item(0, 0, 0));
        let b = column.add_item(&mut arena, &mut worklist, &g, new_item(0, 1, 0));
        assert_eq!(a, ItemId::new(0, 0));
        assert_eq!(b, ItemId::new(0, 1));
        assert_eq!(column.waiting_on(g.symbol("a").unwrap()), &[0]);
        assert_eq!(column.waiting_on(g.start()), &[1]);
        assert_eq!(column.find(ItemKey { rule: 0, dot: 1, origin: 0 }), Some(1));
        assert_eq!(column.expected_terminals(&g), vec![g.symbol("a").unwrap()]);
        assert_eq!(worklist.len(), 2);
    }

    #[test]
    fn test_completed_flag() {
        let g = grammar();
        let mut arena = ItemArena::new();
        let mut worklist = Worklist::new();
        let mut column = Column::new(&g, 0, None);
        column.add_item(&mut arena, &mut worklist, &g, new_item(0, 0, 0));
        assert!(!column.completed());
        column.add_item(&mut arena, &mut worklist, &g, new_item(1, 0, 0));
        assert!(column.completed());
        assert_eq!(column.ends(), &[1]);
    }

    #[test]
    fn test_nullable_completion_requeued() {
        let g = grammar();
        let mut arena = ItemArena::new();
        let mut worklist = Worklist::new();
        let mut column = Column::new(&g, 0, None);

        // S --> * (zero-width) first, then an item waiting on S
        let empty = column.add_item(&mut arena, &mut worklist, &g, new_item(1, 0, 0));
        assert_eq!(worklist.pop(), Some(empty));
        let waiting = column.add_item(
            &mut arena,
            &mut worklist,
            &g,
            NewItem {
                link: Some(Link {
                    step: Step::Scanned,
                    left: ItemId::new(0, 0),
                    right: None,
                }),
                ..new_item(0, 1, 0)
            },
        );
        assert_eq!(worklist.pop(), Some(waiting));
        assert_eq!(worklist.pop(), Some(empty));
        assert!(worklist.is_empty());
        assert_eq!(
            column.get(&arena, 1).and_then(Item::left_link),
            Some(ItemId::new(0, 0))
        );
    }

    #[test]
    fn test_mark_predicted_once() {
        let g = grammar();
        let mut column = Column::new(&g, 0, None);
        assert!(column.mark_predicted(g.start()));
        assert!(!column.mark_predicted(g.start()));
    }

    #[test]
    fn test_teardown_releases_once() {
        let g = grammar();
        let mut arena = ItemArena::new();
        let mut worklist = Worklist::new();
        let mut column = Column::new(&g, 0, None);
        column.add_item(&mut arena, &mut worklist, &g, new_item(0, 0, 0));
        column.add_item(&mut arena, &mut worklist, &g, new_item(1, 0, 0));
        assert_eq!(arena.live(), 2);

        column.teardown(&mut arena);
        assert_eq!(arena.live(), 0);
        assert!(column.is_empty());
        assert!(!column.completed());
        column.teardown(&mut arena);
        assert_eq!(arena.live(), 0);
    }
}
