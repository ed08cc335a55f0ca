//! Earley items
//!
//! An item is a partial derivation `(rule, dot, origin)`. Within a column that
//! triple is its identity: two derivations reaching the same triple share one
//! item and are recorded as separate [`Link`]s on it. Items refer to each other
//! by [`ItemId`] (column index plus sequence number), never by address.

use super::grammar::{Grammar, RuleId};
use std::fmt;
use std::mem;

/// Position of an item in the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId {
    /// Column index
    pub column: u32,
    /// Sequence number within the column
    pub seq: u32,
}

impl ItemId {
    /// Create an id
    #[inline]
    pub const fn new(column: u32, seq: u32) -> Self {
        Self { column, seq }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.column, self.seq)
    }
}

/// Identity of an item within a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Rule being matched
    pub rule: RuleId,
    /// Number of right-hand symbols matched so far
    pub dot: u32,
    /// Column where the match began
    pub origin: u32,
}

/// How a derivation step advanced the dot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// A token matched the expected terminal
    Scanned,
    /// A nonterminal was completed by `right`
    Completed,
    /// The token was dropped; the dot did not move
    Deleted,
    /// The token stood in for the expected terminal
    Substituted,
}

/// One derivation of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    /// Kind of step
    pub step: Step,
    /// Item this one was advanced from
    pub left: ItemId,
    /// Completed item that satisfied the symbol (for [`Step::Completed`])
    pub right: Option<ItemId>,
}

/// A chart item
///
/// Predicted items have no links. Every other item has at least one, and the
/// first link's predecessor is its `left_link`.
#[derive(Debug, Clone, Default)]
pub struct Item {
    /// Rule being matched
    pub rule: RuleId,
    /// Number of right-hand symbols matched so far
    pub dot: u32,
    /// Column where the match began
    pub origin: u32,
    /// Cheapest accumulated correction cost over all derivations
    pub error_cost: u32,
    /// Owning column
    pub column: u32,
    /// Sequence number within the owning column
    pub seq: u32,
    /// Derivations, in discovery order, without duplicates
    pub links: Vec<Link>,
}

impl Item {
    /// Position of this item
    #[inline]
    pub fn id(&self) -> ItemId {
        ItemId::new(self.column, self.seq)
    }

    /// Identity key
    #[inline]
    pub fn key(&self) -> ItemKey {
        ItemKey {
            rule: self.rule,
            dot: self.dot,
            origin: self.origin,
        }
    }

    /// Item this one was first derived from (`None` for predictions)
    #[inline]
    pub fn left_link(&self) -> Option<ItemId> {
        self.links.first().map(|link| link.left)
    }

    /// Completed items packed into this one
    pub fn right_links(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.links.iter().filter_map(|link| link.right)
    }

    /// Whether the item came from prediction or seeding
    #[inline]
    pub fn is_predicted(&self) -> bool {
        self.links.is_empty()
    }

    /// Record a derivation; returns `false` if it was already known
    pub fn add_link(&mut self, link: Link) -> bool {
        if self.links.contains(&link) {
            return false;
        }
        self.links.push(link);
        true
    }

    /// Zero the item, keeping link capacity
    pub fn clear(&mut self) {
        let mut links = mem::take(&mut self.links);
        links.clear();
        *self = Item {
            links,
            ..Item::default()
        };
    }

    /// Heap bytes held by the link list
    #[inline]
    pub fn heap_size(&self) -> usize {
        self.links.capacity() * mem::size_of::<Link>()
    }

    /// Render as `c.s [ LHS --> X * Y ], origin, left, <rights>, cost`
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> ItemDisplay<'a> {
        ItemDisplay {
            item: self,
            grammar,
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Item {}

/// Diagnostic rendering of an item
pub struct ItemDisplay<'a> {
    item: &'a Item,
    grammar: &'a Grammar,
}

impl fmt::Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item = self.item;
        write!(
            f,
            "{} [ {} ], {}, ",
            item.id(),
            self.grammar.dotted(item.rule, Some(item.dot)),
            item.origin
        )?;
        match item.left_link() {
            Some(left) => write!(f, "{}, ", left)?,
            None => f.write_str("null, ")?,
        }
        let mut rights = item.right_links().peekable();
        if rights.peek().is_none() {
            f.write_str("<null>")?;
        } else {
            f.write_str("<")?;
            for (i, right) in rights.enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", right)?;
            }
            f.write_str(">")?;
        }
        write!(f, ", {}", item.error_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(left: ItemId, right: ItemId) -> Link {
        Link {
            step: Step::Completed,
            left,
            right: Some(right),
        }
    }

    #[test]
    fn test_equality_ignores_cost_and_links() {
        let a = Item {
            rule: 1,
            dot: 2,
            origin: 0,
            error_cost: 3,
            ..Item::default()
        };
        let mut b = a.clone();
        b.error_cost = 0;
        b.column = 4;
        b.add_link(completed(ItemId::new(1, 0), ItemId::new(2, 0)));
        assert_eq!(a, b);
        b.dot = 1;
        assert_ne!(a, b);
    }

    #[test]
    fn test_links() {
        let mut item = Item::default();
        assert!(item.is_predicted());
        assert_eq!(item.left_link(), None);

        assert!(item.add_link(completed(ItemId::new(0, 1), ItemId::new(2, 3))));
        assert!(!item.add_link(completed(ItemId::new(0, 1), ItemId::new(2, 3))));
        assert!(item.add_link(completed(ItemId::new(1, 0), ItemId::new(2, 5))));
        assert_eq!(item.left_link(), Some(ItemId::new(0, 1)));
        assert_eq!(
            item.right_links().collect::<Vec<_>>(),
            vec![ItemId::new(2, 3), ItemId::new(2, 5)]
        );
    }

    #[test]
    fn test_clear() {
        let mut item = Item {
            rule: 5,
            dot: 1,
            seq: 9,
            ..Item::default()
        };
        item.add_link(completed(ItemId::new(0, 0), ItemId::new(0, 1)));
        item.clear();
        assert_eq!(item.key(), Item::default().key());
        assert_eq!(item.seq, 0);
        assert!(item.links.is_empty());
        assert!(item.links.capacity() > 0);
    }

    #[test]
    fn test_display() {
        let grammar = Grammar::builder()
            .terminals(["num", "+"])
            .rule("E", ["E", "+", "E"])
            .rule("E", ["num"])
            .build()
            .unwrap();
        let mut item = Item {
            rule: 0,
            dot: 3,
            origin: 0,
            column: 5,
            seq: 2,
            ..Item::default()
        };
        item.add_link(completed(ItemId::new(4, 0), ItemId::new(5, 0)));
        item.add_link(completed(ItemId::new(2, 1), ItemId::new(5, 1)));
        assert_eq!(
            item.display(&grammar).to_string(),
            "5.2 [ E --> E + E * ], 0, 4.0, <5.0,5.1>, 0"
        );

        let predicted = Item {
            rule: 1,
            column: 3,
            origin: 3,
            ..Item::default()
        };
        assert_eq!(
            predicted.display(&grammar).to_string(),
            "3.0 [ E --> * num ], 3, null, <null>, 0"
        );
    }
}
