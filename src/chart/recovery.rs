//! Cost-bounded error recovery
//!
//! When recovery is enabled the engine can repair the input around a token
//! that fits nowhere. For every item waiting on a terminal, two corrections
//! are considered:
//!
//! - **deletion**: drop the token, keep the dot where it is
//! - **substitution**: pretend the token was the expected terminal and
//!   advance the dot
//!
//! Each correction adds a cost chosen by an [`ErrorCostProvider`]. Corrections
//! whose accumulated cost would exceed `max_error_value` are never created,
//! so every item in the chart stays within the configured ceiling.

use super::column::NewItem;
use super::error::{ParseError, Rejection};
use super::grammar::{Grammar, RuleId, SymbolId};
use super::item::{ItemId, Link, Step};
use super::parser::EarleyParser;
use crate::lexer::Token;
use serde::{Deserialize, Serialize};

/// When corrections are attempted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMode {
    /// Reject on the first token that cannot be scanned
    #[default]
    Disabled,
    /// Try corrections only when the scanner fails
    OnFailure,
    /// Add corrections at every token, next to the regular scan
    ///
    /// Every derivation within the ceiling is explored, so raising the
    /// ceiling never loses a derivation found at a lower one.
    Continuous,
}

/// An item waiting on a terminal, as seen by a cost provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitingItem {
    /// Chart position of the item
    pub id: ItemId,
    /// Rule being matched
    pub rule: RuleId,
    /// Dot position
    pub dot: u32,
    /// Column where the match began
    pub origin: u32,
    /// Terminal after the dot
    pub expected: SymbolId,
    /// Cost accumulated so far
    pub error_cost: u32,
}

/// Price of the two corrections for one waiting item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrectionCost {
    /// Cost of reading the token as the expected terminal
    pub substitution: u32,
    /// Cost of dropping the token
    pub deletion: u32,
}

impl CorrectionCost {
    /// Create a cost pair
    #[inline]
    pub const fn new(substitution: u32, deletion: u32) -> Self {
        Self {
            substitution,
            deletion,
        }
    }
}

/// Assigns correction costs
///
/// Implementations must return exactly one [`CorrectionCost`] per waiting
/// item, in the same order. Any closure
/// `Fn(&Grammar, &WaitingItem, &Token) -> CorrectionCost` is a provider.
pub trait ErrorCostProvider {
    /// Costs for correcting `found` at each of `waiting`
    fn costs(&self, grammar: &Grammar, waiting: &[WaitingItem], found: &Token)
        -> Vec<CorrectionCost>;
}

impl<F> ErrorCostProvider for F
where
    F: Fn(&Grammar, &WaitingItem, &Token) -> CorrectionCost,
{
    fn costs(
        &self,
        grammar: &Grammar,
        waiting: &[WaitingItem],
        found: &Token,
    ) -> Vec<CorrectionCost> {
        waiting.iter().map(|w| self(grammar, w, found)).collect()
    }
}

/// The same cost for every correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformCosts(pub CorrectionCost);

impl Default for UniformCosts {
    fn default() -> Self {
        Self(CorrectionCost::new(1, 1))
    }
}

impl ErrorCostProvider for UniformCosts {
    fn costs(
        &self,
        _grammar: &Grammar,
        waiting: &[WaitingItem],
        _found: &Token,
    ) -> Vec<CorrectionCost> {
        vec![self.0; waiting.len()]
    }
}

/// Result of generating corrections for one token
#[derive(Debug)]
pub(crate) enum Corrections {
    /// Items for the next column
    Items(Vec<NewItem>),
    /// No item waits on a terminal
    NothingWaiting,
    /// Every correction exceeds the ceiling
    OverBudget,
}

impl Corrections {
    pub(crate) fn into_rejection(self, column: usize, token: Token) -> Option<Rejection> {
        match self {
            Corrections::Items(_) => None,
            Corrections::NothingWaiting => Some(Rejection::RecoveryExhausted { column, token }),
            Corrections::OverBudget => Some(Rejection::BudgetExceeded { column, token }),
        }
    }
}

impl EarleyParser<'_> {
    /// Items in the last column waiting on any terminal
    pub(crate) fn waiting_items(&self) -> Vec<WaitingItem> {
        let Some(column) = self.columns.last() else {
            return Vec::new();
        };
        let mut waiting = Vec::new();
        for terminal in self.grammar.terminals() {
            for &seq in column.waiting_on(terminal) {
                if let Some(item) = column.get(&self.arena, seq) {
                    waiting.push(WaitingItem {
                        id: item.id(),
                        rule: item.rule,
                        dot: item.dot,
                        origin: item.origin,
                        expected: terminal,
                        error_cost: item.error_cost,
                    });
                }
            }
        }
        waiting.sort_by_key(|w| w.id);
        waiting
    }

    /// Corrections for `found` at the last column
    pub(crate) fn corrections(&mut self, found: &Token) -> Result<Corrections, ParseError> {
        let waiting = self.waiting_items();
        if waiting.is_empty() {
            return Ok(Corrections::NothingWaiting);
        }
        let costs = self.costs.costs(self.grammar, &waiting, found);
        if costs.len() != waiting.len() {
            return Err(ParseError::Collaborator {
                message: format!(
                    "cost provider returned {} costs for {} waiting items",
                    costs.len(),
                    waiting.len()
                ),
            });
        }

        let ceiling = self.config.max_error_value;
        let actual = self.grammar.terminal_for_kind(found.kind);
        let mut items = Vec::new();
        for (w, cost) in waiting.iter().zip(&costs) {
            let deleted = w.error_cost.saturating_add(cost.deletion);
            if deleted <= ceiling {
                items.push(NewItem {
                    rule: w.rule,
                    dot: w.dot,
                    origin: w.origin,
                    error_cost: deleted,
                    link: Some(Link {
                        step: Step::Deleted,
                        left: w.id,
                        right: None,
                    }),
                });
            }
            let substituted = w.error_cost.saturating_add(cost.substitution);
            if actual != Some(w.expected) && substituted <= ceiling {
                items.push(NewItem {
                    rule: w.rule,
                    dot: w.dot + 1,
                    origin: w.origin,
                    error_cost: substituted,
                    link: Some(Link {
                        step: Step::Substituted,
                        left: w.id,
                        right: None,
                    }),
                });
            }
        }
        log_debug!(
            "recovery at column {}: {} waiting, {} corrections",
            self.columns.len() - 1,
            waiting.len(),
            items.len()
        );
        self.stats.corrections += items.len();

        if items.is_empty() {
            Ok(Corrections::OverBudget)
        } else {
            Ok(Corrections::Items(items))
        }
    }
}
