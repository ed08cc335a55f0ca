//! Predictor and completer
//!
//! After seeding and after every scan the newest column is closed: pending
//! items are taken from the worklist in creation order until none remain.
//!
//! - an item at the end of its rule **completes**: every item in its origin
//!   column that waits on the rule's left-hand symbol is advanced over it
//! - an item before a nonterminal **predicts** that nonterminal's productions,
//!   once per column
//! - an item before a terminal waits for the scanner

use super::column::NewItem;
use super::error::ParseError;
use super::grammar::{RuleId, SymbolId};
use super::item::{ItemId, Link, Step};
use super::parser::EarleyParser;

impl EarleyParser<'_> {
    /// Run the closure of the newest column to a fixpoint
    pub(crate) fn close(&mut self) -> Result<(), ParseError> {
        let grammar = self.grammar;
        while let Some(id) = self.worklist.pop() {
            self.check_limits()?;
            let (rule, dot, origin, cost) = match self.item(id) {
                Some(item) => (item.rule, item.dot, item.origin, item.error_cost),
                None => {
                    return Err(ParseError::Internal {
                        message: format!("queued item {} is not in the chart", id),
                    })
                }
            };
            match grammar.rhs(rule, dot) {
                None => self.complete(id, rule, origin, cost),
                Some(symbol) if grammar.is_nonterminal(symbol) => self.predict(symbol),
                Some(_) => {}
            }
        }
        log_debug!(
            "closed column {} with {} items",
            self.current(),
            self.columns.last().map_or(0, |c| c.len())
        );
        Ok(())
    }

    /// Add zero-dot items for every production of `symbol`
    fn predict(&mut self, symbol: SymbolId) {
        let index = self.current();
        if !self.columns[index].mark_predicted(symbol) {
            return;
        }
        self.stats.predictions += 1;
        for &rule in self.grammar.rules_for(symbol) {
            self.insert(NewItem {
                rule,
                dot: 0,
                origin: index as u32,
                error_cost: 0,
                link: None,
            });
        }
    }

    /// Advance every item waiting on the completed rule's left-hand symbol
    fn complete(&mut self, completed: ItemId, rule: RuleId, origin: u32, cost: u32) {
        self.stats.completions += 1;
        let lhs = self.grammar.lhs(rule);
        let ceiling = self.config.max_error_value;
        let origin_column = &self.columns[origin as usize];
        let candidates: Vec<NewItem> = origin_column
            .waiting_on(lhs)
            .iter()
            .filter_map(|&seq| origin_column.get(&self.arena, seq))
            .filter_map(|waiting| {
                let error_cost = waiting.error_cost.saturating_add(cost);
                (error_cost <= ceiling).then(|| NewItem {
                    rule: waiting.rule,
                    dot: waiting.dot + 1,
                    origin: waiting.origin,
                    error_cost,
                    link: Some(Link {
                        step: Step::Completed,
                        left: waiting.id(),
                        right: Some(completed),
                    }),
                })
            })
            .collect();
        for new in candidates {
            self.insert(new);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::grammar::Grammar;
    use crate::chart::item::ItemKey;
    use crate::chart::parser::{EarleyParser, ParseStatus};
    use crate::lexer::TokenStream;

    #[test]
    fn test_prediction_happens_once() {
        let g = Grammar::builder()
            .terminal("x")
            .rule("S", ["A", "A"])
            .rule("A", ["x"])
            .build()
            .unwrap();
        let mut parser = EarleyParser::new(&g);
        parser.begin().unwrap();
        // S --> * A A, A --> * x
        assert_eq!(parser.columns()[0].len(), 2);
        assert_eq!(parser.stats().predictions, 2);
    }

    #[test]
    fn test_nested_nullable_accepts_empty() {
        let g = Grammar::builder()
            .terminal("x")
            .rule("S", ["B", "B"])
            .rule("B", ["A", "A"])
            .epsilon("A")
            .build()
            .unwrap();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::new(Vec::new());
        assert_eq!(parser.parse(&mut tokens).unwrap(), ParseStatus::Accepted);

        let column = &parser.columns()[0];
        let s_done = column.find(ItemKey {
            rule: 0,
            dot: 2,
            origin: 0,
        });
        assert!(s_done.is_some());
    }

    #[test]
    fn test_left_recursion_packs_links() {
        let g = Grammar::builder()
            .terminals(["num", "+"])
            .rule("E", ["E", "+", "E"])
            .rule("E", ["num"])
            .build()
            .unwrap();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_names(&g, "num + num + num").unwrap();
        assert!(parser.parse(&mut tokens).unwrap().is_accepted());

        let last = parser.columns().last().unwrap();
        let seq = last
            .find(ItemKey {
                rule: 0,
                dot: 3,
                origin: 0,
            })
            .unwrap();
        let item = last.get(parser.arena(), seq).unwrap();
        assert_eq!(item.right_links().count(), 2);
        assert!(parser.stats().packed_links >= 1);
    }
}
