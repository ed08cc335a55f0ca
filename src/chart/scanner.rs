//! Scanner
//!
//! Reading a token opens the next column: every item in the newest column
//! that waits on the token's terminal is copied over with its dot advanced.

use super::column::NewItem;
use super::item::{Link, Step};
use super::parser::EarleyParser;
use crate::lexer::Token;

impl EarleyParser<'_> {
    /// Items the next column would receive from `token`
    ///
    /// Tokens whose kind the grammar does not know have no waiting items.
    pub(crate) fn scan_candidates(&self, token: &Token) -> Vec<NewItem> {
        let Some(terminal) = self.grammar.terminal_for_kind(token.kind) else {
            return Vec::new();
        };
        let Some(column) = self.columns.last() else {
            return Vec::new();
        };
        column
            .waiting_on(terminal)
            .iter()
            .filter_map(|&seq| column.get(&self.arena, seq))
            .map(|item| NewItem {
                rule: item.rule,
                dot: item.dot + 1,
                origin: item.origin,
                error_cost: item.error_cost,
                link: Some(Link {
                    step: Step::Scanned,
                    left: item.id(),
                    right: None,
                }),
            })
            .collect()
    }

    /// Open a column for `token`, or hand the token back if nothing waits on it
    pub(crate) fn scan(&mut self, token: Token) -> Result<(), Token> {
        let items = self.scan_candidates(&token);
        if items.is_empty() {
            log_debug!(
                "scan failed at column {} on {:?}",
                self.current(),
                token.text
            );
            return Err(token);
        }
        self.open_column(token, items);
        Ok(())
    }
}
