//! Grammar analysis and warnings
//!
//! The chart parser accepts any context-free grammar, but some grammars are
//! almost certainly mistakes or have surprising costs. This module warns
//! about:
//! - Nonterminals without productions
//! - Unproductive nonterminals (derive no terminal string)
//! - Unreachable symbols
//! - Cyclic nonterminals (`A =>+ A`, unbounded ambiguity)
//!
//! # Example
//!
//! ```
//! use tabula::chart::{Grammar, GrammarAnalyzer, WarningKind};
//!
//! let grammar = Grammar::builder()
//!     .terminal("x")
//!     .rule("S", ["S"])
//!     .rule("S", ["x"])
//!     .build()
//!     .unwrap();
//!
//! let warnings = GrammarAnalyzer::new(&grammar).analyze();
//! assert!(warnings.iter().any(|w| w.kind == WarningKind::Cyclic));
//! ```

use super::grammar::{Grammar, SymbolId};
use hashbrown::HashSet;

/// Kind of grammar warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A symbol cannot be reached from the start symbol
    Unreachable,

    /// A nonterminal has rules but none of them derives a terminal string
    ///
    /// Example: `A -> A x`
    Unproductive,

    /// A nonterminal has no rules at all
    NoProductions,

    /// A nonterminal derives itself without consuming input
    ///
    /// Such a grammar has infinitely many derivations for some inputs.
    /// Example: `S -> S | x`
    Cyclic,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable symbol"),
            Self::Unproductive => write!(f, "unproductive nonterminal"),
            Self::NoProductions => write!(f, "no productions"),
            Self::Cyclic => write!(f, "cyclic nonterminal"),
        }
    }
}

/// A grammar warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Symbol the warning is about
    pub symbol: SymbolId,
    /// Human-readable message
    pub message: String,
    /// Related symbols (e.g. the members of a cycle)
    pub related: Vec<SymbolId>,
}

impl GrammarWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, symbol: SymbolId, message: impl Into<String>) -> Self {
        Self {
            kind,
            symbol,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Add related symbols to the warning
    pub fn with_related(mut self, symbols: Vec<SymbolId>) -> Self {
        self.related = symbols;
        self
    }
}

impl std::fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[symbol {}] {}: {}", self.symbol, self.kind, self.message)?;
        if !self.related.is_empty() {
            write!(f, " (related symbols: {:?})", self.related)?;
        }
        Ok(())
    }
}

/// Grammar analyzer
pub struct GrammarAnalyzer<'a> {
    grammar: &'a Grammar,
}

impl<'a> GrammarAnalyzer<'a> {
    /// Create a new analyzer for the given grammar
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    /// Analyze the grammar and return all warnings
    pub fn analyze(&self) -> Vec<GrammarWarning> {
        let mut warnings = Vec::new();
        self.detect_missing_productions(&mut warnings);
        self.detect_unproductive(&mut warnings);
        self.detect_unreachable(&mut warnings);
        self.detect_cycles(&mut warnings);
        warnings
    }

    fn detect_missing_productions(&self, warnings: &mut Vec<GrammarWarning>) {
        let g = self.grammar;
        for nt in g.nonterminals() {
            if g.rules_for(nt).is_empty() {
                warnings.push(GrammarWarning::new(
                    WarningKind::NoProductions,
                    nt,
                    format!("'{}' has no rules and never matches", g.symbol_name(nt)),
                ));
            }
        }
    }

    /// Nonterminals that derive some terminal string, by fixpoint
    pub fn productive(&self) -> HashSet<SymbolId> {
        let g = self.grammar;
        let mut productive: HashSet<SymbolId> = HashSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for rule in g.rules() {
                if productive.contains(&rule.lhs) {
                    continue;
                }
                if rule
                    .rhs
                    .iter()
                    .all(|&s| g.is_terminal(s) || productive.contains(&s))
                {
                    productive.insert(rule.lhs);
                    changed = true;
                }
            }
        }
        productive
    }

    fn detect_unproductive(&self, warnings: &mut Vec<GrammarWarning>) {
        let g = self.grammar;
        let productive = self.productive();
        for nt in g.nonterminals() {
            if !g.rules_for(nt).is_empty() && !productive.contains(&nt) {
                warnings.push(GrammarWarning::new(
                    WarningKind::Unproductive,
                    nt,
                    format!(
                        "'{}' cannot derive any string of terminals",
                        g.symbol_name(nt)
                    ),
                ));
            }
        }
    }

    /// Symbols reachable from the start symbol
    pub fn reachable(&self) -> HashSet<SymbolId> {
        let g = self.grammar;
        let mut reachable = HashSet::new();
        let mut stack = vec![g.start()];
        reachable.insert(g.start());
        while let Some(symbol) = stack.pop() {
            for &rule in g.rules_for(symbol) {
                for &s in &g.rule(rule).rhs {
                    if reachable.insert(s) {
                        stack.push(s);
                    }
                }
            }
        }
        reachable
    }

    fn detect_unreachable(&self, warnings: &mut Vec<GrammarWarning>) {
        let g = self.grammar;
        let reachable = self.reachable();
        for symbol in g.terminals().chain(g.nonterminals()) {
            if !reachable.contains(&symbol) {
                warnings.push(GrammarWarning::new(
                    WarningKind::Unreachable,
                    symbol,
                    format!(
                        "'{}' is not reachable from '{}'",
                        g.symbol_name(symbol),
                        g.symbol_name(g.start())
                    ),
                ));
            }
        }
    }

    /// Nonterminals `B` with `A -> α B β` where `α` and `β` are nullable
    fn unit_successors(&self, nt: SymbolId) -> Vec<SymbolId> {
        let g = self.grammar;
        let mut successors = Vec::new();
        for &rule in g.rules_for(nt) {
            let rhs = &g.rule(rule).rhs;
            for (pos, &s) in rhs.iter().enumerate() {
                if !g.is_nonterminal(s) {
                    continue;
                }
                let others_nullable = rhs
                    .iter()
                    .enumerate()
                    .all(|(i, &o)| i == pos || g.nullable(o));
                if others_nullable && !successors.contains(&s) {
                    successors.push(s);
                }
            }
        }
        successors
    }

    /// Shortest unit path from `nt` back to itself
    fn find_cycle(&self, nt: SymbolId) -> Option<Vec<SymbolId>> {
        let mut visited = HashSet::new();
        let mut frontier = vec![vec![nt]];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for path in frontier {
                let Some(&last) = path.last() else {
                    continue;
                };
                for successor in self.unit_successors(last) {
                    let mut extended = path.clone();
                    extended.push(successor);
                    if successor == nt {
                        return Some(extended);
                    }
                    if visited.insert(successor) {
                        next.push(extended);
                    }
                }
            }
            frontier = next;
        }
        None
    }

    fn detect_cycles(&self, warnings: &mut Vec<GrammarWarning>) {
        let g = self.grammar;
        for nt in g.nonterminals() {
            if let Some(cycle) = self.find_cycle(nt) {
                let names: Vec<&str> = cycle.iter().map(|&s| g.symbol_name(s)).collect();
                warnings.push(
                    GrammarWarning::new(
                        WarningKind::Cyclic,
                        nt,
                        format!("'{}' derives itself: {}", g.symbol_name(nt), names.join(" => ")),
                    )
                    .with_related(cycle),
                );
            }
        }
    }
}
