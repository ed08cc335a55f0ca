//! Grammar types for the chart parser
//!
//! A [`Grammar`] is an immutable, numbered view of a context-free grammar.
//! Symbol ids are laid out so the engine can index tables directly:
//!
//! - `1..=T` are terminals
//! - `T+1..=T+N` are nonterminals
//! - `0` ([`NO_SYMBOL`]) is never a symbol
//!
//! Grammars are built with [`GrammarBuilder`] or deserialized from a
//! [`GrammarDef`] (the serde model, usually JSON).

use super::error::GrammarError;
use super::grammar_analysis::{GrammarAnalyzer, GrammarWarning};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol identifier (terminal or nonterminal)
pub type SymbolId = u32;

/// Index of a production rule
pub type RuleId = u32;

/// External token kind, as produced by a lexer
pub type TokenKind = u32;

/// Reserved id that never names a symbol
pub const NO_SYMBOL: SymbolId = 0;

/// A production rule `lhs -> rhs...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Left-hand nonterminal
    pub lhs: SymbolId,
    /// Right-hand symbols (empty for an epsilon rule)
    pub rhs: Vec<SymbolId>,
}

impl Rule {
    /// Number of right-hand symbols
    #[inline]
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// Whether this is an epsilon rule
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

// ============================================================================
// Serde model
// ============================================================================

/// Terminal declaration
///
/// A bare name takes its declaration index as token kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerminalDef {
    /// Terminal whose kind is its declaration index
    Name(String),
    /// Terminal with an explicit token kind
    WithKind {
        /// Terminal name
        name: String,
        /// Token kind the lexer reports for it
        kind: TokenKind,
    },
}

impl TerminalDef {
    fn name(&self) -> &str {
        match self {
            TerminalDef::Name(name) | TerminalDef::WithKind { name, .. } => name,
        }
    }
}

/// Rule declaration by symbol names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Left-hand nonterminal name
    pub lhs: String,
    /// Right-hand symbol names
    #[serde(default)]
    pub rhs: Vec<String>,
}

/// Serializable grammar description
///
/// ```json
/// {
///   "terminals": ["num", "+"],
///   "rules": [
///     { "lhs": "E", "rhs": ["E", "+", "E"] },
///     { "lhs": "E", "rhs": ["num"] }
///   ],
///   "start": "E"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDef {
    /// Terminal declarations, in id order
    pub terminals: Vec<TerminalDef>,
    /// Extra nonterminals that have no rules of their own
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nonterminals: Vec<String>,
    /// Production rules
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    /// Start symbol (defaults to the first rule's left-hand side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

// ============================================================================
// Grammar
// ============================================================================

/// A numbered context-free grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Symbol names indexed by id (slot 0 unused)
    names: Vec<String>,
    by_name: AHashMap<String, SymbolId>,
    num_terminals: u32,
    /// Token kind per terminal (index `id - 1`)
    kinds: Vec<TokenKind>,
    by_kind: AHashMap<TokenKind, SymbolId>,
    rules: Vec<Rule>,
    /// Productions per nonterminal (index `id - T - 1`)
    productions: Vec<Vec<RuleId>>,
    /// Nullable flag per nonterminal
    nullable: Vec<bool>,
    start: SymbolId,
}

impl Grammar {
    /// Start a builder
    #[inline]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// Build a grammar from its serde description
    pub fn from_def(def: GrammarDef) -> Result<Self, GrammarError> {
        let mut names = vec![String::new()];
        let mut by_name = AHashMap::new();
        let mut kinds = Vec::with_capacity(def.terminals.len());
        let mut by_kind = AHashMap::new();

        for (index, terminal) in def.terminals.iter().enumerate() {
            let kind = match terminal {
                TerminalDef::Name(_) => index as TokenKind,
                TerminalDef::WithKind { kind, .. } => *kind,
            };
            let id = names.len() as SymbolId;
            let name = terminal.name();
            if by_name.insert(name.to_string(), id).is_some() {
                return Err(GrammarError::DuplicateSymbol {
                    name: name.to_string(),
                });
            }
            if by_kind.insert(kind, id).is_some() {
                return Err(GrammarError::DuplicateKind { kind });
            }
            names.push(name.to_string());
            kinds.push(kind);
        }
        let num_terminals = def.terminals.len() as u32;

        let lhs_names = def
            .nonterminals
            .iter()
            .map(String::as_str)
            .chain(def.rules.iter().map(|r| r.lhs.as_str()));
        for name in lhs_names {
            match by_name.get(name) {
                Some(&id) if id <= num_terminals => {
                    return Err(GrammarError::TerminalOnLeftSide {
                        name: name.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    by_name.insert(name.to_string(), names.len() as SymbolId);
                    names.push(name.to_string());
                }
            }
        }
        let num_nonterminals = names.len() - 1 - num_terminals as usize;

        let mut rules = Vec::with_capacity(def.rules.len());
        let mut productions = vec![Vec::new(); num_nonterminals];
        for rule in &def.rules {
            let lhs = by_name[rule.lhs.as_str()];
            let mut rhs = Vec::with_capacity(rule.rhs.len());
            for symbol in &rule.rhs {
                let id = by_name.get(symbol.as_str()).copied().ok_or_else(|| {
                    GrammarError::UndefinedSymbol {
                        name: symbol.clone(),
                        lhs: rule.lhs.clone(),
                    }
                })?;
                rhs.push(id);
            }
            productions[(lhs - num_terminals - 1) as usize].push(rules.len() as RuleId);
            rules.push(Rule { lhs, rhs });
        }

        let start_name = def
            .start
            .as_deref()
            .or_else(|| def.rules.first().map(|r| r.lhs.as_str()))
            .or_else(|| def.nonterminals.first().map(String::as_str))
            .ok_or(GrammarError::MissingStart)?;
        let start = match by_name.get(start_name) {
            None => {
                return Err(GrammarError::UnknownStart {
                    name: start_name.to_string(),
                })
            }
            Some(&id) if id <= num_terminals => {
                return Err(GrammarError::StartIsTerminal {
                    name: start_name.to_string(),
                })
            }
            Some(&id) => id,
        };

        let nullable = compute_nullable(&rules, num_terminals, num_nonterminals);

        Ok(Self {
            names,
            by_name,
            num_terminals,
            kinds,
            by_kind,
            rules,
            productions,
            nullable,
            start,
        })
    }

    /// Convert back to the serde description
    pub fn to_def(&self) -> GrammarDef {
        let terminals = (1..=self.num_terminals)
            .map(|id| {
                let name = self.names[id as usize].clone();
                let kind = self.kinds[(id - 1) as usize];
                if kind == id - 1 {
                    TerminalDef::Name(name)
                } else {
                    TerminalDef::WithKind { name, kind }
                }
            })
            .collect();
        let nonterminals = self
            .nonterminals()
            .filter(|&nt| self.rules_for(nt).is_empty())
            .map(|nt| self.symbol_name(nt).to_string())
            .collect();
        let rules = self
            .rules
            .iter()
            .map(|rule| RuleDef {
                lhs: self.symbol_name(rule.lhs).to_string(),
                rhs: rule
                    .rhs
                    .iter()
                    .map(|&s| self.symbol_name(s).to_string())
                    .collect(),
            })
            .collect();
        GrammarDef {
            terminals,
            nonterminals,
            rules,
            start: Some(self.symbol_name(self.start).to_string()),
        }
    }

    /// Serialize to JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_def())
    }

    /// Deserialize from JSON
    pub fn from_json(s: &str) -> Result<Self, GrammarError> {
        let def: GrammarDef = serde_json::from_str(s).map_err(|e| GrammarError::Json {
            message: e.to_string(),
        })?;
        Self::from_def(def)
    }

    // ------------------------------------------------------------------------
    // Queries used by the engine
    // ------------------------------------------------------------------------

    /// Right-hand symbol of `rule` at `pos`, or `None` past the end
    #[inline]
    pub fn rhs(&self, rule: RuleId, pos: u32) -> Option<SymbolId> {
        self.rules[rule as usize].rhs.get(pos as usize).copied()
    }

    /// Left-hand symbol of `rule`
    #[inline]
    pub fn lhs(&self, rule: RuleId) -> SymbolId {
        self.rules[rule as usize].lhs
    }

    /// A rule by id
    #[inline]
    pub fn rule(&self, rule: RuleId) -> &Rule {
        &self.rules[rule as usize]
    }

    /// All rules
    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Productions of a nonterminal (empty for terminals)
    #[inline]
    pub fn rules_for(&self, symbol: SymbolId) -> &[RuleId] {
        if self.is_nonterminal(symbol) {
            &self.productions[self.nonterminal_index(symbol)]
        } else {
            &[]
        }
    }

    /// Number of terminals (`T`)
    #[inline]
    pub fn num_terminals(&self) -> usize {
        self.num_terminals as usize
    }

    /// Number of nonterminals (`N`)
    #[inline]
    pub fn num_nonterminals(&self) -> usize {
        self.productions.len()
    }

    /// `T + N`
    #[inline]
    pub fn num_symbols(&self) -> usize {
        self.names.len() - 1
    }

    /// Start symbol
    #[inline]
    pub fn start(&self) -> SymbolId {
        self.start
    }

    /// Whether `symbol` is a terminal
    #[inline]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol != NO_SYMBOL && symbol <= self.num_terminals
    }

    /// Whether `symbol` is a nonterminal
    #[inline]
    pub fn is_nonterminal(&self, symbol: SymbolId) -> bool {
        symbol > self.num_terminals && (symbol as usize) < self.names.len()
    }

    /// Zero-based nonterminal index, for per-nonterminal tables
    #[inline]
    pub fn nonterminal_index(&self, symbol: SymbolId) -> usize {
        debug_assert!(self.is_nonterminal(symbol));
        (symbol - self.num_terminals - 1) as usize
    }

    /// Iterate over terminal ids
    pub fn terminals(&self) -> impl Iterator<Item = SymbolId> {
        1..=self.num_terminals
    }

    /// Iterate over nonterminal ids
    pub fn nonterminals(&self) -> impl Iterator<Item = SymbolId> {
        (self.num_terminals + 1)..(self.names.len() as SymbolId)
    }

    /// Terminal reported by lexers as `kind`
    #[inline]
    pub fn terminal_for_kind(&self, kind: TokenKind) -> Option<SymbolId> {
        self.by_kind.get(&kind).copied()
    }

    /// Token kind of a terminal
    #[inline]
    pub fn kind_of(&self, terminal: SymbolId) -> Option<TokenKind> {
        if self.is_terminal(terminal) {
            Some(self.kinds[(terminal - 1) as usize])
        } else {
            None
        }
    }

    /// Look a symbol up by name
    #[inline]
    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Name of a symbol
    #[inline]
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        match self.names.get(symbol as usize) {
            Some(name) if symbol != NO_SYMBOL => name,
            _ => "?",
        }
    }

    /// Whether a nonterminal derives the empty string
    #[inline]
    pub fn nullable(&self, symbol: SymbolId) -> bool {
        self.is_nonterminal(symbol) && self.nullable[self.nonterminal_index(symbol)]
    }

    /// Display helper for a rule with an optional dot
    pub fn dotted(&self, rule: RuleId, dot: Option<u32>) -> DottedRule<'_> {
        DottedRule {
            grammar: self,
            rule,
            dot,
        }
    }

    /// Analyze the grammar for potential issues and return warnings
    pub fn analyze_warnings(&self) -> Vec<GrammarWarning> {
        GrammarAnalyzer::new(self).analyze()
    }
}

/// Nullable nonterminals by fixpoint over the rules
fn compute_nullable(rules: &[Rule], num_terminals: u32, num_nonterminals: usize) -> Vec<bool> {
    let mut nullable = vec![false; num_nonterminals];
    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let idx = (rule.lhs - num_terminals - 1) as usize;
            if nullable[idx] {
                continue;
            }
            let all_nullable = rule.rhs.iter().all(|&s| {
                s > num_terminals && nullable[(s - num_terminals - 1) as usize]
            });
            if all_nullable {
                nullable[idx] = true;
                changed = true;
            }
        }
    }
    nullable
}

/// A rule rendered as `LHS --> X Y * Z`
pub struct DottedRule<'g> {
    grammar: &'g Grammar,
    rule: RuleId,
    dot: Option<u32>,
}

impl fmt::Display for DottedRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.grammar.rule(self.rule);
        write!(f, "{} -->", self.grammar.symbol_name(rule.lhs))?;
        for (pos, &symbol) in rule.rhs.iter().enumerate() {
            if self.dot == Some(pos as u32) {
                f.write_str(" *")?;
            }
            write!(f, " {}", self.grammar.symbol_name(symbol))?;
        }
        if self.dot == Some(rule.rhs.len() as u32) {
            f.write_str(" *")?;
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder over [`GrammarDef`]
///
/// # Example
///
/// ```
/// use tabula::chart::Grammar;
///
/// let grammar = Grammar::builder()
///     .terminals(["a", "b"])
///     .rule("S", ["a", "S", "b"])
///     .epsilon("S")
///     .build()
///     .unwrap();
///
/// assert_eq!(grammar.num_terminals(), 2);
/// assert_eq!(grammar.rules_for(grammar.start()).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    def: GrammarDef,
}

impl GrammarBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a terminal; its kind is its declaration index
    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.def.terminals.push(TerminalDef::Name(name.into()));
        self
    }

    /// Declare several terminals in order
    pub fn terminals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def
            .terminals
            .extend(names.into_iter().map(|n| TerminalDef::Name(n.into())));
        self
    }

    /// Declare a terminal with an explicit token kind
    pub fn terminal_with_kind(mut self, name: impl Into<String>, kind: TokenKind) -> Self {
        self.def.terminals.push(TerminalDef::WithKind {
            name: name.into(),
            kind,
        });
        self
    }

    /// Declare a nonterminal without adding rules
    pub fn nonterminal(mut self, name: impl Into<String>) -> Self {
        self.def.nonterminals.push(name.into());
        self
    }

    /// Add a rule `lhs -> rhs...`
    pub fn rule<I, S>(mut self, lhs: impl Into<String>, rhs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.rules.push(RuleDef {
            lhs: lhs.into(),
            rhs: rhs.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add an epsilon rule `lhs -> `
    pub fn epsilon(mut self, lhs: impl Into<String>) -> Self {
        self.def.rules.push(RuleDef {
            lhs: lhs.into(),
            rhs: Vec::new(),
        });
        self
    }

    /// Set the start symbol
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.def.start = Some(name.into());
        self
    }

    /// Build the grammar
    pub fn build(self) -> Result<Grammar, GrammarError> {
        Grammar::from_def(self.def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anbn() -> Grammar {
        Grammar::builder()
            .terminals(["a", "b"])
            .rule("S", ["a", "S", "b"])
            .epsilon("S")
            .build()
            .unwrap()
    }

    #[test]
    fn test_symbol_numbering() {
        let g = anbn();
        assert_eq!(g.num_terminals(), 2);
        assert_eq!(g.num_nonterminals(), 1);
        assert_eq!(g.symbol("a"), Some(1));
        assert_eq!(g.symbol("b"), Some(2));
        assert_eq!(g.symbol("S"), Some(3));
        assert!(g.is_terminal(1));
        assert!(!g.is_terminal(NO_SYMBOL));
        assert!(g.is_nonterminal(3));
        assert!(!g.is_nonterminal(4));
        assert_eq!(g.nonterminal_index(3), 0);
    }

    #[test]
    fn test_rhs_past_end_is_none() {
        let g = anbn();
        assert_eq!(g.rhs(0, 0), Some(1));
        assert_eq!(g.rhs(0, 2), Some(2));
        assert_eq!(g.rhs(0, 3), None);
        assert_eq!(g.rhs(1, 0), None);
        assert_eq!(g.lhs(1), 3);
    }

    #[test]
    fn test_kinds_default_to_declaration_order() {
        let g = Grammar::builder()
            .terminal("num")
            .terminal_with_kind("plus", 42)
            .rule("E", ["num", "plus", "num"])
            .build()
            .unwrap();
        assert_eq!(g.terminal_for_kind(0), g.symbol("num"));
        assert_eq!(g.terminal_for_kind(42), g.symbol("plus"));
        assert_eq!(g.terminal_for_kind(1), None);
        assert_eq!(g.kind_of(2), Some(42));
    }

    #[test]
    fn test_nullable() {
        let g = Grammar::builder()
            .terminal("x")
            .rule("S", ["B", "B"])
            .rule("B", ["A", "A"])
            .epsilon("A")
            .rule("C", ["x"])
            .build()
            .unwrap();
        assert!(g.nullable(g.symbol("A").unwrap()));
        assert!(g.nullable(g.symbol("B").unwrap()));
        assert!(g.nullable(g.symbol("S").unwrap()));
        assert!(!g.nullable(g.symbol("C").unwrap()));
        assert!(!g.nullable(g.symbol("x").unwrap()));
    }

    #[test]
    fn test_undefined_symbol() {
        let err = Grammar::builder()
            .terminal("a")
            .rule("S", ["a", "T"])
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedSymbol { ref name, .. } if name == "T"));
    }

    #[test]
    fn test_terminal_on_left_side() {
        let err = Grammar::builder()
            .terminal("a")
            .rule("a", ["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::TerminalOnLeftSide { .. }));
    }

    #[test]
    fn test_start_defaults_and_errors() {
        assert!(matches!(
            Grammar::builder().terminal("a").build(),
            Err(GrammarError::MissingStart)
        ));
        assert!(matches!(
            Grammar::builder().terminal("a").rule("S", ["a"]).start("a").build(),
            Err(GrammarError::StartIsTerminal { .. })
        ));
        assert!(matches!(
            Grammar::builder().terminal("a").rule("S", ["a"]).start("Q").build(),
            Err(GrammarError::UnknownStart { .. })
        ));
        let g = Grammar::builder()
            .terminal("a")
            .rule("S", ["T"])
            .rule("T", ["a"])
            .build()
            .unwrap();
        assert_eq!(g.symbol_name(g.start()), "S");
    }

    #[test]
    fn test_declared_nonterminal_without_rules() {
        let g = Grammar::builder()
            .terminal("a")
            .nonterminal("S")
            .build()
            .unwrap();
        assert!(g.rules_for(g.start()).is_empty());
    }

    #[test]
    fn test_duplicates() {
        assert!(matches!(
            Grammar::builder().terminals(["a", "a"]).rule("S", ["a"]).build(),
            Err(GrammarError::DuplicateSymbol { .. })
        ));
        assert!(matches!(
            Grammar::builder()
                .terminal_with_kind("a", 1)
                .terminal_with_kind("b", 1)
                .rule("S", ["a"])
                .build(),
            Err(GrammarError::DuplicateKind { kind: 1 })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "terminals": ["num", {"name": "+", "kind": 7}],
            "rules": [
                {"lhs": "E", "rhs": ["E", "+", "E"]},
                {"lhs": "E", "rhs": ["num"]}
            ]
        }"#;
        let g = Grammar::from_json(json).unwrap();
        assert_eq!(g.terminal_for_kind(7), g.symbol("+"));
        let again = Grammar::from_json(&g.to_json().unwrap()).unwrap();
        assert_eq!(again.rules(), g.rules());
        assert_eq!(again.start(), g.start());
        assert_eq!(again.kind_of(2), Some(7));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            Grammar::from_json("{ not json"),
            Err(GrammarError::Json { .. })
        ));
    }

    #[test]
    fn test_dotted_display() {
        let g = anbn();
        assert_eq!(g.dotted(0, Some(1)).to_string(), "S --> a * S b");
        assert_eq!(g.dotted(0, Some(3)).to_string(), "S --> a S b *");
        assert_eq!(g.dotted(1, Some(0)).to_string(), "S --> *");
        assert_eq!(g.dotted(0, None).to_string(), "S --> a S b");
    }
}
