//! Derivation forest
//!
//! An accepted chart already is a packed forest: every item lists the
//! derivations ([`Link`]s) that produced it, and each link points back at the
//! item it advanced from and, for completions, at the completed child. A
//! [`Forest`] walks that graph without copying it.
//!
//! Grammars with cycles (`A =>+ A`) admit infinitely many derivations. Both
//! walks keep the set of items currently being expanded and drop any
//! derivation that re-enters one of them, so every result is finite.
//!
//! # Example
//!
//! ```
//! use tabula::chart::{EarleyParser, Grammar};
//! use tabula::lexer::TokenStream;
//!
//! let grammar = Grammar::builder()
//!     .terminals(["num", "+"])
//!     .rule("E", ["E", "+", "E"])
//!     .rule("E", ["num"])
//!     .build()
//!     .unwrap();
//!
//! let mut parser = EarleyParser::new(&grammar);
//! let mut input = TokenStream::from_names(&grammar, "num + num + num").unwrap();
//! parser.parse(&mut input).unwrap();
//!
//! let forest = parser.forest().unwrap();
//! let root = forest.roots()[0];
//! assert_eq!(forest.count_derivations(root), 2);
//! assert_eq!(forest.trees(10).len(), 2);
//! ```

use super::grammar::{Grammar, RuleId, SymbolId};
use super::item::{Item, ItemId, Link, Step};
use super::parser::EarleyParser;
use crate::lexer::Token;
use hashbrown::{HashMap, HashSet};

/// Read-only view of an accepted chart
#[derive(Debug, Clone, Copy)]
pub struct Forest<'p, 'g> {
    parser: &'p EarleyParser<'g>,
}

impl<'p, 'g> Forest<'p, 'g> {
    pub(crate) fn new(parser: &'p EarleyParser<'g>) -> Self {
        Self { parser }
    }

    /// The grammar the chart was built for
    #[inline]
    pub fn grammar(&self) -> &'g Grammar {
        self.parser.grammar()
    }

    /// Completed start items spanning the whole input
    pub fn roots(&self) -> Vec<ItemId> {
        let grammar = self.grammar();
        let Some(column) = self.parser.columns().last() else {
            return Vec::new();
        };
        column
            .ends()
            .iter()
            .filter_map(|&seq| column.get(self.parser.arena(), seq))
            .filter(|item| item.origin == 0 && grammar.lhs(item.rule) == grammar.start())
            .map(Item::id)
            .collect()
    }

    /// Look an item up
    #[inline]
    pub fn item(&self, id: ItemId) -> Option<&'p Item> {
        self.parser.item(id)
    }

    /// Token that opened `column` (`None` for column 0)
    #[inline]
    pub fn token(&self, column: u32) -> Option<&'p Token> {
        self.parser.columns().get(column as usize)?.token()
    }

    /// Lowest correction cost among the roots
    pub fn min_cost(&self) -> Option<u32> {
        self.roots()
            .into_iter()
            .filter_map(|id| self.item(id))
            .map(|item| item.error_cost)
            .min()
    }

    /// Number of distinct derivations below `root`, saturating at `u64::MAX`
    ///
    /// Exact for acyclic grammars. When the grammar has a cycle the count
    /// only covers derivations that never re-enter an item being expanded,
    /// and memoized sub-counts taken inside a cycle depend on visit order, so
    /// the result is a lower bound on the finite derivations.
    pub fn count_derivations(&self, root: ItemId) -> u64 {
        DerivationCounter::new(*self).count(root)
    }

    /// Up to `limit` parse trees over all roots
    pub fn trees(&self, limit: usize) -> Vec<ParseTree> {
        let mut builder = TreeBuilder::new(*self, limit);
        let mut trees = Vec::new();
        for root in self.roots() {
            if trees.len() >= limit {
                break;
            }
            let mut more = builder.nodes(root);
            more.truncate(limit - trees.len());
            trees.extend(more);
        }
        trees
    }

    /// Up to `limit` parse trees for one completed item
    pub fn trees_of(&self, root: ItemId, limit: usize) -> Vec<ParseTree> {
        let mut trees = TreeBuilder::new(*self, limit).nodes(root);
        trees.truncate(limit);
        trees
    }

    /// Terminal matched by the step that produced `item` through `link`
    fn stepped_terminal(&self, item: &Item, link: &Link) -> Option<SymbolId> {
        let dot = match link.step {
            Step::Scanned | Step::Substituted => item.dot.checked_sub(1)?,
            Step::Deleted | Step::Completed => return None,
        };
        self.grammar().rhs(item.rule, dot)
    }
}

// ============================================================================
// Parse trees
// ============================================================================

/// One derivation, as a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    /// A rule application
    Node {
        /// Rule applied
        rule: RuleId,
        /// Its left-hand symbol
        lhs: SymbolId,
        /// Children in right-hand order
        children: Vec<ParseTree>,
    },
    /// A token matched as `terminal`
    Token {
        /// Terminal matched
        terminal: SymbolId,
        /// The token
        token: Token,
    },
    /// A token read as a different terminal by error recovery
    Substituted {
        /// Terminal the grammar required
        expected: SymbolId,
        /// Token actually present
        found: Token,
    },
    /// A token dropped by error recovery
    Skipped {
        /// The dropped token
        token: Token,
    },
}

impl ParseTree {
    /// Render as an s-expression, e.g. `(E (E 1) + (E 2))`
    ///
    /// Tokens print their text, or their terminal name when the text is
    /// empty. Substitutions print as `<expected:found>` and skipped tokens as
    /// `~text`.
    pub fn to_sexpr(&self, grammar: &Grammar) -> String {
        let mut out = String::new();
        self.write_sexpr(grammar, &mut out);
        out
    }

    fn write_sexpr(&self, grammar: &Grammar, out: &mut String) {
        match self {
            ParseTree::Node { lhs, children, .. } => {
                out.push('(');
                out.push_str(grammar.symbol_name(*lhs));
                for child in children {
                    out.push(' ');
                    child.write_sexpr(grammar, out);
                }
                out.push(')');
            }
            ParseTree::Token { terminal, token } => {
                if token.text.is_empty() {
                    out.push_str(grammar.symbol_name(*terminal));
                } else {
                    out.push_str(&token.text);
                }
            }
            ParseTree::Substituted { expected, found } => {
                out.push('<');
                out.push_str(grammar.symbol_name(*expected));
                out.push(':');
                out.push_str(&found.text);
                out.push('>');
            }
            ParseTree::Skipped { token } => {
                out.push('~');
                out.push_str(&token.text);
            }
        }
    }

    /// Input tokens covered by this tree, in order
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        self.collect_tokens(&mut tokens);
        tokens
    }

    fn collect_tokens<'a>(&'a self, tokens: &mut Vec<&'a Token>) {
        match self {
            ParseTree::Node { children, .. } => {
                for child in children {
                    child.collect_tokens(tokens);
                }
            }
            ParseTree::Token { token, .. }
            | ParseTree::Substituted { found: token, .. }
            | ParseTree::Skipped { token } => tokens.push(token),
        }
    }
}

// ============================================================================
// Traversal state
// ============================================================================

/// Memoized derivation counting for one pass
pub struct DerivationCounter<'p, 'g> {
    forest: Forest<'p, 'g>,
    memo: HashMap<ItemId, u64>,
    active: HashSet<ItemId>,
}

impl<'p, 'g> DerivationCounter<'p, 'g> {
    /// Start a counting pass
    pub fn new(forest: Forest<'p, 'g>) -> Self {
        Self {
            forest,
            memo: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Derivations of the prefix of `id`'s rule up to its dot
    ///
    /// Same caveat as [`Forest::count_derivations`] for cyclic grammars.
    pub fn count(&mut self, id: ItemId) -> u64 {
        if let Some(&n) = self.memo.get(&id) {
            return n;
        }
        let Some(item) = self.forest.item(id) else {
            return 0;
        };
        if item.is_predicted() {
            return 1;
        }
        if !self.active.insert(id) {
            return 0;
        }
        let mut total: u64 = 0;
        for link in &item.links {
            let left = self.count(link.left);
            let n = match link.right {
                Some(right) if left > 0 => left.saturating_mul(self.count(right)),
                _ => left,
            };
            total = total.saturating_add(n);
        }
        self.active.remove(&id);
        self.memo.insert(id, total);
        total
    }
}

/// Bounded tree enumeration for one pass
pub struct TreeBuilder<'p, 'g> {
    forest: Forest<'p, 'g>,
    limit: usize,
    memo: HashMap<ItemId, Vec<Vec<ParseTree>>>,
    active: HashSet<ItemId>,
}

impl<'p, 'g> TreeBuilder<'p, 'g> {
    /// Start an enumeration pass producing at most `limit` results per item
    pub fn new(forest: Forest<'p, 'g>, limit: usize) -> Self {
        Self {
            forest,
            limit,
            memo: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Trees rooted at the completed item `id`
    pub fn nodes(&mut self, id: ItemId) -> Vec<ParseTree> {
        let Some(item) = self.forest.item(id) else {
            return Vec::new();
        };
        let lhs = self.forest.grammar().lhs(item.rule);
        self.sequences(id)
            .into_iter()
            .map(|children| ParseTree::Node {
                rule: item.rule,
                lhs,
                children,
            })
            .collect()
    }

    /// Alternative child sequences for the part of `id`'s rule before its dot
    fn sequences(&mut self, id: ItemId) -> Vec<Vec<ParseTree>> {
        if let Some(known) = self.memo.get(&id) {
            return known.clone();
        }
        let Some(item) = self.forest.item(id) else {
            return Vec::new();
        };
        if item.is_predicted() {
            return vec![Vec::new()];
        }
        if !self.active.insert(id) {
            return Vec::new();
        }

        let mut out: Vec<Vec<ParseTree>> = Vec::new();
        'links: for link in &item.links {
            let prefixes = self.sequences(link.left);
            if prefixes.is_empty() {
                continue;
            }
            let children = self.children(item, link);
            for prefix in &prefixes {
                for child in &children {
                    if out.len() >= self.limit {
                        break 'links;
                    }
                    let mut sequence = prefix.clone();
                    sequence.push(child.clone());
                    out.push(sequence);
                }
            }
        }

        self.active.remove(&id);
        self.memo.insert(id, out.clone());
        out
    }

    /// Alternatives for the child contributed by one step
    fn children(&mut self, item: &Item, link: &Link) -> Vec<ParseTree> {
        let token = self.forest.token(item.column).cloned();
        match (link.step, token) {
            (Step::Completed, _) => match link.right {
                Some(right) => self.nodes(right),
                None => Vec::new(),
            },
            (Step::Scanned, Some(token)) => self
                .forest
                .stepped_terminal(item, link)
                .map(|terminal| vec![ParseTree::Token { terminal, token }])
                .unwrap_or_default(),
            (Step::Substituted, Some(found)) => self
                .forest
                .stepped_terminal(item, link)
                .map(|expected| vec![ParseTree::Substituted { expected, found }])
                .unwrap_or_default(),
            (Step::Deleted, Some(token)) => vec![ParseTree::Skipped { token }],
            (_, None) => Vec::new(),
        }
    }
}
