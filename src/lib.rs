//! Tabula - Earley Chart Parser with Error Recovery
//!
//! A general context-free parser built on Earley's chart algorithm. It
//! accepts any context-free grammar (left recursion, ambiguity and empty
//! rules included) and provides:
//! - Block-allocated item arena with stable item ids
//! - Packed derivation links, so an accepted chart is a shared forest
//! - Cost-bounded error recovery by token substitution and deletion
//! - Incremental driving, one token per step
//! - Regex lexer framework and pre-tokenized input
//! - Grammar loading from JSON
//! - Grammar analysis and developer tools (chart dumps, GraphViz)
//! - Optional batch parsing on rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use tabula::chart::{EarleyParser, Grammar, ParseStatus};
//! use tabula::lexer::{RegexLexer, TokenDef};
//!
//! let grammar = Grammar::builder()
//!     .terminals(["num", "+", "*"])
//!     .rule("E", ["E", "+", "E"])
//!     .rule("E", ["E", "*", "E"])
//!     .rule("E", ["num"])
//!     .build()
//!     .unwrap();
//!
//! let lexer = RegexLexer::new(
//!     &grammar,
//!     vec![
//!         TokenDef::new("num", r"[0-9]+"),
//!         TokenDef::new("+", r"\+"),
//!         TokenDef::new("*", r"\*"),
//!         TokenDef::new("ws", r"\s+").ignored(),
//!     ],
//! )
//! .unwrap();
//!
//! let mut parser = EarleyParser::new(&grammar);
//! let status = parser.parse(&mut lexer.tokens("1 + 2 * 3")).unwrap();
//! assert_eq!(status, ParseStatus::Accepted);
//!
//! let forest = parser.forest().unwrap();
//! assert_eq!(forest.trees(10).len(), 2);
//! ```
//!
//! ## Loading a Grammar from JSON
//!
//! ```rust
//! use tabula::chart::Grammar;
//!
//! let grammar = Grammar::from_json(r#"{
//!     "terminals": ["a", "b"],
//!     "rules": [
//!         { "lhs": "S", "rhs": ["a", "S", "b"] },
//!         { "lhs": "S", "rhs": [] }
//!     ]
//! }"#).unwrap();
//! assert_eq!(grammar.num_terminals(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse batches on the rayon thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

// Prelude module for convenient imports
pub mod prelude;

// Chart engine
pub mod chart;

// Token sources
pub mod lexer;

/// Re-export commonly used types for convenience
pub use chart::{
    // Debug tools
    debug::{ChartPrinter, ForestVisualizer, GrammarVisualizer, TreePrinter},
    // Rich errors
    error::{ErrorBuilder, RichError, Span},
    // Forest
    forest::{Forest, ParseTree},
    // Grammar analysis
    grammar_analysis::{GrammarAnalyzer, GrammarWarning, WarningKind},
    // Batch parsing
    parallel::{parse_batch, BatchOutcome},
    // Recovery
    recovery::{CorrectionCost, ErrorCostProvider, RecoveryMode},
    EarleyConfig,
    EarleyParser,
    Grammar,
    GrammarError,
    ParseError,
    ParseStatus,
    Rejection,
};
pub use lexer::{Lexer, Location, RegexLexer, Token, TokenDef, TokenStream};
