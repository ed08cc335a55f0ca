//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from tabula.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use tabula::prelude::*;
//!
//! let grammar = Grammar::builder()
//!     .terminals(["a", "b"])
//!     .rule("S", ["a", "S", "b"])
//!     .epsilon("S")
//!     .build()
//!     .unwrap();
//! let mut parser = EarleyParser::new(&grammar);
//! let mut input = TokenStream::from_chars(&grammar, "ab").unwrap();
//! assert!(parser.parse(&mut input).unwrap().is_accepted());
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Grammar`] - Context-free grammar
//! - [`GrammarBuilder`] - Builder for grammars
//! - [`EarleyParser`] - Chart parser and driver
//! - [`EarleyConfig`] - Parser configuration
//! - [`ParseStatus`] - Outcome of a completed parse
//!
//! ## Input
//! - [`Lexer`] - Token source trait
//! - [`Token`] - A lexed token
//! - [`TokenStream`] - Pre-tokenized input
//! - [`RegexLexer`] - Longest-match regex lexer
//! - [`TokenDef`] - Token definition for [`RegexLexer`]
//!
//! ## Results
//! - [`Forest`] - View of an accepted chart
//! - [`ParseTree`] - One derivation as a tree
//!
//! ## Error Handling
//! - [`ParseError`] - Fatal engine error
//! - [`Rejection`] - Why an input was rejected
//! - [`RecoveryMode`] - When error recovery runs

// ============================================================================
// Core Types
// ============================================================================

pub use crate::chart::{EarleyConfig, EarleyParser, Grammar, GrammarBuilder, ParseStatus};

// ============================================================================
// Input
// ============================================================================

pub use crate::lexer::{Lexer, RegexLexer, Token, TokenDef, TokenStream};

// ============================================================================
// Results
// ============================================================================

pub use crate::chart::forest::{Forest, ParseTree};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::chart::error::{ParseError, Rejection};
pub use crate::chart::recovery::RecoveryMode;
