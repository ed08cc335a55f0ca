//! Batch parsing
//!
//! Parses many independent inputs against one grammar. Every input gets its
//! own [`EarleyParser`] (and therefore its own arena and worklist); only the
//! grammar and the lexer tables are shared.
//!
//! # Feature Flag
//!
//! With the `parallel` feature the batch is spread over the rayon thread
//! pool; without it the inputs are parsed one after another. Results are in
//! input order either way.
//!
//! ```toml
//! [dependencies]
//! tabula = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```
//! use tabula::chart::{parse_batch, EarleyConfig, Grammar};
//! use tabula::lexer::{RegexLexer, TokenDef};
//!
//! let grammar = Grammar::builder()
//!     .terminals(["num", "+"])
//!     .rule("E", ["E", "+", "E"])
//!     .rule("E", ["num"])
//!     .build()
//!     .unwrap();
//! let lexer = RegexLexer::new(
//!     &grammar,
//!     vec![
//!         TokenDef::new("num", r"[0-9]+"),
//!         TokenDef::new("+", r"\+"),
//!         TokenDef::new("ws", r"\s+").ignored(),
//!     ],
//! )
//! .unwrap();
//!
//! let results = parse_batch(&grammar, &lexer, &["1 + 2", "1 +", "3"], EarleyConfig::default());
//! assert!(results[0].as_ref().unwrap().status.is_accepted());
//! assert!(!results[1].as_ref().unwrap().status.is_accepted());
//! assert!(results[2].as_ref().unwrap().status.is_accepted());
//! ```

use super::error::ParseError;
use super::grammar::Grammar;
use super::parser::{EarleyConfig, EarleyParser, ParseStatus};
use crate::lexer::{Lexer, RegexLexer, Token, TokenStream};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Summary of one parsed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Accepted or rejected
    pub status: ParseStatus,
    /// Columns built (tokens read plus one)
    pub columns: usize,
    /// Correction cost of the cheapest accepted parse
    pub error_cost: Option<u32>,
}

fn parse_one<L: Lexer + ?Sized>(
    grammar: &Grammar,
    lexer: &mut L,
    config: EarleyConfig,
) -> Result<BatchOutcome, ParseError> {
    let mut parser = EarleyParser::with_config(grammar, config);
    let status = parser.parse(lexer)?;
    Ok(BatchOutcome {
        status,
        columns: parser.columns().len(),
        error_cost: parser.accepted_cost(),
    })
}

/// Tokenize and parse several inputs in parallel
///
/// # Performance
/// - Uses rayon for work-stealing parallelism when `parallel` feature is enabled
/// - Each parse has its own arena (no contention)
#[cfg(feature = "rayon")]
pub fn parse_batch(
    grammar: &Grammar,
    lexer: &RegexLexer,
    inputs: &[&str],
    config: EarleyConfig,
) -> Vec<Result<BatchOutcome, ParseError>> {
    inputs
        .par_iter()
        .map(|input| parse_one(grammar, &mut lexer.tokens(input), config))
        .collect()
}

/// Tokenize and parse several inputs sequentially (fallback without rayon)
#[cfg(not(feature = "rayon"))]
pub fn parse_batch(
    grammar: &Grammar,
    lexer: &RegexLexer,
    inputs: &[&str],
    config: EarleyConfig,
) -> Vec<Result<BatchOutcome, ParseError>> {
    inputs
        .iter()
        .map(|input| parse_one(grammar, &mut lexer.tokens(input), config))
        .collect()
}

/// Parse several pre-tokenized inputs in parallel
#[cfg(feature = "rayon")]
pub fn parse_batch_tokens(
    grammar: &Grammar,
    inputs: Vec<Vec<Token>>,
    config: EarleyConfig,
) -> Vec<Result<BatchOutcome, ParseError>> {
    inputs
        .into_par_iter()
        .map(|tokens| {
            let config = config.with_expected_tokens(tokens.len());
            parse_one(grammar, &mut TokenStream::new(tokens), config)
        })
        .collect()
}

/// Parse several pre-tokenized inputs sequentially (fallback without rayon)
#[cfg(not(feature = "rayon"))]
pub fn parse_batch_tokens(
    grammar: &Grammar,
    inputs: Vec<Vec<Token>>,
    config: EarleyConfig,
) -> Vec<Result<BatchOutcome, ParseError>> {
    inputs
        .into_iter()
        .map(|tokens| {
            let config = config.with_expected_tokens(tokens.len());
            parse_one(grammar, &mut TokenStream::new(tokens), config)
        })
        .collect()
}
