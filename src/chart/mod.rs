//! Earley chart parsing
//!
//! This module contains the chart engine: a grammar representation, the item
//! arena, per-token columns, the closure engine (predictor and completer), the
//! scanner, cost-bounded error recovery and the driver that ties them
//! together.
//!
//! # Module Organization
//!
//! ## Core Types
//! - [`Grammar`] - Context-free grammar with dense symbol ids
//! - [`EarleyParser`] - Parse driver and state machine
//! - [`EarleyConfig`] - Recovery and resource limits
//! - [`Item`] - Dotted rule with origin, cost and derivation links
//!
//! ## Storage
//! - [`arena`] - Block-allocated item storage
//! - [`column`] - Item sets, one per token boundary
//! - [`worklist`] - Deduplicating FIFO of pending items
//!
//! ## Engine
//! - `closure` - Prediction and completion to a fixpoint
//! - `scanner` - Token consumption
//! - [`recovery`] - Substitution and deletion under a cost ceiling
//!
//! ## Results
//! - [`forest`] - Derivation counting and tree extraction
//! - [`debug`] - Chart dumps and GraphViz output
//!
//! ## Tooling
//! - [`grammar_analysis`] - Warnings for suspicious grammars
//! - [`parallel`] - Batch parsing
//! - [`error`] - Error types

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// ============================================================================
// Module Declarations
// ============================================================================

pub mod arena;
mod closure;
pub mod column;
pub mod debug;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod grammar_analysis;
pub mod item;
pub mod parser;
pub mod recovery;
mod scanner;
pub mod worklist;

// Batch parsing (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use arena::{ItemArena, Slot};
pub use column::{Column, NewItem};
pub use grammar::{
    DottedRule, Grammar, GrammarBuilder, GrammarDef, Rule, RuleDef, RuleId, SymbolId,
    TerminalDef, TokenKind, NO_SYMBOL,
};
pub use item::{Item, ItemDisplay, ItemId, ItemKey, Link, Step};
pub use parser::{
    EarleyConfig, EarleyParser, EngineState, ParseStats, ParseStatus, Progress,
    DEFAULT_EXPECTED_TOKENS, DEFAULT_MAX_COLUMNS, DEFAULT_MAX_ERROR_VALUE, DEFAULT_MAX_ITEMS,
    DEFAULT_TIMEOUT_MS,
};
pub use worklist::Worklist;

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{
    offset_to_line_col, ErrorBuilder, GrammarError, LexError, ParseError, Rejection, RichError,
    Span,
};

// ============================================================================
// Error Recovery
// ============================================================================

pub use recovery::{CorrectionCost, ErrorCostProvider, RecoveryMode, UniformCosts, WaitingItem};

// ============================================================================
// Results
// ============================================================================

pub use debug::{ChartPrinter, ForestVisualizer, GrammarVisualizer, TreePrinter};
pub use forest::{DerivationCounter, Forest, ParseTree, TreeBuilder};

// ============================================================================
// Grammar Analysis
// ============================================================================

pub use grammar_analysis::{GrammarAnalyzer, GrammarWarning, WarningKind};

// ============================================================================
// Batch Parsing
// ============================================================================

pub use parallel::{parse_batch, parse_batch_tokens, BatchOutcome};
