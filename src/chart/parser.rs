//! Earley parse driver
//!
//! [`EarleyParser`] owns everything a parse run needs (item arena, chart
//! columns, worklist) and borrows the [`Grammar`] immutably. A run moves
//! through a small state machine:
//!
//! ```text
//! Start -> Seeding -> Closing -> Scanning <-> Closing
//!                                   |
//!                                   +-> Accepted | Rejected
//! ```
//!
//! Each call to [`EarleyParser::advance`] consumes at most one token and
//! closes the resulting column, so a caller can interleave parsing with other
//! work. [`EarleyParser::parse`] simply loops until a terminal state.
//!
//! # Example
//!
//! ```
//! use tabula::chart::{EarleyParser, Grammar, ParseStatus};
//! use tabula::lexer::TokenStream;
//!
//! let grammar = Grammar::builder()
//!     .terminals(["a", "b"])
//!     .rule("S", ["a", "S", "b"])
//!     .epsilon("S")
//!     .build()
//!     .unwrap();
//!
//! let mut parser = EarleyParser::new(&grammar);
//! let mut input = TokenStream::from_chars(&grammar, "aabb").unwrap();
//! assert_eq!(parser.parse(&mut input).unwrap(), ParseStatus::Accepted);
//! assert_eq!(parser.columns().len(), 5);
//! ```

use super::arena::ItemArena;
use super::column::{Column, NewItem};
use super::debug::ChartPrinter;
use super::error::{ParseError, Rejection};
use super::forest::Forest;
use super::grammar::Grammar;
use super::item::{Item, ItemId, Step};
use super::recovery::{Corrections, ErrorCostProvider, RecoveryMode, UniformCosts};
use super::worklist::Worklist;
use crate::lexer::{Lexer, Location, Token};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Default ceiling on accumulated correction cost
pub const DEFAULT_MAX_ERROR_VALUE: u32 = 3;

/// Default maximum number of columns (0 = no limit)
pub const DEFAULT_MAX_COLUMNS: usize = 0;

/// Default maximum number of live items
pub const DEFAULT_MAX_ITEMS: usize = 10_000_000;

/// Default timeout in milliseconds (0 = no timeout)
pub const DEFAULT_TIMEOUT_MS: u64 = 0;

/// Default expected token count (0 = one arena block)
pub const DEFAULT_EXPECTED_TOKENS: usize = 0;

/// Check interval for timeout (number of closure steps between checks)
pub const TIMEOUT_CHECK_INTERVAL: u64 = 1000;

/// Configuration options for the parser
///
/// Limits set to 0 are disabled. The struct deserializes with defaults for
/// missing fields, so partial JSON works:
///
/// ```rust
/// use tabula::chart::{EarleyConfig, RecoveryMode};
///
/// let config: EarleyConfig =
///     serde_json::from_str(r#"{ "recovery": "on_failure", "max_error_value": 2 }"#).unwrap();
/// assert_eq!(config.recovery, RecoveryMode::OnFailure);
/// assert_eq!(config.timeout_ms, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarleyConfig {
    /// When error corrections are attempted
    pub recovery: RecoveryMode,

    /// Highest accumulated correction cost an item may carry
    pub max_error_value: u32,

    /// Maximum number of columns, i.e. tokens plus one
    pub max_columns: usize,

    /// Maximum number of live items
    pub max_items: usize,

    /// Timeout in milliseconds
    pub timeout_ms: u64,

    /// Expected number of tokens, used to pre-size the item arena
    pub expected_tokens: usize,
}

impl Default for EarleyConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryMode::Disabled,
            max_error_value: DEFAULT_MAX_ERROR_VALUE,
            max_columns: DEFAULT_MAX_COLUMNS,
            max_items: DEFAULT_MAX_ITEMS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            expected_tokens: DEFAULT_EXPECTED_TOKENS,
        }
    }
}

impl EarleyConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recovery mode
    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    /// Set the correction cost ceiling
    pub fn with_max_error_value(mut self, value: u32) -> Self {
        self.max_error_value = value;
        self
    }

    /// Set the maximum number of columns
    pub fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns;
        self
    }

    /// Set the maximum number of live items
    pub fn with_max_items(mut self, items: usize) -> Self {
        self.max_items = items;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the expected token count
    pub fn with_expected_tokens(mut self, tokens: usize) -> Self {
        self.expected_tokens = tokens;
        self
    }
}

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Nothing done yet
    Start,
    /// Filling column 0 from the start symbol
    Seeding,
    /// Running predictor and completer to a fixpoint
    Closing,
    /// Waiting for the next token
    Scanning,
    /// Input accepted
    Accepted,
    /// Input rejected
    Rejected,
}

impl EngineState {
    /// Whether the run is over
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Accepted | EngineState::Rejected)
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// The input is a sentence of the grammar (possibly after corrections)
    Accepted,
    /// The input was rejected
    Rejected(Rejection),
}

impl ParseStatus {
    /// Whether the input was accepted
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseStatus::Accepted)
    }

    /// Rejection detail, if rejected
    #[inline]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ParseStatus::Accepted => None,
            ParseStatus::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Result of one [`EarleyParser::advance`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// More input may follow
    Continue,
    /// The run is over
    Done(ParseStatus),
}

/// Counters collected during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Items created
    pub items: usize,
    /// Extra derivations packed into existing items
    pub packed_links: usize,
    /// Times an item's cost was lowered after creation
    pub cost_updates: usize,
    /// Nonterminals predicted
    pub predictions: usize,
    /// Completed items processed
    pub completions: usize,
    /// Items advanced over a token
    pub scanned: usize,
    /// Correction items proposed by recovery
    pub corrections: usize,
    /// Columns in the chart
    pub columns: usize,
    /// Highest number of simultaneously live items
    pub peak_items: usize,
}

/// Earley chart parser
pub struct EarleyParser<'g> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) config: EarleyConfig,
    pub(crate) costs: Box<dyn ErrorCostProvider + 'g>,
    pub(crate) arena: ItemArena,
    pub(crate) columns: Vec<Column>,
    pub(crate) worklist: Worklist,
    state: EngineState,
    status: Option<ParseStatus>,
    error: Option<ParseError>,
    pub(crate) stats: ParseStats,
    start_time: Option<Instant>,
    op_count: u64,
}

impl fmt::Debug for EarleyParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarleyParser")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("columns", &self.columns.len())
            .field("live_items", &self.arena.live())
            .finish_non_exhaustive()
    }
}

impl<'g> EarleyParser<'g> {
    /// Create a parser with the default configuration
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, EarleyConfig::default())
    }

    /// Create a parser with a custom configuration
    pub fn with_config(grammar: &'g Grammar, config: EarleyConfig) -> Self {
        Self {
            grammar,
            config,
            costs: Box::new(UniformCosts::default()),
            arena: ItemArena::for_tokens(config.expected_tokens),
            columns: Vec::new(),
            worklist: Worklist::new(),
            state: EngineState::Start,
            status: None,
            error: None,
            stats: ParseStats::default(),
            start_time: None,
            op_count: 0,
        }
    }

    /// Replace the configuration; takes effect from the next step
    pub fn set_config(&mut self, config: EarleyConfig) {
        self.config = config;
    }

    /// Replace the correction cost provider
    pub fn set_cost_provider(&mut self, provider: impl ErrorCostProvider + 'g) {
        self.costs = Box::new(provider);
    }

    /// Current configuration
    #[inline]
    pub fn config(&self) -> &EarleyConfig {
        &self.config
    }

    /// The grammar being parsed
    #[inline]
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Current driver state
    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Final status, once the run is over
    #[inline]
    pub fn status(&self) -> Option<&ParseStatus> {
        self.status.as_ref()
    }

    /// Chart columns built so far
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The item arena
    #[inline]
    pub fn arena(&self) -> &ItemArena {
        &self.arena
    }

    /// Look an item up by chart position
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.columns
            .get(id.column as usize)?
            .get(&self.arena, id.seq)
    }

    /// Approximate heap usage of the item arena in bytes
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    /// Run statistics
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            columns: self.columns.len(),
            peak_items: self.arena.peak(),
            ..self.stats
        }
    }

    /// Lowest correction cost of an accepted parse
    pub fn accepted_cost(&self) -> Option<u32> {
        self.forest().and_then(|forest| forest.min_cost())
    }

    /// Derivation forest of an accepted parse
    pub fn forest(&self) -> Option<Forest<'_, 'g>> {
        if self.state == EngineState::Accepted {
            Some(Forest::new(self))
        } else {
            None
        }
    }

    /// Write every column's items to `sink`
    pub fn print<W: fmt::Write>(&self, sink: &mut W) -> fmt::Result {
        ChartPrinter::new(self).write(sink)
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    /// Seed column 0 and close it
    ///
    /// Called implicitly by the first [`EarleyParser::advance`]; calling it
    /// again later does nothing.
    pub fn begin(&mut self) -> Result<(), ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.state != EngineState::Start {
            return Ok(());
        }
        let result = self.seed();
        if let Err(err) = &result {
            self.error = Some(err.clone());
        }
        result
    }

    fn seed(&mut self) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let start = grammar.start();
        if grammar.rules_for(start).is_empty() {
            return Err(ParseError::InvalidGrammar {
                reason: format!(
                    "start symbol '{}' has no productions",
                    grammar.symbol_name(start)
                ),
            });
        }

        if self.config.timeout_ms > 0 {
            self.start_time = Some(Instant::now());
            self.op_count = 0;
        }

        self.state = EngineState::Seeding;
        let mut column = Column::new(grammar, 0, None);
        column.mark_predicted(start);
        self.columns.push(column);
        self.stats.predictions += 1;
        for &rule in grammar.rules_for(start) {
            self.insert(NewItem {
                rule,
                dot: 0,
                origin: 0,
                error_cost: 0,
                link: None,
            });
        }

        self.state = EngineState::Closing;
        self.close()?;
        self.state = EngineState::Scanning;
        Ok(())
    }

    /// Consume at most one token and close the new column
    ///
    /// Once the run is over this keeps returning the same status without
    /// touching `lexer`. A fatal error is sticky in the same way until
    /// [`EarleyParser::reset`].
    pub fn advance<L: Lexer + ?Sized>(&mut self, lexer: &mut L) -> Result<Progress, ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let result = match self.state {
            EngineState::Start => self.begin().map(|()| Progress::Continue),
            EngineState::Accepted | EngineState::Rejected => {
                return match &self.status {
                    Some(status) => Ok(Progress::Done(status.clone())),
                    None => Err(ParseError::Internal {
                        message: "terminal state without a status".to_string(),
                    }),
                };
            }
            _ => self.step(lexer),
        };
        if let Err(err) = &result {
            self.error = Some(err.clone());
        }
        result
    }

    /// Parse until the input is accepted or rejected
    pub fn parse<L: Lexer + ?Sized>(&mut self, lexer: &mut L) -> Result<ParseStatus, ParseError> {
        loop {
            if let Progress::Done(status) = self.advance(lexer)? {
                return Ok(status);
            }
        }
    }

    /// Tear the chart down and return to [`EngineState::Start`]
    ///
    /// Item slots go back to the arena, which keeps its capacity.
    pub fn reset(&mut self) {
        while let Some(mut column) = self.columns.pop() {
            column.teardown(&mut self.arena);
        }
        self.arena.reset();
        self.worklist.clear();
        self.state = EngineState::Start;
        self.status = None;
        self.error = None;
        self.stats = ParseStats::default();
        self.start_time = None;
        self.op_count = 0;
    }

    fn step<L: Lexer + ?Sized>(&mut self, lexer: &mut L) -> Result<Progress, ParseError> {
        let Some(token) = lexer.next_token()? else {
            return Ok(Progress::Done(self.finish()));
        };

        let max_columns = self.config.max_columns;
        if max_columns > 0 && self.columns.len() >= max_columns {
            return Err(ParseError::InputTooLarge {
                columns: self.columns.len() + 1,
                max_columns,
            });
        }

        self.state = EngineState::Scanning;
        let column = self.current();
        let rejection = match self.config.recovery {
            RecoveryMode::Disabled => match self.scan(token) {
                Ok(()) => None,
                Err(token) => Some(Rejection::UnexpectedToken {
                    column,
                    expected: self.columns[column].expected_terminals(self.grammar),
                    token,
                }),
            },
            RecoveryMode::OnFailure => match self.scan(token) {
                Ok(()) => None,
                Err(token) => match self.corrections(&token)? {
                    Corrections::Items(items) => {
                        self.open_column(token, items);
                        None
                    }
                    failed => failed.into_rejection(column, token),
                },
            },
            RecoveryMode::Continuous => {
                let mut items = self.scan_candidates(&token);
                match self.corrections(&token)? {
                    Corrections::Items(more) => {
                        items.extend(more);
                        self.open_column(token, items);
                        None
                    }
                    _ if !items.is_empty() => {
                        self.open_column(token, items);
                        None
                    }
                    failed => failed.into_rejection(column, token),
                }
            }
        };
        if let Some(rejection) = rejection {
            return Ok(Progress::Done(self.reject(rejection)));
        }

        self.state = EngineState::Closing;
        self.close()?;
        self.state = EngineState::Scanning;
        Ok(Progress::Continue)
    }

    /// Input exhausted: accept iff the last column holds a completed start item
    fn finish(&mut self) -> ParseStatus {
        let last = self.current();
        let column = &self.columns[last];
        if column.completed() {
            log_debug!("accepted after {} columns", self.columns.len());
            self.state = EngineState::Accepted;
            self.status = Some(ParseStatus::Accepted);
            return ParseStatus::Accepted;
        }
        let rejection = Rejection::UnexpectedEnd {
            column: last,
            location: self.end_location(),
            expected: column.expected_terminals(self.grammar),
        };
        self.reject(rejection)
    }

    fn reject(&mut self, rejection: Rejection) -> ParseStatus {
        log_debug!("rejected: {}", rejection);
        let status = ParseStatus::Rejected(rejection);
        self.state = EngineState::Rejected;
        self.status = Some(status.clone());
        status
    }

    // ------------------------------------------------------------------------
    // Shared helpers for the closure, scanner and recovery steps
    // ------------------------------------------------------------------------

    /// Index of the newest column
    #[inline]
    pub(crate) fn current(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    /// Append a column opened by `token` and fill it with `items`
    pub(crate) fn open_column(&mut self, token: Token, items: Vec<NewItem>) {
        let index = self.columns.len() as u32;
        log_trace!("opening column {} with {} items", index, items.len());
        self.columns
            .push(Column::new(self.grammar, index, Some(token)));
        for new in items {
            if matches!(new.link, Some(link) if link.step == Step::Scanned) {
                self.stats.scanned += 1;
            }
            self.insert(new);
        }
    }

    /// Add `new` to the newest column, or merge it into the item with its key
    ///
    /// A merge records the extra derivation. If it is cheaper than the stored
    /// one, the item's cost drops and the item is processed again together
    /// with the zero-width completions it waits on.
    pub(crate) fn insert(&mut self, new: NewItem) {
        let grammar = self.grammar;
        let index = self.current();
        let column = &mut self.columns[index];
        let Some(seq) = column.find(new.key()) else {
            column.add_item(&mut self.arena, &mut self.worklist, grammar, new);
            self.stats.items += 1;
            return;
        };
        let Some(slot) = column.slot(seq) else {
            return;
        };
        let item = self.arena.get_mut(slot);
        if let Some(link) = new.link {
            if item.add_link(link) {
                self.stats.packed_links += 1;
            }
        }
        if new.error_cost < item.error_cost {
            item.error_cost = new.error_cost;
            self.stats.cost_updates += 1;
            self.worklist.push_unique(column.id(seq));
            if let Some(next) = grammar.rhs(new.rule, new.dot) {
                column.requeue_nullable(grammar, next, &mut self.worklist);
            }
        }
    }

    /// Enforce item and time limits; called once per closure step
    pub(crate) fn check_limits(&mut self) -> Result<(), ParseError> {
        let max_items = self.config.max_items;
        if max_items > 0 && self.arena.live() > max_items {
            return Err(ParseError::ItemLimitExceeded {
                items: self.arena.live(),
                max_items,
            });
        }

        let timeout_ms = self.config.timeout_ms;
        if timeout_ms == 0 {
            return Ok(());
        }
        self.op_count += 1;
        if self.op_count % TIMEOUT_CHECK_INTERVAL != 0 {
            return Ok(());
        }
        if let Some(start) = self.start_time {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            if elapsed_ms > timeout_ms {
                return Err(ParseError::TimeoutExceeded {
                    elapsed_ms,
                    timeout_ms,
                });
            }
        }
        Ok(())
    }

    /// Position just past the last token read
    pub(crate) fn end_location(&self) -> Location {
        self.columns
            .last()
            .and_then(Column::token)
            .map(Token::end_location)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenStream;

    fn anbn() -> Grammar {
        Grammar::builder()
            .terminals(["a", "b"])
            .rule("S", ["a", "S", "b"])
            .epsilon("S")
            .build()
            .unwrap()
    }

    fn run(grammar: &Grammar, input: &str) -> ParseStatus {
        let mut parser = EarleyParser::new(grammar);
        let mut tokens = TokenStream::from_chars(grammar, input).unwrap();
        parser.parse(&mut tokens).unwrap()
    }

    #[test]
    fn test_anbn_acceptance() {
        let g = anbn();
        for input in ["", "ab", "aabb", "aaabbb"] {
            assert!(run(&g, input).is_accepted(), "{:?} should be accepted", input);
        }
        for input in ["aab", "abb", "ba", "a", "b"] {
            assert!(!run(&g, input).is_accepted(), "{:?} should be rejected", input);
        }
    }

    #[test]
    fn test_state_machine() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ab").unwrap();
        assert_eq!(parser.state(), EngineState::Start);

        assert_eq!(parser.advance(&mut tokens).unwrap(), Progress::Continue);
        assert_eq!(parser.state(), EngineState::Scanning);
        assert_eq!(parser.columns().len(), 1);

        assert_eq!(parser.advance(&mut tokens).unwrap(), Progress::Continue);
        assert_eq!(parser.advance(&mut tokens).unwrap(), Progress::Continue);
        assert_eq!(parser.columns().len(), 3);
        assert_eq!(
            parser.advance(&mut tokens).unwrap(),
            Progress::Done(ParseStatus::Accepted)
        );
        assert_eq!(parser.state(), EngineState::Accepted);
        assert!(parser.state().is_terminal());
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ba").unwrap();
        let first = parser.parse(&mut tokens).unwrap();
        assert!(matches!(
            first,
            ParseStatus::Rejected(Rejection::UnexpectedToken { column: 0, .. })
        ));
        assert_eq!(tokens.remaining().len(), 1);
        assert_eq!(parser.parse(&mut tokens).unwrap(), first);
        assert_eq!(tokens.remaining().len(), 1);
    }

    #[test]
    fn test_unexpected_end_reports_expected() {
        let g = anbn();
        match run(&g, "aab") {
            ParseStatus::Rejected(Rejection::UnexpectedEnd {
                column, expected, ..
            }) => {
                assert_eq!(column, 3);
                assert_eq!(expected, vec![g.symbol("b").unwrap()]);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_kinds([0, 99]);
        let status = parser.parse(&mut tokens).unwrap();
        assert!(matches!(
            status,
            ParseStatus::Rejected(Rejection::UnexpectedToken { column: 1, .. })
        ));
    }

    #[test]
    fn test_start_without_productions() {
        let g = Grammar::builder()
            .terminal("a")
            .nonterminal("S")
            .build()
            .unwrap();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_kinds([0]);
        assert!(matches!(
            parser.parse(&mut tokens),
            Err(ParseError::InvalidGrammar { .. })
        ));
        // sticky until reset
        assert!(parser.begin().is_err());
    }

    #[test]
    fn test_reset_returns_slots() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "aabb").unwrap();
        parser.parse(&mut tokens).unwrap();
        assert!(parser.arena().live() > 0);
        let capacity = parser.arena().capacity();

        parser.reset();
        assert_eq!(parser.state(), EngineState::Start);
        assert_eq!(parser.arena().live(), 0);
        assert_eq!(parser.arena().capacity(), capacity);
        assert!(parser.columns().is_empty());
        assert_eq!(parser.stats().items, 0);
        assert!(parser.status().is_none());
    }

    #[test]
    fn test_expected_tokens_presize_arena() {
        let g = anbn();
        let small = EarleyParser::new(&g);
        let large = EarleyParser::with_config(&g, EarleyConfig::new().with_expected_tokens(1000));
        assert!(large.arena().capacity() > small.arena().capacity());
        assert!(large.memory_usage() > small.memory_usage());

        let config: EarleyConfig = serde_json::from_str(r#"{ "expected_tokens": 100 }"#).unwrap();
        assert_eq!(config.expected_tokens, 100);
        assert_eq!(EarleyConfig::default().expected_tokens, DEFAULT_EXPECTED_TOKENS);
    }

    #[test]
    fn test_reset_clears_arena() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "aaabbb").unwrap();
        parser.parse(&mut tokens).unwrap();
        let peak = parser.stats().peak_items;
        assert!(peak > 0);

        parser.reset();
        assert_eq!(parser.arena().peak(), 0);
        tokens.rewind();
        parser.parse(&mut tokens).unwrap();
        assert_eq!(parser.stats().peak_items, peak);
        assert_eq!(parser.item(ItemId::new(0, 0)).map(|i| i.origin), Some(0));
    }

    #[test]
    fn test_column_limit() {
        let g = anbn();
        let mut parser = EarleyParser::with_config(&g, EarleyConfig::new().with_max_columns(2));
        let mut tokens = TokenStream::from_chars(&g, "aabb").unwrap();
        assert_eq!(
            parser.parse(&mut tokens),
            Err(ParseError::InputTooLarge {
                columns: 3,
                max_columns: 2
            })
        );
    }

    #[test]
    fn test_item_limit() {
        let g = anbn();
        let mut parser = EarleyParser::with_config(&g, EarleyConfig::new().with_max_items(3));
        let mut tokens = TokenStream::from_chars(&g, "aaaabbbb").unwrap();
        assert!(matches!(
            parser.parse(&mut tokens),
            Err(ParseError::ItemLimitExceeded { max_items: 3, .. })
        ));
    }

    #[test]
    fn test_config_builders() {
        let config = EarleyConfig::new()
            .with_recovery(RecoveryMode::Continuous)
            .with_max_error_value(5)
            .with_max_columns(10)
            .with_max_items(100)
            .with_timeout_ms(250);
        assert_eq!(config.recovery, RecoveryMode::Continuous);
        assert_eq!(config.max_error_value, 5);
        assert_eq!(config.max_columns, 10);
        assert_eq!(config.max_items, 100);
        assert_eq!(config.timeout_ms, 250);

        let json = serde_json::to_string(&config).unwrap();
        let back: EarleyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_stats() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ab").unwrap();
        parser.parse(&mut tokens).unwrap();
        let stats = parser.stats();
        assert_eq!(stats.columns, 3);
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.items, parser.arena().live());
        assert!(stats.predictions >= 2);
    }
}
