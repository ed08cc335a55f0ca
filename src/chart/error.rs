//! Errors and rejection reporting
//!
//! Fatal conditions are returned as [`ParseError`]. An input that simply does
//! not belong to the language is not an error: the engine reports it as a
//! [`Rejection`], which can be turned into a tree-shaped [`RichError`] for
//! presentation.
//!
//! # Example Output
//!
//! ```text
//! Error at line 1, column 4:
//! a b b
//!     ^
//! `- Unexpected 'b' (in column 2)
//!    `- Expected end of input
//! ```

use super::grammar::{Grammar, SymbolId, TokenKind};
use crate::lexer::{Location, Token};
use std::fmt;

// ============================================================================
// Fatal errors
// ============================================================================

/// Error raised while building or loading a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A symbol name was declared twice
    DuplicateSymbol {
        /// The repeated name
        name: String,
    },
    /// Two terminals share a token kind
    DuplicateKind {
        /// The repeated kind
        kind: TokenKind,
    },
    /// A rule mentions a symbol that was never declared
    UndefinedSymbol {
        /// The unknown name
        name: String,
        /// Left-hand side of the offending rule
        lhs: String,
    },
    /// A terminal appears on the left of a rule
    TerminalOnLeftSide {
        /// The terminal name
        name: String,
    },
    /// No start symbol given and no rule to infer it from
    MissingStart,
    /// The start symbol is not declared
    UnknownStart {
        /// The requested name
        name: String,
    },
    /// The start symbol is a terminal
    StartIsTerminal {
        /// The requested name
        name: String,
    },
    /// The serialized description could not be read
    Json {
        /// Message from serde_json
        message: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicateSymbol { name } => {
                write!(f, "Symbol '{}' declared more than once", name)
            }
            GrammarError::DuplicateKind { kind } => {
                write!(f, "Token kind {} assigned to more than one terminal", kind)
            }
            GrammarError::UndefinedSymbol { name, lhs } => {
                write!(f, "Undefined symbol '{}' in a rule for '{}'", name, lhs)
            }
            GrammarError::TerminalOnLeftSide { name } => {
                write!(f, "Terminal '{}' cannot have productions", name)
            }
            GrammarError::MissingStart => write!(f, "Grammar has no start symbol"),
            GrammarError::UnknownStart { name } => {
                write!(f, "Start symbol '{}' is not declared", name)
            }
            GrammarError::StartIsTerminal { name } => {
                write!(f, "Start symbol '{}' is a terminal", name)
            }
            GrammarError::Json { message } => write!(f, "Invalid grammar JSON: {}", message),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Error raised by a lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A token pattern failed to compile
    InvalidPattern {
        /// Token name
        name: String,
        /// Message from the regex compiler
        message: String,
    },
    /// A token definition names no terminal of the grammar
    UnknownTerminal {
        /// Token name
        name: String,
    },
    /// No token pattern matches at this position
    UnrecognizedInput {
        /// First unmatched character
        found: char,
        /// Where it was found
        location: Location,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::InvalidPattern { name, message } => {
                write!(f, "Invalid pattern for token '{}': {}", name, message)
            }
            LexError::UnknownTerminal { name } => {
                write!(f, "Token '{}' is not a terminal of the grammar", name)
            }
            LexError::UnrecognizedInput { found, location } => write!(
                f,
                "Unrecognized input {:?} at line {}, column {}",
                found, location.line, location.column
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Fatal error returned by the parse driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar cannot drive a parse (start symbol has no productions)
    InvalidGrammar {
        /// Reason why the grammar is invalid
        reason: String,
    },

    /// The token source failed
    Lex(LexError),

    /// A collaborator (lexer, cost provider) broke its contract
    Collaborator {
        /// What was violated
        message: String,
    },

    /// Engine invariant violation (shouldn't happen in normal use)
    Internal {
        /// Error message describing the internal error
        message: String,
    },

    /// More columns than the configured limit
    InputTooLarge {
        /// Columns reached
        columns: usize,
        /// Maximum allowed
        max_columns: usize,
    },

    /// More live items than the configured limit
    ItemLimitExceeded {
        /// Live items
        items: usize,
        /// Maximum allowed
        max_items: usize,
    },

    /// Timeout exceeded during parsing
    TimeoutExceeded {
        /// Time elapsed in milliseconds
        elapsed_ms: u64,
        /// Timeout limit in milliseconds
        timeout_ms: u64,
    },
}

impl ParseError {
    /// Add source position information to error message
    pub fn format_with_position(&self, input: &str) -> String {
        match self {
            ParseError::Lex(LexError::UnrecognizedInput { found, location }) => {
                let (line, column) = offset_to_line_col(input, location.offset);
                format!(
                    "Unrecognized input {:?} at line {}, column {} (byte offset {})",
                    found, line, column, location.offset
                )
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidGrammar { reason } => write!(f, "Invalid grammar: {}", reason),
            ParseError::Lex(err) => write!(f, "Lexer error: {}", err),
            ParseError::Collaborator { message } => {
                write!(f, "Collaborator contract violated: {}", message)
            }
            ParseError::Internal { message } => write!(f, "Internal error: {}", message),
            ParseError::InputTooLarge {
                columns,
                max_columns,
            } => write!(
                f,
                "Input too large: {} columns exceeds limit of {}",
                columns, max_columns
            ),
            ParseError::ItemLimitExceeded { items, max_items } => write!(
                f,
                "Item limit exceeded: {} live items exceeds limit of {}",
                items, max_items
            ),
            ParseError::TimeoutExceeded {
                elapsed_ms,
                timeout_ms,
            } => write!(
                f,
                "Timeout exceeded: {}ms elapsed exceeds limit of {}ms",
                elapsed_ms, timeout_ms
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lex(err)
    }
}

// ============================================================================
// Rejections
// ============================================================================

/// Why an input was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No item waits on the next token
    UnexpectedToken {
        /// Last column built before the token
        column: usize,
        /// The token that could not be scanned
        token: Token,
        /// Terminals that would have been accepted
        expected: Vec<SymbolId>,
    },
    /// Input ended before the start symbol was complete
    UnexpectedEnd {
        /// Last column
        column: usize,
        /// Position just past the last token
        location: Location,
        /// Terminals that would have been accepted
        expected: Vec<SymbolId>,
    },
    /// Corrections existed but all exceeded the cost ceiling
    BudgetExceeded {
        /// Column where recovery was attempted
        column: usize,
        /// The offending token
        token: Token,
    },
    /// Nothing was waiting on a terminal, so no correction exists
    RecoveryExhausted {
        /// Column where recovery was attempted
        column: usize,
        /// The offending token
        token: Token,
    },
}

impl Rejection {
    /// Column at which the parse stopped
    pub fn column(&self) -> usize {
        match self {
            Rejection::UnexpectedToken { column, .. }
            | Rejection::UnexpectedEnd { column, .. }
            | Rejection::BudgetExceeded { column, .. }
            | Rejection::RecoveryExhausted { column, .. } => *column,
        }
    }

    /// The token that stopped the parse, if any
    pub fn token(&self) -> Option<&Token> {
        match self {
            Rejection::UnexpectedToken { token, .. }
            | Rejection::BudgetExceeded { token, .. }
            | Rejection::RecoveryExhausted { token, .. } => Some(token),
            Rejection::UnexpectedEnd { .. } => None,
        }
    }

    /// Terminals expected at the failure point
    pub fn expected(&self) -> &[SymbolId] {
        match self {
            Rejection::UnexpectedToken { expected, .. }
            | Rejection::UnexpectedEnd { expected, .. } => expected,
            _ => &[],
        }
    }

    fn location(&self) -> Location {
        match self {
            Rejection::UnexpectedEnd { location, .. } => *location,
            _ => self.token().map(|t| t.location).unwrap_or_default(),
        }
    }

    /// Build a tree-shaped error naming the expected terminals
    pub fn to_rich_error(&self, grammar: &Grammar) -> RichError {
        let span = Span::from_location(&self.location());
        let headline = match self {
            Rejection::UnexpectedToken { token, .. } => format!("Unexpected '{}'", token.text),
            Rejection::UnexpectedEnd { .. } => "Unexpected end of input".to_string(),
            Rejection::BudgetExceeded { token, .. } => {
                format!("No correction for '{}' within the error budget", token.text)
            }
            Rejection::RecoveryExhausted { token, .. } => {
                format!("No correction possible at '{}'", token.text)
            }
        };
        let mut builder = ErrorBuilder::new(headline)
            .span(span)
            .context(format!("column {}", self.column()));
        let expected = self.expected();
        if expected.is_empty() {
            if matches!(self, Rejection::UnexpectedToken { .. }) {
                builder = builder.child(RichError::expected("end of input", span));
            }
        } else {
            let names: Vec<&str> = expected.iter().map(|&s| grammar.symbol_name(s)).collect();
            let what = if names.len() == 1 {
                format!("'{}'", names[0])
            } else {
                format!("one of [{}]", names.join(", "))
            };
            builder = builder.child(RichError::expected(&what, span));
        }
        builder.build()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnexpectedToken { column, token, .. } => write!(
                f,
                "Unexpected token {:?} after column {}",
                token.text, column
            ),
            Rejection::UnexpectedEnd { column, .. } => {
                write!(f, "Unexpected end of input at column {}", column)
            }
            Rejection::BudgetExceeded { column, token } => write!(
                f,
                "Error budget exceeded at token {:?} after column {}",
                token.text, column
            ),
            Rejection::RecoveryExhausted { column, token } => write!(
                f,
                "No recovery possible at token {:?} after column {}",
                token.text, column
            ),
        }
    }
}

// ============================================================================
// Rich errors
// ============================================================================

/// Source position (line, column, byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Start line (1-based)
    pub start_line: usize,
    /// Start column (1-based)
    pub start_column: usize,
}

impl Span {
    /// Create a new span at a single position
    pub fn at(offset: usize, line: usize, column: usize) -> Self {
        Self {
            start: offset,
            end: offset,
            start_line: line,
            start_column: column,
        }
    }

    /// Span starting at a lexer location
    pub fn from_location(location: &Location) -> Self {
        Self::at(location.offset, location.line, location.column)
    }

    /// Span covering a whole token
    pub fn of_token(token: &Token) -> Self {
        let mut span = Self::from_location(&token.location);
        span.end = span.start + token.text.len();
        span
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::at(0, 1, 1)
    }
}

/// A rich, tree-structured parse error
#[derive(Debug, Clone)]
pub struct RichError {
    /// The error message
    pub message: String,
    /// Where the error occurred
    pub span: Span,
    /// What was being parsed
    pub context: Option<String>,
    /// Child errors (causes)
    pub children: Vec<RichError>,
}

impl RichError {
    /// Create a new error at a position
    pub fn at(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            context: None,
            children: Vec::new(),
        }
    }

    /// Create an "expected" error
    pub fn expected(expected: &str, span: Span) -> Self {
        Self::at(format!("Expected {}", expected), span)
    }

    /// Format as ASCII tree
    pub fn ascii_tree(&self) -> String {
        let mut output = String::new();
        self.ascii_tree_impl(&mut output, "", true);
        output
    }

    fn ascii_tree_impl(&self, output: &mut String, prefix: &str, last: bool) {
        output.push_str(prefix);
        output.push_str(if last { "`- " } else { "|- " });
        output.push_str(&self.message);
        if let Some(ref ctx) = self.context {
            output.push_str(&format!(" (in {})", ctx));
        }
        output.push('\n');

        let child_prefix = format!("{}{}", prefix, if last { "   " } else { "|  " });
        for (i, child) in self.children.iter().enumerate() {
            child.ascii_tree_impl(output, &child_prefix, i + 1 == self.children.len());
        }
    }

    /// Format with the offending source line and a caret
    pub fn format_with_source(&self, source: &str) -> String {
        let pos = self.span.start.min(source.len());
        let line_start = source[..pos].rfind('\n').map(|n| n + 1).unwrap_or(0);
        let line_end = source[pos..]
            .find('\n')
            .map(|n| pos + n)
            .unwrap_or(source.len());

        let mut output = format!(
            "Error at line {}, column {}:\n",
            self.span.start_line, self.span.start_column
        );
        output.push_str(&source[line_start..line_end]);
        output.push('\n');
        output.push_str(&" ".repeat(self.span.start_column.saturating_sub(1)));
        output.push_str("^\n");
        output.push_str(&self.ascii_tree());
        output
    }
}

impl fmt::Display for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {}, column {}: {}",
            self.span.start_line, self.span.start_column, self.message
        )
    }
}

impl std::error::Error for RichError {}

/// Error builder for constructing rich errors
pub struct ErrorBuilder {
    message: String,
    span: Span,
    context: Option<String>,
    children: Vec<RichError>,
}

impl ErrorBuilder {
    /// Create a new error builder
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: Span::default(),
            context: None,
            children: Vec::new(),
        }
    }

    /// Set the span
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Set context
    pub fn context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Add a child error
    pub fn child(mut self, child: RichError) -> Self {
        self.children.push(child);
        self
    }

    /// Build the error
    pub fn build(self) -> RichError {
        RichError {
            message: self.message,
            span: self.span,
            context: self.context,
            children: self.children,
        }
    }
}

/// Convert byte offset to line/column
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let end = offset.min(source.len());
    let prefix = &source.as_bytes()[..end];
    let line = 1 + memchr::memchr_iter(b'\n', prefix).count();
    let line_start = memchr::memrchr(b'\n', prefix).map_or(0, |n| n + 1);
    let column = 1 + source
        .get(line_start..end)
        .map_or(end - line_start, |s| s.chars().count());
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, offset: usize, column: usize) -> Token {
        Token::new(
            1,
            text,
            Location {
                line: 1,
                column,
                offset,
            },
        )
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "ab\ncd\nef";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 1), (1, 2));
        assert_eq!(offset_to_line_col(source, 3), (2, 1));
        assert_eq!(offset_to_line_col(source, 7), (3, 2));
        assert_eq!(offset_to_line_col(source, 100), (3, 3));
    }

    #[test]
    fn test_rich_error_ascii_tree() {
        let error = ErrorBuilder::new("Unexpected 'b'")
            .context("column 2")
            .child(RichError::expected("'a'", Span::default()))
            .build();

        let tree = error.ascii_tree();
        assert!(tree.starts_with("`- Unexpected 'b' (in column 2)\n"));
        assert!(tree.contains("   `- Expected 'a'"));
    }

    #[test]
    fn test_format_with_source() {
        let source = "hello world\nthis is a test\nmore text";
        let error = ErrorBuilder::new("Unexpected token")
            .span(Span::at(17, 2, 6))
            .build();

        let formatted = error.format_with_source(source);
        assert!(formatted.contains("line 2, column 6"));
        assert!(formatted.contains("this is a test\n     ^\n"));
        assert!(formatted.contains("Unexpected token"));
    }

    #[test]
    fn test_rejection_accessors() {
        let rejection = Rejection::UnexpectedToken {
            column: 2,
            token: token("b", 4, 5),
            expected: vec![1],
        };
        assert_eq!(rejection.column(), 2);
        assert_eq!(rejection.token().map(|t| t.text.as_str()), Some("b"));
        assert_eq!(rejection.expected(), &[1]);
        assert!(rejection.to_string().contains("after column 2"));
    }

    #[test]
    fn test_rejection_rich_error() {
        let grammar = Grammar::builder()
            .terminals(["a", "b"])
            .rule("S", ["a", "b"])
            .build()
            .unwrap();
        let rejection = Rejection::UnexpectedToken {
            column: 1,
            token: token("a", 2, 3),
            expected: vec![2],
        };
        let error = rejection.to_rich_error(&grammar);
        assert_eq!(error.span.start, 2);
        assert_eq!(error.children.len(), 1);
        assert_eq!(error.children[0].message, "Expected 'b'");

        let end = Rejection::UnexpectedEnd {
            column: 1,
            location: Location::default(),
            expected: vec![1, 2],
        };
        let error = end.to_rich_error(&grammar);
        assert_eq!(error.message, "Unexpected end of input");
        assert_eq!(error.children[0].message, "Expected one of [a, b]");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::InputTooLarge {
            columns: 11,
            max_columns: 10,
        };
        assert!(err.to_string().contains("11 columns"));

        let lex = ParseError::from(LexError::UnrecognizedInput {
            found: '$',
            location: Location {
                line: 2,
                column: 1,
                offset: 4,
            },
        });
        assert!(std::error::Error::source(&lex).is_some());
        assert_eq!(
            lex.format_with_position("ab\n\n$"),
            "Unrecognized input '$' at line 3, column 1 (byte offset 4)"
        );
    }
}
