//! Token sources for the chart parser
//!
//! The engine pulls tokens one at a time through the [`Lexer`] trait and maps
//! each token's `kind` to a terminal of the [`Grammar`]. Two sources ship with
//! the crate:
//!
//! - [`TokenStream`], a pre-tokenized vector (handy for tests and for callers
//!   with their own scanner)
//! - [`RegexLexer`], which matches regex token definitions with a
//!   character-first dispatch table, longest match and priority tie-break
//!
//! Performance characteristics of [`RegexLexer`]:
//! - O(n) single pass through input
//! - Character-first dispatch (only try relevant patterns)
//! - Pre-compiled, start-anchored regex patterns

use crate::chart::error::LexError;
use crate::chart::grammar::{Grammar, TokenKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Position in source for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line (1-based)
    pub line: usize,
    /// Column in characters (1-based)
    pub column: usize,
    /// Byte offset
    pub offset: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

/// A token handed to the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// External kind, mapped to a terminal by the grammar
    pub kind: TokenKind,
    /// Matched text
    pub text: String,
    /// Where the token starts
    pub location: Location,
}

impl Token {
    /// Create a token
    pub fn new(kind: TokenKind, text: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }

    /// Location just past the end of this token
    pub fn end_location(&self) -> Location {
        let mut end = self.location;
        advance_location(&mut end, &self.text);
        end
    }
}

/// Move `location` over `text`, counting lines with memchr
fn advance_location(location: &mut Location, text: &str) {
    let bytes = text.as_bytes();
    match memchr::memrchr(b'\n', bytes) {
        Some(last) => {
            location.line += memchr::memchr_iter(b'\n', bytes).count();
            location.column = 1 + text[last + 1..].chars().count();
        }
        None => location.column += text.chars().count(),
    }
    location.offset += bytes.len();
}

/// A source of tokens, consumed strictly left to right
pub trait Lexer {
    /// Next token, or `Ok(None)` once the input is exhausted
    fn next_token(&mut self) -> Result<Option<Token>, LexError>;

    /// Whether no further tokens remain
    ///
    /// Must answer truthfully before and after the final token.
    fn at_end(&self) -> bool;
}

// ============================================================================
// Pre-tokenized input
// ============================================================================

/// Vector-backed token source
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    /// Wrap a token vector
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Tokens with the given kinds and no text
    pub fn from_kinds<I: IntoIterator<Item = TokenKind>>(kinds: I) -> Self {
        let tokens = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| {
                Token::new(
                    kind,
                    String::new(),
                    Location {
                        line: 1,
                        column: i + 1,
                        offset: i,
                    },
                )
            })
            .collect();
        Self::new(tokens)
    }

    /// Whitespace-separated terminal names, e.g. `"num + num"`
    pub fn from_names(grammar: &Grammar, input: &str) -> Result<Self, LexError> {
        let mut tokens = Vec::new();
        let mut location = Location::default();
        let mut rest = input;
        while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
            advance_location(&mut location, &rest[..start]);
            rest = &rest[start..];
            let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let name = &rest[..len];
            tokens.push(Token::new(terminal_kind(grammar, name)?, name, location));
            advance_location(&mut location, name);
            rest = &rest[len..];
        }
        Ok(Self::new(tokens))
    }

    /// One token per non-whitespace character, each naming a terminal
    pub fn from_chars(grammar: &Grammar, input: &str) -> Result<Self, LexError> {
        let mut tokens = Vec::with_capacity(input.len());
        let mut location = Location::default();
        for ch in input.chars() {
            let mut buf = [0u8; 4];
            let name: &str = ch.encode_utf8(&mut buf);
            if !ch.is_whitespace() {
                tokens.push(Token::new(terminal_kind(grammar, name)?, name, location));
            }
            advance_location(&mut location, name);
        }
        Ok(Self::new(tokens))
    }

    /// Total number of tokens
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the stream holds no tokens at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens not yet consumed
    #[inline]
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.pos..]
    }

    /// Start again from the first token
    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl Lexer for TokenStream {
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        Ok(token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

fn terminal_kind(grammar: &Grammar, name: &str) -> Result<TokenKind, LexError> {
    grammar
        .symbol(name)
        .and_then(|s| grammar.kind_of(s))
        .ok_or_else(|| LexError::UnknownTerminal {
            name: name.to_string(),
        })
}

// ============================================================================
// Regex lexer
// ============================================================================

/// Token definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDef {
    /// Terminal name (ignored definitions need not name a terminal)
    pub name: String,
    /// Regex pattern string
    pub pattern: String,
    /// Priority for resolving equal-length matches (higher = preferred)
    #[serde(default)]
    pub priority: i32,
    /// Whether matches are skipped (e.g., whitespace)
    #[serde(default)]
    pub ignore: bool,
}

impl TokenDef {
    /// Definition with default priority
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            priority: 0,
            ignore: false,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark matches as skipped
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// Bytes a pattern can start with
#[derive(Debug, Clone, PartialEq, Eq)]
enum FirstBytes {
    /// Unknown or unrestricted; try the pattern everywhere
    Any,
    /// One of these bytes
    Set(Vec<u8>),
}

impl FirstBytes {
    fn union(self, other: FirstBytes) -> FirstBytes {
        match (self, other) {
            (FirstBytes::Set(mut a), FirstBytes::Set(b)) => {
                a.extend(b);
                FirstBytes::Set(a)
            }
            _ => FirstBytes::Any,
        }
    }
}

/// Perl classes are Unicode-aware, so they may also start with any lead byte
fn class_escape(c: u8) -> Option<Vec<u8>> {
    let non_ascii = 0x80..=0xFF;
    match c {
        b'd' => Some((b'0'..=b'9').chain(non_ascii).collect()),
        b'w' => Some(
            (b'a'..=b'z')
                .chain(b'A'..=b'Z')
                .chain(b'0'..=b'9')
                .chain(std::iter::once(b'_'))
                .chain(non_ascii)
                .collect(),
        ),
        b's' => Some(b" \t\n\r\x0b\x0c".iter().copied().chain(non_ascii).collect()),
        b'n' => Some(vec![b'\n']),
        b'r' => Some(vec![b'\r']),
        b't' => Some(vec![b'\t']),
        c if c.is_ascii_punctuation() => Some(vec![c]),
        _ => None,
    }
}

/// Parse a non-negated ASCII class body, returning its bytes and length
fn parse_class(bytes: &[u8]) -> Option<(Vec<u8>, usize)> {
    debug_assert_eq!(bytes.first(), Some(&b'['));
    if bytes.get(1) == Some(&b'^') {
        return None;
    }
    let mut set = Vec::new();
    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b']' && i > 1 {
            return Some((set, i + 1));
        }
        if !b.is_ascii() || b == b'[' {
            return None;
        }
        if b == b'\\' {
            set.extend(class_escape(*bytes.get(i + 1)?)?);
            i += 2;
        } else if bytes.get(i + 1) == Some(&b'-') && bytes.get(i + 2).is_some_and(|&e| e != b']') {
            let end = bytes[i + 2];
            if !end.is_ascii() || end < b {
                return None;
            }
            set.extend(b..=end);
            i += 3;
        } else {
            set.push(b);
            i += 1;
        }
    }
    None
}

/// Split on top-level `|`
fn split_alternatives(pattern: &str) -> Vec<&str> {
    let bytes = pattern.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => depth += 1,
            b')' if !in_class => depth = depth.saturating_sub(1),
            b'|' if !in_class && depth == 0 => {
                parts.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&pattern[start..]);
    parts
}

/// Conservative first-byte analysis used to build the dispatch table
fn first_bytes(pattern: &str) -> FirstBytes {
    let alternatives = split_alternatives(pattern);
    if alternatives.len() > 1 {
        return alternatives
            .into_iter()
            .map(first_bytes)
            .reduce(FirstBytes::union)
            .unwrap_or(FirstBytes::Any);
    }

    let bytes = pattern.as_bytes();
    let (set, width) = match bytes.first() {
        None => return FirstBytes::Any,
        Some(b'\\') => match bytes.get(1).and_then(|&c| class_escape(c)) {
            Some(set) => (set, 2),
            None => return FirstBytes::Any,
        },
        Some(b'[') => match parse_class(bytes) {
            Some(parsed) => parsed,
            None => return FirstBytes::Any,
        },
        Some(&b) if b.is_ascii_alphanumeric() || b" _-,;:=<>!@#%&'\"/~`".contains(&b) => {
            (vec![b], 1)
        }
        Some(_) => return FirstBytes::Any,
    };

    // A quantifier that admits zero repetitions lets later atoms start the match
    match bytes.get(width) {
        Some(b'?' | b'*' | b'{') => FirstBytes::Any,
        _ => FirstBytes::Set(set),
    }
}

/// Compiled token pattern
#[derive(Debug)]
struct CompiledToken {
    name: String,
    /// `None` for ignored definitions
    kind: Option<TokenKind>,
    regex: Regex,
    priority: i32,
    ignore: bool,
}

/// Dispatch table for character-first matching
#[derive(Debug)]
struct DispatchTable {
    /// 256-entry table mapping byte -> pattern indices
    table: [Vec<usize>; 256],
    /// Patterns that must be tried for every byte
    always: Vec<usize>,
}

impl DispatchTable {
    fn new() -> Self {
        DispatchTable {
            table: std::array::from_fn(|_| Vec::new()),
            always: Vec::new(),
        }
    }

    fn add(&mut self, index: usize, first: FirstBytes) {
        match first {
            FirstBytes::Any => self.always.push(index),
            FirstBytes::Set(mut set) => {
                set.sort_unstable();
                set.dedup();
                for b in set {
                    self.table[b as usize].push(index);
                }
            }
        }
    }

    fn candidates(&self, byte: u8) -> impl Iterator<Item = usize> + '_ {
        self.table[byte as usize]
            .iter()
            .chain(self.always.iter())
            .copied()
    }
}

/// Regex lexer bound to a grammar's terminals
///
/// # Example
///
/// ```
/// use tabula::chart::Grammar;
/// use tabula::lexer::{Lexer, RegexLexer, TokenDef};
///
/// let grammar = Grammar::builder()
///     .terminals(["num", "+"])
///     .rule("E", ["E", "+", "E"])
///     .rule("E", ["num"])
///     .build()
///     .unwrap();
///
/// let lexer = RegexLexer::new(
///     &grammar,
///     vec![
///         TokenDef::new("num", r"[0-9]+"),
///         TokenDef::new("+", r"\+"),
///         TokenDef::new("ws", r"\s+").ignored(),
///     ],
/// )
/// .unwrap();
///
/// let tokens = lexer.tokenize("12 + 3").unwrap();
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[2].text, "3");
/// ```
#[derive(Debug)]
pub struct RegexLexer {
    tokens: Vec<CompiledToken>,
    dispatch: DispatchTable,
}

impl RegexLexer {
    /// Compile definitions against `grammar`
    ///
    /// Every non-ignored definition must name a terminal of the grammar.
    pub fn new(grammar: &Grammar, definitions: Vec<TokenDef>) -> Result<Self, LexError> {
        let mut tokens = Vec::with_capacity(definitions.len());
        let mut dispatch = DispatchTable::new();

        for (index, def) in definitions.into_iter().enumerate() {
            let regex = Regex::new(&format!("^(?:{})", def.pattern)).map_err(|e| {
                LexError::InvalidPattern {
                    name: def.name.clone(),
                    message: e.to_string(),
                }
            })?;
            let kind = if def.ignore {
                None
            } else {
                Some(terminal_kind(grammar, &def.name)?)
            };
            dispatch.add(index, first_bytes(&def.pattern));
            tokens.push(CompiledToken {
                name: def.name,
                kind,
                regex,
                priority: def.priority,
                ignore: def.ignore,
            });
        }

        Ok(RegexLexer { tokens, dispatch })
    }

    /// Number of definitions
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no definitions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Names of the definitions, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.name.as_str())
    }

    /// Streaming token source over `input`
    pub fn tokens<'a>(&'a self, input: &'a str) -> RegexTokens<'a> {
        let mut stream = RegexTokens {
            lexer: self,
            input,
            location: Location::default(),
            pending: None,
        };
        stream.skip_ignored();
        stream
    }

    /// Tokenize the whole input
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut stream = self.tokens(input);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Longest match at the start of `rest`; ties go to priority, then order
    fn longest_match(&self, rest: &str) -> Option<(usize, usize)> {
        let first = *rest.as_bytes().first()?;
        let mut best: Option<(usize, usize)> = None;
        for index in self.dispatch.candidates(first) {
            let token = &self.tokens[index];
            let len = match token.regex.find(rest) {
                Some(m) if m.end() > 0 => m.end(),
                _ => continue,
            };
            let better = match best {
                None => true,
                Some((best_index, best_len)) => {
                    let best_priority = self.tokens[best_index].priority;
                    len > best_len
                        || (len == best_len && token.priority > best_priority)
                        || (len == best_len && token.priority == best_priority && index < best_index)
                }
            };
            if better {
                best = Some((index, len));
            }
        }
        best
    }
}

/// Streaming token source produced by [`RegexLexer::tokens`]
///
/// Ignorable input is skipped eagerly after every token, so [`Lexer::at_end`]
/// is exact even with trailing whitespace.
#[derive(Debug)]
pub struct RegexTokens<'a> {
    lexer: &'a RegexLexer,
    input: &'a str,
    location: Location,
    /// Error found while skipping, reported by the next `next_token`
    pending: Option<LexError>,
}

impl RegexTokens<'_> {
    /// Current location
    pub fn location(&self) -> Location {
        self.location
    }

    fn rest(&self) -> &str {
        &self.input[self.location.offset..]
    }

    fn unrecognized(&self) -> LexError {
        LexError::UnrecognizedInput {
            found: self.rest().chars().next().unwrap_or('\0'),
            location: self.location,
        }
    }

    fn skip_ignored(&mut self) {
        while self.location.offset < self.input.len() {
            match self.lexer.longest_match(self.rest()) {
                Some((index, len)) if self.lexer.tokens[index].ignore => {
                    let skipped = &self.input[self.location.offset..self.location.offset + len];
                    advance_location(&mut self.location, skipped);
                }
                Some(_) => break,
                None => {
                    self.pending = Some(self.unrecognized());
                    break;
                }
            }
        }
    }
}

impl Lexer for RegexTokens<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        if self.location.offset >= self.input.len() {
            return Ok(None);
        }
        let (index, len) = self
            .lexer
            .longest_match(self.rest())
            .ok_or_else(|| self.unrecognized())?;
        let text = &self.input[self.location.offset..self.location.offset + len];
        let Some(kind) = self.lexer.tokens[index].kind else {
            // ignored match at the cursor: skip it and try again
            advance_location(&mut self.location, text);
            self.skip_ignored();
            return self.next_token();
        };
        let token = Token::new(kind, text, self.location);
        advance_location(&mut self.location, text);
        self.skip_ignored();
        Ok(Some(token))
    }

    fn at_end(&self) -> bool {
        self.pending.is_none() && self.location.offset >= self.input.len()
    }
}
