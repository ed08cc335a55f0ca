//! Integration tests for the regex lexer feeding the chart parser
//!
//! These tests cover:
//! - Longest match and priority resolution
//! - Ignored definitions
//! - Line and column tracking
//! - Lexer errors surfacing through the parser
//! - A JSON value grammar loaded from JSON

use tabula::chart::{EarleyParser, Grammar, LexError, ParseError, ParseStatus, Rejection};
use tabula::lexer::{Lexer, RegexLexer, TokenDef};

const JSON_GRAMMAR: &str = r#"{
    "terminals": ["{", "}", "[", "]", ",", ":", "string", "number", "true", "false", "null"],
    "rules": [
        { "lhs": "Value", "rhs": ["Object"] },
        { "lhs": "Value", "rhs": ["Array"] },
        { "lhs": "Value", "rhs": ["string"] },
        { "lhs": "Value", "rhs": ["number"] },
        { "lhs": "Value", "rhs": ["true"] },
        { "lhs": "Value", "rhs": ["false"] },
        { "lhs": "Value", "rhs": ["null"] },
        { "lhs": "Object", "rhs": ["{", "}"] },
        { "lhs": "Object", "rhs": ["{", "Members", "}"] },
        { "lhs": "Members", "rhs": ["Pair"] },
        { "lhs": "Members", "rhs": ["Members", ",", "Pair"] },
        { "lhs": "Pair", "rhs": ["string", ":", "Value"] },
        { "lhs": "Array", "rhs": ["[", "]"] },
        { "lhs": "Array", "rhs": ["[", "Elements", "]"] },
        { "lhs": "Elements", "rhs": ["Value"] },
        { "lhs": "Elements", "rhs": ["Elements", ",", "Value"] }
    ],
    "start": "Value"
}"#;

fn json_grammar() -> Grammar {
    Grammar::from_json(JSON_GRAMMAR).expect("valid grammar")
}

fn json_lexer(grammar: &Grammar) -> RegexLexer {
    RegexLexer::new(
        grammar,
        vec![
            TokenDef::new("{", r"\{"),
            TokenDef::new("}", r"\}"),
            TokenDef::new("[", r"\["),
            TokenDef::new("]", r"\]"),
            TokenDef::new(",", ","),
            TokenDef::new(":", ":"),
            TokenDef::new("string", r#""(?:[^"\\]|\\.)*""#),
            TokenDef::new("number", r"-?[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?"),
            TokenDef::new("true", "true"),
            TokenDef::new("false", "false"),
            TokenDef::new("null", "null"),
            TokenDef::new("ws", r"\s+").ignored(),
        ],
    )
    .expect("valid token definitions")
}

fn parse_json(grammar: &Grammar, lexer: &RegexLexer, input: &str) -> Result<ParseStatus, ParseError> {
    let mut parser = EarleyParser::new(grammar);
    parser.parse(&mut lexer.tokens(input))
}

// ============================================================================
// Tokenization Tests
// ============================================================================

#[test]
fn test_tokenize_json() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    let tokens = lexer.tokenize(r#"{"a": [1, -2.5e3]}"#).unwrap();
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["{", "\"a\"", ":", "[", "1", ",", "-2.5e3", "]", "}"]
    );
    assert_eq!(g.terminal_for_kind(tokens[1].kind), g.symbol("string"));
    assert_eq!(g.terminal_for_kind(tokens[6].kind), g.symbol("number"));
}

#[test]
fn test_locations_span_lines() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    let tokens = lexer.tokenize("[\n  1,\n  22\n]").unwrap();
    let positions: Vec<(usize, usize, usize)> = tokens
        .iter()
        .map(|t| (t.location.line, t.location.column, t.location.offset))
        .collect();
    assert_eq!(
        positions,
        vec![(1, 1, 0), (2, 3, 4), (2, 4, 5), (3, 3, 9), (4, 1, 12)]
    );
}

#[test]
fn test_priority_breaks_length_ties() {
    let g = Grammar::builder()
        .terminals(["if", "ident"])
        .rule("S", ["if", "ident"])
        .build()
        .unwrap();
    let lexer = RegexLexer::new(
        &g,
        vec![
            TokenDef::new("ident", "[a-z]+"),
            TokenDef::new("if", "if").with_priority(1),
            TokenDef::new("ws", r"\s+").ignored(),
        ],
    )
    .unwrap();

    let tokens = lexer.tokenize("if iffy").unwrap();
    assert_eq!(g.terminal_for_kind(tokens[0].kind), g.symbol("if"));
    assert_eq!(g.terminal_for_kind(tokens[1].kind), g.symbol("ident"));

    let mut parser = EarleyParser::new(&g);
    assert!(parser.parse(&mut lexer.tokens("if iffy")).unwrap().is_accepted());
}

#[test]
fn test_at_end_skips_trailing_whitespace() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    let mut tokens = lexer.tokens("  null \n ");
    assert!(!tokens.at_end());
    let token = tokens.next_token().unwrap().unwrap();
    assert_eq!(token.text, "null");
    assert!(tokens.at_end());
    assert_eq!(tokens.next_token().unwrap(), None);
}

#[test]
fn test_definition_errors() {
    let g = json_grammar();
    let err = RegexLexer::new(&g, vec![TokenDef::new("nope", "x")]).unwrap_err();
    assert!(matches!(err, LexError::UnknownTerminal { ref name } if name == "nope"));

    let err = RegexLexer::new(&g, vec![TokenDef::new("string", "(")]).unwrap_err();
    assert!(matches!(err, LexError::InvalidPattern { ref name, .. } if name == "string"));
}

// ============================================================================
// Parsing Tests
// ============================================================================

#[test]
fn test_parse_json_documents() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    for input in [
        "null",
        "[]",
        "{}",
        r#"{"a": [1, 2.5, true, null], "b": {}}"#,
        "[[[[]]], [false]]",
    ] {
        assert_eq!(
            parse_json(&g, &lexer, input).unwrap(),
            ParseStatus::Accepted,
            "{}",
            input
        );
    }
}

#[test]
fn test_json_tree() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    let mut parser = EarleyParser::new(&g);
    parser.parse(&mut lexer.tokens("[1, 2]")).unwrap();

    let trees = parser.forest().unwrap().trees(10);
    assert_eq!(trees.len(), 1);
    assert_eq!(
        trees[0].to_sexpr(&g),
        "(Value (Array [ (Elements (Elements (Value 1)) , (Value 2)) ]))"
    );
}

#[test]
fn test_json_syntax_error() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    match parse_json(&g, &lexer, r#"{"a": }"#).unwrap() {
        ParseStatus::Rejected(Rejection::UnexpectedToken {
            token, expected, ..
        }) => {
            assert_eq!(token.text, "}");
            assert_eq!(token.location.column, 7);
            let names: Vec<&str> = expected.iter().map(|&s| g.symbol_name(s)).collect();
            assert_eq!(
                names,
                vec!["{", "[", "string", "number", "true", "false", "null"]
            );
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_lex_error_stops_parse() {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    let err = parse_json(&g, &lexer, r#"{"a": @}"#).unwrap_err();
    match err {
        ParseError::Lex(LexError::UnrecognizedInput { found, location }) => {
            assert_eq!(found, '@');
            assert_eq!((location.line, location.column, location.offset), (1, 7, 6));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err_position(r#"{"a": @}"#).contains("line 1, column 7"));
}

fn err_position(input: &str) -> String {
    let g = json_grammar();
    let lexer = json_lexer(&g);
    parse_json(&g, &lexer, input)
        .unwrap_err()
        .format_with_position(input)
}

#[test]
fn test_grammar_json_round_trip() {
    let g = json_grammar();
    let again = Grammar::from_json(&g.to_json().unwrap()).unwrap();
    assert_eq!(again.num_terminals(), g.num_terminals());
    assert_eq!(again.num_nonterminals(), g.num_nonterminals());
    assert_eq!(again.rules(), g.rules());
    assert_eq!(again.start(), g.start());
}
