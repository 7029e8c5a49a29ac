// tests/lexer_tests.rs

use dq_lang::ast::TokenKind;
use dq_lang::lexer::{LexError, Lexer};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn texts(input: &str) -> Vec<String> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// ============================================================================
// Symbols and Operators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("|", TokenKind::Pipe),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        (",", TokenKind::Comma),
        ("=", TokenKind::Assign),
        (".", TokenKind::Dot),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            kinds(input),
            vec![expected, TokenKind::Eof],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("<=", TokenKind::LtEq),
        (">=", TokenKind::GtEq),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            kinds(input),
            vec![expected, TokenKind::Eof],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_assign_vs_equality() {
    assert_eq!(
        kinds("a = b == c"),
        vec![
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Identifier,
            TokenKind::EqEq,
            TokenKind::Identifier,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_lone_bang_is_an_error() {
    let err = Lexer::new("a ! b").tokenize().unwrap_err();
    assert!(matches!(
        err,
        LexError::UnexpectedChar {
            ch: '!',
            position: 2,
            ..
        }
    ));
    assert!(err.to_string().contains("did you mean '!='"));
}

#[test]
fn test_illegal_character() {
    let err = Lexer::new("age # 3").tokenize().unwrap_err();
    assert_eq!(
        err,
        LexError::UnexpectedChar {
            ch: '#',
            position: 4,
            hint: ""
        }
    );
}

// ============================================================================
// Keywords and Identifiers
// ============================================================================

#[test]
fn test_keywords() {
    let test_cases = vec![
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("is", TokenKind::Is),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("null", TokenKind::Null),
        ("as", TokenKind::As),
    ];

    for (input, expected) in test_cases {
        assert_eq!(kinds(input), vec![expected, TokenKind::Eof]);
    }
}

#[test]
fn test_identifiers() {
    let test_cases = vec!["name", "_private", "col2", "first_name", "andy", "notes", "island"];

    for input in test_cases {
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier, "input {}", input);
        assert_eq!(tokens[0].text, input);
    }
}

#[test]
fn test_backtick_identifier() {
    let tokens = Lexer::new("`first name` | x").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::QuotedIdentifier);
    assert_eq!(tokens[0].text, "first name");
    assert_eq!(tokens[1].kind, TokenKind::Pipe);
}

#[test]
fn test_unterminated_backtick() {
    assert_eq!(
        Lexer::new("select `first name").tokenize(),
        Err(LexError::UnterminatedIdentifier(7))
    );
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integers_and_floats() {
    let tokens = Lexer::new("42 3.14 0").tokenize().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].text, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].text, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
}

#[test]
fn test_dot_without_digit_is_separate() {
    assert_eq!(
        kinds("5.csv"),
        vec![
            TokenKind::Integer,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_minus_after_operand_is_operator() {
    assert_eq!(
        kinds("age - 5"),
        vec![
            TokenKind::Identifier,
            TokenKind::Minus,
            TokenKind::Integer,
            TokenKind::Eof
        ]
    );
    // no space: still subtraction because `age` ends an operand
    assert_eq!(texts("age -5"), vec!["age", "-", "5", ""]);
    assert_eq!(texts("(1) -2"), vec!["(", "1", ")", "-", "2", ""]);
}

#[test]
fn test_negative_literal_contexts() {
    let test_cases = vec![
        ("-5", vec!["-5", ""]),
        ("age > -5", vec!["age", ">", "-5", ""]),
        ("f(-1, -2.5)", vec!["f", "(", "-1", ",", "-2.5", ")", ""]),
        ("x = -3", vec!["x", "=", "-3", ""]),
        ("{ -1 }", vec!["{", "-1", "}", ""]),
        ("a * -2", vec!["a", "*", "-2", ""]),
        ("not -1", vec!["not", "-1", ""]),
    ];

    for (input, expected) in test_cases {
        assert_eq!(texts(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_minus_before_identifier_is_operator() {
    assert_eq!(
        kinds("-age"),
        vec![TokenKind::Minus, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn test_integer_out_of_range() {
    let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
    assert!(matches!(err, LexError::InvalidNumber { position: 0, .. }));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_escapes() {
    let test_cases = vec![
        (r#""hello""#, "hello"),
        (r#""say \"hi\"""#, "say \"hi\""),
        (r#""a\\b""#, "a\\b"),
        (r#""line\nbreak""#, "line\nbreak"),
        (r#""tab\there""#, "tab\there"),
        (r#""keep \d as is""#, "keep \\d as is"),
    ];

    for (input, expected) in test_cases {
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_unterminated_string() {
    assert_eq!(
        Lexer::new(r#"city == "NY"#).tokenize(),
        Err(LexError::UnterminatedString(8))
    );
}

// ============================================================================
// Whitespace, Comments, Positions
// ============================================================================

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("head 5 // first rows\n| count"),
        vec![
            TokenKind::Identifier,
            TokenKind::Integer,
            TokenKind::Pipe,
            TokenKind::Identifier,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_positions() {
    let tokens = Lexer::new("a  >= 10").tokenize().unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 3, 6, 8]);
}

// ============================================================================
// Filename Scanning
// ============================================================================

#[test]
fn test_filename_scan_is_greedy() {
    let test_cases = vec![
        ("data/2024/sales.csv | head 1", "data/2024/sales.csv"),
        ("users.csv|count", "users.csv"),
        ("  ./my-file_v2.jsonl", "./my-file_v2.jsonl"),
        ("-", "-"),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).scan_filename().unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.text, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_filename_quoted_forms() {
    let token = Lexer::new("`my data.csv` | head 1").scan_filename().unwrap();
    assert_eq!(token.kind, TokenKind::QuotedIdentifier);
    assert_eq!(token.text, "my data.csv");

    let token = Lexer::new(r#""other file.json""#).scan_filename().unwrap();
    assert_eq!(token.kind, TokenKind::String);
    assert_eq!(token.text, "other file.json");
}

#[test]
fn test_filename_then_ordinary_tokens() {
    let mut lexer = Lexer::new("users.csv | filter { age > -1 }");
    assert_eq!(lexer.scan_filename().unwrap().text, "users.csv");
    let rest: Vec<String> = lexer.tokenize().unwrap().into_iter().map(|t| t.text).collect();
    assert_eq!(rest, vec!["|", "filter", "{", "age", ">", "-1", "}", ""]);
}

#[test]
fn test_missing_filename_is_empty() {
    let token = Lexer::new("   | head 1").scan_filename().unwrap();
    assert!(token.text.is_empty());
}
