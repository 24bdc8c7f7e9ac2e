//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Reserved words in any letter case
//! - Numeric literals (integers and reals)
//! - Character and string literals with doubled quotes
//! - Operators and punctuation
//! - Comments and line tracking
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string())
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = kinds("program begin end if then else while do repeat until for to downto case of");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Program,
            TokenKind::Begin,
            TokenKind::End,
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::Repeat,
            TokenKind::Until,
            TokenKind::For,
            TokenKind::To,
            TokenKind::Downto,
            TokenKind::Case,
            TokenKind::Of,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    let tokens = tokenize("BEGIN WriteLn End".to_string()).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Begin);
    assert_eq!(tokens[1].kind, TokenKind::Writeln);
    assert_eq!(tokens[1].value, "WriteLn");
    assert_eq!(tokens[2].kind, TokenKind::End);
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("alpha _beta gamma2".to_string()).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "alpha");
    assert_eq!(tokens[1].value, "_beta");
    assert_eq!(tokens[2].value, "gamma2");
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 1e3 2.5E-2".to_string()).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[1].kind, TokenKind::Real);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Real);
    assert_eq!(tokens[3].kind, TokenKind::Real);
    assert_eq!(tokens[3].value, "2.5E-2");
}

#[test]
fn test_subrange_is_not_a_real() {
    let tokens = kinds("1..10");

    assert_eq!(
        tokens,
        vec![TokenKind::Integer, TokenKind::DotDot, TokenKind::Integer, TokenKind::EOF]
    );
}

#[test]
fn test_tokenize_strings_and_characters() {
    let tokens = tokenize("'hello' 'x' 'it''s'".to_string()).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].kind, TokenKind::Character);
    assert_eq!(tokens[1].value, "x");
    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].value, "it's");
}

#[test]
fn test_tokenize_operators() {
    let tokens = kinds(":= = <> < <= > >= + - * / ..");

    assert_eq!(
        tokens,
        vec![
            TokenKind::ColonEquals,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::LessEquals,
            TokenKind::Greater,
            TokenKind::GreaterEquals,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::DotDot,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    let tokens = kinds("( ) [ ] , ; : .");

    assert_eq!(
        tokens,
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let tokens = kinds("a { comment } b (* another\n comment *) c");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_line_numbers() {
    let tokens = tokenize("a\nb\n{ one\ntwo }\nc".to_string()).unwrap();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 5);
}

#[test]
fn test_unrecognised_token() {
    let result = tokenize("a := @;".to_string());

    assert!(result.is_err());
    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_line(), 1);
}

#[test]
fn test_eof_token() {
    let tokens = tokenize(String::new()).unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::EOF);
}
