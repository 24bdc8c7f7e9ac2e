//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts Pascal source
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Case-insensitive recognition of reserved words
//! - Integer, real, character and string literals (`''` escapes a quote)
//! - Line tracking for error reporting
//! - `{ }` and `(* *)` comments and whitespace

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
