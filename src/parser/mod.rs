//! Parser module for building the syntax tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into an arena-backed tree. It uses a Pratt parser for expressions
//! with Pascal operator precedence and handles:
//!
//! - Program, block and routine structure
//! - Constant, type and variable declarations
//! - Statements (assignment, calls, control flow, read and write)
//! - Type specifications (enumerations, subranges, arrays, records)
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
