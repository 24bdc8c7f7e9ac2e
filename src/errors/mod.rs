//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures carrying the offending source line
//! - Variants for syntax, semantic, runtime and internal failures
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;
