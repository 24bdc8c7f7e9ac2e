//! Bytecode generation for an abstract stack machine.
//!
//! This module lowers the annotated tree to instructions with symbolic
//! labels. It handles:
//!
//! - Operand stack depth accounting and merge-point checks
//! - Globals, slots and value-semantics copies of composites
//! - Control flow, case dispatch and calls
//! - Runtime library calls for formatted output and input

pub mod compiler;
pub mod emitter;
pub mod expr;
pub mod instruction;
pub mod stdlib;
pub mod stmt;

#[cfg(test)]
mod tests;
