//! Scopes and symbol entries.
//!
//! - `symtab`: the scope arena, the open-scope stack, declare and resolve
//! - `value`: runtime values stored in entry slots and folded constants

pub mod symtab;
pub mod value;

#[cfg(test)]
mod tests;
