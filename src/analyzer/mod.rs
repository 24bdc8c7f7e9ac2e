pub mod analyzer;
pub mod case;
pub mod decl;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
