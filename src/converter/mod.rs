pub mod converter;
pub mod expr;
pub mod stmt;
