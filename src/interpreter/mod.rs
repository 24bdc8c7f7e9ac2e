pub mod expr;
pub mod input;
pub mod interpreter;
pub mod stmt;
