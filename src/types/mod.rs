//! Type table with canonical built-in ids and the assignment compatibility rules.

pub mod types;

#[cfg(test)]
mod tests;
