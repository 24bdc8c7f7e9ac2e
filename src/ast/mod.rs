/// Syntax tree module
/// Contains the arena-backed tree handed to the analyzer and backends
///
/// Submodules:
/// - ast: Node kinds, the node arena and child-layout accessors
/// - annotations: Per-node symbol, type and jump table side tables
/// - builder: Incremental tree construction
/// - printer: Indented tree dump
pub mod annotations;
pub mod ast;
pub mod builder;
pub mod printer;

#[cfg(test)]
mod tests;
