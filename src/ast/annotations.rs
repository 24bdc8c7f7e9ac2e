//! Side tables filled in by the analyzer, indexed by `NodeId`.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::xxh64;

use crate::{symtab::symtab::SymbolId, types::types::TypeId};

use super::ast::NodeId;

/// How a case selector is turned into a dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Integer,
    Enumeration,
    Char,
    StringHash,
}

/// Normalized dispatch key of a string case label or selector.
pub fn string_key(value: &str) -> i64 {
    xxh64(value.as_bytes(), 0) as i64
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpTable {
    pub key_kind: KeyKind,
    /// Ascending key order; several keys may share one branch statement.
    pub entries: BTreeMap<i64, NodeId>,
    pub default: Option<NodeId>,
    /// Distinct string labels whose keys collide. Recorded, not resolved.
    pub collisions: Vec<(String, String)>,
}

impl JumpTable {
    pub fn new(key_kind: KeyKind) -> Self {
        JumpTable {
            key_kind,
            entries: BTreeMap::new(),
            default: None,
            collisions: vec![],
        }
    }

    pub fn target(&self, key: i64) -> Option<NodeId> {
        self.entries.get(&key).copied().or(self.default)
    }

    /// Branch statements in order of their smallest key, without repeats.
    pub fn branches(&self) -> Vec<NodeId> {
        let mut branches: Vec<NodeId> = vec![];
        for target in self.entries.values() {
            if !branches.contains(target) {
                branches.push(*target);
            }
        }
        branches
    }
}

#[derive(Debug, Clone, Default)]
pub struct Annotations {
    symbols: Vec<Option<SymbolId>>,
    types: Vec<Option<TypeId>>,
    jump_tables: FxHashMap<NodeId, JumpTable>,
}

impl Annotations {
    pub fn new(node_count: usize) -> Self {
        Annotations {
            symbols: vec![None; node_count],
            types: vec![None; node_count],
            jump_tables: FxHashMap::default(),
        }
    }

    pub fn set_symbol(&mut self, node: NodeId, symbol: SymbolId) {
        self.symbols[node.index()] = Some(symbol);
    }

    pub fn symbol(&self, node: NodeId) -> Option<SymbolId> {
        self.symbols.get(node.index()).copied().flatten()
    }

    pub fn set_type(&mut self, node: NodeId, ty: TypeId) {
        self.types[node.index()] = Some(ty);
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(node.index()).copied().flatten()
    }

    pub fn set_jump_table(&mut self, node: NodeId, table: JumpTable) {
        self.jump_tables.insert(node, table);
    }

    pub fn jump_table(&self, node: NodeId) -> Option<&JumpTable> {
        self.jump_tables.get(&node)
    }
}
