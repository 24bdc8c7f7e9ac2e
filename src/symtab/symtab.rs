use std::fmt::{Display, Write};

use rustc_hash::FxHashMap;

use crate::{
    ast::ast::NodeId,
    define_id,
    errors::errors::{Error, ErrorImpl},
    types::types::{TypeId, TypeTable},
};

use super::value::Value;

define_id!(SymbolId, "sym");
define_id!(ScopeId, "scope");

/// Nesting level of the predefined scope.
pub const PREDEFINED_LEVEL: u32 = 0;
/// Nesting level of the program scope.
pub const PROGRAM_LEVEL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Program,
    Variable,
    Constant,
    TypeName,
    Procedure,
    Function,
    ValueParameter,
    RecordField,
}

impl SymbolKind {
    pub fn is_routine(self) -> bool {
        matches!(self, SymbolKind::Procedure | SymbolKind::Function)
    }

    /// Kinds whose entries own a storage slot.
    pub fn is_storage(self) -> bool {
        matches!(self, SymbolKind::Variable | SymbolKind::ValueParameter)
    }
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SymbolKind::Program => "program",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::TypeName => "type",
            SymbolKind::Procedure => "procedure",
            SymbolKind::Function => "function",
            SymbolKind::ValueParameter => "value parameter",
            SymbolKind::RecordField => "record field",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoutineInfo {
    pub params: Vec<SymbolId>,
    pub locals: Vec<SymbolId>,
    pub return_type: Option<TypeId>,
    pub scope: Option<ScopeId>,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
    pub level: u32,
    pub scope: ScopeId,
    pub line: u32,
    /// Local slot number. For a function entry this is its result slot.
    pub slot: u32,
    pub constant: Option<Value>,
    pub routine: Option<RoutineInfo>,
    /// Interpreter storage.
    pub value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub level: u32,
    symbols: FxHashMap<String, SymbolId>,
    order: Vec<SymbolId>,
}

/// Arena of scopes and entries with a stack of the scopes currently open.
/// Popped scopes stay in the arena, so annotations pointing into them remain valid.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// Creates the table with the predefined scope open.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            entries: vec![],
            scopes: vec![],
            stack: vec![],
        };
        table.push_scope(PREDEFINED_LEVEL);

        let builtins = [
            ("integer", TypeId::INTEGER),
            ("real", TypeId::REAL),
            ("boolean", TypeId::BOOLEAN),
            ("char", TypeId::CHAR),
            ("string", TypeId::STRING),
        ];
        for (name, ty) in builtins {
            table.insert(name, SymbolKind::TypeName, ty, 0);
        }
        for (name, value) in [("false", false), ("true", true)] {
            let id = table.insert(name, SymbolKind::Constant, TypeId::BOOLEAN, 0);
            table.entries[id.index()].constant = Some(Value::Boolean(value));
        }

        table
    }

    fn push_scope(&mut self, level: u32) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            parent: self.stack.last().copied(),
            level,
            symbols: FxHashMap::default(),
            order: vec![],
        });
        self.stack.push(id);
        id
    }

    fn insert(&mut self, name: &str, kind: SymbolKind, ty: TypeId, line: u32) -> SymbolId {
        let scope = self.current_scope();
        let id = SymbolId::from_raw(self.entries.len() as u32);
        self.entries.push(SymbolEntry {
            name: name.to_string(),
            kind,
            ty,
            level: self.scopes[scope.index()].level,
            scope,
            line,
            slot: 0,
            constant: None,
            routine: None,
            value: None,
        });
        let current = &mut self.scopes[scope.index()];
        current.symbols.insert(name.to_lowercase(), id);
        current.order.push(id);
        id
    }

    pub fn enter_scope(&mut self) -> ScopeId {
        let level = self.current_level() + 1;
        let id = self.push_scope(level);
        tracing::trace!(scope = ?id, level, "enter scope");
        id
    }

    pub fn exit_scope(&mut self) {
        // The predefined scope is never popped.
        if self.stack.len() > 1 {
            let popped = self.stack.pop();
            tracing::trace!(scope = ?popped, "exit scope");
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.stack[self.stack.len() - 1]
    }

    pub fn current_level(&self) -> u32 {
        self.scopes[self.current_scope().index()].level
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Declares `name` in the current scope.
    pub fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        ty: TypeId,
        line: u32,
    ) -> Result<SymbolId, Error> {
        if self.lookup_local(name).is_some() {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    name: name.to_string(),
                },
                line,
            ));
        }

        let id = self.insert(name, kind, ty, line);
        tracing::trace!(name, %kind, symbol = ?id, "declared");
        Ok(id)
    }

    /// Innermost declaration of `name` visible from the current scope.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        let key = name.to_lowercase();
        let mut scope = Some(self.current_scope());

        while let Some(id) = scope {
            let current = &self.scopes[id.index()];
            if let Some(symbol) = current.symbols.get(&key) {
                return Some(*symbol);
            }
            scope = current.parent;
        }

        None
    }

    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.lookup_in(self.current_scope(), name)
    }

    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.index()]
            .symbols
            .get(&name.to_lowercase())
            .copied()
    }

    pub fn entry(&self, id: SymbolId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    pub fn entry_mut(&mut self, id: SymbolId) -> &mut SymbolEntry {
        &mut self.entries[id.index()]
    }

    /// Entries of `scope` in declaration order.
    pub fn entries_of(&self, scope: ScopeId) -> &[SymbolId] {
        &self.scopes[scope.index()].order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cross-reference listing of every scope above the predefined one.
    pub fn listing(&self, types: &TypeTable) -> String {
        let mut result = String::new();

        for scope in self.scopes.iter().skip(1) {
            let _ = writeln!(result, "SCOPE {:?} (level {})", scope.id, scope.level);
            for id in &scope.order {
                let entry = &self.entries[id.index()];
                let _ = write!(
                    result,
                    "  {:<16} {:<16} {:<24} line {}",
                    entry.name,
                    entry.kind.to_string(),
                    types.type_name(entry.ty),
                    entry.line
                );
                if let Some(constant) = &entry.constant {
                    let _ = write!(result, " = {}", constant);
                }
                result.push('\n');
            }
        }

        result
    }
}
