//! Unit tests for scopes and symbol resolution.

use crate::types::types::{TypeId, TypeTable};

use super::{
    symtab::{SymbolKind, SymbolTable, PREDEFINED_LEVEL, PROGRAM_LEVEL},
    value::Value,
};

#[test]
fn test_predefined_scope() {
    let table = SymbolTable::new();

    assert_eq!(table.current_level(), PREDEFINED_LEVEL);

    let integer = table.resolve("integer").unwrap();
    assert_eq!(table.entry(integer).kind, SymbolKind::TypeName);
    assert_eq!(table.entry(integer).ty, TypeId::INTEGER);

    let truth = table.resolve("true").unwrap();
    assert_eq!(table.entry(truth).kind, SymbolKind::Constant);
    assert_eq!(table.entry(truth).constant, Some(Value::Boolean(true)));
}

#[test]
fn test_program_scope_level() {
    let mut table = SymbolTable::new();
    table.enter_scope();

    assert_eq!(table.current_level(), PROGRAM_LEVEL);
}

#[test]
fn test_declare_and_resolve() {
    let mut table = SymbolTable::new();
    table.enter_scope();

    let id = table
        .declare("count", SymbolKind::Variable, TypeId::INTEGER, 3)
        .unwrap();

    assert_eq!(table.resolve("count"), Some(id));
    assert_eq!(table.entry(id).level, PROGRAM_LEVEL);
    assert_eq!(table.entry(id).line, 3);
}

#[test]
fn test_resolution_is_case_insensitive() {
    let mut table = SymbolTable::new();
    table.enter_scope();

    let id = table
        .declare("Total", SymbolKind::Variable, TypeId::REAL, 1)
        .unwrap();

    assert_eq!(table.resolve("TOTAL"), Some(id));
    assert_eq!(table.entry(id).name, "Total");
}

#[test]
fn test_duplicate_in_same_scope() {
    let mut table = SymbolTable::new();
    table.enter_scope();

    table
        .declare("x", SymbolKind::Variable, TypeId::INTEGER, 1)
        .unwrap();
    let result = table.declare("X", SymbolKind::Variable, TypeId::REAL, 2);

    assert!(result.is_err());
    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "DuplicateDeclaration");
    assert_eq!(error.get_line(), 2);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut table = SymbolTable::new();
    table.enter_scope();
    let outer = table
        .declare("x", SymbolKind::Variable, TypeId::INTEGER, 1)
        .unwrap();

    table.enter_scope();
    let inner = table
        .declare("x", SymbolKind::Variable, TypeId::REAL, 2)
        .unwrap();
    assert_eq!(table.resolve("x"), Some(inner));

    table.exit_scope();
    assert_eq!(table.resolve("x"), Some(outer));
}

#[test]
fn test_redeclaring_builtin_in_program_scope() {
    let mut table = SymbolTable::new();
    table.enter_scope();

    let id = table
        .declare("integer", SymbolKind::Variable, TypeId::REAL, 1)
        .unwrap();

    assert_eq!(table.resolve("integer"), Some(id));
}

#[test]
fn test_unresolved_name() {
    let table = SymbolTable::new();

    assert_eq!(table.resolve("missing"), None);
}

#[test]
fn test_popped_scope_entries_remain_addressable() {
    let mut table = SymbolTable::new();
    table.enter_scope();
    let routine_scope = table.enter_scope();
    let local = table
        .declare("i", SymbolKind::Variable, TypeId::INTEGER, 4)
        .unwrap();
    table.exit_scope();

    assert_eq!(table.resolve("i"), None);
    assert_eq!(table.entry(local).name, "i");
    assert_eq!(table.entries_of(routine_scope), &[local]);
    assert_eq!(table.lookup_in(routine_scope, "I"), Some(local));
}

#[test]
fn test_predefined_scope_is_never_popped() {
    let mut table = SymbolTable::new();
    table.exit_scope();
    table.exit_scope();

    assert!(table.resolve("boolean").is_some());
}

#[test]
fn test_listing() {
    let types = TypeTable::new();
    let mut table = SymbolTable::new();
    table.enter_scope();
    let id = table
        .declare("limit", SymbolKind::Constant, TypeId::INTEGER, 2)
        .unwrap();
    table.entry_mut(id).constant = Some(Value::Integer(10));

    let listing = table.listing(&types);

    assert!(listing.contains("level 1"));
    assert!(listing.contains("limit"));
    assert!(listing.contains("constant"));
    assert!(listing.contains("= 10"));
}
