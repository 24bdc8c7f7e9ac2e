//! Unit tests for the type table.

use crate::symtab::symtab::{ScopeId, SymbolId};

use super::types::{TypeForm, TypeId, TypeSpec, TypeTable};

fn subrange(table: &mut TypeTable, base: TypeId, min: i64, max: i64) -> TypeId {
    table.add(TypeSpec {
        name: None,
        form: TypeForm::Subrange { base, min, max },
    })
}

#[test]
fn test_canonical_types() {
    let table = TypeTable::new();

    assert_eq!(table.type_name(TypeId::INTEGER), "integer");
    assert_eq!(table.type_name(TypeId::REAL), "real");
    assert_eq!(table.type_name(TypeId::BOOLEAN), "boolean");
    assert_eq!(table.type_name(TypeId::CHAR), "char");
    assert_eq!(table.type_name(TypeId::STRING), "string");
    assert_eq!(table.form(TypeId::ERROR), &TypeForm::Error);
}

#[test]
fn test_identity_is_assignable() {
    let table = TypeTable::new();

    assert!(table.is_assignable(TypeId::STRING, TypeId::STRING));
    assert!(table.is_assignable(TypeId::CHAR, TypeId::CHAR));
}

#[test]
fn test_widening_is_one_directional() {
    let table = TypeTable::new();

    assert!(table.is_assignable(TypeId::INTEGER, TypeId::REAL));
    assert!(!table.is_assignable(TypeId::REAL, TypeId::INTEGER));
}

#[test]
fn test_unrelated_scalars_are_not_assignable() {
    let table = TypeTable::new();

    assert!(!table.is_assignable(TypeId::CHAR, TypeId::STRING));
    assert!(!table.is_assignable(TypeId::BOOLEAN, TypeId::INTEGER));
}

#[test]
fn test_subrange_and_base() {
    let mut table = TypeTable::new();
    let digits = subrange(&mut table, TypeId::INTEGER, 0, 9);

    assert!(table.is_assignable(digits, TypeId::INTEGER));
    assert!(table.is_assignable(TypeId::INTEGER, digits));
    assert!(table.is_assignable(digits, TypeId::REAL));
    assert!(!table.is_assignable(TypeId::REAL, digits));
    assert_eq!(table.base_type(digits), TypeId::INTEGER);
}

#[test]
fn test_error_type_is_compatible() {
    let table = TypeTable::new();

    assert!(table.is_assignable(TypeId::ERROR, TypeId::INTEGER));
    assert!(table.is_assignable(TypeId::STRING, TypeId::ERROR));
}

#[test]
fn test_base_type_follows_array_elements() {
    let mut table = TypeTable::new();
    let index = subrange(&mut table, TypeId::INTEGER, 1, 3);
    let inner = table.add(TypeSpec {
        name: None,
        form: TypeForm::Array {
            index,
            element: TypeId::REAL,
            min: 1,
            max: 3,
        },
    });
    let outer = table.add(TypeSpec {
        name: None,
        form: TypeForm::Array {
            index,
            element: inner,
            min: 1,
            max: 3,
        },
    });

    assert_eq!(table.base_type(outer), TypeId::REAL);
    assert_eq!(table.element_count(outer), 3);
    assert_eq!(table.type_name(inner), "array[1..3] of real");
    assert!(!table.is_assignable(inner, outer));
}

#[test]
fn test_ordinal_classification() {
    let mut table = TypeTable::new();
    let color = table.add(TypeSpec {
        name: Some("color".to_string()),
        form: TypeForm::Enumeration {
            constants: vec![SymbolId::from_raw(10), SymbolId::from_raw(11)],
        },
    });

    assert!(table.is_ordinal(TypeId::INTEGER));
    assert!(table.is_ordinal(TypeId::CHAR));
    assert!(table.is_ordinal(color));
    assert!(!table.is_ordinal(TypeId::REAL));
    assert!(!table.is_ordinal(TypeId::STRING));
    assert_eq!(table.ordinal_bounds(color), Some((0, 1)));
    assert!(table.is_enumeration(color));
}

#[test]
fn test_records_are_composite() {
    let mut table = TypeTable::new();
    let point = table.add(TypeSpec {
        name: None,
        form: TypeForm::Record {
            fields: vec![],
            scope: ScopeId::from_raw(3),
        },
    });
    table.set_name(point, "point");
    table.set_name(point, "other");

    assert!(table.is_composite(point));
    assert!(!table.is_composite(TypeId::STRING));
    assert_eq!(table.type_name(point), "point");
}
