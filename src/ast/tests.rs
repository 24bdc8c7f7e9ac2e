//! Unit tests for the tree arena, builder and side tables.

use crate::{
    symtab::symtab::SymbolId,
    types::types::TypeId,
};

use super::{
    annotations::{string_key, Annotations, JumpTable, KeyKind},
    ast::{BinaryOp, NodeKind},
    builder::TreeBuilder,
    printer::print_tree,
};

#[test]
fn test_builder_program_layout() {
    let mut builder = TreeBuilder::new();
    let integer = builder.type_name("integer", 2);
    let decl = builder.var_decl(&["a"], integer, 2);
    let target = builder.variable("a", 3);
    let two = builder.integer(2, 3);
    let assign = builder.assign(target, two, 3);
    let tree = builder.program("demo", vec![decl], vec![assign]);

    let root = tree.root().unwrap();
    assert_eq!(tree.kind(root), NodeKind::Program);
    let block = tree.body_block(root).unwrap();
    assert_eq!(tree.block_declarations(block), &[decl]);
    let compound = tree.block_statements(block).unwrap();
    assert_eq!(tree.children(compound), &[assign]);
    assert_eq!(tree.decl_names(decl).len(), 1);
    assert_eq!(tree.decl_type(decl), Some(integer));
}

#[test]
fn test_each_node_gets_a_distinct_id() {
    let mut builder = TreeBuilder::new();
    let one = builder.integer(1, 1);
    let two = builder.integer(2, 1);
    let sum = builder.binary(BinaryOp::Add, one, two, 1);

    assert_ne!(one, two);
    assert_eq!(builder.tree().children(sum), &[one, two]);
    assert_eq!(builder.tree().len(), 3);
}

#[test]
fn test_annotations_default_to_empty() {
    let mut annotations = Annotations::new(4);
    let mut builder = TreeBuilder::new();
    let node = builder.integer(7, 1);

    assert_eq!(annotations.type_of(node), None);
    assert_eq!(annotations.symbol(node), None);

    annotations.set_type(node, TypeId::INTEGER);
    annotations.set_symbol(node, SymbolId::from_raw(9));
    assert_eq!(annotations.type_of(node), Some(TypeId::INTEGER));
    assert_eq!(annotations.symbol(node), Some(SymbolId::from_raw(9)));
}

#[test]
fn test_jump_table_default_and_order() {
    let mut builder = TreeBuilder::new();
    let first = builder.node(NodeKind::Empty, 1, vec![]);
    let second = builder.node(NodeKind::Empty, 2, vec![]);
    let fallback = builder.node(NodeKind::Empty, 3, vec![]);

    let mut table = JumpTable::new(KeyKind::Integer);
    table.entries.insert(5, second);
    table.entries.insert(-1, first);
    table.entries.insert(7, first);
    table.default = Some(fallback);

    assert_eq!(table.target(5), Some(second));
    assert_eq!(table.target(100), Some(fallback));
    assert_eq!(table.entries.keys().copied().collect::<Vec<_>>(), vec![-1, 5, 7]);
    assert_eq!(table.branches(), vec![first, second]);
}

#[test]
fn test_string_key_is_stable() {
    assert_eq!(string_key("apple"), string_key("apple"));
    assert_ne!(string_key("apple"), string_key("pear"));
}

#[test]
fn test_print_tree() {
    let mut builder = TreeBuilder::new();
    let target = builder.variable("a", 2);
    let value = builder.integer(14, 2);
    let assign = builder.assign(target, value, 2);
    let tree = builder.program("p", vec![], vec![assign]);

    let printed = print_tree(&tree);

    assert!(printed.starts_with("Program"));
    assert!(printed.contains("    Compound"));
    assert!(printed.contains("Variable a [line 2]"));
    assert!(printed.contains("Literal 14"));
}
