//! Unit tests for the annotation pass.

use crate::{
    ast::{
        annotations::KeyKind,
        ast::{NodeId, NodeKind, Tree},
        builder::TreeBuilder,
    },
    lexer::lexer::tokenize,
    parser::parser::parse,
    symtab::symtab::SymbolKind,
    types::types::TypeId,
};

use super::analyzer::{analyze, Analysis};

fn analyze_source(source: &str) -> Analysis {
    let tokens = tokenize(source.to_string()).unwrap();
    analyze(parse(tokens).unwrap())
}

fn error_names(analysis: &Analysis) -> Vec<&str> {
    analysis.errors.iter().map(|e| e.get_error_name()).collect()
}

fn statements(tree: &Tree) -> Vec<NodeId> {
    let block = tree.body_block(tree.root().unwrap()).unwrap();
    let compound = tree.block_statements(block).unwrap();
    tree.children(compound).to_vec()
}

#[test]
fn test_clean_program_has_no_errors() {
    let analysis = analyze_source(
        "program ok;\nvar a: integer; x: real;\nbegin\na := 2 + 3 * 4;\nx := a / 2\nend.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);
    assert!(analysis.program.is_some());

    let stmts = statements(&analysis.tree);
    let value = analysis.tree.child(stmts[0], 1).unwrap();
    assert_eq!(analysis.annotations.type_of(value), Some(TypeId::INTEGER));
    let quotient = analysis.tree.child(stmts[1], 1).unwrap();
    assert_eq!(analysis.annotations.type_of(quotient), Some(TypeId::REAL));
}

#[test]
fn test_identifiers_are_annotated() {
    let analysis = analyze_source("program ok;\nvar a: integer;\nbegin a := 1 end.");
    let target = analysis.tree.child(statements(&analysis.tree)[0], 0).unwrap();
    let symbol = analysis.annotations.symbol(target).unwrap();

    assert_eq!(analysis.symtab.entry(symbol).name, "a");
    assert_eq!(analysis.symtab.entry(symbol).kind, SymbolKind::Variable);
}

#[test]
fn test_undeclared_identifier_does_not_cascade() {
    let analysis = analyze_source("program u;\nvar a: integer;\nbegin\na := b + 1 * 2\nend.");

    assert_eq!(error_names(&analysis), vec!["UndeclaredIdentifier"]);
    assert_eq!(analysis.errors[0].get_line(), 4);

    let value = analysis.tree.child(statements(&analysis.tree)[0], 1).unwrap();
    assert_eq!(analysis.annotations.type_of(value), Some(TypeId::ERROR));
}

#[test]
fn test_duplicate_declaration_in_same_scope() {
    let analysis = analyze_source("program d;\nvar a: integer;\n a: real;\nbegin end.");

    assert_eq!(error_names(&analysis), vec!["DuplicateDeclaration"]);
    assert_eq!(analysis.errors[0].get_line(), 3);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let analysis = analyze_source(
        "program s;\nvar x: integer;\nprocedure p;\nvar x: real;\nbegin x := 1.5 end;\nbegin x := 2; p end.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let outer = analysis.tree.child(statements(&analysis.tree)[0], 0).unwrap();
    let outer = analysis.annotations.symbol(outer).unwrap();
    assert_eq!(analysis.symtab.entry(outer).ty, TypeId::INTEGER);
    assert_eq!(analysis.symtab.entry(outer).level, 1);
}

#[test]
fn test_widening_is_one_directional() {
    let widening = analyze_source("program w;\nvar x: real;\nbegin x := 3 end.");
    assert!(!widening.has_errors());

    let narrowing = analyze_source("program n;\nvar i: integer;\nbegin i := 3.5 end.");
    assert_eq!(error_names(&narrowing), vec!["TypeMismatch"]);
}

#[test]
fn test_conditions_must_be_boolean() {
    let analysis = analyze_source(
        "program c;\nvar i: integer;\nbegin\nif i then i := 1;\nwhile i < 3 do i := i + 1\nend.",
    );

    assert_eq!(error_names(&analysis), vec!["TypeMismatch"]);
    assert_eq!(analysis.errors[0].get_line(), 4);
}

#[test]
fn test_for_control_must_be_ordinal() {
    let analysis = analyze_source("program f;\nvar x: real;\nbegin for x := 1 to 3 do end.");

    assert_eq!(error_names(&analysis), vec!["TypeMismatch"]);
}

#[test]
fn test_case_jump_table() {
    let analysis = analyze_source(
        "program c;\nvar a, b: integer;\nbegin\ncase a of\n3: b := 1;\n1, 2: b := 2\nelse b := 0\nend\nend.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let case = statements(&analysis.tree)[0];
    let table = analysis.annotations.jump_table(case).unwrap();
    assert_eq!(table.key_kind, KeyKind::Integer);
    assert_eq!(table.entries.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(table.entries[&1], table.entries[&2]);
    assert_ne!(table.entries[&1], table.entries[&3]);
    assert!(table.default.is_some());
}

#[test]
fn test_case_duplicate_and_invalid_labels() {
    let analysis = analyze_source(
        "program c;\nvar a, b: integer;\nbegin\ncase a of\n1: b := 1;\n1: b := 2;\n'x': b := 3;\nb: b := 4\nend\nend.",
    );

    assert_eq!(
        error_names(&analysis),
        vec!["DuplicateCaseKey", "InvalidCaseLabel", "InvalidCaseLabel"]
    );
    assert_eq!(analysis.errors[0].get_line(), 6);
}

#[test]
fn test_string_case_uses_hashed_keys() {
    let analysis = analyze_source(
        "program s;\nvar s: string; n: integer;\nbegin\ncase s of\n'apple': n := 1;\n'pear', 'x': n := 2\nend\nend.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let table = analysis
        .annotations
        .jump_table(statements(&analysis.tree)[0])
        .unwrap();
    assert_eq!(table.key_kind, KeyKind::StringHash);
    assert_eq!(table.entries.len(), 3);
    assert!(table.collisions.is_empty());
    assert!(table.default.is_none());
}

#[test]
fn test_enumeration_case() {
    let analysis = analyze_source(
        "program e;\ntype color = (red, green, blue);\nvar c: color; n: integer;\nbegin\nc := blue;\ncase c of\nred: n := 0;\nblue: n := 2\nend\nend.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let table = analysis
        .annotations
        .jump_table(statements(&analysis.tree)[1])
        .unwrap();
    assert_eq!(table.key_kind, KeyKind::Enumeration);
    assert_eq!(table.entries.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn test_call_checks() {
    let analysis = analyze_source(
        "program c;\nvar r: real;\nfunction sq(n: integer): integer;\nbegin sq := n * n end;\nprocedure show(x: real);\nbegin writeln(x) end;\nbegin\nshow(sq(2));\nshow(1, 2);\nr := sq(1.5);\nsq(3)\nend.",
    );

    assert_eq!(
        error_names(&analysis),
        vec!["ArgumentCountMismatch", "TypeMismatch", "TypeMismatch"]
    );
    assert_eq!(analysis.errors[0].get_line(), 9);
    assert_eq!(analysis.errors[1].get_line(), 10);
    assert_eq!(analysis.errors[2].get_line(), 11);
}

#[test]
fn test_routine_slots() {
    let analysis = analyze_source(
        "program s;\nfunction f(a, b: integer): integer;\nvar t: integer;\nbegin t := a + b; f := t end;\nbegin writeln(f(1, 2)) end.",
    );

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let program = analysis.symtab.entry(analysis.program.unwrap());
    let scope = program.routine.as_ref().unwrap().scope.unwrap();
    let f = analysis.symtab.lookup_in(scope, "f").unwrap();
    let info = analysis.symtab.entry(f).routine.clone().unwrap();

    assert_eq!(info.params.len(), 2);
    assert_eq!(analysis.symtab.entry(info.params[0]).slot, 0);
    assert_eq!(analysis.symtab.entry(info.params[1]).slot, 1);
    assert_eq!(analysis.symtab.entry(info.locals[0]).slot, 2);
    assert_eq!(analysis.symtab.entry(f).slot, 3);
    assert_eq!(info.return_type, Some(TypeId::INTEGER));
}

#[test]
fn test_assignment_targets() {
    let analysis = analyze_source(
        "program t;\nconst k = 3;\nprocedure p;\nbegin end;\nbegin\nk := 4;\np := 1\nend.",
    );

    assert_eq!(error_names(&analysis), vec!["NotAVariable", "NotAVariable"]);
}

#[test]
fn test_nested_routine_is_reported() {
    let analysis = analyze_source(
        "program n;\nprocedure outer;\nprocedure inner;\nbegin end;\nbegin end;\nbegin outer end.",
    );

    assert_eq!(error_names(&analysis), vec!["NestedRoutine"]);
}

#[test]
fn test_write_precision_requires_real() {
    let analysis = analyze_source(
        "program w;\nvar i: integer; x: real;\nbegin\nwriteln(x:8:2, i:4);\nwriteln(i:4:1)\nend.",
    );

    assert_eq!(error_names(&analysis), vec!["TypeMismatch"]);
    assert_eq!(analysis.errors[0].get_line(), 5);
}

#[test]
fn test_char_literal_becomes_string() {
    let analysis = analyze_source("program c;\nvar s: string; ch: char;\nbegin s := 'a'; ch := 'b' end.");

    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let stmts = statements(&analysis.tree);
    let to_string = analysis.tree.child(stmts[0], 1).unwrap();
    let to_char = analysis.tree.child(stmts[1], 1).unwrap();
    assert_eq!(analysis.annotations.type_of(to_string), Some(TypeId::STRING));
    assert_eq!(analysis.annotations.type_of(to_char), Some(TypeId::CHAR));
}

#[test]
fn test_records_arrays_and_subranges() {
    let analysis = analyze_source(
        "program r;\ntype point = record x, y: real end;\nidx = 1..3;\nvar pts: array[idx] of point; i: idx;\nbegin\ni := 2;\npts[i].y := 1.5;\npts[1].z := 0\nend.",
    );

    assert_eq!(error_names(&analysis), vec!["UndeclaredIdentifier"]);
    assert_eq!(analysis.errors[0].get_line(), 8);

    let target = analysis.tree.child(statements(&analysis.tree)[1], 0).unwrap();
    assert_eq!(analysis.tree.kind(target), NodeKind::Variable);
    assert_eq!(analysis.annotations.type_of(target), Some(TypeId::REAL));
}

#[test]
fn test_every_error_is_reported_in_one_run() {
    let analysis = analyze_source(
        "program m;\nvar a: integer;\nbegin\na := 'x';\nb := 1;\nif a then a := 2;\nc(1)\nend.",
    );

    assert_eq!(analysis.error_count(), 4);
}

#[test]
fn test_malformed_while_is_an_internal_fault() {
    let mut b = TreeBuilder::new();
    let bare = b.node(NodeKind::While, 3, vec![]);
    let analysis = analyze(b.program("broken", vec![], vec![bare]));

    assert_eq!(error_names(&analysis), vec!["InternalFault"]);
    assert_eq!(analysis.errors[0].get_line(), 3);
}
