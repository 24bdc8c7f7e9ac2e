//! Unit tests for the backend gate and write formats.

use std::io::Cursor;

use crate::{
    analyzer::analyzer::{analyze, Analysis},
    ast::ast::{NodeId, Tree},
    lexer::lexer::tokenize,
    parser::parser::parse,
    symtab::value::Value,
};

use super::{
    backend::{run, BackendMode},
    format::{build_format, render},
};

fn analyze_source(source: &str) -> Analysis {
    analyze(parse(tokenize(source.to_string()).unwrap()).unwrap())
}

fn statements(tree: &Tree) -> Vec<NodeId> {
    let block = tree.body_block(tree.root().unwrap()).unwrap();
    tree.children(tree.block_statements(block).unwrap()).to_vec()
}

#[test]
fn test_backend_refuses_dirty_tree() {
    let mut analysis = analyze_source("program d;\nbegin x := 1 end.");
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();

    for mode in [BackendMode::Interpret, BackendMode::Convert, BackendMode::Compile] {
        let error = run(mode, &mut analysis, &mut input, &mut output).unwrap_err();
        assert_eq!(error.get_error_name(), "InternalFault");
    }
    assert!(output.is_empty());
}

#[test]
fn test_build_format() {
    let analysis = analyze_source(
        "program f;\nvar i: integer; x: real; b: boolean; c: char; s: string;\nbegin\nwriteln('i = ', i:4, ' x = ', x:8:2, b, c, s:-6, '100%');\nwrite(x, 'a':3)\nend.",
    );
    assert!(!analysis.has_errors(), "{:?}", analysis.errors);

    let stmts = statements(&analysis.tree);
    let first = build_format(&analysis, stmts[0]).unwrap();
    assert_eq!(first.format, "i = %4d x = %8.2f%b%c%-6s100%%\n");
    assert_eq!(first.args.len(), 5);

    let second = build_format(&analysis, stmts[1]).unwrap();
    assert_eq!(second.format, "%f%3c");
    assert_eq!(second.args.len(), 2);
}

#[test]
fn test_enumeration_prints_as_integer() {
    let analysis = analyze_source(
        "program e;\ntype color = (red, green);\nvar c: color;\nbegin c := green; writeln(c) end.",
    );

    let format = build_format(&analysis, statements(&analysis.tree)[1]).unwrap();
    assert_eq!(format.format, "%d\n");
}

#[test]
fn test_render() {
    let rendered = render(
        "%4d|%-4d|%8.2f|%b|%c|%-5s|%%\n",
        &[
            Value::Integer(14),
            Value::Integer(-3),
            Value::Real(3.14159),
            Value::Boolean(true),
            Value::Char('z'),
            Value::Str("ab".to_string()),
        ],
    )
    .unwrap();

    assert_eq!(rendered, "  14|-3  |    3.14|true|z|ab   |%\n");
}

#[test]
fn test_render_widens_integer_for_real_flag() {
    assert_eq!(render("%.1f", &[Value::Integer(2)]).unwrap(), "2.0");
}

#[test]
fn test_render_missing_value() {
    let error = render("%d %d", &[Value::Integer(1)]).unwrap_err();
    assert_eq!(error.get_error_name(), "InternalFault");
}
