use super::ast::{NodeId, NodeKind, Tree};

/// Indented dump of the tree, one node per line.
pub fn print_tree(tree: &Tree) -> String {
    let mut result = String::new();
    if let Some(root) = tree.root() {
        print_node(tree, root, 0, &mut result);
    }
    result
}

fn print_node(tree: &Tree, id: NodeId, indent: usize, result: &mut String) {
    let node = tree.get(id);
    result.push_str(&"  ".repeat(indent));

    match node.kind {
        NodeKind::Binary(op) => result.push_str(&format!("Binary({})", op)),
        kind => result.push_str(&format!("{:?}", kind)),
    }
    if let Some(name) = &node.name {
        result.push_str(&format!(" {}", name));
    }
    if let Some(value) = &node.value {
        result.push_str(&format!(" {}", value));
    }
    result.push_str(&format!(" [line {}]\n", node.line));

    for child in &node.children {
        print_node(tree, *child, indent + 1, result);
    }
}
