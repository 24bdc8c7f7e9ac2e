use super::ast::{BinaryOp, Literal, Node, NodeId, NodeKind, Tree, UnaryOp};

/// Incremental tree construction, shared by the parser and by callers that
/// assemble trees directly.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: Tree,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    pub fn node(&mut self, kind: NodeKind, line: u32, children: Vec<NodeId>) -> NodeId {
        self.tree.add(Node {
            kind,
            children,
            line,
            name: None,
            value: None,
        })
    }

    pub fn named(
        &mut self,
        kind: NodeKind,
        name: &str,
        line: u32,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.tree.add(Node {
            kind,
            children,
            line,
            name: Some(name.to_string()),
            value: None,
        })
    }

    pub fn literal(&mut self, value: Literal, line: u32) -> NodeId {
        self.tree.add(Node {
            kind: NodeKind::Literal,
            children: vec![],
            line,
            name: None,
            value: Some(value),
        })
    }

    pub fn integer(&mut self, value: i32, line: u32) -> NodeId {
        self.literal(Literal::Integer(value), line)
    }

    pub fn real(&mut self, value: f64, line: u32) -> NodeId {
        self.literal(Literal::Real(value), line)
    }

    pub fn string(&mut self, value: &str, line: u32) -> NodeId {
        self.literal(Literal::Str(value.to_string()), line)
    }

    pub fn character(&mut self, value: char, line: u32) -> NodeId {
        self.literal(Literal::Char(value), line)
    }

    pub fn decl_name(&mut self, name: &str, line: u32) -> NodeId {
        self.named(NodeKind::DeclName, name, line, vec![])
    }

    pub fn type_name(&mut self, name: &str, line: u32) -> NodeId {
        self.named(NodeKind::TypeName, name, line, vec![])
    }

    pub fn variable(&mut self, name: &str, line: u32) -> NodeId {
        self.named(NodeKind::Variable, name, line, vec![])
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, line: u32) -> NodeId {
        self.node(NodeKind::Binary(op), line, vec![left, right])
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId, line: u32) -> NodeId {
        self.node(NodeKind::Unary(op), line, vec![operand])
    }

    pub fn var_decl(&mut self, names: &[&str], type_spec: NodeId, line: u32) -> NodeId {
        let mut children: Vec<NodeId> = names.iter().map(|name| self.decl_name(name, line)).collect();
        children.push(type_spec);
        self.node(NodeKind::VarDecl, line, children)
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId, line: u32) -> NodeId {
        self.node(NodeKind::Assign, line, vec![target, value])
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.tree.push_child(parent, child);
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn finish(mut self, root: NodeId) -> Tree {
        self.tree.set_root(root);
        self.tree
    }

    /// Wraps declarations and statements into `Program[DeclName, Block]`.
    pub fn program(
        mut self,
        name: &str,
        declarations: Vec<NodeId>,
        statements: Vec<NodeId>,
    ) -> Tree {
        let compound = self.node(NodeKind::Compound, 1, statements);
        let mut block_children = declarations;
        block_children.push(compound);
        let block = self.node(NodeKind::Block, 1, block_children);
        let program_name = self.decl_name(name, 1);
        let root = self.node(NodeKind::Program, 1, vec![program_name, block]);
        self.finish(root)
    }
}
