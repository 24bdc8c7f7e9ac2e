use std::fmt::Display;

use crate::define_id;

define_id!(NodeId, "n");

/// Binary operators, in source spelling order of precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Add,
    Subtract,
    Or,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
    And,
}

impl BinaryOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::Less
                | BinaryOp::LessEquals
                | BinaryOp::Greater
                | BinaryOp::GreaterEquals
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BinaryOp::Equals => "=",
            BinaryOp::NotEquals => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessEquals => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEquals => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Or => "or",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::IntDivide => "div",
            BinaryOp::Modulo => "mod",
            BinaryOp::And => "and",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
}

/// Literal payload carried by leaf nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i32),
    Real(f64),
    Char(char),
    Str(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{}", value),
            Literal::Real(value) => write!(f, "{}", value),
            Literal::Char(value) => write!(f, "'{}'", value),
            Literal::Str(value) => write!(f, "'{}'", value),
        }
    }
}

/// Closed set of node kinds. Child layout per kind:
///
/// - `Program`: `[DeclName, Block]`
/// - `Block`: `[declaration..., Compound]`
/// - `ConstDecl`: `[DeclName, constant]`
/// - `TypeDecl`: `[DeclName, type spec]`
/// - `VarDecl` / `FieldDecl` / `ParamDecl`: `[DeclName..., type spec]`
/// - `Routine`: `[DeclName, ParamDecl..., return type spec (functions), Block]`
/// - `EnumType`: `[DeclName...]`, `SubrangeType`: `[low, high]`,
///   `ArrayType`: `[index type, element type]`, `RecordType`: `[FieldDecl...]`
/// - `Assign`: `[Variable, expr]`, `If`: `[cond, then, else?]`,
///   `While`: `[cond, body]`, `Repeat`: `[stmt..., cond]`,
///   `For`: `[Variable, initial, bound, body]`,
///   `Case`: `[selector, CaseBranch..., CaseElse?]`,
///   `CaseBranch`: `[label..., stmt]`, `CaseElse`: `[stmt]`
/// - `Write`: `[WriteArg...]`, `WriteArg`: `[expr, width?, precision?]`,
///   `Read`: `[Variable...]`
/// - `Variable`: `[Index | Field ...]`, `Index`: `[expr]`
/// - `ProcCall` / `FunctionCall`: `[arg...]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Block,
    DeclName,
    ConstDecl,
    TypeDecl,
    VarDecl,
    FieldDecl,
    ParamDecl,
    Routine { is_function: bool },

    TypeName,
    EnumType,
    SubrangeType,
    ArrayType,
    RecordType,

    Compound,
    Assign,
    If,
    While,
    Repeat,
    For { downto: bool },
    Case,
    CaseBranch,
    CaseElse,
    ProcCall,
    Write { newline: bool },
    WriteArg,
    Read { newline: bool },
    Empty,

    Binary(BinaryOp),
    Unary(UnaryOp),
    Variable,
    Index,
    Field,
    FunctionCall,
    Literal,
}

impl NodeKind {
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Binary(_)
                | NodeKind::Unary(_)
                | NodeKind::Variable
                | NodeKind::FunctionCall
                | NodeKind::Literal
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub line: u32,
    /// Identifier text for names, calls, variables and fields.
    pub name: Option<String>,
    pub value: Option<Literal>,
}

/// Arena of nodes. Children are owned through their ids; every node except
/// the root has exactly one parent.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.index()].children.get(index).copied()
    }

    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.index()].line
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.nodes[id.index()].name.as_deref().unwrap_or("")
    }

    pub fn literal(&self, id: NodeId) -> Option<&Literal> {
        self.nodes[id.index()].value.as_ref()
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
    }

    /// Children of a declaration list node that are `DeclName`s.
    pub fn decl_names(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.kind(*child) == NodeKind::DeclName)
            .collect()
    }

    /// The trailing type specification of a `VarDecl`, `FieldDecl` or `ParamDecl`.
    pub fn decl_type(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Parameter groups of a `Routine`.
    pub fn routine_params(&self, routine: NodeId) -> Vec<NodeId> {
        self.children(routine)
            .iter()
            .copied()
            .filter(|child| self.kind(*child) == NodeKind::ParamDecl)
            .collect()
    }

    /// Return type specification of a function `Routine`.
    pub fn routine_return_type(&self, routine: NodeId) -> Option<NodeId> {
        match self.kind(routine) {
            NodeKind::Routine { is_function: true } => {
                let children = self.children(routine);
                children.len().checked_sub(2).map(|index| children[index])
            }
            _ => None,
        }
    }

    /// The `Block` of a `Program` or `Routine`.
    pub fn body_block(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// The statement part of a `Block`.
    pub fn block_statements(&self, block: NodeId) -> Option<NodeId> {
        self.children(block)
            .last()
            .copied()
            .filter(|child| self.kind(*child) == NodeKind::Compound)
    }

    /// Declarations of a `Block`, in source order.
    pub fn block_declarations(&self, block: NodeId) -> &[NodeId] {
        let children = self.children(block);
        match children.last() {
            Some(last) if self.kind(*last) == NodeKind::Compound => &children[..children.len() - 1],
            _ => children,
        }
    }
}
