use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::{BinaryOp, NodeId, NodeKind, UnaryOp},
    errors::errors::Error,
    symtab::symtab::{SymbolId, SymbolKind},
    types::types::{TypeForm, TypeId},
};

use super::converter::{java_name, value_literal, Converter};

impl Converter {
    /// Fully parenthesized Java text of an expression.
    pub fn expr(&self, analysis: &Analysis, node: NodeId) -> Result<String, Error> {
        let line = analysis.tree.line(node);

        match analysis.tree.kind(node) {
            NodeKind::Literal => Ok(value_literal(&analysis.literal_value(node)?)),
            NodeKind::Variable => {
                let symbol = analysis.symbol_at(node)?;
                let entry = analysis.symtab.entry(symbol);
                match entry.kind {
                    SymbolKind::Constant => Ok(java_name(&entry.name)),
                    SymbolKind::Function => Ok(format!("{}()", java_name(&entry.name))),
                    _ => self.variable_ref(analysis, node),
                }
            }
            NodeKind::FunctionCall => {
                let routine = analysis.symbol_at(node)?;
                self.call(analysis, routine, analysis.tree.children(node))
            }
            NodeKind::Unary(op) => {
                let operand = analysis
                    .tree
                    .child(node, 0)
                    .ok_or_else(|| Error::internal("unary operator without operand", line))?;
                let operand = self.expr(analysis, operand)?;
                Ok(match op {
                    UnaryOp::Negate => format!("(-{})", operand),
                    UnaryOp::Plus => format!("(+{})", operand),
                    UnaryOp::Not => format!("(!{})", operand),
                })
            }
            NodeKind::Binary(op) => self.binary(analysis, node, op),
            kind => Err(Error::internal(format!("{:?} is not an expression", kind), line)),
        }
    }

    /// A variable with its subscripts and field selections.
    pub fn variable_ref(&self, analysis: &Analysis, node: NodeId) -> Result<String, Error> {
        let symbol = analysis.symbol_at(node)?;
        let mut ty = analysis.symtab.entry(symbol).ty;
        let mut text = java_name(&analysis.symtab.entry(symbol).name);

        for modifier in analysis.tree.children(node) {
            match (analysis.tree.kind(*modifier), analysis.types.form(ty)) {
                (NodeKind::Index, TypeForm::Array { element, min, .. }) => {
                    let index = analysis.tree.child(*modifier, 0).ok_or_else(|| {
                        Error::internal("index without expression", analysis.tree.line(*modifier))
                    })?;
                    let index_type = analysis.types.strip_subrange(analysis.type_at(index)?);
                    let mut index = self.expr(analysis, index)?;
                    if index_type == TypeId::BOOLEAN {
                        index = format!("({} ? 1 : 0)", index);
                    }
                    if *min == 0 {
                        text = format!("{}[{}]", text, index);
                    } else {
                        text = format!("{}[{} - ({})]", text, index, min);
                    }
                    ty = *element;
                }
                (NodeKind::Field, TypeForm::Record { .. }) => {
                    let field = analysis.symtab.entry(analysis.symbol_at(*modifier)?);
                    text = format!("{}.{}", text, java_name(&field.name));
                    ty = field.ty;
                }
                (kind, _) => {
                    return Err(Error::internal(
                        format!("{:?} does not fit {}", kind, analysis.types.type_name(ty)),
                        analysis.tree.line(*modifier),
                    ))
                }
            }
        }

        Ok(text)
    }

    /// A call with each argument copied into its parameter.
    pub fn call(&self, analysis: &Analysis, routine: SymbolId, args: &[NodeId]) -> Result<String, Error> {
        let params = analysis.params_of(routine)?;
        let mut texts = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(params) {
            let text = self.expr(analysis, *arg)?;
            texts.push(self.copy_expr(analysis, text, param));
        }

        Ok(format!(
            "{}({})",
            java_name(&analysis.symtab.entry(routine).name),
            texts.join(", ")
        ))
    }

    fn binary(&self, analysis: &Analysis, node: NodeId, op: BinaryOp) -> Result<String, Error> {
        let line = analysis.tree.line(node);
        let (Some(left_node), Some(right_node)) =
            (analysis.tree.child(node, 0), analysis.tree.child(node, 1))
        else {
            return Err(Error::internal("binary operator without operands", line));
        };
        let left = self.expr(analysis, left_node)?;
        let right = self.expr(analysis, right_node)?;

        Ok(match op {
            BinaryOp::Divide => format!("$divide({}, {}, {})", left, right, line),
            BinaryOp::IntDivide => format!("$intDivide({}, {}, {})", left, right, line),
            BinaryOp::Modulo => format!("$modulo({}, {}, {})", left, right, line),
            // Both operands are always evaluated.
            BinaryOp::And => format!("({} & {})", left, right),
            BinaryOp::Or => format!("({} | {})", left, right),
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => {
                format!("({} {} {})", left, op, right)
            }
            _ => {
                let operator = match op {
                    BinaryOp::Equals => "==",
                    BinaryOp::NotEquals => "!=",
                    BinaryOp::Less => "<",
                    BinaryOp::LessEquals => "<=",
                    BinaryOp::Greater => ">",
                    _ => ">=",
                };
                let operand_type = analysis.types.strip_subrange(analysis.type_at(left_node)?);
                match operand_type {
                    TypeId::STRING => format!("({}.compareTo({}) {} 0)", left, right, operator),
                    TypeId::BOOLEAN => {
                        format!("(Boolean.compare({}, {}) {} 0)", left, right, operator)
                    }
                    _ => format!("({} {} {})", left, operator, right),
                }
            }
        })
    }
}
