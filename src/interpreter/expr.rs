use std::cmp::Ordering;

use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::{BinaryOp, NodeId, NodeKind, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    symtab::{symtab::SymbolKind, value::Value},
    types::types::TypeId,
};

use super::interpreter::Interpreter;

impl<'io> Interpreter<'io> {
    pub fn evaluate(&mut self, analysis: &mut Analysis, node: NodeId) -> Result<Value, Error> {
        let line = analysis.tree.line(node);

        match analysis.tree.kind(node) {
            NodeKind::Literal => analysis.literal_value(node),
            NodeKind::Variable => self.evaluate_variable(analysis, node),
            NodeKind::FunctionCall => {
                let routine = analysis.symbol_at(node)?;
                let args = analysis.tree.children(node).to_vec();
                self.call(analysis, routine, &args)?
                    .ok_or_else(|| Error::internal("function returned no value", line))
            }
            NodeKind::Unary(op) => {
                let operand = analysis
                    .tree
                    .child(node, 0)
                    .ok_or_else(|| Error::internal("unary operator without operand", line))?;
                let value = self.evaluate(analysis, operand)?;
                match (op, value) {
                    (UnaryOp::Negate, Value::Integer(value)) => Ok(Value::Integer(value.wrapping_neg())),
                    (UnaryOp::Negate, Value::Real(value)) => Ok(Value::Real(-value)),
                    (UnaryOp::Plus, value @ (Value::Integer(_) | Value::Real(_))) => Ok(value),
                    (UnaryOp::Not, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
                    (op, value) => Err(Error::internal(format!("cannot apply {:?} to {}", op, value), line)),
                }
            }
            NodeKind::Binary(op) => self.evaluate_binary(analysis, node, op),
            kind => Err(Error::internal(format!("{:?} is not an expression", kind), line)),
        }
    }

    fn evaluate_variable(&mut self, analysis: &mut Analysis, node: NodeId) -> Result<Value, Error> {
        let symbol = analysis.symbol_at(node)?;

        match analysis.symtab.entry(symbol).kind {
            SymbolKind::Constant => {
                let entry = analysis.symtab.entry(symbol);
                entry.constant.clone().ok_or_else(|| {
                    Error::internal(format!("constant `{}` has no value", entry.name), entry.line)
                })
            }
            // A bare function name in an expression calls it.
            SymbolKind::Function => self
                .call(analysis, symbol, &[])?
                .ok_or_else(|| Error::internal("function returned no value", analysis.tree.line(node))),
            _ => {
                let path = self.locate(analysis, node)?;
                self.load(analysis, symbol, &path)
            }
        }
    }

    fn evaluate_binary(
        &mut self,
        analysis: &mut Analysis,
        node: NodeId,
        op: BinaryOp,
    ) -> Result<Value, Error> {
        let line = analysis.tree.line(node);
        let (Some(left), Some(right)) = (analysis.tree.child(node, 0), analysis.tree.child(node, 1))
        else {
            return Err(Error::internal("binary operator without operands", line));
        };

        // Both operands are always evaluated, `and`/`or` included.
        let left = self.evaluate(analysis, left)?;
        let right = self.evaluate(analysis, right)?;
        let ty = analysis.type_at(node)?;

        if op.is_relational() {
            let ordering = compare(&left, &right)
                .ok_or_else(|| Error::internal(format!("cannot compare {} and {}", left, right), line))?;
            let result = match op {
                BinaryOp::Equals => ordering == Ordering::Equal,
                BinaryOp::NotEquals => ordering != Ordering::Equal,
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessEquals => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Boolean(result));
        }

        match (op, &left, &right) {
            (BinaryOp::And, Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
            (BinaryOp::Or, Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
            (BinaryOp::IntDivide | BinaryOp::Modulo, Value::Integer(a), Value::Integer(b)) => {
                if *b == 0 {
                    return Err(Error::new(ErrorImpl::DivisionByZero, line));
                }
                Ok(Value::Integer(if op == BinaryOp::IntDivide {
                    a.wrapping_div(*b)
                } else {
                    a.wrapping_rem(*b)
                }))
            }
            (BinaryOp::Divide, _, _) => {
                let (a, b) = real_operands(&left, &right, line)?;
                if b == 0.0 {
                    return Err(Error::new(ErrorImpl::DivisionByZero, line));
                }
                Ok(Value::Real(a / b))
            }
            (_, Value::Integer(a), Value::Integer(b)) if ty == TypeId::INTEGER => {
                Ok(Value::Integer(match op {
                    BinaryOp::Add => a.wrapping_add(*b),
                    BinaryOp::Subtract => a.wrapping_sub(*b),
                    BinaryOp::Multiply => a.wrapping_mul(*b),
                    _ => return Err(Error::internal(format!("unexpected operator {}", op), line)),
                }))
            }
            _ => {
                let (a, b) = real_operands(&left, &right, line)?;
                Ok(Value::Real(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    BinaryOp::Multiply => a * b,
                    _ => return Err(Error::internal(format!("unexpected operator {}", op), line)),
                }))
            }
        }
    }
}

fn real_operands(left: &Value, right: &Value, line: u32) -> Result<(f64, f64), Error> {
    match (left.as_real(), right.as_real()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::internal(format!("{} and {} are not numeric", left, right), line)),
    }
}

/// Orders two values of comparable types, widening mixed numerics.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.as_real()?.partial_cmp(&right.as_real()?),
    }
}
