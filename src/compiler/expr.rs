use crate::{
    ast::ast::{BinaryOp, NodeId, NodeKind, UnaryOp},
    errors::errors::Error,
    symtab::{
        symtab::{SymbolId, SymbolKind},
        value::Value,
    },
    types::types::{TypeForm, TypeId},
};

use super::{
    compiler::Compiler,
    instruction::{ArithOp, CompareOp, Instruction, NumKind, ValueType},
};

/// Where a store goes once its value is on the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Local { slot: usize, ty: ValueType },
    Global { name: String, ty: ValueType },
    /// Array and zero-based index are already on the stack.
    Element(ValueType),
    /// Record is already on the stack.
    Field {
        class: String,
        field: String,
        ty: ValueType,
    },
}

pub fn gen_expression(compiler: &mut Compiler, node: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let line = analysis.tree.line(node);

    match analysis.tree.kind(node) {
        NodeKind::Literal => gen_constant(compiler, &analysis.literal_value(node)?, line),
        NodeKind::Variable => {
            let symbol = analysis.symbol_at(node)?;
            let entry = analysis.symtab.entry(symbol);
            match entry.kind {
                SymbolKind::Constant => {
                    let value = analysis.constant_at(node)?;
                    gen_constant(compiler, &value, line)
                }
                // A bare function name in an expression calls it.
                SymbolKind::Function => gen_call(compiler, symbol, &[]),
                _ => gen_variable(compiler, node),
            }
        }
        NodeKind::FunctionCall => {
            let routine = analysis.symbol_at(node)?;
            gen_call(compiler, routine, analysis.tree.children(node))
        }
        NodeKind::Unary(op) => {
            let operand = analysis
                .tree
                .child(node, 0)
                .ok_or_else(|| Error::internal("unary operator without operand", line))?;
            gen_expression(compiler, operand)?;
            match op {
                UnaryOp::Negate => {
                    let kind = num_kind(compiler, analysis.type_at(node)?);
                    compiler.emit(Instruction::Neg(kind))
                }
                UnaryOp::Plus => Ok(()),
                UnaryOp::Not => compiler.emit(Instruction::Not),
            }
        }
        NodeKind::Binary(op) => gen_binary(compiler, node, op),
        kind => Err(Error::internal(format!("{:?} is not an expression", kind), line)),
    }
}

/// Evaluates `node` and widens an integer result when `target` is real.
pub fn gen_coerced(compiler: &mut Compiler, node: NodeId, target: TypeId) -> Result<(), Error> {
    gen_expression(compiler, node)?;
    let types = &compiler.analysis.types;
    if types.strip_subrange(target) == TypeId::REAL
        && types.is_integer(compiler.analysis.type_at(node)?)
    {
        compiler.emit(Instruction::IntToReal)?;
    }
    Ok(())
}

pub fn gen_constant(compiler: &mut Compiler, value: &Value, line: u32) -> Result<(), Error> {
    compiler.emit(match value {
        Value::Integer(value) => Instruction::PushInt(*value),
        Value::Real(value) => Instruction::PushReal(*value),
        Value::Boolean(value) => Instruction::PushBool(*value),
        Value::Char(value) => Instruction::PushChar(*value),
        Value::Str(value) => Instruction::PushStr(value.clone()),
        Value::Array(_) | Value::Record(_) => {
            return Err(Error::internal("composite constant", line));
        }
    })
}

/// Arguments are widened and composites copied before the call.
pub fn gen_call(compiler: &mut Compiler, routine: SymbolId, args: &[NodeId]) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let params = analysis.params_of(routine)?;
    for (arg, param) in args.iter().zip(&params) {
        gen_coerced(compiler, *arg, *param)?;
        if analysis.types.is_composite(*param) {
            compiler.emit(Instruction::DeepCopy)?;
        }
    }

    compiler.emit(Instruction::Call {
        routine: analysis.symtab.entry(routine).name.clone(),
        signature: compiler.signature(routine)?,
    })
}

fn load_symbol(compiler: &mut Compiler, symbol: SymbolId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let entry = analysis.symtab.entry(symbol);
    let ty = compiler.value_type(entry.ty)?;
    if compiler.is_local(symbol) {
        compiler.emit(Instruction::LoadLocal {
            slot: entry.slot as usize,
            ty,
        })
    } else {
        compiler.emit(Instruction::LoadGlobal {
            name: entry.name.clone(),
            ty,
        })
    }
}

/// Loads a variable through its whole modifier chain.
pub fn gen_variable(compiler: &mut Compiler, node: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let symbol = analysis.symbol_at(node)?;
    load_symbol(compiler, symbol)?;

    let mut ty = analysis.symtab.entry(symbol).ty;
    for modifier in analysis.tree.children(node) {
        ty = match gen_modifier(compiler, *modifier, ty)? {
            (Place::Element(element), next) => {
                compiler.emit(Instruction::ArrayLoad(element))?;
                next
            }
            (Place::Field { class, field, ty }, next) => {
                compiler.emit(Instruction::GetField { class, field, ty })?;
                next
            }
            _ => return Err(Error::internal("modifier resolved to a variable", analysis.tree.line(*modifier))),
        };
    }
    Ok(())
}

/// Pushes what one modifier needs on top of its container: a zero-based
/// index for subscripts, nothing for fields.
fn gen_modifier(compiler: &mut Compiler, modifier: NodeId, container: TypeId) -> Result<(Place, TypeId), Error> {
    let analysis = compiler.analysis;
    let line = analysis.tree.line(modifier);

    match (analysis.tree.kind(modifier), analysis.types.form(container)) {
        (NodeKind::Index, TypeForm::Array { element, min, .. }) => {
            let (element, min) = (*element, *min);
            let index = analysis
                .tree
                .child(modifier, 0)
                .ok_or_else(|| Error::internal("index without expression", line))?;
            gen_expression(compiler, index)?;
            let index_type = analysis.types.strip_subrange(analysis.type_at(index)?);
            if index_type == TypeId::CHAR || index_type == TypeId::BOOLEAN {
                compiler.emit(Instruction::Ordinal)?;
            }
            if min != 0 {
                compiler.emit(Instruction::PushInt(min as i32))?;
                compiler.emit(Instruction::Arith {
                    op: ArithOp::Sub,
                    kind: NumKind::Int,
                })?;
            }
            Ok((Place::Element(compiler.value_type(element)?), element))
        }
        (NodeKind::Field, TypeForm::Record { .. }) => {
            let field = analysis.symtab.entry(analysis.symbol_at(modifier)?);
            Ok((
                Place::Field {
                    class: compiler.record_class(container),
                    field: field.name.clone(),
                    ty: compiler.value_type(field.ty)?,
                },
                field.ty,
            ))
        }
        (kind, _) => Err(Error::internal(
            format!("{:?} does not fit {}", kind, analysis.types.type_name(container)),
            line,
        )),
    }
}

/// Prepares a store into `target`: loads containers and the final index,
/// then returns the place and the target's type.
pub fn gen_place(compiler: &mut Compiler, target: NodeId) -> Result<(Place, TypeId), Error> {
    let analysis = compiler.analysis;
    let symbol = analysis.symbol_at(target)?;
    let entry = analysis.symtab.entry(symbol);
    let modifiers = analysis.tree.children(target);

    let Some((last, inner)) = modifiers.split_last() else {
        let ty = compiler.value_type(entry.ty)?;
        let place = if compiler.is_local(symbol) {
            Place::Local {
                slot: entry.slot as usize,
                ty,
            }
        } else {
            Place::Global {
                name: entry.name.clone(),
                ty,
            }
        };
        return Ok((place, entry.ty));
    };

    load_symbol(compiler, symbol)?;
    let mut ty = entry.ty;
    for modifier in inner {
        let (place, next) = gen_modifier(compiler, *modifier, ty)?;
        match place {
            Place::Element(element) => compiler.emit(Instruction::ArrayLoad(element))?,
            Place::Field { class, field, ty } => {
                compiler.emit(Instruction::GetField { class, field, ty })?
            }
            _ => return Err(Error::internal("modifier resolved to a variable", analysis.tree.line(*modifier))),
        }
        ty = next;
    }
    gen_modifier(compiler, *last, ty)
}

pub fn gen_store(compiler: &mut Compiler, place: Place) -> Result<(), Error> {
    compiler.emit(match place {
        Place::Local { slot, ty } => Instruction::StoreLocal { slot, ty },
        Place::Global { name, ty } => Instruction::StoreGlobal { name, ty },
        Place::Element(ty) => Instruction::ArrayStore(ty),
        Place::Field { class, field, ty } => Instruction::PutField { class, field, ty },
    })
}

fn num_kind(compiler: &Compiler, ty: TypeId) -> NumKind {
    if compiler.analysis.types.strip_subrange(ty) == TypeId::REAL {
        NumKind::Real
    } else {
        NumKind::Int
    }
}

fn gen_binary(compiler: &mut Compiler, node: NodeId, op: BinaryOp) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let line = analysis.tree.line(node);
    let (Some(left), Some(right)) = (analysis.tree.child(node, 0), analysis.tree.child(node, 1)) else {
        return Err(Error::internal("binary operator without operands", line));
    };
    let left_type = analysis.types.strip_subrange(analysis.type_at(left)?);
    let right_type = analysis.types.strip_subrange(analysis.type_at(right)?);

    if op.is_relational() {
        let compare = match op {
            BinaryOp::Equals => CompareOp::Eq,
            BinaryOp::NotEquals => CompareOp::Ne,
            BinaryOp::Less => CompareOp::Lt,
            BinaryOp::LessEquals => CompareOp::Le,
            BinaryOp::Greater => CompareOp::Gt,
            _ => CompareOp::Ge,
        };
        let ty = if left_type == TypeId::REAL || right_type == TypeId::REAL {
            gen_coerced(compiler, left, TypeId::REAL)?;
            gen_coerced(compiler, right, TypeId::REAL)?;
            ValueType::Real
        } else {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            compiler.value_type(left_type)?
        };
        return compiler.emit(Instruction::Compare { op: compare, ty });
    }

    match op {
        // Both operands are always evaluated.
        BinaryOp::And | BinaryOp::Or => {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            compiler.emit(if op == BinaryOp::And {
                Instruction::And
            } else {
                Instruction::Or
            })
        }
        BinaryOp::Divide => {
            gen_coerced(compiler, left, TypeId::REAL)?;
            gen_coerced(compiler, right, TypeId::REAL)?;
            compiler.emit(Instruction::Line(line))?;
            compiler.emit(Instruction::Arith {
                op: ArithOp::Div,
                kind: NumKind::Real,
            })
        }
        BinaryOp::IntDivide | BinaryOp::Modulo => {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            compiler.emit(Instruction::Line(line))?;
            compiler.emit(Instruction::Arith {
                op: if op == BinaryOp::IntDivide {
                    ArithOp::Div
                } else {
                    ArithOp::Rem
                },
                kind: NumKind::Int,
            })
        }
        _ => {
            let kind = num_kind(compiler, analysis.type_at(node)?);
            let target = match kind {
                NumKind::Real => TypeId::REAL,
                NumKind::Int => TypeId::INTEGER,
            };
            gen_coerced(compiler, left, target)?;
            gen_coerced(compiler, right, target)?;
            compiler.emit(Instruction::Arith {
                op: match op {
                    BinaryOp::Add => ArithOp::Add,
                    BinaryOp::Subtract => ArithOp::Sub,
                    _ => ArithOp::Mul,
                },
                kind,
            })
        }
    }
}
