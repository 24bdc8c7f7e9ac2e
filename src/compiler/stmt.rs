use crate::{
    ast::{
        annotations::KeyKind,
        ast::{NodeId, NodeKind},
    },
    errors::errors::Error,
    types::types::TypeId,
};

use rustc_hash::FxHashMap;

use super::{
    compiler::Compiler,
    expr::{gen_call, gen_coerced, gen_expression, gen_place, gen_store, gen_variable},
    instruction::{ArithOp, CompareOp, Instruction, NumKind, ValueType},
    stdlib::{gen_read, gen_write},
};

pub fn gen_statement(compiler: &mut Compiler, statement: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let line = analysis.tree.line(statement);
    let children = analysis.tree.children(statement);
    let kind = analysis.tree.kind(statement);

    if !matches!(kind, NodeKind::Compound | NodeKind::Empty) {
        compiler.emit(Instruction::Line(line))?;
    }

    match kind {
        NodeKind::Compound => {
            for child in children {
                gen_statement(compiler, *child)?;
            }
        }
        NodeKind::Assign => {
            let [target, value] = children[..] else {
                return Err(Error::internal("malformed assignment", line));
            };
            gen_assign(compiler, target, value)?;
        }
        NodeKind::If => {
            let [condition, then, ref otherwise @ ..] = children[..] else {
                return Err(Error::internal("malformed if", line));
            };
            let end_label = compiler.new_label();
            gen_expression(compiler, condition)?;
            match otherwise.first() {
                Some(otherwise) => {
                    let else_label = compiler.new_label();
                    compiler.emit(Instruction::JumpIfFalse(else_label))?;
                    gen_statement(compiler, then)?;
                    compiler.emit(Instruction::Goto(end_label))?;
                    compiler.place(else_label)?;
                    gen_statement(compiler, *otherwise)?;
                }
                None => {
                    compiler.emit(Instruction::JumpIfFalse(end_label))?;
                    gen_statement(compiler, then)?;
                }
            }
            compiler.place(end_label)?;
        }
        NodeKind::While => {
            let [condition, body] = children[..] else {
                return Err(Error::internal("malformed while", line));
            };
            let head_label = compiler.new_label();
            let exit_label = compiler.new_label();
            compiler.place(head_label)?;
            gen_expression(compiler, condition)?;
            compiler.emit(Instruction::JumpIfFalse(exit_label))?;
            gen_statement(compiler, body)?;
            compiler.emit(Instruction::Goto(head_label))?;
            compiler.place(exit_label)?;
        }
        NodeKind::Repeat => {
            let Some((condition, body)) = children.split_last() else {
                return Err(Error::internal("malformed repeat", line));
            };
            let head_label = compiler.new_label();
            compiler.place(head_label)?;
            for stmt in body {
                gen_statement(compiler, *stmt)?;
            }
            gen_expression(compiler, *condition)?;
            compiler.emit(Instruction::JumpIfFalse(head_label))?;
        }
        NodeKind::For { downto } => gen_for(compiler, children, downto)?,
        NodeKind::Case => gen_case(compiler, statement)?,
        NodeKind::ProcCall => {
            let routine = analysis.symbol_at(statement)?;
            gen_call(compiler, routine, children)?;
        }
        NodeKind::Write { .. } => gen_write(compiler, statement)?,
        NodeKind::Read { newline } => gen_read(compiler, children, newline)?,
        NodeKind::Empty => {}
        kind => {
            return Err(Error::internal(format!("{:?} is not a statement", kind), line));
        }
    }

    Ok(())
}

fn gen_assign(compiler: &mut Compiler, target: NodeId, value: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let (place, ty) = gen_place(compiler, target)?;
    gen_coerced(compiler, value, ty)?;
    if analysis.types.is_composite(ty) {
        compiler.emit(Instruction::DeepCopy)?;
    }
    gen_store(compiler, place)
}

fn gen_for(compiler: &mut Compiler, children: &[NodeId], downto: bool) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let [control, initial, bound, body] = children[..] else {
        return Err(Error::internal("malformed for loop", 0));
    };
    let control_type = analysis.types.strip_subrange(analysis.type_at(control)?);
    let is_char = control_type == TypeId::CHAR;
    let compare_type = compiler.value_type(control_type)?;

    gen_assign(compiler, control, initial)?;

    let head_label = compiler.new_label();
    let exit_label = compiler.new_label();
    compiler.place(head_label)?;

    gen_variable(compiler, control)?;
    gen_expression(compiler, bound)?;
    compiler.emit(Instruction::IfCmp {
        op: if downto { CompareOp::Lt } else { CompareOp::Gt },
        ty: compare_type,
        target: exit_label,
    })?;

    gen_statement(compiler, body)?;

    let (place, _) = gen_place(compiler, control)?;
    gen_variable(compiler, control)?;
    if is_char {
        compiler.emit(Instruction::Ordinal)?;
    }
    compiler.emit(Instruction::PushInt(1))?;
    compiler.emit(Instruction::Arith {
        op: if downto { ArithOp::Sub } else { ArithOp::Add },
        kind: NumKind::Int,
    })?;
    if is_char {
        compiler.emit(Instruction::FromOrdinal(ValueType::Char))?;
    }
    gen_store(compiler, place)?;
    compiler.emit(Instruction::Goto(head_label))?;

    compiler.place(exit_label)
}

/// Evaluates the selector once, dispatches through a lookup switch and
/// joins every branch at a shared exit label.
fn gen_case(compiler: &mut Compiler, statement: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let table = analysis.jump_table_at(statement)?;
    let selector = analysis
        .tree
        .child(statement, 0)
        .ok_or_else(|| Error::internal("case without selector", analysis.tree.line(statement)))?;

    gen_expression(compiler, selector)?;
    match table.key_kind {
        KeyKind::StringHash => compiler.emit(Instruction::HashString)?,
        KeyKind::Char => compiler.emit(Instruction::Ordinal)?,
        _ if analysis.types.strip_subrange(analysis.type_at(selector)?) == TypeId::BOOLEAN => {
            compiler.emit(Instruction::Ordinal)?
        }
        _ => {}
    }

    let exit_label = compiler.new_label();
    let default_label = match table.default {
        Some(_) => compiler.new_label(),
        None => exit_label,
    };

    let branches = table.branches();
    let mut branch_labels = FxHashMap::default();
    for branch in &branches {
        branch_labels.insert(*branch, compiler.new_label());
    }
    let keys = table
        .entries
        .iter()
        .filter_map(|(key, branch)| branch_labels.get(branch).map(|label| (*key, *label)))
        .collect();

    compiler.emit(Instruction::LookupSwitch {
        keys,
        default: default_label,
    })?;

    for branch in branches {
        if let Some(label) = branch_labels.get(&branch) {
            compiler.place(*label)?;
        }
        gen_statement(compiler, branch)?;
        compiler.emit(Instruction::Goto(exit_label))?;
    }
    if let Some(default) = table.default {
        compiler.place(default_label)?;
        gen_statement(compiler, default)?;
    }

    compiler.place(exit_label)
}
