//! Calls into the runtime library: formatted output and token input.
//!
//! The library itself is external; the compiled program only pushes
//! arguments and names the service through [`External`].

use crate::{
    ast::ast::NodeId,
    backend::format::build_format,
    errors::errors::Error,
    types::types::TypeId,
};

use super::{
    compiler::Compiler,
    expr::{gen_expression, gen_place, gen_store},
    instruction::{External, Instruction},
};

/// Pushes the format constant and an argument list, then calls `Printf`.
pub fn gen_write(compiler: &mut Compiler, statement: NodeId) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let format = build_format(analysis, statement)?;

    compiler.emit(Instruction::PushStr(format.format))?;
    compiler.emit(Instruction::NewArgList(format.args.len()))?;
    for arg in format.args {
        gen_expression(compiler, arg)?;
        let ty = compiler.value_type(analysis.type_at(arg)?)?;
        compiler.emit(Instruction::AppendArg(ty))?;
    }
    compiler.emit(Instruction::CallExternal(External::Printf))
}

/// One external read per target keyed by its base type, then `SkipLine`
/// for `readln`.
pub fn gen_read(compiler: &mut Compiler, targets: &[NodeId], newline: bool) -> Result<(), Error> {
    let analysis = compiler.analysis;

    for target in targets {
        let base = analysis.types.strip_subrange(analysis.type_at(*target)?);
        let external = match base {
            TypeId::INTEGER => External::ReadInt,
            TypeId::REAL => External::ReadReal,
            TypeId::BOOLEAN => External::ReadBool,
            TypeId::CHAR => External::ReadChar,
            TypeId::STRING => External::ReadStr,
            _ => {
                return Err(Error::internal(
                    format!("cannot read a {}", analysis.types.type_name(base)),
                    analysis.tree.line(*target),
                ))
            }
        };

        let (place, _) = gen_place(compiler, *target)?;
        compiler.emit(Instruction::CallExternal(external))?;
        gen_store(compiler, place)?;
    }

    if newline {
        compiler.emit(Instruction::CallExternal(External::SkipLine))?;
    }
    Ok(())
}
