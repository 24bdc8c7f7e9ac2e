//! The contract shared by every consumer of the annotated tree.
//!
//! Backends only run on a tree with zero semantic errors and never re-check
//! semantics: anything missing from the annotations is an internal fault.

use std::io::{BufRead, Write};

use crate::{
    analyzer::analyzer::Analysis,
    ast::{
        annotations::JumpTable,
        ast::{Literal, NodeId, NodeKind, UnaryOp},
    },
    compiler::{compiler::compile, instruction::CompiledProgram},
    converter::converter::convert,
    errors::errors::{Error, ErrorImpl},
    interpreter::interpreter::Interpreter,
    symtab::{
        symtab::{RoutineInfo, ScopeId, SymbolId, SymbolKind},
        value::Value,
    },
    types::types::TypeId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Interpret,
    Convert,
    Compile,
}

#[derive(Debug, Clone)]
pub enum BackendOutput {
    /// Statements executed by the interpreter.
    Executed(u64),
    /// Java source text.
    Source(String),
    Program(CompiledProgram),
}

/// One consumer of a clean annotated tree.
pub trait Backend {
    type Output;

    fn mode(&self) -> BackendMode;

    fn run(self, analysis: &mut Analysis) -> Result<Self::Output, Error>;
}

/// Refuses to hand a tree that failed analysis to a backend.
pub fn ensure_clean(analysis: &Analysis) -> Result<(), Error> {
    if analysis.has_errors() {
        return Err(Error::internal(
            format!(
                "backend invoked on a tree with {} semantic errors",
                analysis.error_count()
            ),
            0,
        ));
    }
    analysis.program_entry().map(|_| ())
}

/// Runs exactly one backend over `analysis`.
pub fn run(
    mode: BackendMode,
    analysis: &mut Analysis,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<BackendOutput, Error> {
    ensure_clean(analysis)?;
    tracing::debug!(?mode, "running backend");

    match mode {
        BackendMode::Interpret => {
            let executed = Interpreter::new(input, output).run(analysis)?;
            Ok(BackendOutput::Executed(executed))
        }
        BackendMode::Convert => {
            let source = convert(analysis)?;
            output.write_all(source.as_bytes())?;
            Ok(BackendOutput::Source(source))
        }
        BackendMode::Compile => {
            let program = compile(analysis)?;
            write!(output, "{}", program)?;
            Ok(BackendOutput::Program(program))
        }
    }
}

impl Analysis {
    pub fn program_entry(&self) -> Result<SymbolId, Error> {
        self.program
            .ok_or_else(|| Error::internal("analysis has no program entry", 0))
    }

    pub fn program_scope(&self) -> Result<ScopeId, Error> {
        let program = self.program_entry()?;
        self.routine_info(program)?
            .scope
            .ok_or_else(|| Error::internal("program has no scope", 0))
    }

    pub fn routine_info(&self, routine: SymbolId) -> Result<&RoutineInfo, Error> {
        let entry = self.symtab.entry(routine);
        entry
            .routine
            .as_ref()
            .ok_or_else(|| Error::internal(format!("`{}` is not a routine", entry.name), entry.line))
    }

    /// Program-level variables in declaration order.
    pub fn program_variables(&self) -> Result<Vec<SymbolId>, Error> {
        let scope = self.program_scope()?;
        Ok(self.entries_of_kind(scope, |kind| kind == SymbolKind::Variable))
    }

    /// Procedures and functions in declaration order.
    pub fn routines(&self) -> Result<Vec<SymbolId>, Error> {
        let scope = self.program_scope()?;
        Ok(self.entries_of_kind(scope, SymbolKind::is_routine))
    }

    fn entries_of_kind(&self, scope: ScopeId, keep: impl Fn(SymbolKind) -> bool) -> Vec<SymbolId> {
        self.symtab
            .entries_of(scope)
            .iter()
            .copied()
            .filter(|id| keep(self.symtab.entry(*id).kind))
            .collect()
    }

    pub fn symbol_at(&self, node: NodeId) -> Result<SymbolId, Error> {
        self.annotations.symbol(node).ok_or_else(|| {
            Error::internal(
                format!("`{}` has no resolved entry", self.tree.name(node)),
                self.tree.line(node),
            )
        })
    }

    /// Annotated type of `node`. Using an error-typed node is a runtime error.
    pub fn type_at(&self, node: NodeId) -> Result<TypeId, Error> {
        match self.annotations.type_of(node) {
            Some(TypeId::ERROR) => Err(Error::new(ErrorImpl::ErrorTypedNode, self.tree.line(node))),
            Some(ty) => Ok(ty),
            None => Err(Error::internal(
                format!("{:?} node has no type", self.tree.kind(node)),
                self.tree.line(node),
            )),
        }
    }

    pub fn jump_table_at(&self, node: NodeId) -> Result<&JumpTable, Error> {
        self.annotations
            .jump_table(node)
            .ok_or_else(|| Error::internal("case statement has no jump table", self.tree.line(node)))
    }

    /// Value of a literal node, honoring a char literal retyped to string.
    pub fn literal_value(&self, node: NodeId) -> Result<Value, Error> {
        let literal = self
            .tree
            .literal(node)
            .ok_or_else(|| Error::internal("literal node has no value", self.tree.line(node)))?;

        Ok(match literal {
            Literal::Integer(value) => Value::Integer(*value),
            Literal::Real(value) => Value::Real(*value),
            Literal::Char(value) if self.type_at(node)? == TypeId::STRING => {
                Value::Str(value.to_string())
            }
            Literal::Char(value) => Value::Char(*value),
            Literal::Str(value) => Value::Str(value.clone()),
        })
    }

    /// Value of a constant expression: a literal, a named constant or a
    /// signed form of either.
    pub fn constant_at(&self, node: NodeId) -> Result<Value, Error> {
        match self.tree.kind(node) {
            NodeKind::Literal => self.literal_value(node),
            NodeKind::Variable => {
                let entry = self.symtab.entry(self.symbol_at(node)?);
                entry.constant.clone().ok_or_else(|| {
                    Error::internal(format!("`{}` is not a constant", entry.name), entry.line)
                })
            }
            NodeKind::Unary(UnaryOp::Negate) => {
                let operand = self.tree.child(node, 0).ok_or_else(|| {
                    Error::internal("negation without operand", self.tree.line(node))
                })?;
                match self.constant_at(operand)? {
                    Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
                    Value::Real(value) => Ok(Value::Real(-value)),
                    other => Err(Error::internal(
                        format!("cannot negate {}", other),
                        self.tree.line(node),
                    )),
                }
            }
            NodeKind::Unary(UnaryOp::Plus) => match self.tree.child(node, 0) {
                Some(operand) => self.constant_at(operand),
                None => Err(Error::internal("sign without operand", self.tree.line(node))),
            },
            kind => Err(Error::internal(
                format!("{:?} is not a constant", kind),
                self.tree.line(node),
            )),
        }
    }

    /// Whether an assignment target stores the enclosing function's result.
    pub fn is_result_target(&self, target: NodeId) -> Result<bool, Error> {
        let symbol = self.symbol_at(target)?;
        Ok(self.symtab.entry(symbol).kind == SymbolKind::Function)
    }

    /// Parameter types of a routine, in order.
    pub fn params_of(&self, routine: SymbolId) -> Result<Vec<TypeId>, Error> {
        Ok(self
            .routine_info(routine)?
            .params
            .iter()
            .map(|param| self.symtab.entry(*param).ty)
            .collect())
    }
}
