//! Tree-walking execution of an annotated program.

use std::io::{BufRead, Write};

use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::{NodeId, NodeKind},
    backend::backend::{Backend, BackendMode},
    errors::errors::{Error, ErrorImpl},
    symtab::{
        symtab::{SymbolId, SymbolTable},
        value::Value,
    },
    types::types::{TypeForm, TypeId, TypeTable},
};

use super::input::TokenReader;

pub struct Interpreter<'io> {
    pub reader: TokenReader<'io>,
    pub output: &'io mut dyn Write,
    /// Statements executed so far.
    pub executed: u64,
}

impl<'io> Backend for Interpreter<'io> {
    type Output = u64;

    fn mode(&self) -> BackendMode {
        BackendMode::Interpret
    }

    /// Runs the program. A runtime error prints its diagnostic to the
    /// output before it is returned.
    #[tracing::instrument(skip_all, name = "execute")]
    fn run(mut self, analysis: &mut Analysis) -> Result<u64, Error> {
        match self.run_program(analysis) {
            Ok(()) => {
                self.output.flush()?;
                tracing::debug!(executed = self.executed, "program finished");
                Ok(self.executed)
            }
            Err(error) if error.is_runtime() => {
                writeln!(
                    self.output,
                    "RUNTIME ERROR at line {}: {}",
                    error.get_line(),
                    error.get_impl()
                )?;
                self.output.flush()?;
                tracing::debug!(%error, executed = self.executed, "program aborted");
                Err(error)
            }
            Err(error) => Err(error),
        }
    }
}

impl<'io> Interpreter<'io> {
    pub fn new(input: &'io mut dyn BufRead, output: &'io mut dyn Write) -> Self {
        Interpreter {
            reader: TokenReader::new(input),
            output,
            executed: 0,
        }
    }

    fn run_program(&mut self, analysis: &mut Analysis) -> Result<(), Error> {
        for variable in analysis.program_variables()? {
            let ty = analysis.symtab.entry(variable).ty;
            let value = default_value(&analysis.symtab, &analysis.types, ty);
            analysis.symtab.entry_mut(variable).value = Some(value);
        }

        let root = analysis
            .tree
            .root()
            .ok_or_else(|| Error::internal("tree has no root", 0))?;
        self.execute_body(analysis, root)
    }

    /// Executes the statement part of a program or routine.
    pub fn execute_body(&mut self, analysis: &mut Analysis, owner: NodeId) -> Result<(), Error> {
        let statements = analysis
            .tree
            .body_block(owner)
            .and_then(|block| analysis.tree.block_statements(block))
            .ok_or_else(|| Error::internal("body has no statements", analysis.tree.line(owner)))?;
        self.execute(analysis, statements)
    }

    /// Calls a procedure or function with already-parsed argument nodes.
    /// Callee slots are saved and restored around the call.
    pub fn call(
        &mut self,
        analysis: &mut Analysis,
        routine: SymbolId,
        args: &[NodeId],
    ) -> Result<Option<Value>, Error> {
        let info = analysis.routine_info(routine)?.clone();
        let node = info
            .node
            .ok_or_else(|| Error::internal("routine has no body", 0))?;

        let mut bound = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&info.params) {
            let value = self.evaluate(analysis, *arg)?;
            let target = analysis.symtab.entry(*param).ty;
            bound.push(coerce(&analysis.types, value, target));
        }

        let frame: Vec<SymbolId> = info
            .params
            .iter()
            .chain(&info.locals)
            .copied()
            .chain(std::iter::once(routine))
            .collect();
        let saved: Vec<Option<Value>> = frame
            .iter()
            .map(|id| analysis.symtab.entry_mut(*id).value.take())
            .collect();

        for (param, value) in info.params.iter().zip(bound) {
            analysis.symtab.entry_mut(*param).value = Some(value);
        }
        for local in &info.locals {
            let ty = analysis.symtab.entry(*local).ty;
            let value = default_value(&analysis.symtab, &analysis.types, ty);
            analysis.symtab.entry_mut(*local).value = Some(value);
        }
        if let Some(return_type) = info.return_type {
            let value = default_value(&analysis.symtab, &analysis.types, return_type);
            analysis.symtab.entry_mut(routine).value = Some(value);
        }

        tracing::trace!(routine = %analysis.symtab.entry(routine).name, "call");
        let outcome = self.execute_body(analysis, node);
        let result = analysis.symtab.entry_mut(routine).value.take();

        for (id, value) in frame.iter().zip(saved) {
            analysis.symtab.entry_mut(*id).value = value;
        }

        outcome?;
        Ok(info.return_type.and(result))
    }

    /// Array offsets and record slots leading from a variable's own value to
    /// the storage a modified reference denotes. Index expressions are
    /// evaluated left to right and range checked.
    pub fn locate(&mut self, analysis: &mut Analysis, variable: NodeId) -> Result<Vec<usize>, Error> {
        let symbol = analysis.symbol_at(variable)?;
        let mut ty = analysis.symtab.entry(symbol).ty;
        let mut path = vec![];

        for modifier in analysis.tree.children(variable).to_vec() {
            match (analysis.tree.kind(modifier), analysis.types.form(ty).clone()) {
                (NodeKind::Index, TypeForm::Array { element, min, max, .. }) => {
                    let expr = analysis.tree.child(modifier, 0).ok_or_else(|| {
                        Error::internal("index without expression", analysis.tree.line(modifier))
                    })?;
                    let index = self
                        .evaluate(analysis, expr)?
                        .ordinal()
                        .ok_or_else(|| Error::internal("non-ordinal index", analysis.tree.line(expr)))?;
                    if index < min || index > max {
                        return Err(Error::new(
                            ErrorImpl::IndexOutOfRange { index, min, max },
                            analysis.tree.line(modifier),
                        ));
                    }
                    path.push((index - min) as usize);
                    ty = element;
                }
                (NodeKind::Field, TypeForm::Record { .. }) => {
                    let field = analysis.symbol_at(modifier)?;
                    path.push(analysis.symtab.entry(field).slot as usize);
                    ty = analysis.symtab.entry(field).ty;
                }
                (kind, _) => {
                    return Err(Error::internal(
                        format!("{:?} does not fit {}", kind, analysis.types.type_name(ty)),
                        analysis.tree.line(modifier),
                    ))
                }
            }
        }

        Ok(path)
    }

    pub fn load(
        &self,
        analysis: &Analysis,
        symbol: SymbolId,
        path: &[usize],
    ) -> Result<Value, Error> {
        let entry = analysis.symtab.entry(symbol);
        let mut value = entry
            .value
            .as_ref()
            .ok_or_else(|| Error::internal(format!("`{}` has no storage", entry.name), entry.line))?;

        for offset in path {
            value = match value {
                Value::Array(items) | Value::Record(items) => items.get(*offset),
                _ => None,
            }
            .ok_or_else(|| Error::internal(format!("bad access into `{}`", entry.name), entry.line))?;
        }

        Ok(value.clone())
    }

    pub fn store(
        &self,
        analysis: &mut Analysis,
        symbol: SymbolId,
        path: &[usize],
        new_value: Value,
    ) -> Result<(), Error> {
        let entry = analysis.symtab.entry_mut(symbol);
        let (name, line) = (entry.name.clone(), entry.line);
        let mut slot = entry
            .value
            .as_mut()
            .ok_or_else(|| Error::internal(format!("`{}` has no storage", name), line))?;

        for offset in path {
            slot = match slot {
                Value::Array(items) | Value::Record(items) => items.get_mut(*offset),
                _ => None,
            }
            .ok_or_else(|| Error::internal(format!("bad access into `{}`", name), line))?;
        }

        *slot = new_value;
        Ok(())
    }
}

/// Initial value of a variable of type `ty`.
pub fn default_value(symtab: &SymbolTable, types: &TypeTable, ty: TypeId) -> Value {
    match types.form(ty) {
        TypeForm::Array { element, .. } => {
            let element = default_value(symtab, types, *element);
            Value::Array(vec![element; types.element_count(ty)])
        }
        TypeForm::Record { fields, .. } => Value::Record(
            fields
                .iter()
                .map(|field| default_value(symtab, types, symtab.entry(*field).ty))
                .collect(),
        ),
        TypeForm::Subrange { base, .. } => default_value(symtab, types, *base),
        _ => match ty {
            TypeId::REAL => Value::Real(0.0),
            TypeId::BOOLEAN => Value::Boolean(false),
            TypeId::CHAR => Value::Char(' '),
            TypeId::STRING => Value::Str(String::new()),
            _ => Value::Integer(0),
        },
    }
}

/// Widens an integer stored into a real location.
pub fn coerce(types: &TypeTable, value: Value, target: TypeId) -> Value {
    match value {
        Value::Integer(value) if types.strip_subrange(target) == TypeId::REAL => {
            Value::Real(value as f64)
        }
        value => value,
    }
}
