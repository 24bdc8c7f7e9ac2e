use crate::{
    analyzer::analyzer::Analysis,
    ast::{
        annotations::{string_key, KeyKind},
        ast::{NodeId, NodeKind},
    },
    backend::format::{build_format, render},
    errors::errors::Error,
    symtab::value::Value,
    types::types::TypeId,
};

use super::interpreter::{coerce, Interpreter};

impl<'io> Interpreter<'io> {
    pub fn execute(&mut self, analysis: &mut Analysis, node: NodeId) -> Result<(), Error> {
        let kind = analysis.tree.kind(node);
        let line = analysis.tree.line(node);
        let children = analysis.tree.children(node).to_vec();

        if !matches!(kind, NodeKind::Compound | NodeKind::Empty) {
            self.executed += 1;
        }

        match kind {
            NodeKind::Compound => {
                for stmt in children {
                    self.execute(analysis, stmt)?;
                }
            }
            NodeKind::Assign => {
                let [target, value] = children[..] else {
                    return Err(Error::internal("malformed assignment", line));
                };
                let place = self.place(analysis, target)?;
                let value = self.evaluate(analysis, value)?;
                self.store_place(analysis, target, place.as_deref(), value)?;
            }
            NodeKind::If => {
                let (condition, then, otherwise) = match children[..] {
                    [condition, then] => (condition, then, None),
                    [condition, then, otherwise] => (condition, then, Some(otherwise)),
                    _ => return Err(Error::internal("malformed if", line)),
                };
                if self.condition(analysis, condition)? {
                    self.execute(analysis, then)?;
                } else if let Some(otherwise) = otherwise {
                    self.execute(analysis, otherwise)?;
                }
            }
            NodeKind::While => {
                let [condition, body] = children[..] else {
                    return Err(Error::internal("malformed while", line));
                };
                while self.condition(analysis, condition)? {
                    self.execute(analysis, body)?;
                }
            }
            NodeKind::Repeat => {
                let Some((condition, body)) = children.split_last() else {
                    return Err(Error::internal("malformed repeat", line));
                };
                loop {
                    for stmt in body {
                        self.execute(analysis, *stmt)?;
                    }
                    if self.condition(analysis, *condition)? {
                        break;
                    }
                }
            }
            NodeKind::For { downto } => self.execute_for(analysis, &children, downto)?,
            NodeKind::Case => {
                let Some(selector) = children.first() else {
                    return Err(Error::internal("case without selector", line));
                };
                let selector = self.evaluate(analysis, *selector)?;
                let table = analysis.jump_table_at(node)?;
                let key = match (table.key_kind, &selector) {
                    (KeyKind::StringHash, Value::Str(text)) => Some(string_key(text)),
                    (KeyKind::StringHash, Value::Char(c)) => Some(string_key(&c.to_string())),
                    (_, value) => value.ordinal(),
                }
                .ok_or_else(|| Error::internal(format!("cannot dispatch on {}", selector), line))?;

                if let Some(target) = table.target(key) {
                    self.execute(analysis, target)?;
                }
            }
            NodeKind::ProcCall => {
                let routine = analysis.symbol_at(node)?;
                self.call(analysis, routine, &children)?;
            }
            NodeKind::Write { .. } => {
                let format = build_format(analysis, node)?;
                let mut values = Vec::with_capacity(format.args.len());
                for arg in &format.args {
                    values.push(self.evaluate(analysis, *arg)?);
                }
                let text = render(&format.format, &values)?;
                self.output.write_all(text.as_bytes())?;
            }
            NodeKind::Read { newline } => {
                for target in children {
                    let place = self.place(analysis, target)?;
                    let value = self.read_value(analysis, target)?;
                    self.store_place(analysis, target, place.as_deref(), value)?;
                }
                if newline {
                    self.reader.skip_line(line)?;
                }
            }
            NodeKind::Empty => {}
            kind => {
                return Err(Error::internal(format!("{:?} is not a statement", kind), line));
            }
        }

        Ok(())
    }

    fn condition(&mut self, analysis: &mut Analysis, node: NodeId) -> Result<bool, Error> {
        self.evaluate(analysis, node)?
            .as_bool()
            .ok_or_else(|| Error::internal("condition is not boolean", analysis.tree.line(node)))
    }

    /// Resolves the storage an assignment target denotes. Subscripts are
    /// evaluated here, before the assigned value. `None` is the result of the
    /// enclosing function.
    fn place(&mut self, analysis: &mut Analysis, target: NodeId) -> Result<Option<Vec<usize>>, Error> {
        if analysis.is_result_target(target)? {
            return Ok(None);
        }
        self.locate(analysis, target).map(Some)
    }

    /// Stores into a place resolved by [`Interpreter::place`], widening to
    /// the target's type.
    fn store_place(
        &mut self,
        analysis: &mut Analysis,
        target: NodeId,
        place: Option<&[usize]>,
        value: Value,
    ) -> Result<(), Error> {
        let symbol = analysis.symbol_at(target)?;
        let value = coerce(&analysis.types, value, analysis.type_at(target)?);

        match place {
            None => {
                analysis.symtab.entry_mut(symbol).value = Some(value);
                Ok(())
            }
            Some(path) => self.store(analysis, symbol, path, value),
        }
    }

    fn assign(&mut self, analysis: &mut Analysis, target: NodeId, value: Value) -> Result<(), Error> {
        let place = self.place(analysis, target)?;
        self.store_place(analysis, target, place.as_deref(), value)
    }

    fn execute_for(
        &mut self,
        analysis: &mut Analysis,
        children: &[NodeId],
        downto: bool,
    ) -> Result<(), Error> {
        let [control, initial, bound, body] = children[..] else {
            return Err(Error::internal("malformed for loop", 0));
        };
        let line = analysis.tree.line(control);

        let value = self.evaluate(analysis, initial)?;
        self.assign(analysis, control, value)?;

        loop {
            let current = self.evaluate(analysis, control)?;
            let limit = self.evaluate(analysis, bound)?;
            let (Some(current_ordinal), Some(limit)) = (current.ordinal(), limit.ordinal()) else {
                return Err(Error::internal("for loop over a non-ordinal", line));
            };
            if (!downto && current_ordinal > limit) || (downto && current_ordinal < limit) {
                break;
            }

            self.execute(analysis, body)?;

            let current = self.evaluate(analysis, control)?;
            let next = step(&current, if downto { -1 } else { 1 })
                .ok_or_else(|| Error::internal(format!("cannot step {}", current), line))?;
            self.assign(analysis, control, next)?;
        }

        Ok(())
    }

    fn read_value(&mut self, analysis: &Analysis, target: NodeId) -> Result<Value, Error> {
        let line = analysis.tree.line(target);
        let ty = analysis.types.strip_subrange(analysis.type_at(target)?);

        Ok(match ty {
            TypeId::INTEGER => Value::Integer(self.reader.read_integer(line)?),
            TypeId::REAL => Value::Real(self.reader.read_real(line)?),
            TypeId::BOOLEAN => Value::Boolean(self.reader.read_boolean(line)?),
            TypeId::CHAR => Value::Char(self.reader.read_char(line)?),
            TypeId::STRING => Value::Str(self.reader.read_string(line)?),
            _ => {
                return Err(Error::internal(
                    format!("cannot read a {}", analysis.types.type_name(ty)),
                    line,
                ))
            }
        })
    }
}

/// Successor or predecessor of an ordinal value, wrapping like the
/// compiled forms do.
fn step(value: &Value, delta: i32) -> Option<Value> {
    match value {
        Value::Integer(value) => Some(Value::Integer(value.wrapping_add(delta))),
        Value::Char(value) => {
            char::from_u32((*value as u32).wrapping_add(delta as u32)).map(Value::Char)
        }
        _ => None,
    }
}
