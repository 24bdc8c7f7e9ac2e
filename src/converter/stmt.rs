use rustc_hash::FxHashSet;

use crate::{
    analyzer::analyzer::Analysis,
    ast::{
        annotations::{string_key, KeyKind},
        ast::{NodeId, NodeKind},
    },
    backend::format::build_format,
    errors::errors::Error,
    symtab::value::Value,
    types::types::TypeId,
};

use super::converter::{java_name, string_literal, Converter};

impl Converter {
    pub fn emit_stmt(&mut self, analysis: &Analysis, node: NodeId) -> Result<(), Error> {
        let line = analysis.tree.line(node);
        let children = analysis.tree.children(node);

        match analysis.tree.kind(node) {
            NodeKind::Compound => {
                for stmt in children {
                    self.emit_stmt(analysis, *stmt)?;
                }
            }
            NodeKind::Assign => {
                let [target, value] = children[..] else {
                    return Err(Error::internal("malformed assignment", line));
                };
                let ty = analysis.type_at(target)?;
                let text = self.copy_expr(analysis, self.expr(analysis, value)?, ty);
                let target = if analysis.is_result_target(target)? {
                    java_name(&analysis.symtab.entry(analysis.symbol_at(target)?).name)
                } else {
                    self.variable_ref(analysis, target)?
                };
                self.out.line(&format!("{} = {};", target, text));
            }
            NodeKind::If => {
                let [condition, then, ref otherwise @ ..] = children[..] else {
                    return Err(Error::internal("malformed if", line));
                };
                let condition = self.expr(analysis, condition)?;
                self.out.open(&format!("if {}", wrap(condition)));
                self.emit_stmt(analysis, then)?;
                if let Some(otherwise) = otherwise.first() {
                    self.out.close();
                    self.out.open("else");
                    self.emit_stmt(analysis, *otherwise)?;
                }
                self.out.close();
            }
            NodeKind::While => {
                let [condition, body] = children[..] else {
                    return Err(Error::internal("malformed while", line));
                };
                let condition = self.expr(analysis, condition)?;
                self.out.open(&format!("while {}", wrap(condition)));
                self.emit_stmt(analysis, body)?;
                self.out.close();
            }
            NodeKind::Repeat => {
                let Some((condition, body)) = children.split_last() else {
                    return Err(Error::internal("malformed repeat", line));
                };
                self.out.open("do");
                for stmt in body {
                    self.emit_stmt(analysis, *stmt)?;
                }
                let condition = self.expr(analysis, *condition)?;
                self.out.close();
                self.out.line(&format!("while (!{});", wrap(condition)));
            }
            NodeKind::For { downto } => {
                let [control, initial, bound, body] = children[..] else {
                    return Err(Error::internal("malformed for loop", line));
                };
                let control = self.variable_ref(analysis, control)?;
                let initial = self.expr(analysis, initial)?;
                let bound = self.expr(analysis, bound)?;
                let (test, step) = if downto { (">=", "--") } else { ("<=", "++") };
                self.out.open(&format!(
                    "for ({c} = {}; {c} {} {}; {c}{})",
                    initial,
                    test,
                    bound,
                    step,
                    c = control
                ));
                self.emit_stmt(analysis, body)?;
                self.out.close();
            }
            NodeKind::Case => self.emit_case(analysis, node)?,
            NodeKind::ProcCall => {
                let routine = analysis.symbol_at(node)?;
                let call = self.call(analysis, routine, children)?;
                self.out.line(&format!("{};", call));
            }
            NodeKind::Write { .. } => {
                let format = build_format(analysis, node)?;
                let mut args = vec!["Locale.ROOT".to_string(), string_literal(&format.format)];
                for arg in &format.args {
                    args.push(self.expr(analysis, *arg)?);
                }
                self.out
                    .line(&format!("System.out.printf({});", args.join(", ")));
            }
            NodeKind::Read { newline } => {
                for target in children {
                    let base = analysis.types.strip_subrange(analysis.type_at(*target)?);
                    let read = match base {
                        TypeId::INTEGER => "$in.nextInt()",
                        TypeId::REAL => "$in.nextDouble()",
                        TypeId::BOOLEAN => "$in.nextBoolean()",
                        TypeId::CHAR => r#"$in.findWithinHorizon("\\S", 0).charAt(0)"#,
                        TypeId::STRING => "$in.next()",
                        _ => {
                            return Err(Error::internal(
                                format!("cannot read a {}", analysis.types.type_name(base)),
                                line,
                            ))
                        }
                    };
                    let target = self.variable_ref(analysis, *target)?;
                    self.out.line(&format!("{} = {};", target, read));
                }
                if newline {
                    self.out.line("$in.nextLine();");
                }
            }
            NodeKind::Empty => {}
            kind => {
                return Err(Error::internal(format!("{:?} is not a statement", kind), line));
            }
        }

        Ok(())
    }

    /// A `switch` over the case labels that survived in the jump table.
    fn emit_case(&mut self, analysis: &Analysis, node: NodeId) -> Result<(), Error> {
        let table = analysis.jump_table_at(node)?;
        let children = analysis.tree.children(node);
        let selector = *children
            .first()
            .ok_or_else(|| Error::internal("case without selector", analysis.tree.line(node)))?;

        let text = self.expr(analysis, selector)?;
        let selector_base = analysis.types.strip_subrange(analysis.type_at(selector)?);
        let switch = match table.key_kind {
            KeyKind::Char => format!("(int) {}", text),
            _ if selector_base == TypeId::BOOLEAN => format!("{} ? 1 : 0", text),
            _ => text,
        };
        self.out.open(&format!("switch ({})", switch));

        let mut emitted = FxHashSet::default();
        for arm in &children[1..] {
            if analysis.tree.kind(*arm) != NodeKind::CaseBranch {
                continue;
            }
            let Some((stmt, labels)) = analysis.tree.children(*arm).split_last() else {
                continue;
            };

            let mut cases = vec![];
            for label in labels {
                let value = match (table.key_kind, analysis.constant_at(*label)?) {
                    (KeyKind::StringHash, Value::Char(c)) => Value::Str(c.to_string()),
                    (_, value) => value,
                };
                let (key, text) = match &value {
                    Value::Str(text) => (string_key(text), string_literal(text)),
                    other => {
                        let key = other.ordinal().ok_or_else(|| {
                            Error::internal("non-ordinal case label", analysis.tree.line(*label))
                        })?;
                        (key, key.to_string())
                    }
                };
                if table.entries.get(&key) == Some(stmt) && emitted.insert(key) {
                    cases.push(text);
                }
            }

            let Some((last, rest)) = cases.split_last() else {
                continue;
            };
            for case in rest {
                self.out.line(&format!("case {}:", case));
            }
            self.out.open(&format!("case {}:", last));
            self.emit_stmt(analysis, *stmt)?;
            self.out.line("break;");
            self.out.close();
        }

        if let Some(default) = table.default {
            self.out.open("default:");
            self.emit_stmt(analysis, default)?;
            self.out.line("break;");
            self.out.close();
        }

        self.out.close();
        Ok(())
    }
}

/// Parenthesizes a condition unless the text already is one group.
fn wrap(text: String) -> String {
    if text.starts_with('(') && text.ends_with(')') && balanced_group(&text) {
        text
    } else {
        format!("({})", text)
    }
}

fn balanced_group(text: &str) -> bool {
    let mut depth = 0;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && index != text.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
