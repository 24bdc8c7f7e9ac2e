use rustc_hash::FxHashMap;

use crate::{
    ast::{
        annotations::{string_key, JumpTable, KeyKind},
        ast::{NodeId, NodeKind},
    },
    errors::errors::ErrorImpl,
    symtab::value::Value,
    types::types::TypeId,
};

use super::analyzer::Analyzer;

impl<'t> Analyzer<'t> {
    /// Builds the jump table of a case statement from its constant labels.
    pub fn visit_case(&mut self, node: NodeId) {
        let children = self.tree.children(node).to_vec();
        let Some((selector, arms)) = children.split_first() else {
            return;
        };

        let selector_type = self.visit_expr(*selector);
        let base = self.types.strip_subrange(selector_type);
        let key_kind = match base {
            TypeId::STRING => Some(KeyKind::StringHash),
            TypeId::CHAR => Some(KeyKind::Char),
            TypeId::INTEGER | TypeId::BOOLEAN => Some(KeyKind::Integer),
            _ if self.types.is_enumeration(base) => Some(KeyKind::Enumeration),
            TypeId::ERROR => None,
            _ => {
                self.mismatch("ordinal or string", selector_type, self.tree.line(*selector));
                None
            }
        };

        let mut table = JumpTable::new(key_kind.unwrap_or(KeyKind::Integer));
        let mut spellings: FxHashMap<i64, String> = FxHashMap::default();

        for arm in arms {
            let arm_children = self.tree.children(*arm).to_vec();
            let Some((stmt, labels)) = arm_children.split_last() else {
                continue;
            };

            match self.tree.kind(*arm) {
                NodeKind::CaseBranch => {
                    if key_kind.is_some() {
                        for label in labels {
                            self.add_case_label(&mut table, &mut spellings, *label, base, *stmt);
                        }
                    }
                }
                NodeKind::CaseElse => table.default = Some(*stmt),
                _ => continue,
            }
            self.visit_stmt(*stmt);
        }

        tracing::trace!(
            node = ?node,
            keys = table.entries.len(),
            default = table.default.is_some(),
            "jump table built"
        );
        self.annotations.set_jump_table(node, table);
    }

    fn add_case_label(
        &mut self,
        table: &mut JumpTable,
        spellings: &mut FxHashMap<i64, String>,
        label: NodeId,
        base: TypeId,
        stmt: NodeId,
    ) {
        let line = self.tree.line(label);
        let Some((value, ty)) = self.fold_constant(label) else {
            if self.annotations.type_of(label) != Some(TypeId::ERROR) {
                let label = self.label_text(label);
                self.report(ErrorImpl::InvalidCaseLabel { label }, line);
            }
            return;
        };

        let (value, ty) = match value {
            Value::Char(c) if base == TypeId::STRING => {
                let ty = self.coerce_char_literal(label, ty, base);
                (Value::Str(c.to_string()), ty)
            }
            value => (value, ty),
        };

        if self.types.strip_subrange(ty) != base {
            let label = self.label_text(label);
            self.report(ErrorImpl::InvalidCaseLabel { label }, line);
            return;
        }

        let (key, spelling) = match &value {
            Value::Str(text) => (string_key(text), text.clone()),
            other => match other.ordinal() {
                Some(key) => (key, other.to_string()),
                None => {
                    let label = self.label_text(label);
                    self.report(ErrorImpl::InvalidCaseLabel { label }, line);
                    return;
                }
            },
        };

        if let Some(existing) = spellings.get(&key) {
            if table.key_kind == KeyKind::StringHash && *existing != spelling {
                tracing::warn!(
                    first = %existing,
                    second = %spelling,
                    key,
                    line,
                    "case labels share a string hash; keeping the first"
                );
                table.collisions.push((existing.clone(), spelling));
            } else {
                self.report(ErrorImpl::DuplicateCaseKey { label: spelling }, line);
            }
            return;
        }

        spellings.insert(key, spelling);
        table.entries.insert(key, stmt);
    }

    fn label_text(&self, label: NodeId) -> String {
        match self.tree.literal(label) {
            Some(literal) => literal.to_string(),
            None => self.tree.name(label).to_string(),
        }
    }
}
