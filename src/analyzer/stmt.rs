use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::ErrorImpl,
    symtab::symtab::SymbolKind,
    types::types::TypeId,
};

use super::analyzer::Analyzer;

impl<'t> Analyzer<'t> {
    /// A statement node whose children do not match its kind's layout.
    fn malformed(&mut self, node: NodeId, what: &str) {
        self.report(
            ErrorImpl::InternalFault {
                message: format!("malformed {} statement", what),
            },
            self.tree.line(node),
        );
    }

    pub fn visit_stmt(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::Compound => {
                for stmt in self.tree.children(node).to_vec() {
                    self.visit_stmt(stmt);
                }
            }
            NodeKind::Assign => self.visit_assign(node),
            NodeKind::If => {
                let children = self.tree.children(node).to_vec();
                let [condition, ref branches @ ..] = children[..] else {
                    return self.malformed(node, "if");
                };
                if !matches!(branches.len(), 1 | 2) {
                    return self.malformed(node, "if");
                }
                self.check_condition(condition);
                for branch in branches {
                    self.visit_stmt(*branch);
                }
            }
            NodeKind::While => {
                let children = self.tree.children(node).to_vec();
                let [condition, body] = children[..] else {
                    return self.malformed(node, "while");
                };
                self.check_condition(condition);
                self.visit_stmt(body);
            }
            NodeKind::Repeat => {
                let children = self.tree.children(node).to_vec();
                let Some((condition, body)) = children.split_last() else {
                    return self.malformed(node, "repeat");
                };
                for stmt in body {
                    self.visit_stmt(*stmt);
                }
                self.check_condition(*condition);
            }
            NodeKind::For { .. } => self.visit_for(node),
            NodeKind::Case => self.visit_case(node),
            NodeKind::ProcCall => self.visit_proc_call(node),
            NodeKind::Write { .. } => {
                for arg in self.tree.children(node).to_vec() {
                    self.visit_write_arg(arg);
                }
            }
            NodeKind::Read { .. } => {
                for target in self.tree.children(node).to_vec() {
                    self.visit_read_target(target);
                }
            }
            NodeKind::Empty => {}
            kind => self.report(
                ErrorImpl::InternalFault {
                    message: format!("{:?} is not a statement", kind),
                },
                self.tree.line(node),
            ),
        }
    }

    fn check_condition(&mut self, condition: NodeId) {
        let ty = self.visit_expr(condition);
        if !self.types.is_assignable(ty, TypeId::BOOLEAN) {
            self.mismatch("boolean", ty, self.tree.line(condition));
        }
    }

    fn visit_assign(&mut self, node: NodeId) {
        let (Some(target), Some(value)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return self.malformed(node, "assignment");
        };

        let target_type = self.visit_variable(target, true);
        let value_type = self.visit_expr(value);
        let value_type = self.coerce_char_literal(value, value_type, target_type);

        if !self.types.is_assignable(value_type, target_type) {
            let expected = self.types.type_name(target_type);
            self.mismatch(&expected, value_type, self.tree.line(node));
        }
    }

    fn visit_for(&mut self, node: NodeId) {
        let children = self.tree.children(node).to_vec();
        let [control, initial, bound, body] = children[..] else {
            return self.malformed(node, "for");
        };

        let control_type = self.visit_variable(control, true);
        // Boolean control variables cannot step past `true`.
        if control_type != TypeId::ERROR
            && (!self.types.is_ordinal(control_type)
                || self.types.strip_subrange(control_type) == TypeId::BOOLEAN)
        {
            self.mismatch("integer, char or enumeration", control_type, self.tree.line(control));
        }

        for limit in [initial, bound] {
            let ty = self.visit_expr(limit);
            if !self.types.is_assignable(ty, control_type) {
                let expected = self.types.type_name(control_type);
                self.mismatch(&expected, ty, self.tree.line(limit));
            }
        }

        self.visit_stmt(body);
    }

    fn visit_proc_call(&mut self, node: NodeId) {
        let name = self.tree.name(node).to_string();
        let line = self.tree.line(node);
        let args = self.tree.children(node).to_vec();

        let Some(id) = self.symtab.resolve(&name) else {
            self.report(ErrorImpl::UndeclaredIdentifier { name }, line);
            for arg in args {
                self.visit_expr(arg);
            }
            return;
        };
        self.annotations.set_symbol(node, id);

        match self.symtab.entry(id).kind {
            SymbolKind::Procedure => self.check_arguments(node, id, &args),
            kind => {
                if kind == SymbolKind::Function {
                    self.report(
                        ErrorImpl::TypeMismatch {
                            expected: "procedure".to_string(),
                            found: format!("function {}", name),
                        },
                        line,
                    );
                } else {
                    self.report(ErrorImpl::NotARoutine { name }, line);
                }
                for arg in args {
                    self.visit_expr(arg);
                }
            }
        }
    }

    fn visit_write_arg(&mut self, arg: NodeId) {
        let children = self.tree.children(arg).to_vec();
        let Some(expr) = children.first().copied() else {
            return;
        };
        let line = self.tree.line(arg);

        let ty = self.visit_expr(expr);
        if ty != TypeId::ERROR && (self.types.is_composite(ty) || ty == TypeId::VOID) {
            self.mismatch("printable scalar", ty, line);
        }

        for specifier in children.iter().skip(1) {
            self.check_format_specifier(*specifier);
        }

        if children.len() > 2 && ty != TypeId::ERROR && self.types.strip_subrange(ty) != TypeId::REAL
        {
            self.mismatch("real", ty, line);
        }

        self.set_type(arg, ty);
    }

    /// Field widths and decimal places are integer constants.
    fn check_format_specifier(&mut self, specifier: NodeId) {
        let line = self.tree.line(specifier);
        match self.fold_constant(specifier) {
            Some((_, ty)) if self.types.is_integer(ty) => {}
            Some((_, ty)) => self.mismatch("integer", ty, line),
            None => {
                if self.annotations.type_of(specifier) != Some(TypeId::ERROR) {
                    let ty = self.visit_expr(specifier);
                    if ty != TypeId::ERROR {
                        self.mismatch("integer constant", ty, line);
                    }
                }
            }
        }
    }

    fn visit_read_target(&mut self, target: NodeId) {
        let ty = self.visit_variable(target, true);
        if ty == TypeId::ERROR {
            return;
        }

        let base = self.types.strip_subrange(ty);
        if !matches!(
            base,
            TypeId::INTEGER | TypeId::REAL | TypeId::BOOLEAN | TypeId::CHAR | TypeId::STRING
        ) {
            self.mismatch("readable scalar", ty, self.tree.line(target));
        }
    }
}
