use crate::{
    ast::ast::{BinaryOp, Literal, NodeId, NodeKind, UnaryOp},
    errors::errors::ErrorImpl,
    symtab::symtab::{SymbolId, SymbolKind},
    types::types::{TypeForm, TypeId},
};

use super::analyzer::Analyzer;

impl<'t> Analyzer<'t> {
    pub fn visit_expr(&mut self, node: NodeId) -> TypeId {
        let ty = match self.tree.kind(node) {
            NodeKind::Literal => match self.tree.literal(node) {
                Some(Literal::Integer(_)) => TypeId::INTEGER,
                Some(Literal::Real(_)) => TypeId::REAL,
                Some(Literal::Char(_)) => TypeId::CHAR,
                Some(Literal::Str(_)) => TypeId::STRING,
                None => TypeId::ERROR,
            },
            NodeKind::Variable => return self.visit_variable(node, false),
            NodeKind::FunctionCall => self.visit_function_call(node),
            NodeKind::Unary(op) => self.visit_unary(node, op),
            NodeKind::Binary(op) => self.visit_binary(node, op),
            kind => {
                self.report(
                    ErrorImpl::InternalFault {
                        message: format!("{:?} is not an expression", kind),
                    },
                    self.tree.line(node),
                );
                TypeId::ERROR
            }
        };

        self.set_type(node, ty)
    }

    /// Resolves a variable reference and its modifier chain. A target is the
    /// left side of an assignment, a `for` control variable or a read target.
    pub fn visit_variable(&mut self, node: NodeId, is_target: bool) -> TypeId {
        let name = self.tree.name(node).to_string();
        let line = self.tree.line(node);

        let mut ty = match self.symtab.resolve(&name) {
            Some(id) => {
                self.annotations.set_symbol(node, id);
                self.variable_base_type(node, id, is_target)
            }
            None => {
                self.report(ErrorImpl::UndeclaredIdentifier { name }, line);
                TypeId::ERROR
            }
        };

        for modifier in self.tree.children(node).to_vec() {
            ty = match self.tree.kind(modifier) {
                NodeKind::Index => self.visit_index(modifier, ty),
                NodeKind::Field => self.visit_field(modifier, ty),
                _ => TypeId::ERROR,
            };
            self.set_type(modifier, ty);
        }

        self.set_type(node, ty)
    }

    fn variable_base_type(&mut self, node: NodeId, id: SymbolId, is_target: bool) -> TypeId {
        let entry = self.symtab.entry(id);
        let (kind, ty) = (entry.kind, entry.ty);
        let name = entry.name.clone();
        let line = self.tree.line(node);

        match kind {
            SymbolKind::Variable | SymbolKind::ValueParameter => ty,
            SymbolKind::Constant if !is_target => ty,
            // Assigning to the enclosing function's name sets its result.
            SymbolKind::Function if is_target && self.routine == Some(id) => ty,
            SymbolKind::Function if !is_target => {
                if !self.tree.children(node).is_empty() {
                    self.report(ErrorImpl::NotAVariable { name }, line);
                    return TypeId::ERROR;
                }
                self.check_arguments(node, id, &[]);
                ty
            }
            _ => {
                self.report(ErrorImpl::NotAVariable { name }, line);
                TypeId::ERROR
            }
        }
    }

    fn visit_index(&mut self, modifier: NodeId, ty: TypeId) -> TypeId {
        let line = self.tree.line(modifier);
        let index_type = match self.tree.child(modifier, 0) {
            Some(expr) => self.visit_expr(expr),
            None => TypeId::ERROR,
        };

        if ty == TypeId::ERROR {
            return TypeId::ERROR;
        }
        let TypeForm::Array { index, element, .. } = self.types.form(ty).clone() else {
            self.mismatch("array", ty, line);
            return TypeId::ERROR;
        };

        if !self.types.is_assignable(index_type, index)
            && self.types.strip_subrange(index_type) != self.types.strip_subrange(index)
        {
            let expected = self.types.type_name(index);
            self.mismatch(&expected, index_type, line);
        }
        element
    }

    fn visit_field(&mut self, modifier: NodeId, ty: TypeId) -> TypeId {
        let name = self.tree.name(modifier).to_string();
        let line = self.tree.line(modifier);

        if ty == TypeId::ERROR {
            return TypeId::ERROR;
        }
        let TypeForm::Record { scope, .. } = self.types.form(ty).clone() else {
            self.mismatch("record", ty, line);
            return TypeId::ERROR;
        };

        match self.symtab.lookup_in(scope, &name) {
            Some(field) => {
                self.annotations.set_symbol(modifier, field);
                self.symtab.entry(field).ty
            }
            None => {
                self.report(ErrorImpl::UndeclaredIdentifier { name }, line);
                TypeId::ERROR
            }
        }
    }

    fn visit_function_call(&mut self, node: NodeId) -> TypeId {
        let name = self.tree.name(node).to_string();
        let line = self.tree.line(node);
        let args = self.tree.children(node).to_vec();

        let Some(id) = self.symtab.resolve(&name) else {
            self.report(ErrorImpl::UndeclaredIdentifier { name }, line);
            self.visit_args(&args);
            return TypeId::ERROR;
        };
        self.annotations.set_symbol(node, id);

        match self.symtab.entry(id).kind {
            SymbolKind::Function => {
                self.check_arguments(node, id, &args);
                self.symtab.entry(id).ty
            }
            SymbolKind::Procedure => {
                self.report(
                    ErrorImpl::TypeMismatch {
                        expected: "function".to_string(),
                        found: format!("procedure {}", name),
                    },
                    line,
                );
                self.visit_args(&args);
                TypeId::ERROR
            }
            _ => {
                self.report(ErrorImpl::NotARoutine { name }, line);
                self.visit_args(&args);
                TypeId::ERROR
            }
        }
    }

    fn visit_args(&mut self, args: &[NodeId]) {
        for arg in args {
            self.visit_expr(*arg);
        }
    }

    /// Checks argument count and binds each argument to its parameter type.
    pub fn check_arguments(&mut self, call: NodeId, routine: SymbolId, args: &[NodeId]) {
        let entry = self.symtab.entry(routine);
        let name = entry.name.clone();
        let params: Vec<TypeId> = entry
            .routine
            .as_ref()
            .map(|info| {
                info.params
                    .iter()
                    .map(|param| self.symtab.entry(*param).ty)
                    .collect()
            })
            .unwrap_or_default();

        if params.len() != args.len() {
            self.report(
                ErrorImpl::ArgumentCountMismatch {
                    routine: name,
                    expected: params.len(),
                    received: args.len(),
                },
                self.tree.line(call),
            );
            self.visit_args(args);
            return;
        }

        for (arg, param) in args.iter().zip(params) {
            let ty = self.visit_expr(*arg);
            let ty = self.coerce_char_literal(*arg, ty, param);
            if !self.types.is_assignable(ty, param) {
                let expected = self.types.type_name(param);
                self.mismatch(&expected, ty, self.tree.line(*arg));
            }
        }
    }

    fn visit_unary(&mut self, node: NodeId, op: UnaryOp) -> TypeId {
        let Some(operand) = self.tree.child(node, 0) else {
            return TypeId::ERROR;
        };
        let ty = self.visit_expr(operand);
        if ty == TypeId::ERROR {
            return TypeId::ERROR;
        }

        match op {
            UnaryOp::Negate | UnaryOp::Plus if self.types.is_numeric(ty) => {
                self.types.strip_subrange(ty)
            }
            UnaryOp::Not if self.types.strip_subrange(ty) == TypeId::BOOLEAN => TypeId::BOOLEAN,
            UnaryOp::Not => {
                self.mismatch("boolean", ty, self.tree.line(node));
                TypeId::ERROR
            }
            _ => {
                self.mismatch("numeric", ty, self.tree.line(node));
                TypeId::ERROR
            }
        }
    }

    fn visit_binary(&mut self, node: NodeId, op: BinaryOp) -> TypeId {
        let (Some(left), Some(right)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return TypeId::ERROR;
        };
        let line = self.tree.line(node);

        let mut left_type = self.visit_expr(left);
        let mut right_type = self.visit_expr(right);
        if left_type == TypeId::ERROR || right_type == TypeId::ERROR {
            return TypeId::ERROR;
        }

        match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => {
                if !self.types.is_numeric(left_type) {
                    self.mismatch("numeric", left_type, line);
                    TypeId::ERROR
                } else if !self.types.is_numeric(right_type) {
                    self.mismatch("numeric", right_type, line);
                    TypeId::ERROR
                } else if self.types.is_integer(left_type) && self.types.is_integer(right_type) {
                    TypeId::INTEGER
                } else {
                    TypeId::REAL
                }
            }
            BinaryOp::Divide => {
                if !self.types.is_numeric(left_type) {
                    self.mismatch("numeric", left_type, line);
                    TypeId::ERROR
                } else if !self.types.is_numeric(right_type) {
                    self.mismatch("numeric", right_type, line);
                    TypeId::ERROR
                } else {
                    TypeId::REAL
                }
            }
            BinaryOp::IntDivide | BinaryOp::Modulo => {
                if !self.types.is_integer(left_type) {
                    self.mismatch("integer", left_type, line);
                    TypeId::ERROR
                } else if !self.types.is_integer(right_type) {
                    self.mismatch("integer", right_type, line);
                    TypeId::ERROR
                } else {
                    TypeId::INTEGER
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                if self.types.strip_subrange(left_type) != TypeId::BOOLEAN {
                    self.mismatch("boolean", left_type, line);
                    TypeId::ERROR
                } else if self.types.strip_subrange(right_type) != TypeId::BOOLEAN {
                    self.mismatch("boolean", right_type, line);
                    TypeId::ERROR
                } else {
                    TypeId::BOOLEAN
                }
            }
            _ => {
                left_type = self.coerce_char_literal(left, left_type, right_type);
                right_type = self.coerce_char_literal(right, right_type, left_type);
                if self.is_comparable(left_type, right_type) {
                    TypeId::BOOLEAN
                } else {
                    let expected = self.types.type_name(left_type);
                    self.mismatch(&expected, right_type, line);
                    TypeId::ERROR
                }
            }
        }
    }

    fn is_comparable(&self, left: TypeId, right: TypeId) -> bool {
        if self.types.is_numeric(left) && self.types.is_numeric(right) {
            return true;
        }

        let left = self.types.strip_subrange(left);
        let right = self.types.strip_subrange(right);
        left == right && (self.types.is_ordinal(left) || left == TypeId::STRING)
    }
}
