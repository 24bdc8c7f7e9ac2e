use crate::{
    ast::ast::{Literal, NodeId, NodeKind, UnaryOp},
    errors::errors::ErrorImpl,
    symtab::{
        symtab::{RoutineInfo, SymbolKind, PROGRAM_LEVEL},
        value::Value,
    },
    types::types::{TypeForm, TypeId, TypeSpec},
};

use super::analyzer::Analyzer;

impl<'t> Analyzer<'t> {
    pub fn visit_declaration(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::ConstDecl => self.visit_const_decl(node),
            NodeKind::TypeDecl => self.visit_type_decl(node),
            NodeKind::VarDecl => self.visit_var_decl(node),
            NodeKind::Routine { is_function } => self.visit_routine(node, is_function),
            _ => self.report(
                ErrorImpl::InternalFault {
                    message: format!("unexpected declaration {:?}", self.tree.kind(node)),
                },
                self.tree.line(node),
            ),
        }
    }

    /// Folds a constant expression: a literal, a named constant, or a signed
    /// numeric form of either. Unknown names are reported here; anything
    /// else that is not constant yields `None` for the caller to report.
    pub fn fold_constant(&mut self, node: NodeId) -> Option<(Value, TypeId)> {
        let folded = match self.tree.kind(node) {
            NodeKind::Literal => match self.tree.literal(node)? {
                Literal::Integer(value) => (Value::Integer(*value), TypeId::INTEGER),
                Literal::Real(value) => (Value::Real(*value), TypeId::REAL),
                Literal::Char(value) => (Value::Char(*value), TypeId::CHAR),
                Literal::Str(value) => (Value::Str(value.clone()), TypeId::STRING),
            },
            NodeKind::Variable if self.tree.children(node).is_empty() => {
                let name = self.tree.name(node).to_string();
                let Some(id) = self.symtab.resolve(&name) else {
                    self.report(ErrorImpl::UndeclaredIdentifier { name }, self.tree.line(node));
                    self.set_type(node, TypeId::ERROR);
                    return None;
                };
                self.annotations.set_symbol(node, id);
                let entry = self.symtab.entry(id);
                (entry.constant.clone()?, entry.ty)
            }
            NodeKind::Unary(op @ (UnaryOp::Negate | UnaryOp::Plus)) => {
                let operand = self.tree.child(node, 0)?;
                let (value, ty) = self.fold_constant(operand)?;
                let value = match (op, value) {
                    (UnaryOp::Plus, value @ (Value::Integer(_) | Value::Real(_))) => value,
                    (_, Value::Integer(value)) => Value::Integer(value.wrapping_neg()),
                    (_, Value::Real(value)) => Value::Real(-value),
                    _ => return None,
                };
                (value, ty)
            }
            _ => return None,
        };

        self.set_type(node, folded.1);
        Some(folded)
    }

    fn visit_const_decl(&mut self, node: NodeId) {
        let (Some(name), Some(value_node)) = (self.tree.child(node, 0), self.tree.child(node, 1))
        else {
            return;
        };

        let (value, ty) = match self.fold_constant(value_node) {
            Some(folded) => folded,
            None => {
                if self.annotations.type_of(value_node).is_none() {
                    self.report(
                        ErrorImpl::TypeMismatch {
                            expected: "constant".to_string(),
                            found: self.tree.name(value_node).to_string(),
                        },
                        self.tree.line(value_node),
                    );
                }
                (Value::Integer(0), TypeId::ERROR)
            }
        };

        if let Some(id) = self.declare(name, SymbolKind::Constant, ty) {
            self.symtab.entry_mut(id).constant = Some(value);
        }
    }

    fn visit_type_decl(&mut self, node: NodeId) {
        let (Some(name), Some(spec)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return;
        };

        let ty = self.resolve_type_spec(spec);
        if ty != TypeId::ERROR {
            self.types.set_name(ty, self.tree.name(name));
        }
        self.declare(name, SymbolKind::TypeName, ty);
    }

    fn visit_var_decl(&mut self, node: NodeId) {
        let Some(spec) = self.tree.decl_type(node) else {
            return;
        };
        let ty = self.resolve_type_spec(spec);

        for name in self.tree.decl_names(node) {
            let Some(id) = self.declare(name, SymbolKind::Variable, ty) else {
                continue;
            };
            self.symtab.entry_mut(id).slot = self.next_slot;
            self.next_slot += 1;

            if let Some(routine) = self.routine {
                if let Some(info) = self.symtab.entry_mut(routine).routine.as_mut() {
                    info.locals.push(id);
                }
            }
        }
    }

    fn visit_routine(&mut self, node: NodeId, is_function: bool) {
        let Some(name) = self.tree.child(node, 0) else {
            return;
        };

        if self.symtab.current_level() > PROGRAM_LEVEL {
            self.report(
                ErrorImpl::NestedRoutine {
                    name: self.tree.name(name).to_string(),
                },
                self.tree.line(name),
            );
            return;
        }

        let return_type = if is_function {
            self.tree
                .routine_return_type(node)
                .map(|spec| self.resolve_type_spec(spec))
        } else {
            None
        };
        let kind = if is_function {
            SymbolKind::Function
        } else {
            SymbolKind::Procedure
        };
        let Some(id) = self.declare(name, kind, return_type.unwrap_or(TypeId::VOID)) else {
            return;
        };

        let scope = self.symtab.enter_scope();
        let saved_slot = std::mem::replace(&mut self.next_slot, 0);
        let saved_routine = self.routine.replace(id);

        let mut params = vec![];
        for group in self.tree.routine_params(node) {
            let ty = match self.tree.decl_type(group) {
                Some(spec) => self.resolve_type_spec(spec),
                None => TypeId::ERROR,
            };
            for param in self.tree.decl_names(group) {
                if let Some(param_id) = self.declare(param, SymbolKind::ValueParameter, ty) {
                    self.symtab.entry_mut(param_id).slot = self.next_slot;
                    self.next_slot += 1;
                    params.push(param_id);
                }
            }
        }

        self.symtab.entry_mut(id).routine = Some(RoutineInfo {
            params,
            locals: vec![],
            return_type,
            scope: Some(scope),
            node: Some(node),
        });

        if let Some(block) = self.tree.body_block(node) {
            self.visit_block(block);
        }

        // Function result occupies the slot after the locals.
        self.symtab.entry_mut(id).slot = self.next_slot;

        self.routine = saved_routine;
        self.next_slot = saved_slot;
        self.symtab.exit_scope();
    }

    pub fn resolve_type_spec(&mut self, spec: NodeId) -> TypeId {
        let ty = match self.tree.kind(spec) {
            NodeKind::TypeName => self.resolve_type_name(spec),
            NodeKind::EnumType => self.resolve_enum_type(spec),
            NodeKind::SubrangeType => self.resolve_subrange_type(spec),
            NodeKind::ArrayType => self.resolve_array_type(spec),
            NodeKind::RecordType => self.resolve_record_type(spec),
            kind => {
                self.report(
                    ErrorImpl::InternalFault {
                        message: format!("{:?} is not a type specification", kind),
                    },
                    self.tree.line(spec),
                );
                TypeId::ERROR
            }
        };

        self.set_type(spec, ty)
    }

    fn resolve_type_name(&mut self, spec: NodeId) -> TypeId {
        let name = self.tree.name(spec).to_string();
        let line = self.tree.line(spec);

        match self.symtab.resolve(&name) {
            Some(id) => {
                self.annotations.set_symbol(spec, id);
                let entry = self.symtab.entry(id);
                if entry.kind == SymbolKind::TypeName {
                    entry.ty
                } else {
                    self.report(
                        ErrorImpl::TypeMismatch {
                            expected: "type".to_string(),
                            found: format!("{} {}", entry.kind, name),
                        },
                        line,
                    );
                    TypeId::ERROR
                }
            }
            None => {
                self.report(ErrorImpl::UndeclaredIdentifier { name }, line);
                TypeId::ERROR
            }
        }
    }

    fn resolve_enum_type(&mut self, spec: NodeId) -> TypeId {
        let ty = self.types.add(TypeSpec {
            name: None,
            form: TypeForm::Enumeration { constants: vec![] },
        });

        let mut constants = vec![];
        for name in self.tree.children(spec).to_vec() {
            let ordinal = constants.len() as i32;
            if let Some(id) = self.declare(name, SymbolKind::Constant, ty) {
                self.symtab.entry_mut(id).constant = Some(Value::Integer(ordinal));
                constants.push(id);
            }
        }

        self.types
            .set_form(ty, TypeForm::Enumeration { constants });
        ty
    }

    fn resolve_subrange_type(&mut self, spec: NodeId) -> TypeId {
        let (Some(low), Some(high)) = (self.tree.child(spec, 0), self.tree.child(spec, 1)) else {
            return TypeId::ERROR;
        };
        let line = self.tree.line(spec);

        let (Some((min_value, min_ty)), Some((max_value, max_ty))) =
            (self.fold_constant(low), self.fold_constant(high))
        else {
            self.report(
                ErrorImpl::TypeMismatch {
                    expected: "constant subrange bounds".to_string(),
                    found: self.tree.name(low).to_string(),
                },
                line,
            );
            return TypeId::ERROR;
        };

        let base = self.types.strip_subrange(min_ty);
        if base != self.types.strip_subrange(max_ty) {
            self.mismatch(&self.types.type_name(base), max_ty, line);
            return TypeId::ERROR;
        }
        if !self.types.is_ordinal(base) {
            self.mismatch("ordinal", base, line);
            return TypeId::ERROR;
        }

        let (Some(min), Some(max)) = (min_value.ordinal(), max_value.ordinal()) else {
            return TypeId::ERROR;
        };
        if min > max {
            self.report(
                ErrorImpl::TypeMismatch {
                    expected: "ascending subrange".to_string(),
                    found: format!("{}..{}", min, max),
                },
                line,
            );
            return TypeId::ERROR;
        }

        self.types.add(TypeSpec {
            name: None,
            form: TypeForm::Subrange { base, min, max },
        })
    }

    fn resolve_array_type(&mut self, spec: NodeId) -> TypeId {
        let (Some(index_spec), Some(element_spec)) =
            (self.tree.child(spec, 0), self.tree.child(spec, 1))
        else {
            return TypeId::ERROR;
        };

        let index = self.resolve_type_spec(index_spec);
        let element = self.resolve_type_spec(element_spec);
        if index == TypeId::ERROR || element == TypeId::ERROR {
            return TypeId::ERROR;
        }

        let Some((min, max)) = self.types.ordinal_bounds(index) else {
            self.mismatch("bounded ordinal index", index, self.tree.line(index_spec));
            return TypeId::ERROR;
        };

        self.types.add(TypeSpec {
            name: None,
            form: TypeForm::Array {
                index,
                element,
                min,
                max,
            },
        })
    }

    fn resolve_record_type(&mut self, spec: NodeId) -> TypeId {
        let scope = self.symtab.enter_scope();
        let mut fields = vec![];

        for group in self.tree.children(spec).to_vec() {
            let ty = match self.tree.decl_type(group) {
                Some(field_spec) => self.resolve_type_spec(field_spec),
                None => TypeId::ERROR,
            };
            for name in self.tree.decl_names(group) {
                if let Some(id) = self.declare(name, SymbolKind::RecordField, ty) {
                    self.symtab.entry_mut(id).slot = fields.len() as u32;
                    fields.push(id);
                }
            }
        }

        self.symtab.exit_scope();
        self.types.add(TypeSpec {
            name: None,
            form: TypeForm::Record { fields, scope },
        })
    }
}
