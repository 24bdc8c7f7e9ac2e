use crate::{
    ast::{
        annotations::Annotations,
        ast::{Literal, NodeId, NodeKind, Tree},
    },
    errors::errors::{Error, ErrorImpl},
    symtab::symtab::{RoutineInfo, SymbolId, SymbolKind, SymbolTable},
    types::types::{TypeId, TypeTable},
};

/// The tree together with everything analysis attached to it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tree: Tree,
    pub symtab: SymbolTable,
    pub types: TypeTable,
    pub annotations: Annotations,
    pub errors: Vec<Error>,
    /// Entry of the program being analyzed.
    pub program: Option<SymbolId>,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Explicit context threaded through the annotation pass.
pub struct Analyzer<'t> {
    pub tree: &'t Tree,
    pub symtab: SymbolTable,
    pub types: TypeTable,
    pub annotations: Annotations,
    pub errors: Vec<Error>,
    /// Routine whose body is being analyzed.
    pub routine: Option<SymbolId>,
    /// Next free local slot in the current routine.
    pub next_slot: u32,
}

impl<'t> Analyzer<'t> {
    pub fn new(tree: &'t Tree) -> Self {
        Analyzer {
            tree,
            symtab: SymbolTable::new(),
            types: TypeTable::new(),
            annotations: Annotations::new(tree.len()),
            errors: vec![],
            routine: None,
            next_slot: 0,
        }
    }

    pub fn report(&mut self, error: ErrorImpl, line: u32) {
        let error = Error::new(error, line);
        tracing::debug!(%error, "semantic error");
        self.errors.push(error);
    }

    pub fn mismatch(&mut self, expected: &str, found: TypeId, line: u32) {
        let found = self.types.type_name(found);
        self.report(
            ErrorImpl::TypeMismatch {
                expected: expected.to_string(),
                found,
            },
            line,
        );
    }

    /// Declares a name, reporting duplicates. A duplicate is annotated with
    /// the entry it collided with.
    pub fn declare(&mut self, name_node: NodeId, kind: SymbolKind, ty: TypeId) -> Option<SymbolId> {
        let name = self.tree.name(name_node).to_string();
        let line = self.tree.line(name_node);

        let id = match self.symtab.declare(&name, kind, ty, line) {
            Ok(id) => id,
            Err(error) => {
                tracing::debug!(%error, "semantic error");
                self.errors.push(error);
                let existing = self.symtab.lookup_local(&name)?;
                self.annotations.set_symbol(name_node, existing);
                return None;
            }
        };

        self.annotations.set_symbol(name_node, id);
        Some(id)
    }

    pub fn set_type(&mut self, node: NodeId, ty: TypeId) -> TypeId {
        self.annotations.set_type(node, ty);
        ty
    }

    /// Retypes a one-character literal used where a string is expected.
    pub fn coerce_char_literal(&mut self, node: NodeId, ty: TypeId, target: TypeId) -> TypeId {
        if ty == TypeId::CHAR
            && self.types.strip_subrange(target) == TypeId::STRING
            && matches!(self.tree.literal(node), Some(Literal::Char(_)))
            && self.tree.kind(node) == NodeKind::Literal
        {
            return self.set_type(node, TypeId::STRING);
        }
        ty
    }

    pub fn visit_program(&mut self, root: NodeId) -> Option<SymbolId> {
        if self.tree.kind(root) != NodeKind::Program {
            self.report(
                ErrorImpl::InternalFault {
                    message: "tree root is not a program".to_string(),
                },
                self.tree.line(root),
            );
            return None;
        }

        let name = self.tree.child(root, 0)?;
        let program = self.declare(name, SymbolKind::Program, TypeId::VOID)?;

        let scope = self.symtab.enter_scope();
        self.symtab.entry_mut(program).routine = Some(RoutineInfo {
            scope: Some(scope),
            node: Some(root),
            ..RoutineInfo::default()
        });

        if let Some(block) = self.tree.body_block(root) {
            self.visit_block(block);
        }
        self.symtab.exit_scope();

        Some(program)
    }

    pub fn visit_block(&mut self, block: NodeId) {
        for declaration in self.tree.block_declarations(block).to_vec() {
            self.visit_declaration(declaration);
        }

        if let Some(statements) = self.tree.block_statements(block) {
            self.visit_stmt(statements);
        }
    }
}

/// Runs the annotation pass over a whole program tree.
///
/// Never stops at the first error: every detectable semantic error is
/// collected in `Analysis::errors`.
#[tracing::instrument(skip(tree), fields(nodes = tree.len()))]
pub fn analyze(tree: Tree) -> Analysis {
    let (symtab, types, annotations, errors, program) = {
        let mut analyzer = Analyzer::new(&tree);
        let program = match tree.root() {
            Some(root) => analyzer.visit_program(root),
            None => {
                analyzer.report(
                    ErrorImpl::InternalFault {
                        message: "tree has no root".to_string(),
                    },
                    0,
                );
                None
            }
        };

        (
            analyzer.symtab,
            analyzer.types,
            analyzer.annotations,
            analyzer.errors,
            program,
        )
    };

    tracing::debug!(errors = errors.len(), "analysis finished");

    Analysis {
        tree,
        symtab,
        types,
        annotations,
        errors,
        program,
    }
}
