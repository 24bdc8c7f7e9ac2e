//! Bytecode compiler.
//!
//! Lowers a clean annotated tree to a [`CompiledProgram`]: program variables
//! become globals, parameters and locals become numbered slots, and each
//! routine plus the program body becomes a list of stack-machine
//! instructions with symbolic labels.

use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::NodeId,
    backend::backend::{Backend, BackendMode},
    errors::errors::{Error, ErrorImpl},
    symtab::symtab::{SymbolId, SymbolKind, PROGRAM_LEVEL},
    types::types::{TypeForm, TypeId},
};

use super::{
    emitter::Emitter,
    instruction::{CompiledProgram, CompiledRoutine, Instruction, Label, RecordLayout, Signature, ValueType},
    stmt::gen_statement,
};

/// State of one compilation: the annotated tree being lowered, the routine
/// under construction and the program-wide label counter.
pub struct Compiler<'a> {
    pub analysis: &'a Analysis,
    pub emitter: Emitter,
    /// Routine whose body is being compiled; `None` for the program body.
    pub current_routine: Option<SymbolId>,
    next_label: u32,
}

/// Compiler with no tree attached, run through [`Backend`].
#[derive(Debug, Default)]
pub struct BytecodeBackend;

impl Backend for BytecodeBackend {
    type Output = CompiledProgram;

    fn mode(&self) -> BackendMode {
        BackendMode::Compile
    }

    fn run(self, analysis: &mut Analysis) -> Result<CompiledProgram, Error> {
        compile(analysis)
    }
}

/// Compiles a clean annotated program.
#[tracing::instrument(skip_all, name = "compile")]
pub fn compile(analysis: &Analysis) -> Result<CompiledProgram, Error> {
    let mut compiler = Compiler::new(analysis);
    let program = compiler.compile_program()?;
    tracing::debug!(
        routines = program.routines.len(),
        labels = compiler.next_label,
        "compiled program"
    );
    Ok(program)
}

impl<'a> Compiler<'a> {
    pub fn new(analysis: &'a Analysis) -> Self {
        Compiler {
            analysis,
            emitter: Emitter::new(),
            current_routine: None,
            next_label: 0,
        }
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label::from_raw(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, instruction: Instruction) -> Result<(), Error> {
        self.emitter.emit(instruction)
    }

    pub fn place(&mut self, label: Label) -> Result<(), Error> {
        self.emitter.place(label)
    }

    fn compile_program(&mut self) -> Result<CompiledProgram, Error> {
        let analysis = self.analysis;
        let program = analysis.program_entry()?;

        let mut globals = vec![];
        for variable in analysis.program_variables()? {
            let entry = analysis.symtab.entry(variable);
            globals.push((entry.name.clone(), self.value_type(entry.ty)?));
        }

        let mut routines = vec![];
        for routine in analysis.routines()? {
            routines.push(self.compile_routine(routine)?);
        }

        // Program body: allocate composite globals, then run the statements.
        self.current_routine = None;
        self.emitter = Emitter::new();
        for (name, ty) in &globals {
            self.gen_default(ty)?;
            self.emit(Instruction::StoreGlobal {
                name: name.clone(),
                ty: ty.clone(),
            })?;
        }
        let root = analysis
            .tree
            .root()
            .ok_or_else(|| Error::internal("tree has no root", 0))?;
        self.gen_body(root)?;
        self.emit(Instruction::Return { value: false })?;
        let (code, max_stack) = std::mem::take(&mut self.emitter).finish()?;

        Ok(CompiledProgram {
            name: analysis.symtab.entry(program).name.clone(),
            globals,
            records: self.record_layouts()?,
            routines,
            main: CompiledRoutine {
                name: "main".to_string(),
                signature: Signature {
                    params: vec![],
                    result: None,
                },
                locals: 0,
                max_stack,
                code,
            },
        })
    }

    fn compile_routine(&mut self, routine: SymbolId) -> Result<CompiledRoutine, Error> {
        let analysis = self.analysis;
        let entry = analysis.symtab.entry(routine);
        let info = analysis.routine_info(routine)?;
        let node = info
            .node
            .ok_or_else(|| Error::internal("routine has no body", entry.line))?;
        tracing::trace!(routine = %entry.name, "compiling routine");

        self.current_routine = Some(routine);
        self.emitter = Emitter::new();

        let mut locals = info.params.len() + info.locals.len();
        for local in &info.locals {
            let local = analysis.symtab.entry(*local);
            let ty = self.value_type(local.ty)?;
            self.gen_default(&ty)?;
            self.emit(Instruction::StoreLocal {
                slot: local.slot as usize,
                ty,
            })?;
        }
        if entry.kind == SymbolKind::Function {
            let ty = self.value_type(entry.ty)?;
            self.gen_default(&ty)?;
            self.emit(Instruction::StoreLocal {
                slot: entry.slot as usize,
                ty,
            })?;
            locals = locals.max(entry.slot as usize + 1);
        }

        self.gen_body(node)?;

        if entry.kind == SymbolKind::Function {
            let ty = self.value_type(entry.ty)?;
            self.emit(Instruction::LoadLocal {
                slot: entry.slot as usize,
                ty,
            })?;
            self.emit(Instruction::Return { value: true })?;
        } else {
            self.emit(Instruction::Return { value: false })?;
        }

        let (code, max_stack) = std::mem::take(&mut self.emitter).finish()?;
        Ok(CompiledRoutine {
            name: entry.name.clone(),
            signature: self.signature(routine)?,
            locals,
            max_stack,
            code,
        })
    }

    fn gen_body(&mut self, owner: NodeId) -> Result<(), Error> {
        let tree = &self.analysis.tree;
        let statements = tree
            .body_block(owner)
            .and_then(|block| tree.block_statements(block))
            .ok_or_else(|| Error::internal("body has no statements", tree.line(owner)))?;
        gen_statement(self, statements)
    }

    pub fn signature(&self, routine: SymbolId) -> Result<Signature, Error> {
        let info = self.analysis.routine_info(routine)?;
        let mut params = vec![];
        for param in &info.params {
            params.push(self.value_type(self.analysis.symtab.entry(*param).ty)?);
        }
        let result = match info.return_type {
            Some(ty) => Some(self.value_type(ty)?),
            None => None,
        };
        Ok(Signature { params, result })
    }

    /// Whether `symbol` lives in a slot of the routine being compiled
    /// rather than in a global.
    pub fn is_local(&self, symbol: SymbolId) -> bool {
        let entry = self.analysis.symtab.entry(symbol);
        self.current_routine.is_some() && (entry.level > PROGRAM_LEVEL || entry.kind == SymbolKind::Function)
    }

    pub fn value_type(&self, ty: TypeId) -> Result<ValueType, Error> {
        let types = &self.analysis.types;
        Ok(match types.form(ty) {
            TypeForm::Subrange { base, .. } => self.value_type(*base)?,
            TypeForm::Enumeration { .. } => ValueType::Int,
            TypeForm::Array { element, min, .. } => ValueType::Array {
                element: Box::new(self.value_type(*element)?),
                count: types.element_count(ty),
                min: *min,
            },
            TypeForm::Record { .. } => ValueType::Record(self.record_class(ty)),
            TypeForm::Scalar => match ty {
                TypeId::INTEGER => ValueType::Int,
                TypeId::REAL => ValueType::Real,
                TypeId::BOOLEAN => ValueType::Bool,
                TypeId::CHAR => ValueType::Char,
                TypeId::STRING => ValueType::Str,
                _ => {
                    return Err(Error::internal(
                        format!("{} has no runtime representation", types.type_name(ty)),
                        0,
                    ))
                }
            },
            TypeForm::Error => return Err(Error::new(ErrorImpl::ErrorTypedNode, 0)),
        })
    }

    pub fn record_class(&self, ty: TypeId) -> String {
        match &self.analysis.types.get(ty).name {
            Some(name) => name.clone(),
            None => format!("$Record{}", ty.index()),
        }
    }

    fn record_layouts(&self) -> Result<Vec<RecordLayout>, Error> {
        let types = &self.analysis.types;
        let mut layouts = vec![];
        for index in 0..types.len() {
            let ty = TypeId::from_raw(index as u32);
            let TypeForm::Record { fields, .. } = types.form(ty) else {
                continue;
            };
            let mut layout = RecordLayout {
                class: self.record_class(ty),
                fields: vec![],
            };
            for field in fields {
                let entry = self.analysis.symtab.entry(*field);
                layout
                    .fields
                    .push((entry.name.clone(), self.value_type(entry.ty)?));
            }
            layouts.push(layout);
        }
        Ok(layouts)
    }

    /// Pushes the initial value of a fresh variable.
    pub fn gen_default(&mut self, ty: &ValueType) -> Result<(), Error> {
        self.emit(match ty {
            ValueType::Int => Instruction::PushInt(0),
            ValueType::Real => Instruction::PushReal(0.0),
            ValueType::Bool => Instruction::PushBool(false),
            ValueType::Char => Instruction::PushChar(' '),
            ValueType::Str => Instruction::PushStr(String::new()),
            composite => Instruction::NewDefault(composite.clone()),
        })
    }
}
