//! Abstract stack-machine instructions.
//!
//! Branch targets are symbolic [`Label`]s; an external assembler resolves
//! them to addresses. Every instruction has a fixed stack effect, see
//! [`Instruction::stack_effect`].

use std::fmt::Display;

use crate::define_id;

define_id!(Label, "L");

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{:03}", self.to_raw())
    }
}

/// Runtime representation of a value on the operand stack or in a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Int,
    Real,
    Bool,
    Char,
    Str,
    Array {
        element: Box<ValueType>,
        count: usize,
        min: i64,
    },
    /// Named record class, laid out in [`CompiledProgram::records`].
    Record(String),
}

impl ValueType {
    pub fn is_composite(&self) -> bool {
        matches!(self, ValueType::Array { .. } | ValueType::Record(_))
    }

    /// JVM-style type descriptor.
    pub fn descriptor(&self) -> String {
        match self {
            ValueType::Int => "I".to_string(),
            ValueType::Real => "D".to_string(),
            ValueType::Bool => "Z".to_string(),
            ValueType::Char => "C".to_string(),
            ValueType::Str => "Ljava/lang/String;".to_string(),
            ValueType::Array { element, .. } => format!("[{}", element.descriptor()),
            ValueType::Record(class) => format!("L{};", class),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<ValueType>,
    /// `None` for procedures.
    pub result: Option<ValueType>,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for param in &self.params {
            write!(f, "{}", param.descriptor())?;
        }
        match &self.result {
            Some(result) => write!(f, "){}", result.descriptor()),
            None => write!(f, ")V"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    /// Real division, or `div` on integers. Zero divisors are fatal.
    Div,
    /// `mod`. Zero divisors are fatal.
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumKind {
    Int,
    Real,
}

impl NumKind {
    pub fn descriptor(self) -> &'static str {
        match self {
            NumKind::Int => "I",
            NumKind::Real => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

/// Runtime services the program calls but does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum External {
    /// Pops an argument list and a format string.
    Printf,
    ReadInt,
    ReadReal,
    ReadBool,
    ReadChar,
    ReadStr,
    /// Discards the rest of the current input line.
    SkipLine,
}

impl External {
    pub fn name(self) -> &'static str {
        match self {
            External::Printf => "printf(Ljava/lang/String;[Ljava/lang/Object;)V",
            External::ReadInt => "readInt()I",
            External::ReadReal => "readReal()D",
            External::ReadBool => "readBool()Z",
            External::ReadChar => "readChar()C",
            External::ReadStr => "readStr()Ljava/lang/String;",
            External::SkipLine => "skipLine()V",
        }
    }

    fn stack_effect(self) -> (usize, usize) {
        match self {
            External::Printf => (2, 0),
            External::SkipLine => (0, 0),
            _ => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Placement of a branch target.
    Label(Label),
    /// Source line of the code that follows.
    Line(u32),

    PushInt(i32),
    PushReal(f64),
    PushBool(bool),
    PushChar(char),
    PushStr(String),

    LoadLocal { slot: usize, ty: ValueType },
    StoreLocal { slot: usize, ty: ValueType },
    LoadGlobal { name: String, ty: ValueType },
    StoreGlobal { name: String, ty: ValueType },

    /// Pushes a fresh default-initialized value.
    NewDefault(ValueType),
    /// Replaces the composite on top with an independent copy.
    DeepCopy,
    /// `array, index -> element`; the index is already zero-based.
    ArrayLoad(ValueType),
    /// `array, index, value ->`
    ArrayStore(ValueType),
    GetField { class: String, field: String, ty: ValueType },
    PutField { class: String, field: String, ty: ValueType },

    Arith { op: ArithOp, kind: NumKind },
    Neg(NumKind),
    Not,
    And,
    Or,
    IntToReal,
    /// Char or boolean to its integer ordinal.
    Ordinal,
    /// Integer ordinal back to a value of the given type.
    FromOrdinal(ValueType),
    HashString,
    /// `a, b -> bool`
    Compare { op: CompareOp, ty: ValueType },

    Goto(Label),
    JumpIfFalse(Label),
    JumpIfTrue(Label),
    /// `a, b ->`, jumps when `a op b` holds.
    IfCmp { op: CompareOp, ty: ValueType, target: Label },
    /// Keys sorted ascending.
    LookupSwitch { keys: Vec<(i64, Label)>, default: Label },

    Call { routine: String, signature: Signature },
    CallExternal(External),
    /// Pushes an empty argument list with room for `n` values.
    NewArgList(usize),
    /// `list, value -> list`
    AppendArg(ValueType),
    Return { value: bool },
}

impl Instruction {
    /// Values popped and pushed.
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Instruction::Label(_) | Instruction::Line(_) => (0, 0),
            Instruction::PushInt(_)
            | Instruction::PushReal(_)
            | Instruction::PushBool(_)
            | Instruction::PushChar(_)
            | Instruction::PushStr(_)
            | Instruction::LoadLocal { .. }
            | Instruction::LoadGlobal { .. }
            | Instruction::NewDefault(_)
            | Instruction::NewArgList(_) => (0, 1),
            Instruction::StoreLocal { .. } | Instruction::StoreGlobal { .. } => (1, 0),
            Instruction::DeepCopy
            | Instruction::GetField { .. }
            | Instruction::Neg(_)
            | Instruction::Not
            | Instruction::IntToReal
            | Instruction::Ordinal
            | Instruction::FromOrdinal(_)
            | Instruction::HashString => (1, 1),
            Instruction::ArrayLoad(_)
            | Instruction::Arith { .. }
            | Instruction::And
            | Instruction::Or
            | Instruction::Compare { .. }
            | Instruction::AppendArg(_) => (2, 1),
            Instruction::ArrayStore(_) => (3, 0),
            Instruction::PutField { .. } | Instruction::IfCmp { .. } => (2, 0),
            Instruction::Goto(_) => (0, 0),
            Instruction::JumpIfFalse(_)
            | Instruction::JumpIfTrue(_)
            | Instruction::LookupSwitch { .. } => (1, 0),
            Instruction::Call { signature, .. } => (
                signature.params.len(),
                usize::from(signature.result.is_some()),
            ),
            Instruction::CallExternal(external) => external.stack_effect(),
            Instruction::Return { value } => (usize::from(*value), 0),
        }
    }

    /// Whether control never falls through to the next instruction.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Goto(_) | Instruction::Return { .. } | Instruction::LookupSwitch { .. }
        )
    }

    /// Labels this instruction may jump to.
    pub fn targets(&self) -> Vec<Label> {
        match self {
            Instruction::Goto(label)
            | Instruction::JumpIfFalse(label)
            | Instruction::JumpIfTrue(label)
            | Instruction::IfCmp { target: label, .. } => vec![*label],
            Instruction::LookupSwitch { keys, default } => keys
                .iter()
                .map(|(_, label)| *label)
                .chain(std::iter::once(*default))
                .collect(),
            _ => vec![],
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Line(line) => write!(f, "    .line {}", line),
            Instruction::PushInt(value) => write!(f, "    push_int {}", value),
            Instruction::PushReal(value) => write!(f, "    push_real {:?}", value),
            Instruction::PushBool(value) => write!(f, "    push_bool {}", value),
            Instruction::PushChar(value) => write!(f, "    push_char {:?}", value),
            Instruction::PushStr(value) => write!(f, "    push_str {:?}", value),
            Instruction::LoadLocal { slot, ty } => {
                write!(f, "    load_local {} {}", slot, ty.descriptor())
            }
            Instruction::StoreLocal { slot, ty } => {
                write!(f, "    store_local {} {}", slot, ty.descriptor())
            }
            Instruction::LoadGlobal { name, ty } => {
                write!(f, "    load_global {} {}", name, ty.descriptor())
            }
            Instruction::StoreGlobal { name, ty } => {
                write!(f, "    store_global {} {}", name, ty.descriptor())
            }
            Instruction::NewDefault(ty) => write!(f, "    new_default {}", ty.descriptor()),
            Instruction::DeepCopy => write!(f, "    deep_copy"),
            Instruction::ArrayLoad(ty) => write!(f, "    array_load {}", ty.descriptor()),
            Instruction::ArrayStore(ty) => write!(f, "    array_store {}", ty.descriptor()),
            Instruction::GetField { class, field, ty } => {
                write!(f, "    get_field {}/{} {}", class, field, ty.descriptor())
            }
            Instruction::PutField { class, field, ty } => {
                write!(f, "    put_field {}/{} {}", class, field, ty.descriptor())
            }
            Instruction::Arith { op, kind } => {
                let op = format!("{:?}", op).to_lowercase();
                write!(f, "    {} {}", op, kind.descriptor())
            }
            Instruction::Neg(kind) => write!(f, "    neg {}", kind.descriptor()),
            Instruction::Not => write!(f, "    not"),
            Instruction::And => write!(f, "    and"),
            Instruction::Or => write!(f, "    or"),
            Instruction::IntToReal => write!(f, "    int_to_real"),
            Instruction::Ordinal => write!(f, "    ordinal"),
            Instruction::FromOrdinal(ty) => write!(f, "    from_ordinal {}", ty.descriptor()),
            Instruction::HashString => write!(f, "    hash_string"),
            Instruction::Compare { op, ty } => {
                write!(f, "    compare {:?} {}", op, ty.descriptor())
            }
            Instruction::Goto(label) => write!(f, "    goto {}", label),
            Instruction::JumpIfFalse(label) => write!(f, "    jump_if_false {}", label),
            Instruction::JumpIfTrue(label) => write!(f, "    jump_if_true {}", label),
            Instruction::IfCmp { op, ty, target } => {
                write!(f, "    if_cmp {:?} {} {}", op, ty.descriptor(), target)
            }
            Instruction::LookupSwitch { keys, default } => {
                writeln!(f, "    lookupswitch")?;
                for (key, label) in keys {
                    writeln!(f, "      {}: {}", key, label)?;
                }
                write!(f, "      default: {}", default)
            }
            Instruction::Call { routine, signature } => {
                write!(f, "    call {}{}", routine, signature)
            }
            Instruction::CallExternal(external) => {
                write!(f, "    call_external {}", external.name())
            }
            Instruction::NewArgList(count) => write!(f, "    new_arg_list {}", count),
            Instruction::AppendArg(ty) => write!(f, "    append_arg {}", ty.descriptor()),
            Instruction::Return { value: true } => write!(f, "    return_value"),
            Instruction::Return { value: false } => write!(f, "    return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    pub class: String,
    pub fields: Vec<(String, ValueType)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRoutine {
    pub name: String,
    pub signature: Signature,
    /// Parameters first, then locals, then a function's result slot.
    pub locals: usize,
    pub max_stack: usize,
    pub code: Vec<Instruction>,
}

/// Output of the bytecode compiler, handed to an external assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub name: String,
    pub globals: Vec<(String, ValueType)>,
    pub records: Vec<RecordLayout>,
    pub routines: Vec<CompiledRoutine>,
    /// The program body.
    pub main: CompiledRoutine,
}

impl CompiledProgram {
    pub fn routine(&self, name: &str) -> Option<&CompiledRoutine> {
        if name == self.main.name {
            return Some(&self.main);
        }
        self.routines.iter().find(|routine| routine.name == name)
    }

    pub fn record(&self, class: &str) -> Option<&RecordLayout> {
        self.records.iter().find(|record| record.class == class)
    }
}

impl Display for CompiledRoutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, ".method public static {}{}", self.name, self.signature)?;
        writeln!(f, ".limit locals {}", self.locals)?;
        writeln!(f, ".limit stack {}", self.max_stack)?;
        for instruction in &self.code {
            writeln!(f, "{}", instruction)?;
        }
        writeln!(f, ".end method")
    }
}

impl Display for CompiledProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, ".class public {}", self.name)?;
        for (name, ty) in &self.globals {
            writeln!(f, ".field public static {} {}", name, ty.descriptor())?;
        }
        for record in &self.records {
            writeln!(f)?;
            writeln!(f, ".record {}", record.class)?;
            for (field, ty) in &record.fields {
                writeln!(f, ".field public {} {}", field, ty.descriptor())?;
            }
            writeln!(f, ".end record")?;
        }
        for routine in &self.routines {
            writeln!(f)?;
            write!(f, "{}", routine)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.main)
    }
}
