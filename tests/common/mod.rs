//! Reference stack machine for compiled programs.
//!
//! Runs a [`CompiledProgram`] directly so integration tests can compare the
//! compiler's output against the interpreter. Composites live behind shared
//! references, the way they would on a JVM, so missing copies show up as
//! aliasing bugs.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    io::{BufRead, Write},
    rc::Rc,
};

use pascalcc::{
    analyzer::analyzer::{analyze, Analysis},
    ast::annotations::string_key,
    backend::{backend::Backend, format::render},
    compiler::{
        compiler::compile,
        instruction::{
            ArithOp, CompiledProgram, CompiledRoutine, External, Instruction, Label, NumKind,
            ValueType,
        },
    },
    errors::errors::{Error, ErrorImpl},
    interpreter::{input::TokenReader, interpreter::Interpreter},
    lexer::lexer::tokenize,
    parser::parser::parse,
    symtab::value::Value,
};

#[derive(Debug, Clone)]
pub enum Slot {
    Int(i32),
    Real(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Array(Rc<RefCell<Vec<Slot>>>),
    Record(Rc<RefCell<Vec<Slot>>>),
    Args(Vec<Value>),
}

impl Slot {
    fn to_value(&self) -> Value {
        match self {
            Slot::Int(value) => Value::Integer(*value),
            Slot::Real(value) => Value::Real(*value),
            Slot::Bool(value) => Value::Boolean(*value),
            Slot::Char(value) => Value::Char(*value),
            Slot::Str(value) => Value::Str(value.clone()),
            Slot::Array(values) => Value::Array(values.borrow().iter().map(Slot::to_value).collect()),
            Slot::Record(values) => {
                Value::Record(values.borrow().iter().map(Slot::to_value).collect())
            }
            Slot::Args(values) => Value::Array(values.clone()),
        }
    }

    fn deep_copy(&self) -> Slot {
        match self {
            Slot::Array(values) => Slot::Array(Rc::new(RefCell::new(
                values.borrow().iter().map(Slot::deep_copy).collect(),
            ))),
            Slot::Record(values) => Slot::Record(Rc::new(RefCell::new(
                values.borrow().iter().map(Slot::deep_copy).collect(),
            ))),
            other => other.clone(),
        }
    }

    fn ordinal(&self) -> Option<i64> {
        match self {
            Slot::Int(value) => Some(*value as i64),
            Slot::Bool(value) => Some(*value as i64),
            Slot::Char(value) => Some(*value as i64),
            _ => None,
        }
    }
}

pub struct Machine<'p, 'io> {
    program: &'p CompiledProgram,
    globals: HashMap<String, Slot>,
    reader: TokenReader<'io>,
    output: &'io mut dyn Write,
}

fn fault(message: impl Into<String>, line: u32) -> Error {
    Error::internal(message, line)
}

impl<'p, 'io> Machine<'p, 'io> {
    pub fn new(
        program: &'p CompiledProgram,
        input: &'io mut dyn BufRead,
        output: &'io mut dyn Write,
    ) -> Self {
        Machine {
            program,
            globals: HashMap::new(),
            reader: TokenReader::new(input),
            output,
        }
    }

    /// Runs the program body. Runtime errors are reported on the output
    /// the same way the interpreter reports them.
    pub fn run(mut self) -> Result<(), Error> {
        let program = self.program;
        match self.execute(&program.main, vec![]) {
            Ok(_) => Ok(()),
            Err(error) if error.is_runtime() => {
                writeln!(
                    self.output,
                    "RUNTIME ERROR at line {}: {}",
                    error.get_line(),
                    error.get_impl()
                )?;
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    fn default_slot(&self, ty: &ValueType, line: u32) -> Result<Slot, Error> {
        Ok(match ty {
            ValueType::Int => Slot::Int(0),
            ValueType::Real => Slot::Real(0.0),
            ValueType::Bool => Slot::Bool(false),
            ValueType::Char => Slot::Char(' '),
            ValueType::Str => Slot::Str(String::new()),
            ValueType::Array { element, count, .. } => {
                let mut values = Vec::with_capacity(*count);
                for _ in 0..*count {
                    values.push(self.default_slot(element, line)?);
                }
                Slot::Array(Rc::new(RefCell::new(values)))
            }
            ValueType::Record(class) => {
                let layout = self
                    .program
                    .record(class)
                    .ok_or_else(|| fault(format!("unknown record {}", class), line))?;
                let mut values = Vec::with_capacity(layout.fields.len());
                for (_, ty) in &layout.fields {
                    values.push(self.default_slot(ty, line)?);
                }
                Slot::Record(Rc::new(RefCell::new(values)))
            }
        })
    }

    fn field_index(&self, class: &str, field: &str, line: u32) -> Result<usize, Error> {
        self.program
            .record(class)
            .and_then(|layout| layout.fields.iter().position(|(name, _)| name == field))
            .ok_or_else(|| fault(format!("unknown field {}.{}", class, field), line))
    }

    fn execute(&mut self, routine: &CompiledRoutine, args: Vec<Slot>) -> Result<Option<Slot>, Error> {
        let labels: HashMap<Label, usize> = routine
            .code
            .iter()
            .enumerate()
            .filter_map(|(position, instruction)| match instruction {
                Instruction::Label(label) => Some((*label, position)),
                _ => None,
            })
            .collect();
        let jump = |label: &Label, line: u32| {
            labels
                .get(label)
                .copied()
                .ok_or_else(|| fault(format!("unplaced label {}", label), line))
        };

        let mut locals: Vec<Slot> = vec![Slot::Int(0); routine.locals.max(args.len())];
        for (slot, arg) in args.into_iter().enumerate() {
            locals[slot] = arg;
        }
        let mut stack: Vec<Slot> = Vec::with_capacity(routine.max_stack);
        let mut line = 0;
        let mut pc = 0;

        macro_rules! pop {
            () => {
                stack
                    .pop()
                    .ok_or_else(|| fault("operand stack underflow", line))?
            };
        }

        while pc < routine.code.len() {
            let instruction = &routine.code[pc];
            pc += 1;

            match instruction {
                Instruction::Label(_) => {}
                Instruction::Line(number) => line = *number,
                Instruction::PushInt(value) => stack.push(Slot::Int(*value)),
                Instruction::PushReal(value) => stack.push(Slot::Real(*value)),
                Instruction::PushBool(value) => stack.push(Slot::Bool(*value)),
                Instruction::PushChar(value) => stack.push(Slot::Char(*value)),
                Instruction::PushStr(value) => stack.push(Slot::Str(value.clone())),
                Instruction::LoadLocal { slot, .. } => stack.push(locals[*slot].clone()),
                Instruction::StoreLocal { slot, .. } => locals[*slot] = pop!(),
                Instruction::LoadGlobal { name, .. } => {
                    let value = self
                        .globals
                        .get(name)
                        .cloned()
                        .ok_or_else(|| fault(format!("uninitialized global {}", name), line))?;
                    stack.push(value);
                }
                Instruction::StoreGlobal { name, .. } => {
                    let value = pop!();
                    self.globals.insert(name.clone(), value);
                }
                Instruction::NewDefault(ty) => stack.push(self.default_slot(ty, line)?),
                Instruction::DeepCopy => {
                    let value = pop!();
                    stack.push(value.deep_copy());
                }
                Instruction::ArrayLoad(_) => {
                    let index = pop!();
                    let Slot::Array(values) = pop!() else {
                        return Err(fault("array_load on a non-array", line));
                    };
                    let index = index.ordinal().unwrap_or(-1);
                    let value = values
                        .borrow()
                        .get(index as usize)
                        .cloned()
                        .ok_or_else(|| fault(format!("index {} out of bounds", index), line))?;
                    stack.push(value);
                }
                Instruction::ArrayStore(_) => {
                    let value = pop!();
                    let index = pop!().ordinal().unwrap_or(-1);
                    let Slot::Array(values) = pop!() else {
                        return Err(fault("array_store on a non-array", line));
                    };
                    let mut values = values.borrow_mut();
                    let target = values
                        .get_mut(index as usize)
                        .ok_or_else(|| fault(format!("index {} out of bounds", index), line))?;
                    *target = value;
                }
                Instruction::GetField { class, field, .. } => {
                    let position = self.field_index(class, field, line)?;
                    let Slot::Record(values) = pop!() else {
                        return Err(fault("get_field on a non-record", line));
                    };
                    let value = values.borrow()[position].clone();
                    stack.push(value);
                }
                Instruction::PutField { class, field, .. } => {
                    let position = self.field_index(class, field, line)?;
                    let value = pop!();
                    let Slot::Record(values) = pop!() else {
                        return Err(fault("put_field on a non-record", line));
                    };
                    values.borrow_mut()[position] = value;
                }
                Instruction::Arith { op, kind } => {
                    let right = pop!();
                    let left = pop!();
                    stack.push(arith(*op, *kind, &left, &right, line)?);
                }
                Instruction::Neg(_) => match pop!() {
                    Slot::Int(value) => stack.push(Slot::Int(value.wrapping_neg())),
                    Slot::Real(value) => stack.push(Slot::Real(-value)),
                    other => return Err(fault(format!("neg on {:?}", other), line)),
                },
                Instruction::Not => match pop!() {
                    Slot::Bool(value) => stack.push(Slot::Bool(!value)),
                    other => return Err(fault(format!("not on {:?}", other), line)),
                },
                Instruction::And | Instruction::Or => {
                    let (Slot::Bool(right), Slot::Bool(left)) = (pop!(), pop!()) else {
                        return Err(fault("logic on non-booleans", line));
                    };
                    let value = if *instruction == Instruction::And {
                        left && right
                    } else {
                        left || right
                    };
                    stack.push(Slot::Bool(value));
                }
                Instruction::IntToReal => match pop!() {
                    Slot::Int(value) => stack.push(Slot::Real(value as f64)),
                    other => return Err(fault(format!("int_to_real on {:?}", other), line)),
                },
                Instruction::Ordinal => {
                    let value = pop!();
                    let ordinal = value
                        .ordinal()
                        .ok_or_else(|| fault(format!("ordinal of {:?}", value), line))?;
                    stack.push(Slot::Int(ordinal as i32));
                }
                Instruction::FromOrdinal(ty) => {
                    let ordinal = pop!()
                        .ordinal()
                        .ok_or_else(|| fault("from_ordinal on a non-ordinal", line))?;
                    stack.push(match ty {
                        ValueType::Char => Slot::Char(
                            char::from_u32(ordinal as u32)
                                .ok_or_else(|| fault("invalid char ordinal", line))?,
                        ),
                        ValueType::Bool => Slot::Bool(ordinal != 0),
                        _ => Slot::Int(ordinal as i32),
                    });
                }
                Instruction::HashString => match pop!() {
                    Slot::Str(value) => stack.push(Slot::Int(string_key(&value) as i32)),
                    Slot::Char(value) => {
                        stack.push(Slot::Int(string_key(&value.to_string()) as i32))
                    }
                    other => return Err(fault(format!("hash_string on {:?}", other), line)),
                },
                Instruction::Compare { op, .. } => {
                    let right = pop!();
                    let left = pop!();
                    stack.push(Slot::Bool(op.holds(compare(&left, &right, line)?)));
                }
                Instruction::Goto(label) => pc = jump(label, line)?,
                Instruction::JumpIfFalse(label) | Instruction::JumpIfTrue(label) => {
                    let Slot::Bool(condition) = pop!() else {
                        return Err(fault("conditional jump on a non-boolean", line));
                    };
                    let wanted = matches!(instruction, Instruction::JumpIfTrue(_));
                    if condition == wanted {
                        pc = jump(label, line)?;
                    }
                }
                Instruction::IfCmp { op, target, .. } => {
                    let right = pop!();
                    let left = pop!();
                    if op.holds(compare(&left, &right, line)?) {
                        pc = jump(target, line)?;
                    }
                }
                Instruction::LookupSwitch { keys, default } => {
                    let key = match pop!() {
                        Slot::Int(value) => value as i64,
                        other => other
                            .ordinal()
                            .ok_or_else(|| fault("lookupswitch on a non-ordinal", line))?,
                    };
                    let target = keys
                        .iter()
                        .find(|(candidate, _)| *candidate as i32 as i64 == key)
                        .map_or(default, |(_, label)| label);
                    pc = jump(target, line)?;
                }
                Instruction::Call { routine: name, signature } => {
                    let program = self.program;
                    let callee = program
                        .routine(name)
                        .ok_or_else(|| fault(format!("unknown routine {}", name), line))?;
                    let mut args = Vec::with_capacity(signature.params.len());
                    for _ in 0..signature.params.len() {
                        args.push(pop!());
                    }
                    args.reverse();
                    if let Some(result) = self.execute(callee, args)? {
                        stack.push(result);
                    }
                }
                Instruction::CallExternal(external) => match external {
                    External::Printf => {
                        let Slot::Args(values) = pop!() else {
                            return Err(fault("printf without an argument list", line));
                        };
                        let Slot::Str(format) = pop!() else {
                            return Err(fault("printf without a format", line));
                        };
                        let text = render(&format, &values)?;
                        self.output.write_all(text.as_bytes())?;
                    }
                    External::ReadInt => stack.push(Slot::Int(self.reader.read_integer(line)?)),
                    External::ReadReal => stack.push(Slot::Real(self.reader.read_real(line)?)),
                    External::ReadBool => stack.push(Slot::Bool(self.reader.read_boolean(line)?)),
                    External::ReadChar => stack.push(Slot::Char(self.reader.read_char(line)?)),
                    External::ReadStr => stack.push(Slot::Str(self.reader.read_string(line)?)),
                    External::SkipLine => self.reader.skip_line(line)?,
                },
                Instruction::NewArgList(count) => stack.push(Slot::Args(Vec::with_capacity(*count))),
                Instruction::AppendArg(_) => {
                    let value = pop!();
                    let Slot::Args(mut values) = pop!() else {
                        return Err(fault("append_arg without an argument list", line));
                    };
                    values.push(value.to_value());
                    stack.push(Slot::Args(values));
                }
                Instruction::Return { value } => {
                    return Ok(if *value { Some(pop!()) } else { None });
                }
            }
        }

        Err(fault(format!("{} fell off its end", routine.name), line))
    }
}

fn arith(op: ArithOp, kind: NumKind, left: &Slot, right: &Slot, line: u32) -> Result<Slot, Error> {
    match (kind, left, right) {
        (NumKind::Int, Slot::Int(a), Slot::Int(b)) => Ok(Slot::Int(match op {
            ArithOp::Add => a.wrapping_add(*b),
            ArithOp::Sub => a.wrapping_sub(*b),
            ArithOp::Mul => a.wrapping_mul(*b),
            ArithOp::Div | ArithOp::Rem if *b == 0 => {
                return Err(Error::new(ErrorImpl::DivisionByZero, line))
            }
            ArithOp::Div => a.wrapping_div(*b),
            ArithOp::Rem => a.wrapping_rem(*b),
        })),
        (NumKind::Real, Slot::Real(a), Slot::Real(b)) => Ok(Slot::Real(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div if *b == 0.0 => return Err(Error::new(ErrorImpl::DivisionByZero, line)),
            ArithOp::Div => a / b,
            ArithOp::Rem => a % b,
        })),
        _ => Err(fault(
            format!("{:?} {:?} on {:?} and {:?}", op, kind, left, right),
            line,
        )),
    }
}

fn compare(left: &Slot, right: &Slot, line: u32) -> Result<std::cmp::Ordering, Error> {
    let ordering = match (left, right) {
        (Slot::Real(a), Slot::Real(b)) => a.partial_cmp(b),
        (Slot::Str(a), Slot::Str(b)) => Some(a.cmp(b)),
        (a, b) => match (a.ordinal(), b.ordinal()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        },
    };
    ordering.ok_or_else(|| fault(format!("cannot compare {:?} and {:?}", left, right), line))
}

pub fn analyze_source(source: &str) -> Analysis {
    let tokens = tokenize(source.to_string()).expect("tokenize");
    let tree = parse(tokens).expect("parse");
    analyze(tree)
}

pub fn analyze_clean(source: &str) -> Analysis {
    let analysis = analyze_source(source);
    assert!(!analysis.has_errors(), "unexpected errors: {:?}", analysis.errors);
    analysis
}

/// Output of the interpreter on `input`.
pub fn interpret(source: &str, input: &str) -> String {
    let mut analysis = analyze_clean(source);
    let mut input = input.as_bytes();
    let mut output = Vec::new();
    let _ = Interpreter::new(&mut input, &mut output).run(&mut analysis);
    String::from_utf8(output).expect("utf-8 output")
}

/// Output of the compiled program on the reference machine.
pub fn run_compiled(source: &str, input: &str) -> String {
    let analysis = analyze_clean(source);
    let program = compile(&analysis).expect("compile");
    let mut input = input.as_bytes();
    let mut output = Vec::new();
    let _ = Machine::new(&program, &mut input, &mut output).run();
    String::from_utf8(output).expect("utf-8 output")
}
