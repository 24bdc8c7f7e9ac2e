//! Instruction buffer with operand stack accounting.

use rustc_hash::FxHashMap;

use crate::errors::errors::Error;

use super::instruction::{Instruction, Label};

/// Collects the code of one routine and tracks the operand stack depth.
///
/// The depth expected at every label is recorded by the first jump to it or
/// by its placement, and every later path into the label must agree.
#[derive(Debug, Default)]
pub struct Emitter {
    code: Vec<Instruction>,
    depth: usize,
    max_depth: usize,
    reachable: bool,
    label_depths: FxHashMap<Label, usize>,
    line: u32,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            reachable: true,
            ..Default::default()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn emit(&mut self, instruction: Instruction) -> Result<(), Error> {
        if let Instruction::Label(label) = instruction {
            return self.place(label);
        }
        if let Instruction::Line(line) = instruction {
            self.line = line;
        }

        if self.reachable {
            let (pops, pushes) = instruction.stack_effect();
            if self.depth < pops {
                return Err(Error::internal(
                    format!(
                        "operand stack underflow at `{}`: {} values needed, {} present",
                        instruction.to_string().trim(),
                        pops,
                        self.depth
                    ),
                    self.line,
                ));
            }
            self.depth = self.depth - pops + pushes;
            self.max_depth = self.max_depth.max(self.depth);

            for target in instruction.targets() {
                self.merge(target)?;
            }
            if instruction.is_terminator() {
                self.reachable = false;
            }
        }

        self.code.push(instruction);
        Ok(())
    }

    /// Places `label` at the current position.
    pub fn place(&mut self, label: Label) -> Result<(), Error> {
        if self.reachable {
            self.merge(label)?;
        } else {
            self.depth = self.label_depths.get(&label).copied().unwrap_or(0);
            self.reachable = true;
        }

        tracing::trace!(%label, depth = self.depth, "placed label");
        self.code.push(Instruction::Label(label));
        Ok(())
    }

    fn merge(&mut self, label: Label) -> Result<(), Error> {
        match self.label_depths.get(&label) {
            Some(expected) if *expected != self.depth => Err(Error::internal(
                format!(
                    "stack depth mismatch at {}: expected {}, found {}",
                    label, expected, self.depth
                ),
                self.line,
            )),
            Some(_) => Ok(()),
            None => {
                self.label_depths.insert(label, self.depth);
                Ok(())
            }
        }
    }

    /// Code and maximum stack depth. The stack must be empty at the end.
    pub fn finish(self) -> Result<(Vec<Instruction>, usize), Error> {
        if self.reachable && self.depth != 0 {
            return Err(Error::internal(
                format!("{} values left on the operand stack", self.depth),
                self.line,
            ));
        }
        Ok((self.code, self.max_depth))
    }
}
