use super::addr::{CodeAddress, DataAddress};
use super::instruction::Instruction;
use super::num::Number;

/// An immutable compiled program: instructions plus a deduplicated
/// constant pool. Function bodies additionally record how many stack
/// entries the caller must have pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Vec<Instruction>,
    data: Vec<Number>,
    arity: usize,
}

impl Program {
    pub fn new(code: Vec<Instruction>, data: Vec<Number>, arity: usize) -> Program {
        Program { code, data, arity }
    }

    pub fn instruction(&self, pc: CodeAddress) -> Option<Instruction> {
        self.code.get(pc.0 as usize).copied()
    }

    pub fn datum(&self, addr: DataAddress) -> Option<Number> {
        self.data.get(addr.0 as usize).copied()
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[cfg(test)]
    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    #[cfg(test)]
    pub fn data(&self) -> &[Number] {
        &self.data
    }
}

impl std::fmt::Display for Program {
    /// Assembly-style listing, one instruction per line.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (pc, instruction) in self.code.iter().enumerate() {
            writeln!(f, "{:04} {}", pc, instruction)?;
        }
        for (slot, datum) in self.data.iter().enumerate() {
            writeln!(f, "D{} = {}", slot, datum)?;
        }
        Ok(())
    }
}
