//! Address newtypes. Keeping the spaces distinct at the type level means
//! an instruction can never confuse a constant-pool slot with a heap
//! slot or a code offset.

/// Which heap a memory access targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Snapshotted and rolled back between samples.
    Persistent,
    /// Scratch storage outside the rollback contract.
    Impersistent,
}

/// A slot in one of the two variable heaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAddress {
    pub space: Space,
    pub index: u8,
}

impl MemoryAddress {
    pub fn persistent(index: u8) -> MemoryAddress {
        MemoryAddress {
            space: Space::Persistent,
            index,
        }
    }

    pub fn impersistent(index: u8) -> MemoryAddress {
        MemoryAddress {
            space: Space::Impersistent,
            index,
        }
    }
}

/// A slot in a program's constant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataAddress(pub u16);

/// An instruction offset within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeAddress(pub u32);

impl CodeAddress {
    pub fn next(self) -> CodeAddress {
        CodeAddress(self.0 + 1)
    }
}

/// A frame-relative operand stack slot, used for function arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackAddress(pub u8);

/// Index into the compiled function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionIndex(pub u16);

impl std::fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.space {
            Space::Persistent => write!(f, "P{}", self.index),
            Space::Impersistent => write!(f, "I{}", self.index),
        }
    }
}

impl std::fmt::Display for DataAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "D{}", self.0)
    }
}

impl std::fmt::Display for CodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl std::fmt::Display for StackAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl std::fmt::Display for FunctionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}
