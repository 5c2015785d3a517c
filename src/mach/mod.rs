//! The machine: bytecode definitions, the emitter that lowers parsed
//! scripts, and the stack interpreter with its dual-heap state model.

mod addr;
mod emit;
mod heap;
mod instruction;
mod interpreter;
mod num;
mod program;

pub use addr::{CodeAddress, DataAddress, FunctionIndex, MemoryAddress, Space, StackAddress};
pub use emit::{emit, Compiled};
pub use instruction::Instruction;
pub use interpreter::Interpreter;
pub use num::Number;
pub use program::Program;
