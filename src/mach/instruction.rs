use super::addr::{CodeAddress, DataAddress, FunctionIndex, MemoryAddress, StackAddress};
use crate::lang::MathFn;

/// One machine instruction. Every opcode operates on the shared operand
/// stack; the only immediates are addresses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Normal end of a program or function body.
    End,
    /// Early exit requested by `ret;`.
    Return,

    /// Push a constant-pool entry.
    LoadNumber(DataAddress),
    /// Push a heap slot.
    Load(MemoryAddress),
    /// Pop into a heap slot.
    Store(MemoryAddress),
    /// Push the input register.
    LoadIn,
    /// Pop into the input register.
    StoreIn,
    /// Push the output register.
    LoadOut,
    /// Pop into the output register.
    StoreOut,
    /// Push a frame-relative stack slot.
    LoadStack(StackAddress),
    /// Pop into a frame-relative stack slot.
    StoreStack(StackAddress),

    /// Pop; jump when zero.
    Jz(CodeAddress),
    /// Unconditional jump.
    Jmp(CodeAddress),
    /// Invoke a compiled function; its arguments are already on the
    /// stack and become the new frame.
    Call(FunctionIndex),

    /// Exchange the top two stack entries.
    Swap,

    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Neg,

    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
    Not,

    Abs,
    Sign,
    Sqrt,
    Cbrt,
    Exp,
    Exp2,
    Log,
    Log2,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Ceil,
    Floor,
    Round,
    Trunc,
    Atan2,
    LogB,
    ScaleB,
    Min,
    Max,
    MinMag,
    MaxMag,
    CopySign,
    Fma,
    Clamp,
}

impl From<MathFn> for Instruction {
    fn from(f: MathFn) -> Instruction {
        match f {
            MathFn::Abs => Instruction::Abs,
            MathFn::Sign => Instruction::Sign,
            MathFn::Sqrt => Instruction::Sqrt,
            MathFn::Cbrt => Instruction::Cbrt,
            MathFn::Exp => Instruction::Exp,
            MathFn::Exp2 => Instruction::Exp2,
            MathFn::Log => Instruction::Log,
            MathFn::Log2 => Instruction::Log2,
            MathFn::Log10 => Instruction::Log10,
            MathFn::Sin => Instruction::Sin,
            MathFn::Cos => Instruction::Cos,
            MathFn::Tan => Instruction::Tan,
            MathFn::Asin => Instruction::Asin,
            MathFn::Acos => Instruction::Acos,
            MathFn::Atan => Instruction::Atan,
            MathFn::Sinh => Instruction::Sinh,
            MathFn::Cosh => Instruction::Cosh,
            MathFn::Tanh => Instruction::Tanh,
            MathFn::Asinh => Instruction::Asinh,
            MathFn::Acosh => Instruction::Acosh,
            MathFn::Atanh => Instruction::Atanh,
            MathFn::Ceil => Instruction::Ceil,
            MathFn::Floor => Instruction::Floor,
            MathFn::Round => Instruction::Round,
            MathFn::Trunc => Instruction::Trunc,
            MathFn::Atan2 => Instruction::Atan2,
            // `pow(a, b)` and `a ^ b` share an opcode.
            MathFn::Pow => Instruction::Pow,
            MathFn::LogB => Instruction::LogB,
            MathFn::ScaleB => Instruction::ScaleB,
            MathFn::Min => Instruction::Min,
            MathFn::Max => Instruction::Max,
            MathFn::MinMag => Instruction::MinMag,
            MathFn::MaxMag => Instruction::MaxMag,
            MathFn::CopySign => Instruction::CopySign,
            MathFn::Fma => Instruction::Fma,
            MathFn::Clamp => Instruction::Clamp,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Instruction::*;
        match self {
            End => write!(f, "END"),
            Return => write!(f, "RETURN"),
            LoadNumber(a) => write!(f, "LOADNUM {}", a),
            Load(a) => write!(f, "LOAD {}", a),
            Store(a) => write!(f, "STORE {}", a),
            LoadIn => write!(f, "LOADIN"),
            StoreIn => write!(f, "STOREIN"),
            LoadOut => write!(f, "LOADOUT"),
            StoreOut => write!(f, "STOREOUT"),
            LoadStack(a) => write!(f, "LOADSTK {}", a),
            StoreStack(a) => write!(f, "STORESTK {}", a),
            Jz(a) => write!(f, "JZ {}", a),
            Jmp(a) => write!(f, "JMP {}", a),
            Call(a) => write!(f, "CALL {}", a),
            Swap => write!(f, "SWAP"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            Rem => write!(f, "REM"),
            Pow => write!(f, "POW"),
            Neg => write!(f, "NEG"),
            Lt => write!(f, "LT"),
            LtEq => write!(f, "LE"),
            Gt => write!(f, "GT"),
            GtEq => write!(f, "GE"),
            Eq => write!(f, "EQ"),
            NotEq => write!(f, "NE"),
            And => write!(f, "AND"),
            Or => write!(f, "OR"),
            Not => write!(f, "NOT"),
            Abs => write!(f, "ABS"),
            Sign => write!(f, "SIGN"),
            Sqrt => write!(f, "SQRT"),
            Cbrt => write!(f, "CBRT"),
            Exp => write!(f, "EXP"),
            Exp2 => write!(f, "EXP2"),
            Log => write!(f, "LOG"),
            Log2 => write!(f, "LOG2"),
            Log10 => write!(f, "LOG10"),
            Sin => write!(f, "SIN"),
            Cos => write!(f, "COS"),
            Tan => write!(f, "TAN"),
            Asin => write!(f, "ASIN"),
            Acos => write!(f, "ACOS"),
            Atan => write!(f, "ATAN"),
            Sinh => write!(f, "SINH"),
            Cosh => write!(f, "COSH"),
            Tanh => write!(f, "TANH"),
            Asinh => write!(f, "ASINH"),
            Acosh => write!(f, "ACOSH"),
            Atanh => write!(f, "ATANH"),
            Ceil => write!(f, "CEIL"),
            Floor => write!(f, "FLOOR"),
            Round => write!(f, "ROUND"),
            Trunc => write!(f, "TRUNC"),
            Atan2 => write!(f, "ATAN2"),
            LogB => write!(f, "LOGB"),
            ScaleB => write!(f, "SCALB"),
            Min => write!(f, "MIN"),
            Max => write!(f, "MAX"),
            MinMag => write!(f, "MINMAG"),
            MaxMag => write!(f, "MAXMAG"),
            CopySign => write!(f, "COPYSIGN"),
            Fma => write!(f, "FMA"),
            Clamp => write!(f, "CLAMP"),
        }
    }
}
