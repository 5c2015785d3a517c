//! Error types for each stage of the pipeline, rolled up into
//! [`ScriptError`] at the public surface. Compile-stage errors carry the
//! 1-based source line they were detected on.

use thiserror::Error;

/// Anything that can go wrong loading or running a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Interpret(#[from] InterpreterError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no parameter named {0:?}")]
    UnknownParameter(String),
    #[error("value {value} violates the bounds of parameter {name:?}")]
    SettingOutOfBounds { name: String, value: f64 },
    #[error("script has no distribution callback")]
    MissingDistribution,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("line {line}: unsupported character {ch:?}")]
    UnsupportedChar { line: u32, ch: char },
    #[error("line {line}: identifier too long")]
    IdentTooLong { line: u32 },
    #[error("line {line}: number too long")]
    NumberTooLong { line: u32 },
    #[error("line {line}: malformed number {text:?}")]
    MalformedNumber { line: u32, text: String },
    #[error("script has no parameter section")]
    MissingParameterSection,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: u32,
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of script, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("line {line}: {name:?} has not been declared")]
    Undeclared { line: u32, name: String },
    #[error("line {line}: {name:?} is already declared")]
    Redeclared { line: u32, name: String },
    #[error("line {line}: {name:?} cannot be assigned")]
    AssignImmutable { line: u32, name: String },
    #[error("line {line}: too many parameters")]
    TooManyParameters { line: u32 },
    #[error("line {line}: bounds of {name:?} contradict each other")]
    ContradictoryBounds { line: u32, name: String },
    #[error("line {line}: default of {name:?} violates its bounds")]
    DefaultOutOfBounds { line: u32, name: String },
    #[error("line {line}: logical parameter {name:?} cannot carry bounds")]
    LogicalBounds { line: u32, name: String },
    #[error("line {line}: bound group binds nothing")]
    EmptyBounds { line: u32 },
    #[error("line {line}: {name} takes {expected} argument(s)")]
    WrongArity {
        line: u32,
        name: String,
        expected: usize,
    },
    #[error("line {line}: unknown callback {name:?}")]
    UnknownCallback { line: u32, name: String },
    #[error("line {line}: distribution size out of range")]
    BadDistributionSize { line: u32 },
    #[error("line {line}: duplicate {name} callback")]
    DuplicateCallback { line: u32, name: &'static str },
    #[error("script has no calculation callback")]
    MissingCalculation,
}

/// Bytecode emission failures. Most of these indicate a bug upstream
/// rather than a user mistake; they are surfaced instead of panicking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    #[error("line {line}: no address for {name:?}")]
    Unresolved { line: u32, name: String },
    #[error("branch emitted without a matching patch")]
    UnmatchedBranch,
    #[error("line {line}: {token} is not valid in an expression")]
    InvalidToken { line: u32, token: String },
    #[error("line {line}: operator is missing an operand")]
    MissingOperand { line: u32 },
    #[error("script declares too many variables")]
    OutOfSlots,
    #[error("script uses too many distinct constants")]
    OutOfConstants,
    #[error("script declares too many functions")]
    OutOfFunctions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InterpreterError {
    #[error("call depth limit exceeded")]
    CallDepthExceeded,
    #[error("operand stack overflow")]
    StackOverflow,
    #[error("operand stack accessed out of frame")]
    BadStackPointer,
    #[error("reference outside allocated memory")]
    BadAddress,
    #[error("instruction budget exhausted")]
    BudgetExhausted,
    #[error("program left the operand stack unbalanced")]
    UnbalancedProgram,
}
