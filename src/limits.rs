//! Hard limits on script shape and execution. Scripts come from end
//! users, so every dimension that could grow without bound has a cap
//! checked at compile time or enforced by the machine.

/// Parameters accepted by the bracketed header.
pub const MAX_PARAMETERS: usize = 8;

/// Combined variable slot capacity, parameters included.
pub const MAX_DECLARATIONS: usize = 64;

/// Characters in one identifier.
pub const MAX_IDENT_LEN: usize = 32;

/// Characters in one numeric literal.
pub const MAX_NUMBER_LEN: usize = 24;

/// Largest sample grid a distribution callback may request.
pub const LUT_POINTS_CAPACITY: usize = 257;

/// Nested function calls before execution aborts.
pub const MAX_CALL_DEPTH: usize = 64;

/// Operand stack entries, arguments included.
pub const MAX_OPERAND_STACK: usize = 256;

/// Instructions one callback execution may retire, shared by every
/// nested call. A fresh budget is issued per declaration program, per
/// sample, and per distribution pass.
pub const INSTRUCTION_BUDGET: usize = 1_000_000;
