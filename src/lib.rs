//! A scripting engine for user-defined pointer acceleration response
//! curves.
//!
//! A script declares bounded parameters, optional variables and
//! functions, and a calculation callback mapping an input speed `x` to
//! an output gain `y`:
//!
//! ```text
//! Classic acceleration curve.
//!
//! [
//!     Accel := 0.005 (0};
//!     Cap := 15 [0};
//! ]
//!
//! {
//!     y += Accel * x;
//!     y := min(y, Cap);
//! }
//! ```
//!
//! Scripts are compiled to bytecode and run on a small stack machine:
//!
//! ```
//! use curvescript::Script;
//!
//! let mut script = Script::from_source("[Gain := 2 (0};] { y := Gain * x; }").unwrap();
//! assert_eq!(script.calculate(4.0).unwrap(), 8.0);
//! script.set_setting("Gain", 3.0).unwrap();
//! assert_eq!(script.calculate(4.0).unwrap(), 12.0);
//! ```
//!
//! Persistent state (`let`) is snapshotted at initialization and rolled
//! back after every sample, so a curve is a pure function of its input
//! no matter what the calculation scribbles on. Impersistent state
//! (`var`) opts out of the rollback for scripts that want to carry
//! state across a batch.

pub mod error;
pub mod lang;
pub mod limits;
pub mod mach;
mod script;

pub use error::{EmitError, InterpreterError, LexError, ParseError, ScriptError};
pub use lang::{Bound, Parameter, ParameterKind};
pub use script::Script;
