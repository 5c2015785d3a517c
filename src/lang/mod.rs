//! Source-language front end: lexing, token classification, and the
//! section parser that turns a script into postfix expression sequences
//! ready for bytecode emission.

mod ast;
mod lex;
mod param;
mod parse;
mod token;

pub use ast::{Declaration, Distribution, IdentClass, Parsed, Statement};
pub use lex::{tokenize, Lexed};
pub use param::{Bound, Parameter, ParameterKind};
pub use parse::parse;
pub use token::{MathFn, Op, Symbol, SymbolTable, Token, TokenKind, Word};
