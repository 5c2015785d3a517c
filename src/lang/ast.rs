use super::param::Parameter;
use super::token::{Symbol, SymbolTable, Token};

/// A parsed statement. Expressions are kept as postfix token sequences;
/// the emitter maps them to instructions one token at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Target token, assignment operator token, initializer sequence.
    Assign(Token, Token, Vec<Token>),
    /// Condition, then-block, optional else-block.
    If(Vec<Token>, Vec<Statement>, Option<Vec<Statement>>),
    /// Condition, body.
    While(Vec<Token>, Vec<Statement>),
    /// `ret;` — terminates the enclosing program.
    Return,
}

/// How a declaration keyword classified its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentClass {
    Parameter,
    /// `const`: persistent, assigned once by its initializer program.
    Immutable,
    /// `let`: persistent, rolled back per sample.
    Persistent,
    /// `var`: impersistent, outside the rollback contract.
    Impersistent,
    Function { arity: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable {
        name: Symbol,
        line: u32,
        class: IdentClass,
        init: Vec<Token>,
    },
    Function {
        name: Symbol,
        line: u32,
        args: Vec<Symbol>,
        body: Vec<Statement>,
    },
}

/// An auxiliary callback generating a custom sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub points: usize,
    pub body: Vec<Statement>,
}

/// Output of a successful parse: everything the emitter needs to build
/// bytecode, in declaration order.
#[derive(Debug)]
pub struct Parsed {
    pub description: String,
    pub symbols: SymbolTable,
    pub parameters: Vec<Parameter>,
    pub declarations: Vec<Declaration>,
    pub calculation: Vec<Statement>,
    pub distribution: Option<Distribution>,
}
