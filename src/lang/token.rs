use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Index into the [`SymbolTable`] owned by the compilation context.
/// Tokens referencing variable-length text store one of these instead of
/// the text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

/// Side table of identifier spellings seen during lexing.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    names: Vec<String>,
    index: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.index.get(name) {
            return *sym;
        }
        let sym = Symbol(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), sym);
        sym
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.index.get(name).copied()
    }

    pub fn name(&self, sym: Symbol) -> &str {
        &self.names[sym.0 as usize]
    }
}

/// A lexed token and the 1-based source line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Token {
        Token { kind, line }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Numeric literal. Named constants `e`, `pi` and `tau` lex to this.
    Number(f64),
    /// `true` or `false`.
    Bool(bool),
    /// Identifier not yet classified by the parser.
    Ident(Symbol),
    /// Identifier classified as a parameter.
    Param(Symbol),
    /// Identifier classified as a `const` declaration.
    ImmutVar(Symbol),
    /// Identifier classified as a `let` declaration.
    PersistVar(Symbol),
    /// Identifier classified as a `var` declaration.
    ImpersistVar(Symbol),
    /// Identifier classified as a function argument of the enclosing body.
    Arg(Symbol),
    /// Identifier classified as a user function; in a postfix sequence the
    /// call arguments precede it.
    Func(Symbol),
    /// The input register `x`.
    In,
    /// The output register `y`.
    Out,
    Word(Word),
    Op(Op),
    MathFn(MathFn),
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semicolon,
    Comma,
}

impl TokenKind {
    /// Reserved word lookup. The table is built once and shared processwide.
    pub fn from_word(s: &str) -> Option<TokenKind> {
        static RESERVED: OnceLock<FxHashMap<&'static str, TokenKind>> = OnceLock::new();
        RESERVED.get_or_init(reserved_table).get(s).copied()
    }
}

fn reserved_table() -> FxHashMap<&'static str, TokenKind> {
    use std::f64::consts;
    let mut t = FxHashMap::default();
    t.insert("const", TokenKind::Word(Word::Const));
    t.insert("let", TokenKind::Word(Word::Let));
    t.insert("var", TokenKind::Word(Word::Var));
    t.insert("fn", TokenKind::Word(Word::Fn));
    t.insert("if", TokenKind::Word(Word::If));
    t.insert("else", TokenKind::Word(Word::Else));
    t.insert("while", TokenKind::Word(Word::While));
    t.insert("ret", TokenKind::Word(Word::Ret));
    t.insert("return", TokenKind::Word(Word::Ret));
    t.insert("true", TokenKind::Bool(true));
    t.insert("false", TokenKind::Bool(false));
    t.insert("x", TokenKind::In);
    t.insert("y", TokenKind::Out);
    t.insert("e", TokenKind::Number(consts::E));
    t.insert("pi", TokenKind::Number(consts::PI));
    t.insert("tau", TokenKind::Number(consts::TAU));
    for f in MathFn::ALL {
        t.insert(f.name(), TokenKind::MathFn(*f));
    }
    t
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Const,
    Let,
    Var,
    Fn,
    If,
    Else,
    While,
    Ret,
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        match self {
            Const => write!(f, "const"),
            Let => write!(f, "let"),
            Var => write!(f, "var"),
            Fn => write!(f, "fn"),
            If => write!(f, "if"),
            Else => write!(f, "else"),
            While => write!(f, "while"),
            Ret => write!(f, "ret"),
        }
    }
}

/// Operator categories: arithmetic, comparison, logical, assignment.
/// `Neg` is produced by the parser for `-` in prefix position; the lexer
/// only ever emits `Sub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
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
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    PowAssign,
}

/// Precedence of prefix `-` and `!`: tighter than every binary operator
/// except exponentiation, so `-x^2` parses as `-(x^2)`.
pub const UNARY_PRECEDENCE: usize = 6;

impl Op {
    /// Binding power for precedence climbing. Zero marks operators that
    /// are not binary.
    pub fn precedence(&self) -> usize {
        use Op::*;
        match self {
            Or => 1,
            And => 2,
            Lt | LtEq | Gt | GtEq | Eq | NotEq => 3,
            Add | Sub => 4,
            Mul | Div | Rem => 5,
            Pow => 7,
            Neg | Not | Assign | AddAssign | SubAssign | MulAssign | DivAssign | RemAssign
            | PowAssign => 0,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.precedence() > 0
    }

    /// Only exponentiation associates to the right.
    pub fn is_right_assoc(&self) -> bool {
        matches!(self, Op::Pow)
    }

    pub fn is_assign(&self) -> bool {
        self.compound_base().is_some() || matches!(self, Op::Assign)
    }

    /// The arithmetic operator a compound assignment desugars to.
    pub fn compound_base(&self) -> Option<Op> {
        use Op::*;
        match self {
            AddAssign => Some(Add),
            SubAssign => Some(Sub),
            MulAssign => Some(Mul),
            DivAssign => Some(Div),
            RemAssign => Some(Rem),
            PowAssign => Some(Pow),
            _ => None,
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Op::*;
        match self {
            Add => write!(f, "+"),
            Sub | Neg => write!(f, "-"),
            Mul => write!(f, "*"),
            Div => write!(f, "/"),
            Rem => write!(f, "%"),
            Pow => write!(f, "^"),
            Lt => write!(f, "<"),
            LtEq => write!(f, "<="),
            Gt => write!(f, ">"),
            GtEq => write!(f, ">="),
            Eq => write!(f, "="),
            NotEq => write!(f, "!="),
            And => write!(f, "&"),
            Or => write!(f, "|"),
            Not => write!(f, "!"),
            Assign => write!(f, ":="),
            AddAssign => write!(f, "+="),
            SubAssign => write!(f, "-="),
            MulAssign => write!(f, "*="),
            DivAssign => write!(f, "/="),
            RemAssign => write!(f, "%="),
            PowAssign => write!(f, "^="),
        }
    }
}

/// Built-in math intrinsics. Fixed arity, one instruction each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
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
    Pow,
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

impl MathFn {
    pub const ALL: &'static [MathFn] = {
        use MathFn::*;
        &[
            Abs, Sign, Sqrt, Cbrt, Exp, Exp2, Log, Log2, Log10, Sin, Cos, Tan, Asin, Acos, Atan,
            Sinh, Cosh, Tanh, Asinh, Acosh, Atanh, Ceil, Floor, Round, Trunc, Atan2, Pow, LogB,
            ScaleB, Min, Max, MinMag, MaxMag, CopySign, Fma, Clamp,
        ]
    };

    pub fn name(&self) -> &'static str {
        use MathFn::*;
        match self {
            Abs => "abs",
            Sign => "sign",
            Sqrt => "sqrt",
            Cbrt => "cbrt",
            Exp => "exp",
            Exp2 => "exp2",
            Log => "log",
            Log2 => "log2",
            Log10 => "log10",
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Sinh => "sinh",
            Cosh => "cosh",
            Tanh => "tanh",
            Asinh => "asinh",
            Acosh => "acosh",
            Atanh => "atanh",
            Ceil => "ceil",
            Floor => "floor",
            Round => "round",
            Trunc => "trunc",
            Atan2 => "atan2",
            Pow => "pow",
            LogB => "logb",
            ScaleB => "scalb",
            Min => "min",
            Max => "max",
            MinMag => "minmag",
            MaxMag => "maxmag",
            CopySign => "copysign",
            Fma => "fma",
            Clamp => "clamp",
        }
    }

    /// Operands popped from the stack.
    pub fn arity(&self) -> usize {
        use MathFn::*;
        match self {
            Abs | Sign | Sqrt | Cbrt | Exp | Exp2 | Log | Log2 | Log10 | Sin | Cos | Tan | Asin
            | Acos | Atan | Sinh | Cosh | Tanh | Asinh | Acosh | Atanh | Ceil | Floor | Round
            | Trunc => 1,
            Atan2 | Pow | LogB | ScaleB | Min | Max | MinMag | MaxMag | CopySign => 2,
            Fma | Clamp => 3,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenKind::*;
        match self {
            Number(n) => write!(f, "{}", n),
            Bool(b) => write!(f, "{}", b),
            Ident(_) | Param(_) | ImmutVar(_) | PersistVar(_) | ImpersistVar(_) | Arg(_)
            | Func(_) => write!(f, "identifier"),
            In => write!(f, "x"),
            Out => write!(f, "y"),
            Word(w) => write!(f, "{}", w),
            Op(o) => write!(f, "{}", o),
            MathFn(m) => write!(f, "{}", m.name()),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Semicolon => write!(f, ";"),
            Comma => write!(f, ","),
        }
    }
}
