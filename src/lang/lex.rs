use super::token::{Symbol, SymbolTable, Token, TokenKind};
use crate::error::LexError;
use crate::limits;

type Result<T> = std::result::Result<T, LexError>;

/// Everything the lexer produces from one script: the free-text
/// description, the token stream, and the identifier side table.
#[derive(Debug)]
pub struct Lexed {
    pub description: String,
    pub tokens: Vec<Token>,
    pub symbols: SymbolTable,
}

/// Single-use tokenizer. Everything before the parameter-header `[` is
/// the script description; the rest is scanned character by character.
/// Lexing is all-or-nothing: the first malformed input aborts with a
/// line-numbered error.
pub fn tokenize(source: &str) -> Result<Lexed> {
    let header = source.find('[').ok_or(LexError::MissingParameterSection)?;
    let description = source[..header].trim().to_string();
    let line = 1 + source[..header].chars().filter(|c| *c == '\n').count() as u32;
    let mut lexer = Lexer {
        chars: source[header..].chars().peekable(),
        line,
        tokens: vec![],
        symbols: SymbolTable::new(),
    };
    lexer.run()?;
    Ok(Lexed {
        description,
        tokens: lexer.tokens,
        symbols: lexer.symbols,
    })
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    tokens: Vec<Token>,
    symbols: SymbolTable,
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.line));
    }

    fn run(&mut self) -> Result<()> {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' || c == ' ' || c == '\t' || c == '\r' {
                self.bump();
            } else if c == '#' {
                self.comment();
            } else if is_ident_start(c) {
                self.identifier()?;
            } else if c.is_ascii_digit() || c == '.' {
                self.number()?;
            } else {
                self.special(c)?;
            }
        }
        Ok(())
    }

    /// Discard the rest of the line.
    fn comment(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn identifier(&mut self) -> Result<()> {
        let mut s = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if !is_ident_part(c) {
                break;
            }
            s.push(c);
            self.bump();
        }
        if s.chars().count() > limits::MAX_IDENT_LEN {
            return Err(LexError::IdentTooLong { line: self.line });
        }
        let kind = match TokenKind::from_word(&s) {
            Some(kind) => kind,
            None => TokenKind::Ident(self.intern(&s)),
        };
        self.push(kind);
        Ok(())
    }

    /// Underscores display as spaces in parameter names; the side table
    /// stores the normalized spelling.
    fn intern(&mut self, raw: &str) -> Symbol {
        if raw.contains('_') {
            self.symbols.intern(&raw.replace('_', " "))
        } else {
            self.symbols.intern(raw)
        }
    }

    fn number(&mut self) -> Result<()> {
        let mut s = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii_digit() && c != '.' {
                break;
            }
            s.push(c);
            self.bump();
        }
        if s.chars().count() > limits::MAX_NUMBER_LEN {
            return Err(LexError::NumberTooLong { line: self.line });
        }
        match s.parse::<f64>() {
            Ok(n) if s.matches('.').count() <= 1 => {
                self.push(TokenKind::Number(n));
                Ok(())
            }
            _ => Err(LexError::MalformedNumber {
                line: self.line,
                text: s,
            }),
        }
    }

    /// Punctuation and operators. Two-character operators are recognized
    /// by buffering the first character and checking whether `=` follows.
    fn special(&mut self, c: char) -> Result<()> {
        use super::token::Op::*;
        use TokenKind::*;
        self.bump();
        let kind = match c {
            '[' => LBracket,
            ']' => RBracket,
            '{' => LBrace,
            '}' => RBrace,
            '(' => LParen,
            ')' => RParen,
            ';' => Semicolon,
            ',' => Comma,
            '=' => Op(Eq),
            '&' => Op(And),
            '|' => Op(Or),
            ':' => {
                if self.eat_equals() {
                    Op(Assign)
                } else {
                    return Err(LexError::UnsupportedChar {
                        line: self.line,
                        ch: c,
                    });
                }
            }
            '+' => self.one_or_two(Add, AddAssign),
            '-' => self.one_or_two(Sub, SubAssign),
            '*' => self.one_or_two(Mul, MulAssign),
            '/' => self.one_or_two(Div, DivAssign),
            '%' => self.one_or_two(Rem, RemAssign),
            '^' => self.one_or_two(Pow, PowAssign),
            '<' => self.one_or_two(Lt, LtEq),
            '>' => self.one_or_two(Gt, GtEq),
            '!' => self.one_or_two(Not, NotEq),
            _ => {
                return Err(LexError::UnsupportedChar {
                    line: self.line,
                    ch: c,
                })
            }
        };
        self.push(kind);
        Ok(())
    }

    fn one_or_two(&mut self, single: super::token::Op, with_equals: super::token::Op) -> TokenKind {
        if self.eat_equals() {
            TokenKind::Op(with_equals)
        } else {
            TokenKind::Op(single)
        }
    }

    fn eat_equals(&mut self) -> bool {
        if self.chars.peek() == Some(&'=') {
            self.bump();
            return true;
        }
        false
    }
}
