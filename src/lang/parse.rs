use super::ast::{Declaration, Distribution, IdentClass, Parsed, Statement};
use super::lex::Lexed;
use super::param::{Bound, Parameter};
use super::token::{Op, Symbol, SymbolTable, Token, TokenKind, Word, UNARY_PRECEDENCE};
use crate::error::ParseError;
use crate::limits;
use rustc_hash::FxHashMap;

type Result<T> = std::result::Result<T, ParseError>;

/// Function arguments visible inside the body being parsed.
type Scope = FxHashMap<Symbol, usize>;

/// Parses the fixed script sections in strict order: parameter header,
/// top-level declarations, callback bodies. Every syntax violation aborts
/// with the offending token's line; there is no recovery.
pub fn parse(lexed: Lexed) -> Result<Parsed> {
    let mut parser = Parser {
        tokens: lexed.tokens,
        pos: 0,
        symbols: lexed.symbols,
        idents: FxHashMap::default(),
    };
    let parameters = parser.parameters()?;
    let declarations = parser.declarations()?;
    let (calculation, distribution) = parser.callbacks()?;
    Ok(Parsed {
        description: lexed.description,
        symbols: parser.symbols,
        parameters,
        declarations,
        calculation,
        distribution,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    symbols: SymbolTable,
    idents: FxHashMap<Symbol, IdentClass>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn line(&self) -> u32 {
        match self.peek() {
            Some(t) => t.line,
            None => self.tokens.last().map_or(1, |t| t.line),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(t) => ParseError::Unexpected {
                line: t.line,
                expected,
                found: self.describe(t),
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn describe(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Ident(sym) => format!("{:?}", self.symbols.name(sym)),
            kind => format!("{}", kind),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                let t = t.clone();
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Consumes an identifier that is neither reserved nor declared.
    fn fresh_ident(&mut self, what: &'static str) -> Result<(u32, Symbol)> {
        match self.peek() {
            Some(t) => {
                if let TokenKind::Ident(sym) = t.kind {
                    let line = t.line;
                    if self.idents.contains_key(&sym) {
                        return Err(ParseError::Redeclared {
                            line,
                            name: self.symbols.name(sym).to_string(),
                        });
                    }
                    self.next();
                    Ok((line, sym))
                } else {
                    Err(self.unexpected(what))
                }
            }
            None => Err(self.unexpected(what)),
        }
    }

    fn signed_number(&mut self) -> Result<f64> {
        let negate = match self.peek() {
            Some(t) if t.kind == TokenKind::Op(Op::Sub) => {
                self.next();
                true
            }
            _ => false,
        };
        match self.peek() {
            Some(t) => {
                if let TokenKind::Number(n) = t.kind {
                    self.next();
                    Ok(if negate { -n } else { n })
                } else {
                    Err(self.unexpected("number"))
                }
            }
            None => Err(self.unexpected("number")),
        }
    }

    // *** Parameter header

    fn parameters(&mut self) -> Result<Vec<Parameter>> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut parameters = vec![];
        loop {
            if let Some(t) = self.peek() {
                if t.kind == TokenKind::RBracket {
                    self.next();
                    return Ok(parameters);
                }
            }
            if parameters.len() == limits::MAX_PARAMETERS {
                return Err(ParseError::TooManyParameters { line: self.line() });
            }
            parameters.push(self.parameter()?);
        }
    }

    fn parameter(&mut self) -> Result<Parameter> {
        let (line, sym) = self.fresh_ident("parameter name")?;
        let name = self.symbols.name(sym).to_string();
        self.expect(TokenKind::Op(Op::Assign), "':='")?;
        let parameter = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Bool(b)) => {
                self.next();
                if self.peek().map(|t| t.kind) != Some(TokenKind::Semicolon) {
                    return Err(ParseError::LogicalBounds { line, name });
                }
                Parameter::logical(&name, line, b)
            }
            _ => {
                let default = self.signed_number()?;
                let (lower, upper) = self.bound_group()?;
                Parameter::new(&name, line, default, lower, upper)?
            }
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        self.idents.insert(sym, IdentClass::Parameter);
        Ok(parameter)
    }

    /// Compact bound notation after a parameter default. `(`/`[` bind an
    /// exclusive/inclusive lower bound, `)`/`]` an exclusive/inclusive
    /// upper bound, and `{`/`}` leave that side unbounded:
    /// `[0 10)`, `(0}`, `{15]`.
    fn bound_group(&mut self) -> Result<(Option<Bound>, Option<Bound>)> {
        let line = self.line();
        let open = match self.peek().map(|t| t.kind) {
            Some(TokenKind::LParen) => Some(false),
            Some(TokenKind::LBracket) => Some(true),
            Some(TokenKind::LBrace) => None,
            _ => return Ok((None, None)),
        };
        self.next();
        let first = self.signed_number()?;
        let second = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Number(_)) | Some(TokenKind::Op(Op::Sub)) => {
                Some(self.signed_number()?)
            }
            _ => None,
        };
        let close = match self.peek().map(|t| t.kind) {
            Some(TokenKind::RParen) => Some(false),
            Some(TokenKind::RBracket) => Some(true),
            Some(TokenKind::RBrace) => None,
            _ => return Err(self.unexpected("bound delimiter")),
        };
        self.next();
        match (open, second, close) {
            (None, None, None) => Err(ParseError::EmptyBounds { line }),
            // Two values require a bound on each side.
            (None, Some(_), _) | (_, Some(_), None) => Err(ParseError::EmptyBounds { line }),
            (open, Some(hi), close) => Ok((
                open.map(|inclusive| Bound {
                    value: first,
                    inclusive,
                }),
                close.map(|inclusive| Bound {
                    value: hi,
                    inclusive,
                }),
            )),
            (None, None, Some(inclusive)) => Ok((
                None,
                Some(Bound {
                    value: first,
                    inclusive,
                }),
            )),
            (Some(inclusive), None, None) => Ok((
                Some(Bound {
                    value: first,
                    inclusive,
                }),
                None,
            )),
            // A single value inside two binding delimiters is the
            // degenerate point range.
            (Some(lo_inc), None, Some(hi_inc)) => Ok((
                Some(Bound {
                    value: first,
                    inclusive: lo_inc,
                }),
                Some(Bound {
                    value: first,
                    inclusive: hi_inc,
                }),
            )),
        }
    }

    // *** Top-level declarations

    fn declarations(&mut self) -> Result<Vec<Declaration>> {
        let mut declarations = vec![];
        loop {
            match self.peek().map(|t| t.kind) {
                Some(TokenKind::Word(Word::Const)) => {
                    declarations.push(self.variable_decl(IdentClass::Immutable)?)
                }
                Some(TokenKind::Word(Word::Let)) => {
                    declarations.push(self.variable_decl(IdentClass::Persistent)?)
                }
                Some(TokenKind::Word(Word::Var)) => {
                    declarations.push(self.variable_decl(IdentClass::Impersistent)?)
                }
                Some(TokenKind::Word(Word::Fn)) => declarations.push(self.function_decl()?),
                _ => return Ok(declarations),
            }
        }
    }

    fn variable_decl(&mut self, class: IdentClass) -> Result<Declaration> {
        self.next();
        let (line, name) = self.fresh_ident("variable name")?;
        self.expect(TokenKind::Op(Op::Assign), "':='")?;
        let init = self.expression(&Scope::default())?;
        self.expect(TokenKind::Semicolon, "';'")?;
        // Registered after the initializer so self-references fail as
        // undeclared.
        self.idents.insert(name, class);
        Ok(Declaration::Variable {
            name,
            line,
            class,
            init,
        })
    }

    fn function_decl(&mut self) -> Result<Declaration> {
        self.next();
        let (line, name) = self.fresh_ident("function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args: Vec<Symbol> = vec![];
        let mut scope = Scope::default();
        if self.peek().map(|t| t.kind) != Some(TokenKind::RParen) {
            loop {
                let (arg_line, arg) = self.fresh_ident("argument name")?;
                if scope.insert(arg, args.len()).is_some() {
                    return Err(ParseError::Redeclared {
                        line: arg_line,
                        name: self.symbols.name(arg).to_string(),
                    });
                }
                args.push(arg);
                match self.peek().map(|t| t.kind) {
                    Some(TokenKind::Comma) => {
                        self.next();
                    }
                    _ => break,
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        // Registered before the body so the function can call itself.
        self.idents
            .insert(name, IdentClass::Function { arity: args.len() });
        let body = self.block(&scope)?;
        Ok(Declaration::Function {
            name,
            line,
            args,
            body,
        })
    }

    // *** Callback bodies

    fn callbacks(&mut self) -> Result<(Vec<Statement>, Option<Distribution>)> {
        let mut calculation = None;
        let mut distribution = None;
        let scope = Scope::default();
        loop {
            match self.peek().map(|t| t.kind) {
                None => break,
                Some(TokenKind::LBrace) => {
                    if calculation.is_some() {
                        return Err(ParseError::DuplicateCallback {
                            line: self.line(),
                            name: "calculation",
                        });
                    }
                    calculation = Some(self.block(&scope)?);
                }
                Some(TokenKind::Ident(sym)) => {
                    let line = self.line();
                    self.next();
                    let name = self.symbols.name(sym).to_string();
                    if name != "distribution" {
                        return Err(ParseError::UnknownCallback { line, name });
                    }
                    if distribution.is_some() {
                        return Err(ParseError::DuplicateCallback {
                            line,
                            name: "distribution",
                        });
                    }
                    let points = self.distribution_points(line)?;
                    let body = self.block(&scope)?;
                    distribution = Some(Distribution { points, body });
                }
                Some(_) => return Err(self.unexpected("callback body")),
            }
        }
        match calculation {
            Some(calculation) => Ok((calculation, distribution)),
            None => Err(ParseError::MissingCalculation),
        }
    }

    fn distribution_points(&mut self, line: u32) -> Result<usize> {
        if self.peek().map(|t| t.kind) != Some(TokenKind::LParen) {
            return Ok(limits::LUT_POINTS_CAPACITY);
        }
        self.next();
        let n = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Number(n)) => {
                self.next();
                n
            }
            _ => return Err(self.unexpected("sample count")),
        };
        self.expect(TokenKind::RParen, "')'")?;
        if n.fract() != 0.0 || n < 1.0 || n > limits::LUT_POINTS_CAPACITY as f64 {
            return Err(ParseError::BadDistributionSize { line });
        }
        Ok(n as usize)
    }

    // *** Statements

    fn block(&mut self, scope: &Scope) -> Result<Vec<Statement>> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = vec![];
        loop {
            if let Some(t) = self.peek() {
                if t.kind == TokenKind::RBrace {
                    self.next();
                    return Ok(statements);
                }
            } else {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.statement(scope)?);
        }
    }

    fn statement(&mut self, scope: &Scope) -> Result<Statement> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Word(Word::If)) => {
                self.next();
                self.expect(TokenKind::LParen, "'('")?;
                let cond = self.expression(scope)?;
                self.expect(TokenKind::RParen, "')'")?;
                let then_block = self.block(scope)?;
                let else_block = match self.peek().map(|t| t.kind) {
                    Some(TokenKind::Word(Word::Else)) => {
                        self.next();
                        Some(self.block(scope)?)
                    }
                    _ => None,
                };
                Ok(Statement::If(cond, then_block, else_block))
            }
            Some(TokenKind::Word(Word::While)) => {
                self.next();
                self.expect(TokenKind::LParen, "'('")?;
                let cond = self.expression(scope)?;
                self.expect(TokenKind::RParen, "')'")?;
                let body = self.block(scope)?;
                Ok(Statement::While(cond, body))
            }
            Some(TokenKind::Word(Word::Ret)) => {
                self.next();
                self.expect(TokenKind::Semicolon, "';'")?;
                Ok(Statement::Return)
            }
            _ => self.assignment(scope),
        }
    }

    fn assignment(&mut self, scope: &Scope) -> Result<Statement> {
        let target = self.assign_target(scope)?;
        let op = match self.peek() {
            Some(t) if matches!(t.kind, TokenKind::Op(op) if op.is_assign()) => {
                let t = t.clone();
                self.pos += 1;
                t
            }
            _ => return Err(self.unexpected("assignment operator")),
        };
        let expr = self.expression(scope)?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Statement::Assign(target, op, expr))
    }

    fn assign_target(&mut self, scope: &Scope) -> Result<Token> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.unexpected("assignment target")),
        };
        let classified = match token.kind {
            TokenKind::In | TokenKind::Out => token.clone(),
            TokenKind::Ident(sym) => {
                let name = self.symbols.name(sym).to_string();
                if scope.contains_key(&sym) {
                    Token::new(TokenKind::Arg(sym), token.line)
                } else {
                    match self.idents.get(&sym) {
                        Some(IdentClass::Persistent) => {
                            Token::new(TokenKind::PersistVar(sym), token.line)
                        }
                        Some(IdentClass::Impersistent) => {
                            Token::new(TokenKind::ImpersistVar(sym), token.line)
                        }
                        Some(IdentClass::Parameter)
                        | Some(IdentClass::Immutable)
                        | Some(IdentClass::Function { .. }) => {
                            return Err(ParseError::AssignImmutable {
                                line: token.line,
                                name,
                            })
                        }
                        None => {
                            return Err(ParseError::Undeclared {
                                line: token.line,
                                name,
                            })
                        }
                    }
                }
            }
            _ => return Err(self.unexpected("assignment target")),
        };
        self.next();
        Ok(classified)
    }

    // *** Expressions
    //
    // Precedence climbing over the token cursor, flattening directly into
    // a postfix sequence: operands in source order, each operator after
    // its operands.

    fn expression(&mut self, scope: &Scope) -> Result<Vec<Token>> {
        let mut out = vec![];
        self.expr_climb(&mut out, scope, 1)?;
        Ok(out)
    }

    fn expr_climb(&mut self, out: &mut Vec<Token>, scope: &Scope, min_prec: usize) -> Result<()> {
        self.operand(out, scope)?;
        while let Some(t) = self.peek() {
            let (op, line) = match t.kind {
                TokenKind::Op(op) if op.is_binary() => (op, t.line),
                _ => break,
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.next();
            let next_min = if op.is_right_assoc() { prec } else { prec + 1 };
            self.expr_climb(out, scope, next_min)?;
            out.push(Token::new(TokenKind::Op(op), line));
        }
        Ok(())
    }

    fn operand(&mut self, out: &mut Vec<Token>, scope: &Scope) -> Result<()> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.unexpected("expression")),
        };
        match token.kind {
            TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::In | TokenKind::Out => {
                self.next();
                out.push(token);
            }
            TokenKind::Op(Op::Sub) => {
                self.next();
                self.expr_climb(out, scope, UNARY_PRECEDENCE)?;
                out.push(Token::new(TokenKind::Op(Op::Neg), token.line));
            }
            TokenKind::Op(Op::Not) => {
                self.next();
                self.expr_climb(out, scope, UNARY_PRECEDENCE)?;
                out.push(Token::new(TokenKind::Op(Op::Not), token.line));
            }
            TokenKind::MathFn(f) => {
                self.next();
                self.call_args(out, scope, f.arity(), f.name())?;
                out.push(token);
            }
            TokenKind::Ident(sym) => {
                self.next();
                if scope.contains_key(&sym) {
                    out.push(Token::new(TokenKind::Arg(sym), token.line));
                    return Ok(());
                }
                let kind = match self.idents.get(&sym) {
                    Some(IdentClass::Parameter) => TokenKind::Param(sym),
                    Some(IdentClass::Immutable) => TokenKind::ImmutVar(sym),
                    Some(IdentClass::Persistent) => TokenKind::PersistVar(sym),
                    Some(IdentClass::Impersistent) => TokenKind::ImpersistVar(sym),
                    Some(IdentClass::Function { arity }) => {
                        let arity = *arity;
                        self.call_args(out, scope, arity, "function")?;
                        TokenKind::Func(sym)
                    }
                    None => {
                        return Err(ParseError::Undeclared {
                            line: token.line,
                            name: self.symbols.name(sym).to_string(),
                        })
                    }
                };
                out.push(Token::new(kind, token.line));
            }
            TokenKind::LParen => {
                self.next();
                self.expr_climb(out, scope, 1)?;
                self.expect(TokenKind::RParen, "')'")?;
            }
            _ => return Err(self.unexpected("expression")),
        }
        Ok(())
    }

    fn call_args(
        &mut self,
        out: &mut Vec<Token>,
        scope: &Scope,
        arity: usize,
        name: &str,
    ) -> Result<()> {
        let line = self.line();
        self.expect(TokenKind::LParen, "'('")?;
        for i in 0..arity {
            if i > 0 {
                self.expect(TokenKind::Comma, "','")?;
            }
            self.expr_climb(out, scope, 1)?;
        }
        if arity > 0 && self.peek().map(|t| t.kind) == Some(TokenKind::Comma) {
            return Err(ParseError::WrongArity {
                line,
                name: name.to_string(),
                expected: arity,
            });
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex::tokenize;
    use super::super::token::MathFn;
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_str(src: &str) -> Parsed {
        match parse(tokenize(src).unwrap()) {
            Ok(p) => p,
            Err(e) => panic!("{}", e),
        }
    }

    fn parse_err(src: &str) -> ParseError {
        parse(tokenize(src).unwrap()).unwrap_err()
    }

    fn postfix_kinds(statement: &Statement) -> Vec<TokenKind> {
        match statement {
            Statement::Assign(_, _, expr) => expr.iter().map(|t| t.kind).collect(),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_script() {
        let p = parse_str("[]{}");
        assert!(p.parameters.is_empty());
        assert!(p.declarations.is_empty());
        assert!(p.calculation.is_empty());
        assert!(p.distribution.is_none());
    }

    #[test]
    fn test_postfix_precedence() {
        // 1 + 2 * 3 => 1 2 3 * +
        let p = parse_str("[] { y := 1 + 2 * 3; }");
        assert_eq!(
            postfix_kinds(&p.calculation[0]),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Number(3.0),
                TokenKind::Op(Op::Mul),
                TokenKind::Op(Op::Add),
            ]
        );
    }

    #[test]
    fn test_postfix_right_assoc_pow() {
        // 2 ^ 3 ^ 2 => 2 3 2 ^ ^
        let p = parse_str("[] { y := 2 ^ 3 ^ 2; }");
        assert_eq!(
            postfix_kinds(&p.calculation[0]),
            vec![
                TokenKind::Number(2.0),
                TokenKind::Number(3.0),
                TokenKind::Number(2.0),
                TokenKind::Op(Op::Pow),
                TokenKind::Op(Op::Pow),
            ]
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        // (1 + 2) * 3 => 1 2 + 3 *
        let p = parse_str("[] { y := (1 + 2) * 3; }");
        assert_eq!(
            postfix_kinds(&p.calculation[0]),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Op(Op::Add),
                TokenKind::Number(3.0),
                TokenKind::Op(Op::Mul),
            ]
        );
    }

    #[test]
    fn test_unary_negation_depth() {
        // N + 1 leading minus signs produce exactly N + 1 negation
        // operators, innermost first.
        for n in 0..=7usize {
            let minuses = "-".repeat(n + 1);
            let p = parse_str(&format!("[] {{ y := {}x; }}", minuses));
            let kinds = postfix_kinds(&p.calculation[0]);
            assert_eq!(kinds[0], TokenKind::In);
            assert_eq!(kinds.len(), n + 2);
            let negs = kinds
                .iter()
                .filter(|k| **k == TokenKind::Op(Op::Neg))
                .count();
            assert_eq!(negs, n + 1);
        }
    }

    #[test]
    fn test_unary_binds_looser_than_pow() {
        // -x ^ 2 => x 2 ^ neg
        let p = parse_str("[] { y := -x ^ 2; }");
        assert_eq!(
            postfix_kinds(&p.calculation[0]),
            vec![
                TokenKind::In,
                TokenKind::Number(2.0),
                TokenKind::Op(Op::Pow),
                TokenKind::Op(Op::Neg),
            ]
        );
    }

    #[test]
    fn test_math_call_postfix() {
        // atan2(y, 2) => y 2 atan2
        let p = parse_str("[] { y := atan2(y, 2); }");
        assert_eq!(
            postfix_kinds(&p.calculation[0]),
            vec![
                TokenKind::Out,
                TokenKind::Number(2.0),
                TokenKind::MathFn(MathFn::Atan2),
            ]
        );
    }

    #[test]
    fn test_parameter_bounds() {
        let p = parse_str(
            "[\n  Accel := 0.005 (0};\n  Cap := 15 [0 100);\n  Limit := 2 {10];\n  Gain := true;\n]{}",
        );
        assert_eq!(p.parameters.len(), 4);
        let accel = &p.parameters[0];
        assert_eq!(accel.name(), "Accel");
        assert!(!accel.accepts(0.0));
        assert!(accel.accepts(1e9));
        let cap = &p.parameters[1];
        assert!(cap.accepts(0.0));
        assert!(!cap.accepts(100.0));
        let limit = &p.parameters[2];
        assert!(limit.accepts(-1e9));
        assert!(limit.accepts(10.0));
        assert!(!limit.accepts(10.5));
    }

    #[test]
    fn test_parameter_errors() {
        assert_eq!(
            parse_err("[P := 5 [10 0];]{}"),
            ParseError::ContradictoryBounds {
                line: 1,
                name: "P".to_string()
            }
        );
        assert_eq!(
            parse_err("[P := -1 [0};]{}"),
            ParseError::DefaultOutOfBounds {
                line: 1,
                name: "P".to_string()
            }
        );
        assert_eq!(
            parse_err("[P := true (0};]{}"),
            ParseError::LogicalBounds {
                line: 1,
                name: "P".to_string()
            }
        );
        assert_eq!(parse_err("[P := 1 {5};]{}"), ParseError::EmptyBounds { line: 1 });
    }

    #[test]
    fn test_too_many_parameters() {
        let mut src = String::from("[");
        for i in 0..=limits::MAX_PARAMETERS {
            src.push_str(&format!("P{} := 1;", "Q".repeat(i + 1)));
        }
        src.push_str("]{}");
        assert!(matches!(
            parse_err(&src),
            ParseError::TooManyParameters { .. }
        ));
    }

    #[test]
    fn test_declaration_classes() {
        let p = parse_str("[] const a := 1; let b := 2; var c := 3; {}");
        let classes: Vec<IdentClass> = p
            .declarations
            .iter()
            .map(|d| match d {
                Declaration::Variable { class, .. } => *class,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            classes,
            vec![
                IdentClass::Immutable,
                IdentClass::Persistent,
                IdentClass::Impersistent
            ]
        );
    }

    #[test]
    fn test_undeclared_identifier() {
        assert_eq!(
            parse_err("[] { y := speed; }"),
            ParseError::Undeclared {
                line: 1,
                name: "speed".to_string()
            }
        );
        assert_eq!(
            parse_err("[] { total := 1; }"),
            ParseError::Undeclared {
                line: 1,
                name: "total".to_string()
            }
        );
    }

    #[test]
    fn test_assign_to_immutable() {
        assert_eq!(
            parse_err("[] const a := 1; { a := 2; }"),
            ParseError::AssignImmutable {
                line: 1,
                name: "a".to_string()
            }
        );
        assert_eq!(
            parse_err("[Accel := 1;] { Accel := 2; }"),
            ParseError::AssignImmutable {
                line: 1,
                name: "Accel".to_string()
            }
        );
    }

    #[test]
    fn test_self_reference_in_initializer() {
        assert_eq!(
            parse_err("[] let a := a + 1; {}"),
            ParseError::Undeclared {
                line: 1,
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_function_declaration_and_call() {
        let p = parse_str("[] fn f(p) { y += p; } { y += f(1); }");
        assert_eq!(p.declarations.len(), 1);
        match &p.declarations[0] {
            Declaration::Function { args, body, .. } => {
                assert_eq!(args.len(), 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        let kinds = postfix_kinds(&p.calculation[0]);
        assert_eq!(kinds[0], TokenKind::Number(1.0));
        assert!(matches!(kinds[1], TokenKind::Func(_)));
    }

    #[test]
    fn test_function_wrong_arity() {
        assert!(matches!(
            parse_err("[] fn f(p) { y += p; } { y := f(1, 2); }"),
            ParseError::WrongArity { expected: 1, .. }
        ));
    }

    #[test]
    fn test_control_flow_statements() {
        let p = parse_str(
            "[] let n := 0; { if (x > 1) { y := 2; } else { y := 3; } while (n < 4) { n += 1; } ret; }",
        );
        assert_eq!(p.calculation.len(), 3);
        assert!(matches!(p.calculation[0], Statement::If(_, _, Some(_))));
        assert!(matches!(p.calculation[1], Statement::While(_, _)));
        assert_eq!(p.calculation[2], Statement::Return);
    }

    #[test]
    fn test_distribution_callback() {
        let p = parse_str("[] { } distribution(64) { x += 1; }");
        let d = p.distribution.unwrap();
        assert_eq!(d.points, 64);
        assert_eq!(d.body.len(), 1);
        // Omitted argument defaults to the grid capacity.
        let p = parse_str("[] { } distribution { x += 1; }");
        assert_eq!(p.distribution.unwrap().points, limits::LUT_POINTS_CAPACITY);
    }

    #[test]
    fn test_distribution_size_validation() {
        assert!(matches!(
            parse_err("[] {} distribution(0) {}"),
            ParseError::BadDistributionSize { .. }
        ));
        assert!(matches!(
            parse_err("[] {} distribution(258) {}"),
            ParseError::BadDistributionSize { .. }
        ));
        assert!(matches!(
            parse_err("[] {} distribution(2.5) {}"),
            ParseError::BadDistributionSize { .. }
        ));
    }

    #[test]
    fn test_unknown_callback() {
        assert_eq!(
            parse_err("[] {} histogram {}"),
            ParseError::UnknownCallback {
                line: 1,
                name: "histogram".to_string()
            }
        );
    }

    #[test]
    fn test_missing_calculation() {
        assert_eq!(parse_err("[] let a := 1;"), ParseError::MissingCalculation);
    }

    #[test]
    fn test_duplicate_calculation() {
        assert!(matches!(
            parse_err("[] {} {}"),
            ParseError::DuplicateCallback {
                name: "calculation",
                ..
            }
        ));
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert!(matches!(
            parse_err("[] {} ;"),
            ParseError::Unexpected {
                expected: "callback body",
                ..
            }
        ));
    }
}
