use super::addr::{CodeAddress, DataAddress, FunctionIndex, MemoryAddress, StackAddress};
use super::instruction::Instruction;
use super::num::Number;
use super::program::Program;
use crate::error::EmitError;
use crate::lang::{Declaration, IdentClass, Op, Parsed, Statement, Symbol, Token, TokenKind};
use crate::limits;
use rustc_hash::FxHashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, EmitError>;

/// Everything the interpreter needs: one program per variable
/// initializer (in declaration order), the function table, and the
/// callback programs.
#[derive(Debug)]
pub struct Compiled {
    pub declarations: Vec<Rc<Program>>,
    pub functions: Vec<Rc<Program>>,
    pub calculation: Rc<Program>,
    pub distribution: Option<(usize, Rc<Program>)>,
    pub persistent_slots: usize,
    pub impersistent_slots: usize,
}

/// Lowers the parsed script to bytecode. Address assignment is a single
/// pass over the declarations; parameters occupy the low persistent
/// slots in header order.
pub fn emit(parsed: &Parsed) -> Result<Compiled> {
    let emitter = Emitter::new(parsed)?;
    emitter.run(parsed)
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Memory(MemoryAddress),
    Function(FunctionIndex, usize),
}

struct Emitter {
    slots: FxHashMap<Symbol, Slot>,
    persistent_slots: usize,
    impersistent_slots: usize,
}

impl Emitter {
    fn new(parsed: &Parsed) -> Result<Emitter> {
        let mut emitter = Emitter {
            slots: FxHashMap::default(),
            persistent_slots: 0,
            impersistent_slots: 0,
        };
        for parameter in &parsed.parameters {
            let sym = parsed
                .symbols
                .get(parameter.name())
                .ok_or_else(|| EmitError::Unresolved {
                    line: parameter.line(),
                    name: parameter.name().to_string(),
                })?;
            let addr = emitter.persistent_slot()?;
            emitter.slots.insert(sym, Slot::Memory(addr));
        }
        let mut functions = 0usize;
        for declaration in &parsed.declarations {
            match declaration {
                Declaration::Variable { name, class, .. } => {
                    let addr = match class {
                        IdentClass::Impersistent => emitter.impersistent_slot()?,
                        _ => emitter.persistent_slot()?,
                    };
                    emitter.slots.insert(*name, Slot::Memory(addr));
                }
                Declaration::Function { name, args, .. } => {
                    if functions > u16::MAX as usize {
                        return Err(EmitError::OutOfFunctions);
                    }
                    emitter.slots.insert(
                        *name,
                        Slot::Function(FunctionIndex(functions as u16), args.len()),
                    );
                    functions += 1;
                }
            }
        }
        Ok(emitter)
    }

    fn persistent_slot(&mut self) -> Result<MemoryAddress> {
        self.check_capacity()?;
        let addr = MemoryAddress::persistent(self.persistent_slots as u8);
        self.persistent_slots += 1;
        Ok(addr)
    }

    fn impersistent_slot(&mut self) -> Result<MemoryAddress> {
        self.check_capacity()?;
        let addr = MemoryAddress::impersistent(self.impersistent_slots as u8);
        self.impersistent_slots += 1;
        Ok(addr)
    }

    fn check_capacity(&self) -> Result<()> {
        if self.persistent_slots + self.impersistent_slots >= limits::MAX_DECLARATIONS {
            return Err(EmitError::OutOfSlots);
        }
        Ok(())
    }

    fn run(self, parsed: &Parsed) -> Result<Compiled> {
        let mut declarations = vec![];
        let mut functions = vec![];
        for declaration in &parsed.declarations {
            match declaration {
                Declaration::Variable { name, line, init, .. } => {
                    let addr = match self.slots.get(name) {
                        Some(Slot::Memory(addr)) => *addr,
                        _ => {
                            return Err(EmitError::Unresolved {
                                line: *line,
                                name: parsed.symbols.name(*name).to_string(),
                            })
                        }
                    };
                    let mut p = ProgramEmitter::new(&self, 0);
                    p.expression(init)?;
                    p.push(Instruction::Store(addr));
                    declarations.push(Rc::new(p.finish()?));
                }
                Declaration::Function { args, body, .. } => {
                    let mut p = ProgramEmitter::new(&self, args.len());
                    for (offset, arg) in args.iter().enumerate() {
                        p.locals.insert(*arg, StackAddress(offset as u8));
                    }
                    p.statements(body)?;
                    functions.push(Rc::new(p.finish()?));
                }
            }
        }
        let mut p = ProgramEmitter::new(&self, 0);
        p.statements(&parsed.calculation)?;
        let calculation = Rc::new(p.finish()?);
        let distribution = match &parsed.distribution {
            Some(d) => {
                let mut p = ProgramEmitter::new(&self, 0);
                p.statements(&d.body)?;
                Some((d.points, Rc::new(p.finish()?)))
            }
            None => None,
        };
        Ok(Compiled {
            declarations,
            functions,
            calculation,
            distribution,
            persistent_slots: self.persistent_slots,
            impersistent_slots: self.impersistent_slots,
        })
    }
}

/// Emits one program. Forward branches go out as placeholders whose
/// addresses are kept on an explicit patch list; each is resolved
/// exactly once, and any placeholder still unresolved at `finish` is a
/// compiler bug surfaced as an error rather than a bad jump.
struct ProgramEmitter<'a> {
    emitter: &'a Emitter,
    code: Vec<Instruction>,
    data: Vec<Number>,
    dedup: FxHashMap<u64, DataAddress>,
    locals: FxHashMap<Symbol, StackAddress>,
    /// Start offsets of the code for each value currently on the
    /// operand stack, mirrored at emit time.
    operand_starts: Vec<usize>,
    pending_patches: usize,
    arity: usize,
}

impl<'a> ProgramEmitter<'a> {
    fn new(emitter: &'a Emitter, arity: usize) -> ProgramEmitter<'a> {
        ProgramEmitter {
            emitter,
            code: vec![],
            data: vec![],
            dedup: FxHashMap::default(),
            locals: FxHashMap::default(),
            operand_starts: vec![],
            pending_patches: 0,
            arity,
        }
    }

    fn finish(mut self) -> Result<Program> {
        if self.pending_patches != 0 {
            return Err(EmitError::UnmatchedBranch);
        }
        self.code.push(Instruction::End);
        Ok(Program::new(self.code, self.data, self.arity))
    }

    fn push(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    fn here(&self) -> CodeAddress {
        CodeAddress(self.code.len() as u32)
    }

    /// Emits a branch with a dummy target, to be resolved by `patch`.
    fn placeholder(&mut self, jump: fn(CodeAddress) -> Instruction) -> CodeAddress {
        let at = self.here();
        self.push(jump(CodeAddress(u32::MAX)));
        self.pending_patches += 1;
        at
    }

    /// Points the placeholder at the next instruction to be emitted.
    fn patch(&mut self, at: CodeAddress) -> Result<()> {
        let target = self.here();
        let patched = match self.code.get(at.0 as usize) {
            Some(Instruction::Jz(_)) => Instruction::Jz(target),
            Some(Instruction::Jmp(_)) => Instruction::Jmp(target),
            _ => return Err(EmitError::UnmatchedBranch),
        };
        self.code[at.0 as usize] = patched;
        self.pending_patches -= 1;
        Ok(())
    }

    fn constant(&mut self, n: f64) -> Result<DataAddress> {
        if let Some(addr) = self.dedup.get(&n.to_bits()) {
            return Ok(*addr);
        }
        if self.data.len() > u16::MAX as usize {
            return Err(EmitError::OutOfConstants);
        }
        let addr = DataAddress(self.data.len() as u16);
        self.data.push(Number(n));
        self.dedup.insert(n.to_bits(), addr);
        Ok(addr)
    }

    // *** Statements

    fn statements(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Assign(target, op, expr) => self.assignment(target, op, expr),
            Statement::If(cond, then_block, else_block) => {
                self.expression(cond)?;
                self.operand_starts.pop();
                let skip_then = self.placeholder(Instruction::Jz);
                self.statements(then_block)?;
                match else_block {
                    Some(else_block) => {
                        let skip_else = self.placeholder(Instruction::Jmp);
                        self.patch(skip_then)?;
                        self.statements(else_block)?;
                        self.patch(skip_else)
                    }
                    None => self.patch(skip_then),
                }
            }
            Statement::While(cond, body) => {
                let top = self.here();
                self.expression(cond)?;
                self.operand_starts.pop();
                let exit = self.placeholder(Instruction::Jz);
                self.statements(body)?;
                self.push(Instruction::Jmp(top));
                self.patch(exit)
            }
            Statement::Return => {
                self.push(Instruction::Return);
                Ok(())
            }
        }
    }

    /// Compound assignments desugar on the stack: the right-hand side is
    /// already in place, so load the target, swap into operand order,
    /// apply the base operator, store back.
    fn assignment(&mut self, target: &Token, op: &Token, expr: &[Token]) -> Result<()> {
        self.expression(expr)?;
        self.operand_starts.pop();
        let op = match op.kind {
            TokenKind::Op(op) => op,
            _ => return Err(self.invalid(op)),
        };
        if let Some(base) = op.compound_base() {
            self.push(self.load_for(target)?);
            self.push(Instruction::Swap);
            self.push(binary_instruction(base).ok_or_else(|| self.invalid(target))?);
        }
        self.push(self.store_for(target)?);
        Ok(())
    }

    fn load_for(&self, target: &Token) -> Result<Instruction> {
        Ok(match target.kind {
            TokenKind::In => Instruction::LoadIn,
            TokenKind::Out => Instruction::LoadOut,
            TokenKind::PersistVar(sym) | TokenKind::ImpersistVar(sym) => {
                Instruction::Load(self.memory(sym, target)?)
            }
            TokenKind::Arg(sym) => Instruction::LoadStack(self.local(sym, target)?),
            _ => return Err(self.invalid(target)),
        })
    }

    fn store_for(&self, target: &Token) -> Result<Instruction> {
        Ok(match target.kind {
            TokenKind::In => Instruction::StoreIn,
            TokenKind::Out => Instruction::StoreOut,
            TokenKind::PersistVar(sym) | TokenKind::ImpersistVar(sym) => {
                Instruction::Store(self.memory(sym, target)?)
            }
            TokenKind::Arg(sym) => Instruction::StoreStack(self.local(sym, target)?),
            _ => return Err(self.invalid(target)),
        })
    }

    fn memory(&self, sym: Symbol, token: &Token) -> Result<MemoryAddress> {
        match self.emitter.slots.get(&sym) {
            Some(Slot::Memory(addr)) => Ok(*addr),
            _ => Err(EmitError::Unresolved {
                line: token.line,
                name: format!("{}", token.kind),
            }),
        }
    }

    fn local(&self, sym: Symbol, token: &Token) -> Result<StackAddress> {
        self.locals
            .get(&sym)
            .copied()
            .ok_or_else(|| EmitError::Unresolved {
                line: token.line,
                name: format!("{}", token.kind),
            })
    }

    fn invalid(&self, token: &Token) -> EmitError {
        EmitError::InvalidToken {
            line: token.line,
            token: format!("{}", token.kind),
        }
    }

    // *** Expressions
    //
    // A postfix sequence maps one token to one instruction. The mirror
    // stack of operand start offsets exists for exactly one rewrite:
    // `e ^ v` drops the base load and becomes an EXP.

    fn expression(&mut self, tokens: &[Token]) -> Result<()> {
        for token in tokens {
            self.token(token)?;
        }
        Ok(())
    }

    fn token(&mut self, token: &Token) -> Result<()> {
        match token.kind {
            TokenKind::Number(n) => {
                self.operand_starts.push(self.code.len());
                let addr = self.constant(n)?;
                self.push(Instruction::LoadNumber(addr));
            }
            TokenKind::Bool(b) => {
                self.operand_starts.push(self.code.len());
                let addr = self.constant(if b { 1.0 } else { 0.0 })?;
                self.push(Instruction::LoadNumber(addr));
            }
            TokenKind::In => {
                self.operand_starts.push(self.code.len());
                self.push(Instruction::LoadIn);
            }
            TokenKind::Out => {
                self.operand_starts.push(self.code.len());
                self.push(Instruction::LoadOut);
            }
            TokenKind::Param(sym)
            | TokenKind::ImmutVar(sym)
            | TokenKind::PersistVar(sym)
            | TokenKind::ImpersistVar(sym) => {
                let addr = self.memory(sym, token)?;
                self.operand_starts.push(self.code.len());
                self.push(Instruction::Load(addr));
            }
            TokenKind::Arg(sym) => {
                let addr = self.local(sym, token)?;
                self.operand_starts.push(self.code.len());
                self.push(Instruction::LoadStack(addr));
            }
            TokenKind::Func(sym) => {
                let (index, arity) = match self.emitter.slots.get(&sym) {
                    Some(Slot::Function(index, arity)) => (*index, *arity),
                    _ => {
                        return Err(EmitError::Unresolved {
                            line: token.line,
                            name: format!("{}", token.kind),
                        })
                    }
                };
                self.merge_operands(arity, token)?;
                self.push(Instruction::Call(index));
            }
            TokenKind::MathFn(f) => {
                self.merge_operands(f.arity(), token)?;
                self.push(Instruction::from(f));
            }
            TokenKind::Op(Op::Neg) => {
                self.require_operands(1, token)?;
                self.push(Instruction::Neg);
            }
            TokenKind::Op(Op::Not) => {
                self.require_operands(1, token)?;
                self.push(Instruction::Not);
            }
            TokenKind::Op(Op::Pow) => self.power(token)?,
            TokenKind::Op(op) => {
                let instruction = binary_instruction(op).ok_or_else(|| self.invalid(token))?;
                self.merge_operands(2, token)?;
                self.push(instruction);
            }
            _ => return Err(self.invalid(token)),
        }
        Ok(())
    }

    /// `e ^ v` where the base is the literal constant reduces to a
    /// single EXP on the exponent.
    fn power(&mut self, token: &Token) -> Result<()> {
        self.require_operands(2, token)?;
        let exp_start = self.operand_starts.pop().unwrap_or_default();
        let base_start = self.operand_starts.pop().unwrap_or_default();
        let base_is_euler = exp_start - base_start == 1
            && match self.code.get(base_start) {
                Some(Instruction::LoadNumber(addr)) => {
                    self.data.get(addr.0 as usize).map(|n| n.0) == Some(std::f64::consts::E)
                }
                _ => false,
            };
        self.operand_starts.push(base_start);
        if base_is_euler {
            self.code.remove(base_start);
            self.push(Instruction::Exp);
        } else {
            self.push(Instruction::Pow);
        }
        Ok(())
    }

    /// Pops `n` operand records and pushes one covering the combined
    /// span, for the value the next instruction will produce.
    fn merge_operands(&mut self, n: usize, token: &Token) -> Result<()> {
        self.require_operands(n, token)?;
        let start = if n == 0 {
            self.code.len()
        } else {
            let keep = self.operand_starts.len() - n;
            let start = self.operand_starts[keep];
            self.operand_starts.truncate(keep);
            start
        };
        self.operand_starts.push(start);
        Ok(())
    }

    fn require_operands(&self, n: usize, token: &Token) -> Result<()> {
        if self.operand_starts.len() < n {
            return Err(EmitError::MissingOperand { line: token.line });
        }
        Ok(())
    }
}

fn binary_instruction(op: Op) -> Option<Instruction> {
    Some(match op {
        Op::Add => Instruction::Add,
        Op::Sub => Instruction::Sub,
        Op::Mul => Instruction::Mul,
        Op::Div => Instruction::Div,
        Op::Rem => Instruction::Rem,
        Op::Pow => Instruction::Pow,
        Op::Lt => Instruction::Lt,
        Op::LtEq => Instruction::LtEq,
        Op::Gt => Instruction::Gt,
        Op::GtEq => Instruction::GtEq,
        Op::Eq => Instruction::Eq,
        Op::NotEq => Instruction::NotEq,
        Op::And => Instruction::And,
        Op::Or => Instruction::Or,
        _ => return None,
    })
}
