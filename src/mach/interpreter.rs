use super::addr::{CodeAddress, FunctionIndex};
use super::emit::Compiled;
use super::heap::MemoryHeap;
use super::instruction::Instruction;
use super::num::Number;
use super::program::Program;
use crate::error::InterpreterError;
use crate::limits;
use std::rc::Rc;
use tracing::trace;

type Result<T> = std::result::Result<T, InterpreterError>;

/// The stack machine. Owns two heaps: `stable` holds the last committed
/// persistent state and `unstable` is what programs actually run
/// against. Initialization commits unstable back to stable once the
/// declaration programs have run; after that, stabilization rolls the
/// unstable persistent region back between samples so one sample can
/// never leak state into the next.
#[derive(Debug)]
pub struct Interpreter {
    compiled: Compiled,
    settings: Vec<Number>,
    stable: MemoryHeap,
    unstable: MemoryHeap,
    x: Number,
    y: Number,
    stack: Vec<Number>,
    depth: usize,
    budget: usize,
}

impl Interpreter {
    /// `settings` seeds the low persistent slots, one per parameter, in
    /// header order.
    pub fn new(compiled: Compiled, settings: Vec<Number>) -> Interpreter {
        let stable = MemoryHeap::new(compiled.persistent_slots, compiled.impersistent_slots);
        let unstable = stable.clone();
        Interpreter {
            compiled,
            settings,
            stable,
            unstable,
            x: Number::ZERO,
            y: Number::ONE,
            stack: vec![],
            depth: 0,
            budget: 0,
        }
    }

    /// Takes effect on the next initialization.
    pub fn set_setting(&mut self, index: usize, value: Number) {
        if let Some(slot) = self.settings.get_mut(index) {
            *slot = value;
        }
    }

    pub fn has_distribution(&self) -> bool {
        self.compiled.distribution.is_some()
    }

    /// Runs the whole calculation lifecycle for a single input.
    pub fn calculate(&mut self, input: f64) -> Result<f64> {
        self.init()?;
        self.sample(input)
    }

    /// One initialization, then one sample per input.
    pub fn calculate_all(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        self.init()?;
        inputs.iter().map(|input| self.sample(*input)).collect()
    }

    /// Runs the distribution callback once per grid point, collecting
    /// the input register after each pass. The input register carries
    /// over between passes, so the callback can walk a cursor.
    pub fn distribution(&mut self) -> Result<Vec<f64>> {
        let (points, program) = match &self.compiled.distribution {
            Some((points, program)) => (*points, program.clone()),
            None => return Ok(vec![]),
        };
        self.init()?;
        self.x = Number::ZERO;
        let mut grid = Vec::with_capacity(points);
        for _ in 0..points {
            self.execute(&program)?;
            grid.push(self.x.0);
            self.y = Number::ONE;
            self.stabilize();
        }
        Ok(grid)
    }

    /// Fresh heaps, parameter slots seeded from the current settings,
    /// declaration initializers run in order, and the result committed
    /// as the stable state.
    fn init(&mut self) -> Result<()> {
        self.stable = MemoryHeap::new(
            self.compiled.persistent_slots,
            self.compiled.impersistent_slots,
        );
        for (index, value) in self.settings.iter().enumerate() {
            self.stable.set_persistent(index, *value);
        }
        self.unstable = self.stable.clone();
        self.x = Number::ZERO;
        self.y = Number::ONE;
        let declarations = self.compiled.declarations.clone();
        for program in &declarations {
            self.execute(program)?;
            self.y = Number::ONE;
        }
        self.stable.copy_persistent_from(&self.unstable);
        Ok(())
    }

    fn sample(&mut self, input: f64) -> Result<f64> {
        self.x = Number(input);
        let program = self.compiled.calculation.clone();
        self.execute(&program)?;
        let output = self.y;
        self.y = Number::ONE;
        self.stabilize();
        Ok(output.0)
    }

    /// Rolls the persistent region back to the stable snapshot. The
    /// impersistent region and the registers are untouched.
    fn stabilize(&mut self) {
        self.unstable.copy_persistent_from(&self.stable);
    }

    /// Top-level program entry: fresh budget, empty stack.
    fn execute(&mut self, program: &Rc<Program>) -> Result<()> {
        trace!(instructions = program.len(), "execute");
        self.budget = limits::INSTRUCTION_BUDGET;
        self.depth = 0;
        self.stack.clear();
        self.run(program, 0)
    }

    fn run(&mut self, program: &Program, frame: usize) -> Result<()> {
        // Operands may never dip into the argument slots.
        let floor = frame + program.arity();
        let mut pc = CodeAddress(0);
        loop {
            let instruction = program
                .instruction(pc)
                .ok_or(InterpreterError::UnbalancedProgram)?;
            if self.budget == 0 {
                return Err(InterpreterError::BudgetExhausted);
            }
            self.budget -= 1;
            match instruction {
                Instruction::End | Instruction::Return => {
                    if self.stack.len() != floor {
                        return Err(InterpreterError::UnbalancedProgram);
                    }
                    return Ok(());
                }
                Instruction::LoadNumber(addr) => {
                    let value = program.datum(addr).ok_or(InterpreterError::BadAddress)?;
                    self.push(value)?;
                }
                Instruction::Load(addr) => {
                    let value = self
                        .unstable
                        .load(addr)
                        .ok_or(InterpreterError::BadAddress)?;
                    self.push(value)?;
                }
                Instruction::Store(addr) => {
                    let value = self.pop(floor)?;
                    if !self.unstable.store(addr, value) {
                        return Err(InterpreterError::BadAddress);
                    }
                }
                Instruction::LoadIn => {
                    let value = self.x;
                    self.push(value)?;
                }
                Instruction::StoreIn => self.x = self.pop(floor)?,
                Instruction::LoadOut => {
                    let value = self.y;
                    self.push(value)?;
                }
                Instruction::StoreOut => self.y = self.pop(floor)?,
                Instruction::LoadStack(slot) => {
                    let value = *self
                        .stack
                        .get(frame + slot.0 as usize)
                        .ok_or(InterpreterError::BadStackPointer)?;
                    self.push(value)?;
                }
                Instruction::StoreStack(slot) => {
                    let value = self.pop(floor)?;
                    let slot = self
                        .stack
                        .get_mut(frame + slot.0 as usize)
                        .ok_or(InterpreterError::BadStackPointer)?;
                    *slot = value;
                }
                Instruction::Jz(target) => {
                    if !self.pop(floor)?.as_bool() {
                        pc = target;
                        continue;
                    }
                }
                Instruction::Jmp(target) => {
                    pc = target;
                    continue;
                }
                Instruction::Call(index) => self.call(index)?,
                Instruction::Swap => {
                    let top = self.stack.len();
                    if top < floor + 2 {
                        return Err(InterpreterError::BadStackPointer);
                    }
                    self.stack.swap(top - 1, top - 2);
                }
                Instruction::Add => self.binary(floor, |a, b| a + b)?,
                Instruction::Sub => self.binary(floor, |a, b| a - b)?,
                Instruction::Mul => self.binary(floor, |a, b| a * b)?,
                Instruction::Div => self.binary(floor, |a, b| a / b)?,
                Instruction::Rem => self.binary(floor, |a, b| a % b)?,
                Instruction::Pow => self.binary(floor, Number::pow)?,
                Instruction::Neg => self.unary(floor, |a| -a)?,
                Instruction::Lt => self.binary(floor, Number::less)?,
                Instruction::LtEq => self.binary(floor, Number::less_equal)?,
                Instruction::Gt => self.binary(floor, Number::greater)?,
                Instruction::GtEq => self.binary(floor, Number::greater_equal)?,
                Instruction::Eq => self.binary(floor, Number::equal)?,
                Instruction::NotEq => self.binary(floor, Number::not_equal)?,
                Instruction::And => self.binary(floor, Number::and)?,
                Instruction::Or => self.binary(floor, Number::or)?,
                Instruction::Not => self.unary(floor, Number::not)?,
                Instruction::Abs => self.unary(floor, Number::abs)?,
                Instruction::Sign => self.unary(floor, Number::sign)?,
                Instruction::Sqrt => self.unary(floor, Number::sqrt)?,
                Instruction::Cbrt => self.unary(floor, Number::cbrt)?,
                Instruction::Exp => self.unary(floor, Number::exp)?,
                Instruction::Exp2 => self.unary(floor, Number::exp2)?,
                Instruction::Log => self.unary(floor, Number::log)?,
                Instruction::Log2 => self.unary(floor, Number::log2)?,
                Instruction::Log10 => self.unary(floor, Number::log10)?,
                Instruction::Sin => self.unary(floor, Number::sin)?,
                Instruction::Cos => self.unary(floor, Number::cos)?,
                Instruction::Tan => self.unary(floor, Number::tan)?,
                Instruction::Asin => self.unary(floor, Number::asin)?,
                Instruction::Acos => self.unary(floor, Number::acos)?,
                Instruction::Atan => self.unary(floor, Number::atan)?,
                Instruction::Sinh => self.unary(floor, Number::sinh)?,
                Instruction::Cosh => self.unary(floor, Number::cosh)?,
                Instruction::Tanh => self.unary(floor, Number::tanh)?,
                Instruction::Asinh => self.unary(floor, Number::asinh)?,
                Instruction::Acosh => self.unary(floor, Number::acosh)?,
                Instruction::Atanh => self.unary(floor, Number::atanh)?,
                Instruction::Ceil => self.unary(floor, Number::ceil)?,
                Instruction::Floor => self.unary(floor, Number::floor)?,
                Instruction::Round => self.unary(floor, Number::round)?,
                Instruction::Trunc => self.unary(floor, Number::trunc)?,
                Instruction::Atan2 => self.binary(floor, Number::atan2)?,
                Instruction::LogB => self.binary(floor, Number::logb)?,
                Instruction::ScaleB => self.binary(floor, Number::scalb)?,
                Instruction::Min => self.binary(floor, Number::min)?,
                Instruction::Max => self.binary(floor, Number::max)?,
                Instruction::MinMag => self.binary(floor, Number::minmag)?,
                Instruction::MaxMag => self.binary(floor, Number::maxmag)?,
                Instruction::CopySign => self.binary(floor, Number::copysign)?,
                Instruction::Fma => self.ternary(floor, Number::fma)?,
                Instruction::Clamp => self.ternary(floor, Number::clamp)?,
            }
            pc = pc.next();
        }
    }

    /// Call protocol: the arguments on top of the stack become the new
    /// frame. The callee inherits the caller's output register and its
    /// final value becomes the call's value; the caller's register is
    /// restored afterwards.
    fn call(&mut self, index: FunctionIndex) -> Result<()> {
        let program = self
            .compiled
            .functions
            .get(index.0 as usize)
            .cloned()
            .ok_or(InterpreterError::BadAddress)?;
        if self.depth == limits::MAX_CALL_DEPTH {
            return Err(InterpreterError::CallDepthExceeded);
        }
        if self.stack.len() < program.arity() {
            return Err(InterpreterError::BadStackPointer);
        }
        let frame = self.stack.len() - program.arity();
        let caller_y = self.y;
        self.depth += 1;
        let outcome = self.run(&program, frame);
        self.depth -= 1;
        outcome?;
        let value = self.y;
        self.y = caller_y;
        self.stack.truncate(frame);
        self.push(value)
    }

    fn push(&mut self, value: Number) -> Result<()> {
        if self.stack.len() == limits::MAX_OPERAND_STACK {
            return Err(InterpreterError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, floor: usize) -> Result<Number> {
        if self.stack.len() <= floor {
            return Err(InterpreterError::BadStackPointer);
        }
        self.stack.pop().ok_or(InterpreterError::BadStackPointer)
    }

    fn unary(&mut self, floor: usize, f: fn(Number) -> Number) -> Result<()> {
        let a = self.pop(floor)?;
        self.push(f(a))
    }

    fn binary(&mut self, floor: usize, f: fn(Number, Number) -> Number) -> Result<()> {
        let b = self.pop(floor)?;
        let a = self.pop(floor)?;
        self.push(f(a, b))
    }

    fn ternary(&mut self, floor: usize, f: fn(Number, Number, Number) -> Number) -> Result<()> {
        let c = self.pop(floor)?;
        let b = self.pop(floor)?;
        let a = self.pop(floor)?;
        self.push(f(a, b, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{parse, tokenize};
    use crate::mach::emit::emit;
    use pretty_assertions::assert_eq;

    fn interpreter(src: &str) -> Interpreter {
        let parsed = parse(tokenize(src).unwrap()).unwrap();
        let settings = parsed
            .parameters
            .iter()
            .map(|p| Number(p.default()))
            .collect();
        let compiled = emit(&parsed).unwrap();
        Interpreter::new(compiled, settings)
    }

    #[test]
    fn test_empty_calculation_yields_default_output() {
        assert_eq!(interpreter("[]{}").calculate(5.0).unwrap(), 1.0);
    }

    #[test]
    fn test_linear_curve() {
        let mut i = interpreter("[] { y := x * 2 + 1; }");
        assert_eq!(i.calculate(0.0).unwrap(), 1.0);
        assert_eq!(i.calculate(4.0).unwrap(), 9.0);
    }

    #[test]
    fn test_parameter_seeding_and_update() {
        let mut i = interpreter("[Accel := 2;] { y := Accel * x; }");
        assert_eq!(i.calculate(3.0).unwrap(), 6.0);
        i.set_setting(0, Number(4.0));
        assert_eq!(i.calculate(3.0).unwrap(), 12.0);
    }

    #[test]
    fn test_function_call_combines_outputs() {
        // y starts at 1; f inherits it and finishes at 2; the caller
        // gets its own 1 back and adds the returned 2.
        let mut i = interpreter("[] fn f(p) { y += p; } { y += f(1); }");
        assert_eq!(i.calculate(0.0).unwrap(), 3.0);
    }

    #[test]
    fn test_recursive_factorial() {
        let mut i = interpreter(
            "[] fn fact(n) { if (n <= 1) { y := 1; ret; } y := n * fact(n - 1); } { y := fact(x); }",
        );
        assert_eq!(i.calculate(1.0).unwrap(), 1.0);
        assert_eq!(i.calculate(5.0).unwrap(), 120.0);
        assert_eq!(i.calculate(10.0).unwrap(), 3628800.0);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut i = interpreter("[] fn f() { y := f(); } { y := f(); }");
        assert_eq!(
            i.calculate(0.0).unwrap_err(),
            InterpreterError::CallDepthExceeded
        );
    }

    #[test]
    fn test_instruction_budget() {
        let mut i = interpreter("[] { while (1) { } }");
        assert_eq!(
            i.calculate(0.0).unwrap_err(),
            InterpreterError::BudgetExhausted
        );
    }

    #[test]
    fn test_persistent_rollback_between_samples() {
        // `let` state is rolled back after every sample.
        let mut i = interpreter("[] let a := 0; { a += 1; y := a; }");
        assert_eq!(i.calculate_all(&[0.0, 0.0, 0.0]).unwrap(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_impersistent_survives_samples() {
        // `var` state carries across samples within one batch.
        let mut i = interpreter("[] var c := 0; { c += 1; y := c; }");
        assert_eq!(i.calculate_all(&[0.0, 0.0, 0.0]).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_initializers_see_parameters() {
        let mut i = interpreter("[Base := 3;] const k := Base * 2; { y := k; }");
        assert_eq!(i.calculate(0.0).unwrap(), 6.0);
    }

    #[test]
    fn test_initializers_run_in_order() {
        let mut i = interpreter("[] const a := 2; const b := a + 1; { y := b; }");
        assert_eq!(i.calculate(0.0).unwrap(), 3.0);
    }

    #[test]
    fn test_output_reset_between_samples() {
        let mut i = interpreter("[] { y += x; }");
        assert_eq!(i.calculate_all(&[1.0, 2.0]).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_input_register_writable() {
        let mut i = interpreter("[] { x := x + 1; y := x; }");
        assert_eq!(i.calculate(4.0).unwrap(), 5.0);
    }

    #[test]
    fn test_distribution_walks_cursor() {
        let mut i = interpreter("[] { y := x; } distribution(4) { x += 1; }");
        assert_eq!(i.distribution().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_distribution_repeatable() {
        let mut i = interpreter("[] { y := x; } distribution(3) { x += 0.5; }");
        let first = i.distribution().unwrap();
        let second = i.distribution().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_math_intrinsics_evaluate() {
        let mut i = interpreter("[] { y := clamp(fma(x, 2, 1), 0, 10) + min(x, 0); }");
        assert_eq!(i.calculate(3.0).unwrap(), 7.0);
        assert_eq!(i.calculate(-1.0).unwrap(), -1.0);
        let mut i = interpreter("[] { y := logb(2, 8) + copysign(3, -1); }");
        assert_eq!(i.calculate(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_euler_exponent() {
        let mut i = interpreter("[] { y := e ^ x; }");
        let out = i.calculate(2.0).unwrap();
        assert!((out - 2.0f64.exp()).abs() < 1e-12);
    }
}
