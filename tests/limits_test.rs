mod common;

use common::script;
use curvescript::error::InterpreterError;
use curvescript::{limits, Script, ScriptError};

fn interpreter_error(result: Result<f64, ScriptError>) -> InterpreterError {
    match result {
        Err(ScriptError::Interpret(e)) => e,
        other => panic!("expected interpreter error, got {:?}", other.err()),
    }
}

#[test]
fn test_unbounded_loop_hits_budget() {
    let mut s = script("[] { while (1) { } }");
    assert_eq!(
        interpreter_error(s.calculate(0.0)),
        InterpreterError::BudgetExhausted
    );
}

#[test]
fn test_budget_is_per_sample() {
    // A loop that fits the budget runs at every sample, not just the
    // first.
    let src = "\
[] var i := 0; {
    i := 0;
    while (i < 10000) { i += 1; }
    y := x;
}
";
    let mut s = script(src);
    assert_eq!(s.calculate_all(&[1.0, 2.0, 3.0]).unwrap(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_infinite_recursion_hits_call_depth() {
    let mut s = script("[] fn f() { y := f(); } { y := f(); }");
    assert_eq!(
        interpreter_error(s.calculate(0.0)),
        InterpreterError::CallDepthExceeded
    );
}

#[test]
fn test_deep_but_legal_recursion() {
    let src = "\
[] fn count(n) {
    if (n <= 0) { y := 0; ret; }
    y := count(n - 1) + 1;
}
{ y := count(60); }
";
    assert_eq!(script(src).calculate(0.0).unwrap(), 60.0);
}

#[test]
fn test_too_many_parameters_rejected() {
    let mut src = String::from("[");
    for i in 0..=limits::MAX_PARAMETERS {
        src.push_str(&format!("P{} := 1;", "x".repeat(i + 1)));
    }
    src.push_str("]{}");
    assert!(matches!(
        Script::from_source(&src),
        Err(ScriptError::Parse(_))
    ));
}

#[test]
fn test_too_many_declarations_rejected() {
    let mut src = String::from("[]");
    for i in 0..=limits::MAX_DECLARATIONS {
        src.push_str(&format!("let v{} := 1;", i));
    }
    src.push_str("{}");
    assert!(matches!(
        Script::from_source(&src),
        Err(ScriptError::Emit(_))
    ));
}

#[test]
fn test_identifier_length_rejected() {
    let name = "a".repeat(limits::MAX_IDENT_LEN + 1);
    assert!(matches!(
        Script::from_source(&format!("[] let {} := 1; {{}}", name)),
        Err(ScriptError::Lex(_))
    ));
}

#[test]
fn test_budget_covers_nested_calls() {
    // The budget is shared across the whole call tree; a loop spread
    // over function calls cannot dodge it.
    let src = "\
[] fn spin(n) {
    while (n > 0) { n -= 1; }
    y := 0;
}
{ while (1) { y := spin(100); } }
";
    let mut s = script(src);
    assert_eq!(
        interpreter_error(s.calculate(0.0)),
        InterpreterError::BudgetExhausted
    );
}
