use curvescript::{Script, ScriptError};

fn message(source: &str) -> String {
    match Script::from_source(source) {
        Err(e) => format!("{}", e),
        Ok(_) => panic!("expected a compile error"),
    }
}

#[test]
fn test_lex_errors_carry_line_numbers() {
    assert_eq!(
        message("desc\n[]\n{ y := 1 @ 2; }"),
        "line 3: unsupported character '@'"
    );
    assert_eq!(
        message("[] { y := 1.2.3; }"),
        "line 1: malformed number \"1.2.3\""
    );
}

#[test]
fn test_parse_errors_carry_line_numbers() {
    assert_eq!(
        message("[]\n{\n  y := speed;\n}"),
        "line 3: \"speed\" has not been declared"
    );
    assert_eq!(
        message("[A := 1;]\n{ A := 2; }"),
        "line 2: \"A\" cannot be assigned"
    );
}

#[test]
fn test_missing_sections() {
    assert_eq!(message("just a description"), "script has no parameter section");
    assert_eq!(message("[]"), "script has no calculation callback");
}

#[test]
fn test_wrong_intrinsic_arity() {
    assert_eq!(
        message("[] { y := atan2(1, 2, 3); }"),
        "line 1: atan2 takes 2 argument(s)"
    );
}

#[test]
fn test_runtime_error_rendering() {
    let mut s = Script::from_source("[] { while (1) { } }").unwrap();
    match s.calculate(0.0) {
        Err(e @ ScriptError::Interpret(_)) => {
            assert_eq!(format!("{}", e), "instruction budget exhausted");
        }
        other => panic!("unexpected {:?}", other.err()),
    }
}
