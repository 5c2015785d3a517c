use curvescript::Script;

/// Compiles a script, panicking with the rendered error on failure so
/// test output shows the message a user would see.
pub fn script(source: &str) -> Script {
    match Script::from_source(source) {
        Ok(script) => script,
        Err(e) => panic!("{}", e),
    }
}

/// One output for one input, from a fresh initialization.
pub fn calculate(source: &str, input: f64) -> f64 {
    match script(source).calculate(input) {
        Ok(output) => output,
        Err(e) => panic!("{}", e),
    }
}
