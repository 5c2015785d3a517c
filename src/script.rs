use crate::error::ScriptError;
use crate::lang::{parse, tokenize, Parameter};
use crate::mach::{emit, Interpreter, Number};
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, ScriptError>;

/// A loaded script: its description, its adjustable parameters, and a
/// machine ready to run it. This is the whole public surface; the
/// pipeline stages behind it are not exposed.
pub struct Script {
    description: String,
    parameters: Vec<Parameter>,
    settings: Vec<f64>,
    interpreter: Interpreter,
}

impl Script {
    /// Compiles a script from source text. Every parameter starts at
    /// its declared default.
    pub fn from_source(source: &str) -> Result<Script> {
        let lexed = tokenize(source)?;
        debug!(tokens = lexed.tokens.len(), "lexed");
        let parsed = parse(lexed)?;
        debug!(
            parameters = parsed.parameters.len(),
            declarations = parsed.declarations.len(),
            "parsed"
        );
        let compiled = emit(&parsed)?;
        debug!(functions = compiled.functions.len(), "emitted");
        let settings: Vec<f64> = parsed.parameters.iter().map(|p| p.default()).collect();
        let interpreter =
            Interpreter::new(compiled, settings.iter().map(|v| Number(*v)).collect());
        Ok(Script {
            description: parsed.description,
            parameters: parsed.parameters,
            settings,
            interpreter,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Script> {
        Script::from_source(&std::fs::read_to_string(path)?)
    }

    /// Free text preceding the parameter section.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Current value of a parameter.
    pub fn setting(&self, name: &str) -> Result<f64> {
        let index = self.index_of(name)?;
        Ok(self.settings[index])
    }

    /// Adjusts a parameter. The value must satisfy the declared bounds
    /// and takes effect on the next calculation or distribution.
    pub fn set_setting(&mut self, name: &str, value: f64) -> Result<()> {
        let index = self.index_of(name)?;
        if !self.parameters[index].accepts(value) {
            return Err(ScriptError::SettingOutOfBounds {
                name: name.to_string(),
                value,
            });
        }
        self.settings[index] = value;
        self.interpreter.set_setting(index, Number(value));
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.parameters
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| ScriptError::UnknownParameter(name.to_string()))
    }

    /// Runs the calculation callback for one input.
    pub fn calculate(&mut self, input: f64) -> Result<f64> {
        Ok(self.interpreter.calculate(input)?)
    }

    /// Runs the calculation callback over a batch of inputs with a
    /// single initialization, so impersistent state carries through.
    pub fn calculate_all(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        Ok(self.interpreter.calculate_all(inputs)?)
    }

    pub fn has_distribution(&self) -> bool {
        self.interpreter.has_distribution()
    }

    /// Generates the script's custom sample grid.
    pub fn distribution(&mut self) -> Result<Vec<f64>> {
        if !self.has_distribution() {
            return Err(ScriptError::MissingDistribution);
        }
        Ok(self.interpreter.distribution()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ParameterKind;

    const CLASSIC: &str = "\
Classic acceleration curve.

[
    Accel := 0.005 (0};
    Cap := 15 [0};
    Power := 2 (1};
]

{
    y += (Accel * x) ^ (Power - 1);
    y := min(y, Cap);
}
";

    #[test]
    fn test_description_and_parameters() {
        let script = Script::from_source(CLASSIC).unwrap();
        assert_eq!(script.description(), "Classic acceleration curve.");
        let names: Vec<&str> = script.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Accel", "Cap", "Power"]);
        assert_eq!(script.parameters()[0].kind(), ParameterKind::Real);
        assert_eq!(script.setting("Cap").unwrap(), 15.0);
    }

    #[test]
    fn test_set_setting_bounds() {
        let mut script = Script::from_source(CLASSIC).unwrap();
        script.set_setting("Accel", 0.01).unwrap();
        assert_eq!(script.setting("Accel").unwrap(), 0.01);
        assert!(matches!(
            script.set_setting("Accel", 0.0),
            Err(ScriptError::SettingOutOfBounds { .. })
        ));
        assert!(matches!(
            script.set_setting("Speed", 1.0),
            Err(ScriptError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_setting_changes_output() {
        let mut script = Script::from_source(CLASSIC).unwrap();
        let before = script.calculate(1000.0).unwrap();
        script.set_setting("Power", 3.0).unwrap();
        let after = script.calculate(1000.0).unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_missing_distribution() {
        let mut script = Script::from_source(CLASSIC).unwrap();
        assert!(!script.has_distribution());
        assert!(matches!(
            script.distribution(),
            Err(ScriptError::MissingDistribution)
        ));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("curvescript_from_file_test.cs");
        std::fs::write(&path, CLASSIC).unwrap();
        let script = Script::from_file(&path).unwrap();
        assert_eq!(script.parameters().len(), 3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_compile_error_propagates() {
        assert!(matches!(
            Script::from_source("[] { y := nope; }"),
            Err(ScriptError::Parse(_))
        ));
        assert!(matches!(
            Script::from_source("no header"),
            Err(ScriptError::Lex(_))
        ));
    }
}
