use crate::error::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

/// A bounded, host-adjustable script input. Parameters occupy the low
/// end of the persistent address space, fixed at script-load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    line: u32,
    kind: ParameterKind,
    default: f64,
    lower: Option<Bound>,
    upper: Option<Bound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Real,
    /// Declared with a `true`/`false` default; carries no bounds.
    Logical,
}

/// One-sided limit on a parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Parameter {
    /// Construction fails if the bounds contradict each other or the
    /// default violates them.
    pub fn new(
        name: &str,
        line: u32,
        default: f64,
        lower: Option<Bound>,
        upper: Option<Bound>,
    ) -> Result<Parameter> {
        if let (Some(lo), Some(hi)) = (lower, upper) {
            let contradictory = if lo.inclusive && hi.inclusive {
                lo.value > hi.value
            } else {
                lo.value >= hi.value
            };
            if contradictory {
                return Err(ParseError::ContradictoryBounds {
                    line,
                    name: name.to_string(),
                });
            }
        }
        let parameter = Parameter {
            name: name.to_string(),
            line,
            kind: ParameterKind::Real,
            default,
            lower,
            upper,
        };
        if !parameter.accepts(default) {
            return Err(ParseError::DefaultOutOfBounds {
                line,
                name: name.to_string(),
            });
        }
        Ok(parameter)
    }

    pub fn logical(name: &str, line: u32, default: bool) -> Parameter {
        Parameter {
            name: name.to_string(),
            line,
            kind: ParameterKind::Logical,
            default: if default { 1.0 } else { 0.0 },
            lower: None,
            upper: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source line the parameter was declared on.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn default(&self) -> f64 {
        self.default
    }

    pub fn lower(&self) -> Option<Bound> {
        self.lower
    }

    pub fn upper(&self) -> Option<Bound> {
        self.upper
    }

    /// Whether `value` satisfies the declared bounds.
    pub fn accepts(&self, value: f64) -> bool {
        if let Some(lo) = self.lower {
            let ok = if lo.inclusive {
                value >= lo.value
            } else {
                value > lo.value
            };
            if !ok {
                return false;
            }
        }
        if let Some(hi) = self.upper {
            let ok = if hi.inclusive {
                value <= hi.value
            } else {
                value < hi.value
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} := {}", self.name, self.default)?;
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => write!(
                f,
                " {}{} {}{}",
                if lo.inclusive { '[' } else { '(' },
                lo.value,
                hi.value,
                if hi.inclusive { ']' } else { ')' },
            ),
            (Some(lo), None) => write!(
                f,
                " {}{}}}",
                if lo.inclusive { '[' } else { '(' },
                lo.value,
            ),
            (None, Some(hi)) => write!(
                f,
                " {{{}{}",
                hi.value,
                if hi.inclusive { ']' } else { ')' },
            ),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(value: f64, inclusive: bool) -> Option<Bound> {
        Some(Bound { value, inclusive })
    }

    #[test]
    fn test_unbounded() {
        let p = Parameter::new("Accel", 1, 0.005, None, None).unwrap();
        assert!(p.accepts(-1e300));
        assert!(p.accepts(1e300));
        assert_eq!(p.kind(), ParameterKind::Real);
    }

    #[test]
    fn test_exclusive_lower() {
        let p = Parameter::new("Accel", 1, 0.005, bound(0.0, false), None).unwrap();
        assert!(!p.accepts(0.0));
        assert!(p.accepts(0.000001));
    }

    #[test]
    fn test_inclusive_range() {
        let p = Parameter::new("Smooth", 1, 0.5, bound(0.0, true), bound(1.0, true)).unwrap();
        assert!(p.accepts(0.0));
        assert!(p.accepts(1.0));
        assert!(!p.accepts(1.0000001));
    }

    #[test]
    fn test_default_must_satisfy_bounds() {
        let err = Parameter::new("Cap", 3, 0.0, bound(0.0, false), None).unwrap_err();
        assert_eq!(
            err,
            ParseError::DefaultOutOfBounds {
                line: 3,
                name: "Cap".to_string()
            }
        );
    }

    #[test]
    fn test_contradictory_bounds() {
        let err = Parameter::new("Cap", 2, 5.0, bound(10.0, true), bound(0.0, true)).unwrap_err();
        assert_eq!(
            err,
            ParseError::ContradictoryBounds {
                line: 2,
                name: "Cap".to_string()
            }
        );
        // A point range is legal only when both ends are inclusive.
        assert!(Parameter::new("P", 1, 5.0, bound(5.0, true), bound(5.0, true)).is_ok());
        assert!(Parameter::new("P", 1, 5.0, bound(5.0, false), bound(5.0, true)).is_err());
    }

    #[test]
    fn test_logical() {
        let p = Parameter::logical("Gain", 1, true);
        assert_eq!(p.default(), 1.0);
        assert_eq!(p.kind(), ParameterKind::Logical);
        assert_eq!(p.line(), 1);
    }
}
