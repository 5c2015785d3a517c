use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// The only value the machine knows. Doubles as a boolean: zero is
/// false, anything else is true, and comparisons produce exactly 0 or 1.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Number(pub f64);

impl Number {
    pub const ZERO: Number = Number(0.0);
    pub const ONE: Number = Number(1.0);

    pub fn as_bool(self) -> bool {
        self.0 != 0.0
    }

    fn from_bool(b: bool) -> Number {
        if b {
            Number::ONE
        } else {
            Number::ZERO
        }
    }

    // *** Logical

    pub fn and(self, rhs: Number) -> Number {
        Number::from_bool(self.as_bool() && rhs.as_bool())
    }

    pub fn or(self, rhs: Number) -> Number {
        Number::from_bool(self.as_bool() || rhs.as_bool())
    }

    pub fn not(self) -> Number {
        Number::from_bool(!self.as_bool())
    }

    // *** Comparison

    pub fn less(self, rhs: Number) -> Number {
        Number::from_bool(self.0 < rhs.0)
    }

    pub fn less_equal(self, rhs: Number) -> Number {
        Number::from_bool(self.0 <= rhs.0)
    }

    pub fn greater(self, rhs: Number) -> Number {
        Number::from_bool(self.0 > rhs.0)
    }

    pub fn greater_equal(self, rhs: Number) -> Number {
        Number::from_bool(self.0 >= rhs.0)
    }

    pub fn equal(self, rhs: Number) -> Number {
        Number::from_bool(self.0 == rhs.0)
    }

    pub fn not_equal(self, rhs: Number) -> Number {
        Number::from_bool(self.0 != rhs.0)
    }

    // *** Arithmetic beyond the operator traits

    pub fn pow(self, rhs: Number) -> Number {
        Number(self.0.powf(rhs.0))
    }

    // *** Intrinsics
    //
    // Thin wrappers over std float math except where std panics or
    // disagrees with the machine's conventions.

    pub fn abs(self) -> Number {
        Number(self.0.abs())
    }

    /// Zero keeps its sign out: `sign(0) = 0`, unlike `f64::signum`.
    pub fn sign(self) -> Number {
        if self.0 == 0.0 || self.0.is_nan() {
            Number(self.0)
        } else {
            Number(self.0.signum())
        }
    }

    pub fn sqrt(self) -> Number {
        Number(self.0.sqrt())
    }

    pub fn cbrt(self) -> Number {
        Number(self.0.cbrt())
    }

    pub fn exp(self) -> Number {
        Number(self.0.exp())
    }

    pub fn exp2(self) -> Number {
        Number(self.0.exp2())
    }

    pub fn log(self) -> Number {
        Number(self.0.ln())
    }

    pub fn log2(self) -> Number {
        Number(self.0.log2())
    }

    pub fn log10(self) -> Number {
        Number(self.0.log10())
    }

    pub fn sin(self) -> Number {
        Number(self.0.sin())
    }

    pub fn cos(self) -> Number {
        Number(self.0.cos())
    }

    pub fn tan(self) -> Number {
        Number(self.0.tan())
    }

    pub fn asin(self) -> Number {
        Number(self.0.asin())
    }

    pub fn acos(self) -> Number {
        Number(self.0.acos())
    }

    pub fn atan(self) -> Number {
        Number(self.0.atan())
    }

    pub fn sinh(self) -> Number {
        Number(self.0.sinh())
    }

    pub fn cosh(self) -> Number {
        Number(self.0.cosh())
    }

    pub fn tanh(self) -> Number {
        Number(self.0.tanh())
    }

    pub fn asinh(self) -> Number {
        Number(self.0.asinh())
    }

    pub fn acosh(self) -> Number {
        Number(self.0.acosh())
    }

    pub fn atanh(self) -> Number {
        Number(self.0.atanh())
    }

    pub fn ceil(self) -> Number {
        Number(self.0.ceil())
    }

    pub fn floor(self) -> Number {
        Number(self.0.floor())
    }

    pub fn round(self) -> Number {
        Number(self.0.round())
    }

    pub fn trunc(self) -> Number {
        Number(self.0.trunc())
    }

    pub fn atan2(self, rhs: Number) -> Number {
        Number(self.0.atan2(rhs.0))
    }

    /// `logb(base, v)`: logarithm of `v` in base `self`.
    pub fn logb(self, rhs: Number) -> Number {
        Number(rhs.0.log(self.0))
    }

    /// `scalb(v, n)`: `v * 2^n` for any real exponent.
    pub fn scalb(self, rhs: Number) -> Number {
        Number(self.0 * rhs.0.exp2())
    }

    pub fn min(self, rhs: Number) -> Number {
        Number(self.0.min(rhs.0))
    }

    pub fn max(self, rhs: Number) -> Number {
        Number(self.0.max(rhs.0))
    }

    /// Operand closer to zero; equal magnitudes resolve to the IEEE
    /// minimum of the pair.
    pub fn minmag(self, rhs: Number) -> Number {
        if self.0.abs() < rhs.0.abs() {
            self
        } else if self.0.abs() > rhs.0.abs() {
            rhs
        } else {
            self.min(rhs)
        }
    }

    /// Operand farther from zero; equal magnitudes resolve to the IEEE
    /// maximum of the pair.
    pub fn maxmag(self, rhs: Number) -> Number {
        if self.0.abs() > rhs.0.abs() {
            self
        } else if self.0.abs() < rhs.0.abs() {
            rhs
        } else {
            self.max(rhs)
        }
    }

    pub fn copysign(self, rhs: Number) -> Number {
        Number(self.0.copysign(rhs.0))
    }

    pub fn fma(self, b: Number, c: Number) -> Number {
        Number(self.0.mul_add(b.0, c.0))
    }

    /// `f64::clamp` panics when the range is inverted; script input is
    /// never trusted that far.
    pub fn clamp(self, lo: Number, hi: Number) -> Number {
        if self.0 < lo.0 {
            lo
        } else if self.0 > hi.0 {
            hi
        } else {
            self
        }
    }
}

impl Add for Number {
    type Output = Number;
    fn add(self, rhs: Number) -> Number {
        Number(self.0 + rhs.0)
    }
}

impl Sub for Number {
    type Output = Number;
    fn sub(self, rhs: Number) -> Number {
        Number(self.0 - rhs.0)
    }
}

impl Mul for Number {
    type Output = Number;
    fn mul(self, rhs: Number) -> Number {
        Number(self.0 * rhs.0)
    }
}

impl Div for Number {
    type Output = Number;
    fn div(self, rhs: Number) -> Number {
        Number(self.0 / rhs.0)
    }
}

impl Rem for Number {
    type Output = Number;
    fn rem(self, rhs: Number) -> Number {
        Number(self.0 % rhs.0)
    }
}

impl Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        Number(-self.0)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Number {
        Number(n)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
