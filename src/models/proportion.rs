//! Exact rhythmic values
//!
//! A [`Proportion`] is used both as a duration ("music time", measured in minims) and as
//! a tempo-scaling factor (sesquialtera 3/2, dupla 2/1, ...).
//!
//! Construction never reduces: `3/2` and `6/4` are distinct values for display, but
//! compare equal. Arithmetic results are returned reduced so long sums stay small.

use crate::error::ModelParseError;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawProportion")]
pub struct Proportion {
    num: i64,
    den: i64,
}

/// Wire form, checked before it becomes a `Proportion`
#[derive(Deserialize)]
struct RawProportion {
    num: i64,
    den: i64,
}

impl TryFrom<RawProportion> for Proportion {
    type Error = ModelParseError;

    fn try_from(raw: RawProportion) -> Result<Self, Self::Error> {
        Proportion::try_new(raw.num, raw.den).ok_or(ModelParseError::ZeroDenominator(raw.num))
    }
}

impl Proportion {
    pub const ZERO: Proportion = Proportion { num: 0, den: 1 };
    pub const ONE: Proportion = Proportion { num: 1, den: 1 };

    /// Create a proportion exactly as written (no reduction).
    ///
    /// A negative denominator is normalised into the numerator.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "Proportion denominator must be non-zero");
        if den < 0 {
            Proportion { num: -num, den: -den }
        } else {
            Proportion { num, den }
        }
    }

    /// Like [`Proportion::new`], but `None` for a zero denominator
    pub fn try_new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            None
        } else {
            Some(Self::new(num, den))
        }
    }

    pub fn numer(&self) -> i64 {
        self.num
    }

    /// Always positive
    pub fn denom(&self) -> i64 {
        self.den
    }

    pub fn whole(n: i64) -> Self {
        Proportion { num: n, den: 1 }
    }

    /// Canonical lowest-terms form
    pub fn reduce(&self) -> Self {
        if self.num == 0 {
            return Self::ZERO;
        }
        Self::from(self.as_ratio())
    }

    pub fn as_ratio(&self) -> Rational64 {
        Rational64::new(self.num, self.den)
    }

    /// Same numerator and denominator as written
    pub fn is_identical(&self, other: &Proportion) -> bool {
        self.num == other.num && self.den == other.den
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_integer(&self) -> bool {
        self.num % self.den == 0
    }

    /// True when the value is a whole number divisible by `n`
    pub fn is_multiple_of(&self, n: i64) -> bool {
        n != 0 && self.is_integer() && (self.num / self.den) % n == 0
    }

    pub fn greater_than(&self, other: &Proportion) -> bool {
        self > other
    }

    pub fn less_than(&self, other: &Proportion) -> bool {
        self < other
    }

    /// Quotient, or `None` when dividing by zero
    pub fn checked_div(&self, other: &Proportion) -> Option<Proportion> {
        if other.num == 0 {
            None
        } else {
            Some(Proportion::new(self.num * other.den, self.den * other.num).reduce())
        }
    }

    /// Multiply by an integer scale without changing the denominator
    pub fn scaled(&self, factor: i64) -> Proportion {
        Proportion::new(self.num * factor, self.den).reduce()
    }

    pub fn max(self, other: Proportion) -> Proportion {
        if other > self {
            other
        } else {
            self
        }
    }
}

impl Default for Proportion {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<Rational64> for Proportion {
    fn from(r: Rational64) -> Self {
        Proportion::new(*r.numer(), *r.denom())
    }
}

impl PartialEq for Proportion {
    fn eq(&self, other: &Self) -> bool {
        (self.num as i128) * (other.den as i128) == (other.num as i128) * (self.den as i128)
    }
}

impl Eq for Proportion {}

impl PartialOrd for Proportion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Proportion {
    fn cmp(&self, other: &Self) -> Ordering {
        // denominators are positive, so cross-multiplication preserves order
        ((self.num as i128) * (other.den as i128)).cmp(&((other.num as i128) * (self.den as i128)))
    }
}

impl Add for Proportion {
    type Output = Proportion;

    fn add(self, rhs: Proportion) -> Proportion {
        Proportion::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den).reduce()
    }
}

impl AddAssign for Proportion {
    fn add_assign(&mut self, rhs: Proportion) {
        *self = *self + rhs;
    }
}

impl Sub for Proportion {
    type Output = Proportion;

    fn sub(self, rhs: Proportion) -> Proportion {
        Proportion::new(self.num * rhs.den - rhs.num * self.den, self.den * rhs.den).reduce()
    }
}

impl Mul for Proportion {
    type Output = Proportion;

    fn mul(self, rhs: Proportion) -> Proportion {
        Proportion::new(self.num * rhs.num, self.den * rhs.den).reduce()
    }
}

impl Div for Proportion {
    type Output = Proportion;

    fn div(self, rhs: Proportion) -> Proportion {
        assert!(rhs.num != 0, "Proportion division by zero");
        Proportion::new(self.num * rhs.den, self.den * rhs.num).reduce()
    }
}

impl std::iter::Sum for Proportion {
    fn sum<I: Iterator<Item = Proportion>>(iter: I) -> Self {
        iter.fold(Proportion::ZERO, |acc, p| acc + p)
    }
}

impl fmt::Display for Proportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
