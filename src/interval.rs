//! Closed-interval arithmetic with guaranteed (conservative) bounds.
//!
//! Every operation returns an interval that contains all pointwise results of
//! its operands. Division by an interval containing zero widens to the whole
//! real line instead of failing, so downstream containment and disjointness
//! tests stay uniform.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Construction tolerance: bounds may be out of order by at most this much
/// before the interval is rejected.
const BOUND_TOLERANCE: f64 = 1e-12;

/// Fouten bij constructie en doorsnede van intervallen.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum IntervalError {
    #[error("invalid interval: lower bound {lo} exceeds upper bound {hi}")]
    InvalidInterval { lo: f64, hi: f64 },
    #[error("intervals [{0}, {1}] and [{2}, {3}] are disjoint")]
    EmptyIntersection(f64, f64, f64, f64),
}

/// A closed interval `[lo, hi]` with `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    /// The whole real line; absorbing element for division by zero.
    pub const ENTIRE: Self = Self {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    /// Creates an interval, rejecting reversed or non-finite bounds. NaN in
    /// particular must not slip through: its comparisons are all false, which
    /// would otherwise pass the ordering check.
    pub fn new(lo: f64, hi: f64) -> Result<Self, IntervalError> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi + BOUND_TOLERANCE {
            return Err(IntervalError::InvalidInterval { lo, hi });
        }
        // Repair sub-tolerance inversions from rounding without hiding
        // genuinely malformed input.
        Ok(Self {
            lo: lo.min(hi),
            hi,
        })
    }

    /// Degenerate interval `[v, v]`.
    #[must_use]
    pub const fn point(v: f64) -> Self {
        Self { lo: v, hi: v }
    }

    /// Internal constructor for bounds already known to be ordered.
    pub(crate) const fn raw(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub const fn lo(&self) -> f64 {
        self.lo
    }

    #[must_use]
    pub const fn hi(&self) -> f64 {
        self.hi
    }

    /// Midpoint `(lo + hi) / 2`.
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// True iff `self` is fully contained in `other`.
    #[must_use]
    pub fn is_in(&self, other: &Self) -> bool {
        other.lo <= self.lo && self.hi <= other.hi
    }

    /// True iff `self` and `other` share no point.
    #[must_use]
    pub fn is_no_intersec(&self, other: &Self) -> bool {
        self.hi < other.lo || other.hi < self.lo
    }

    /// Overlap of two intervals; fails when they are disjoint.
    pub fn intersect(&self, other: &Self) -> Result<Self, IntervalError> {
        if self.is_no_intersec(other) {
            return Err(IntervalError::EmptyIntersection(
                self.lo, self.hi, other.lo, other.hi,
            ));
        }
        Ok(Self {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        })
    }

    /// Integer power with the usual even-exponent tightening around zero.
    #[must_use]
    pub fn powi(&self, exp: i32) -> Self {
        if exp == 0 {
            return Self::point(1.0);
        }
        if exp < 0 {
            return Self::point(1.0) / self.powi(-exp);
        }
        let a = pow_bound(self.lo, exp);
        let b = pow_bound(self.hi, exp);
        if exp % 2 == 1 {
            Self { lo: a, hi: b }
        } else if self.lo >= 0.0 {
            Self { lo: a, hi: b }
        } else if self.hi <= 0.0 {
            Self { lo: b, hi: a }
        } else {
            Self {
                lo: 0.0,
                hi: a.max(b),
            }
        }
    }

    /// Tight sine enclosure, tracking the monotone sub-ranges of the argument.
    #[must_use]
    pub fn sin(&self) -> Self {
        (*self - std::f64::consts::FRAC_PI_2).cos()
    }

    /// Tight cosine enclosure, tracking the monotone sub-ranges of the
    /// argument rather than sampling endpoints only.
    #[must_use]
    pub fn cos(&self) -> Self {
        use std::f64::consts::PI;
        let period = 2.0 * PI;
        if !self.width().is_finite() || self.width() >= period {
            return Self { lo: -1.0, hi: 1.0 };
        }
        let a = self.lo.cos();
        let b = self.hi.cos();
        let mut lo = a.min(b);
        let mut hi = a.max(b);
        if contains_multiple(self.lo, self.hi, 0.0, period) {
            hi = 1.0;
        }
        if contains_multiple(self.lo, self.hi, PI, period) {
            lo = -1.0;
        }
        Self { lo, hi }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// True when some `offset + k * period` (integer `k`) lies within `[lo, hi]`.
fn contains_multiple(lo: f64, hi: f64, offset: f64, period: f64) -> bool {
    let k = ((lo - offset) / period).ceil();
    let candidate = offset + k * period;
    candidate <= hi
}

fn pow_bound(base: f64, exp: i32) -> f64 {
    base.powi(exp)
}

/// Product of bounds with the interval-arithmetic convention `0 * inf = 0`,
/// which keeps `ENTIRE` absorbing instead of producing NaN.
fn mul_bound(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

impl Add for Interval {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            lo: self.lo + rhs.lo,
            hi: self.hi + rhs.hi,
        }
    }
}

impl Add<f64> for Interval {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        Self {
            lo: self.lo + rhs,
            hi: self.hi + rhs,
        }
    }
}

impl Sub for Interval {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            lo: self.lo - rhs.hi,
            hi: self.hi - rhs.lo,
        }
    }
}

impl Sub<f64> for Interval {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self {
        Self {
            lo: self.lo - rhs,
            hi: self.hi - rhs,
        }
    }
}

impl Mul for Interval {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let p1 = mul_bound(self.lo, rhs.lo);
        let p2 = mul_bound(self.lo, rhs.hi);
        let p3 = mul_bound(self.hi, rhs.lo);
        let p4 = mul_bound(self.hi, rhs.hi);
        Self {
            lo: p1.min(p2).min(p3).min(p4),
            hi: p1.max(p2).max(p3).max(p4),
        }
    }
}

impl Mul<f64> for Interval {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self * Self::point(rhs)
    }
}

impl Div for Interval {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.lo <= 0.0 && rhs.hi >= 0.0 {
            return Self::ENTIRE;
        }
        let reciprocal = Self {
            lo: 1.0 / rhs.hi,
            hi: 1.0 / rhs.lo,
        };
        self * reciprocal
    }
}

impl Div<f64> for Interval {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self / Self::point(rhs)
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            lo: -self.hi,
            hi: -self.lo,
        }
    }
}
