//! Symbolic expressions for the one-time synthesis of contraction operators.
//!
//! The constraint systems this engine targets are small (two or four
//! unknowns), so the expression tree stays naive: differentiation and
//! substitution clone subtrees, and `simplify` folds constants so that a
//! structurally zero determinant can be recognised before an operator is
//! lowered.

pub mod matrix;

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Symbolic expression tree over real-valued variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Pow(Box<Expr>, i32),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
}

impl Expr {
    /// Variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    #[must_use]
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    #[must_use]
    pub fn powi(self, exp: i32) -> Self {
        Self::Pow(self.boxed(), exp)
    }

    #[must_use]
    pub fn sin(self) -> Self {
        Self::Sin(self.boxed())
    }

    #[must_use]
    pub fn cos(self) -> Self {
        Self::Cos(self.boxed())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Const(v) if *v == 0.0)
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, Self::Const(v) if *v == 1.0)
    }

    /// Partial derivative with respect to `var`.
    #[must_use]
    pub fn diff(&self, var: &str) -> Self {
        match self {
            Self::Const(_) => Self::Const(0.0),
            Self::Var(name) => {
                if name == var {
                    Self::Const(1.0)
                } else {
                    Self::Const(0.0)
                }
            }
            Self::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Self::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Self::Mul(lhs, rhs) => {
                lhs.diff(var) * (**rhs).clone() + (**lhs).clone() * rhs.diff(var)
            }
            Self::Div(num, den) => {
                let num_part = num.diff(var) * (**den).clone() - (**num).clone() * den.diff(var);
                num_part / (**den).clone().powi(2)
            }
            Self::Neg(inner) => -inner.diff(var),
            Self::Pow(base, exp) => {
                Self::Const(f64::from(*exp))
                    * (**base).clone().powi(exp - 1)
                    * base.diff(var)
            }
            Self::Sin(inner) => (**inner).clone().cos() * inner.diff(var),
            Self::Cos(inner) => -((**inner).clone().sin() * inner.diff(var)),
        }
    }

    /// Replaces every occurrence of `var` with `replacement`.
    #[must_use]
    pub fn substitute(&self, var: &str, replacement: &Self) -> Self {
        match self {
            Self::Const(_) => self.clone(),
            Self::Var(name) => {
                if name == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Self::Add(lhs, rhs) => Self::Add(
                lhs.substitute(var, replacement).boxed(),
                rhs.substitute(var, replacement).boxed(),
            ),
            Self::Sub(lhs, rhs) => Self::Sub(
                lhs.substitute(var, replacement).boxed(),
                rhs.substitute(var, replacement).boxed(),
            ),
            Self::Mul(lhs, rhs) => Self::Mul(
                lhs.substitute(var, replacement).boxed(),
                rhs.substitute(var, replacement).boxed(),
            ),
            Self::Div(num, den) => Self::Div(
                num.substitute(var, replacement).boxed(),
                den.substitute(var, replacement).boxed(),
            ),
            Self::Neg(inner) => Self::Neg(inner.substitute(var, replacement).boxed()),
            Self::Pow(base, exp) => Self::Pow(base.substitute(var, replacement).boxed(), *exp),
            Self::Sin(inner) => Self::Sin(inner.substitute(var, replacement).boxed()),
            Self::Cos(inner) => Self::Cos(inner.substitute(var, replacement).boxed()),
        }
    }

    /// Replaces pairs of `(variable, replacement)` in one pass over the tree.
    #[must_use]
    pub fn substitute_all(&self, pairs: &[(&str, Self)]) -> Self {
        let mut current = self.clone();
        for (var, replacement) in pairs {
            current = current.substitute(var, replacement);
        }
        current
    }

    /// Constant folding and identity elimination. Not a full CAS rewrite:
    /// just enough to keep lowered operators cheap and to let a determinant
    /// that cancels to zero be detected.
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self {
            Self::Const(_) | Self::Var(_) => self.clone(),
            Self::Add(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Self::Const(a), Self::Const(b)) => Self::Const(a + b),
                    _ if lhs.is_zero() => rhs,
                    _ if rhs.is_zero() => lhs,
                    _ => lhs + rhs,
                }
            }
            Self::Sub(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Self::Const(a), Self::Const(b)) => Self::Const(a - b),
                    _ if rhs.is_zero() => lhs,
                    _ if lhs.is_zero() => -rhs,
                    _ if lhs == rhs => Self::Const(0.0),
                    _ => lhs - rhs,
                }
            }
            Self::Mul(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Self::Const(a), Self::Const(b)) => Self::Const(a * b),
                    _ if lhs.is_zero() || rhs.is_zero() => Self::Const(0.0),
                    _ if lhs.is_one() => rhs,
                    _ if rhs.is_one() => lhs,
                    _ => lhs * rhs,
                }
            }
            Self::Div(num, den) => {
                let num = num.simplify();
                let den = den.simplify();
                match (&num, &den) {
                    (Self::Const(a), Self::Const(b)) if *b != 0.0 => Self::Const(a / b),
                    _ if num.is_zero() && !den.is_zero() => Self::Const(0.0),
                    _ if den.is_one() => num,
                    _ => num / den,
                }
            }
            Self::Neg(inner) => match inner.simplify() {
                Self::Const(v) => Self::Const(-v),
                Self::Neg(original) => *original,
                other => -other,
            },
            Self::Pow(base, exp) => {
                let base = base.simplify();
                match (&base, exp) {
                    (_, 0) => Self::Const(1.0),
                    (_, 1) => base,
                    (Self::Const(v), _) => Self::Const(v.powi(*exp)),
                    _ => base.powi(*exp),
                }
            }
            Self::Sin(inner) => match inner.simplify() {
                Self::Const(v) => Self::Const(v.sin()),
                other => other.sin(),
            },
            Self::Cos(inner) => match inner.simplify() {
                Self::Const(v) => Self::Const(v.cos()),
                other => other.cos(),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Var(name) => write!(f, "{name}"),
            Self::Add(lhs, rhs) => write!(f, "({lhs} + {rhs})"),
            Self::Sub(lhs, rhs) => write!(f, "({lhs} - {rhs})"),
            Self::Mul(lhs, rhs) => write!(f, "({lhs} * {rhs})"),
            Self::Div(num, den) => write!(f, "({num} / {den})"),
            Self::Neg(inner) => write!(f, "(-{inner})"),
            Self::Pow(base, exp) => write!(f, "({base}^{exp})"),
            Self::Sin(inner) => write!(f, "sin({inner})"),
            Self::Cos(inner) => write!(f, "cos({inner})"),
        }
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::Add(self.boxed(), rhs.boxed())
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::Sub(self.boxed(), rhs.boxed())
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::Mul(self.boxed(), rhs.boxed())
    }
}

impl Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::Div(self.boxed(), rhs.boxed())
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Neg(self.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::Expr;

    #[test]
    fn differentiates_square() {
        let expr = Expr::var("v1").powi(2);
        let derivative = expr.diff("v1").simplify();
        assert_eq!(derivative, Expr::Const(2.0) * Expr::var("v1"));
    }

    #[test]
    fn differentiates_trig_chain() {
        let expr = (Expr::Const(2.0) * Expr::var("v1")).sin();
        let derivative = expr.diff("v1").simplify();
        // cos(2 v1) * 2
        assert_eq!(
            derivative,
            (Expr::Const(2.0) * Expr::var("v1")).cos() * Expr::Const(2.0)
        );
    }

    #[test]
    fn derivative_of_unrelated_variable_vanishes() {
        let expr = Expr::var("v1").powi(2) + Expr::var("u1");
        assert!(expr.diff("v2").simplify().is_zero());
    }

    #[test]
    fn substitution_replaces_every_occurrence() {
        let expr = Expr::var("v1") * Expr::var("v1") + Expr::var("v2");
        let substituted = expr.substitute("v1", &Expr::Const(3.0)).simplify();
        assert_eq!(substituted, Expr::Const(9.0) + Expr::var("v2"));
    }

    #[test]
    fn simplify_folds_identities() {
        let expr = (Expr::var("x") + Expr::Const(0.0)) * Expr::Const(1.0)
            - Expr::Const(0.0) * Expr::var("y");
        assert_eq!(expr.simplify(), Expr::var("x"));
    }

    #[test]
    fn self_cancellation_collapses_to_zero() {
        let expr = Expr::var("x") - Expr::var("x");
        assert!(expr.simplify().is_zero());
    }
}
