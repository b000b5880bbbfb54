//! One-time synthesis of the first-order interval contraction operator.
//!
//! Given a kinematic constraint system F(U, V; params) = 0 this derives, once
//! per mechanism, the affine interval extension
//!
//! ```text
//! K(U, V, C) = G(C) + G'(V) * (V - C),   G(V) = V - Lambda * F(V)
//! ```
//!
//! with `Lambda` the exact symbolic inverse of dF/dV evaluated at the midpoint
//! placeholders. The symbolic rows are lowered to a slot-indexed form so that
//! per-cell evaluation performs no name lookups and no allocation beyond the
//! environment vector. The synthesized operator is immutable and `Sync`; one
//! instance serves every cell of a traversal.

use crate::interval::Interval;
use crate::mechanism::Mechanism;
use crate::symbolic::Expr;
use crate::symbolic::matrix::{ExprMatrix, MatrixError};

/// Errors surfaced while deriving or evaluating an operator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("constraint system has {equations} equations for {unknowns} unknowns")]
    NotSquare { equations: usize, unknowns: usize },
    #[error("symbol `{0}` does not occur in the mechanism's symbol lists")]
    UnknownSymbol(String),
    #[error("{what} expects {expected} entries, got {found}")]
    Arity {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Expression lowered against a fixed slot layout; evaluation reads operand
/// intervals straight out of the environment vector.
#[derive(Debug, Clone)]
enum Lowered {
    Const(f64),
    Slot(usize),
    Add(Box<Lowered>, Box<Lowered>),
    Sub(Box<Lowered>, Box<Lowered>),
    Mul(Box<Lowered>, Box<Lowered>),
    Div(Box<Lowered>, Box<Lowered>),
    Neg(Box<Lowered>),
    Pow(Box<Lowered>, i32),
    Sin(Box<Lowered>),
    Cos(Box<Lowered>),
}

impl Lowered {
    fn eval(&self, env: &[Interval]) -> Interval {
        match self {
            Self::Const(v) => Interval::point(*v),
            Self::Slot(index) => env[*index],
            Self::Add(lhs, rhs) => lhs.eval(env) + rhs.eval(env),
            Self::Sub(lhs, rhs) => lhs.eval(env) - rhs.eval(env),
            Self::Mul(lhs, rhs) => lhs.eval(env) * rhs.eval(env),
            Self::Div(num, den) => num.eval(env) / den.eval(env),
            Self::Neg(inner) => -inner.eval(env),
            Self::Pow(base, exp) => base.eval(env).powi(*exp),
            Self::Sin(inner) => inner.eval(env).sin(),
            Self::Cos(inner) => inner.eval(env).cos(),
        }
    }
}

/// Slot layout of the evaluation environment: `[u.. | v.. | vmid.. | c.. | params..]`.
#[derive(Debug, Clone, Copy)]
struct SlotLayout {
    task_dim: usize,
    dim: usize,
    param_count: usize,
}

impl SlotLayout {
    const fn total(&self) -> usize {
        self.task_dim + 3 * self.dim + self.param_count
    }
}

/// Synthesized Krawczyk-type contraction operator.
///
/// Read-only after construction; share freely across workers.
#[derive(Debug, Clone)]
pub struct KrawczykOperator {
    rows: Vec<Lowered>,
    layout: SlotLayout,
}

impl KrawczykOperator {
    /// Derives the operator for a mechanism: Jacobian, exact symbolic inverse
    /// at the midpoint placeholders, fixed-point map, its Jacobian, and the
    /// affine extension — then lowers the rows for numeric evaluation.
    ///
    /// Fails with [`MatrixError::Singular`] (wrapped) when dF/dV is
    /// structurally singular, which indicates a degenerate mechanism
    /// parametrization rather than a runtime condition.
    pub fn synthesize(mechanism: &Mechanism) -> Result<Self, SynthesisError> {
        let v_symbols = mechanism.v_symbols();
        let dim = v_symbols.len();
        if mechanism.constraints().len() != dim {
            return Err(SynthesisError::NotSquare {
                equations: mechanism.constraints().len(),
                unknowns: dim,
            });
        }

        let f = ExprMatrix::column(mechanism.constraints().to_vec());
        let f_v = ExprMatrix::jacobian(mechanism.constraints(), v_symbols);

        // Lambda = (dF/dV)^-1 with V replaced by the midpoint placeholders.
        let mid_substitutions: Vec<(&str, Expr)> = v_symbols
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), Expr::var(Mechanism::mid_symbol(i))))
            .collect();
        let lambda = f_v
            .inverse()?
            .map(|entry| entry.substitute_all(&mid_substitutions).simplify());

        // G(V) = V - Lambda * F(V)
        let v_column = ExprMatrix::column(v_symbols.iter().map(Expr::var).collect());
        let g = v_column.sub(&lambda.mul(&f)?)?;

        let g_rows: Vec<Expr> = (0..dim).map(|row| g.get(row, 0).clone()).collect();
        let g_v = ExprMatrix::jacobian(&g_rows, v_symbols);

        // K_i = G_i(C) + sum_j G'_ij(V) * (V_j - C_j)
        let center_substitutions: Vec<(&str, Expr)> = v_symbols
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), Expr::var(Mechanism::center_symbol(i))))
            .collect();

        let layout = SlotLayout {
            task_dim: mechanism.u_symbols().len(),
            dim,
            param_count: mechanism.param_symbols().len(),
        };
        let slots = slot_table(mechanism);

        let mut rows = Vec::with_capacity(dim);
        for i in 0..dim {
            let g_at_center = g_rows[i].substitute_all(&center_substitutions);
            let mut row = g_at_center;
            for (j, v_name) in v_symbols.iter().enumerate() {
                let offset = Expr::var(v_name) - Expr::var(Mechanism::center_symbol(j));
                row = row + g_v.get(i, j).clone() * offset;
            }
            rows.push(lower(&row.simplify(), &slots)?);
        }

        log::debug!(
            "synthesized operator for `{}`: {} unknowns, {} parameters",
            mechanism.name(),
            dim,
            layout.param_count
        );

        Ok(Self { rows, layout })
    }

    /// Number of configuration unknowns (n).
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.layout.dim
    }

    /// Number of task-space coordinates.
    #[must_use]
    pub const fn task_dim(&self) -> usize {
        self.layout.task_dim
    }

    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.layout.param_count
    }

    /// Evaluates `K(U, V, Vmid, C, params)` into one interval per unknown.
    ///
    /// Validates the slice lengths; the classifier validates once up front and
    /// then uses the unchecked path.
    pub fn eval(
        &self,
        u: &[Interval],
        v: &[Interval],
        vmid: &[f64],
        c: &[f64],
        params: &[f64],
    ) -> Result<Vec<Interval>, SynthesisError> {
        check_arity("task box U", self.layout.task_dim, u.len())?;
        check_arity("hypothesis box V", self.layout.dim, v.len())?;
        check_arity("midpoint vector", self.layout.dim, vmid.len())?;
        check_arity("center vector", self.layout.dim, c.len())?;
        check_arity("parameter vector", self.layout.param_count, params.len())?;
        Ok(self.eval_unchecked(u, v, vmid, c, params))
    }

    /// Evaluation without arity checks; callers guarantee the layout.
    pub(crate) fn eval_unchecked(
        &self,
        u: &[Interval],
        v: &[Interval],
        vmid: &[f64],
        c: &[f64],
        params: &[f64],
    ) -> Vec<Interval> {
        let mut env = Vec::with_capacity(self.layout.total());
        env.extend_from_slice(u);
        env.extend_from_slice(v);
        env.extend(vmid.iter().copied().map(Interval::point));
        env.extend(c.iter().copied().map(Interval::point));
        env.extend(params.iter().copied().map(Interval::point));
        self.rows.iter().map(|row| row.eval(&env)).collect()
    }
}

fn check_arity(what: &'static str, expected: usize, found: usize) -> Result<(), SynthesisError> {
    if expected == found {
        Ok(())
    } else {
        Err(SynthesisError::Arity {
            what,
            expected,
            found,
        })
    }
}

/// Symbol table in environment order: u, v, vmid, c, params.
fn slot_table(mechanism: &Mechanism) -> Vec<String> {
    let dim = mechanism.v_symbols().len();
    let mut slots = Vec::new();
    slots.extend(mechanism.u_symbols().iter().cloned());
    slots.extend(mechanism.v_symbols().iter().cloned());
    slots.extend((0..dim).map(Mechanism::mid_symbol));
    slots.extend((0..dim).map(Mechanism::center_symbol));
    slots.extend(mechanism.param_symbols().iter().cloned());
    slots
}

fn lower(expr: &Expr, slots: &[String]) -> Result<Lowered, SynthesisError> {
    Ok(match expr {
        Expr::Const(v) => Lowered::Const(*v),
        Expr::Var(name) => {
            let index = slots
                .iter()
                .position(|slot| slot == name)
                .ok_or_else(|| SynthesisError::UnknownSymbol(name.clone()))?;
            Lowered::Slot(index)
        }
        Expr::Add(lhs, rhs) => Lowered::Add(
            Box::new(lower(lhs, slots)?),
            Box::new(lower(rhs, slots)?),
        ),
        Expr::Sub(lhs, rhs) => Lowered::Sub(
            Box::new(lower(lhs, slots)?),
            Box::new(lower(rhs, slots)?),
        ),
        Expr::Mul(lhs, rhs) => Lowered::Mul(
            Box::new(lower(lhs, slots)?),
            Box::new(lower(rhs, slots)?),
        ),
        Expr::Div(num, den) => Lowered::Div(
            Box::new(lower(num, slots)?),
            Box::new(lower(den, slots)?),
        ),
        Expr::Neg(inner) => Lowered::Neg(Box::new(lower(inner, slots)?)),
        Expr::Pow(base, exp) => Lowered::Pow(Box::new(lower(base, slots)?), *exp),
        Expr::Sin(inner) => Lowered::Sin(Box::new(lower(inner, slots)?)),
        Expr::Cos(inner) => Lowered::Cos(Box::new(lower(inner, slots)?)),
    })
}

#[cfg(test)]
mod tests {
    use super::{KrawczykOperator, SynthesisError};
    use crate::interval::Interval;
    use crate::mechanism::presets;
    use crate::symbolic::Expr;
    use crate::symbolic::matrix::MatrixError;

    fn iv(lo: f64, hi: f64) -> Interval {
        Interval::new(lo, hi).expect("valid interval")
    }

    /// Hand-derived K rows for the 2-RPR system. The constraints decouple, so
    /// K_i = c_i - (c_i^2 - r_i^2) / (2 m_i) + (1 - v_i / m_i) * (v_i - c_i)
    /// with r_1^2 = u1^2 + u2^2 and r_2^2 = (u1 - d)^2 + u2^2.
    fn reference_row(u_sq: Interval, v: Interval, m: f64, c: f64) -> Interval {
        let g_c = Interval::point(c) - (Interval::point(c).powi(2) - u_sq) / (2.0 * m);
        let slope = Interval::point(1.0) - v / m;
        g_c + slope * (v - c)
    }

    #[test]
    fn two_rpr_operator_matches_hand_derivation() {
        let mechanism = presets::two_rpr();
        let operator = KrawczykOperator::synthesize(&mechanism).expect("synthesizable");
        assert_eq!(operator.dim(), 2);
        assert_eq!(operator.task_dim(), 2);

        let d = 6.0;
        let u = [iv(9.0, 10.0), iv(1.0, 2.0)];
        let v = [iv(3.0, 15.0), iv(3.0, 15.0)];
        let vmid = [9.0, 9.0];
        let c = [9.0, 9.0];

        let k = operator
            .eval(&u, &v, &vmid, &c, &[d])
            .expect("matching arity");

        let r1_sq = u[0].powi(2) + u[1].powi(2);
        let r2_sq = (u[0] - Interval::point(d)).powi(2) + u[1].powi(2);
        let expected = [
            reference_row(r1_sq, v[0], vmid[0], c[0]),
            reference_row(r2_sq, v[1], vmid[1], c[1]),
        ];

        for (axis, want) in expected.iter().enumerate() {
            let got = k[axis];
            assert!(
                (got.lo() - want.lo()).abs() < 1e-9 && (got.hi() - want.hi()).abs() < 1e-9,
                "axis {axis}: got {got}, expected {want}"
            );
        }
    }

    #[test]
    fn four_bar_operator_synthesizes_with_four_unknowns() {
        let mechanism = presets::dextar();
        let operator = KrawczykOperator::synthesize(&mechanism).expect("synthesizable");
        assert_eq!(operator.dim(), 4);
        assert_eq!(operator.param_count(), 3);

        let u = [iv(1.0, 1.5), iv(2.0, 2.5)];
        let v = [iv(0.5, 1.0), iv(1.0, 1.5), iv(0.2, 0.6), iv(1.4, 1.8)];
        let vmid: Vec<f64> = v.iter().map(Interval::mid).collect();
        let k = operator
            .eval(&u, &v, &vmid, &vmid, &[7.2, 2.0, 3.0])
            .expect("matching arity");
        assert_eq!(k.len(), 4);
        for enclosure in &k {
            assert!(enclosure.lo() <= enclosure.hi());
        }
    }

    #[test]
    fn structurally_singular_system_is_refused() {
        // Both equations constrain v1 only: dF/dV has a zero column.
        let mechanism = presets::custom(
            "degenerate",
            vec![
                Expr::var("v1") - Expr::var("u1"),
                Expr::var("v1") - Expr::var("u2"),
            ],
            2,
            2,
            Vec::new(),
        );
        let err = KrawczykOperator::synthesize(&mechanism).unwrap_err();
        assert_eq!(err, SynthesisError::Matrix(MatrixError::Singular));
    }

    #[test]
    fn arity_violations_are_reported() {
        let mechanism = presets::two_rpr();
        let operator = KrawczykOperator::synthesize(&mechanism).expect("synthesizable");
        let u = [iv(0.0, 1.0)];
        let v = [iv(3.0, 15.0), iv(3.0, 15.0)];
        let err = operator
            .eval(&u, &v, &[9.0, 9.0], &[9.0, 9.0], &[6.0])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Arity { .. }));
    }
}
