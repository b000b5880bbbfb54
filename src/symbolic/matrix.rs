//! Small symbolic matrices: Jacobians, exact determinants and inverses.
//!
//! Sized for the kinematic systems this engine targets (2x2 and 4x4);
//! determinant and inverse use Laplace expansion / the adjugate, which is
//! exact at synthesis time and perfectly adequate at these dimensions.

use super::Expr;

/// Fouten bij matrixbewerkingen tijdens synthese.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix dimensions {lhs_rows}x{lhs_cols} and {rhs_rows}x{rhs_cols} do not compose")]
    DimensionMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },
    #[error("matrix of {rows}x{cols} is not square")]
    NotSquare { rows: usize, cols: usize },
    #[error("jacobian is structurally singular: determinant simplifies to zero")]
    Singular,
}

/// Rechthoekige matrix van symbolische expressies.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Expr>,
}

impl ExprMatrix {
    /// Maakt een matrix aan wanneer de afmetingen en waarden overeenkomen.
    #[must_use]
    pub fn new(rows: usize, cols: usize, data: Vec<Expr>) -> Option<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Kolomvector uit een lijst expressies.
    #[must_use]
    pub fn column(entries: Vec<Expr>) -> Self {
        let rows = entries.len();
        Self {
            rows,
            cols: 1,
            data: entries,
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> &Expr {
        &self.data[row * self.cols + col]
    }

    /// Jacobiaan van een kolom expressies naar de opgegeven variabelen.
    #[must_use]
    pub fn jacobian(functions: &[Expr], variables: &[String]) -> Self {
        let rows = functions.len();
        let cols = variables.len();
        let mut data = Vec::with_capacity(rows * cols);
        for function in functions {
            for variable in variables {
                data.push(function.diff(variable).simplify());
            }
        }
        Self { rows, cols, data }
    }

    /// Matrixproduct; faalt op niet-passende afmetingen.
    pub fn mul(&self, rhs: &Self) -> Result<Self, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: rhs.rows,
                rhs_cols: rhs.cols,
            });
        }
        let mut data = Vec::with_capacity(self.rows * rhs.cols);
        for row in 0..self.rows {
            for col in 0..rhs.cols {
                let mut sum = Expr::Const(0.0);
                for k in 0..self.cols {
                    sum = sum + self.get(row, k).clone() * rhs.get(k, col).clone();
                }
                data.push(sum.simplify());
            }
        }
        Ok(Self {
            rows: self.rows,
            cols: rhs.cols,
            data,
        })
    }

    /// Elementsgewijs verschil; faalt op niet-passende afmetingen.
    pub fn sub(&self, rhs: &Self) -> Result<Self, MatrixError> {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            return Err(MatrixError::DimensionMismatch {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: rhs.rows,
                rhs_cols: rhs.cols,
            });
        }
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(a, b)| (a.clone() - b.clone()).simplify())
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Exacte determinant via Laplace-expansie over de eerste rij.
    pub fn determinant(&self) -> Result<Expr, MatrixError> {
        if self.rows != self.cols {
            return Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.determinant_unchecked().simplify())
    }

    fn determinant_unchecked(&self) -> Expr {
        if self.rows == 1 {
            return self.get(0, 0).clone();
        }
        let mut result = Expr::Const(0.0);
        for col in 0..self.cols {
            let term = self.get(0, col).clone() * self.minor(0, col).determinant_unchecked();
            result = if col % 2 == 0 {
                result + term
            } else {
                result - term
            };
        }
        result
    }

    /// Exacte inverse via de adjugaat. Faalt met [`MatrixError::Singular`]
    /// wanneer de determinant symbolisch tot nul vereenvoudigt.
    pub fn inverse(&self) -> Result<Self, MatrixError> {
        let determinant = self.determinant()?;
        if determinant.is_zero() {
            return Err(MatrixError::Singular);
        }
        let n = self.rows;
        let mut data = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                // Adjugate entry (row, col) = cofactor (col, row).
                let cofactor = self.minor(col, row).determinant_unchecked();
                let signed = if (row + col) % 2 == 0 {
                    cofactor
                } else {
                    -cofactor
                };
                data.push((signed / determinant.clone()).simplify());
            }
        }
        Ok(Self { rows: n, cols: n, data })
    }

    /// Past een bewerking toe op elk element.
    #[must_use]
    pub fn map(&self, f: impl Fn(&Expr) -> Expr) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    fn minor(&self, skip_row: usize, skip_col: usize) -> Self {
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for row in 0..self.rows {
            if row == skip_row {
                continue;
            }
            for col in 0..self.cols {
                if col == skip_col {
                    continue;
                }
                data.push(self.get(row, col).clone());
            }
        }
        Self {
            rows: self.rows - 1,
            cols: self.cols - 1,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExprMatrix, MatrixError};
    use crate::symbolic::Expr;

    fn diagonal(entries: &[Expr]) -> ExprMatrix {
        let n = entries.len();
        let mut data = vec![Expr::Const(0.0); n * n];
        for (i, entry) in entries.iter().enumerate() {
            data[i * n + i] = entry.clone();
        }
        ExprMatrix::new(n, n, data).expect("square matrix")
    }

    #[test]
    fn jacobian_of_decoupled_squares_is_diagonal() {
        let f = vec![Expr::var("v1").powi(2), Expr::var("v2").powi(2)];
        let vars = vec!["v1".to_owned(), "v2".to_owned()];
        let jac = ExprMatrix::jacobian(&f, &vars);
        assert_eq!(*jac.get(0, 0), Expr::Const(2.0) * Expr::var("v1"));
        assert!(jac.get(0, 1).is_zero());
        assert!(jac.get(1, 0).is_zero());
        assert_eq!(*jac.get(1, 1), Expr::Const(2.0) * Expr::var("v2"));
    }

    #[test]
    fn inverse_of_diagonal_matrix() {
        let matrix = diagonal(&[Expr::var("a"), Expr::var("b")]);
        let inverse = matrix.inverse().expect("invertible");
        // Entry (0,0) should reduce to b / (a * b).
        assert_eq!(
            *inverse.get(0, 0),
            Expr::var("b") / (Expr::var("a") * Expr::var("b"))
        );
        assert!(inverse.get(0, 1).is_zero());
        assert!(inverse.get(1, 0).is_zero());
    }

    #[test]
    fn numeric_determinant_folds() {
        let matrix = ExprMatrix::new(
            2,
            2,
            vec![
                Expr::Const(1.0),
                Expr::Const(2.0),
                Expr::Const(3.0),
                Expr::Const(4.0),
            ],
        )
        .unwrap();
        assert_eq!(matrix.determinant().unwrap(), Expr::Const(-2.0));
    }

    #[test]
    fn structurally_singular_matrix_is_rejected() {
        let v = Expr::var("v1");
        let matrix = ExprMatrix::new(2, 2, vec![v.clone(), v.clone(), v.clone(), v]).unwrap();
        assert_eq!(matrix.inverse().unwrap_err(), MatrixError::Singular);
    }

    #[test]
    fn three_by_three_determinant() {
        let matrix = ExprMatrix::new(
            3,
            3,
            vec![
                Expr::Const(2.0),
                Expr::Const(0.0),
                Expr::Const(0.0),
                Expr::Const(0.0),
                Expr::Const(3.0),
                Expr::Const(0.0),
                Expr::Const(0.0),
                Expr::Const(0.0),
                Expr::Const(4.0),
            ],
        )
        .unwrap();
        assert_eq!(matrix.determinant().unwrap(), Expr::Const(24.0));
    }

    #[test]
    fn mismatched_product_fails() {
        let a = ExprMatrix::column(vec![Expr::var("x"), Expr::var("y")]);
        let b = ExprMatrix::column(vec![Expr::var("z"), Expr::var("w")]);
        assert!(matches!(
            a.mul(&b),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }
}
