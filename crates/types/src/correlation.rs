//! Correlation matrix over the simulated (non-base) currencies.
//!
//! Validated once at construction and carrying its lower-triangular
//! Cholesky factor, so the FX engine can correlate a vector of iid
//! standard normals with a plain matrix-vector multiply each step.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::Currency;

const N: usize = Currency::NON_BASE.len();

/// Pivot tolerance for the Cholesky factorization. Diagonal pivots in
/// [-PIVOT_TOL, PIVOT_TOL] are treated as zero (semidefinite directions).
const PIVOT_TOL: f64 = 1e-10;

/// A validated correlation matrix over [`Currency::NON_BASE`] with a
/// cached Cholesky factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    matrix: [[f64; N]; N],
    cholesky: [[f64; N]; N],
}

impl CorrelationMatrix {
    /// Identity matrix (uncorrelated currencies).
    pub fn identity() -> Self {
        let mut matrix = [[0.0; N]; N];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        // Cholesky of the identity is the identity.
        Self {
            matrix,
            cholesky: matrix,
        }
    }

    /// Build from pairwise entries. `pairs` lists the off-diagonal
    /// correlations; unlisted pairs default to `default_corr`. Validates
    /// symmetry by construction, unit diagonal, entry bounds, and positive
    /// semidefiniteness (Cholesky).
    pub fn from_pairs(
        pairs: &[(Currency, Currency, f64)],
        default_corr: f64,
    ) -> SimResult<Self> {
        let mut matrix = [[default_corr; N]; N];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        for &(a, b, rho) in pairs {
            let (Some(i), Some(j)) = (a.non_base_index(), b.non_base_index()) else {
                return Err(SimError::Config(format!(
                    "correlation pair ({a}, {b}) includes the base currency"
                )));
            };
            if i == j {
                return Err(SimError::Config(format!(
                    "correlation pair ({a}, {b}) is a diagonal entry"
                )));
            }
            matrix[i][j] = rho;
            matrix[j][i] = rho;
        }
        Self::from_matrix(matrix)
    }

    /// Validate a full matrix and compute its Cholesky factor.
    pub fn from_matrix(matrix: [[f64; N]; N]) -> SimResult<Self> {
        for i in 0..N {
            if (matrix[i][i] - 1.0).abs() > 1e-12 {
                return Err(SimError::Config(format!(
                    "correlation matrix diagonal entry {} is {}, expected 1.0",
                    Currency::NON_BASE[i],
                    matrix[i][i]
                )));
            }
            for j in 0..N {
                let rho = matrix[i][j];
                if !rho.is_finite() || !(-1.0..=1.0).contains(&rho) {
                    return Err(SimError::Config(format!(
                        "correlation ({}, {}) = {rho} is outside [-1, 1]",
                        Currency::NON_BASE[i],
                        Currency::NON_BASE[j]
                    )));
                }
                if (matrix[i][j] - matrix[j][i]).abs() > 1e-12 {
                    return Err(SimError::Config(format!(
                        "correlation matrix is not symmetric at ({}, {})",
                        Currency::NON_BASE[i],
                        Currency::NON_BASE[j]
                    )));
                }
            }
        }
        let cholesky = cholesky_lower(&matrix)?;
        Ok(Self { matrix, cholesky })
    }

    /// Correlation between two non-base currencies. Base-currency lookups
    /// return 0 (USD is the numeraire, not a simulated process).
    pub fn get(&self, a: Currency, b: Currency) -> f64 {
        match (a.non_base_index(), b.non_base_index()) {
            (Some(i), Some(j)) => self.matrix[i][j],
            _ => 0.0,
        }
    }

    /// Correlate a vector of iid standard normals in place:
    /// `z <- L z` where `L` is the cached Cholesky factor.
    pub fn correlate(&self, normals: &[f64; N]) -> [f64; N] {
        let mut out = [0.0; N];
        for (i, row) in self.cholesky.iter().enumerate() {
            out[i] = row[..=i]
                .iter()
                .zip(normals[..=i].iter())
                .map(|(l, z)| l * z)
                .sum();
        }
        out
    }
}

/// Lower-triangular Cholesky with a semidefinite pivot tolerance. A pivot
/// below `-PIVOT_TOL` means the matrix is not positive semidefinite.
fn cholesky_lower(m: &[[f64; N]; N]) -> SimResult<[[f64; N]; N]> {
    let mut l = [[0.0; N]; N];
    for i in 0..N {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let pivot = m[i][i] - dot;
                if pivot < -PIVOT_TOL {
                    return Err(SimError::Config(format!(
                        "correlation matrix is not positive semidefinite \
                         (pivot {pivot} at {})",
                        Currency::NON_BASE[i]
                    )));
                }
                l[i][j] = pivot.max(0.0).sqrt();
            } else if l[j][j].abs() > PIVOT_TOL {
                l[i][j] = (m[i][j] - dot) / l[j][j];
            }
        }
    }
    Ok(l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_cholesky_is_identity() {
        let id = CorrelationMatrix::identity();
        let z = [1.0, -0.5, 0.3, 2.0, -1.1, 0.0, 0.7];
        assert_eq!(id.correlate(&z), z);
    }

    #[test]
    fn test_from_pairs_symmetric() {
        let m = CorrelationMatrix::from_pairs(
            &[(Currency::Eur, Currency::Chf, 0.85)],
            0.1,
        )
        .unwrap();
        assert_eq!(m.get(Currency::Eur, Currency::Chf), 0.85);
        assert_eq!(m.get(Currency::Chf, Currency::Eur), 0.85);
        assert_eq!(m.get(Currency::Jpy, Currency::Cad), 0.1);
        assert_eq!(m.get(Currency::Eur, Currency::Eur), 1.0);
    }

    #[test]
    fn test_rejects_base_currency_pair() {
        let err = CorrelationMatrix::from_pairs(
            &[(Currency::Usd, Currency::Eur, 0.5)],
            0.0,
        );
        assert!(matches!(err, Err(SimError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = CorrelationMatrix::from_pairs(
            &[(Currency::Eur, Currency::Gbp, 1.5)],
            0.0,
        );
        assert!(matches!(err, Err(SimError::Config(_))));
    }

    #[test]
    fn test_rejects_not_positive_semidefinite() {
        // rho(a,b)=rho(b,c)=0.9 with rho(a,c)=-0.9 cannot come from any
        // joint distribution.
        let err = CorrelationMatrix::from_pairs(
            &[
                (Currency::Eur, Currency::Jpy, 0.9),
                (Currency::Jpy, Currency::Gbp, 0.9),
                (Currency::Eur, Currency::Gbp, -0.9),
            ],
            0.0,
        );
        assert!(matches!(err, Err(SimError::Config(_))));
    }

    #[test]
    fn test_rejects_asymmetric_matrix() {
        let mut m = [[0.0; N]; N];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        m[0][1] = 0.5;
        m[1][0] = 0.4;
        assert!(matches!(
            CorrelationMatrix::from_matrix(m),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_cholesky_reproduces_pairwise_correlation() {
        // L L^T must reconstruct the input matrix.
        let cm = CorrelationMatrix::from_pairs(
            &[
                (Currency::Eur, Currency::Chf, 0.85),
                (Currency::Eur, Currency::Gbp, 0.65),
                (Currency::Cad, Currency::Aud, 0.60),
            ],
            0.1,
        )
        .unwrap();
        for i in 0..N {
            for j in 0..N {
                let dot: f64 = (0..N).map(|k| cm.cholesky[i][k] * cm.cholesky[j][k]).sum();
                assert!(
                    (dot - cm.matrix[i][j]).abs() < 1e-9,
                    "entry ({i}, {j}) mismatch: {dot} vs {}",
                    cm.matrix[i][j]
                );
            }
        }
    }
}
