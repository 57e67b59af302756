//! Sparse matrices and a preconditioned conjugate gradient solver.
//!
//! The deformation solver states its problem as an overdetermined set of
//! sparse rows. [`NormalEquations`] folds those rows into the symmetric
//! positive definite system `AᵀA x = Aᵀb`, stored as a [`CsrMatrix`] and
//! solved with [`conjugate_gradient`].

use nalgebra::{DVector, Vector3};

use crate::error::{MeshError, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` is the range of row `i` in `col_idx`/`values`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed.
    ///
    /// # Panics
    ///
    /// Panics if a triplet lies outside `rows x cols`.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(row < rows && col < cols, "triplet ({}, {}) out of bounds", row, col);
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
                continue;
            }
            col_idx.push(col);
            values.push(val);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        // Turn per-row counts into offsets.
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entries of row `i` as `(col, value)`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Diagonal entries (zero where nothing is stored).
    pub fn diagonal(&self) -> DVector<f64> {
        let n = self.rows.min(self.cols);
        DVector::from_iterator(
            n,
            (0..n).map(|i| self.row(i).find(|&(c, _)| c == i).map_or(0.0, |(_, v)| v)),
        )
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "vector dimension mismatch");
        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| self.row(i).map(|(c, v)| v * x[c]).sum::<f64>()),
        )
    }
}

/// One equation `Σ coeff·x[col] = rhs`, solved for three right-hand sides at once.
#[derive(Debug, Clone, Default)]
pub struct SparseRow {
    /// `(column, coefficient)` pairs; a column may appear more than once.
    pub entries: Vec<(usize, f64)>,
    /// Right-hand side for the x, y and z systems.
    pub rhs: Vector3<f64>,
}

/// Least-squares normal equations `AᵀA x = Aᵀb` for three right-hand sides.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    /// The symmetric matrix `AᵀA`.
    pub matrix: CsrMatrix,
    /// `Aᵀb` per axis.
    pub rhs: [DVector<f64>; 3],
}

impl NormalEquations {
    /// Fold overdetermined rows over `cols` unknowns into normal equations.
    ///
    /// Rows without entries constrain nothing and are skipped.
    pub fn assemble(cols: usize, rows: &[SparseRow]) -> Self {
        let mut triplets = Vec::new();
        let mut rhs = [DVector::zeros(cols), DVector::zeros(cols), DVector::zeros(cols)];

        for row in rows {
            for &(ci, ai) in &row.entries {
                for &(cj, aj) in &row.entries {
                    triplets.push((ci, cj, ai * aj));
                }
                for axis in 0..3 {
                    rhs[axis][ci] += ai * row.rhs[axis];
                }
            }
        }

        Self {
            matrix: CsrMatrix::from_triplets(cols, cols, triplets),
            rhs,
        }
    }
}

/// Result of a conjugate gradient solve.
#[derive(Debug, Clone)]
pub struct CgSolution {
    /// The solution vector.
    pub x: DVector<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Final `|b - Ax| / |b|` (0 when `b` is zero).
    pub relative_residual: f64,
}

/// Solve A*x = b using Jacobi-preconditioned conjugate gradient.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance on the relative residual norm
///
/// # Errors
///
/// [`MeshError::ConvergenceFailed`] if the tolerance is not met within
/// `max_iter` iterations or the iteration breaks down, which happens when
/// the matrix is singular or indefinite.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<CgSolution> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "matrix must be square");

    let mut x = x0.cloned().unwrap_or_else(|| DVector::zeros(n));

    let b_norm = b.norm();
    if b_norm < 1e-300 {
        return Ok(CgSolution {
            x: DVector::zeros(n),
            iterations: 0,
            relative_residual: 0.0,
        });
    }

    let inv_diag = a
        .diagonal()
        .map(|d| if d.abs() > 1e-300 { 1.0 / d } else { 1.0 });

    let mut r = b - a.mul_vec(&x);
    if r.norm() / b_norm < tolerance {
        let relative_residual = r.norm() / b_norm;
        return Ok(CgSolution {
            x,
            iterations: 0,
            relative_residual,
        });
    }

    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 1..=max_iter {
        let ap = a.mul_vec(&p);
        let p_ap = p.dot(&ap);
        if !(p_ap > 0.0) || !p_ap.is_finite() {
            return Err(MeshError::ConvergenceFailed { iterations: iter });
        }

        let alpha = rz / p_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let relative_residual = r.norm() / b_norm;
        if relative_residual < tolerance {
            return Ok(CgSolution {
                x,
                iterations: iter,
                relative_residual,
            });
        }

        z = r.component_mul(&inv_diag);
        let rz_next = r.dot(&z);
        let beta = rz_next / rz;
        p = &z + beta * &p;
        rz = rz_next;
    }

    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}
