use crate::StrError;
use russell_lab::{vec_norm, Matrix, Norm, Vector};
use russell_sparse::{Genie, LinSolver, SparseMatrix, Sym};

/// Error message when the assembled residual vector holds NaN or Inf
pub const ERR_NON_FINITE_RESIDUAL: StrError = "found NaN or Inf in the residual vector";

/// Error message when the solution of the linear system holds NaN or Inf
pub const ERR_NON_FINITE_SOLUTION: StrError = "found NaN or Inf in the solution";

/// Holds variables to solve the global linear system
///
/// Prescribed equations are handled by skipping their rows and columns during assembly and putting
/// ones on the diagonal of the global matrix; thus, the solution `mdu` is zero at prescribed equations.
pub struct LinearSystem {
    /// Total number of global equations (total number of DOFs)
    pub n_equation: usize,

    /// Is an array indicating which DOFs (equations) are prescribed
    pub prescribed: Vec<bool>,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// This is the sum of the number of entries in all local matrices plus the number of
    /// prescribed equations (ones on the diagonal).
    pub nnz_sup: usize,

    /// Holds the residual vector R
    pub rr: Vector,

    /// Holds the global Jacobian matrix K
    pub kk: SparseMatrix,

    /// Holds the "minus-delta-U" vector (the solution of the linear system)
    pub mdu: Vector,
}

impl LinearSystem {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `prescribed` -- flags of the prescribed equations (the length is the number of equations)
    /// * `nnz_local` -- sum of the number of entries of all local matrices
    pub fn new(prescribed: Vec<bool>, nnz_local: usize) -> Result<Self, StrError> {
        let n_equation = prescribed.len();
        let nnz_sup = nnz_local + prescribed.iter().filter(|p| **p).count();
        Ok(LinearSystem {
            n_equation,
            prescribed,
            nnz_sup,
            rr: Vector::new(n_equation),
            kk: SparseMatrix::new_coo(n_equation, n_equation, nnz_sup, Sym::No)?,
            mdu: Vector::new(n_equation),
        })
    }

    /// Clears the residual vector and the Jacobian matrix
    pub fn reset(&mut self) -> Result<(), StrError> {
        self.rr.fill(0.0);
        self.mdu.fill(0.0);
        self.kk = SparseMatrix::new_coo(self.n_equation, self.n_equation, self.nnz_sup, Sym::No)?;
        Ok(())
    }

    /// Assembles local residual vector and local Jacobian matrix (skipping prescribed equations)
    pub fn assemble(&mut self, local_to_global: &[usize], kk_local: &Matrix, rr_local: &Vector) -> Result<(), StrError> {
        let n_equation_local = local_to_global.len();
        for l in 0..n_equation_local {
            let g = local_to_global[l];
            if self.prescribed[g] {
                continue;
            }
            self.rr[g] += rr_local[l];
            for ll in 0..n_equation_local {
                let gg = local_to_global[ll];
                if !self.prescribed[gg] {
                    self.kk.put(g, gg, kk_local.get(l, ll))?;
                }
            }
        }
        Ok(())
    }

    /// Solves K · mdu = R
    ///
    /// Returns an error if the factorization fails or the solution contains NaN or Inf.
    pub fn solve(&mut self) -> Result<(), StrError> {
        // augment global Jacobian matrix
        for eq in 0..self.n_equation {
            if self.prescribed[eq] {
                self.kk.put(eq, eq, 1.0)?;
                self.rr[eq] = 0.0;
            }
        }

        // check the right-hand side
        if !vec_norm(&self.rr, Norm::Max).is_finite() {
            return Err(ERR_NON_FINITE_RESIDUAL);
        }

        // solve linear system
        LinSolver::compute(Genie::Umfpack, &mut self.mdu, &mut self.kk, &self.rr, None)?;
        if !vec_norm(&self.mdu, Norm::Max).is_finite() {
            return Err(ERR_NON_FINITE_SOLUTION);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
