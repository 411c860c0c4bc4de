//! simplex-core: a revised simplex engine for linear programming
//!
//! This library provides the core engine of an LP solver for problems of
//! the form
//!
//! ```text
//! minimize    c^T x
//! subject to  row_lower <= A x <= row_upper
//!             col_lower <=   x <= col_upper
//! ```
//!
//! solved by the revised simplex method with both primal and dual
//! variants. Key features:
//!
//! - **Sparse LU basis factorization** with Markowitz-threshold pivoting
//!   and product-form updates
//! - **Cost and bound perturbation** against stalling and cycling,
//!   removed before optimality is declared
//! - **Numerical safeguards**: reinversion on pivot disagreement,
//!   Markowitz threshold escalation, backtracking to the last
//!   nonsingular basis
//! - **A mutable model interface**: rows, columns, coefficients, costs
//!   and bounds can be added, deleted and modified with the basis and
//!   engine state kept consistent
//! - **Warm and hot starts** from client bases or saved refactorization
//!   traces
//!
//! # Example
//!
//! ```
//! use simplex_core::{solve, Lp, ModelStatus, ObjSense, SolverOptions, SparseMatrix, INF};
//!
//! // minimize -x0 - 2 x1  subject to  x0 + x1 <= 4, 0 <= x0, x1 <= 3
//! let mut tri = sprs::TriMat::new((1, 2));
//! tri.add_triplet(0, 0, 1.0);
//! tri.add_triplet(0, 1, 1.0);
//! let lp = Lp {
//!     col_cost: vec![-1.0, -2.0],
//!     col_lower: vec![0.0, 0.0],
//!     col_upper: vec![3.0, 3.0],
//!     row_lower: vec![-INF],
//!     row_upper: vec![4.0],
//!     a_matrix: SparseMatrix::from_csmat(&tri.to_csc()),
//!     sense: ObjSense::Minimize,
//!     ..Default::default()
//! };
//! let (status, solution) = solve(lp, &SolverOptions::default()).unwrap();
//! assert_eq!(status, ModelStatus::Optimal);
//! assert!((solution.col_value[1] - 3.0).abs() < 1e-6);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // simplex kernels carry many parameters

pub mod basis;
pub mod factor;
pub mod interface;
pub mod model;
pub mod random;
pub mod simplex;
pub mod sparse;

// Re-export main types
pub use basis::{Basis, BasisStatus, HotStart, SimplexBasis};
pub use factor::{FactorError, RefactorInfo, SimplexFactor};
pub use interface::{GetColsResult, GetRowsResult, SimplexSolver};
pub use model::{
    IndexCollection, Lp, LpScale, ModelError, ModelStatus, ObjSense, Outcome, PriceStrategy,
    SimplexStrategy, Solution, SolutionParams, SolveInfo, SolverOptions, VarType, INF,
};
pub use simplex::{EngineError, SimplexEngine};
pub use sparse::{HVector, SparseMatrix};

/// Solve an LP in one call.
///
/// Builds a [`SimplexSolver`], runs it and returns the final status with
/// the solution. For repeated solves of a changing model, hold a
/// [`SimplexSolver`] instead.
pub fn solve(
    lp: Lp,
    options: &SolverOptions,
) -> Result<(ModelStatus, Solution), ModelError> {
    let mut solver = SimplexSolver::new(lp, options.clone())?;
    solver.solve()?;
    let status = solver.model_status();
    let solution = solver.get_solution().clone();
    Ok((status, solution))
}
