//! Problem data structures, options and result types.
//!
//! This module defines the canonical LP representation and all associated
//! types: bounds, objective sense, solver options, model status and the
//! solution/info records returned by a solve.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::sparse::SparseMatrix;

/// Sentinel for an infinite bound or cost.
pub const INF: f64 = f64::INFINITY;

/// Matrix entries at or below this magnitude are dropped.
pub const SMALL_MATRIX_VALUE: f64 = 1e-9;

/// Matrix entries at or above this magnitude are rejected.
pub const LARGE_MATRIX_VALUE: f64 = 1e15;

/// Marker for an infeasibility count that has not been computed.
pub const ILLEGAL_INFEASIBILITY_COUNT: isize = -1;

/// Marker for an infeasibility measure that has not been computed.
pub const ILLEGAL_INFEASIBILITY_MEASURE: f64 = -1.0;

/// Objective sense.
///
/// The numeric values are used as sign multipliers on the costs, so the
/// engine always minimizes internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjSense {
    /// Minimize the objective
    Minimize = 1,
    /// Maximize the objective
    Maximize = -1,
}

impl ObjSense {
    /// Sign multiplier applied to costs and reported duals.
    #[inline]
    pub fn sign(self) -> f64 {
        self as i32 as f64
    }
}

/// Variable type for the integrality vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
}

/// Per-row and per-column positive multipliers.
///
/// When `has_scaling` holds, the stored matrix values are already scaled
/// and the factors are applied implicitly when reporting to users.
#[derive(Debug, Clone, Default)]
pub struct LpScale {
    /// Column scale factors (length num_col)
    pub col: Vec<f64>,
    /// Row scale factors (length num_row)
    pub row: Vec<f64>,
    /// Cost scale factor
    pub cost: f64,
    /// Whether any factor differs from one
    pub has_scaling: bool,
}

impl LpScale {
    /// Identity scaling for the given dimensions.
    pub fn identity(num_col: usize, num_row: usize) -> Self {
        Self {
            col: vec![1.0; num_col],
            row: vec![1.0; num_row],
            cost: 1.0,
            has_scaling: false,
        }
    }
}

/// Linear program in the form
///
/// ```text
/// minimize    c^T x + offset
/// subject to  row_lower <= A x <= row_upper
///             col_lower <=   x <= col_upper
/// ```
///
/// The matrix is held column-wise (CSC). Row activities are modelled
/// internally by logical (slack) variables with identity columns, so the
/// engine works with the n+m variables of [A | I].
#[derive(Debug, Clone, Default)]
pub struct Lp {
    /// Column costs (length num_col)
    pub col_cost: Vec<f64>,
    /// Column lower bounds (length num_col)
    pub col_lower: Vec<f64>,
    /// Column upper bounds (length num_col)
    pub col_upper: Vec<f64>,
    /// Row lower bounds (length num_row)
    pub row_lower: Vec<f64>,
    /// Row upper bounds (length num_row)
    pub row_upper: Vec<f64>,
    /// Constraint matrix (CSC)
    pub a_matrix: SparseMatrix,
    /// Objective sense
    pub sense: ObjSense,
    /// Constant objective offset
    pub offset: f64,
    /// Integrality kinds; empty when all variables are continuous
    pub integrality: Vec<VarType>,
    /// Optional column names
    pub col_names: Vec<String>,
    /// Optional row names
    pub row_names: Vec<String>,
    /// Name-to-index hash for columns, built lazily and cleared on deletion
    pub col_hash: HashMap<String, usize>,
    /// Name-to-index hash for rows, built lazily and cleared on deletion
    pub row_hash: HashMap<String, usize>,
    /// Power-of-two exponent applied to user bounds
    pub user_bound_scale: i32,
    /// Power-of-two exponent applied to user costs
    pub user_cost_scale: i32,
    /// Optional row/column scaling
    pub scale: LpScale,
}

impl Default for ObjSense {
    fn default() -> Self {
        ObjSense::Minimize
    }
}

impl Lp {
    /// Number of structural variables (n).
    #[inline]
    pub fn num_col(&self) -> usize {
        self.col_cost.len()
    }

    /// Number of rows (m).
    #[inline]
    pub fn num_row(&self) -> usize {
        self.row_lower.len()
    }

    /// Total number of variables (n + m), counting logicals.
    #[inline]
    pub fn num_tot(&self) -> usize {
        self.num_col() + self.num_row()
    }

    /// Check internal dimension consistency.
    ///
    /// Interface operations assert this at entry and exit.
    pub fn dimensions_ok(&self) -> bool {
        let num_col = self.num_col();
        let num_row = self.num_row();
        let vectors_ok = self.col_lower.len() == num_col
            && self.col_upper.len() == num_col
            && self.row_upper.len() == num_row
            && (self.integrality.is_empty() || self.integrality.len() == num_col)
            && (self.col_names.is_empty() || self.col_names.len() == num_col)
            && (self.row_names.is_empty() || self.row_names.len() == num_row);
        let matrix_ok = self.a_matrix.num_col == num_col
            && self.a_matrix.num_row == num_row
            && self.a_matrix.dimensions_ok();
        let scale_ok = !self.scale.has_scaling
            || (self.scale.col.len() == num_col && self.scale.row.len() == num_row);
        vectors_ok && matrix_ok && scale_ok
    }

    /// Whether row/column scaling factors are in effect.
    #[inline]
    pub fn is_scaled(&self) -> bool {
        self.scale.has_scaling
    }

    /// Clear the name-to-index hashes. Called whenever indices shift.
    pub fn clear_name_hashes(&mut self) {
        self.col_hash.clear();
        self.row_hash.clear();
    }

    /// Look up a column by name, building the hash lazily.
    pub fn col_index_by_name(&mut self, name: &str) -> Option<usize> {
        if self.col_hash.is_empty() && !self.col_names.is_empty() {
            for (j, col_name) in self.col_names.iter().enumerate() {
                self.col_hash.insert(col_name.clone(), j);
            }
        }
        self.col_hash.get(name).copied()
    }

    /// Look up a row by name, building the hash lazily.
    pub fn row_index_by_name(&mut self, name: &str) -> Option<usize> {
        if self.row_hash.is_empty() && !self.row_names.is_empty() {
            for (i, row_name) in self.row_names.iter().enumerate() {
                self.row_hash.insert(row_name.clone(), i);
            }
        }
        self.row_hash.get(name).copied()
    }
}

/// Validate a cost vector: no NaN, no infinities other than the sentinel.
pub fn assess_costs(cost: &[f64]) -> Result<(), ModelError> {
    for (i, &c) in cost.iter().enumerate() {
        if c.is_nan() {
            return Err(ModelError::InvalidInput {
                what: format!("cost {} is NaN", i),
            });
        }
    }
    Ok(())
}

/// Validate a bound pair vector: no NaN, lower <= upper, finite values in
/// the representable window.
pub fn assess_bounds(lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
    assert_eq!(lower.len(), upper.len());
    for i in 0..lower.len() {
        let (l, u) = (lower[i], upper[i]);
        if l.is_nan() || u.is_nan() {
            return Err(ModelError::InvalidInput {
                what: format!("bound {} is NaN", i),
            });
        }
        if l > u {
            return Err(ModelError::InconsistentBounds {
                index: i,
                lower: l,
                upper: u,
            });
        }
    }
    Ok(())
}

/// Apply a power-of-two exponent to a value, saturating the infinity
/// sentinels.
#[inline]
pub fn apply_scale_exponent(value: f64, exponent: i32) -> f64 {
    if value == INF || value == -INF || exponent == 0 {
        value
    } else {
        value * f64::powi(2.0, exponent)
    }
}

/// A selection of row or column indices for interface operations.
///
/// The mask variant uses the HiGHS-style convention: nonzero marks a
/// selected index. After a delete, the mask is rewritten in place so that
/// retained indices map to their new positions and deleted indices to -1.
pub enum IndexCollection<'a> {
    /// Contiguous range `from..=to`
    Interval {
        /// First selected index
        from: usize,
        /// Last selected index (inclusive)
        to: usize,
    },
    /// Explicit, strictly increasing set of indices
    Set(&'a [usize]),
    /// Full-dimension mask; nonzero selects
    Mask(&'a mut [i32]),
}

impl<'a> IndexCollection<'a> {
    /// Check the collection against a dimension.
    pub fn ok(&self, dim: usize) -> bool {
        match self {
            IndexCollection::Interval { from, to } => *from <= *to && *to < dim,
            IndexCollection::Set(set) => {
                set.windows(2).all(|w| w[0] < w[1]) && set.iter().all(|&i| i < dim)
            }
            IndexCollection::Mask(mask) => mask.len() == dim,
        }
    }

    /// Whether the collection selects nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            IndexCollection::Interval { from, to } => from > to,
            IndexCollection::Set(set) => set.is_empty(),
            IndexCollection::Mask(mask) => mask.iter().all(|&v| v == 0),
        }
    }

    /// Materialise the selection as a boolean mask of length `dim`.
    pub fn to_mask(&self, dim: usize) -> Vec<bool> {
        let mut selected = vec![false; dim];
        match self {
            IndexCollection::Interval { from, to } => {
                for s in selected.iter_mut().take(*to + 1).skip(*from) {
                    *s = true;
                }
            }
            IndexCollection::Set(set) => {
                for &i in set.iter() {
                    selected[i] = true;
                }
            }
            IndexCollection::Mask(mask) => {
                for (i, &v) in mask.iter().enumerate() {
                    selected[i] = v != 0;
                }
            }
        }
        selected
    }

    /// Iterate the selected indices in increasing order.
    pub fn iter_selected(&self, dim: usize) -> Vec<usize> {
        match self {
            IndexCollection::Interval { from, to } => (*from..=*to).collect(),
            IndexCollection::Set(set) => set.to_vec(),
            IndexCollection::Mask(mask) => {
                let _ = dim;
                mask.iter()
                    .enumerate()
                    .filter(|(_, &v)| v != 0)
                    .map(|(i, _)| i)
                    .collect()
            }
        }
    }
}

/// Simplex strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStrategy {
    /// Let the engine choose between primal and dual from feasibility
    Choose,
    /// Serial dual simplex
    Dual,
    /// Dual simplex with task parallelism (falls back to serial when the
    /// thread floor is not met)
    DualTasks,
    /// Dual simplex with multiple iterations in flight (falls back to
    /// serial when the thread floor is not met)
    DualMulti,
    /// Primal simplex
    Primal,
}

/// PRICE technique selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStrategy {
    /// Column-wise PRICE
    Col,
    /// Hyper-sparse row-wise PRICE
    RowSwitch,
    /// Row-wise PRICE switching to column-wise on dense rows
    RowSwitchColSwitch,
}

/// Dual edge weight strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualEdgeWeightStrategy {
    /// Unit weights (Dantzig)
    Dantzig,
    /// Devex reference-framework weights
    Devex,
}

/// Minimum worker count for the dual-tasks strategy.
pub const DUAL_TASKS_MIN_THREADS: usize = 3;

/// Minimum worker count for the dual-multi strategy.
pub const DUAL_MULTI_MIN_THREADS: usize = 8;

/// Solver options.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Wall-clock limit in seconds (INF = no limit)
    pub time_limit: f64,

    /// Simplex iteration limit
    pub simplex_iteration_limit: usize,

    /// Simplex strategy
    pub simplex_strategy: SimplexStrategy,

    /// PRICE strategy
    pub price_strategy: PriceStrategy,

    /// Dual edge weight strategy
    pub dual_edge_weight_strategy: DualEdgeWeightStrategy,

    /// Factor updates between reinversions
    pub simplex_update_limit: usize,

    /// Primal feasibility tolerance
    pub primal_feasibility_tolerance: f64,

    /// Dual feasibility tolerance
    pub dual_feasibility_tolerance: f64,

    /// Upper bound on the dual objective value (INF = none); breaching it
    /// ends the solve with `ModelStatus::ObjectiveBound`
    pub dual_objective_value_upper_bound: f64,

    /// Markowitz pivot threshold for the basis factorization
    pub factor_pivot_threshold: f64,

    /// Absolute pivot tolerance for the basis factorization
    pub factor_pivot_tolerance: f64,

    /// Matrix entries at or below this magnitude are dropped
    pub small_matrix_value: f64,

    /// Matrix entries at or above this magnitude are rejected
    pub large_matrix_value: f64,

    /// Multiplier on the structured dual cost perturbation (0 disables)
    pub dual_simplex_cost_perturbation_multiplier: f64,

    /// Multiplier on the primal bound perturbation (0 disables)
    pub primal_simplex_bound_perturbation_multiplier: f64,

    /// Allow parallel dual strategies when the thread floor is met
    pub parallel: bool,

    /// Worker threads available to parallel strategies
    pub threads: usize,

    /// Seed for the engine's pseudo-random stream
    pub random_seed: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        // Allow environment override for the update limit; useful when
        // reproducing reinversion-dependent behaviour
        let simplex_update_limit = std::env::var("SIMPLEX_UPDATE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(5000);

        Self {
            time_limit: INF,
            simplex_iteration_limit: usize::MAX,
            simplex_strategy: SimplexStrategy::Choose,
            price_strategy: PriceStrategy::RowSwitchColSwitch,
            dual_edge_weight_strategy: DualEdgeWeightStrategy::Devex,
            simplex_update_limit,
            primal_feasibility_tolerance: 1e-7,
            dual_feasibility_tolerance: 1e-7,
            dual_objective_value_upper_bound: INF,
            factor_pivot_threshold: 0.1,
            factor_pivot_tolerance: 1e-10,
            small_matrix_value: SMALL_MATRIX_VALUE,
            large_matrix_value: LARGE_MATRIX_VALUE,
            dual_simplex_cost_perturbation_multiplier: 1.0,
            primal_simplex_bound_perturbation_multiplier: 1.0,
            parallel: false,
            threads: 1,
            random_seed: 0,
        }
    }
}

impl SolverOptions {
    /// Validate option values that have restricted domains.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(0.0 < self.factor_pivot_threshold && self.factor_pivot_threshold <= 1.0) {
            return Err(ModelError::OptionOutOfRange {
                option: "factor_pivot_threshold",
            });
        }
        if self.primal_feasibility_tolerance <= 0.0 || self.dual_feasibility_tolerance <= 0.0 {
            return Err(ModelError::OptionOutOfRange {
                option: "feasibility_tolerance",
            });
        }
        Ok(())
    }
}

/// Model status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStatus {
    /// No solve has been attempted since the last mutation
    #[default]
    NotSet,
    /// The model could not be loaded
    LoadError,
    /// The model data are erroneous
    ModelError,
    /// The solve failed
    SolveError,
    /// The model has no rows or columns
    ModelEmpty,
    /// Optimal solution found
    Optimal,
    /// The model is infeasible
    Infeasible,
    /// The model is unbounded
    Unbounded,
    /// Dual simplex detected dual unboundedness in phase 1; the model is
    /// unbounded or infeasible and a primal solve is needed to tell which
    UnboundedOrInfeasible,
    /// The dual objective value bound was reached
    ObjectiveBound,
    /// The time limit was reached
    ReachedTimeLimit,
    /// The iteration limit was reached
    ReachedIterationLimit,
    /// The solve terminated without a classification
    Unknown,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelStatus::NotSet => "Not Set",
            ModelStatus::LoadError => "Load Error",
            ModelStatus::ModelError => "Model Error",
            ModelStatus::SolveError => "Solve Error",
            ModelStatus::ModelEmpty => "Empty",
            ModelStatus::Optimal => "Optimal",
            ModelStatus::Infeasible => "Infeasible",
            ModelStatus::Unbounded => "Unbounded",
            ModelStatus::UnboundedOrInfeasible => "Unbounded or Infeasible",
            ModelStatus::ObjectiveBound => "Objective Bound",
            ModelStatus::ReachedTimeLimit => "Time Limit",
            ModelStatus::ReachedIterationLimit => "Iteration Limit",
            ModelStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Primal and dual solution values.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    /// Primal values of the structural variables
    pub col_value: Vec<f64>,
    /// Reduced costs of the structural variables
    pub col_dual: Vec<f64>,
    /// Row activities
    pub row_value: Vec<f64>,
    /// Row duals
    pub row_dual: Vec<f64>,
    /// Whether the primal values are current
    pub value_valid: bool,
    /// Whether the dual values are current
    pub dual_valid: bool,
}

impl Solution {
    /// Invalidate both value layers.
    pub fn invalidate(&mut self) {
        self.value_valid = false;
        self.dual_valid = false;
    }
}

/// Solve information and diagnostics.
#[derive(Debug, Clone)]
pub struct SolveInfo {
    /// Simplex iterations completed
    pub simplex_iteration_count: usize,
    /// Interior point iterations (always 0 for this engine)
    pub ipm_iteration_count: usize,
    /// Crossover iterations (always 0 for this engine)
    pub crossover_iteration_count: usize,
    /// QP iterations (always 0 for this engine)
    pub qp_iteration_count: usize,
    /// Objective value at the reported solution
    pub objective_function_value: f64,
    /// Number of primal infeasibilities
    pub num_primal_infeasibility: isize,
    /// Largest primal infeasibility
    pub max_primal_infeasibility: f64,
    /// Sum of primal infeasibilities
    pub sum_primal_infeasibility: f64,
    /// Number of dual infeasibilities
    pub num_dual_infeasibility: isize,
    /// Largest dual infeasibility
    pub max_dual_infeasibility: f64,
    /// Sum of dual infeasibilities
    pub sum_dual_infeasibility: f64,
    /// Whether the record is current
    pub valid: bool,
}

impl Default for SolveInfo {
    fn default() -> Self {
        Self {
            simplex_iteration_count: 0,
            ipm_iteration_count: 0,
            crossover_iteration_count: 0,
            qp_iteration_count: 0,
            objective_function_value: 0.0,
            num_primal_infeasibility: ILLEGAL_INFEASIBILITY_COUNT,
            max_primal_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            sum_primal_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            num_dual_infeasibility: ILLEGAL_INFEASIBILITY_COUNT,
            max_dual_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            sum_dual_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            valid: false,
        }
    }
}

impl SolveInfo {
    /// Invalidate the record after a model mutation.
    pub fn invalidate(&mut self) {
        self.objective_function_value = 0.0;
        self.num_primal_infeasibility = ILLEGAL_INFEASIBILITY_COUNT;
        self.max_primal_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.sum_primal_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.num_dual_infeasibility = ILLEGAL_INFEASIBILITY_COUNT;
        self.max_dual_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.sum_dual_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.valid = false;
    }
}

/// Feasibility tolerances and infeasibility summaries at the end of a
/// solve.
#[derive(Debug, Clone, Default)]
pub struct SolutionParams {
    /// Primal feasibility tolerance used
    pub primal_feasibility_tolerance: f64,
    /// Dual feasibility tolerance used
    pub dual_feasibility_tolerance: f64,
    /// Objective value
    pub objective_function_value: f64,
    /// Number of primal infeasibilities
    pub num_primal_infeasibility: isize,
    /// Largest primal infeasibility
    pub max_primal_infeasibility: f64,
    /// Sum of primal infeasibilities
    pub sum_primal_infeasibility: f64,
    /// Number of dual infeasibilities
    pub num_dual_infeasibility: isize,
    /// Largest dual infeasibility
    pub max_dual_infeasibility: f64,
    /// Sum of dual infeasibilities
    pub sum_dual_infeasibility: f64,
}

/// Outcome of an interface call that did not fail.
///
/// Together with `ModelError` this forms the tri-valued Ok/Warning/Error
/// status of the call surface. Warnings are never silently upgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed as requested
    Ok,
    /// The operation completed with a caveat (e.g. a limit was hit)
    Warning,
}

/// Errors raised by the model interface.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Dimension mismatch between supplied arrays
    #[error("shape mismatch: {what}")]
    ShapeMismatch {
        /// Description of the offending shape
        what: String,
    },

    /// Nonzero entries supplied for a dimensionless matrix
    #[error("{num_nz} nonzeros supplied but the complementary dimension is zero")]
    EmptyDimension {
        /// Number of nonzeros supplied
        num_nz: usize,
    },

    /// A supplied value is NaN or otherwise unusable
    #[error("invalid input: {what}")]
    InvalidInput {
        /// Description of the offending value
        what: String,
    },

    /// Lower bound exceeds upper bound
    #[error("bounds of index {index} are inconsistent: [{lower}, {upper}]")]
    InconsistentBounds {
        /// Offending index
        index: usize,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// User scaling would produce an infinite value
    #[error("scaling by 2^{exponent} yields an infinite {what}")]
    ScalingOverflow {
        /// Exponent applied
        exponent: i32,
        /// What overflowed
        what: &'static str,
    },

    /// A matrix entry is out of the representable window
    #[error("matrix entry ({row}, {col}) has unusable value {value}")]
    IllegalMatrixValue {
        /// Row of the entry
        row: usize,
        /// Column of the entry
        col: usize,
        /// Offending value
        value: f64,
    },

    /// An index collection is invalid for the operation
    #[error("invalid index collection: {what}")]
    InvalidIndexCollection {
        /// Description of the problem
        what: String,
    },

    /// A basis was required but is missing or inconsistent
    #[error("invalid basis: {what}")]
    InvalidBasis {
        /// Description of the problem
        what: String,
    },

    /// The basis matrix is singular
    #[error("singular basis: rank deficiency {rank_deficiency}")]
    SingularBasis {
        /// Number of dependent basis columns
        rank_deficiency: usize,
    },

    /// A variable with infinite cost has no bound to be fixed at
    #[error("variable {col} has infinite cost and no bound to fix at")]
    InfiniteCostNoBound {
        /// Offending column
        col: usize,
    },

    /// An option value is outside its domain
    #[error("option {option} is out of range")]
    OptionOutOfRange {
        /// Offending option
        option: &'static str,
    },

    /// A scale factor of zero was supplied
    #[error("scale factor for {what} {index} is zero")]
    ZeroScaleFactor {
        /// "col" or "row"
        what: &'static str,
        /// Offending index
        index: usize,
    },

    /// The engine failed during a solve invoked through the interface
    #[error("solve failed: {0}")]
    Engine(#[from] crate::simplex::EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sense_sign() {
        assert_eq!(ObjSense::Minimize.sign(), 1.0);
        assert_eq!(ObjSense::Maximize.sign(), -1.0);
    }

    #[test]
    fn test_assess_bounds() {
        assert!(assess_bounds(&[0.0, -INF], &[1.0, INF]).is_ok());
        assert!(assess_bounds(&[2.0], &[1.0]).is_err());
        assert!(assess_bounds(&[f64::NAN], &[1.0]).is_err());
    }

    #[test]
    fn test_scale_exponent_saturates() {
        assert_eq!(apply_scale_exponent(INF, 3), INF);
        assert_eq!(apply_scale_exponent(-INF, 3), -INF);
        assert_eq!(apply_scale_exponent(1.5, 2), 6.0);
        assert_eq!(apply_scale_exponent(1.5, 0), 1.5);
    }

    #[test]
    fn test_index_collection_mask() {
        let interval = IndexCollection::Interval { from: 1, to: 2 };
        assert!(interval.ok(4));
        assert_eq!(interval.to_mask(4), vec![false, true, true, false]);

        let set = [0usize, 3];
        let set = IndexCollection::Set(&set);
        assert_eq!(set.to_mask(4), vec![true, false, false, true]);

        let mut mask = vec![0, 1, 0, 1];
        let mask = IndexCollection::Mask(&mut mask);
        assert_eq!(mask.iter_selected(4), vec![1, 3]);
    }

    #[test]
    fn test_options_validate() {
        let mut options = SolverOptions::default();
        assert!(options.validate().is_ok());
        options.factor_pivot_threshold = 0.0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_name_lookup() {
        let mut lp = Lp {
            col_cost: vec![0.0, 0.0],
            col_lower: vec![0.0, 0.0],
            col_upper: vec![1.0, 1.0],
            col_names: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        assert_eq!(lp.col_index_by_name("b"), Some(1));
        assert_eq!(lp.col_index_by_name("c"), None);
        lp.clear_name_hashes();
        assert!(lp.col_hash.is_empty());
        assert_eq!(lp.col_index_by_name("a"), Some(0));
    }

    #[test]
    fn test_info_invalidate() {
        let mut info = SolveInfo {
            num_primal_infeasibility: 3,
            valid: true,
            ..Default::default()
        };
        info.invalidate();
        assert!(!info.valid);
        assert_eq!(info.num_primal_infeasibility, ILLEGAL_INFEASIBILITY_COUNT);
    }
}
