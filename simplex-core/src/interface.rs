//! Model mutation and query layer.
//!
//! [`SimplexSolver`] owns the LP, the client basis and the engine, and
//! keeps the three consistent across every add/delete/modify operation.
//! Mutations validate their inputs before touching anything, apply the
//! user scaling exponents, write through, invalidate derived results and
//! notify the engine through its action verbs; on error the model is
//! left unchanged.

use log::debug;

use crate::basis::{
    nonbasic_col_status, Basis, BasisStatus, HotStart, MOVE_DN, MOVE_UP, MOVE_ZE,
};
use crate::model::{
    apply_scale_exponent, assess_bounds, assess_costs, IndexCollection, Lp, ModelError,
    ModelStatus, Outcome, Solution, SolutionParams, SolveInfo, SolverOptions, VarType, INF,
};
use crate::simplex::engine::{EngineError, LpAction};
use crate::simplex::SimplexEngine;
use crate::sparse::{HVector, SparseMatrix};

/// Columns returned by [`SimplexSolver::get_cols`].
#[derive(Debug, Clone, Default)]
pub struct GetColsResult {
    pub num_col: usize,
    pub cost: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub start: Vec<usize>,
    pub index: Vec<usize>,
    pub value: Vec<f64>,
}

/// Rows returned by [`SimplexSolver::get_rows`].
#[derive(Debug, Clone, Default)]
pub struct GetRowsResult {
    pub num_row: usize,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub start: Vec<usize>,
    pub index: Vec<usize>,
    pub value: Vec<f64>,
}

#[derive(Debug, Clone)]
struct InfCostRecord {
    col: usize,
    cost: f64,
    lower: f64,
    upper: f64,
}

/// Host for an LP and its simplex engine.
#[derive(Debug)]
pub struct SimplexSolver {
    lp: Lp,
    basis: Basis,
    engine: SimplexEngine,
    solution: Solution,
    info: SolveInfo,
    model_status: ModelStatus,
    options: SolverOptions,
    inf_cost_records: Vec<InfCostRecord>,
}

impl SimplexSolver {
    /// Create a solver for the LP after validating and scaling it.
    pub fn new(mut lp: Lp, options: SolverOptions) -> Result<Self, ModelError> {
        options.validate()?;
        assess_costs(&lp.col_cost)?;
        assess_bounds(&lp.col_lower, &lp.col_upper)?;
        assess_bounds(&lp.row_lower, &lp.row_upper)?;
        lp.a_matrix.ensure_colwise();
        lp.a_matrix
            .assess(options.small_matrix_value, options.large_matrix_value)?;
        if !lp.dimensions_ok() {
            return Err(ModelError::ShapeMismatch {
                what: "LP dimensions are inconsistent".to_string(),
            });
        }
        if lp.scale.col.is_empty() {
            lp.scale = crate::model::LpScale::identity(lp.num_col(), lp.num_row());
        }
        apply_user_scaling(&mut lp)?;
        let engine = SimplexEngine::new(options.clone());
        Ok(Self {
            lp,
            basis: Basis::default(),
            engine,
            solution: Solution::default(),
            info: SolveInfo::default(),
            model_status: ModelStatus::NotSet,
            options,
            inf_cost_records: Vec::new(),
        })
    }

    /// The stored (scaled) LP.
    pub fn lp(&self) -> &Lp {
        &self.lp
    }

    /// The current model status.
    pub fn model_status(&self) -> ModelStatus {
        self.model_status
    }

    /// The current solve information.
    pub fn info(&self) -> &SolveInfo {
        &self.info
    }

    /// The current solution.
    pub fn get_solution(&self) -> &Solution {
        &self.solution
    }

    /// The current client basis.
    pub fn get_basis(&self) -> &Basis {
        &self.basis
    }

    /// Mutable access to the options. Feasibility tolerances and scaling
    /// exponents must go through [`SimplexSolver::option_change_action`].
    pub fn options_mut(&mut self) -> &mut SolverOptions {
        &mut self.options
    }

    fn invalidate_model_status(&mut self, action: LpAction) {
        self.model_status = ModelStatus::NotSet;
        self.info.invalidate();
        self.solution.invalidate();
        self.engine.update_status(action);
    }

    // --- solving ---

    /// Solve the LP with the configured options.
    pub fn solve(&mut self) -> Result<Outcome, ModelError> {
        debug_assert!(self.lp.dimensions_ok());
        if self.lp.num_col() == 0 && self.lp.num_row() == 0 {
            self.model_status = ModelStatus::ModelEmpty;
            return Ok(Outcome::Ok);
        }
        self.options.validate()?;
        self.engine.options = self.options.clone();

        let fixed_any = self.handle_infinite_cost()?;

        // Hand the engine a basis it does not already track
        if self.basis.valid && !self.engine.status.has_basis {
            self.engine.set_basis(&self.lp, &self.basis)?;
        }
        let solve_result = self.engine.solve(&self.lp);
        let status = match solve_result {
            Ok(status) => status,
            Err(error) => {
                if fixed_any {
                    self.restore_infinite_cost();
                }
                self.model_status = ModelStatus::SolveError;
                return Err(ModelError::Engine(error));
            }
        };

        self.model_status = status;
        self.solution = self.engine.extract_solution(&self.lp);
        self.basis = self.engine.extract_basis(&self.lp);
        self.info.simplex_iteration_count += self.engine.iteration_count;
        self.info.objective_function_value = self.engine.info.primal_objective_value;
        self.info.num_primal_infeasibility = self.engine.info.num_primal_infeasibility;
        self.info.max_primal_infeasibility = self.engine.info.max_primal_infeasibility;
        self.info.sum_primal_infeasibility = self.engine.info.sum_primal_infeasibility;
        self.info.num_dual_infeasibility = self.engine.info.num_dual_infeasibility;
        self.info.max_dual_infeasibility = self.engine.info.max_dual_infeasibility;
        self.info.sum_dual_infeasibility = self.engine.info.sum_dual_infeasibility;
        self.info.valid = true;

        if fixed_any {
            self.restore_infinite_cost();
        }

        match self.model_status {
            ModelStatus::ReachedTimeLimit
            | ModelStatus::ReachedIterationLimit
            | ModelStatus::ObjectiveBound
            | ModelStatus::Unknown => Ok(Outcome::Warning),
            _ => Ok(Outcome::Ok),
        }
    }

    /// Replace the LP wholesale, dropping any basis and derived state.
    pub fn pass_lp(&mut self, mut lp: Lp) -> Result<Outcome, ModelError> {
        assess_costs(&lp.col_cost)?;
        assess_bounds(&lp.col_lower, &lp.col_upper)?;
        assess_bounds(&lp.row_lower, &lp.row_upper)?;
        lp.a_matrix.ensure_colwise();
        lp.a_matrix.assess(
            self.options.small_matrix_value,
            self.options.large_matrix_value,
        )?;
        if !lp.dimensions_ok() {
            return Err(ModelError::ShapeMismatch {
                what: "LP dimensions are inconsistent".to_string(),
            });
        }
        if lp.scale.col.is_empty() {
            lp.scale = crate::model::LpScale::identity(lp.num_col(), lp.num_row());
        }
        apply_user_scaling(&mut lp)?;
        self.lp = lp;
        self.basis.clear();
        self.invalidate_model_status(LpAction::NewLp);
        Ok(Outcome::Ok)
    }

    /// Install a client basis.
    pub fn set_basis(&mut self, basis: Basis) -> Result<Outcome, ModelError> {
        self.engine.set_basis(&self.lp, &basis)?;
        self.basis = basis;
        self.basis.valid = true;
        self.basis.alien = false;
        self.invalidate_model_status(LpAction::NewBasis);
        self.engine.status.has_basis = true;
        Ok(Outcome::Ok)
    }

    /// Derive a basis from the current solution values: variables and
    /// rows sitting at a bound become nonbasic there, the rest basic,
    /// adjusted so that exactly m variables are basic.
    pub fn basis_for_solution(&mut self) -> Result<Outcome, ModelError> {
        if !self.solution.value_valid {
            return Err(ModelError::InvalidInput {
                what: "no valid solution values to build a basis from".to_string(),
            });
        }
        let tol = self.options.primal_feasibility_tolerance;
        let num_col = self.lp.num_col();
        let num_row = self.lp.num_row();
        let mut basis = Basis {
            col_status: vec![BasisStatus::Nonbasic; num_col],
            row_status: vec![BasisStatus::Nonbasic; num_row],
            valid: false,
            alien: false,
        };
        let mut num_basic = 0usize;
        for j in 0..num_col {
            let value = self.solution.col_value[j] / self.engine.bound_scale;
            let lower = self.lp.col_lower[j];
            let upper = self.lp.col_upper[j];
            basis.col_status[j] = if (value - lower).abs() <= tol {
                BasisStatus::Lower
            } else if (upper - value).abs() <= tol {
                BasisStatus::Upper
            } else if lower == -INF && upper == INF {
                BasisStatus::Zero
            } else {
                num_basic += 1;
                BasisStatus::Basic
            };
        }
        for i in 0..num_row {
            if num_basic < num_row {
                basis.row_status[i] = BasisStatus::Basic;
                num_basic += 1;
            } else {
                let lower = self.lp.row_lower[i];
                basis.row_status[i] = if lower > -INF {
                    BasisStatus::Lower
                } else {
                    BasisStatus::Upper
                };
            }
        }
        // Too many basics: demote interior columns to their nearer bound
        if num_basic > num_row {
            for j in (0..num_col).rev() {
                if num_basic == num_row {
                    break;
                }
                if basis.col_status[j] == BasisStatus::Basic {
                    basis.col_status[j] =
                        nonbasic_col_status(self.lp.col_lower[j], self.lp.col_upper[j]);
                    num_basic -= 1;
                }
            }
        }
        basis.valid = true;
        self.set_basis(basis)
    }

    /// Forget the iteration counters.
    pub fn zero_iteration_counts(&mut self) {
        self.info.simplex_iteration_count = 0;
        self.info.ipm_iteration_count = 0;
        self.info.crossover_iteration_count = 0;
        self.info.qp_iteration_count = 0;
        self.engine.zero_iteration_counts();
    }

    /// Feasibility summary of the last solve.
    pub fn get_solution_params(&self) -> SolutionParams {
        SolutionParams {
            primal_feasibility_tolerance: self.options.primal_feasibility_tolerance,
            dual_feasibility_tolerance: self.options.dual_feasibility_tolerance,
            objective_function_value: self.info.objective_function_value,
            num_primal_infeasibility: self.info.num_primal_infeasibility,
            max_primal_infeasibility: self.info.max_primal_infeasibility,
            sum_primal_infeasibility: self.info.sum_primal_infeasibility,
            num_dual_infeasibility: self.info.num_dual_infeasibility,
            max_dual_infeasibility: self.info.max_dual_infeasibility,
            sum_dual_infeasibility: self.info.sum_dual_infeasibility,
        }
    }

    // --- structural mutations ---

    /// Append columns with their costs, bounds and matrix entries.
    pub fn add_cols(
        &mut self,
        num_new_col: usize,
        cost: &[f64],
        lower: &[f64],
        upper: &[f64],
        start: &[usize],
        index: &[usize],
        value: &[f64],
    ) -> Result<Outcome, ModelError> {
        debug_assert!(self.lp.dimensions_ok());
        if num_new_col == 0 {
            return Ok(Outcome::Ok);
        }
        if cost.len() != num_new_col || lower.len() != num_new_col || upper.len() != num_new_col {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} costs and bound pairs", num_new_col),
            });
        }
        if start.len() != num_new_col + 1 || index.len() != value.len() {
            return Err(ModelError::ShapeMismatch {
                what: "column starts or entries malformed".to_string(),
            });
        }
        let num_nz = start[num_new_col];
        if num_nz > 0 && self.lp.num_row() == 0 {
            return Err(ModelError::EmptyDimension { num_nz });
        }
        assess_costs(cost)?;
        assess_bounds(lower, upper)?;

        // Validate and clean the new entries before touching the LP
        let mut piece = SparseMatrix::new(self.lp.num_row(), num_new_col);
        piece.start = start.to_vec();
        piece.index = index[..num_nz].to_vec();
        piece.value = value[..num_nz].to_vec();
        piece.assess(
            self.options.small_matrix_value,
            self.options.large_matrix_value,
        )?;
        let mut cost = cost.to_vec();
        let mut lower = lower.to_vec();
        let mut upper = upper.to_vec();
        scale_slice(&mut cost, self.lp.user_cost_scale, "cost")?;
        scale_slice(&mut lower, self.lp.user_bound_scale, "bound")?;
        scale_slice(&mut upper, self.lp.user_bound_scale, "bound")?;

        // Existing row scaling applies to the incoming entries
        if self.lp.scale.has_scaling {
            for k in 0..piece.index.len() {
                piece.value[k] *= self.lp.scale.row[piece.index[k]];
            }
        }

        self.lp.col_cost.extend_from_slice(&cost);
        self.lp.col_lower.extend_from_slice(&lower);
        self.lp.col_upper.extend_from_slice(&upper);
        self.lp
            .a_matrix
            .add_cols(num_new_col, &piece.start, &piece.index, &piece.value);
        self.lp.scale.col.resize(self.lp.num_col(), 1.0);
        if !self.lp.integrality.is_empty() {
            self.lp
                .integrality
                .resize(self.lp.num_col(), VarType::Continuous);
        }
        if !self.lp.col_names.is_empty() {
            self.lp.col_names.resize(self.lp.num_col(), String::new());
        }
        self.lp.clear_name_hashes();

        if self.basis.valid {
            for j in 0..num_new_col {
                let status = nonbasic_col_status(lower[j], upper[j]);
                debug_assert!(status != BasisStatus::Nonbasic);
                self.basis.col_status.push(status);
            }
            self.engine.append_nonbasic_cols(&self.lp, num_new_col);
        }
        self.invalidate_model_status(LpAction::NewCols);
        debug_assert!(self.lp.dimensions_ok());
        Ok(Outcome::Ok)
    }

    /// Append rows with their bounds and (row-wise) matrix entries. The
    /// new logicals enter the basis.
    pub fn add_rows(
        &mut self,
        num_new_row: usize,
        lower: &[f64],
        upper: &[f64],
        start: &[usize],
        index: &[usize],
        value: &[f64],
    ) -> Result<Outcome, ModelError> {
        debug_assert!(self.lp.dimensions_ok());
        if num_new_row == 0 {
            return Ok(Outcome::Ok);
        }
        if lower.len() != num_new_row || upper.len() != num_new_row {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} bound pairs", num_new_row),
            });
        }
        if start.len() != num_new_row + 1 || index.len() != value.len() {
            return Err(ModelError::ShapeMismatch {
                what: "row starts or entries malformed".to_string(),
            });
        }
        let num_nz = start[num_new_row];
        if num_nz > 0 && self.lp.num_col() == 0 {
            return Err(ModelError::EmptyDimension { num_nz });
        }
        assess_bounds(lower, upper)?;
        for &j in &index[..num_nz] {
            if j >= self.lp.num_col() {
                return Err(ModelError::InvalidInput {
                    what: format!("column index {} out of range", j),
                });
            }
        }
        let mut lower = lower.to_vec();
        let mut upper = upper.to_vec();
        scale_slice(&mut lower, self.lp.user_bound_scale, "bound")?;
        scale_slice(&mut upper, self.lp.user_bound_scale, "bound")?;

        let mut entry_value = value[..num_nz].to_vec();
        if self.lp.scale.has_scaling {
            for k in 0..num_nz {
                entry_value[k] *= self.lp.scale.col[index[k]];
            }
        }

        self.lp.row_lower.extend_from_slice(&lower);
        self.lp.row_upper.extend_from_slice(&upper);
        self.lp
            .a_matrix
            .add_rows(num_new_row, start, &index[..num_nz], &entry_value);
        self.lp.a_matrix.ensure_colwise();
        self.lp.scale.row.resize(self.lp.num_row(), 1.0);
        if !self.lp.row_names.is_empty() {
            self.lp.row_names.resize(self.lp.num_row(), String::new());
        }
        self.lp.clear_name_hashes();

        if self.basis.valid {
            for _ in 0..num_new_row {
                self.basis.row_status.push(BasisStatus::Basic);
            }
            self.engine.append_basic_rows(&self.lp, num_new_row);
        }
        self.invalidate_model_status(LpAction::NewRows);
        debug_assert!(self.lp.dimensions_ok());
        Ok(Outcome::Ok)
    }

    /// Delete the selected columns. A mask collection is rewritten so
    /// retained indices map to their new positions and deleted ones to
    /// -1.
    pub fn delete_cols(&mut self, ix: &mut IndexCollection) -> Result<Outcome, ModelError> {
        debug_assert!(self.lp.dimensions_ok());
        let num_col = self.lp.num_col();
        if !ix.ok(num_col) {
            return Err(ModelError::InvalidIndexCollection {
                what: "column selection out of range".to_string(),
            });
        }
        let delete = ix.to_mask(num_col);
        if !delete.iter().any(|&d| d) {
            return Ok(Outcome::Ok);
        }
        retain_by_mask(&mut self.lp.col_cost, &delete);
        retain_by_mask(&mut self.lp.col_lower, &delete);
        retain_by_mask(&mut self.lp.col_upper, &delete);
        retain_by_mask(&mut self.lp.scale.col, &delete);
        if !self.lp.integrality.is_empty() {
            retain_by_mask(&mut self.lp.integrality, &delete);
        }
        if !self.lp.col_names.is_empty() {
            retain_by_mask(&mut self.lp.col_names, &delete);
        }
        self.lp.a_matrix.delete_cols(&delete);
        self.lp.clear_name_hashes();
        self.basis.clear();
        self.invalidate_model_status(LpAction::DelCols);
        rewrite_mask(ix, &delete);
        debug_assert!(self.lp.dimensions_ok());
        Ok(Outcome::Ok)
    }

    /// Delete the selected rows, with the same mask rewriting as
    /// [`SimplexSolver::delete_cols`].
    pub fn delete_rows(&mut self, ix: &mut IndexCollection) -> Result<Outcome, ModelError> {
        debug_assert!(self.lp.dimensions_ok());
        let num_row = self.lp.num_row();
        if !ix.ok(num_row) {
            return Err(ModelError::InvalidIndexCollection {
                what: "row selection out of range".to_string(),
            });
        }
        let delete = ix.to_mask(num_row);
        if !delete.iter().any(|&d| d) {
            return Ok(Outcome::Ok);
        }
        retain_by_mask(&mut self.lp.row_lower, &delete);
        retain_by_mask(&mut self.lp.row_upper, &delete);
        retain_by_mask(&mut self.lp.scale.row, &delete);
        if !self.lp.row_names.is_empty() {
            retain_by_mask(&mut self.lp.row_names, &delete);
        }
        self.lp.a_matrix.delete_rows(&delete);
        self.lp.clear_name_hashes();
        self.basis.clear();
        self.invalidate_model_status(LpAction::DelRows);
        rewrite_mask(ix, &delete);
        debug_assert!(self.lp.dimensions_ok());
        Ok(Outcome::Ok)
    }

    // --- value mutations ---

    /// Change the integrality of the selected columns.
    pub fn change_integrality(
        &mut self,
        ix: &IndexCollection,
        integrality: &[VarType],
    ) -> Result<Outcome, ModelError> {
        let num_col = self.lp.num_col();
        if !ix.ok(num_col) {
            return Err(ModelError::InvalidIndexCollection {
                what: "column selection out of range".to_string(),
            });
        }
        let selected = ix.iter_selected(num_col);
        if selected.len() != integrality.len() {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} integrality values", selected.len()),
            });
        }
        if self.lp.integrality.is_empty() {
            self.lp.integrality = vec![VarType::Continuous; num_col];
        }
        for (k, &j) in selected.iter().enumerate() {
            self.lp.integrality[j] = integrality[k];
        }
        if self.lp.integrality.iter().all(|&t| t == VarType::Continuous) {
            self.lp.integrality.clear();
        }
        Ok(Outcome::Ok)
    }

    /// Change the costs of the selected columns.
    pub fn change_costs(
        &mut self,
        ix: &IndexCollection,
        cost: &[f64],
    ) -> Result<Outcome, ModelError> {
        let num_col = self.lp.num_col();
        if !ix.ok(num_col) {
            return Err(ModelError::InvalidIndexCollection {
                what: "column selection out of range".to_string(),
            });
        }
        let selected = ix.iter_selected(num_col);
        if selected.len() != cost.len() {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} costs", selected.len()),
            });
        }
        assess_costs(cost)?;
        let mut cost = cost.to_vec();
        scale_slice(&mut cost, self.lp.user_cost_scale, "cost")?;
        for (k, &j) in selected.iter().enumerate() {
            self.lp.col_cost[j] = cost[k];
        }
        self.invalidate_model_status(LpAction::NewCosts);
        Ok(Outcome::Ok)
    }

    /// Change the bounds of the selected columns and refresh the
    /// nonbasic statuses they imply.
    pub fn change_col_bounds(
        &mut self,
        ix: &IndexCollection,
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Outcome, ModelError> {
        let num_col = self.lp.num_col();
        if !ix.ok(num_col) {
            return Err(ModelError::InvalidIndexCollection {
                what: "column selection out of range".to_string(),
            });
        }
        let selected = ix.iter_selected(num_col);
        if selected.len() != lower.len() || selected.len() != upper.len() {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} bound pairs", selected.len()),
            });
        }
        assess_bounds(lower, upper)?;
        let mut lower = lower.to_vec();
        let mut upper = upper.to_vec();
        scale_slice(&mut lower, self.lp.user_bound_scale, "bound")?;
        scale_slice(&mut upper, self.lp.user_bound_scale, "bound")?;
        for (k, &j) in selected.iter().enumerate() {
            self.lp.col_lower[j] = lower[k];
            self.lp.col_upper[j] = upper[k];
        }
        self.invalidate_model_status(LpAction::NewBounds);
        self.set_nonbasic_status(ix, true);
        Ok(Outcome::Ok)
    }

    /// Change the bounds of the selected rows and refresh the nonbasic
    /// statuses they imply.
    pub fn change_row_bounds(
        &mut self,
        ix: &IndexCollection,
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Outcome, ModelError> {
        let num_row = self.lp.num_row();
        if !ix.ok(num_row) {
            return Err(ModelError::InvalidIndexCollection {
                what: "row selection out of range".to_string(),
            });
        }
        let selected = ix.iter_selected(num_row);
        if selected.len() != lower.len() || selected.len() != upper.len() {
            return Err(ModelError::ShapeMismatch {
                what: format!("expected {} bound pairs", selected.len()),
            });
        }
        assess_bounds(lower, upper)?;
        let mut lower = lower.to_vec();
        let mut upper = upper.to_vec();
        scale_slice(&mut lower, self.lp.user_bound_scale, "bound")?;
        scale_slice(&mut upper, self.lp.user_bound_scale, "bound")?;
        for (k, &i) in selected.iter().enumerate() {
            self.lp.row_lower[i] = lower[k];
            self.lp.row_upper[i] = upper[k];
        }
        self.invalidate_model_status(LpAction::NewBounds);
        self.set_nonbasic_status(ix, false);
        Ok(Outcome::Ok)
    }

    /// Replace a single matrix entry; values at or below the small
    /// matrix threshold delete it.
    pub fn change_coefficient(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<Outcome, ModelError> {
        if row >= self.lp.num_row() || col >= self.lp.num_col() {
            return Err(ModelError::InvalidInput {
                what: format!("entry ({}, {}) out of range", row, col),
            });
        }
        if !value.is_finite() && value != 0.0 {
            return Err(ModelError::IllegalMatrixValue { row, col, value });
        }
        if value.abs() >= self.options.large_matrix_value {
            return Err(ModelError::IllegalMatrixValue { row, col, value });
        }
        self.lp
            .a_matrix
            .change_coefficient(row, col, value, self.options.small_matrix_value);
        if self.basis.valid && self.basis.col_status[col] == BasisStatus::Basic {
            // The basis matrix changed under the factorization
            self.basis.alien = true;
        }
        self.invalidate_model_status(LpAction::NewMatrixEntry);
        Ok(Outcome::Ok)
    }

    // --- readers ---

    /// Gather the selected columns.
    pub fn get_cols(&self, ix: &IndexCollection) -> Result<GetColsResult, ModelError> {
        let num_col = self.lp.num_col();
        if !ix.ok(num_col) {
            return Err(ModelError::InvalidIndexCollection {
                what: "column selection out of range".to_string(),
            });
        }
        let mut result = GetColsResult::default();
        result.start.push(0);
        for &j in &ix.iter_selected(num_col) {
            result.cost.push(self.lp.col_cost[j]);
            result.lower.push(self.lp.col_lower[j]);
            result.upper.push(self.lp.col_upper[j]);
            for k in self.lp.a_matrix.start[j]..self.lp.a_matrix.start[j + 1] {
                result.index.push(self.lp.a_matrix.index[k]);
                result.value.push(self.lp.a_matrix.value[k]);
            }
            result.start.push(result.index.len());
            result.num_col += 1;
        }
        Ok(result)
    }

    /// Gather the selected rows.
    pub fn get_rows(&self, ix: &IndexCollection) -> Result<GetRowsResult, ModelError> {
        let num_row = self.lp.num_row();
        if !ix.ok(num_row) {
            return Err(ModelError::InvalidIndexCollection {
                what: "row selection out of range".to_string(),
            });
        }
        let mut result = GetRowsResult::default();
        result.start.push(0);
        let mut row_index = Vec::new();
        let mut row_value = Vec::new();
        for &i in &ix.iter_selected(num_row) {
            result.lower.push(self.lp.row_lower[i]);
            result.upper.push(self.lp.row_upper[i]);
            self.lp.a_matrix.get_row(i, &mut row_index, &mut row_value);
            result.index.extend_from_slice(&row_index);
            result.value.extend_from_slice(&row_value);
            result.start.push(result.index.len());
            result.num_row += 1;
        }
        Ok(result)
    }

    /// Read a single matrix entry.
    pub fn get_coefficient(&self, row: usize, col: usize) -> Result<f64, ModelError> {
        if row >= self.lp.num_row() || col >= self.lp.num_col() {
            return Err(ModelError::InvalidInput {
                what: format!("entry ({}, {}) out of range", row, col),
            });
        }
        Ok(self.lp.a_matrix.get_coefficient(row, col))
    }

    // --- scaling ---

    /// Multiply column `col` of the matrix by a nonzero scalar,
    /// adjusting its cost and bounds; a negative scalar flips the
    /// nonbasic direction.
    pub fn scale_col(&mut self, col: usize, scale: f64) -> Result<Outcome, ModelError> {
        if col >= self.lp.num_col() {
            return Err(ModelError::InvalidInput {
                what: format!("column {} out of range", col),
            });
        }
        if scale == 0.0 || !scale.is_finite() {
            return Err(ModelError::ZeroScaleFactor {
                what: "col",
                index: col,
            });
        }
        self.lp.a_matrix.scale_col(col, scale);
        self.lp.col_cost[col] *= scale;
        let lower = self.lp.col_lower[col] / scale;
        let upper = self.lp.col_upper[col] / scale;
        if scale > 0.0 {
            self.lp.col_lower[col] = lower;
            self.lp.col_upper[col] = upper;
        } else {
            self.lp.col_lower[col] = upper;
            self.lp.col_upper[col] = lower;
            self.flip_nonbasic_direction_col(col);
        }
        self.invalidate_model_status(LpAction::Scaled);
        Ok(Outcome::Ok)
    }

    /// Multiply row `row` of the matrix by a nonzero scalar, adjusting
    /// its bounds; a negative scalar flips the nonbasic direction.
    pub fn scale_row(&mut self, row: usize, scale: f64) -> Result<Outcome, ModelError> {
        if row >= self.lp.num_row() {
            return Err(ModelError::InvalidInput {
                what: format!("row {} out of range", row),
            });
        }
        if scale == 0.0 || !scale.is_finite() {
            return Err(ModelError::ZeroScaleFactor {
                what: "row",
                index: row,
            });
        }
        self.lp.a_matrix.scale_row(row, scale);
        let lower = self.lp.row_lower[row] * scale;
        let upper = self.lp.row_upper[row] * scale;
        if scale > 0.0 {
            self.lp.row_lower[row] = lower;
            self.lp.row_upper[row] = upper;
        } else {
            self.lp.row_lower[row] = upper;
            self.lp.row_upper[row] = lower;
            self.flip_nonbasic_direction_row(row);
        }
        self.invalidate_model_status(LpAction::Scaled);
        Ok(Outcome::Ok)
    }

    fn flip_nonbasic_direction_col(&mut self, col: usize) {
        if self.basis.valid {
            self.basis.col_status[col] = match self.basis.col_status[col] {
                BasisStatus::Lower => BasisStatus::Upper,
                BasisStatus::Upper => BasisStatus::Lower,
                status => status,
            };
        }
        if self.engine.status.has_basis && self.engine.basis.nonbasic_flag[col] == 1 {
            self.engine.basis.nonbasic_move[col] = -self.engine.basis.nonbasic_move[col];
        }
    }

    fn flip_nonbasic_direction_row(&mut self, row: usize) {
        if self.basis.valid {
            self.basis.row_status[row] = match self.basis.row_status[row] {
                BasisStatus::Lower => BasisStatus::Upper,
                BasisStatus::Upper => BasisStatus::Lower,
                status => status,
            };
        }
        let var = self.lp.num_col() + row;
        if self.engine.status.has_basis && self.engine.basis.nonbasic_flag[var] == 1 {
            self.engine.basis.nonbasic_move[var] = -self.engine.basis.nonbasic_move[var];
        }
    }

    // --- basis-system queries ---

    fn ensure_invert(&mut self) -> Result<(), ModelError> {
        if !self.basis.valid {
            return Err(ModelError::InvalidBasis {
                what: "operation requires a valid basis".to_string(),
            });
        }
        if !self.engine.status.has_basis {
            self.engine.set_basis(&self.lp, &self.basis)?;
        }
        if !self.engine.status.has_invert {
            self.engine
                .initialise_simplex_lp_basis_and_factor(&self.lp, true)
                .map_err(|error| match error {
                    EngineError::SingularBasis { rank_deficiency } => {
                        ModelError::SingularBasis { rank_deficiency }
                    }
                    other => ModelError::Engine(other),
                })?;
        }
        Ok(())
    }

    /// The basic variable of every row: the column index, or -(1+i) for
    /// the logical of row i.
    pub fn get_basic_variables(&mut self) -> Result<Vec<isize>, ModelError> {
        if self.lp.num_row() == 0 {
            return Ok(Vec::new());
        }
        self.ensure_invert()?;
        let num_col = self.lp.num_col();
        Ok(self
            .engine
            .basis
            .basic_index
            .iter()
            .map(|&var| {
                if var < num_col {
                    var as isize
                } else {
                    -(1 + (var - num_col) as isize)
                }
            })
            .collect())
    }

    /// Solve B x = rhs (or B^T x = rhs), optionally reporting the
    /// nonzero positions of the solution.
    pub fn basis_solve(
        &mut self,
        rhs: &[f64],
        solution_vector: &mut [f64],
        solution_indices: Option<&mut Vec<usize>>,
        transpose: bool,
    ) -> Result<Outcome, ModelError> {
        let num_row = self.lp.num_row();
        if num_row == 0 {
            return Ok(Outcome::Ok);
        }
        if rhs.len() != num_row || solution_vector.len() < num_row {
            return Err(ModelError::ShapeMismatch {
                what: "rhs or solution buffer has the wrong length".to_string(),
            });
        }
        self.ensure_invert()?;
        let mut vec = HVector::new(num_row);
        for (i, &v) in rhs.iter().enumerate() {
            if v != 0.0 {
                vec.add(i, v);
            }
        }
        if transpose {
            self.engine.factor.btran(&mut vec, 1.0);
        } else {
            self.engine.factor.ftran(&mut vec, 1.0);
        }
        solution_vector[..num_row].copy_from_slice(&vec.array);
        if let Some(indices) = solution_indices {
            indices.clear();
            indices.extend_from_slice(&vec.index[..vec.count]);
        }
        Ok(Outcome::Ok)
    }

    /// The dual unboundedness direction recorded by the last solve, if
    /// any.
    pub fn get_dual_ray(&mut self) -> Result<Option<Vec<f64>>, ModelError> {
        let Some(ray) = self.engine.dual_ray else {
            return Ok(None);
        };
        let num_row = self.lp.num_row();
        let mut rhs = vec![0.0; num_row];
        rhs[ray.index] = ray.sign;
        let mut value = vec![0.0; num_row];
        // The nonzero count is not tracked here
        self.basis_solve(&rhs, &mut value, None, true)?;
        Ok(Some(value))
    }

    /// The primal unboundedness direction recorded by the last solve,
    /// if any, materialised over the structural columns.
    pub fn get_primal_ray(&mut self) -> Result<Option<Vec<f64>>, ModelError> {
        let Some(ray) = self.engine.primal_ray else {
            return Ok(None);
        };
        self.ensure_invert()?;
        let num_col = self.lp.num_col();
        let num_row = self.lp.num_row();
        let mut col_aq = HVector::new(num_row);
        self.engine.matrix.collect_aj(&mut col_aq, ray.index, 1.0);
        self.engine.factor.ftran(&mut col_aq, 1.0);
        let mut ray_value = vec![0.0; num_col];
        for i in 0..num_row {
            let var = self.engine.basis.basic_index[i];
            if var < num_col {
                ray_value[var] = ray.sign * col_aq.array[i];
            }
        }
        if ray.index < num_col {
            ray_value[ray.index] = -ray.sign;
        }
        Ok(Some(ray_value))
    }

    // --- hot start ---

    /// Capture the basis and refactorization trace for a later
    /// [`SimplexSolver::set_hot_start`].
    pub fn get_hot_start(&self) -> HotStart {
        HotStart {
            valid: self.engine.status.has_basis && self.engine.factor.refactor_info.valid,
            basic_index: self.engine.basis.basic_index.clone(),
            nonbasic_move: self.engine.basis.nonbasic_move.clone(),
            refactor_info: self.engine.factor.refactor_info.clone(),
        }
    }

    /// Restore a previously captured basis and factorization trace.
    pub fn set_hot_start(&mut self, hot_start: &HotStart) -> Result<Outcome, ModelError> {
        let num_col = self.lp.num_col();
        let num_row = self.lp.num_row();
        let num_tot = num_col + num_row;
        if !hot_start.valid
            || hot_start.basic_index.len() != num_row
            || hot_start.nonbasic_move.len() != num_tot
        {
            return Err(ModelError::InvalidBasis {
                what: "hot start does not match the LP dimensions".to_string(),
            });
        }
        let mut seen = vec![false; num_tot];
        for &var in &hot_start.basic_index {
            if var >= num_tot || seen[var] {
                return Err(ModelError::InvalidBasis {
                    what: "hot start basic variables are not a valid selection".to_string(),
                });
            }
            seen[var] = true;
        }

        self.engine.initialise_for_new_lp(&self.lp);
        self.engine.basis.basic_index = hot_start.basic_index.clone();
        self.engine.basis.nonbasic_move = hot_start.nonbasic_move.clone();
        self.engine.basis.nonbasic_flag = (0..num_tot)
            .map(|var| if seen[var] { 0 } else { 1 })
            .collect();
        for var in 0..num_tot {
            if seen[var] {
                self.engine.basis.nonbasic_move[var] = MOVE_ZE;
            }
        }
        self.engine.info.num_basic_logicals = hot_start
            .basic_index
            .iter()
            .filter(|&&v| v >= num_col)
            .count();
        self.engine.status.has_basis = true;
        self.engine.factor.refactor_info = hot_start.refactor_info.clone();
        self.engine.use_stored_refactor = hot_start.refactor_info.valid;

        // Rebuild the client statuses from bounds and moves
        self.basis = self.engine.extract_basis(&self.lp);
        self.invalidate_model_status(LpAction::NewBasis);
        self.engine.status.has_basis = true;
        Ok(Outcome::Ok)
    }

    // --- infinite costs ---

    /// Fix variables with infinite cost at the bound their cost pulls
    /// them towards, recording the modification for
    /// [`SimplexSolver::restore_infinite_cost`].
    fn handle_infinite_cost(&mut self) -> Result<bool, ModelError> {
        debug_assert!(self.inf_cost_records.is_empty());
        let sense = self.lp.sense.sign();
        // First pass: every infinite cost must have a usable bound
        for col in 0..self.lp.num_col() {
            let cost = sense * self.lp.col_cost[col];
            if cost == -INF {
                if self.lp.col_upper[col] == INF {
                    return Err(ModelError::InfiniteCostNoBound { col });
                }
            } else if cost == INF && self.lp.col_lower[col] == -INF {
                return Err(ModelError::InfiniteCostNoBound { col });
            }
        }
        // Second pass: fix and zero
        for col in 0..self.lp.num_col() {
            let cost = sense * self.lp.col_cost[col];
            if cost != -INF && cost != INF {
                continue;
            }
            let fix_at = if cost == -INF {
                self.lp.col_upper[col]
            } else {
                self.lp.col_lower[col]
            };
            self.inf_cost_records.push(InfCostRecord {
                col,
                cost: self.lp.col_cost[col],
                lower: self.lp.col_lower[col],
                upper: self.lp.col_upper[col],
            });
            self.lp.col_cost[col] = 0.0;
            self.lp.col_lower[col] = fix_at;
            self.lp.col_upper[col] = fix_at;
            debug!("fixed infinite-cost column {} at {}", col, fix_at);
        }
        Ok(!self.inf_cost_records.is_empty())
    }

    /// Undo [`SimplexSolver::handle_infinite_cost`], adjusting the
    /// objective by the fixed values times their original costs.
    fn restore_infinite_cost(&mut self) {
        let records = std::mem::take(&mut self.inf_cost_records);
        for record in records.iter().rev() {
            self.lp.col_cost[record.col] = record.cost;
            self.lp.col_lower[record.col] = record.lower;
            self.lp.col_upper[record.col] = record.upper;
            if self.solution.value_valid {
                let value = self.solution.col_value[record.col];
                self.info.objective_function_value += value * record.cost;
            }
            if self.basis.valid {
                // A fixed column came back with Lower status; keep the
                // status legal for the restored bounds
                if self.basis.col_status[record.col] == BasisStatus::Lower
                    && record.lower == -INF
                {
                    self.basis.col_status[record.col] = BasisStatus::Upper;
                }
            }
        }
    }

    // --- conditioning ---

    /// Hager condition estimate of the current basis matrix.
    pub fn compute_basis_condition(&mut self) -> Result<f64, ModelError> {
        if self.lp.num_row() == 0 {
            return Ok(0.0);
        }
        self.ensure_invert()?;
        Ok(self.engine.compute_basis_condition())
    }

    /// Condition report for clients chasing ill conditioning; the
    /// formulation of the ill-conditioning LP itself is their business.
    pub fn compute_ill_conditioning(&mut self) -> Result<f64, ModelError> {
        let condition = self.compute_basis_condition()?;
        debug!("basis condition estimate {:e}", condition);
        Ok(condition)
    }

    // --- nonbasic status reconciliation ---

    /// Recompute the status and move of still-nonbasic variables from
    /// their current bounds. Boxed variables keep any definitive status.
    pub(crate) fn set_nonbasic_status(&mut self, ix: &IndexCollection, columns: bool) {
        if !self.basis.valid {
            return;
        }
        let has_simplex_basis = self.engine.status.has_basis;
        let dim = if columns {
            self.lp.num_col()
        } else {
            self.lp.num_row()
        };
        for &k in &ix.iter_selected(dim) {
            if columns {
                if self.basis.col_status[k] == BasisStatus::Basic {
                    continue;
                }
                let lower = self.lp.col_lower[k];
                let upper = self.lp.col_upper[k];
                let mut status = self.basis.col_status[k];
                let mv;
                if lower == upper {
                    if status == BasisStatus::Nonbasic {
                        status = BasisStatus::Lower;
                    }
                    mv = MOVE_ZE;
                } else if lower > -INF {
                    if upper < INF {
                        match status {
                            BasisStatus::Nonbasic | BasisStatus::Zero => {
                                if lower.abs() < upper.abs() {
                                    status = BasisStatus::Lower;
                                    mv = MOVE_UP;
                                } else {
                                    status = BasisStatus::Upper;
                                    mv = MOVE_DN;
                                }
                            }
                            BasisStatus::Lower => mv = MOVE_UP,
                            _ => mv = MOVE_DN,
                        }
                    } else {
                        status = BasisStatus::Lower;
                        mv = MOVE_UP;
                    }
                } else if upper < INF {
                    status = BasisStatus::Upper;
                    mv = MOVE_DN;
                } else {
                    status = BasisStatus::Zero;
                    mv = MOVE_ZE;
                }
                self.basis.col_status[k] = status;
                if has_simplex_basis {
                    self.engine.basis.nonbasic_flag[k] = 1;
                    self.engine.basis.nonbasic_move[k] = mv;
                }
            } else {
                if self.basis.row_status[k] == BasisStatus::Basic {
                    continue;
                }
                let lower = self.lp.row_lower[k];
                let upper = self.lp.row_upper[k];
                let mut status = self.basis.row_status[k];
                let mv;
                if lower == upper {
                    if status == BasisStatus::Nonbasic {
                        status = BasisStatus::Lower;
                    }
                    mv = MOVE_ZE;
                } else if lower > -INF {
                    if upper < INF {
                        match status {
                            BasisStatus::Nonbasic | BasisStatus::Zero => {
                                if lower.abs() < upper.abs() {
                                    status = BasisStatus::Lower;
                                    mv = MOVE_DN;
                                } else {
                                    status = BasisStatus::Upper;
                                    mv = MOVE_UP;
                                }
                            }
                            BasisStatus::Lower => mv = MOVE_DN,
                            _ => mv = MOVE_UP,
                        }
                    } else {
                        status = BasisStatus::Lower;
                        mv = MOVE_DN;
                    }
                } else if upper < INF {
                    status = BasisStatus::Upper;
                    mv = MOVE_UP;
                } else {
                    status = BasisStatus::Zero;
                    mv = MOVE_ZE;
                }
                self.basis.row_status[k] = status;
                if has_simplex_basis {
                    let var = self.lp.num_col() + k;
                    self.engine.basis.nonbasic_flag[var] = 1;
                    self.engine.basis.nonbasic_move[var] = mv;
                }
            }
        }
    }

    // --- option reconciliation ---

    /// Reconcile new scaling exponents and feasibility tolerances with
    /// the stored LP and any solution.
    ///
    /// Scaling changes that would create infinite bounds or costs are
    /// reverted and reported as errors.
    pub fn option_change_action(
        &mut self,
        new_bound_scale: i32,
        new_cost_scale: i32,
        new_primal_feasibility_tolerance: f64,
        new_dual_feasibility_tolerance: f64,
    ) -> Result<Outcome, ModelError> {
        if new_primal_feasibility_tolerance <= 0.0 || new_dual_feasibility_tolerance <= 0.0 {
            return Err(ModelError::OptionOutOfRange {
                option: "feasibility_tolerance",
            });
        }
        let delta_bound = new_bound_scale - self.lp.user_bound_scale;
        let delta_cost = new_cost_scale - self.lp.user_cost_scale;

        if delta_bound != 0 {
            for value in self.lp.col_lower.iter().chain(self.lp.col_upper.iter()) {
                let scaled = apply_scale_exponent(*value, delta_bound);
                if scaled.is_infinite() && value.is_finite() {
                    return Err(ModelError::ScalingOverflow {
                        exponent: new_bound_scale,
                        what: "bound",
                    });
                }
            }
            for value in self.lp.row_lower.iter().chain(self.lp.row_upper.iter()) {
                let scaled = apply_scale_exponent(*value, delta_bound);
                if scaled.is_infinite() && value.is_finite() {
                    return Err(ModelError::ScalingOverflow {
                        exponent: new_bound_scale,
                        what: "bound",
                    });
                }
            }
        }
        if delta_cost != 0 {
            for value in &self.lp.col_cost {
                let scaled = apply_scale_exponent(*value, delta_cost);
                if scaled.is_infinite() && value.is_finite() {
                    return Err(ModelError::ScalingOverflow {
                        exponent: new_cost_scale,
                        what: "cost",
                    });
                }
            }
        }

        let mut changed = false;
        if delta_bound != 0 {
            for value in self
                .lp
                .col_lower
                .iter_mut()
                .chain(self.lp.col_upper.iter_mut())
                .chain(self.lp.row_lower.iter_mut())
                .chain(self.lp.row_upper.iter_mut())
            {
                *value = apply_scale_exponent(*value, delta_bound);
            }
            if self.solution.value_valid {
                // Values scale with the bounds
                let factor = f64::powi(2.0, delta_bound);
                for value in self
                    .solution
                    .col_value
                    .iter_mut()
                    .chain(self.solution.row_value.iter_mut())
                {
                    *value *= factor;
                }
                self.info.objective_function_value *= factor;
            }
            self.lp.user_bound_scale = new_bound_scale;
            changed = true;
        }
        if delta_cost != 0 {
            for value in self.lp.col_cost.iter_mut() {
                *value = apply_scale_exponent(*value, delta_cost);
            }
            if self.solution.dual_valid {
                let factor = f64::powi(2.0, delta_cost);
                for dual in self
                    .solution
                    .col_dual
                    .iter_mut()
                    .chain(self.solution.row_dual.iter_mut())
                {
                    *dual *= factor;
                }
                self.info.objective_function_value *= factor;
            }
            self.lp.user_cost_scale = new_cost_scale;
            changed = true;
        }

        let tolerances_changed = new_primal_feasibility_tolerance
            != self.options.primal_feasibility_tolerance
            || new_dual_feasibility_tolerance != self.options.dual_feasibility_tolerance;
        self.options.primal_feasibility_tolerance = new_primal_feasibility_tolerance;
        self.options.dual_feasibility_tolerance = new_dual_feasibility_tolerance;

        if changed {
            self.invalidate_model_status(LpAction::NewBounds);
        } else if tolerances_changed && self.info.valid {
            // Feasibility flags must be judged against the new
            // tolerances
            self.engine.options.primal_feasibility_tolerance = new_primal_feasibility_tolerance;
            self.engine.options.dual_feasibility_tolerance = new_dual_feasibility_tolerance;
            self.engine.compute_simplex_infeasible();
            self.info.num_primal_infeasibility = self.engine.info.num_primal_infeasibility;
            self.info.num_dual_infeasibility = self.engine.info.num_dual_infeasibility;
            if self.model_status == ModelStatus::Optimal
                && (self.info.num_primal_infeasibility > 0 || self.info.num_dual_infeasibility > 0)
            {
                self.model_status = ModelStatus::NotSet;
            }
        }
        Ok(Outcome::Ok)
    }
}

/// Apply the user scaling exponents to a freshly loaded LP.
fn apply_user_scaling(lp: &mut Lp) -> Result<(), ModelError> {
    let bound_scale = lp.user_bound_scale;
    let cost_scale = lp.user_cost_scale;
    if bound_scale != 0 {
        for value in lp
            .col_lower
            .iter_mut()
            .chain(lp.col_upper.iter_mut())
            .chain(lp.row_lower.iter_mut())
            .chain(lp.row_upper.iter_mut())
        {
            let scaled = apply_scale_exponent(*value, bound_scale);
            if scaled.is_infinite() && value.is_finite() {
                return Err(ModelError::ScalingOverflow {
                    exponent: bound_scale,
                    what: "bound",
                });
            }
            *value = scaled;
        }
    }
    if cost_scale != 0 {
        for value in lp.col_cost.iter_mut() {
            let scaled = apply_scale_exponent(*value, cost_scale);
            if scaled.is_infinite() && value.is_finite() {
                return Err(ModelError::ScalingOverflow {
                    exponent: cost_scale,
                    what: "cost",
                });
            }
            *value = scaled;
        }
    }
    Ok(())
}

/// Scale a slice by 2^exponent, rejecting overflow to infinity.
fn scale_slice(values: &mut [f64], exponent: i32, what: &'static str) -> Result<(), ModelError> {
    if exponent == 0 {
        return Ok(());
    }
    for value in values.iter_mut() {
        let scaled = apply_scale_exponent(*value, exponent);
        if scaled.is_infinite() && value.is_finite() {
            return Err(ModelError::ScalingOverflow { exponent, what });
        }
        *value = scaled;
    }
    Ok(())
}

fn retain_by_mask<T>(values: &mut Vec<T>, delete: &[bool]) {
    let mut k = 0usize;
    values.retain(|_| {
        let keep = !delete[k];
        k += 1;
        keep
    });
}

/// Rewrite a mask collection after a delete: retained indices map to
/// their new positions, deleted ones to -1.
fn rewrite_mask(ix: &mut IndexCollection, delete: &[bool]) {
    if let IndexCollection::Mask(mask) = ix {
        let mut next = 0i32;
        for (k, &deleted) in delete.iter().enumerate() {
            if deleted {
                mask[k] = -1;
            } else {
                mask[k] = next;
                next += 1;
            }
        }
    }
}
