//! Engine state and the primitive operations the drivers are built from.

use std::time::Instant;

use log::{debug, warn};
use thiserror::Error;

use crate::basis::{work_bounds, Basis, BasisStatus, SimplexBasis, MOVE_DN, MOVE_UP, MOVE_ZE};
use crate::factor::{FactorError, SimplexFactor};
use crate::model::{
    DualEdgeWeightStrategy, Lp, ModelStatus, PriceStrategy, SimplexStrategy, Solution,
    SolverOptions, ILLEGAL_INFEASIBILITY_COUNT, ILLEGAL_INFEASIBILITY_MEASURE, INF,
    DUAL_MULTI_MIN_THREADS, DUAL_TASKS_MIN_THREADS,
};
use crate::random::SimplexRandom;
use crate::sparse::{HVector, SparseMatrix, HYPER_PRICE_DENSITY};

use super::control::BacktrackingBasis;
use super::diagnostics::DiagnosticsConfig;
use super::workspace::SimplexWorkspace;
use super::{
    RebuildReason, SimplexAlgorithm, PHASE_2, PHASE_UNKNOWN,
    SYNTHETIC_TICK_REINVERSION_MIN_UPDATE_COUNT,
};

/// Errors raised by the engine during a solve.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A factorization was required from the known basis only and the
    /// basis is singular
    #[error("basis is rank deficient by {rank_deficiency}")]
    SingularBasis {
        /// Number of dependent basis columns
        rank_deficiency: usize,
    },

    /// No basis is available where one is required
    #[error("no basis available: {0}")]
    MissingBasis(String),

    /// Rank deficiency appeared and no backtracking snapshot could
    /// recover from it
    #[error("backtracking after rank deficiency failed")]
    BacktrackFailed,

    /// Dual feasibility required a cost shift that was disallowed
    #[error("required cost shift was not permitted")]
    CostShiftSkipped,

    /// The factorization layer failed
    #[error(transparent)]
    Factor(#[from] FactorError),
}

/// Mutations the interface reports to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpAction {
    /// A different LP was installed
    NewLp,
    /// A basis was installed
    NewBasis,
    /// Columns were appended
    NewCols,
    /// Rows were appended
    NewRows,
    /// Columns were deleted
    DelCols,
    /// Rows were deleted
    DelRows,
    /// Costs changed
    NewCosts,
    /// Bounds changed
    NewBounds,
    /// A matrix entry changed
    NewMatrixEntry,
    /// A row or column was scaled
    Scaled,
    /// The engine reverted to an earlier basis
    Backtracking,
}

/// Validity flags tying the engine state together.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexStatus {
    pub initialised: bool,
    pub has_basis: bool,
    pub has_matrix: bool,
    pub has_invert: bool,
    pub has_fresh_invert: bool,
    pub has_fresh_rebuild: bool,
    pub has_dual_ray: bool,
    pub has_primal_ray: bool,
    pub valid: bool,
}

/// Iteration bookkeeping, densities and infeasibility summaries.
#[derive(Debug, Clone)]
pub struct SimplexInfo {
    pub simplex_strategy: SimplexStrategy,
    pub price_strategy: PriceStrategy,
    pub dual_edge_weight_strategy: DualEdgeWeightStrategy,
    pub num_threads: usize,
    pub min_threads: usize,
    pub max_threads: usize,

    pub update_count: usize,
    pub update_limit: usize,
    pub factor_pivot_threshold: f64,

    pub costs_perturbed: bool,
    pub bounds_perturbed: bool,
    pub allow_cost_perturbation: bool,
    pub allow_bound_perturbation: bool,
    pub dual_simplex_cost_perturbation_multiplier: f64,
    pub primal_simplex_bound_perturbation_multiplier: f64,

    pub num_primal_infeasibility: isize,
    pub max_primal_infeasibility: f64,
    pub sum_primal_infeasibility: f64,
    pub num_dual_infeasibility: isize,
    pub max_dual_infeasibility: f64,
    pub sum_dual_infeasibility: f64,

    pub primal_objective_value: f64,
    pub dual_objective_value: f64,
    pub updated_dual_objective_value: f64,

    pub num_basic_logicals: usize,
    pub backtracking: bool,

    pub col_aq_density: f64,
    pub row_ep_density: f64,
    pub row_ap_density: f64,
    pub primal_col_density: f64,
    pub dual_col_density: f64,
}

impl Default for SimplexInfo {
    fn default() -> Self {
        Self {
            simplex_strategy: SimplexStrategy::Choose,
            price_strategy: PriceStrategy::RowSwitchColSwitch,
            dual_edge_weight_strategy: DualEdgeWeightStrategy::Devex,
            num_threads: 1,
            min_threads: 1,
            max_threads: 1,
            update_count: 0,
            update_limit: 5000,
            factor_pivot_threshold: super::DEFAULT_PIVOT_THRESHOLD,
            costs_perturbed: false,
            bounds_perturbed: false,
            allow_cost_perturbation: true,
            allow_bound_perturbation: true,
            dual_simplex_cost_perturbation_multiplier: 1.0,
            primal_simplex_bound_perturbation_multiplier: 1.0,
            num_primal_infeasibility: ILLEGAL_INFEASIBILITY_COUNT,
            max_primal_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            sum_primal_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            num_dual_infeasibility: ILLEGAL_INFEASIBILITY_COUNT,
            max_dual_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            sum_dual_infeasibility: ILLEGAL_INFEASIBILITY_MEASURE,
            primal_objective_value: 0.0,
            dual_objective_value: 0.0,
            updated_dual_objective_value: 0.0,
            num_basic_logicals: 0,
            backtracking: false,
            col_aq_density: 0.0,
            row_ep_density: 0.01,
            row_ap_density: 0.0,
            primal_col_density: 0.05,
            dual_col_density: 0.8,
        }
    }
}

/// A recorded certificate direction.
#[derive(Debug, Clone, Copy)]
pub struct RayRecord {
    /// Row (dual ray) or variable (primal ray)
    pub index: usize,
    /// Sign of the direction
    pub sign: f64,
}

/// The revised simplex engine.
///
/// Owns the basis, its factorization and the working arrays; the LP is
/// borrowed for the duration of each call so the host retains the single
/// authoritative copy of the model.
#[derive(Debug)]
pub struct SimplexEngine {
    pub options: SolverOptions,
    pub num_col: usize,
    pub num_row: usize,

    /// Solve-time copy of the constraint matrix carrying the PRICE
    /// partition
    pub matrix: SparseMatrix,
    pub basis: SimplexBasis,
    pub factor: SimplexFactor,
    pub ws: SimplexWorkspace,
    pub random: SimplexRandom,

    pub status: SimplexStatus,
    pub info: SimplexInfo,
    pub model_status: ModelStatus,
    pub iteration_count: usize,

    /// Multiplier taking engine cost units back to user units
    pub cost_scale: f64,
    /// Multiplier taking engine value units back to user units
    pub bound_scale: f64,

    pub dual_ray: Option<RayRecord>,
    pub primal_ray: Option<RayRecord>,

    pub backtracking: BacktrackingBasis,
    pub(crate) diagnostics: DiagnosticsConfig,

    pub(crate) solve_start: Option<Instant>,
    pub solve_bailout: bool,
    pub called_return_from_solve: bool,

    /// Try the stored refactorization trace on the next factor
    pub(crate) use_stored_refactor: bool,
}

impl SimplexEngine {
    /// Create an engine for the given options.
    pub fn new(options: SolverOptions) -> Self {
        let random = SimplexRandom::new(options.random_seed);
        let factor = SimplexFactor::new(
            options.factor_pivot_threshold,
            options.factor_pivot_tolerance,
        );
        let mut info = SimplexInfo {
            update_limit: options.simplex_update_limit,
            factor_pivot_threshold: options.factor_pivot_threshold,
            dual_simplex_cost_perturbation_multiplier: options
                .dual_simplex_cost_perturbation_multiplier,
            primal_simplex_bound_perturbation_multiplier: options
                .primal_simplex_bound_perturbation_multiplier,
            price_strategy: options.price_strategy,
            dual_edge_weight_strategy: options.dual_edge_weight_strategy,
            ..Default::default()
        };
        info.simplex_strategy = options.simplex_strategy;
        Self {
            options,
            num_col: 0,
            num_row: 0,
            matrix: SparseMatrix::default(),
            basis: SimplexBasis::default(),
            factor,
            ws: SimplexWorkspace::default(),
            random,
            status: SimplexStatus::default(),
            info,
            model_status: ModelStatus::NotSet,
            iteration_count: 0,
            cost_scale: 1.0,
            bound_scale: 1.0,
            dual_ray: None,
            primal_ray: None,
            backtracking: BacktrackingBasis::default(),
            diagnostics: DiagnosticsConfig::from_env(),
            solve_start: None,
            solve_bailout: false,
            called_return_from_solve: false,
            use_stored_refactor: false,
        }
    }

    /// Scale factor applied to objective contributions.
    #[inline]
    pub(crate) fn objective_scale(&self) -> f64 {
        self.cost_scale * self.bound_scale
    }

    /// React to a model mutation reported by the interface.
    pub fn update_status(&mut self, action: LpAction) {
        match action {
            LpAction::NewLp => {
                self.status = SimplexStatus::default();
                self.basis = SimplexBasis::default();
                self.model_status = ModelStatus::NotSet;
                self.backtracking.valid = false;
            }
            LpAction::NewBasis | LpAction::DelCols | LpAction::DelRows => {
                self.status.has_invert = false;
                self.status.has_fresh_invert = false;
                self.status.has_fresh_rebuild = false;
                self.status.has_matrix = false;
                self.status.valid = false;
                self.model_status = ModelStatus::NotSet;
                self.backtracking.valid = false;
                if matches!(action, LpAction::DelCols | LpAction::DelRows) {
                    self.status.has_basis = false;
                }
            }
            LpAction::NewCols | LpAction::NewRows | LpAction::NewMatrixEntry | LpAction::Scaled => {
                self.status.has_invert = false;
                self.status.has_fresh_invert = false;
                self.status.has_fresh_rebuild = false;
                self.status.has_matrix = false;
                self.status.valid = false;
                self.model_status = ModelStatus::NotSet;
                self.backtracking.valid = false;
            }
            LpAction::NewCosts => {
                self.status.has_fresh_rebuild = false;
                self.status.valid = false;
                self.model_status = ModelStatus::NotSet;
            }
            LpAction::NewBounds => {
                self.status.has_fresh_rebuild = false;
                self.status.valid = false;
                self.model_status = ModelStatus::NotSet;
            }
            LpAction::Backtracking => {
                self.status.has_fresh_invert = false;
                self.status.has_fresh_rebuild = false;
            }
        }
        self.status.has_dual_ray = false;
        self.status.has_primal_ray = false;
        self.dual_ray = None;
        self.primal_ray = None;
    }

    /// Refresh dimensions, arrays and random vectors for the (possibly
    /// modified) LP.
    pub(crate) fn initialise_for_new_lp(&mut self, lp: &Lp) {
        let dims_changed = self.num_col != lp.num_col() || self.num_row != lp.num_row();
        self.num_col = lp.num_col();
        self.num_row = lp.num_row();
        if dims_changed || !self.status.initialised {
            self.ws.resize(self.num_col, self.num_row);
            self.initialise_random_vectors();
        }
        self.info.update_limit = self.options.simplex_update_limit;
        self.info.dual_simplex_cost_perturbation_multiplier =
            self.options.dual_simplex_cost_perturbation_multiplier;
        self.info.primal_simplex_bound_perturbation_multiplier =
            self.options.primal_simplex_bound_perturbation_multiplier;
        self.info.price_strategy = self.options.price_strategy;
        self.info.dual_edge_weight_strategy = self.options.dual_edge_weight_strategy;
        self.cost_scale = f64::powi(2.0, -lp.user_cost_scale);
        self.bound_scale = f64::powi(2.0, -lp.user_bound_scale);
        self.status.initialised = true;
    }

    fn initialise_random_vectors(&mut self) {
        let num_tot = self.num_col + self.num_row;
        self.random.initialise(self.options.random_seed);
        self.ws.num_tot_permutation = (0..num_tot).collect();
        let mut permutation = std::mem::take(&mut self.ws.num_tot_permutation);
        self.random.shuffle(&mut permutation);
        self.ws.num_tot_permutation = permutation;
        self.ws.num_tot_random_value = (0..num_tot).map(|_| self.random.fraction()).collect();
    }

    /// Copy the constraint matrix and set up the PRICE partition.
    pub(crate) fn initialise_matrix(&mut self, lp: &Lp) {
        self.matrix = lp.a_matrix.clone();
        self.matrix.ensure_colwise();
        self.matrix.setup_price(&self.basis.nonbasic_flag);
        self.status.has_matrix = true;
    }

    /// Install the logical basis.
    pub fn set_logical_basis(&mut self, lp: &Lp) {
        self.initialise_for_new_lp(lp);
        self.basis.set_logical(lp);
        self.info.num_basic_logicals = self.num_row;
        self.status.has_basis = true;
    }

    /// Install a client basis.
    pub fn set_basis(&mut self, lp: &Lp, basis: &Basis) -> Result<(), crate::model::ModelError> {
        self.initialise_for_new_lp(lp);
        self.basis.set_from_basis(lp, basis)?;
        self.info.num_basic_logicals = self
            .basis
            .basic_index
            .iter()
            .filter(|&&v| v >= self.num_col)
            .count();
        self.status.has_basis = true;
        Ok(())
    }

    /// Install a low-level basis.
    pub fn set_simplex_basis(
        &mut self,
        lp: &Lp,
        basis: &SimplexBasis,
    ) -> Result<(), crate::model::ModelError> {
        self.initialise_for_new_lp(lp);
        self.basis.set_from_simplex_basis(lp, basis)?;
        self.info.num_basic_logicals = self
            .basis
            .basic_index
            .iter()
            .filter(|&&v| v >= self.num_col)
            .count();
        self.status.has_basis = true;
        Ok(())
    }

    /// Factorize the current basis. Returns the rank deficiency; the
    /// basis matrix positions of deficient columns have been patched with
    /// logicals but the flags are not yet reconciled.
    pub(crate) fn compute_factor(&mut self, _lp: &Lp) -> usize {
        debug_assert!(self.status.has_matrix);
        self.factor
            .set_pivot_threshold(self.info.factor_pivot_threshold);
        if self.use_stored_refactor {
            self.use_stored_refactor = false;
            let info = self.factor.refactor_info.clone();
            if self
                .factor
                .rebuild_from(&self.matrix, &self.basis.basic_index, &info)
                .is_ok()
            {
                self.info.update_count = 0;
                self.status.has_invert = true;
                self.status.has_fresh_invert = true;
                return 0;
            }
        }
        let rank_deficiency = self.factor.build(&self.matrix, &mut self.basis.basic_index);
        if rank_deficiency > 0 {
            self.status.has_invert = false;
            self.status.has_fresh_invert = false;
        } else {
            self.status.has_invert = true;
            self.status.has_fresh_invert = true;
        }
        self.info.update_count = 0;
        rank_deficiency
    }

    /// Ensure a basis exists and is factorized, repairing rank
    /// deficiency unless the caller requires the supplied basis to be
    /// used exactly.
    pub fn initialise_simplex_lp_basis_and_factor(
        &mut self,
        lp: &Lp,
        only_from_known_basis: bool,
    ) -> Result<(), EngineError> {
        self.initialise_for_new_lp(lp);
        if !self.status.has_basis {
            if only_from_known_basis {
                return Err(EngineError::MissingBasis(
                    "simplex basis should be known but is not".to_string(),
                ));
            }
            self.set_logical_basis(lp);
        }
        self.initialise_matrix(lp);
        let rank_deficiency = self.compute_factor(lp);
        if rank_deficiency > 0 {
            if only_from_known_basis {
                return Err(EngineError::SingularBasis { rank_deficiency });
            }
            let no_pv_r = self.factor.no_pv_r.clone();
            let no_pv_c = self.factor.no_pv_c.clone();
            self.basis.handle_rank_deficiency(lp, &no_pv_r, &no_pv_c);
            // The nonbasic partition changed, so PRICE must repartition
            self.matrix.setup_price(&self.basis.nonbasic_flag);
            let second = self.compute_factor(lp);
            if second > 0 {
                return Err(EngineError::SingularBasis {
                    rank_deficiency: second,
                });
            }
            self.info.num_basic_logicals = self
                .basis
                .basic_index
                .iter()
                .filter(|&&v| v >= self.num_col)
                .count();
        }
        Ok(())
    }

    /// Prepare the workspace and iterates for a solve; detects an
    /// already-optimal basis.
    pub(crate) fn initialise_for_solve(&mut self, lp: &Lp) -> Result<(), EngineError> {
        self.initialise_simplex_lp_basis_and_factor(lp, false)?;
        debug_assert!(self.status.has_basis);
        self.initialise_cost(lp, SimplexAlgorithm::Primal, PHASE_UNKNOWN, false);
        self.initialise_bound(lp, SimplexAlgorithm::Primal, PHASE_UNKNOWN, false);
        self.initialise_nonbasic_value_and_move();
        self.compute_primal(lp);
        self.compute_dual(lp);
        self.compute_simplex_infeasible();
        self.compute_dual_objective_value(lp, PHASE_2);
        self.compute_primal_objective_value(lp);
        self.status.valid = true;

        let primal_feasible = self.info.num_primal_infeasibility == 0;
        let dual_feasible = self.info.num_dual_infeasibility == 0;
        self.model_status = ModelStatus::NotSet;
        if primal_feasible && dual_feasible {
            self.model_status = ModelStatus::Optimal;
        }
        Ok(())
    }

    /// Run the simplex method on the LP.
    pub fn solve(&mut self, lp: &Lp) -> Result<ModelStatus, EngineError> {
        self.iteration_count = 0;
        self.solve_start = Some(Instant::now());
        self.solve_bailout = false;
        self.initialise_for_solve(lp)?;
        if self.model_status == ModelStatus::Optimal {
            return Ok(self.model_status);
        }

        self.status.has_dual_ray = false;
        self.status.has_primal_ray = false;
        self.dual_ray = None;
        self.primal_ray = None;

        // A block on perturbations may be hanging over from a previous
        // call
        self.info.allow_cost_perturbation = true;
        self.info.allow_bound_perturbation = true;

        self.choose_simplex_strategy();
        match self.info.simplex_strategy {
            SimplexStrategy::Primal => {
                debug!("using primal simplex solver");
                self.solve_primal(lp)?;
            }
            _ => {
                debug!(
                    "using dual simplex solver ({:?}, {} threads)",
                    self.info.simplex_strategy, self.info.num_threads
                );
                self.solve_dual(lp)?;
                if self.model_status == ModelStatus::UnboundedOrInfeasible {
                    // The dual solver cannot tell unbounded from
                    // infeasible; the primal solver can
                    self.solve_primal(lp)?;
                }
            }
        }
        debug!(
            "simplex returns {} primal and {} dual infeasibilities: status {}",
            self.info.num_primal_infeasibility,
            self.info.num_dual_infeasibility,
            self.model_status
        );
        if self.model_status == ModelStatus::NotSet {
            self.cleanup(lp)?;
        }
        Ok(self.model_status)
    }

    /// Remove residual infeasibility left by the first driver by running
    /// the complementary one without perturbation.
    pub(crate) fn cleanup(&mut self, lp: &Lp) -> Result<(), EngineError> {
        if self.info.num_primal_infeasibility > 0 && self.info.num_dual_infeasibility == 0 {
            // Primal infeasibilities only, so dual phase 2 with Devex
            // weights and no cost perturbation
            self.info.simplex_strategy = SimplexStrategy::Dual;
            self.info.dual_simplex_cost_perturbation_multiplier = 0.0;
            self.info.dual_edge_weight_strategy = DualEdgeWeightStrategy::Devex;
            self.solve_dual(lp)?;
        } else {
            // Dual (or mixed) infeasibilities: primal simplex with no
            // bound perturbation; its phase 1 covers the mixed case
            self.info.simplex_strategy = SimplexStrategy::Primal;
            self.info.primal_simplex_bound_perturbation_multiplier = 0.0;
            self.solve_primal(lp)?;
        }
        Ok(())
    }

    /// Resolve the strategy option against feasibility and the thread
    /// floors for the parallel variants.
    pub(crate) fn choose_simplex_strategy(&mut self) {
        let mut strategy = self.options.simplex_strategy;
        if strategy == SimplexStrategy::Choose {
            strategy = if self.info.num_primal_infeasibility > 0 {
                SimplexStrategy::Dual
            } else {
                SimplexStrategy::Primal
            };
        }
        self.info.min_threads = 1;
        self.info.max_threads = 1;
        if self.options.parallel
            && strategy == SimplexStrategy::Dual
            && self.options.threads >= DUAL_MULTI_MIN_THREADS
        {
            strategy = SimplexStrategy::DualMulti;
        }
        match strategy {
            SimplexStrategy::DualTasks => {
                if self.options.parallel && self.options.threads >= DUAL_TASKS_MIN_THREADS {
                    self.info.min_threads = DUAL_TASKS_MIN_THREADS;
                    self.info.max_threads = self.options.threads;
                } else {
                    strategy = SimplexStrategy::Dual;
                }
            }
            SimplexStrategy::DualMulti => {
                if self.options.parallel && self.options.threads >= DUAL_MULTI_MIN_THREADS {
                    self.info.min_threads = DUAL_MULTI_MIN_THREADS;
                    self.info.max_threads = self.options.threads;
                } else {
                    strategy = SimplexStrategy::Dual;
                }
            }
            _ => {}
        }
        self.info.num_threads = self.info.max_threads;
        self.info.simplex_strategy = strategy;
    }

    // --- FTRAN / BTRAN / PRICE primitives ---

    /// Build column `var` of [A | I], FTRAN it, and track its density.
    pub(crate) fn pivot_column_ftran(&mut self, var: usize, col_aq: &mut HVector) {
        col_aq.clear();
        self.matrix.collect_aj(col_aq, var, 1.0);
        let expected = self.info.col_aq_density;
        self.factor.ftran(col_aq, expected);
        let local_density = col_aq.count as f64 / self.num_row.max(1) as f64;
        update_density(local_density, &mut self.info.col_aq_density);
    }

    /// Produce (B^-T) e_p.
    pub(crate) fn unit_btran(&mut self, p: usize, row_ep: &mut HVector) {
        row_ep.clear();
        row_ep.add(p, 1.0);
        let expected = self.info.row_ep_density;
        self.factor.btran(row_ep, expected);
        let local_density = row_ep.count as f64 / self.num_row.max(1) as f64;
        update_density(local_density, &mut self.info.row_ep_density);
    }

    /// BTRAN a full buffer, tracking the dual column density.
    pub(crate) fn full_btran(&mut self, buffer: &mut HVector) {
        let expected = self.info.dual_col_density;
        self.factor.btran(buffer, expected);
        let local_density = buffer.count as f64 / self.num_row.max(1) as f64;
        update_density(local_density, &mut self.info.dual_col_density);
    }

    /// Decide between the PRICE techniques from the strategy option and
    /// the row density.
    pub(crate) fn choose_price_technique(&self, row_ep_density: f64) -> (bool, bool) {
        // Switch to column PRICE when pi_p has at least this density
        const DENSITY_FOR_COLUMN_PRICE_SWITCH: f64 = 0.75;
        let use_col_price = self.info.price_strategy == PriceStrategy::Col
            || (self.info.price_strategy == PriceStrategy::RowSwitchColSwitch
                && row_ep_density > DENSITY_FOR_COLUMN_PRICE_SWITCH);
        let use_row_price_with_switch = self.info.price_strategy == PriceStrategy::RowSwitch
            || self.info.price_strategy == PriceStrategy::RowSwitchColSwitch;
        (use_col_price, use_row_price_with_switch)
    }

    /// Compute row_ap = A^T row_ep over the nonbasic columns.
    pub(crate) fn tableau_row_price(&mut self, row_ep: &HVector, row_ap: &mut HVector) {
        let local_density = row_ep.count as f64 / self.num_row.max(1) as f64;
        let (use_col_price, use_row_price_with_switch) = self.choose_price_technique(local_density);
        if use_col_price {
            self.matrix.price_by_column(row_ap, row_ep);
            // Column PRICE computes components for basic variables too;
            // nonbasicFlag zeroes them
            for j in 0..self.num_col {
                if self.basis.nonbasic_flag[j] == 0 {
                    row_ap.array[j] = 0.0;
                }
            }
            row_ap.reindex();
        } else if use_row_price_with_switch {
            self.matrix
                .price_by_row_with_switch(row_ap, row_ep, HYPER_PRICE_DENSITY);
        } else {
            self.matrix.price_by_row_sparse(row_ap, row_ep);
        }
        let local_row_ap_density = row_ap.count as f64 / self.num_col.max(1) as f64;
        update_density(local_row_ap_density, &mut self.info.row_ap_density);
    }

    /// Column PRICE of a full vector.
    pub(crate) fn full_price(&mut self, full_col: &HVector, full_row: &mut HVector) {
        self.matrix.price_by_column(full_row, full_col);
    }

    /// Recompute the values of the basic variables by FTRAN of the
    /// nonbasic contributions.
    pub(crate) fn compute_primal(&mut self, _lp: &Lp) {
        let num_tot = self.num_col + self.num_row;
        let mut primal_col = HVector::new(self.num_row);
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] == 1 && self.ws.work_value[var] != 0.0 {
                self.matrix
                    .collect_aj(&mut primal_col, var, self.ws.work_value[var]);
            }
        }
        if primal_col.count > 0 {
            let expected = self.info.primal_col_density;
            self.factor.ftran(&mut primal_col, expected);
            let local_density = primal_col.count as f64 / self.num_row.max(1) as f64;
            update_density(local_density, &mut self.info.primal_col_density);
        }
        for i in 0..self.num_row {
            let var = self.basis.basic_index[i];
            self.ws.base_value[i] = -primal_col.array[i];
            self.ws.base_lower[i] = self.ws.work_lower[var];
            self.ws.base_upper[i] = self.ws.work_upper[var];
        }
        self.invalidate_primal_infeasibility_record();
    }

    /// Recompute every reduced cost by BTRAN of the basic costs and a
    /// full PRICE.
    pub(crate) fn compute_dual(&mut self, _lp: &Lp) {
        let num_tot = self.num_col + self.num_row;
        let mut dual_col = HVector::new(self.num_row);
        for i in 0..self.num_row {
            let var = self.basis.basic_index[i];
            let value = self.ws.work_cost[var] + self.ws.work_shift[var];
            if value != 0.0 {
                dual_col.add(i, value);
            }
        }
        for var in 0..num_tot {
            self.ws.work_dual[var] = self.ws.work_cost[var] + self.ws.work_shift[var];
        }
        if dual_col.count > 0 {
            self.full_btran(&mut dual_col);
            let mut dual_row = HVector::new(self.num_col);
            self.full_price(&dual_col, &mut dual_row);
            for j in 0..self.num_col {
                self.ws.work_dual[j] -= dual_row.array[j];
            }
            for i in 0..self.num_row {
                self.ws.work_dual[self.num_col + i] -= dual_col.array[i];
            }
        }
        self.invalidate_dual_infeasibility_record();
    }

    /// Reduced cost of `var` from its FTRANned tableau column.
    pub(crate) fn compute_dual_for_tableau_column(
        &self,
        var: usize,
        tableau_column: &HVector,
    ) -> f64 {
        let mut dual = self.ws.work_cost[var] + self.ws.work_shift[var];
        for k in 0..tableau_column.count {
            let position = tableau_column.index[k];
            let basic_var = self.basis.basic_index[position];
            dual -= tableau_column.array[position]
                * (self.ws.work_cost[basic_var] + self.ws.work_shift[basic_var]);
        }
        dual
    }

    // --- objective values and infeasibility summaries ---

    pub(crate) fn compute_primal_objective_value(&mut self, lp: &Lp) {
        let mut objective = 0.0;
        for i in 0..self.num_row {
            let var = self.basis.basic_index[i];
            if var < self.num_col {
                objective += self.ws.base_value[i] * lp.col_cost[var];
            }
        }
        for j in 0..self.num_col {
            if self.basis.nonbasic_flag[j] == 1 {
                objective += self.ws.work_value[j] * lp.col_cost[j];
            }
        }
        objective *= self.objective_scale();
        // Primal values against original costs, so the offset is vanilla
        objective += lp.offset;
        self.info.primal_objective_value = objective;
    }

    pub(crate) fn compute_dual_objective_value(&mut self, lp: &Lp, phase: i32) {
        let num_tot = self.num_col + self.num_row;
        let mut objective = 0.0;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] == 1 {
                objective += self.ws.work_value[var] * self.ws.work_dual[var];
            }
        }
        objective *= self.objective_scale();
        if phase != 1 {
            // workCost and hence workDual carry the sense sign, so the
            // offset enters with it
            objective += lp.sense.sign() * lp.offset;
        }
        self.info.dual_objective_value = objective;
        self.info.updated_dual_objective_value = objective;
    }

    pub(crate) fn compute_simplex_infeasible(&mut self) {
        self.compute_simplex_primal_infeasible();
        self.compute_simplex_dual_infeasible();
    }

    pub(crate) fn compute_simplex_primal_infeasible(&mut self) {
        let tolerance = self.options.primal_feasibility_tolerance;
        let mut num = 0isize;
        let mut max = 0.0f64;
        let mut sum = 0.0f64;
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            let value = self.ws.work_value[var];
            let infeasibility =
                (self.ws.work_lower[var] - value).max(value - self.ws.work_upper[var]);
            if infeasibility > 0.0 {
                if infeasibility > tolerance {
                    num += 1;
                }
                max = max.max(infeasibility);
                sum += infeasibility;
            }
        }
        for i in 0..self.num_row {
            let value = self.ws.base_value[i];
            let infeasibility = (self.ws.base_lower[i] - value).max(value - self.ws.base_upper[i]);
            if infeasibility > 0.0 {
                if infeasibility > tolerance {
                    num += 1;
                }
                max = max.max(infeasibility);
                sum += infeasibility;
            }
        }
        self.info.num_primal_infeasibility = num;
        self.info.max_primal_infeasibility = max;
        self.info.sum_primal_infeasibility = sum;
    }

    pub(crate) fn compute_simplex_dual_infeasible(&mut self) {
        let tolerance = self.options.dual_feasibility_tolerance;
        let mut num = 0isize;
        let mut max = 0.0f64;
        let mut sum = 0.0f64;
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            let dual = self.ws.work_dual[var];
            let lower = self.ws.work_lower[var];
            let upper = self.ws.work_upper[var];
            let dual_infeasibility = if lower == -INF && upper == INF {
                dual.abs()
            } else {
                -(self.basis.nonbasic_move[var] as f64) * dual
            };
            if dual_infeasibility > 0.0 {
                if dual_infeasibility >= tolerance {
                    num += 1;
                }
                max = max.max(dual_infeasibility);
                sum += dual_infeasibility;
            }
        }
        self.info.num_dual_infeasibility = num;
        self.info.max_dual_infeasibility = max;
        self.info.sum_dual_infeasibility = sum;
    }

    /// Dual infeasibility summary treating boxed variables as feasible,
    /// since a bound flip removes their infeasibility.
    pub(crate) fn compute_dual_infeasible_with_flips(&mut self) {
        let tolerance = self.options.dual_feasibility_tolerance;
        let mut num = 0isize;
        let mut max = 0.0f64;
        let mut sum = 0.0f64;
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            let lower = self.ws.work_lower[var];
            let upper = self.ws.work_upper[var];
            let dual = self.ws.work_dual[var];
            let mut dual_infeasibility = 0.0;
            if lower == -INF && upper == INF {
                dual_infeasibility = dual.abs();
            } else if lower == -INF || upper == INF {
                dual_infeasibility = -(self.basis.nonbasic_move[var] as f64) * dual;
            }
            if dual_infeasibility > 0.0 {
                if dual_infeasibility >= tolerance {
                    num += 1;
                }
                max = max.max(dual_infeasibility);
                sum += dual_infeasibility;
            }
        }
        self.info.num_dual_infeasibility = num;
        self.info.max_dual_infeasibility = max;
        self.info.sum_dual_infeasibility = sum;
    }

    pub(crate) fn invalidate_primal_infeasibility_record(&mut self) {
        self.info.num_primal_infeasibility = ILLEGAL_INFEASIBILITY_COUNT;
        self.info.max_primal_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.info.sum_primal_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
    }

    pub(crate) fn invalidate_dual_infeasibility_record(&mut self) {
        self.info.num_dual_infeasibility = ILLEGAL_INFEASIBILITY_COUNT;
        self.info.max_dual_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
        self.info.sum_dual_infeasibility = ILLEGAL_INFEASIBILITY_MEASURE;
    }

    // --- dual feasibility restoration ---

    /// Remove dual infeasibilities by bound flips on boxed variables and
    /// cost shifts elsewhere. Free variables are only counted.
    ///
    /// Returns false when a shift was needed but disallowed; iterating
    /// further would cycle.
    pub(crate) fn correct_dual(&mut self, free_infeasibility_count: &mut usize) -> bool {
        let tau_d = self.options.dual_feasibility_tolerance;
        let mut free_count = 0usize;
        let mut flip_dual_objective_value_change = 0.0;
        let mut shift_dual_objective_value_change = 0.0;
        let mut num_flip = 0usize;
        let mut num_shift = 0usize;
        let mut sum_flip = 0.0;
        let mut sum_shift = 0.0;
        let mut num_shift_skipped = 0usize;
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            if self.ws.work_lower[var] == -INF && self.ws.work_upper[var] == INF {
                if self.ws.work_dual[var].abs() >= tau_d {
                    free_count += 1;
                }
            } else if (self.basis.nonbasic_move[var] as f64) * self.ws.work_dual[var] <= -tau_d {
                if self.ws.work_lower[var] != -INF && self.ws.work_upper[var] != INF {
                    // Boxed variable: flip
                    let mv = self.basis.nonbasic_move[var] as f64;
                    self.flip_bound(var);
                    let flip = self.ws.work_upper[var] - self.ws.work_lower[var];
                    // Negative dual at lower (move 1) flips to upper, so
                    // the objective changes by move * flip * dual; the
                    // mirrored case carries the same sign through move
                    let change =
                        mv * flip * self.ws.work_dual[var] * self.objective_scale();
                    flip_dual_objective_value_change += change;
                    num_flip += 1;
                    sum_flip += flip.abs();
                } else if self.info.allow_cost_perturbation {
                    // One-sided variable: shift the cost just beyond
                    // feasibility
                    self.info.costs_perturbed = true;
                    let target = if self.basis.nonbasic_move[var] == 1 {
                        (1.0 + self.random.fraction()) * tau_d
                    } else {
                        -(1.0 + self.random.fraction()) * tau_d
                    };
                    let shift = target - self.ws.work_dual[var];
                    self.ws.work_dual[var] = target;
                    self.ws.work_shift[var] += shift;
                    let change = shift * self.ws.work_value[var] * self.objective_scale();
                    shift_dual_objective_value_change += change;
                    num_shift += 1;
                    sum_shift += shift.abs();
                    debug!(
                        "cost shift {} for variable {}: objective change {}",
                        shift, var, change
                    );
                } else {
                    // Doing the shift after perturbation removal leads to
                    // cycling once dual unboundedness has been detected,
                    // since the recomputed duals reinstate what the shift
                    // removed
                    num_shift_skipped += 1;
                }
            }
        }
        self.info.updated_dual_objective_value +=
            flip_dual_objective_value_change + shift_dual_objective_value_change;
        if num_shift_skipped > 0 {
            warn!("correct_dual: missed {} cost shifts", num_shift_skipped);
            return false;
        }
        if num_flip > 0 {
            debug!(
                "correct_dual performed {} flip(s): total {}; objective change {}",
                num_flip, sum_flip, flip_dual_objective_value_change
            );
        }
        if num_shift > 0 {
            debug!(
                "correct_dual performed {} cost shift(s): total {}; objective change {}",
                num_shift, sum_shift, shift_dual_objective_value_change
            );
        }
        *free_infeasibility_count = free_count;
        true
    }

    /// Move a boxed nonbasic variable to its other bound.
    pub(crate) fn flip_bound(&mut self, var: usize) {
        let mv = -self.basis.nonbasic_move[var];
        self.basis.nonbasic_move[var] = mv;
        self.ws.work_value[var] = if mv == MOVE_UP {
            self.ws.work_lower[var]
        } else {
            self.ws.work_upper[var]
        };
    }

    // --- pivot bookkeeping ---

    /// Absorb a pivot into the factorization, reporting any reason to
    /// rebuild instead of continuing to update.
    pub(crate) fn update_factor(
        &mut self,
        col_aq: &HVector,
        row_ep: &HVector,
        row_out: usize,
    ) -> Result<Option<RebuildReason>, EngineError> {
        self.factor.update(col_aq, row_ep, row_out)?;
        self.status.has_invert = true;
        let mut hint = None;
        if self.info.update_count + 1 >= self.info.update_limit {
            hint = Some(RebuildReason::UpdateLimitReached);
        }
        let performed_min_updates =
            self.info.update_count + 1 >= SYNTHETIC_TICK_REINVERSION_MIN_UPDATE_COUNT;
        if self.factor.total_synthetic_tick >= self.factor.build_synthetic_tick
            && performed_min_updates
        {
            hint = Some(RebuildReason::SyntheticClockSaysInvert);
        }
        Ok(hint)
    }

    /// Install the entering variable at the pivotal position and make
    /// the leaving variable nonbasic at the bound given by `move_out`
    /// (-1 for the lower bound, 1 for the upper).
    pub(crate) fn update_pivots(&mut self, variable_in: usize, row_out: usize, move_out: i8) {
        let variable_out = self.basis.basic_index[row_out];

        self.basis.basic_index[row_out] = variable_in;
        self.basis.nonbasic_flag[variable_in] = 0;
        self.basis.nonbasic_move[variable_in] = MOVE_ZE;
        self.ws.base_lower[row_out] = self.ws.work_lower[variable_in];
        self.ws.base_upper[row_out] = self.ws.work_upper[variable_in];

        self.basis.nonbasic_flag[variable_out] = 1;
        if self.ws.work_lower[variable_out] == self.ws.work_upper[variable_out] {
            self.ws.work_value[variable_out] = self.ws.work_lower[variable_out];
            self.basis.nonbasic_move[variable_out] = MOVE_ZE;
        } else if move_out == -1 {
            self.ws.work_value[variable_out] = self.ws.work_lower[variable_out];
            self.basis.nonbasic_move[variable_out] = MOVE_UP;
        } else {
            self.ws.work_value[variable_out] = self.ws.work_upper[variable_out];
            self.basis.nonbasic_move[variable_out] = MOVE_DN;
        }
        let new_value = self.ws.work_value[variable_out];
        let out_dual = self.ws.work_dual[variable_out];
        self.info.updated_dual_objective_value += new_value * out_dual * self.objective_scale();
        self.info.update_count += 1;
        if variable_out < self.num_col {
            self.info.num_basic_logicals += 1;
        }
        if variable_in < self.num_col {
            self.info.num_basic_logicals -= 1;
        }
        self.status.has_fresh_invert = false;
        self.status.has_fresh_rebuild = false;
    }

    /// Repartition the PRICE copy for the basis change.
    pub(crate) fn update_matrix(&mut self, variable_in: usize, variable_out: usize) {
        self.matrix.update(variable_in, variable_out);
    }

    // --- condition estimation ---

    /// Hager 1-norm condition estimate of the basis matrix, using five
    /// power iterations over FTRAN and BTRAN.
    pub fn compute_basis_condition(&mut self) -> f64 {
        let num_row = self.num_row;
        if num_row == 0 {
            return 0.0;
        }
        let mut row_ep = HVector::new(num_row);
        let mut bs_cond_x = vec![1.0 / num_row as f64; num_row];
        let mut bs_cond_y = vec![0.0; num_row];
        let mut bs_cond_w = vec![0.0; num_row];
        let mut norm_binv = 0.0;
        row_ep.clear();
        for (i, &x) in bs_cond_x.iter().enumerate() {
            if x != 0.0 {
                row_ep.add(i, x);
            }
        }
        for _pass in 0..5 {
            self.factor.ftran(&mut row_ep, 1.0);
            for i in 0..num_row {
                bs_cond_y[i] = row_ep.array[i];
                bs_cond_w[i] = if bs_cond_y[i] > 0.0 {
                    1.0
                } else if bs_cond_y[i] < 0.0 {
                    -1.0
                } else {
                    0.0
                };
            }
            row_ep.clear();
            for (i, &w) in bs_cond_w.iter().enumerate() {
                if w != 0.0 {
                    row_ep.add(i, w);
                }
            }
            self.factor.btran(&mut row_ep, 1.0);
            let mut norm_z = 0.0f64;
            let mut ztx = 0.0f64;
            norm_binv = 0.0;
            let mut argmax_z = 0usize;
            for i in 0..num_row {
                let z = row_ep.array[i];
                if z.abs() > norm_z {
                    norm_z = z.abs();
                    argmax_z = i;
                }
                ztx += z * bs_cond_x[i];
                norm_binv += bs_cond_y[i].abs();
            }
            if norm_z <= ztx {
                break;
            }
            bs_cond_x.iter_mut().for_each(|x| *x = 0.0);
            bs_cond_x[argmax_z] = 1.0;
            row_ep.clear();
            row_ep.add(argmax_z, 1.0);
        }
        let mut norm_b = 0.0f64;
        for i in 0..num_row {
            let var = self.basis.basic_index[i];
            let mut col_norm = 0.0;
            if var < self.num_col {
                for k in self.matrix.start[var]..self.matrix.start[var + 1] {
                    col_norm += self.matrix.value[k].abs();
                }
            } else {
                col_norm = 1.0;
            }
            norm_b = norm_b.max(col_norm);
        }
        norm_binv * norm_b
    }

    // --- solution extraction ---

    /// Assemble the solution in user units.
    pub fn extract_solution(&mut self, lp: &Lp) -> Solution {
        // Scatter the basic primal values, zero the basic duals
        for i in 0..self.num_row {
            let var = self.basis.basic_index[i];
            self.ws.work_value[var] = self.ws.base_value[i];
            self.ws.work_dual[var] = 0.0;
        }
        let sense = lp.sense.sign();
        let mut solution = Solution {
            col_value: vec![0.0; self.num_col],
            col_dual: vec![0.0; self.num_col],
            row_value: vec![0.0; self.num_row],
            row_dual: vec![0.0; self.num_row],
            value_valid: true,
            dual_valid: true,
        };
        for j in 0..self.num_col {
            solution.col_value[j] = self.ws.work_value[j] * self.bound_scale;
            solution.col_dual[j] = sense * self.ws.work_dual[j] * self.cost_scale;
        }
        for i in 0..self.num_row {
            solution.row_value[i] = -self.ws.work_value[self.num_col + i] * self.bound_scale;
            solution.row_dual[i] = sense * self.ws.work_dual[self.num_col + i] * self.cost_scale;
        }
        solution
    }

    /// Assemble the client basis from the simplex basis.
    pub fn extract_basis(&self, lp: &Lp) -> Basis {
        debug_assert!(self.status.has_basis);
        let mut basis = Basis {
            col_status: vec![BasisStatus::Nonbasic; self.num_col],
            row_status: vec![BasisStatus::Nonbasic; self.num_row],
            valid: false,
            alien: false,
        };
        for j in 0..self.num_col {
            basis.col_status[j] = if self.basis.nonbasic_flag[j] == 0 {
                BasisStatus::Basic
            } else {
                match self.basis.nonbasic_move[j] {
                    MOVE_UP => BasisStatus::Lower,
                    MOVE_DN => BasisStatus::Upper,
                    _ => {
                        if lp.col_lower[j] == lp.col_upper[j] {
                            BasisStatus::Lower
                        } else {
                            BasisStatus::Zero
                        }
                    }
                }
            };
        }
        for i in 0..self.num_row {
            let var = self.num_col + i;
            basis.row_status[i] = if self.basis.nonbasic_flag[var] == 0 {
                BasisStatus::Basic
            } else {
                match self.basis.nonbasic_move[var] {
                    MOVE_UP => BasisStatus::Upper,
                    MOVE_DN => BasisStatus::Lower,
                    _ => {
                        if lp.row_lower[i] == lp.row_upper[i] {
                            BasisStatus::Lower
                        } else {
                            BasisStatus::Zero
                        }
                    }
                }
            };
        }
        basis.valid = true;
        basis
    }

    /// Forget the iteration counters.
    pub fn zero_iteration_counts(&mut self) {
        self.iteration_count = 0;
    }

    // --- hooks for interface mutations ---

    /// Extend the basis for appended nonbasic columns, relocating the
    /// logicals and their flags behind the new block.
    pub fn append_nonbasic_cols(&mut self, lp: &Lp, num_new_col: usize) {
        if num_new_col == 0 || !self.status.has_basis {
            return;
        }
        let old_num_col = self.num_col;
        let new_num_col = old_num_col + num_new_col;
        debug_assert_eq!(new_num_col, lp.num_col());
        let new_num_tot = new_num_col + self.num_row;
        self.basis.nonbasic_flag.resize(new_num_tot, 0);
        self.basis.nonbasic_move.resize(new_num_tot, 0);
        for i in (0..self.num_row).rev() {
            if self.basis.basic_index[i] >= old_num_col {
                self.basis.basic_index[i] += num_new_col;
            }
            self.basis.nonbasic_flag[new_num_col + i] = self.basis.nonbasic_flag[old_num_col + i];
            self.basis.nonbasic_move[new_num_col + i] = self.basis.nonbasic_move[old_num_col + i];
        }
        for j in old_num_col..new_num_col {
            self.basis.nonbasic_flag[j] = 1;
            let (lower, upper) = work_bounds(lp, j);
            self.basis.nonbasic_move[j] = crate::basis::move_from_bounds(lower, upper);
        }
        self.num_col = new_num_col;
        self.ws.resize(self.num_col, self.num_row);
        self.initialise_random_vectors();
    }

    /// Extend the basis for appended rows, making the new logicals
    /// basic.
    pub fn append_basic_rows(&mut self, lp: &Lp, num_new_row: usize) {
        if num_new_row == 0 || !self.status.has_basis {
            return;
        }
        let old_num_row = self.num_row;
        let new_num_row = old_num_row + num_new_row;
        debug_assert_eq!(new_num_row, lp.num_row());
        let new_num_tot = self.num_col + new_num_row;
        self.basis.nonbasic_flag.resize(new_num_tot, 0);
        self.basis.nonbasic_move.resize(new_num_tot, 0);
        for i in old_num_row..new_num_row {
            let var = self.num_col + i;
            self.basis.nonbasic_flag[var] = 0;
            self.basis.nonbasic_move[var] = 0;
            self.basis.basic_index.push(var);
        }
        self.info.num_basic_logicals += num_new_row;
        self.num_row = new_num_row;
        self.ws.resize(self.num_col, self.num_row);
        self.initialise_random_vectors();
    }
}

/// Exponentially-smoothed density tracking, as used for every FTRAN,
/// BTRAN and PRICE result.
#[inline]
pub(crate) fn update_density(local_density: f64, density: &mut f64) {
    const RUNNING_AVERAGE_MULTIPLIER: f64 = 0.05;
    *density = (1.0 - RUNNING_AVERAGE_MULTIPLIER) * *density
        + RUNNING_AVERAGE_MULTIPLIER * local_density;
}

/// Whether a work vector is sparse enough that iterating its nonzero
/// indices beats a dense scan.
#[inline]
pub(crate) fn sparse_loop_style(count: usize, dim: usize) -> bool {
    const DENSITY_FOR_INDEXING: f64 = 0.4;
    (count as f64) < DENSITY_FOR_INDEXING * dim as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjSense;

    fn simple_lp() -> Lp {
        // minimize x0 subject to x0 <= 0 (via row), x0 >= 0
        let mut tri = sprs::TriMat::new((1, 1));
        tri.add_triplet(0, 0, 1.0);
        Lp {
            col_cost: vec![1.0],
            col_lower: vec![0.0],
            col_upper: vec![INF],
            row_lower: vec![-INF],
            row_upper: vec![0.0],
            a_matrix: SparseMatrix::from_csmat(&tri.to_csc()),
            sense: ObjSense::Minimize,
            ..Default::default()
        }
    }

    #[test]
    fn test_initialise_for_solve_trivial_optimal() {
        let lp = simple_lp();
        let mut engine = SimplexEngine::new(SolverOptions::default());
        engine.initialise_for_solve(&lp).unwrap();
        // Logical start: column nonbasic at lower (value 0), slack basic
        assert_eq!(engine.basis.basic_index, vec![1]);
        assert_eq!(engine.ws.work_value[0], 0.0);
        assert_eq!(engine.ws.base_value[0], 0.0);
        assert_eq!(engine.model_status, ModelStatus::Optimal);
        assert_eq!(engine.info.primal_objective_value, 0.0);
    }

    #[test]
    fn test_update_pivots_maintains_invariants() {
        let lp = simple_lp();
        let mut engine = SimplexEngine::new(SolverOptions::default());
        engine.initialise_for_solve(&lp).unwrap();
        engine.update_pivots(0, 0, -1);
        assert!(engine.basis.consistent(1, 1));
        assert_eq!(engine.basis.basic_index, vec![0]);
        assert_eq!(engine.basis.nonbasic_flag[1], 1);
        assert_eq!(engine.info.update_count, 1);
        assert!(!engine.status.has_fresh_rebuild);
    }

    #[test]
    fn test_correct_dual_flips_boxed() {
        // One boxed column, at lower, with a dual beyond the tolerance
        let mut tri = sprs::TriMat::new((1, 1));
        tri.add_triplet(0, 0, 1.0);
        let lp = Lp {
            col_cost: vec![0.0],
            col_lower: vec![0.0],
            col_upper: vec![1.0],
            row_lower: vec![-INF],
            row_upper: vec![10.0],
            a_matrix: SparseMatrix::from_csmat(&tri.to_csc()),
            sense: ObjSense::Minimize,
            ..Default::default()
        };
        let mut engine = SimplexEngine::new(SolverOptions::default());
        engine.initialise_for_solve(&lp).unwrap();
        let tau_d = engine.options.dual_feasibility_tolerance;
        let dual = -tau_d - 1e-9;
        engine.ws.work_dual[0] = dual;
        assert_eq!(engine.basis.nonbasic_move[0], MOVE_UP);
        let objective_before = engine.info.updated_dual_objective_value;
        let mut free_count = 0;
        assert!(engine.correct_dual(&mut free_count));
        assert_eq!(engine.basis.nonbasic_move[0], MOVE_DN);
        assert_eq!(engine.ws.work_value[0], 1.0);
        // Flip objective change is move * (upper - lower) * dual
        let expected = 1.0 * 1.0 * dual;
        let change = engine.info.updated_dual_objective_value - objective_before;
        assert!((change - expected).abs() < 1e-12);
        assert_eq!(free_count, 0);
    }

    #[test]
    fn test_condition_of_identity_basis() {
        let lp = simple_lp();
        let mut engine = SimplexEngine::new(SolverOptions::default());
        engine.initialise_for_solve(&lp).unwrap();
        let cond = engine.compute_basis_condition();
        assert!((cond - 1.0).abs() < 1e-12);
    }
}
