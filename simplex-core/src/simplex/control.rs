//! Rebuild control: backtracking to the last nonsingular basis,
//! reinversion on numerical trouble and the time/iteration bailout.

use log::warn;

use crate::basis::SimplexBasis;
use crate::model::{Lp, ModelStatus};

use super::engine::{EngineError, LpAction, SimplexEngine};
use super::{
    MAX_PIVOT_THRESHOLD, NUMERICAL_TROUBLE_TOLERANCE, PIVOT_THRESHOLD_CHANGE_FACTOR,
};

/// Snapshot of the last successfully factorized basis, together with the
/// perturbation state and scattered edge weights needed to resume from
/// it.
#[derive(Debug, Clone, Default)]
pub struct BacktrackingBasis {
    pub valid: bool,
    pub basis: SimplexBasis,
    pub costs_perturbed: bool,
    pub bounds_perturbed: bool,
    pub work_shift: Vec<f64>,
    /// Edge weights scattered by variable, so they survive any change of
    /// the basic ordering
    pub edge_weight_full: Vec<f64>,
}

impl SimplexEngine {
    /// Save the current basis as the backtracking target.
    ///
    /// `basic_index_before` is the ordering from before the
    /// factorization, so a replay factorizes identically. Edge weights,
    /// when given, are scattered by variable.
    pub(crate) fn put_backtracking_basis(
        &mut self,
        basic_index_before: Vec<usize>,
        edge_weights: Option<&[f64]>,
    ) {
        let num_tot = self.num_col + self.num_row;
        self.backtracking.basis = self.basis.clone();
        self.backtracking.basis.basic_index = basic_index_before;
        self.backtracking.costs_perturbed = self.info.costs_perturbed;
        self.backtracking.bounds_perturbed = self.info.bounds_perturbed;
        self.backtracking.work_shift = self.ws.work_shift.clone();
        if let Some(weights) = edge_weights {
            self.backtracking.edge_weight_full.resize(num_tot, 1.0);
            for i in 0..self.num_row {
                self.backtracking.edge_weight_full[self.backtracking.basis.basic_index[i]] =
                    weights[i];
            }
        }
        self.backtracking.valid = true;
    }

    /// Restore the backtracking snapshot. Returns false when none is
    /// available.
    pub(crate) fn get_backtracking_basis(&mut self) -> bool {
        if !self.backtracking.valid {
            return false;
        }
        self.basis = self.backtracking.basis.clone();
        self.info.costs_perturbed = self.backtracking.costs_perturbed;
        self.info.bounds_perturbed = self.backtracking.bounds_perturbed;
        self.ws.work_shift = self.backtracking.work_shift.clone();
        true
    }

    /// Factorize for a rebuild, backtracking when the basis has gone
    /// singular under the accumulated updates.
    ///
    /// On success the snapshot is refreshed and the update limit
    /// restored; after a backtrack the limit is halved. Edge weights are
    /// scattered before and gathered after, following the basic
    /// ordering across the change.
    pub(crate) fn get_nonsingular_inverse(
        &mut self,
        lp: &Lp,
        edge_weights: Option<&mut Vec<f64>>,
    ) -> Result<(), EngineError> {
        debug_assert!(self.status.has_basis);
        let basic_index_before = self.basis.basic_index.clone();
        let update_count = self.info.update_count;

        let rank_deficiency = self.compute_factor(lp);
        if rank_deficiency > 0 {
            // Rank deficient, so backtrack to the last full-rank basis
            if !self.get_backtracking_basis() {
                return Err(EngineError::BacktrackFailed);
            }
            self.info.backtracking = true;
            self.update_status(LpAction::Backtracking);
            self.matrix.setup_price(&self.basis.nonbasic_flag);
            let backtrack_rank_deficiency = self.compute_factor(lp);
            // This basis factorized successfully before
            if backtrack_rank_deficiency > 0 {
                return Err(EngineError::BacktrackFailed);
            }
            if update_count <= 1 {
                return Err(EngineError::BacktrackFailed);
            }
            let new_update_limit = update_count / 2;
            warn!(
                "rank deficiency of {} after {} updates: backtracking, update limit {} -> {}",
                rank_deficiency, update_count, self.info.update_limit, new_update_limit
            );
            self.info.update_limit = new_update_limit;
            if let Some(weights) = edge_weights {
                for i in 0..self.num_row {
                    weights[i] = self
                        .backtracking
                        .edge_weight_full
                        .get(self.basis.basic_index[i])
                        .copied()
                        .unwrap_or(1.0);
                }
            }
        } else {
            self.put_backtracking_basis(basic_index_before, edge_weights.map(|w| &**w));
            self.info.backtracking = false;
            self.info.update_limit = self.options.simplex_update_limit;
        }
        Ok(())
    }

    /// Compare the pivot value seen from the FTRANned column and the
    /// BTRANned row; a large relative discrepancy forces a fresh
    /// factorization and may raise the Markowitz threshold.
    pub(crate) fn reinvert_on_numerical_trouble(
        &mut self,
        method: &str,
        alpha_from_col: f64,
        alpha_from_row: f64,
    ) -> bool {
        let abs_col = alpha_from_col.abs();
        let abs_row = alpha_from_row.abs();
        let min_abs = abs_col.min(abs_row);
        let measure = if min_abs > 0.0 {
            (abs_col - abs_row).abs() / min_abs
        } else {
            f64::INFINITY
        };
        let numerical_trouble = measure > NUMERICAL_TROUBLE_TOLERANCE;
        let reinvert = numerical_trouble && self.info.update_count > 0;
        if reinvert {
            let current = self.info.factor_pivot_threshold;
            let default_threshold = self.options.factor_pivot_threshold;
            let mut new_threshold = 0.0;
            if current < default_threshold {
                new_threshold = (current * PIVOT_THRESHOLD_CHANGE_FACTOR).min(default_threshold);
            } else if current < MAX_PIVOT_THRESHOLD && self.info.update_count < 10 {
                new_threshold = (current * PIVOT_THRESHOLD_CHANGE_FACTOR).min(MAX_PIVOT_THRESHOLD);
            }
            if new_threshold > 0.0 {
                warn!(
                    "{}: increasing Markowitz threshold to {}",
                    method, new_threshold
                );
                self.info.factor_pivot_threshold = new_threshold;
                self.factor.set_pivot_threshold(new_threshold);
            }
        }
        reinvert
    }

    /// Poll the wall clock and the iteration limit; latches the model
    /// status when either is breached.
    pub(crate) fn bailout_on_time_iterations(&mut self) -> bool {
        if self.solve_bailout {
            debug_assert!(matches!(
                self.model_status,
                ModelStatus::ReachedTimeLimit
                    | ModelStatus::ReachedIterationLimit
                    | ModelStatus::ObjectiveBound
            ));
        } else if self
            .solve_start
            .map(|start| start.elapsed().as_secs_f64() > self.options.time_limit)
            .unwrap_or(false)
        {
            self.solve_bailout = true;
            self.model_status = ModelStatus::ReachedTimeLimit;
        } else if self.iteration_count >= self.options.simplex_iteration_limit {
            self.solve_bailout = true;
            self.model_status = ModelStatus::ReachedIterationLimit;
        }
        self.solve_bailout
    }

    /// Bookkeeping common to every driver exit; called exactly once per
    /// driver run.
    pub(crate) fn return_from_solve(&mut self) {
        debug_assert!(!self.called_return_from_solve);
        self.called_return_from_solve = true;
        self.backtracking.valid = false;
    }
}
