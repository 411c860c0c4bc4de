//! Dual simplex driver.
//!
//! Runs dual phase 1 on the boxed phase-1 bounds when the start is dual
//! infeasible beyond what bound flips can repair, then dual phase 2 on
//! the true bounds. Row selection is weighted by Devex-style reference
//! weights; the dual ratio test keeps the reduced costs sign-feasible.
//! Dual unboundedness in phase 2 certifies primal infeasibility and
//! records a dual ray; in phase 1 it leaves the model unbounded or
//! infeasible for the primal simplex to disambiguate.

use log::{debug, warn};

use crate::model::{Lp, ModelStatus, INF};
use crate::sparse::HVector;

use super::engine::{EngineError, RayRecord, SimplexEngine};
use super::{SimplexAlgorithm, PHASE_1, PHASE_2};

/// Smallest tableau entry usable as a ratio-test pivot.
const RATIO_PIVOT_TOLERANCE: f64 = 1e-9;

/// Rebuilds without an intervening pivot before the driver gives up.
const MAX_STALLED_REBUILDS: usize = 50;

enum PhaseOutcome {
    /// Phase 1 finished dual feasible
    GoPhase2,
    /// The LP is solved or classified; `model_status` is set
    Finished,
    /// A limit was hit; `model_status` is latched
    Bailout,
    /// Residual infeasibility needs the cleanup pass
    NotOptimal,
}

impl SimplexEngine {
    /// Run the dual simplex from the current basis.
    pub(crate) fn solve_dual(&mut self, lp: &Lp) -> Result<(), EngineError> {
        self.called_return_from_solve = false;
        self.solve_bailout = false;

        let mut edge_weight = vec![1.0; self.num_row];

        self.initialise_cost(
            lp,
            SimplexAlgorithm::Dual,
            PHASE_2,
            self.info.allow_cost_perturbation,
        );
        self.initialise_bound(lp, SimplexAlgorithm::Dual, PHASE_2, false);
        self.initialise_nonbasic_value_and_move();
        self.compute_dual(lp);
        self.compute_dual_infeasible_with_flips();
        let mut phase = if self.info.num_dual_infeasibility > 0 {
            PHASE_1
        } else {
            PHASE_2
        };

        loop {
            let outcome = self.dual_phase(lp, phase, &mut edge_weight)?;
            match outcome {
                PhaseOutcome::GoPhase2 => {
                    debug!("dual phase 1 finished dual feasible");
                    phase = PHASE_2;
                }
                PhaseOutcome::Finished | PhaseOutcome::Bailout => break,
                PhaseOutcome::NotOptimal => {
                    // model_status stays NotSet; the engine cleanup takes
                    // over with the primal solver
                    break;
                }
            }
        }
        self.return_from_solve();
        Ok(())
    }

    fn dual_phase(
        &mut self,
        lp: &Lp,
        phase: i32,
        edge_weight: &mut Vec<f64>,
    ) -> Result<PhaseOutcome, EngineError> {
        self.initialise_bound(lp, SimplexAlgorithm::Dual, phase, false);
        self.initialise_nonbasic_value_and_move();

        let mut row_ep = HVector::new(self.num_row);
        let mut row_ap = HVector::new(self.num_col);
        let mut col_aq = HVector::new(self.num_row);

        let mut stalled_rebuilds = 0usize;
        let mut last_iteration_count = self.iteration_count;

        'rebuild: loop {
            if self.iteration_count == last_iteration_count {
                stalled_rebuilds += 1;
                if stalled_rebuilds > MAX_STALLED_REBUILDS {
                    warn!("dual simplex stalled after {} rebuilds", stalled_rebuilds);
                    self.model_status = ModelStatus::Unknown;
                    return Ok(PhaseOutcome::Finished);
                }
            } else {
                stalled_rebuilds = 0;
                last_iteration_count = self.iteration_count;
            }

            self.get_nonsingular_inverse(lp, Some(edge_weight))?;
            self.compute_dual(lp);
            let mut free_infeasibility_count = 0usize;
            if !self.correct_dual(&mut free_infeasibility_count) {
                return Err(EngineError::CostShiftSkipped);
            }
            self.compute_primal(lp);
            self.compute_simplex_primal_infeasible();
            self.compute_dual_objective_value(lp, phase);
            self.status.has_fresh_rebuild = true;

            if phase == PHASE_2
                && self.options.dual_objective_value_upper_bound < INF
                && self.info.dual_objective_value > self.options.dual_objective_value_upper_bound
            {
                self.solve_bailout = true;
                self.model_status = ModelStatus::ObjectiveBound;
                return Ok(PhaseOutcome::Bailout);
            }
            if self.diagnostics.should_log(self.iteration_count) {
                debug!(
                    "dual rebuild: iter {} phase {} dual objective {} primal infeasibilities {}",
                    self.iteration_count,
                    phase,
                    self.info.dual_objective_value,
                    self.info.num_primal_infeasibility
                );
            }

            loop {
                if self.bailout_on_time_iterations() {
                    return Ok(PhaseOutcome::Bailout);
                }

                // CHUZR: most weighted-infeasible basic row
                let row_out = self.dual_choose_row(edge_weight);
                let Some(p) = row_out else {
                    // Primal feasible within the current bounds; insist
                    // on a fresh factorization before concluding
                    if self.info.update_count > 0 {
                        continue 'rebuild;
                    }
                    return self.dual_phase_optimal(lp, phase);
                };

                let variable_out = self.basis.basic_index[p];
                let value = self.ws.base_value[p];
                let below_lower = value < self.ws.base_lower[p];
                // Leaving at the bound it violates
                let move_out: i8 = if below_lower { -1 } else { 1 };
                let delta_primal = if below_lower {
                    value - self.ws.base_lower[p]
                } else {
                    value - self.ws.base_upper[p]
                };
                let s = if below_lower { -1.0 } else { 1.0 };

                self.unit_btran(p, &mut row_ep);
                self.tableau_row_price(&row_ep, &mut row_ap);

                let chosen = self.dual_ratio_test(s, &row_ap, &row_ep);
                let Some(variable_in) = chosen else {
                    // Dual unbounded
                    if phase == PHASE_1 {
                        debug!("dual phase 1 is unbounded");
                        self.model_status = ModelStatus::UnboundedOrInfeasible;
                        return Ok(PhaseOutcome::Finished);
                    }
                    if self.info.costs_perturbed {
                        // The unboundedness may be an artefact of the
                        // perturbation; remove it and try again
                        self.info.allow_cost_perturbation = false;
                        self.initialise_cost(lp, SimplexAlgorithm::Dual, phase, false);
                        continue 'rebuild;
                    }
                    self.dual_ray = Some(RayRecord {
                        index: p,
                        sign: move_out as f64,
                    });
                    self.status.has_dual_ray = true;
                    self.model_status = ModelStatus::Infeasible;
                    self.compute_primal_objective_value(lp);
                    return Ok(PhaseOutcome::Finished);
                };

                let alpha_row = self.tableau_entry(variable_in, &row_ap, &row_ep);
                self.pivot_column_ftran(variable_in, &mut col_aq);
                let alpha_col = col_aq.array[p];
                if self.reinvert_on_numerical_trouble("dual simplex", alpha_col, alpha_row) {
                    continue 'rebuild;
                }
                if alpha_col.abs() <= RATIO_PIVOT_TOLERANCE {
                    warn!("dual pivot value {} vanished in FTRAN", alpha_col);
                    continue 'rebuild;
                }

                let theta_dual = self.ws.work_dual[variable_in] / alpha_row;
                let theta_primal = delta_primal / alpha_col;

                // Dual update over the priced row and the logicals
                for k in 0..row_ap.count {
                    let j = row_ap.index[k];
                    self.ws.work_dual[j] -= theta_dual * row_ap.array[j];
                }
                for k in 0..row_ep.count {
                    let i = row_ep.index[k];
                    self.ws.work_dual[self.num_col + i] -= theta_dual * row_ep.array[i];
                }
                self.ws.work_dual[variable_in] = 0.0;
                self.ws.work_dual[variable_out] = -theta_dual;

                // Primal update along the pivotal column
                if super::engine::sparse_loop_style(col_aq.count, self.num_row) {
                    for k in 0..col_aq.count {
                        let i = col_aq.index[k];
                        self.ws.base_value[i] -= theta_primal * col_aq.array[i];
                    }
                } else {
                    for i in 0..self.num_row {
                        self.ws.base_value[i] -= theta_primal * col_aq.array[i];
                    }
                }
                let entering_value = self.ws.work_value[variable_in] + theta_primal;

                self.dual_devex_update(edge_weight, &col_aq, p, alpha_col);

                let hint = self.update_factor(&col_aq, &row_ep, p)?;
                self.update_pivots(variable_in, p, move_out);
                self.update_matrix(variable_in, variable_out);
                self.ws.base_value[p] = entering_value;
                self.iteration_count += 1;

                if hint.is_some() {
                    continue 'rebuild;
                }
            }
        }
    }

    /// Conclude a phase whose bounds admit no primal infeasibility.
    fn dual_phase_optimal(&mut self, lp: &Lp, phase: i32) -> Result<PhaseOutcome, EngineError> {
        debug_assert!(self.status.has_fresh_rebuild);
        if phase == PHASE_1 {
            // Check dual feasibility against the true bounds
            self.initialise_bound(lp, SimplexAlgorithm::Dual, PHASE_2, false);
            self.initialise_nonbasic_value_and_move();
            self.compute_dual(lp);
            self.compute_dual_infeasible_with_flips();
            if self.info.num_dual_infeasibility > 0 {
                debug!(
                    "dual phase 1 optimal with {} residual dual infeasibilities",
                    self.info.num_dual_infeasibility
                );
                self.model_status = ModelStatus::UnboundedOrInfeasible;
                return Ok(PhaseOutcome::Finished);
            }
            return Ok(PhaseOutcome::GoPhase2);
        }

        if self.info.costs_perturbed {
            // Declare nothing on perturbed costs
            self.info.allow_cost_perturbation = false;
            self.initialise_cost(lp, SimplexAlgorithm::Dual, PHASE_2, false);
            self.compute_dual(lp);
            self.compute_dual_infeasible_with_flips();
            if self.info.num_dual_infeasibility > 0 {
                let mut free_infeasibility_count = 0usize;
                let corrected = self.correct_dual(&mut free_infeasibility_count);
                self.compute_primal(lp);
                self.compute_simplex_infeasible();
                if !corrected || self.info.num_dual_infeasibility > 0 {
                    return Ok(PhaseOutcome::NotOptimal);
                }
                if self.info.num_primal_infeasibility > 0 {
                    // Bound flips broke primal feasibility; keep
                    // iterating on the clean costs
                    return self.dual_phase(lp, PHASE_2, &mut vec![1.0; self.num_row]);
                }
            }
        }
        self.compute_primal(lp);
        self.compute_simplex_infeasible();
        if self.info.num_primal_infeasibility == 0 && self.info.num_dual_infeasibility == 0 {
            self.compute_dual_objective_value(lp, PHASE_2);
            self.compute_primal_objective_value(lp);
            self.model_status = ModelStatus::Optimal;
            return Ok(PhaseOutcome::Finished);
        }
        Ok(PhaseOutcome::NotOptimal)
    }

    /// Pick the leaving row: the largest squared bound violation scaled
    /// by its Devex weight.
    fn dual_choose_row(&self, edge_weight: &[f64]) -> Option<usize> {
        let tolerance = self.options.primal_feasibility_tolerance;
        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.num_row {
            let value = self.ws.base_value[i];
            let infeasibility =
                (self.ws.base_lower[i] - value).max(value - self.ws.base_upper[i]);
            if infeasibility > tolerance {
                let merit = infeasibility * infeasibility / edge_weight[i];
                if best.map(|(_, m)| merit > m).unwrap_or(true) {
                    best = Some((i, merit));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Tableau entry of `var` in the pivotal row.
    fn tableau_entry(&self, var: usize, row_ap: &HVector, row_ep: &HVector) -> f64 {
        if var < self.num_col {
            row_ap.array[var]
        } else {
            row_ep.array[var - self.num_col]
        }
    }

    /// Dual ratio test: among the columns whose growth repairs the
    /// leaving row's violation, the one whose reduced cost hits zero
    /// first.
    fn dual_ratio_test(&self, s: f64, row_ap: &HVector, row_ep: &HVector) -> Option<usize> {
        let num_tot = self.num_col + self.num_row;
        let mut best: Option<(usize, f64, f64)> = None;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            let alpha = self.tableau_entry(var, row_ap, row_ep);
            if alpha.abs() <= RATIO_PIVOT_TOLERANCE {
                continue;
            }
            let lower = self.ws.work_lower[var];
            let upper = self.ws.work_upper[var];
            if lower == upper {
                continue;
            }
            let mv = self.basis.nonbasic_move[var] as f64;
            let free = lower == -INF && upper == INF;
            let direction = if free {
                // A free variable can move either way
                s * alpha.signum()
            } else {
                mv
            };
            if s * alpha * direction <= 0.0 {
                continue;
            }
            let dual = self.ws.work_dual[var];
            let slack = if free { dual.abs() } else { (dual * direction).max(0.0) };
            let ratio = slack / alpha.abs();
            let better = match best {
                None => true,
                Some((_, best_ratio, best_alpha)) => {
                    ratio < best_ratio - 1e-12
                        || (ratio < best_ratio + 1e-12 && alpha.abs() > best_alpha)
                }
            };
            if better {
                best = Some((var, ratio, alpha.abs()));
            }
        }
        best.map(|(var, _, _)| var)
    }

    /// Devex weight propagation for the pivot on row `p`.
    fn dual_devex_update(
        &mut self,
        edge_weight: &mut [f64],
        col_aq: &HVector,
        p: usize,
        alpha: f64,
    ) {
        let gamma = (edge_weight[p] / (alpha * alpha)).max(1.0);
        for k in 0..col_aq.count {
            let i = col_aq.index[k];
            if i == p {
                continue;
            }
            let ratio = col_aq.array[i] / alpha;
            edge_weight[i] = edge_weight[i].max(ratio * ratio * gamma);
        }
        edge_weight[p] = gamma;
    }
}
