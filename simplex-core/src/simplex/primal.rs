//! Primal simplex driver.
//!
//! Phase 1 minimizes the sum of primal infeasibilities with the
//! piecewise-linear infeasibility costing recomputed at every rebuild;
//! phase 2 runs the bounded-variable ratio test with bound flips.
//! Unboundedness records a primal ray once any bound perturbation has
//! been removed.

use log::{debug, warn};

use crate::basis::{MOVE_DN, MOVE_UP, MOVE_ZE};
use crate::model::{Lp, ModelStatus, INF};
use crate::sparse::HVector;

use super::engine::{EngineError, RayRecord, SimplexEngine};
use super::{SimplexAlgorithm, PHASE_1, PHASE_2};

/// Smallest tableau entry accepted as a ratio-test blocker.
const RATIO_PIVOT_TOLERANCE: f64 = 1e-9;

/// Rebuilds without an intervening pivot before the driver gives up.
const MAX_STALLED_REBUILDS: usize = 50;

struct Blocking {
    row: usize,
    ratio: f64,
    move_out: i8,
}

impl SimplexEngine {
    /// Run the primal simplex from the current basis.
    pub(crate) fn solve_primal(&mut self, lp: &Lp) -> Result<(), EngineError> {
        self.called_return_from_solve = false;
        self.solve_bailout = false;

        self.initialise_cost(lp, SimplexAlgorithm::Primal, PHASE_2, false);
        self.initialise_bound(
            lp,
            SimplexAlgorithm::Primal,
            PHASE_2,
            self.info.allow_bound_perturbation,
        );
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
                    warn!("primal simplex stalled after {} rebuilds", stalled_rebuilds);
                    self.model_status = ModelStatus::Unknown;
                    break 'rebuild;
                }
            } else {
                stalled_rebuilds = 0;
                last_iteration_count = self.iteration_count;
            }

            self.get_nonsingular_inverse(lp, None)?;
            self.compute_primal(lp);
            self.compute_simplex_primal_infeasible();
            let phase = if self.info.num_primal_infeasibility > 0 {
                PHASE_1
            } else {
                PHASE_2
            };
            if phase == PHASE_1 {
                self.primal_phase1_costs();
            } else {
                self.initialise_cost(lp, SimplexAlgorithm::Primal, PHASE_2, false);
            }
            self.compute_dual(lp);
            self.compute_primal_objective_value(lp);
            self.status.has_fresh_rebuild = true;
            if self.diagnostics.should_log(self.iteration_count) {
                debug!(
                    "primal rebuild: iter {} phase {} objective {} primal infeasibilities {}",
                    self.iteration_count,
                    phase,
                    self.info.primal_objective_value,
                    self.info.num_primal_infeasibility
                );
            }

            loop {
                if self.bailout_on_time_iterations() {
                    break 'rebuild;
                }

                let Some((variable_in, direction)) = self.primal_choose_column() else {
                    if self.info.update_count > 0 {
                        continue 'rebuild;
                    }
                    if self.primal_phase_optimal(lp, phase)? {
                        break 'rebuild;
                    }
                    continue 'rebuild;
                };

                self.pivot_column_ftran(variable_in, &mut col_aq);
                let blocking = self.primal_ratio_test(&col_aq, direction, phase);
                let theta_max = self.ws.work_range[variable_in];

                let Some(blocking) = blocking else {
                    if theta_max == INF {
                        if phase == PHASE_1 {
                            // An attractive column in phase 1 always hits
                            // a violated bound; treat this as numerical
                            // noise and refresh
                            continue 'rebuild;
                        }
                        if self.info.bounds_perturbed {
                            self.info.allow_bound_perturbation = false;
                            self.initialise_bound(lp, SimplexAlgorithm::Primal, PHASE_2, false);
                            self.initialise_nonbasic_value_and_move();
                            continue 'rebuild;
                        }
                        self.primal_ray = Some(RayRecord {
                            index: variable_in,
                            sign: -direction,
                        });
                        self.status.has_primal_ray = true;
                        self.model_status = ModelStatus::Unbounded;
                        self.compute_primal_objective_value(lp);
                        break 'rebuild;
                    }
                    // Only the entering variable's own range blocks
                    self.primal_apply_flip(variable_in, direction, theta_max, &col_aq);
                    self.iteration_count += 1;
                    continue;
                };

                if theta_max <= blocking.ratio {
                    self.primal_apply_flip(variable_in, direction, theta_max, &col_aq);
                    self.iteration_count += 1;
                    continue;
                }

                let p = blocking.row;
                let variable_out = self.basis.basic_index[p];
                let theta = blocking.ratio.max(0.0);

                self.unit_btran(p, &mut row_ep);
                self.tableau_row_price(&row_ep, &mut row_ap);
                let alpha_col = col_aq.array[p];
                let alpha_row = if variable_in < self.num_col {
                    row_ap.array[variable_in]
                } else {
                    row_ep.array[variable_in - self.num_col]
                };
                if self.reinvert_on_numerical_trouble("primal simplex", alpha_col, alpha_row) {
                    continue 'rebuild;
                }

                // Primal update along the pivotal column
                if super::engine::sparse_loop_style(col_aq.count, self.num_row) {
                    for k in 0..col_aq.count {
                        let i = col_aq.index[k];
                        self.ws.base_value[i] -= direction * theta * col_aq.array[i];
                    }
                } else {
                    for i in 0..self.num_row {
                        self.ws.base_value[i] -= direction * theta * col_aq.array[i];
                    }
                }
                let entering_value = self.ws.work_value[variable_in] + direction * theta;

                // Dual update from the pivotal row
                let theta_dual = self.ws.work_dual[variable_in] / alpha_col;
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

                let hint = self.update_factor(&col_aq, &row_ep, p)?;
                self.update_pivots(variable_in, p, blocking.move_out);
                self.update_matrix(variable_in, variable_out);
                self.ws.base_value[p] = entering_value;
                self.iteration_count += 1;

                if phase == PHASE_1 {
                    // The infeasibility costing depends on which basics
                    // are violated, so refresh it
                    continue 'rebuild;
                }
                if hint.is_some() {
                    continue 'rebuild;
                }
            }
        }
        self.return_from_solve();
        Ok(())
    }

    /// Install the piecewise-linear phase-1 costs: -1 below the lower
    /// bound, +1 above the upper, zero elsewhere.
    fn primal_phase1_costs(&mut self) {
        let tolerance = self.options.primal_feasibility_tolerance;
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            self.ws.work_cost[var] = 0.0;
            self.ws.work_shift[var] = 0.0;
        }
        for i in 0..self.num_row {
            let var = self.basis.basic_index[i];
            if self.ws.base_value[i] < self.ws.base_lower[i] - tolerance {
                self.ws.work_cost[var] = -1.0;
            } else if self.ws.base_value[i] > self.ws.base_upper[i] + tolerance {
                self.ws.work_cost[var] = 1.0;
            }
        }
    }

    /// Conclude a phase with no attractive column on a fresh
    /// factorization. Returns true when the driver is done.
    fn primal_phase_optimal(&mut self, lp: &Lp, phase: i32) -> Result<bool, EngineError> {
        debug_assert!(self.status.has_fresh_rebuild);
        if phase == PHASE_1 {
            self.compute_simplex_primal_infeasible();
            if self.info.num_primal_infeasibility > 0 {
                debug!(
                    "primal phase 1 optimal with {} residual infeasibilities",
                    self.info.num_primal_infeasibility
                );
                self.model_status = ModelStatus::Infeasible;
                self.compute_primal_objective_value(lp);
                return Ok(true);
            }
            // Feasible: fall through to phase 2 via a rebuild
            return Ok(false);
        }
        if self.info.bounds_perturbed {
            self.info.allow_bound_perturbation = false;
            self.initialise_bound(lp, SimplexAlgorithm::Primal, PHASE_2, false);
            self.initialise_nonbasic_value_and_move();
            self.compute_primal(lp);
            self.compute_simplex_primal_infeasible();
            if self.info.num_primal_infeasibility > 0 {
                // The perturbation was hiding infeasibility; iterate on
                return Ok(false);
            }
        }
        self.compute_dual(lp);
        self.compute_simplex_infeasible();
        if self.info.num_primal_infeasibility == 0 && self.info.num_dual_infeasibility == 0 {
            self.compute_primal_objective_value(lp);
            self.compute_dual_objective_value(lp, PHASE_2);
            self.model_status = ModelStatus::Optimal;
            return Ok(true);
        }
        // Residual dual infeasibility beyond the pricing tolerance;
        // leave the status unset for the cleanup pass
        Ok(true)
    }

    /// Dantzig pricing: the nonbasic variable with the most attractive
    /// reduced cost, together with its direction of travel. Scanning in
    /// the permuted order breaks ties randomly but reproducibly.
    fn primal_choose_column(&self) -> Option<(usize, f64)> {
        let tau_d = self.options.dual_feasibility_tolerance;
        let mut best: Option<(usize, f64, f64)> = None;
        for &var in &self.ws.num_tot_permutation {
            if self.basis.nonbasic_flag[var] != 1 {
                continue;
            }
            let lower = self.ws.work_lower[var];
            let upper = self.ws.work_upper[var];
            if lower == upper {
                continue;
            }
            let dual = self.ws.work_dual[var];
            let candidate = match self.basis.nonbasic_move[var] {
                MOVE_UP if dual < -tau_d => Some((dual.abs(), 1.0)),
                MOVE_DN if dual > tau_d => Some((dual.abs(), -1.0)),
                MOVE_ZE if lower == -INF && upper == INF && dual.abs() > tau_d => {
                    Some((dual.abs(), -dual.signum()))
                }
                _ => None,
            };
            if let Some((merit, direction)) = candidate {
                if best.map(|(_, m, _)| merit > m).unwrap_or(true) {
                    best = Some((var, merit, direction));
                }
            }
        }
        best.map(|(var, _, direction)| (var, direction))
    }

    /// First-breakpoint ratio test over the basic variables.
    ///
    /// In phase 1 a violated basic blocks at the bound it violates, so
    /// every pivot reduces the infeasibility sum.
    fn primal_ratio_test(&self, col_aq: &HVector, direction: f64, _phase: i32) -> Option<Blocking> {
        let mut best: Option<(Blocking, f64)> = None;
        for k in 0..col_aq.count {
            let i = col_aq.index[k];
            let a = col_aq.array[i] * direction;
            if a.abs() <= RATIO_PIVOT_TOLERANCE {
                continue;
            }
            let value = self.ws.base_value[i];
            let (bound, move_out) = if a > 0.0 {
                // This basic decreases; it blocks at the first bound
                // below its value
                if value > self.ws.base_upper[i] {
                    (self.ws.base_upper[i], 1)
                } else {
                    (self.ws.base_lower[i], -1)
                }
            } else {
                // This basic increases
                if value < self.ws.base_lower[i] {
                    (self.ws.base_lower[i], -1)
                } else {
                    (self.ws.base_upper[i], 1)
                }
            };
            if bound == INF || bound == -INF {
                continue;
            }
            let ratio = ((value - bound) / a).max(0.0);
            let better = match &best {
                None => true,
                Some((blocking, best_abs)) => {
                    ratio < blocking.ratio - 1e-12
                        || (ratio < blocking.ratio + 1e-12 && a.abs() > *best_abs)
                }
            };
            if better {
                best = Some((
                    Blocking {
                        row: i,
                        ratio,
                        move_out,
                    },
                    a.abs(),
                ));
            }
        }
        best.map(|(blocking, _)| blocking)
    }

    /// Move the entering variable across its range without a basis
    /// change.
    fn primal_apply_flip(
        &mut self,
        variable_in: usize,
        direction: f64,
        theta: f64,
        col_aq: &HVector,
    ) {
        for k in 0..col_aq.count {
            let i = col_aq.index[k];
            self.ws.base_value[i] -= direction * theta * col_aq.array[i];
        }
        self.flip_bound(variable_in);
    }
}
