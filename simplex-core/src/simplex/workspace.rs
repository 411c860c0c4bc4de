use crate::basis::{MOVE_DN, MOVE_UP, MOVE_ZE};
use crate::model::{Lp, INF};

use super::engine::SimplexEngine;
use super::{SimplexAlgorithm, PHASE_2};

/// Per-variable and per-basic-row working arrays.
///
/// Costs and bounds here are the (possibly perturbed) values the
/// iterations run on; the LP keeps the originals. Logicals occupy the
/// indices at and beyond `num_col` with the slack sign convention.
#[derive(Debug, Clone, Default)]
pub struct SimplexWorkspace {
    pub work_cost: Vec<f64>,
    pub work_dual: Vec<f64>,
    pub work_shift: Vec<f64>,

    pub work_lower: Vec<f64>,
    pub work_upper: Vec<f64>,
    pub work_range: Vec<f64>,
    pub work_value: Vec<f64>,
    pub work_lower_shift: Vec<f64>,
    pub work_upper_shift: Vec<f64>,

    pub base_lower: Vec<f64>,
    pub base_upper: Vec<f64>,
    pub base_value: Vec<f64>,

    /// Random fraction per variable, fixed for the lifetime of the LP
    /// dimensions; drives the perturbation magnitudes
    pub num_tot_random_value: Vec<f64>,
    /// Random permutation of all variables
    pub num_tot_permutation: Vec<usize>,
}

impl SimplexWorkspace {
    /// Resize every array for the given dimensions, zero-filled.
    pub fn resize(&mut self, num_col: usize, num_row: usize) {
        let num_tot = num_col + num_row;
        let grow = |v: &mut Vec<f64>, len: usize| {
            v.clear();
            v.resize(len, 0.0);
        };
        grow(&mut self.work_cost, num_tot);
        grow(&mut self.work_dual, num_tot);
        grow(&mut self.work_shift, num_tot);
        grow(&mut self.work_lower, num_tot);
        grow(&mut self.work_upper, num_tot);
        grow(&mut self.work_range, num_tot);
        grow(&mut self.work_value, num_tot);
        grow(&mut self.work_lower_shift, num_tot);
        grow(&mut self.work_upper_shift, num_tot);
        grow(&mut self.base_lower, num_row);
        grow(&mut self.base_upper, num_row);
        grow(&mut self.base_value, num_row);
    }
}

impl SimplexEngine {
    pub(crate) fn initialise_lp_col_cost(&mut self, lp: &Lp) {
        let sense = lp.sense.sign();
        for j in 0..self.num_col {
            self.ws.work_cost[j] = sense * lp.col_cost[j];
            self.ws.work_shift[j] = 0.0;
        }
    }

    pub(crate) fn initialise_lp_row_cost(&mut self, _lp: &Lp) {
        for var in self.num_col..self.num_col + self.num_row {
            self.ws.work_cost[var] = 0.0;
            self.ws.work_shift[var] = 0.0;
        }
    }

    pub(crate) fn initialise_lp_col_bound(&mut self, lp: &Lp) {
        for j in 0..self.num_col {
            self.ws.work_lower[j] = lp.col_lower[j];
            self.ws.work_upper[j] = lp.col_upper[j];
            self.ws.work_range[j] = self.ws.work_upper[j] - self.ws.work_lower[j];
            self.ws.work_lower_shift[j] = 0.0;
            self.ws.work_upper_shift[j] = 0.0;
        }
    }

    pub(crate) fn initialise_lp_row_bound(&mut self, lp: &Lp) {
        for i in 0..self.num_row {
            let var = self.num_col + i;
            self.ws.work_lower[var] = -lp.row_upper[i];
            self.ws.work_upper[var] = -lp.row_lower[i];
            self.ws.work_range[var] = self.ws.work_upper[var] - self.ws.work_lower[var];
            self.ws.work_lower_shift[var] = 0.0;
            self.ws.work_upper_shift[var] = 0.0;
        }
    }

    /// Copy the costs into the workspace, perturbing them for the dual
    /// simplex when allowed.
    ///
    /// The perturbation base is 5e-7 times the largest cost magnitude,
    /// shrunk by a fourth root when that exceeds 100 and capped at one
    /// when fewer than 1% of the variables are boxed. Each structural
    /// cost moves by (|c|+1) * base * multiplier * (1+r) in the direction
    /// its bound configuration tolerates; logicals get a tiny symmetric
    /// jitter.
    pub(crate) fn initialise_cost(
        &mut self,
        lp: &Lp,
        algorithm: SimplexAlgorithm,
        _phase: i32,
        perturb: bool,
    ) {
        self.initialise_lp_col_cost(lp);
        self.initialise_lp_row_cost(lp);
        self.info.costs_perturbed = false;
        // Primal simplex costs are either from the LP or set specially in
        // phase 1
        if algorithm == SimplexAlgorithm::Primal {
            return;
        }
        if !perturb || self.info.dual_simplex_cost_perturbation_multiplier == 0.0 {
            return;
        }

        let num_tot = self.num_col + self.num_row;
        let mut bigc = 0.0f64;
        for j in 0..self.num_col {
            bigc = bigc.max(self.ws.work_cost[j].abs());
        }
        if bigc > 100.0 {
            bigc = bigc.sqrt().sqrt();
        }

        // Few boxed variables make large perturbations pointless
        let mut boxed_rate = 0.0;
        for var in 0..num_tot {
            if self.ws.work_range[var] < 1e30 {
                boxed_rate += 1.0;
            }
        }
        boxed_rate /= num_tot.max(1) as f64;
        if boxed_rate < 0.01 {
            bigc = bigc.min(1.0);
        }
        let base = 5e-7 * bigc;

        for j in 0..self.num_col {
            let lower = lp.col_lower[j];
            let upper = lp.col_upper[j];
            let xpert = (self.ws.work_cost[j].abs() + 1.0)
                * base
                * self.info.dual_simplex_cost_perturbation_multiplier
                * (1.0 + self.ws.num_tot_random_value[j]);
            if lower <= -INF && upper >= INF {
                // Free - no perturb
            } else if upper >= INF {
                self.ws.work_cost[j] += xpert;
            } else if lower <= -INF {
                self.ws.work_cost[j] -= xpert;
            } else if lower != upper {
                if self.ws.work_cost[j] >= 0.0 {
                    self.ws.work_cost[j] += xpert;
                } else {
                    self.ws.work_cost[j] -= xpert;
                }
            }
            // Fixed - no perturb
        }
        for var in self.num_col..num_tot {
            self.ws.work_cost[var] += (0.5 - self.ws.num_tot_random_value[var])
                * self.info.dual_simplex_cost_perturbation_multiplier
                * 1e-12;
        }
        self.info.costs_perturbed = true;
    }

    /// Copy the bounds into the workspace; relax them outward for the
    /// primal simplex when perturbation is allowed, or rewrite them into
    /// the boxed phase-1 form for the dual simplex.
    pub(crate) fn initialise_bound(
        &mut self,
        lp: &Lp,
        algorithm: SimplexAlgorithm,
        phase: i32,
        perturb: bool,
    ) {
        self.initialise_lp_col_bound(lp);
        self.initialise_lp_row_bound(lp);
        self.info.bounds_perturbed = false;
        let num_tot = self.num_col + self.num_row;

        if algorithm == SimplexAlgorithm::Primal {
            if !perturb || self.info.primal_simplex_bound_perturbation_multiplier == 0.0 {
                return;
            }
            let base = self.info.primal_simplex_bound_perturbation_multiplier * 5e-7;
            for var in 0..num_tot {
                let mut lower = self.ws.work_lower[var];
                let mut upper = self.ws.work_upper[var];
                let fixed = lower == upper;
                // Nonbasic fixed variables stay nonbasic, so their bounds
                // must not move
                if self.basis.nonbasic_flag[var] == 1 && fixed {
                    continue;
                }
                let random_value = self.ws.num_tot_random_value[var];
                if lower > -INF {
                    let original = lower;
                    if lower < -1.0 {
                        lower -= random_value * base * (-lower);
                    } else if lower < 1.0 {
                        lower -= random_value * base;
                    } else {
                        lower -= random_value * base * lower;
                    }
                    self.ws.work_lower[var] = lower;
                    self.ws.work_lower_shift[var] = lower - original;
                }
                if upper < INF {
                    let original = upper;
                    if upper < -1.0 {
                        upper += random_value * base * (-upper);
                    } else if upper < 1.0 {
                        upper += random_value * base;
                    } else {
                        upper += random_value * base * upper;
                    }
                    self.ws.work_upper[var] = upper;
                    self.ws.work_upper_shift[var] = upper - original;
                }
                self.ws.work_range[var] = self.ws.work_upper[var] - self.ws.work_lower[var];
                if self.basis.nonbasic_flag[var] == 0 {
                    continue;
                }
                if self.basis.nonbasic_move[var] > 0 {
                    self.ws.work_value[var] = lower;
                } else if self.basis.nonbasic_move[var] < 0 {
                    self.ws.work_value[var] = upper;
                }
            }
            for i in 0..self.num_row {
                let var = self.basis.basic_index[i];
                self.ws.base_lower[i] = self.ws.work_lower[var];
                self.ws.base_upper[i] = self.ws.work_upper[var];
            }
            self.info.bounds_perturbed = true;
            return;
        }

        debug_assert_eq!(algorithm, SimplexAlgorithm::Dual);
        if phase == PHASE_2 {
            return;
        }
        // Dual phase 1: when the dual value of a variable is feasible its
        // primal value is pinned to zero, otherwise to +/-1, so the dual
        // objective is the negated sum of dual infeasibilities
        for var in 0..num_tot {
            if self.ws.work_lower[var] == -INF && self.ws.work_upper[var] == INF {
                // Row variables should never be nonbasic and free from a
                // logical basis; leave them alone
                if var >= self.num_col {
                    continue;
                }
                self.ws.work_lower[var] = -1000.0;
                self.ws.work_upper[var] = 1000.0;
            } else if self.ws.work_lower[var] == -INF {
                self.ws.work_lower[var] = -1.0;
                self.ws.work_upper[var] = 0.0;
            } else if self.ws.work_upper[var] == INF {
                self.ws.work_lower[var] = 0.0;
                self.ws.work_upper[var] = 1.0;
            } else {
                self.ws.work_lower[var] = 0.0;
                self.ws.work_upper[var] = 0.0;
            }
            self.ws.work_range[var] = self.ws.work_upper[var] - self.ws.work_lower[var];
        }
    }

    /// Set the nonbasic working values from the moves, correcting any
    /// boxed move that no longer matches the bounds.
    pub(crate) fn initialise_nonbasic_value_and_move(&mut self) {
        let num_tot = self.num_col + self.num_row;
        for var in 0..num_tot {
            if self.basis.nonbasic_flag[var] == 0 {
                self.basis.nonbasic_move[var] = MOVE_ZE;
                continue;
            }
            let lower = self.ws.work_lower[var];
            let upper = self.ws.work_upper[var];
            let original_move = self.basis.nonbasic_move[var];
            let (value, mv);
            if lower == upper {
                value = lower;
                mv = MOVE_ZE;
            } else if lower > -INF {
                if upper < INF {
                    if original_move == MOVE_UP {
                        value = lower;
                        mv = MOVE_UP;
                    } else if original_move == MOVE_DN {
                        value = upper;
                        mv = MOVE_DN;
                    } else {
                        // Invalid move for a boxed variable: set at lower
                        value = lower;
                        mv = MOVE_UP;
                    }
                } else {
                    value = lower;
                    mv = MOVE_UP;
                }
            } else if upper < INF {
                value = upper;
                mv = MOVE_DN;
            } else {
                value = 0.0;
                mv = MOVE_ZE;
            }
            self.basis.nonbasic_move[var] = mv;
            self.ws.work_value[var] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_zeroes() {
        let mut ws = SimplexWorkspace::default();
        ws.resize(3, 2);
        assert_eq!(ws.work_cost.len(), 5);
        assert_eq!(ws.base_value.len(), 2);
        assert!(ws.work_cost.iter().all(|&v| v == 0.0));
    }
}
