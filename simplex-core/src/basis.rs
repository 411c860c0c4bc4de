//! Basic/nonbasic partition at two levels of detail.
//!
//! The high-level [`Basis`] carries a per-column and per-row status the
//! way clients see it. The low-level [`SimplexBasis`] is what the engine
//! iterates on: a nonbasic flag and move direction per variable plus the
//! row-to-variable map `basic_index`. Variables at or beyond `num_col`
//! are the logicals, whose working bounds are the negated row bounds.

use crate::factor::RefactorInfo;
use crate::model::{Lp, ModelError, INF};

/// Nonbasic move towards the upper bound.
pub const MOVE_UP: i8 = 1;
/// Nonbasic move towards the lower bound.
pub const MOVE_DN: i8 = -1;
/// No move: basic, fixed or free.
pub const MOVE_ZE: i8 = 0;

/// Status of a variable or row in the high-level basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasisStatus {
    /// In the basis
    Basic,
    /// Nonbasic at the lower bound
    Lower,
    /// Nonbasic at the upper bound
    Upper,
    /// Nonbasic at zero (free variables)
    Zero,
    /// Nonbasic without a definitive bound yet
    #[default]
    Nonbasic,
}

/// Client-facing basis.
#[derive(Debug, Clone, Default)]
pub struct Basis {
    /// Status per structural column
    pub col_status: Vec<BasisStatus>,
    /// Status per row
    pub row_status: Vec<BasisStatus>,
    /// Whether the basis describes the current LP
    pub valid: bool,
    /// Whether the underlying matrix changed since the basis was
    /// factorized, so any factorization of it is stale
    pub alien: bool,
}

impl Basis {
    /// Invalidate the basis.
    pub fn clear(&mut self) {
        self.col_status.clear();
        self.row_status.clear();
        self.valid = false;
        self.alien = false;
    }

    /// The logical basis: every column nonbasic at a bound, every row
    /// basic.
    pub fn logical(lp: &Lp) -> Self {
        let col_status = (0..lp.num_col())
            .map(|j| nonbasic_col_status(lp.col_lower[j], lp.col_upper[j]))
            .collect();
        Self {
            col_status,
            row_status: vec![BasisStatus::Basic; lp.num_row()],
            valid: true,
            alien: false,
        }
    }
}

/// Nonbasic status implied by a column's bounds, using the
/// bound-nearer-zero tie-break for boxed variables.
pub fn nonbasic_col_status(lower: f64, upper: f64) -> BasisStatus {
    if lower == upper {
        BasisStatus::Lower
    } else if lower > -INF {
        if upper < INF {
            if lower.abs() < upper.abs() {
                BasisStatus::Lower
            } else {
                BasisStatus::Upper
            }
        } else {
            BasisStatus::Lower
        }
    } else if upper < INF {
        BasisStatus::Upper
    } else {
        BasisStatus::Zero
    }
}

/// Working bounds of variable `var`: column bounds for structurals, the
/// negated row bounds for logicals.
#[inline]
pub fn work_bounds(lp: &Lp, var: usize) -> (f64, f64) {
    if var < lp.num_col() {
        (lp.col_lower[var], lp.col_upper[var])
    } else {
        let row = var - lp.num_col();
        (-lp.row_upper[row], -lp.row_lower[row])
    }
}

/// Move direction implied by working bounds for a nonbasic variable,
/// using the bound-nearer-zero tie-break for boxed variables.
pub fn move_from_bounds(lower: f64, upper: f64) -> i8 {
    if lower == upper {
        MOVE_ZE
    } else if lower > -INF {
        if upper < INF {
            if lower.abs() < upper.abs() {
                MOVE_UP
            } else {
                MOVE_DN
            }
        } else {
            MOVE_UP
        }
    } else if upper < INF {
        MOVE_DN
    } else {
        MOVE_ZE
    }
}

/// Engine-level basis arrays.
#[derive(Debug, Clone, Default)]
pub struct SimplexBasis {
    /// 1 for nonbasic variables, 0 for basic, indexed over n+m
    pub nonbasic_flag: Vec<i8>,
    /// Move direction for nonbasic variables, 0 for basic
    pub nonbasic_move: Vec<i8>,
    /// Variable in the basis at each row position
    pub basic_index: Vec<usize>,
}

impl SimplexBasis {
    /// Install the logical basis: all columns nonbasic with moves from
    /// their bounds, all rows basic.
    pub fn set_logical(&mut self, lp: &Lp) {
        let num_col = lp.num_col();
        let num_row = lp.num_row();
        let num_tot = num_col + num_row;
        self.nonbasic_flag = vec![0; num_tot];
        self.nonbasic_move = vec![0; num_tot];
        self.basic_index = vec![0; num_row];
        for j in 0..num_col {
            self.nonbasic_flag[j] = 1;
            self.nonbasic_move[j] = move_from_bounds(lp.col_lower[j], lp.col_upper[j]);
        }
        for i in 0..num_row {
            let var = num_col + i;
            self.nonbasic_flag[var] = 0;
            self.basic_index[i] = var;
        }
    }

    /// Install the arrays from a client basis.
    ///
    /// Basic positions are filled in order of appearance: columns first,
    /// then rows.
    pub fn set_from_basis(&mut self, lp: &Lp, basis: &Basis) -> Result<(), ModelError> {
        let num_col = lp.num_col();
        let num_row = lp.num_row();
        if basis.col_status.len() != num_col || basis.row_status.len() != num_row {
            return Err(ModelError::InvalidBasis {
                what: format!(
                    "status vectors have lengths {}/{}, expected {}/{}",
                    basis.col_status.len(),
                    basis.row_status.len(),
                    num_col,
                    num_row
                ),
            });
        }
        let num_tot = num_col + num_row;
        self.nonbasic_flag = vec![0; num_tot];
        self.nonbasic_move = vec![0; num_tot];
        self.basic_index.clear();
        for j in 0..num_col {
            let (lower, upper) = (lp.col_lower[j], lp.col_upper[j]);
            match basis.col_status[j] {
                BasisStatus::Basic => self.basic_index.push(j),
                status => {
                    self.nonbasic_flag[j] = 1;
                    self.nonbasic_move[j] = match status {
                        BasisStatus::Lower => {
                            if lower == upper {
                                MOVE_ZE
                            } else {
                                MOVE_UP
                            }
                        }
                        BasisStatus::Upper => MOVE_DN,
                        _ => MOVE_ZE,
                    };
                }
            }
        }
        for i in 0..num_row {
            let var = num_col + i;
            let (lower, upper) = (lp.row_lower[i], lp.row_upper[i]);
            match basis.row_status[i] {
                BasisStatus::Basic => self.basic_index.push(var),
                status => {
                    self.nonbasic_flag[var] = 1;
                    // Rows carry the slack convention: Lower status pins
                    // the activity at the row lower bound, which is the
                    // upper working bound of the logical
                    self.nonbasic_move[var] = match status {
                        BasisStatus::Lower => {
                            if lower == upper {
                                MOVE_ZE
                            } else {
                                MOVE_DN
                            }
                        }
                        BasisStatus::Upper => MOVE_UP,
                        _ => MOVE_ZE,
                    };
                }
            }
        }
        if self.basic_index.len() != num_row {
            return Err(ModelError::InvalidBasis {
                what: format!(
                    "{} basic variables for {} rows",
                    self.basic_index.len(),
                    num_row
                ),
            });
        }
        Ok(())
    }

    /// Copy the arrays from another simplex basis.
    pub fn set_from_simplex_basis(&mut self, lp: &Lp, basis: &SimplexBasis) -> Result<(), ModelError> {
        if !basis.consistent(lp.num_col(), lp.num_row()) {
            return Err(ModelError::InvalidBasis {
                what: "supplied simplex basis is inconsistent".to_string(),
            });
        }
        self.nonbasic_flag = basis.nonbasic_flag.clone();
        self.nonbasic_move = basis.nonbasic_move.clone();
        self.basic_index = basis.basic_index.clone();
        Ok(())
    }

    /// Reconcile the flags after the factorization replaced deficient
    /// basis columns by logicals.
    pub fn handle_rank_deficiency(
        &mut self,
        lp: &Lp,
        no_pv_r: &[usize],
        no_pv_c: &[usize],
    ) {
        debug_assert_eq!(no_pv_r.len(), no_pv_c.len());
        for k in 0..no_pv_r.len() {
            let variable_in = lp.num_col() + no_pv_r[k];
            let variable_out = no_pv_c[k];
            self.nonbasic_flag[variable_in] = 0;
            self.nonbasic_move[variable_in] = 0;
            self.nonbasic_flag[variable_out] = 1;
            let (lower, upper) = work_bounds(lp, variable_out);
            self.nonbasic_move[variable_out] = move_from_bounds(lower, upper);
        }
    }

    /// Reconstruct every nonbasic move from the current bounds.
    pub fn set_nonbasic_move(&mut self, lp: &Lp) {
        let num_tot = lp.num_tot();
        debug_assert_eq!(self.nonbasic_flag.len(), num_tot);
        for var in 0..num_tot {
            if self.nonbasic_flag[var] == 0 {
                self.nonbasic_move[var] = MOVE_ZE;
                continue;
            }
            let (lower, upper) = work_bounds(lp, var);
            self.nonbasic_move[var] = move_from_bounds(lower, upper);
        }
    }

    /// Check the structural invariants tying the three arrays together.
    pub fn consistent(&self, num_col: usize, num_row: usize) -> bool {
        let num_tot = num_col + num_row;
        if self.nonbasic_flag.len() != num_tot
            || self.nonbasic_move.len() != num_tot
            || self.basic_index.len() != num_row
        {
            return false;
        }
        let mut in_basis = vec![false; num_tot];
        for &var in &self.basic_index {
            if var >= num_tot || in_basis[var] {
                return false;
            }
            in_basis[var] = true;
        }
        for var in 0..num_tot {
            let flagged_nonbasic = self.nonbasic_flag[var] != 0;
            if flagged_nonbasic == in_basis[var] {
                return false;
            }
            if !flagged_nonbasic && self.nonbasic_move[var] != MOVE_ZE {
                return false;
            }
        }
        true
    }
}

/// Saved basis and refactorization trace for an immediate warm
/// resumption.
#[derive(Debug, Clone, Default)]
pub struct HotStart {
    /// Whether the packet holds a usable state
    pub valid: bool,
    /// Basic variable per row position
    pub basic_index: Vec<usize>,
    /// Nonbasic move per variable
    pub nonbasic_move: Vec<i8>,
    /// Pivot sequence reproducing the factorization
    pub refactor_info: RefactorInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjSense, Lp};
    use crate::sparse::SparseMatrix;

    fn two_by_two_lp() -> Lp {
        let mut tri = sprs::TriMat::new((2, 2));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(1, 1, 1.0);
        Lp {
            col_cost: vec![1.0, 2.0],
            col_lower: vec![0.0, -1.0],
            col_upper: vec![INF, 4.0],
            row_lower: vec![-INF, 1.0],
            row_upper: vec![2.0, 1.0],
            a_matrix: SparseMatrix::from_csmat(&tri.to_csc()),
            sense: ObjSense::Minimize,
            ..Default::default()
        }
    }

    #[test]
    fn test_set_logical() {
        let lp = two_by_two_lp();
        let mut basis = SimplexBasis::default();
        basis.set_logical(&lp);
        assert!(basis.consistent(2, 2));
        assert_eq!(basis.basic_index, vec![2, 3]);
        // Column 0 is lower-only, column 1 boxed with |−1| < |4|
        assert_eq!(basis.nonbasic_move[0], MOVE_UP);
        assert_eq!(basis.nonbasic_move[1], MOVE_UP);
    }

    #[test]
    fn test_move_from_bounds() {
        assert_eq!(move_from_bounds(1.0, 1.0), MOVE_ZE);
        assert_eq!(move_from_bounds(0.0, INF), MOVE_UP);
        assert_eq!(move_from_bounds(-INF, 3.0), MOVE_DN);
        assert_eq!(move_from_bounds(-INF, INF), MOVE_ZE);
        assert_eq!(move_from_bounds(-5.0, 1.0), MOVE_DN);
        assert_eq!(move_from_bounds(-1.0, 5.0), MOVE_UP);
    }

    #[test]
    fn test_set_from_basis_row_convention() {
        let lp = two_by_two_lp();
        let mut client = Basis::logical(&lp);
        // Make row 0 nonbasic at its upper bound and column 0 basic
        client.col_status[0] = BasisStatus::Basic;
        client.row_status[0] = BasisStatus::Upper;
        let mut basis = SimplexBasis::default();
        basis.set_from_basis(&lp, &client).unwrap();
        assert!(basis.consistent(2, 2));
        // Row at its upper bound pins the logical at its lower working
        // bound, so the move points up
        assert_eq!(basis.nonbasic_move[2], MOVE_UP);
        assert_eq!(basis.basic_index, vec![0, 3]);
    }

    #[test]
    fn test_set_from_basis_wrong_count() {
        let lp = two_by_two_lp();
        let mut client = Basis::logical(&lp);
        client.row_status[0] = BasisStatus::Lower;
        client.row_status[1] = BasisStatus::Lower;
        let mut basis = SimplexBasis::default();
        assert!(basis.set_from_basis(&lp, &client).is_err());
    }

    #[test]
    fn test_handle_rank_deficiency_flips_flags() {
        let lp = two_by_two_lp();
        let mut basis = SimplexBasis::default();
        basis.set_logical(&lp);
        // Pretend column 1 displaced the logical of row 1
        basis.nonbasic_flag[1] = 0;
        basis.nonbasic_move[1] = 0;
        basis.nonbasic_flag[3] = 1;
        basis.basic_index[1] = 1;
        // The factor put the logical back
        basis.basic_index[1] = 3;
        basis.handle_rank_deficiency(&lp, &[1], &[1]);
        assert!(basis.consistent(2, 2));
        assert_eq!(basis.nonbasic_flag[1], 1);
        assert_eq!(basis.nonbasic_flag[3], 0);
    }

    #[test]
    fn test_consistency_detects_duplicates() {
        let lp = two_by_two_lp();
        let mut basis = SimplexBasis::default();
        basis.set_logical(&lp);
        basis.basic_index[1] = 2;
        assert!(!basis.consistent(2, 2));
    }
}
