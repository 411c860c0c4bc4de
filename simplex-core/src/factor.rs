//! LU factorization of the simplex basis matrix.
//!
//! Factorizes B, the m columns of [A | I] selected by `basic_index`, with
//! a Markowitz-flavoured threshold pivoting rule: a pivot must satisfy
//! `|v| >= max(pivot_tolerance, pivot_threshold * cmax)` where `cmax` is
//! the largest magnitude in the eliminated column, and among eligible
//! entries the one in the sparsest row wins. Columns are processed in
//! order of increasing fill, left-looking, so each column costs one
//! sparse triangular solve.
//!
//! Rank deficiency is not fatal: columns that yield no acceptable pivot
//! are replaced by the unit columns of the rows that never received a
//! pivot, and the displaced variables are reported through `no_pv_r` /
//! `no_pv_c` for the basis to repair.
//!
//! Basis changes between factorizations are absorbed as product-form
//! updates; solves apply the eta file after (FTRAN) or before (BTRAN)
//! the triangular passes.

use thiserror::Error;

use crate::sparse::{HVector, SparseMatrix, TINY_VALUE};

/// Factorization errors.
#[derive(Error, Debug)]
pub enum FactorError {
    /// The pivotal entry of an update column vanished
    #[error("zero pivot in update at position {position}")]
    ZeroUpdatePivot {
        /// Basic position of the offending pivot
        position: usize,
    },

    /// A stored pivot sequence could not be replayed
    #[error("refactorization from stored pivots failed at position {position}")]
    RefactorFailed {
        /// Pivot sequence position that failed
        position: usize,
    },
}

/// How a pivot was obtained, recorded for hot-start replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotType {
    /// Pivot chosen by the Markowitz search
    Markowitz,
    /// Unit column substituted for a rank-deficient column
    Unit,
}

/// Pivot sequence of a successful factorization, sufficient to reproduce
/// it exactly.
#[derive(Debug, Clone, Default)]
pub struct RefactorInfo {
    /// Pivotal row per position
    pub pivot_row: Vec<usize>,
    /// Pivotal variable per position
    pub pivot_var: Vec<usize>,
    /// Pivot provenance per position
    pub pivot_type: Vec<PivotType>,
    /// Whether the record refers to the current basis
    pub valid: bool,
}

impl RefactorInfo {
    /// Forget the stored sequence.
    pub fn clear(&mut self) {
        self.pivot_row.clear();
        self.pivot_var.clear();
        self.pivot_type.clear();
        self.valid = false;
    }
}

const UNPIVOTED: usize = usize::MAX;

/// LU factorization of the basis with a product-form update file.
#[derive(Debug, Default)]
pub struct SimplexFactor {
    num_row: usize,

    pivot_threshold: f64,
    pivot_tolerance: f64,

    // L columns in pivot order; entries indexed by original row,
    // already divided by the pivot
    l_start: Vec<usize>,
    l_index: Vec<usize>,
    l_value: Vec<f64>,

    // U columns in pivot order; entries indexed by pivot position
    u_start: Vec<usize>,
    u_index: Vec<usize>,
    u_value: Vec<f64>,
    u_pivot: Vec<f64>,

    // Permutations: position -> row, row -> position,
    // position -> basis column, basis column -> position
    row_of: Vec<usize>,
    perm_row: Vec<usize>,
    basis_col_of: Vec<usize>,

    // Product-form eta file; entries indexed by basic position
    pf_start: Vec<usize>,
    pf_index: Vec<usize>,
    pf_value: Vec<f64>,
    pf_pivot_index: Vec<usize>,
    pf_pivot_value: Vec<f64>,

    // Scratch for solves and builds
    work: Vec<f64>,

    /// Rank deficiency of the last build
    pub rank_deficiency: usize,
    /// Rows that received substituted unit columns
    pub no_pv_r: Vec<usize>,
    /// Variables displaced by the substitution
    pub no_pv_c: Vec<usize>,

    /// Synthetic cost of the last build
    pub build_synthetic_tick: f64,
    /// Synthetic cost accumulated by solves and updates since the build
    pub total_synthetic_tick: f64,

    /// Pivot sequence of the last full-rank build
    pub refactor_info: RefactorInfo,

    built: bool,
}

impl SimplexFactor {
    /// Create a factor for a basis of dimension `num_row`.
    pub fn new(pivot_threshold: f64, pivot_tolerance: f64) -> Self {
        Self {
            pivot_threshold,
            pivot_tolerance,
            ..Default::default()
        }
    }

    /// Whether a factorization is present.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of product-form updates absorbed since the last build.
    #[inline]
    pub fn update_count(&self) -> usize {
        self.pf_pivot_index.len()
    }

    /// Current Markowitz threshold.
    #[inline]
    pub fn pivot_threshold(&self) -> f64 {
        self.pivot_threshold
    }

    /// Raise or lower the Markowitz threshold for subsequent builds.
    pub fn set_pivot_threshold(&mut self, pivot_threshold: f64) {
        self.pivot_threshold = pivot_threshold;
    }

    fn reset_storage(&mut self, num_row: usize) {
        self.num_row = num_row;
        self.l_start = vec![0];
        self.l_index.clear();
        self.l_value.clear();
        self.u_start = vec![0];
        self.u_index.clear();
        self.u_value.clear();
        self.u_pivot.clear();
        self.row_of.clear();
        self.perm_row = vec![UNPIVOTED; num_row];
        self.basis_col_of.clear();
        self.pf_start = vec![0];
        self.pf_index.clear();
        self.pf_value.clear();
        self.pf_pivot_index.clear();
        self.pf_pivot_value.clear();
        self.work = vec![0.0; num_row];
        self.rank_deficiency = 0;
        self.no_pv_r.clear();
        self.no_pv_c.clear();
        self.total_synthetic_tick = 0.0;
        self.built = false;
    }

    /// Factorize the basis selected by `basic_index` from [A | I].
    ///
    /// Returns the rank deficiency. When positive, `basic_index` has had
    /// the offending entries replaced by logicals; the displaced
    /// variables and substituted rows are in `no_pv_c` / `no_pv_r` and
    /// the caller must reconcile its nonbasic flags.
    pub fn build(&mut self, matrix: &SparseMatrix, basic_index: &mut [usize]) -> usize {
        let num_row = matrix.num_row;
        debug_assert_eq!(basic_index.len(), num_row);
        self.reset_storage(num_row);

        // Gather the basis columns and the static row counts that the
        // Markowitz tie-break uses
        let mut b_start = vec![0usize; num_row + 1];
        let mut b_index: Vec<usize> = Vec::new();
        let mut b_value: Vec<f64> = Vec::new();
        let mut row_count = vec![0usize; num_row];
        for (position, &var) in basic_index.iter().enumerate() {
            if var < matrix.num_col {
                for k in matrix.start[var]..matrix.start[var + 1] {
                    b_index.push(matrix.index[k]);
                    b_value.push(matrix.value[k]);
                    row_count[matrix.index[k]] += 1;
                }
            } else {
                b_index.push(var - matrix.num_col);
                b_value.push(1.0);
                row_count[var - matrix.num_col] += 1;
            }
            b_start[position + 1] = b_index.len();
        }

        // Sparsest columns first
        let mut order: Vec<usize> = (0..num_row).collect();
        order.sort_by_key(|&j| (b_start[j + 1] - b_start[j], j));

        let mut touched: Vec<usize> = Vec::with_capacity(num_row);
        let mut deferred: Vec<usize> = Vec::new();
        let mut pivot_types: Vec<PivotType> = Vec::with_capacity(num_row);

        for &j in &order {
            // Scatter column j and solve through the pivots found so far
            for k in b_start[j]..b_start[j + 1] {
                let i = b_index[k];
                if self.work[i] == 0.0 {
                    touched.push(i);
                }
                self.work[i] += b_value[k];
            }
            for k in 0..self.row_of.len() {
                let r = self.row_of[k];
                let x = self.work[r];
                if x == 0.0 {
                    continue;
                }
                for e in self.l_start[k]..self.l_start[k + 1] {
                    let i = self.l_index[e];
                    if self.work[i] == 0.0 {
                        touched.push(i);
                    }
                    self.work[i] -= self.l_value[e] * x;
                }
            }

            // Threshold Markowitz choice among unpivoted rows
            let mut cmax = 0.0f64;
            for &i in &touched {
                if self.perm_row[i] == UNPIVOTED {
                    cmax = cmax.max(self.work[i].abs());
                }
            }
            let eligible_tol = self.pivot_tolerance.max(self.pivot_threshold * cmax);
            let mut pivot_row = UNPIVOTED;
            let mut pivot_count = usize::MAX;
            let mut pivot_abs = 0.0f64;
            if cmax >= self.pivot_tolerance {
                for &i in &touched {
                    if self.perm_row[i] != UNPIVOTED {
                        continue;
                    }
                    let v = self.work[i].abs();
                    if v < eligible_tol {
                        continue;
                    }
                    if row_count[i] < pivot_count || (row_count[i] == pivot_count && v > pivot_abs)
                    {
                        pivot_row = i;
                        pivot_count = row_count[i];
                        pivot_abs = v;
                    }
                }
            }

            if pivot_row == UNPIVOTED {
                deferred.push(j);
                for &i in &touched {
                    self.work[i] = 0.0;
                }
                touched.clear();
                continue;
            }

            self.store_pivot_column(j, pivot_row, &mut touched);
            pivot_types.push(PivotType::Markowitz);
        }

        // Substitute unit columns for the deferred basis positions. A unit
        // column of an unpivoted row passes through L unchanged, so it
        // pivots at that row with value one.
        if !deferred.is_empty() {
            let free_rows: Vec<usize> = (0..num_row)
                .filter(|&i| self.perm_row[i] == UNPIVOTED)
                .collect();
            debug_assert_eq!(free_rows.len(), deferred.len());
            for (t, &position) in deferred.iter().enumerate() {
                let r = free_rows[t];
                self.no_pv_r.push(r);
                self.no_pv_c.push(basic_index[position]);
                basic_index[position] = matrix.num_col + r;
                self.work[r] = 1.0;
                touched.push(r);
                self.store_pivot_column(position, r, &mut touched);
                pivot_types.push(PivotType::Unit);
            }
            self.rank_deficiency = deferred.len();
        }

        self.build_synthetic_tick =
            20.0 * num_row as f64 + 10.0 * (self.l_index.len() + self.u_index.len()) as f64;
        self.built = true;

        self.refactor_info.clear();
        if self.rank_deficiency == 0 {
            for k in 0..num_row {
                self.refactor_info.pivot_row.push(self.row_of[k]);
                self.refactor_info
                    .pivot_var
                    .push(basic_index[self.basis_col_of[k]]);
            }
            self.refactor_info.pivot_type = pivot_types;
            self.refactor_info.valid = true;
        }

        self.rank_deficiency
    }

    /// Replay a stored pivot sequence against the current basis.
    ///
    /// The basis must select the same variables as when the sequence was
    /// recorded; any pivot that fails numerically aborts the replay.
    pub fn rebuild_from(
        &mut self,
        matrix: &SparseMatrix,
        basic_index: &[usize],
        info: &RefactorInfo,
    ) -> Result<(), FactorError> {
        let num_row = matrix.num_row;
        if !info.valid || info.pivot_row.len() != num_row {
            return Err(FactorError::RefactorFailed { position: 0 });
        }
        self.reset_storage(num_row);

        let mut position_of_var = vec![UNPIVOTED; matrix.num_col + num_row];
        for (position, &var) in basic_index.iter().enumerate() {
            position_of_var[var] = position;
        }

        let mut touched: Vec<usize> = Vec::with_capacity(num_row);
        for k in 0..num_row {
            let var = info.pivot_var[k];
            let position = position_of_var[var];
            if position == UNPIVOTED {
                return Err(FactorError::RefactorFailed { position: k });
            }
            if var < matrix.num_col {
                for e in matrix.start[var]..matrix.start[var + 1] {
                    let i = matrix.index[e];
                    if self.work[i] == 0.0 {
                        touched.push(i);
                    }
                    self.work[i] += matrix.value[e];
                }
            } else {
                let i = var - matrix.num_col;
                if self.work[i] == 0.0 {
                    touched.push(i);
                }
                self.work[i] += 1.0;
            }
            for kk in 0..self.row_of.len() {
                let r = self.row_of[kk];
                let x = self.work[r];
                if x == 0.0 {
                    continue;
                }
                for e in self.l_start[kk]..self.l_start[kk + 1] {
                    let i = self.l_index[e];
                    if self.work[i] == 0.0 {
                        touched.push(i);
                    }
                    self.work[i] -= self.l_value[e] * x;
                }
            }
            let pivot_row = info.pivot_row[k];
            if self.perm_row[pivot_row] != UNPIVOTED
                || self.work[pivot_row].abs() <= self.pivot_tolerance
            {
                // Leave the factor unbuilt; the caller falls back to build()
                for &i in &touched {
                    self.work[i] = 0.0;
                }
                return Err(FactorError::RefactorFailed { position: k });
            }
            self.store_pivot_column(position, pivot_row, &mut touched);
        }

        self.build_synthetic_tick =
            20.0 * num_row as f64 + 10.0 * (self.l_index.len() + self.u_index.len()) as f64;
        self.built = true;
        self.refactor_info = info.clone();
        Ok(())
    }

    /// Consume the solved work column and append its L and U parts.
    fn store_pivot_column(&mut self, basis_position: usize, pivot_row: usize, touched: &mut Vec<usize>) {
        let pivot_value = self.work[pivot_row];
        debug_assert!(pivot_value != 0.0);
        let k = self.row_of.len();
        for &i in touched.iter() {
            let v = self.work[i];
            self.work[i] = 0.0;
            if v.abs() <= TINY_VALUE || i == pivot_row {
                continue;
            }
            if self.perm_row[i] == UNPIVOTED {
                self.l_index.push(i);
                self.l_value.push(v / pivot_value);
            } else {
                self.u_index.push(self.perm_row[i]);
                self.u_value.push(v);
            }
        }
        touched.clear();
        self.l_start.push(self.l_index.len());
        self.u_start.push(self.u_index.len());
        self.u_pivot.push(pivot_value);
        self.row_of.push(pivot_row);
        self.perm_row[pivot_row] = k;
        self.basis_col_of.push(basis_position);
    }

    /// Solve B x = v in place. On entry `vec` is indexed by row; on exit
    /// it holds x indexed by basic position.
    pub fn ftran(&mut self, vec: &mut HVector, _expected_density: f64) {
        debug_assert!(self.built);
        let num_row = self.num_row;
        if num_row == 0 {
            return;
        }
        // L solve, forward in pivot order
        for k in 0..num_row {
            let x = vec.array[self.row_of[k]];
            if x == 0.0 {
                continue;
            }
            for e in self.l_start[k]..self.l_start[k + 1] {
                vec.array[self.l_index[e]] -= self.l_value[e] * x;
            }
        }
        // U solve, backward; results gathered by basic position
        for k in (0..num_row).rev() {
            let x = vec.array[self.row_of[k]] / self.u_pivot[k];
            self.work[self.basis_col_of[k]] = x;
            if x == 0.0 {
                continue;
            }
            for e in self.u_start[k]..self.u_start[k + 1] {
                vec.array[self.row_of[self.u_index[e]]] -= self.u_value[e] * x;
            }
        }
        vec.array.copy_from_slice(&self.work[..num_row]);
        self.work[..num_row].iter_mut().for_each(|v| *v = 0.0);
        // Product-form etas, oldest first
        for t in 0..self.pf_pivot_index.len() {
            let p = self.pf_pivot_index[t];
            let xp = vec.array[p] / self.pf_pivot_value[t];
            vec.array[p] = xp;
            if xp == 0.0 {
                continue;
            }
            for e in self.pf_start[t]..self.pf_start[t + 1] {
                vec.array[self.pf_index[e]] -= self.pf_value[e] * xp;
            }
        }
        vec.reindex();
        self.total_synthetic_tick += 10.0 + vec.count as f64;
    }

    /// Solve B^T x = v in place. On entry `vec` is indexed by basic
    /// position; on exit it holds x indexed by row.
    pub fn btran(&mut self, vec: &mut HVector, _expected_density: f64) {
        debug_assert!(self.built);
        let num_row = self.num_row;
        if num_row == 0 {
            return;
        }
        // Product-form etas, newest first
        for t in (0..self.pf_pivot_index.len()).rev() {
            let p = self.pf_pivot_index[t];
            let mut xp = vec.array[p];
            for e in self.pf_start[t]..self.pf_start[t + 1] {
                xp -= self.pf_value[e] * vec.array[self.pf_index[e]];
            }
            vec.array[p] = xp / self.pf_pivot_value[t];
        }
        // U^T solve, forward in pivot order
        for k in 0..num_row {
            let mut x = vec.array[self.basis_col_of[k]];
            for e in self.u_start[k]..self.u_start[k + 1] {
                x -= self.u_value[e] * self.work[self.u_index[e]];
            }
            self.work[k] = x / self.u_pivot[k];
        }
        // L^T solve, backward; results scattered by row
        vec.array.iter_mut().for_each(|v| *v = 0.0);
        for k in (0..num_row).rev() {
            let mut x = self.work[k];
            self.work[k] = 0.0;
            for e in self.l_start[k]..self.l_start[k + 1] {
                x -= self.l_value[e] * vec.array[self.l_index[e]];
            }
            vec.array[self.row_of[k]] = x;
        }
        vec.reindex();
        self.total_synthetic_tick += 10.0 + vec.count as f64;
    }

    /// Absorb the pivot replacing the basic column at `row_out` by the
    /// FTRANned incoming column.
    ///
    /// `row_ep` is accepted for signature parity with update schemes that
    /// use the pivotal row; the product-form file does not.
    pub fn update(
        &mut self,
        col_aq: &HVector,
        _row_ep: &HVector,
        row_out: usize,
    ) -> Result<(), FactorError> {
        debug_assert!(self.built);
        let pivot = col_aq.array[row_out];
        if pivot == 0.0 {
            return Err(FactorError::ZeroUpdatePivot { position: row_out });
        }
        let mut eta_nz = 0usize;
        for k in 0..col_aq.count {
            let i = col_aq.index[k];
            if i == row_out {
                continue;
            }
            let v = col_aq.array[i];
            if v.abs() <= TINY_VALUE {
                continue;
            }
            self.pf_index.push(i);
            self.pf_value.push(v);
            eta_nz += 1;
        }
        self.pf_start.push(self.pf_index.len());
        self.pf_pivot_index.push(row_out);
        self.pf_pivot_value.push(pivot);
        self.refactor_info.valid = false;
        self.total_synthetic_tick += 10.0 + eta_nz as f64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseMatrix;

    fn matrix_from_dense(dense: &[&[f64]]) -> SparseMatrix {
        let num_row = dense.len();
        let num_col = dense[0].len();
        let mut tri = sprs::TriMat::new((num_row, num_col));
        for (i, row) in dense.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    tri.add_triplet(i, j, v);
                }
            }
        }
        SparseMatrix::from_csmat(&tri.to_csc())
    }

    fn ftran_dense(factor: &mut SimplexFactor, rhs: &[f64]) -> Vec<f64> {
        let mut vec = HVector::new(rhs.len());
        for (i, &v) in rhs.iter().enumerate() {
            if v != 0.0 {
                vec.add(i, v);
            }
        }
        factor.ftran(&mut vec, 1.0);
        vec.array.clone()
    }

    fn btran_dense(factor: &mut SimplexFactor, rhs: &[f64]) -> Vec<f64> {
        let mut vec = HVector::new(rhs.len());
        for (i, &v) in rhs.iter().enumerate() {
            if v != 0.0 {
                vec.add(i, v);
            }
        }
        factor.btran(&mut vec, 1.0);
        vec.array.clone()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-9, "got {:?}, expected {:?}", actual, expected);
        }
    }

    #[test]
    fn test_build_identity_basis() {
        let matrix = matrix_from_dense(&[&[2.0, 0.0], &[1.0, 1.0]]);
        let mut basic_index = vec![2usize, 3usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);
        let x = ftran_dense(&mut factor, &[3.0, 4.0]);
        assert_close(&x, &[3.0, 4.0]);
    }

    #[test]
    fn test_ftran_btran_structural_basis() {
        // B = [[2, 1], [1, 3]], columns 0 and 1 basic
        let matrix = matrix_from_dense(&[&[2.0, 1.0], &[1.0, 3.0]]);
        let mut basic_index = vec![0usize, 1usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);

        // B x = [5, 10] has x = [1, 3]
        let x = ftran_dense(&mut factor, &[5.0, 10.0]);
        assert_close(&x, &[1.0, 3.0]);

        // B^T y = [4, 7] has y = [1, 2]
        let y = btran_dense(&mut factor, &[4.0, 7.0]);
        assert_close(&y, &[1.0, 2.0]);
    }

    #[test]
    fn test_mixed_structural_logical_basis() {
        // A = [[1, 2], [0, 1]]; basis = {column 1, logical 0}
        // B = [[2, 1], [1, 0]] with position 0 = column 1, position 1 = slack 0
        let matrix = matrix_from_dense(&[&[1.0, 2.0], &[0.0, 1.0]]);
        let mut basic_index = vec![1usize, 2usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);

        // B [x0, x1]^T = [4, 1]: 2 x0 + x1 = 4, x0 = 1 -> x = [1, 2]
        let x = ftran_dense(&mut factor, &[4.0, 1.0]);
        assert_close(&x, &[1.0, 2.0]);
    }

    #[test]
    fn test_rank_deficiency_substitutes_logicals() {
        // Second column of A is zero: basis {0, 1} is singular
        let matrix = matrix_from_dense(&[&[1.0, 0.0], &[0.0, 0.0]]);
        let mut basic_index = vec![0usize, 1usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        let deficiency = factor.build(&matrix, &mut basic_index);
        assert_eq!(deficiency, 1);
        assert_eq!(factor.no_pv_c, vec![1]);
        assert_eq!(factor.no_pv_r, vec![1]);
        // The displaced column has been replaced by the row's logical
        assert_eq!(basic_index, vec![0, 3]);
        // The patched factor is usable
        let x = ftran_dense(&mut factor, &[2.0, 5.0]);
        assert_close(&x, &[2.0, 5.0]);
    }

    #[test]
    fn test_update_tracks_basis_change() {
        // Start from the logical basis of A = [[2, 1], [1, 3]], then
        // bring column 0 into position 0
        let matrix = matrix_from_dense(&[&[2.0, 1.0], &[1.0, 3.0]]);
        let mut basic_index = vec![2usize, 3usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);

        let mut col_aq = HVector::new(2);
        matrix.collect_aj(&mut col_aq, 0, 1.0);
        factor.ftran(&mut col_aq, 1.0);
        let row_ep = HVector::new(2);
        factor.update(&col_aq, &row_ep, 0).unwrap();
        assert_eq!(factor.update_count(), 1);

        // New basis matrix is [[2, 0], [1, 1]]
        let x = ftran_dense(&mut factor, &[4.0, 5.0]);
        assert_close(&x, &[2.0, 3.0]);
        let y = btran_dense(&mut factor, &[4.0, 3.0]);
        assert_close(&y, &[0.5, 3.0]);
    }

    #[test]
    fn test_rebuild_from_refactor_info() {
        let matrix = matrix_from_dense(&[&[2.0, 1.0], &[1.0, 3.0]]);
        let mut basic_index = vec![0usize, 1usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);
        let info = factor.refactor_info.clone();
        let x_fresh = ftran_dense(&mut factor, &[5.0, 10.0]);

        let mut replayed = SimplexFactor::new(0.1, 1e-10);
        replayed.rebuild_from(&matrix, &basic_index, &info).unwrap();
        let x_replayed = ftran_dense(&mut replayed, &[5.0, 10.0]);
        assert_close(&x_replayed, &x_fresh);
    }

    #[test]
    fn test_threshold_prefers_sparse_rows() {
        // With a loose threshold the sparser second row must win the
        // pivot for the first column even though its entry is smaller
        let matrix = matrix_from_dense(&[&[10.0, 1.0, 0.0], &[4.0, 0.0, 1.0], &[10.0, 2.0, 3.0]]);
        let mut basic_index = vec![0usize, 1usize, 2usize];
        let mut factor = SimplexFactor::new(0.1, 1e-10);
        assert_eq!(factor.build(&matrix, &mut basic_index), 0);
        // Solving against a known vector validates the factor regardless
        // of the pivot order chosen
        let x = ftran_dense(&mut factor, &[12.0, 6.0, 20.0]);
        // B x = b with B the full matrix: x = [1, 2, 2]
        assert_close(&x, &[1.0, 2.0, 2.0]);
    }
}
