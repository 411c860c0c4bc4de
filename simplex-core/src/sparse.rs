//! Sparse matrix storage and kernels.
//!
//! The constraint matrix is held in CSC (Compressed Sparse Column)
//! format, with on-demand transposition to a row-wise form for row
//! operations and a partitioned row-wise copy for PRICE. `sprs` matrices
//! are accepted and produced at the API boundary; the engine needs its
//! own storage because columns and rows are appended and deleted in
//! place.

use crate::model::ModelError;

/// Density above which PRICE switches from row-wise to column-wise.
pub const HYPER_PRICE_DENSITY: f64 = 0.1;

/// Sparse work vector with a dense backing array.
///
/// `count` tracks the number of nonzeros and `index` their positions;
/// when a computation cannot maintain the index list cheaply it sets
/// `count` to the dimension and consumers fall back to dense scans.
#[derive(Debug, Clone, Default)]
pub struct HVector {
    /// Number of tracked nonzeros, or the dimension when untracked
    pub count: usize,
    /// Positions of the tracked nonzeros
    pub index: Vec<usize>,
    /// Dense values
    pub array: Vec<f64>,
}

/// Values at or below this magnitude are treated as exact zeros by the
/// solve kernels.
pub const TINY_VALUE: f64 = 1e-14;

impl HVector {
    /// Create a zero vector of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            count: 0,
            index: Vec::with_capacity(dim),
            array: vec![0.0; dim],
        }
    }

    /// Resize to a new dimension, zeroing all values.
    pub fn setup(&mut self, dim: usize) {
        self.count = 0;
        self.index.clear();
        self.array.clear();
        self.array.resize(dim, 0.0);
    }

    /// Dimension of the dense backing array.
    #[inline]
    pub fn dim(&self) -> usize {
        self.array.len()
    }

    /// Zero the vector, exploiting the index list when it is tracked.
    pub fn clear(&mut self) {
        let dim = self.array.len();
        if self.count <= self.index.len() && self.count < dim / 4 {
            for k in 0..self.count {
                self.array[self.index[k]] = 0.0;
            }
        } else {
            self.array.iter_mut().for_each(|v| *v = 0.0);
        }
        self.count = 0;
        self.index.clear();
    }

    /// Add `value` at `i`, maintaining the index list.
    #[inline]
    pub fn add(&mut self, i: usize, value: f64) {
        if self.array[i] == 0.0 {
            self.index.push(i);
            self.count += 1;
        }
        self.array[i] += value;
    }

    /// Rebuild `count`/`index` by scanning the dense array, dropping
    /// values at or below the kernel zero tolerance.
    pub fn reindex(&mut self) {
        self.index.clear();
        for i in 0..self.array.len() {
            let v = self.array[i];
            if v != 0.0 {
                if v.abs() <= TINY_VALUE {
                    self.array[i] = 0.0;
                } else {
                    self.index.push(i);
                }
            }
        }
        self.count = self.index.len();
    }

}

/// Storage orientation of a [`SparseMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixFormat {
    /// Compressed sparse column
    #[default]
    Colwise,
    /// Compressed sparse row
    Rowwise,
}

/// Sparse matrix with mutable dimensions.
///
/// The primary storage is CSC; some mutations (appending rows) are
/// performed row-wise and the matrix is transposed back on demand via
/// [`SparseMatrix::ensure_colwise`]. A separate row-wise copy partitioned
/// into nonbasic and basic entries serves PRICE; it is rebuilt whenever
/// the basis changes shape and updated entry-wise on pivots.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    /// Number of columns
    pub num_col: usize,
    /// Number of rows
    pub num_row: usize,
    /// Storage orientation of `start`/`index`/`value`
    pub format: MatrixFormat,
    /// Vector starts, length `major_dim() + 1`
    pub start: Vec<usize>,
    /// Minor indices
    pub index: Vec<usize>,
    /// Values
    pub value: Vec<f64>,

    // Partitioned row-wise copy for PRICE: row i holds entries for
    // nonbasic columns in ar_start[i]..ar_end[i] and entries for basic
    // columns in ar_end[i]..ar_start[i+1].
    ar_start: Vec<usize>,
    ar_end: Vec<usize>,
    ar_index: Vec<usize>,
    ar_value: Vec<f64>,
    has_price: bool,
}

impl Default for SparseMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl SparseMatrix {
    /// Create an empty matrix with the given dimensions.
    pub fn new(num_row: usize, num_col: usize) -> Self {
        Self {
            num_col,
            num_row,
            format: MatrixFormat::Colwise,
            start: vec![0; num_col + 1],
            index: Vec::new(),
            value: Vec::new(),
            ar_start: Vec::new(),
            ar_end: Vec::new(),
            ar_index: Vec::new(),
            ar_value: Vec::new(),
            has_price: false,
        }
    }

    /// Number of stored entries.
    #[inline]
    pub fn num_nz(&self) -> usize {
        self.value.len()
    }

    #[inline]
    fn major_dim(&self) -> usize {
        match self.format {
            MatrixFormat::Colwise => self.num_col,
            MatrixFormat::Rowwise => self.num_row,
        }
    }

    #[inline]
    fn minor_dim(&self) -> usize {
        match self.format {
            MatrixFormat::Colwise => self.num_row,
            MatrixFormat::Rowwise => self.num_col,
        }
    }

    /// Check start monotonicity and index ranges.
    pub fn dimensions_ok(&self) -> bool {
        if self.start.len() != self.major_dim() + 1 {
            return false;
        }
        if self.start[0] != 0 || *self.start.last().unwrap() != self.num_nz() {
            return false;
        }
        if self.index.len() != self.value.len() {
            return false;
        }
        let minor = self.minor_dim();
        self.start.windows(2).all(|w| w[0] <= w[1]) && self.index.iter().all(|&i| i < minor)
    }

    /// Build from an `sprs` matrix of either orientation.
    pub fn from_csmat(mat: &sprs::CsMat<f64>) -> Self {
        let csc = mat.to_csc();
        let mut result = Self {
            num_col: csc.cols(),
            num_row: csc.rows(),
            format: MatrixFormat::Colwise,
            start: csc.indptr().raw_storage().to_vec(),
            index: csc.indices().to_vec(),
            value: csc.data().to_vec(),
            ..Default::default()
        };
        // to_csc on an already-CSC view can keep a leading offset
        if result.start[0] != 0 {
            let offset = result.start[0];
            result.start.iter_mut().for_each(|s| *s -= offset);
        }
        result
    }

    /// Convert to an `sprs` CSC matrix.
    pub fn to_csmat(&self) -> sprs::CsMat<f64> {
        let mut work = self.clone();
        work.ensure_colwise();
        let mut tri = sprs::TriMat::new((work.num_row, work.num_col));
        for col in 0..work.num_col {
            for k in work.start[col]..work.start[col + 1] {
                tri.add_triplet(work.index[k], col, work.value[k]);
            }
        }
        tri.to_csc()
    }

    fn transpose_storage(&mut self) {
        let major = self.major_dim();
        let minor = self.minor_dim();
        let num_nz = self.num_nz();
        let mut new_start = vec![0usize; minor + 1];
        for &i in &self.index {
            new_start[i + 1] += 1;
        }
        for i in 0..minor {
            new_start[i + 1] += new_start[i];
        }
        let mut position = new_start.clone();
        let mut new_index = vec![0usize; num_nz];
        let mut new_value = vec![0.0; num_nz];
        for j in 0..major {
            for k in self.start[j]..self.start[j + 1] {
                let i = self.index[k];
                new_index[position[i]] = j;
                new_value[position[i]] = self.value[k];
                position[i] += 1;
            }
        }
        self.start = new_start;
        self.index = new_index;
        self.value = new_value;
    }

    /// Ensure column-wise storage. Idempotent.
    pub fn ensure_colwise(&mut self) {
        if self.format == MatrixFormat::Colwise {
            return;
        }
        self.transpose_storage();
        self.format = MatrixFormat::Colwise;
    }

    /// Ensure row-wise storage. Idempotent.
    pub fn ensure_rowwise(&mut self) {
        if self.format == MatrixFormat::Rowwise {
            return;
        }
        self.transpose_storage();
        self.format = MatrixFormat::Rowwise;
    }

    /// Append columns given in CSC pieces. The matrix must already have
    /// the right row dimension for the incoming entries.
    pub fn add_cols(&mut self, num_new_col: usize, start: &[usize], index: &[usize], value: &[f64]) {
        if num_new_col == 0 {
            return;
        }
        self.ensure_colwise();
        self.clear_price();
        let base = self.num_nz();
        debug_assert_eq!(start.len(), num_new_col + 1);
        for j in 0..num_new_col {
            for k in start[j]..start[j + 1] {
                self.index.push(index[k]);
                self.value.push(value[k]);
            }
            self.start.push(base + start[j + 1]);
        }
        self.num_col += num_new_col;
    }

    /// Append rows given in CSR pieces.
    ///
    /// Leaves the matrix row-wise; callers re-establish the column-wise
    /// orientation once the batch of mutations is complete.
    pub fn add_rows(&mut self, num_new_row: usize, start: &[usize], index: &[usize], value: &[f64]) {
        if num_new_row == 0 {
            return;
        }
        self.ensure_rowwise();
        self.clear_price();
        let base = self.num_nz();
        debug_assert_eq!(start.len(), num_new_row + 1);
        for i in 0..num_new_row {
            for k in start[i]..start[i + 1] {
                self.index.push(index[k]);
                self.value.push(value[k]);
            }
            self.start.push(base + start[i + 1]);
        }
        self.num_row += num_new_row;
    }

    fn delete_major(&mut self, delete: &[bool]) {
        let major = self.major_dim();
        debug_assert_eq!(delete.len(), major);
        let mut new_start = Vec::with_capacity(major + 1);
        new_start.push(0usize);
        let mut write = 0usize;
        for j in 0..major {
            if delete[j] {
                continue;
            }
            for k in self.start[j]..self.start[j + 1] {
                self.index[write] = self.index[k];
                self.value[write] = self.value[k];
                write += 1;
            }
            new_start.push(write);
        }
        self.index.truncate(write);
        self.value.truncate(write);
        self.start = new_start;
    }

    fn delete_minor(&mut self, delete: &[bool]) {
        let minor = self.minor_dim();
        debug_assert_eq!(delete.len(), minor);
        // Map retained minor indices to their new positions
        let mut new_of = vec![usize::MAX; minor];
        let mut next = 0usize;
        for i in 0..minor {
            if !delete[i] {
                new_of[i] = next;
                next += 1;
            }
        }
        let major = self.major_dim();
        let mut write = 0usize;
        let mut read_from = self.start[0];
        for j in 0..major {
            let read_to = self.start[j + 1];
            for k in read_from..read_to {
                let i = self.index[k];
                if new_of[i] == usize::MAX {
                    continue;
                }
                self.index[write] = new_of[i];
                self.value[write] = self.value[k];
                write += 1;
            }
            read_from = read_to;
            self.start[j + 1] = write;
        }
        self.index.truncate(write);
        self.value.truncate(write);
    }

    /// Delete the flagged columns.
    pub fn delete_cols(&mut self, delete: &[bool]) {
        self.ensure_colwise();
        self.clear_price();
        self.delete_major(delete);
        self.num_col = self.start.len() - 1;
    }

    /// Delete the flagged rows, renumbering the survivors.
    pub fn delete_rows(&mut self, delete: &[bool]) {
        self.ensure_colwise();
        self.clear_price();
        self.delete_minor(delete);
        self.num_row -= delete.iter().filter(|&&d| d).count();
    }

    /// Copy row `i` into the supplied index/value buffers.
    pub fn get_row(&self, i: usize, out_index: &mut Vec<usize>, out_value: &mut Vec<f64>) {
        out_index.clear();
        out_value.clear();
        match self.format {
            MatrixFormat::Rowwise => {
                for k in self.start[i]..self.start[i + 1] {
                    out_index.push(self.index[k]);
                    out_value.push(self.value[k]);
                }
            }
            MatrixFormat::Colwise => {
                for j in 0..self.num_col {
                    for k in self.start[j]..self.start[j + 1] {
                        if self.index[k] == i {
                            out_index.push(j);
                            out_value.push(self.value[k]);
                        }
                    }
                }
            }
        }
    }

    /// Value of entry (i, j), zero when not stored.
    pub fn get_coefficient(&self, i: usize, j: usize) -> f64 {
        match self.format {
            MatrixFormat::Colwise => {
                for k in self.start[j]..self.start[j + 1] {
                    if self.index[k] == i {
                        return self.value[k];
                    }
                }
            }
            MatrixFormat::Rowwise => {
                for k in self.start[i]..self.start[i + 1] {
                    if self.index[k] == j {
                        return self.value[k];
                    }
                }
            }
        }
        0.0
    }

    /// Replace entry (i, j). Values at or below `small_value` in
    /// magnitude delete the entry.
    pub fn change_coefficient(&mut self, i: usize, j: usize, value: f64, small_value: f64) {
        self.ensure_colwise();
        self.clear_price();
        let drop = value.abs() <= small_value;
        for k in self.start[j]..self.start[j + 1] {
            if self.index[k] == i {
                if drop {
                    self.index.remove(k);
                    self.value.remove(k);
                    for s in self.start.iter_mut().skip(j + 1) {
                        *s -= 1;
                    }
                } else {
                    self.value[k] = value;
                }
                return;
            }
        }
        if drop {
            return;
        }
        // New entry: splice at the end of column j
        let at = self.start[j + 1];
        self.index.insert(at, i);
        self.value.insert(at, value);
        for s in self.start.iter_mut().skip(j + 1) {
            *s += 1;
        }
    }

    /// Multiply column `j` by `scale`.
    pub fn scale_col(&mut self, j: usize, scale: f64) {
        self.ensure_colwise();
        self.clear_price();
        for k in self.start[j]..self.start[j + 1] {
            self.value[k] *= scale;
        }
    }

    /// Multiply row `i` by `scale`.
    pub fn scale_row(&mut self, i: usize, scale: f64) {
        self.ensure_colwise();
        self.clear_price();
        for k in 0..self.index.len() {
            if self.index[k] == i {
                self.value[k] *= scale;
            }
        }
    }

    /// Validate the matrix entries: distinct in-range indices per column,
    /// finite values within the magnitude window. Entries at or below
    /// `small_value` are dropped in place.
    pub fn assess(&mut self, small_value: f64, large_value: f64) -> Result<(), ModelError> {
        self.ensure_colwise();
        let mut seen = vec![usize::MAX; self.num_row];
        let mut write = 0usize;
        let mut read_from = self.start[0];
        for j in 0..self.num_col {
            let read_to = self.start[j + 1];
            for k in read_from..read_to {
                let i = self.index[k];
                let v = self.value[k];
                if i >= self.num_row {
                    return Err(ModelError::InvalidInput {
                        what: format!("row index {} of column {} out of range", i, j),
                    });
                }
                if seen[i] == j {
                    return Err(ModelError::InvalidInput {
                        what: format!("duplicate row index {} in column {}", i, j),
                    });
                }
                seen[i] = j;
                if !v.is_finite() || v.abs() >= large_value {
                    return Err(ModelError::IllegalMatrixValue {
                        row: i,
                        col: j,
                        value: v,
                    });
                }
                if v.abs() <= small_value {
                    continue;
                }
                self.index[write] = i;
                self.value[write] = v;
                write += 1;
            }
            read_from = read_to;
            self.start[j + 1] = write;
        }
        self.index.truncate(write);
        self.value.truncate(write);
        Ok(())
    }

    /// Gather `mult` times column `var` of [A | I] into `vec`.
    ///
    /// Variables at or beyond `num_col` denote logicals with identity
    /// columns.
    pub fn collect_aj(&self, vec: &mut HVector, var: usize, mult: f64) {
        debug_assert_eq!(self.format, MatrixFormat::Colwise);
        if var < self.num_col {
            for k in self.start[var]..self.start[var + 1] {
                vec.add(self.index[k], mult * self.value[k]);
            }
        } else {
            vec.add(var - self.num_col, mult);
        }
    }

    /// Build the partitioned row-wise PRICE copy from the column-wise
    /// data and the nonbasic flags.
    pub fn setup_price(&mut self, nonbasic_flag: &[i8]) {
        self.ensure_colwise();
        let num_nz = self.num_nz();
        self.ar_start = vec![0; self.num_row + 1];
        self.ar_end = vec![0; self.num_row];
        self.ar_index = vec![0; num_nz];
        self.ar_value = vec![0.0; num_nz];
        // Count nonbasic entries per row, then basic entries
        for j in 0..self.num_col {
            let nonbasic = nonbasic_flag[j] != 0;
            for k in self.start[j]..self.start[j + 1] {
                let i = self.index[k];
                if nonbasic {
                    self.ar_end[i] += 1;
                }
                self.ar_start[i + 1] += 1;
            }
        }
        for i in 0..self.num_row {
            self.ar_start[i + 1] += self.ar_start[i];
        }
        for i in 0..self.num_row {
            self.ar_end[i] += self.ar_start[i];
        }
        let mut fill_nonbasic: Vec<usize> = self.ar_start[..self.num_row].to_vec();
        let mut fill_basic: Vec<usize> = self.ar_end.clone();
        for j in 0..self.num_col {
            let nonbasic = nonbasic_flag[j] != 0;
            for k in self.start[j]..self.start[j + 1] {
                let i = self.index[k];
                let at = if nonbasic {
                    let at = fill_nonbasic[i];
                    fill_nonbasic[i] += 1;
                    at
                } else {
                    let at = fill_basic[i];
                    fill_basic[i] += 1;
                    at
                };
                self.ar_index[at] = j;
                self.ar_value[at] = self.value[k];
            }
        }
        self.has_price = true;
    }

    /// Whether the PRICE copy is present.
    #[inline]
    pub fn has_price(&self) -> bool {
        self.has_price
    }

    /// Drop the PRICE copy. Any structural mutation calls this.
    pub fn clear_price(&mut self) {
        self.has_price = false;
        self.ar_start.clear();
        self.ar_end.clear();
        self.ar_index.clear();
        self.ar_value.clear();
    }

    /// Repartition the PRICE copy after a basis change: `var_in` becomes
    /// basic, `var_out` becomes nonbasic. Logicals are not stored.
    pub fn update(&mut self, var_in: usize, var_out: usize) {
        if !self.has_price {
            return;
        }
        if var_in < self.num_col {
            for k in self.start[var_in]..self.start[var_in + 1] {
                let i = self.index[k];
                let section = self.ar_start[i]..self.ar_end[i];
                for at in section {
                    if self.ar_index[at] == var_in {
                        self.ar_end[i] -= 1;
                        self.ar_index.swap(at, self.ar_end[i]);
                        self.ar_value.swap(at, self.ar_end[i]);
                        break;
                    }
                }
            }
        }
        if var_out < self.num_col {
            for k in self.start[var_out]..self.start[var_out + 1] {
                let i = self.index[k];
                let section = self.ar_end[i]..self.ar_start[i + 1];
                for at in section {
                    if self.ar_index[at] == var_out {
                        self.ar_index.swap(at, self.ar_end[i]);
                        self.ar_value.swap(at, self.ar_end[i]);
                        self.ar_end[i] += 1;
                        break;
                    }
                }
            }
        }
    }

    /// Column-wise PRICE: `result[j] = column_j . row_ep` for every
    /// column, including basic ones (the caller zeroes those).
    pub fn price_by_column(&self, result: &mut HVector, row_ep: &HVector) {
        debug_assert_eq!(self.format, MatrixFormat::Colwise);
        result.clear();
        for j in 0..self.num_col {
            let mut dot = 0.0;
            for k in self.start[j]..self.start[j + 1] {
                dot += self.value[k] * row_ep.array[self.index[k]];
            }
            if dot.abs() > TINY_VALUE {
                result.array[j] = dot;
                result.index.push(j);
            } else {
                result.array[j] = 0.0;
            }
        }
        result.count = result.index.len();
    }

    /// Hyper-sparse row-wise PRICE over the nonbasic partition.
    pub fn price_by_row_sparse(&self, result: &mut HVector, row_ep: &HVector) {
        self.price_by_row_with_switch(result, row_ep, 1.0);
    }

    /// Row-wise PRICE that abandons index tracking when the result grows
    /// beyond `switch_density` and completes with a dense scan.
    pub fn price_by_row_with_switch(
        &self,
        result: &mut HVector,
        row_ep: &HVector,
        switch_density: f64,
    ) {
        debug_assert!(self.has_price);
        result.clear();
        let mut track = true;
        let switch_count = (switch_density * self.num_col as f64) as usize;
        for k in 0..row_ep.count {
            let i = row_ep.index[k];
            let multiplier = row_ep.array[i];
            if multiplier == 0.0 {
                continue;
            }
            for at in self.ar_start[i]..self.ar_end[i] {
                let j = self.ar_index[at];
                let was_zero = result.array[j] == 0.0;
                result.array[j] += multiplier * self.ar_value[at];
                if track && was_zero {
                    result.index.push(j);
                }
            }
            if track && result.index.len() > switch_count {
                track = false;
            }
        }
        if track {
            // Small values from cancellation are cleaned out of the list
            let array = &mut result.array;
            result.index.retain(|&j| {
                if array[j].abs() > TINY_VALUE {
                    true
                } else {
                    array[j] = 0.0;
                    false
                }
            });
            result.count = result.index.len();
        } else {
            result.reindex();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_matrix() -> SparseMatrix {
        // [[1, 0, 2],
        //  [0, 3, 4]]
        let mut tri = sprs::TriMat::new((2, 3));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(1, 1, 3.0);
        tri.add_triplet(0, 2, 2.0);
        tri.add_triplet(1, 2, 4.0);
        SparseMatrix::from_csmat(&tri.to_csc())
    }

    #[test]
    fn test_from_csmat_shape() {
        let mat = small_matrix();
        assert_eq!(mat.num_row, 2);
        assert_eq!(mat.num_col, 3);
        assert_eq!(mat.num_nz(), 4);
        assert!(mat.dimensions_ok());
    }

    #[test]
    fn test_ensure_colwise_idempotent() {
        let mut mat = small_matrix();
        mat.ensure_rowwise();
        mat.ensure_colwise();
        let snapshot = (mat.start.clone(), mat.index.clone(), mat.value.clone());
        mat.ensure_colwise();
        assert_eq!(snapshot.0, mat.start);
        assert_eq!(snapshot.1, mat.index);
        assert_eq!(snapshot.2, mat.value);
    }

    #[test]
    fn test_transpose_round_trip() {
        let mut mat = small_matrix();
        let before = mat.to_csmat();
        mat.ensure_rowwise();
        mat.ensure_colwise();
        let after = mat.to_csmat();
        assert_eq!(before.to_dense(), after.to_dense());
    }

    #[test]
    fn test_get_row_both_formats() {
        let mut mat = small_matrix();
        let mut index = Vec::new();
        let mut value = Vec::new();
        mat.get_row(1, &mut index, &mut value);
        assert_eq!(index, vec![1, 2]);
        assert_eq!(value, vec![3.0, 4.0]);
        mat.ensure_rowwise();
        mat.get_row(1, &mut index, &mut value);
        assert_eq!(index, vec![1, 2]);
        assert_eq!(value, vec![3.0, 4.0]);
    }

    #[test]
    fn test_add_and_delete_cols_round_trip() {
        let mut mat = small_matrix();
        let reference = mat.to_csmat().to_dense();
        mat.add_cols(2, &[0, 1, 3], &[1, 0, 1], &[5.0, 6.0, 7.0]);
        assert_eq!(mat.num_col, 5);
        assert_eq!(mat.get_coefficient(1, 3), 5.0);
        assert_eq!(mat.get_coefficient(0, 4), 6.0);
        let delete = vec![false, false, false, true, true];
        mat.delete_cols(&delete);
        assert_eq!(mat.num_col, 3);
        assert_eq!(mat.to_csmat().to_dense(), reference);
    }

    #[test]
    fn test_add_rows_splices() {
        let mut mat = small_matrix();
        mat.add_rows(1, &[0, 2], &[0, 1], &[8.0, 9.0]);
        mat.ensure_colwise();
        assert_eq!(mat.num_row, 3);
        assert_eq!(mat.get_coefficient(2, 0), 8.0);
        assert_eq!(mat.get_coefficient(2, 1), 9.0);
        assert_eq!(mat.get_coefficient(2, 2), 0.0);
        assert!(mat.dimensions_ok());
    }

    #[test]
    fn test_delete_rows_renumbers() {
        let mut mat = small_matrix();
        mat.delete_rows(&[true, false]);
        assert_eq!(mat.num_row, 1);
        assert_eq!(mat.get_coefficient(0, 1), 3.0);
        assert_eq!(mat.get_coefficient(0, 2), 4.0);
        assert_eq!(mat.num_nz(), 2);
    }

    #[test]
    fn test_change_coefficient_small_deletes() {
        let mut mat = small_matrix();
        mat.change_coefficient(0, 0, 1e-12, 1e-9);
        assert_eq!(mat.get_coefficient(0, 0), 0.0);
        assert_eq!(mat.num_nz(), 3);
        mat.change_coefficient(1, 0, 5.0, 1e-9);
        assert_eq!(mat.get_coefficient(1, 0), 5.0);
        assert!(mat.dimensions_ok());
    }

    #[test]
    fn test_scale_round_trip() {
        let mut mat = small_matrix();
        let reference = mat.to_csmat().to_dense();
        mat.scale_col(2, 4.0);
        mat.scale_col(2, 0.25);
        mat.scale_row(1, -2.0);
        mat.scale_row(1, -0.5);
        assert_eq!(mat.to_csmat().to_dense(), reference);
    }

    #[test]
    fn test_assess_rejects_duplicates() {
        let mut mat = SparseMatrix::new(2, 1);
        mat.start = vec![0, 2];
        mat.index = vec![0, 0];
        mat.value = vec![1.0, 2.0];
        assert!(mat.assess(1e-9, 1e15).is_err());
    }

    #[test]
    fn test_assess_drops_small() {
        let mut mat = SparseMatrix::new(2, 2);
        mat.start = vec![0, 2, 3];
        mat.index = vec![0, 1, 0];
        mat.value = vec![1.0, 1e-12, 2.0];
        assert!(mat.assess(1e-9, 1e15).is_ok());
        assert_eq!(mat.num_nz(), 2);
        assert_eq!(mat.get_coefficient(1, 0), 0.0);
        assert!(mat.dimensions_ok());
    }

    #[test]
    fn test_collect_aj_logical() {
        let mat = small_matrix();
        let mut vec = HVector::new(2);
        mat.collect_aj(&mut vec, 2, 1.0);
        assert_eq!(vec.array, vec![2.0, 4.0]);
        vec.clear();
        mat.collect_aj(&mut vec, 4, 1.0);
        assert_eq!(vec.array, vec![0.0, 1.0]);
    }

    #[test]
    fn test_price_row_and_column_agree() {
        let mut mat = small_matrix();
        // Columns 0 and 1 nonbasic, column 2 basic
        mat.setup_price(&[1, 1, 0, 0, 0]);
        let mut row_ep = HVector::new(2);
        row_ep.add(0, 2.0);
        row_ep.add(1, -1.0);

        let mut by_row = HVector::new(3);
        mat.price_by_row_sparse(&mut by_row, &row_ep);
        let mut by_col = HVector::new(3);
        mat.price_by_column(&mut by_col, &row_ep);

        // Row PRICE skips the basic column
        assert_eq!(by_row.array[0], 2.0);
        assert_eq!(by_row.array[1], -3.0);
        assert_eq!(by_row.array[2], 0.0);
        assert_eq!(by_col.array[0], 2.0);
        assert_eq!(by_col.array[1], -3.0);
        assert_eq!(by_col.array[2], 0.0);
    }

    #[test]
    fn test_price_update_moves_partition() {
        let mut mat = small_matrix();
        mat.setup_price(&[1, 1, 0, 0, 0]);
        // Column 1 enters the basis, column 2 leaves
        mat.update(1, 2);
        let mut row_ep = HVector::new(2);
        row_ep.add(1, 1.0);
        let mut result = HVector::new(3);
        mat.price_by_row_sparse(&mut result, &row_ep);
        assert_eq!(result.array[1], 0.0);
        assert_eq!(result.array[2], 4.0);
    }
}
