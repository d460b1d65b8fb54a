//! `SparseMatrix<T>` — a dense-addressable sparse container.
//!
//! # Data layout
//!
//! Cells are stored in a `BTreeMap<u32, T>` keyed by the linear index
//! `i·cols + j`.  The sorted map (rather than a hash map) is deliberate:
//! every iteration — full scans, row ranges, exports — visits cells in
//! ascending linear order, so downstream consumers that sample or serialize
//! from matrix views stay reproducible run to run.
//!
//! # Row access
//!
//! A row occupies the contiguous key range `[i·cols, (i+1)·cols)`, so
//! [`row_entries`](SparseMatrix::row_entries) is a `BTreeMap` range scan:
//! O(log n + k) for k populated cells, no allocation.

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use crate::error::{MatrixError, MatrixResult};

/// A sparse `rows × cols` matrix over a `u32` index space.
///
/// Absent cells read as `T::default()`.  The total addressable size
/// `rows · cols` must fit the `u32` key space.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseMatrix<T> {
    cells: BTreeMap<u32, T>,
    rows: u32,
    cols: u32,
}

impl<T> SparseMatrix<T> {
    /// An empty `rows × cols` matrix.
    pub fn new(rows: u32, cols: u32) -> Self {
        debug_assert!(
            rows as u64 * cols as u64 <= u32::MAX as u64 + 1,
            "matrix size exceeds the u32 index space"
        );
        Self { cells: BTreeMap::new(), rows, cols }
    }

    /// An empty column vector of `len` rows.
    pub fn column(len: u32) -> Self {
        Self::new(len, 1)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Maximum number of addressable cells (`rows · cols`).
    pub fn max_len(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Drop every cell and set both dimensions to zero.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.rows = 0;
        self.cols = 0;
    }

    /// Iterate all populated cells as `(linear_index, &value)` in ascending
    /// linear order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.cells.iter().map(|(&k, v)| (k, v))
    }

    // ── Index checks ──────────────────────────────────────────────────────

    fn linear(&self, i: u32, j: u32) -> MatrixResult<u32> {
        if i >= self.rows || j >= self.cols {
            return Err(MatrixError::OutOfRange {
                index: i as u64 * self.cols as u64 + j as u64,
                max: self.max_len().saturating_sub(1),
            });
        }
        Ok(i * self.cols + j)
    }

    fn check_shape(&self, other_rows: u32, other_cols: u32) -> MatrixResult<()> {
        if self.rows != other_rows || self.cols != other_cols {
            return Err(MatrixError::DimensionMismatch {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other_rows,
                rhs_cols: other_cols,
            });
        }
        Ok(())
    }

    fn require_square(&self) -> MatrixResult<()> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare { rows: self.rows, cols: self.cols });
        }
        Ok(())
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert a value at `(i, j)`.  Fails if the cell is already occupied.
    pub fn insert(&mut self, i: u32, j: u32, value: T) -> MatrixResult<()> {
        let key = self.linear(i, j)?;
        if self.cells.contains_key(&key) {
            return Err(MatrixError::Duplicate { index: key });
        }
        self.cells.insert(key, value);
        Ok(())
    }

    /// Insert a value at `(i, j)`, overwriting any existing cell.
    pub fn insert_or_assign(&mut self, i: u32, j: u32, value: T) -> MatrixResult<()> {
        let key = self.linear(i, j)?;
        self.cells.insert(key, value);
        Ok(())
    }

    /// Remove the cell at `(i, j)`.
    pub fn erase(&mut self, i: u32, j: u32) -> MatrixResult<()> {
        let key = self.linear(i, j)?;
        self.cells
            .remove(&key)
            .map(|_| ())
            .ok_or(MatrixError::NotFound { index: key })
    }

    /// Remove row `i`, re-keying every surviving cell and decrementing the
    /// row count.
    pub fn erase_row(&mut self, i: u32) -> MatrixResult<()> {
        if i >= self.rows {
            return Err(MatrixError::OutOfRange {
                index: i as u64,
                max: self.rows.saturating_sub(1) as u64,
            });
        }
        let cols = self.cols;
        let old = std::mem::take(&mut self.cells);
        for (key, value) in old {
            match (key / cols).cmp(&i) {
                std::cmp::Ordering::Less => {
                    self.cells.insert(key, value);
                }
                std::cmp::Ordering::Equal => {} // dropped with the row
                std::cmp::Ordering::Greater => {
                    self.cells.insert(key - cols, value);
                }
            }
        }
        self.rows -= 1;
        Ok(())
    }

    /// Remove column `j`, re-keying every surviving cell and decrementing the
    /// column count.
    pub fn erase_column(&mut self, j: u32) -> MatrixResult<()> {
        if j >= self.cols {
            return Err(MatrixError::OutOfRange {
                index: j as u64,
                max: self.cols.saturating_sub(1) as u64,
            });
        }
        let cols = self.cols;
        let old = std::mem::take(&mut self.cells);
        for (key, value) in old {
            let (row, col) = (key / cols, key % cols);
            match col.cmp(&j) {
                std::cmp::Ordering::Less => {
                    self.cells.insert(row * (cols - 1) + col, value);
                }
                std::cmp::Ordering::Equal => {} // dropped with the column
                std::cmp::Ordering::Greater => {
                    self.cells.insert(row * (cols - 1) + col - 1, value);
                }
            }
        }
        self.cols -= 1;
        Ok(())
    }

    /// Drop every cell of row `i` without resizing.
    pub fn empty_row(&mut self, i: u32) -> MatrixResult<()> {
        if i >= self.rows {
            return Err(MatrixError::OutOfRange {
                index: i as u64,
                max: self.rows.saturating_sub(1) as u64,
            });
        }
        let keys: Vec<u32> = self.row_keys(i).collect();
        for key in keys {
            self.cells.remove(&key);
        }
        Ok(())
    }

    /// Drop every cell of column `j` without resizing.
    pub fn empty_column(&mut self, j: u32) -> MatrixResult<()> {
        if j >= self.cols {
            return Err(MatrixError::OutOfRange {
                index: j as u64,
                max: self.cols.saturating_sub(1) as u64,
            });
        }
        let cols = self.cols;
        self.cells.retain(|&key, _| key % cols != j);
        Ok(())
    }

    /// Reassign the dimensions.  Cells whose old linear index falls outside
    /// the new extent are dropped; survivors recover their `(i, j)` position
    /// with the *old* column count and are re-encoded with the new one
    /// (re-encodings that land out of range are dropped too, last writer
    /// wins on collisions).
    pub fn reshape(&mut self, rows: u32, cols: u32) {
        debug_assert!(
            rows as u64 * cols as u64 <= u32::MAX as u64 + 1,
            "matrix size exceeds the u32 index space"
        );
        let old_cols = self.cols;
        let new_max = rows as u64 * cols as u64;
        let old = std::mem::take(&mut self.cells);
        self.rows = rows;
        self.cols = cols;
        for (key, value) in old {
            if (key as u64) >= new_max {
                continue;
            }
            let (i, j) = if old_cols == 0 {
                (key, 0)
            } else {
                (key / old_cols, key % old_cols)
            };
            let new_key = i as u64 * cols as u64 + j as u64;
            if new_key < new_max {
                self.cells.insert(new_key as u32, value);
            }
        }
    }

    // ── Row / column ranges ───────────────────────────────────────────────

    /// Linear keys of the populated cells of row `i`, ascending.
    fn row_keys(&self, i: u32) -> impl Iterator<Item = u32> + '_ {
        let start = i as u64 * self.cols as u64;
        let end = start + self.cols as u64;
        self.cells
            .range(start as u32..)
            .take_while(move |(&k, _)| (k as u64) < end)
            .map(|(&k, _)| k)
    }

    /// Populated cells of row `i` as `(column, &value)` in ascending column
    /// order.
    pub fn row_entries(&self, i: u32) -> MatrixResult<impl Iterator<Item = (u32, &T)>> {
        if i >= self.rows {
            return Err(MatrixError::OutOfRange {
                index: i as u64,
                max: self.rows.saturating_sub(1) as u64,
            });
        }
        let start = i as u64 * self.cols as u64;
        let end = start + self.cols as u64;
        Ok(self
            .cells
            .range(start as u32..)
            .take_while(move |(&k, _)| (k as u64) < end)
            .map(move |(&k, v)| ((k as u64 - start) as u32, v)))
    }
}

impl<T: Copy + Default> SparseMatrix<T> {
    /// Value at `(i, j)` — `T::default()` when the cell is unpopulated.
    pub fn get(&self, i: u32, j: u32) -> MatrixResult<T> {
        let key = self.linear(i, j)?;
        Ok(self.cells.get(&key).copied().unwrap_or_default())
    }

    /// Value at a linear index.
    pub fn get_linear(&self, index: u32) -> MatrixResult<T> {
        if (index as u64) >= self.max_len() {
            return Err(MatrixError::OutOfRange {
                index: index as u64,
                max: self.max_len().saturating_sub(1),
            });
        }
        Ok(self.cells.get(&index).copied().unwrap_or_default())
    }

    /// `true` if the cell at `(i, j)` is populated.
    pub fn contains(&self, i: u32, j: u32) -> MatrixResult<bool> {
        let key = self.linear(i, j)?;
        Ok(self.cells.contains_key(&key))
    }

    /// Insert at `(i, j)`, growing both dimensions symmetrically (row-only
    /// for column vectors) when the cell does not fit.  The growth is
    /// `max(i − rows, j − cols)`, plus one if the new cell still would not
    /// fit.
    pub fn insert_and_expand(&mut self, i: u32, j: u32, value: T) {
        if i >= self.rows || j >= self.cols {
            let mut delta = (i.saturating_sub(self.rows)).max(j.saturating_sub(self.cols));
            if self.cols == 1 && j == 0 {
                if i >= self.rows + delta {
                    delta += 1;
                }
                self.reshape(self.rows + delta, 1);
            } else {
                if i >= self.rows + delta || j >= self.cols + delta {
                    delta += 1;
                }
                self.reshape(self.rows + delta, self.cols + delta);
            }
        }
        self.cells.insert(i * self.cols + j, value);
    }

    /// Row `i` as a `1 × cols` matrix.  With `keep_index` the result keeps
    /// the full dimensions of `self` with only row `i` populated.
    pub fn row(&self, i: u32, keep_index: bool) -> MatrixResult<SparseMatrix<T>> {
        if i >= self.rows {
            return Err(MatrixError::OutOfRange {
                index: i as u64,
                max: self.rows.saturating_sub(1) as u64,
            });
        }
        let mut out = if keep_index {
            SparseMatrix::new(self.rows, self.cols)
        } else {
            SparseMatrix::new(1, self.cols)
        };
        for key in self.row_keys(i) {
            let value = self.cells[&key];
            let out_key = if keep_index { key } else { key % self.cols };
            out.cells.insert(out_key, value);
        }
        Ok(out)
    }

    /// Column `j` as a `rows × 1` matrix.  With `keep_index` the result
    /// keeps the full dimensions of `self` with only column `j` populated.
    pub fn col(&self, j: u32, keep_index: bool) -> MatrixResult<SparseMatrix<T>> {
        if j >= self.cols {
            return Err(MatrixError::OutOfRange {
                index: j as u64,
                max: self.cols.saturating_sub(1) as u64,
            });
        }
        let mut out = if keep_index {
            SparseMatrix::new(self.rows, self.cols)
        } else {
            SparseMatrix::new(self.rows, 1)
        };
        for (&key, &value) in &self.cells {
            if key % self.cols == j {
                let out_key = if keep_index { key } else { key / self.cols };
                out.cells.insert(out_key, value);
            }
        }
        Ok(out)
    }

    /// The transpose.
    pub fn transpose(&self) -> SparseMatrix<T> {
        let mut out = SparseMatrix::new(self.cols, self.rows);
        for (&key, &value) in &self.cells {
            let (i, j) = (key / self.cols, key % self.cols);
            out.cells.insert(j * self.rows + i, value);
        }
        out
    }

    /// Non-zero count of each row as a `rows × 1` vector.  Square only.
    pub fn degree_vector(&self) -> MatrixResult<SparseMatrix<u32>> {
        self.require_square()?;
        let mut out = SparseMatrix::column(self.rows);
        for &key in self.cells.keys() {
            let i = key / self.cols;
            let d = out.cells.get(&i).copied().unwrap_or(0);
            out.cells.insert(i, d + 1);
        }
        Ok(out)
    }

    /// The Laplacian `Diag(degree) − A` of the adjacency pattern.  Square
    /// only.
    pub fn laplacian(&self) -> MatrixResult<SparseMatrix<i64>> {
        self.require_square()?;
        let mut out = SparseMatrix::new(self.rows, self.cols);
        for &key in self.cells.keys() {
            out.cells.insert(key, -1);
        }
        let degree = self.degree_vector()?;
        for i in 0..self.rows {
            out.cells.insert(i * self.cols + i, degree.get(i, 0)? as i64);
        }
        Ok(out)
    }
}

impl<T: Copy + Default + Into<f64>> SparseMatrix<T> {
    /// Sum of each row's values as a `rows × 1` vector.  Square only.
    pub fn strength_vector(&self) -> MatrixResult<SparseMatrix<f64>> {
        self.require_square()?;
        let mut out = SparseMatrix::column(self.rows);
        for (&key, &value) in &self.cells {
            let i = key / self.cols;
            let s = out.cells.get(&i).copied().unwrap_or(0.0);
            out.cells.insert(i, s + value.into());
        }
        Ok(out)
    }

    /// Every cell divided by the L1 norm of its row.  Rows whose norm is
    /// below machine epsilon divide by 1 instead, preserving the entries.
    pub fn norm_rows(&self) -> SparseMatrix<f64> {
        let mut out = SparseMatrix::new(self.rows, self.cols);
        for i in 0..self.rows {
            let keys: Vec<u32> = self.row_keys(i).collect();
            let mut sum: f64 = keys
                .iter()
                .map(|k| Into::<f64>::into(self.cells[k]).abs())
                .sum();
            if sum < f64::EPSILON {
                sum = 1.0;
            }
            for key in keys {
                out.cells.insert(key, Into::<f64>::into(self.cells[&key]) / sum);
            }
        }
        out
    }

    /// Every cell divided by the L1 norm of its column.  Columns whose norm
    /// is below machine epsilon divide by 1 instead.
    pub fn norm_cols(&self) -> SparseMatrix<f64> {
        let mut sums = vec![0.0f64; self.cols as usize];
        for (&key, &value) in &self.cells {
            sums[(key % self.cols) as usize] += Into::<f64>::into(value).abs();
        }
        for sum in &mut sums {
            if *sum < f64::EPSILON {
                *sum = 1.0;
            }
        }
        let mut out = SparseMatrix::new(self.rows, self.cols);
        for (&key, &value) in &self.cells {
            out.cells
                .insert(key, Into::<f64>::into(value) / sums[(key % self.cols) as usize]);
        }
        out
    }
}

impl<T: Copy + Default + Add<Output = T>> SparseMatrix<T> {
    /// Cell-wise sum.  Fails on shape mismatch.
    pub fn try_add(&self, other: &SparseMatrix<T>) -> MatrixResult<SparseMatrix<T>> {
        self.check_shape(other.rows, other.cols)?;
        let mut out = self.clone();
        for (&key, &value) in &other.cells {
            let sum = out.cells.get(&key).copied().unwrap_or_default() + value;
            out.cells.insert(key, sum);
        }
        Ok(out)
    }

    /// Add the transpose in place.  Fails on shape mismatch (non-square).
    pub fn symmetrize(&mut self) -> MatrixResult<()> {
        *self = self.try_add(&self.transpose())?;
        Ok(())
    }
}

impl<T: Copy + Default + Sub<Output = T>> SparseMatrix<T> {
    /// Cell-wise difference.  Fails on shape mismatch.
    pub fn try_sub(&self, other: &SparseMatrix<T>) -> MatrixResult<SparseMatrix<T>> {
        self.check_shape(other.rows, other.cols)?;
        let mut out = self.clone();
        for (&key, &value) in &other.cells {
            let diff = out.cells.get(&key).copied().unwrap_or_default() - value;
            out.cells.insert(key, diff);
        }
        Ok(out)
    }
}
