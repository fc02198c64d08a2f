//! Rectangular view of retained leaf records and the column walk that
//! replaces raw module numbers with synthetic cluster ids.

use std::collections::HashSet;

use tracing::debug;

use super::record::LeafRecord;
use crate::{IdAllocator, Result, Violation};

/// Padding sentinel: the row's leaf attaches above this column.
pub const PADDING: u64 = 0;

/// One row of a [`PathMatrix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRow {
    path: Vec<u64>,
    leaf: u64,
}

impl PathRow {
    /// Raw module numbers, padded with [`PADDING`] to the matrix width.
    #[must_use]
    pub fn path(&self) -> &[u64] {
        &self.path
    }

    /// Original leaf identifier (the trailing column).
    #[must_use]
    pub const fn leaf(&self) -> u64 {
        self.leaf
    }

    /// Number of leading non-padded path cells.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path
            .iter()
            .position(|&cell| cell == PADDING)
            .unwrap_or(self.path.len())
    }

    fn prefix(&self, column: usize) -> &[u64] {
        self.path.get(..=column).unwrap_or(&self.path)
    }
}

/// Retained records laid out as rows of equal width.
///
/// Everything after the first [`PADDING`] cell of a path is dropped, since
/// descent stops there.
///
/// # Examples
/// ```
/// use clustree_core::{LeafRecord, PathMatrix};
///
/// let matrix = PathMatrix::from_records(&[
///     LeafRecord::new(vec![1, 2], 0.4, 10),
///     LeafRecord::new(vec![3], 0.2, 11),
/// ]);
/// assert_eq!(matrix.width(), 2);
/// assert_eq!(matrix.rows()[1].path(), &[3, 0]);
/// assert_eq!(matrix.max_leaf(), Some(11));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatrix {
    width: usize,
    rows: Vec<PathRow>,
}

impl PathMatrix {
    /// Builds the matrix from records that are already filtered.
    #[must_use]
    pub fn from_records(records: &[LeafRecord]) -> Self {
        let width = records
            .iter()
            .map(|record| record.path().len())
            .max()
            .unwrap_or(0);
        let rows = records
            .iter()
            .map(|record| {
                let mut path: Vec<u64> = record
                    .path()
                    .iter()
                    .copied()
                    .take_while(|&cell| cell != PADDING)
                    .collect();
                path.resize(width, PADDING);
                PathRow {
                    path,
                    leaf: record.leaf_id(),
                }
            })
            .collect();
        Self { width, rows }
    }

    /// Number of path columns, excluding the leaf column.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[PathRow] {
        &self.rows
    }

    /// Largest leaf identifier, or `None` for an empty matrix.
    #[must_use]
    pub fn max_leaf(&self) -> Option<u64> {
        self.rows.iter().map(PathRow::leaf).max()
    }

    /// Assigns a synthetic id to every non-padded cell, deepest column first.
    ///
    /// Within a column, contiguous rows that share the same ancestor prefix
    /// form one run and share one id; each new run takes the next id from
    /// `ids`. A run whose prefix already closed earlier in the same column is
    /// reported through `on_violation` and still receives a fresh id.
    ///
    /// The returned vector holds, per row, the ids of its ancestors from the
    /// shallowest to the deepest.
    pub(crate) fn assign(
        &self,
        ids: &mut IdAllocator,
        mut on_violation: impl FnMut(Violation) -> Result<()>,
    ) -> Result<Vec<Vec<u64>>> {
        let mut assigned: Vec<Vec<u64>> = self
            .rows
            .iter()
            .map(|row| vec![PADDING; row.depth()])
            .collect();

        for column in (0..self.width).rev() {
            let mut current: Option<(&[u64], u64)> = None;
            let mut closed: HashSet<&[u64]> = HashSet::new();
            let mut runs = 0_usize;

            for (index, (row, slots)) in self.rows.iter().zip(assigned.iter_mut()).enumerate() {
                let Some(slot) = slots.get_mut(column) else {
                    continue;
                };
                let prefix = row.prefix(column);
                let id = match current {
                    Some((open, id)) if open == prefix => id,
                    previous => {
                        if let Some((open, _)) = previous {
                            closed.insert(open);
                        }
                        if closed.contains(prefix) {
                            on_violation(Violation::ScatteredGroup { column, row: index })?;
                        }
                        runs += 1;
                        ids.allocate()?
                    }
                };
                *slot = id;
                current = Some((prefix, id));
            }

            debug!(column, runs, "assigned cluster ids to path column");
        }

        Ok(assigned)
    }
}
