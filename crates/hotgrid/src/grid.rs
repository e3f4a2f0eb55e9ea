//! Sparse character grid of a single page.
//!
//! Only occupied cells are stored. A letter-sized page quantized to points
//! already spans roughly half a million cells while a dense page rarely
//! occupies more than a few thousand of them, so blank cells cost nothing.
//! Cells are kept in row-major order which turns row extraction into a range
//! scan.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::options::CoordinatePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Grid index out of range: ({row}, {column})")]
    NegativeIndex { row: i64, column: i64 },
    #[error("Grid index too large: ({row}, {column})")]
    Overflow { row: i64, column: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct GridStore {
    cells: BTreeMap<(u32, u32), String>,
    rows: u32,
    columns: u32,
    policy: CoordinatePolicy,
}

impl GridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CoordinatePolicy) -> Self {
        GridStore {
            policy,
            ..Self::default()
        }
    }

    /// Pre-size the tracked bounds. Bounds only ever grow.
    pub fn with_bounds(mut self, rows: u32, columns: u32) -> Self {
        self.rows = self.rows.max(rows);
        self.columns = self.columns.max(columns);
        self
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn policy(&self) -> CoordinatePolicy {
        self.policy
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write `value` into `(row, column)`.
    ///
    /// Empty values only grow the bounds. A later write to an occupied cell
    /// replaces the earlier value.
    pub fn insert(&mut self, value: &str, row: i64, column: i64) -> Result<(), GridError> {
        if self.is_negative(row, column, "insert")? {
            return Ok(());
        }
        let (Ok(r), Ok(c)) = (u32::try_from(row), u32::try_from(column)) else {
            return Err(GridError::Overflow { row, column });
        };
        // Bounds are exclusive, so the largest writable index is u32::MAX - 1.
        let (Some(row_bound), Some(column_bound)) = (r.checked_add(1), c.checked_add(1)) else {
            return Err(GridError::Overflow { row, column });
        };

        self.rows = self.rows.max(row_bound);
        self.columns = self.columns.max(column_bound);
        if !value.is_empty() {
            self.cells.insert((r, c), value.to_string());
        }
        Ok(())
    }

    /// Value stored at `(row, column)`, or `""` for a blank cell.
    ///
    /// Reads past the tracked bounds are blank, not errors.
    pub fn get(&self, row: i64, column: i64) -> Result<&str, GridError> {
        if self.is_negative(row, column, "get")? {
            return Ok("");
        }
        let (Ok(r), Ok(c)) = (u32::try_from(row), u32::try_from(column)) else {
            return Ok("");
        };
        Ok(self.cells.get(&(r, c)).map(String::as_str).unwrap_or(""))
    }

    /// Occupied values of `row` whose column falls in `columns`, left to right.
    pub fn row_values(
        &self,
        row: u32,
        columns: RangeInclusive<u32>,
    ) -> impl Iterator<Item = &str> + '_ {
        let (start, end) = columns.into_inner();
        let range = if start <= end {
            Some(self.cells.range((row, start)..=(row, end)))
        } else {
            None
        };
        range
            .into_iter()
            .flatten()
            .map(|(_, value)| value.as_str())
    }

    /// Occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &str)> + '_ {
        self.cells.iter().map(|(&cell, value)| (cell, value.as_str()))
    }

    /// `Ok(true)` when the coordinate is negative and the policy says skip.
    fn is_negative(&self, row: i64, column: i64, op: &str) -> Result<bool, GridError> {
        if row >= 0 && column >= 0 {
            return Ok(false);
        }
        match self.policy {
            CoordinatePolicy::Reject => Err(GridError::NegativeIndex { row, column }),
            CoordinatePolicy::Skip => {
                log::warn!("Skipping grid {op} at negative index ({row}, {column})");
                Ok(true)
            }
        }
    }
}
