//! Tunables for ingestion, matching and document-level extraction.
//!
//! Every options struct implements [`Default`] with the values the index is
//! calibrated for and deserializes with `#[serde(default)]`, so a partial
//! JSON object only overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::HotgridError;

/// Maximum on-row gap between two adjacent characters.
pub const DEFAULT_BASE_DISTANCE: i64 = 5;

/// Extra gap tolerated when both characters belong to the same run.
pub const DEFAULT_SPAN_TOLERANCE: i64 = 5;

/// Horizontal precision of the source coordinates. Extraction boxes are
/// widened by `1 / precision` columns on both sides.
pub const DEFAULT_PRECISION: f64 = 0.75;

/// Additional columns added to the right edge of extraction boxes.
pub const DEFAULT_EXTRACTION_TOLERANCE: i64 = 4;

/// Minimum gap, in columns, before a synthetic space is materialized.
pub const DEFAULT_MIN_SPACE_GAP: u32 = 1;

/// What the grid does with a negative coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatePolicy {
    /// Fail with [`crate::grid::GridError::NegativeIndex`].
    #[default]
    Reject,
    /// Log a warning and treat the cell as blank.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Drop runs whose characters repeat an earlier run of the same page.
    pub drop_duplicate_runs: bool,
    /// Materialize the analyzer's synthetic inter-word spaces.
    pub include_synthetic_spaces: bool,
    pub min_space_gap: u32,
    pub coordinate_policy: CoordinatePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            drop_duplicate_runs: true,
            include_synthetic_spaces: true,
            min_space_gap: DEFAULT_MIN_SPACE_GAP,
            coordinate_policy: CoordinatePolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub base_distance: i64,
    pub span_tolerance: i64,
}

impl MatchOptions {
    /// Largest accepted gap between two characters, depending on whether
    /// they share a run.
    pub fn max_distance(&self, same_run: bool) -> i64 {
        if same_run {
            self.base_distance.saturating_add(self.span_tolerance)
        } else {
            self.base_distance
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), HotgridError> {
        if self.base_distance < 0 || self.span_tolerance < 0 {
            return Err(HotgridError::InvalidOptions(format!(
                "distances must not be negative, got base_distance {} and span_tolerance {}",
                self.base_distance, self.span_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            base_distance: DEFAULT_BASE_DISTANCE,
            span_tolerance: DEFAULT_SPAN_TOLERANCE,
        }
    }
}

/// Options for [`crate::Document::find_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindOptions {
    /// Pages to search. Empty means every page.
    pub pages: Vec<usize>,
    /// Re-extract each match from the grid and keep it only if the text
    /// still contains the query.
    pub validate: bool,
    /// Replace every match by the full span it belongs to.
    pub take_span: bool,
    pub matcher: MatchOptions,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            validate: true,
            take_span: false,
            matcher: MatchOptions::default(),
        }
    }
}

impl FindOptions {
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = usize>) -> Self {
        self.pages = pages.into_iter().collect();
        self
    }

    pub fn with_span(mut self, take_span: bool) -> Self {
        self.take_span = take_span;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    pub precision: f64,
    pub extraction_tolerance: i64,
    pub load: LoadOptions,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            extraction_tolerance: DEFAULT_EXTRACTION_TOLERANCE,
            load: LoadOptions::default(),
        }
    }
}

impl DocumentOptions {
    pub fn validate(&self) -> Result<(), HotgridError> {
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(HotgridError::InvalidOptions(format!(
                "precision must be a positive number, got {}",
                self.precision
            )));
        }
        if self.extraction_tolerance < 0 {
            return Err(HotgridError::InvalidOptions(format!(
                "extraction_tolerance must not be negative, got {}",
                self.extraction_tolerance
            )));
        }
        Ok(())
    }

    /// Columns added on each side of an extraction box.
    pub fn padding(&self) -> f64 {
        1.0 / self.precision
    }
}
