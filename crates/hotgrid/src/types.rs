use std::fmt;

use serde::{Deserialize, Serialize};

use crate::HotgridError;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle of a [`CharRecord`] inside a page's record arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharId(u32);

impl CharId {
    pub fn new(index: u32) -> Self {
        CharId(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Page-local identifier of a span.
///
/// Run ids are handed out sequentially while a page is ingested, in order of
/// first appearance, so they are only meaningful within their own page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(u32);

impl RunId {
    pub fn new(id: u32) -> Self {
        RunId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Records and geometry
// ---------------------------------------------------------------------------

/// One glyph placed on the page grid.
///
/// `x` and `x_end` are the quantized left and right columns, `y` is the row
/// counted from the top of the page. `x_end - x` is the glyph width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRecord {
    pub value: String,
    pub x: u32,
    pub y: u32,
    pub x_end: u32,
    pub run_id: Option<RunId>,
}

impl CharRecord {
    pub fn new(value: impl Into<String>, x: u32, y: u32, x_end: u32, run_id: Option<RunId>) -> Self {
        CharRecord {
            value: value.into(),
            x,
            y,
            x_end: x_end.max(x),
            run_id,
        }
    }

    pub fn width(&self) -> u32 {
        self.x_end - self.x
    }

    /// Both records belong to the same known run.
    pub fn shares_run(&self, other: &CharRecord) -> bool {
        matches!((self.run_id, other.run_id), (Some(a), Some(b)) if a == b)
    }
}

/// An axis-aligned box in grid coordinates, inclusive on every edge.
///
/// `run_id` carries the run of the first record the box was computed from,
/// so callers can jump from a matched fragment to its parent span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

impl BBox {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        BBox {
            x0,
            y0,
            x1,
            y1,
            run_id: None,
        }
    }

    pub fn with_run(mut self, run_id: Option<RunId>) -> Self {
        self.run_id = run_id;
        self
    }

    /// Overlap test where touching edges count as intersecting.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(other.x0 > self.x1 || other.x1 < self.x0 || other.y0 > self.y1 || other.y1 < self.y0)
    }

    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }
}

impl From<(i64, i64, i64, i64)> for BBox {
    fn from((x0, y0, x1, y1): (i64, i64, i64, i64)) -> Self {
        BBox::new(x0, y0, x1, y1)
    }
}

// ---------------------------------------------------------------------------
// Layout analyzer input
// ---------------------------------------------------------------------------

/// A positioned glyph as reported by the layout analyzer.
///
/// Coordinates are in the analyzer's native space: points, origin at the
/// bottom-left corner of the page. `y0` is the glyph's bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    /// Line or fragment identifier assigned by the analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Inter-word space inferred by the analyzer rather than drawn on the page.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl Glyph {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, y0: f64) -> Self {
        Glyph {
            text: text.into(),
            x0,
            x1,
            y0,
            run: None,
            synthetic: false,
        }
    }

    pub fn in_run(mut self, run: impl Into<String>) -> Self {
        self.run = Some(run.into());
        self
    }

    /// A synthetic space belonging to `run`. Its coordinates are ignored.
    pub fn synthetic_space(run: impl Into<String>) -> Self {
        Glyph {
            text: " ".to_string(),
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            run: Some(run.into()),
            synthetic: true,
        }
    }
}

/// One page worth of analyzer output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
}

impl PageLayout {
    pub fn new(width: f64, height: f64) -> Self {
        PageLayout {
            width: Some(width),
            height: Some(height),
            glyphs: Vec::new(),
        }
    }

    pub fn push(&mut self, glyph: Glyph) {
        self.glyphs.push(glyph);
    }

    /// Parse a single page layout from its JSON dump.
    pub fn from_json(json: &str) -> Result<Self, HotgridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a JSON array of page layouts, one entry per page.
    pub fn many_from_json(json: &str) -> Result<Vec<Self>, HotgridError> {
        Ok(serde_json::from_str(json)?)
    }
}
