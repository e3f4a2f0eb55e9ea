//! Spatial text index over positioned glyphs.
//!
//! `hotgrid` takes the output of a page-layout analyzer (one positioned glyph
//! per drawn character) and indexes each page into a sparse character grid,
//! a per-character occurrence index and a table of text runs. On top of that
//! it answers three kinds of queries:
//!
//! - substring search that tolerates the natural spacing between glyphs,
//! - text extraction from an arbitrary bounding box,
//! - lookup of the full run a matched substring belongs to.
//!
//! # Pipeline
//!
//! ```text
//! PageLayout  ->  PageIndex::build  ->  GridStore / OccurrenceIndex / SpanTable
//!                                          |
//! query  ->  matcher::filter_adjacent  <---+--->  extract_text / spans_in
//! ```
//!
//! Reading and decoding the document itself is the analyzer's job; this
//! crate never touches raw document bytes.
//!
//! # Example
//!
//! ```rust
//! use hotgrid::{Document, DocumentOptions, FindOptions, Glyph, PageLayout};
//!
//! let mut layout = PageLayout::new(612.0, 792.0);
//! for (i, ch) in "DEGREE".chars().enumerate() {
//!     let x = 72.0 + 6.0 * i as f64;
//!     layout.push(Glyph::new(ch.to_string(), x, x + 5.5, 700.0).in_run("line-0"));
//! }
//!
//! let document = Document::from_layouts(&[layout], DocumentOptions::default()).unwrap();
//! let found = document.find_text("DEGREE", &FindOptions::default()).unwrap();
//! assert_eq!(found[&0].len(), 1);
//! ```

use thiserror::Error;

pub mod document;
pub mod grid;
pub mod matcher;
pub mod occurrence;
pub mod options;
pub mod page;
pub mod span;
pub mod types;

pub use document::{Document, PageResult, SearchResult};
pub use grid::{GridError, GridStore};
pub use occurrence::OccurrenceIndex;
pub use options::*;
pub use page::PageIndex;
pub use span::{Span, SpanError, SpanTable};
pub use types::*;

#[derive(Debug, Error)]
pub enum HotgridError {
    #[error("Invalid page number: {0}")]
    InvalidPage(usize),
    #[error("Invalid coordinates: ({x0}, {y0}, {x1}, {y1})")]
    InvalidCoordinates { x0: i64, y0: i64, x1: i64, y1: i64 },
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Layout parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
