//! Queryable state of a single page.
//!
//! A [`PageIndex`] owns the record arena plus the three structures that
//! reference it by [`CharId`]:
//!
//! | Structure            | Key                | Used for                      |
//! |----------------------|--------------------|-------------------------------|
//! | [`GridStore`]        | `(row, column)`    | bounding-box text extraction  |
//! | [`OccurrenceIndex`]  | character value    | candidate lists for matching  |
//! | [`SpanTable`]        | [`RunId`]          | full-run lookup               |
//!
//! Pages are built once and are read-only afterwards.

pub(crate) mod ingest;

use std::fmt;

use crate::grid::GridStore;
use crate::matcher;
use crate::occurrence::OccurrenceIndex;
use crate::options::{CoordinatePolicy, LoadOptions, MatchOptions};
use crate::span::{Span, SpanTable};
use crate::types::{BBox, CharId, CharRecord, PageLayout, RunId};

#[derive(Debug, Clone)]
pub struct PageIndex {
    records: Vec<CharRecord>,
    grid: GridStore,
    occurrences: OccurrenceIndex,
    spans: SpanTable,
    width: u32,
    height: u32,
}

impl PageIndex {
    /// Index one page of analyzer output.
    ///
    /// Glyphs that cannot be placed on the grid are logged and skipped.
    pub fn build(layout: &PageLayout, options: &LoadOptions) -> Self {
        ingest::Ingestor::run(layout, options)
    }

    pub(crate) fn empty(policy: CoordinatePolicy) -> Self {
        PageIndex {
            records: Vec::new(),
            grid: GridStore::with_policy(policy),
            occurrences: OccurrenceIndex::new(),
            spans: SpanTable::new(),
            width: 0,
            height: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn occurrences(&self) -> &OccurrenceIndex {
        &self.occurrences
    }

    pub fn spans(&self) -> &SpanTable {
        &self.spans
    }

    pub fn records(&self) -> &[CharRecord] {
        &self.records
    }

    pub fn record(&self, id: CharId) -> Option<&CharRecord> {
        self.records.get(id.index())
    }

    pub fn resolve(&self, ids: &[CharId]) -> Vec<&CharRecord> {
        ids.iter().filter_map(|&id| self.record(id)).collect()
    }

    pub fn span(&self, run_id: Option<RunId>) -> Option<Span<'_>> {
        self.spans.get(run_id, &self.records)
    }

    pub fn span_count(&self) -> usize {
        self.spans.count()
    }

    /// Text inside the inclusive box `[x0, x1] x [y0, y1]`.
    ///
    /// Every row that holds at least one character becomes one line ending in
    /// `\n`; blank rows are left out. Parts of the box outside the page are
    /// ignored.
    pub fn extract_text(&self, x0: i64, x1: i64, y0: i64, y1: i64) -> String {
        let last_row = i64::from(self.grid.rows()) - 1;
        let last_column = i64::from(self.grid.columns()) - 1;
        let (r0, r1) = (y0.max(0), y1.min(last_row));
        let (c0, c1) = (x0.max(0), x1.min(last_column));
        if r0 > r1 || c0 > c1 {
            return String::new();
        }

        // Clamped to the grid bounds above, so they fit in u32.
        let columns = c0 as u32..=c1 as u32;
        let mut text = String::new();
        for row in r0 as u32..=r1 as u32 {
            let start = text.len();
            text.extend(self.grid.row_values(row, columns.clone()));
            if text.len() > start {
                text.push('\n');
            }
        }
        text
    }

    /// Text of the whole page.
    pub fn text(&self) -> String {
        self.extract_text(0, i64::MAX, 0, i64::MAX)
    }

    /// Every occurrence of `query`, each as one record per query character.
    pub fn find(&self, query: &str, options: &MatchOptions) -> Vec<Vec<&CharRecord>> {
        matcher::filter_adjacent(query, &self.occurrences, &self.records, options)
            .iter()
            .map(|ids| self.resolve(ids))
            .filter(|group| {
                let text = matcher::group_text(group.iter().copied());
                let keep = text.contains(query);
                if !keep {
                    log::trace!("Dropping group {text:?}: does not contain {query:?}");
                }
                keep
            })
            .collect()
    }

    /// Span of the first record of `group`.
    pub fn full_span(&self, group: &[&CharRecord]) -> Option<Span<'_>> {
        self.span(group.first()?.run_id)
    }

    /// Spans whose bounding box touches `bbox`.
    ///
    /// With `sort` the spans are ordered top to bottom, then left to right;
    /// otherwise they keep the order in which they first appeared.
    pub fn spans_in(&self, bbox: &BBox, sort: bool) -> Vec<Span<'_>> {
        let mut hits: Vec<(BBox, Span<'_>)> = self
            .spans
            .iter(&self.records)
            .filter_map(|span| span.bounding_box().ok().map(|b| (b, span)))
            .filter(|(span_box, _)| span_box.intersects(bbox))
            .collect();
        if sort {
            hits.sort_by_key(|(b, _)| (b.y0, b.x0));
        }
        hits.into_iter().map(|(_, span)| span).collect()
    }
}

/// Positional dump of the grid for debugging: one line per row down to the
/// last occupied one, each value written at its column. Trailing blanks are
/// trimmed.
impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::new();
        let (mut row, mut column) = (0u32, 0u32);
        for ((cell_row, cell_column), value) in self.grid.iter() {
            while row < cell_row {
                writeln!(f, "{}", line.trim_end())?;
                line.clear();
                column = 0;
                row += 1;
            }
            let pad = cell_column.saturating_sub(column) as usize;
            line.push_str(&" ".repeat(pad));
            line.push_str(value);
            column = cell_column.saturating_add(1);
        }
        if !self.grid.is_empty() {
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Glyph;

    const ADVANCE: f64 = 6.0;

    /// One run of monospaced text with synthetic spaces between words.
    fn line(layout: &mut PageLayout, text: &str, x: f64, y0: f64, run: &str) {
        let mut cursor = x;
        for (i, word) in text.split(' ').enumerate() {
            if i > 0 {
                layout.push(Glyph::synthetic_space(run));
                cursor += ADVANCE;
            }
            for ch in word.chars() {
                layout.push(Glyph::new(ch.to_string(), cursor, cursor + 5.5, y0).in_run(run));
                cursor += ADVANCE;
            }
        }
    }

    fn sample() -> PageIndex {
        let mut layout = PageLayout::new(200.0, 100.0);
        line(&mut layout, "HELLO WORLD", 10.0, 90.0, "l1");
        line(&mut layout, "GOOD BYE", 10.0, 70.0, "l2");
        PageIndex::build(&layout, &LoadOptions::default())
    }

    #[test]
    fn test_build_dimensions_and_counts() {
        let page = sample();
        assert_eq!((page.width(), page.height()), (200, 100));
        // 10 + 7 letters, one materialized space per line.
        assert_eq!(page.records().len(), 19);
        assert_eq!(page.span_count(), 2);
    }

    #[test]
    fn test_rows_read_top_down() {
        let page = sample();
        let first = &page.records()[0];
        assert_eq!((first.value.as_str(), first.x, first.y, first.x_end), ("H", 10, 10, 16));
        assert_eq!(page.grid().get(10, 10).unwrap(), "H");
        assert_eq!(page.grid().get(30, 10).unwrap(), "G");
    }

    #[test]
    fn test_extract_text_full_page() {
        let page = sample();
        assert_eq!(page.text(), "HELLO WORLD\nGOOD BYE\n");
    }

    #[test]
    fn test_extract_text_box() {
        let page = sample();
        assert_eq!(page.extract_text(10, 39, 10, 10), "HELLO\n");
        assert_eq!(page.extract_text(10, 40, 10, 10), "HELLO \n");
        assert_eq!(page.extract_text(0, 1000, 11, 29), "");
        assert_eq!(page.extract_text(-50, 15, -50, 1000), "H\nG\n");
    }

    #[test]
    fn test_extract_text_out_of_bounds() {
        let page = sample();
        assert_eq!(page.extract_text(5000, 6000, 0, 100), "");
        assert_eq!(page.extract_text(0, 100, 5000, 6000), "");
        assert_eq!(page.extract_text(40, 10, 0, 100), "");
    }

    #[test]
    fn test_extract_text_is_idempotent() {
        let page = sample();
        assert_eq!(page.extract_text(0, 120, 0, 40), page.extract_text(0, 120, 0, 40));
    }

    #[test]
    fn test_find_and_full_span() {
        let page = sample();
        let groups = page.find("WORLD", &MatchOptions::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(matcher::group_text(groups[0].iter().copied()), "WORLD");

        let span = page.full_span(&groups[0]).unwrap();
        assert_eq!(span.to_text(), "HELLO WORLD");
    }

    #[test]
    fn test_find_across_space() {
        let page = sample();
        assert_eq!(page.find("O W", &MatchOptions::default()).len(), 1);
        // The gap left by the space is within the same-run tolerance.
        assert_eq!(page.find("OW", &MatchOptions::default()).len(), 1);
        let strict = MatchOptions {
            base_distance: 5,
            span_tolerance: 0,
        };
        assert_eq!(page.find("O W", &strict).len(), 1);
    }

    #[test]
    fn test_find_zero_width_glyph_once() {
        let mut layout = PageLayout::new(100.0, 100.0);
        layout.push(Glyph::new("a", 10.0, 10.0, 50.0));
        let page = PageIndex::build(&layout, &LoadOptions::default());
        assert_eq!(page.records().len(), 1);
        assert!(page.find("aa", &MatchOptions::default()).is_empty());
        assert_eq!(page.find("a", &MatchOptions::default()).len(), 1);
    }

    #[test]
    fn test_find_absent() {
        let page = sample();
        assert!(page.find("MISSING", &MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_spans_in() {
        let page = sample();
        let all = page.spans_in(&BBox::new(0, 0, 200, 100), true);
        let texts: Vec<String> = all.iter().map(|s| s.to_text()).collect();
        assert_eq!(texts, vec!["HELLO WORLD", "GOOD BYE"]);

        let first = page.spans_in(&BBox::new(0, 0, 200, 15), true);
        assert_eq!(first.len(), 1);
        assert!(page.spans_in(&BBox::new(0, 50, 200, 60), true).is_empty());
    }

    #[test]
    fn test_spans_disabled_spaces() {
        let mut layout = PageLayout::new(200.0, 100.0);
        line(&mut layout, "HELLO WORLD", 10.0, 90.0, "l1");
        let options = LoadOptions {
            include_synthetic_spaces: false,
            ..Default::default()
        };
        let page = PageIndex::build(&layout, &options);
        assert_eq!(page.text(), "HELLOWORLD\n");
        assert_eq!(page.span(Some(RunId::new(0))).unwrap().to_text(), "HELLOWORLD");
    }

    #[test]
    fn test_display_keeps_positions() {
        let mut layout = PageLayout::new(20.0, 10.0);
        layout.push(Glyph::new("a", 2.0, 3.0, 9.0));
        layout.push(Glyph::new("b", 5.0, 6.0, 9.0));
        layout.push(Glyph::new("c", 0.0, 1.0, 7.0));
        let page = PageIndex::build(&layout, &LoadOptions::default());
        assert_eq!(page.to_string(), "\n  a  b\n\nc\n");
        assert_eq!(page.text(), "ab\nc\n");
    }

    #[test]
    fn test_empty_layout() {
        let page = PageIndex::build(&PageLayout::default(), &LoadOptions::default());
        assert_eq!((page.width(), page.height()), (0, 0));
        assert_eq!(page.text(), "");
        assert_eq!(page.to_string(), "");
        assert!(page.find("a", &MatchOptions::default()).is_empty());
        assert!(page.spans_in(&BBox::new(0, 0, 10, 10), false).is_empty());
    }
}
