//! Turning analyzer glyphs into character records.
//!
//! Ingestion runs in three steps:
//!
//! ```text
//! Glyph[]  ->  place      ->  duplicate_runs  ->  Ingestor::push
//!              quantize,       fingerprint         grid, occurrences,
//!              reject bad      whole runs          spans (in that order)
//! ```
//!
//! A bad glyph is logged and skipped; it never fails the page.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::PageIndex;
use crate::options::LoadOptions;
use crate::types::{CharId, CharRecord, Glyph, PageLayout, RunId};

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum GlyphRejection {
    #[error("glyph has no text")]
    EmptyText,
    #[error("non-finite coordinate")]
    NonFinite,
    #[error("negative source coordinate")]
    Negative,
    #[error("right edge {x1} lies left of the left edge {x0}")]
    Inverted { x0: f64, x1: f64 },
    #[error("bottom edge {y0} lies above the page top {height}")]
    AbovePage { y0: f64, height: f64 },
    #[error("coordinate does not fit the grid")]
    Overflow,
}

/// Quantized grid position of one glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Cell {
    pub x: u32,
    pub y: u32,
    pub x_end: u32,
}

/// Map a glyph onto the grid: `x = floor(x0)`, `x_end = ceil(x1)` and
/// `y = floor(height - y0)` so rows grow downwards.
pub(crate) fn quantize(glyph: &Glyph, height: f64) -> Result<Cell, GlyphRejection> {
    if glyph.text.is_empty() {
        return Err(GlyphRejection::EmptyText);
    }
    let (x0, x1, y0) = (glyph.x0, glyph.x1, glyph.y0);
    if !(x0.is_finite() && x1.is_finite() && y0.is_finite()) {
        return Err(GlyphRejection::NonFinite);
    }
    if x0 < 0.0 || x1 < 0.0 || y0 < 0.0 {
        return Err(GlyphRejection::Negative);
    }
    if x1 < x0 {
        return Err(GlyphRejection::Inverted { x0, x1 });
    }
    let row = (height - y0).floor();
    if row < 0.0 {
        return Err(GlyphRejection::AbovePage { y0, height });
    }

    let limit = f64::from(u32::MAX - 1);
    let (x, x_end) = (x0.floor(), x1.ceil());
    if x_end > limit || row > limit {
        return Err(GlyphRejection::Overflow);
    }
    Ok(Cell {
        x: x as u32,
        y: row as u32,
        x_end: x_end as u32,
    })
}

/// Height the rows are measured from: the reported page height, or the
/// highest glyph when the analyzer did not report one.
pub(crate) fn reference_height(layout: &PageLayout) -> f64 {
    if let Some(height) = layout.height.filter(|h| h.is_finite() && *h >= 0.0) {
        return height;
    }
    layout
        .glyphs
        .iter()
        .filter(|g| !g.synthetic && g.y0.is_finite())
        .map(|g| g.y0)
        .fold(0.0, f64::max)
        .ceil()
}

/// Reported page dimension rounded up, or the grid's grown bound.
pub(crate) fn dimension(reported: Option<f64>, grown: u32) -> u32 {
    match reported {
        Some(value) if value.is_finite() && value >= 0.0 => value.ceil().min(f64::from(u32::MAX)) as u32,
        _ => grown,
    }
}

/// A glyph that survived validation. Synthetic spaces carry no cell.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placed<'g> {
    pub glyph: &'g Glyph,
    pub cell: Option<Cell>,
}

impl<'g> Placed<'g> {
    fn run(&self) -> Option<&'g str> {
        self.glyph.run.as_deref()
    }
}

pub(crate) fn place(layout: &PageLayout, height: f64) -> Vec<Placed<'_>> {
    let mut placed = Vec::with_capacity(layout.glyphs.len());
    for (position, glyph) in layout.glyphs.iter().enumerate() {
        if glyph.synthetic {
            placed.push(Placed { glyph, cell: None });
            continue;
        }
        match quantize(glyph, height) {
            Ok(cell) => placed.push(Placed {
                glyph,
                cell: Some(cell),
            }),
            Err(reason) => {
                log::warn!("Skipping glyph #{position} {:?}: {reason}", glyph.text);
            }
        }
    }
    placed
}

/// Analyzer runs whose characters exactly repeat an earlier run.
///
/// The fingerprint of a run is the ordered list of its drawn characters with
/// their cells. The first run with a given fingerprint is kept.
pub(crate) fn duplicate_runs<'g>(placed: &[Placed<'g>]) -> HashSet<&'g str> {
    let mut order: Vec<&'g str> = Vec::new();
    let mut prints: HashMap<&'g str, Vec<(&'g str, Cell)>> = HashMap::new();
    for p in placed {
        let (Some(run), Some(cell)) = (p.run(), p.cell) else {
            continue;
        };
        prints
            .entry(run)
            .or_insert_with(|| {
                order.push(run);
                Vec::new()
            })
            .push((p.glyph.text.as_str(), cell));
    }

    let mut seen = HashSet::new();
    let mut dropped = HashSet::new();
    for run in order {
        let Some(print) = prints.remove(run) else {
            continue;
        };
        if !seen.insert(print) {
            log::debug!("Dropping duplicate run {run:?}");
            dropped.insert(run);
        }
    }
    dropped
}

/// Last record written for an analyzer run.
#[derive(Debug, Clone, Copy, Default)]
struct RunCursor {
    last: Option<(Cell, bool)>,
    space_pending: bool,
}

/// Writes placed glyphs into a page, keeping per-run state for run id
/// allocation and synthetic spaces.
pub(crate) struct Ingestor<'g, 'o> {
    options: &'o LoadOptions,
    page: PageIndex,
    run_ids: HashMap<&'g str, RunId>,
    cursors: HashMap<&'g str, RunCursor>,
    skipped: usize,
}

impl<'g, 'o> Ingestor<'g, 'o> {
    pub(crate) fn new(options: &'o LoadOptions) -> Self {
        Ingestor {
            options,
            page: PageIndex::empty(options.coordinate_policy),
            run_ids: HashMap::new(),
            cursors: HashMap::new(),
            skipped: 0,
        }
    }

    pub(crate) fn run(layout: &'g PageLayout, options: &'o LoadOptions) -> PageIndex {
        let height = reference_height(layout);
        let placed = place(layout, height);
        let dropped = if options.drop_duplicate_runs {
            duplicate_runs(&placed)
        } else {
            HashSet::new()
        };

        let mut ingestor = Ingestor::new(options);
        ingestor.skipped = layout.glyphs.len() - placed.len();
        for p in &placed {
            if p.run().is_some_and(|run| dropped.contains(run)) {
                continue;
            }
            ingestor.push(p);
        }
        ingestor.finish(layout, dropped.len())
    }

    pub(crate) fn push(&mut self, placed: &Placed<'g>) {
        let run = placed.run();
        match placed.cell {
            None => self.queue_space(run),
            Some(cell) => {
                if let Some(run) = run {
                    self.flush_space(run, cell);
                }
                self.emit(&placed.glyph.text, cell, run);
            }
        }
    }

    pub(crate) fn finish(mut self, layout: &PageLayout, dropped_runs: usize) -> PageIndex {
        self.page.width = dimension(layout.width, self.page.grid.columns());
        self.page.height = dimension(layout.height, self.page.grid.rows());
        log::debug!(
            "Indexed page {}x{}: {} characters, {} runs, {} glyphs skipped, {} duplicate runs dropped",
            self.page.width,
            self.page.height,
            self.page.records.len(),
            self.page.spans.count(),
            self.skipped,
            dropped_runs
        );
        self.page
    }

    fn queue_space(&mut self, run: Option<&'g str>) {
        if !self.options.include_synthetic_spaces {
            return;
        }
        if let Some(run) = run {
            self.cursors.entry(run).or_default().space_pending = true;
        }
    }

    /// Materialize a pending space right after the previous record of `run`
    /// when the next glyph leaves room for it.
    fn flush_space(&mut self, run: &'g str, next: Cell) {
        let Some(cursor) = self.cursors.get_mut(run) else {
            return;
        };
        if !std::mem::take(&mut cursor.space_pending) {
            return;
        }
        let Some((last, last_was_space)) = cursor.last else {
            return;
        };
        let room = last
            .x_end
            .checked_add(self.options.min_space_gap)
            .is_some_and(|min_x| next.x >= min_x);
        if last_was_space || last.y != next.y || !room {
            return;
        }
        let space = Cell {
            x: last.x_end,
            y: last.y,
            x_end: last.x_end.saturating_add(1),
        };
        self.emit(" ", space, Some(run));
    }

    fn emit(&mut self, value: &str, cell: Cell, run: Option<&'g str>) {
        let Ok(index) = u32::try_from(self.page.records.len()) else {
            log::warn!("Page is full, skipping {value:?}");
            self.skipped += 1;
            return;
        };
        if let Err(err) = self
            .page
            .grid
            .insert(value, i64::from(cell.y), i64::from(cell.x))
        {
            log::warn!("Skipping {value:?}: {err}");
            self.skipped += 1;
            return;
        }

        let id = CharId::new(index);
        let run_id = run.map(|key| self.run_id(key));
        self.page.occurrences.insert(value, id);
        if let Some(run_id) = run_id {
            self.page.spans.push(run_id, id);
        }
        self.page
            .records
            .push(CharRecord::new(value, cell.x, cell.y, cell.x_end, run_id));

        if let Some(key) = run {
            self.cursors.entry(key).or_default().last = Some((cell, value == " "));
        }
    }

    fn run_id(&mut self, key: &'g str) -> RunId {
        let next = RunId::new(self.run_ids.len() as u32);
        *self.run_ids.entry(key).or_insert(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_floor_ceil_and_flip() {
        let glyph = Glyph::new("A", 10.4, 15.2, 700.6);
        let cell = quantize(&glyph, 792.0).unwrap();
        assert_eq!(
            cell,
            Cell {
                x: 10,
                y: 91,
                x_end: 16
            }
        );
    }

    #[test]
    fn test_quantize_rejections() {
        let height = 100.0;
        assert_eq!(
            quantize(&Glyph::new("", 1.0, 2.0, 3.0), height),
            Err(GlyphRejection::EmptyText)
        );
        assert_eq!(
            quantize(&Glyph::new("a", -1.0, 2.0, 3.0), height),
            Err(GlyphRejection::Negative)
        );
        assert_eq!(
            quantize(&Glyph::new("a", 1.0, 2.0, -0.5), height),
            Err(GlyphRejection::Negative)
        );
        assert_eq!(
            quantize(&Glyph::new("a", f64::NAN, 2.0, 3.0), height),
            Err(GlyphRejection::NonFinite)
        );
        assert!(matches!(
            quantize(&Glyph::new("a", 5.0, 2.0, 3.0), height),
            Err(GlyphRejection::Inverted { .. })
        ));
        assert!(matches!(
            quantize(&Glyph::new("a", 1.0, 2.0, 150.0), height),
            Err(GlyphRejection::AbovePage { .. })
        ));
        assert_eq!(
            quantize(&Glyph::new("a", 1.0, 1e12, 3.0), height),
            Err(GlyphRejection::Overflow)
        );
    }

    #[test]
    fn test_reference_height_falls_back_to_highest_glyph() {
        let mut layout = PageLayout::default();
        layout.push(Glyph::new("a", 0.0, 1.0, 40.2));
        layout.push(Glyph::new("b", 0.0, 1.0, 12.0));
        assert_eq!(reference_height(&layout), 41.0);

        layout.height = Some(100.0);
        assert_eq!(reference_height(&layout), 100.0);
    }

    #[test]
    fn test_dimension() {
        assert_eq!(dimension(Some(611.2), 3), 612);
        assert_eq!(dimension(None, 3), 3);
        assert_eq!(dimension(Some(f64::NAN), 3), 3);
    }

    fn ingest(glyphs: Vec<Glyph>, options: &LoadOptions) -> PageIndex {
        let mut layout = PageLayout::new(100.0, 100.0);
        for glyph in glyphs {
            layout.push(glyph);
        }
        Ingestor::run(&layout, options)
    }

    fn values(page: &PageIndex) -> Vec<(&str, u32)> {
        page.records().iter().map(|r| (r.value.as_str(), r.x)).collect()
    }

    #[test]
    fn test_space_materialized_after_gap() {
        let page = ingest(
            vec![
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
                Glyph::synthetic_space("r"),
                Glyph::new("b", 22.0, 27.5, 50.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(values(&page), vec![("a", 10), (" ", 16), ("b", 22)]);
        assert_eq!(page.records()[1].x_end, 17);
    }

    #[test]
    fn test_space_skipped_when_contiguous() {
        let page = ingest(
            vec![
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
                Glyph::synthetic_space("r"),
                Glyph::new("b", 16.0, 21.5, 50.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(values(&page), vec![("a", 10), ("b", 16)]);
    }

    #[test]
    fn test_space_skipped_after_space() {
        let page = ingest(
            vec![
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
                Glyph::new(" ", 16.0, 18.5, 50.0).in_run("r"),
                Glyph::synthetic_space("r"),
                Glyph::new("b", 30.0, 35.5, 50.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(values(&page), vec![("a", 10), (" ", 16), ("b", 30)]);
    }

    #[test]
    fn test_space_skipped_across_rows() {
        let page = ingest(
            vec![
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
                Glyph::synthetic_space("r"),
                Glyph::new("b", 30.0, 35.5, 30.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(values(&page), vec![("a", 10), ("b", 30)]);
        assert_eq!(page.text(), "a\nb\n");
    }

    #[test]
    fn test_space_skipped_without_previous_record() {
        let page = ingest(
            vec![
                Glyph::synthetic_space("r"),
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(values(&page), vec![("a", 10)]);
    }

    #[test]
    fn test_space_respects_min_space_gap() {
        let options = LoadOptions {
            min_space_gap: 5,
            ..Default::default()
        };
        let narrow = vec![
            Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
            Glyph::synthetic_space("r"),
            Glyph::new("b", 19.0, 24.5, 50.0).in_run("r"),
        ];
        let page = ingest(narrow.clone(), &options);
        assert_eq!(values(&page), vec![("a", 10), ("b", 19)]);
        let page = ingest(narrow, &LoadOptions::default());
        assert_eq!(values(&page), vec![("a", 10), (" ", 16), ("b", 19)]);

        let wide = vec![
            Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
            Glyph::synthetic_space("r"),
            Glyph::new("b", 21.0, 26.5, 50.0).in_run("r"),
        ];
        let page = ingest(wide, &options);
        assert_eq!(values(&page), vec![("a", 10), (" ", 16), ("b", 21)]);
    }

    #[test]
    fn test_space_pending_is_per_run() {
        let page = ingest(
            vec![
                Glyph::new("a", 10.0, 15.5, 50.0).in_run("r"),
                Glyph::synthetic_space("r"),
                Glyph::new("x", 60.0, 65.5, 50.0).in_run("s"),
                Glyph::new("b", 22.0, 27.5, 50.0).in_run("r"),
            ],
            &LoadOptions::default(),
        );
        assert_eq!(
            values(&page),
            vec![("a", 10), ("x", 60), (" ", 16), ("b", 22)]
        );
    }

    #[test]
    fn test_duplicate_runs_keeps_first() {
        let mut layout = PageLayout::new(100.0, 100.0);
        for run in ["a", "b"] {
            layout.push(Glyph::new("x", 1.0, 2.0, 10.0).in_run(run));
            layout.push(Glyph::new("y", 2.0, 3.0, 10.0).in_run(run));
        }
        layout.push(Glyph::new("x", 1.0, 2.0, 20.0).in_run("c"));

        let placed = place(&layout, 100.0);
        let dropped = duplicate_runs(&placed);
        assert_eq!(dropped, HashSet::from(["b"]));
    }
}
