use std::collections::{BTreeMap, HashSet};

use crate::matcher;
use crate::options::{DocumentOptions, FindOptions};
use crate::page::PageIndex;
use crate::span::Span;
use crate::types::{BBox, CharRecord, PageLayout};
use crate::HotgridError;

/// Matches found on one page. Each match lists one record per character.
pub type PageResult<'a> = Vec<Vec<&'a CharRecord>>;

/// Matches keyed by page number.
pub type SearchResult<'a> = BTreeMap<usize, PageResult<'a>>;

/// An ordered, immutable sequence of indexed pages.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pages: Vec<PageIndex>,
    options: DocumentOptions,
}

impl Document {
    /// Index every page layout, in order.
    pub fn from_layouts(
        layouts: &[PageLayout],
        options: DocumentOptions,
    ) -> Result<Self, HotgridError> {
        options.validate()?;
        let pages = layouts
            .iter()
            .map(|layout| PageIndex::build(layout, &options.load))
            .collect();
        Ok(Document { pages, options })
    }

    pub fn from_pages(pages: Vec<PageIndex>, options: DocumentOptions) -> Result<Self, HotgridError> {
        options.validate()?;
        Ok(Document { pages, options })
    }

    /// Index a JSON array of page layouts.
    pub fn from_json(json: &str, options: DocumentOptions) -> Result<Self, HotgridError> {
        let layouts = PageLayout::many_from_json(json)?;
        Self::from_layouts(&layouts, options)
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn pages(&self) -> &[PageIndex] {
        &self.pages
    }

    pub fn page(&self, page: usize) -> Result<&PageIndex, HotgridError> {
        self.pages.get(page).ok_or(HotgridError::InvalidPage(page))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Find `query` on the selected pages.
    ///
    /// Every searched page gets an entry, empty when nothing matched. With
    /// `take_span` a match is replaced by its whole run, and each run is
    /// reported at most once per page.
    pub fn find_text(
        &self,
        query: &str,
        options: &FindOptions,
    ) -> Result<SearchResult<'_>, HotgridError> {
        options.matcher.validate()?;
        let numbers: Vec<usize> = if options.pages.is_empty() {
            (0..self.pages.len()).collect()
        } else {
            options.pages.clone()
        };
        for &number in &numbers {
            self.page(number)?;
        }

        let mut result: SearchResult<'_> = BTreeMap::new();
        for number in numbers {
            let page = self.page(number)?;
            let mut found: PageResult<'_> = Vec::new();
            let mut seen_runs = HashSet::new();

            for group in page.find(query, &options.matcher) {
                if options.validate && !self.extracts_query(number, &group, query)? {
                    log::debug!("Match on page {number} failed validation for {query:?}");
                    continue;
                }
                if options.take_span {
                    if let Some(span) = page.full_span(&group) {
                        if seen_runs.insert(span.run_id()) {
                            found.push(span.characters().collect());
                        }
                        continue;
                    }
                }
                found.push(group);
            }
            result.insert(number, found);
        }
        Ok(result)
    }

    /// Text inside a box on `page`.
    ///
    /// The box is widened by `1 / precision` columns on both sides and by the
    /// extraction tolerance on the right, clamped to the page width, then
    /// padded by `1 / precision` once more before reading the grid.
    pub fn extract_text(
        &self,
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        page: usize,
    ) -> Result<String, HotgridError> {
        check_coordinates(x0, y0, x1, y1)?;
        let page = self.page(page)?;

        let padding = self.options.padding();
        let limit = (f64::from(page.width()) + padding - 1.0).ceil() as i64;
        let left = (x0 as f64 - padding).floor().max(0.0);
        let right = ((x1 as f64 + padding).ceil() as i64)
            .saturating_add(self.options.extraction_tolerance)
            .min(limit);

        let left = (left - padding).floor() as i64;
        let right = (right as f64 + padding).ceil() as i64;
        Ok(page.extract_text(left, right, y0, y1))
    }

    pub fn extract_page_text(&self, page: usize) -> Result<String, HotgridError> {
        Ok(self.page(page)?.text())
    }

    /// Spans touching a box on `page`, see [`PageIndex::spans_in`].
    pub fn extract_spans(
        &self,
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        page: usize,
        sort: bool,
    ) -> Result<Vec<Span<'_>>, HotgridError> {
        check_coordinates(x0, y0, x1, y1)?;
        Ok(self.page(page)?.spans_in(&BBox::new(x0, y0, x1, y1), sort))
    }

    pub fn extract_spans_text(
        &self,
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        page: usize,
        sort: bool,
    ) -> Result<Vec<String>, HotgridError> {
        Ok(self
            .extract_spans(x0, y0, x1, y1, page, sort)?
            .iter()
            .map(Span::to_text)
            .collect())
    }

    /// Whether the widened box around `group` still reads as `query`.
    fn extracts_query(
        &self,
        page: usize,
        group: &[&CharRecord],
        query: &str,
    ) -> Result<bool, HotgridError> {
        let Some(bbox) = matcher::bounding_box(group.iter().copied()) else {
            return Ok(false);
        };
        let text = self.extract_text(bbox.x0, bbox.y0, bbox.x1, bbox.y1, page)?;
        Ok(text.contains(query))
    }
}

fn check_coordinates(x0: i64, y0: i64, x1: i64, y1: i64) -> Result<(), HotgridError> {
    if x0 < 0 || y0 < 0 || x1 < 0 || y1 < 0 {
        return Err(HotgridError::InvalidCoordinates { x0, y0, x1, y1 });
    }
    Ok(())
}
