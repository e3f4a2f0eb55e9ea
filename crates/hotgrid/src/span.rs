//! Runs of characters the layout analyzer reported as one unit.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::matcher;
use crate::types::{BBox, CharId, CharRecord, RunId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    #[error("Cannot append a character to a span without a run id")]
    MissingRunId,
    #[error("Span {0} has no characters")]
    Empty(RunId),
}

/// Run id to the ordered members of that run.
///
/// Run ids are allocated sequentially per page, so iterating the table in key
/// order visits spans in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct SpanTable {
    runs: BTreeMap<RunId, Vec<CharId>>,
}

impl SpanTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, run_id: Option<RunId>, id: CharId) -> Result<(), SpanError> {
        let run_id = run_id.ok_or(SpanError::MissingRunId)?;
        self.push(run_id, id);
        Ok(())
    }

    pub(crate) fn push(&mut self, run_id: RunId, id: CharId) {
        self.runs.entry(run_id).or_default().push(id);
    }

    pub fn members(&self, run_id: RunId) -> Option<&[CharId]> {
        self.runs.get(&run_id).map(Vec::as_slice)
    }

    /// Resolve a run against the record arena it was built from.
    pub fn get<'a>(&'a self, run_id: Option<RunId>, records: &'a [CharRecord]) -> Option<Span<'a>> {
        let run_id = run_id?;
        let members = self.runs.get(&run_id)?;
        Some(Span::new(run_id, members, records))
    }

    /// All spans in order of first appearance.
    pub fn iter<'a>(&'a self, records: &'a [CharRecord]) -> impl Iterator<Item = Span<'a>> + 'a {
        self.runs
            .iter()
            .map(move |(&run_id, members)| Span::new(run_id, members, records))
    }

    pub fn count(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Borrowed view of one run.
#[derive(Debug, Clone, Copy)]
pub struct Span<'a> {
    run_id: RunId,
    members: &'a [CharId],
    records: &'a [CharRecord],
}

impl<'a> Span<'a> {
    pub fn new(run_id: RunId, members: &'a [CharId], records: &'a [CharRecord]) -> Self {
        Span {
            run_id,
            members,
            records,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> &'a [CharId] {
        self.members
    }

    pub fn characters(&self) -> impl Iterator<Item = &'a CharRecord> + 'a {
        let records = self.records;
        self.members
            .iter()
            .filter_map(move |id| records.get(id.index()))
    }

    pub fn to_text(&self) -> String {
        self.characters().map(|c| c.value.as_str()).collect()
    }

    /// Box around every member, tagged with this span's run id.
    ///
    /// Rows are not required to be uniform: a run that wraps across rows
    /// gets a box spanning all of them.
    pub fn bounding_box(&self) -> Result<BBox, SpanError> {
        matcher::bounding_box(self.characters())
            .map(|bbox| bbox.with_run(Some(self.run_id)))
            .ok_or(SpanError::Empty(self.run_id))
    }
}

impl PartialEq for Span<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.run_id == other.run_id && self.members == other.members
    }
}
