//! Adjacency matching over per-character occurrence lists.
//!
//! A query of length `L` is matched by looking up the occurrence list of each
//! of its characters and chaining them left to right: every occurrence of the
//! first character anchors a candidate group, and each following position
//! takes the first occurrence (in ingestion order) that sits on the same row
//! as the previous member and close enough to its right edge.
//!
//! ```text
//! query:   D   E   G   R   E   E
//!          |   |   |   |   |   |
//! lists:  [D] [E..] [G] [R..] [E..] [E..]   <- occurrence index
//!          \___/\___/\___/\___/\___/
//!          same row, 0 <= gap <= D
//! ```
//!
//! The first qualifying neighbour wins. The result is reproducible rather
//! than globally optimal.

use crate::occurrence::OccurrenceIndex;
use crate::options::MatchOptions;
use crate::types::{BBox, CharId, CharRecord};

/// Occurrence lists for every character of `query`, in query order.
///
/// Returns `None` as soon as one character never occurs, since no group can
/// be completed then.
pub fn candidates<'a>(query: &str, index: &'a OccurrenceIndex) -> Option<Vec<&'a [CharId]>> {
    let mut buf = [0u8; 4];
    let mut lists = Vec::new();
    for ch in query.chars() {
        let list = index.lookup(ch.encode_utf8(&mut buf));
        if list.is_empty() {
            return None;
        }
        lists.push(list);
    }
    Some(lists)
}

/// Whether `candidate` may follow `reference` in a match.
///
/// Both must share a row. The candidate then either starts within the
/// allowed gap after the reference's right edge (the gap is wider inside a
/// run), or belongs to the same run and starts further right. The latter
/// absorbs quantization overlaps where the next glyph begins a column before
/// the previous one ends.
pub fn is_adjacent(reference: &CharRecord, candidate: &CharRecord, options: &MatchOptions) -> bool {
    if candidate.y != reference.y {
        return false;
    }
    let same_run = reference.shares_run(candidate);
    let distance = i64::from(candidate.x) - i64::from(reference.x_end);
    (0..=options.max_distance(same_run)).contains(&distance)
        || (same_run && reference.x < candidate.x)
}

/// First entry of `list` adjacent to `reference` that is not in `taken`.
///
/// A zero-width record is adjacent to itself, so the records already in the
/// group must be excluded explicitly.
pub fn find_neighbour(
    reference: &CharRecord,
    taken: &[CharId],
    list: &[CharId],
    records: &[CharRecord],
    options: &MatchOptions,
) -> Option<CharId> {
    list.iter().copied().find(|id| {
        !taken.contains(id)
            && records
                .get(id.index())
                .is_some_and(|candidate| is_adjacent(reference, candidate, options))
    })
}

/// Every group of records spelling `query` with adjacent members.
///
/// Groups are returned in the order of their anchors, i.e. ingestion order of
/// the query's first character. Each returned group has exactly one member
/// per query character.
pub fn filter_adjacent(
    query: &str,
    index: &OccurrenceIndex,
    records: &[CharRecord],
    options: &MatchOptions,
) -> Vec<Vec<CharId>> {
    let Some(lists) = candidates(query, index) else {
        return Vec::new();
    };
    let Some((anchors, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let expected = lists.len();
    let mut groups = Vec::new();
    for &anchor in anchors.iter() {
        let Some(mut reference) = records.get(anchor.index()) else {
            continue;
        };
        let mut group = Vec::with_capacity(expected);
        group.push(anchor);

        // A gap leaves the reference in place; later positions are still
        // tried but the group can no longer reach full length.
        for list in rest {
            if let Some(next) = find_neighbour(reference, &group, list, records, options) {
                if let Some(record) = records.get(next.index()) {
                    group.push(next);
                    reference = record;
                }
            }
        }

        if group.len() == expected {
            groups.push(group);
        } else {
            log::trace!(
                "Dropping anchor {:?} for {query:?}: {} of {expected} characters chained",
                anchor,
                group.len()
            );
        }
    }
    groups
}

/// Box around `records`: leftmost `x`, rightmost `x_end`, top and bottom
/// rows, plus the run id of the first record. `None` when empty.
pub fn bounding_box<'a, I>(records: I) -> Option<BBox>
where
    I: IntoIterator<Item = &'a CharRecord>,
{
    let mut iter = records.into_iter();
    let first = iter.next()?;
    let mut bbox = BBox::new(
        i64::from(first.x),
        i64::from(first.y),
        i64::from(first.x_end),
        i64::from(first.y),
    )
    .with_run(first.run_id);

    for record in iter {
        bbox.x0 = bbox.x0.min(i64::from(record.x));
        bbox.x1 = bbox.x1.max(i64::from(record.x_end));
        bbox.y0 = bbox.y0.min(i64::from(record.y));
        bbox.y1 = bbox.y1.max(i64::from(record.y));
    }
    Some(bbox)
}

/// Concatenated values of a group, in group order.
pub fn group_text<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a CharRecord>,
{
    records.into_iter().map(|r| r.value.as_str()).collect()
}
