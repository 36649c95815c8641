//! Point-in-time state resolution.
//!
//! Playback queries once per rendered frame, almost always with a timestamp at
//! or after the previous one. [`StateResolver`] keeps a per-entity cursor that
//! only moves forward on that path and re-seats every cursor by binary search
//! when the query jumps backwards.

use std::collections::HashMap;

use tracing::trace;

use crate::record::TelemetryRecord;
use crate::timeline::Timeline;
use crate::types::EntityId;

/// How far ahead of the query an entity's first record may be and still be used.
pub const DEFAULT_LOOKAHEAD_MS: i64 = 200;

/// Latest known record per visible entity. Entities whose first record lies
/// beyond the lookahead window are absent.
pub type ResolvedState<'a> = HashMap<EntityId, &'a TelemetryRecord>;

#[derive(Debug, Clone)]
pub struct StateResolver {
    lookahead_ms: i64,
    /// Per entity (roster order): count of its records with `timestamp_ms <= last_query`.
    cursors: Vec<usize>,
    last_query: Option<i64>,
}

impl StateResolver {
    pub fn new(timeline: &Timeline, lookahead_ms: i64) -> Self {
        Self {
            lookahead_ms: lookahead_ms.max(0),
            cursors: vec![0; timeline.entities().len()],
            last_query: None,
        }
    }

    pub fn lookahead_ms(&self) -> i64 {
        self.lookahead_ms
    }

    /// Forget the playback position; the next query binary-searches.
    pub fn reset(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = 0);
        self.last_query = None;
    }

    /// Resolve every entity's state at `query`.
    ///
    /// `timeline` must be the timeline this resolver was created for.
    pub fn resolve<'t>(&mut self, timeline: &'t Timeline, query: i64) -> ResolvedState<'t> {
        let records = timeline.records();
        let forward = matches!(self.last_query, Some(last) if query >= last);

        if forward {
            for (ordinal, cursor) in self.cursors.iter_mut().enumerate() {
                let indices = timeline.entity_record_indices(ordinal);
                while *cursor < indices.len() && records[indices[*cursor]].timestamp_ms <= query {
                    *cursor += 1;
                }
            }
        } else {
            trace!("state query {query}ms is a seek; re-seating cursors");
            for (ordinal, cursor) in self.cursors.iter_mut().enumerate() {
                let indices = timeline.entity_record_indices(ordinal);
                *cursor = seek(records, indices, query);
            }
        }
        self.last_query = Some(query);

        let mut state = HashMap::with_capacity(self.cursors.len());
        for (ordinal, &cursor) in self.cursors.iter().enumerate() {
            let indices = timeline.entity_record_indices(ordinal);
            if let Some(record) = pick(records, indices, cursor, query, self.lookahead_ms) {
                state.insert(record.entity_id.clone(), record);
            }
        }
        state
    }
}

/// Stateless resolution by binary search, for one-off queries.
pub fn resolve_at(timeline: &Timeline, query: i64, lookahead_ms: i64) -> ResolvedState<'_> {
    let records = timeline.records();
    let mut state = HashMap::new();
    for ordinal in 0..timeline.entities().len() {
        let indices = timeline.entity_record_indices(ordinal);
        let cursor = seek(records, indices, query);
        if let Some(record) = pick(records, indices, cursor, query, lookahead_ms.max(0)) {
            state.insert(record.entity_id.clone(), record);
        }
    }
    state
}

/// Count of `indices` whose record is at or before `query`.
fn seek(records: &[TelemetryRecord], indices: &[usize], query: i64) -> usize {
    indices.partition_point(|&idx| records[idx].timestamp_ms <= query)
}

/// The latest record at or before `query`, taking the first of any duplicates.
///
/// Before an entity's first record, that record stands in once it is within the
/// lookahead window. A record past the query never replaces an earlier one.
fn pick<'t>(
    records: &'t [TelemetryRecord],
    indices: &[usize],
    cursor: usize,
    query: i64,
    lookahead_ms: i64,
) -> Option<&'t TelemetryRecord> {
    if cursor == 0 {
        return indices
            .first()
            .map(|&idx| &records[idx])
            .filter(|first| first.timestamp_ms - query <= lookahead_ms);
    }

    let latest_ts = records[indices[cursor - 1]].timestamp_ms;
    let first_of_latest =
        indices[..cursor].partition_point(|&idx| records[idx].timestamp_ms < latest_ts);
    Some(&records[indices[first_of_latest]])
}
