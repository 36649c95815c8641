use std::collections::HashMap;

use tracing::debug;

use crate::ingest::{ParsedMatch, parse};
use crate::record::TelemetryRecord;
use crate::roster::Entity;
use crate::types::{CombatStats, EntityId};
use crate::{Result, Warning};

/// Every record of a match, ordered by timestamp, plus the derived roster.
///
/// Immutable once built. Loading another match builds a new `Timeline`.
#[derive(Debug, Clone)]
pub struct Timeline {
    records: Vec<TelemetryRecord>,
    entities: Vec<Entity>,
    /// Per entity (roster order), indices into `records` in timestamp order.
    entity_records: Vec<Vec<usize>>,
    entity_index: HashMap<EntityId, usize>,
    warnings: Vec<Warning>,
    skipped_rows: usize,
    match_start: i64,
    match_end: i64,
}

impl Timeline {
    /// Parse a telemetry document into a timeline.
    pub fn load(text: &str) -> Result<Timeline> {
        parse(text).map(Timeline::from_parsed)
    }

    pub fn from_parsed(parsed: ParsedMatch) -> Timeline {
        let ParsedMatch {
            records,
            entities,
            mut warnings,
            skipped_rows,
        } = parsed;

        let entity_index: HashMap<EntityId, usize> = entities
            .iter()
            .enumerate()
            .map(|(ordinal, entity)| (entity.id.clone(), ordinal))
            .collect();

        let mut entity_records = vec![Vec::new(); entities.len()];
        for (idx, record) in records.iter().enumerate() {
            if let Some(&ordinal) = entity_index.get(&record.entity_id) {
                entity_records[ordinal].push(idx);
            }
        }

        for indices in &entity_records {
            check_counters(&records, indices, &mut warnings);
        }

        let match_start = records.first().map(|r| r.timestamp_ms).unwrap_or_default();
        let match_end = records.last().map(|r| r.timestamp_ms).unwrap_or_default();

        debug!(
            "timeline spans {match_start}..={match_end}ms with {} records",
            records.len()
        );

        Timeline {
            records,
            entities,
            entity_records,
            entity_index,
            warnings,
            skipped_rows,
            match_start,
            match_end,
        }
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entity_ordinal(id).map(|ordinal| &self.entities[ordinal])
    }

    /// Position of `id` in the roster.
    pub fn entity_ordinal(&self, id: &EntityId) -> Option<usize> {
        self.entity_index.get(id).copied()
    }

    /// Indices into [`Timeline::records`] for the entity at `ordinal`.
    pub fn entity_record_indices(&self, ordinal: usize) -> &[usize] {
        self.entity_records
            .get(ordinal)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All records of one entity in timestamp order.
    pub fn records_for(&self, id: &EntityId) -> impl Iterator<Item = &TelemetryRecord> {
        let indices = self
            .entity_ordinal(id)
            .map(|ordinal| self.entity_record_indices(ordinal))
            .unwrap_or_default();
        indices.iter().map(|&idx| &self.records[idx])
    }

    /// Records within a time window [start, end).
    pub fn records_in_range(&self, start: i64, end: i64) -> &[TelemetryRecord] {
        let start_idx = self.records.partition_point(|r| r.timestamp_ms < start);
        let end_idx = self.records.partition_point(|r| r.timestamp_ms < end);
        &self.records[start_idx..end_idx.max(start_idx)]
    }

    /// Records with `timestamp_ms <= upto`.
    pub fn records_until(&self, upto: i64) -> &[TelemetryRecord] {
        let end_idx = self.records.partition_point(|r| r.timestamp_ms <= upto);
        &self.records[..end_idx]
    }

    pub fn match_start(&self) -> i64 {
        self.match_start
    }

    pub fn match_end(&self) -> i64 {
        self.match_end
    }

    pub fn duration_ms(&self) -> i64 {
        self.match_end - self.match_start
    }

    /// Non-fatal anomalies found while loading.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Report counters that go backwards between consecutive records of one entity.
fn check_counters(records: &[TelemetryRecord], indices: &[usize], warnings: &mut Vec<Warning>) {
    let counters: [(&'static str, fn(&CombatStats) -> u32); 3] = [
        ("kills", |s| s.kills),
        ("deaths", |s| s.deaths),
        ("assists", |s| s.assists),
    ];

    for pair in indices.windows(2) {
        let prev = &records[pair[0]];
        let next = &records[pair[1]];
        for (counter, read) in counters {
            let from = read(&prev.combat_stats);
            let to = read(&next.combat_stats);
            if to < from {
                let warning = Warning::MalformedCounter {
                    entity: next.entity_id.clone(),
                    counter,
                    from,
                    to,
                    timestamp_ms: next.timestamp_ms,
                };
                debug!("{warning}");
                warnings.push(warning);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "PlayerName,GameTimeMs,PosX,PosY,PosZ,Kills,Deaths\n\
                       B,300,0,0,0,0,0\n\
                       A,0,0,0,0,0,0\n\
                       A,1000,1,0,0,2,1\n\
                       B,1500,2,0,0,1,1\n\
                       A,2000,3,0,0,1,1\n";

    #[test]
    fn bounds_and_roster() {
        let timeline = Timeline::load(DOC).unwrap();
        assert_eq!(timeline.match_start(), 0);
        assert_eq!(timeline.match_end(), 2000);
        assert_eq!(timeline.duration_ms(), 2000);
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline.entities()[0].id.as_str(), "B");
        assert_eq!(timeline.entity_ordinal(&"A".into()), Some(1));
    }

    #[test]
    fn per_entity_records_are_time_ordered() {
        let timeline = Timeline::load(DOC).unwrap();
        let times: Vec<_> = timeline
            .records_for(&"A".into())
            .map(|r| r.timestamp_ms)
            .collect();
        assert_eq!(times, vec![0, 1000, 2000]);
        assert_eq!(timeline.records_for(&"nobody".into()).count(), 0);
    }

    #[test]
    fn range_queries() {
        let timeline = Timeline::load(DOC).unwrap();
        assert_eq!(timeline.records_in_range(300, 1500).len(), 2);
        assert_eq!(timeline.records_in_range(1500, 300).len(), 0);
        assert_eq!(timeline.records_until(1000).len(), 3);
        assert_eq!(timeline.records_until(-1).len(), 0);
    }

    #[test]
    fn decreasing_counter_is_a_warning() {
        let timeline = Timeline::load(DOC).unwrap();
        assert_eq!(timeline.warnings().len(), 1);
        match &timeline.warnings()[0] {
            Warning::MalformedCounter {
                entity,
                counter,
                from,
                to,
                timestamp_ms,
            } => {
                assert_eq!(entity.as_str(), "A");
                assert_eq!(*counter, "kills");
                assert_eq!((*from, *to, *timestamp_ms), (2, 1, 2000));
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }
}
