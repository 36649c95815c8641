use std::collections::HashMap;

use match_replays::Timeline;
use match_replays::record::DEFAULT_TEAM;
use match_replays::types::{EntityId, Point3};
use serde::Serialize;
use tracing::debug;

/// A death inferred from an increment of an entity's death counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathEvent {
    pub entity_id: EntityId,
    pub team: String,
    pub position: Point3,
    pub timestamp_ms: i64,
}

/// Walk the timeline once and emit one event per strict death-counter increase.
///
/// An entity's first record sets its baseline. A counter that goes backwards
/// only moves the baseline down; it never produces an event by itself. Output
/// is in timeline order, so repeated calls on one timeline are identical.
pub fn extract(timeline: &Timeline) -> Vec<DeathEvent> {
    let mut last_deaths: HashMap<&EntityId, u32> = HashMap::new();
    let mut last_team: HashMap<&EntityId, &str> = HashMap::new();
    let mut events = Vec::new();

    for record in timeline.records() {
        let id = &record.entity_id;
        if !record.is_free_for_all() {
            last_team.insert(id, record.team.as_str());
        }

        let deaths = record.combat_stats.deaths;
        if let Some(previous) = last_deaths.insert(id, deaths) {
            if deaths > previous {
                events.push(DeathEvent {
                    entity_id: id.clone(),
                    team: last_team.get(id).copied().unwrap_or(DEFAULT_TEAM).to_string(),
                    position: record.position,
                    timestamp_ms: record.timestamp_ms,
                });
            }
        }
    }

    debug!("extracted {} death events", events.len());
    events
}

/// The prefix of `events` at or before `upto_ms`. `events` must be time ordered.
pub fn events_until(events: &[DeathEvent], upto_ms: i64) -> &[DeathEvent] {
    let end = events.partition_point(|e| e.timestamp_ms <= upto_ms);
    &events[..end]
}
