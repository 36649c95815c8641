use serde::Serialize;

use crate::types::{CombatStats, Cosmetics, EntityId, Orientation, Point3, StatusFlags, Vitals};

pub const DEFAULT_TEAM: &str = "none";
pub const DEFAULT_EQUIPPED_ITEM: &str = "Unknown";

/// One observation of one entity at one source tick, normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub entity_id: EntityId,
    /// Team name, or `"none"` for free-for-all.
    pub team: String,
    pub timestamp_ms: i64,
    pub position: Point3,
    pub orientation: Orientation,
    pub status: StatusFlags,
    pub vitals: Vitals,
    pub equipped_item: String,
    pub cosmetics: Cosmetics,
    pub combat_stats: CombatStats,
    pub event_tag: Option<String>,
}

impl TelemetryRecord {
    /// A record with every optional field at its documented default.
    pub fn new(entity_id: EntityId, timestamp_ms: i64, position: Point3) -> Self {
        TelemetryRecord {
            entity_id,
            team: DEFAULT_TEAM.to_string(),
            timestamp_ms,
            position,
            orientation: Orientation::default(),
            status: StatusFlags::default(),
            vitals: Vitals::default(),
            equipped_item: DEFAULT_EQUIPPED_ITEM.to_string(),
            cosmetics: Cosmetics::default(),
            combat_stats: CombatStats::default(),
            event_tag: None,
        }
    }

    /// True when the record carries no team, i.e. free-for-all.
    pub fn is_free_for_all(&self) -> bool {
        is_free_for_all(&self.team)
    }
}

pub(crate) fn is_free_for_all(team: &str) -> bool {
    team.is_empty() || team.eq_ignore_ascii_case(DEFAULT_TEAM)
}
