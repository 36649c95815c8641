use std::collections::HashSet;

use serde::Serialize;

use crate::record::{TelemetryRecord, is_free_for_all};
use crate::types::{Color, Cosmetics, EntityId};

const RED_TEAM_COLOR: Color = [220, 48, 48];
const BLUE_TEAM_COLOR: Color = [48, 112, 230];
/// Used for team names missing from `TEAM_COLORS`.
const DEFAULT_ACCENT_COLOR: Color = [0, 190, 255];

const TEAM_COLORS: &[(&str, Color)] = &[
    ("red", RED_TEAM_COLOR),
    ("blue", BLUE_TEAM_COLOR),
    ("green", [60, 190, 75]),
    ("orange", [245, 140, 30]),
    ("purple", [150, 70, 210]),
    ("gold", [230, 190, 40]),
    ("brown", [140, 95, 55]),
    ("pink", [240, 110, 170]),
];

/// Colors handed out to free-for-all entities in first-seen order.
pub const FFA_PALETTE: [Color; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// A tracked participant. Built once per load from its first-seen record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub team: String,
    pub display_color: Color,
    pub cosmetics: Cosmetics,
}

impl Entity {
    pub fn is_free_for_all(&self) -> bool {
        is_free_for_all(&self.team)
    }
}

pub fn team_color(team: &str) -> Color {
    TEAM_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(team))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_ACCENT_COLOR)
}

/// Derive the roster from records in source order.
///
/// Team and cosmetics come from each entity's first record; later changes are
/// ignored. Free-for-all entities cycle through [`FFA_PALETTE`].
pub fn build_roster<'a>(records: impl IntoIterator<Item = &'a TelemetryRecord>) -> Vec<Entity> {
    let mut seen: HashSet<EntityId> = HashSet::new();
    let mut entities = Vec::new();
    let mut ffa_assigned = 0usize;

    for record in records {
        if !seen.insert(record.entity_id.clone()) {
            continue;
        }

        let display_color = if record.is_free_for_all() {
            let color = FFA_PALETTE[ffa_assigned % FFA_PALETTE.len()];
            ffa_assigned += 1;
            color
        } else {
            team_color(&record.team)
        };

        entities.push(Entity {
            id: record.entity_id.clone(),
            team: record.team.clone(),
            display_color,
            cosmetics: record.cosmetics,
        });
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::Point3;

    fn record(id: &str, team: &str) -> TelemetryRecord {
        let mut r = TelemetryRecord::new(id.into(), 0, Point3::default());
        r.team = team.to_string();
        r
    }

    #[test]
    fn ffa_entities_cycle_palette_in_first_seen_order() {
        let records = [record("A", ""), record("B", ""), record("A", "")];
        let roster = build_roster(&records);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].display_color, FFA_PALETTE[0]);
        assert_eq!(roster[1].display_color, FFA_PALETTE[1]);
    }

    #[test]
    fn repeated_entity_does_not_take_a_palette_slot() {
        let records = [record("A", ""), record("A", ""), record("B", ""), record("A", "")];
        let roster = build_roster(&records);
        let ids: Vec<&str> = roster.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(roster[1].display_color, FFA_PALETTE[1]);
    }

    #[test]
    fn ffa_palette_wraps() {
        let records: Vec<_> = (0..FFA_PALETTE.len() + 1)
            .map(|i| record(&format!("p{i}"), "none"))
            .collect();
        let roster = build_roster(&records);
        assert_eq!(roster[FFA_PALETTE.len()].display_color, FFA_PALETTE[0]);
    }

    #[test]
    fn team_entities_use_team_table_and_skip_palette() {
        let records = [
            record("A", "Red"),
            record("B", "Blue"),
            record("C", ""),
            record("D", "Cobalt"),
        ];
        let roster = build_roster(&records);
        assert_eq!(roster[0].display_color, RED_TEAM_COLOR);
        assert_eq!(roster[1].display_color, BLUE_TEAM_COLOR);
        assert_eq!(roster[2].display_color, FFA_PALETTE[0]);
        assert_eq!(roster[3].display_color, DEFAULT_ACCENT_COLOR);
    }

    #[test]
    fn first_seen_team_is_kept() {
        let records = [record("A", "Red"), record("A", "Blue")];
        let roster = build_roster(&records);
        assert_eq!(roster[0].team, "Red");
    }
}
