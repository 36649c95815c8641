use std::collections::BTreeMap;

use match_replays::ResolvedState;
use match_replays::Timeline;
use match_replays::types::{Color, EntityId};
use serde::Serialize;

/// One line of the live scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardRow {
    pub entity_id: EntityId,
    pub team: String,
    pub color: Color,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub health: f32,
    pub shield: f32,
    pub equipped_item: String,
    pub alive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamTotals {
    pub team: String,
    pub players: usize,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scoreboard {
    /// Sorted by kills (desc), then deaths (asc), then id.
    pub rows: Vec<ScoreboardRow>,
    /// Sorted by team name.
    pub teams: Vec<TeamTotals>,
}

/// Build the scoreboard for the visible entities of a resolved state.
pub fn build(timeline: &Timeline, state: &ResolvedState<'_>) -> Scoreboard {
    let mut rows: Vec<ScoreboardRow> = state
        .values()
        .map(|record| {
            // Roster team and color are fixed for the match; the record may lag behind.
            let (team, color) = match timeline.entity(&record.entity_id) {
                Some(entity) => (entity.team.clone(), entity.display_color),
                None => (record.team.clone(), [255, 255, 255]),
            };
            ScoreboardRow {
                entity_id: record.entity_id.clone(),
                team,
                color,
                kills: record.combat_stats.kills,
                deaths: record.combat_stats.deaths,
                assists: record.combat_stats.assists,
                health: record.vitals.health,
                shield: record.vitals.shield,
                equipped_item: record.equipped_item.clone(),
                alive: !record.status.dead,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.kills
            .cmp(&a.kills)
            .then(a.deaths.cmp(&b.deaths))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let mut teams: BTreeMap<&str, TeamTotals> = BTreeMap::new();
    for row in &rows {
        let totals = teams.entry(row.team.as_str()).or_insert_with(|| TeamTotals {
            team: row.team.clone(),
            ..TeamTotals::default()
        });
        totals.players += 1;
        totals.kills += row.kills;
        totals.deaths += row.deaths;
        totals.assists += row.assists;
    }
    let teams = teams.into_values().collect();

    Scoreboard { rows, teams }
}
