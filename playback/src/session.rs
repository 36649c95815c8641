use match_replays::{Error, ResolvedState, StateResolver, Timeline};
use tracing::{debug, info};

use crate::config::PlaybackConfig;
use crate::deaths::{self, DeathEvent};
use crate::heatmap::HeatmapField;
use crate::scoreboard::{self, Scoreboard};
use crate::trails::{TrailBuilder, Trails};

/// Outcome of a forward playback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    Advanced,
    /// Passed the end and wrapped to the match start; trails were cleared.
    LoopedAround,
    /// Passed the end with looping disabled; the cursor sits at the end.
    ReachedEnd,
}

/// All playback state for one loaded match.
///
/// Owned by the caller. Loading another match means building another session.
pub struct Session {
    config: PlaybackConfig,
    timeline: Timeline,
    resolver: StateResolver,
    trails: TrailBuilder,
    deaths: Vec<DeathEvent>,
    heatmap: HeatmapField,
    cursor_ms: i64,
}

impl Session {
    /// Parse `raw` and build a session positioned at the match start.
    ///
    /// On error nothing is constructed.
    pub fn load_match(raw: &str, config: PlaybackConfig) -> Result<Session, Error> {
        let timeline = Timeline::load(raw)?;
        Ok(Session::from_timeline(timeline, config))
    }

    pub fn from_timeline(timeline: Timeline, config: PlaybackConfig) -> Session {
        let deaths = deaths::extract(&timeline);
        let heatmap = HeatmapField::new(
            &deaths,
            config.heatmap_padding,
            config.heatmap_resolution,
            config.heatmap_kernel_radius,
        );
        let resolver = StateResolver::new(&timeline, config.lookahead_tolerance_ms);
        let mut trails = TrailBuilder::new(config.trail_epsilon);
        let cursor_ms = timeline.match_start();
        trails.rebuild(&timeline, cursor_ms);

        info!(
            "loaded match: {} entities, {} records, {} deaths, {}ms",
            timeline.entities().len(),
            timeline.len(),
            deaths.len(),
            timeline.duration_ms()
        );
        if !timeline.warnings().is_empty() || timeline.skipped_rows() > 0 {
            debug!(
                "{} warnings, {} skipped rows during ingestion",
                timeline.warnings().len(),
                timeline.skipped_rows()
            );
        }

        Session {
            config,
            timeline,
            resolver,
            trails,
            deaths,
            heatmap,
            cursor_ms,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn cursor_ms(&self) -> i64 {
        self.cursor_ms
    }

    /// Jump the cursor to `timestamp_ms`, clamped to the match range.
    ///
    /// A jump in either direction rebuilds trails from the match start.
    pub fn seek(&mut self, timestamp_ms: i64) {
        let target = timestamp_ms.clamp(self.timeline.match_start(), self.timeline.match_end());
        debug!("seek {} -> {target}ms", self.cursor_ms);
        self.cursor_ms = target;
        self.trails.rebuild(&self.timeline, target);
    }

    /// Forward playback by `delta_ms` of wall time, scaled by the playback speed.
    pub fn advance(&mut self, delta_ms: i64) -> PlaybackStep {
        let step = (delta_ms.max(0) as f64 * self.config.playback_speed.max(0.0)) as i64;
        let next = self.cursor_ms.saturating_add(step);
        let end = self.timeline.match_end();

        if next > end {
            if self.config.loop_playback {
                self.cursor_ms = self.timeline.match_start();
                self.trails.reset();
                self.trails.advance(&self.timeline, self.cursor_ms);
                return PlaybackStep::LoopedAround;
            }
            self.cursor_ms = end;
            self.trails.advance(&self.timeline, end);
            return PlaybackStep::ReachedEnd;
        }

        self.cursor_ms = next;
        self.trails.advance(&self.timeline, next);
        PlaybackStep::Advanced
    }

    /// Per-entity state at the cursor.
    pub fn state(&mut self) -> ResolvedState<'_> {
        self.resolver.resolve(&self.timeline, self.cursor_ms)
    }

    pub fn trails(&self) -> &Trails {
        self.trails.trails()
    }

    /// Every death in the match, in time order.
    pub fn death_events(&self) -> &[DeathEvent] {
        &self.deaths
    }

    pub fn deaths_until_cursor(&self) -> &[DeathEvent] {
        deaths::events_until(&self.deaths, self.cursor_ms)
    }

    /// Heatmap for deaths up to the cursor, repainted only if the cursor moved.
    pub fn heatmap(&mut self) -> &HeatmapField {
        self.heatmap.update(&self.deaths, self.cursor_ms);
        &self.heatmap
    }

    pub fn scoreboard(&mut self) -> Scoreboard {
        let state = self.resolver.resolve(&self.timeline, self.cursor_ms);
        scoreboard::build(&self.timeline, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use match_replays::ParseError;
    use match_replays::types::EntityId;

    const DOC: &str = "PlayerName,Team,GameTimeMs,PosX,PosY,PosZ,Kills,Deaths\n\
                       A,,0,0,0,0,0,0\n\
                       B,,0,5,0,0,0,0\n\
                       A,,500,1,0,0,0,0\n\
                       B,,500,5,0,1,1,0\n\
                       A,,1000,2,0,0,0,1\n\
                       B,,1000,6,0,2,1,0\n";

    fn session() -> Session {
        Session::load_match(DOC, PlaybackConfig::default()).unwrap()
    }

    #[test]
    fn starts_at_match_start() {
        let mut session = session();
        assert_eq!(session.cursor_ms(), 0);
        assert_eq!(session.state().len(), 2);
        assert_eq!(session.trails().len(), 2);
        assert_eq!(session.death_events().len(), 1);
        assert!(session.deaths_until_cursor().is_empty());
    }

    #[test]
    fn failed_load_builds_nothing() {
        let err = Session::load_match("", PlaybackConfig::default()).err();
        assert!(matches!(err, Some(Error::Parse(ParseError::Empty))));
    }

    #[test]
    fn forward_playback_extends_trails() {
        let mut session = session();
        assert_eq!(session.advance(500), PlaybackStep::Advanced);
        assert_eq!(session.trails()[&EntityId::from("A")].len(), 2);
        assert_eq!(session.advance(500), PlaybackStep::Advanced);
        assert_eq!(session.trails()[&EntityId::from("A")].len(), 3);
        assert_eq!(session.deaths_until_cursor().len(), 1);
    }

    #[test]
    fn loop_around_resets_to_start() {
        let mut session = session();
        session.seek(900);
        assert_eq!(session.advance(200), PlaybackStep::LoopedAround);
        assert_eq!(session.cursor_ms(), 0);
        assert_eq!(session.trails()[&EntityId::from("A")].len(), 1);
        assert_eq!(session.state()[&EntityId::from("A")].timestamp_ms, 0);
    }

    #[test]
    fn no_loop_clamps_at_end() {
        let config = PlaybackConfig {
            loop_playback: false,
            ..PlaybackConfig::default()
        };
        let mut session = Session::load_match(DOC, config).unwrap();
        assert_eq!(session.advance(5000), PlaybackStep::ReachedEnd);
        assert_eq!(session.cursor_ms(), 1000);
    }

    #[test]
    fn seek_is_clamped_and_rebuilds_trails() {
        let mut session = session();
        session.seek(10_000);
        assert_eq!(session.cursor_ms(), 1000);
        session.seek(-50);
        assert_eq!(session.cursor_ms(), 0);
        assert_eq!(session.trails()[&EntityId::from("B")].len(), 1);
        session.seek(600);
        assert_eq!(session.trails()[&EntityId::from("B")].len(), 2);
    }

    #[test]
    fn playback_speed_scales_steps() {
        let config = PlaybackConfig {
            playback_speed: 2.0,
            ..PlaybackConfig::default()
        };
        let mut session = Session::load_match(DOC, config).unwrap();
        session.advance(250);
        assert_eq!(session.cursor_ms(), 500);
    }

    #[test]
    fn heatmap_follows_cursor() {
        let mut session = session();
        assert_eq!(session.heatmap().active_events(), 0);
        session.seek(1000);
        let field = session.heatmap();
        assert_eq!(field.active_events(), 1);
        assert_eq!(field.window_ms(), Some(1000));
        assert!(field.grid().max() > 0.0);
    }

    #[test]
    fn scoreboard_reflects_cursor() {
        let mut session = session();
        session.seek(1000);
        let board = session.scoreboard();
        assert_eq!(board.rows[0].entity_id.as_str(), "B");
        assert_eq!(board.rows[0].kills, 1);
        assert_eq!(board.rows[1].deaths, 1);
    }

    #[test]
    fn scoreboard_agrees_with_death_markers() {
        let mut session = session();
        for cursor in [800, 850, 999, 1000] {
            session.seek(cursor);
            let shown = session.deaths_until_cursor().len() as u32;
            let board = session.scoreboard();
            let total: u32 = board.rows.iter().map(|row| row.deaths).sum();
            assert_eq!(total, shown, "cursor {cursor}");
        }
    }
}
