use std::collections::HashMap;

use match_replays::Timeline;
use match_replays::types::{EntityId, Point3};
use tracing::trace;

/// Minimum per-axis movement, in world units, before a new trail point is kept.
pub const DEFAULT_TRAIL_EPSILON: f32 = 0.01;

pub type Trails = HashMap<EntityId, Vec<Point3>>;

/// Decimated movement polylines per entity, bounded by a playback cursor.
///
/// Forward playback appends incrementally. Anything else (scrubbing, seeking
/// backwards) goes through [`TrailBuilder::rebuild`], since points cannot be
/// removed from an incremental trail without replaying it.
#[derive(Debug, Clone)]
pub struct TrailBuilder {
    epsilon: f32,
    trails: Trails,
    /// Timeline records already fed, in timeline order.
    consumed: usize,
    cursor_ms: Option<i64>,
}

impl TrailBuilder {
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
            trails: HashMap::new(),
            consumed: 0,
            cursor_ms: None,
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn trails(&self) -> &Trails {
        &self.trails
    }

    pub fn trail(&self, entity: &EntityId) -> &[Point3] {
        self.trails.get(entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Cursor the trails currently reflect, if any.
    pub fn cursor_ms(&self) -> Option<i64> {
        self.cursor_ms
    }

    /// Drop every trail. Used when playback loops back to the match start.
    pub fn reset(&mut self) {
        self.trails.clear();
        self.consumed = 0;
        self.cursor_ms = None;
    }

    /// Recompute every trail from the start of the timeline up to `upto_ms`.
    pub fn rebuild(&mut self, timeline: &Timeline, upto_ms: i64) -> &Trails {
        trace!("rebuilding trails up to {upto_ms}ms");
        self.reset();
        self.feed(timeline, upto_ms);
        &self.trails
    }

    /// Move the cursor to `upto_ms`, appending when moving forward and
    /// rebuilding otherwise.
    pub fn advance(&mut self, timeline: &Timeline, upto_ms: i64) -> &Trails {
        match self.cursor_ms {
            Some(cursor) if upto_ms < cursor => {
                self.rebuild(timeline, upto_ms);
            }
            _ => self.feed(timeline, upto_ms),
        }
        &self.trails
    }

    /// Append `point` to `entity`'s trail unless it is within epsilon of the
    /// last point on every axis. Returns whether the point was kept.
    pub fn extend(&mut self, entity: &EntityId, point: Point3) -> bool {
        let trail = self.trails.entry(entity.clone()).or_default();
        let keep = trail
            .last()
            .is_none_or(|last| point.moved_from(last, self.epsilon));
        if keep {
            trail.push(point);
        }
        keep
    }

    fn feed(&mut self, timeline: &Timeline, upto_ms: i64) {
        let records = timeline.records_until(upto_ms);
        if let Some(pending) = records.get(self.consumed..) {
            for record in pending {
                self.extend(&record.entity_id, record.position);
            }
        }
        self.consumed = self.consumed.max(records.len());
        self.cursor_ms = Some(upto_ms);
    }
}

impl Default for TrailBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "PlayerName,GameTimeMs,PosX,PosY,PosZ\n\
                       A,0,0,0,0\n\
                       B,0,10,0,0\n\
                       A,100,0.001,0,0\n\
                       A,200,1,0,0\n\
                       B,250,10,0,0\n\
                       A,300,2,0,0\n\
                       A,400,2,0,-3\n";

    fn timeline() -> Timeline {
        Timeline::load(DOC).unwrap()
    }

    fn xs(builder: &TrailBuilder, id: &str) -> Vec<f32> {
        builder.trail(&id.into()).iter().map(|p| p.x).collect()
    }

    #[test]
    fn stationary_samples_are_decimated() {
        let timeline = timeline();
        let mut builder = TrailBuilder::default();
        builder.rebuild(&timeline, 1000);
        assert_eq!(xs(&builder, "A"), vec![0.0, 1.0, 2.0, 2.0]);
        assert_eq!(builder.trail(&"B".into()).len(), 1);
        // Z is inverted at parse time.
        assert_eq!(builder.trail(&"A".into())[3].z, 3.0);
    }

    #[test]
    fn rebuild_is_bounded_by_cursor() {
        let timeline = timeline();
        let mut builder = TrailBuilder::default();
        builder.rebuild(&timeline, 250);
        assert_eq!(xs(&builder, "A"), vec![0.0, 1.0]);
        assert_eq!(builder.cursor_ms(), Some(250));
    }

    #[test]
    fn rebuild_to_same_cursor_is_idempotent() {
        let timeline = timeline();
        let mut builder = TrailBuilder::default();
        let first = builder.rebuild(&timeline, 300).clone();
        let second = builder.rebuild(&timeline, 300).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn incremental_advance_matches_rebuild() {
        let timeline = timeline();
        let mut incremental = TrailBuilder::default();
        for cursor in [0, 50, 150, 200, 260, 400] {
            incremental.advance(&timeline, cursor);
        }
        let mut full = TrailBuilder::default();
        full.rebuild(&timeline, 400);
        assert_eq!(incremental.trails(), full.trails());
    }

    #[test]
    fn backward_advance_rebuilds() {
        let timeline = timeline();
        let mut builder = TrailBuilder::default();
        builder.advance(&timeline, 400);
        builder.advance(&timeline, 200);
        assert_eq!(xs(&builder, "A"), vec![0.0, 1.0]);
    }

    #[test]
    fn reset_empties_trails() {
        let timeline = timeline();
        let mut builder = TrailBuilder::default();
        builder.advance(&timeline, 400);
        builder.reset();
        assert!(builder.trails().is_empty());
        assert_eq!(builder.cursor_ms(), None);
    }

    #[test]
    fn extend_reports_kept_points() {
        let mut builder = TrailBuilder::new(0.5);
        let id = EntityId::from("A");
        assert!(builder.extend(&id, Point3::new(0.0, 0.0, 0.0)));
        assert!(!builder.extend(&id, Point3::new(0.4, 0.0, -0.4)));
        assert!(builder.extend(&id, Point3::new(0.0, 0.6, 0.0)));
        assert_eq!(builder.trail(&id).len(), 2);
    }
}
