//! Death-density heatmap.
//!
//! The bounding box depends only on the set of death events, so it is stable
//! for a whole session. The density itself depends on the active time window
//! and is recomputed from scratch whenever that window moves. Event counts
//! per match are in the hundreds, which keeps a full pass cheap.

use serde::Serialize;
use tracing::trace;

use crate::deaths::{DeathEvent, events_until};

/// Margin, in world units, added around the outermost death positions.
pub const DEFAULT_PADDING: f32 = 5.0;
/// Cells per side of the density grid.
pub const DEFAULT_RESOLUTION: usize = 128;
/// Radius of the falloff kernel in world units.
pub const DEFAULT_KERNEL_RADIUS: f32 = 3.0;

/// Axis-aligned rectangle on the horizontal (x/z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }
}

/// Bounds of every death position on x/z, grown by `padding` on each side.
///
/// With no events the box is centered on the origin.
pub fn compute_bounds(events: &[DeathEvent], padding: f32) -> BoundingBox {
    let padding = padding.max(0.0);
    let mut positions = events.iter().map(|e| (e.position.x, e.position.z));

    let Some((x, z)) = positions.next() else {
        return BoundingBox {
            min_x: -padding,
            max_x: padding,
            min_z: -padding,
            max_z: padding,
        };
    };

    let (mut min_x, mut max_x, mut min_z, mut max_z) = (x, x, z, z);
    for (x, z) in positions {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_z = min_z.min(z);
        max_z = max_z.max(z);
    }

    BoundingBox {
        min_x: min_x - padding,
        max_x: max_x + padding,
        min_z: min_z - padding,
        max_z: max_z + padding,
    }
}

/// Fixed-resolution scalar grid spanning a bounding box.
///
/// Row-major; column 0 is `min_x` and row 0 is `min_z`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGrid {
    columns: usize,
    rows: usize,
    bounds: BoundingBox,
    cells: Vec<f32>,
}

impl DensityGrid {
    pub fn new(bounds: BoundingBox, resolution: usize) -> Self {
        let resolution = resolution.max(1);
        Self {
            columns: resolution,
            rows: resolution,
            bounds,
            cells: vec![0.0; resolution * resolution],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn get(&self, column: usize, row: usize) -> Option<f32> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(self.cells[row * self.columns + column])
    }

    pub fn max(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0.0);
    }

    fn cell_size(&self) -> (f32, f32) {
        (
            self.bounds.width() / self.columns as f32,
            self.bounds.depth() / self.rows as f32,
        )
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, column: usize, row: usize) -> (f32, f32) {
        let (cell_w, cell_d) = self.cell_size();
        (
            self.bounds.min_x + (column as f32 + 0.5) * cell_w,
            self.bounds.min_z + (row as f32 + 0.5) * cell_d,
        )
    }

    /// Cell index range along one axis touched by `[lo, hi]` in world units.
    fn span(lo: f32, hi: f32, origin: f32, cell: f32, count: usize) -> (usize, usize) {
        if cell <= 0.0 {
            return (0, count - 1);
        }
        let first = ((lo - origin) / cell).floor().max(0.0) as usize;
        let last = ((hi - origin) / cell).floor().max(0.0) as usize;
        (first.min(count - 1), last.min(count - 1))
    }

    /// Add a linear falloff kernel of `radius` centered at (x, z).
    fn splat(&mut self, x: f32, z: f32, radius: f32) {
        let (cell_w, cell_d) = self.cell_size();
        let (col_lo, col_hi) =
            Self::span(x - radius, x + radius, self.bounds.min_x, cell_w, self.columns);
        let (row_lo, row_hi) =
            Self::span(z - radius, z + radius, self.bounds.min_z, cell_d, self.rows);

        for row in row_lo..=row_hi {
            for column in col_lo..=col_hi {
                let (cx, cz) = self.cell_center(column, row);
                let distance = ((cx - x).powi(2) + (cz - z).powi(2)).sqrt();
                if distance < radius {
                    self.cells[row * self.columns + column] += 1.0 - distance / radius;
                }
            }
        }
    }
}

/// Recompute `grid` from the events at or before `upto_ms`.
///
/// Returns the number of events inside the window, painted or not. `events`
/// must be time ordered.
pub fn accumulate(
    events: &[DeathEvent],
    upto_ms: i64,
    grid: &mut DensityGrid,
    kernel_radius: f32,
) -> usize {
    grid.clear();
    let active = events_until(events, upto_ms);
    if kernel_radius <= 0.0 {
        return active.len();
    }
    for event in active {
        grid.splat(event.position.x, event.position.z, kernel_radius);
    }
    active.len()
}

/// Session-owned heatmap: bounds, grid and the window the grid reflects.
#[derive(Debug, Clone)]
pub struct HeatmapField {
    padding: f32,
    resolution: usize,
    kernel_radius: f32,
    grid: DensityGrid,
    window_ms: Option<i64>,
    active_events: usize,
}

impl HeatmapField {
    pub fn new(events: &[DeathEvent], padding: f32, resolution: usize, kernel_radius: f32) -> Self {
        let bounds = compute_bounds(events, padding);
        Self {
            padding,
            resolution,
            kernel_radius,
            grid: DensityGrid::new(bounds, resolution),
            window_ms: None,
            active_events: 0,
        }
    }

    /// Bring the field up to date for the window ending at `upto_ms`.
    ///
    /// The grid is regenerated if the event bounds moved, and repainted if the
    /// window changed. Returns whether anything was recomputed.
    pub fn update(&mut self, events: &[DeathEvent], upto_ms: i64) -> bool {
        let bounds = compute_bounds(events, self.padding);
        if bounds != self.grid.bounds() {
            trace!("heatmap bounds changed, regenerating grid");
            self.grid = DensityGrid::new(bounds, self.resolution);
            self.window_ms = None;
        }
        if self.window_ms == Some(upto_ms) {
            return false;
        }

        self.active_events = accumulate(events, upto_ms, &mut self.grid, self.kernel_radius);
        self.window_ms = Some(upto_ms);
        true
    }

    pub fn grid(&self) -> &DensityGrid {
        &self.grid
    }

    pub fn bounds(&self) -> BoundingBox {
        self.grid.bounds()
    }

    pub fn window_ms(&self) -> Option<i64> {
        self.window_ms
    }

    pub fn active_events(&self) -> usize {
        self.active_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use match_replays::types::Point3;

    fn event(x: f32, z: f32, timestamp_ms: i64) -> DeathEvent {
        DeathEvent {
            entity_id: "A".into(),
            team: "none".to_string(),
            position: Point3::new(x, 0.0, z),
            timestamp_ms,
        }
    }

    #[test]
    fn bounds_contain_every_event_with_padding() {
        let events = [event(-10.0, 4.0, 0), event(25.0, -7.5, 10), event(3.0, 30.0, 20)];
        let bounds = compute_bounds(&events, 5.0);
        assert_eq!(bounds.min_x, -15.0);
        assert_eq!(bounds.max_x, 30.0);
        assert_eq!(bounds.min_z, -12.5);
        assert_eq!(bounds.max_z, 35.0);
        for e in &events {
            assert!(bounds.contains(e.position.x - 5.0, e.position.z - 5.0));
            assert!(bounds.contains(e.position.x + 5.0, e.position.z + 5.0));
        }
    }

    #[test]
    fn empty_bounds_center_on_origin() {
        let bounds = compute_bounds(&[], 2.0);
        assert_eq!(bounds.width(), 4.0);
        assert!(bounds.contains(0.0, 0.0));
    }

    #[test]
    fn only_events_in_window_contribute() {
        let events = [event(0.0, 0.0, 100), event(0.0, 0.0, 200), event(0.0, 0.0, 300)];
        let mut grid = DensityGrid::new(compute_bounds(&events, 5.0), 10);
        assert_eq!(accumulate(&events, 50, &mut grid, 2.0), 0);
        assert_eq!(grid.max(), 0.0);

        assert_eq!(accumulate(&events, 200, &mut grid, 2.0), 2);
        let two = grid.max();
        assert_eq!(accumulate(&events, 300, &mut grid, 2.0), 3);
        let three = grid.max();
        assert!((three / two - 1.5).abs() < 1e-5);
    }

    #[test]
    fn kernel_peaks_at_event_cell_and_falls_off() {
        let events = [event(0.0, 0.0, 0)];
        let mut grid = DensityGrid::new(compute_bounds(&events, 5.0), 10);
        accumulate(&events, 0, &mut grid, 3.0);
        let center = grid.get(4, 4).unwrap();
        let edge = grid.get(0, 0).unwrap();
        assert!(center > 0.0);
        assert!(center >= grid.get(2, 4).unwrap());
        assert_eq!(edge, 0.0);
        assert_eq!(grid.get(10, 0), None);
    }

    #[test]
    fn recompute_is_not_incremental() {
        let events = [event(1.0, 1.0, 0)];
        let mut grid = DensityGrid::new(compute_bounds(&events, 5.0), 8);
        accumulate(&events, 0, &mut grid, 2.0);
        let once = grid.clone();
        accumulate(&events, 0, &mut grid, 2.0);
        assert_eq!(once, grid);
    }

    #[test]
    fn field_repaints_only_on_window_change() {
        let events = [event(0.0, 0.0, 100)];
        let mut field = HeatmapField::new(&events, 5.0, 16, 2.0);
        assert!(field.update(&events, 100));
        assert_eq!(field.active_events(), 1);
        assert!(!field.update(&events, 100));
        assert!(field.update(&events, 50));
        assert_eq!(field.active_events(), 0);
        assert_eq!(field.window_ms(), Some(50));
    }

    #[test]
    fn zero_radius_still_counts_window_events() {
        let events = [event(0.0, 0.0, 100), event(1.0, 1.0, 200)];
        let mut grid = DensityGrid::new(compute_bounds(&events, 5.0), 8);
        assert_eq!(accumulate(&events, 150, &mut grid, 0.0), 1);
        assert_eq!(grid.max(), 0.0);

        let mut field = HeatmapField::new(&events, 5.0, 8, 0.0);
        field.update(&events, 200);
        assert_eq!(field.active_events(), 2);
    }

    #[test]
    fn field_regenerates_when_bounds_move() {
        let mut events = vec![event(0.0, 0.0, 0)];
        let mut field = HeatmapField::new(&events, 1.0, 4, 1.0);
        field.update(&events, 0);
        events.push(event(50.0, 50.0, 10));
        assert!(field.update(&events, 0));
        assert_eq!(field.bounds().max_x, 51.0);
    }
}
