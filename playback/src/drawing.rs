use image::{Rgba, RgbaImage};

use match_replays::types::Color;

use crate::heatmap::DensityGrid;

/// Cold to hot. Density is mapped linearly across the stops.
const HEAT_RAMP: [Color; 5] = [
    [0, 0, 255],
    [0, 255, 255],
    [0, 255, 0],
    [255, 255, 0],
    [255, 0, 0],
];
const MIN_ALPHA: f32 = 64.0;
const MAX_ALPHA: f32 = 220.0;

/// Color for a density normalized to 0..=1. Zero density is fully transparent.
pub fn heat_color(t: f32) -> Rgba<u8> {
    if t <= 0.0 || !t.is_finite() {
        return Rgba([0, 0, 0, 0]);
    }
    let t = t.min(1.0);
    let scaled = t * (HEAT_RAMP.len() - 1) as f32;
    let idx = (scaled.floor() as usize).min(HEAT_RAMP.len() - 2);
    let frac = scaled - idx as f32;
    let (from, to) = (HEAT_RAMP[idx], HEAT_RAMP[idx + 1]);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * frac).round() as u8;
    let alpha = (MIN_ALPHA + (MAX_ALPHA - MIN_ALPHA) * t).round() as u8;
    Rgba([lerp(from[0], to[0]), lerp(from[1], to[1]), lerp(from[2], to[2]), alpha])
}

/// Rasterize a density grid, `cell_px` pixels per cell.
///
/// The image's top row is the grid's maximum Z, matching a top-down map view.
pub fn render_heatmap(grid: &DensityGrid, cell_px: u32) -> RgbaImage {
    let cell_px = cell_px.max(1);
    let columns = grid.columns() as u32;
    let rows = grid.rows() as u32;
    let max = grid.max();
    let mut image = RgbaImage::new(columns * cell_px, rows * cell_px);

    for row in 0..rows {
        for column in 0..columns {
            let value = grid.get(column as usize, row as usize).unwrap_or(0.0);
            let t = if max > 0.0 { value / max } else { 0.0 };
            let color = heat_color(t);
            let top = (rows - 1 - row) * cell_px;
            let left = column * cell_px;
            for dy in 0..cell_px {
                for dx in 0..cell_px {
                    image.put_pixel(left + dx, top + dy, color);
                }
            }
        }
    }

    image
}
