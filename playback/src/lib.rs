pub mod config;
pub mod deaths;
pub mod drawing;
pub mod heatmap;
pub mod scoreboard;
pub mod session;
pub mod trails;

pub use config::PlaybackConfig;
pub use deaths::DeathEvent;
pub use heatmap::{BoundingBox, DensityGrid, HeatmapField};
pub use scoreboard::Scoreboard;
pub use session::{PlaybackStep, Session};
pub use trails::TrailBuilder;
