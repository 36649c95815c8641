use match_replays::state::DEFAULT_LOOKAHEAD_MS;
use serde::{Deserialize, Serialize};

use crate::heatmap::{DEFAULT_KERNEL_RADIUS, DEFAULT_PADDING, DEFAULT_RESOLUTION};
use crate::trails::DEFAULT_TRAIL_EPSILON;

/// Playback engine configuration, loadable from a TOML file.
///
/// All fields default to their standard values. CLI flags override config file values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How far past the cursor a record may be used to smooth sparse sampling.
    pub lookahead_tolerance_ms: i64,
    pub trail_epsilon: f32,
    pub heatmap_resolution: usize,
    pub heatmap_padding: f32,
    pub heatmap_kernel_radius: f32,
    pub loop_playback: bool,
    pub playback_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            lookahead_tolerance_ms: DEFAULT_LOOKAHEAD_MS,
            trail_epsilon: DEFAULT_TRAIL_EPSILON,
            heatmap_resolution: DEFAULT_RESOLUTION,
            heatmap_padding: DEFAULT_PADDING,
            heatmap_kernel_radius: DEFAULT_KERNEL_RADIUS,
            loop_playback: true,
            playback_speed: 1.0,
        }
    }
}

impl PlaybackConfig {
    /// Load config from a TOML file.
    #[cfg(feature = "bin")]
    pub fn load(path: &std::path::Path) -> Result<Self, rootcause::Report> {
        use rootcause::prelude::*;
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Generate a commented default TOML config string.
    pub fn generate_default_toml() -> String {
        r#"# Match Playback Configuration
# Pass with --config <path>.

# A player's first record may appear this many milliseconds before the
# cursor reaches it
lookahead_tolerance_ms = 200

# Minimum movement on any axis before a new trail point is recorded
trail_epsilon = 0.01

# Cells per side of the death heatmap grid
heatmap_resolution = 128

# World units of margin around the outermost death positions
heatmap_padding = 5.0

# Radius of each death's contribution to the heatmap, in world units
heatmap_kernel_radius = 3.0

# Wrap back to the match start when playback passes the end
loop_playback = true

# Playback rate multiplier applied to advance steps
playback_speed = 1.0
"#
        .to_string()
    }

    /// Apply CLI flag overrides.
    #[cfg(feature = "bin")]
    pub fn apply_cli_overrides(&mut self, matches: &clap::ArgMatches) {
        if matches.is_present("NO_LOOP") {
            self.loop_playback = false;
        }
        if let Some(ms) = matches.value_of("LOOKAHEAD").and_then(|v| v.parse().ok()) {
            self.lookahead_tolerance_ms = ms;
        }
        if let Some(resolution) = matches
            .value_of("HEATMAP_RESOLUTION")
            .and_then(|v| v.parse().ok())
        {
            self.heatmap_resolution = resolution;
        }
        if let Some(speed) = matches.value_of("SPEED").and_then(|v| v.parse().ok()) {
            self.playback_speed = speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_matches_defaults() {
        #[cfg(feature = "bin")]
        {
            let parsed: PlaybackConfig =
                toml::from_str(&PlaybackConfig::generate_default_toml()).unwrap();
            assert_eq!(parsed, PlaybackConfig::default());
        }
        assert!(PlaybackConfig::generate_default_toml().contains("lookahead_tolerance_ms = 200"));
    }

    #[cfg(feature = "bin")]
    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let parsed: PlaybackConfig = toml::from_str("loop_playback = false\n").unwrap();
        assert!(!parsed.loop_playback);
        assert_eq!(parsed.heatmap_resolution, DEFAULT_RESOLUTION);
    }
}
