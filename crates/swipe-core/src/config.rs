//! Engine configuration
//!
//! Every section falls back to its defaults, so a TOML file only needs the
//! fields it wants to change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Tap/swipe classification and path sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Movement (window px) that must be exceeded before a swipe can start
    pub deadzone_px: f64,
    /// Time (ms) that must be exceeded before a swipe can start
    pub time_threshold_ms: u64,
    /// Exponential smoothing factor applied to moves, in (0, 1]
    pub smoothing_alpha: f64,
    /// Minimum distance (window px) between appended samples
    pub resample_distance_px: f64,
    /// Completes a swipe when the pointer rests this long (ms, 0 = disabled)
    pub stationary_timeout_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            deadzone_px: 10.0,
            time_threshold_ms: 35,
            smoothing_alpha: 0.40,
            resample_distance_px: 7.0,
            stationary_timeout_ms: 0,
        }
    }
}

/// Path to key-sequence mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// New-key distance must be at most this fraction of current-key distance
    pub switch_ratio: f64,
    /// ...and improve on it by at least this many px
    pub switch_gap_px: f64,
    /// Consecutive wins a candidate key needs otherwise
    pub consecutive_samples: u32,
    /// Visits shorter than this are bounces when flanked by the same key
    pub min_dwell: u32,
    /// Samples farther than this from every centroid are noise (0 = no cutoff)
    pub noise_cutoff_px: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            switch_ratio: 0.72,
            switch_gap_px: 6.0,
            consecutive_samples: 2,
            min_dwell: 2,
            noise_cutoff_px: 100.0,
        }
    }
}

/// Key-sequence candidate scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub edit_weight: f64,
    pub bigram_weight: f64,
    pub frequency_weight: f64,
    pub spatial_weight: f64,
    pub edit_distance_limit: usize,
    pub length_tolerance: usize,
    pub min_score: f64,
    pub max_candidates: usize,
    pub min_sequence_len: usize,
    /// Average distance (px) at which the spatial term reaches zero
    pub spatial_scale_px: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            edit_weight: 2.2,
            bigram_weight: 1.0,
            frequency_weight: 0.8,
            spatial_weight: 1.5,
            edit_distance_limit: 7,
            length_tolerance: 3,
            min_score: -5.0,
            max_candidates: 8,
            min_sequence_len: 2,
            spatial_scale_px: 60.0,
        }
    }
}

/// Whole-gesture template matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub sample_points: usize,
    pub prune_radius_px: f64,
    /// Neighbor radius in multiples of the layout's key pitch
    pub neighbor_pitch: f64,
    pub min_pruned: usize,
    pub length_tolerance: usize,
    pub shape_weight: f64,
    pub location_weight: f64,
    pub frequency_weight: f64,
    pub endpoint_bonus: f64,
    pub max_candidates: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            sample_points: 64,
            prune_radius_px: 40.0,
            neighbor_pitch: 1.5,
            min_pruned: 10,
            length_tolerance: 3,
            shape_weight: 0.5,
            location_weight: 0.5,
            frequency_weight: 0.3,
            endpoint_bonus: 0.15,
            max_candidates: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    KeySequence,
    Template,
}

impl std::str::FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "key_sequence" | "keys" => Ok(Strategy::KeySequence),
            "template" | "shark2" => Ok(Strategy::Template),
            other => Err(Error::InvalidConfig(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: Strategy,
    pub gesture: GestureConfig,
    pub mapper: MapperConfig,
    pub scoring: ScoringConfig,
    pub template: TemplateConfig,
}

impl EngineConfig {
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        if !(g.deadzone_px >= 0.0) {
            return Err(invalid(format!("gesture.deadzone_px must be >= 0, got {}", g.deadzone_px)));
        }
        if !(g.smoothing_alpha > 0.0 && g.smoothing_alpha <= 1.0) {
            return Err(invalid(format!(
                "gesture.smoothing_alpha must be in (0, 1], got {}",
                g.smoothing_alpha
            )));
        }
        if !(g.resample_distance_px >= 0.0) {
            return Err(invalid(format!(
                "gesture.resample_distance_px must be >= 0, got {}",
                g.resample_distance_px
            )));
        }

        let m = &self.mapper;
        if !(m.switch_ratio > 0.0 && m.switch_ratio <= 1.0) {
            return Err(invalid(format!("mapper.switch_ratio must be in (0, 1], got {}", m.switch_ratio)));
        }
        if !(m.switch_gap_px >= 0.0) {
            return Err(invalid(format!("mapper.switch_gap_px must be >= 0, got {}", m.switch_gap_px)));
        }
        if m.consecutive_samples == 0 {
            return Err(invalid("mapper.consecutive_samples must be > 0".to_string()));
        }
        if !(m.noise_cutoff_px >= 0.0) {
            return Err(invalid(format!(
                "mapper.noise_cutoff_px must be >= 0, got {}",
                m.noise_cutoff_px
            )));
        }

        let s = &self.scoring;
        if s.max_candidates == 0 {
            return Err(invalid("scoring.max_candidates must be > 0".to_string()));
        }
        if !(s.spatial_scale_px > 0.0) {
            return Err(invalid(format!(
                "scoring.spatial_scale_px must be > 0, got {}",
                s.spatial_scale_px
            )));
        }
        if [s.edit_weight, s.bigram_weight, s.frequency_weight, s.spatial_weight]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(invalid("scoring weights must be finite and >= 0".to_string()));
        }

        let t = &self.template;
        if t.sample_points < 2 {
            return Err(invalid(format!("template.sample_points must be >= 2, got {}", t.sample_points)));
        }
        if !(t.prune_radius_px > 0.0) {
            return Err(invalid(format!(
                "template.prune_radius_px must be > 0, got {}",
                t.prune_radius_px
            )));
        }
        if t.max_candidates == 0 {
            return Err(invalid("template.max_candidates must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, Strategy::KeySequence);
        assert_eq!(config.gesture.deadzone_px, 10.0);
        assert_eq!(config.gesture.time_threshold_ms, 35);
        assert_eq!(config.mapper.switch_ratio, 0.72);
        assert_eq!(config.scoring.max_candidates, 8);
        assert_eq!(config.template.sample_points, 64);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
strategy = "template"

[gesture]
deadzone_px = 12.0
"#,
        )
        .unwrap();
        assert_eq!(config.strategy, Strategy::Template);
        assert_eq!(config.gesture.deadzone_px, 12.0);
        assert_eq!(config.gesture.time_threshold_ms, 35);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut original = EngineConfig::default();
        original.scoring.min_score = -3.5;
        original.mapper.noise_cutoff_px = 0.0;
        let text = original.to_toml().unwrap();
        assert!(text.contains("[scoring]"));
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), original);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = EngineConfig::default();
        config.gesture.smoothing_alpha = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.mapper.consecutive_samples = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.template.sample_points = 1;
        assert!(config.validate().is_err());

        assert!(EngineConfig::from_toml_str("[scoring]\nmax_candidates = 0\n").is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("[gesture\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[mapper]\nmin_dwell = 3\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.mapper.min_dwell, 3);

        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("template".parse::<Strategy>().unwrap(), Strategy::Template);
        assert_eq!("key-sequence".parse::<Strategy>().unwrap(), Strategy::KeySequence);
        assert!("neural".parse::<Strategy>().is_err());
    }
}
