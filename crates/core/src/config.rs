//! Editor configuration.
//!
//! Defaults cover normal use. Values can be overridden from environment
//! variables or a JSON file, or set programmatically with the `with_*`
//! builders.

use doc_model::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for gesture capture, hit testing and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Rectangles must be strictly larger than this on both sides (document units).
    pub min_gesture_size: f32,
    /// Maximum number of retained canvas snapshots.
    pub history_depth: usize,
    /// Freehand samples closer than this to the last kept point are skipped
    /// (screen pixels).
    pub min_point_distance: f32,
    /// Freehand paths stop growing past this many points.
    pub max_points_per_path: usize,
    /// Extra reach for click hit tests on thin geometry (document units).
    pub hit_tolerance: f32,
    /// Radius of the comment marker and its hover area (document units).
    pub comment_marker_radius: f32,
    pub highlight_color: Rgba,
    pub shape_color: Rgba,
    pub shape_stroke_color: Rgba,
    pub shape_stroke_width: f32,
    pub pen_color: Rgba,
    pub pen_width: f32,
    pub comment_color: Rgba,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_gesture_size: 10.0,
            history_depth: 50,
            min_point_distance: 0.5,
            max_points_per_path: 5000,
            hit_tolerance: 4.0,
            comment_marker_radius: 8.0,
            highlight_color: Rgba::HIGHLIGHT_YELLOW,
            shape_color: Rgba::INK_BLUE,
            shape_stroke_color: Rgba::INK_BLUE,
            shape_stroke_width: 2.0,
            pen_color: Rgba::MARKUP_RED,
            pen_width: 2.0,
            comment_color: Rgba::HIGHLIGHT_YELLOW,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

impl EditorConfig {
    pub fn with_min_gesture_size(mut self, size: f32) -> Self {
        self.min_gesture_size = size;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_min_point_distance(mut self, distance: f32) -> Self {
        self.min_point_distance = distance;
        self
    }

    pub fn with_max_points_per_path(mut self, max: usize) -> Self {
        self.max_points_per_path = max;
        self
    }

    pub fn with_hit_tolerance(mut self, tolerance: f32) -> Self {
        self.hit_tolerance = tolerance;
        self
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// - `QRDECK_MIN_GESTURE_SIZE`
    /// - `QRDECK_HISTORY_DEPTH`
    /// - `QRDECK_MIN_POINT_DISTANCE`
    /// - `QRDECK_MAX_POINTS_PER_PATH`
    /// - `QRDECK_HIT_TOLERANCE`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("QRDECK_MIN_GESTURE_SIZE") {
            config.min_gesture_size = parse_value("QRDECK_MIN_GESTURE_SIZE", &value)?;
        }
        if let Some(value) = lookup("QRDECK_HISTORY_DEPTH") {
            config.history_depth = parse_value("QRDECK_HISTORY_DEPTH", &value)?;
        }
        if let Some(value) = lookup("QRDECK_MIN_POINT_DISTANCE") {
            config.min_point_distance = parse_value("QRDECK_MIN_POINT_DISTANCE", &value)?;
        }
        if let Some(value) = lookup("QRDECK_MAX_POINTS_PER_PATH") {
            config.max_points_per_path = parse_value("QRDECK_MAX_POINTS_PER_PATH", &value)?;
        }
        if let Some(value) = lookup("QRDECK_HIT_TOLERANCE") {
            config.hit_tolerance = parse_value("QRDECK_HIT_TOLERANCE", &value)?;
        }

        config.validate()
    }

    /// Loads configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.min_gesture_size.is_finite() || self.min_gesture_size < 0.0 {
            return Err(ConfigError::InvalidValue("min_gesture_size".to_owned()));
        }
        if self.history_depth == 0 {
            return Err(ConfigError::InvalidValue("history_depth".to_owned()));
        }
        if !self.min_point_distance.is_finite() || self.min_point_distance < 0.0 {
            return Err(ConfigError::InvalidValue("min_point_distance".to_owned()));
        }
        if self.max_points_per_path < 2 {
            return Err(ConfigError::InvalidValue("max_points_per_path".to_owned()));
        }
        if !self.hit_tolerance.is_finite() || self.hit_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue("hit_tolerance".to_owned()));
        }
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue(key.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_editor_behaviour() {
        let config = EditorConfig::default();
        assert_eq!(config.min_gesture_size, 10.0);
        assert_eq!(config.history_depth, 50);
    }

    #[test]
    fn env_overrides_are_applied() {
        let vars: HashMap<&str, &str> =
            [("QRDECK_HISTORY_DEPTH", "12"), ("QRDECK_MIN_GESTURE_SIZE", "4.5")].into();
        let config =
            EditorConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
                .expect("valid env");

        assert_eq!(config.history_depth, 12);
        assert_eq!(config.min_gesture_size, 4.5);
        assert_eq!(config.hit_tolerance, EditorConfig::default().hit_tolerance);
    }

    #[test]
    fn env_rejects_garbage() {
        let err = EditorConfig::from_lookup(|key| {
            (key == "QRDECK_HISTORY_DEPTH").then(|| "lots".to_owned())
        })
        .expect_err("should reject");
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "QRDECK_HISTORY_DEPTH"));
    }

    #[test]
    fn file_keeps_defaults_for_missing_keys() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("editor.json");
        fs::write(&path, r##"{ "history_depth": 5, "pen_color": "#112233" }"##)
            .expect("write config");

        let config = EditorConfig::from_file(&path).expect("load should succeed");
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.pen_color, Rgba::rgb(0x11, 0x22, 0x33));
        assert_eq!(config.min_gesture_size, 10.0);
    }

    #[test]
    fn zero_history_depth_is_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "history_depth": 0 }"#),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
