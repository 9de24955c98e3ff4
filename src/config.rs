use crate::error::{LinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning for [`Reconciler`](crate::Reconciler).
///
/// A correction is smoothed only when its position error lies in
/// `[min_adjust_length, max_adjust_length]`, the body moves at least
/// `min_adjust_speed`, and the resulting blend time
/// `error * adjust_length_threshold / speed` does not exceed
/// `max_adjust_time`. Lengths are in world units, speeds in units per
/// second and times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    pub smooth_rotation: bool,
    pub adjust_vertical_offset: bool,
    pub min_adjust_length: f32,
    pub max_adjust_length: f32,
    pub min_adjust_speed: f32,
    pub max_adjust_time: f32,
    pub adjust_length_threshold: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smooth_rotation: true,
            adjust_vertical_offset: true,
            min_adjust_length: 0.1,
            max_adjust_length: 4.0,
            min_adjust_speed: 0.3,
            max_adjust_time: 2.0,
            adjust_length_threshold: 2.0,
        }
    }
}

impl SmoothingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_smooth_rotation(mut self, enabled: bool) -> Self {
        self.smooth_rotation = enabled;
        self
    }

    pub fn with_vertical_offset_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_vertical_offset = enabled;
        self
    }

    pub fn with_adjust_length(mut self, min: f32, max: f32) -> Self {
        self.min_adjust_length = min;
        self.max_adjust_length = max;
        self
    }

    pub fn with_min_adjust_speed(mut self, speed: f32) -> Self {
        self.min_adjust_speed = speed;
        self
    }

    pub fn with_max_adjust_time(mut self, seconds: f32) -> Self {
        self.max_adjust_time = seconds;
        self
    }

    pub fn with_adjust_length_threshold(mut self, threshold: f32) -> Self {
        self.adjust_length_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("min_adjust_length", self.min_adjust_length),
            ("max_adjust_length", self.max_adjust_length),
            ("min_adjust_speed", self.min_adjust_speed),
            ("max_adjust_time", self.max_adjust_time),
            ("adjust_length_threshold", self.adjust_length_threshold),
        ];

        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 {
                return Err(LinkError::InvalidConfig(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }

        if self.min_adjust_length >= self.max_adjust_length {
            return Err(LinkError::InvalidConfig(format!(
                "min_adjust_length ({}) must be below max_adjust_length ({})",
                self.min_adjust_length, self.max_adjust_length
            )));
        }

        Ok(())
    }

    /// Parses and validates a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SmoothingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_builder() {
        let config = SmoothingConfig::new()
            .with_adjust_length(0.05, 50.0)
            .with_min_adjust_speed(0.1)
            .with_max_adjust_time(1.5)
            .with_adjust_length_threshold(0.5)
            .with_smooth_rotation(false);

        assert_eq!(config.min_adjust_length, 0.05);
        assert_eq!(config.max_adjust_length, 50.0);
        assert_eq!(config.min_adjust_speed, 0.1);
        assert_eq!(config.max_adjust_time, 1.5);
        assert_eq!(config.adjust_length_threshold, 0.5);
        assert!(!config.smooth_rotation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let zero_speed = SmoothingConfig::new().with_min_adjust_speed(0.0);
        assert!(matches!(zero_speed.validate(), Err(LinkError::InvalidConfig(_))));

        let nan_time = SmoothingConfig::new().with_max_adjust_time(f32::NAN);
        assert!(nan_time.validate().is_err());

        let inverted = SmoothingConfig::new().with_adjust_length(5.0, 1.0);
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_json_partial_document() {
        let config = SmoothingConfig::from_json_str(
            r#"{ "max_adjust_length": 10.0, "smooth_rotation": false }"#,
        )
        .unwrap();

        assert_eq!(config.max_adjust_length, 10.0);
        assert!(!config.smooth_rotation);
        assert_eq!(config.min_adjust_length, 0.1);
    }

    #[test]
    fn test_json_round_trip_and_rejection() {
        let config = SmoothingConfig::new().with_max_adjust_time(3.0);
        let json = config.to_json().unwrap();
        assert_eq!(SmoothingConfig::from_json_str(&json).unwrap(), config);

        assert!(matches!(
            SmoothingConfig::from_json_str(r#"{ "min_adjust_speed": -1.0 }"#),
            Err(LinkError::InvalidConfig(_))
        ));
        assert!(matches!(
            SmoothingConfig::from_json_str("not json"),
            Err(LinkError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SmoothingConfig::load("/nonexistent/smoothing.json"),
            Err(LinkError::Io(_))
        ));
    }
}
