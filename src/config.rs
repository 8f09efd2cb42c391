//! Configuration management for analysis and output tuning
//!
//! This module provides runtime configuration loading from JSON files so
//! thresholds, cluster counts and the message target can be adjusted on site
//! without recompilation. Every section has defaults matching the
//! installation, and missing fields fall back to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::analysis::{
    CompositionParams, FrequencyParams, HarmonyParams, HistogramParams, HueSpreadParams,
    NoiseParams, SegmentationParams,
};
use crate::error::{AnalysisError, ErrorCode, TransportError};

/// Default location of the config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "assets/frame_features.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub input: InputConfig,
    pub osc: OscConfig,
}

/// Parameters of every analysis index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub composition: CompositionParams,
    pub segmentation: SegmentationParams,
    pub harmony: HarmonyParams,
    pub hue_spread: HueSpreadParams,
    pub frequency: FrequencyParams,
    pub noise: NoiseParams,
    pub histogram: HistogramParams,
}

impl AnalysisConfig {
    /// Check every section, reporting the first invalid parameter
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.composition.validate()?;
        self.segmentation.validate()?;
        self.harmony.validate()?;
        self.hue_spread.validate()?;
        self.frequency.validate()?;
        self.noise.validate()?;
        self.histogram.validate()
    }
}

/// Frame ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Resize frames to `[width, height]` before analysis
    pub resize_to: Option<[u32; 2]>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            // the live capture ran at 640x480
            resize_to: Some([640, 480]),
        }
    }
}

/// Outbound message settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    /// Receiver host (the sound engine)
    pub host: String,
    /// Receiver UDP port
    pub port: u16,
    /// Prepended to every address, e.g. "/camera"
    pub address_prefix: String,
    /// Colour fractions below this are sent as 0.0
    pub presence_floor: f64,
    /// Colour fractions above this are sent as 1.0
    pub saturation_ceiling: f64,
    /// Tempo sent as `/bpm` when set
    pub bpm: Option<i32>,
    /// Morph duration sent as `/morphtime` when set
    pub morph_time: Option<f32>,
    /// Send `/morph 1` after the features to trigger the crossfade
    pub trigger_morph: bool,
    /// Pause before the morph trigger, milliseconds
    pub morph_delay_ms: u64,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            address_prefix: String::new(),
            presence_floor: 0.05,
            saturation_ceiling: 0.3,
            bpm: Some(120),
            morph_time: Some(5.0),
            trigger_morph: true,
            morph_delay_ms: 1000,
        }
    }
}

impl OscConfig {
    pub fn validate(&self) -> Result<(), TransportError> {
        for (name, value) in [
            ("presence_floor", self.presence_floor),
            ("saturation_ceiling", self.saturation_ceiling),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(TransportError::InvalidSetting {
                    name,
                    reason: format!("colour gates must lie in [0, 1] (got {})", value),
                });
            }
        }
        if self.presence_floor > self.saturation_ceiling {
            return Err(TransportError::InvalidSetting {
                name: "presence_floor",
                reason: format!(
                    "floor {} is above ceiling {}",
                    self.presence_floor, self.saturation_ceiling
                ),
            });
        }
        if self.port == 0 {
            return Err(TransportError::InvalidSetting {
                name: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// First problem found by [`AppConfig::validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Analysis(AnalysisError),
    Transport(TransportError),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::Analysis(err) => err.code(),
            ConfigError::Transport(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::Analysis(err) => err.message(),
            ConfigError::Transport(err) => err.message(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Analysis(err) => fmt::Display::fmt(err, f),
            ConfigError::Transport(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<AnalysisError> for ConfigError {
    fn from(err: AnalysisError) -> Self {
        ConfigError::Analysis(err)
    }
}

impl From<TransportError> for ConfigError {
    fn from(err: TransportError) -> Self {
        ConfigError::Transport(err)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults (with a warning) if the file
    /// is missing or not valid JSON
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from [`DEFAULT_CONFIG_PATH`]
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        if let Some([width, height]) = self.input.resize_to {
            if width == 0 || height == 0 {
                return Err(AnalysisError::EmptyFrame { width, height }.into());
            }
        }
        self.osc.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.composition.black_threshold, 25.0);
        assert_eq!(config.analysis.composition.white_threshold, 75.0);
        assert_eq!(config.analysis.segmentation.kmeans.clusters, 20);
        assert_eq!(config.analysis.harmony.kmeans.clusters, 6);
        assert_eq!(config.analysis.frequency.radius_divisor, 4);
        assert_eq!(config.analysis.noise.variance_divisor, 500.0);
        assert_eq!(config.osc.port, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "analysis": { "noise": { "variance_divisor": 250.0 } }, "osc": { "port": 9000 } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.analysis.noise.variance_divisor, 250.0);
        assert_eq!(parsed.analysis.harmony, HarmonyParams::default());
        assert_eq!(parsed.osc.port, 9000);
        assert_eq!(parsed.osc.host, "127.0.0.1");
    }

    #[test]
    fn test_partial_kmeans_keeps_the_rest_of_the_file() {
        let path = std::env::temp_dir().join(format!(
            "frame-features-config-{}-partial-kmeans.json",
            std::process::id()
        ));
        let json = r#"{ "analysis": { "harmony": { "kmeans": { "clusters": 4 } } }, "osc": { "port": 9000 } }"#;
        fs::write(&path, json).unwrap();

        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.analysis.harmony.kmeans.clusters, 4);
        assert_eq!(config.analysis.harmony.kmeans.attempts, 10);
        assert_eq!(config.osc.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.analysis.composition.white_threshold = 256.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analysis.segmentation.kmeans.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.input.resize_to = Some([0, 480]);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.osc.presence_floor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_osc_settings_are_transport_errors() {
        let osc = OscConfig {
            saturation_ceiling: 1.5,
            ..OscConfig::default()
        };
        assert!(matches!(
            osc.validate(),
            Err(TransportError::InvalidSetting {
                name: "saturation_ceiling",
                ..
            })
        ));

        let mut config = AppConfig::default();
        config.osc.port = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), crate::error::TransportErrorCodes::INVALID_SETTING);
        assert!(err.message().contains("port"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/frame_features.json");
        assert_eq!(config, AppConfig::default());
    }
}
