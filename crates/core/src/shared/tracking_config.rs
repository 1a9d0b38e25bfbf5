use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_DETECT_INTERVAL, DEFAULT_DISPLAY_INTERVAL, DEFAULT_FACE_THRESHOLD,
    DEFAULT_IDLE_WAIT_MS, DEFAULT_STALE_AFTER_MISSES, DEFAULT_TICK_PERIOD_MS, PERSON_CLASS_ID,
};

/// Default detector confidence for person candidates.
pub const DEFAULT_DETECTOR_CONFIDENCE: f64 = 0.25;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Tunables for one tracking session.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Embedding distance cutoff; a candidate matches when strictly below.
    pub face_threshold: f64,
    /// Run the detector on frames where `counter % detect_interval == 0`.
    pub detect_interval: u64,
    /// Publish to the display on frames where `counter % display_interval == 0`.
    pub display_interval: u64,
    pub tick_period_ms: u64,
    pub idle_wait_ms: u64,
    pub person_class: u32,
    pub detector_confidence: f64,
    /// Clear the locked box after this many consecutive misses.
    /// `None` (`null` in the file) keeps the last box until a new match
    /// replaces it.
    pub stale_after_misses: Option<u32>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            face_threshold: DEFAULT_FACE_THRESHOLD,
            detect_interval: DEFAULT_DETECT_INTERVAL,
            display_interval: DEFAULT_DISPLAY_INTERVAL,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            idle_wait_ms: DEFAULT_IDLE_WAIT_MS,
            person_class: PERSON_CLASS_ID,
            detector_confidence: DEFAULT_DETECTOR_CONFIDENCE,
            stale_after_misses: Some(DEFAULT_STALE_AFTER_MISSES),
        }
    }
}

impl TrackingConfig {
    /// `<config dir>/Face Lock/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Face Lock").join("config.json"))
    }

    /// Loads and validates the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_over(path, &Self::default())
    }

    /// Loads `path` on top of `base`: keys the file leaves out keep the
    /// base value rather than the built-in default.
    pub fn load_over(path: &Path, base: &Self) -> Result<Self, ConfigError> {
        let parse_err = |source: serde_json::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: Value = serde_json::from_str(&json).map_err(parse_err)?;
        let merged = match file {
            Value::Object(overrides) => {
                let mut merged = serde_json::to_value(base).map_err(parse_err)?;
                if let Some(fields) = merged.as_object_mut() {
                    fields.extend(overrides);
                }
                merged
            }
            other => other,
        };
        let config: Self = serde_json::from_value(merged).map_err(parse_err)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path` if given, else from the default location.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_or(path, Self::default())
    }

    /// Like `load_or_default`, with `base` standing in for the built-in defaults.
    pub fn load_or(path: Option<&Path>, base: Self) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_over(path, &base);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load_over(&default, &base),
            _ => Ok(base),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.face_threshold.is_finite() && self.face_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "face_threshold must be a positive number, got {}",
                self.face_threshold
            )));
        }
        if self.detect_interval == 0 {
            return Err(ConfigError::Invalid("detect_interval must be >= 1".into()));
        }
        if self.display_interval == 0 {
            return Err(ConfigError::Invalid("display_interval must be >= 1".into()));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.detector_confidence) {
            return Err(ConfigError::Invalid(format!(
                "detector_confidence must be between 0.0 and 1.0, got {}",
                self.detector_confidence
            )));
        }
        if self.stale_after_misses == Some(0) {
            return Err(ConfigError::Invalid(
                "stale_after_misses must be >= 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}
