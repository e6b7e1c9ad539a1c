//! # Startup Configuration
//!
//! Persistence loads this once at startup (TOML) and hands it to the frame
//! coordinator; the engine treats the values as external, already-validated
//! input after [`EngineConfig::validate`] passes. Runtime changes go through
//! the activity tracker's setters instead.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use veldra_shared::constants::{
    DEFAULT_CACHE_DURATION, DEFAULT_ENTITY_CAPACITY, DEFAULT_TARGET_TPS,
    DEFAULT_UPDATE_DISTANCE, DEFAULT_VIEW_PADDING, DEFAULT_WORKER_THREADS,
};

/// Engine startup configuration.
///
/// Every field has a default, so a partial (or empty) config file is valid.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Radius in world units around the camera entity within which entities
    /// are always stepped.
    pub update_distance: f32,
    /// Seconds an out-of-range entity's state stays valid before a forced
    /// re-evaluation step.
    pub cache_duration_secs: f32,
    /// Padding in world units around the camera's native view bounds.
    pub view_padding: f32,
    /// Worker threads in the task executor pool. Zero means all work runs
    /// on the coordinator thread (useful for deterministic tests).
    pub worker_threads: usize,
    /// Pre-allocated entity capacity.
    pub entity_capacity: usize,
    /// Target simulation ticks per second.
    pub target_tps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_distance: DEFAULT_UPDATE_DISTANCE,
            cache_duration_secs: DEFAULT_CACHE_DURATION.as_secs_f32(),
            view_padding: DEFAULT_VIEW_PADDING,
            worker_threads: DEFAULT_WORKER_THREADS,
            entity_capacity: DEFAULT_ENTITY_CAPACITY,
            target_tps: DEFAULT_TARGET_TPS,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and the specific
    /// validation error for out-of-range values.
    pub fn from_toml(source: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        tracing::debug!(?config, "config loaded");
        Ok(config)
    }

    /// Validates all fields.
    ///
    /// # Errors
    ///
    /// Returns the first offending field's error.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.update_distance.is_finite() && self.update_distance > 0.0) {
            return Err(ConfigError::InvalidUpdateDistance(self.update_distance));
        }
        if !(self.view_padding.is_finite() && self.view_padding >= 0.0) {
            return Err(ConfigError::InvalidViewPadding(self.view_padding));
        }
        if !(self.cache_duration_secs.is_finite() && self.cache_duration_secs >= 0.0) {
            return Err(ConfigError::InvalidCacheDuration(self.cache_duration_secs));
        }
        if self.entity_capacity == 0 {
            return Err(ConfigError::InvalidEntityCapacity);
        }
        Ok(())
    }

    /// Cache duration as a [`Duration`].
    #[must_use]
    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs_f32(self.cache_duration_secs)
    }

    /// Target frame time derived from the tick rate.
    #[must_use]
    pub fn target_frame_time(&self) -> Duration {
        if self.target_tps == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps))
    }
}
