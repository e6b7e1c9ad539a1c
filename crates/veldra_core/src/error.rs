//! # Configuration Error Types
//!
//! Invalid configuration is rejected at the setter or loader; the prior
//! (or default) value always remains in effect.

use thiserror::Error;

/// Errors produced by configuration setters and the TOML loader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Update distance must be positive and finite.
    #[error("invalid update distance {0}: must be positive and finite")]
    InvalidUpdateDistance(f32),

    /// View padding must be non-negative and finite.
    #[error("invalid camera view padding {0}: must be non-negative and finite")]
    InvalidViewPadding(f32),

    /// Cache duration must be non-negative and finite.
    #[error("invalid entity cache duration {0}s: must be non-negative and finite")]
    InvalidCacheDuration(f32),

    /// Entity capacity must be non-zero.
    #[error("invalid entity capacity: must be non-zero")]
    InvalidEntityCapacity,

    /// Startup config file failed to parse.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
