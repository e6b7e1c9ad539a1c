//! # Veldra Shared Types
//!
//! Plain-data types used by every crate in the engine:
//! - 2D math for world-space positions and distances
//! - Engine-wide default constants
//!
//! This crate must stay dependency-light: both the scheduler core and any
//! collaborator (renderer, network transport) link against it.

pub mod constants;
pub mod math;

pub use math::Vec2;
