//! # Veldra Core
//!
//! World state and activity culling for a fixed-tick real-time engine:
//!
//! - [`World`]: pre-allocated entity storage with generational ids and a
//!   per-slot state lock, so concurrently scheduled tasks can mutate
//!   disjoint entities safely.
//! - [`ActivityTracker`]: decides once per frame whether each entity is
//!   stepped ([`Activity::Active`]) or served from its last published state
//!   ([`Activity::Cached`]), based on distance to the camera entity and a
//!   bounded cache duration.
//! - [`EngineConfig`]: validated startup configuration.
//!
//! Nothing in this crate spawns threads; the parallel task executor lives in
//! `veldra_exec` and only reads this crate's types during a frame.

pub mod activity;
pub mod config;
pub mod entity;
pub mod error;
pub mod world;

pub use activity::{Activity, ActivityRecord, ActivityTracker};
pub use config::EngineConfig;
pub use entity::{EmitterState, EntityId, EntityState, ScriptState};
pub use error::{ConfigError, ConfigResult};
pub use world::World;
