//! # Veldra
//!
//! Headless game engine core built around three pillars:
//!
//! - **World** ([`veldra_core`]): pre-allocated entity storage with
//!   generation-checked handles and per-slot state locks.
//! - **Activity culling** ([`veldra_core::ActivityTracker`]): distance and
//!   view based classification of entities into stepped vs cached, with a
//!   bounded-staleness forced re-sync for off-screen entities.
//! - **Parallel execution** ([`veldra_exec`]): a per-frame task queue
//!   drained by a long-lived worker pool behind an end-of-frame barrier.
//!
//! This crate ties them together: the [`FrameCoordinator`] runs the frame
//! pipeline and publishes snapshots of each frame's active entities to
//! registered sinks.
//!
//! ```no_run
//! use std::time::Instant;
//! use veldra::{EngineConfig, EntityState, FrameCoordinator, Vec2};
//!
//! let config = EngineConfig::default();
//! let mut coordinator = FrameCoordinator::new(&config);
//!
//! let camera = coordinator
//!     .spawn(EntityState::at(Vec2::ZERO))
//!     .expect("capacity");
//! coordinator.set_camera_entity(Some(camera));
//!
//! let report = coordinator.run_frame(Instant::now(), 0.016).unwrap();
//! assert!(report.is_clean());
//! ```

pub mod executors;
pub mod frame;
pub mod publish;
pub mod stats;

pub use executors::{
    default_registry, EmitterUpdateExecutor, EntityUpdateExecutor, ScriptTickExecutor,
};
pub use frame::FrameCoordinator;
pub use publish::{ChannelSink, FrameSink, FrameSnapshot, PublishedEntity};
pub use stats::{FrameStats, FrameStatsAccumulator};

// The crates behind the facade, for collaborators that need direct access.
pub use veldra_core::{
    Activity, ActivityRecord, ActivityTracker, ConfigError, ConfigResult, EmitterState,
    EngineConfig, EntityId, EntityState, ScriptState, World,
};
pub use veldra_exec::{
    Executor, ExecutorRegistry, FrameReport, SchedulerError, StepContext, SyncPoint, Task,
    TaskError, TaskExecutor, TaskFailure, TaskKind,
};
pub use veldra_shared::Vec2;
