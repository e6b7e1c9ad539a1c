//! Engine-wide default constants.
//!
//! Persistence supplies real values at startup; these are the fallbacks used
//! when no config is present.

use std::time::Duration;

/// Default update distance in world units around the camera entity.
/// Entities in range are always stepped.
pub const DEFAULT_UPDATE_DISTANCE: f32 = 1000.0;

/// Default cache duration for out-of-range entities.
/// 300 ticks at 60 TPS.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(5);

/// Default padding around the camera's native view bounds in world units.
pub const DEFAULT_VIEW_PADDING: f32 = 250.0;

/// Default simulation tick rate.
pub const DEFAULT_TARGET_TPS: u32 = 60;

/// Default number of worker threads in the task executor pool.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Default pre-allocated entity capacity.
pub const DEFAULT_ENTITY_CAPACITY: usize = 65_536;
