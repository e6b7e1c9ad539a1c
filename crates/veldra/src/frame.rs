//! # Frame Coordinator
//!
//! THE FRAME PIPELINE:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │ 1. EVALUATE  - activity pass classifies every live entity   │
//! │               (single-threaded, writes the activity records)│
//! │ 2. SUBMIT    - one task per active entity and attachment    │
//! │ 3. STEP LOOP - queue seals, pool + caller drain it,         │
//! │               end-of-frame barrier                          │
//! │ 4. PUBLISH   - snapshot of the active set to every sink     │
//! │ 5. RECORD    - timing stats, frame counter advances         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Structural world changes (spawn, despawn, camera, pinning) go through
//! the coordinator between frames; during a frame the world's structure is
//! frozen and workers only lock individual entity state slots.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use veldra_core::{
    Activity, ActivityTracker, ConfigResult, EngineConfig, EntityId, EntityState, World,
};
use veldra_exec::{
    ExecutorRegistry, FrameReport, SchedulerError, Task, TaskExecutor, TaskKind,
};
use veldra_shared::Vec2;

use crate::executors::default_registry;
use crate::publish::{FrameSink, FrameSnapshot, PublishedEntity};
use crate::stats::{FrameStats, FrameStatsAccumulator};

/// Owns the world, the activity tracker, and the task executor, and runs
/// the per-frame pipeline.
pub struct FrameCoordinator {
    world: Arc<RwLock<World>>,
    tracker: ActivityTracker,
    executor: TaskExecutor,
    sinks: Vec<Box<dyn FrameSink>>,
    stats: FrameStatsAccumulator,
    frame_count: u64,
}

impl FrameCoordinator {
    /// Creates a coordinator with the built-in executors.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_registry(config, default_registry())
    }

    /// Creates a coordinator with a custom executor registry.
    ///
    /// Task kinds missing from the registry are simply never scheduled.
    #[must_use]
    pub fn with_registry(config: &EngineConfig, registry: ExecutorRegistry) -> Self {
        tracing::info!(
            worker_threads = config.worker_threads,
            entity_capacity = config.entity_capacity,
            update_distance = config.update_distance,
            "frame coordinator starting"
        );
        Self {
            world: Arc::new(RwLock::new(World::new(config.entity_capacity))),
            tracker: ActivityTracker::with_config(config),
            executor: TaskExecutor::new(config.worker_threads, registry),
            sinks: Vec::new(),
            stats: FrameStatsAccumulator::new(config.target_frame_time()),
            frame_count: 0,
        }
    }

    // ------------------------------------------------------------------
    // Structural operations - between frames only.
    // ------------------------------------------------------------------

    /// Spawns an entity and registers it with the activity tracker.
    ///
    /// Returns `None` when the world is at capacity.
    pub fn spawn(&mut self, state: EntityState) -> Option<EntityId> {
        let id = self.world.write().spawn(state)?;
        self.tracker.register(id);
        Some(id)
    }

    /// Despawns an entity and drops its activity record.
    ///
    /// A despawned camera entity disables culling until a new camera is set.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.world.write().despawn(id) {
            return false;
        }
        self.tracker.remove(id);
        true
    }

    /// Designates the distance-origin entity, or disables culling with `None`.
    pub fn set_camera_entity(&mut self, camera: Option<EntityId>) {
        self.tracker.set_camera_entity(camera);
    }

    /// Sets the always-active radius around the camera entity.
    ///
    /// # Errors
    ///
    /// Rejects non-positive or non-finite distances; the prior value stays.
    pub fn set_update_distance(&mut self, distance: f32) -> ConfigResult<()> {
        self.tracker.set_update_distance(distance)
    }

    /// Sets how long out-of-range entities stay cached before a forced
    /// re-evaluation step.
    pub fn set_cache_duration(&mut self, duration: std::time::Duration) {
        self.tracker.set_cache_duration(duration);
    }

    /// Sets the padding around the camera's native view bounds.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite padding; the prior value stays.
    pub fn set_view_padding(&mut self, padding: f32) -> ConfigResult<()> {
        self.tracker.set_view_padding(padding)
    }

    /// Sets the camera view half-extents reported by the renderer.
    pub fn set_view_extent(&mut self, half_extent: Vec2) {
        self.tracker.set_view_extent(half_extent);
    }

    /// Pins or unpins an entity as always-active regardless of position.
    pub fn set_pinned(&mut self, id: EntityId, pinned: bool) {
        self.tracker.set_pinned(id, pinned);
    }

    /// Registers a snapshot sink.
    pub fn add_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Shared handle to the entity world.
    #[must_use]
    pub fn world(&self) -> &Arc<RwLock<World>> {
        &self.world
    }

    /// The activity tracker (read-only; changes go through the setters).
    #[must_use]
    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Accumulated timing statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    // ------------------------------------------------------------------
    // The frame
    // ------------------------------------------------------------------

    /// Runs one full frame at `now` with the given timestep.
    ///
    /// `now` is the culling clock: activity cache expiry is judged against
    /// it, so tests can drive the tracker with synthetic instants while the
    /// internal timing stats use the real clock.
    ///
    /// # Errors
    ///
    /// [`SchedulerError`] on task submission; with the built-in registry
    /// this cannot occur.
    pub fn run_frame(
        &mut self,
        now: Instant,
        delta_time: f32,
    ) -> Result<FrameReport, SchedulerError> {
        let frame_start = Instant::now();
        self.executor.begin_frame();

        let world = Arc::clone(&self.world);
        let world_read = world.read();

        // 1. Activity pass: single-threaded, the only writer of records.
        let active = self.tracker.evaluate_all(&world_read, now);
        let cached = world_read.len() - active.len();
        let evaluated = Instant::now();

        // 2. One entity-update task per active entity, plus one task per
        //    attachment. No two tasks of the same kind share an entity.
        for &id in &active {
            self.executor.submit(Task::new(TaskKind::EntityUpdate, id))?;
            let state = match world_read.state(id) {
                Some(slot) => *slot.read(),
                None => continue,
            };
            if state.emitter.is_some() {
                self.executor
                    .submit(Task::new(TaskKind::EmitterUpdate, id))?;
            }
            if state.script.is_some() {
                self.executor.submit(Task::new(TaskKind::ScriptTick, id))?;
            }
        }
        drop(world_read);

        // 3. Seal and drain; returns at the end-of-frame barrier.
        let report = self.executor.step_loop(&self.world, delta_time);
        let dispatched = Instant::now();

        // 4. Publish the active set's post-step state.
        if !self.sinks.is_empty() {
            let world_read = self.world.read();
            let entities = active
                .iter()
                .filter_map(|&id| {
                    Some(PublishedEntity {
                        id,
                        position: world_read.position(id)?,
                    })
                })
                .collect();
            drop(world_read);

            let snapshot = FrameSnapshot {
                frame: report.frame,
                entities,
            };
            for sink in &self.sinks {
                sink.publish(&snapshot);
            }
        }
        let published = Instant::now();

        // 5. Record.
        self.frame_count += 1;
        self.stats.record(FrameStats {
            frame: report.frame,
            total_us: (published - frame_start).as_micros() as u64,
            evaluate_us: (evaluated - frame_start).as_micros() as u64,
            dispatch_us: (dispatched - evaluated).as_micros() as u64,
            publish_us: (published - dispatched).as_micros() as u64,
            active: active.len(),
            cached,
            failures: report.failures.len(),
        });

        Ok(report)
    }

    /// Classifies one entity without running a frame, for tooling and
    /// debug overlays.
    pub fn evaluate(&mut self, id: EntityId, now: Instant) -> Activity {
        let world = self.world.read();
        self.tracker.evaluate(&world, id, now)
    }
}
