//! # Entity Activity Tracker
//!
//! Distance-based update culling. Once per frame, before dispatch, the
//! tracker classifies every live entity as:
//!
//! - [`Activity::Active`] - stepped this frame. Entities within the update
//!   distance (or the padded camera view) of the camera entity are always
//!   active. An out-of-range entity whose cache has expired is also active
//!   for exactly one frame (forced re-sync), which bounds how stale an
//!   off-screen entity can get.
//! - [`Activity::Cached`] - skipped; collaborators reuse the last published
//!   state.
//!
//! Records are written only during this single-threaded pass and are
//! read-only while tasks execute. If no camera entity is set, culling is
//! disabled and everything is active.

use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::entity::EntityId;
use crate::error::{ConfigError, ConfigResult};
use crate::world::World;
use veldra_shared::constants::{
    DEFAULT_CACHE_DURATION, DEFAULT_UPDATE_DISTANCE, DEFAULT_VIEW_PADDING,
};
use veldra_shared::Vec2;

/// Whether an entity is stepped this frame or served from cached state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Entity is stepped this frame.
    Active,
    /// Entity is skipped; its last published state remains valid.
    Cached,
}

/// Per-entity culling state, one per live entity.
#[derive(Clone, Copy, Debug)]
pub struct ActivityRecord {
    /// Distance to the camera entity at the last evaluation.
    pub last_distance: f32,
    /// Result of the last evaluation.
    pub last_activity: Activity,
    cache_expires_at: Option<Instant>,
    pinned: bool,
}

impl ActivityRecord {
    fn new() -> Self {
        Self {
            last_distance: 0.0,
            last_activity: Activity::Active,
            cache_expires_at: None,
            pinned: false,
        }
    }

    /// When the current cached period ends, if the entity is out of range.
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.cache_expires_at
    }

    /// Whether the entity is pinned always-active.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Decides per frame which entities are stepped and which are served from
/// cached state.
pub struct ActivityTracker {
    update_distance: f32,
    cache_duration: Duration,
    view_padding: f32,
    view_half_extent: Vec2,
    camera: Option<EntityId>,
    // Slot-indexed; the coordinator keeps this in lockstep with the world.
    records: Vec<Option<ActivityRecord>>,
}

impl ActivityTracker {
    /// Creates a tracker with engine defaults and no camera entity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            update_distance: DEFAULT_UPDATE_DISTANCE,
            cache_duration: DEFAULT_CACHE_DURATION,
            view_padding: DEFAULT_VIEW_PADDING,
            // Zero until a renderer reports its viewport; the padded view
            // then degenerates to a small box around the camera.
            view_half_extent: Vec2::ZERO,
            camera: None,
            records: Vec::new(),
        }
    }

    /// Creates a tracker from a validated startup config.
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        let mut tracker = Self::new();
        tracker.update_distance = config.update_distance;
        tracker.cache_duration = config.cache_duration();
        tracker.view_padding = config.view_padding;
        tracker
    }

    // ------------------------------------------------------------------
    // Configuration setters - take effect at the next evaluation pass.
    // On error the prior value is retained.
    // ------------------------------------------------------------------

    /// Sets the always-active radius around the camera entity.
    ///
    /// # Errors
    ///
    /// Rejects non-positive or non-finite distances.
    pub fn set_update_distance(&mut self, distance: f32) -> ConfigResult<()> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(ConfigError::InvalidUpdateDistance(distance));
        }
        self.update_distance = distance;
        Ok(())
    }

    /// Sets how long an out-of-range entity's state stays valid before a
    /// forced re-evaluation step.
    pub fn set_cache_duration(&mut self, duration: Duration) {
        self.cache_duration = duration;
    }

    /// Sets the padding around the camera's native view bounds.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite padding.
    pub fn set_view_padding(&mut self, padding: f32) -> ConfigResult<()> {
        if !(padding.is_finite() && padding >= 0.0) {
            return Err(ConfigError::InvalidViewPadding(padding));
        }
        self.view_padding = padding;
        Ok(())
    }

    /// Sets the camera view half-extents (typically half the viewport in
    /// world units). Entities inside the padded view are always active.
    pub fn set_view_extent(&mut self, half_extent: Vec2) {
        self.view_half_extent = half_extent;
    }

    /// Designates the distance-origin entity, or disables culling with
    /// `None`. Existing cache entries are not invalidated; the change
    /// applies from the next evaluation pass.
    pub fn set_camera_entity(&mut self, camera: Option<EntityId>) {
        self.camera = camera;
    }

    /// Current camera entity, if any.
    #[must_use]
    pub fn camera_entity(&self) -> Option<EntityId> {
        self.camera
    }

    /// Current update distance.
    #[must_use]
    pub fn update_distance(&self) -> f32 {
        self.update_distance
    }

    /// Current cache duration.
    #[must_use]
    pub fn cache_duration(&self) -> Duration {
        self.cache_duration
    }

    // ------------------------------------------------------------------
    // Record lifecycle - kept in lockstep with the world by the coordinator.
    // ------------------------------------------------------------------

    /// Creates the activity record for a freshly spawned entity.
    pub fn register(&mut self, id: EntityId) {
        let index = id.index() as usize;
        if self.records.len() <= index {
            self.records.resize(index + 1, None);
        }
        self.records[index] = Some(ActivityRecord::new());
    }

    /// Destroys the record of a despawned entity.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(slot) = self.records.get_mut(id.index() as usize) {
            *slot = None;
        }
    }

    /// Pins or unpins an entity as always-active regardless of position.
    pub fn set_pinned(&mut self, id: EntityId, pinned: bool) {
        let index = id.index() as usize;
        if let Some(Some(record)) = self.records.get_mut(index) {
            record.pinned = pinned;
        }
    }

    /// Read access to an entity's record.
    #[must_use]
    pub fn record(&self, id: EntityId) -> Option<&ActivityRecord> {
        self.records.get(id.index() as usize)?.as_ref()
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Classifies a single entity at `now`.
    ///
    /// Stale or unknown ids classify as `Active`; the task for such an
    /// entity will surface the stale payload itself.
    pub fn evaluate(&mut self, world: &World, id: EntityId, now: Instant) -> Activity {
        let camera_position = self.camera_position(world);
        self.classify(world, id, camera_position, now)
    }

    /// The frame-boundary pass: classifies every live entity and returns
    /// the active set. This is the only place records are written.
    pub fn evaluate_all(&mut self, world: &World, now: Instant) -> Vec<EntityId> {
        let camera_position = self.camera_position(world);
        let mut active = Vec::with_capacity(world.len());
        for id in world.live_entities() {
            if self.classify(world, id, camera_position, now) == Activity::Active {
                active.push(id);
            }
        }
        active
    }

    fn camera_position(&self, world: &World) -> Option<Vec2> {
        world.position(self.camera?)
    }

    fn classify(
        &mut self,
        world: &World,
        id: EntityId,
        camera_position: Option<Vec2>,
        now: Instant,
    ) -> Activity {
        let Some(position) = world.position(id) else {
            return Activity::Active;
        };

        let index = id.index() as usize;
        if self.records.len() <= index {
            self.records.resize(index + 1, None);
        }
        if self.records[index].is_none() {
            self.records[index] = Some(ActivityRecord::new());
        }

        let update_distance = self.update_distance;
        let cache_duration = self.cache_duration;
        let view_x = self.view_half_extent.x + self.view_padding;
        let view_y = self.view_half_extent.y + self.view_padding;

        let Some(record) = self.records[index].as_mut() else {
            return Activity::Active;
        };

        // No camera (or a despawned one): culling disabled.
        let Some(camera) = camera_position else {
            record.cache_expires_at = None;
            record.last_activity = Activity::Active;
            return Activity::Active;
        };

        let distance = position.distance(camera);
        record.last_distance = distance;

        let in_range = distance <= update_distance;
        let in_view =
            (position.x - camera.x).abs() <= view_x && (position.y - camera.y).abs() <= view_y;

        let activity = if record.pinned || in_range || in_view {
            record.cache_expires_at = None;
            Activity::Active
        } else {
            match record.cache_expires_at {
                Some(expires) if now < expires => Activity::Cached,
                // No cache entry yet, or it expired: step once and re-arm.
                _ => {
                    record.cache_expires_at = Some(now + cache_duration);
                    Activity::Active
                }
            }
        };
        record.last_activity = activity;
        activity
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityState;

    fn world_with_camera() -> (World, EntityId) {
        let mut world = World::new(16);
        let camera = world.spawn(EntityState::at(Vec2::ZERO)).unwrap();
        (world, camera)
    }

    fn tracker_500_2s(camera: EntityId) -> ActivityTracker {
        let mut tracker = ActivityTracker::new();
        tracker.set_update_distance(500.0).unwrap();
        tracker.set_cache_duration(Duration::from_secs(2));
        tracker.set_view_padding(0.0).unwrap();
        tracker.set_camera_entity(Some(camera));
        tracker
    }

    #[test]
    fn test_proximity_always_active() {
        let (mut world, camera) = world_with_camera();
        let near = world.spawn(EntityState::at(Vec2::new(300.0, 0.0))).unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(near);

        let t0 = Instant::now();
        for tick in 0..10 {
            let now = t0 + Duration::from_millis(tick * 16);
            assert_eq!(tracker.evaluate(&world, near, now), Activity::Active);
        }
        assert!(tracker.record(near).unwrap().expires_at().is_none());
    }

    #[test]
    fn test_out_of_range_resync_cycle() {
        // Update distance 500, cache 2s, entity at distance 600.
        let (mut world, camera) = world_with_camera();
        let far = world.spawn(EntityState::at(Vec2::new(600.0, 0.0))).unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(far);

        let t0 = Instant::now();
        // First evaluation: forced re-sync.
        assert_eq!(tracker.evaluate(&world, far, t0), Activity::Active);
        // Within the cache duration: served from cache.
        assert_eq!(
            tracker.evaluate(&world, far, t0 + Duration::from_secs(1)),
            Activity::Cached
        );
        // Cache expired, no position change: active again.
        assert_eq!(
            tracker.evaluate(&world, far, t0 + Duration::from_millis(2500)),
            Activity::Active
        );
        // And the cycle re-arms.
        assert_eq!(
            tracker.evaluate(&world, far, t0 + Duration::from_millis(2600)),
            Activity::Cached
        );
    }

    #[test]
    fn test_reentering_range_clears_cache() {
        let (mut world, camera) = world_with_camera();
        let e = world.spawn(EntityState::at(Vec2::new(600.0, 0.0))).unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(e);

        let t0 = Instant::now();
        assert_eq!(tracker.evaluate(&world, e, t0), Activity::Active);

        // Moves back within the update distance: active, cache cleared.
        world.state(e).unwrap().write().position = Vec2::new(100.0, 0.0);
        let t1 = t0 + Duration::from_millis(100);
        assert_eq!(tracker.evaluate(&world, e, t1), Activity::Active);
        assert!(tracker.record(e).unwrap().expires_at().is_none());

        // Leaves again: fresh forced re-sync, not a stale cache window.
        world.state(e).unwrap().write().position = Vec2::new(700.0, 0.0);
        let t2 = t0 + Duration::from_millis(200);
        assert_eq!(tracker.evaluate(&world, e, t2), Activity::Active);
        assert_eq!(
            tracker.evaluate(&world, e, t2 + Duration::from_millis(100)),
            Activity::Cached
        );
    }

    #[test]
    fn test_no_camera_disables_culling() {
        let mut world = World::new(4);
        let e = world
            .spawn(EntityState::at(Vec2::new(100_000.0, 0.0)))
            .unwrap();
        let mut tracker = ActivityTracker::new();
        tracker.register(e);

        let now = Instant::now();
        assert_eq!(tracker.evaluate(&world, e, now), Activity::Active);
    }

    #[test]
    fn test_padded_view_overrides_distance() {
        let (mut world, camera) = world_with_camera();
        let e = world.spawn(EntityState::at(Vec2::new(600.0, 0.0))).unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(e);
        // Wide viewport: the entity sits inside the padded view even though
        // it is beyond the update distance.
        tracker.set_view_extent(Vec2::new(640.0, 360.0));

        let now = Instant::now();
        assert_eq!(tracker.evaluate(&world, e, now), Activity::Active);
        assert!(tracker.record(e).unwrap().expires_at().is_none());
    }

    #[test]
    fn test_pinned_entity_always_active() {
        let (mut world, camera) = world_with_camera();
        let e = world
            .spawn(EntityState::at(Vec2::new(9000.0, 0.0)))
            .unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(e);
        tracker.set_pinned(e, true);

        let t0 = Instant::now();
        assert_eq!(tracker.evaluate(&world, e, t0), Activity::Active);
        assert_eq!(
            tracker.evaluate(&world, e, t0 + Duration::from_secs(1)),
            Activity::Active
        );

        tracker.set_pinned(e, false);
        assert_eq!(
            tracker.evaluate(&world, e, t0 + Duration::from_secs(2)),
            Activity::Active // forced re-sync first
        );
        assert_eq!(
            tracker.evaluate(&world, e, t0 + Duration::from_secs(3)),
            Activity::Cached
        );
    }

    #[test]
    fn test_invalid_setters_retain_prior_value() {
        let mut tracker = ActivityTracker::new();
        tracker.set_update_distance(800.0).unwrap();

        assert!(tracker.set_update_distance(0.0).is_err());
        assert!(tracker.set_update_distance(-5.0).is_err());
        assert!(tracker.set_update_distance(f32::NAN).is_err());
        assert_eq!(tracker.update_distance(), 800.0);

        assert!(tracker.set_view_padding(-1.0).is_err());
    }

    #[test]
    fn test_evaluate_all_partitions_entities() {
        let (mut world, camera) = world_with_camera();
        let near = world.spawn(EntityState::at(Vec2::new(100.0, 0.0))).unwrap();
        let far = world.spawn(EntityState::at(Vec2::new(600.0, 0.0))).unwrap();
        let mut tracker = tracker_500_2s(camera);
        tracker.register(near);
        tracker.register(far);

        let t0 = Instant::now();
        // Frame 1: the far entity gets its forced re-sync step.
        let active = tracker.evaluate_all(&world, t0);
        assert!(active.contains(&camera));
        assert!(active.contains(&near));
        assert!(active.contains(&far));

        // Frame 2: the far entity drops to cached.
        let active = tracker.evaluate_all(&world, t0 + Duration::from_millis(16));
        assert!(active.contains(&near));
        assert!(!active.contains(&far));
        assert_eq!(
            tracker.record(far).unwrap().last_activity,
            Activity::Cached
        );
    }

    #[test]
    fn test_record_lifecycle() {
        let (mut world, _camera) = world_with_camera();
        let e = world.spawn(EntityState::default()).unwrap();

        let mut tracker = ActivityTracker::new();
        assert!(tracker.record(e).is_none());
        tracker.register(e);
        assert!(tracker.record(e).is_some());
        tracker.remove(e);
        assert!(tracker.record(e).is_none());
    }
}
