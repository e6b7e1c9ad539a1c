//! # Entity Identity and Per-Entity State
//!
//! Entities are lightweight identifiers:
//! - Lower 32 bits: index into the world's slot arrays
//! - Upper 32 bits: generation counter for detecting stale references
//!
//! The mutable simulation payload for one entity lives in [`EntityState`];
//! the world stores one state per slot behind its own lock.

use veldra_shared::Vec2;

/// Unique identifier for an entity.
///
/// A despawned slot bumps its generation, so handles held across a despawn
/// stop resolving instead of aliasing the new occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an entity id from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the slot index portion of the id.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the id.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity id.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this id is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Particle/sound emitter attached to an entity.
///
/// Stepped by the emitter task each active frame; `spawned` counts emissions
/// handed to the render/audio collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmitterState {
    /// Emissions per second.
    pub rate: f32,
    /// Fractional emissions carried between frames.
    pub accumulator: f32,
    /// Total whole emissions produced so far.
    pub spawned: u64,
}

/// Script hook attached to an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScriptState {
    /// Ticks the script has received.
    pub ticks: u64,
}

/// Mutable per-entity simulation state.
///
/// Tasks for one frame never reference overlapping entities; each state
/// sits behind its own slot lock in the world, so a scheduling bug shows
/// up as lock contention instead of a data race.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EntityState {
    /// World-space position.
    pub position: Vec2,
    /// World-space velocity, applied by the entity-update task.
    pub velocity: Vec2,
    /// Optional emitter payload; presence schedules an emitter task.
    pub emitter: Option<EmitterState>,
    /// Optional script payload; presence schedules a script-tick task.
    pub script: Option<ScriptState>,
}

impl EntityState {
    /// Creates a state at a position with zero velocity.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Creates a moving state.
    #[must_use]
    pub fn moving(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            ..Self::default()
        }
    }
}
