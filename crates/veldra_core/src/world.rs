//! # Entity World
//!
//! Pre-allocated slot storage for all entities. All memory is reserved at
//! construction; spawn/despawn only touch the free list and generations.
//!
//! ## Thread Safety
//!
//! The world's structure (slot table, free list) is mutated only between
//! frames by the owning coordinator. During a frame, workers read the
//! structure and lock individual [`EntityState`] slots for writing. The
//! frame coordinator guarantees at most one task per entity per frame, so
//! slot locks are uncontended in practice; they exist to make the
//! no-overlap precondition a compiler-checked fact instead of a comment.

use parking_lot::RwLock;

use crate::entity::{EntityId, EntityState};
use veldra_shared::Vec2;

/// One entry in the slot table.
#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Pre-allocated entity storage.
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    states: Vec<RwLock<EntityState>>,
    alive: usize,
}

impl World {
    /// Creates a world with a fixed entity capacity.
    ///
    /// All slot storage is allocated up front; spawning never allocates.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut states = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            states.push(RwLock::new(EntityState::default()));
        }
        Self {
            slots: vec![
                Slot {
                    generation: 0,
                    alive: false
                };
                capacity
            ],
            // Spawn from low indices first: pop from the back.
            free: (0..capacity as u32).rev().collect(),
            states,
            alive: 0,
        }
    }

    /// Spawns an entity with the given state.
    ///
    /// Returns `None` when the world is at capacity.
    pub fn spawn(&mut self, state: EntityState) -> Option<EntityId> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.alive = true;
        *self.states[index as usize].write() = state;
        self.alive += 1;
        Some(EntityId::new(index, slot.generation))
    }

    /// Despawns an entity.
    ///
    /// Returns `false` if the id is stale or was never alive. The slot's
    /// generation is bumped so outstanding handles stop resolving.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let index = id.index();
        let slot = &mut self.slots[index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.alive -= 1;
        true
    }

    /// Checks whether the id refers to a live entity of the same generation.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        let index = id.index() as usize;
        self.slots
            .get(index)
            .is_some_and(|s| s.alive && s.generation == id.generation())
    }

    /// Returns the state lock for a live entity.
    #[must_use]
    pub fn state(&self, id: EntityId) -> Option<&RwLock<EntityState>> {
        if !self.contains(id) {
            return None;
        }
        Some(&self.states[id.index() as usize])
    }

    /// Convenience read of a live entity's position.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        Some(self.state(id)?.read().position)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Whether the world has no live entities.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Fixed capacity set at construction.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over all live entity ids.
    pub fn live_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.alive
                .then(|| EntityId::new(i as u32, s.generation))
        })
    }
}
