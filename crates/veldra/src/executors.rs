//! # Built-in Task Executors
//!
//! One executor per task kind. Each steps exactly the payload entity's
//! state slot; the coordinator never schedules two tasks for the same
//! entity and kind in one frame, so the slot write lock is uncontended.
//!
//! A stale payload (entity despawned between scheduling and execution)
//! is reported, not panicked on; the frame continues.

use std::sync::Arc;

use veldra_exec::{Executor, ExecutorRegistry, StepContext, Task, TaskError, TaskKind};

/// Integrates position from velocity.
pub struct EntityUpdateExecutor;

impl Executor for EntityUpdateExecutor {
    fn step(&self, task: &Task, ctx: &StepContext<'_>) -> Result<(), TaskError> {
        let slot = ctx
            .world
            .state(task.payload)
            .ok_or(TaskError::StalePayload(task.payload))?;
        let mut state = slot.write();
        let s = &mut *state;
        s.position = s.position + s.velocity * ctx.delta_time;
        Ok(())
    }
}

/// Advances an entity's emitter accumulator and spawns whole emissions.
pub struct EmitterUpdateExecutor;

impl Executor for EmitterUpdateExecutor {
    fn step(&self, task: &Task, ctx: &StepContext<'_>) -> Result<(), TaskError> {
        let slot = ctx
            .world
            .state(task.payload)
            .ok_or(TaskError::StalePayload(task.payload))?;
        let mut state = slot.write();
        if let Some(emitter) = state.emitter.as_mut() {
            emitter.accumulator += emitter.rate * ctx.delta_time;
            if !emitter.accumulator.is_finite() {
                // A non-finite rate would otherwise saturate the cast below
                // and fabricate u64::MAX emissions without a trace.
                emitter.accumulator = 0.0;
                return Err(TaskError::Failed(format!(
                    "emitter accumulator diverged (rate {})",
                    emitter.rate
                )));
            }
            let whole = emitter.accumulator.floor();
            if whole >= 1.0 {
                emitter.spawned += whole as u64;
                emitter.accumulator -= whole;
            }
        }
        Ok(())
    }
}

/// Delivers one tick to an entity's script hook.
pub struct ScriptTickExecutor;

impl Executor for ScriptTickExecutor {
    fn step(&self, task: &Task, ctx: &StepContext<'_>) -> Result<(), TaskError> {
        let slot = ctx
            .world
            .state(task.payload)
            .ok_or(TaskError::StalePayload(task.payload))?;
        let mut state = slot.write();
        if let Some(script) = state.script.as_mut() {
            script.ticks += 1;
        }
        Ok(())
    }
}

/// Registry with the built-in executor for every task kind.
#[must_use]
pub fn default_registry() -> ExecutorRegistry {
    ExecutorRegistry::new()
        .with(TaskKind::EntityUpdate, Arc::new(EntityUpdateExecutor))
        .with(TaskKind::EmitterUpdate, Arc::new(EmitterUpdateExecutor))
        .with(TaskKind::ScriptTick, Arc::new(ScriptTickExecutor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veldra_core::{EmitterState, EntityState, ScriptState, World};
    use veldra_shared::Vec2;

    fn ctx(world: &World) -> StepContext<'_> {
        StepContext {
            world,
            frame: 0,
            delta_time: 0.016,
        }
    }

    #[test]
    fn test_entity_update_integrates_position() {
        let mut world = World::new(4);
        let id = world
            .spawn(EntityState::moving(Vec2::ZERO, Vec2::new(100.0, -50.0)))
            .unwrap();

        EntityUpdateExecutor
            .step(&Task::new(TaskKind::EntityUpdate, id), &ctx(&world))
            .unwrap();

        let position = world.position(id).unwrap();
        assert!((position.x - 1.6).abs() < 1e-4);
        assert!((position.y + 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_emitter_spawns_whole_emissions() {
        let mut world = World::new(4);
        let mut state = EntityState::default();
        state.emitter = Some(EmitterState {
            rate: 125.0, // exactly two emissions per 16ms frame
            ..EmitterState::default()
        });
        let id = world.spawn(state).unwrap();

        EmitterUpdateExecutor
            .step(&Task::new(TaskKind::EmitterUpdate, id), &ctx(&world))
            .unwrap();

        let emitter = world.state(id).unwrap().read().emitter.unwrap();
        assert_eq!(emitter.spawned, 2);
        assert!(emitter.accumulator < 1.0);
    }

    #[test]
    fn test_emitter_accumulates_fractions() {
        let mut world = World::new(4);
        let mut state = EntityState::default();
        state.emitter = Some(EmitterState {
            rate: 30.0, // ~0.48 per frame
            ..EmitterState::default()
        });
        let id = world.spawn(state).unwrap();

        // Two frames accumulate below 1.0, the third crosses it.
        for _ in 0..2 {
            EmitterUpdateExecutor
                .step(&Task::new(TaskKind::EmitterUpdate, id), &ctx(&world))
                .unwrap();
        }
        assert_eq!(world.state(id).unwrap().read().emitter.unwrap().spawned, 0);

        EmitterUpdateExecutor
            .step(&Task::new(TaskKind::EmitterUpdate, id), &ctx(&world))
            .unwrap();
        assert_eq!(world.state(id).unwrap().read().emitter.unwrap().spawned, 1);
    }

    #[test]
    fn test_emitter_non_finite_rate_reported() {
        let mut world = World::new(4);
        let mut state = EntityState::default();
        state.emitter = Some(EmitterState {
            rate: f32::INFINITY,
            ..EmitterState::default()
        });
        let id = world.spawn(state).unwrap();

        let err = EmitterUpdateExecutor
            .step(&Task::new(TaskKind::EmitterUpdate, id), &ctx(&world))
            .unwrap_err();
        assert!(matches!(err, TaskError::Failed(_)));

        // No emissions were fabricated and the accumulator is usable again.
        let emitter = world.state(id).unwrap().read().emitter.unwrap();
        assert_eq!(emitter.spawned, 0);
        assert_eq!(emitter.accumulator, 0.0);
    }

    #[test]
    fn test_script_tick_counts() {
        let mut world = World::new(4);
        let mut state = EntityState::default();
        state.script = Some(ScriptState::default());
        let id = world.spawn(state).unwrap();

        for _ in 0..3 {
            ScriptTickExecutor
                .step(&Task::new(TaskKind::ScriptTick, id), &ctx(&world))
                .unwrap();
        }
        assert_eq!(world.state(id).unwrap().read().script.unwrap().ticks, 3);
    }

    #[test]
    fn test_stale_payload_reported() {
        let mut world = World::new(4);
        let id = world.spawn(EntityState::default()).unwrap();
        world.despawn(id);

        let err = EntityUpdateExecutor
            .step(&Task::new(TaskKind::EntityUpdate, id), &ctx(&world))
            .unwrap_err();
        assert_eq!(err, TaskError::StalePayload(id));
    }

    #[test]
    fn test_default_registry_covers_all_kinds() {
        let registry = default_registry();
        for kind in TaskKind::ALL {
            assert!(registry.has(kind));
        }
    }
}
