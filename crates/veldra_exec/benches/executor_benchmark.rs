//! # Task Executor Throughput Benchmark
//!
//! Target: 10,000 trivial entity-update tasks drained in under ~16ms on a
//! 4-worker pool.
//!
//! Run with: `cargo bench --package veldra_exec`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use parking_lot::RwLock;
use veldra_core::{EntityId, EntityState, World};
use veldra_exec::{
    Executor, ExecutorRegistry, StepContext, Task, TaskError, TaskExecutor, TaskKind,
};
use veldra_shared::Vec2;

/// Integrates the payload entity's position, the cheapest real workload.
struct Integrate;

impl Executor for Integrate {
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

fn populated_world(entities: usize) -> (Arc<RwLock<World>>, Vec<EntityId>) {
    let mut world = World::new(entities);
    let ids: Vec<EntityId> = (0..entities)
        .map(|i| {
            world
                .spawn(EntityState::moving(
                    Vec2::new(i as f32, 0.0),
                    Vec2::new(1.0, 1.0),
                ))
                .unwrap()
        })
        .collect();
    (Arc::new(RwLock::new(world)), ids)
}

/// Benchmark: full frame drain across pool sizes.
fn bench_step_loop(c: &mut Criterion) {
    const TASKS: usize = 10_000;
    let mut group = c.benchmark_group("step_loop_10k_tasks");

    for workers in [0usize, 1, 2, 4] {
        let registry = ExecutorRegistry::new().with(TaskKind::EntityUpdate, Arc::new(Integrate));
        let executor = TaskExecutor::new(workers, registry);
        let (world, ids) = populated_world(TASKS);

        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, _| {
                b.iter(|| {
                    executor.begin_frame();
                    for id in &ids {
                        executor
                            .submit(Task::new(TaskKind::EntityUpdate, *id))
                            .unwrap();
                    }
                    black_box(executor.step_loop(&world, 0.016))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: submission overhead alone (queue push under the frame lock).
fn bench_submit(c: &mut Criterion) {
    let registry = ExecutorRegistry::new().with(TaskKind::EntityUpdate, Arc::new(Integrate));
    let executor = TaskExecutor::new(0, registry);
    let (world, ids) = populated_world(1);

    c.bench_function("submit_and_drain_single", |b| {
        b.iter(|| {
            executor.begin_frame();
            executor
                .submit(Task::new(TaskKind::EntityUpdate, ids[0]))
                .unwrap();
            black_box(executor.step_loop(&world, 0.016))
        });
    });
}

criterion_group!(benches, bench_step_loop, bench_submit);
criterion_main!(benches);
