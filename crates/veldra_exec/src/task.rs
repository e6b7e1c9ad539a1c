//! # Task Model and Executor Interface
//!
//! A [`Task`] is one unit of per-frame work: a kind plus the entity it
//! touches. Tasks are built fresh each frame by the coordinator and do not
//! outlive the frame.
//!
//! An [`Executor`] implements how one task kind is stepped. Executors are
//! registered once, shared read-only across workers, and must confine side
//! effects to the payload entity's state slot.

use std::sync::Arc;

use veldra_core::{EntityId, World};

use crate::error::TaskError;

/// Closed set of per-frame task kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Integrate one entity's simulation state.
    EntityUpdate,
    /// Advance one entity's particle/sound emitter.
    EmitterUpdate,
    /// Deliver one tick to an entity's script hook.
    ScriptTick,
}

impl TaskKind {
    /// All task kinds, in dispatch-table order.
    pub const ALL: [Self; 3] = [Self::EntityUpdate, Self::EmitterUpdate, Self::ScriptTick];

    #[inline]
    pub(crate) const fn table_index(self) -> usize {
        match self {
            Self::EntityUpdate => 0,
            Self::EmitterUpdate => 1,
            Self::ScriptTick => 2,
        }
    }
}

/// One unit of per-frame work.
#[derive(Clone, Copy, Debug)]
pub struct Task {
    /// What to do.
    pub kind: TaskKind,
    /// The entity the task touches. The coordinator guarantees this stays
    /// valid until the frame's `step_loop` returns.
    pub payload: EntityId,
    /// Load-balancing hint; accumulated into the frame report.
    pub cost: u32,
}

impl Task {
    /// Creates a task with the default cost of 1.
    #[must_use]
    pub fn new(kind: TaskKind, payload: EntityId) -> Self {
        Self {
            kind,
            payload,
            cost: 1,
        }
    }

    /// Creates a task with an explicit cost hint.
    #[must_use]
    pub fn with_cost(kind: TaskKind, payload: EntityId, cost: u32) -> Self {
        Self { kind, payload, cost }
    }
}

/// Read-only frame context handed to every `step` call.
pub struct StepContext<'a> {
    /// The world; structure is frozen for the duration of the frame, the
    /// payload entity's state slot may be locked for writing.
    pub world: &'a World,
    /// Frame number being executed.
    pub frame: u64,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

/// Implements how one task kind is executed.
///
/// `step` runs synchronously on the calling worker thread. Side effects are
/// confined to the entity the task payload references; the one scheduler
/// operation a task body may use is `TaskExecutor::sync_threads`, a
/// mid-frame barrier that waits for sibling tasks. Errors (and panics) are
/// recorded per task and never halt the frame.
pub trait Executor: Send + Sync {
    /// Executes one task.
    ///
    /// # Errors
    ///
    /// Implementations report invalid payloads or domain failures; the
    /// scheduler records the failure and continues the frame.
    fn step(&self, task: &Task, ctx: &StepContext<'_>) -> Result<(), TaskError>;
}

/// Dispatch table mapping each task kind to its executor instance.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    table: [Option<Arc<dyn Executor>>; 3],
}

impl ExecutorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the executor for a task kind, replacing any previous one.
    pub fn register(&mut self, kind: TaskKind, executor: Arc<dyn Executor>) {
        self.table[kind.table_index()] = Some(executor);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, kind: TaskKind, executor: Arc<dyn Executor>) -> Self {
        self.register(kind, executor);
        self
    }

    /// Looks up the executor for a kind.
    #[must_use]
    pub fn get(&self, kind: TaskKind) -> Option<&Arc<dyn Executor>> {
        self.table[kind.table_index()].as_ref()
    }

    /// Whether a kind has a registered executor.
    #[must_use]
    pub fn has(&self, kind: TaskKind) -> bool {
        self.table[kind.table_index()].is_some()
    }
}
