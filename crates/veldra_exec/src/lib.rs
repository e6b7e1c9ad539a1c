//! # Veldra Exec
//!
//! The parallel per-frame task execution engine:
//!
//! ```text
//! Frame N:
//! ┌────────────────────────────────────────────────────────────┐
//! │ begin_frame()   - queue opens for submissions              │
//! │ submit(task)*   - coordinator enqueues this frame's work   │
//! │ step_loop()     - queue seals, workers + caller drain it,  │
//! │                   caller blocks at the end-of-frame barrier│
//! │ FrameReport     - exactly-once execution, failures recorded│
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers are long-lived: the pool is created once and threads are joined
//! when the [`TaskExecutor`] is dropped. A failing or panicking task is
//! isolated and reported; it never aborts sibling tasks or the frame.

pub mod barrier;
pub mod error;
pub mod pool;
pub mod task;

pub use barrier::SyncPoint;
pub use error::{SchedulerError, TaskError, TaskFailure};
pub use pool::{FrameReport, TaskExecutor};
pub use task::{Executor, ExecutorRegistry, StepContext, Task, TaskKind};
