//! # Worker Pool and Frame Queue
//!
//! A fixed pool of long-lived worker threads drains one sealed queue per
//! frame. The calling thread participates in the drain and blocks until
//! every submitted task has run (or failed and been recorded), so no task
//! execution ever spans a frame boundary.
//!
//! ## Frame protocol
//!
//! 1. `begin_frame()` reopens the queue.
//! 2. `submit(task)` enqueues; rejected once the frame is sealed.
//! 3. `step_loop(world, dt)` seals, wakes the workers, drains, waits.
//!
//! The queue stays sealed after `step_loop` returns: a late `submit`
//! is a misuse error and cannot leak work into the finished frame.
//!
//! Load balancing is greedy dequeue from the shared queue (cheap, and
//! self-balancing for the short uniform tasks a frame produces); the
//! per-task `cost` hint is accumulated into the report for diagnostics.

use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex, RwLock};

use veldra_core::World;

use crate::error::{SchedulerError, TaskError, TaskFailure};
use crate::task::{ExecutorRegistry, StepContext, Task};

/// Everything a worker needs to execute one frame's tasks.
#[derive(Clone)]
struct FramePacket {
    frame: u64,
    delta_time: f32,
    world: Arc<RwLock<World>>,
}

/// Queue/seal state guarded by one mutex.
struct FrameState {
    sealed: bool,
    frame: u64,
    packet: Option<FramePacket>,
}

/// The frame queue tagged with the frame it belongs to. The tag is checked
/// under the queue lock, so a worker lagging behind the end-of-frame barrier
/// can never pop a task submitted for a later frame.
struct TaskQueue {
    frame: u64,
    tasks: VecDeque<Task>,
}

thread_local! {
    /// Depth of task executions on this thread's stack. `sync_threads`
    /// excludes the caller's own in-flight tasks from its wait.
    static TASK_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct PoolShared {
    registry: ExecutorRegistry,
    queue: Mutex<TaskQueue>,
    frame: Mutex<FrameState>,
    /// Wakes workers for a new frame packet, frame retirement, or shutdown.
    work_cvar: Condvar,
    /// Latch for the end-of-frame drain: `remaining` counts queued plus
    /// in-flight tasks; a waiter parks on `done` until the count falls to
    /// the tasks on its own stack (zero for the frame coordinator).
    done: Mutex<()>,
    done_cvar: Condvar,
    remaining: AtomicUsize,
    executed: AtomicUsize,
    executed_cost: AtomicU64,
    failures: Mutex<Vec<TaskFailure>>,
    shutdown: AtomicBool,
}

impl PoolShared {
    /// Pops and runs tasks until the queue is empty or belongs to a later
    /// frame.
    fn drain(&self, packet: &FramePacket) {
        loop {
            let task = {
                let mut queue = self.queue.lock();
                // A straggler from a retired frame stops here instead of
                // running the next frame's work under a stale packet.
                if queue.frame != packet.frame {
                    break;
                }
                queue.tasks.pop_front()
            };
            let Some(task) = task else { break };
            self.run_task(task, packet);
        }
    }

    fn run_task(&self, task: Task, packet: &FramePacket) {
        let result = match self.registry.get(task.kind) {
            Some(executor) => {
                let world = packet.world.read();
                let ctx = StepContext {
                    world: &world,
                    frame: packet.frame,
                    delta_time: packet.delta_time,
                };
                TASK_DEPTH.with(|depth| depth.set(depth.get() + 1));
                let result = catch_unwind(AssertUnwindSafe(|| executor.step(&task, &ctx)))
                    .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(&payload))));
                TASK_DEPTH.with(|depth| depth.set(depth.get() - 1));
                result
            }
            // submit() filters unknown kinds; this covers direct misuse.
            None => Err(TaskError::Failed(format!(
                "no executor registered for {:?}",
                task.kind
            ))),
        };

        if let Err(error) = result {
            tracing::warn!(
                kind = ?task.kind,
                payload = ?task.payload,
                frame = packet.frame,
                %error,
                "task failed"
            );
            self.failures.lock().push(TaskFailure { task, error });
        }

        self.executed.fetch_add(1, Ordering::Relaxed);
        self.executed_cost
            .fetch_add(u64::from(task.cost), Ordering::Relaxed);
        self.remaining.fetch_sub(1, Ordering::AcqRel);
        // Every completion may release a sync_threads waiter, not just the
        // frame's last task: a task body waits with its own task in flight.
        let _guard = self.done.lock();
        self.done_cvar.notify_all();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

fn worker_loop(shared: &Arc<PoolShared>) {
    loop {
        // Park until a frame packet is published or shutdown is signalled.
        let packet = {
            let mut fs = shared.frame.lock();
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                if let Some(packet) = fs.packet.clone() {
                    break packet;
                }
                shared.work_cvar.wait(&mut fs);
            }
        };

        shared.drain(&packet);

        // Wait for the frame to be retired so we don't spin re-checking
        // the same (already drained) packet.
        let mut fs = shared.frame.lock();
        while !shared.shutdown.load(Ordering::Acquire)
            && fs.packet.as_ref().is_some_and(|p| p.frame == packet.frame)
        {
            shared.work_cvar.wait(&mut fs);
        }
    }
}

/// Result of one `step_loop` call.
#[derive(Debug)]
pub struct FrameReport {
    /// The frame that ran.
    pub frame: u64,
    /// Tasks executed (including failed ones). Always equals the number
    /// submitted for the frame.
    pub executed: usize,
    /// Sum of the executed tasks' cost hints.
    pub executed_cost: u64,
    /// Tasks that returned an error or panicked.
    pub failures: Vec<TaskFailure>,
}

impl FrameReport {
    /// Whether every task completed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The parallel per-frame task executor.
///
/// Owns its worker threads for its whole lifetime; dropping the executor
/// signals shutdown and joins every worker, so no thread outlives it.
pub struct TaskExecutor {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskExecutor {
    /// Creates an executor with `worker_count` pool threads.
    ///
    /// A count of zero is valid: all tasks then run on the thread calling
    /// `step_loop`, which keeps tests deterministic.
    #[must_use]
    pub fn new(worker_count: usize, registry: ExecutorRegistry) -> Self {
        let shared = Arc::new(PoolShared {
            registry,
            queue: Mutex::new(TaskQueue {
                frame: 0,
                tasks: VecDeque::new(),
            }),
            frame: Mutex::new(FrameState {
                sealed: false,
                frame: 0,
                packet: None,
            }),
            work_cvar: Condvar::new(),
            done: Mutex::new(()),
            done_cvar: Condvar::new(),
            remaining: AtomicUsize::new(0),
            executed: AtomicUsize::new(0),
            executed_cost: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
        });

        let workers = (0..worker_count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(&shared))
            })
            .collect();

        tracing::debug!(worker_count, "task executor pool started");
        Self { shared, workers }
    }

    /// Number of pool threads (the caller thread is an extra drainer).
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The frame number the next `step_loop` will run.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.shared.frame.lock().frame
    }

    /// Tasks currently queued for the upcoming frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Reopens the queue for the next frame's submissions.
    pub fn begin_frame(&self) {
        self.shared.frame.lock().sealed = false;
    }

    /// Enqueues a task for the current frame.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::QueueSealed`] once the frame has been sealed and
    /// [`SchedulerError::NoExecutor`] for unregistered task kinds.
    pub fn submit(&self, task: Task) -> Result<(), SchedulerError> {
        if !self.shared.registry.has(task.kind) {
            return Err(SchedulerError::NoExecutor(task.kind));
        }
        // Hold the frame lock across the push so a concurrent seal cannot
        // slip between the check and the enqueue.
        let fs = self.shared.frame.lock();
        if fs.sealed {
            return Err(SchedulerError::QueueSealed { frame: fs.frame });
        }
        self.shared.queue.lock().tasks.push_back(task);
        Ok(())
    }

    /// Runs the frame: seals the queue, dispatches to the pool, drains from
    /// the calling thread too, and blocks until every task has run.
    ///
    /// Returns only after the end-of-frame barrier: exactly one execution
    /// per submitted task, with failures recorded in the report.
    pub fn step_loop(&self, world: &Arc<RwLock<World>>, delta_time: f32) -> FrameReport {
        let (frame, total) = {
            let mut fs = self.shared.frame.lock();
            fs.sealed = true;
            let total = self.shared.queue.lock().tasks.len();
            self.shared.remaining.store(total, Ordering::Release);
            self.shared.executed.store(0, Ordering::Relaxed);
            self.shared.executed_cost.store(0, Ordering::Relaxed);
            if total > 0 {
                fs.packet = Some(FramePacket {
                    frame: fs.frame,
                    delta_time,
                    world: Arc::clone(world),
                });
                self.shared.work_cvar.notify_all();
            }
            (fs.frame, total)
        };

        if total > 0 {
            let packet = FramePacket {
                frame,
                delta_time,
                world: Arc::clone(world),
            };
            self.shared.drain(&packet);
            self.sync_threads();
        }

        // Retire the frame and release workers parked on it. The queue
        // stays sealed until the next begin_frame.
        let failures = {
            let mut fs = self.shared.frame.lock();
            fs.packet = None;
            fs.frame += 1;
            // Advance the queue's frame tag so stragglers still inside
            // drain() cannot touch the next frame's submissions.
            self.shared.queue.lock().frame = fs.frame;
            self.shared.work_cvar.notify_all();
            std::mem::take(&mut *self.shared.failures.lock())
        };

        let report = FrameReport {
            frame,
            executed: self.shared.executed.load(Ordering::Relaxed),
            executed_cost: self.shared.executed_cost.load(Ordering::Relaxed),
            failures,
        };
        tracing::trace!(
            frame = report.frame,
            executed = report.executed,
            failures = report.failures.len(),
            "frame drained"
        );
        report
    }

    /// Barrier: blocks until every task dispatched so far has completed and
    /// the frame queue is drained. `step_loop` uses this as its end-of-frame
    /// wait; engine phases may call it between dependent dispatch cycles,
    /// and a task body may call it to wait for its sibling tasks. The caller
    /// helps drain the queue before waiting, and tasks on its own stack are
    /// excluded from the wait so a task never waits on itself.
    ///
    /// Two tasks waiting for each other through this barrier deadlock; task
    /// groups needing a mutual phase boundary use [`crate::SyncPoint`].
    pub fn sync_threads(&self) {
        let packet = self.shared.frame.lock().packet.clone();
        if let Some(packet) = packet {
            self.shared.drain(&packet);
        }
        let slack = TASK_DEPTH.with(Cell::get);
        let mut guard = self.shared.done.lock();
        while self.shared.remaining.load(Ordering::Acquire) > slack {
            self.shared.done_cvar.wait(&mut guard);
        }
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        {
            let _guard = self.shared.frame.lock();
            self.shared.work_cvar.notify_all();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
