//! Cooperative tick scheduler.
//!
//! Every piece of firmware logic runs as a task body that executes to
//! completion and then returns.  "Waiting" is expressed by re-planning
//! the task for a future tick, never by blocking.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Task table                              │
//! │  ┌──────────┬──────────────────┬──────────────────────────┐  │
//! │  │ TaskId   │ tag (T)          │ due tick                 │  │
//! │  ├──────────┼──────────────────┼──────────────────────────┤  │
//! │  │ 0        │ Ranging(Interval)│ TICK_INFINITY (parked)   │  │
//! │  │ 1        │ Ranging(Measure) │ 3000                     │  │
//! │  │ 2        │ Thermometer      │ 10000                    │  │
//! │  └──────────┴──────────────────┴──────────────────────────┘  │
//! │                          │                                   │
//! │                          ▼                                   │
//! │          next_due() ──▶ application dispatches on tag        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler never calls task bodies itself.  It hands out the tag of
//! the earliest due task and the application context dispatches it, which
//! keeps ownership linear: the task body receives `&mut` access to its
//! driver and a [`Planner`] without any aliasing.

use heapless::Vec;
use log::{debug, warn};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Time
// ═══════════════════════════════════════════════════════════════

/// Scheduler time unit (milliseconds since boot).
pub type Tick = u64;

/// Sentinel due tick that parks a task indefinitely.
pub const TICK_INFINITY: Tick = Tick::MAX;

/// Maximum number of registered tasks (stack-allocated).
const MAX_TASKS: usize = 8;

/// Upper bound on task bodies run by a single dispatch pass.
pub const MAX_DISPATCH_PER_PASS: usize = 32;

/// Handle returned by [`Scheduler::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u8);

impl TaskId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ═══════════════════════════════════════════════════════════════
//  Planner: what a task body is allowed to do
// ═══════════════════════════════════════════════════════════════

/// Planning primitives handed to drivers.
///
/// Drivers only ever see this trait, never the concrete task table, so
/// they can be tested against a bare clock.
pub trait Planner {
    /// Current monotonic tick.
    fn now(&self) -> Tick;

    /// Run `task` at the absolute `tick` (`TICK_INFINITY` parks it).
    fn plan_absolute(&mut self, task: TaskId, tick: Tick);

    /// Run `task` `delay` ticks from now.
    fn plan_relative(&mut self, task: TaskId, delay: Tick) {
        let due = self.now().saturating_add(delay);
        self.plan_absolute(task, due);
    }

    /// Run `task` on the next dispatch pass.
    fn plan_now(&mut self, task: TaskId) {
        let now = self.now();
        self.plan_absolute(task, now);
    }

    /// Re-plan the task whose body is currently executing.
    fn plan_current_relative(&mut self, delay: Tick);
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Internal bookkeeping for a registered task.
#[derive(Debug, Clone, Copy)]
struct TaskEntry<T> {
    tag: T,
    due: Tick,
}

/// The scheduler engine, generic over the application's task tag.
pub struct Scheduler<T> {
    tasks: Vec<TaskEntry<T>, MAX_TASKS>,
    now: Tick,
    /// Task handed out by the last `next_due()`.
    current: Option<TaskId>,
}

impl<T: Copy> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            now: 0,
            current: None,
        }
    }

    /// Register a task that first runs `initial_delay` ticks from now.
    pub fn register(&mut self, tag: T, initial_delay: Tick) -> Result<TaskId> {
        let index = self.tasks.len();
        let due = self.now.saturating_add(initial_delay);
        self.tasks
            .push(TaskEntry { tag, due })
            .map_err(|_| Error::SchedulerFull)?;
        debug!("Scheduler: registered task {} due at {}", index, due);
        Ok(TaskId(index as u8))
    }

    /// Advance the clock.  The clock is monotonic; earlier ticks are ignored.
    pub fn set_now(&mut self, tick: Tick) {
        if tick < self.now {
            warn!("Scheduler: clock went backwards ({} < {}), ignored", tick, self.now);
            return;
        }
        self.now = tick;
    }

    /// Pop the earliest task whose due tick has been reached.
    ///
    /// The task is parked before it is returned; its body has to plan it
    /// again to run another time.  Ties go to the task registered first.
    pub fn next_due(&mut self) -> Option<(TaskId, T)> {
        let now = self.now;
        let (index, entry) = self
            .tasks
            .iter_mut()
            .enumerate()
            .filter(|(_, e)| e.due != TICK_INFINITY && e.due <= now)
            .min_by_key(|(_, e)| e.due)?;

        entry.due = TICK_INFINITY;
        let id = TaskId(index as u8);
        self.current = Some(id);
        Some((id, entry.tag))
    }

    /// Earliest planned tick across all tasks, or `None` if all are parked.
    pub fn next_wake(&self) -> Option<Tick> {
        self.tasks
            .iter()
            .map(|e| e.due)
            .filter(|&due| due != TICK_INFINITY)
            .min()
    }

    /// Due tick of a task (`TICK_INFINITY` when parked).
    pub fn due(&self, task: TaskId) -> Option<Tick> {
        self.tasks.get(task.index()).map(|e| e.due)
    }

    pub fn is_parked(&self, task: TaskId) -> bool {
        self.due(task).is_none_or(|due| due == TICK_INFINITY)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl<T: Copy> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Planner for Scheduler<T> {
    fn now(&self) -> Tick {
        self.now
    }

    fn plan_absolute(&mut self, task: TaskId, tick: Tick) {
        match self.tasks.get_mut(task.index()) {
            Some(entry) => entry.due = tick,
            None => warn!("Scheduler: plan for unknown task {}", task.index()),
        }
    }

    fn plan_current_relative(&mut self, delay: Tick) {
        match self.current {
            Some(task) => self.plan_relative(task, delay),
            None => warn!("Scheduler: plan_current_relative outside a task body"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
