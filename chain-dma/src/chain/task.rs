/// What the scheduler should do with a task after one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Run again on the next tick.
    Reschedule,
    /// Stop invoking the task until it is started again.
    Completed,
}

/// Lifecycle state of a periodic task.
///
/// There is no separate "ready" state. A task only exists once its
/// configuration has succeeded, so `Init` already means configured and
/// ready to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created and configured, never started.
    Init,
    /// Registered with the scheduler and running every tick.
    Queued,
    /// Stopped itself after a fatal error.
    Completed,
    /// Stopped on request.
    Paused,
}

/// Body of a task invoked by a low-latency periodic scheduler.
///
/// `run` is called once per tick, runs to completion and never blocks.
pub trait PeriodicTask {
    fn run(&mut self) -> TaskOutcome;
}
