//! Firmware services a chain depends on.

use crate::error::ScheduleError;

/// Direction of an xrun as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrunKind {
    /// Consumer starved (link output).
    Underrun,
    /// Producer blocked (link input).
    Overrun,
}

/// One-shot xrun message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrunNotification {
    /// Raw connector node id of the link gateway.
    pub node_id: u32,
    pub kind: XrunKind,
}

/// Sink for xrun notifications.
pub trait XrunNotifier {
    fn notify(&mut self, notification: XrunNotification);
}

/// System power management.
///
/// The DMA cadence needs a stable core clock, so a running chain holds the
/// "no low-power idle" lock.
pub trait PowerManager {
    fn idle_lock_get(&mut self);

    fn idle_lock_put(&mut self);
}

/// Registration with the low-latency periodic scheduler.
pub trait TaskScheduler {
    /// Start invoking the task every tick.
    fn schedule(&mut self) -> Result<(), ScheduleError>;

    /// Stop invoking the task.
    fn cancel(&mut self);
}

impl<T: XrunNotifier + ?Sized> XrunNotifier for &mut T {
    fn notify(&mut self, notification: XrunNotification) {
        (**self).notify(notification)
    }
}

impl<T: PowerManager + ?Sized> PowerManager for &mut T {
    fn idle_lock_get(&mut self) {
        (**self).idle_lock_get()
    }

    fn idle_lock_put(&mut self) {
        (**self).idle_lock_put()
    }
}

impl<T: TaskScheduler + ?Sized> TaskScheduler for &mut T {
    fn schedule(&mut self) -> Result<(), ScheduleError> {
        (**self).schedule()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

/// Everything a [`ChainDma`](super::ChainDma) needs from the firmware.
pub trait ChainServices: XrunNotifier + PowerManager + TaskScheduler {}

impl<T: XrunNotifier + PowerManager + TaskScheduler> ChainServices for T {}
