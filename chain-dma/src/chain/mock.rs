//! Software stand-ins for DMA engines and firmware services.

use core::cell::Cell;

use crate::dma::{DmaChannel, DmaConfig, DmaStatus};
use crate::error::{DmaError, ScheduleError};

use super::{PowerManager, TaskScheduler, XrunNotification, XrunNotifier};

const MAX_RELOADS: usize = 16;
const MAX_NOTIFICATIONS: usize = 4;

/// Shared sequence counter so tests can check the order of calls made on
/// two different channels.
#[derive(Default)]
pub struct Bench {
    clock: Cell<u32>,
    stopped: Cell<u32>,
    released: Cell<u32>,
}

impl Bench {
    fn stamp(&self) -> u32 {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        now
    }

    /// Number of successful stops across all channels.
    pub fn stopped(&self) -> u32 {
        self.stopped.get()
    }

    /// Number of channels released so far.
    pub fn released(&self) -> u32 {
        self.released.get()
    }
}

pub struct MockDma<'a> {
    bench: &'a Bench,
    pub index: u32,
    pub alignment: u32,
    pub config: Option<DmaConfig>,
    /// Returned by every `get_status` call.
    pub status: Result<DmaStatus, DmaError>,
    reloads: [u32; MAX_RELOADS],
    reload_count: usize,
    pub starts: u32,
    pub stops: u32,
    /// Stamp of the last successful start, 0 if never.
    pub started_at: u32,
    pub stopped_at: u32,
    pub reloaded_at: u32,
    pub fail_configure: Option<DmaError>,
    pub fail_start: Option<DmaError>,
    pub fail_stop: Option<DmaError>,
    pub fail_reload: Option<DmaError>,
}

impl<'a> MockDma<'a> {
    pub fn new(bench: &'a Bench, index: u32) -> Self {
        MockDma {
            bench,
            index,
            alignment: 64,
            config: None,
            status: Ok(DmaStatus::default()),
            reloads: [0; MAX_RELOADS],
            reload_count: 0,
            starts: 0,
            stops: 0,
            started_at: 0,
            stopped_at: 0,
            reloaded_at: 0,
            fail_configure: None,
            fail_start: None,
            fail_stop: None,
            fail_reload: None,
        }
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    /// Lengths passed to `reload`, oldest first.
    pub fn reloads(&self) -> &[u32] {
        &self.reloads[..self.reload_count]
    }

    pub fn clear_reloads(&mut self) {
        self.reload_count = 0;
    }
}

impl DmaChannel for MockDma<'_> {
    fn index(&self) -> u32 {
        self.index
    }

    fn address_alignment(&self) -> Result<u32, DmaError> {
        Ok(self.alignment)
    }

    fn configure(&mut self, config: &DmaConfig) -> Result<(), DmaError> {
        if let Some(e) = self.fail_configure {
            return Err(e);
        }
        self.config = Some(*config);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DmaError> {
        if let Some(e) = self.fail_start {
            return Err(e);
        }
        self.starts += 1;
        self.started_at = self.bench.stamp();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DmaError> {
        self.stopped_at = self.bench.stamp();
        if let Some(e) = self.fail_stop {
            return Err(e);
        }
        self.stops += 1;
        self.bench.stopped.set(self.bench.stopped.get() + 1);
        Ok(())
    }

    fn get_status(&mut self) -> Result<DmaStatus, DmaError> {
        self.status
    }

    fn reload(&mut self, _offset: u32, len: u32) -> Result<(), DmaError> {
        if let Some(e) = self.fail_reload {
            return Err(e);
        }
        assert!(self.reload_count < MAX_RELOADS, "mock reload log full");
        self.reloads[self.reload_count] = len;
        self.reload_count += 1;
        self.reloaded_at = self.bench.stamp();
        Ok(())
    }

    fn release(&mut self) {
        self.bench.released.set(self.bench.released.get() + 1);
    }
}

#[derive(Default)]
pub struct MockServices {
    notifications: [Option<XrunNotification>; MAX_NOTIFICATIONS],
    notification_count: usize,
    /// Idle locks currently held.
    pub pm_locks: i32,
    pub scheduled: bool,
    pub schedule_calls: u32,
    pub cancel_calls: u32,
    pub fail_schedule: bool,
}

impl MockServices {
    /// Services whose scheduler refuses every registration.
    pub fn failing_schedule() -> Self {
        MockServices {
            fail_schedule: true,
            ..Default::default()
        }
    }

    pub fn notifications(&self) -> &[Option<XrunNotification>] {
        &self.notifications[..self.notification_count]
    }
}

impl XrunNotifier for MockServices {
    fn notify(&mut self, notification: XrunNotification) {
        assert!(self.notification_count < MAX_NOTIFICATIONS, "mock notification log full");
        self.notifications[self.notification_count] = Some(notification);
        self.notification_count += 1;
    }
}

impl PowerManager for MockServices {
    fn idle_lock_get(&mut self) {
        self.pm_locks += 1;
    }

    fn idle_lock_put(&mut self) {
        self.pm_locks -= 1;
    }
}

impl TaskScheduler for MockServices {
    fn schedule(&mut self) -> Result<(), ScheduleError> {
        self.schedule_calls += 1;
        if self.fail_schedule {
            return Err(ScheduleError);
        }
        self.scheduled = true;
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancel_calls += 1;
        self.scheduled = false;
    }
}
