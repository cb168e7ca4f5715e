//! Periodic task scheduling seam.
//!
//! The game runs two independent periodic activities: the fixed-period timer
//! tick (only while a run is in progress) and the per-frame animation tick
//! (for the whole life of the scene).  Both are started and stopped through
//! [`TickScheduler`], which the app backs with tokio interval tasks.

use std::time::Duration;

/// Which periodic activity a scheduled task drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// Game timer refresh.
    Timer,
    /// Backdrop animation frame.
    Frame,
}

/// Opaque identifier of a scheduled periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Starts and cancels periodic tasks.
pub trait TickScheduler: Send {
    /// Start a task that fires `kind` every `period`.
    fn schedule(&mut self, kind: TickKind, period: Duration) -> TickHandle;

    /// Stop a task.  Cancelling an unknown or already-cancelled handle is a
    /// no-op.
    fn cancel(&mut self, handle: TickHandle);
}

/// A single periodic task owned by one component.
///
/// Holds at most one live handle: starting again cancels the stale task
/// first, so two tasks of the same slot never run at once.
pub struct TaskSlot {
    scheduler: Box<dyn TickScheduler>,
    kind: TickKind,
    period: Duration,
    handle: Option<TickHandle>,
}

impl TaskSlot {
    pub fn new(scheduler: Box<dyn TickScheduler>, kind: TickKind, period: Duration) -> Self {
        Self {
            scheduler,
            kind,
            period,
            handle: None,
        }
    }

    /// Replace the live task with a fresh one.
    pub fn start(&mut self) {
        self.stop();
        let handle = self.scheduler.schedule(self.kind, self.period);
        tracing::trace!(kind = ?self.kind, handle = handle.0, period = ?self.period, "scheduled periodic task");
        self.handle = Some(handle);
    }

    /// Cancel the live task, if any.  Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::trace!(kind = ?self.kind, handle = handle.0, "cancelled periodic task");
            self.scheduler.cancel(handle);
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl std::fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSlot")
            .field("kind", &self.kind)
            .field("period", &self.period)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Scheduler double that records which tasks are live.  Clones share the
/// same record so a test can keep one while a component owns another.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    inner: std::sync::Arc<std::sync::Mutex<Recorded>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorded {
    next_id: u64,
    pub live: std::collections::HashMap<TickHandle, TickKind>,
    pub scheduled_total: usize,
    pub cancelled_total: usize,
}

#[cfg(test)]
impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_of(&self, kind: TickKind) -> usize {
        let rec = self.inner.lock().unwrap();
        rec.live.values().filter(|k| **k == kind).count()
    }

    pub fn scheduled_total(&self) -> usize {
        self.inner.lock().unwrap().scheduled_total
    }

    pub fn cancelled_total(&self) -> usize {
        self.inner.lock().unwrap().cancelled_total
    }
}

#[cfg(test)]
impl TickScheduler for RecordingScheduler {
    fn schedule(&mut self, kind: TickKind, _period: Duration) -> TickHandle {
        let mut rec = self.inner.lock().unwrap();
        rec.next_id += 1;
        let handle = TickHandle(rec.next_id);
        rec.live.insert(handle, kind);
        rec.scheduled_total += 1;
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut rec = self.inner.lock().unwrap();
        if rec.live.remove(&handle).is_some() {
            rec.cancelled_total += 1;
        }
    }
}
