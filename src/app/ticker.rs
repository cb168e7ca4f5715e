//! tokio-backed [`TickScheduler`]: one interval task per scheduled handle,
//! each forwarding ticks into the app event channel.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::event::AppEvent;
use crate::core::schedule::{TickHandle, TickKind, TickScheduler};

/// Spawns and aborts periodic tasks for one owner.
///
/// Each owner (timer, backdrop) gets its own ticker via [`TokioTicker::fork`],
/// so handles never cross owners.  Dropping a ticker aborts its tasks.
pub struct TokioTicker {
    tx: UnboundedSender<AppEvent>,
    tasks: HashMap<TickHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTicker {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            tx,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// A fresh ticker feeding the same channel, with no tasks of its own.
    pub fn fork(&self) -> Self {
        Self::new(self.tx.clone())
    }
}

impl TickScheduler for TokioTicker {
    fn schedule(&mut self, kind: TickKind, period: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        let tx = self.tx.clone();
        let event = match kind {
            TickKind::Timer => AppEvent::TimerTick,
            TickKind::Frame => AppEvent::Frame,
        };

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(event.clone()).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_ticks_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = TokioTicker::new(tx);

        let handle = ticker.schedule(TickKind::Timer, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(35)).await;
        let mut ticks = 0;
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev, AppEvent::TimerTick);
            ticks += 1;
        }
        assert!(ticks >= 3, "got {ticks} ticks");

        ticker.cancel(handle);
        tokio::task::yield_now().await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_stops_its_tasks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = TokioTicker::new(tx);
        ticker.schedule(TickKind::Frame, Duration::from_millis(16));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(rx.try_recv(), Ok(AppEvent::Frame));

        drop(ticker);
        tokio::task::yield_now().await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
