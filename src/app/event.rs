//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over the app channel so the main loop stays non-blocking.
//! The periodic timer and frame tasks feed the same channel.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

/// High-level events consumed by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Game timer refresh.
    TimerTick,
    /// Backdrop animation frame.
    Frame,
}

/// Spawns a background task that polls the terminal for events and sends
/// them through `tx`.  The task ends once every receiver is gone.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<AppEvent>, poll_rate: Duration) {
    // crossterm's poll/read block the thread, so keep them off the async
    // workers.
    tokio::task::spawn_blocking(move || loop {
        let has_event = event::poll(poll_rate).unwrap_or(false);
        if has_event {
            if let Ok(ev) = event::read() {
                let app_event = match ev {
                    CtEvent::Key(k) => AppEvent::Key(k),
                    CtEvent::Mouse(m) => AppEvent::Mouse(m),
                    CtEvent::Resize(w, h) => AppEvent::Resize(w, h),
                    _ => continue,
                };
                if tx.send(app_event).is_err() {
                    break; // receiver dropped
                }
            }
        } else if tx.is_closed() {
            break;
        }
    });
}
