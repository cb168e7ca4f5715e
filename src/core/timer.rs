//! Run timer and the NotStarted → Playing ⇄ Paused → Finished state machine.
//!
//! Elapsed time is measured against an injected [`Clock`].  Pausing stores the
//! elapsed time as an offset; starting and resuming both recompute the start
//! epoch as `now - offset`, so a pause never loses or duplicates time.

use std::time::Duration;

use chrono::{DateTime, Local};

use super::clock::Clock;
use super::schedule::{TaskSlot, TickKind, TickScheduler};

/// Period of the timer refresh task.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(10);

/// Phase of a run.  Only [`ScrollTimer`] changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    NotStarted,
    Playing,
    Paused,
    Finished,
}

impl GamePhase {
    pub fn label(self) -> &'static str {
        match self {
            GamePhase::NotStarted => "ready",
            GamePhase::Playing => "running",
            GamePhase::Paused => "paused",
            GamePhase::Finished => "finished",
        }
    }
}

/// Fastest finish seen in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestRecord {
    pub millis: u64,
    pub set_at: DateTime<Local>,
}

/// Result of a run crossing the finish line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishOutcome {
    pub elapsed_millis: u64,
    /// `true` when this run replaced the best time.
    pub new_best: bool,
}

/// Elapsed-time bookkeeping for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct GameClock {
    start_epoch_millis: Option<u64>,
    paused_accumulated_millis: u64,
    elapsed_millis: u64,
}

/// Owns the run clock, the phase, and the periodic timer task.
pub struct ScrollTimer {
    clock: Box<dyn Clock>,
    task: TaskSlot,
    phase: GamePhase,
    game: GameClock,
    best: Option<BestRecord>,
}

impl ScrollTimer {
    pub fn new(
        clock: Box<dyn Clock>,
        scheduler: Box<dyn TickScheduler>,
        tick_period: Duration,
    ) -> Self {
        Self {
            clock,
            task: TaskSlot::new(scheduler, TickKind::Timer, tick_period),
            phase: GamePhase::NotStarted,
            game: GameClock::default(),
            best: None,
        }
    }

    /// Register forward progress.  Starts a fresh run or resumes a paused
    /// one; does nothing while playing or after the finish.
    ///
    /// Returns the phase that was left, if a transition happened.
    pub fn on_qualifying_input(&mut self) -> Option<GamePhase> {
        let from = self.phase;
        match from {
            GamePhase::NotStarted | GamePhase::Paused => {
                let now = self.clock.now_millis();
                self.game.start_epoch_millis =
                    Some(now.saturating_sub(self.game.paused_accumulated_millis));
                self.phase = GamePhase::Playing;
                self.task.start();
                tracing::debug!(
                    from = ?from,
                    offset_ms = self.game.paused_accumulated_millis,
                    "timer running"
                );
                Some(from)
            }
            GamePhase::Playing | GamePhase::Finished => None,
        }
    }

    /// Periodic refresh.  No-op unless playing.
    pub fn tick(&mut self) {
        if self.phase == GamePhase::Playing {
            self.refresh_elapsed();
        }
    }

    /// Freeze the clock.  Only valid while playing; otherwise a silent no-op.
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.refresh_elapsed();
        self.phase = GamePhase::Paused;
        self.game.paused_accumulated_millis = self.game.elapsed_millis;
        self.task.stop();
        tracing::debug!(elapsed_ms = self.game.elapsed_millis, "timer paused");
        true
    }

    /// Stop the run and update the best time.  Only valid while playing.
    pub fn finish(&mut self) -> Option<FinishOutcome> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.refresh_elapsed();
        self.phase = GamePhase::Finished;
        self.task.stop();

        let elapsed = self.game.elapsed_millis;
        let new_best = self.best.map_or(true, |best| elapsed < best.millis);
        if new_best {
            self.best = Some(BestRecord {
                millis: elapsed,
                set_at: Local::now(),
            });
            tracing::info!(elapsed_ms = elapsed, "new best time");
        }
        tracing::debug!(elapsed_ms = elapsed, new_best, "timer finished");
        Some(FinishOutcome {
            elapsed_millis: elapsed,
            new_best,
        })
    }

    /// Back to NotStarted from any phase.  The best record is kept.
    pub fn reset(&mut self) {
        self.task.stop();
        self.phase = GamePhase::NotStarted;
        self.game = GameClock::default();
        tracing::debug!("timer reset");
    }

    /// Cancel the periodic task.  Safe to call any number of times.
    pub fn dispose(&mut self) {
        self.task.stop();
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.game.elapsed_millis
    }

    #[cfg(test)]
    pub fn start_epoch_millis(&self) -> Option<u64> {
        self.game.start_epoch_millis
    }

    #[cfg(test)]
    pub fn paused_accumulated_millis(&self) -> u64 {
        self.game.paused_accumulated_millis
    }

    #[cfg(test)]
    pub fn best_time_millis(&self) -> Option<u64> {
        self.best.map(|b| b.millis)
    }

    pub fn best_record(&self) -> Option<BestRecord> {
        self.best
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.task.is_active()
    }

    fn refresh_elapsed(&mut self) {
        if let Some(start) = self.game.start_epoch_millis {
            let now = self.clock.now_millis().saturating_sub(start);
            // Monotonic while playing even if the clock stutters.
            self.game.elapsed_millis = self.game.elapsed_millis.max(now);
        }
    }
}

impl Drop for ScrollTimer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ScrollTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollTimer")
            .field("phase", &self.phase)
            .field("game", &self.game)
            .field("best", &self.best)
            .field("task", &self.task)
            .finish()
    }
}
