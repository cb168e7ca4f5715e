//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! The state exclusively owns one game (tracker + timer) and one backdrop
//! scene, created together and torn down together.

use crate::config::AppConfig;
use crate::core::clock::Clock;
use crate::core::distance::{DistanceTracker, InputOutcome};
use crate::core::schedule::TickScheduler;
use crate::core::timer::{FinishOutcome, GamePhase, ScrollTimer, DEFAULT_TICK_PERIOD};
use crate::ui::backdrop::Backdrop;

/// Top-level application state.
pub struct AppState {
    /// User configuration, fixed for the session.
    pub config: AppConfig,
    /// Distance counter.
    pub tracker: DistanceTracker,
    /// Run clock and phase.
    pub timer: ScrollTimer,
    /// Decorative scene driven by progress.
    pub backdrop: Backdrop,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// Whether the key-binding overlay is shown.
    pub show_help: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Result of the run that just finished, until the next reset.
    pub last_finish: Option<FinishOutcome>,
    /// Row of the last left-button press/drag, for touch-style scrolling.
    pub drag_row: Option<u16>,
    torn_down: bool,
}

impl AppState {
    /// Build the game and start the backdrop's frame task.
    pub fn new(
        config: AppConfig,
        clock: Box<dyn Clock>,
        timer_scheduler: Box<dyn TickScheduler>,
        frame_scheduler: Box<dyn TickScheduler>,
    ) -> Self {
        let game = &config.game;
        let tracker = DistanceTracker::new(
            game.tracking,
            game.device_pixel_ratio,
            game.target_distance_m,
        );
        let timer = ScrollTimer::new(clock, timer_scheduler, DEFAULT_TICK_PERIOD);
        let mut backdrop = Backdrop::new(frame_scheduler, game.fps, game.idle_drift);
        backdrop.start();

        Self {
            config,
            tracker,
            timer,
            backdrop,
            should_quit: false,
            show_help: false,
            status_message: None,
            last_finish: None,
            drag_row: None,
            torn_down: false,
        }
    }

    /// Feed a scroll movement in pixels (positive = forward).
    pub fn scroll_by(&mut self, pixels: f64) {
        let outcome = self
            .tracker
            .register_delta(pixels, &mut self.timer, &mut self.backdrop);
        self.report(outcome);
    }

    /// Pause the run.  Ignored unless a run is in progress.
    pub fn pause(&mut self) {
        if self.timer.pause() {
            self.status_message = Some("Paused. Scroll to resume.".into());
        }
    }

    /// Back to the start line.  The best time survives.
    pub fn reset(&mut self) {
        self.timer.reset();
        self.tracker.reset(&mut self.backdrop);
        self.backdrop.reset();
        self.drag_row = None;
        self.status_message = None;
        self.last_finish = None;
        tracing::debug!("game reset");
    }

    pub fn on_timer_tick(&mut self) {
        self.timer.tick();
    }

    pub fn on_frame(&mut self) {
        self.backdrop.tick();
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.backdrop.handle_resize(width, height);
    }

    /// Stop every periodic task.  Runs once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.timer.dispose();
        self.backdrop.dispose();
        tracing::debug!("scene torn down");
    }

    #[cfg(test)]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn phase(&self) -> GamePhase {
        self.timer.phase()
    }

    fn report(&mut self, outcome: InputOutcome) {
        if outcome.started {
            self.status_message = Some("Go!".into());
            tracing::debug!(meters = outcome.meters, "run started");
        } else if outcome.resumed {
            self.status_message = Some("Resumed.".into());
            tracing::debug!(
                meters = outcome.meters,
                elapsed_ms = self.timer.elapsed_millis(),
                "run resumed"
            );
        }
        if let Some(finish) = outcome.finished {
            self.last_finish = Some(finish);
            let time = self.config.game.time_format.format(finish.elapsed_millis);
            self.status_message = Some(if finish.new_best {
                format!("Finished in {time}. New best!")
            } else {
                format!("Finished in {time}.")
            });
            tracing::debug!(
                meters = outcome.meters,
                elapsed_ms = finish.elapsed_millis,
                new_best = finish.new_best,
                "run finished"
            );
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::animation::FrameParams;
    use crate::core::schedule::{RecordingScheduler, TickKind};

    pub(crate) struct Harness {
        pub state: AppState,
        pub clock: ManualClock,
        pub sched: RecordingScheduler,
    }

    pub(crate) fn harness(config: AppConfig) -> Harness {
        let clock = ManualClock::new(0);
        let sched = RecordingScheduler::new();
        let state = AppState::new(
            config,
            Box::new(clock.clone()),
            Box::new(sched.clone()),
            Box::new(sched.clone()),
        );
        Harness {
            state,
            clock,
            sched,
        }
    }

    #[test]
    fn frame_task_runs_from_construction_through_pause() {
        let mut h = harness(AppConfig::default());
        assert_eq!(h.sched.live_of(TickKind::Frame), 1);
        assert_eq!(h.sched.live_of(TickKind::Timer), 0);

        h.state.scroll_by(100.0);
        assert_eq!(h.sched.live_of(TickKind::Timer), 1);
        h.state.pause();
        assert_eq!(h.state.phase(), GamePhase::Paused);
        assert_eq!(h.sched.live_of(TickKind::Timer), 0);
        assert_eq!(h.sched.live_of(TickKind::Frame), 1);
    }

    #[test]
    fn teardown_runs_once_and_cancels_everything() {
        let mut h = harness(AppConfig::default());
        h.state.scroll_by(100.0);
        h.state.teardown();
        assert!(h.state.is_torn_down());
        assert!(h.sched.live_of(TickKind::Timer) == 0 && h.sched.live_of(TickKind::Frame) == 0);

        let cancelled = h.sched.cancelled_total();
        h.state.teardown();
        drop(h.state);
        assert_eq!(h.sched.cancelled_total(), cancelled);
    }

    #[test]
    fn finishing_reports_the_time() {
        let mut config = AppConfig::default();
        config.game.target_distance_m = 1.0;
        let mut h = harness(config);

        h.state.scroll_by(100.0);
        h.clock.advance(4_321);
        h.state.on_timer_tick();
        h.state.scroll_by(10_000.0);

        assert_eq!(h.state.phase(), GamePhase::Finished);
        assert_eq!(
            h.state.status_message.as_deref(),
            Some("Finished in 4.321s. New best!")
        );
        assert_eq!(
            h.state.last_finish,
            Some(FinishOutcome {
                elapsed_millis: 4_321,
                new_best: true
            })
        );
    }

    #[test]
    fn reset_clears_progress_but_keeps_best() {
        let mut config = AppConfig::default();
        config.game.target_distance_m = 1.0;
        let mut h = harness(config);
        h.state.scroll_by(100.0);
        h.clock.advance(800);
        h.state.scroll_by(10_000.0);

        h.state.reset();
        assert_eq!(h.state.phase(), GamePhase::NotStarted);
        assert_eq!(h.state.tracker.meters(), 0.0);
        assert_eq!(h.state.timer.elapsed_millis(), 0);
        assert_eq!(h.state.timer.best_time_millis(), Some(800));
        assert_eq!(h.state.last_finish, None);
        assert_eq!(h.state.backdrop.target_progress(), 0.0);
    }

    #[test]
    fn reset_puts_the_scene_back_at_rest() {
        let mut h = harness(AppConfig::default());
        h.state.scroll_by(5_000.0);
        for _ in 0..10 {
            h.state.on_frame();
        }
        assert!(h.state.backdrop.frame().current_progress > 0.0);

        h.state.reset();
        assert_eq!(h.state.backdrop.frame(), FrameParams::default());
        assert!(h.state.backdrop.is_running());
    }
}
