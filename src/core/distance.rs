//! Scroll distance accounting.
//!
//! Raw input arrives in pixels, either as relative deltas (wheel notches,
//! touch-style drags, keys) or as absolute page positions.  The tracker turns
//! it into meters using a display-density factor fixed at construction, then
//! drives the run timer and the animation sink.

use super::timer::{FinishOutcome, GamePhase, ScrollTimer};

/// Reference display density the meter conversion is based on.
pub const REFERENCE_DPI: f64 = 96.0;
/// Inches per meter.
pub const INCHES_PER_METER: f64 = 39.3701;

/// Meters per on-screen pixel for a given device pixel ratio.
///
/// A ratio that is zero, negative, or not finite falls back to 1.
pub fn unit_to_meter_factor(device_pixel_ratio: f64) -> f64 {
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let pixels_per_meter = REFERENCE_DPI * dpr * INCHES_PER_METER;
    1.0 / pixels_per_meter
}

/// How raw input maps onto the distance counter.  Fixed for a tracker's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingPolicy {
    /// Only forward motion counts; moving back is ignored, never subtracted.
    #[default]
    Accumulate,
    /// Distance is the current page position and moves back with it.
    Absolute,
}

impl TrackingPolicy {
    pub const ALL: &[TrackingPolicy] = &[TrackingPolicy::Accumulate, TrackingPolicy::Absolute];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackingPolicy::Accumulate => "accumulate",
            TrackingPolicy::Absolute => "absolute",
        }
    }
}

/// Consumer of the distance value, notified on every change.
pub trait ProgressSink {
    fn update_by_progress(&mut self, meters: f64);
}

/// What one input did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputOutcome {
    pub meters: f64,
    pub started: bool,
    pub resumed: bool,
    pub finished: Option<FinishOutcome>,
}

/// Converts raw pixel input into meters and detects start/resume/finish.
#[derive(Debug, Clone)]
pub struct DistanceTracker {
    policy: TrackingPolicy,
    factor: f64,
    target_meters: f64,
    raw_units: f64,
    /// Last known page position in pixels (never below zero).
    position: f64,
}

impl DistanceTracker {
    pub fn new(policy: TrackingPolicy, device_pixel_ratio: f64, target_meters: f64) -> Self {
        Self {
            policy,
            factor: unit_to_meter_factor(device_pixel_ratio),
            target_meters,
            raw_units: 0.0,
            position: 0.0,
        }
    }

    /// Feed a relative movement in pixels (positive = forward).
    pub fn register_delta(
        &mut self,
        raw_delta: f64,
        timer: &mut ScrollTimer,
        sink: &mut dyn ProgressSink,
    ) -> InputOutcome {
        if !raw_delta.is_finite() {
            return self.unchanged();
        }
        let before = self.meters();
        match self.policy {
            TrackingPolicy::Accumulate => {
                self.raw_units += raw_delta.max(0.0);
                self.position = (self.position + raw_delta).max(0.0);
            }
            TrackingPolicy::Absolute => {
                self.position = (self.position + raw_delta).max(0.0);
                self.raw_units = self.position;
            }
        }
        self.apply(before, timer, sink)
    }

    /// Feed an absolute page position in pixels.
    ///
    /// Under [`TrackingPolicy::Accumulate`] the sample only contributes its
    /// forward movement relative to the previous sample.
    #[allow(dead_code)] // terminals only report relative scrolling
    pub fn set_position(
        &mut self,
        raw_position: f64,
        timer: &mut ScrollTimer,
        sink: &mut dyn ProgressSink,
    ) -> InputOutcome {
        if !raw_position.is_finite() {
            return self.unchanged();
        }
        let before = self.meters();
        let position = raw_position.max(0.0);
        match self.policy {
            TrackingPolicy::Accumulate => {
                self.raw_units += (position - self.position).max(0.0);
            }
            TrackingPolicy::Absolute => {
                self.raw_units = position;
            }
        }
        self.position = position;
        self.apply(before, timer, sink)
    }

    /// Distance so far, in meters.
    pub fn meters(&self) -> f64 {
        self.raw_units * self.factor
    }

    #[cfg(test)]
    pub fn raw_units(&self) -> f64 {
        self.raw_units
    }

    pub fn target_meters(&self) -> f64 {
        self.target_meters
    }

    /// Fraction of the course covered, in `[0, 1]`.
    pub fn completion(&self) -> f64 {
        if self.target_meters <= 0.0 {
            return 1.0;
        }
        (self.meters() / self.target_meters).clamp(0.0, 1.0)
    }

    #[cfg(test)]
    pub fn reached_target(&self) -> bool {
        self.meters() >= self.target_meters
    }

    /// Zero the counter and tell the sink.
    pub fn reset(&mut self, sink: &mut dyn ProgressSink) {
        self.raw_units = 0.0;
        self.position = 0.0;
        sink.update_by_progress(0.0);
    }

    fn unchanged(&self) -> InputOutcome {
        InputOutcome {
            meters: self.meters(),
            ..InputOutcome::default()
        }
    }

    /// Accumulation is done; run the timer transitions, then notify the sink.
    fn apply(
        &self,
        before: f64,
        timer: &mut ScrollTimer,
        sink: &mut dyn ProgressSink,
    ) -> InputOutcome {
        let meters = self.meters();
        let mut outcome = InputOutcome {
            meters,
            ..InputOutcome::default()
        };
        if meters == before {
            return outcome;
        }

        if meters > before {
            match timer.on_qualifying_input() {
                Some(GamePhase::NotStarted) => outcome.started = true,
                Some(GamePhase::Paused) => outcome.resumed = true,
                _ => {}
            }
        }
        if timer.phase() == GamePhase::Playing && meters >= self.target_meters {
            outcome.finished = timer.finish();
        }

        sink.update_by_progress(meters);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::schedule::{RecordingScheduler, TickKind};
    use crate::core::timer::DEFAULT_TICK_PERIOD;

    #[derive(Default)]
    struct Sink(Vec<f64>);

    impl ProgressSink for Sink {
        fn update_by_progress(&mut self, meters: f64) {
            self.0.push(meters);
        }
    }

    fn timer(clock: &ManualClock) -> ScrollTimer {
        ScrollTimer::new(
            Box::new(clock.clone()),
            Box::new(RecordingScheduler::new()),
            DEFAULT_TICK_PERIOD,
        )
    }

    /// Pixels that make up `meters` at dpr 1.
    fn px(meters: f64) -> f64 {
        meters / unit_to_meter_factor(1.0)
    }

    #[test]
    fn factor_at_unit_density() {
        let factor = unit_to_meter_factor(1.0);
        assert!((factor - 0.000_264_6).abs() < 1e-7);
        assert!((1000.0 * factor - 0.2646).abs() < 1e-4);
    }

    #[test]
    fn bad_density_falls_back_to_one() {
        let one = unit_to_meter_factor(1.0);
        for dpr in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert_eq!(unit_to_meter_factor(dpr), one);
        }
        assert!((unit_to_meter_factor(2.0) - one / 2.0).abs() < 1e-12);
    }

    #[test]
    fn accumulate_ignores_backward_motion() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 300.0);

        let mut last = 0.0;
        for delta in [120.0, -500.0, 0.0, 30.0, -1.0, f64::NAN, 7.5] {
            tracker.register_delta(delta, &mut timer, &mut sink);
            assert!(tracker.meters() >= last);
            last = tracker.meters();
        }
        assert_eq!(tracker.raw_units(), 157.5);
    }

    #[test]
    fn accumulate_counts_only_forward_position_samples() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 300.0);

        tracker.set_position(400.0, &mut timer, &mut sink);
        tracker.set_position(100.0, &mut timer, &mut sink);
        tracker.set_position(250.0, &mut timer, &mut sink);
        assert_eq!(tracker.raw_units(), 550.0);
    }

    #[test]
    fn absolute_follows_the_page_position() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Absolute, 1.0, 300.0);

        tracker.register_delta(300.0, &mut timer, &mut sink);
        tracker.register_delta(-120.0, &mut timer, &mut sink);
        assert_eq!(tracker.raw_units(), 180.0);
        tracker.register_delta(-1_000.0, &mut timer, &mut sink);
        assert_eq!(tracker.raw_units(), 0.0);
        tracker.set_position(-5.0, &mut timer, &mut sink);
        assert_eq!(tracker.raw_units(), 0.0);
        tracker.set_position(640.0, &mut timer, &mut sink);
        assert_eq!(tracker.raw_units(), 640.0);
    }

    #[test]
    fn start_pause_resume_scenario() {
        let clock = ManualClock::new(10_000);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 300.0);

        let outcome = tracker.register_delta(50.0, &mut timer, &mut sink);
        assert!(outcome.started);
        assert_eq!(timer.phase(), GamePhase::Playing);
        assert_eq!(timer.start_epoch_millis(), Some(10_000));

        clock.advance(700);
        timer.tick();
        timer.pause();
        assert_eq!(timer.phase(), GamePhase::Paused);
        clock.advance(3_000);
        timer.tick();
        assert_eq!(timer.elapsed_millis(), 700);

        // Backward input does not resume.
        tracker.register_delta(-10.0, &mut timer, &mut sink);
        assert_eq!(timer.phase(), GamePhase::Paused);

        let outcome = tracker.register_delta(10.0, &mut timer, &mut sink);
        assert!(outcome.resumed);
        assert_eq!(timer.phase(), GamePhase::Playing);
        clock.advance(5);
        timer.tick();
        assert_eq!(timer.elapsed_millis(), 705);
    }

    #[test]
    fn finish_fires_once_when_crossing_the_target() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 1.0);

        let step = px(0.4);
        let mut finishes = 0;
        for _ in 0..6 {
            clock.advance(100);
            let outcome = tracker.register_delta(step, &mut timer, &mut sink);
            finishes += usize::from(outcome.finished.is_some());
        }
        assert_eq!(finishes, 1);
        assert_eq!(timer.phase(), GamePhase::Finished);
        // Started at 100, crossed on the third step at 300.
        assert_eq!(timer.elapsed_millis(), 200);
        assert_eq!(timer.best_time_millis(), Some(200));
    }

    #[test]
    fn absolute_moving_back_does_not_unfinish() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Absolute, 1.0, 1.0);

        tracker.register_delta(px(0.5), &mut timer, &mut sink);
        clock.advance(50);
        assert!(tracker
            .register_delta(px(0.6), &mut timer, &mut sink)
            .finished
            .is_some());
        tracker.register_delta(-px(0.8), &mut timer, &mut sink);
        assert!(!tracker.reached_target());
        assert_eq!(timer.phase(), GamePhase::Finished);
        assert!(tracker
            .register_delta(px(2.0), &mut timer, &mut sink)
            .finished
            .is_none());
    }

    #[test]
    fn sink_sees_every_change_and_only_changes() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 300.0);

        tracker.register_delta(1000.0, &mut timer, &mut sink);
        tracker.register_delta(-1000.0, &mut timer, &mut sink);
        tracker.register_delta(1000.0, &mut timer, &mut sink);
        assert_eq!(sink.0.len(), 2);
        assert!((sink.0[1] - 2.0 * 0.2646).abs() < 1e-3);

        tracker.reset(&mut sink);
        assert_eq!(tracker.raw_units(), 0.0);
        assert_eq!(sink.0.last(), Some(&0.0));
    }

    /// Records, for every notification, whether the timer task was live at
    /// that moment.
    struct TimerWatch {
        sched: RecordingScheduler,
        seen: Vec<(f64, bool)>,
    }

    impl ProgressSink for TimerWatch {
        fn update_by_progress(&mut self, meters: f64) {
            let ticking = self.sched.live_of(TickKind::Timer) == 1;
            self.seen.push((meters, ticking));
        }
    }

    #[test]
    fn sink_is_notified_after_the_timer_transition() {
        let clock = ManualClock::new(0);
        let sched = RecordingScheduler::new();
        let mut timer = ScrollTimer::new(
            Box::new(clock.clone()),
            Box::new(sched.clone()),
            DEFAULT_TICK_PERIOD,
        );
        let mut sink = TimerWatch {
            sched: sched.clone(),
            seen: Vec::new(),
        };
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 1.0);

        // Starting input: the run is already Playing when the sink hears of it.
        tracker.register_delta(px(0.5), &mut timer, &mut sink);
        assert_eq!(sink.seen.len(), 1);
        assert!(sink.seen[0].1);

        // Crossing input: already Finished, timer task gone.
        clock.advance(300);
        let outcome = tracker.register_delta(px(0.6), &mut timer, &mut sink);
        assert!(outcome.finished.is_some());
        assert_eq!(sink.seen.len(), 2);
        assert!(!sink.seen[1].1);
        assert!((sink.seen[1].0 - tracker.meters()).abs() < 1e-12);
    }

    #[test]
    fn one_input_can_start_and_finish_a_run() {
        let clock = ManualClock::new(5_000);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 1.0);

        let outcome = tracker.register_delta(px(3.0), &mut timer, &mut sink);
        assert!(outcome.started);
        assert_eq!(
            outcome.finished,
            Some(FinishOutcome {
                elapsed_millis: 0,
                new_best: true
            })
        );
        assert_eq!(timer.phase(), GamePhase::Finished);
        assert_eq!(timer.elapsed_millis(), 0);
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn completion_is_clamped() {
        let clock = ManualClock::new(0);
        let mut timer = timer(&clock);
        let mut sink = Sink::default();
        let mut tracker = DistanceTracker::new(TrackingPolicy::Accumulate, 1.0, 2.0);
        assert_eq!(tracker.completion(), 0.0);
        tracker.register_delta(px(1.0), &mut timer, &mut sink);
        assert!((tracker.completion() - 0.5).abs() < 1e-9);
        tracker.register_delta(px(5.0), &mut timer, &mut sink);
        assert_eq!(tracker.completion(), 1.0);
    }
}
