//! Progress-driven animation parameters for the backdrop.
//!
//! The scene does not move with wall-clock time.  It eases toward the latest
//! progress target, and its animation time advances only by how far the
//! eased progress actually moved, so an idle player sees an idle scene.

/// Tuning constants of the smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTuning {
    /// Fraction of the remaining gap closed per frame.
    pub alpha: f64,
    /// Gain from target jump to velocity.
    pub velocity_gain: f64,
    /// Velocity magnitude cap.
    pub max_velocity: f64,
    /// Per-frame velocity decay factor.
    pub velocity_decay: f64,
    /// Largest per-frame progress change fed into animation time.
    pub max_frame_delta: f64,
    /// Animation time per unit of progress.
    pub time_gain: f64,
    /// Upper bound of the activity level.
    pub activity_cap: f64,
    /// Activity per unit of velocity.
    pub activity_gain: f64,
}

impl Default for AnimationTuning {
    fn default() -> Self {
        Self {
            alpha: 0.08,
            velocity_gain: 8.0,
            max_velocity: 2.0,
            velocity_decay: 0.95,
            max_frame_delta: 0.5,
            time_gain: 80.0,
            activity_cap: 0.6,
            activity_gain: 0.3,
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameParams {
    pub animation_time: f64,
    pub current_progress: f64,
    pub velocity: f64,
    pub activity: f64,
}

/// Eases progress and derives velocity/activity once per frame.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    tuning: AnimationTuning,
    current_progress: f64,
    target_progress: f64,
    previous_progress: f64,
    velocity: f64,
    animation_time: f64,
    activity: f64,
}

impl AnimationDriver {
    pub fn new(tuning: AnimationTuning) -> Self {
        Self {
            tuning,
            current_progress: 0.0,
            target_progress: 0.0,
            previous_progress: 0.0,
            velocity: 0.0,
            animation_time: 0.0,
            activity: 0.0,
        }
    }

    /// Set where progress should ease to, kicking velocity by the jump size.
    pub fn set_target_progress(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.target_progress = value;
        let raw = (value - self.current_progress) * self.tuning.velocity_gain;
        self.velocity = self.clamp_velocity(raw);
    }

    /// Advance one frame and return its parameters.
    pub fn tick(&mut self) -> FrameParams {
        let t = self.tuning;

        self.current_progress += (self.target_progress - self.current_progress) * t.alpha;

        let delta = (self.current_progress - self.previous_progress)
            .clamp(-t.max_frame_delta, t.max_frame_delta);
        self.animation_time += delta * t.time_gain;
        self.previous_progress = self.current_progress;

        self.velocity = self.clamp_velocity(self.velocity * t.velocity_decay);
        self.activity = (self.velocity.abs() * t.activity_gain).min(t.activity_cap);

        self.snapshot()
    }

    /// Parameters of the last frame, without advancing.
    pub fn snapshot(&self) -> FrameParams {
        FrameParams {
            animation_time: self.animation_time,
            current_progress: self.current_progress,
            velocity: self.velocity,
            activity: self.activity,
        }
    }

    #[cfg(test)]
    pub fn target_progress(&self) -> f64 {
        self.target_progress
    }

    /// Back to the rest state.
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }

    fn clamp_velocity(&self, v: f64) -> f64 {
        v.clamp(-self.tuning.max_velocity, self.tuning.max_velocity)
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(AnimationTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn first_tick_closes_alpha_of_the_gap() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(10.0);
        let frame = driver.tick();
        assert!((frame.current_progress - 0.8).abs() < EPS);
    }

    #[test]
    fn converges_and_velocity_decays() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(10.0);
        let mut frame = FrameParams::default();
        for _ in 0..1_000 {
            frame = driver.tick();
        }
        assert!((frame.current_progress - 10.0).abs() < 1e-6);
        assert!(frame.velocity.abs() < 1e-6);
        assert!(frame.activity < 1e-6);
    }

    #[test]
    fn velocity_is_capped() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(10.0);
        assert_eq!(driver.snapshot().velocity, 2.0);
        driver.set_target_progress(-10.0);
        assert_eq!(driver.snapshot().velocity, -2.0);
    }

    #[test]
    fn velocity_decays_geometrically_without_input() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(0.1);
        let kicked = driver.snapshot().velocity;
        assert!((kicked - 0.8).abs() < EPS);
        let frame = driver.tick();
        assert!((frame.velocity - 0.76).abs() < EPS);
        assert!((frame.activity - 0.228).abs() < EPS);
    }

    #[test]
    fn activity_is_capped() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(100.0);
        let frame = driver.tick();
        // |1.9| * 0.3 = 0.57, still under the cap.
        assert!((frame.activity - 0.57).abs() < EPS);

        let tuning = AnimationTuning {
            activity_gain: 1.0,
            ..AnimationTuning::default()
        };
        let mut driver = AnimationDriver::new(tuning);
        driver.set_target_progress(100.0);
        assert_eq!(driver.tick().activity, 0.6);
    }

    #[test]
    fn animation_time_advances_only_with_progress() {
        let mut driver = AnimationDriver::default();
        for _ in 0..50 {
            driver.tick();
        }
        assert_eq!(driver.snapshot().animation_time, 0.0);

        driver.set_target_progress(1.0);
        let frame = driver.tick();
        assert!((frame.animation_time - 0.08 * 80.0).abs() < EPS);
    }

    #[test]
    fn large_jumps_are_clamped_per_frame() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(1_000.0);
        let frame = driver.tick();
        // Progress moved by 80 but time only by the clamped 0.5.
        assert!((frame.animation_time - 40.0).abs() < EPS);
    }

    #[test]
    fn reset_returns_to_rest() {
        let mut driver = AnimationDriver::default();
        driver.set_target_progress(3.0);
        driver.tick();
        driver.reset();
        assert_eq!(driver.snapshot(), FrameParams::default());
        assert_eq!(driver.target_progress(), 0.0);
    }
}
