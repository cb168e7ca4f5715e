//! Decorative ring-tunnel backdrop.
//!
//! The scene owns an [`AnimationDriver`] and a frame task.  Distance updates
//! arrive through [`ProgressSink`]; every frame event advances the driver
//! once and the widget draws from the resulting [`FrameParams`] alone:
//! polygon rings fly toward the camera as progress grows, a spiral particle
//! column slides past them, and the camera sways with the current activity.

use std::f64::consts::{PI, TAU};
use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Widget,
    },
};

use crate::core::animation::{AnimationDriver, AnimationTuning, FrameParams};
use crate::core::distance::ProgressSink;
use crate::core::schedule::{TaskSlot, TickKind, TickScheduler};

/// Cosmetic scale from meters to scene progress.
pub const PROGRESS_PER_METER: f64 = 0.15;

const RING_COUNT: usize = 28;
const RING_SPACING: f64 = 110.0;
/// Ring travel per unit of progress.
const RING_TRAVEL: f64 = 700.0;
const RING_MAX_OPACITY: f64 = 0.35;

const PARTICLE_COUNT: usize = 720;
const PARTICLE_LOOP: f64 = 3600.0;
/// Particle travel per unit of progress.
const PARTICLE_TRAVEL: f64 = 900.0;
const PARTICLE_HUE_BUCKETS: usize = 8;

const CAMERA_Z: f64 = 500.0;
const NEAR_PLANE: f64 = 1.0;
const BASE_FOV_DEG: f64 = 60.0;

/// Animation time added per frame when idle drift is on.
const IDLE_DRIFT_PER_FRAME: f64 = 0.004;

/// Wrap `value` into `[-range / 2, range / 2)`.
pub fn wrap_centered(value: f64, range: f64) -> f64 {
    value.rem_euclid(range) - range * 0.5
}

/// HSL (all in `[0, 1]`) to an RGB terminal colour.
pub fn hsl_color(h: f64, s: f64, l: f64) -> Color {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h * 6.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::Rgb(to_u8(r), to_u8(g), to_u8(b))
}

// ───────────────────────────────────────── camera ────────────

/// Perspective camera looking down -z from `CAMERA_Z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub roll: f64,
    pub fov_deg: f64,
}

impl Camera {
    /// Camera sway for animation time `t`; at zero activity it sits still.
    pub fn for_frame(t: f64, activity: f64) -> Self {
        Self {
            x: (t * 0.3).sin() * 8.0 * activity,
            y: (t * 0.25).cos() * 6.0 * activity,
            roll: (t * 0.15).sin() * 0.015 * activity,
            fov_deg: BASE_FOV_DEG + (t * 0.4).sin() * 1.5 * activity,
        }
    }

    /// Project a world point to normalised screen space, where y spans
    /// `[-1, 1]`.  Returns `(x, y, depth)`, or `None` behind the near plane.
    pub fn project(&self, p: [f64; 3]) -> Option<(f64, f64, f64)> {
        let depth = CAMERA_Z - p[2];
        if depth < NEAR_PLANE {
            return None;
        }
        let (dx, dy) = (p[0] - self.x, p[1] - self.y);
        let (sin_r, cos_r) = (-self.roll).sin_cos();
        let rx = dx * cos_r - dy * sin_r;
        let ry = dx * sin_r + dy * cos_r;
        let scale = depth * (self.fov_deg.to_radians() / 2.0).tan();
        Some((rx / scale, ry / scale, depth))
    }
}

// ───────────────────────────────────────── scene objects ─────

#[derive(Debug, Clone)]
struct Ring {
    initial_z: f64,
    radius: f64,
    segments: usize,
    hue: f64,
    base_rotation_speed: f64,
    phase_offset: f64,
    wave_phase: f64,
    rotation_z: f64,
}

#[derive(Debug, Clone)]
struct Particle {
    x: f64,
    y: f64,
    z: f64,
    offset: f64,
    bucket: usize,
}

/// Deterministic pseudo-random value in `[0, 1)` for index `i`.
fn scatter(i: usize, salt: f64) -> f64 {
    ((i as f64 + 1.0) * 0.618_033_988_75 + salt).fract()
}

fn build_rings() -> Vec<Ring> {
    (0..RING_COUNT)
        .map(|i| {
            let frac = i as f64 / RING_COUNT as f64;
            Ring {
                initial_z: -(i as f64) * RING_SPACING,
                radius: 50.0 + frac.powf(0.8) * 400.0,
                segments: 5 + (i as f64 * 0.6).floor() as usize,
                hue: frac * 0.5 + 0.4,
                base_rotation_speed: (scatter(i, 0.13) - 0.5) * 0.02,
                phase_offset: i as f64 * 0.618,
                wave_phase: scatter(i, 0.71) * TAU,
                rotation_z: 0.0,
            }
        })
        .collect()
}

fn build_particles() -> Vec<Particle> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..PARTICLE_COUNT)
        .map(|i| {
            let frac = i as f64 / PARTICLE_COUNT as f64;
            let spiral = (i % 7) as f64;
            let angle = i as f64 * golden_angle + spiral * PI * 0.3;
            let radius = 20.0 + frac.sqrt() * 380.0 + spiral * 15.0;
            let hue = (frac * 1.2 + spiral * 0.08).rem_euclid(1.0);
            Particle {
                x: angle.cos() * radius,
                y: (frac * 2.0 - 1.0) * 1800.0,
                z: angle.sin() * radius,
                offset: scatter(i, 0.37) * TAU,
                bucket: ((hue * PARTICLE_HUE_BUCKETS as f64) as usize)
                    .min(PARTICLE_HUE_BUCKETS - 1),
            }
        })
        .collect()
}

// ───────────────────────────────────────── backdrop ──────────

/// The rendering engine behind the game: consumes progress, ticks per frame.
pub struct Backdrop {
    driver: AnimationDriver,
    frame: FrameParams,
    rings: Vec<Ring>,
    particles: Vec<Particle>,
    viewport: (u16, u16),
    task: TaskSlot,
    idle_drift: bool,
    frames: u64,
}

impl Backdrop {
    pub fn new(scheduler: Box<dyn TickScheduler>, fps: u32, idle_drift: bool) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        Self {
            driver: AnimationDriver::new(AnimationTuning::default()),
            frame: FrameParams::default(),
            rings: build_rings(),
            particles: build_particles(),
            viewport: (0, 0),
            task: TaskSlot::new(scheduler, TickKind::Frame, period),
            idle_drift,
            frames: 0,
        }
    }

    /// Start the per-frame task.  Restarting replaces the old task.
    pub fn start(&mut self) {
        self.task.start();
    }

    /// Advance one frame.
    pub fn tick(&mut self) {
        self.frame = self.driver.tick();
        self.frames = self.frames.wrapping_add(1);
        let spin = self.frame.activity * 0.35;
        for ring in &mut self.rings {
            ring.rotation_z = (ring.rotation_z + ring.base_rotation_speed * spin).rem_euclid(TAU);
        }
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        if width > 0 && height > 0 {
            self.viewport = (width, height);
        }
    }

    /// Snap the scene back to rest.  The frame task keeps running.
    pub fn reset(&mut self) {
        self.driver.reset();
        self.frame = self.driver.snapshot();
        for ring in &mut self.rings {
            ring.rotation_z = 0.0;
        }
    }

    /// Cancel the frame task.  Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.task.stop();
    }

    /// Parameters of the last frame.
    #[cfg(test)]
    pub fn frame(&self) -> FrameParams {
        self.frame
    }

    #[cfg(test)]
    pub fn target_progress(&self) -> f64 {
        self.driver.target_progress()
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.task.is_active()
    }

    /// Animation time used for drawing, including idle drift when enabled.
    pub fn render_time(&self) -> f64 {
        let drift = if self.idle_drift {
            self.frames as f64 * IDLE_DRIFT_PER_FRAME
        } else {
            0.0
        };
        self.frame.animation_time + drift
    }

    /// Width-over-height of the drawing surface in square units.  Terminal
    /// cells are about twice as tall as wide.
    fn aspect(&self, area: Rect) -> f64 {
        let (w, h) = if self.viewport.0 > 0 {
            self.viewport
        } else {
            (area.width, area.height)
        };
        if h == 0 {
            return 1.0;
        }
        f64::from(w) / (f64::from(h) * 2.0)
    }

    /// Build the frame's line segments and particle points.
    pub fn geometry(&self) -> SceneGeometry {
        let t = self.render_time();
        let FrameParams {
            current_progress: progress,
            velocity,
            activity,
            ..
        } = self.frame;
        let camera = Camera::for_frame(t, activity);
        let mut scene = SceneGeometry::default();

        let ring_loop = RING_COUNT as f64 * RING_SPACING;
        for (index, ring) in self.rings.iter().enumerate() {
            let i = index as f64;
            let z = wrap_centered(ring.initial_z + progress * RING_TRAVEL, ring_loop);
            let opacity = RING_MAX_OPACITY * (1.0 - z.abs() / (ring_loop * 0.5)).max(0.0);
            if opacity < 0.03 {
                continue;
            }

            let wave = t * 0.8 + ring.wave_phase;
            let cx = (wave + i * 0.25).sin() * 6.0 * activity;
            let cy = (wave * 0.6 + i * 0.4).cos() * 5.0 * activity;
            let tilt_x = (t * 0.6 + ring.phase_offset).sin() * activity * 0.12;
            let tilt_y = (t * 0.4 + ring.phase_offset).cos() * activity * 0.1;
            let pulse = 1.0 + (t * 1.5 + i * 0.3).sin() * 0.06 * activity;
            let color = hsl_color(ring.hue, 0.85, 0.55 * opacity / RING_MAX_OPACITY);

            let vertex = |k: usize| {
                let theta = ring.rotation_z + TAU * k as f64 / ring.segments as f64;
                let (lx, ly) = (theta.cos() * ring.radius * pulse, theta.sin() * ring.radius * pulse);
                // Tilt about x, then y.
                let (y1, z1) = (ly * tilt_x.cos(), ly * tilt_x.sin());
                let (x2, z2) = (lx * tilt_y.cos() + z1 * tilt_y.sin(), z1 * tilt_y.cos() - lx * tilt_y.sin());
                camera.project([cx + x2, cy + y1, z + z2])
            };

            let points: Vec<Option<(f64, f64, f64)>> = (0..ring.segments).map(vertex).collect();
            for k in 0..ring.segments {
                if let (Some(a), Some(b)) = (points[k], points[(k + 1) % ring.segments]) {
                    scene.lines.push((a.0, a.1, b.0, b.1, color));
                }
            }
        }

        let spin = t * 0.12 + progress * 1.8;
        let (sin_s, cos_s) = spin.sin_cos();
        let response = velocity.abs() * 60.0;
        for p in &self.particles {
            let y = wrap_centered(p.y + progress * PARTICLE_TRAVEL + PARTICLE_LOOP * 0.5, PARTICLE_LOOP);
            let sway = (y * 0.015 + t * 2.5).sin() * response;
            let x = p.x
                + (y * 0.006 + t * 0.4 + p.offset).sin() * 30.0
                + (y * 0.012 + t * 0.9 + p.offset * 1.7).sin() * 12.6
                + sway * p.offset.cos();
            let z = p.z + (y * 0.008 + t * 0.6).sin() * 22.0 + sway * p.offset.sin();
            let (rx, rz) = (x * cos_s - z * sin_s, x * sin_s + z * cos_s);

            if let Some((sx, sy, depth)) = camera.project([rx, y, rz]) {
                if depth < 2200.0 && sy.abs() <= 1.0 {
                    scene.points[p.bucket].push((sx, sy));
                }
            }
        }

        scene
    }
}

impl ProgressSink for Backdrop {
    fn update_by_progress(&mut self, meters: f64) {
        self.driver.set_target_progress(meters * PROGRESS_PER_METER);
    }
}

impl Drop for Backdrop {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Drawable primitives of one frame in normalised screen space.
#[derive(Debug, Default)]
pub struct SceneGeometry {
    /// `(x1, y1, x2, y2, colour)`.
    pub lines: Vec<(f64, f64, f64, f64, Color)>,
    /// Particle positions, bucketed by hue.
    pub points: [Vec<(f64, f64)>; PARTICLE_HUE_BUCKETS],
}

// ───────────────────────────────────────── widget ────────────

/// Renders the backdrop into the given area.
pub struct BackdropWidget<'a> {
    pub backdrop: &'a Backdrop,
}

impl<'a> Widget for BackdropWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let aspect = self.backdrop.aspect(area);
        let scene = self.backdrop.geometry();
        let bucket_colors: Vec<Color> = (0..PARTICLE_HUE_BUCKETS)
            .map(|b| hsl_color((b as f64 + 0.5) / PARTICLE_HUE_BUCKETS as f64, 0.7, 0.55))
            .collect();

        Canvas::default()
            .background_color(Color::Black)
            .marker(Marker::Braille)
            .x_bounds([-aspect, aspect])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                for (b, coords) in scene.points.iter().enumerate() {
                    if !coords.is_empty() {
                        ctx.draw(&Points {
                            coords,
                            color: bucket_colors[b],
                        });
                    }
                }
                ctx.layer();
                for &(x1, y1, x2, y2, color) in &scene.lines {
                    ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
                }
            })
            .render(area, buf);
    }
}
