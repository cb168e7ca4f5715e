//! A scroll-distance time trial for the terminal.
//!
//! Scroll a fixed number of meters (mouse wheel, drag, or keys) as fast as
//! you can.  The clock starts on the first forward scroll, pauses on demand,
//! and stops at the finish line.

mod app;
mod config;
mod core;
mod ui;

use std::fs::File;
use std::io::{self, stderr, Stderr};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Frame, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
    ticker::TokioTicker,
};
use crate::config::{parse_positive, Action, AppConfig, ConfigError, GameSettings};
use crate::core::clock::SystemClock;
use crate::core::distance::TrackingPolicy;
use crate::core::format::{format_meters, TimeFormat};
use crate::ui::{
    backdrop::BackdropWidget,
    banner::{Banner, BannerKind},
    layout::AppLayout,
    popup::HelpPopup,
    stats::StatsPanel,
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Scroll-distance time trial")]
struct Cli {
    /// Course length in meters.
    #[arg(long, value_name = "METERS", value_parser = parse_target)]
    target: Option<f64>,

    /// Distance policy: `accumulate` (forward scrolling only adds) or
    /// `absolute` (distance follows the scroll position).
    #[arg(long)]
    policy: Option<TrackingPolicy>,

    /// Device pixel ratio for the pixel → meter conversion.
    #[arg(long, value_name = "RATIO", value_parser = parse_dpr)]
    dpr: Option<f64>,

    /// How times are shown: `seconds` or `clock`.
    #[arg(long = "time-format")]
    time_format: Option<TimeFormat>,

    /// Backdrop frame rate (10–240).
    #[arg(long)]
    fps: Option<u32>,

    /// Let the backdrop drift slowly while nobody scrolls.
    #[arg(long = "idle-drift", overrides_with = "no_idle_drift")]
    idle_drift: bool,

    /// Keep the backdrop still at rest, even if the config enables drift.
    #[arg(long = "no-idle-drift", overrides_with = "idle_drift")]
    no_idle_drift: bool,

    /// Write logs to this file (filter with `RUST_LOG`).
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write the effective config file and exit.
    #[arg(long = "write-config")]
    write_config: bool,
}

fn parse_target(value: &str) -> Result<f64, ConfigError> {
    parse_positive("target_distance_m", value)
}

fn parse_dpr(value: &str) -> Result<f64, ConfigError> {
    parse_positive("device_pixel_ratio", value)
}

impl Cli {
    /// Command-line values win over the config file.
    fn apply(&self, game: &mut GameSettings) {
        if let Some(target) = self.target {
            game.target_distance_m = target;
        }
        if let Some(policy) = self.policy {
            game.tracking = policy;
        }
        if let Some(dpr) = self.dpr {
            game.device_pixel_ratio = dpr;
        }
        if let Some(format) = self.time_format {
            game.time_format = format;
        }
        if let Some(fps) = self.fps {
            game.fps = fps.clamp(10, 240);
        }
        if self.idle_drift {
            game.idle_drift = true;
        }
        if self.no_idle_drift {
            game.idle_drift = false;
        }
    }
}

// ───────────────────────────────────────── logging ───────────

/// Where log output goes.  The TUI draws on stderr, so stderr is only used
/// when no terminal session follows.
#[derive(Debug, PartialEq, Eq)]
enum LogSink<'a> {
    File(&'a Path),
    Stderr,
    Off,
}

impl<'a> LogSink<'a> {
    fn choose(log_file: Option<&'a Path>, interactive: bool) -> Self {
        match log_file {
            Some(path) => LogSink::File(path),
            None if interactive => LogSink::Off,
            None => LogSink::Stderr,
        }
    }
}

fn init_tracing(sink: LogSink<'_>) -> Result<()> {
    match sink {
        LogSink::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scroll_trial=debug"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        LogSink::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(io::stderr) // never pollute stdout
                .init();
        }
        LogSink::Off => {}
    }
    Ok(())
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &AppState) {
    let layout = AppLayout::from_area(frame.area());
    let game = &state.config.game;
    let time_format = game.time_format;

    frame.render_widget(
        BackdropWidget {
            backdrop: &state.backdrop,
        },
        layout.backdrop_area,
    );

    let panel = StatsPanel {
        meters: state.tracker.meters(),
        target_meters: state.tracker.target_meters(),
        completion: state.tracker.completion(),
        elapsed_millis: state.timer.elapsed_millis(),
        best: state.timer.best_record(),
        phase: state.phase(),
        time_format,
    };
    frame.render_widget(panel, layout.stats_area);

    let (time, new_best) = match state.last_finish {
        Some(finish) => (time_format.format(finish.elapsed_millis), finish.new_best),
        None => (time_format.format(state.timer.elapsed_millis()), false),
    };
    if let Some(kind) = BannerKind::for_phase(state.phase(), state.tracker.meters(), time, new_best)
    {
        let target = format_meters(game.target_distance_m);
        let reset_key = state.config.short_binding(Action::Reset);
        frame.render_widget(
            Banner {
                kind: &kind,
                target: &target,
                reset_key: &reset_key,
            },
            layout.backdrop_area,
        );
    }

    let hint = state.config.status_bar_hint();
    let status_text = state.status_message.as_deref().unwrap_or(&hint);
    let status = Paragraph::new(status_text).style(Theme::status_bar_style());
    frame.render_widget(status, layout.status_area);

    if state.show_help {
        frame.render_widget(
            HelpPopup {
                config: &state.config,
            },
            frame.area(),
        );
    }
}

// ───────────────────────────────────────── event loop ────────

/// Apply one queued event.  Frames are only counted; the caller advances the
/// backdrop once per drained batch.
fn dispatch(state: &mut AppState, event: AppEvent, frame_due: &mut bool) {
    match event {
        AppEvent::Key(k) => handler::handle_key(state, k),
        AppEvent::Mouse(m) => handler::handle_mouse(state, m),
        AppEvent::Resize(w, h) => state.on_resize(w, h),
        AppEvent::TimerTick => state.on_timer_tick(),
        AppEvent::Frame => *frame_due = true,
    }
}

async fn run(terminal: &mut Terminal<CrosstermBackend<Stderr>>, config: AppConfig) -> Result<()> {
    let (tx, mut events) = mpsc::unbounded_channel();
    spawn_event_reader(tx.clone(), Duration::from_millis(100));

    let ticker = TokioTicker::new(tx);
    let mut state = AppState::new(
        config,
        Box::new(SystemClock::new()),
        Box::new(ticker.fork()),
        Box::new(ticker.fork()),
    );
    let size = terminal.size().context("reading terminal size")?;
    state.on_resize(size.width, size.height);

    loop {
        terminal.draw(|frame| draw(frame, &state))?;

        tokio::select! {
            biased;

            maybe_event = events.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                // Drain everything already queued so a burst of wheel events
                // or backed-up frames costs a single redraw.
                let mut frame_due = false;
                dispatch(&mut state, event, &mut frame_due);
                while let Ok(event) = events.try_recv() {
                    dispatch(&mut state, event, &mut frame_due);
                }
                if frame_due {
                    state.on_frame();
                }
            }

            _ = tokio::signal::ctrl_c() => {
                state.should_quit = true;
            }
        }

        if state.should_quit {
            break;
        }
    }

    state.teardown();
    if let Some(best) = state.timer.best_record() {
        tracing::info!(
            best_ms = best.millis,
            set_at = %best.set_at.format("%H:%M:%S"),
            "session best"
        );
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(LogSink::choose(cli.log_file.as_deref(), !cli.write_config))?;

    let mut config = AppConfig::load();
    cli.apply(&mut config.game);

    if cli.write_config {
        let path = config.save()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode().context("enabling raw mode")?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config).await;

    // ── teardown ──────────────────────────────────────────────
    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
