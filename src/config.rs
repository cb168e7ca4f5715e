//! User configuration: game settings, keybindings, and persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/scroll-trial/config.toml` (default
//! `~/.config/scroll-trial/config.toml`).  They are read once at startup;
//! nothing changes them while a game is running.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::core::distance::TrackingPolicy;
use crate::core::format::TimeFormat;

// ───────────────────────────────────────── errors ────────────

/// A setting value that could not be understood.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown tracking policy '{0}' (expected accumulate or absolute)")]
    UnknownPolicy(String),
    #[error("unknown time format '{0}' (expected seconds or clock)")]
    UnknownTimeFormat(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be greater than zero, got {value}")]
    NotPositive { key: &'static str, value: f64 },
}

impl FromStr for TrackingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackingPolicy::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPolicy(s.to_string()))
    }
}

impl FromStr for TimeFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownTimeFormat(s.to_string()))
    }
}

/// Parse a strictly positive, finite number.
pub fn parse_positive(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    let parsed: f64 = value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(ConfigError::NotPositive { key, value: parsed });
    }
    Ok(parsed)
}

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    Pause,
    Reset,
    ToggleHelp,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the help overlay).
    pub const ALL: &[Action] = &[
        Action::ScrollDown,
        Action::ScrollUp,
        Action::PageDown,
        Action::PageUp,
        Action::Pause,
        Action::Reset,
        Action::ToggleHelp,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::ScrollDown => "Scroll Down",
            Action::ScrollUp => "Scroll Up",
            Action::PageDown => "Page Down",
            Action::PageUp => "Page Up",
            Action::Pause => "Pause",
            Action::Reset => "Reset / Retry",
            Action::ToggleHelp => "Help",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollDown => "scroll_down",
            Action::ScrollUp => "scroll_up",
            Action::PageDown => "page_down",
            Action::PageUp => "page_up",
            Action::Pause => "pause",
            Action::Reset => "reset",
            Action::ToggleHelp => "help",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// User-friendly display string (e.g. `"Alt+↓"`, `"Ctrl+r"`, `"p"`).
    pub fn display(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&match self.code {
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Backspace => "Bksp".into(),
            KeyCode::Delete => "Del".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            other => key_name(other),
        });
        s
    }

    /// Serialise to config-file format (e.g. `"Alt+Down"`, `"Ctrl+r"`).
    fn to_config_string(&self) -> String {
        let mut s = modifier_prefix(self.modifiers);
        s.push_str(&key_name(self.code));
        s
    }

    /// Parse a key string like `"Ctrl+r"`, `"Alt+Down"`, `"p"`, `"Space"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => {
                let n: u8 = k[1..].parse().ok()?;
                KeyCode::F(n)
            }
            // Keep the original case so `Shift+G`-style bindings survive.
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

fn modifier_prefix(modifiers: KeyModifiers) -> String {
    let mut s = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        s.push_str("Ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        s.push_str("Alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        s.push_str("Shift+");
    }
    s
}

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".into(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

// ───────────────────────────────────────── game settings ─────

/// Game settings fixed for the lifetime of a game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Course length in meters.
    pub target_distance_m: f64,
    /// Distance policy, see [`TrackingPolicy`].
    pub tracking: TrackingPolicy,
    /// Device pixel ratio used for the pixel → meter conversion.
    pub device_pixel_ratio: f64,
    /// Pixels per mouse-wheel notch.
    pub wheel_pixels: f64,
    /// Pixels per line-scroll key press.
    pub line_pixels: f64,
    /// Pixels per page-scroll key press.  Defaults to one wheel notch.
    pub page_pixels: f64,
    /// Pixels per terminal row of touch-style mouse drag.
    pub row_pixels: f64,
    /// How times are displayed.
    pub time_format: TimeFormat,
    /// Backdrop frame rate.
    pub fps: u32,
    /// Slow drift so the backdrop is not perfectly still at rest.
    pub idle_drift: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            target_distance_m: 300.0,
            tracking: TrackingPolicy::Accumulate,
            device_pixel_ratio: 1.0,
            wheel_pixels: 100.0,
            line_pixels: 40.0,
            page_pixels: 100.0,
            row_pixels: 24.0,
            time_format: TimeFormat::Seconds,
            fps: 60,
            idle_drift: false,
        }
    }
}

impl GameSettings {
    /// Apply one `key = value` line.  Returns `Ok(false)` when the key is not
    /// a game setting.
    fn apply(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        match key {
            "target_distance_m" => {
                self.target_distance_m = parse_positive("target_distance_m", value)?
            }
            "tracking" => self.tracking = value.parse()?,
            "device_pixel_ratio" => {
                self.device_pixel_ratio = parse_positive("device_pixel_ratio", value)?
            }
            "wheel_pixels" => self.wheel_pixels = parse_positive("wheel_pixels", value)?,
            "line_pixels" => self.line_pixels = parse_positive("line_pixels", value)?,
            "page_pixels" => self.page_pixels = parse_positive("page_pixels", value)?,
            "row_pixels" => self.row_pixels = parse_positive("row_pixels", value)?,
            "time_format" => self.time_format = value.parse()?,
            "fps" => {
                // Keep this bounded for predictable CPU use.
                self.fps = parse_positive("fps", value)?.round().clamp(10.0, 240.0) as u32;
            }
            "idle_drift" => self.idle_drift = value == "true",
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration — game settings and keybindings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub game: GameSettings,
    pub bindings: HashMap<Action, Vec<KeyBind>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameSettings::default(),
            bindings: Self::default_bindings(),
        }
    }
}

impl AppConfig {
    /// Built-in key bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(Action::ScrollDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(Action::ScrollUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(
            Action::PageDown,
            vec![KeyBind::new(PageDown, n), KeyBind::new(Char(' '), n)],
        );
        m.insert(Action::PageUp, vec![KeyBind::new(PageUp, n)]);
        m.insert(Action::Pause, vec![KeyBind::new(Char('p'), n)]);
        m.insert(Action::Reset, vec![KeyBind::new(Char('r'), n)]);
        m.insert(Action::ToggleHelp, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Action::Quit, vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Format the binding list for a given action (e.g. `"↓/j"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    pub fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "wheel/drag/{}: run | {}: pause | {}: reset | {}: help | {}: quit",
            self.short_binding(Action::ScrollDown),
            self.short_binding(Action::Pause),
            self.short_binding(Action::Reset),
            self.short_binding(Action::ToggleHelp),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Self::parse(&contents)
            }
            Err(_) => Self::default(),
        }
    }

    /// Persist current config to disk.  Returns the path written.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&path, self.serialise())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Parse config text leniently: unknown keys and bad values are skipped
    /// with a warning and the default is kept.
    pub fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match config.game.apply(key, value) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(%err, "ignoring config line");
                    continue;
                }
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::warn!(key, "unknown config key");
                continue;
            };

            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    pub fn serialise(&self) -> String {
        let g = &self.game;
        let mut lines = vec![
            "# scroll-trial configuration".to_string(),
            String::new(),
            "# Game settings".to_string(),
            format!("target_distance_m = {}", g.target_distance_m),
            "# accumulate (backward scrolling ignored) or absolute (page position)".to_string(),
            format!("tracking = {}", g.tracking.as_str()),
            format!("device_pixel_ratio = {}", g.device_pixel_ratio),
            format!("wheel_pixels = {}", g.wheel_pixels),
            format!("line_pixels = {}", g.line_pixels),
            format!("page_pixels = {}", g.page_pixels),
            format!("row_pixels = {}", g.row_pixels),
            "# seconds (12.345s) or clock (0:12.34)".to_string(),
            format!("time_format = {}", g.time_format.as_str()),
            format!("fps = {}", g.fps),
            format!("idle_drift = {}", g.idle_drift),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/scroll-trial/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("scroll-trial").join("config.toml")
}
