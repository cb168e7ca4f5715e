//! Human-readable formatting of run times and distances.

/// How elapsed times are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// `S.mmms`, e.g. `83.045s`.
    #[default]
    Seconds,
    /// `M:SS.mm`, e.g. `1:23.04`.
    Clock,
}

impl TimeFormat {
    pub const ALL: &[TimeFormat] = &[TimeFormat::Seconds, TimeFormat::Clock];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFormat::Seconds => "seconds",
            TimeFormat::Clock => "clock",
        }
    }

    pub fn format(self, millis: u64) -> String {
        match self {
            TimeFormat::Seconds => format!("{}.{:03}s", millis / 1000, millis % 1000),
            TimeFormat::Clock => {
                let minutes = millis / 60_000;
                let seconds = (millis / 1000) % 60;
                let hundredths = (millis % 1000) / 10;
                format!("{minutes}:{seconds:02}.{hundredths:02}")
            }
        }
    }
}

/// Distance with two decimals and a unit, e.g. `12.34m`.
pub fn format_meters(meters: f64) -> String {
    format!("{:.2}m", meters.max(0.0))
}
