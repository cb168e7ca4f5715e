//! Stats panel: distance, elapsed time, best time, and course progress.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use crate::core::format::{format_meters, TimeFormat};
use crate::core::timer::{BestRecord, GamePhase};

use super::theme::Theme;

/// Values shown in the panel, copied out of the game each frame.
#[derive(Debug, Clone, Copy)]
pub struct StatsPanel {
    pub meters: f64,
    pub target_meters: f64,
    pub completion: f64,
    pub elapsed_millis: u64,
    pub best: Option<BestRecord>,
    pub phase: GamePhase,
    pub time_format: TimeFormat,
}

impl StatsPanel {
    /// The text portion of the panel.
    pub fn summary(&self) -> Line<'static> {
        let sep = Span::styled("  │  ", Theme::label_style());
        let mut spans = vec![
            Span::styled("distance ", Theme::label_style()),
            Span::styled(format_meters(self.meters), Theme::value_style()),
            Span::styled(
                format!(" / {}", format_meters(self.target_meters)),
                Theme::label_style(),
            ),
            sep.clone(),
            Span::styled("time ", Theme::label_style()),
            Span::styled(self.time_format.format(self.elapsed_millis), Theme::value_style()),
        ];
        if let Some(best) = self.best {
            spans.push(sep.clone());
            spans.push(Span::styled("best ", Theme::label_style()));
            spans.push(Span::styled(self.time_format.format(best.millis), Theme::best_style()));
            spans.push(Span::styled(
                format!(" ({})", best.set_at.format("%H:%M:%S")),
                Theme::label_style(),
            ));
        }
        spans.push(sep);
        spans.push(Span::styled(self.phase.label(), Theme::title_style()));
        Line::from(spans)
    }
}

impl Widget for StatsPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Scroll Time Attack ")
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        let inner = block.inner(area);
        block.render(area, buf);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(22)])
            .split(inner);

        Paragraph::new(self.summary()).render(cols[0], buf);
        Gauge::default()
            .gauge_style(Theme::gauge_style())
            .ratio(self.completion.clamp(0.0, 1.0))
            .label(format!("{:.0}%", self.completion * 100.0))
            .render(cols[1], buf);
    }
}
