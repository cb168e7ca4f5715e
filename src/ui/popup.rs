//! Help overlay: key bindings and the fixed game settings.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::config::{Action, AppConfig};
use crate::core::format::format_meters;

use super::layout::centered_fixed;

/// Read-only controls / settings popup.
pub struct HelpPopup<'a> {
    pub config: &'a AppConfig,
}

impl<'a> HelpPopup<'a> {
    fn lines(&self, inner_width: usize) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        let key_style = Style::default().fg(Color::Yellow);
        let game = &self.config.game;
        let mut lines = vec![Line::raw("")];

        // Fixed-width columns: label left-aligned, keys right-aligned.
        for &action in Action::ALL {
            let label_col = format!("   {:<18}", action.label());
            let keys_width = inner_width.saturating_sub(label_col.len() + 2).max(1);
            let keys_col = format!("{:>keys_width$}", self.config.display_bindings(action));
            lines.push(Line::from(vec![
                Span::raw(label_col),
                Span::styled(keys_col, key_style),
            ]));
        }
        lines.push(Line::from(vec![
            Span::raw(format!("   {:<18}", "Mouse")),
            Span::styled("wheel / left-drag", key_style),
        ]));

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!(
                "   course {}  tracking {}  dpr {}",
                format_meters(game.target_distance_m),
                game.tracking.as_str(),
                game.device_pixel_ratio
            ),
            dim,
        )));
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("  Any key: close", dim)));
        lines
    }
}

impl<'a> Widget for HelpPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (Action::ALL.len() as u16) + 8;
        let popup = centered_fixed(52, height, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Controls ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);

        Paragraph::new(self.lines(inner.width as usize)).render(inner, buf);
    }
}
