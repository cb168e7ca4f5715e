//! Centered phase banners: intro, paused, and finish.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::core::timer::GamePhase;

use super::layout::centered_fixed;
use super::theme::Theme;

/// Which banner, if any, the current game shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerKind {
    /// Before the first scroll.
    Intro,
    Paused,
    Finished { time: String, new_best: bool },
}

impl BannerKind {
    /// Pick the banner for a phase.  The intro only shows while nothing has
    /// been scrolled yet.
    pub fn for_phase(phase: GamePhase, meters: f64, time: String, is_best: bool) -> Option<Self> {
        match phase {
            GamePhase::NotStarted if meters <= 0.0 => Some(BannerKind::Intro),
            GamePhase::NotStarted | GamePhase::Playing => None,
            GamePhase::Paused => Some(BannerKind::Paused),
            GamePhase::Finished => Some(BannerKind::Finished {
                time,
                new_best: is_best,
            }),
        }
    }
}

/// Banner overlay widget.
pub struct Banner<'a> {
    pub kind: &'a BannerKind,
    pub target: &'a str,
    pub reset_key: &'a str,
}

impl<'a> Banner<'a> {
    fn lines(&self) -> (Line<'static>, Vec<Line<'static>>) {
        let hint = |s: String| Line::from(Span::styled(s, Theme::hint_style()));
        match self.kind {
            BannerKind::Intro => (
                Line::from(Span::styled("SCROLL TIME ATTACK", Theme::banner_title_style())),
                vec![
                    Line::raw(format!("Scroll {} down as fast as you can!", self.target)),
                    Line::raw(""),
                    hint("↓ start scrolling: wheel, drag, or keys".into()),
                ],
            ),
            BannerKind::Paused => (
                Line::from(Span::styled("PAUSED", Theme::banner_title_style())),
                vec![
                    Line::raw("Scroll to resume"),
                    Line::raw(""),
                    hint(format!("{}: reset", self.reset_key)),
                ],
            ),
            BannerKind::Finished { time, new_best } => {
                let mut body = vec![Line::raw(format!("You just spent {time} on this."))];
                if *new_best {
                    body.push(Line::from(Span::styled("New best time!", Theme::best_style())));
                }
                body.push(hint("(thanks for playing)".into()));
                body.push(Line::raw(""));
                body.push(hint(format!("{}: try again", self.reset_key)));
                (
                    Line::from(Span::styled("GOAL!", Theme::finish_title_style())),
                    body,
                )
            }
        }
    }
}

impl<'a> Widget for Banner<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, body) = self.lines();
        let width = body
            .iter()
            .map(|l| l.width() as u16)
            .max()
            .unwrap_or(0)
            .max(title.width() as u16)
            + 6;
        let height = body.len() as u16 + 4;
        let popup = centered_fixed(width, height, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border_style());
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![title, Line::raw("")];
        lines.extend(body);
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
