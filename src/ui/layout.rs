//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen layout: the backdrop fills everything, the stats panel and the
/// status bar are drawn over its top and bottom edges.
pub struct AppLayout {
    pub backdrop_area: Rect,
    pub stats_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // stats panel
                Constraint::Min(0),    // open backdrop
                Constraint::Length(1), // status / hint bar
            ])
            .split(area);

        Self {
            backdrop_area: area,
            stats_area: chunks[0],
            status_area: chunks[2],
        }
    }
}

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
