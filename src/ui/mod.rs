//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer reads the game state and turns it into cells on the terminal.
//! It never changes the game; the backdrop only consumes progress.

pub mod backdrop;
pub mod banner;
pub mod layout;
pub mod popup;
pub mod stats;
pub mod theme;
