//! Core game logic – clock, timer state machine, distance tracking, and the
//! scroll-to-animation parameter mapping.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Scheduling
//! and time are reached through the [`clock::Clock`] and
//! [`schedule::TickScheduler`] traits so every type here can be driven by
//! hand in tests.

pub mod animation;
pub mod clock;
pub mod distance;
pub mod format;
pub mod schedule;
pub mod timer;
