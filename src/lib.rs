//! Plex activity from the Tautulli API, printed for xbar / SwiftBar.

pub mod config;
pub mod error;
pub mod render;
pub mod report;
pub mod tautulli;
