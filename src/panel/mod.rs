//! Terminal chat panel
//!
//! A ratatui front end that drives the timeline controller against an
//! in-memory history. Kept in the library so its layout bridge can be
//! tested without a terminal.

pub mod app;
pub mod ui;

pub use app::{timeline_lines, PanelApp, PanelContact, PanelLine};
pub use ui::render;
