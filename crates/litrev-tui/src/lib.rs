//! litrev-tui: terminal widgets for following literature reviews
//!
//! Built on ratatui and crossterm. Widgets borrow their data and a [`Theme`]
//! and render into a buffer; the binary owns layout and the event loop.

pub mod app;
pub mod format;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use theme::{Theme, ThemeMode};
