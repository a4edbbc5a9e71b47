//! UI layer for the desktop shell: splash, toggle screen and theme.

pub mod app;
pub mod theme;

pub use app::DarkModeApp;
