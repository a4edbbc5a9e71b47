//! Backend commands queued from UI to backend worker.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCommand {
    ToggleDarkMode,
    /// The window became visible; resume observing the preference.
    ScreenVisible,
    /// The window was minimized; release the observation.
    ScreenHidden,
    Shutdown,
}

impl BackendCommand {
    pub fn name(self) -> &'static str {
        match self {
            Self::ToggleDarkMode => "toggle_dark_mode",
            Self::ScreenVisible => "screen_visible",
            Self::ScreenHidden => "screen_hidden",
            Self::Shutdown => "shutdown",
        }
    }
}
