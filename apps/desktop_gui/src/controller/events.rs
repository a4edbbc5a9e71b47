//! UI/backend events and error modeling for the desktop shell.

use shared::{domain::UiState, error::StorageError};

#[derive(Debug, Clone)]
pub enum UiEvent {
    StateChanged(UiState),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ToggleDarkMode,
}

#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn from_storage(context: UiErrorContext, err: &StorageError) -> Self {
        Self::new(context, err.to_string())
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the dismissible notice.
    pub fn user_message(&self) -> String {
        match self.context {
            UiErrorContext::BackendStartup => format!(
                "Preferences are unavailable; using light mode. ({})",
                self.message
            ),
            UiErrorContext::ToggleDarkMode => {
                format!("Could not save the dark mode setting: {}", self.message)
            }
        }
    }
}
