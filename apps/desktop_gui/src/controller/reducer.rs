//! Screen model updates driven by backend events.

use shared::domain::UiState;

use crate::controller::events::UiEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenModel {
    pub ui_state: UiState,
    pub notice: Option<String>,
}

impl ScreenModel {
    pub fn keeps_splash_visible(&self) -> bool {
        self.ui_state.keeps_splash_visible()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

pub fn reduce(model: &mut ScreenModel, event: UiEvent) {
    match event {
        // Once loaded, the screen never returns to the splash.
        UiEvent::StateChanged(UiState::Loading) if model.ui_state.is_loaded() => {}
        UiEvent::StateChanged(state) => model.ui_state = state,
        UiEvent::Error(err) => {
            tracing::warn!(context = ?err.context(), "backend error: {}", err.message());
            model.notice = Some(err.user_message());
        }
    }
}
