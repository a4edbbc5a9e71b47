use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SETTINGS_NAMESPACE: &str = "settings";
pub const DARK_MODE_KEY: &str = "dark_mode";

/// Location of a persisted boolean preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub namespace: String,
    pub name: String,
}

impl PreferenceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn dark_mode() -> Self {
        Self::new(SETTINGS_NAMESPACE, DARK_MODE_KEY)
    }

    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self::new(namespace, DARK_MODE_KEY)
    }
}

impl Default for PreferenceKey {
    fn default() -> Self {
        Self::dark_mode()
    }
}

impl std::fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub key: PreferenceKey,
    pub value: bool,
    pub updated_at: DateTime<Utc>,
}

/// Presentation state derived from the persisted dark mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UiState {
    #[default]
    Loading,
    Success { is_dark_mode: bool },
}

impl UiState {
    pub fn success(is_dark_mode: bool) -> Self {
        Self::Success { is_dark_mode }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn dark_mode(&self) -> Option<bool> {
        match self {
            Self::Loading => None,
            Self::Success { is_dark_mode } => Some(*is_dark_mode),
        }
    }

    /// Splash screen stays up until the first stored value has been observed.
    pub fn keeps_splash_visible(&self) -> bool {
        !self.is_loaded()
    }

    /// While loading, follow the platform theme so the splash does not flash.
    pub fn resolve_dark_theme(&self, system_prefers_dark: bool) -> bool {
        self.dark_mode().unwrap_or(system_prefers_dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_follows_system_theme() {
        assert!(UiState::Loading.resolve_dark_theme(true));
        assert!(!UiState::Loading.resolve_dark_theme(false));
        assert!(UiState::Loading.keeps_splash_visible());
    }

    #[test]
    fn success_ignores_system_theme() {
        let state = UiState::success(false);
        assert!(!state.resolve_dark_theme(true));
        assert!(!state.keeps_splash_visible());
        assert_eq!(state.dark_mode(), Some(false));
    }

    #[test]
    fn serializes_as_tagged_state() {
        let loading = serde_json::to_value(UiState::Loading).expect("json");
        assert_eq!(loading, serde_json::json!({ "state": "loading" }));

        let success = serde_json::to_value(UiState::success(true)).expect("json");
        assert_eq!(
            success,
            serde_json::json!({ "state": "success", "is_dark_mode": true })
        );
    }

    #[test]
    fn default_key_points_at_settings_namespace() {
        let key = PreferenceKey::default();
        assert_eq!(key.to_string(), "settings/dark_mode");
    }
}
