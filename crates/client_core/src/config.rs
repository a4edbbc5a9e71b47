use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::{PreferenceKey, SETTINGS_NAMESPACE};

use crate::DEFAULT_IDLE_GRACE;

pub const SETTINGS_FILE: &str = "darkmode.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub namespace: String,
    pub idle_grace: Duration,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/settings.db".into(),
            namespace: SETTINGS_NAMESPACE.into(),
            idle_grace: DEFAULT_IDLE_GRACE,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn preference_key(&self) -> PreferenceKey {
        PreferenceKey::in_namespace(self.namespace.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    namespace: Option<String>,
    idle_grace_ms: Option<u64>,
    log_filter: Option<String>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the TOML file if present, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.namespace {
            settings.namespace = v;
        }
        if let Some(v) = file_cfg.idle_grace_ms {
            settings.idle_grace = Duration::from_millis(v);
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__NAMESPACE") {
        settings.namespace = v;
    }

    if let Some(v) = env("APP__IDLE_GRACE_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.idle_grace = Duration::from_millis(parsed);
        }
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings.database_url = normalize_database_url(&settings.database_url);
    Ok(settings)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

/// URL for a database file inside a local data directory.
pub fn sqlite_url_for_data_dir(data_dir: &Path) -> String {
    normalize_database_url(&data_dir.join("settings.sqlite3").to_string_lossy())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
