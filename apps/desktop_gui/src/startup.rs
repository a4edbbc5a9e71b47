//! Command line options and per-user data paths for the desktop shell.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::config::{normalize_database_url, sqlite_url_for_data_dir, Settings};

#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Toggle and persist the dark mode preference")]
pub struct StartupConfig {
    /// Directory holding the preference database.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Database URL; takes precedence over --data-dir.
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_root: PathBuf,
}

impl AppPaths {
    pub fn from_startup(startup: &StartupConfig) -> Result<Self> {
        let data_root = if let Some(p) = &startup.data_dir {
            p.clone()
        } else {
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
            base.join("darkmode")
        };
        Ok(Self { data_root })
    }

    pub fn database_url(&self) -> String {
        sqlite_url_for_data_dir(&self.data_root)
    }
}

impl StartupConfig {
    /// Command line flags win; otherwise an unconfigured database url falls
    /// back to the per-user data directory.
    pub fn apply_to(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(url) = &self.database_url {
            settings.database_url = normalize_database_url(url);
        } else if self.data_dir.is_some()
            || settings.database_url == Settings::default().database_url
        {
            settings.database_url = AppPaths::from_startup(self)?.database_url();
        }
        Ok(settings)
    }
}
