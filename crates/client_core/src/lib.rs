//! Client-side state for the dark mode preference: the UI state controller
//! and the configuration shared by the desktop shell and the CLI.

use std::sync::Arc;

use anyhow::Result;
use storage::{PreferenceStore, Storage};
use tokio::runtime::Handle;

pub mod config;
mod controller;

pub use controller::{StateSubscription, UiStateController, DEFAULT_IDLE_GRACE};

/// Opens the configured database and wires a controller to its preference.
pub async fn open_controller(settings: &config::Settings) -> Result<(Storage, UiStateController)> {
    let storage = Storage::new(&settings.database_url).await?;
    let store = PreferenceStore::new(storage.clone(), settings.preference_key());
    let controller =
        UiStateController::new(Arc::new(store), settings.idle_grace, Handle::current());
    Ok((storage, controller))
}
