mod backend_bridge;
mod controller;
mod startup;
mod ui;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::config::load_settings;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::startup::StartupConfig;
use crate::ui::{theme::system_prefers_dark, DarkModeApp};

const APP_TITLE: &str = "Dark Mode";

fn main() -> Result<()> {
    let startup = StartupConfig::parse();
    let settings = startup.apply_to(load_settings()?)?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();
    tracing::info!(database_url = %settings.database_url, "starting desktop shell");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([420.0, 320.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };
    let system_dark = system_prefers_dark();
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(DarkModeApp::new(cmd_tx, ui_rx, system_dark)))),
    )
    .map_err(|err| anyhow!("desktop shell exited with an error: {err}"))
}
