//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{config::Settings, open_controller, UiStateController};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::domain::UiState;
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                report_unavailable(&ui_tx, format!("failed to build runtime: {err}"));
                return;
            }
        };

        runtime.block_on(async move {
            let (storage, controller) = match open_controller(&settings).await {
                Ok(opened) => opened,
                Err(err) => {
                    tracing::error!(
                        database_url = %settings.database_url,
                        "failed to open preference storage: {err:#}"
                    );
                    report_unavailable(&ui_tx, format!("{err:#}"));
                    drain_without_storage(&cmd_rx, &ui_tx);
                    return;
                }
            };
            tracing::info!("backend worker ready");

            let mut observation = Some(observe(&controller, &ui_tx));
            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend command");
                match cmd {
                    BackendCommand::ToggleDarkMode => {
                        let pending = controller.spawn_toggle();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let failure = match pending.await {
                                Ok(Ok(())) => return,
                                Ok(Err(err)) => {
                                    UiError::from_storage(UiErrorContext::ToggleDarkMode, &err)
                                }
                                Err(err) => UiError::new(
                                    UiErrorContext::ToggleDarkMode,
                                    format!("toggle task did not finish: {err}"),
                                ),
                            };
                            send_error(&ui_tx, failure);
                        });
                    }
                    BackendCommand::ScreenVisible => {
                        if observation.is_none() {
                            observation = Some(observe(&controller, &ui_tx));
                        }
                    }
                    BackendCommand::ScreenHidden => {
                        if let Some(task) = observation.take() {
                            task.abort();
                        }
                    }
                    BackendCommand::Shutdown => break,
                }
            }

            if let Some(task) = observation.take() {
                task.abort();
            }
            storage.close().await;
            tracing::info!("backend worker stopped");
        });
    });
}

/// Forwards every state of one subscription to the UI. Aborting the task
/// drops the subscription, which releases it on the controller.
fn observe(controller: &UiStateController, ui_tx: &Sender<UiEvent>) -> JoinHandle<()> {
    let mut subscription = controller.subscribe();
    let ui_tx = ui_tx.clone();
    tokio::spawn(async move {
        let mut state = subscription.current();
        loop {
            match ui_tx.try_send(UiEvent::StateChanged(state)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("ui event queue is full; dropping state update");
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
            match subscription.changed().await {
                Some(next) => state = next,
                None => break,
            }
        }
    })
}

fn report_unavailable(ui_tx: &Sender<UiEvent>, message: String) {
    send_error(ui_tx, UiError::new(UiErrorContext::BackendStartup, message));
    // Leave the splash with the default instead of waiting forever.
    let _ = ui_tx.try_send(UiEvent::StateChanged(UiState::success(false)));
}

fn drain_without_storage(cmd_rx: &Receiver<BackendCommand>, ui_tx: &Sender<UiEvent>) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::ToggleDarkMode => {
                send_error(
                    ui_tx,
                    UiError::new(
                        UiErrorContext::ToggleDarkMode,
                        "preference storage is unavailable",
                    ),
                );
            }
            BackendCommand::ScreenVisible | BackendCommand::ScreenHidden => {}
            BackendCommand::Shutdown => break,
        }
    }
}

fn send_error(ui_tx: &Sender<UiEvent>, error: UiError) {
    match ui_tx.try_send(UiEvent::Error(error)) {
        Ok(()) => {}
        Err(TrySendError::Full(UiEvent::Error(error))) => tracing::warn!(
            context = ?error.context(),
            "ui event queue is full; dropping error: {}",
            error.message()
        ),
        Err(_) => tracing::debug!("ui event queue closed; dropping error"),
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
