//! Presentation state for the dark mode screen.
//!
//! `UiStateController` turns the preference stream into `UiState` and keeps a
//! single upstream subscription alive while anyone is observing. When the last
//! `StateSubscription` goes away the upstream keeps running for the idle grace
//! period, so a screen that detaches and re-attaches right away does not
//! re-query storage.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use futures::StreamExt;
use shared::{domain::UiState, error::StorageError};
use storage::PreferenceSource;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

pub const DEFAULT_IDLE_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct UiStateController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    source: Arc<dyn PreferenceSource>,
    runtime: Handle,
    idle_grace: Duration,
    state: watch::Sender<UiState>,
    sharing: Mutex<SharingState>,
}

#[derive(Default)]
struct SharingState {
    subscribers: usize,
    upstream: Option<JoinHandle<()>>,
    pending_stop: Option<JoinHandle<()>>,
    stop_generation: u64,
}

impl UiStateController {
    pub fn new(source: Arc<dyn PreferenceSource>, idle_grace: Duration, runtime: Handle) -> Self {
        let (state, _) = watch::channel(UiState::Loading);
        Self {
            inner: Arc::new(ControllerInner {
                source,
                runtime,
                idle_grace,
                state,
                sharing: Mutex::new(SharingState::default()),
            }),
        }
    }

    pub fn current_state(&self) -> UiState {
        *self.inner.state.borrow()
    }

    /// Registers an observer, starting upstream observation if it is not running.
    pub fn subscribe(&self) -> StateSubscription {
        let mut sharing = self.inner.lock_sharing();
        sharing.subscribers += 1;

        if let Some(pending) = sharing.pending_stop.take() {
            pending.abort();
            sharing.stop_generation += 1;
            debug!("observer returned within idle grace; keeping upstream");
        }

        let running = sharing
            .upstream
            .as_ref()
            .is_some_and(|task| !task.is_finished());
        if !running {
            sharing.upstream = Some(spawn_upstream(&self.inner));
            info!(subscribers = sharing.subscribers, "started preference observation");
        }

        StateSubscription {
            receiver: self.inner.state.subscribe(),
            controller: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock_sharing().subscribers
    }

    pub fn is_observing(&self) -> bool {
        self.inner
            .lock_sharing()
            .upstream
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Flips the stored flag. The new state arrives through the subscription,
    /// not through this call.
    pub async fn toggle_dark_mode(&self) -> Result<(), StorageError> {
        match self.inner.source.toggle().await {
            Ok(value) => {
                debug!(value, "dark mode toggle committed");
                Ok(())
            }
            Err(err) => {
                warn!("dark mode toggle failed: {err}");
                Err(err)
            }
        }
    }

    /// Runs the toggle on the controller's runtime so it finishes even if the
    /// caller goes away.
    pub fn spawn_toggle(&self) -> JoinHandle<Result<(), StorageError>> {
        let controller = self.clone();
        self.inner
            .runtime
            .spawn(async move { controller.toggle_dark_mode().await })
    }
}

impl ControllerInner {
    fn lock_sharing(&self) -> MutexGuard<'_, SharingState> {
        self.sharing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, is_dark_mode: bool) {
        let previous = self.state.send_replace(UiState::success(is_dark_mode));
        if previous == UiState::Loading {
            info!(is_dark_mode, "dark mode preference loaded");
        } else {
            debug!(is_dark_mode, "dark mode preference changed");
        }
    }

    fn release(self: &Arc<Self>) {
        let mut sharing = self.lock_sharing();
        sharing.subscribers = sharing.subscribers.saturating_sub(1);
        if sharing.subscribers > 0 {
            return;
        }

        if self.idle_grace.is_zero() {
            if let Some(task) = sharing.upstream.take() {
                task.abort();
                info!("stopped preference observation");
            }
            return;
        }

        sharing.stop_generation += 1;
        let generation = sharing.stop_generation;
        let grace = self.idle_grace;
        let controller = Arc::downgrade(self);
        sharing.pending_stop = Some(self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(controller) = controller.upgrade() {
                controller.stop_if_idle(generation);
            }
        }));
    }

    fn stop_if_idle(&self, generation: u64) {
        let mut sharing = self.lock_sharing();
        if sharing.subscribers > 0 || sharing.stop_generation != generation {
            return;
        }
        sharing.pending_stop = None;
        if let Some(task) = sharing.upstream.take() {
            task.abort();
            info!(
                grace_ms = self.idle_grace.as_millis() as u64,
                "stopped idle preference observation"
            );
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        let sharing = self
            .sharing
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = sharing.upstream.take() {
            task.abort();
        }
        if let Some(task) = sharing.pending_stop.take() {
            task.abort();
        }
    }
}

fn spawn_upstream(inner: &Arc<ControllerInner>) -> JoinHandle<()> {
    let mut values = inner.source.read();
    let controller = Arc::downgrade(inner);
    inner.runtime.spawn(async move {
        while let Some(is_dark_mode) = values.next().await {
            let Some(controller) = controller.upgrade() else {
                break;
            };
            controller.publish(is_dark_mode);
        }
    })
}

/// An observer of `UiState`. Dropping it releases the observer's reference.
pub struct StateSubscription {
    receiver: watch::Receiver<UiState>,
    controller: Weak<ControllerInner>,
}

impl StateSubscription {
    pub fn current(&self) -> UiState {
        *self.receiver.borrow()
    }

    /// Waits for the next state. `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<UiState> {
        self.receiver.changed().await.ok()?;
        let state = *self.receiver.borrow_and_update();
        Some(state)
    }

    /// Waits until the first stored value has been observed.
    pub async fn wait_until_loaded(&mut self) -> Option<bool> {
        let state = *self.receiver.wait_for(UiState::is_loaded).await.ok()?;
        state.dark_mode()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for StateSubscription {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.upgrade() {
            controller.release();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
