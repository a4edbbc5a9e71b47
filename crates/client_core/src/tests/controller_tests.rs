use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::error::StorageOperation;
use storage::{PreferenceStore, Storage};
use tokio_stream::wrappers::WatchStream;

const GRACE: Duration = Duration::from_secs(5);

struct MemorySource {
    value: watch::Sender<bool>,
    reads: AtomicUsize,
    fail_with: Option<String>,
}

impl MemorySource {
    fn ok(initial: bool) -> Arc<Self> {
        let (value, _) = watch::channel(initial);
        Arc::new(Self {
            value,
            reads: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    fn failing(initial: bool, err: impl Into<String>) -> Arc<Self> {
        let (value, _) = watch::channel(initial);
        Arc::new(Self {
            value,
            reads: AtomicUsize::new(0),
            fail_with: Some(err.into()),
        })
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn stored(&self) -> bool {
        *self.value.borrow()
    }
}

#[async_trait]
impl PreferenceSource for MemorySource {
    fn read(&self) -> BoxStream<'static, bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        WatchStream::new(self.value.subscribe()).boxed()
    }

    async fn toggle(&self) -> Result<bool, StorageError> {
        if let Some(message) = &self.fail_with {
            return Err(StorageError::write(message.clone()));
        }
        let mut next = false;
        self.value.send_modify(|value| {
            *value = !*value;
            next = *value;
        });
        Ok(next)
    }
}

fn controller_for(source: Arc<MemorySource>, grace: Duration) -> UiStateController {
    UiStateController::new(source, grace, Handle::current())
}

#[tokio::test]
async fn starts_loading_until_first_value_arrives() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), GRACE);
    assert_eq!(controller.current_state(), UiState::Loading);
    assert!(!controller.is_observing());

    let mut subscription = controller.subscribe();
    assert_eq!(subscription.current(), UiState::Loading);

    assert_eq!(subscription.wait_until_loaded().await, Some(false));
    assert_eq!(controller.current_state(), UiState::success(false));
    assert_eq!(source.reads(), 1);
}

#[tokio::test]
async fn toggle_round_trips_through_persisted_store() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let store = PreferenceStore::dark_mode(storage);
    let controller =
        UiStateController::new(Arc::new(store.clone()), GRACE, Handle::current());

    let mut subscription = controller.subscribe();
    assert_eq!(subscription.wait_until_loaded().await, Some(false));

    controller.toggle_dark_mode().await.expect("toggle");
    assert!(store.load().await.expect("stored value"));
    assert_eq!(subscription.changed().await, Some(UiState::success(true)));
    assert_eq!(controller.current_state(), UiState::success(true));
}

#[tokio::test]
async fn failed_toggle_keeps_last_success_and_reports_error() {
    let source = MemorySource::failing(false, "disk full");
    let controller = controller_for(source.clone(), GRACE);

    let mut subscription = controller.subscribe();
    assert_eq!(subscription.wait_until_loaded().await, Some(false));

    let err = controller.toggle_dark_mode().await.expect_err("write fails");
    assert_eq!(err.operation, StorageOperation::Write);
    assert_eq!(err.message, "disk full");
    assert_eq!(controller.current_state(), UiState::success(false));
    assert!(!source.stored());
}

#[tokio::test]
async fn failed_write_on_closed_storage_leaves_state_untouched() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let store = PreferenceStore::dark_mode(storage.clone());
    let controller = UiStateController::new(Arc::new(store), GRACE, Handle::current());

    let mut subscription = controller.subscribe();
    assert_eq!(subscription.wait_until_loaded().await, Some(false));

    storage.close().await;
    assert!(controller.toggle_dark_mode().await.is_err());
    assert_eq!(controller.current_state(), UiState::success(false));
}

#[tokio::test(start_paused = true)]
async fn never_regresses_to_loading() {
    let source = MemorySource::ok(true);
    let controller = controller_for(source.clone(), GRACE);

    let mut subscription = controller.subscribe();
    assert_eq!(subscription.wait_until_loaded().await, Some(true));

    let mut observed = Vec::new();
    for _ in 0..3 {
        controller.toggle_dark_mode().await.expect("toggle");
        observed.push(subscription.changed().await.expect("state"));
    }
    drop(subscription);

    tokio::time::sleep(GRACE * 2).await;
    assert!(!controller.is_observing());
    observed.push(controller.current_state());

    let mut again = controller.subscribe();
    observed.push(again.current());
    assert_eq!(again.wait_until_loaded().await, Some(false));

    assert!(observed.iter().all(UiState::is_loaded), "{observed:?}");
}

#[tokio::test]
async fn observers_share_one_upstream_read() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), GRACE);

    let mut first = controller.subscribe();
    let mut second = controller.subscribe();
    assert_eq!(controller.subscriber_count(), 2);

    assert_eq!(first.wait_until_loaded().await, Some(false));
    assert_eq!(second.wait_until_loaded().await, Some(false));

    controller.toggle_dark_mode().await.expect("toggle");
    assert_eq!(first.changed().await, Some(UiState::success(true)));
    assert_eq!(second.changed().await, Some(UiState::success(true)));
    assert_eq!(source.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn upstream_stops_only_after_idle_grace() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), GRACE);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    subscription.unsubscribe();
    assert_eq!(controller.subscriber_count(), 0);

    tokio::time::sleep(GRACE / 2).await;
    assert!(controller.is_observing());

    tokio::time::sleep(GRACE).await;
    assert!(!controller.is_observing());
    assert_eq!(controller.current_state(), UiState::success(false));
}

#[tokio::test(start_paused = true)]
async fn resubscribing_within_grace_reuses_upstream() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), GRACE);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    drop(subscription);

    tokio::time::sleep(GRACE / 2).await;
    let _again = controller.subscribe();

    tokio::time::sleep(GRACE * 2).await;
    assert!(controller.is_observing());
    assert_eq!(source.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn resubscribing_after_stop_restarts_upstream() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), GRACE);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    drop(subscription);

    tokio::time::sleep(GRACE * 2).await;
    assert!(!controller.is_observing());

    // Written while nobody observes; picked up by the restarted read.
    controller.toggle_dark_mode().await.expect("toggle");
    assert_eq!(controller.current_state(), UiState::success(false));

    let mut again = controller.subscribe();
    assert!(controller.is_observing());
    assert_eq!(source.reads(), 2);
    assert_eq!(again.changed().await, Some(UiState::success(true)));
}

#[tokio::test]
async fn zero_grace_stops_on_last_unsubscribe() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source, Duration::ZERO);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    drop(subscription);

    assert!(!controller.is_observing());
}

#[tokio::test]
async fn spawned_toggle_completes_after_observer_leaves() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source.clone(), Duration::ZERO);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    let pending = controller.spawn_toggle();
    drop(subscription);

    pending.await.expect("join").expect("toggle");
    assert!(source.stored());
}

#[tokio::test]
async fn subscription_ends_when_controller_is_dropped() {
    let source = MemorySource::ok(false);
    let controller = controller_for(source, GRACE);

    let mut subscription = controller.subscribe();
    subscription.wait_until_loaded().await;
    drop(controller);

    assert_eq!(subscription.changed().await, None);
}
