use futures::StreamExt;
use shared::domain::PreferenceKey;
use storage::{PreferenceSource, PreferenceStore, Storage};

fn database_url(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("settings.db");
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

#[tokio::test]
async fn preference_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    {
        let storage = Storage::new(&url).await.expect("first open");
        let store = PreferenceStore::dark_mode(storage.clone());
        assert!(store.toggle().await.expect("toggle"));
        storage.close().await;
    }

    let storage = Storage::new(&url).await.expect("second open");
    let store = PreferenceStore::dark_mode(storage);
    let mut values = store.read();
    assert_eq!(values.next().await, Some(true));
}

#[tokio::test]
async fn trait_object_exposes_same_behavior() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::new(&database_url(&dir)).await.expect("open");
    let source: std::sync::Arc<dyn PreferenceSource> =
        std::sync::Arc::new(PreferenceStore::new(storage, PreferenceKey::dark_mode()));

    let mut values = source.read();
    assert_eq!(values.next().await, Some(false));

    assert!(source.toggle().await.expect("toggle"));
    assert_eq!(values.next().await, Some(true));
}
