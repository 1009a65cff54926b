use crate::reconcile::ResourceState;
use crate::state::{FakeStateStore, SqliteStateStore, StateStore, StoredResource};
use chrono::{Duration, Utc};

// Type alias to simplify the type of the store factory functions
type StoreFactory = Box<dyn Fn() -> Box<dyn StateStore>>;

/// Every store implementation under test
fn get_test_stores() -> Vec<StoreFactory> {
    vec![
        Box::new(|| Box::new(FakeStateStore::new()) as Box<dyn StateStore>),
        Box::new(|| {
            // ":memory:" creates a database that exists only in RAM
            let store = SqliteStateStore::new(":memory:")
                .expect("Failed to create in-memory SQLite store");
            Box::new(store) as Box<dyn StateStore>
        }),
    ]
}

#[tokio::test]
async fn save_then_load_returns_record() {
    for factory in get_test_stores() {
        let store = factory();

        let record = StoredResource::new("ruby_buildpack", "g1", "rb.zip");
        store.save(record.clone()).await.unwrap();

        let loaded = store.load("ruby_buildpack").await.unwrap().unwrap();
        assert_eq!(loaded.guid, "g1");
        assert_eq!(loaded.filename, "rb.zip");
        // RFC3339 keeps sub-second precision
        assert_eq!(loaded.updated_at, record.updated_at);
    }
}

#[tokio::test]
async fn load_unknown_name_returns_none() {
    for factory in get_test_stores() {
        let store = factory();
        assert!(store.load("missing").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn save_replaces_existing_record() {
    for factory in get_test_stores() {
        let store = factory();

        store
            .save(StoredResource::new("ruby_buildpack", "g1", ""))
            .await
            .unwrap();
        let mut newer = StoredResource::new("ruby_buildpack", "g2", "rb.zip");
        newer.updated_at = Utc::now() + Duration::minutes(5);
        store.save(newer).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].guid, "g2");
    }
}

#[tokio::test]
async fn remove_forgets_only_that_name() {
    for factory in get_test_stores() {
        let store = factory();
        store
            .save(StoredResource::new("ruby_buildpack", "g1", ""))
            .await
            .unwrap();
        store
            .save(StoredResource::new("go_buildpack", "g2", ""))
            .await
            .unwrap();

        store.remove("ruby_buildpack").await.unwrap();
        // Removing an unknown name is fine
        store.remove("ruby_buildpack").await.unwrap();

        assert!(store.load("ruby_buildpack").await.unwrap().is_none());
        assert!(store.load("go_buildpack").await.unwrap().is_some());
    }
}

#[tokio::test]
async fn list_is_ordered_by_name() {
    for factory in get_test_stores() {
        let store = factory();
        for (name, guid) in [("python", "g3"), ("go", "g1"), ("java", "g2")] {
            store
                .save(StoredResource::new(name, guid, ""))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["go", "java", "python"]);
    }
}

#[tokio::test]
async fn clear_all_empties_the_store() {
    for factory in get_test_stores() {
        let store = factory();
        store
            .save(StoredResource::new("ruby_buildpack", "g1", ""))
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("state.db");
    let db_path = db_path.to_str().unwrap();

    {
        let store = SqliteStateStore::new(db_path).unwrap();
        store
            .save(StoredResource::new("ruby_buildpack", "g1", "rb.zip"))
            .await
            .unwrap();
    }

    let reopened = SqliteStateStore::new(db_path).unwrap();
    let loaded = reopened.load("ruby_buildpack").await.unwrap().unwrap();
    assert_eq!(loaded.guid, "g1");
}

#[test]
fn stored_resource_from_state() {
    let state = ResourceState::new("ruby_buildpack").with_id("g1");

    let stored = StoredResource::from_state(&state);

    assert_eq!(stored.name, "ruby_buildpack");
    assert_eq!(stored.guid, "g1");
    assert!(stored.filename.is_empty());
}
