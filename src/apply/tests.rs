use crate::apply::{Applier, ApplyError, ResourceOutcome};
use crate::config::{ApplyConfig, BuildpackConfig};
use crate::platform::fake::Call;
use crate::platform::FakeBuildpackClient;
use crate::reconcile::Plan;
use crate::state::{FakeStateStore, StateStore, StoredResource};
use crate::test_utils::{
    create_buildpack_dir, create_test_buildpack, create_test_cache, create_test_config,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    client: Arc<FakeBuildpackClient>,
    store: FakeStateStore,
    applier: Applier<Arc<FakeBuildpackClient>, FakeStateStore>,
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let client = Arc::new(FakeBuildpackClient::new());
        let store = FakeStateStore::new();
        let applier = Applier::new(
            client.clone(),
            store.clone(),
            create_test_cache(),
            &ApplyConfig { workers: 2 },
        );
        Self {
            client,
            store,
            applier,
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// `ruby_buildpack` backed by a directory, `go_buildpack` without bits
    fn buildpacks(&self) -> Vec<BuildpackConfig> {
        let dir = create_buildpack_dir(self.root.path(), "rb");
        vec![
            create_test_config("ruby_buildpack", Some(dir.as_path())),
            create_test_config("go_buildpack", None),
        ]
    }

    async fn stored_guid(&self, name: &str) -> Option<String> {
        self.store.load(name).await.unwrap().map(|s| s.guid)
    }
}

#[tokio::test]
async fn apply_creates_and_stores_identities() {
    let fixture = Fixture::new();

    let report = fixture.applier.apply(&fixture.buildpacks()).await;

    assert_eq!(report.outcome("ruby_buildpack"), Some(&ResourceOutcome::Created));
    assert_eq!(report.outcome("go_buildpack"), Some(&ResourceOutcome::Created));
    assert_eq!(report.failed(), 0);
    assert_eq!(fixture.client.call_count(Call::Create), 2);
    assert_eq!(fixture.client.call_count(Call::Upload), 1);

    let ruby = fixture.store.load("ruby_buildpack").await.unwrap().unwrap();
    assert_eq!(ruby.filename, "rb.zip");
    assert!(fixture.client.buildpack(&ruby.guid).is_some());
    assert!(fixture.stored_guid("go_buildpack").await.is_some());
}

#[tokio::test]
async fn second_apply_changes_nothing() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();
    fixture.applier.apply(&buildpacks).await;
    let guid = fixture.stored_guid("ruby_buildpack").await;
    fixture.client.fake_reset_calls();

    let report = fixture.applier.apply(&buildpacks).await;

    assert_eq!(report.count(|o| *o == ResourceOutcome::Unchanged), 2);
    assert_eq!(fixture.client.write_count(), 0);
    assert_eq!(fixture.stored_guid("ruby_buildpack").await, guid);
    assert_eq!(
        report.to_string(),
        "0 created, 0 adopted, 0 updated, 2 unchanged, 0 failed"
    );
}

#[tokio::test]
async fn changed_config_is_updated() {
    let fixture = Fixture::new();
    let mut buildpacks = fixture.buildpacks();
    fixture.applier.apply(&buildpacks).await;

    buildpacks[1].position = 3;
    let report = fixture.applier.apply(&buildpacks).await;

    assert_eq!(report.outcome("go_buildpack"), Some(&ResourceOutcome::Updated));
    assert_eq!(
        report.outcome("ruby_buildpack"),
        Some(&ResourceOutcome::Unchanged)
    );
    let guid = fixture.stored_guid("go_buildpack").await.unwrap();
    assert_eq!(fixture.client.buildpack(&guid).unwrap().position, Some(3));
}

#[tokio::test]
async fn deleted_record_is_recreated() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();
    fixture.applier.apply(&buildpacks).await;
    let old_guid = fixture.stored_guid("ruby_buildpack").await.unwrap();
    fixture.client.fake_remove_buildpack(&old_guid);

    let report = fixture.applier.apply(&buildpacks).await;

    assert_eq!(
        report.outcome("ruby_buildpack"),
        Some(&ResourceOutcome::Created)
    );
    let new_guid = fixture.stored_guid("ruby_buildpack").await.unwrap();
    assert_ne!(new_guid, old_guid);
    assert_eq!(fixture.client.buildpack(&new_guid).unwrap().filename, "rb.zip");
}

#[tokio::test]
async fn existing_record_is_adopted() {
    let fixture = Fixture::new();
    fixture
        .client
        .fake_add_buildpack(create_test_buildpack("preexisting", "go_buildpack"));

    let report = fixture.applier.apply(&fixture.buildpacks()).await;

    assert_eq!(report.outcome("go_buildpack"), Some(&ResourceOutcome::Adopted));
    assert_eq!(
        fixture.stored_guid("go_buildpack").await.as_deref(),
        Some("preexisting")
    );
    assert_eq!(fixture.client.call_count(Call::Create), 1);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_others() {
    let fixture = Fixture::new();
    let mut buildpacks = fixture.buildpacks();
    buildpacks.push(create_test_config(
        "broken_buildpack",
        Some(fixture.root.path().join("missing").as_path()),
    ));

    let report = fixture.applier.apply(&buildpacks).await;

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome("broken_buildpack"),
        Some(ResourceOutcome::Failed(_))
    ));
    assert_eq!(report.count(|o| *o == ResourceOutcome::Created), 2);
    assert!(fixture.stored_guid("broken_buildpack").await.is_none());
    // Outcomes are reported by name
    let names: Vec<&str> = report.outcomes.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["broken_buildpack", "go_buildpack", "ruby_buildpack"]);
}

#[tokio::test]
async fn remote_failure_is_reported() {
    let fixture = Fixture::new();
    fixture.client.fake_fail(Call::Create);

    let report = fixture.applier.apply(&fixture.buildpacks()).await;

    assert_eq!(report.failed(), 2);
    assert!(fixture.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn plan_reports_pending_work() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();

    let plans = fixture.applier.plan(&buildpacks).await.unwrap();
    assert_eq!(plans[0], ("ruby_buildpack".to_string(), Plan::Create));
    assert_eq!(fixture.client.write_count(), 0);

    fixture.applier.apply(&buildpacks).await;
    let plans = fixture.applier.plan(&buildpacks).await.unwrap();
    assert!(plans.iter().all(|(_, plan)| *plan == Plan::NoChange));
}

#[tokio::test]
async fn read_refreshes_and_drops_vanished_records() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();
    fixture.applier.apply(&buildpacks).await;

    let state = fixture
        .applier
        .read("ruby_buildpack", Some(&buildpacks[0]))
        .await
        .unwrap();
    assert!(state.has_id());
    assert_eq!(state.filename, "rb.zip");

    let guid = fixture.stored_guid("go_buildpack").await.unwrap();
    fixture.client.fake_remove_buildpack(&guid);
    fixture.applier.reconciler().cache().clear().await;

    let state = fixture.applier.read("go_buildpack", None).await.unwrap();
    assert!(!state.has_id());
    assert!(fixture.stored_guid("go_buildpack").await.is_none());
}

#[tokio::test]
async fn read_unmanaged_name_fails() {
    let fixture = Fixture::new();
    let result = fixture.applier.read("ruby_buildpack", None).await;
    assert!(matches!(result, Err(ApplyError::NotManaged(_))));
}

#[tokio::test]
async fn exists_looks_up_by_name() {
    let fixture = Fixture::new();
    fixture
        .client
        .fake_add_buildpack(create_test_buildpack("g1", "java_buildpack"));

    assert_eq!(
        fixture.applier.exists("java_buildpack").await.unwrap(),
        Some("g1".to_string())
    );
    assert_eq!(fixture.applier.exists("php_buildpack").await.unwrap(), None);
}

#[tokio::test]
async fn delete_removes_remote_record_and_identity() {
    let fixture = Fixture::new();
    fixture.applier.apply(&fixture.buildpacks()).await;
    let guid = fixture.stored_guid("ruby_buildpack").await.unwrap();

    fixture.applier.delete("ruby_buildpack").await.unwrap();

    assert!(fixture.client.buildpack(&guid).is_none());
    assert!(fixture.stored_guid("ruby_buildpack").await.is_none());
    assert!(matches!(
        fixture.applier.delete("ruby_buildpack").await,
        Err(ApplyError::NotManaged(_))
    ));
}

#[tokio::test]
async fn delete_of_already_deleted_record_forgets_it() {
    let fixture = Fixture::new();
    fixture
        .store
        .fake_add(StoredResource::new("ruby_buildpack", "gone", ""));

    fixture.applier.delete("ruby_buildpack").await.unwrap();

    assert!(fixture.stored_guid("ruby_buildpack").await.is_none());
}

#[tokio::test]
async fn failed_delete_keeps_identity() {
    let fixture = Fixture::new();
    fixture.applier.apply(&fixture.buildpacks()).await;
    fixture.client.fake_fail(Call::Delete);

    let result = fixture.applier.delete("go_buildpack").await;

    assert!(matches!(result, Err(ApplyError::Reconcile(_, _))));
    assert!(fixture.stored_guid("go_buildpack").await.is_some());
}

#[tokio::test]
async fn reset_forgets_everything() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();
    fixture.applier.apply(&buildpacks).await;
    assert_eq!(fixture.applier.managed().await.unwrap().len(), 2);

    fixture.applier.reset().await.unwrap();

    assert!(fixture.applier.managed().await.unwrap().is_empty());
    // Records still exist remotely and are adopted on the next pass
    let report = fixture.applier.apply(&buildpacks).await;
    assert_eq!(report.count(|o| *o == ResourceOutcome::Adopted), 2);
}

#[tokio::test]
async fn upload_failure_after_create_keeps_identity() {
    let fixture = Fixture::new();
    let buildpacks = fixture.buildpacks();
    fixture.client.fake_fail(Call::Upload);

    let report = fixture.applier.apply(&buildpacks).await;

    assert!(matches!(
        report.outcome("ruby_buildpack"),
        Some(ResourceOutcome::Failed(_))
    ));
    let stored = fixture.store.load("ruby_buildpack").await.unwrap().unwrap();
    assert!(fixture.client.buildpack(&stored.guid).is_some());
    // Nothing was uploaded yet
    assert!(stored.filename.is_empty());

    // The next pass updates the same record instead of adopting it
    fixture.client.fake_reset_failure(Call::Upload);
    fixture.client.fake_reset_calls();
    let report = fixture.applier.apply(&buildpacks).await;
    assert_eq!(
        report.outcome("ruby_buildpack"),
        Some(&ResourceOutcome::Updated)
    );
    assert_eq!(fixture.client.call_count(Call::FindByName), 0);
    assert_eq!(fixture.stored_guid("ruby_buildpack").await, Some(stored.guid));

    fixture.applier.delete("ruby_buildpack").await.unwrap();
}
