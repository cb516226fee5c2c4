//! Integration tests for the persistence manager against real files.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::tempdir;
use tokio::runtime::Handle;

use pendant_persistence::{
    Coord, Domain, DurableFileStore, FlushOutcome, GroupedContainer, LoadStatus, Notifier,
    PersistenceConfig, PersistenceEvent, PersistenceManager, PersistentModule, SystemData,
    TeachingData, TextStore,
};

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn save_succeeded(&self) {
        self.messages.lock().unwrap().push("saved".to_string());
    }

    fn save_failed(&self, reason: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(format!("Failed to save data: {reason}"));
    }
}

fn config_for(root: &Path) -> PersistenceConfig {
    PersistenceConfig {
        data_dir: Some(root.to_path_buf()),
        ..Default::default()
    }
}

fn open(root: &Path) -> PersistenceManager {
    PersistenceManager::new(config_for(root), &Handle::current())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_files_populate_defaults() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());

    let report = manager.load_all().await;

    assert!(report.is_clean());
    for domain in Domain::ALL {
        assert_eq!(report.status(domain), Some(&LoadStatus::Defaulted));
    }

    let record = manager
        .get::<TeachingData>()
        .record("Group1", "Cassette 1")
        .unwrap();
    assert_eq!(record.slot_count, 1);
    assert_eq!(record.pitch, 1);
    assert_eq!(record.position_a.to_string(), "0.00");
    assert_eq!(record.position_b, Coord::ZERO);
    assert_eq!(record.position_c, Coord::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_corrupt_file_does_not_affect_others() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("TeachingData.json"), "{ \"Groups\": [ oops").unwrap();
    std::fs::write(
        dir.path().join("SystemData.json"),
        r#"{ "Language": "fr", "ControllerPort": 503 }"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("SetupData.json"), "").unwrap();

    let mut manager = open(dir.path());
    let report = manager.load_all().await;

    assert!(!report.is_clean());
    assert!(matches!(
        report.status(Domain::Teaching),
        Some(LoadStatus::Corrupt { .. })
    ));
    assert_eq!(report.status(Domain::System), Some(&LoadStatus::Loaded));
    assert_eq!(report.status(Domain::Setup), Some(&LoadStatus::Defaulted));
    assert_eq!(report.status(Domain::Movement), Some(&LoadStatus::Defaulted));

    let system = manager.get::<SystemData>();
    assert_eq!(system.language, "fr");
    assert_eq!(system.controller_port, 503);
    assert_eq!(manager.get::<TeachingData>(), &TeachingData::default());

    // The unreadable file is kept in a backup.
    let backups = manager.list_backups();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].domains.contains(&Domain::Teaching));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_teach_point_survives_restart() {
    let dir = tempdir().unwrap();

    {
        let mut manager = open(dir.path());
        manager.load_all().await;

        let mut editor = manager.editor::<TeachingData>();
        assert_eq!(editor.key(), Some(("Group1", "Cassette 1")));
        editor.working_mut().slot_count = 25;
        editor.working_mut().position_a = "120.50".parse().unwrap();
        assert!(manager.commit_edit(&mut editor));

        // Auto-save fires after the 2 s debounce.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(dir.path().join("TeachingData.json").is_file());
    }

    let mut manager = open(dir.path());
    let report = manager.load_all().await;
    assert_eq!(report.status(Domain::Teaching), Some(&LoadStatus::Loaded));

    let record = manager
        .get::<TeachingData>()
        .record("Group1", "Cassette 1")
        .unwrap();
    assert_eq!(record.slot_count, 25);
    assert_eq!(record.position_a.to_string(), "120.50");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_select_saves_previous_record() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());
    manager.load_all().await;

    let mut editor = manager.editor::<TeachingData>();
    editor.working_mut().pitch = 7;
    manager.select(&mut editor, "Group1", "Cassette 3");

    let report = manager.save_all().await;
    assert!(report.is_success());

    let mut reopened = open(dir.path());
    reopened.load_all().await;
    let data = reopened.get::<TeachingData>();
    assert_eq!(data.record("Group1", "Cassette 1").unwrap().pitch, 7);
    assert_eq!(data.selection().key(), Some(("Group1", "Cassette 3")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_replacing_container_keeps_selection() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());
    manager.load_all().await;

    let mut editor = manager.editor::<TeachingData>();
    editor.working_mut().slot_count = 25;

    let elsewhere: TeachingData = serde_json::from_str(
        r#"{
            "Groups": { "Group1": { "Cassette 1": {} }, "G": { "X": {} } },
            "Selection": { "Group": "G", "Item": "X" }
        }"#,
    )
    .unwrap();
    assert_eq!(elsewhere.selection().key(), Some(("G", "X")));
    manager.edit::<TeachingData, _>(|data| *data = elsewhere);

    let data = manager.get::<TeachingData>();
    assert_eq!(data.selection().key(), Some(("Group1", "Cassette 1")));
    assert!(data.record("G", "X").is_some());

    manager.close_editor(editor).await.unwrap();
    let record = manager
        .get::<TeachingData>()
        .record("Group1", "Cassette 1")
        .unwrap();
    assert_eq!(record.slot_count, 25);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_close_editor_writes_pending_edit() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());
    manager.load_all().await;

    let mut editor = manager.editor::<TeachingData>();
    editor.working_mut().position_b = "42.50".parse().unwrap();
    assert!(editor.is_dirty());

    let outcome = manager.close_editor(editor).await.unwrap();

    assert_eq!(outcome, FlushOutcome::Written);
    let text = std::fs::read_to_string(dir.path().join("TeachingData.json")).unwrap();
    assert!(text.contains("\"PositionB\": 42.5"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_save_all_writes_every_domain_and_notifies() {
    let dir = tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let store: Arc<dyn TextStore> = Arc::new(DurableFileStore::default());
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
    let manager = PersistenceManager::with_store(
        config_for(dir.path()),
        store,
        dyn_notifier,
        &Handle::current(),
    );

    let report = manager.save_all().await;

    assert!(report.is_success());
    for domain in Domain::ALL {
        assert!(dir.path().join(domain.file_name()).is_file(), "{domain}");
    }
    assert_eq!(*notifier.messages.lock().unwrap(), vec!["saved".to_string()]);

    // A second bulk save finds nothing new to write.
    let report = manager.save_all().await;
    assert!(
        report
            .results
            .iter()
            .all(|(_, r)| matches!(r, Ok(FlushOutcome::Unchanged)))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_and_restore() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());
    manager.load_all().await;
    manager.save_all().await;

    let backup = manager.create_backup().unwrap();
    let name = backup.file_name().unwrap().to_str().unwrap().to_string();

    manager.edit::<SystemData, _>(|s| s.language = "de".to_string());
    manager.save_all().await;
    assert!(
        std::fs::read_to_string(dir.path().join("SystemData.json"))
            .unwrap()
            .contains("\"de\"")
    );

    let report = manager.restore_backup(&name).await.unwrap();
    assert!(report.is_success());
    assert_eq!(manager.get::<SystemData>().language, "en");
    assert!(
        std::fs::read_to_string(dir.path().join("SystemData.json"))
            .unwrap()
            .contains("\"en\"")
    );

    assert!(manager.restore_backup("19990101_000000").await.is_err());
}

struct TeachScreen {
    data: TeachingData,
}

impl PersistentModule for TeachScreen {
    type Data = TeachingData;

    fn get_persistent_data(&self) -> TeachingData {
        self.data.clone()
    }

    fn load_from_persistent_data(&mut self, data: TeachingData) {
        self.data = data;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_module_round_trip_through_mirror() {
    let dir = tempdir().unwrap();
    let mut manager = open(dir.path());
    manager.load_all().await;
    let mut events = manager.subscribe();

    let mut screen = TeachScreen {
        data: TeachingData::empty(),
    };
    manager.restore_into(&mut screen);
    assert!(screen.data.record("Group1", "Cassette 2").is_some());

    // The module's copy is not the mirror.
    screen
        .data
        .record_mut("Group1", "Cassette 2")
        .unwrap()
        .position_c = Coord::from_f64(-3.25);
    assert_eq!(
        manager
            .get::<TeachingData>()
            .record("Group1", "Cassette 2")
            .unwrap()
            .position_c,
        Coord::ZERO
    );

    manager.capture_from(&screen);
    let outcome = manager.force_flush(Domain::Teaching).await.unwrap();
    assert_eq!(outcome, FlushOutcome::Written);
    assert_eq!(
        events.recv().await.unwrap(),
        PersistenceEvent::Saved {
            domain: Domain::Teaching,
            path: dir.path().join("TeachingData.json"),
        }
    );

    let text = std::fs::read_to_string(dir.path().join("TeachingData.json")).unwrap();
    assert!(text.contains("-3.25"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_flushes_and_backs_up() {
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.backup.backup_on_shutdown = true;
    let mut manager = PersistenceManager::new(config, &Handle::current());
    manager.load_all().await;

    manager.edit::<SystemData, _>(|s| s.jog_speed_percent = 55);
    let report = manager.shutdown().await;

    assert!(report.is_success());
    let text = std::fs::read_to_string(dir.path().join("SystemData.json")).unwrap();
    assert!(text.contains("\"JogSpeedPercent\": 55"), "{text}");
    assert_eq!(manager.list_backups().len(), 1);
    assert!(manager.auto_save(Domain::System).is_err());
}
