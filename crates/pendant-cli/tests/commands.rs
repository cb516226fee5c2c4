//! Integration tests for the command implementations.

use std::path::Path;

use tempfile::tempdir;

use pendant_cli::commands::{
    run_backup, run_backups, run_init_config, run_restore, run_show, run_status,
};
use pendant_cli::summary::status_table;
use pendant_persistence::{Domain, FileState, PersistenceConfig};

fn config_for(root: &Path) -> PersistenceConfig {
    PersistenceConfig {
        data_dir: Some(root.to_path_buf()),
        ..Default::default()
    }
}

#[test]
fn test_status_reports_each_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("TeachingData.json"), "not json").unwrap();
    std::fs::write(dir.path().join("SystemData.json"), "{}").unwrap();

    let statuses = run_status(&config_for(dir.path()));

    assert_eq!(statuses.len(), 4);
    let state = |domain| {
        statuses
            .iter()
            .find(|s| s.domain == domain)
            .map(|s| s.state.clone())
            .unwrap()
    };
    assert_eq!(state(Domain::Movement), FileState::Missing);
    assert!(matches!(state(Domain::Teaching), FileState::Corrupt { .. }));
    assert_eq!(state(Domain::System), FileState::Valid { records: 1 });

    let rendered = status_table(&statuses).to_string();
    assert!(rendered.contains("TeachingData.json"));
    assert!(rendered.contains("missing"));
}

#[test]
fn test_show_missing_file_prints_defaults() {
    let dir = tempdir().unwrap();

    let json = run_show(&config_for(dir.path()), Domain::System).unwrap();

    insta::assert_snapshot!(json, @r#"
    {
      "Language": "en",
      "ControllerAddress": "192.168.0.10",
      "ControllerPort": 502,
      "JogSpeedPercent": 10,
      "ConfirmBeforeMove": true,
      "LengthUnit": "millimeter"
    }
    "#);
}

#[test]
fn test_show_normalizes_stored_values() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("SystemData.json"),
        r#"{ "JogSpeedPercent": 400, "Unknown": true }"#,
    )
    .unwrap();

    let json = run_show(&config_for(dir.path()), Domain::System).unwrap();

    assert!(json.contains("\"JogSpeedPercent\": 100"), "{json}");
    assert!(!json.contains("Unknown"), "{json}");
}

#[test]
fn test_show_corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("SetupData.json"), "{ \"Groups\": 3 }").unwrap();

    let err = run_show(&config_for(dir.path()), Domain::Setup).unwrap_err();
    assert!(format!("{err:#}").contains("SetupData.json"), "{err:#}");
}

#[test]
fn test_backup_list_and_restore() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let system = dir.path().join("SystemData.json");
    std::fs::write(&system, r#"{ "Language": "it" }"#).unwrap();

    let backup = run_backup(&config).unwrap();
    assert!(backup.join("SystemData.json").is_file());

    let backups = run_backups(&config);
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].domains, vec![Domain::System]);

    std::fs::write(&system, r#"{ "Language": "es" }"#).unwrap();
    let report = run_restore(&config, &backups[0].name).unwrap();

    assert!(report.is_success());
    let text = std::fs::read_to_string(&system).unwrap();
    assert!(text.contains("\"Language\": \"it\""), "{text}");
}

#[test]
fn test_backup_without_data_dir_fails() {
    let dir = tempdir().unwrap();
    let config = config_for(&dir.path().join("absent"));

    assert!(run_backup(&config).is_err());
    assert!(run_backups(&config).is_empty());
}

#[test]
fn test_init_config_writes_loadable_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf").join("persistence.toml");
    let mut config = config_for(dir.path());
    config.backup.max_backups = 5;

    run_init_config(&config, &path, false).unwrap();
    assert_eq!(PersistenceConfig::load_from(&path), config);

    assert!(run_init_config(&PersistenceConfig::default(), &path, false).is_err());
    run_init_config(&PersistenceConfig::default(), &path, true).unwrap();
    assert_eq!(PersistenceConfig::load_from(&path), PersistenceConfig::default());
}
