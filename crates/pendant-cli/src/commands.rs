//! Command implementations.
//!
//! Read-only commands work directly on the files. Commands that change data
//! go through a [`PersistenceManager`] so writes use the same lanes as the
//! pendant application.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use pendant_persistence::{
    BackupInfo, Domain, DomainStatus, DurableFileStore, PersistenceConfig, PersistenceManager,
    SaveReport, Snapshot, TextStore, create_backup, inspect_domain, list_backups, prune_backups,
};

pub fn run_status(config: &PersistenceConfig) -> Vec<DomainStatus> {
    let layout = config.layout();
    let store = DurableFileStore::new(config.retry.clone());
    Domain::ALL
        .into_iter()
        .map(|domain| inspect_domain(&store, &layout, domain))
        .collect()
}

/// Normalized JSON for `domain`, or its defaults when no file exists.
pub fn run_show(config: &PersistenceConfig, domain: Domain) -> Result<String> {
    let layout = config.layout();
    let store = DurableFileStore::new(config.retry.clone());
    let path = layout.file_path(domain);

    let snapshot = match store.read_text(&path) {
        Ok(text) => Snapshot::parse(domain, &text)
            .with_context(|| format!("parse {}", path.display()))?
            .unwrap_or_else(|| Snapshot::default_for(domain)),
        Err(e) if e.is_not_found() => {
            info!(domain = %domain, "No file, showing defaults");
            Snapshot::default_for(domain)
        }
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };

    Ok(snapshot.to_json()?)
}

/// Back up the data directory now.
pub fn run_backup(config: &PersistenceConfig) -> Result<PathBuf> {
    let layout = config.layout();
    if !layout.root().is_dir() {
        bail!("data directory {} does not exist", layout.root().display());
    }

    let store = DurableFileStore::new(config.retry.clone());
    let dir = create_backup(&store, &layout).context("create backup")?;
    let removed = prune_backups(&layout, config.backup.max_backups);
    if removed > 0 {
        info!(removed, "Pruned old backups");
    }
    Ok(dir)
}

/// Write `config` to `path` as TOML. An existing file is only replaced
/// with `force`.
pub fn run_init_config(config: &PersistenceConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    config
        .save_to(path)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "Wrote persistence settings");
    Ok(())
}

pub fn run_backups(config: &PersistenceConfig) -> Vec<BackupInfo> {
    list_backups(&config.layout())
}

/// Restore backup `name` into the data directory.
pub fn run_restore(config: &PersistenceConfig, name: &str) -> Result<SaveReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("start runtime")?;

    let mut manager = PersistenceManager::new(config.clone(), runtime.handle());
    runtime.block_on(async {
        manager.load_all().await;
        let report = manager
            .restore_backup(name)
            .await
            .with_context(|| format!("restore backup {name}"))?;
        manager.shutdown().await;
        Ok(report)
    })
}
