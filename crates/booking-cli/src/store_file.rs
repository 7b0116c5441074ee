//! The JSON store file.
//!
//! Commands that change the store run inside [`update`]: an exclusive lock on
//! `<store>.lock` is held from loading the snapshot until the new one has
//! replaced the file. Files are replaced through a temporary file in the same
//! directory and a rename, so readers never see a partial write.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use booking_engine::{MemoryStore, StoreState};
use fd_lock::RwLock;
use tempfile::NamedTempFile;

/// Load the store; an absent file is an empty store.
pub fn open(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "store file absent, starting empty");
        return Ok(MemoryStore::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store: {}", path.display()))?;
    let state: StoreState = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse store: {}", path.display()))?;
    MemoryStore::from_state(state).with_context(|| format!("Invalid store: {}", path.display()))
}

/// Load, change and save the store under an exclusive lock.
///
/// Nothing is written when `change` fails.
pub fn update<T>(path: &Path, change: impl FnOnce(&MemoryStore) -> Result<T>) -> Result<T> {
    let lock_path = lock_path(path);
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock
        .write()
        .with_context(|| format!("Failed to lock store: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "store locked");

    let store = open(path)?;
    let out = change(&store)?;
    let json = serde_json::to_string_pretty(&store.snapshot()?)?;
    write_atomic(path, &json)
        .with_context(|| format!("Failed to write store: {}", path.display()))?;
    Ok(out)
}

/// Replace `path` with `contents` through a temporary file and a rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".lock");
    path.with_file_name(name)
}
