//! Record-store utilities.
//!
//! The content stores (posts, attachments, graffiti) all use the same
//! layout: one directory per record, named by its numeric id, holding a
//! single YAML document. This module contains the shared read/write/id
//! allocation code.

use crate::error::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the directory for a record id within a store.
pub(crate) fn record_dir(base_dir: &Path, id: u64) -> PathBuf {
    base_dir.join(id.to_string())
}

/// Reads and deserialises a record file, or `None` when the record does
/// not exist. The caller maps `None` to its domain's not-found error.
pub(crate) fn read_record<T: serde::de::DeserializeOwned>(
    base_dir: &Path,
    id: u64,
    filename: &str,
) -> CoreResult<Option<T>> {
    let path = record_dir(base_dir, id).join(filename);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path).map_err(CoreError::FileRead)?;
    let record = serde_yaml::from_str(&contents).map_err(CoreError::YamlDeserialization)?;
    Ok(Some(record))
}

/// Serialises and writes a record file, creating the record directory if
/// needed. Overwrites any existing file: record stores are last-write-wins.
pub(crate) fn write_record<T: serde::Serialize>(
    base_dir: &Path,
    id: u64,
    filename: &str,
    record: &T,
) -> CoreResult<()> {
    let dir = record_dir(base_dir, id);
    fs::create_dir_all(&dir).map_err(CoreError::StorageDirCreation)?;

    let contents = serde_yaml::to_string(record).map_err(CoreError::YamlSerialization)?;
    fs::write(dir.join(filename), contents).map_err(CoreError::FileWrite)
}

/// Removes a record directory and everything in it.
pub(crate) fn remove_record(base_dir: &Path, id: u64) -> CoreResult<()> {
    let dir = record_dir(base_dir, id);
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(&dir).map_err(CoreError::FileDelete)
}

/// Allocates the next record id for a store: one greater than the highest
/// id currently present, starting from 1.
///
/// Concurrent submissions can race to the same id; the resulting writes
/// are last-writer-wins at the filesystem, which matches the service's
/// no-coordination model.
pub(crate) fn next_id(base_dir: &Path) -> u64 {
    let entries = match fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(_) => return 1,
    };

    let max = entries
        .flatten()
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
        })
        .max()
        .unwrap_or(0);

    max + 1
}

/// Lists all record ids present in a store, unordered.
pub(crate) fn list_ids(base_dir: &Path) -> Vec<u64> {
    let entries = match fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .flatten()
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
        })
        .collect()
}
