use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{KeyValueStore, StorageError};

const FILE_EXTENSION: &str = "json";

/// Stores each key as `<dir>/<escaped key>.json` (see [`sanitize_key`]).
///
/// Writes go through a temporary file and a rename, so a concurrent reader sees
/// either the previous document or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_key(key), FILE_EXTENSION))
    }
}

/// Maps a storage key to a safe file stem, one-to-one. ASCII letters, digits
/// and `-` are kept; every other byte, `_` included, becomes `_` plus two
/// lowercase hex digits.
pub(crate) fn sanitize_key(key: &str) -> String {
    if key.is_empty() {
        return "_".to_string();
    }

    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02x}", byte));
        }
    }
    stem
}

/// Writes `content` to a fresh temporary file in `dir` and renames it over
/// `path`. Each call gets its own temporary name, so concurrent writers of
/// one key never share a file.
fn write_atomically(dir: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        log::debug!("Read {} bytes from {:?}", contents.len(), path);
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let content = serde_json::to_vec_pretty(&value)?;

        let dir = self.dir.clone();
        let target = path.clone();
        let len = content.len();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &content))
            .await
            .map_err(|e| StorageError::Unavailable(format!("write task failed: {}", e)))??;

        log::debug!("Wrote {} bytes to {:?}", len, path);
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod file_store_tests;
