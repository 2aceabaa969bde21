//! File-backed checkpoint store
//!
//! One JSON file per checkpoint key under a caller-chosen directory.
//! File names are a digest of the key so arbitrary key strings stay
//! filesystem-safe; the raw key is kept inside the record for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{Checkpoint, CheckpointStore, StoreError};

#[derive(Serialize, Deserialize)]
struct CheckpointFile {
    key: String,
    last_scanned: u64,
    updated_at: i64,
}

pub struct FsCheckpointStore {
    dir: PathBuf,
}

impl FsCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(&digest[..16])))
    }
}

impl CheckpointStore for FsCheckpointStore {
    fn get(&self, key: &str) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        let file: CheckpointFile =
            serde_json::from_str(&raw).map_err(|e| StoreError::Encoding(e.to_string()))?;
        Ok(Some(Checkpoint {
            last_scanned: file.last_scanned,
            updated_at: file.updated_at,
        }))
    }

    fn set(&mut self, key: &str, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(e.to_string()))?;

        let file = CheckpointFile {
            key: key.to_string(),
            last_scanned: checkpoint.last_scanned,
            updated_at: checkpoint.updated_at,
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| StoreError::Encoding(e.to_string()))?;

        let path = self.path_for(key);
        write_private(&path, &json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, contents)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsCheckpointStore::new(dir.path());

        let key = "veilpool/1/0xabc/deadbeef";
        assert_eq!(store.get(key).unwrap(), None);

        let checkpoint = Checkpoint {
            last_scanned: 128,
            updated_at: 1_700_000_000,
        };
        store.set(key, &checkpoint).unwrap();
        assert_eq!(store.get(key).unwrap(), Some(checkpoint));

        // Overwrite advances the record
        let later = Checkpoint {
            last_scanned: 256,
            updated_at: 1_700_000_100,
        };
        store.set(key, &later).unwrap();
        assert_eq!(store.get(key).unwrap(), Some(later));
    }

    #[test]
    fn test_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsCheckpointStore::new(dir.path());

        let a = Checkpoint {
            last_scanned: 1,
            updated_at: 0,
        };
        let b = Checkpoint {
            last_scanned: 2,
            updated_at: 0,
        };
        store.set("chain-1", &a).unwrap();
        store.set("chain-2", &b).unwrap();

        assert_eq!(store.get("chain-1").unwrap(), Some(a));
        assert_eq!(store.get("chain-2").unwrap(), Some(b));
    }
}
