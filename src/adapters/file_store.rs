//! Directory-backed blob store: one `<key>.json` file per collection.

use crate::domain::error::TradeflowError;
use crate::ports::blob_store::BlobStore;
use log::warn;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_path`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(base_path: P) -> Result<Self, TradeflowError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| TradeflowError::Store {
            reason: format!("failed to create {}: {}", base_path.display(), e),
        })?;
        Ok(Self { base_path })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl BlobStore for FileStore {
    /// A file that is not UTF-8 text reads as absent.
    fn read(&self, key: &str) -> Result<Option<String>, TradeflowError> {
        let path = self.blob_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TradeflowError::Store {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };
        match String::from_utf8(bytes) {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                warn!("ignoring {}: not valid UTF-8 ({})", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), TradeflowError> {
        let path = self.blob_path(key);
        fs::write(&path, value).map_err(|e| TradeflowError::Store {
            reason: format!("failed to write {}: {}", path.display(), e),
        })
    }

    fn remove(&self, key: &str) -> Result<(), TradeflowError> {
        let path = self.blob_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TradeflowError::Store {
                reason: format!("failed to remove {}: {}", path.display(), e),
            }),
        }
    }
}
