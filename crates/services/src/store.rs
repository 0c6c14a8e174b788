//! On-disk blob store: one JSON file per cache key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cafemap_core::cache::BlobStore;
use tracing::warn;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(blob) => Some(blob),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save(&mut self, key: &str, blob: String) -> cafemap_core::Result<()> {
        fs::create_dir_all(&self.dir).map_err(ServiceError::from)?;
        fs::write(self.path(key), blob).map_err(ServiceError::from)?;
        Ok(())
    }
}
