use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{error::RepositoryError, models::RepositoryCard};

/// File name of the durable slot inside the cache directory.
pub const CACHE_FILE_NAME: &str = "card-repository.json";

/// Single named slot holding the serialised canonical set.
#[derive(Debug, Clone)]
pub struct RepositoryCache {
    path: PathBuf,
}

impl RepositoryCache {
    /// Slot stored at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot stored under `cache_root`.
    pub fn in_dir(cache_root: impl AsRef<Path>) -> Self {
        Self::new(cache_root.as_ref().join(CACHE_FILE_NAME))
    }

    /// Location of the slot on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the slot, returning `None` when it is empty.
    ///
    /// An unreadable or unparsable slot is an error; callers treat it as
    /// empty after clearing it.
    pub fn load(&self) -> Result<Option<Vec<RepositoryCard>>, RepositoryError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(RepositoryError::cache(
                    format!("failed to read {}", self.path.display()),
                    err,
                ))
            }
        };
        let cards = serde_json::from_slice(&contents)?;
        Ok(Some(cards))
    }

    /// Replace the slot contents, creating parent directories if needed.
    pub fn persist(&self, cards: &[RepositoryCard]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::cache(
                    format!("failed to create cache directory {}", parent.display()),
                    err,
                )
            })?;
        }

        let serialized = serde_json::to_vec(cards).map_err(RepositoryError::Encode)?;
        fs::write(&self.path, serialized).map_err(|err| {
            RepositoryError::cache(format!("failed to write {}", self.path.display()), err)
        })
    }

    /// Empty the slot. Clearing an already empty slot succeeds.
    pub fn clear(&self) -> Result<(), RepositoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RepositoryError::cache(
                format!("failed to remove {}", self.path.display()),
                err,
            )),
        }
    }
}
