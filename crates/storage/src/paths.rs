use std::path::{Path, PathBuf};

use crate::StorageError;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "BUDGETSPLIT_DATA_DIR";

/// Locations of everything budgetsplit keeps on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    base_dir: PathBuf,
}

impl DataPaths {
    /// Resolve the data directory: an explicit path, then
    /// `BUDGETSPLIT_DATA_DIR`, then the platform data dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, StorageError> {
        if let Some(dir) = explicit {
            return Ok(Self::with_base_dir(dir.to_path_buf()));
        }
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_base_dir(PathBuf::from(dir)));
        }
        let dirs = directories::ProjectDirs::from("com", "budgetsplit", "budgetsplit")
            .ok_or(StorageError::NoDataDir)?;
        Ok(Self::with_base_dir(dirs.data_dir().to_path_buf()))
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.toml")
    }

    pub fn rules_file(&self) -> PathBuf {
        self.base_dir.join("rules.toml")
    }

    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, e))
    }

    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
