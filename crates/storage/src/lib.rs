//! On-disk state: the data directory, `settings.toml` and `rules.toml`.

pub mod paths;
pub mod rule_store;
pub mod settings;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use paths::{DataPaths, DATA_DIR_ENV};
pub use rule_store::RuleStore;
pub use settings::{ImportSettings, Settings, SheetSettings};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Rules(#[from] budgetsplit_import::RuleError),
    #[error(transparent)]
    Split(#[from] budgetsplit_core::SplitError),
    #[error("No rule with id '{0}'")]
    RuleNotFound(String),
    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a file, treating a missing one as `None`.
fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Write through a sibling temp file so a crash never leaves half a file.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents).map_err(|e| StorageError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))?;
    Ok(())
}
