use budgetsplit_core::{Bucket, SplitConfig};
use budgetsplit_import::EngineOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{read_optional, write_atomic, StorageError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Use the bank's own category for rows no rule matches.
    pub use_bank_categories: bool,
    /// Account label applied when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub sheet_name: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: 30,
            sheet_name: "Transactions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub sheet: SheetSettings,
    #[serde(default = "default_category_buckets")]
    pub category_buckets: BTreeMap<String, Bucket>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            import: ImportSettings::default(),
            sheet: SheetSettings::default(),
            category_buckets: default_category_buckets(),
        }
    }
}

/// Buckets for the categories the bank exports produce out of the box.
fn default_category_buckets() -> BTreeMap<String, Bucket> {
    [
        ("Groceries", Bucket::Needs),
        ("Bills & Utilities", Bucket::Needs),
        ("Gas & Fuel", Bucket::Needs),
        ("Healthcare", Bucket::Needs),
        ("Auto & Transport", Bucket::Needs),
        ("Debt Payment", Bucket::Needs),
        ("Education", Bucket::Needs),
        ("Food & Dining", Bucket::Wants),
        ("Entertainment", Bucket::Wants),
        ("Shopping", Bucket::Wants),
        ("Services", Bucket::Wants),
        ("Home", Bucket::Wants),
        ("Income", Bucket::Income),
        ("Other Income", Bucket::Income),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let Some(text) = read_optional(path)? else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        };
        let settings: Settings = toml::from_str(&text).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.split.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        self.split.validate()?;
        write_atomic(path, &toml::to_string_pretty(self)?)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            use_bank_categories: self.import.use_bank_categories,
            category_buckets: self.category_buckets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let s = Settings::load(&temp_dir.path().join("settings.toml")).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.sheet.timeout_secs, 30);
        assert_eq!(s.sheet.sheet_name, "Transactions");
        assert_eq!(s.category_buckets.get("Groceries"), Some(&Bucket::Needs));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[split]
needs = 60
wants = 20

[import]
use_bank_categories = true

[sheet]
endpoint = "https://example.test/hook"
"#,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.split.needs, Decimal::from(60));
        assert_eq!(s.split.wants, Decimal::from(20));
        assert_eq!(s.split.savings, Decimal::from(20));
        assert!(s.import.use_bank_categories);
        assert_eq!(s.sheet.endpoint.as_deref(), Some("https://example.test/hook"));
        assert_eq!(s.sheet.timeout_secs, 30);
        assert!(!s.category_buckets.is_empty());
    }

    #[test]
    fn invalid_split_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(&path, "[split]\nneeds = 90\n").unwrap();
        assert!(matches!(Settings::load(&path), Err(StorageError::Split(_))));
    }

    #[test]
    fn malformed_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(&path, "[split\n").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("settings.toml"));
    }

    #[test]
    fn save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sub").join("settings.toml");
        let mut s = Settings::default();
        s.import.default_account = Some("Joint Checking".into());
        s.category_buckets.insert("Coffee".into(), Bucket::Wants);
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn engine_options_carry_bucket_map() {
        let s = Settings::default();
        let opts = s.engine_options();
        assert!(!opts.use_bank_categories);
        assert_eq!(opts.bucket_for("food & dining"), Bucket::Wants);
    }
}
