use budgetsplit_import::{EngineOptions, Rule, RuleEngine, RuleSet};
use std::path::{Path, PathBuf};

use crate::{read_optional, write_atomic, StorageError};

/// The user's rules, persisted as `[[rule]]` tables in a TOML file.
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty rule set.
    pub fn load(&self) -> Result<RuleSet, StorageError> {
        let Some(text) = read_optional(&self.path)? else {
            return Ok(RuleSet::default());
        };
        let set: RuleSet = toml::from_str(&text).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), rules = set.rules.len(), "loaded rules");
        Ok(set)
    }

    pub fn save(&self, set: &RuleSet) -> Result<(), StorageError> {
        write_atomic(&self.path, &set.to_toml()?)
    }

    /// Build an engine from the stored rules.
    pub fn engine(&self, options: EngineOptions) -> Result<RuleEngine, StorageError> {
        Ok(RuleEngine::new(self.load()?.rules, options)?)
    }

    /// Append a rule after checking it compiles.
    pub fn add(&self, rule: Rule) -> Result<Rule, StorageError> {
        RuleEngine::new(vec![rule.clone()], EngineOptions::default())?;
        let mut set = self.load()?;
        set.rules.push(rule.clone());
        self.save(&set)?;
        tracing::info!(id = %rule.id, name = %rule.name, "rule added");
        Ok(rule)
    }

    pub fn remove(&self, id: &str) -> Result<Rule, StorageError> {
        let mut set = self.load()?;
        let removed = set
            .remove(id)
            .ok_or_else(|| StorageError::RuleNotFound(id.to_string()))?;
        self.save(&set)?;
        tracing::info!(id, "rule removed");
        Ok(removed)
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<Rule, StorageError> {
        let mut set = self.load()?;
        let rule = set
            .find_mut(id)
            .ok_or_else(|| StorageError::RuleNotFound(id.to_string()))?;
        rule.enabled = enabled;
        let updated = rule.clone();
        self.save(&set)?;
        Ok(updated)
    }
}
