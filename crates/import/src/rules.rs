use budgetsplit_core::{Bucket, CategorizedTransaction, Money, Recurrence, Transaction, UNCATEGORIZED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::util::levenshtein_distance;

/// Priority given to rules that don't set one.
pub const DEFAULT_PRIORITY: i32 = 100;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
    #[error("Rule '{rule}' has a fuzzy threshold outside 0..=1: {threshold}")]
    InvalidThreshold { rule: String, threshold: f32 },
    #[error("Rule '{0}' has an empty category")]
    EmptyCategory(String),
    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to write rules: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    #[serde(default = "new_rule_id")]
    pub id: String,
    pub name: String,
    /// Every keyword must appear in the description, ignoring case.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_min: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_max: Option<Money>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<Bucket>,
    /// Subscription, Recurring or One-time tag applied on match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub sweep: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn new_rule_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            id: new_rule_id(),
            name: name.to_string(),
            keywords: Vec::new(),
            pattern: None,
            match_type: MatchType::default(),
            amount_min: None,
            amount_max: None,
            category: category.to_string(),
            bucket: None,
            recurrence: None,
            priority: DEFAULT_PRIORITY,
            sweep: false,
            enabled: true,
        }
    }

    /// Rule matching descriptions that contain all of `keywords`.
    pub fn with_keywords(name: &str, keywords: &[&str], category: &str, bucket: Option<Bucket>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            bucket,
            ..Self::new(name, category)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
    Fuzzy {
        threshold: f32,
    },
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            s if s.starts_with("fuzzy:") => {
                let threshold = s[6..]
                    .parse::<f32>()
                    .map_err(|_| "Invalid fuzzy threshold".to_string())?;
                Ok(MatchType::Fuzzy { threshold })
            }
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Contains => f.write_str("contains"),
            MatchType::Exact => f.write_str("exact"),
            MatchType::Regex => f.write_str("regex"),
            MatchType::Fuzzy { threshold } => write!(f, "fuzzy:{threshold}"),
        }
    }
}

impl TryFrom<String> for MatchType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MatchType> for String {
    fn from(m: MatchType) -> Self {
        m.to_string()
    }
}

/// The persisted form of a user's rules: `[[rule]]` tables in TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, RuleError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn find(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    /// Remove a rule by id, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Fall back to the bank's own category when no rule matches.
    #[serde(default)]
    pub use_bank_categories: bool,
    /// Bucket for categories whose rule doesn't name one.
    #[serde(default)]
    pub category_buckets: BTreeMap<String, Bucket>,
}

impl EngineOptions {
    pub fn bucket_for(&self, category: &str) -> Bucket {
        if let Some(b) = self.category_buckets.get(category) {
            return *b;
        }
        self.category_buckets
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(category))
            .map_or(Bucket::Uncategorized, |(_, b)| *b)
    }
}

/// A rule with its lowercased keywords and pattern prepared for matching.
struct CompiledRule {
    rule: Rule,
    keywords: Vec<String>,
    pattern: Option<String>,
    compiled_regex: Option<regex::Regex>,
}

pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    options: EngineOptions,
}

impl RuleEngine {
    /// Build an engine over `rules`. Disabled rules are dropped; the rest are
    /// ordered by ascending priority, keeping declaration order on ties.
    pub fn new(rules: Vec<Rule>, options: EngineOptions) -> Result<Self, RuleError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules.into_iter().filter(|r| r.enabled) {
            compiled.push(compile(rule)?);
        }
        compiled.sort_by_key(|cr| cr.rule.priority);
        tracing::debug!(rules = compiled.len(), "rule engine ready");
        Ok(Self { rules: compiled, options })
    }

    pub fn from_toml(content: &str, options: EngineOptions) -> Result<Self, RuleError> {
        Self::new(RuleSet::from_toml(content)?.rules, options)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find_matching_rule(&self, tx: &Transaction) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|cr| rule_matches(cr, tx))
            .map(|cr| &cr.rule)
    }

    pub fn categorize(&self, tx: &Transaction) -> CategorizedTransaction {
        if let Some(rule) = self.find_matching_rule(tx) {
            tracing::debug!(rule = %rule.name, description = %tx.description, "rule matched");
            let bucket = rule
                .bucket
                .unwrap_or_else(|| self.options.bucket_for(&rule.category));
            return CategorizedTransaction {
                transaction: tx.clone(),
                category: rule.category.clone(),
                bucket,
                included: !rule.sweep,
                rule_id: Some(rule.id.clone()),
                recurrence: rule.recurrence.unwrap_or_default(),
            };
        }

        match tx.raw_category.as_deref().map(str::trim) {
            Some(raw) if self.options.use_bank_categories && !raw.is_empty() => {
                CategorizedTransaction {
                    transaction: tx.clone(),
                    category: raw.to_string(),
                    bucket: self.options.bucket_for(raw),
                    included: true,
                    rule_id: None,
                    recurrence: Recurrence::Unknown,
                }
            }
            _ => CategorizedTransaction::uncategorized(tx.clone()),
        }
    }

    pub fn categorize_all(&self, transactions: &[Transaction]) -> Vec<CategorizedTransaction> {
        let out: Vec<_> = transactions.iter().map(|tx| self.categorize(tx)).collect();
        let uncategorized = out.iter().filter(|c| c.category == UNCATEGORIZED).count();
        tracing::info!(
            transactions = out.len(),
            uncategorized,
            "categorized transactions"
        );
        out
    }
}

fn compile(rule: Rule) -> Result<CompiledRule, RuleError> {
    if rule.category.trim().is_empty() {
        return Err(RuleError::EmptyCategory(rule.name.clone()));
    }

    let pattern = rule
        .pattern
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let compiled_regex = match (&rule.match_type, pattern) {
        (MatchType::Regex, Some(p)) => Some(
            regex::RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|source| RuleError::InvalidPattern {
                    rule: rule.name.clone(),
                    source,
                })?,
        ),
        _ => None,
    };

    if let MatchType::Fuzzy { threshold } = rule.match_type {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RuleError::InvalidThreshold {
                rule: rule.name.clone(),
                threshold,
            });
        }
    }

    Ok(CompiledRule {
        keywords: rule
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect(),
        pattern: pattern.map(str::to_lowercase),
        compiled_regex,
        rule,
    })
}

fn rule_matches(cr: &CompiledRule, tx: &Transaction) -> bool {
    let rule = &cr.rule;

    if let Some(min) = rule.amount_min {
        if tx.amount < min {
            return false;
        }
    }
    if let Some(max) = rule.amount_max {
        if tx.amount > max {
            return false;
        }
    }

    let text = tx.description.to_lowercase();

    if !cr.keywords.iter().all(|k| text.contains(k.as_str())) {
        return false;
    }

    let Some(pattern) = &cr.pattern else {
        return true;
    };

    match &rule.match_type {
        MatchType::Contains => text.contains(pattern.as_str()),
        MatchType::Exact => text.trim() == pattern.as_str(),
        MatchType::Regex => cr
            .compiled_regex
            .as_ref()
            .is_some_and(|re| re.is_match(&tx.description)),
        MatchType::Fuzzy { threshold } => fuzzy_score(text.trim(), pattern) >= *threshold,
    }
}

fn fuzzy_score(s1: &str, s2: &str) -> f32 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(s1, s2) as f32 / max_len as f32)
}
