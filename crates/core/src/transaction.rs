use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// A normalized row from a bank export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub amount: Money,
    /// Source label, e.g. "Chase Credit" or whatever the user passed on import.
    pub account: String,
    /// Bank-specific transaction type (Chase `Type`, Discover purchase/payment).
    pub kind: Option<String>,
    /// Category as reported by the bank, already normalized where a map exists.
    pub raw_category: Option<String>,
    pub memo: Option<String>,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: &str, amount: Money, account: &str) -> Self {
        Transaction {
            date,
            post_date: None,
            description: description.to_string(),
            amount,
            account: account.to_string(),
            kind: None,
            raw_category: None,
            memo: None,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }

    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }

    /// `YYYY-MM` of the transaction date.
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Needs,
    Wants,
    Savings,
    Income,
    #[default]
    Uncategorized,
}

impl Bucket {
    /// The three buckets that take part in the needs/wants/savings split.
    pub const SPLIT: [Bucket; 3] = [Bucket::Needs, Bucket::Wants, Bucket::Savings];

    pub fn is_split(self) -> bool {
        matches!(self, Bucket::Needs | Bucket::Wants | Bucket::Savings)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Needs => "needs",
            Bucket::Wants => "wants",
            Bucket::Savings => "savings",
            Bucket::Income => "income",
            Bucket::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "needs" | "need" | "flexible need" => Ok(Bucket::Needs),
            "wants" | "want" => Ok(Bucket::Wants),
            "savings" | "saving" => Ok(Bucket::Savings),
            "income" => Ok(Bucket::Income),
            "uncategorized" | "unknown" => Ok(Bucket::Uncategorized),
            other => Err(format!("Unknown bucket: '{other}'")),
        }
    }
}

/// How often a charge is expected to come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Recurrence {
    Subscription,
    Recurring,
    #[serde(rename = "One-time")]
    OneTime,
    #[default]
    Unknown,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Subscription => "Subscription",
            Recurrence::Recurring => "Recurring",
            Recurrence::OneTime => "One-time",
            Recurrence::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "subscription" => Ok(Recurrence::Subscription),
            "recurring" => Ok(Recurrence::Recurring),
            "onetime" => Ok(Recurrence::OneTime),
            "unknown" => Ok(Recurrence::Unknown),
            _ => Err(format!("Unknown recurrence: '{}'", s.trim())),
        }
    }
}

/// A transaction after rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub transaction: Transaction,
    pub category: String,
    pub bucket: Bucket,
    /// False when a sweep rule matched; the row stays visible but is left out of totals.
    pub included: bool,
    pub rule_id: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl CategorizedTransaction {
    pub fn uncategorized(transaction: Transaction) -> Self {
        CategorizedTransaction {
            transaction,
            category: UNCATEGORIZED.to_string(),
            bucket: Bucket::Uncategorized,
            included: true,
            rule_id: None,
            recurrence: Recurrence::Unknown,
        }
    }

    pub fn is_swept(&self) -> bool {
        !self.included
    }

    pub fn amount(&self) -> Money {
        self.transaction.amount
    }
}
