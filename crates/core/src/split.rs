use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transaction::Bucket;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("Split percentages must add up to 100, got {0}")]
    BadTotal(Decimal),
    #[error("Split percentage for {0} is negative")]
    Negative(Bucket),
}

/// Target needs/wants/savings percentages. Defaults to 50/30/20.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            needs: Decimal::from(50),
            wants: Decimal::from(30),
            savings: Decimal::from(20),
        }
    }
}

impl SplitConfig {
    pub fn new(needs: Decimal, wants: Decimal, savings: Decimal) -> Result<Self, SplitError> {
        let split = SplitConfig { needs, wants, savings };
        split.validate()?;
        Ok(split)
    }

    pub fn validate(&self) -> Result<(), SplitError> {
        for bucket in Bucket::SPLIT {
            if self.target(bucket) < Decimal::ZERO {
                return Err(SplitError::Negative(bucket));
            }
        }
        let total = self.needs + self.wants + self.savings;
        if total != Decimal::ONE_HUNDRED {
            return Err(SplitError::BadTotal(total));
        }
        Ok(())
    }

    /// Target percentage for a split bucket; zero for income and uncategorized.
    pub fn target(&self, bucket: Bucket) -> Decimal {
        match bucket {
            Bucket::Needs => self.needs,
            Bucket::Wants => self.wants,
            Bucket::Savings => self.savings,
            Bucket::Income | Bucket::Uncategorized => Decimal::ZERO,
        }
    }
}
