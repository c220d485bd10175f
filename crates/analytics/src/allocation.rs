//! Needs/wants/savings allocation over categorized transactions.

use budgetsplit_core::{Bucket, CategorizedTransaction, Money, SplitConfig};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// One split bucket's line in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketLine {
    pub bucket: Bucket,
    /// Sum of amount magnitudes.
    pub total: Money,
    pub count: usize,
    /// Share of the split total; the three shares sum to exactly 100.
    pub share_pct: Decimal,
    pub target_pct: Decimal,
    /// `target_pct` of income.
    pub target_amount: Money,
    pub pct_of_income: Decimal,
    /// `target_amount - total`; negative means over target.
    pub variance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub buckets: BTreeMap<Bucket, BucketLine>,
    pub split: SplitConfig,
    pub income: Money,
    /// Total of the needs, wants and savings buckets.
    pub split_total: Money,
    pub uncategorized_total: Money,
    pub uncategorized_count: usize,
    pub swept_count: usize,
    /// Every transaction given to [`allocate`], swept ones included.
    pub transaction_count: usize,
}

impl AllocationSummary {
    pub fn line(&self, bucket: Bucket) -> Option<&BucketLine> {
        self.buckets.get(&bucket)
    }

    pub fn share_total(&self) -> Decimal {
        self.buckets.values().map(|l| l.share_pct).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.split_total.is_zero() && self.income.is_zero() && self.uncategorized_total.is_zero()
    }
}

fn pct_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part / whole * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Apportion 100.00 across `totals` by the largest-remainder method in
/// hundredths of a percent. Ties on remainder go to the earlier entry.
fn largest_remainder(totals: &[Decimal]) -> Vec<Decimal> {
    let whole: Decimal = totals.iter().copied().sum();
    if whole.is_zero() {
        return vec![Decimal::ZERO; totals.len()];
    }

    let scale = Decimal::from(10_000);
    let raw: Vec<Decimal> = totals.iter().map(|t| *t / whole * scale).collect();
    let mut units: Vec<Decimal> = raw.iter().map(|r| r.floor()).collect();

    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| (raw[b] - units[b]).cmp(&(raw[a] - units[a])).then(a.cmp(&b)));

    let mut deficit = scale - units.iter().copied().sum::<Decimal>();
    for &i in order.iter().cycle() {
        if deficit <= Decimal::ZERO {
            break;
        }
        units[i] += Decimal::ONE;
        deficit -= Decimal::ONE;
    }

    units
        .into_iter()
        .map(|u| u / Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(2))
        .collect()
}

/// Summarize categorized transactions against a split.
///
/// Swept rows are only counted. Income and uncategorized rows are reported
/// on their own and never enter the split. Totals use amount magnitudes so
/// refunds inside a bucket add to it rather than cancel it.
pub fn allocate(transactions: &[CategorizedTransaction], split: &SplitConfig) -> AllocationSummary {
    let mut totals: BTreeMap<Bucket, (Money, usize)> = Bucket::SPLIT
        .iter()
        .map(|b| (*b, (Money::zero(), 0)))
        .collect();
    let mut income = Money::zero();
    let mut uncategorized_total = Money::zero();
    let mut uncategorized_count = 0;
    let mut swept_count = 0;

    for ct in transactions {
        if ct.is_swept() {
            swept_count += 1;
            continue;
        }
        let magnitude = ct.amount().abs();
        match ct.bucket {
            Bucket::Income => income += magnitude,
            Bucket::Uncategorized => {
                uncategorized_total += magnitude;
                uncategorized_count += 1;
            }
            bucket => {
                let entry = totals.entry(bucket).or_insert((Money::zero(), 0));
                entry.0 += magnitude;
                entry.1 += 1;
            }
        }
    }

    let split_total: Money = totals.values().map(|(m, _)| *m).sum();
    let shares = largest_remainder(
        &Bucket::SPLIT
            .iter()
            .map(|b| totals.get(b).map_or(Decimal::ZERO, |(m, _)| m.as_decimal()))
            .collect::<Vec<_>>(),
    );

    let buckets = Bucket::SPLIT
        .iter()
        .zip(shares)
        .map(|(&bucket, share_pct)| {
            let (total, count) = totals.get(&bucket).copied().unwrap_or_default();
            let target_pct = split.target(bucket);
            let target_amount =
                Money::from_decimal(income.as_decimal() * target_pct / Decimal::ONE_HUNDRED);
            let line = BucketLine {
                bucket,
                total,
                count,
                share_pct,
                target_pct,
                target_amount,
                pct_of_income: pct_of(total.as_decimal(), income.as_decimal()),
                variance: target_amount - total,
            };
            (bucket, line)
        })
        .collect();

    tracing::info!(
        %income,
        %split_total,
        %uncategorized_total,
        swept_count,
        "allocated transactions"
    );

    AllocationSummary {
        buckets,
        split: *split,
        income,
        split_total,
        uncategorized_total,
        uncategorized_count,
        swept_count,
        transaction_count: transactions.len(),
    }
}
