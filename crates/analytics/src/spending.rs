//! Spending breakdowns over categorized transactions.
//!
//! Every function here only looks at included rows; swept transactions are
//! left out the same way they are from the allocation.

use budgetsplit_core::{Bucket, CategorizedTransaction, Money, Recurrence};
use budgetsplit_import::util::merchant_key;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Occurrences needed before a charge counts as recurring.
pub const DEFAULT_MIN_OCCURRENCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub bucket: Bucket,
    pub total: Money,
    pub count: usize,
    pub average: Money,
    /// Share of all expense spending.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantSpend {
    pub merchant: String,
    pub total: Money,
    pub count: usize,
    pub average: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTrend {
    /// `YYYY-MM`
    pub month: String,
    pub spent: Money,
    pub income: Money,
    pub net: Money,
    pub count: usize,
    pub by_bucket: BTreeMap<Bucket, Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringCharge {
    pub merchant: String,
    pub amount: Money,
    pub frequency: usize,
    pub category: String,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    /// Mean days between occurrences.
    pub average_interval_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingStats {
    pub count: usize,
    pub total: Money,
    pub mean: Money,
    pub median: Money,
    pub min: Money,
    pub max: Money,
}

/// Inflow and outflow per source account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSpend {
    pub account: String,
    pub spent: Money,
    pub income: Money,
    pub count: usize,
    /// Share of all expense spending.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    /// One value per entry of [`CategoryTrends::months`], zero where nothing was spent.
    pub values: Vec<Money>,
    pub total: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTrends {
    /// Every `YYYY-MM` with expenses, oldest first.
    pub months: Vec<String>,
    pub categories: Vec<CategoryTrend>,
}

/// How fast money goes out over the span of the expenses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingVelocity {
    pub daily_avg: Money,
    pub weekly_avg: Money,
    pub monthly_avg: Money,
    pub per_transaction_avg: Money,
    pub highest_day: Option<NaiveDate>,
    pub highest_day_total: Money,
}

fn included(txs: &[CategorizedTransaction]) -> impl Iterator<Item = &CategorizedTransaction> {
    txs.iter().filter(|ct| ct.included)
}

fn expenses(txs: &[CategorizedTransaction]) -> impl Iterator<Item = &CategorizedTransaction> {
    included(txs).filter(|ct| ct.transaction.is_expense())
}

fn percentage(part: Money, whole: Money) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part.as_decimal() / whole.as_decimal() * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn average(total: Money, count: usize) -> Money {
    if count == 0 {
        Money::zero()
    } else {
        Money::from_decimal(total.as_decimal() / Decimal::from(count))
    }
}

/// Expense totals per category, largest first.
pub fn category_breakdown(txs: &[CategorizedTransaction]) -> Vec<CategorySpend> {
    let mut by_category: HashMap<&str, (Bucket, Money, usize)> = HashMap::new();
    for ct in expenses(txs) {
        let entry = by_category
            .entry(ct.category.as_str())
            .or_insert((ct.bucket, Money::zero(), 0));
        entry.1 += ct.amount().abs();
        entry.2 += 1;
    }

    let grand_total: Money = by_category.values().map(|(_, total, _)| *total).sum();

    let mut out: Vec<CategorySpend> = by_category
        .into_iter()
        .map(|(category, (bucket, total, count))| CategorySpend {
            category: category.to_string(),
            bucket,
            total,
            count,
            average: average(total, count),
            percentage: percentage(total, grand_total),
        })
        .collect();

    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    out
}

/// The `n` merchants with the most expense spending. Store numbers and
/// reference codes are ignored when grouping; the first description seen
/// names the group.
pub fn top_merchants(txs: &[CategorizedTransaction], n: usize) -> Vec<MerchantSpend> {
    let mut by_key: HashMap<String, (String, Money, usize)> = HashMap::new();
    for ct in expenses(txs) {
        let entry = by_key
            .entry(merchant_key(&ct.transaction.description))
            .or_insert_with(|| (ct.transaction.description.clone(), Money::zero(), 0));
        entry.1 += ct.amount().abs();
        entry.2 += 1;
    }

    let mut out: Vec<MerchantSpend> = by_key
        .into_values()
        .map(|(merchant, total, count)| MerchantSpend {
            merchant,
            total,
            count,
            average: average(total, count),
        })
        .collect();

    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.merchant.cmp(&b.merchant)));
    out.truncate(n);
    out
}

/// Inflow and outflow per calendar month, oldest first.
pub fn monthly_trends(txs: &[CategorizedTransaction]) -> Vec<MonthTrend> {
    let mut months: BTreeMap<String, MonthTrend> = BTreeMap::new();
    for ct in included(txs) {
        let month = ct.transaction.month_key();
        let trend = months.entry(month.clone()).or_insert_with(|| MonthTrend {
            month,
            spent: Money::zero(),
            income: Money::zero(),
            net: Money::zero(),
            count: 0,
            by_bucket: BTreeMap::new(),
        });

        let amount = ct.amount();
        if amount.is_negative() {
            trend.spent += amount.abs();
        } else {
            trend.income += amount;
        }
        trend.net += amount;
        trend.count += 1;
        if ct.bucket.is_split() {
            *trend.by_bucket.entry(ct.bucket).or_default() += amount.abs();
        }
    }
    months.into_values().collect()
}

/// Charges repeating at the same amount from the same merchant at least
/// `min_occurrences` times, most frequent first.
pub fn detect_recurring(
    txs: &[CategorizedTransaction],
    min_occurrences: usize,
) -> Vec<RecurringCharge> {
    let mut groups: HashMap<(String, Money), Vec<&CategorizedTransaction>> = HashMap::new();
    for ct in expenses(txs) {
        groups
            .entry((merchant_key(&ct.transaction.description), ct.amount()))
            .or_default()
            .push(ct);
    }

    let mut out: Vec<RecurringCharge> = groups
        .into_values()
        .filter(|group| group.len() >= min_occurrences.max(2))
        .filter_map(|mut group| {
            group.sort_by_key(|ct| ct.transaction.date);
            let first = group.first()?;
            let last = group.last()?;
            let span = (last.transaction.date - first.transaction.date).num_days();
            Some(RecurringCharge {
                merchant: first.transaction.description.clone(),
                amount: first.amount().abs(),
                frequency: group.len(),
                category: first.category.clone(),
                first_seen: first.transaction.date,
                last_seen: last.transaction.date,
                average_interval_days: span / (group.len() as i64 - 1),
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| b.amount.cmp(&a.amount))
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    tracing::debug!(found = out.len(), "recurring charge scan");
    out
}

/// Spending and income per account, biggest spender first. Useful when one
/// run merges exports from several cards.
pub fn spending_by_account(txs: &[CategorizedTransaction]) -> Vec<AccountSpend> {
    let mut by_account: BTreeMap<&str, (Money, Money, usize)> = BTreeMap::new();
    for ct in included(txs) {
        let entry = by_account
            .entry(ct.transaction.account.as_str())
            .or_insert((Money::zero(), Money::zero(), 0));
        let amount = ct.amount();
        if amount.is_negative() {
            entry.0 += amount.abs();
        } else {
            entry.1 += amount;
        }
        entry.2 += 1;
    }

    let total_spent: Money = by_account.values().map(|(spent, _, _)| *spent).sum();
    let mut out: Vec<AccountSpend> = by_account
        .into_iter()
        .map(|(account, (spent, income, count))| AccountSpend {
            account: account.to_string(),
            spent,
            income,
            count,
            percentage: percentage(spent, total_spent),
        })
        .collect();
    out.sort_by(|a, b| b.spent.cmp(&a.spent).then_with(|| a.account.cmp(&b.account)));
    out
}

/// Expense per category per month, with every category padded to the same
/// set of months. Categories are ordered by total, largest first.
pub fn category_trends(txs: &[CategorizedTransaction]) -> CategoryTrends {
    let mut grid: BTreeMap<&str, BTreeMap<String, Money>> = BTreeMap::new();
    let mut months: Vec<String> = Vec::new();
    for ct in expenses(txs) {
        let month = ct.transaction.month_key();
        if !months.contains(&month) {
            months.push(month.clone());
        }
        *grid
            .entry(ct.category.as_str())
            .or_default()
            .entry(month)
            .or_default() += ct.amount().abs();
    }
    months.sort();

    let mut categories: Vec<CategoryTrend> = grid
        .into_iter()
        .map(|(category, per_month)| CategoryTrend {
            category: category.to_string(),
            values: months
                .iter()
                .map(|m| per_month.get(m).copied().unwrap_or_default())
                .collect(),
            total: per_month.values().copied().sum(),
        })
        .collect();
    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

    CategoryTrends { months, categories }
}

/// Average outflow per day, week and 30-day month over the days between the
/// first and last expense (at least one), plus the single heaviest day.
pub fn spending_velocity(txs: &[CategorizedTransaction]) -> SpendingVelocity {
    let mut daily: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    let mut count = 0usize;
    for ct in expenses(txs) {
        *daily.entry(ct.transaction.date).or_default() += ct.amount().abs();
        count += 1;
    }
    let (Some(first), Some(last)) = (daily.keys().next(), daily.keys().next_back()) else {
        return SpendingVelocity::default();
    };

    let days = (*last - *first).num_days().max(1);
    let total: Money = daily.values().copied().sum();
    let per_day = total.as_decimal() / Decimal::from(days);
    let (highest_day, highest_day_total) = daily
        .iter()
        .fold((*first, Money::zero()), |best, (date, spent)| {
            if *spent > best.1 {
                (*date, *spent)
            } else {
                best
            }
        });

    SpendingVelocity {
        daily_avg: Money::from_decimal(per_day),
        weekly_avg: Money::from_decimal(per_day * Decimal::from(7)),
        monthly_avg: Money::from_decimal(per_day * Decimal::from(30)),
        per_transaction_avg: average(total, count),
        highest_day: Some(highest_day),
        highest_day_total,
    }
}

/// Expense totals per recurrence tag. Untagged rows are left out.
pub fn spending_by_recurrence(txs: &[CategorizedTransaction]) -> BTreeMap<Recurrence, Money> {
    let mut out = BTreeMap::new();
    for ct in expenses(txs).filter(|ct| ct.recurrence != Recurrence::Unknown) {
        *out.entry(ct.recurrence).or_insert_with(Money::zero) += ct.amount().abs();
    }
    out
}

/// Count, total and spread of expense magnitudes.
pub fn spending_statistics(txs: &[CategorizedTransaction]) -> SpendingStats {
    let mut amounts: Vec<Money> = expenses(txs).map(|ct| ct.amount().abs()).collect();
    if amounts.is_empty() {
        return SpendingStats::default();
    }
    amounts.sort();

    let n = amounts.len();
    let total: Money = amounts.iter().sum();
    let median = if n % 2 == 0 {
        Money::from_decimal((amounts[n / 2 - 1].as_decimal() + amounts[n / 2].as_decimal()) / Decimal::TWO)
    } else {
        amounts[n / 2]
    };

    SpendingStats {
        count: n,
        total,
        mean: average(total, n),
        median,
        min: amounts[0],
        max: amounts[n - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetsplit_core::{Recurrence, Transaction};

    fn make_ct(date: (i32, u32, u32), desc: &str, cents: i64, category: &str, bucket: Bucket) -> CategorizedTransaction {
        let tx = Transaction::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            desc,
            Money::from_cents(cents),
            "Test",
        );
        CategorizedTransaction {
            transaction: tx,
            category: category.to_string(),
            bucket,
            included: true,
            rule_id: None,
            recurrence: Recurrence::Unknown,
        }
    }

    fn sample() -> Vec<CategorizedTransaction> {
        vec![
            make_ct((2024, 1, 3), "NETFLIX.COM", -1599, "Streaming", Bucket::Wants),
            make_ct((2024, 1, 5), "WHOLE FOODS #10", -8000, "Groceries", Bucket::Needs),
            make_ct((2024, 1, 15), "ACME PAYROLL", 300_000, "Income", Bucket::Income),
            make_ct((2024, 2, 3), "NETFLIX.COM", -1599, "Streaming", Bucket::Wants),
            make_ct((2024, 2, 9), "WHOLE FOODS #22", -4000, "Groceries", Bucket::Needs),
            make_ct((2024, 3, 3), "NETFLIX.COM", -1599, "Streaming", Bucket::Wants),
        ]
    }

    // ── category_breakdown ────────────────────────────────────────────────────

    #[test]
    fn breakdown_sorted_by_total() {
        let out = category_breakdown(&sample());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].category, "Groceries");
        assert_eq!(out[0].total, Money::from_cents(12_000));
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].average, Money::from_cents(6_000));
        assert_eq!(out[1].category, "Streaming");
        assert_eq!(out[1].total, Money::from_cents(4_797));
    }

    #[test]
    fn breakdown_skips_swept() {
        let mut txs = sample();
        for ct in txs.iter_mut().filter(|c| c.category == "Groceries") {
            ct.included = false;
        }
        let out = category_breakdown(&txs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].percentage, Decimal::ONE_HUNDRED);
    }

    // ── top_merchants ─────────────────────────────────────────────────────────

    #[test]
    fn merchants_group_across_store_numbers() {
        let out = top_merchants(&sample(), 10);
        assert_eq!(out[0].merchant, "WHOLE FOODS #10");
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].total, Money::from_cents(12_000));
        assert_eq!(out[1].merchant, "NETFLIX.COM");
    }

    #[test]
    fn merchants_truncated_to_n() {
        assert_eq!(top_merchants(&sample(), 1).len(), 1);
        assert!(top_merchants(&sample(), 0).is_empty());
    }

    // ── monthly_trends ────────────────────────────────────────────────────────

    #[test]
    fn trends_per_month() {
        let out = monthly_trends(&sample());
        let months: Vec<&str> = out.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

        let jan = &out[0];
        assert_eq!(jan.spent, Money::from_cents(9_599));
        assert_eq!(jan.income, Money::from_cents(300_000));
        assert_eq!(jan.net, Money::from_cents(290_401));
        assert_eq!(jan.count, 3);
        assert_eq!(jan.by_bucket[&Bucket::Needs], Money::from_cents(8_000));
        assert!(!jan.by_bucket.contains_key(&Bucket::Income));
    }

    // ── detect_recurring ──────────────────────────────────────────────────────

    #[test]
    fn monthly_subscription_is_recurring() {
        let out = detect_recurring(&sample(), DEFAULT_MIN_OCCURRENCES);
        assert_eq!(out.len(), 1);
        let netflix = &out[0];
        assert_eq!(netflix.merchant, "NETFLIX.COM");
        assert_eq!(netflix.amount, Money::from_cents(1_599));
        assert_eq!(netflix.frequency, 3);
        assert_eq!(netflix.first_seen, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(netflix.last_seen, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(netflix.average_interval_days, 30);
    }

    #[test]
    fn different_amounts_are_not_recurring() {
        // Whole Foods shows up twice at different amounts.
        let out = detect_recurring(&sample(), 2);
        assert!(out.iter().all(|r| !r.merchant.starts_with("WHOLE FOODS")));
    }

    // ── spending_by_account ───────────────────────────────────────────────────

    #[test]
    fn accounts_split_spend_and_income() {
        let mut txs = sample();
        txs[1].transaction.account = "Discover".into();
        txs[4].transaction.account = "Discover".into();
        let out = spending_by_account(&txs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].account, "Discover");
        assert_eq!(out[0].spent, Money::from_cents(12_000));
        assert_eq!(out[0].income, Money::zero());
        assert_eq!(out[1].account, "Test");
        assert_eq!(out[1].spent, Money::from_cents(4_797));
        assert_eq!(out[1].income, Money::from_cents(300_000));
        assert_eq!(out[1].count, 4);
        assert_eq!(out[0].percentage + out[1].percentage, Decimal::ONE_HUNDRED);
    }

    // ── category_trends ───────────────────────────────────────────────────────

    #[test]
    fn category_trends_pad_missing_months() {
        let t = category_trends(&sample());
        assert_eq!(t.months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(t.categories[0].category, "Groceries");
        assert_eq!(
            t.categories[0].values,
            vec![Money::from_cents(8_000), Money::from_cents(4_000), Money::zero()]
        );
        assert_eq!(t.categories[1].values, vec![Money::from_cents(1_599); 3]);
        assert_eq!(t.categories[1].total, Money::from_cents(4_797));
    }

    #[test]
    fn category_trends_empty() {
        assert_eq!(category_trends(&[]), CategoryTrends::default());
    }

    // ── spending_velocity ─────────────────────────────────────────────────────

    #[test]
    fn velocity_over_expense_span() {
        let txs = vec![
            make_ct((2024, 1, 1), "A", -1_000, "X", Bucket::Wants),
            make_ct((2024, 1, 1), "B", -500, "X", Bucket::Wants),
            make_ct((2024, 1, 11), "C", -2_500, "X", Bucket::Wants),
            make_ct((2024, 1, 20), "PAY", 100_000, "Income", Bucket::Income),
        ];
        let v = spending_velocity(&txs);
        // $40 over 10 days.
        assert_eq!(v.daily_avg, Money::from_cents(400));
        assert_eq!(v.weekly_avg, Money::from_cents(2_800));
        assert_eq!(v.monthly_avg, Money::from_cents(12_000));
        assert_eq!(v.per_transaction_avg, Money::from_cents(1_333));
        assert_eq!(v.highest_day, NaiveDate::from_ymd_opt(2024, 1, 11));
        assert_eq!(v.highest_day_total, Money::from_cents(2_500));
    }

    #[test]
    fn velocity_single_day_counts_as_one() {
        let txs = vec![make_ct((2024, 1, 1), "A", -700, "X", Bucket::Wants)];
        let v = spending_velocity(&txs);
        assert_eq!(v.daily_avg, Money::from_cents(700));
        assert_eq!(spending_velocity(&[]), SpendingVelocity::default());
    }

    // ── spending_by_recurrence ────────────────────────────────────────────────

    #[test]
    fn recurrence_totals_skip_untagged() {
        let mut txs = sample();
        for ct in txs.iter_mut().filter(|c| c.category == "Streaming") {
            ct.recurrence = Recurrence::Subscription;
        }
        let out = spending_by_recurrence(&txs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[&Recurrence::Subscription], Money::from_cents(4_797));
    }

    // ── spending_statistics ───────────────────────────────────────────────────

    #[test]
    fn statistics_over_expenses() {
        let s = spending_statistics(&sample());
        assert_eq!(s.count, 5);
        assert_eq!(s.total, Money::from_cents(16_797));
        assert_eq!(s.min, Money::from_cents(1_599));
        assert_eq!(s.max, Money::from_cents(8_000));
        assert_eq!(s.median, Money::from_cents(1_599));
    }

    #[test]
    fn statistics_even_count_median() {
        let txs = vec![
            make_ct((2024, 1, 1), "A", -100, "X", Bucket::Wants),
            make_ct((2024, 1, 2), "B", -300, "X", Bucket::Wants),
        ];
        let s = spending_statistics(&txs);
        assert_eq!(s.median, Money::from_cents(200));
        assert_eq!(s.mean, Money::from_cents(200));
    }

    #[test]
    fn statistics_empty() {
        assert_eq!(spending_statistics(&[]), SpendingStats::default());
    }
}
