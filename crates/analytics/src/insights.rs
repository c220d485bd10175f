//! Short written observations about a run and per-category budget suggestions.

use budgetsplit_core::{CategorizedTransaction, Money};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::spending::{
    category_breakdown, detect_recurring, monthly_trends, top_merchants, DEFAULT_MIN_OCCURRENCES,
};

/// Expenses above this many dollars are called out.
pub const LARGE_TRANSACTION: i64 = 500;

/// Headroom added on top of the monthly average, in percent.
pub const BUDGET_HEADROOM_PCT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Info,
    Summary,
    Savings,
    Category,
    Alert,
    Recurring,
    Trend,
    Merchant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, title: &str, message: String) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRecommendation {
    pub category: String,
    pub monthly_average: Money,
    pub recommended: Money,
}

fn one_dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Observations over the included rows, in a fixed order: overall spend,
/// savings rate, top category, large charges, recurring charges,
/// month-over-month change and top merchant. Each one only appears when
/// there is data behind it.
pub fn generate_insights(txs: &[CategorizedTransaction]) -> Vec<Insight> {
    let included: Vec<&CategorizedTransaction> = txs.iter().filter(|ct| ct.included).collect();
    if included.is_empty() {
        return vec![Insight::new(
            InsightKind::Info,
            "Nothing to analyze",
            "No transactions to analyze yet. Import a bank export to get started.".to_string(),
        )];
    }

    let mut insights = Vec::new();
    let expenses: Vec<Money> = included
        .iter()
        .map(|ct| ct.amount())
        .filter(|a| a.is_negative())
        .map(Money::abs)
        .collect();
    let spent: Money = expenses.iter().sum();
    let income: Money = included
        .iter()
        .map(|ct| ct.amount())
        .filter(|a| a.is_positive())
        .sum();

    if !expenses.is_empty() {
        let avg = Money::from_decimal(spent.as_decimal() / Decimal::from(expenses.len()));
        insights.push(Insight::new(
            InsightKind::Summary,
            "Overall spending",
            format!(
                "You spent {spent} across {} transactions. Average transaction: {avg}",
                expenses.len()
            ),
        ));
    }

    if income.is_positive() {
        let rate = one_dp(
            (income.as_decimal() - spent.as_decimal()) / income.as_decimal()
                * Decimal::ONE_HUNDRED,
        );
        let verdict = if rate > Decimal::from(20) {
            "Great job!"
        } else if rate > Decimal::from(10) {
            "Keep it up!"
        } else {
            "Consider reducing expenses."
        };
        insights.push(Insight::new(
            InsightKind::Savings,
            "Savings rate",
            format!("Your savings rate is {rate}%. {verdict}"),
        ));
    }

    if let Some(top) = category_breakdown(txs).first() {
        insights.push(Insight::new(
            InsightKind::Category,
            "Top spending category",
            format!(
                "{}: {} ({}% of total spending)",
                top.category, top.total, top.percentage
            ),
        ));
    }

    let threshold = Money::from_decimal(Decimal::from(LARGE_TRANSACTION));
    let large: Vec<Money> = expenses.iter().copied().filter(|a| *a > threshold).collect();
    if !large.is_empty() {
        let total: Money = large.iter().sum();
        insights.push(Insight::new(
            InsightKind::Alert,
            "Large transactions",
            format!(
                "You have {} transactions over {threshold}. Total: {total}",
                large.len()
            ),
        ));
    }

    let recurring = detect_recurring(txs, DEFAULT_MIN_OCCURRENCES);
    if !recurring.is_empty() {
        let total: Money = recurring
            .iter()
            .map(|r| Money::from_decimal(r.amount.as_decimal() * Decimal::from(r.frequency)))
            .sum();
        insights.push(Insight::new(
            InsightKind::Recurring,
            "Recurring transactions",
            format!(
                "Detected {} recurring charges totaling {total}",
                recurring.len()
            ),
        ));
    }

    let months = monthly_trends(txs);
    if let [.., previous, latest] = months.as_slice() {
        let change = if previous.spent.is_zero() {
            Decimal::ZERO
        } else {
            one_dp(
                (latest.spent.as_decimal() - previous.spent.as_decimal())
                    / previous.spent.as_decimal()
                    * Decimal::ONE_HUNDRED,
            )
        };
        let direction = if change > Decimal::ZERO {
            "increased"
        } else {
            "decreased"
        };
        insights.push(Insight::new(
            InsightKind::Trend,
            "Monthly trend",
            format!(
                "Spending in {} {direction} by {}% compared to {}",
                latest.month,
                change.abs(),
                previous.month
            ),
        ));
    }

    if let Some(top) = top_merchants(txs, 1).first() {
        insights.push(Insight::new(
            InsightKind::Merchant,
            "Top merchant",
            format!("{}: {} ({} transactions)", top.merchant, top.total, top.count),
        ));
    }

    tracing::debug!(count = insights.len(), "generated insights");
    insights
}

/// A monthly budget per category: the average monthly spend plus
/// [`BUDGET_HEADROOM_PCT`] percent. Months are counted over the whole run,
/// so a category seen in one month of three averages over three.
pub fn budget_recommendations(txs: &[CategorizedTransaction]) -> Vec<BudgetRecommendation> {
    let months = Decimal::from(monthly_trends(txs).len().max(1));
    let factor = Decimal::ONE + Decimal::from(BUDGET_HEADROOM_PCT) / Decimal::ONE_HUNDRED;

    category_breakdown(txs)
        .into_iter()
        .map(|c| {
            let avg = c.total.as_decimal() / months;
            BudgetRecommendation {
                category: c.category,
                monthly_average: Money::from_decimal(avg),
                recommended: Money::from_decimal(avg * factor),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetsplit_core::{Bucket, Recurrence, Transaction};
    use chrono::NaiveDate;

    fn make_ct(date: (i32, u32, u32), desc: &str, cents: i64, category: &str) -> CategorizedTransaction {
        CategorizedTransaction {
            transaction: Transaction::new(
                NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                desc,
                Money::from_cents(cents),
                "Test",
            ),
            category: category.to_string(),
            bucket: Bucket::Wants,
            included: true,
            rule_id: None,
            recurrence: Recurrence::Unknown,
        }
    }

    fn sample() -> Vec<CategorizedTransaction> {
        vec![
            make_ct((2024, 1, 2), "RENT", -120_000, "Rent"),
            make_ct((2024, 1, 3), "NETFLIX.COM", -1_599, "Streaming"),
            make_ct((2024, 1, 15), "ACME PAYROLL", 300_000, "Income"),
            make_ct((2024, 2, 3), "NETFLIX.COM", -1_599, "Streaming"),
            make_ct((2024, 2, 10), "WHOLE FOODS", -20_000, "Groceries"),
            make_ct((2024, 3, 3), "NETFLIX.COM", -1_599, "Streaming"),
        ]
    }

    fn find(insights: &[Insight], kind: InsightKind) -> Option<&Insight> {
        insights.iter().find(|i| i.kind == kind)
    }

    #[test]
    fn empty_run_gets_a_single_info_line() {
        let out = generate_insights(&[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, InsightKind::Info);
    }

    #[test]
    fn insights_cover_every_kind_with_data() {
        let out = generate_insights(&sample());
        let kinds: Vec<InsightKind> = out.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::Summary,
                InsightKind::Savings,
                InsightKind::Category,
                InsightKind::Alert,
                InsightKind::Recurring,
                InsightKind::Trend,
                InsightKind::Merchant,
            ]
        );
    }

    #[test]
    fn savings_rate_and_verdict() {
        // 3000 in, 1447.97 out.
        let out = generate_insights(&sample());
        let savings = find(&out, InsightKind::Savings).unwrap();
        assert_eq!(savings.message, "Your savings rate is 51.7%. Great job!");
    }

    #[test]
    fn large_transactions_over_threshold() {
        let out = generate_insights(&sample());
        let alert = find(&out, InsightKind::Alert).unwrap();
        assert_eq!(alert.message, "You have 1 transactions over $500.00. Total: $1200.00");
    }

    #[test]
    fn month_over_month_change() {
        // February 215.99, March 15.99.
        let out = generate_insights(&sample());
        let trend = find(&out, InsightKind::Trend).unwrap();
        assert_eq!(
            trend.message,
            "Spending in 2024-03 decreased by 92.6% compared to 2024-02"
        );
    }

    #[test]
    fn swept_rows_are_ignored() {
        let mut txs = sample();
        txs[0].included = false;
        let out = generate_insights(&txs);
        assert!(find(&out, InsightKind::Alert).is_none());
    }

    #[test]
    fn recommendations_add_headroom_to_monthly_average() {
        let recs = budget_recommendations(&sample());
        assert_eq!(recs[0].category, "Rent");
        // 1200 over three months is 400, plus ten percent.
        assert_eq!(recs[0].monthly_average, Money::from_cents(40_000));
        assert_eq!(recs[0].recommended, Money::from_cents(44_000));

        let streaming = recs.iter().find(|r| r.category == "Streaming").unwrap();
        assert_eq!(streaming.monthly_average, Money::from_cents(1_599));
        assert_eq!(streaming.recommended, Money::from_cents(1_759));
    }

    #[test]
    fn recommendations_empty_without_expenses() {
        assert!(budget_recommendations(&[]).is_empty());
    }
}
