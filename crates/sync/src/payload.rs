use budgetsplit_analytics::AllocationSummary;
use budgetsplit_core::{Bucket, CategorizedTransaction, Money, Recurrence};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One transaction row as written to the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub amount: Money,
    pub category: String,
    pub account: String,
    pub bucket: Bucket,
    pub recurrence: Recurrence,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub bucket: Bucket,
    pub total: Money,
    pub share_pct: Decimal,
    pub target_pct: Decimal,
    pub target_amount: Money,
    pub variance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPayload {
    pub sheet: String,
    pub rows: Vec<SheetRow>,
    pub summary: Vec<SummaryRow>,
    pub income: Money,
    pub uncategorized_total: Money,
}

impl SheetPayload {
    pub fn build(
        sheet: &str,
        transactions: &[CategorizedTransaction],
        summary: &AllocationSummary,
    ) -> Self {
        let rows = transactions
            .iter()
            .map(|ct| SheetRow {
                date: ct.transaction.date,
                post_date: ct.transaction.post_date,
                description: ct.transaction.description.clone(),
                amount: ct.transaction.amount,
                category: ct.category.clone(),
                account: ct.transaction.account.clone(),
                bucket: ct.bucket,
                recurrence: ct.recurrence,
                included: ct.included,
            })
            .collect();

        let summary_rows = summary
            .buckets
            .values()
            .map(|line| SummaryRow {
                bucket: line.bucket,
                total: line.total,
                share_pct: line.share_pct,
                target_pct: line.target_pct,
                target_amount: line.target_amount,
                variance: line.variance,
            })
            .collect();

        Self {
            sheet: sheet.to_string(),
            rows,
            summary: summary_rows,
            income: summary.income,
            uncategorized_total: summary.uncategorized_total,
        }
    }
}
