use anyhow::{Context, Result};
use budgetsplit_analytics::{
    allocate, budget_recommendations, category_breakdown, category_trends, detect_recurring,
    generate_insights, monthly_trends, spending_by_account, spending_by_recurrence,
    spending_statistics, spending_velocity, top_merchants, AccountSpend, AllocationSummary,
    BudgetRecommendation, CategorySpend, CategoryTrends, Insight, MerchantSpend, MonthTrend,
    RecurringCharge, SpendingStats, SpendingVelocity, DEFAULT_MIN_OCCURRENCES,
};
use budgetsplit_core::{CategorizedTransaction, DateRange, Money, Recurrence, SplitConfig, Transaction};
use std::collections::BTreeMap;
use budgetsplit_import::{csv, BankFormat, RowWarning, RuleEngine};
use budgetsplit_sync::{SheetPayload, SheetSink, SyncReport};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What one input file contributed.
#[derive(Debug, Clone, Serialize)]
pub struct FileImport {
    pub path: PathBuf,
    pub format: BankFormat,
    pub confidence: f32,
    pub rows: usize,
    pub warnings: Vec<RowWarning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Pushed(SyncReport),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub files: Vec<FileImport>,
    /// First to last transaction date; absent when nothing was imported.
    pub period: Option<DateRange>,
    pub transactions: Vec<CategorizedTransaction>,
    pub summary: AllocationSummary,
    pub categories: Vec<CategorySpend>,
    pub merchants: Vec<MerchantSpend>,
    pub months: Vec<MonthTrend>,
    pub category_trends: CategoryTrends,
    pub accounts: Vec<AccountSpend>,
    pub recurring: Vec<RecurringCharge>,
    pub by_recurrence: BTreeMap<Recurrence, Money>,
    pub stats: SpendingStats,
    pub velocity: SpendingVelocity,
    pub insights: Vec<Insight>,
    pub budgets: Vec<BudgetRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

pub struct PipelineOptions<'a> {
    pub format: Option<BankFormat>,
    pub account: Option<&'a str>,
    pub split: SplitConfig,
    pub top_merchants: usize,
}

fn import_one(path: &Path, opts: &PipelineOptions<'_>) -> Result<(FileImport, Vec<Transaction>)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let batch = csv::import_bytes(&bytes, opts.format, opts.account)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        format = %batch.format,
        rows = batch.transactions.len(),
        "imported file"
    );
    let file = FileImport {
        path: path.to_path_buf(),
        format: batch.format,
        confidence: batch.confidence,
        rows: batch.transactions.len(),
        warnings: batch.warnings,
    };
    Ok((file, batch.transactions))
}

/// Detect, normalize, categorize and allocate every file in one pass.
///
/// Any file that can't be read or recognized fails the whole run before
/// categorization starts.
pub fn run_pipeline(
    files: &[PathBuf],
    engine: &RuleEngine,
    opts: &PipelineOptions<'_>,
) -> Result<RunResult> {
    let mut imports = Vec::with_capacity(files.len());
    let mut transactions = Vec::new();
    for path in files {
        let (file, rows) = import_one(path, opts)?;
        imports.push(file);
        transactions.extend(rows);
    }
    transactions.sort_by_key(|t| t.date);

    let categorized = engine.categorize_all(&transactions);
    let summary = allocate(&categorized, &opts.split);

    Ok(RunResult {
        files: imports,
        period: DateRange::spanning(transactions.iter().map(|t| t.date)),
        categories: category_breakdown(&categorized),
        merchants: top_merchants(&categorized, opts.top_merchants),
        months: monthly_trends(&categorized),
        category_trends: category_trends(&categorized),
        accounts: spending_by_account(&categorized),
        recurring: detect_recurring(&categorized, DEFAULT_MIN_OCCURRENCES),
        by_recurrence: spending_by_recurrence(&categorized),
        stats: spending_statistics(&categorized),
        velocity: spending_velocity(&categorized),
        insights: generate_insights(&categorized),
        budgets: budget_recommendations(&categorized),
        transactions: categorized,
        summary,
        sync: None,
    })
}

/// Push a finished run. Failures are logged and returned as an outcome so
/// the local results still stand.
pub async fn publish<S: SheetSink>(sink: &S, sheet: &str, run: &RunResult) -> SyncOutcome {
    let payload = SheetPayload::build(sheet, &run.transactions, &run.summary);
    match sink.push(&payload).await {
        Ok(report) => SyncOutcome::Pushed(report),
        Err(e) => {
            tracing::error!(error = %e, "sheet sync failed");
            SyncOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}
