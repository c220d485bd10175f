//! Plain-text rendering of a run for the terminal.

use budgetsplit_core::Bucket;
use std::fmt::Write;

use crate::pipeline::{RunResult, SyncOutcome};

const WIDTH: usize = 72;

fn separator() -> String {
    "─".repeat(WIDTH)
}

/// Truncate to `max` chars, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        ".".repeat(max)
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}

/// How many categories the month-by-month table shows.
const TREND_ROWS: usize = 5;

pub fn render(run: &RunResult) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, run)?;
    Ok(out)
}

fn write_report(out: &mut String, run: &RunResult) -> std::fmt::Result {
    writeln!(out, "Imported {} transactions from {} file(s)", run.transactions.len(), run.files.len())?;
    for file in &run.files {
        let name = file
            .path
            .file_name()
            .map_or_else(|| file.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        writeln!(
            out,
            "  {name}: {} ({:.2}), {} rows, {} warning(s)",
            file.format.info().name,
            file.confidence,
            file.rows,
            file.warnings.len()
        )?;
        for w in &file.warnings {
            writeln!(out, "    line {}: {}", w.line, w.reason)?;
        }
    }
    if let Some(period) = run.period {
        writeln!(out, "Period: {period} ({} days)", period.days())?;
    }

    let s = &run.summary;
    writeln!(out)?;
    writeln!(
        out,
        "{:<10} {:>12} {:>8} {:>8} {:>12} {:>12}",
        "Bucket", "Spent", "Share", "Target", "Target $", "Variance"
    )?;
    writeln!(out, "{}", separator())?;
    for line in s.buckets.values() {
        writeln!(
            out,
            "{:<10} {:>12} {:>7}% {:>7}% {:>12} {:>12}",
            capitalize(line.bucket),
            line.total.to_string(),
            line.share_pct,
            line.target_pct,
            line.target_amount.to_string(),
            line.variance.to_string()
        )?;
    }
    writeln!(out, "{}", separator())?;
    writeln!(out, "{:<10} {:>12}", "Split", s.split_total.to_string())?;
    writeln!(out, "{:<10} {:>12}", "Income", s.income.to_string())?;
    writeln!(
        out,
        "{:<10} {:>12}  ({} transactions)",
        "Unsorted",
        s.uncategorized_total.to_string(),
        s.uncategorized_count
    )?;
    if s.swept_count > 0 {
        writeln!(out, "{} transaction(s) swept out of the totals", s.swept_count)?;
    }

    if !run.categories.is_empty() {
        writeln!(out)?;
        writeln!(out, "Spending by category")?;
        for c in &run.categories {
            writeln!(
                out,
                "  {:<28} {:>12} {:>7}%  x{}",
                truncate(&c.category, 28),
                c.total.to_string(),
                c.percentage,
                c.count
            )?;
        }
    }

    if !run.merchants.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top merchants")?;
        for m in &run.merchants {
            writeln!(out, "  {:<40} {:>12}  x{}", truncate(&m.merchant, 40), m.total.to_string(), m.count)?;
        }
    }

    if run.accounts.len() > 1 {
        writeln!(out)?;
        writeln!(out, "By account")?;
        for a in &run.accounts {
            writeln!(
                out,
                "  {:<28} {:>12} spent {:>7}%  {:>12} in",
                truncate(&a.account, 28),
                a.spent.to_string(),
                a.percentage,
                a.income.to_string()
            )?;
        }
    }

    let trends = &run.category_trends;
    if trends.months.len() > 1 {
        writeln!(out)?;
        write!(out, "  {:<20}", "Category by month")?;
        for month in &trends.months {
            write!(out, " {month:>10}")?;
        }
        writeln!(out)?;
        for c in trends.categories.iter().take(TREND_ROWS) {
            write!(out, "  {:<20}", truncate(&c.category, 20))?;
            for v in &c.values {
                write!(out, " {:>10}", v.to_string())?;
            }
            writeln!(out)?;
        }
    }

    if !run.recurring.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recurring charges")?;
        for r in &run.recurring {
            writeln!(
                out,
                "  {:<40} {:>10}  x{} every ~{} days",
                truncate(&r.merchant, 40),
                r.amount.to_string(),
                r.frequency,
                r.average_interval_days
            )?;
        }
    }

    if run.stats.count > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "Expenses: {} totalling {}, mean {}, median {}, largest {}",
            run.stats.count, run.stats.total, run.stats.mean, run.stats.median, run.stats.max
        )?;
        let v = &run.velocity;
        writeln!(
            out,
            "Pace: {} a day, {} a week, {} a month",
            v.daily_avg, v.weekly_avg, v.monthly_avg
        )?;
        if let Some(day) = v.highest_day {
            writeln!(out, "Heaviest day: {day} ({})", v.highest_day_total)?;
        }
        for (recurrence, total) in &run.by_recurrence {
            writeln!(out, "  {:<14} {:>12}", recurrence.as_str(), total.to_string())?;
        }
    }

    if !run.budgets.is_empty() {
        writeln!(out)?;
        writeln!(out, "Suggested monthly budgets")?;
        for b in &run.budgets {
            writeln!(
                out,
                "  {:<28} {:>12}  (avg {})",
                truncate(&b.category, 28),
                b.recommended.to_string(),
                b.monthly_average
            )?;
        }
    }

    if !run.insights.is_empty() {
        writeln!(out)?;
        writeln!(out, "Insights")?;
        for i in &run.insights {
            writeln!(out, "  {}: {}", i.title, i.message)?;
        }
    }

    match &run.sync {
        Some(SyncOutcome::Pushed(report)) => {
            writeln!(out)?;
            writeln!(out, "Synced {} rows to {}", report.rows_sent, report.destination)?;
        }
        Some(SyncOutcome::Failed { error }) => {
            writeln!(out)?;
            writeln!(out, "Sync failed: {error} (local results above are complete)")?;
        }
        None => {}
    }
    Ok(())
}

fn capitalize(bucket: Bucket) -> String {
    let s = bucket.as_str();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
