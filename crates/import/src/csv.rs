use budgetsplit_core::{Money, Transaction};
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::detect::{self, BankFormat, DetectError, HeaderMatch};

/// Largest absolute amount accepted on a row, in dollars. Anything bigger is
/// a garbled cell, and summing such values could overflow a decimal.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("Missing required column for {format}: {column}")]
    MissingColumn { format: BankFormat, column: String },
}

/// A row that was skipped, or read only after repairing its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    /// One-based line number in the source file.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedBatch {
    pub format: BankFormat,
    pub confidence: f32,
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<RowWarning>,
}

/// Where each field lives for a given export, by header name. The first
/// candidate present in the header wins.
struct ColumnLayout {
    date: &'static [&'static str],
    post_date: &'static [&'static str],
    description: &'static [&'static str],
    amount: &'static [&'static str],
    kind: &'static [&'static str],
    category: &'static [&'static str],
    memo: &'static [&'static str],
    /// Card exports list charges as positive numbers.
    flip_sign: bool,
}

fn layout(format: BankFormat) -> ColumnLayout {
    match format {
        BankFormat::ChaseCredit => ColumnLayout {
            date: &["Transaction Date", "Date", "Post Date"],
            post_date: &["Post Date"],
            description: &["Description", "Merchant", "Payee", "Name"],
            amount: &["Amount", "Transaction Amount"],
            kind: &["Type"],
            category: &["Category"],
            memo: &["Memo"],
            flip_sign: false,
        },
        BankFormat::ChaseDebit => ColumnLayout {
            date: &["Posting Date", "Transaction Date", "Date"],
            post_date: &["Posting Date"],
            description: &["Description", "Merchant", "Payee", "Name"],
            amount: &["Amount", "Transaction Amount"],
            kind: &["Type", "Details"],
            category: &[],
            memo: &[],
            flip_sign: false,
        },
        BankFormat::Discover => ColumnLayout {
            date: &["Trans. Date", "Transaction Date", "Trans Date", "Date"],
            post_date: &["Post Date", "Posted Date", "Posting Date"],
            description: &["Description", "Merchant", "Name", "Payee"],
            amount: &["Amount", "Transaction Amount", "Charge"],
            kind: &[],
            category: &["Category", "Transaction Type"],
            memo: &[],
            flip_sign: true,
        },
        BankFormat::Amex => ColumnLayout {
            date: &["Date"],
            post_date: &[],
            description: &["Description", "Appears On Your Statement As"],
            amount: &["Amount"],
            kind: &[],
            category: &["Category"],
            memo: &["Extended Details"],
            flip_sign: true,
        },
    }
}

struct ColumnIndex {
    date: usize,
    post_date: Option<usize>,
    description: usize,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
    memo: Option<usize>,
}

fn find(columns: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| columns.iter().position(|col| col == c))
}

fn resolve(format: BankFormat, columns: &[String]) -> Result<ColumnIndex, CsvError> {
    let l = layout(format);
    let required = |candidates: &[&str], name: &str| {
        find(columns, candidates).ok_or_else(|| CsvError::MissingColumn {
            format,
            column: name.to_string(),
        })
    };
    Ok(ColumnIndex {
        date: required(l.date, "date")?,
        post_date: find(columns, l.post_date),
        description: required(l.description, "description")?,
        amount: required(l.amount, "amount")?,
        kind: find(columns, l.kind),
        category: find(columns, l.category),
        memo: find(columns, l.memo),
    })
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    for fmt in &["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    Err(format!("invalid date '{s}'"))
}

pub(crate) fn parse_amount(s: &str) -> Result<Money, String> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let mut dec =
        Decimal::from_str(&cleaned).map_err(|_| format!("invalid amount '{}'", s.trim()))?;
    if dec.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(format!("amount '{}' out of range", s.trim()));
    }
    if negative {
        dec = -dec;
    }
    Ok(Money::from_decimal(dec))
}

/// Normalized category for a Discover category label.
pub fn discover_category(raw: &str) -> String {
    let mapped = match raw.trim().to_lowercase().as_str() {
        "travel/ entertainment" | "travel/entertainment" => "Entertainment",
        "merchandise" | "department stores" | "warehouse clubs" => "Shopping",
        "restaurants" => "Food & Dining",
        "supermarkets" => "Groceries",
        "gasoline" => "Gas & Fuel",
        "services" => "Services",
        "payments and credits" => "Payment",
        "awards and rebate credits" => "Rewards",
        "government services" => "Government",
        "education" => "Education",
        "medical services" => "Healthcare",
        "automotive" => "Auto & Transport",
        "home improvement" => "Home",
        "utilities" | "internet" | "cable/satellite" => "Bills & Utilities",
        _ => return raw.trim().to_string(),
    };
    mapped.to_string()
}

fn discover_kind(raw_category: &str, amount: Money) -> &'static str {
    let lower = raw_category.to_lowercase();
    if lower.contains("payment") {
        "Payment"
    } else if lower.contains("credit") || lower.contains("rebate") {
        "Credit"
    } else if amount.is_positive() {
        "Refund"
    } else {
        "Purchase"
    }
}

/// Category implied by a Chase checking `Type`, refined by description keywords.
pub fn chase_debit_category(kind: &str, description: &str) -> String {
    let base = match kind.trim() {
        "ACH_CREDIT" | "CHECK_DEPOSIT" => "Income",
        "ACH_DEBIT" | "CHECK_PAID" => "Bills & Utilities",
        "LOAN_PMT" => "Debt Payment",
        "PARTNERFI_TO_CHASE" | "QUICKPAY_CREDIT" | "QUICKPAY_DEBIT" => "Transfer",
        "DEBIT_CARD" => "Shopping",
        "ATMSURCHARGE" | "FEE_TRANSACTION" => "Fees",
        "ATM" => "Cash & ATM",
        "MISC_CREDIT" => "Other Income",
        _ => "Other",
    };

    let desc = description.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| desc.contains(w));
    if any(&["zelle", "venmo", "paypal", "transfer", "payment to", "payment from"]) {
        "Transfer".to_string()
    } else if any(&["direct dep", "payroll", "salary", "deposit", "dirdep"]) {
        "Income".to_string()
    } else if any(&["electric", "gas bill", "internet", "phone", "insurance", "utility"]) {
        "Bills & Utilities".to_string()
    } else {
        base.to_string()
    }
}

fn cell<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_row(
    format: BankFormat,
    idx: &ColumnIndex,
    record: &csv::StringRecord,
    account: &str,
) -> Result<Transaction, String> {
    let date_raw = cell(record, Some(idx.date)).ok_or("missing date")?;
    let date = parse_date(date_raw)?;
    let post_date = cell(record, idx.post_date).map(parse_date).transpose()?;

    let amount_raw = cell(record, Some(idx.amount)).ok_or("missing amount")?;
    let mut amount = parse_amount(amount_raw)?;
    if layout(format).flip_sign {
        amount = -amount;
    }

    let description = cell(record, Some(idx.description))
        .unwrap_or_default()
        .trim_matches('"')
        .trim()
        .to_string();

    let mut kind = cell(record, idx.kind).map(str::to_string);
    let raw_category = match format {
        BankFormat::Discover => cell(record, idx.category).map(|raw| {
            kind = Some(discover_kind(raw, amount).to_string());
            discover_category(raw)
        }),
        BankFormat::ChaseDebit => Some(chase_debit_category(
            kind.as_deref().unwrap_or_default(),
            &description,
        )),
        BankFormat::ChaseCredit | BankFormat::Amex => cell(record, idx.category).map(str::to_string),
    };

    Ok(Transaction {
        date,
        post_date,
        description,
        amount,
        account: account.to_string(),
        kind,
        raw_category,
        memo: cell(record, idx.memo).map(str::to_string),
    })
}

/// Parse the rows below a located header into transactions.
///
/// Malformed rows are skipped and reported as warnings; the batch carries on.
pub fn normalize_located(
    text: &str,
    header: &HeaderMatch,
    account: Option<&str>,
) -> Result<NormalizedBatch, CsvError> {
    let format = header.detection.format;
    let idx = resolve(format, &header.columns)?;
    let account = account.unwrap_or(format.info().name);

    let body: String = text
        .lines()
        .skip(header.line)
        .collect::<Vec<_>>()
        .join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut transactions = Vec::new();
    let mut warnings = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize) + header.line;
                tracing::warn!(line, error = %e, "skipping unreadable row");
                warnings.push(RowWarning { line, reason: e.to_string() });
                continue;
            }
        };

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line() as usize) + header.line;
        match parse_row(format, &idx, &record, account) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => {
                tracing::warn!(line, %reason, "skipping malformed row");
                warnings.push(RowWarning { line, reason });
            }
        }
    }

    tracing::info!(
        %format,
        rows = transactions.len(),
        skipped = warnings.len(),
        "normalized export"
    );

    Ok(NormalizedBatch {
        format,
        confidence: header.detection.confidence,
        transactions,
        warnings,
    })
}

/// Detect the export format of `text` and normalize it. An unrecognized
/// header rejects the whole file before any row is read.
pub fn import_text(
    text: &str,
    format: Option<BankFormat>,
    account: Option<&str>,
) -> Result<NormalizedBatch, CsvError> {
    let header = match format {
        Some(f) => detect::detect_text_as(text, f)?,
        None => detect::detect_text(text)?,
    };
    normalize_located(text, &header, account)
}

/// Decode raw export bytes to text.
///
/// Lines that aren't valid UTF-8 are decoded as Windows-1252, which is what
/// older bank exports use for names like `CAFÉ`. Returns the text and the
/// zero-based indexes of the lines that needed it.
pub fn decode_export(bytes: &[u8]) -> (String, Vec<usize>) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), Vec::new());
    }

    let mut text = String::with_capacity(bytes.len());
    let mut repaired = Vec::new();
    for (idx, line) in bytes.split(|b| *b == b'\n').enumerate() {
        if idx > 0 {
            text.push('\n');
        }
        match std::str::from_utf8(line) {
            Ok(s) => text.push_str(s),
            Err(_) => {
                let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(line);
                text.push_str(&decoded);
                repaired.push(idx);
            }
        }
    }
    (text, repaired)
}

/// Like [`import_text`] but starting from raw bytes. Lines that had to be
/// re-decoded are still imported and each one is reported as a warning.
pub fn import_bytes(
    bytes: &[u8],
    format: Option<BankFormat>,
    account: Option<&str>,
) -> Result<NormalizedBatch, CsvError> {
    let (text, repaired) = decode_export(bytes);
    let mut batch = import_text(&text, format, account)?;
    if !repaired.is_empty() {
        for idx in repaired {
            let line = idx + 1;
            tracing::warn!(line, "row is not valid UTF-8, read as Windows-1252");
            batch.warnings.push(RowWarning {
                line,
                reason: "not valid UTF-8, read as Windows-1252".to_string(),
            });
        }
        batch.warnings.sort_by_key(|w| w.line);
    }
    Ok(batch)
}

/// Normalize an export already known to be `format`.
pub fn normalize<R: Read>(
    format: BankFormat,
    mut reader: R,
    account: Option<&str>,
) -> Result<NormalizedBatch, CsvError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    import_bytes(&bytes, Some(format), account)
}

/// Detect and normalize one export file.
pub fn import_file(path: &Path, account: Option<&str>) -> Result<NormalizedBatch, CsvError> {
    let bytes = std::fs::read(path)?;
    import_bytes(&bytes, None, account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain() {
        assert_eq!(parse_amount("123.45").unwrap(), Money::from_cents(12345));
    }

    #[test]
    fn parse_amount_with_dollar_sign_and_commas() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), Money::from_cents(123456));
    }

    #[test]
    fn parse_amount_negative() {
        assert_eq!(parse_amount("-4.50").unwrap(), Money::from_cents(-450));
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)").unwrap(), Money::from_cents(-7525));
    }

    #[test]
    fn parse_amount_out_of_range() {
        assert!(parse_amount("-50000000000000000000000000000").is_err());
        assert!(parse_amount("1,000,000,000,000,000.01").is_err());
        assert_eq!(
            parse_amount("-1000000000000000").unwrap(),
            Money::from_decimal(Decimal::from(-MAX_AMOUNT))
        );
    }

    #[test]
    fn parse_amount_invalid() {
        assert!(parse_amount("n/a").is_err());
        assert!(parse_amount("").is_err());
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_us_and_iso() {
        assert_eq!(parse_date("01/15/2024").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("2024-01-15").unwrap(), date(2024, 1, 15));
        assert!(parse_date("15.01.2024").is_err());
    }

    // ── category maps ─────────────────────────────────────────────────────────

    #[test]
    fn discover_categories_normalize() {
        assert_eq!(discover_category("Restaurants"), "Food & Dining");
        assert_eq!(discover_category("Supermarkets"), "Groceries");
        assert_eq!(discover_category("Travel/ Entertainment"), "Entertainment");
        assert_eq!(discover_category("Pet Stores"), "Pet Stores");
    }

    #[test]
    fn chase_debit_type_and_keywords() {
        assert_eq!(chase_debit_category("ACH_CREDIT", "ACME CORP"), "Income");
        assert_eq!(chase_debit_category("DEBIT_CARD", "TARGET 0012"), "Shopping");
        assert_eq!(chase_debit_category("ACH_DEBIT", "Zelle payment to Sam"), "Transfer");
        assert_eq!(chase_debit_category("MISC_DEBIT", "ACME PAYROLL"), "Income");
        assert_eq!(chase_debit_category("", "SOMETHING"), "Other");
    }

    // ── full imports ──────────────────────────────────────────────────────────

    #[test]
    fn import_chase_credit() {
        let text = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
                    03/02/2024,03/03/2024,STARBUCKS #123,Food & Drink,Sale,-4.50,\n\
                    03/05/2024,03/05/2024,Payment Thank You-Mobile,,Payment,250.00,\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.format, BankFormat::ChaseCredit);
        assert!(batch.warnings.is_empty());
        assert_eq!(batch.transactions.len(), 2);

        let coffee = &batch.transactions[0];
        assert_eq!(coffee.date, date(2024, 3, 2));
        assert_eq!(coffee.post_date, Some(date(2024, 3, 3)));
        assert_eq!(coffee.description, "STARBUCKS #123");
        assert_eq!(coffee.amount, Money::from_cents(-450));
        assert_eq!(coffee.account, "Chase Credit Card");
        assert_eq!(coffee.kind.as_deref(), Some("Sale"));
        assert_eq!(coffee.raw_category.as_deref(), Some("Food & Drink"));
        assert_eq!(batch.transactions[1].raw_category, None);
    }

    #[test]
    fn import_chase_debit_with_trailing_comma() {
        let text = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
                    CREDIT,03/01/2024,\"ACME CORP PAYROLL\",2000.00,ACH_CREDIT,2500.00,,\n\
                    DEBIT,03/04/2024,\"PG&E ELECTRIC\",-120.10,ACH_DEBIT,2379.90,,\n";
        let batch = import_text(text, None, Some("Checking")).unwrap();
        assert_eq!(batch.format, BankFormat::ChaseDebit);
        assert_eq!(batch.transactions.len(), 2);
        let pay = &batch.transactions[0];
        assert_eq!(pay.amount, Money::from_cents(200000));
        assert_eq!(pay.account, "Checking");
        assert_eq!(pay.kind.as_deref(), Some("ACH_CREDIT"));
        assert_eq!(pay.raw_category.as_deref(), Some("Income"));
        assert_eq!(
            batch.transactions[1].raw_category.as_deref(),
            Some("Bills & Utilities")
        );
    }

    #[test]
    fn import_discover_flips_sign() {
        let text = "Trans. Date,Post Date,Description,Amount,Category\n\
                    01/02/2024,01/03/2024,SHELL OIL 123,40.00,Gasoline\n\
                    01/10/2024,01/10/2024,INTERNET PAYMENT - THANK YOU,-300.00,Payments and Credits\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.format, BankFormat::Discover);
        let gas = &batch.transactions[0];
        assert_eq!(gas.amount, Money::from_cents(-4000));
        assert_eq!(gas.raw_category.as_deref(), Some("Gas & Fuel"));
        assert_eq!(gas.kind.as_deref(), Some("Purchase"));
        let payment = &batch.transactions[1];
        assert_eq!(payment.amount, Money::from_cents(30000));
        assert_eq!(payment.kind.as_deref(), Some("Payment"));
    }

    #[test]
    fn import_amex_after_preamble() {
        let text = "\n\n\n\n\n\n\
                    Date,Description,Amount,Extended Details,Appears On Your Statement As,Address,City/State,Zip Code,Country,Reference,Category\n\
                    02/16/2026,CLIPPER TRANSIT,10.00,TRANSIT,CLIPPER,,SAN FRANCISCO CA,94103,UNITED STATES,'320260470',Other-Government Services\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.format, BankFormat::Amex);
        assert_eq!(batch.transactions.len(), 1);
        let t = &batch.transactions[0];
        assert_eq!(t.date, date(2026, 2, 16));
        assert_eq!(t.amount, Money::from_cents(-1000));
        assert_eq!(t.raw_category.as_deref(), Some("Other-Government Services"));
        assert_eq!(t.memo.as_deref(), Some("TRANSIT"));
    }

    #[test]
    fn malformed_rows_are_skipped_with_warning() {
        let text = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
                    03/02/2024,03/03/2024,STARBUCKS,Food & Drink,Sale,-4.50,\n\
                    not-a-date,03/03/2024,BROKEN,Food & Drink,Sale,-1.00,\n\
                    03/04/2024,03/05/2024,ALSO BROKEN,Shopping,Sale,abc,\n\
                    03/06/2024,03/07/2024,TARGET,Shopping,Sale,-20.00,\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.warnings.len(), 2);
        assert_eq!(batch.warnings[0].line, 3);
        assert!(batch.warnings[0].reason.contains("invalid date"));
        assert_eq!(batch.warnings[1].line, 4);
        assert!(batch.warnings[1].reason.contains("invalid amount"));
    }

    #[test]
    fn oversized_amounts_become_warnings() {
        let text = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
                    03/02/2024,03/03/2024,GARBLED,Shopping,Sale,-50000000000000000000000000000,\n\
                    03/02/2024,03/03/2024,GARBLED,Shopping,Sale,-50000000000000000000000000000,\n\
                    03/06/2024,03/07/2024,TARGET,Shopping,Sale,-20.00,\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.warnings.len(), 2);
        assert!(batch.warnings[0].reason.contains("out of range"));
    }

    #[test]
    fn windows_1252_row_is_decoded_and_flagged() {
        let mut bytes = b"Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
                          03/02/2024,03/03/2024,STARBUCKS,Food & Drink,Sale,-4.50,\n"
            .to_vec();
        bytes.extend_from_slice(b"03/04/2024,03/05/2024,CAF\xC9 RIVE GAUCHE,Food & Drink,Sale,-12.00,\n");

        let batch = import_bytes(&bytes, None, None).unwrap();
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.transactions[1].description, "CAF\u{c9} RIVE GAUCHE");
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].line, 3);
        assert!(batch.warnings[0].reason.contains("Windows-1252"));
    }

    #[test]
    fn decode_export_leaves_utf8_alone() {
        let (text, repaired) = decode_export("CAF\u{c9}\nok\n".as_bytes());
        assert_eq!(text, "CAF\u{c9}\nok\n");
        assert!(repaired.is_empty());
    }

    #[test]
    fn blank_rows_are_ignored_silently() {
        let text = "Trans. Date,Post Date,Description,Amount,Category\n\
                    01/02/2024,01/03/2024,SHELL,40.00,Gasoline\n\
                    ,,,,\n";
        let batch = import_text(text, None, None).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn unrecognized_export_is_rejected() {
        let text = "Date,Description,Amount\n2024-01-15,AMAZON,49.99\n";
        let err = import_text(text, None, None).unwrap_err();
        assert!(matches!(err, CsvError::Detect(DetectError::Unrecognized { .. })));
    }

    #[test]
    fn header_only_gives_empty_batch() {
        let text = "Trans. Date,Post Date,Description,Amount,Category\n";
        let batch = import_text(text, None, None).unwrap();
        assert!(batch.transactions.is_empty());
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn normalize_with_known_format() {
        let text = "Trans. Date,Post Date,Description,Amount,Category\n01/02/2024,01/03/2024,SHELL,40.00,Gasoline\n";
        let batch = normalize(BankFormat::Discover, text.as_bytes(), Some("Disco")).unwrap();
        assert_eq!(batch.transactions[0].account, "Disco");
    }

    #[test]
    fn normalize_with_wrong_format_is_rejected() {
        let text = "Trans. Date,Post Date,Description,Amount,Category\n01/02/2024,01/03/2024,SHELL,40.00,Gasoline\n";
        assert!(normalize(BankFormat::ChaseDebit, text.as_bytes(), None).is_err());
    }

    #[test]
    fn import_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discover.csv");
        std::fs::write(
            &path,
            "Trans. Date,Post Date,Description,Amount,Category\n01/02/2024,01/03/2024,SHELL,40.00,Gasoline\n",
        )
        .unwrap();
        let batch = import_file(&path, None).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.format, BankFormat::Discover);
    }

    #[test]
    fn import_file_survives_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chase.csv");
        let mut bytes = b"Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n".to_vec();
        bytes.extend_from_slice(b"03/02/2024,03/03/2024,STARBUCKS,Food & Drink,Sale,-4.50,\n");
        bytes.extend_from_slice(b"03/04/2024,03/05/2024,CAF\xC9,Food & Drink,Sale,-12.00,\n");
        std::fs::write(&path, bytes).unwrap();

        let batch = import_file(&path, None).unwrap();
        assert_eq!(batch.format, BankFormat::ChaseCredit);
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.warnings.len(), 1);
    }

    #[test]
    fn import_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_file(&dir.path().join("nope.csv"), None).unwrap_err();
        assert!(matches!(err, CsvError::IoError(_)));
    }
}
