//! Bank export detection from CSV header columns.
//!
//! Each supported export has a column signature. A header is scored against
//! every signature and the best one wins if it clears [`MIN_CONFIDENCE`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::{BufRead, Read};
use std::str::FromStr;
use thiserror::Error;

/// Lowest score accepted as a match.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// How many non-empty lines are searched for a header before giving up.
const HEADER_SCAN_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankFormat {
    ChaseCredit,
    ChaseDebit,
    Discover,
    Amex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    pub bank: &'static str,
    pub card_type: &'static str,
    pub has_categories: bool,
}

impl BankFormat {
    pub const ALL: [BankFormat; 4] = [
        BankFormat::ChaseCredit,
        BankFormat::ChaseDebit,
        BankFormat::Discover,
        BankFormat::Amex,
    ];

    pub fn info(self) -> FormatInfo {
        match self {
            BankFormat::ChaseCredit => FormatInfo {
                name: "Chase Credit Card",
                bank: "chase",
                card_type: "credit",
                has_categories: true,
            },
            BankFormat::ChaseDebit => FormatInfo {
                name: "Chase Debit/Checking",
                bank: "chase",
                card_type: "debit",
                has_categories: false,
            },
            BankFormat::Discover => FormatInfo {
                name: "Discover Credit Card",
                bank: "discover",
                card_type: "credit",
                has_categories: true,
            },
            BankFormat::Amex => FormatInfo {
                name: "American Express",
                bank: "amex",
                card_type: "credit",
                has_categories: true,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BankFormat::ChaseCredit => "chase_credit",
            BankFormat::ChaseDebit => "chase_debit",
            BankFormat::Discover => "discover",
            BankFormat::Amex => "amex",
        }
    }

    fn signature(self) -> &'static Signature {
        match self {
            BankFormat::ChaseCredit => &CHASE_CREDIT,
            BankFormat::ChaseDebit => &CHASE_DEBIT,
            BankFormat::Discover => &DISCOVER,
            BankFormat::Amex => &AMEX,
        }
    }
}

impl fmt::Display for BankFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "chase_credit" => Ok(BankFormat::ChaseCredit),
            "chase_debit" | "chase_checking" => Ok(BankFormat::ChaseDebit),
            "discover" => Ok(BankFormat::Discover),
            "amex" | "american_express" => Ok(BankFormat::Amex),
            other => Err(format!("Unknown bank format: '{other}'")),
        }
    }
}

struct Signature {
    required: &'static [&'static str],
    /// Columns unique to this export; weighted as heavily as `required`.
    characteristic: &'static [&'static str],
    all: &'static [&'static str],
}

static CHASE_CREDIT: Signature = Signature {
    required: &["Transaction Date", "Post Date", "Description", "Amount"],
    characteristic: &["Category", "Memo"],
    all: &["Transaction Date", "Post Date", "Description", "Category", "Type", "Amount", "Memo"],
};

static CHASE_DEBIT: Signature = Signature {
    required: &["Posting Date", "Description", "Amount"],
    characteristic: &["Details", "Balance"],
    all: &["Details", "Posting Date", "Description", "Amount", "Type", "Balance", "Check or Slip #"],
};

static DISCOVER: Signature = Signature {
    required: &["Description", "Amount"],
    characteristic: &["Trans. Date"],
    all: &["Trans. Date", "Post Date", "Description", "Amount", "Category"],
};

static AMEX: Signature = Signature {
    required: &["Date", "Description", "Amount"],
    characteristic: &["Extended Details", "Appears On Your Statement As"],
    all: &[
        "Date",
        "Description",
        "Amount",
        "Extended Details",
        "Appears On Your Statement As",
        "Address",
        "City/State",
        "Zip Code",
        "Country",
        "Reference",
        "Category",
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub format: BankFormat,
    pub confidence: f32,
    pub has_categories: bool,
}

/// A detected header together with where it sits in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub detection: Detection,
    /// Zero-based line index of the header row.
    pub line: usize,
    pub columns: Vec<String>,
}

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Unrecognized bank export (best match scored {best_score:.2})")]
    Unrecognized { best_score: f32 },
    #[error("File has no header row")]
    Empty,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn score(columns: &HashSet<&str>, sig: &Signature) -> f32 {
    let count = |set: &[&str]| set.iter().filter(|c| columns.contains(*c)).count();

    let required_matches = count(sig.required);
    let required_score = if required_matches < sig.required.len() {
        required_matches as f32 / sig.required.len() as f32 * 0.5
    } else {
        1.0
    };

    let char_score = if sig.characteristic.is_empty() {
        0.0
    } else {
        count(sig.characteristic) as f32 / sig.characteristic.len() as f32
    };

    let all_score = if sig.all.is_empty() {
        0.0
    } else {
        count(sig.all) as f32 / sig.all.len() as f32
    };

    required_score * 0.4 + char_score * 0.4 + all_score * 0.2
}

/// Score a header against every signature. Ties go to the first format in
/// [`BankFormat::ALL`].
fn best_match<S: AsRef<str>>(columns: &[S]) -> (BankFormat, f32) {
    let set: HashSet<&str> = columns.iter().map(|c| clean_cell(c.as_ref())).collect();
    let mut best = (BankFormat::ALL[0], f32::MIN);
    for format in BankFormat::ALL {
        let s = score(&set, format.signature());
        if s > best.1 {
            best = (format, s);
        }
    }
    best
}

fn clean_cell(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

pub fn detect_columns<S: AsRef<str>>(columns: &[S]) -> Result<Detection, DetectError> {
    let (format, confidence) = best_match(columns);
    if confidence < MIN_CONFIDENCE {
        return Err(DetectError::Unrecognized {
            best_score: confidence.max(0.0),
        });
    }
    Ok(Detection {
        format,
        confidence,
        has_categories: format.info().has_categories,
    })
}

/// Score `columns` against one specific format.
pub fn score_as<S: AsRef<str>>(columns: &[S], format: BankFormat) -> f32 {
    let set: HashSet<&str> = columns.iter().map(|c| clean_cell(c.as_ref())).collect();
    score(&set, format.signature())
}

fn split_line(line: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(|c| clean_cell(c).to_string()).collect()),
        None => Ok(Vec::new()),
    }
}

fn candidate_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.chars().any(|c| c != ',' && !c.is_whitespace() && c != '\u{feff}'))
        .take(HEADER_SCAN_LINES)
}

/// Find the header row in a whole export and classify it.
///
/// Leading blank or preamble rows are skipped; the best-scoring line among
/// the first few non-empty ones is taken as the header.
pub fn detect_text(text: &str) -> Result<HeaderMatch, DetectError> {
    locate(text, None)
}

/// Read an export from `reader` and locate its header.
pub fn detect_reader<R: BufRead>(mut reader: R) -> Result<HeaderMatch, DetectError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let (text, _) = crate::csv::decode_export(&bytes);
    detect_text(&text)
}

/// Like [`detect_text`] but only considers `format`.
pub fn detect_text_as(text: &str, format: BankFormat) -> Result<HeaderMatch, DetectError> {
    locate(text, Some(format))
}

fn locate(text: &str, forced: Option<BankFormat>) -> Result<HeaderMatch, DetectError> {
    let mut best: Option<(usize, Vec<String>, BankFormat, f32)> = None;

    for (idx, line) in candidate_lines(text) {
        let columns = split_line(line)?;
        let (format, s) = match forced {
            Some(f) => (f, score_as(&columns, f)),
            None => best_match(&columns),
        };
        if best.as_ref().map_or(true, |b| s > b.3) {
            best = Some((idx, columns, format, s));
        }
    }

    let (line, columns, format, confidence) = best.ok_or(DetectError::Empty)?;
    if confidence < MIN_CONFIDENCE {
        return Err(DetectError::Unrecognized {
            best_score: confidence.max(0.0),
        });
    }

    tracing::debug!(%format, confidence, line, "detected bank export");

    Ok(HeaderMatch {
        detection: Detection {
            format,
            confidence,
            has_categories: format.info().has_categories,
        },
        line,
        columns,
    })
}
