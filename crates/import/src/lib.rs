//! Bank export ingestion: format detection, row normalization and
//! rule-based categorization.

pub mod csv;
pub mod detect;
pub mod rules;
pub mod util;

pub use self::csv::{
    decode_export, import_bytes, import_file, import_text, normalize, CsvError, NormalizedBatch,
    RowWarning,
};
pub use detect::{BankFormat, DetectError, Detection, FormatInfo, HeaderMatch};
pub use rules::{EngineOptions, MatchType, Rule, RuleEngine, RuleError, RuleSet};
