//! Pushes categorized results to an external spreadsheet endpoint.

pub mod payload;
pub mod sink;

pub use payload::{SheetPayload, SheetRow, SummaryRow};
pub use sink::{HttpSheetSink, NoopSink, SheetConfig, SheetSink, SyncError, SyncReport};
