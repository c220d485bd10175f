pub mod money;
pub mod period;
pub mod split;
pub mod transaction;

pub use money::Money;
pub use period::DateRange;
pub use split::{SplitConfig, SplitError};
pub use transaction::{Bucket, CategorizedTransaction, Recurrence, Transaction, UNCATEGORIZED};
