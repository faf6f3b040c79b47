pub mod parse_log;
pub mod record_log;
pub mod refresh_rates;

pub use parse_log::{LogParser, ParseOutcome, ResolvedLog};
pub use record_log::RecordedLog;
pub use refresh_rates::{RefreshSummary, refresh_rates};
