//! Lambda handlers and request processing

pub mod handler;
pub mod helpers;
pub mod parsing;

pub use handler::{parse_log_handler, record_log_handler, refresh_rates_handler};
