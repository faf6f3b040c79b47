//! ledgerfn - serverless functions behind a personal ledger app.
//!
//! This crate builds three independent AWS Lambda functions:
//! 1. A rate refresh function that pulls exchange rates from an external
//!    provider and writes them to the `currencies` table
//! 2. A parse function that turns free text (often a voice transcript) into a
//!    structured ledger entry with an LLM call and hands it back
//! 3. A record function that does the same and inserts the entry into `logs`
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for serverless execution, one binary per function
//! - Supabase's PostgREST interface for storage, via reqwest
//! - The `OpenAI` Chat Completions API in JSON mode for parsing
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use ledgerfn::clients::{LlmClient, SupabaseClient};
//! use ledgerfn::core::config::ParserConfig;
//! use ledgerfn::core::fallback::FallbackPolicy;
//! use ledgerfn::core::models::ParseRequest;
//! use ledgerfn::features::LogParser;
//! use ledgerfn::prompt::PromptStyle;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ledgerfn::setup_logging();
//!
//!     let config = ParserConfig::from_env()?;
//!     let store = SupabaseClient::new(&config.store)?;
//!     let llm = LlmClient::from_config(&config)?;
//!     let policy = FallbackPolicy::default();
//!
//!     let parser = LogParser::new(&store, &llm, &config.openai_model, &policy);
//!     let request = ParseRequest {
//!         raw_text: "coffee 4.50 on my visa".to_string(),
//!         user_id: "8d3c2f0e-0000-0000-0000-000000000000".to_string(),
//!     };
//!     let outcome = parser
//!         .parse(&request, PromptStyle::Detailed, chrono::Utc::now())
//!         .await?;
//!     println!("{:?}", outcome.to_resolved());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod clients;
pub mod core;
pub mod errors;
pub mod features;
pub mod prompt;
pub mod utils;

pub use errors::LedgerError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Output goes to `CloudWatch` Logs; verbosity follows `RUST_LOG` and defaults
/// to `info`. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// ledgerfn::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
