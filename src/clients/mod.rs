//! Client modules for external API interactions

pub mod llm_client;
pub mod rates_client;
pub mod supabase_client;

pub use llm_client::{CompletionClient, CompletionRequest, LlmClient};
pub use rates_client::{ExchangeRateClient, RateSource};
pub use supabase_client::{LedgerStore, SupabaseClient};
