// Lambda bootstrap for the parse-only log function

use anyhow::Context;
use ledgerfn::api::parse_log_handler;
use ledgerfn::clients::{LlmClient, SupabaseClient};
use ledgerfn::core::config::ParserConfig;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ledgerfn::setup_logging();

    let config = ParserConfig::from_env().context("loading parser configuration")?;
    let store = SupabaseClient::new(&config.store).context("building storage client")?;
    let llm = LlmClient::from_config(&config).context("building OpenAI client")?;

    let (config, store, llm) = (&config, &store, &llm);
    run(service_fn(move |event: LambdaEvent<Value>| {
        parse_log_handler(config, store, llm, event)
    }))
    .await
}
