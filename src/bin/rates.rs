// Lambda bootstrap for the exchange-rate refresh function

use anyhow::Context;
use ledgerfn::api::refresh_rates_handler;
use ledgerfn::clients::{ExchangeRateClient, SupabaseClient};
use ledgerfn::core::config::RatesConfig;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ledgerfn::setup_logging();

    let config = RatesConfig::from_env().context("loading rate refresh configuration")?;
    let store = SupabaseClient::new(&config.store).context("building storage client")?;
    let source =
        ExchangeRateClient::new(&config.rate_endpoint).context("building rate client")?;

    let (config, store, source) = (&config, &store, &source);
    run(service_fn(move |event: LambdaEvent<Value>| {
        refresh_rates_handler(config, store, source, event)
    }))
    .await
}
