use std::collections::HashMap;

use ledgerfn::core::config::{
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, DEFAULT_UPDATE_CONCURRENCY, ParserConfig,
    RatesConfig,
};
use ledgerfn::errors::LedgerError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

const RATES_VARS: [(&str, &str); 3] = [
    ("CURRENCY_RATE_ENDPOINT", "https://v6.exchangerate-api.com/v6/KEY/latest/USD"),
    ("SUPABASE_URL", "https://project.supabase.co/"),
    ("SUPABASE_SERVICE_ROLE_KEY", "service-role"),
];

const PARSER_VARS: [(&str, &str); 3] = [
    ("SUPABASE_URL", "https://project.supabase.co"),
    ("SUPABASE_ANON_KEY", "anon"),
    ("OPENAI_API_KEY", "sk-test"),
];

#[test]
fn test_rates_config_defaults() {
    let config = RatesConfig::from_lookup(lookup(&RATES_VARS)).unwrap();
    assert_eq!(config.store.url, "https://project.supabase.co");
    assert_eq!(config.store.key, "service-role");
    assert_eq!(config.update_concurrency, DEFAULT_UPDATE_CONCURRENCY);
}

#[test]
fn test_rates_config_missing_endpoint() {
    let err = RatesConfig::from_lookup(lookup(&RATES_VARS[1..])).unwrap_err();
    assert!(matches!(err, LedgerError::MissingConfiguration(_)));
    assert!(err.to_string().contains("CURRENCY_RATE_ENDPOINT"));
}

#[test]
fn test_blank_value_counts_as_missing() {
    let mut vars = RATES_VARS.to_vec();
    vars[2] = ("SUPABASE_SERVICE_ROLE_KEY", "   ");
    let err = RatesConfig::from_lookup(lookup(&vars)).unwrap_err();
    assert!(err.to_string().contains("SUPABASE_SERVICE_ROLE_KEY"));
}

#[test]
fn test_rates_config_rejects_zero_concurrency() {
    let mut vars = RATES_VARS.to_vec();
    vars.push(("RATE_UPDATE_CONCURRENCY", "0"));
    let err = RatesConfig::from_lookup(lookup(&vars)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidConfiguration(_)));

    let mut vars = RATES_VARS.to_vec();
    vars.push(("RATE_UPDATE_CONCURRENCY", "16"));
    let config = RatesConfig::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(config.update_concurrency, 16);
}

#[test]
fn test_rates_config_rejects_non_url_endpoint() {
    let mut vars = RATES_VARS.to_vec();
    vars[0] = ("CURRENCY_RATE_ENDPOINT", "v6.exchangerate-api.com");
    let err = RatesConfig::from_lookup(lookup(&vars)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidConfiguration(_)));
}

#[test]
fn test_parser_config_defaults() {
    let config = ParserConfig::from_lookup(lookup(&PARSER_VARS)).unwrap();
    assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
    assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
    assert_eq!(config.openai_org_id, None);
    assert_eq!(config.default_base_currency, "USD");
}

#[test]
fn test_parser_config_overrides() {
    let mut vars = PARSER_VARS.to_vec();
    vars.push(("OPENAI_MODEL", "gpt-5-nano"));
    vars.push(("OPENAI_ORG_ID", "org-1"));
    vars.push(("DEFAULT_BASE_CURRENCY", "inr"));
    let config = ParserConfig::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(config.openai_model, "gpt-5-nano");
    assert_eq!(config.openai_org_id.as_deref(), Some("org-1"));
    assert_eq!(config.default_base_currency, "INR");
}

#[test]
fn test_parser_config_requires_openai_key() {
    let err = ParserConfig::from_lookup(lookup(&PARSER_VARS[..2])).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}
