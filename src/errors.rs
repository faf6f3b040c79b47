use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("API error ({provider}): {message}")]
    UpstreamApi { provider: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LedgerError {
    pub fn upstream(provider: &str, message: impl Into<String>) -> Self {
        LedgerError::UpstreamApi {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        // provider keys can sit in the path as well as the query, so the URL is dropped whole
        LedgerError::Http(error.without_url().to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::MalformedResponse(error.to_string())
    }
}
