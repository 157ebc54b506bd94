use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Could not connect to the ledger: {0}")]
    Connection(String),
    #[error("The ledger did not respond within {0}ms")]
    Timeout(u64),
    #[error("The ledger connection is closed")]
    Closed,
    #[error("Ledger request failed. {error}: {message}")]
    Request { error: String, message: String },
    #[error("Could not deserialize ledger response: {0}")]
    Json(String),
    #[error("Transaction was not applied: {0}")]
    Submit(String),
    #[error("Not found on ledger: {0}")]
    NotFound(String),
}

impl LedgerError {
    /// The ledger engine result code carried by this error, if any (e.g. `tecDUPLICATE`).
    pub fn engine_result(&self) -> Option<&str> {
        match self {
            Self::Submit(code) => Some(code.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum XummError {
    #[error("Xumm credentials are not configured")]
    MissingCredentials,
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach Xumm: {0}")]
    Unreachable(String),
    #[error("Xumm request timed out")]
    Timeout,
    #[error("Sign request not found or expired")]
    NotFound,
    #[error("Xumm rate limit exceeded")]
    RateLimited,
    #[error("Xumm request failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Xumm response is missing required field: {0}")]
    MissingField(&'static str),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}
