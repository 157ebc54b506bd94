use ledger_tools::{LedgerError, XummError};
use mpt_common::AmountError;
use thiserror::Error;

use crate::{helpers::InputError, ingest::IngestError, store::StoreError};

#[derive(Debug, Clone, Error)]
pub enum ListenerError {
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("No pending sale for payment {0}")]
    NotFound(String),
    #[error("Holder {0} is not whitelisted")]
    HolderNotWhitelisted(String),
    #[error("Settlement of {0} is already in progress")]
    InProgress(String),
    #[error("Cannot scale sale units: {0}")]
    InvalidUnits(#[from] AmountError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Sales store error: {0}")]
    Store(#[from] StoreError),
}

impl SettlementError {
    /// The machine-readable code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::Input(_) => "bad_request",
            SettlementError::NotFound(_) => "not_found",
            SettlementError::HolderNotWhitelisted(_) => "holder_not_whitelisted",
            SettlementError::InProgress(_) => "settlement_in_progress",
            SettlementError::InvalidUnits(_) => "invalid_units",
            SettlementError::Ledger(_) => "ledger_error",
            SettlementError::Store(_) => "internal_error",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum IssuanceApiError {
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("tecNO_AUTH: holder {0} must opt in and then be authorized by the issuer")]
    HolderNotAuthorized(String),
    #[error("MPTokenAuthorize was submitted but the holder is still not authorized")]
    AuthorizationIneffective,
    #[error("Unable to determine the MPT issuance id after creation")]
    IssuanceNotFound,
    #[error("Invalid amount: {0}")]
    InvalidUnits(#[from] AmountError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum OptInApiError {
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("The sign relay is not configured")]
    RelayNotConfigured,
    #[error("Sign relay error: {0}")]
    Relay(#[from] XummError),
    #[error("The sign relay returned no QR code")]
    QrUnavailable,
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Opt-in verification failed: {0}")]
    Verification(String),
}
