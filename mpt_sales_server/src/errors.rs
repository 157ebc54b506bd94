use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use ledger_tools::{LedgerError, XummError};
use mpt_sales_engine::{IssuanceApiError, ListenerError, OptInApiError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Settlement(#[from] SettlementError),
    #[error("{0}")]
    Listener(#[from] ListenerError),
    #[error("{0}")]
    Issuance(#[from] IssuanceApiError),
    #[error("{0}")]
    OptIn(#[from] OptInApiError),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// A short machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Settlement(e) => e.code(),
            Self::InvalidRequestBody(_) => "bad_request",
            Self::NoRecordFound(_) => "not_found",
            Self::Listener(ListenerError::Input(_)) |
            Self::Issuance(IssuanceApiError::Input(_)) |
            Self::OptIn(OptInApiError::Input(_)) => "bad_request",
            Self::Listener(ListenerError::Ledger(LedgerError::NotFound(_))) => "not_found",
            Self::Listener(ListenerError::Ledger(_)) | Self::Issuance(IssuanceApiError::Ledger(_)) => "ledger_error",
            Self::Issuance(IssuanceApiError::HolderNotAuthorized(_)) => "holder_not_authorized",
            Self::Issuance(IssuanceApiError::InvalidUnits(_)) => "invalid_units",
            Self::OptIn(OptInApiError::Verification(_)) => "verification_failed",
            Self::OptIn(OptInApiError::Relay(XummError::RateLimited)) => "rate_limited",
            Self::OptIn(OptInApiError::Relay(XummError::NotFound)) => "not_found",
            Self::OptIn(_) => "relay_error",
            _ => "internal_error",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Settlement(e) => match e {
                SettlementError::Input(_) => StatusCode::BAD_REQUEST,
                SettlementError::HolderNotWhitelisted(_) => StatusCode::BAD_REQUEST,
                SettlementError::InvalidUnits(_) => StatusCode::BAD_REQUEST,
                SettlementError::NotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::InProgress(_) => StatusCode::CONFLICT,
                SettlementError::Ledger(_) => StatusCode::BAD_GATEWAY,
                SettlementError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Listener(e) => match e {
                ListenerError::Input(_) => StatusCode::BAD_REQUEST,
                ListenerError::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
                ListenerError::Ledger(_) => StatusCode::BAD_GATEWAY,
                ListenerError::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Issuance(e) => match e {
                IssuanceApiError::Input(_) => StatusCode::BAD_REQUEST,
                IssuanceApiError::HolderNotAuthorized(_) => StatusCode::BAD_REQUEST,
                IssuanceApiError::InvalidUnits(_) => StatusCode::BAD_REQUEST,
                IssuanceApiError::AuthorizationIneffective => StatusCode::BAD_GATEWAY,
                IssuanceApiError::Ledger(_) => StatusCode::BAD_GATEWAY,
                IssuanceApiError::IssuanceNotFound => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OptIn(e) => match e {
                OptInApiError::Input(_) => StatusCode::BAD_REQUEST,
                OptInApiError::Verification(_) => StatusCode::BAD_REQUEST,
                OptInApiError::RelayNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
                OptInApiError::Relay(XummError::NotFound) => StatusCode::NOT_FOUND,
                OptInApiError::Relay(XummError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
                OptInApiError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
                OptInApiError::QrUnavailable => StatusCode::BAD_GATEWAY,
                OptInApiError::Ledger(_) => StatusCode::BAD_GATEWAY,
            },
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string(), "code": self.code() }).to_string())
    }
}
