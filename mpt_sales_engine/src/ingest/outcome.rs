use std::fmt::Display;

use serde::Serialize;

use crate::sale_types::{PaymentTxHash, PendingSale};

/// Where a payment event came from. Only used for logging and event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestSource {
    Live,
    Rescan,
    Manual,
}

impl Display for IngestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestSource::Live => write!(f, "live"),
            IngestSource::Rescan => write!(f, "rescan"),
            IngestSource::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotValidated,
    TxFailed(Option<String>),
    WrongTxType(Option<String>),
    WrongDestination(Option<String>),
    MissingSender,
    MissingHash,
    AmountMissing,
    InvalidMemo,
    /// The memo's unit count cannot be priced without overflowing.
    InvalidUnits(String),
    PriceMismatch { expected: String, actual: String },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotValidated => "not_validated",
            RejectReason::TxFailed(_) => "tx_failed",
            RejectReason::WrongTxType(_) => "wrong_tx_type",
            RejectReason::WrongDestination(_) => "wrong_destination",
            RejectReason::MissingSender => "missing_sender",
            RejectReason::MissingHash => "missing_hash",
            RejectReason::AmountMissing => "amount_missing",
            RejectReason::InvalidMemo => "invalid_memo",
            RejectReason::InvalidUnits(_) => "invalid_units",
            RejectReason::PriceMismatch { .. } => "price_mismatch",
        }
    }
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::TxFailed(Some(result)) => write!(f, "tx_failed ({result})"),
            RejectReason::WrongTxType(Some(t)) => write!(f, "wrong_tx_type ({t})"),
            RejectReason::WrongDestination(Some(d)) => write!(f, "wrong_destination ({d})"),
            RejectReason::InvalidUnits(u) => write!(f, "invalid_units ({u})"),
            RejectReason::PriceMismatch { expected, actual } => {
                write!(f, "price_mismatch (expected {expected} drops, got {actual})")
            },
            other => f.write_str(other.as_str()),
        }
    }
}

/// The result of offering one payment event to the ingestion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new pending sale was recorded.
    Accepted(PendingSale),
    /// The payment was already ingested. Nothing changed.
    Duplicate(PaymentTxHash),
    Rejected(RejectReason),
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Accepted(_) => "accepted",
            IngestOutcome::Duplicate(_) => "duplicate",
            IngestOutcome::Rejected(_) => "rejected",
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            IngestOutcome::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
