use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------    PaymentTxHash     ---------------------------------------------------------
/// The hash of the native payment that funds a sale. Stored upper-case, the way the ledger reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentTxHash(String);

impl PaymentTxHash {
    pub fn new(hash: &str) -> Self {
        Self(hash.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PaymentTxHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PaymentTxHash {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl Display for PaymentTxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------      SaleStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// A validated payment with a well-formed purchase memo has been observed.
    Received,
    Validated,
    Granted,
    MptSent,
    Failed,
}

impl Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleStatus::Received => write!(f, "received"),
            SaleStatus::Validated => write!(f, "validated"),
            SaleStatus::Granted => write!(f, "granted"),
            SaleStatus::MptSent => write!(f, "mpt_sent"),
            SaleStatus::Failed => write!(f, "failed"),
        }
    }
}

impl From<String> for SaleStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid sale status: {value}. But this conversion cannot fail. Defaulting to Received");
            SaleStatus::Received
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid sale status: {0}")]
pub struct ConversionError(String);

impl FromStr for SaleStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "validated" => Ok(Self::Validated),
            "granted" => Ok(Self::Granted),
            "mpt_sent" => Ok(Self::MptSent),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      PendingSale      --------------------------------------------------------
/// A paid-for token purchase awaiting settlement. Keyed by the payment transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSale {
    pub issuance_id: String,
    /// The buyer, i.e. the sender of the payment.
    pub holder: String,
    /// Whole token units requested, before scaling.
    pub units: String,
    pub nonce: String,
    /// The payment amount in drops.
    pub amount_native: String,
    pub amount_display: String,
    pub payment_tx: PaymentTxHash,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for PendingSale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sale[{}] {} units of {} for {} ({} XRP)",
            self.payment_tx, self.units, self.issuance_id, self.holder, self.amount_display
        )
    }
}
