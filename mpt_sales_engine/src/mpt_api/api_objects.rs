use serde::Serialize;

use crate::sale_types::PaymentTxHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Totals for one historical rescan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescanSummary {
    pub scanned: usize,
    pub added: usize,
    /// Rows the engine could not process. They do not stop the rescan.
    pub failed: usize,
    pub min: u32,
    pub max: u32,
    /// Set when the ledger failed part-way through. The counts cover the pages processed before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub payment_tx: PaymentTxHash,
    /// Hash of the MPT payment that delivered the tokens.
    pub hash: String,
    pub holder: String,
    pub issuance_id: String,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResult {
    pub mpt_issuance_id: String,
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeHolderResult {
    pub opt_in: bool,
    pub granted: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MptTransfer {
    pub mpt_issuance_id: String,
    pub hash: String,
}

/// A holder opt-in sign request, ready to be shown as a QR code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptInQr {
    pub uuid: String,
    pub qr_png: Option<String>,
    pub qr_svg: Option<String>,
    pub websocket_status: Option<String>,
    pub next_url: String,
    pub txjson: ledger_tools::data_objects::TxJson,
}

/// What the gateway makes of a single transaction, without ingesting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInspection {
    pub hash: String,
    pub issuer: String,
    pub validated: bool,
    pub tx_type: Option<String>,
    pub destination: Option<String>,
    pub destination_ok: bool,
    pub result_code: Option<String>,
    pub amount_drops: Option<String>,
    pub amount_display: Option<String>,
    /// The purchase memo, if one could be parsed.
    pub purchase_memo: Option<String>,
    /// `accepted`, `duplicate` or `rejected`.
    pub outcome: &'static str,
    pub reason: Option<String>,
}
