//! Request and response bodies for the admin API. Field names are camelCase on the wire.
use ledger_tools::data_objects::TxJson;
use mpt_sales_engine::{
    api_objects::{RescanSummary, StartOutcome},
    sale_types::PendingSale,
    IngestOutcome,
};
use serde::{Deserialize, Serialize};

//----------------------------------------------   Sales  ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescanRequest {
    #[serde(default)]
    pub lookback_ledgers: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub payment_tx: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesList {
    pub items: Vec<PendingSale>,
}

/// What happened to a manually ingested payment. Rejections are reported here, not as HTTP errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<PendingSale>,
    pub pending_sales: usize,
}

impl IngestResponse {
    pub fn new(outcome: IngestOutcome, pending_sales: usize) -> Self {
        let label = outcome.label();
        let reason = outcome.reason().map(|r| r.to_string());
        let sale = match outcome {
            IngestOutcome::Accepted(sale) => Some(sale),
            _ => None,
        };
        Self { outcome: label, reason, sale, pending_sales }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RescanResponse {
    pub scanned: usize,
    pub added: usize,
    pub failed: usize,
    pub min: u32,
    pub max: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

impl From<RescanSummary> for RescanResponse {
    fn from(s: RescanSummary) -> Self {
        let RescanSummary { scanned, added, failed, min, max, interrupted } = s;
        Self { scanned, added, failed, min, max, interrupted }
    }
}

//----------------------------------------------   Issuance  ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderRequest {
    #[serde(default)]
    pub mpt_issuance_id: Option<String>,
    pub holder: String,
}

/// Body for `/send` and `/clawback`. The target account is `destination` for sends and `holder` for clawbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(alias = "holder")]
    pub destination: String,
    #[serde(alias = "amount")]
    pub units: String,
    #[serde(default)]
    pub mpt_issuance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub account: String,
    #[serde(default)]
    pub mpt_issuance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account: String,
    pub mpt_issuance_id: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedOptIn {
    #[serde(rename = "txJSON")]
    pub tx_json: TxJson,
}

//----------------------------------------------   Opt-in  ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInQrRequest {
    pub holder_address: String,
    #[serde(default)]
    pub issuance_id: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOptInRequest {
    pub txid: String,
    pub account: String,
    #[serde(default)]
    pub issuance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOptInResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyOptInResponse {
    pub fn success() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failure<S: ToString>(error: S) -> Self {
        Self { ok: false, error: Some(error.to_string()) }
    }
}

//----------------------------------------------   Listener & debug  ----------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerStartResponse {
    pub ok: bool,
    pub started: bool,
    pub already_running: bool,
}

impl From<StartOutcome> for ListenerStartResponse {
    fn from(outcome: StartOutcome) -> Self {
        let already_running = outcome == StartOutcome::AlreadyRunning;
        Self { ok: true, started: !already_running, already_running }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuerInfo {
    pub network: String,
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectQuery {
    pub hash: String,
}
