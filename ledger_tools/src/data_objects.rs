//! Typed views of the rippled WebSocket API responses used by the gateway.
//!
//! Only the fields the gateway reads are modelled. Everything is optional because the same structures are filled from
//! subscription messages, `tx` lookups and `account_tx` pages, which do not all carry the same fields (and API v1 and
//! v2 servers nest the transaction differently).
use serde::{Deserialize, Serialize};

pub const TX_TYPE_PAYMENT: &str = "Payment";
pub const TX_TYPE_MPT_AUTHORIZE: &str = "MPTokenAuthorize";
pub const TX_TYPE_MPT_ISSUANCE_CREATE: &str = "MPTokenIssuanceCreate";
pub const TX_TYPE_CLAWBACK: &str = "Clawback";
pub const TES_SUCCESS: &str = "tesSUCCESS";
pub const TEC_DUPLICATE: &str = "tecDUPLICATE";
pub const TEC_NO_AUTH: &str = "tecNO_AUTH";

/// MPToken ledger entry flag: the issuer has authorized this holder.
pub const LSF_MPT_AUTHORIZED: u32 = 0x0000_0002;
pub const TF_MPT_REQUIRE_AUTH: u32 = 0x0000_0004;
pub const TF_MPT_CAN_TRANSFER: u32 = 0x0000_0020;
pub const TF_MPT_CAN_CLAWBACK: u32 = 0x0000_0040;

//--------------------------------------      Transactions      ------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_max: Option<AmountField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memos: Vec<MemoWrapper>,
    #[serde(rename = "MPTokenIssuanceID", skip_serializing_if = "Option::is_none")]
    pub mpt_issuance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ledger_sequence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_pub_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_scale: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_fee: Option<u16>,
    #[serde(rename = "MPTokenMetadata", skip_serializing_if = "Option::is_none")]
    pub mpt_metadata: Option<String>,
    #[serde(rename = "hash", skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl TxJson {
    pub fn new(transaction_type: &str, account: &str) -> Self {
        Self {
            transaction_type: Some(transaction_type.to_string()),
            account: Some(account.to_string()),
            ..Default::default()
        }
    }

    pub fn is_type(&self, transaction_type: &str) -> bool {
        self.transaction_type.as_deref() == Some(transaction_type)
    }
}

/// A currency amount. The ledger encodes native amounts as a string of drops, and token amounts as objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Native(String),
    Mpt { mpt_issuance_id: String, value: String },
    Issued { currency: String, issuer: String, value: String },
}

impl AmountField {
    pub fn mpt(issuance_id: &str, value: String) -> Self {
        Self::Mpt { mpt_issuance_id: issuance_id.to_string(), value }
    }

    /// The amount in drops, if this is a native amount with a well-formed digit string.
    pub fn as_drops(&self) -> Option<&str> {
        match self {
            Self::Native(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoWrapper {
    #[serde(rename = "Memo")]
    pub memo: Memo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Memo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_format: Option<String>,
}

impl MemoWrapper {
    pub fn with_data(hex_data: String) -> Self {
        Self { memo: Memo { memo_data: Some(hex_data), ..Default::default() } }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxMeta {
    #[serde(rename = "TransactionResult")]
    pub transaction_result: Option<String>,
    pub delivered_amount: Option<AmountField>,
    pub transaction_hash: Option<String>,
}

impl TxMeta {
    pub fn is_success(&self) -> bool {
        self.transaction_result.as_deref() == Some(TES_SUCCESS)
    }
}

/// Result of the `tx` command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxResponse {
    /// API v2 servers nest the transaction here.
    #[serde(default)]
    pub tx_json: Option<TxJson>,
    /// API v1 servers put the transaction fields at the top level.
    #[serde(flatten)]
    pub inline: TxJson,
    pub meta: Option<TxMeta>,
    #[serde(default)]
    pub validated: bool,
    pub hash: Option<String>,
    pub ledger_index: Option<u32>,
}

impl TxResponse {
    pub fn transaction(&self) -> &TxJson {
        self.tx_json.as_ref().unwrap_or(&self.inline)
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash
            .as_deref()
            .or(self.transaction().hash.as_deref())
            .or_else(|| self.meta.as_ref().and_then(|m| m.transaction_hash.as_deref()))
    }
}

/// Result of `submit` in sign-and-submit mode.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub engine_result: String,
    #[serde(default)]
    pub engine_result_message: String,
    pub tx_json: TxJson,
}

impl SubmitResponse {
    /// `tes` results and queued `ter` results can still make it into a validated ledger.
    pub fn is_provisionally_ok(&self) -> bool {
        self.engine_result.starts_with("tes") || self.engine_result == "terQUEUED"
    }
}

//--------------------------------------      account_tx      ---------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountTxPage {
    #[serde(default)]
    pub transactions: Vec<AccountTxRow>,
    /// Opaque pagination marker. Absent on the last page.
    pub marker: Option<serde_json::Value>,
    pub ledger_index_min: Option<u32>,
    pub ledger_index_max: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountTxRow {
    pub tx: Option<TxJson>,
    pub tx_json: Option<TxJson>,
    pub meta: Option<TxMeta>,
    #[serde(default)]
    pub validated: bool,
    pub hash: Option<String>,
}

impl AccountTxRow {
    pub fn transaction(&self) -> Option<&TxJson> {
        self.tx_json.as_ref().or(self.tx.as_ref())
    }
}

//--------------------------------------      Streams      ------------------------------------------------------------

/// A message from the `transactions`/`accounts` subscription stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionStreamEvent {
    pub transaction: Option<TxJson>,
    pub tx_json: Option<TxJson>,
    pub meta: Option<TxMeta>,
    #[serde(default)]
    pub validated: bool,
    pub hash: Option<String>,
    pub engine_result: Option<String>,
    pub ledger_index: Option<u32>,
}

impl TransactionStreamEvent {
    pub fn transaction(&self) -> Option<&TxJson> {
        self.tx_json.as_ref().or(self.transaction.as_ref())
    }
}

//--------------------------------------     Server state     ---------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfoResponse {
    pub info: ServerInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    pub build_version: Option<String>,
    pub complete_ledgers: Option<String>,
    pub validated_ledger: Option<ValidatedLedger>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidatedLedger {
    pub seq: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfoResponse {
    pub account_data: AccountRoot,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRoot {
    pub account: String,
    pub sequence: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeResponse {
    pub drops: FeeDrops,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeDrops {
    pub base_fee: String,
    pub open_ledger_fee: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerCurrentResponse {
    pub ledger_current_index: u32,
}

//--------------------------------------     MPT ledger entries     ---------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntryResponse<T> {
    pub node: T,
    pub index: Option<String>,
}

/// A holder's MPToken ledger entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MpTokenNode {
    pub account: Option<String>,
    #[serde(rename = "MPTokenIssuanceID")]
    pub mpt_issuance_id: Option<String>,
    #[serde(rename = "MPTAmount")]
    pub mpt_amount: Option<String>,
    #[serde(default)]
    pub flags: u32,
}

impl MpTokenNode {
    pub fn is_authorized(&self) -> bool {
        self.flags & LSF_MPT_AUTHORIZED != 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountObjectsResponse<T> {
    #[serde(default = "Vec::new")]
    pub account_objects: Vec<T>,
    pub marker: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MpTokenIssuanceNode {
    pub mpt_issuance_id: Option<String>,
    #[serde(rename = "MPTokenIssuanceID")]
    pub alt_issuance_id: Option<String>,
    #[serde(rename = "Flags", default)]
    pub flags: u32,
    #[serde(rename = "Sequence", default)]
    pub sequence: u32,
}

impl MpTokenIssuanceNode {
    pub fn id(&self) -> Option<&str> {
        self.mpt_issuance_id.as_deref().or(self.alt_issuance_id.as_deref())
    }

    pub fn has_flags(&self, flags: u32) -> bool {
        self.flags & flags == flags
    }
}
