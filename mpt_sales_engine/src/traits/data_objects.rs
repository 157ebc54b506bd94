use serde::{Deserialize, Serialize};

/// Result of asking the ledger to authorize a holder for an issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GrantOutcome {
    /// The authorization transaction was validated. Carries its hash.
    Granted(String),
    /// The holder was authorized before (`tecDUPLICATE`).
    AlreadyGranted,
}

/// Parameters for a new MPT issuance. Unset fields take the issuer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssuance {
    pub asset_scale: Option<u8>,
    pub maximum_amount: Option<String>,
    pub transfer_fee: Option<u16>,
    pub metadata_hex: Option<String>,
}
