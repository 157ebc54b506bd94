use ledger_tools::{
    data_objects::{MpTokenIssuanceNode, MpTokenNode, TxJson},
    LedgerError,
};

use crate::traits::{GrantOutcome, NewIssuance};

/// Ledger operations performed as (or on behalf of) the token issuer.
///
/// Amounts are raw ledger values, i.e. already multiplied by the token scale.
#[allow(async_fn_in_trait)]
pub trait IssuerOperations: Clone {
    /// The issuer's classic address.
    fn issuer_address(&self) -> &str;

    /// Authorizes `holder` to hold `issuance_id`. A holder that is already authorized is not an error.
    async fn grant_holder(&self, issuance_id: &str, holder: &str) -> Result<GrantOutcome, LedgerError>;

    /// Sends MPT from the issuer to `destination` and returns the validated transaction hash.
    async fn send_mpt(&self, issuance_id: &str, destination: &str, ledger_value: &str) -> Result<String, LedgerError>;

    /// Claws back MPT from `holder` and returns the validated transaction hash.
    async fn clawback_mpt(&self, issuance_id: &str, holder: &str, ledger_value: &str)
        -> Result<String, LedgerError>;

    /// The holder's MPToken entry, or `None` if the holder has not opted in.
    async fn mpt_token_entry(&self, issuance_id: &str, account: &str) -> Result<Option<MpTokenNode>, LedgerError>;

    async fn list_issuances(&self) -> Result<Vec<MpTokenIssuanceNode>, LedgerError>;

    /// Submits `MPTokenIssuanceCreate` with the given flags and returns the validated transaction hash.
    async fn create_issuance(&self, params: &NewIssuance, flags: u32) -> Result<String, LedgerError>;

    /// Builds an autofilled, unsigned `MPTokenAuthorize` for the holder to sign in their own wallet.
    async fn prepare_holder_opt_in(&self, issuance_id: &str, holder: &str) -> Result<TxJson, LedgerError>;
}
