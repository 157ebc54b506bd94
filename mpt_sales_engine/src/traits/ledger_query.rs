use ledger_tools::{
    data_objects::{AccountTxPage, TxResponse},
    LedgerError,
};
use serde_json::Value;

#[allow(async_fn_in_trait)]
pub trait LedgerQuery: Clone {
    /// Looks up a single transaction by hash. Unknown hashes produce [`LedgerError::NotFound`].
    async fn fetch_transaction(&self, hash: &str) -> Result<TxResponse, LedgerError>;

    /// The sequence number of the most recent validated ledger.
    async fn validated_ledger_index(&self) -> Result<u32, LedgerError>;

    /// One page of `account`'s transaction history within `[min_ledger, max_ledger]`, newest first.
    ///
    /// Pass the previous page's `marker` to continue; a page without a marker is the last one.
    async fn account_transactions(
        &self,
        account: &str,
        min_ledger: u32,
        max_ledger: u32,
        marker: Option<Value>,
    ) -> Result<AccountTxPage, LedgerError>;
}
