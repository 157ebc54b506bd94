use ledger_tools::{
    data_objects::{AccountTxPage, MpTokenIssuanceNode, MpTokenNode, TransactionStreamEvent, TxJson, TxResponse},
    LedgerError,
};
use mockall::mock;
use mpt_sales_engine::traits::{GrantOutcome, IssuerOperations, LedgerQuery, LedgerSubscriber, NewIssuance};
use serde_json::Value;
use tokio::sync::mpsc;

mock! {
    pub Ledger {}
    impl Clone for Ledger {
        fn clone(&self) -> Self;
    }
    impl LedgerQuery for Ledger {
        async fn fetch_transaction(&self, hash: &str) -> Result<TxResponse, LedgerError>;
        async fn validated_ledger_index(&self) -> Result<u32, LedgerError>;
        async fn account_transactions(&self, account: &str, min_ledger: u32, max_ledger: u32, marker: Option<Value>) -> Result<AccountTxPage, LedgerError>;
    }
    impl LedgerSubscriber for Ledger {
        async fn subscribe(&self, account: &str) -> Result<mpsc::Receiver<TransactionStreamEvent>, LedgerError>;
    }
    impl IssuerOperations for Ledger {
        fn issuer_address(&self) -> &str;
        async fn grant_holder(&self, issuance_id: &str, holder: &str) -> Result<GrantOutcome, LedgerError>;
        async fn send_mpt(&self, issuance_id: &str, destination: &str, ledger_value: &str) -> Result<String, LedgerError>;
        async fn clawback_mpt(&self, issuance_id: &str, holder: &str, ledger_value: &str) -> Result<String, LedgerError>;
        async fn mpt_token_entry(&self, issuance_id: &str, account: &str) -> Result<Option<MpTokenNode>, LedgerError>;
        async fn list_issuances(&self) -> Result<Vec<MpTokenIssuanceNode>, LedgerError>;
        async fn create_issuance(&self, params: &NewIssuance, flags: u32) -> Result<String, LedgerError>;
        async fn prepare_holder_opt_in(&self, issuance_id: &str, holder: &str) -> Result<TxJson, LedgerError>;
    }
}
