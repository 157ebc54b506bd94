use ledger_tools::{data_objects::TransactionStreamEvent, LedgerError};
use tokio::sync::mpsc;

#[allow(async_fn_in_trait)]
pub trait LedgerSubscriber: Clone {
    /// Subscribes to every transaction affecting `account`. The channel closes when the underlying stream ends.
    async fn subscribe(&self, account: &str) -> Result<mpsc::Receiver<TransactionStreamEvent>, LedgerError>;
}
