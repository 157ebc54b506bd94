use ledger_tools::data_objects::{AccountTxRow, TransactionStreamEvent, TxJson, TxMeta, TxResponse};

/// A transaction as the ingestion engine sees it, regardless of which ledger API delivered it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentEvent {
    pub tx: TxJson,
    pub meta: Option<TxMeta>,
    pub validated: bool,
    pub hash: Option<String>,
}

impl PaymentEvent {
    pub fn new(tx: TxJson, meta: Option<TxMeta>, validated: bool, hash: Option<String>) -> Self {
        let hash = hash
            .or_else(|| tx.hash.clone())
            .or_else(|| meta.as_ref().and_then(|m| m.transaction_hash.clone()))
            .filter(|h| !h.trim().is_empty());
        Self { tx, meta, validated, hash }
    }

    pub fn from_stream(event: TransactionStreamEvent) -> Self {
        let TransactionStreamEvent { transaction, tx_json, meta, validated, hash, .. } = event;
        Self::new(tx_json.or(transaction).unwrap_or_default(), meta, validated, hash)
    }

    /// A `tx` lookup result. A response without a `validated` field counts as not validated.
    pub fn from_tx_response(response: TxResponse) -> Self {
        let TxResponse { tx_json, inline, meta, validated, hash, .. } = response;
        Self::new(tx_json.unwrap_or(inline), meta, validated, hash)
    }

    pub fn from_account_tx(row: AccountTxRow) -> Self {
        let AccountTxRow { tx, tx_json, meta, validated, hash } = row;
        Self::new(tx_json.or(tx).unwrap_or_default(), meta, validated, hash)
    }

    pub fn engine_result(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.transaction_result.as_deref())
    }

    /// The native amount paid, in drops: `Amount`, then `DeliverMax`, then the metadata's `delivered_amount`.
    pub fn native_amount(&self) -> Option<&str> {
        self.tx
            .amount
            .as_ref()
            .and_then(|a| a.as_drops())
            .or_else(|| self.tx.deliver_max.as_ref().and_then(|a| a.as_drops()))
            .or_else(|| self.meta.as_ref().and_then(|m| m.delivered_amount.as_ref()).and_then(|a| a.as_drops()))
    }
}
