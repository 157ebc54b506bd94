//! [`XrplLedger`] backs the engine's ledger traits with a rippled WebSocket endpoint.
//!
//! Every call opens its own connection and closes it when done. The live subscription is the exception: its
//! connection is owned by a forwarding task and lives until the stream ends or the receiver is dropped.
use ledger_tools::{
    data_objects::{
        AccountObjectsResponse,
        AccountTxPage,
        AmountField,
        LedgerEntryResponse,
        MpTokenIssuanceNode,
        MpTokenNode,
        ServerInfoResponse,
        TransactionStreamEvent,
        TxJson,
        TxResponse,
        TEC_DUPLICATE,
        TX_TYPE_CLAWBACK,
        TX_TYPE_MPT_AUTHORIZE,
        TX_TYPE_MPT_ISSUANCE_CREATE,
        TX_TYPE_PAYMENT,
    },
    LedgerClient,
    LedgerConfig,
    LedgerConnection,
    LedgerError,
};
use log::*;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::traits::{GrantOutcome, IssuerOperations, LedgerQuery, LedgerSubscriber, NewIssuance};

const ACCOUNT_TX_PAGE_SIZE: u32 = 200;
const STREAM_BUFFER_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct XrplLedger {
    client: LedgerClient,
}

impl XrplLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { client: LedgerClient::new(config) }
    }

    pub fn config(&self) -> &LedgerConfig {
        self.client.config()
    }

    async fn submit(&self, conn: &LedgerConnection, tx: TxJson) -> Result<TxResponse, LedgerError> {
        let tx_type = tx.transaction_type.clone().unwrap_or_default();
        debug!("⛓️ Submitting {tx_type} as {}", self.issuer_address());
        conn.submit_and_wait(&tx, &self.config().issuer_seed).await.map_err(|e| {
            warn!("⛓️ {tx_type} failed: {e}");
            e
        })
    }

    /// Submits an issuer transaction on a fresh connection and returns its hash.
    async fn submit_issuer_tx(&self, tx: TxJson) -> Result<String, LedgerError> {
        let conn = self.client.connect().await?;
        let result = self.submit(&conn, tx).await;
        conn.disconnect().await;
        let response = result?;
        response.hash().map(String::from).ok_or_else(|| LedgerError::Json("validated transaction has no hash".into()))
    }
}

impl LedgerQuery for XrplLedger {
    async fn fetch_transaction(&self, hash: &str) -> Result<TxResponse, LedgerError> {
        let conn = self.client.connect().await?;
        let result = conn.fetch_tx(hash).await;
        conn.disconnect().await;
        result
    }

    async fn validated_ledger_index(&self) -> Result<u32, LedgerError> {
        let conn = self.client.connect().await?;
        let result = conn.request::<ServerInfoResponse>("server_info", json!({})).await;
        conn.disconnect().await;
        let info = result?.info;
        info.validated_ledger
            .map(|l| l.seq)
            .or_else(|| {
                // e.g. "32570-93827105"
                info.complete_ledgers.as_deref().and_then(|r| r.rsplit('-').next()).and_then(|s| s.parse().ok())
            })
            .ok_or_else(|| LedgerError::NotFound("validated ledger".into()))
    }

    async fn account_transactions(
        &self,
        account: &str,
        min_ledger: u32,
        max_ledger: u32,
        marker: Option<Value>,
    ) -> Result<AccountTxPage, LedgerError> {
        let mut params = json!({
            "account": account,
            "ledger_index_min": min_ledger,
            "ledger_index_max": max_ledger,
            "limit": ACCOUNT_TX_PAGE_SIZE,
            "forward": false,
            "binary": false,
        });
        if let Some(marker) = marker {
            params["marker"] = marker;
        }
        let conn = self.client.connect().await?;
        let result = conn.request("account_tx", params).await;
        conn.disconnect().await;
        result
    }
}

impl LedgerSubscriber for XrplLedger {
    async fn subscribe(&self, account: &str) -> Result<mpsc::Receiver<TransactionStreamEvent>, LedgerError> {
        let mut conn = self.client.connect().await?;
        let mut upstream = conn.subscribe_account(account).await?;
        info!("⛓️ Subscribed to transactions for {account}");
        let (tx, rx) = mpsc::channel(STREAM_BUFFER_SIZE);
        tokio::spawn(async move {
            while let Some(event) = upstream.recv().await {
                if tx.send(event).await.is_err() {
                    debug!("⛓️ Transaction stream consumer went away");
                    break;
                }
            }
            conn.disconnect().await;
            info!("⛓️ Transaction stream closed");
        });
        Ok(rx)
    }
}

impl IssuerOperations for XrplLedger {
    fn issuer_address(&self) -> &str {
        &self.config().issuer_address
    }

    async fn grant_holder(&self, issuance_id: &str, holder: &str) -> Result<GrantOutcome, LedgerError> {
        let mut tx = TxJson::new(TX_TYPE_MPT_AUTHORIZE, self.issuer_address());
        tx.mpt_issuance_id = Some(issuance_id.to_string());
        tx.holder = Some(holder.to_string());
        match self.submit_issuer_tx(tx).await {
            Ok(hash) => Ok(GrantOutcome::Granted(hash)),
            Err(e) if e.engine_result() == Some(TEC_DUPLICATE) => Ok(GrantOutcome::AlreadyGranted),
            Err(e) => Err(e),
        }
    }

    async fn send_mpt(&self, issuance_id: &str, destination: &str, ledger_value: &str) -> Result<String, LedgerError> {
        let mut tx = TxJson::new(TX_TYPE_PAYMENT, self.issuer_address());
        tx.destination = Some(destination.to_string());
        tx.amount = Some(AmountField::mpt(issuance_id, ledger_value.to_string()));
        self.submit_issuer_tx(tx).await
    }

    async fn clawback_mpt(
        &self,
        issuance_id: &str,
        holder: &str,
        ledger_value: &str,
    ) -> Result<String, LedgerError> {
        let mut tx = TxJson::new(TX_TYPE_CLAWBACK, self.issuer_address());
        tx.amount = Some(AmountField::mpt(issuance_id, ledger_value.to_string()));
        tx.holder = Some(holder.to_string());
        self.submit_issuer_tx(tx).await
    }

    async fn mpt_token_entry(&self, issuance_id: &str, account: &str) -> Result<Option<MpTokenNode>, LedgerError> {
        let params = json!({
            "mptoken": { "mpt_issuance_id": issuance_id, "account": account },
            "ledger_index": "validated",
        });
        let conn = self.client.connect().await?;
        let result = conn.request::<LedgerEntryResponse<MpTokenNode>>("ledger_entry", params).await;
        conn.disconnect().await;
        match result {
            Ok(entry) => Ok(Some(entry.node)),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_issuances(&self) -> Result<Vec<MpTokenIssuanceNode>, LedgerError> {
        let params = json!({
            "account": self.issuer_address(),
            "ledger_index": "validated",
            "type": "mpt_issuance",
        });
        let conn = self.client.connect().await?;
        let result = conn.request::<AccountObjectsResponse<MpTokenIssuanceNode>>("account_objects", params).await;
        conn.disconnect().await;
        Ok(result?.account_objects)
    }

    async fn create_issuance(&self, params: &NewIssuance, flags: u32) -> Result<String, LedgerError> {
        let mut tx = TxJson::new(TX_TYPE_MPT_ISSUANCE_CREATE, self.issuer_address());
        tx.asset_scale = params.asset_scale;
        tx.maximum_amount = params.maximum_amount.clone();
        tx.transfer_fee = params.transfer_fee;
        tx.mpt_metadata = params.metadata_hex.clone();
        tx.flags = Some(flags);
        self.submit_issuer_tx(tx).await
    }

    async fn prepare_holder_opt_in(&self, issuance_id: &str, holder: &str) -> Result<TxJson, LedgerError> {
        let mut tx = TxJson::new(TX_TYPE_MPT_AUTHORIZE, holder);
        tx.mpt_issuance_id = Some(issuance_id.to_string());
        let conn = self.client.connect().await?;
        let result = conn.autofill(tx).await;
        conn.disconnect().await;
        let mut prepared = result?;
        // The holder's wallet supplies both when signing
        prepared.signing_pub_key = Some(String::new());
        prepared.txn_signature = Some(String::new());
        Ok(prepared)
    }
}
