use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use ledger_tools::{
    data_objects::{
        AccountTxPage,
        AccountTxRow,
        AmountField,
        MpTokenIssuanceNode,
        MpTokenNode,
        TransactionStreamEvent,
        TxJson,
        TxMeta,
        TxResponse,
        LSF_MPT_AUTHORIZED,
        TES_SUCCESS,
        TEC_NO_AUTH,
        TX_TYPE_MPT_AUTHORIZE,
        TX_TYPE_PAYMENT,
    },
    LedgerError,
    PayloadStatus,
    SignRequestResponse,
    XummError,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::{
    helpers::PurchaseMemo,
    traits::{GrantOutcome, IssuerOperations, LedgerQuery, LedgerSubscriber, NewIssuance, SignRelay},
};

const HISTORY_PAGE_SIZE: usize = 2;
const TEC_OBJECT_NOT_FOUND: &str = "tecOBJECT_NOT_FOUND";

/// A validated, successful payment from `holder` to `destination` carrying a purchase memo.
pub fn purchase_tx(holder: &str, destination: &str, drops: &str, memo: &PurchaseMemo) -> TxJson {
    let mut tx = TxJson::new(TX_TYPE_PAYMENT, holder);
    tx.destination = Some(destination.to_string());
    tx.amount = Some(AmountField::Native(drops.to_string()));
    tx.memos = vec![memo.to_memo()];
    tx
}

pub fn success_meta() -> TxMeta {
    TxMeta { transaction_result: Some(TES_SUCCESS.to_string()), ..Default::default() }
}

#[derive(Default)]
struct FakeLedgerState {
    validated_index: u32,
    transactions: HashMap<String, TxResponse>,
    history: Vec<AccountTxRow>,
    scanned_ranges: Vec<(u32, u32)>,
    live: Option<mpsc::Sender<TransactionStreamEvent>>,
    subscriptions: usize,
    tokens: HashMap<(String, String), MpTokenNode>,
    issuances: Vec<MpTokenIssuanceNode>,
    created: Vec<(NewIssuance, u32)>,
    grants: Vec<(String, String)>,
    sends: Vec<(String, String, String)>,
    clawbacks: Vec<(String, String, String)>,
    grants_ineffective: bool,
    send_delay: Option<Duration>,
    next_error: Option<LedgerError>,
    history_failure: Option<(usize, LedgerError)>,
    tx_counter: u64,
}

/// An in-memory ledger. Clones share state, so a test can keep one handle and give another to the code under test.
#[derive(Clone)]
pub struct FakeLedger {
    issuer: String,
    state: Arc<Mutex<FakeLedgerState>>,
}

impl FakeLedger {
    pub fn new(issuer: &str) -> Self {
        let state = FakeLedgerState { validated_index: 100_000, ..Default::default() };
        Self { issuer: issuer.to_string(), state: Arc::new(Mutex::new(state)) }
    }

    fn state(&self) -> MutexGuard<'_, FakeLedgerState> {
        self.state.lock().expect("fake ledger lock poisoned")
    }

    fn check_error(&self) -> Result<(), LedgerError> {
        match self.state().next_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn next_hash(&self) -> String {
        let mut state = self.state();
        state.tx_counter += 1;
        format!("{:064X}", state.tx_counter)
    }

    //----------------------------------------   Test setup   -------------------------------------------------------

    /// The next ledger call fails with `err`.
    pub fn fail_next(&self, err: LedgerError) {
        self.state().next_error = Some(err);
    }

    /// Makes the history read for the zero-based `page` of the next rescan fail with `err`.
    pub fn fail_history_page(&self, page: usize, err: LedgerError) {
        let mut state = self.state();
        let page = state.scanned_ranges.len() + page;
        state.history_failure = Some((page, err));
    }

    pub fn set_validated_index(&self, index: u32) {
        self.state().validated_index = index;
    }

    pub fn add_transaction(&self, hash: &str, tx: TxJson, validated: bool) {
        let response = TxResponse {
            tx_json: Some(tx),
            meta: Some(success_meta()),
            validated,
            hash: Some(hash.to_string()),
            ..Default::default()
        };
        self.state().transactions.insert(hash.to_uppercase(), response);
    }

    /// Adds a validated transaction to the issuer's account history, newest last.
    pub fn add_history(&self, hash: &str, tx: TxJson) {
        let row = AccountTxRow {
            tx_json: Some(tx),
            meta: Some(success_meta()),
            validated: true,
            hash: Some(hash.to_string()),
            ..Default::default()
        };
        self.state().history.push(row);
    }

    /// Pushes a transaction onto the live stream. Returns false if nobody is subscribed.
    pub async fn push_live(&self, hash: &str, tx: TxJson) -> bool {
        let sender = self.state().live.clone();
        let Some(sender) = sender else {
            return false;
        };
        let event = TransactionStreamEvent {
            transaction: Some(tx),
            meta: Some(success_meta()),
            validated: true,
            hash: Some(hash.to_string()),
            engine_result: Some(TES_SUCCESS.to_string()),
            ..Default::default()
        };
        sender.send(event).await.is_ok()
    }

    /// Ends the live stream, as a dropped WebSocket would.
    pub fn close_stream(&self) {
        self.state().live = None;
    }

    pub fn subscriptions(&self) -> usize {
        self.state().subscriptions
    }

    pub fn scanned_ranges(&self) -> Vec<(u32, u32)> {
        self.state().scanned_ranges.clone()
    }

    /// The holder creates their MPToken entry, unauthorized.
    pub fn opt_in(&self, issuance_id: &str, holder: &str) {
        let node = MpTokenNode {
            account: Some(holder.to_string()),
            mpt_issuance_id: Some(issuance_id.to_string()),
            mpt_amount: None,
            flags: 0,
        };
        self.state().tokens.insert((issuance_id.to_string(), holder.to_string()), node);
    }

    /// Marks an existing MPToken entry as authorized without recording a grant.
    pub fn authorize(&self, issuance_id: &str, holder: &str) {
        if let Some(node) = self.state().tokens.get_mut(&(issuance_id.to_string(), holder.to_string())) {
            node.flags |= LSF_MPT_AUTHORIZED;
        }
    }

    pub fn add_issuance(&self, issuance: MpTokenIssuanceNode) {
        self.state().issuances.push(issuance);
    }

    /// Grants are accepted by the ledger but leave the holder unauthorized.
    pub fn set_grants_ineffective(&self, ineffective: bool) {
        self.state().grants_ineffective = ineffective;
    }

    /// MPT payments take this long to validate.
    pub fn set_send_delay(&self, delay: Duration) {
        self.state().send_delay = Some(delay);
    }

    pub fn grants(&self) -> Vec<(String, String)> {
        self.state().grants.clone()
    }

    pub fn sends(&self) -> Vec<(String, String, String)> {
        self.state().sends.clone()
    }

    pub fn clawbacks(&self) -> Vec<(String, String, String)> {
        self.state().clawbacks.clone()
    }

    pub fn created_issuances(&self) -> Vec<(NewIssuance, u32)> {
        self.state().created.clone()
    }

    fn adjust_balance(&self, issuance_id: &str, holder: &str, delta: i128) -> Result<(), LedgerError> {
        let mut state = self.state();
        let node = state
            .tokens
            .get_mut(&(issuance_id.to_string(), holder.to_string()))
            .ok_or_else(|| LedgerError::Submit(TEC_OBJECT_NOT_FOUND.to_string()))?;
        let current = node.mpt_amount.as_deref().and_then(|v| v.parse::<i128>().ok()).unwrap_or(0);
        node.mpt_amount = Some((current + delta).max(0).to_string());
        Ok(())
    }
}

impl LedgerQuery for FakeLedger {
    async fn fetch_transaction(&self, hash: &str) -> Result<TxResponse, LedgerError> {
        self.check_error()?;
        self.state().transactions.get(&hash.to_uppercase()).cloned().ok_or_else(|| LedgerError::NotFound(hash.into()))
    }

    async fn validated_ledger_index(&self) -> Result<u32, LedgerError> {
        self.check_error()?;
        Ok(self.state().validated_index)
    }

    async fn account_transactions(
        &self,
        _account: &str,
        min_ledger: u32,
        max_ledger: u32,
        marker: Option<Value>,
    ) -> Result<AccountTxPage, LedgerError> {
        self.check_error()?;
        let mut state = self.state();
        if state.history_failure.as_ref().is_some_and(|(page, _)| *page == state.scanned_ranges.len()) {
            if let Some((_, err)) = state.history_failure.take() {
                return Err(err);
            }
        }
        state.scanned_ranges.push((min_ledger, max_ledger));
        let offset = marker.and_then(|m| m.as_u64()).unwrap_or(0) as usize;
        let newest_first = state.history.iter().rev().cloned().collect::<Vec<AccountTxRow>>();
        let end = (offset + HISTORY_PAGE_SIZE).min(newest_first.len());
        let transactions = newest_first.get(offset..end).map(<[AccountTxRow]>::to_vec).unwrap_or_default();
        let marker = (end < newest_first.len()).then(|| json!(end));
        Ok(AccountTxPage {
            transactions,
            marker,
            ledger_index_min: Some(min_ledger),
            ledger_index_max: Some(max_ledger),
        })
    }
}

impl LedgerSubscriber for FakeLedger {
    async fn subscribe(&self, _account: &str) -> Result<mpsc::Receiver<TransactionStreamEvent>, LedgerError> {
        self.check_error()?;
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.state();
        state.live = Some(tx);
        state.subscriptions += 1;
        Ok(rx)
    }
}

impl IssuerOperations for FakeLedger {
    fn issuer_address(&self) -> &str {
        &self.issuer
    }

    async fn grant_holder(&self, issuance_id: &str, holder: &str) -> Result<GrantOutcome, LedgerError> {
        self.check_error()?;
        let hash = self.next_hash();
        let mut state = self.state();
        let ineffective = state.grants_ineffective;
        let key = (issuance_id.to_string(), holder.to_string());
        let node = state.tokens.get_mut(&key).ok_or_else(|| LedgerError::Submit(TEC_OBJECT_NOT_FOUND.into()))?;
        if node.is_authorized() {
            return Ok(GrantOutcome::AlreadyGranted);
        }
        if !ineffective {
            node.flags |= LSF_MPT_AUTHORIZED;
        }
        state.grants.push(key);
        Ok(GrantOutcome::Granted(hash))
    }

    async fn send_mpt(&self, issuance_id: &str, destination: &str, ledger_value: &str) -> Result<String, LedgerError> {
        self.check_error()?;
        let delay = self.state().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let authorized = self
            .state()
            .tokens
            .get(&(issuance_id.to_string(), destination.to_string()))
            .is_some_and(|n| n.is_authorized());
        if !authorized {
            return Err(LedgerError::Submit(TEC_NO_AUTH.into()));
        }
        let delta = ledger_value.parse::<i128>().map_err(|e| LedgerError::Json(e.to_string()))?;
        self.adjust_balance(issuance_id, destination, delta)?;
        self.state().sends.push((issuance_id.into(), destination.into(), ledger_value.into()));
        Ok(self.next_hash())
    }

    async fn clawback_mpt(
        &self,
        issuance_id: &str,
        holder: &str,
        ledger_value: &str,
    ) -> Result<String, LedgerError> {
        self.check_error()?;
        let delta = ledger_value.parse::<i128>().map_err(|e| LedgerError::Json(e.to_string()))?;
        self.adjust_balance(issuance_id, holder, -delta)?;
        self.state().clawbacks.push((issuance_id.into(), holder.into(), ledger_value.into()));
        Ok(self.next_hash())
    }

    async fn mpt_token_entry(&self, issuance_id: &str, account: &str) -> Result<Option<MpTokenNode>, LedgerError> {
        self.check_error()?;
        Ok(self.state().tokens.get(&(issuance_id.to_string(), account.to_string())).cloned())
    }

    async fn list_issuances(&self) -> Result<Vec<MpTokenIssuanceNode>, LedgerError> {
        self.check_error()?;
        Ok(self.state().issuances.clone())
    }

    async fn create_issuance(&self, params: &NewIssuance, flags: u32) -> Result<String, LedgerError> {
        self.check_error()?;
        let hash = self.next_hash();
        let mut state = self.state();
        let sequence = state.issuances.iter().map(|i| i.sequence).max().unwrap_or(0) + 1;
        state.issuances.push(MpTokenIssuanceNode {
            mpt_issuance_id: Some(format!("{sequence:08X}{:040X}", 0xC0FFEEu32)),
            flags,
            sequence,
            ..Default::default()
        });
        state.created.push((params.clone(), flags));
        Ok(hash)
    }

    async fn prepare_holder_opt_in(&self, issuance_id: &str, holder: &str) -> Result<TxJson, LedgerError> {
        self.check_error()?;
        let mut tx = TxJson::new(TX_TYPE_MPT_AUTHORIZE, holder);
        tx.mpt_issuance_id = Some(issuance_id.to_string());
        tx.fee = Some("12".to_string());
        tx.sequence = Some(1);
        tx.last_ledger_sequence = Some(self.state().validated_index + 20);
        tx.signing_pub_key = Some(String::new());
        tx.txn_signature = Some(String::new());
        Ok(tx)
    }
}

//----------------------------------------   Sign relay   --------------------------------------------------------------

struct FakeRelayState {
    response: Result<SignRequestResponse, XummError>,
    statuses: HashMap<String, PayloadStatus>,
    requests: Vec<(TxJson, Option<u64>)>,
}

/// A sign relay that hands out a canned response and records every request.
#[derive(Clone)]
pub struct FakeRelay {
    state: Arc<Mutex<FakeRelayState>>,
}

impl FakeRelay {
    pub fn new(response: Result<SignRequestResponse, XummError>) -> Self {
        let state = FakeRelayState { response, statuses: HashMap::new(), requests: Vec::new() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn state(&self) -> MutexGuard<'_, FakeRelayState> {
        self.state.lock().expect("fake relay lock poisoned")
    }

    pub fn set_status(&self, status: PayloadStatus) {
        self.state().statuses.insert(status.uuid.clone(), status);
    }

    pub fn requests(&self) -> Vec<(TxJson, Option<u64>)> {
        self.state().requests.clone()
    }
}

impl SignRelay for FakeRelay {
    async fn create_sign_request(
        &self,
        txjson: &TxJson,
        expires_in: Option<u64>,
    ) -> Result<SignRequestResponse, XummError> {
        let mut state = self.state();
        state.requests.push((txjson.clone(), expires_in));
        state.response.clone()
    }

    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, XummError> {
        self.state().statuses.get(uuid).cloned().ok_or(XummError::NotFound)
    }
}
