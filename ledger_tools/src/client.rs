use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use log::*;
use mpt_common::Secret;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::{
    data_objects::{
        AccountInfoResponse,
        FeeResponse,
        LedgerCurrentResponse,
        SubmitResponse,
        TransactionStreamEvent,
        TxJson,
        TxResponse,
    },
    LedgerConfig,
    LedgerError,
};

const NOT_FOUND_CODES: [&str; 4] = ["txnNotFound", "entryNotFound", "actNotFound", "objectNotFound"];
const EVENT_BUFFER_SIZE: usize = 256;
const VALIDATION_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const LAST_LEDGER_OFFSET: u32 = 20;
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ResponseSender = oneshot::Sender<Result<Value, LedgerError>>;
type PendingRequests = Arc<Mutex<HashMap<u64, ResponseSender>>>;

/// Factory for connections to a rippled WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<LedgerConnection, LedgerError> {
        let timeout = self.config.timeout;
        let url = self.config.ws_url.as_str();
        trace!("🔌️ Connecting to {url}");
        let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| LedgerError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| LedgerError::Connection(e.to_string()))?;
        debug!("🔌️ Connected to {url}");
        Ok(LedgerConnection::spawn(ws_stream, timeout))
    }
}

/// A live WebSocket session. Requests are multiplexed by `id`; subscription messages are forwarded to the event
/// channel. Dropping the connection stops its background tasks.
pub struct LedgerConnection {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: PendingRequests,
    next_id: AtomicU64,
    timeout: Duration,
    events: Option<mpsc::Receiver<TransactionStreamEvent>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl LedgerConnection {
    fn spawn(ws_stream: WsStream, timeout: Duration) -> Self {
        let (mut sink, mut stream) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let pending = PendingRequests::default();

        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    debug!("🔌️ Could not write to ledger socket: {e}");
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader_pending = Arc::clone(&pending);
        let pong_tx = out_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => route_message(text.as_str(), &reader_pending, &event_tx).await,
                    Ok(Message::Ping(data)) => {
                        let _ = pong_tx.send(Message::Pong(data));
                    },
                    Ok(Message::Close(_)) => {
                        debug!("🔌️ Ledger closed the connection");
                        break;
                    },
                    Err(e) => {
                        warn!("🔌️ Ledger socket error: {e}");
                        break;
                    },
                    _ => {},
                }
            }
            fail_pending(&reader_pending);
        });

        Self {
            outgoing: out_tx,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            events: Some(event_rx),
            reader,
            writer,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `command` with the given parameters and waits (up to the configured timeout) for its result.
    pub async fn request<T: DeserializeOwned>(&self, command: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut body = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("id".into(), id.into());
        body.insert("command".into(), command.into());
        let (tx, rx) = oneshot::channel();
        self.pending.lock().map_err(|_| LedgerError::Closed)?.insert(id, tx);
        trace!("🔌️ Sending {command} (#{id})");
        self.outgoing.send(Message::Text(Value::Object(body).to_string().into())).map_err(|_| LedgerError::Closed)?;
        let result = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(LedgerError::Closed),
            Err(_) => {
                if let Ok(mut pending) = self.pending.lock() {
                    pending.remove(&id);
                }
                return Err(LedgerError::Timeout(self.timeout.as_millis() as u64));
            },
        };
        serde_json::from_value(result).map_err(|e| LedgerError::Json(format!("{command}: {e}")))
    }

    /// Subscribes to transactions affecting `account` and hands back the stream of transaction messages.
    /// The stream can only be taken once per connection.
    pub async fn subscribe_account(
        &mut self,
        account: &str,
    ) -> Result<mpsc::Receiver<TransactionStreamEvent>, LedgerError> {
        let _: Value = self.request("subscribe", json!({ "accounts": [account] })).await?;
        self.events.take().ok_or(LedgerError::Closed)
    }

    pub async fn fetch_tx(&self, hash: &str) -> Result<TxResponse, LedgerError> {
        self.request("tx", json!({ "transaction": hash })).await
    }

    /// Fills in `Sequence`, `Fee` and `LastLedgerSequence` for an unsigned transaction.
    pub async fn autofill(&self, mut tx: TxJson) -> Result<TxJson, LedgerError> {
        let account = tx.account.clone().ok_or_else(|| LedgerError::Submit("missing Account".into()))?;
        let info: AccountInfoResponse =
            self.request("account_info", json!({ "account": account, "ledger_index": "current" })).await?;
        let fee: FeeResponse = self.request("fee", json!({})).await?;
        let current: LedgerCurrentResponse = self.request("ledger_current", json!({})).await?;
        tx.sequence = Some(info.account_data.sequence);
        tx.fee = Some(fee.drops.open_ledger_fee.unwrap_or(fee.drops.base_fee));
        tx.last_ledger_sequence = Some(current.ledger_current_index + LAST_LEDGER_OFFSET);
        Ok(tx)
    }

    /// Signs and submits `tx` server-side, then polls until the transaction is in a validated ledger.
    /// Fails with [`LedgerError::Submit`] carrying the engine result if the transaction was not applied.
    pub async fn submit_and_wait(&self, tx: &TxJson, secret: &Secret<String>) -> Result<TxResponse, LedgerError> {
        let tx_type = tx.transaction_type.clone().unwrap_or_default();
        let params = json!({ "tx_json": tx, "secret": secret.reveal(), "fail_hard": true });
        let submitted: SubmitResponse = self.request("submit", params).await?;
        debug!("🔌️ Submitted {tx_type}: {} ({})", submitted.engine_result, submitted.engine_result_message);
        if !submitted.is_provisionally_ok() {
            return Err(LedgerError::Submit(submitted.engine_result));
        }
        let hash = submitted.tx_json.hash.ok_or_else(|| LedgerError::Json("submit result has no hash".into()))?;
        self.wait_for_validation(&hash).await
    }

    async fn wait_for_validation(&self, hash: &str) -> Result<TxResponse, LedgerError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.fetch_tx(hash).await {
                Ok(res) if res.validated => {
                    let result = res.meta.as_ref().and_then(|m| m.transaction_result.clone()).unwrap_or_default();
                    return if res.meta.as_ref().map(|m| m.is_success()).unwrap_or(false) {
                        info!("🔌️ Transaction {hash} validated");
                        Ok(res)
                    } else {
                        Err(LedgerError::Submit(result))
                    };
                },
                Ok(_) | Err(LedgerError::NotFound(_)) => {},
                Err(e) => return Err(e),
            }
            if Instant::now() + VALIDATION_POLL_INTERVAL > deadline {
                return Err(LedgerError::Timeout(self.timeout.as_millis() as u64));
            }
            tokio::time::sleep(VALIDATION_POLL_INTERVAL).await;
        }
    }

    /// True while the socket reader is still running.
    pub fn is_open(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Closes the socket politely. Dropping the connection has the same effect without the close handshake.
    pub async fn disconnect(mut self) {
        let _ = self.outgoing.send(Message::Close(None));
        let _ = tokio::time::timeout(CLOSE_GRACE_PERIOD, &mut self.writer).await;
        trace!("🔌️ Disconnected");
    }
}

impl Drop for LedgerConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
        fail_pending(&self.pending);
    }
}

async fn route_message(text: &str, pending: &PendingRequests, events: &mpsc::Sender<TransactionStreamEvent>) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        warn!("🔌️ Ignoring non-JSON message from ledger");
        return;
    };
    match value["type"].as_str() {
        Some("response") => {
            let Some(id) = value["id"].as_u64() else {
                return;
            };
            let sender = pending.lock().ok().and_then(|mut p| p.remove(&id));
            if let Some(sender) = sender {
                let _ = sender.send(parse_response(value));
            }
        },
        Some("transaction") => match serde_json::from_value::<TransactionStreamEvent>(value) {
            Ok(event) => {
                if events.send(event).await.is_err() {
                    trace!("🔌️ No subscriber for transaction stream");
                }
            },
            Err(e) => warn!("🔌️ Could not parse transaction stream message: {e}"),
        },
        _ => {},
    }
}

fn parse_response(mut value: Value) -> Result<Value, LedgerError> {
    if value["status"].as_str() == Some("success") {
        return Ok(value["result"].take());
    }
    let error = value["error"].as_str().unwrap_or("unknown").to_string();
    if NOT_FOUND_CODES.contains(&error.as_str()) {
        return Err(LedgerError::NotFound(error));
    }
    let message = value["error_message"].as_str().unwrap_or_default().to_string();
    Err(LedgerError::Request { error, message })
}

fn fail_pending(pending: &PendingRequests) {
    if let Ok(mut pending) = pending.lock() {
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(LedgerError::Closed));
        }
    }
}
