//! The three ways payments reach the ingestion engine: the live subscription, a manual lookup by hash, and a
//! paginated rescan of the issuer's recent history.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::*;
use mpt_common::drops_to_display;
use serde_json::Value;

use crate::{
    helpers::{assert_tx_hash, parse_purchase_memo},
    ingest::{IngestOutcome, IngestSource, IngestionEngine, PaymentEvent},
    mpt_api::{
        api_objects::{RescanSummary, StartOutcome, TxInspection},
        errors::ListenerError,
    },
    traits::{LedgerQuery, LedgerSubscriber},
};

pub const DEFAULT_RESCAN_LOOKBACK: u32 = 5_000;
pub const MIN_RESCAN_LOOKBACK: u32 = 100;
pub const MAX_RESCAN_LOOKBACK: u32 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescanConfig {
    pub default_lookback: u32,
    pub min_lookback: u32,
    pub max_lookback: u32,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            default_lookback: DEFAULT_RESCAN_LOOKBACK,
            min_lookback: MIN_RESCAN_LOOKBACK,
            max_lookback: MAX_RESCAN_LOOKBACK,
        }
    }
}

impl RescanConfig {
    /// The number of ledgers to scan for a requested lookback, kept within the configured bounds.
    pub fn lookback(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default_lookback).max(self.min_lookback).min(self.max_lookback)
    }
}

#[derive(Clone)]
pub struct PaymentListener<L> {
    ledger: L,
    engine: IngestionEngine,
    rescan: RescanConfig,
    running: Arc<AtomicBool>,
}

impl<L> PaymentListener<L> {
    pub fn new(ledger: L, engine: IngestionEngine, rescan: RescanConfig) -> Self {
        Self { ledger, engine, rescan, running: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn engine(&self) -> &IngestionEngine {
        &self.engine
    }
}

impl<L> PaymentListener<L>
where L: LedgerQuery + LedgerSubscriber
{
    /// Starts the live subscription unless it is already running. Concurrent callers race on a single flag, so only
    /// one of them subscribes.
    ///
    /// The flag is cleared when the stream ends (or the subscription fails), so a later call starts a fresh one.
    pub async fn ensure_started(&self) -> Result<StartOutcome, ListenerError> {
        if self.running.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            trace!("👂️ Payment listener is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        let issuer = self.engine.issuer().to_string();
        let mut stream = match self.ledger.subscribe(&issuer).await {
            Ok(stream) => stream,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                error!("👂️ Could not subscribe to payments for {issuer}: {e}");
                return Err(e.into());
            },
        };
        let engine = self.engine.clone();
        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            info!("👂️ Listening for payments to {issuer}");
            while let Some(message) = stream.recv().await {
                if let Err(e) = engine.ingest(PaymentEvent::from_stream(message), IngestSource::Live).await {
                    error!("👂️ Could not ingest live payment: {e}");
                }
            }
            running.store(false, Ordering::SeqCst);
            warn!("👂️ Payment stream for {issuer} ended. The listener will restart on the next trigger.");
        });
        Ok(StartOutcome::Started)
    }

    /// Looks up one transaction and offers it to the engine.
    pub async fn ingest_by_hash(&self, hash: &str) -> Result<IngestOutcome, ListenerError> {
        assert_tx_hash(hash)?;
        let response = self.ledger.fetch_transaction(hash).await?;
        let outcome = self.engine.ingest(PaymentEvent::from_tx_response(response), IngestSource::Manual).await?;
        Ok(outcome)
    }

    /// Explains how the engine would treat a transaction, without recording it.
    pub async fn inspect(&self, hash: &str) -> Result<TxInspection, ListenerError> {
        assert_tx_hash(hash)?;
        let response = self.ledger.fetch_transaction(hash).await?;
        let event = PaymentEvent::from_tx_response(response);
        let outcome = self.engine.preview(&event)?;
        let issuer = self.engine.issuer().to_string();
        let amount_drops = event.native_amount().map(String::from);
        let amount_display = amount_drops.as_deref().and_then(|d| drops_to_display(d).ok());
        Ok(TxInspection {
            hash: hash.to_uppercase(),
            validated: event.validated,
            tx_type: event.tx.transaction_type.clone(),
            destination_ok: event.tx.destination.as_deref() == Some(issuer.as_str()),
            destination: event.tx.destination.clone(),
            result_code: event.engine_result().map(String::from),
            amount_drops,
            amount_display,
            purchase_memo: parse_purchase_memo(&event.tx.memos).map(|m| m.to_string()),
            outcome: outcome.label(),
            reason: outcome.reason().map(|r| r.as_str().to_string()),
            issuer,
        })
    }

    /// Re-reads the issuer's history over the last `lookback` validated ledgers and ingests every transaction found.
    /// Already-ingested payments are reported as duplicates by the engine, so rescans can be repeated safely.
    ///
    /// If the first history page cannot be read, the error is returned. A failure on a later page ends the rescan
    /// early: the summary of the pages already ingested is returned with `interrupted` set.
    pub async fn rescan(&self, lookback: Option<u32>) -> Result<RescanSummary, ListenerError> {
        let max = self.ledger.validated_ledger_index().await?;
        let lookback = self.rescan.lookback(lookback);
        let min = max.saturating_sub(lookback);
        let issuer = self.engine.issuer();
        info!("🔍️ Rescanning ledgers {min}..={max} for payments to {issuer}");
        let mut summary = RescanSummary { min, max, ..Default::default() };
        let mut marker: Option<Value> = None;
        loop {
            let page = match self.ledger.account_transactions(issuer, min, max, marker.clone()).await {
                Ok(page) => page,
                Err(e) if marker.is_some() => {
                    warn!(
                        "🔍️ Rescan of {min}..={max} interrupted after {} rows ({} added). {e}",
                        summary.scanned, summary.added
                    );
                    summary.interrupted = Some(e.to_string());
                    return Ok(summary);
                },
                Err(e) => return Err(e.into()),
            };
            for row in page.transactions {
                summary.scanned += 1;
                match self.engine.ingest(PaymentEvent::from_account_tx(row), IngestSource::Rescan).await {
                    Ok(outcome) if outcome.is_accepted() => summary.added += 1,
                    Ok(_) => {},
                    Err(e) => {
                        summary.failed += 1;
                        warn!("🔍️ Could not ingest a rescanned transaction: {e}");
                    },
                }
            }
            match page.marker {
                Some(next) if !next.is_null() && marker.as_ref() != Some(&next) => marker = Some(next),
                Some(next) if !next.is_null() => {
                    warn!("🔍️ Ledger returned the same pagination marker twice. Stopping the rescan early.");
                    break;
                },
                _ => break,
            }
        }
        info!(
            "🔍️ Rescan of {min}..={max} complete. {} scanned, {} added, {} failed",
            summary.scanned, summary.added, summary.failed
        );
        Ok(summary)
    }
}
