use chrono::Utc;
use ledger_tools::data_objects::TX_TYPE_PAYMENT;
use log::*;
use mpt_common::{display_to_drops, drops_to_display};
use thiserror::Error;

use crate::{
    events::{EventProducers, SaleReceivedEvent},
    helpers::parse_purchase_memo,
    ingest::{IngestOutcome, IngestSource, PaymentEvent, RejectReason},
    sale_types::{PaymentTxHash, PendingSale, SaleStatus},
    store::{SalesState, SalesStore, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error("Sales store error: {0}")]
    Store(#[from] StoreError),
}

/// Decides whether a payment creates a pending sale, and records it if so.
///
/// The duplicate checks and the insert happen under a single store write guard, so two sources delivering the same
/// payment at the same time produce exactly one sale.
#[derive(Clone)]
pub struct IngestionEngine {
    store: SalesStore,
    issuer: String,
    producers: EventProducers,
}

enum Verdict {
    Commit(PendingSale),
    Skip(IngestOutcome),
}

impl IngestionEngine {
    pub fn new(store: SalesStore, issuer: String, producers: EventProducers) -> Self {
        Self { store, issuer, producers }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn store(&self) -> &SalesStore {
        &self.store
    }

    pub async fn ingest(&self, event: PaymentEvent, source: IngestSource) -> Result<IngestOutcome, IngestError> {
        let outcome = self.apply(&event)?;
        let hash = event.hash.as_deref().unwrap_or("<no hash>");
        match &outcome {
            IngestOutcome::Accepted(sale) => {
                info!("💸️ [{source}] New pending sale. {sale}");
                self.producers.publish_sale_received(SaleReceivedEvent::new(sale.clone(), source)).await;
            },
            IngestOutcome::Duplicate(_) => debug!("💸️ [{source}] Payment {hash} was already ingested"),
            // Most transactions touching the issuer are not sales, so keep these quiet
            IngestOutcome::Rejected(reason @ RejectReason::PriceMismatch { .. }) => {
                warn!("💸️ [{source}] Payment {hash} rejected: {reason}")
            },
            IngestOutcome::Rejected(reason) => debug!("💸️ [{source}] Payment {hash} rejected: {reason}"),
        }
        Ok(outcome)
    }

    /// Runs every gate against the current store without recording anything.
    pub fn preview(&self, event: &PaymentEvent) -> Result<IngestOutcome, IngestError> {
        let state = self.store.read()?;
        let outcome = match evaluate(&self.issuer, event, &state) {
            Verdict::Skip(outcome) => outcome,
            Verdict::Commit(sale) => IngestOutcome::Accepted(sale),
        };
        Ok(outcome)
    }

    fn apply(&self, event: &PaymentEvent) -> Result<IngestOutcome, IngestError> {
        let sale = {
            let mut state = self.store.write()?;
            match evaluate(&self.issuer, event, &state) {
                Verdict::Skip(outcome) => return Ok(outcome),
                Verdict::Commit(sale) => {
                    state.add_pending(sale.clone());
                    sale
                },
            }
        };
        if let Err(e) = self.store.whitelist_add(&sale.holder) {
            error!("💸️ Sale {} was recorded but {} could not be whitelisted: {e}", sale.payment_tx, sale.holder);
        }
        Ok(IngestOutcome::Accepted(sale))
    }
}

fn reject(reason: RejectReason) -> Verdict {
    Verdict::Skip(IngestOutcome::Rejected(reason))
}

fn evaluate(issuer: &str, event: &PaymentEvent, state: &SalesState) -> Verdict {
    let tx = &event.tx;
    if !event.validated {
        return reject(RejectReason::NotValidated);
    }
    if !event.meta.as_ref().is_some_and(|m| m.is_success()) {
        return reject(RejectReason::TxFailed(event.engine_result().map(String::from)));
    }
    if !tx.is_type(TX_TYPE_PAYMENT) {
        return reject(RejectReason::WrongTxType(tx.transaction_type.clone()));
    }
    if tx.destination.as_deref() != Some(issuer) {
        return reject(RejectReason::WrongDestination(tx.destination.clone()));
    }
    let Some(holder) = tx.account.as_deref().filter(|a| !a.is_empty()) else {
        return reject(RejectReason::MissingSender);
    };
    let Some(hash) = event.hash.as_deref().map(PaymentTxHash::new) else {
        return reject(RejectReason::MissingHash);
    };
    if state.has_payment_tx(&hash) || state.is_settled(&hash) {
        return Verdict::Skip(IngestOutcome::Duplicate(hash));
    }
    let Some(amount) = event.native_amount() else {
        return reject(RejectReason::AmountMissing);
    };
    let Some(memo) = parse_purchase_memo(&tx.memos) else {
        return reject(RejectReason::InvalidMemo);
    };
    if state.has_nonce(&memo.nonce) {
        match state.find_by_nonce(&memo.nonce) {
            Some(existing) if existing.payment_tx == hash => return Verdict::Skip(IngestOutcome::Duplicate(hash)),
            Some(existing) => {
                warn!("💸️ Nonce {} from {hash} was already used by payment {}", memo.nonce, existing.payment_tx)
            },
            None => warn!("💸️ Nonce {} from {hash} was used by an earlier, settled sale", memo.nonce),
        }
    }
    let expected = match display_to_drops(&memo.units) {
        Ok(drops) => drops,
        Err(e) => return reject(RejectReason::InvalidUnits(e.to_string())),
    };
    if expected != amount {
        return reject(RejectReason::PriceMismatch { expected, actual: amount.to_string() });
    }
    // `amount` is a validated digit string, so this cannot fail
    let amount_display = drops_to_display(amount).unwrap_or_else(|_| amount.to_string());
    let now = Utc::now();
    Verdict::Commit(PendingSale {
        issuance_id: memo.issuance_id,
        holder: holder.to_string(),
        units: memo.units,
        nonce: memo.nonce,
        amount_native: amount.to_string(),
        amount_display,
        payment_tx: hash,
        status: SaleStatus::Received,
        created_at: now,
        updated_at: now,
    })
}
