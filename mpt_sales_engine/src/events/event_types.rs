use serde::Serialize;

use crate::{ingest::IngestSource, sale_types::PendingSale};

/// Emitted once for every payment that is accepted as a new pending sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleReceivedEvent {
    pub sale: PendingSale,
    pub source: IngestSource,
}

impl SaleReceivedEvent {
    pub fn new(sale: PendingSale, source: IngestSource) -> Self {
        Self { sale, source }
    }
}

/// Emitted after the purchased tokens were delivered and the sale was removed from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSettledEvent {
    pub sale: PendingSale,
    /// Hash of the MPT payment that delivered the tokens.
    pub delivery_tx: String,
}

impl SaleSettledEvent {
    pub fn new(sale: PendingSale, delivery_tx: String) -> Self {
        Self { sale, delivery_tx }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    SaleReceived(SaleReceivedEvent),
    SaleSettled(SaleSettledEvent),
}
