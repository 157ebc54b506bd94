//! MPT Sales Engine
//!
//! The sales engine turns native XRPL payments into deliveries of a Multi-Purpose Token (MPT). A buyer pays the
//! issuer and attaches a purchase memo naming the issuance, a nonce and the number of whole token units. Once the
//! payment is validated and correctly priced it becomes a *pending sale*, which an operator later settles by having
//! the issuer authorize the buyer and send them the tokens.
//!
//! The library is divided into these sections:
//! 1. Payment ingestion ([`mod@ingest`]). Every payment, from whatever source, passes through the same
//!    [`IngestionEngine`] gates and is recorded in the shared [`SalesStore`] at most once.
//! 2. The public API ([`mod@mpt_api`]). [`PaymentListener`] feeds the engine from the live stream, manual lookups and
//!    historical rescans. [`SettlementApi`] delivers tokens for pending sales. [`IssuanceApi`] and [`OptInApi`] cover
//!    issuer administration and holder opt-in.
//! 3. Backends ([`mod@traits`]). The APIs are generic over the ledger traits. [`XrplLedger`] implements them against a
//!    rippled WebSocket server.
//!
//! The engine also emits events when a sale is received and when it is settled. Register closures in
//! [`events::EventHooks`] to react to them.
pub mod events;
pub mod helpers;
pub mod ingest;
mod ledger;
pub mod mpt_api;
pub mod sale_types;
pub mod store;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ingest::{IngestError, IngestOutcome, IngestSource, IngestionEngine, PaymentEvent, RejectReason};
pub use ledger::XrplLedger;
pub use mpt_api::{
    api_objects,
    errors::{IssuanceApiError, ListenerError, OptInApiError, SettlementError},
    issuance_api::IssuanceApi,
    listener::{PaymentListener, RescanConfig},
    optin_api::OptInApi,
    settlement_api::SettlementApi,
};
pub use store::{SalesStore, StoreError, StoreStats};
