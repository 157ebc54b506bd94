//! # Payment ingestion
//!
//! Every payment the gateway sees, whether from the live subscription, a manual lookup or a historical rescan, is first
//! normalized into a [`PaymentEvent`] and then passed through the one decision path in [`IngestionEngine`].
//!
//! A payment that does not qualify is not an error: the engine reports an [`IngestOutcome`] saying why.
mod engine;
mod normalize;
mod outcome;

pub use engine::{IngestError, IngestionEngine};
pub use normalize::PaymentEvent;
pub use outcome::{IngestOutcome, IngestSource, RejectReason};
