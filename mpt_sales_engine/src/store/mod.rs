//! # In-memory sale state
//!
//! [`SalesStore`] is the single shared record of pending sales, consumed nonces and allow-listed holders. It is created
//! once by the composition root and cloned into every API that needs it; all clones share the same state.
//!
//! State lives for the lifetime of the process. Nothing is evicted or persisted.
mod sales_store;

pub use sales_store::{SalesState, SalesStore, SettlementClaim, StoreError, StoreStats};
