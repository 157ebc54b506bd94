//! # Ledger and relay backends
//!
//! The engine never talks to the network directly. It is generic over the traits in this module, which a backend
//! implements to expose the ledger (and the wallet sign relay) to the sales pipeline.
//!
//! * [`LedgerQuery`] reads transactions, the validated ledger index and paginated account history.
//! * [`LedgerSubscriber`] opens the live transaction stream for an account.
//! * [`IssuerOperations`] submits issuer-signed MPT transactions (grant, send, clawback, create) and reads MPT state.
//! * [`SignRelay`] asks a holder's wallet to sign a transaction on their behalf.
//!
//! [`crate::XrplLedger`] implements the ledger traits against a rippled WebSocket endpoint and
//! [`ledger_tools::XummApi`] implements [`SignRelay`].
mod data_objects;
mod issuer_operations;
mod ledger_query;
mod ledger_subscriber;
mod sign_relay;

pub use data_objects::{GrantOutcome, NewIssuance};
pub use issuer_operations::IssuerOperations;
pub use ledger_query::LedgerQuery;
pub use ledger_subscriber::LedgerSubscriber;
pub use sign_relay::SignRelay;

/// Everything the gateway needs from a ledger backend. Implemented for every type that provides the three ledger
/// traits.
pub trait LedgerBackend: LedgerQuery + LedgerSubscriber + IssuerOperations {}

impl<T> LedgerBackend for T where T: LedgerQuery + LedgerSubscriber + IssuerOperations {}
