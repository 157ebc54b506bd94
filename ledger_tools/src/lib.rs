//! Clients for the external systems the MPT sales gateway talks to.
//!
//! * [`LedgerClient`] speaks the rippled WebSocket API: request/response commands plus the account transaction stream.
//! * [`XummApi`] is a thin REST client for the Xumm (Xaman) sign-request platform.
//!
//! Ledger responses are deserialized into the typed structures in [`data_objects`] rather than handled as raw JSON.
mod client;
mod config;
mod error;
mod helpers;
mod xumm;

pub mod data_objects;

pub use client::{LedgerClient, LedgerConnection};
pub use config::{LedgerConfig, XummConfig, DEFAULT_NETWORK, DEFAULT_TIMEOUT_MS, DEFAULT_WS_URL};
pub use error::{LedgerError, XummError};
pub use helpers::{decode_hex_utf8, encode_hex_utf8};
pub use xumm::{PayloadStatus, SignRequestRefs, SignRequestResponse, XummApi};
