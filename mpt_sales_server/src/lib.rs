//! # MPT sales server
//! The admin HTTP server for the MPT sales gateway. It is responsible for:
//! * wiring the sales store, ingestion engine, payment listener and settlement APIs together,
//! * starting the live payment listener,
//! * exposing the operator routes below.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: returns 200 OK.
//! * `GET /api/mpt/sales/list`: pending sales, newest first.
//! * `POST /api/mpt/sales/ingest`: look up a payment by hash and ingest it.
//! * `POST /api/mpt/sales/rescan`: re-read recent issuer history.
//! * `POST /api/mpt/sales/settle`: deliver the tokens for a pending sale.
//! * `POST /api/mpt/create-issuance`, `/api/mpt/authorize-holder`, `/api/mpt/optin/prepare`, `/api/mpt/send`,
//!   `/api/mpt/clawback`, `/api/mpt/balance`: issuer administration.
//! * `POST /api/mpt/authorize/qr`, `GET /api/mpt/authorize/status/{uuid}`, `POST /api/mpt/authorize/verify`: holder
//!   opt-in through the Xumm sign relay.
//! * `POST /api/listener/start`, `GET /api/debug/sales-store`, `GET /api/debug/issuer`,
//!   `GET /api/debug/inspect-tx?hash=`: listener control and diagnostics.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod listener_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
