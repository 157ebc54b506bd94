//! Helpers for exercising the engine without a network: an in-memory ledger and payment fixtures.
mod fake_ledger;
mod prepare_env;

pub use fake_ledger::{purchase_tx, success_meta, FakeLedger, FakeRelay};
pub use prepare_env::{prepare_test_env, random_nonce, random_tx_hash};

pub const ISSUER: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
pub const HOLDER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
pub const ISSUANCE_ID: &str = "00000004A407AF5856CCF3C42619DAA925813FC955C72983";
