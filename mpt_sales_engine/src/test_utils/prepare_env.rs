use log::*;

/// Loads `.env.test` (if present) and initialises logging. Safe to call from every test.
pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    trace!("🚀️ Test environment ready");
}

/// A fresh purchase nonce, so that tests sharing a store never collide.
pub fn random_nonce() -> String {
    format!("N{:016x}", rand::random::<u64>())
}

/// A random, well-formed 64-character transaction hash.
pub fn random_tx_hash() -> String {
    (0..4).map(|_| format!("{:016X}", rand::random::<u64>())).collect()
}
