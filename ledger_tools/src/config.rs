use std::time::Duration;

use log::*;
use mpt_common::Secret;

pub const DEFAULT_WS_URL: &str = "wss://s.devnet.rippletest.net:51233";
pub const DEFAULT_NETWORK: &str = "devnet";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    pub ws_url: String,
    pub network: String,
    pub timeout: Duration,
    pub issuer_address: String,
    pub issuer_seed: Secret<String>,
}

impl LedgerConfig {
    pub fn new_from_env_or_default() -> Self {
        let ws_url = std::env::var("XRPL_WS_URL").unwrap_or_else(|_| {
            info!("XRPL_WS_URL not set, using {DEFAULT_WS_URL}");
            DEFAULT_WS_URL.to_string()
        });
        let network = std::env::var("XRPL_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
        let timeout = std::env::var("NETWORK_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid NETWORK_TIMEOUT_MS ({s}): {e}. Using {DEFAULT_TIMEOUT_MS}ms."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let issuer_address = std::env::var("ISSUER_ADDRESS").map(|s| s.trim().to_string()).unwrap_or_else(|_| {
            error!("ISSUER_ADDRESS is not set. Incoming payments cannot be matched to the issuer.");
            String::default()
        });
        let issuer_seed = Secret::new(std::env::var("ISSUER_SEED").unwrap_or_else(|_| {
            warn!("ISSUER_SEED is not set. Issuer transactions (grant, send, clawback) will fail.");
            String::default()
        }));
        Self { ws_url, network, timeout: Duration::from_millis(timeout), issuer_address, issuer_seed }
    }

    pub fn is_devnet(&self) -> bool {
        self.network == DEFAULT_NETWORK
    }
}

#[derive(Debug, Clone, Default)]
pub struct XummConfig {
    pub api_key: Secret<String>,
    pub api_secret: Secret<String>,
    pub timeout: Duration,
}

impl XummConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("XUMM_API_KEY").unwrap_or_else(|_| {
            warn!("XUMM_API_KEY not set. Holder opt-in sign requests are unavailable.");
            String::default()
        }));
        let api_secret = Secret::new(std::env::var("XUMM_API_SECRET").unwrap_or_default());
        let timeout = std::env::var("NETWORK_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self { api_key, api_secret, timeout: Duration::from_millis(timeout) }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.reveal().is_empty() && !self.api_secret.reveal().is_empty()
    }
}
