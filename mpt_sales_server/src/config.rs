use std::env;

use ledger_tools::{LedgerConfig, XummConfig, DEFAULT_NETWORK};
use log::*;
use mpt_common::{parse_boolean_flag, TokenScale};
use mpt_sales_engine::{helpers::assert_address, RescanConfig};

use crate::errors::ServerError;

const DEFAULT_MPT_HOST: &str = "127.0.0.1";
const DEFAULT_MPT_PORT: u16 = 8370;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ledger: LedgerConfig,
    pub xumm: XummConfig,
    /// Decimal places of the MPT being sold. Whole units are multiplied by 10^scale on the ledger.
    pub asset_scale: TokenScale,
    /// When set, issuance creation returns this id instead of looking up or creating one.
    pub issuance_id: Option<String>,
    pub rescan: RescanConfig,
    /// If true, the live payment listener is started when the server boots rather than on first use.
    pub autostart_listener: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPT_HOST.to_string(),
            port: DEFAULT_MPT_PORT,
            ledger: LedgerConfig::default(),
            xumm: XummConfig::default(),
            asset_scale: TokenScale::default(),
            issuance_id: None,
            rescan: RescanConfig::default(),
            autostart_listener: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPT_HOST").ok().unwrap_or_else(|| DEFAULT_MPT_HOST.into());
        let port = env::var("MPT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPT_PORT. {e} Using the default, {DEFAULT_MPT_PORT}, instead."
                    );
                    DEFAULT_MPT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPT_PORT);
        let ledger = LedgerConfig::new_from_env_or_default();
        let xumm = XummConfig::new_from_env_or_default();
        let asset_scale = configure_asset_scale();
        let issuance_id = env::var("MPT_ISSUANCE_ID").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match &issuance_id {
            Some(id) => info!("🪛️ Using the preset MPT issuance {id}"),
            None => info!("🪛️ MPT_ISSUANCE_ID is not set. An issuance will be looked up or created on demand."),
        }
        let rescan = configure_rescan();
        let autostart_listener = parse_boolean_flag(env::var("MPT_AUTOSTART_LISTENER").ok(), true);
        Self { host, port, ledger, xumm, asset_scale, issuance_id, rescan, autostart_listener }
    }

    /// Checks the settings the server cannot run without. Only devnet is supported, and the issuer must be known.
    pub fn validate(&self) -> Result<(), ServerError> {
        if !self.ledger.is_devnet() {
            return Err(ServerError::ConfigurationError(format!(
                "XRPL_NETWORK must be '{DEFAULT_NETWORK}' (found: {})",
                self.ledger.network
            )));
        }
        assert_address(&self.ledger.issuer_address)
            .map_err(|e| ServerError::ConfigurationError(format!("ISSUER_ADDRESS is not usable. {e}")))?;
        if self.ledger.issuer_seed.reveal().is_empty() {
            warn!("🪛️ ISSUER_SEED is not set. Issuer transactions (settlement, send, clawback) will fail.");
        }
        if !self.xumm.has_credentials() {
            warn!("🪛️ Xumm credentials are not set. The holder opt-in QR routes are disabled.");
        }
        Ok(())
    }
}

fn configure_asset_scale() -> TokenScale {
    env::var("MPT_ASSET_SCALE")
        .map_err(|_| info!("🪛️ MPT_ASSET_SCALE is not set. Using the default scale of {}.", TokenScale::default()))
        .and_then(|s| s.trim().parse::<u32>().map_err(|e| warn!("🪛️ Invalid value for MPT_ASSET_SCALE. {e}")))
        .and_then(|v| TokenScale::try_from(v).map_err(|e| warn!("🪛️ Invalid value for MPT_ASSET_SCALE. {e}")))
        .ok()
        .unwrap_or_default()
}

fn configure_rescan() -> RescanConfig {
    let defaults = RescanConfig::default();
    let read = |name: &str, default: u32| {
        env::var(name)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().map_err(|e| warn!("🪛️ Invalid value for {name}. {e}")).ok())
            .unwrap_or(default)
    };
    let min_lookback = read("MPT_RESCAN_MIN_LOOKBACK", defaults.min_lookback);
    let max_lookback = read("MPT_RESCAN_MAX_LOOKBACK", defaults.max_lookback);
    let default_lookback = read("MPT_RESCAN_DEFAULT_LOOKBACK", defaults.default_lookback);
    if min_lookback > max_lookback {
        warn!(
            "🪛️ MPT_RESCAN_MIN_LOOKBACK ({min_lookback}) is larger than MPT_RESCAN_MAX_LOOKBACK ({max_lookback}). \
             Using the default rescan window instead."
        );
        return defaults;
    }
    RescanConfig { default_lookback, min_lookback, max_lookback }
}
