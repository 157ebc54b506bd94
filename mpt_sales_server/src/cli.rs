use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // ISSUER_SEED and XUMM_API_SECRET are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "MPT_HOST",
        "MPT_PORT",
        "XRPL_WS_URL",
        "XRPL_NETWORK",
        "NETWORK_TIMEOUT_MS",
        "ISSUER_ADDRESS",
        "MPT_ASSET_SCALE",
        "MPT_ISSUANCE_ID",
        "MPT_RESCAN_DEFAULT_LOOKBACK",
        "MPT_RESCAN_MIN_LOOKBACK",
        "MPT_RESCAN_MAX_LOOKBACK",
        "MPT_AUTOSTART_LISTENER",
        "XUMM_API_KEY",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) if name == "XUMM_API_KEY" => format!("set ({} chars)", s.len()),
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
