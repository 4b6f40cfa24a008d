//! Terminal Controller configuration: `clap` flags layered over a `toml`
//! file, mirroring `atm-server::config`.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Inactivity-timer ceiling in poll ticks (`§4.2`/`§5`); re-armed on every
/// keypress, zero means session expiry.
pub const INACTIVITY_CEILING: u32 = 30;

#[derive(Parser, Debug)]
#[command(name = "atm-tc", about = "ATM Terminal Controller")]
pub struct TcArgs {
    /// Path to the serial device the account server is attached to.
    #[arg(long)]
    pub port: Option<String>,

    /// Optional TOML config file layered under the CLI flags.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TcConfig {
    pub serial_port: String,
    pub inactivity_ceiling: u32,
}

impl Default for TcConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB1".to_string(),
            inactivity_ceiling: INACTIVITY_CEILING,
        }
    }
}

impl TcConfig {
    pub fn resolve(args: TcArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?
            }
            None => TcConfig::default(),
        };
        if let Some(port) = args.port {
            config.serial_port = port;
        }
        Ok(config)
    }
}
