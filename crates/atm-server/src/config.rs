//! Account Server configuration: `clap` flags layered over a `toml` file —
//! a typed struct with a `Default` impl, optionally overridden from a file.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Withdraw/deposit ceiling (`§4.3`): strictly less than.
pub const WTD_DEP_CEILING: f64 = 30_000.0;
/// Operator transfer ceiling (`§4.3`, supplemented from `original_source/bankz`).
pub const TRANSFER_CEILING: f64 = 100_000.0;

/// The admin console's login password (not the per-account PIN/password).
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
/// Entering this as the admin password terminates the process immediately
/// with exit code 1, skipping the save-on-quit path (`§6`).
pub const ADMIN_EXIT_PASSWORD: &str = "exit";

#[derive(Parser, Debug)]
#[command(name = "atm-as", about = "ATM Account Server")]
pub struct AsArgs {
    /// Path to the serial device the terminal controller is attached to.
    #[arg(long)]
    pub port: Option<String>,

    /// Root directory holding `dataz/` and `filez/` (defaults to the
    /// current working directory).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Optional TOML config file layered under the CLI flags.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AsConfig {
    pub serial_port: String,
    pub data_dir: PathBuf,
    pub admin_password: String,
}

impl Default for AsConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            data_dir: PathBuf::from("."),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AsConfig {
    /// Layer a `toml` file (if given) under CLI overrides, the way the
    /// teacher's `cli` crate resolves config: file first, flags win.
    pub fn resolve(args: AsArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?
            }
            None => AsConfig::default(),
        };

        if let Some(port) = args.port {
            config.serial_port = port;
        }
        if let Some(dir) = args.data_dir {
            config.data_dir = dir;
        }
        Ok(config)
    }
}
