//! Operator console command grammar (`§4.7`).
//!
//! Parsed with `clap`'s derive API the way the teacher's `cli` crate
//! parses its admin commands, just pointed at a line read from stdin
//! instead of `std::env::args()` (`no_binary_name` makes that drop-in).

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct OperatorLine {
    #[command(subcommand)]
    pub command: OperatorCommand,
}

#[derive(Subcommand, Debug)]
pub enum OperatorCommand {
    /// Open a new account, prompting field-by-field.
    Create,
    /// Edit one field of an existing account: phone, name, username, password, pin.
    Update { account_id: u64, field: String, value: String },
    /// Show one account's balance and statement.
    View { account_id: u64 },
    /// Withdraw from any account (no per-card PIN check — operator-authorized).
    Withdraw { account_id: u64, amount: f64 },
    /// Deposit into any account.
    Deposit { account_id: u64, amount: f64 },
    /// Move funds between two accounts (100,000 ceiling, strict less-than).
    Transfer { from: u64, to: u64, amount: f64 },
    /// Flip a card to BLOCKED.
    Block { account_id: u64 },
    /// Flip a card back to ACTIVE.
    Unblock { account_id: u64 },
    /// List every account in a table.
    List,
    /// Free-text search by phone / id / name / username (single token).
    Search { query: String },
    /// Save and exit (unless the admin password prompt was the reserved exit string).
    Quit,
}

pub fn parse(line: &str) -> Result<OperatorCommand, clap::Error> {
    OperatorLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}
