//! Error types shared by the store, the persistence layer, and the
//! operator surface that sits on top of them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no account with rfid '{0}'")]
    RfidNotFound(String),

    #[error("no account with username '{0}'")]
    UsernameNotFound(String),

    #[error("no account with id {0}")]
    AccountIdNotFound(u64),

    #[error("rfid '{0}' is already assigned to another account")]
    DuplicateRfid(String),

    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient balance: have {0:.2}, need {1:.2}")]
    InsufficientFunds(f64, f64),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("holder name must be at least 3 printable characters")]
    HolderNameTooShort,

    #[error("phone must be a 10-digit number between 6000000000 and 9999999999")]
    PhoneOutOfRange,

    #[error("username must be 1-20 characters and not the reserved admin name")]
    InvalidUsername,

    #[error("password must be 1-20 characters")]
    InvalidPassword,

    #[error("rfid must be exactly 8 characters")]
    InvalidRfidLength,

    #[error("pin must be exactly 4 decimal digits")]
    InvalidPin,

    #[error("opening balance must be positive")]
    NonPositiveOpeningBalance,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error at {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed record in {path}: {detail}")]
    Malformed { path: String, detail: String },
}

pub type Result<T> = std::result::Result<T, Error>;
