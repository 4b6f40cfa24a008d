//! Account/transaction data model, in-memory store, and on-disk
//! persistence for the ATM account server (`§3`, `§4.4`-`§4.6`).

pub mod account;
pub mod error;
pub mod idgen;
pub mod persistence;
pub mod store;
pub mod transaction;
pub mod validation;

pub use account::{Account, CardState, NewAccount};
pub use error::{Error, PersistenceError, Result, ValidationError};
pub use store::{AccountHandle, AccountStore};
pub use transaction::{Transaction, TransactionLog, TransactionType};
