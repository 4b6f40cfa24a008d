//! The canonical per-cardholder record (`§3`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};
use crate::transaction::{Transaction, TransactionAppender, TransactionType};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    Active,
    Blocked,
}

impl CardState {
    pub fn to_wire_int(self) -> u8 {
        match self {
            CardState::Active => 0,
            CardState::Blocked => 1,
        }
    }

    pub fn from_wire_int(v: u8) -> Option<Self> {
        match v {
            0 => Some(CardState::Active),
            1 => Some(CardState::Blocked),
            _ => None,
        }
    }
}

/// Fields required to open a new account, pre-validation.
pub struct NewAccount {
    pub holder_name: String,
    pub phone: u64,
    pub username: String,
    pub password: String,
    pub rfid: String,
    pub pin: String,
    pub opening_balance: f64,
}

/// The live, in-memory account record plus its append-only history.
///
/// `account_id`, `rfid`, and `username` are immutable after creation (the
/// store enforces uniqueness on those at creation time); everything else
/// can be edited through the operator surface.
pub struct Account {
    pub account_id: u64,
    pub holder_name: String,
    pub phone: u64,
    pub username: String,
    pub password: String,
    pub rfid: String,
    pub pin: String,
    pub card_state: CardState,
    pub balance: f64,
    appender: TransactionAppender,
}

impl Account {
    /// Validate and construct a brand-new account. `account_id` is assumed
    /// already generated and unique (the store owns id generation, see
    /// `idgen::generate_account_id`); opening balance becomes the first
    /// (and, at creation, only) transaction.
    pub fn open(
        account_id: u64,
        fields: NewAccount,
        now: chrono::NaiveDateTime,
    ) -> Result<Self> {
        let holder_name = validation::validate_holder_name(&fields.holder_name)?;
        let phone = validation::validate_phone(fields.phone)?;
        let username = validation::validate_username(&fields.username)?;
        let password = validation::validate_password(&fields.password)?;
        let rfid = validation::validate_rfid(&fields.rfid)?;
        let pin = validation::validate_pin(&fields.pin)?;
        let opening_balance = validation::validate_opening_balance(fields.opening_balance)?;

        let mut appender = TransactionAppender::new(account_id);
        appender.append(opening_balance, TransactionType::Deposit, now);

        Ok(Self {
            account_id,
            holder_name,
            phone,
            username,
            password,
            rfid,
            pin,
            card_state: CardState::Active,
            balance: opening_balance,
            appender,
        })
    }

    /// Reconstruct an account already loaded from the primary store, with
    /// its history already loaded in newest-first file order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        account_id: u64,
        holder_name: String,
        phone: u64,
        username: String,
        password: String,
        rfid: String,
        pin: String,
        card_state: CardState,
        balance: f64,
        history: Vec<Transaction>,
    ) -> Self {
        Self {
            account_id,
            holder_name,
            phone,
            username,
            password,
            rfid,
            pin,
            card_state,
            balance,
            appender: TransactionAppender::loaded(account_id, history),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.appender.log.len()
    }

    pub fn history(&self) -> impl Iterator<Item = &Transaction> {
        self.appender.log.iter()
    }

    pub fn mini_statement(&self, index: u32) -> Option<&Transaction> {
        self.appender.log.nth(index)
    }

    /// Apply a withdrawal. Caller (the dispatcher) is responsible for
    /// enforcing the per-operation ceiling before calling this; this method
    /// only enforces the amount-positive and sufficient-balance invariants
    /// so it stays correct if ever called from a second caller (e.g. an
    /// operator withdrawal) with a different ceiling.
    pub fn withdraw(&mut self, amount: f64, now: chrono::NaiveDateTime) -> Result<Transaction> {
        self.debit(amount, TransactionType::Withdraw, now)
    }

    pub fn deposit(&mut self, amount: f64, now: chrono::NaiveDateTime) -> Result<Transaction> {
        self.credit(amount, TransactionType::Deposit, now)
    }

    pub fn transfer_out(&mut self, amount: f64, now: chrono::NaiveDateTime) -> Result<Transaction> {
        self.debit(amount, TransactionType::TransferOut, now)
    }

    pub fn transfer_in(&mut self, amount: f64, now: chrono::NaiveDateTime) -> Result<Transaction> {
        self.credit(amount, TransactionType::TransferIn, now)
    }

    fn credit(&mut self, amount: f64, kind: TransactionType, now: chrono::NaiveDateTime) -> Result<Transaction> {
        if amount <= 0.0 {
            return Err(Error::NonPositiveAmount);
        }
        self.balance += amount;
        Ok(self.appender.append(amount, kind, now))
    }

    fn debit(&mut self, amount: f64, kind: TransactionType, now: chrono::NaiveDateTime) -> Result<Transaction> {
        if amount <= 0.0 {
            return Err(Error::NonPositiveAmount);
        }
        if amount > self.balance {
            return Err(Error::InsufficientFunds(self.balance, amount));
        }
        self.balance -= amount;
        Ok(self.appender.append(-amount, kind, now))
    }

    pub fn verify_pin(&self, pin: &str) -> bool {
        self.pin == pin
    }

    pub fn set_pin(&mut self, new_pin: &str) -> std::result::Result<(), ValidationError> {
        let validated = validation::validate_pin(new_pin)?;
        self.pin = validated;
        Ok(())
    }

    pub fn block(&mut self) {
        self.card_state = CardState::Blocked;
    }

    pub fn unblock(&mut self) {
        self.card_state = CardState::Active;
    }

    pub fn is_active(&self) -> bool {
        self.card_state == CardState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn alice(account_id: u64) -> Account {
        Account::open(
            account_id,
            NewAccount {
                holder_name: "alice smith".into(),
                phone: 9_000_000_000,
                username: "alice".into(),
                password: "hunter22".into(),
                rfid: "11111111".into(),
                pin: "1234".into(),
                opening_balance: 5000.0,
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn opening_records_first_transaction() {
        let acc = alice(1);
        assert_eq!(acc.balance, 5000.0);
        assert_eq!(acc.transaction_count(), 1);
        assert_eq!(acc.holder_name, "Alice Smith");
    }

    #[test]
    fn withdraw_then_balance() {
        let mut acc = alice(1);
        acc.balance = 1000.0;
        let txn = acc.withdraw(250.0, now()).unwrap();
        assert_eq!(acc.balance, 750.0);
        assert_eq!(txn.amount, -250.0);
        assert_eq!(txn.kind, TransactionType::Withdraw);
    }

    #[test]
    fn withdraw_more_than_balance_fails_and_does_not_mutate() {
        let mut acc = alice(1);
        acc.balance = 100.0;
        let before_count = acc.transaction_count();
        let err = acc.withdraw(200.0, now()).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(100.0, 200.0)));
        assert_eq!(acc.balance, 100.0);
        assert_eq!(acc.transaction_count(), before_count);
    }

    #[test]
    fn withdraw_equal_to_balance_succeeds() {
        let mut acc = alice(1);
        acc.balance = 100.0;
        assert!(acc.withdraw(100.0, now()).is_ok());
        assert_eq!(acc.balance, 0.0);
    }
}
