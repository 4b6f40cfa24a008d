//! The transaction log: an ordered, append-only, newest-first history of
//! monetary effects on one account (`§3`, `§4.5`).

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::idgen::{format_display_timestamp, TransactionIdGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Withdraw,
    Deposit,
    TransferIn,
    TransferOut,
}

impl TransactionType {
    /// Single-byte on-disk encoding: WITHDRAW=1, DEPOSIT=2, TRANSFER_IN=3,
    /// TRANSFER_OUT=4 (`§4.6`).
    pub fn to_wire_byte(self) -> u8 {
        match self {
            TransactionType::Withdraw => 1,
            TransactionType::Deposit => 2,
            TransactionType::TransferIn => 3,
            TransactionType::TransferOut => 4,
        }
    }

    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(TransactionType::Withdraw),
            2 => Some(TransactionType::Deposit),
            3 => Some(TransactionType::TransferIn),
            4 => Some(TransactionType::TransferOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 17-digit `timestamp14 * 1000 + rand3`, unique within the owning
    /// account (not globally).
    pub id: u64,
    /// Signed: positive for credit (deposit / transfer-in / opening),
    /// negative for debit (withdraw / transfer-out).
    pub amount: f64,
    pub kind: TransactionType,
}

impl Transaction {
    pub fn display_timestamp(&self) -> String {
        format_display_timestamp(self.id)
    }
}

/// Newest-first, O(1)-prepend transaction history for a single account.
///
/// The original firmware modeled this as a singly-linked list; per the
/// REDESIGN FLAGS a contiguous growable sequence is the preferred
/// reimagination as long as prepend stays O(1) and iteration order is
/// preserved, so this wraps a `VecDeque`.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: VecDeque<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from records already in newest-first file order (as
    /// written by a prior save), without touching the ordering.
    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn append(&mut self, amount: f64, kind: TransactionType, id: u64) {
        self.entries.push_front(Transaction { id, amount, kind });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first iteration, matching the in-memory and on-disk order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    /// 1-based mini-statement lookup (`§4.5`): `index` counts from the
    /// newest entry. Returns `None` once `index` runs past `len()`, the
    /// caller's cue to emit the `@TXN:7:0:0$` sentinel.
    pub fn nth(&self, index: u32) -> Option<&Transaction> {
        if index == 0 {
            return None;
        }
        self.entries.get((index - 1) as usize)
    }
}

/// Generates the next transaction id for one account, appends the entry,
/// and returns it — the single seam both the monetary handlers and the
/// persistence loader go through.
pub struct TransactionAppender {
    pub log: TransactionLog,
    id_gen: TransactionIdGenerator,
}

impl TransactionAppender {
    pub fn new(account_id: u64) -> Self {
        Self {
            log: TransactionLog::new(),
            id_gen: TransactionIdGenerator::for_account(account_id),
        }
    }

    pub fn loaded(account_id: u64, entries: Vec<Transaction>) -> Self {
        Self {
            log: TransactionLog::from_entries(entries),
            id_gen: TransactionIdGenerator::for_account(account_id),
        }
    }

    pub fn append(&mut self, amount: f64, kind: TransactionType, now: NaiveDateTime) -> Transaction {
        let id = self.id_gen.next_id(now);
        self.log.append(amount, kind, id);
        *self.log.entries.front().expect("just pushed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap()
    }

    #[test]
    fn append_is_newest_first() {
        let mut log = TransactionLog::new();
        log.append(100.0, TransactionType::Deposit, 1);
        log.append(-50.0, TransactionType::Withdraw, 2);
        assert_eq!(log.nth(1).unwrap().id, 2);
        assert_eq!(log.nth(2).unwrap().id, 1);
    }

    #[test]
    fn mini_statement_overrun_returns_none() {
        let mut log = TransactionLog::new();
        log.append(100.0, TransactionType::Deposit, 1);
        assert!(log.nth(1).is_some());
        assert!(log.nth(2).is_none());
        assert!(log.nth(0).is_none());
    }

    #[test]
    fn appender_assigns_distinct_ids_same_second() {
        let mut appender = TransactionAppender::new(99);
        let a = appender.append(10.0, TransactionType::Deposit, now());
        let b = appender.append(-5.0, TransactionType::Withdraw, now());
        assert_ne!(a.id, b.id);
        assert_eq!(appender.log.len(), 2);
    }
}
