//! The in-memory account store (`§4.4`).
//!
//! Grounded in `registrar-core::registrar::location::LocationService`: a
//! `DashMap`-backed service exposing `add_binding` / `find_contacts` /
//! `find_user`-shaped lookups. Here the primary record lives behind
//! `Arc<RwLock<Account>>` so the "exclusive handle" contract `§4.4`
//! describes is an actual borrow-checked guarantee rather than a comment —
//! the dispatcher being single-threaded per link is what makes holding the
//! write lock across a whole request safe to assume never contends.

use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;

use crate::account::{Account, NewAccount};
use crate::error::{Error, Result};
use crate::idgen;

pub type AccountHandle = Arc<RwLock<Account>>;

/// Indexed by account-id (primary storage) with rfid/username as secondary
/// unique indices, consulted by the dispatcher's hot path (rfid) and the
/// operator surface (username, account-id, free-text search).
#[derive(Default)]
pub struct AccountStore {
    by_id: dashmap::DashMap<u64, AccountHandle>,
    rfid_index: dashmap::DashMap<String, u64>,
    username_index: dashmap::DashMap<String, u64>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and insert a brand-new account, generating a collision-free
    /// account id and enforcing rfid/username uniqueness (`§3` invariants).
    /// Uniqueness is checked by linear-ish lookup against the two index
    /// maps, acceptable given the fleet size this system targets (`§4.4`).
    pub fn create_account(&self, fields: NewAccount, now: NaiveDateTime) -> Result<u64> {
        if self.rfid_index.contains_key(&fields.rfid) {
            return Err(Error::DuplicateRfid(fields.rfid));
        }
        if self.username_index.contains_key(&fields.username) {
            return Err(Error::DuplicateUsername(fields.username));
        }

        let account_id = idgen::generate_account_id(now, |candidate| self.by_id.contains_key(&candidate));
        let account = Account::open(account_id, fields, now)?;

        self.rfid_index.insert(account.rfid.clone(), account_id);
        self.username_index.insert(account.username.clone(), account_id);
        self.by_id.insert(account_id, Arc::new(RwLock::new(account)));
        Ok(account_id)
    }

    /// Insert an account reconstructed from the persisted store, bypassing
    /// validation and id generation (the loader trusts its own files).
    pub fn insert_loaded(&self, account: Account) {
        let account_id = account.account_id;
        self.rfid_index.insert(account.rfid.clone(), account_id);
        self.username_index.insert(account.username.clone(), account_id);
        self.by_id.insert(account_id, Arc::new(RwLock::new(account)));
    }

    pub fn lookup_by_rfid(&self, rfid: &str) -> Result<AccountHandle> {
        let id = self
            .rfid_index
            .get(rfid)
            .map(|e| *e.value())
            .ok_or_else(|| Error::RfidNotFound(rfid.to_string()))?;
        self.lookup_by_id(id)
    }

    pub fn lookup_by_username(&self, username: &str) -> Result<AccountHandle> {
        let id = self
            .username_index
            .get(username)
            .map(|e| *e.value())
            .ok_or_else(|| Error::UsernameNotFound(username.to_string()))?;
        self.lookup_by_id(id)
    }

    pub fn lookup_by_id(&self, account_id: u64) -> Result<AccountHandle> {
        self.by_id
            .get(&account_id)
            .map(|e| e.value().clone())
            .ok_or(Error::AccountIdNotFound(account_id))
    }

    /// Rename an account's username, re-indexing it. Fails without
    /// mutating anything if the new name is already taken.
    pub fn rename_username(&self, account_id: u64, new_username: String) -> Result<()> {
        if self.username_index.contains_key(&new_username) {
            return Err(Error::DuplicateUsername(new_username));
        }
        let handle = self.lookup_by_id(account_id)?;
        let old_username = {
            let mut account = handle.write();
            let validated = crate::validation::validate_username(&new_username)?;
            let old = account.username.clone();
            account.username = validated;
            old
        };
        self.username_index.remove(&old_username);
        self.username_index.insert(new_username, account_id);
        Ok(())
    }

    /// Move `amount` from one account to another as a single atomic
    /// operator-initiated action (no opportunity for another request to
    /// interleave — the dispatcher is single-threaded per `§4.3`/`§5`).
    /// Supplements spec.md's §4.7 summary with the full transfer mechanics
    /// recovered from `original_source/bankz`.
    pub fn transfer(
        &self,
        from_rfid: &str,
        to_rfid: &str,
        amount: f64,
        now: NaiveDateTime,
    ) -> Result<()> {
        let from = self.lookup_by_rfid(from_rfid)?;
        let to = self.lookup_by_rfid(to_rfid)?;

        let mut from_guard = from.write();
        from_guard.transfer_out(amount, now)?;
        // Only credit the destination once the debit has actually
        // succeeded; a failed debit never touches the destination.
        let mut to_guard = to.write();
        if let Err(e) = to_guard.transfer_in(amount, now) {
            // Roll back the debit: construct the compensating credit
            // directly rather than going through transfer_in so the
            // rollback can never itself fail the positive-amount check.
            from_guard.balance += amount;
            return Err(e);
        }
        Ok(())
    }

    pub fn all_accounts(&self) -> Vec<AccountHandle> {
        self.by_id.iter().map(|e| e.value().clone()).collect()
    }

    /// Free-text search by phone, account id, holder name (substring,
    /// case-insensitive), or username (`§4.7`).
    pub fn search(&self, query: &str) -> Vec<AccountHandle> {
        let query_lower = query.to_lowercase();
        self.by_id
            .iter()
            .filter(|e| {
                let account = e.value().read();
                account.phone.to_string() == query
                    || account.account_id.to_string() == query
                    || account.username.eq_ignore_ascii_case(query)
                    || account.holder_name.to_lowercase().contains(&query_lower)
            })
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn new_account(rfid: &str, username: &str) -> NewAccount {
        NewAccount {
            holder_name: "alice smith".into(),
            phone: 9_000_000_000,
            username: username.into(),
            password: "hunter22".into(),
            rfid: rfid.into(),
            pin: "1234".into(),
            opening_balance: 1000.0,
        }
    }

    #[test]
    fn rejects_duplicate_rfid_and_username() {
        let store = AccountStore::new();
        store.create_account(new_account("11111111", "alice"), now()).unwrap();
        assert!(matches!(
            store.create_account(new_account("11111111", "bob"), now()),
            Err(Error::DuplicateRfid(_))
        ));
        assert!(matches!(
            store.create_account(new_account("22222222", "alice"), now()),
            Err(Error::DuplicateUsername(_))
        ));
    }

    #[test]
    fn transfer_moves_balance_between_accounts() {
        let store = AccountStore::new();
        store.create_account(new_account("11111111", "alice"), now()).unwrap();
        store.create_account(new_account("22222222", "bob"), now()).unwrap();

        store.transfer("11111111", "22222222", 400.0, now()).unwrap();

        let alice = store.lookup_by_rfid("11111111").unwrap();
        let bob = store.lookup_by_rfid("22222222").unwrap();
        assert_eq!(alice.read().balance, 600.0);
        assert_eq!(bob.read().balance, 1400.0);
    }

    #[test]
    fn transfer_failure_does_not_partially_apply() {
        let store = AccountStore::new();
        store.create_account(new_account("11111111", "alice"), now()).unwrap();
        store.create_account(new_account("22222222", "bob"), now()).unwrap();

        let err = store.transfer("11111111", "22222222", 5000.0, now()).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_, _)));

        let alice = store.lookup_by_rfid("11111111").unwrap();
        let bob = store.lookup_by_rfid("22222222").unwrap();
        assert_eq!(alice.read().balance, 1000.0);
        assert_eq!(bob.read().balance, 1000.0);
    }

    #[test]
    fn rename_username_reindexes() {
        let store = AccountStore::new();
        let id = store.create_account(new_account("11111111", "alice"), now()).unwrap();
        store.rename_username(id, "alice2".into()).unwrap();
        assert!(store.lookup_by_username("alice").is_err());
        assert!(store.lookup_by_username("alice2").is_ok());
    }

    proptest::proptest! {
        /// After creating a batch of accounts with distinct rfids/usernames
        /// and renaming one of them, the id/rfid/username indices must stay
        /// in lockstep: every account id unique, the old username gone, the
        /// new one resolving to the same account.
        #[test]
        fn uniqueness_holds_after_create_and_rename(count in 2usize..20) {
            let store = AccountStore::new();
            let mut ids = Vec::with_capacity(count);
            for i in 0..count {
                let id = store
                    .create_account(new_account(&format!("RF{i:06}"), &format!("user{i}")), now())
                    .unwrap();
                ids.push(id);
            }

            let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
            prop_assert_eq!(unique.len(), ids.len());

            let renamed_id = ids[0];
            store.rename_username(renamed_id, "renamed_user".into()).unwrap();
            prop_assert!(store.lookup_by_username("user0").is_err());
            let renamed = store.lookup_by_username("renamed_user").unwrap();
            prop_assert_eq!(renamed.read().account_id, renamed_id);

            for (i, id) in ids.iter().enumerate().skip(1) {
                let by_rfid = store.lookup_by_rfid(&format!("RF{i:06}")).unwrap();
                prop_assert_eq!(by_rfid.read().account_id, *id);
            }
        }
    }
}
