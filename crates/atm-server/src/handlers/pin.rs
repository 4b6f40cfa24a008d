//! `V` opcode: PIN verification (`§4.3`, `§9` open question).
//!
//! The original handler dereferenced the rfid lookup without checking for
//! a miss. Here a missing account reports `@ERR:INVALID$` rather than
//! panicking — the same response `C` gives an unrecognized card, since
//! both mean "no such account," and never `@ERR:WRONG$`, which means
//! specifically "account found, PIN didn't match."

use atm_protocol::Response;
use atm_store::AccountStore;

pub fn handle(store: &AccountStore, rfid: &str, pin: &str) -> Response {
    match store.lookup_by_rfid(rfid) {
        Ok(handle) => {
            if handle.read().verify_pin(pin) {
                Response::PinMatched
            } else {
                Response::ErrWrongPin
            }
        }
        Err(_) => Response::ErrInvalidCard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_store::NewAccount;
    use chrono::NaiveDate;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn store_with_alice() -> AccountStore {
        let store = AccountStore::new();
        store
            .create_account(
                NewAccount {
                    holder_name: "alice smith".into(),
                    phone: 9_000_000_000,
                    username: "alice".into(),
                    password: "hunter22".into(),
                    rfid: "11111111".into(),
                    pin: "1234".into(),
                    opening_balance: 1000.0,
                },
                now(),
            )
            .unwrap();
        store
    }

    #[test]
    fn matching_pin_succeeds() {
        let store = store_with_alice();
        assert_eq!(handle(&store, "11111111", "1234"), Response::PinMatched);
    }

    #[test]
    fn wrong_pin_on_known_card() {
        let store = store_with_alice();
        assert_eq!(handle(&store, "11111111", "0000"), Response::ErrWrongPin);
    }

    #[test]
    fn unknown_rfid_never_panics() {
        let store = store_with_alice();
        assert_eq!(handle(&store, "99999999", "1234"), Response::ErrInvalidCard);
    }
}
