//! `A` opcode family: withdraw, deposit, balance, mini-statement, PIN
//! change, block (`§4.3`).
//!
//! Ceiling enforcement lives here, not in `atm_store::Account`, exactly as
//! that module's doc comment says it should — the store only knows
//! "positive and sufficient," the per-operation ceiling is a dispatcher
//! policy that can differ between the cardholder withdraw/deposit path
//! (30,000) and the operator transfer path (100,000).

use atm_protocol::response::TxnType as WireTxnType;
use atm_protocol::{AccountAction, Response};
use atm_store::{AccountStore, Error as StoreError, TransactionType};

use crate::config::WTD_DEP_CEILING;

pub fn handle(store: &AccountStore, rfid: &str, action: &AccountAction, now: chrono::NaiveDateTime) -> Response {
    let handle = match store.lookup_by_rfid(rfid) {
        Ok(h) => h,
        Err(_) => return Response::ErrInvalidCard,
    };

    match action {
        AccountAction::Withdraw { amount } => withdraw_or_deposit(&handle, amount, now, true),
        AccountAction::Deposit { amount } => withdraw_or_deposit(&handle, amount, now, false),
        AccountAction::Balance => Response::Balance {
            amount: format!("{:.2}", handle.read().balance),
        },
        AccountAction::MiniStatement { index } => match handle.read().mini_statement(*index) {
            Some(txn) => Response::MiniStatementEntry {
                txn_type: to_wire_txn_type(txn.kind),
                timestamp: txn.display_timestamp(),
                amount: format!("{:.2}", txn.amount),
            },
            None => Response::MiniStatementOutOfRange,
        },
        AccountAction::ChangePin { new_pin } => match handle.write().set_pin(new_pin) {
            Ok(()) => Response::Done,
            Err(_) => Response::ErrWrongPin,
        },
        AccountAction::Block => {
            handle.write().block();
            Response::Done
        }
    }
}

fn withdraw_or_deposit(
    handle: &atm_store::AccountHandle,
    amount_text: &str,
    now: chrono::NaiveDateTime,
    is_withdraw: bool,
) -> Response {
    let amount: f64 = match amount_text.parse() {
        Ok(a) => a,
        Err(_) => return Response::ErrNonPositiveAmount,
    };
    if amount <= 0.0 {
        return Response::ErrNonPositiveAmount;
    }
    if amount >= WTD_DEP_CEILING {
        return Response::ErrOverLimit;
    }

    let mut account = handle.write();
    let result = if is_withdraw {
        account.withdraw(amount, now)
    } else {
        account.deposit(amount, now)
    };

    match result {
        Ok(_) => Response::Done,
        Err(StoreError::InsufficientFunds(_, _)) => Response::ErrInsufficientFunds,
        Err(StoreError::NonPositiveAmount) => Response::ErrNonPositiveAmount,
        Err(_) => Response::ErrNonPositiveAmount,
    }
}

fn to_wire_txn_type(kind: TransactionType) -> WireTxnType {
    match kind {
        TransactionType::Withdraw => WireTxnType::Withdraw,
        TransactionType::Deposit => WireTxnType::Deposit,
        TransactionType::TransferIn => WireTxnType::TransferIn,
        TransactionType::TransferOut => WireTxnType::TransferOut,
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

    fn store_with_alice(balance: f64) -> AccountStore {
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
                    opening_balance: balance,
                },
                now(),
            )
            .unwrap();
        store
    }

    #[test]
    fn withdraw_then_balance() {
        let store = store_with_alice(1000.0);
        let withdraw = AccountAction::Withdraw { amount: "250.00".into() };
        assert_eq!(handle(&store, "11111111", &withdraw, now()), Response::Done);
        let balance = AccountAction::Balance;
        assert_eq!(
            handle(&store, "11111111", &balance, now()),
            Response::Balance { amount: "750.00".into() }
        );
    }

    #[test]
    fn low_balance_is_rejected() {
        let store = store_with_alice(100.0);
        let withdraw = AccountAction::Withdraw { amount: "200.00".into() };
        assert_eq!(handle(&store, "11111111", &withdraw, now()), Response::ErrInsufficientFunds);
    }

    #[test]
    fn over_ceiling_withdraw_is_rejected_strictly() {
        let store = store_with_alice(50_000.0);
        let at_ceiling = AccountAction::Withdraw { amount: "30000".into() };
        assert_eq!(handle(&store, "11111111", &at_ceiling, now()), Response::ErrOverLimit);
        let just_under = AccountAction::Withdraw { amount: "29999.99".into() };
        assert_eq!(handle(&store, "11111111", &just_under, now()), Response::Done);
    }

    #[test]
    fn mini_statement_overrun_returns_sentinel() {
        let store = store_with_alice(1000.0);
        let mst = AccountAction::MiniStatement { index: 2 };
        assert_eq!(handle(&store, "11111111", &mst, now()), Response::MiniStatementOutOfRange);
    }
}
