//! The AS request dispatcher (`§4.3`).
//!
//! One `async fn dispatch` routing each [`Request`] to its handler, an
//! orchestrator-routes-to-handler shape keyed off the request's opcode.
//! `X`/`Y` line checks never reach here — the transport layer's
//! [`atm_protocol::linecheck`] intercepts and echoes
//! them before a frame is ever handed to `Request::parse`. `Quit` returns
//! `None`: `§4.3` is explicit that `Q` gets "no framed reply required."

use atm_protocol::{Request, Response};
use atm_store::AccountStore;

use crate::handlers::{account, card, pin};

pub struct Dispatcher {
    pub store: AccountStore,
}

impl Dispatcher {
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }

    pub async fn dispatch(&self, request: Request) -> Option<Response> {
        let now = chrono::Local::now().naive_local();
        match request {
            Request::CardCheck { rfid } => Some(card::handle(&self.store, &rfid)),
            Request::VerifyPin { rfid, pin } => Some(pin::handle(&self.store, &rfid, &pin)),
            Request::Account { rfid, action } => Some(account::handle(&self.store, &rfid, &action, now)),
            Request::LineCheckX | Request::LineCheckY => None,
            Request::Quit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_protocol::AccountAction;
    use atm_store::NewAccount;
    use chrono::NaiveDate;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn card_check_then_withdraw_then_balance() {
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
        let dispatcher = Dispatcher::new(store);

        let card = dispatcher
            .dispatch(Request::CardCheck { rfid: "11111111".into() })
            .await
            .unwrap();
        assert_eq!(card, Response::CardActive { username: "alice".into() });

        let withdraw = dispatcher
            .dispatch(Request::Account {
                rfid: "11111111".into(),
                action: AccountAction::Withdraw { amount: "250.00".into() },
            })
            .await
            .unwrap();
        assert_eq!(withdraw, Response::Done);

        let balance = dispatcher
            .dispatch(Request::Account {
                rfid: "11111111".into(),
                action: AccountAction::Balance,
            })
            .await
            .unwrap();
        assert_eq!(balance, Response::Balance { amount: "750.00".into() });
    }

    #[tokio::test]
    async fn quit_has_no_reply() {
        let dispatcher = Dispatcher::new(AccountStore::new());
        assert!(dispatcher.dispatch(Request::Quit).await.is_none());
    }

    #[tokio::test]
    async fn pin_lockout_then_block_then_invalid_card_check() {
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
        let dispatcher = Dispatcher::new(store);

        for _ in 0..3 {
            let resp = dispatcher
                .dispatch(Request::VerifyPin {
                    rfid: "11111111".into(),
                    pin: "0000".into(),
                })
                .await
                .unwrap();
            assert_eq!(resp, Response::ErrWrongPin);
        }

        let block = dispatcher
            .dispatch(Request::Account {
                rfid: "11111111".into(),
                action: AccountAction::Block,
            })
            .await
            .unwrap();
        assert_eq!(block, Response::Done);

        let recheck = dispatcher
            .dispatch(Request::CardCheck { rfid: "11111111".into() })
            .await
            .unwrap();
        assert_eq!(recheck, Response::ErrBlocked);
    }
}
