//! `C` opcode: card-presence check (`§4.3`).

use atm_protocol::Response;
use atm_store::AccountStore;

pub fn handle(store: &AccountStore, rfid: &str) -> Response {
    match store.lookup_by_rfid(rfid) {
        Ok(handle) => {
            let account = handle.read();
            if account.is_active() {
                Response::CardActive {
                    username: account.username.clone(),
                }
            } else {
                Response::ErrBlocked
            }
        }
        Err(_) => Response::ErrInvalidCard,
    }
}
