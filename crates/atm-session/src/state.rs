//! Session states and the events that drive transitions between them
//! (`§4.2`).

use crate::menu::{MenuCursor, MenuEntry};

/// Wrong-PIN budget for both the login PIN check and the PIN-change guard
/// (each tracked independently, per `§4.2`).
pub const RETRY_BUDGET: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinChangeStage {
    AwaitOldPin,
    AwaitNewPin,
    AwaitNewPinConfirm { new_pin: String },
}

/// An action request chosen from the main menu, carrying whatever the
/// dispatcher needs to build the wire request — kept protocol-agnostic so
/// this crate has no dependency on `atm-protocol` and stays testable on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Withdraw { amount: String },
    Deposit { amount: String },
    Balance,
    MiniStatement { index: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CardPresented {
        rfid: String,
    },
    PinEntry {
        rfid: String,
        username: String,
        retries_remaining: u32,
        /// The PIN from the most recent `PinEntered`, held until the AS's
        /// verdict comes back so a `PinVerifyMatched` can promote it to
        /// `verified_pin` without the terminal re-supplying it.
        pending_pin: Option<String>,
    },
    Authenticated {
        rfid: String,
        username: String,
        /// The PIN that authenticated this session, kept only so the
        /// PIN-change guard can check the re-entered old PIN locally
        /// instead of round-tripping to the AS again.
        verified_pin: String,
        menu: MenuCursor,
    },
    Operating {
        rfid: String,
        username: String,
        verified_pin: String,
        menu: MenuCursor,
        request: ActionRequest,
    },
    PinChange {
        rfid: String,
        username: String,
        verified_pin: String,
        menu: MenuCursor,
        stage: PinChangeStage,
        retries_remaining: u32,
    },
    BlockedEnd {
        rfid: String,
    },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn current_menu_entry(&self) -> Option<MenuEntry> {
        match self {
            SessionState::Authenticated { menu, .. } => Some(menu.current()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CardScanned { rfid: String },
    CardCheckActive { username: String },
    CardCheckBlocked,
    CardCheckInvalid,
    PinEntered { pin: String },
    PinVerifyMatched,
    PinVerifyWrong,
    Cancel,
    Timeout,
    MenuUp,
    MenuDown,
    MenuSelect { digit: char },
    ActionResponseReceived,
    PinChangeInput { text: String },
    PinChangeAccepted,
    BlockAcknowledged,
}
