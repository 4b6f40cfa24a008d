//! The TC session state machine (`§4.2`).
//!
//! `SessionMachine::advance` is the single seam: feed it one [`Event`], get
//! back whatever [`Action`]s the terminal loop needs to carry out (send a
//! request, show a message, arm a timer). The machine never talks to the
//! serial link or the LCD itself — `atm-terminal` composes the actual wire
//! requests and display writes from these actions, keeping this crate
//! testable without any I/O.
//!
//! Amount/index entry (typing "250.00" after picking Withdraw, typing a
//! mini-statement index) is treated as already collected by the terminal's
//! keypad-reading loop by the time [`Event::MenuSelect`] fires — modeling
//! individual keystroke accumulation here would duplicate the keypad
//! driver's job, which `§1` puts out of scope.

use crate::menu::MenuCursor;
use crate::state::{ActionRequest, Event, PinChangeStage, SessionState, RETRY_BUDGET};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Display(String),
    SendCardCheck { rfid: String },
    SendVerifyPin { rfid: String, pin: String },
    SendAccountAction { rfid: String, request: ActionRequest },
    SendChangePin { rfid: String, new_pin: String },
    SendBlock { rfid: String },
    ArmSessionTimer,
    ArmInputTimer,
    ReturnToIdle,
}

pub struct SessionMachine {
    state: SessionState,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// If the session is in `BLOCKED_END`, the block request to keep
    /// resending until `BlockAcknowledged` arrives (`§4.2`: "waits
    /// indefinitely, looping the send"). `None` in every other state.
    pub fn pending_block_retry(&self) -> Option<Action> {
        match &self.state {
            SessionState::BlockedEnd { rfid } => Some(Action::SendBlock { rfid: rfid.clone() }),
            _ => None,
        }
    }

    /// Send a Withdraw/Deposit/MiniStatement request once the terminal's
    /// keypad loop has collected the amount or index that followed the
    /// "Enter amount" prompt from `select_menu_entry`. Only valid from
    /// `Authenticated`; a no-op anywhere else (e.g. the cardholder
    /// cancelled mid-entry and the loop never calls this).
    pub fn request_action(&mut self, request: ActionRequest) -> Vec<Action> {
        let SessionState::Authenticated {
            rfid,
            username,
            verified_pin,
            menu,
        } = &self.state
        else {
            return vec![];
        };
        let (rfid, username, verified_pin, menu) = (rfid.clone(), username.clone(), verified_pin.clone(), *menu);
        self.state = SessionState::Operating {
            rfid: rfid.clone(),
            username,
            verified_pin,
            menu,
            request: request.clone(),
        };
        vec![Action::SendAccountAction { rfid, request }]
    }

    pub fn advance(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = transition(std::mem::replace(&mut self.state, SessionState::Idle), event);
        self.state = next;
        actions
    }
}

fn transition(state: SessionState, event: Event) -> (SessionState, Vec<Action>) {
    use SessionState::*;

    // The cancel key is a global abort-to-IDLE (`§6`), honored from any
    // state a cardholder could actually be sitting in.
    if matches!(event, Event::Cancel) && !matches!(state, Idle | BlockedEnd { .. }) {
        return (Idle, vec![Action::ReturnToIdle]);
    }

    match (state, event) {
        (Idle, Event::CardScanned { rfid }) => {
            let actions = vec![Action::SendCardCheck { rfid: rfid.clone() }];
            (CardPresented { rfid }, actions)
        }

        (CardPresented { rfid }, Event::CardCheckActive { username }) => (
            PinEntry {
                rfid: rfid.clone(),
                username,
                retries_remaining: RETRY_BUDGET,
                pending_pin: None,
            },
            vec![Action::Display("Enter PIN".into()), Action::ArmInputTimer],
        ),
        (CardPresented { .. }, Event::CardCheckBlocked) => (
            Idle,
            vec![Action::Display("Card Blocked".into()), Action::ReturnToIdle],
        ),
        (CardPresented { .. }, Event::CardCheckInvalid) => (
            Idle,
            vec![Action::Display("Invalid Card".into()), Action::ReturnToIdle],
        ),

        (
            PinEntry {
                rfid,
                username,
                retries_remaining,
                ..
            },
            Event::PinEntered { pin },
        ) => (
            PinEntry {
                rfid: rfid.clone(),
                username,
                retries_remaining,
                pending_pin: Some(pin.clone()),
            },
            vec![Action::SendVerifyPin { rfid, pin }],
        ),
        (
            PinEntry {
                rfid,
                username,
                pending_pin,
                ..
            },
            Event::PinVerifyMatched,
        ) => (
            Authenticated {
                rfid,
                username,
                verified_pin: pending_pin.unwrap_or_default(),
                menu: MenuCursor::default(),
            },
            vec![Action::Display("Welcome".into()), Action::ArmSessionTimer],
        ),
        (
            PinEntry {
                rfid,
                username,
                retries_remaining,
                ..
            },
            Event::PinVerifyWrong,
        ) => {
            if retries_remaining <= 1 {
                (
                    BlockedEnd { rfid: rfid.clone() },
                    vec![
                        Action::Display("Card Blocked".into()),
                        Action::SendBlock { rfid },
                    ],
                )
            } else {
                let remaining = retries_remaining - 1;
                (
                    PinEntry {
                        rfid,
                        username,
                        retries_remaining: remaining,
                        pending_pin: None,
                    },
                    vec![Action::Display(format!("Wrong PIN, {remaining} left"))],
                )
            }
        }
        (PinEntry { .. }, Event::Timeout) => (
            Idle,
            vec![Action::Display("Session Time-Out".into()), Action::ReturnToIdle],
        ),

        (
            Authenticated {
                rfid,
                username,
                verified_pin,
                mut menu,
            },
            Event::MenuUp,
        ) => {
            menu.up();
            (
                Authenticated {
                    rfid,
                    username,
                    verified_pin,
                    menu,
                },
                vec![],
            )
        }
        (
            Authenticated {
                rfid,
                username,
                verified_pin,
                mut menu,
            },
            Event::MenuDown,
        ) => {
            menu.down();
            (
                Authenticated {
                    rfid,
                    username,
                    verified_pin,
                    menu,
                },
                vec![],
            )
        }
        (
            Authenticated {
                rfid,
                username,
                verified_pin,
                menu,
            },
            Event::MenuSelect { digit },
        ) => select_menu_entry(rfid, username, verified_pin, menu, digit),
        (
            Authenticated { .. },
            Event::Timeout,
        ) => (
            Idle,
            vec![Action::Display("Session Time-Out".into()), Action::ReturnToIdle],
        ),

        (
            Operating {
                rfid,
                username,
                verified_pin,
                menu,
                ..
            },
            Event::ActionResponseReceived,
        ) => (
            Authenticated {
                rfid,
                username,
                verified_pin,
                menu,
            },
            vec![],
        ),

        (
            PinChange {
                rfid,
                username,
                verified_pin,
                menu,
                stage,
                retries_remaining,
            },
            Event::PinChangeInput { text },
        ) => pin_change_input(rfid, username, verified_pin, menu, stage, retries_remaining, text),

        (
            PinChange {
                rfid,
                username,
                verified_pin,
                menu,
                ..
            },
            Event::PinChangeAccepted,
        ) => (
            Authenticated {
                rfid,
                username,
                verified_pin,
                menu,
            },
            vec![Action::Display("PIN Changed".into())],
        ),

        (BlockedEnd { rfid }, Event::BlockAcknowledged) => {
            let _ = rfid;
            (Idle, vec![Action::ReturnToIdle])
        }

        // Any other (state, event) pairing is not a valid transition —
        // stay put. This covers spurious timer ticks, duplicate responses,
        // and events that simply don't apply to the current state.
        (state, _) => (state, vec![]),
    }
}

fn select_menu_entry(
    rfid: String,
    username: String,
    verified_pin: String,
    menu: MenuCursor,
    digit: char,
) -> (SessionState, Vec<Action>) {
    use crate::menu::MenuEntry;

    let Some(entry) = menu.select(digit) else {
        return (
            SessionState::Authenticated {
                rfid,
                username,
                verified_pin,
                menu,
            },
            vec![],
        );
    };

    match entry {
        MenuEntry::Balance => (
            SessionState::Operating {
                rfid: rfid.clone(),
                username,
                verified_pin,
                menu,
                request: ActionRequest::Balance,
            },
            vec![Action::SendAccountAction {
                rfid,
                request: ActionRequest::Balance,
            }],
        ),
        MenuEntry::PinChange => (
            SessionState::PinChange {
                rfid,
                username,
                verified_pin,
                menu,
                stage: PinChangeStage::AwaitOldPin,
                retries_remaining: RETRY_BUDGET,
            },
            vec![Action::Display("Enter Old PIN".into())],
        ),
        MenuEntry::Exit => (SessionState::Idle, vec![Action::ReturnToIdle]),
        // Withdraw / Deposit / MiniStatement need an amount or index that
        // the terminal's keypad loop collects before re-firing
        // `MenuSelect` is not how this is modeled; instead the terminal
        // collects the value and calls `request_action` directly (see
        // `SessionMachine::request_action`) once it has it.
        MenuEntry::Withdraw | MenuEntry::Deposit | MenuEntry::MiniStatement => (
            SessionState::Authenticated {
                rfid,
                username,
                verified_pin,
                menu,
            },
            vec![Action::Display("Enter amount".into())],
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn pin_change_input(
    rfid: String,
    username: String,
    verified_pin: String,
    menu: MenuCursor,
    stage: PinChangeStage,
    retries_remaining: u32,
    text: String,
) -> (SessionState, Vec<Action>) {
    match stage {
        PinChangeStage::AwaitOldPin => {
            if text == verified_pin {
                (
                    SessionState::PinChange {
                        rfid,
                        username,
                        verified_pin,
                        menu,
                        stage: PinChangeStage::AwaitNewPin,
                        retries_remaining,
                    },
                    vec![Action::Display("Enter New PIN".into())],
                )
            } else {
                pin_change_guard_failure(rfid, username, verified_pin, menu, PinChangeStage::AwaitOldPin, retries_remaining)
            }
        }
        PinChangeStage::AwaitNewPin => (
            SessionState::PinChange {
                rfid,
                username,
                verified_pin,
                menu,
                stage: PinChangeStage::AwaitNewPinConfirm { new_pin: text },
                retries_remaining,
            },
            vec![Action::Display("Confirm New PIN".into())],
        ),
        PinChangeStage::AwaitNewPinConfirm { new_pin } => {
            if text == new_pin {
                (
                    SessionState::PinChange {
                        rfid: rfid.clone(),
                        username,
                        verified_pin,
                        menu,
                        stage: PinChangeStage::AwaitNewPinConfirm { new_pin: new_pin.clone() },
                        retries_remaining,
                    },
                    vec![Action::SendChangePin { rfid, new_pin }],
                )
            } else {
                pin_change_guard_failure(
                    rfid,
                    username,
                    verified_pin,
                    menu,
                    PinChangeStage::AwaitNewPin,
                    retries_remaining,
                )
            }
        }
    }
}

fn pin_change_guard_failure(
    rfid: String,
    username: String,
    verified_pin: String,
    menu: MenuCursor,
    retry_stage: PinChangeStage,
    retries_remaining: u32,
) -> (SessionState, Vec<Action>) {
    if retries_remaining <= 1 {
        (
            SessionState::BlockedEnd { rfid: rfid.clone() },
            vec![
                Action::Display("Card Blocked".into()),
                Action::SendBlock { rfid },
            ],
        )
    } else {
        let remaining = retries_remaining - 1;
        (
            SessionState::PinChange {
                rfid,
                username,
                verified_pin,
                menu,
                stage: retry_stage,
                retries_remaining: remaining,
            },
            vec![Action::Display(format!("Mismatch, {remaining} left"))],
        )
    }
}
