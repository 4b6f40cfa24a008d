//! Per-card session state machine for the ATM terminal controller.
//!
//! This crate models `§4.2`'s state table in isolation from the wire
//! protocol and from any real I/O: it consumes [`state::Event`]s and
//! produces [`machine::Action`]s, leaving `atm-terminal` to translate both
//! ends to and from actual serial frames, keypad reads, and LCD writes.

pub mod machine;
pub mod menu;
pub mod state;
pub mod timers;

pub use machine::{Action, SessionMachine};
pub use menu::{MenuCursor, MenuEntry};
pub use state::{ActionRequest, Event, PinChangeStage, SessionState, RETRY_BUDGET};
pub use timers::Countdown;
