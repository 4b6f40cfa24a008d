//! The Terminal Controller's main loop (`§5`).
//!
//! The firmware's interrupt-driven poll loop (keypad scan ISR, serial RX
//! ISR, timer tick ISR) collapses here into a single cooperatively
//! scheduled loop: one request goes out, one reply comes back, before the
//! next keystroke is read, matching `§4.1`'s "receive one, dispatch,
//! reply, then the next" link discipline from the TC's side of the wire.
//! [`SessionMachine`] never touches the transport directly — this loop
//! is the only place an [`Action`] turns into a wire request or an LCD
//! write.

use std::collections::VecDeque;

use atm_protocol::{linecheck, AccountAction, FrameTransport, Request, Response};
use atm_session::{Action, ActionRequest, Countdown, Event, MenuEntry, SessionMachine, SessionState};
use tracing::warn;

use crate::io::keypad::{self, Keypad};
use crate::io::lcd::Lcd;
use crate::io::rfid::RfidReader;

const PIN_LENGTH: usize = 4;

/// What the terminal is accumulating keystrokes into while the session
/// machine sits in `Authenticated` after picking Withdraw, Deposit, or
/// Mini Statement — these need a typed value the machine itself never
/// models (`machine::select_menu_entry`'s doc comment).
enum Collecting {
    None,
    Entry(MenuEntry, String),
}

pub struct TerminalLoop<T, K, L, R> {
    transport: T,
    keypad: K,
    lcd: L,
    rfid: R,
    machine: SessionMachine,
    session_timer: Countdown,
    input_timer: Countdown,
    input_buffer: String,
    collecting: Collecting,
}

impl<T, K, L, R> TerminalLoop<T, K, L, R>
where
    T: FrameTransport,
    K: Keypad,
    L: Lcd,
    R: RfidReader,
{
    pub fn new(transport: T, keypad: K, lcd: L, rfid: R, inactivity_ceiling: u32) -> Self {
        Self {
            transport,
            keypad,
            lcd,
            rfid,
            machine: SessionMachine::new(),
            session_timer: Countdown::new(inactivity_ceiling),
            input_timer: Countdown::new(inactivity_ceiling),
            input_buffer: String::new(),
            collecting: Collecting::None,
        }
    }

    /// Run until the transport's link closes.
    pub async fn run(&mut self) -> atm_protocol::Result<()> {
        self.lcd.display("Insert Card").await;
        loop {
            if self.machine.state().is_idle() {
                if let Some(rfid) = self.rfid.scan().await {
                    let actions = self.machine.advance(Event::CardScanned { rfid });
                    self.drive(actions).await?;
                    continue;
                }
            }

            if let Some(retry) = self.machine.pending_block_retry() {
                // `§4.2`: BLOCKED_END "waits indefinitely, looping the send."
                self.drive(vec![retry]).await?;
                continue;
            }

            if self.tick_timers() {
                continue;
            }

            let Some(key) = self.keypad.read_key().await else {
                return Ok(());
            };
            self.on_keypress(key).await?;
        }
    }

    /// Advance both timers by one poll tick; fires the matching `Timeout`
    /// event on whichever one expires. Returns `true` if a timeout fired,
    /// so the caller re-checks the (now Idle) state before reading a key.
    fn tick_timers(&mut self) -> bool {
        match self.machine.state() {
            SessionState::PinEntry { .. } => {
                if self.input_timer.tick() {
                    let actions = self.machine.advance(Event::Timeout);
                    self.collecting = Collecting::None;
                    self.input_buffer.clear();
                    // Display/ReturnToIdle actions are queued synchronously
                    // below via a blocking drain since we're not in async
                    // context here; defer to the next loop iteration by
                    // stashing nothing — the machine is already Idle.
                    let _ = actions;
                    return true;
                }
            }
            SessionState::Authenticated { .. } | SessionState::Operating { .. } | SessionState::PinChange { .. } => {
                if self.session_timer.tick() {
                    self.machine.advance(Event::Timeout);
                    self.collecting = Collecting::None;
                    self.input_buffer.clear();
                    return true;
                }
            }
            _ => {}
        }
        false
    }

    async fn on_keypress(&mut self, key: char) -> atm_protocol::Result<()> {
        self.input_timer.reset();
        self.session_timer.reset();

        if key == keypad::CANCEL && !self.machine.state().is_idle() {
            self.collecting = Collecting::None;
            self.input_buffer.clear();
            let actions = self.machine.advance(Event::Cancel);
            return self.drive(actions).await;
        }

        match self.machine.state() {
            SessionState::PinEntry { .. } => self.handle_pin_entry_key(key).await,
            SessionState::Authenticated { .. } => self.handle_authenticated_key(key).await,
            SessionState::PinChange { .. } => self.handle_pin_change_key(key).await,
            _ => Ok(()),
        }
    }

    async fn handle_pin_entry_key(&mut self, key: char) -> atm_protocol::Result<()> {
        if key == keypad::BACKSPACE {
            self.input_buffer.pop();
            return Ok(());
        }
        if !key.is_ascii_digit() {
            return Ok(());
        }
        self.input_buffer.push(key);
        if self.input_buffer.len() == PIN_LENGTH {
            let pin = std::mem::take(&mut self.input_buffer);
            let actions = self.machine.advance(Event::PinEntered { pin });
            self.drive(actions).await?;
        }
        Ok(())
    }

    async fn handle_authenticated_key(&mut self, key: char) -> atm_protocol::Result<()> {
        if !matches!(self.collecting, Collecting::None) {
            return self.handle_collecting_key(key).await;
        }
        if key == keypad::NAV_UP {
            let actions = self.machine.advance(Event::MenuUp);
            return self.drive(actions).await;
        }
        if key == keypad::NAV_DOWN {
            let actions = self.machine.advance(Event::MenuDown);
            return self.drive(actions).await;
        }
        if !key.is_ascii_digit() {
            return Ok(());
        }
        let Some(entry) = self.machine.state().current_menu_entry() else {
            return Ok(());
        };
        if entry.digit() != key {
            return Ok(());
        }
        match entry {
            MenuEntry::Withdraw | MenuEntry::Deposit | MenuEntry::MiniStatement => {
                self.collecting = Collecting::Entry(entry, String::new());
                let prompt = if matches!(entry, MenuEntry::MiniStatement) {
                    "Enter index"
                } else {
                    "Enter amount"
                };
                self.lcd.display(prompt).await;
                Ok(())
            }
            _ => {
                let actions = self.machine.advance(Event::MenuSelect { digit: key });
                self.drive(actions).await
            }
        }
    }

    async fn handle_collecting_key(&mut self, key: char) -> atm_protocol::Result<()> {
        let Collecting::Entry(entry, buffer) = &mut self.collecting else {
            return Ok(());
        };
        if key == keypad::BACKSPACE {
            buffer.pop();
            return Ok(());
        }
        if key == keypad::CONFIRM {
            let entry = *entry;
            let value = std::mem::take(buffer);
            self.collecting = Collecting::None;
            let request = match entry {
                MenuEntry::Withdraw => ActionRequest::Withdraw { amount: value },
                MenuEntry::Deposit => ActionRequest::Deposit { amount: value },
                MenuEntry::MiniStatement => ActionRequest::MiniStatement {
                    index: value.parse().unwrap_or(0),
                },
                _ => return Ok(()),
            };
            let actions = self.machine.request_action(request);
            return self.drive(actions).await;
        }
        if key.is_ascii_digit() {
            buffer.push(key);
        }
        Ok(())
    }

    async fn handle_pin_change_key(&mut self, key: char) -> atm_protocol::Result<()> {
        if key == keypad::BACKSPACE {
            self.input_buffer.pop();
            return Ok(());
        }
        if key == keypad::CONFIRM {
            let text = std::mem::take(&mut self.input_buffer);
            let actions = self.machine.advance(Event::PinChangeInput { text });
            return self.drive(actions).await;
        }
        if key.is_ascii_digit() {
            self.input_buffer.push(key);
        }
        Ok(())
    }

    /// Drain a queue of [`Action`]s, round-tripping to the account server
    /// wherever an action needs one and feeding whatever event the reply
    /// implies back into the machine. Iterative rather than recursive so
    /// a long Action/Event bounce (e.g. CardCheck -> PinEntry prompt)
    /// doesn't need boxed async recursion.
    async fn drive(&mut self, initial: Vec<Action>) -> atm_protocol::Result<()> {
        let mut queue: VecDeque<Action> = initial.into();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::Display(text) => self.lcd.display(&text).await,
                Action::ArmSessionTimer => self.session_timer.reset(),
                Action::ArmInputTimer => self.input_timer.reset(),
                Action::ReturnToIdle => {
                    self.collecting = Collecting::None;
                    self.input_buffer.clear();
                    self.lcd.display("Insert Card").await;
                }
                Action::SendCardCheck { rfid } => {
                    let response = self.round_trip(Request::CardCheck { rfid }).await?;
                    let event = match response {
                        Response::CardActive { username } => Event::CardCheckActive { username },
                        Response::ErrBlocked => Event::CardCheckBlocked,
                        _ => Event::CardCheckInvalid,
                    };
                    queue.extend(self.machine.advance(event));
                }
                Action::SendVerifyPin { rfid, pin } => {
                    let response = self.round_trip(Request::VerifyPin { rfid, pin }).await?;
                    let event = match response {
                        Response::PinMatched => Event::PinVerifyMatched,
                        _ => Event::PinVerifyWrong,
                    };
                    queue.extend(self.machine.advance(event));
                }
                Action::SendAccountAction { rfid, request } => {
                    let action = to_account_action(request);
                    let response = self.round_trip(Request::Account { rfid, action }).await?;
                    self.display_response(&response).await;
                    queue.extend(self.machine.advance(Event::ActionResponseReceived));
                }
                Action::SendChangePin { rfid, new_pin } => {
                    let response = self
                        .round_trip(Request::Account {
                            rfid,
                            action: AccountAction::ChangePin { new_pin },
                        })
                        .await?;
                    match response {
                        Response::Done => queue.extend(self.machine.advance(Event::PinChangeAccepted)),
                        other => self.display_response(&other).await,
                    }
                }
                Action::SendBlock { rfid } => {
                    let response = self
                        .round_trip(Request::Account {
                            rfid,
                            action: AccountAction::Block,
                        })
                        .await?;
                    if matches!(response, Response::Done) {
                        queue.extend(self.machine.advance(Event::BlockAcknowledged));
                    }
                }
            }
        }
        Ok(())
    }

    async fn display_response(&mut self, response: &Response) {
        let text = match response {
            Response::Done => "Done".to_string(),
            Response::Balance { amount } => format!("Balance: {amount}"),
            Response::MiniStatementEntry {
                txn_type,
                timestamp,
                amount,
            } => format!("{txn_type:?} {amount} {timestamp}"),
            Response::MiniStatementOutOfRange => "No more entries".to_string(),
            Response::ErrNonPositiveAmount => "Invalid amount".to_string(),
            Response::ErrOverLimit => "Over limit".to_string(),
            Response::ErrInsufficientFunds => "Insufficient funds".to_string(),
            Response::ErrBlocked => "Card Blocked".to_string(),
            Response::ErrInvalidCard => "Invalid Card".to_string(),
            Response::ErrWrongPin => "Wrong PIN".to_string(),
            _ => "Unexpected reply".to_string(),
        };
        self.lcd.display(&text).await;
    }

    /// Transmit one request and block for its reply, transparently
    /// servicing any AS-initiated line check that arrives first
    /// (`§4.1`).
    async fn round_trip(&mut self, request: Request) -> atm_protocol::Result<Response> {
        self.transport.transmit_line(&request.encode()).await?;
        loop {
            match self.transport.receive().await? {
                Some(frame) => {
                    if let Some(initiator) = linecheck::recognize_lineok(&frame) {
                        linecheck::echo(&mut self.transport, initiator).await?;
                        continue;
                    }
                    return Response::parse(&frame).map_err(Into::into);
                }
                None => {
                    warn!("discarded malformed frame while awaiting reply");
                    continue;
                }
            }
        }
    }
}

fn to_account_action(request: ActionRequest) -> AccountAction {
    match request {
        ActionRequest::Withdraw { amount } => AccountAction::Withdraw { amount },
        ActionRequest::Deposit { amount } => AccountAction::Deposit { amount },
        ActionRequest::Balance => AccountAction::Balance,
        ActionRequest::MiniStatement { index } => AccountAction::MiniStatement { index },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_protocol::DuplexTransport;

    use crate::io::keypad::ScriptedKeypad;
    use crate::io::lcd::RecordingLcd;
    use crate::io::rfid::ScriptedRfid;

    /// A minimal account server stand-in that replies to whatever a test
    /// needs and nothing else, driven over the other end of the same
    /// duplex pipe the loop under test uses.
    async fn serve_one(as_side: &mut DuplexTransport, reply_for: impl Fn(&Request) -> Response) {
        let frame = as_side.receive().await.unwrap().unwrap();
        let request = Request::parse(&frame).unwrap();
        let response = reply_for(&request);
        as_side.transmit_line(&response.encode()).await.unwrap();
    }

    #[tokio::test]
    async fn happy_path_logs_in_and_checks_balance() {
        let (tc_end, as_end) = tokio::io::duplex(4096);
        let transport = DuplexTransport::new(tc_end);
        let mut as_side = DuplexTransport::new(as_end);

        let keypad = ScriptedKeypad::new(['1', '2', '3', '4', 'B', 'B', '3']);
        let lcd = RecordingLcd::default();
        let rfid = ScriptedRfid::single_card("11111111");

        let mut terminal = TerminalLoop::new(transport, keypad, lcd, rfid, 30);

        let server = tokio::spawn(async move {
            serve_one(&mut as_side, |_| Response::CardActive {
                username: "alice".into(),
            })
            .await;
            serve_one(&mut as_side, |_| Response::PinMatched).await;
            serve_one(&mut as_side, |_| Response::Balance {
                amount: "500.00".into(),
            })
            .await;
            as_side
        });

        terminal.run().await.unwrap();
        let as_side = server.await.unwrap();
        drop(as_side);

        assert!(matches!(terminal.machine.state(), SessionState::Authenticated { .. }));
        assert!(terminal.lcd.shown.iter().any(|line| line.contains("500.00")));
    }

    #[tokio::test]
    async fn wrong_pin_three_times_blocks_the_card() {
        let (tc_end, as_end) = tokio::io::duplex(4096);
        let transport = DuplexTransport::new(tc_end);
        let mut as_side = DuplexTransport::new(as_end);

        let keypad = ScriptedKeypad::new([
            '0', '0', '0', '0', '0', '0', '0', '0', '0', '0', '0', '0',
        ]);
        let lcd = RecordingLcd::default();
        let rfid = ScriptedRfid::single_card("11111111");
        let mut terminal = TerminalLoop::new(transport, keypad, lcd, rfid, 30);

        let server = tokio::spawn(async move {
            serve_one(&mut as_side, |_| Response::CardActive {
                username: "alice".into(),
            })
            .await;
            for _ in 0..3 {
                serve_one(&mut as_side, |_| Response::ErrWrongPin).await;
            }
            serve_one(&mut as_side, |_| Response::Done).await;
            as_side
        });

        terminal.run().await.unwrap();
        server.await.unwrap();

        assert!(matches!(terminal.machine.state(), SessionState::Idle));
    }
}
