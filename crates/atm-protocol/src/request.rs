//! Request-side opcode matrix (`§4.3` of the design).

use std::fmt;

use crate::error::{Error, Result};
use crate::frame::{Direction, Frame};

/// An 8-character RFID card identifier, treated as an opaque ASCII string.
pub type Rfid = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    Withdraw { amount: String },
    Deposit { amount: String },
    Balance,
    MiniStatement { index: u32 },
    ChangePin { new_pin: String },
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `#C:<rfid8>$`
    CardCheck { rfid: Rfid },
    /// `#V:<rfid8>:<pin4>$`
    VerifyPin { rfid: Rfid, pin: String },
    /// `#A:<sub-op>:<rfid8>[:<arg>]$`
    Account { rfid: Rfid, action: AccountAction },
    /// `#X:LINEOK$`
    LineCheckX,
    /// `#Y:LINEOK$`
    LineCheckY,
    /// `#Q:SAVE$`
    Quit,
}

impl Request {
    /// Parse a request from its already-delimited frame.
    pub fn parse(frame: &Frame) -> Result<Self> {
        if frame.direction != Direction::Request {
            return Err(Error::MalformedFrame("not a request frame".into()));
        }
        let mut parts = frame.body.splitn(2, ':');
        let op = parts
            .next()
            .ok_or_else(|| Error::MalformedFrame("missing opcode".into()))?;
        let rest = parts.next().unwrap_or("");

        match op {
            "C" => Ok(Request::CardCheck {
                rfid: rest.to_string(),
            }),
            "V" => {
                let mut it = rest.splitn(2, ':');
                let rfid = it.next().unwrap_or_default().to_string();
                let pin = it.next().unwrap_or_default().to_string();
                Ok(Request::VerifyPin { rfid, pin })
            }
            "A" => parse_account(rest),
            "X" if rest == "LINEOK" => Ok(Request::LineCheckX),
            "Y" if rest == "LINEOK" => Ok(Request::LineCheckY),
            "Q" if rest == "SAVE" => Ok(Request::Quit),
            other => Err(Error::MalformedFrame(format!("unrecognized opcode '{other}'"))),
        }
    }

    pub fn encode(&self) -> String {
        let body = match self {
            Request::CardCheck { rfid } => format!("C:{rfid}"),
            Request::VerifyPin { rfid, pin } => format!("V:{rfid}:{pin}"),
            Request::Account { rfid, action } => format!("A:{}", encode_account(rfid, action)),
            Request::LineCheckX => "X:LINEOK".to_string(),
            Request::LineCheckY => "Y:LINEOK".to_string(),
            Request::Quit => "Q:SAVE".to_string(),
        };
        crate::frame::render(Direction::Request, &body)
    }
}

fn parse_account(rest: &str) -> Result<Request> {
    let mut it = rest.splitn(3, ':');
    let sub_op = it
        .next()
        .ok_or_else(|| Error::MalformedFrame("missing account sub-op".into()))?;
    let rfid = it.next().unwrap_or_default().to_string();
    let arg = it.next();

    let action = match sub_op {
        "WTD" => AccountAction::Withdraw {
            amount: arg.unwrap_or_default().to_string(),
        },
        "DEP" => AccountAction::Deposit {
            amount: arg.unwrap_or_default().to_string(),
        },
        "BAL" => AccountAction::Balance,
        "MST" => {
            let index = arg
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(|_| Error::MalformedFrame("non-numeric MST index".into()))?;
            AccountAction::MiniStatement { index }
        }
        "PIN" => AccountAction::ChangePin {
            new_pin: arg.unwrap_or_default().to_string(),
        },
        "BLK" => AccountAction::Block,
        other => return Err(Error::MalformedFrame(format!("unrecognized account sub-op '{other}'"))),
    };
    Ok(Request::Account { rfid, action })
}

fn encode_account(rfid: &str, action: &AccountAction) -> String {
    match action {
        AccountAction::Withdraw { amount } => format!("WTD:{rfid}:{amount}"),
        AccountAction::Deposit { amount } => format!("DEP:{rfid}:{amount}"),
        AccountAction::Balance => format!("BAL:{rfid}"),
        AccountAction::MiniStatement { index } => format!("MST:{rfid}:{index}"),
        AccountAction::ChangePin { new_pin } => format!("PIN:{rfid}:{new_pin}"),
        AccountAction::Block => format!("BLK:{rfid}"),
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    fn req(line: &str) -> Request {
        let stripped = frame::strip_line_terminator(line);
        let frame = frame::parse(stripped).unwrap();
        Request::parse(&frame).unwrap()
    }

    #[test]
    fn parses_card_check() {
        assert_eq!(
            req("#C:11111111$"),
            Request::CardCheck {
                rfid: "11111111".into()
            }
        );
    }

    #[test]
    fn parses_withdraw() {
        assert_eq!(
            req("#A:WTD:11111111:250.00$"),
            Request::Account {
                rfid: "11111111".into(),
                action: AccountAction::Withdraw {
                    amount: "250.00".into()
                }
            }
        );
    }

    #[test]
    fn parses_mini_statement_overrun_index() {
        assert_eq!(
            req("#A:MST:11111111:3$"),
            Request::Account {
                rfid: "11111111".into(),
                action: AccountAction::MiniStatement { index: 3 }
            }
        );
    }

    #[test]
    fn round_trips_through_encode() {
        let original = Request::Account {
            rfid: "11111111".into(),
            action: AccountAction::Withdraw {
                amount: "250.00".into(),
            },
        };
        let encoded = original.encode();
        let stripped = frame::strip_line_terminator(&encoded);
        let parsed = Request::parse(&frame::parse(stripped).unwrap()).unwrap();
        assert_eq!(original, parsed);
    }
}
