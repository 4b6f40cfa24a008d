//! Response-side tag matrix (`§4.3` of the design).

use std::fmt;

use crate::error::{Error, Result};
use crate::frame::{Direction, Frame};

/// Transaction type as carried in mini-statement replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnType {
    Withdraw,
    Deposit,
    TransferIn,
    TransferOut,
}

impl TxnType {
    fn as_wire_digit(self) -> u8 {
        match self {
            TxnType::Withdraw => 1,
            TxnType::Deposit => 2,
            TxnType::TransferIn => 3,
            TxnType::TransferOut => 4,
        }
    }

    fn from_wire_digit(d: u8) -> Option<Self> {
        match d {
            1 => Some(TxnType::Withdraw),
            2 => Some(TxnType::Deposit),
            3 => Some(TxnType::TransferIn),
            4 => Some(TxnType::TransferOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `@OK:ACTIVE:<username>$`
    CardActive { username: String },
    /// `@OK:MATCHED$`
    PinMatched,
    /// `@OK:DONE$`
    Done,
    /// `@OK:BAL=<amount>$` — amount already formatted to two decimal places.
    Balance { amount: String },
    /// `@TXN:<type>:<dd/mm/yyyy hh:mm>:<amount>$`
    MiniStatementEntry {
        txn_type: TxnType,
        timestamp: String,
        amount: String,
    },
    /// `@TXN:7:0:0$` — mini-statement index past the end of history.
    MiniStatementOutOfRange,
    /// `@ERR:BLOCK$`
    ErrBlocked,
    /// `@ERR:INVALID$`
    ErrInvalidCard,
    /// `@ERR:WRONG$`
    ErrWrongPin,
    /// `@ERR:NEGAMT$`
    ErrNonPositiveAmount,
    /// `@ERR:MAXAMT$`
    ErrOverLimit,
    /// `@ERR:LOWBAL$`
    ErrInsufficientFunds,
    /// `@X:LINEOK$`
    LineCheckX,
    /// `@Y:LINEOK$`
    LineCheckY,
}

impl Response {
    pub fn parse(frame: &Frame) -> Result<Self> {
        if frame.direction != Direction::Response {
            return Err(Error::MalformedFrame("not a response frame".into()));
        }
        let mut parts = frame.body.splitn(2, ':');
        let tag = parts
            .next()
            .ok_or_else(|| Error::MalformedFrame("missing tag".into()))?;
        let rest = parts.next().unwrap_or("");

        match tag {
            "OK" => parse_ok(rest),
            "ERR" => parse_err(rest),
            "TXN" => parse_txn(rest),
            "X" if rest == "LINEOK" => Ok(Response::LineCheckX),
            "Y" if rest == "LINEOK" => Ok(Response::LineCheckY),
            other => Err(Error::MalformedFrame(format!("unrecognized tag '{other}'"))),
        }
    }

    pub fn encode(&self) -> String {
        let body = match self {
            Response::CardActive { username } => format!("OK:ACTIVE:{username}"),
            Response::PinMatched => "OK:MATCHED".to_string(),
            Response::Done => "OK:DONE".to_string(),
            Response::Balance { amount } => format!("OK:BAL={amount}"),
            Response::MiniStatementEntry {
                txn_type,
                timestamp,
                amount,
            } => format!("TXN:{}:{timestamp}:{amount}", txn_type.as_wire_digit()),
            Response::MiniStatementOutOfRange => "TXN:7:0:0".to_string(),
            Response::ErrBlocked => "ERR:BLOCK".to_string(),
            Response::ErrInvalidCard => "ERR:INVALID".to_string(),
            Response::ErrWrongPin => "ERR:WRONG".to_string(),
            Response::ErrNonPositiveAmount => "ERR:NEGAMT".to_string(),
            Response::ErrOverLimit => "ERR:MAXAMT".to_string(),
            Response::ErrInsufficientFunds => "ERR:LOWBAL".to_string(),
            Response::LineCheckX => "X:LINEOK".to_string(),
            Response::LineCheckY => "Y:LINEOK".to_string(),
        };
        crate::frame::render(Direction::Response, &body)
    }
}

fn parse_ok(rest: &str) -> Result<Response> {
    if rest == "MATCHED" {
        return Ok(Response::PinMatched);
    }
    if rest == "DONE" {
        return Ok(Response::Done);
    }
    if let Some(username) = rest.strip_prefix("ACTIVE:") {
        return Ok(Response::CardActive {
            username: username.to_string(),
        });
    }
    if let Some(amount) = rest.strip_prefix("BAL=") {
        return Ok(Response::Balance {
            amount: amount.to_string(),
        });
    }
    Err(Error::MalformedFrame(format!("unrecognized OK payload '{rest}'")))
}

fn parse_err(rest: &str) -> Result<Response> {
    match rest {
        "BLOCK" => Ok(Response::ErrBlocked),
        "INVALID" => Ok(Response::ErrInvalidCard),
        "WRONG" => Ok(Response::ErrWrongPin),
        "NEGAMT" => Ok(Response::ErrNonPositiveAmount),
        "MAXAMT" => Ok(Response::ErrOverLimit),
        "LOWBAL" => Ok(Response::ErrInsufficientFunds),
        other => Err(Error::MalformedFrame(format!("unrecognized ERR payload '{other}'"))),
    }
}

fn parse_txn(rest: &str) -> Result<Response> {
    // The timestamp itself contains a colon (`hh:mm`), so split off the
    // leading type digit from the front and the trailing amount from the
    // back, leaving the timestamp as whatever remains in the middle.
    let mut front = rest.splitn(2, ':');
    let type_digit = front
        .next()
        .ok_or_else(|| Error::MalformedFrame("missing TXN type".into()))?;
    let after_type = front.next().unwrap_or_default();

    let mut back = after_type.rsplitn(2, ':');
    let amount = back.next().unwrap_or_default();
    let timestamp = back.next().unwrap_or_default();

    let digit: u8 = type_digit
        .parse()
        .map_err(|_| Error::MalformedFrame("non-numeric TXN type".into()))?;
    if digit == 7 {
        return Ok(Response::MiniStatementOutOfRange);
    }
    let txn_type = TxnType::from_wire_digit(digit)
        .ok_or_else(|| Error::MalformedFrame(format!("unknown TXN type digit {digit}")))?;
    Ok(Response::MiniStatementEntry {
        txn_type,
        timestamp: timestamp.to_string(),
        amount: amount.to_string(),
    })
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    fn resp(line: &str) -> Response {
        let stripped = frame::strip_line_terminator(line);
        let frame = frame::parse(stripped).unwrap();
        Response::parse(&frame).unwrap()
    }

    #[test]
    fn parses_balance() {
        assert_eq!(
            resp("@OK:BAL=5000.00$"),
            Response::Balance {
                amount: "5000.00".into()
            }
        );
    }

    #[test]
    fn parses_mini_statement_sentinel() {
        assert_eq!(resp("@TXN:7:0:0$"), Response::MiniStatementOutOfRange);
    }

    #[test]
    fn parses_mini_statement_entry() {
        assert_eq!(
            resp("@TXN:1:27/07/2026 10:15:250.00$"),
            Response::MiniStatementEntry {
                txn_type: TxnType::Withdraw,
                timestamp: "27/07/2026 10:15".into(),
                amount: "250.00".into(),
            }
        );
    }

    #[test]
    fn round_trips_through_encode() {
        let original = Response::CardActive {
            username: "alice".into(),
        };
        let encoded = original.encode();
        let stripped = frame::strip_line_terminator(&encoded);
        let parsed = Response::parse(&frame::parse(stripped).unwrap()).unwrap();
        assert_eq!(original, parsed);
    }
}
