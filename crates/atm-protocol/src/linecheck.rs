//! The `X`/`Y` liveness handshake (`§4.1`).
//!
//! Either side may issue a line check: transmit `@X:LINEOK$` (or
//! `@Y:LINEOK$`) and block-read until the peer echoes the matching
//! `#X:LINEOK$` (`#Y:LINEOK$`). On the receiving side this is a reserved
//! token recognized ahead of the normal dispatcher and echoed immediately —
//! on the TC it is the one mutation the serial ISR is allowed to make
//! directly (`§5`).

use crate::error::Result;
use crate::frame::{Direction, Frame};
use crate::request::Request;
use crate::response::Response;
use crate::transport::FrameTransport;

/// Which initiator issued the check: `X` is reserved for the TC-initiated
/// check, `Y` for the AS-initiated one, so two checks in flight never
/// cross-echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initiator {
    X,
    Y,
}

/// Returns `Some` if `frame` is a `LINEOK` token the dispatch loop should
/// short-circuit (echo and continue) rather than hand to the normal opcode
/// handler.
pub fn recognize_lineok(frame: &Frame) -> Option<Initiator> {
    match frame.direction {
        Direction::Request => match Request::parse(frame).ok()? {
            Request::LineCheckX => Some(Initiator::X),
            Request::LineCheckY => Some(Initiator::Y),
            _ => None,
        },
        Direction::Response => match Response::parse(frame).ok()? {
            Response::LineCheckX => Some(Initiator::X),
            Response::LineCheckY => Some(Initiator::Y),
            _ => None,
        },
    }
}

/// Issue a line check as the TC (`#X:LINEOK$` / `#Y:LINEOK$`) and block
/// until the matching echo arrives, skipping over anything else that isn't
/// the echo (there is nothing else expected on the wire mid-check since the
/// link is strictly alternating).
pub async fn perform_check(
    transport: &mut dyn FrameTransport,
    initiator: Initiator,
) -> Result<()> {
    let request = match initiator {
        Initiator::X => Request::LineCheckX,
        Initiator::Y => Request::LineCheckY,
    };
    transport.transmit_line(&request.encode()).await?;

    loop {
        if let Some(frame) = transport.receive().await? {
            if recognize_lineok(&frame) == Some(initiator) {
                return Ok(());
            }
        }
    }
}

/// Echo a recognized `LINEOK` token straight back to the sender, bypassing
/// the normal dispatcher. Called from whichever side received the check.
pub async fn echo(transport: &mut dyn FrameTransport, initiator: Initiator) -> Result<()> {
    let response = match initiator {
        Initiator::X => Response::LineCheckX,
        Initiator::Y => Response::LineCheckY,
    };
    transport.transmit_line(&response.encode()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::DuplexTransport;

    #[tokio::test]
    async fn line_check_round_trip() {
        let (a, b) = tokio::io::duplex(256);
        let mut initiator_side = DuplexTransport::new(a);
        let mut peer_side = DuplexTransport::new(b);

        let check = tokio::spawn(async move {
            perform_check(&mut initiator_side, Initiator::X).await.unwrap();
        });

        let frame = peer_side.receive().await.unwrap().unwrap();
        let who = recognize_lineok(&frame).unwrap();
        assert_eq!(who, Initiator::X);
        echo(&mut peer_side, who).await.unwrap();

        check.await.unwrap();
    }
}
