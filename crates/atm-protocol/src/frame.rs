//! Raw frame delimiting.
//!
//! A frame is one CR-LF-terminated ASCII line beginning with `#` (request,
//! TC -> AS) or `@` (response, AS -> TC) and ending with `$` before the line
//! terminator. Receivers discard anything that doesn't fit that shape rather
//! than erroring the link.

use crate::error::{Error, Result};

/// Direction a frame flows, carried by its leading sentinel byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `#...$` — terminal controller to account server.
    Request,
    /// `@...$` — account server to terminal controller.
    Response,
}

/// A frame with its sentinel stripped, ready for opcode parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub direction: Direction,
    /// Interior bytes, i.e. everything between the sentinel and the `$`.
    pub body: String,
}

/// Strip exactly one trailing CR (if present) then one LF from a raw line
/// read off the wire. Fixes the original firmware's assumption that every
/// line is CR-LF terminated: an LF-only line no longer loses its last
/// payload byte.
pub fn strip_line_terminator(mut raw: &str) -> &str {
    if let Some(stripped) = raw.strip_suffix('\n') {
        raw = stripped;
    }
    if let Some(stripped) = raw.strip_suffix('\r') {
        raw = stripped;
    }
    raw
}

/// Parse one already-terminator-stripped line into a [`Frame`].
///
/// Returns `Err` on anything that isn't well-formed; callers on the
/// receiving side are expected to log and silently continue rather than
/// tear down the link (see `§4.1` / `§7` of the design: malformed frames are
/// discarded, not fatal).
pub fn parse(line: &str) -> Result<Frame> {
    if !line.is_ascii() {
        return Err(Error::MalformedFrame("non-ASCII bytes".into()));
    }
    let mut chars = line.chars();
    let direction = match chars.next() {
        Some('#') => Direction::Request,
        Some('@') => Direction::Response,
        _ => return Err(Error::MalformedFrame("missing sentinel".into())),
    };
    let interior = &line[1..];
    let body = interior
        .strip_suffix('$')
        .ok_or_else(|| Error::MalformedFrame("missing terminator '$'".into()))?;
    if body.is_empty() {
        return Err(Error::MalformedFrame("empty frame body".into()));
    }
    Ok(Frame {
        direction,
        body: body.to_string(),
    })
}

/// Render a frame body back onto the wire, including the CR LF terminator.
pub fn render(direction: Direction, body: &str) -> String {
    let sentinel = match direction {
        Direction::Request => '#',
        Direction::Response => '@',
    };
    format!("{sentinel}{body}$\r\n")
}
