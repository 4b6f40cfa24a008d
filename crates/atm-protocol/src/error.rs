//! Error types for the link layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("serial port error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame was malformed: {0}")]
    MalformedFrame(String),

    #[error("link closed by peer")]
    LinkClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
