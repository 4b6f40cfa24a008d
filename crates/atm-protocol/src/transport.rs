//! Line-oriented transport abstraction over the physical serial link.
//!
//! Grounded in `rvoip-sip-transport`'s split between a `Transport` trait and
//! a concrete `UdpTransport`: the dispatcher and session engine only ever
//! talk to [`FrameTransport`], so tests can swap in an in-memory duplex pipe
//! instead of a real serial port.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};
use crate::frame::{self, Frame};

/// One end of a CR-LF-delimited line transport.
#[async_trait::async_trait]
pub trait FrameTransport: Send {
    /// Block until one full line has arrived, strip its terminator, and
    /// parse it into a [`Frame`]. Returns `Ok(None)` for a line that parses
    /// as malformed (discard-and-continue, per `§4.1`), `Err` only for a
    /// transport-level failure (closed link, I/O error).
    async fn receive(&mut self) -> Result<Option<Frame>>;

    /// Write a pre-rendered line (including its CR LF terminator) to the
    /// wire.
    async fn transmit_line(&mut self, line: &str) -> Result<()>;
}

/// A serial-port-backed transport for production use.
pub struct SerialTransport {
    reader: BufReader<tokio_serial::SerialStream>,
}

impl SerialTransport {
    /// Open `path` at the fixed 9600 8N1 raw-mode configuration the design
    /// assumes (`§6`).
    pub fn open(path: &str) -> Result<Self> {
        let port = tokio_serial::new(path, 9600)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        Ok(Self {
            reader: BufReader::new(port),
        })
    }
}

#[async_trait::async_trait]
impl FrameTransport for SerialTransport {
    async fn receive(&mut self) -> Result<Option<Frame>> {
        receive_line(&mut self.reader).await
    }

    async fn transmit_line(&mut self, line: &str) -> Result<()> {
        self.reader.get_mut().write_all(line.as_bytes()).await?;
        Ok(())
    }
}

/// Read and parse exactly one line, applying the CR/LF-stripping and
/// malformed-frame-discard rules.
pub async fn receive_line<R>(reader: &mut BufReader<R>) -> Result<Option<Frame>>
where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    let mut raw = String::new();
    let n = reader.read_line(&mut raw).await?;
    if n == 0 {
        return Err(Error::LinkClosed);
    }
    let stripped = frame::strip_line_terminator(&raw);
    match frame::parse(stripped) {
        Ok(frame) => Ok(Some(frame)),
        Err(e) => {
            tracing::warn!(raw = %stripped, error = %e, "discarding malformed frame");
            Ok(None)
        }
    }
}

/// An in-memory transport over a [`tokio::io::DuplexStream`] half, used by
/// both crates' test suites to exercise the protocol without a real serial
/// port.
pub struct DuplexTransport {
    reader: BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
    writer: tokio::io::WriteHalf<tokio::io::DuplexStream>,
}

impl DuplexTransport {
    pub fn new(stream: tokio::io::DuplexStream) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }
}

#[async_trait::async_trait]
impl FrameTransport for DuplexTransport {
    async fn receive(&mut self) -> Result<Option<Frame>> {
        receive_line(&mut self.reader).await
    }

    async fn transmit_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }
}
