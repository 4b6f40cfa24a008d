//! Wire protocol between the terminal controller (TC) and account server
//! (AS): frame delimiting, the request/response opcode matrix, the
//! liveness handshake, and the transport each side reads/writes frames
//! through.

pub mod error;
pub mod frame;
pub mod linecheck;
pub mod request;
pub mod response;
pub mod transport;

pub use error::{Error, Result};
pub use frame::{Direction, Frame};
pub use request::{AccountAction, Request, Rfid};
pub use response::{Response, TxnType};
pub use transport::{DuplexTransport, FrameTransport, SerialTransport};
