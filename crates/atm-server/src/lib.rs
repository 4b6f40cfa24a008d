//! Account Server library: dispatcher, handlers, operator console,
//! configuration, and shared process state. `src/main.rs` is a thin
//! binary wiring these together against a real serial transport and
//! stdin; `tests/` exercises the same pieces over `DuplexTransport`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod operator;
pub mod state;
