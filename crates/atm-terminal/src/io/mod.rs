//! Peripheral abstractions for the physical ATM hardware (`§6`).

pub mod keypad;
pub mod lcd;
pub mod rfid;

pub use keypad::Keypad;
pub use lcd::Lcd;
pub use rfid::RfidReader;
