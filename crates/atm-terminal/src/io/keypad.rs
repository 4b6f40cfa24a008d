//! The 4x4 keypad (`§6`).
//!
//! `§9`'s open question: the firmware's label matrix duplicated `'7'`
//! where `'8'` belonged in the third row. Fixed here so row 2 reads
//! `7, 8, 9, C` as the 1-9-across-three-rows layout requires.

#[rustfmt::skip]
pub const KEYPAD_LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Reserved keypad meanings (`§6`).
pub const BACKSPACE: char = '*';
pub const CONFIRM: char = '#';
pub const NAV_UP: char = 'A';
pub const NAV_DOWN: char = 'B';
pub const CANCEL: char = 'C';

/// Abstracts the physical 4x4 matrix; out of scope per the design is the
/// GPIO row/column scan itself (`§1`), only the resulting keystream.
#[async_trait::async_trait]
pub trait Keypad: Send {
    /// Block until the next keypress, returning its label.
    async fn read_key(&mut self) -> Option<char>;
}

/// A scripted keypad for tests and the demo binary: a fixed queue of
/// keystrokes consumed in order.
pub struct ScriptedKeypad {
    keys: std::collections::VecDeque<char>,
}

impl ScriptedKeypad {
    pub fn new(script: impl IntoIterator<Item = char>) -> Self {
        Self {
            keys: script.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl Keypad for ScriptedKeypad {
    async fn read_key(&mut self) -> Option<char> {
        self.keys.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_no_duplicate_digit_labels() {
        let digits: Vec<char> = KEYPAD_LAYOUT
            .iter()
            .flatten()
            .copied()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let mut sorted = digits.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(digits.len(), sorted.len(), "digit labels must be unique");
        assert_eq!(sorted, vec!['0', '1', '2', '3', '4', '5', '6', '7', '8', '9']);
    }

    #[tokio::test]
    async fn scripted_keypad_yields_in_order() {
        let mut pad = ScriptedKeypad::new(['1', '2', '3', '#']);
        assert_eq!(pad.read_key().await, Some('1'));
        assert_eq!(pad.read_key().await, Some('2'));
        assert_eq!(pad.read_key().await, Some('3'));
        assert_eq!(pad.read_key().await, Some('#'));
        assert_eq!(pad.read_key().await, None);
    }
}
