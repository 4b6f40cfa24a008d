//! The 16x2 character display (`§6`). Line-wrapping/scrolling within the
//! 16x2 physical constraint is a cosmetic concern left to the real
//! firmware; this trait only carries the text the session engine wants
//! shown.

#[async_trait::async_trait]
pub trait Lcd: Send {
    async fn display(&mut self, text: &str);
}

/// Prints to stdout, prefixed so it reads distinctly from log lines.
pub struct ConsoleLcd;

#[async_trait::async_trait]
impl Lcd for ConsoleLcd {
    async fn display(&mut self, text: &str) {
        println!("[LCD] {text}");
    }
}

/// Records every string shown, for assertions in tests.
#[derive(Default)]
pub struct RecordingLcd {
    pub shown: Vec<String>,
}

#[async_trait::async_trait]
impl Lcd for RecordingLcd {
    async fn display(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_lcd_keeps_history() {
        let mut lcd = RecordingLcd::default();
        lcd.display("welcome").await;
        lcd.display("enter pin").await;
        assert_eq!(lcd.shown, vec!["welcome", "enter pin"]);
    }
}
