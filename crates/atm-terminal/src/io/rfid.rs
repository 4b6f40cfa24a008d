//! The RFID card reader (`§6`). A scan yields the 8-character card id
//! the rest of the system addresses accounts by, or `None` while no
//! card sits on the reader.

#[async_trait::async_trait]
pub trait RfidReader: Send {
    /// Poll the reader once. Returns the card id on the rising edge of a
    /// card being presented; `None` otherwise.
    async fn scan(&mut self) -> Option<String>;
}

/// A scripted reader for tests and the demo binary: replays a fixed
/// sequence of scan results, one per call.
pub struct ScriptedRfid {
    events: std::collections::VecDeque<Option<String>>,
}

impl ScriptedRfid {
    pub fn new(events: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// A reader that only ever presents one card, once.
    pub fn single_card(rfid: impl Into<String>) -> Self {
        Self::new([Some(rfid.into())])
    }
}

#[async_trait::async_trait]
impl RfidReader for ScriptedRfid {
    async fn scan(&mut self) -> Option<String> {
        self.events.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_card_presents_once_then_nothing() {
        let mut rfid = ScriptedRfid::single_card("CARD0001");
        assert_eq!(rfid.scan().await, Some("CARD0001".to_string()));
        assert_eq!(rfid.scan().await, None);
    }
}
