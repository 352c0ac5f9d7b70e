//! Events recorded while a message executes.

use serde::{Deserialize, Serialize};

/// Event kind emitted when a custom fee is assessed.
pub const EVENT_ASSESS_CUSTOM_MSG_FEE: &str = "assess_custom_msg_fee";
/// Event kind emitted for every successfully routed message.
pub const EVENT_MESSAGE: &str = "message";

/// A typed event with ordered attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Collects events in emission order.
#[derive(Clone, Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_attributes() {
        let event = Event::new(EVENT_MESSAGE)
            .with_attribute("action", "/qc.bank.v1.MsgSend")
            .with_attribute("module", "bank");

        assert_eq!(event.attribute("module"), Some("bank"));
        assert_eq!(event.attribute("sender"), None);
    }

    #[test]
    fn test_event_manager_preserves_order() {
        let mut manager = EventManager::new();
        manager.emit(Event::new("first"));
        manager.emit(Event::new("second"));

        let kinds: Vec<_> = manager.into_events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["first", "second"]);
    }
}
