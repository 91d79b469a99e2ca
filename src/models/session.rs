//! Per-session state kept in the session store

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

/// One-shot message shown on the next page that reads the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FlashMessage {
    pub level: MessageLevel,
    pub text: String,
}

/// Everything stored for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub num_visits: i64,
    #[serde(default)]
    pub messages: Vec<FlashMessage>,
}

impl SessionData {
    /// Count a visit to the home page, returning the count before this visit
    pub fn record_visit(&mut self) -> i64 {
        let previous = self.num_visits;
        self.num_visits = previous + 1;
        previous
    }

    pub fn push_message(&mut self, level: MessageLevel, text: impl Into<String>) {
        self.messages.push(FlashMessage {
            level,
            text: text.into(),
        });
    }

    /// Drain pending messages
    pub fn take_messages(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_visit_shows_n_minus_one() {
        let mut data = SessionData::default();
        let shown: Vec<i64> = (0..4).map(|_| data.record_visit()).collect();
        assert_eq!(shown, vec![0, 1, 2, 3]);
        assert_eq!(data.num_visits, 4);
    }

    #[test]
    fn test_messages_are_drained_once() {
        let mut data = SessionData::default();
        data.push_message(MessageLevel::Success, "Ursula Le Guin has been deleted");
        assert_eq!(data.take_messages().len(), 1);
        assert!(data.take_messages().is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let data: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, SessionData::default());
    }
}
