use serde::{Deserialize, Serialize};

/// Value stored in a field that could not be extracted
pub const PLACEHOLDER: &str = "not found";

/// One scraped event, as exported to JSON and mailed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub cost: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl EventRecord {
    /// Records without a title or a link are never exported
    pub fn is_exportable(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }
}

/// Raw strings pulled from an event page, empty when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEventCard {
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub cost: String,
    pub event_type: String,
}
