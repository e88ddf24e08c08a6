use super::model::{EventRecord, RawEventCard, PLACEHOLDER};
use crate::dates::FrenchCalendar;
use chrono::NaiveDateTime;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

impl RawEventCard {
    /// Builds the exported record. Title and link are left empty when missing so the
    /// record can be filtered out, every other field falls back to the placeholder.
    pub fn to_model(&self, calendar: &FrenchCalendar, reference: NaiveDateTime) -> EventRecord {
        let date = calendar.normalize(&collapse_whitespace(&self.date), reference);

        EventRecord {
            title: collapse_whitespace(&self.title),
            date: or_placeholder(date),
            location: or_placeholder(collapse_whitespace(&self.location)),
            description: or_placeholder(clean_paragraphs(&self.description)),
            image: or_placeholder(self.image.trim().to_string()),
            link: self.link.trim().to_string(),
            cost: or_placeholder(collapse_whitespace(&self.cost)),
            event_type: or_placeholder(collapse_whitespace(&self.event_type)),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}

/// Keeps line breaks, drops blank lines
fn clean_paragraphs(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .join("\n")
}

fn or_placeholder(value: String) -> String {
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value
    }
}
