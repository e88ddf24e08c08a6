use crate::export::city_slug;
use crate::facebook::model::EventRecord;
use chrono::NaiveDate;
use std::path::PathBuf;
use voca_rs::escape::escape_html;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What one run reports by email
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub city: String,
    /// First and last day of the searched window, when one was configured
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub sent_on: NaiveDate,
    pub events: Vec<EventRecord>,
    pub attachment: PathBuf,
}

impl Report {
    pub fn subject(&self) -> String {
        let city = voca_rs::case::capitalize(&self.city, true);

        match self.window {
            Some((start, end)) => format!(
                "📅 Facebook Events Report {}. From {} to {}",
                city,
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            None => format!(
                "📅 Facebook Events Report {}. {}",
                city,
                self.sent_on.format(DATE_FORMAT)
            ),
        }
    }

    pub fn html_body(&self) -> String {
        let mut html = String::from("<h1>Facebook Events</h1>");

        if self.events.is_empty() {
            html.push_str("<p>No events found.</p>");
            return html;
        }

        html.push_str("<ul>");

        for event in self.events.iter() {
            html.push_str(&format!(
                "<li><b>{}</b> - {} - {}<br><a href='{}'>🔗 Event Link</a></li>",
                escape_html(&event.title),
                escape_html(&event.date),
                escape_html(&event.location),
                escape_html(&event.link)
            ));
        }

        html.push_str("</ul>");
        html
    }

    /// Name the recipients see, without the run timestamp
    pub fn attachment_name(&self) -> String {
        format!("events_{}.json", city_slug(&self.city))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(events: Vec<EventRecord>) -> Report {
        Report {
            city: "paris".to_string(),
            window: None,
            sent_on: NaiveDate::from_ymd_opt(2025, 9, 17).unwrap(),
            events,
            attachment: PathBuf::from("output/events_paris_20250917_100000.json"),
        }
    }

    fn event(title: &str) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            date: "Samedi - 20h00 à 01h30".to_string(),
            location: "Paris, France".to_string(),
            description: "not found".to_string(),
            image: "not found".to_string(),
            link: "https://www.facebook.com/events/1/".to_string(),
            cost: "not found".to_string(),
            event_type: "not found".to_string(),
        }
    }

    #[test_log::test]
    fn should_put_window_in_subject() {
        let report = Report {
            window: Some((
                NaiveDate::from_ymd_opt(2025, 9, 17).unwrap(),
                NaiveDate::from_ymd_opt(2025, 9, 24).unwrap(),
            )),
            ..report(vec![])
        };

        assert_eq!(
            report.subject(),
            "📅 Facebook Events Report Paris. From 2025-09-17 to 2025-09-24"
        );
    }

    #[test_log::test]
    fn without_window_should_put_date_in_subject() {
        assert_eq!(
            report(vec![]).subject(),
            "📅 Facebook Events Report Paris. 2025-09-17"
        );
    }

    #[test_log::test]
    fn should_list_every_event_escaped() {
        let body = report(vec![event("Salsa & Bachata"), event("<Tango>")]).html_body();

        assert_eq!(body.matches("<li>").count(), 2);
        assert!(body.contains("<b>Salsa &amp; Bachata</b>"));
        assert!(body.contains("<b>&lt;Tango&gt;</b>"));
        assert!(body.contains("href='https://www.facebook.com/events/1/'"));
    }

    #[test_log::test]
    fn when_no_events_should_say_so() {
        assert!(report(vec![]).html_body().contains("No events found."));
    }

    #[test_log::test]
    fn should_name_attachment_after_city() {
        assert_eq!(report(vec![]).attachment_name(), "events_paris.json");
    }
}
