#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use fbevents::config::model::{DebugConfig, RunConfig};
use fbevents::facebook::api::NavigationError;
use fbevents::facebook::model::RawEventCard;
use fbevents::facebook::EventSource;
use fbevents::mail::api::{MailError, ReportSender};
use fbevents::mail::model::Report;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 17)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

pub fn unique_output_dir() -> PathBuf {
    std::env::temp_dir().join(format!("fbevents-test-{}", Uuid::new_v4()))
}

pub fn run_config(output_dir: PathBuf) -> RunConfig {
    RunConfig {
        keywords: vec!["salsa".to_string(), "bachata".to_string()],
        city: "paris".to_string(),
        output_dir,
        days_ahead: None,
        debug_config: DebugConfig::default(),
    }
}

pub enum FakeSource {
    Cards(Vec<RawEventCard>),
    Unreachable,
}

#[async_trait]
impl EventSource for FakeSource {
    async fn fetch_event_cards(
        &self,
        _keywords: &[String],
        _city: &str,
    ) -> Result<Vec<RawEventCard>, NavigationError> {
        match self {
            FakeSource::Cards(cards) => Ok(cards.clone()),
            FakeSource::Unreachable => Err(NavigationError::LoginStateRead {
                path: PathBuf::from("state.json"),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
        }
    }
}

/// Remembers every report it was asked to send
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<Report>>,
    pub failing: bool,
}

#[async_trait]
impl ReportSender for FakeMailer {
    async fn send_report(&self, report: &Report) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(report.clone());

        if self.failing {
            return Err(MailError::Attachment {
                path: report.attachment.clone(),
                source: std::io::Error::from(std::io::ErrorKind::Other),
            });
        }

        Ok(())
    }
}
