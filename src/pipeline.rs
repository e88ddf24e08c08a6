use crate::config::model::RunConfig;
use crate::dates::FrenchCalendar;
use crate::export::{output_path, write_events, ExportError};
use crate::facebook::api::NavigationError;
use crate::facebook::model::{EventRecord, RawEventCard};
use crate::facebook::EventSource;
use crate::mail::api::{MailError, ReportSender};
use crate::mail::model::Report;
use chrono::{Duration, NaiveDateTime};
use itertools::Itertools;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Steps of a run, in order. A run never goes back to an earlier stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stage {
    Scraping,
    Normalizing,
    Exporting,
    Mailing,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("export failed: {0}")]
    Serialization(#[from] ExportError),
    #[error("mail delivery failed: {0}")]
    MailDelivery(#[from] MailError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Navigation(_) => Stage::Scraping,
            PipelineError::Serialization(_) => Stage::Exporting,
            PipelineError::MailDelivery(_) => Stage::Mailing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub exported: usize,
    pub discarded: usize,
    pub mailed: bool,
}

/**
Runs the whole scrape: fetch the cards, build the records, write the JSON file and mail it.

Any error ends the run. Nothing is written when scraping fails, and the JSON file is
kept on disk when mailing fails.
*/
#[instrument(skip_all, fields(city = %config.city))]
pub async fn run<S, M>(
    config: &RunConfig,
    calendar: &FrenchCalendar,
    source: &S,
    mailer: &M,
    now: NaiveDateTime,
) -> Result<RunSummary, PipelineError>
where
    S: EventSource + Sync,
    M: ReportSender + Sync,
{
    let keywords = match config.debug_config.keyword_limit {
        Some(limit) => &config.keywords[..limit.min(config.keywords.len())],
        None => &config.keywords[..],
    };
    let window = config.days_ahead.and_then(|days| {
        let end = Duration::try_days(days).and_then(|ahead| now.checked_add_signed(ahead));

        if end.is_none() {
            warn!("Date window of {} days is out of range, ignoring it", days);
        }

        end.map(|end| (now, end))
    });

    info!(stage = %Stage::Scraping, "Searching {} keywords: {}", keywords.len(), keywords.join(", "));
    let cards = source
        .fetch_event_cards(keywords, &config.city)
        .await
        .inspect_err(|err| error!("Scraping failed: {}", err))?;

    info!(stage = %Stage::Normalizing, "Building records from {} cards", cards.len());
    let records = build_records(&cards, calendar, now, window);
    let discarded = cards.len() - records.len();

    let output = output_path(&config.output_dir, &config.city, now);
    info!(stage = %Stage::Exporting, "Exporting {} events", records.len());
    write_events(&records, &output).await?;

    let exported = records.len();

    if config.debug_config.skip_sending {
        warn!("Skipping mail, the report stays at {}", output.display());

        return Ok(RunSummary {
            output,
            exported,
            discarded,
            mailed: false,
        });
    }

    info!(stage = %Stage::Mailing, "Mailing report");
    let report = Report {
        city: config.city.clone(),
        window: window.map(|(start, end)| (start.date(), end.date())),
        sent_on: now.date(),
        events: records,
        attachment: output.clone(),
    };

    mailer.send_report(&report).await.inspect_err(|err| {
        error!(
            "Mailing failed, the report stays at {}: {}",
            output.display(),
            err
        )
    })?;

    info!("Run done");

    Ok(RunSummary {
        output,
        exported,
        discarded,
        mailed: true,
    })
}

/// Builds the exportable records in encounter order, applying the date window when given
pub fn build_records(
    cards: &[RawEventCard],
    calendar: &FrenchCalendar,
    now: NaiveDateTime,
    window: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Vec<EventRecord> {
    cards
        .iter()
        .filter(|card| match window {
            None => true,
            Some((start, end)) => {
                let in_window = calendar
                    .parse(&card.date, now)
                    .is_some_and(|schedule| start <= schedule.start && schedule.start <= end);

                if !in_window {
                    info!("Outside of the date window: {} ({})", card.link, card.date);
                }

                in_window
            }
        })
        .map(|card| card.to_model(calendar, now))
        .filter(|record| {
            if !record.is_exportable() {
                warn!(
                    "Discarding event without title or link: '{}' {}",
                    record.title, record.link
                );
            }

            record.is_exportable()
        })
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 17)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn card(title: &str, link: &str, date: &str) -> RawEventCard {
        RawEventCard {
            title: title.to_string(),
            link: link.to_string(),
            date: date.to_string(),
            ..Default::default()
        }
    }

    #[test_log::test]
    fn should_drop_records_without_title_or_link() {
        let cards = vec![
            card("Bal Folk", "https://www.facebook.com/events/1/", ""),
            card("", "https://www.facebook.com/events/2/", ""),
            card("Tango", "", ""),
            card("Salsa", "https://www.facebook.com/events/3/", ""),
        ];

        let records = build_records(&cards, &FrenchCalendar::new(), now(), None);

        assert_eq!(
            records.iter().map(|r| r.title.as_str()).collect_vec(),
            vec!["Bal Folk", "Salsa"]
        );
    }

    #[test_log::test]
    fn should_keep_only_events_inside_window() {
        let cards = vec![
            card("Demain", "https://www.facebook.com/events/1/", "Demain de 19:00 à 23:00"),
            card(
                "Plus tard",
                "https://www.facebook.com/events/2/",
                "Samedi 11 avril 2026 de 20:00 à 01:30",
            ),
            card("Sans date", "https://www.facebook.com/events/3/", "TBD"),
        ];
        let window = Some((now(), now() + Duration::days(7)));

        let records = build_records(&cards, &FrenchCalendar::new(), now(), window);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Demain");
        assert_eq!(records[0].date, "Jeudi - 19h00 à 23h00");
    }

    #[test_log::test]
    fn should_name_failed_stage() {
        let error = PipelineError::Serialization(ExportError::Io {
            path: PathBuf::from("output"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });

        assert_eq!(error.stage(), Stage::Exporting);
        assert_eq!(error.stage().to_string(), "Exporting");
    }
}
