use crate::facebook::model::EventRecord;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

const OUTPUT_FILE_DATETIME_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize events: {0}")]
    Json(#[from] serde_json::Error),
}

/// `<dir>/events_<city>_<timestamp>.json`
pub fn output_path(output_dir: &Path, city: &str, now: NaiveDateTime) -> PathBuf {
    output_dir.join(format!(
        "events_{}_{}.json",
        city_slug(city),
        now.format(OUTPUT_FILE_DATETIME_FORMAT)
    ))
}

pub fn city_slug(city: &str) -> String {
    voca_rs::case::kebab_case(city.trim())
}

/// Writes the records as a JSON array, replacing any previous file at `path`
#[instrument(skip(records), fields(records = records.len()))]
pub async fn write_events(records: &[EventRecord], path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, to_pretty_json(records)?)
        .await
        .map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Events saved to JSON file: {}", path.display());

    Ok(())
}

fn to_pretty_json(records: &[EventRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));

    records.serialize(&mut serializer)?;

    Ok(buffer)
}
