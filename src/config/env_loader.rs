use crate::config::model::{BrowserConfig, Config, DebugConfig, RunConfig, SmtpConfig};
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Ten years
const MAX_DAYS_AHEAD: i64 = 3650;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set.")]
    Missing(String),
    #[error("Invalid config '{name}'. Expected {expected}.")]
    Invalid { name: String, expected: &'static str },
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(|name| env::var(name).ok())
}

/// Reads the configuration through `lookup`, which returns a variable's value if set
pub fn load_config_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = BrowserConfig::default();

    let run = RunConfig {
        keywords: load_list_config(&lookup, "FB_KEYWORDS")?,
        city: load_required_config(&lookup, "FB_CITY")?,
        output_dir: PathBuf::from(
            lookup("OUTPUT_DIR").unwrap_or_else(|| "output".to_string()),
        ),
        days_ahead: load_bounded_config(
            &lookup,
            "SCRAPE_DAYS_AHEAD",
            "a number of days between 1 and 3650",
            1..=MAX_DAYS_AHEAD,
        )?,
        debug_config: DebugConfig {
            skip_sending: load_bool_config(&lookup, "DEBUG_SKIP_SENDING", false)?,
            keyword_limit: load_bounded_config(
                &lookup,
                "DEBUG_KEYWORD_LIMIT",
                "a positive integer number",
                1..=usize::MAX,
            )?,
        },
    };

    let browser = BrowserConfig {
        base_url: lookup("FB_BASE_URL").unwrap_or(defaults.base_url),
        webdriver_url: lookup("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
        headless: load_bool_config(&lookup, "BROWSER_HEADLESS", defaults.headless)?,
        state_path: lookup("FB_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_path),
        date_filter: lookup("FB_DATE_FILTER").filter(|option| !option.trim().is_empty()),
        scroll_count: load_optional_config(&lookup, "SCROLL_COUNT", "a positive integer number")?
            .unwrap_or(defaults.scroll_count),
    };

    let smtp = SmtpConfig {
        host: lookup("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
        port: load_optional_config(&lookup, "SMTP_PORT", "a port number")?.unwrap_or(587),
        username: load_required_config(&lookup, "SMTP_USERNAME")?,
        password: load_required_config(&lookup, "SMTP_PASSWORD")?,
        recipients: load_list_config(&lookup, "MAIL_RECIPIENTS")?,
    };

    Ok(Config { run, browser, smtp })
}

fn load_required_config<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))
}

/// Comma separated, blank entries are ignored
fn load_list_config<F>(lookup: &F, name: &str) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let values: Vec<String> = load_required_config(lookup, name)?
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    if values.is_empty() {
        return Err(ConfigError::Missing(name.to_string()));
    }

    Ok(values)
}

fn load_bool_config<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            expected: "either 'true' or 'false'",
        }),
    }
}

fn load_optional_config<F, T>(
    lookup: &F,
    name: &str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                name: name.to_string(),
                expected,
            }),
    }
}

fn load_bounded_config<F, T>(
    lookup: &F,
    name: &str,
    expected: &'static str,
    bounds: RangeInclusive<T>,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd,
{
    match load_optional_config(lookup, name, expected)? {
        Some(value) if !bounds.contains(&value) => Err(ConfigError::Invalid {
            name: name.to_string(),
            expected,
        }),
        value => Ok(value),
    }
}
