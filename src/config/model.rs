use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub struct Config {
    pub run: RunConfig,
    pub browser: BrowserConfig,
    pub smtp: SmtpConfig,
}

/// What one run searches for and where it writes
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub keywords: Vec<String>,
    pub city: String,
    pub output_dir: PathBuf,
    /// Keep only events starting within this many days, when set
    pub days_ahead: Option<i64>,
    pub debug_config: DebugConfig,
}

#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    pub skip_sending: bool,
    pub keyword_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub base_url: String,
    pub webdriver_url: String,
    pub headless: bool,
    pub state_path: PathBuf,
    /// Label of the search page dates filter option, e.g. "Cette semaine"
    pub date_filter: Option<String>,
    pub scroll_count: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.facebook.com".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            state_path: PathBuf::from("state.json"),
            date_filter: None,
            scroll_count: 10,
        }
    }
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Also used as the sender address
    pub username: String,
    pub password: String,
    pub recipients: Vec<String>,
}

impl Debug for SmtpConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("recipients", &self.recipients)
            .finish()
    }
}
