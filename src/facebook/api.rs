use super::extractor::{collect_event_links, extract_event_card};
use super::model::RawEventCard;
use super::EventSource;
use crate::config::model::BrowserConfig;
use crate::dates::FrenchCalendar;
use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::key::Key;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

const EVENT_LINK_SELECTOR: &str = "a[href*='/events/']";
const LOCATION_INPUT_SELECTORS: [&str; 6] = [
    "input[placeholder*='Location']",
    "input[placeholder*='Ubicación']",
    "input[placeholder*='Lieu']",
    "input[aria-label*='Location']",
    "input[aria-label*='Ubicación']",
    "input[aria-label*='Lieu']",
];
const DATES_FILTER_XPATH: &str =
    "//*[@role='button'][contains(., 'Dates') or contains(., 'Date') or contains(., 'Fechas')]";
const SEE_MORE_XPATH: &str =
    "//div[@data-testid='event-permalink-details']//span[contains(text(), 'En voir plus')]";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const RESULTS_TIMEOUT: Duration = Duration::from_secs(15);
const INPUT_TIMEOUT: Duration = Duration::from_secs(5);
const MENU_TIMEOUT: Duration = Duration::from_secs(3);
const SETTLE_DELAY: Duration = Duration::from_secs(1);
const SCROLL_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("could not start a browser session: {0}")]
    Session(#[from] NewSessionError),
    #[error("browser command failed: {0}")]
    Command(#[from] CmdError),
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("could not read login state '{path}': {source}")]
    LoginStateRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid login state '{path}': {source}")]
    LoginStateFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Saved login state, in the `storage_state` format browser automation tools write
#[derive(Debug, Deserialize)]
pub struct LoginState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    fn to_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), self.value.clone()))
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .build()
    }
}

/// Scrapes Facebook event search results through a WebDriver controlled browser
pub struct FacebookAPI {
    config: BrowserConfig,
    calendar: FrenchCalendar,
}

impl FacebookAPI {
    pub fn new(config: BrowserConfig, calendar: FrenchCalendar) -> Self {
        Self { config, calendar }
    }

    pub fn search_url(&self, keyword: &str) -> Result<Url, NavigationError> {
        let url = format!(
            "{}/events/search/",
            self.config.base_url.trim_end_matches('/')
        );

        Url::parse_with_params(&url, [("q", keyword)])
            .map_err(|source| NavigationError::InvalidUrl { url, source })
    }

    async fn open_session(&self) -> Result<Client, NavigationError> {
        let mut args = vec![
            "--window-size=1280,800".to_string(),
            "--lang=fr-FR".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
        ];

        if self.config.headless {
            args.push("--headless=new".to_string());
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        debug!("Connecting to WebDriver at {}", self.config.webdriver_url);

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.config.webdriver_url)
            .await?;

        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(PAGE_LOAD_TIMEOUT), None))
            .await?;

        Ok(client)
    }

    #[instrument(skip(self, client))]
    async fn restore_login_state(&self, client: &Client) -> Result<(), NavigationError> {
        let path = &self.config.state_path;

        if !path.exists() {
            warn!(
                "No login state at '{}', continuing logged out",
                path.display()
            );
            return Ok(());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| NavigationError::LoginStateRead {
                path: path.clone(),
                source,
            })?;
        let state: LoginState =
            serde_json::from_str(&content).map_err(|source| NavigationError::LoginStateFormat {
                path: path.clone(),
                source,
            })?;

        // cookies can only be set for the domain currently loaded
        client.goto(&self.config.base_url).await?;

        for cookie in state.cookies.iter() {
            if let Err(err) = client.add_cookie(cookie.to_cookie()).await {
                warn!("Failed to restore cookie '{}': {}", cookie.name, err);
            }
        }

        info!("Restored {} cookies", state.cookies.len());

        Ok(())
    }

    async fn scrape_with(
        &self,
        client: &Client,
        keywords: &[String],
        city: &str,
    ) -> Result<Vec<RawEventCard>, NavigationError> {
        self.restore_login_state(client).await?;

        let mut seen = HashSet::new();
        let mut cards = Vec::new();

        for keyword in keywords {
            let mut keyword_cards = self.scrape_keyword(client, keyword, city, &mut seen).await?;

            info!("Found {} events for '{}'", keyword_cards.len(), keyword);

            cards.append(&mut keyword_cards);
        }

        Ok(cards)
    }

    #[instrument(skip(self, client, seen))]
    async fn scrape_keyword(
        &self,
        client: &Client,
        keyword: &str,
        city: &str,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<RawEventCard>, NavigationError> {
        let url = self.search_url(keyword)?;

        info!("Searching: {}", url);

        client.goto(url.as_str()).await?;
        client
            .wait()
            .at_most(RESULTS_TIMEOUT)
            .for_element(Locator::Css(EVENT_LINK_SELECTOR))
            .await?;

        self.select_location(client, city).await;

        if let Some(option) = &self.config.date_filter {
            self.select_date_filter(client, option).await;
        }

        self.scroll_results(client).await?;

        let links = self.event_links(client, seen).await?;
        let mut cards = Vec::with_capacity(links.len());

        for link in links {
            match self.scrape_event_page(client, &link, keyword, city).await {
                Ok(card) => cards.push(card),
                Err(err) => warn!("Skipping event page {}: {}", link, err),
            }
        }

        Ok(cards)
    }

    async fn select_location(&self, client: &Client, city: &str) {
        for selector in LOCATION_INPUT_SELECTORS {
            let input = client
                .wait()
                .at_most(INPUT_TIMEOUT)
                .for_element(Locator::Css(selector))
                .await;

            let Ok(input) = input else {
                continue;
            };

            let typed = async {
                input.send_keys(city).await?;
                tokio::time::sleep(SETTLE_DELAY).await;
                input.send_keys(&char::from(Key::Down).to_string()).await?;
                tokio::time::sleep(SETTLE_DELAY).await;
                input.send_keys(&char::from(Key::Enter).to_string()).await?;
                tokio::time::sleep(SETTLE_DELAY).await;
                Ok::<(), CmdError>(())
            };

            match typed.await {
                Ok(()) => info!("Selected location: {}", city),
                Err(err) => warn!("Failed to select location '{}': {}", city, err),
            }

            return;
        }

        warn!("Location input not found");
    }

    /// Best effort, the filter menu is not always rendered
    async fn select_date_filter(&self, client: &Client, option: &str) {
        let Ok(dates) = client.find(Locator::XPath(DATES_FILTER_XPATH)).await else {
            warn!("Could not locate the dates filter");
            return;
        };

        if let Err(err) = dates.click().await {
            warn!("Failed to open the dates filter: {}", err);
            return;
        }

        let option_xpaths = [
            format!("//*[@role='menu']//*[contains(text(), '{}')]", option),
            format!("//span[contains(text(), '{}')]", option),
        ];

        for xpath in option_xpaths.iter() {
            let found = client
                .wait()
                .at_most(MENU_TIMEOUT)
                .for_element(Locator::XPath(xpath))
                .await;

            if let Ok(element) = found {
                match element.click().await {
                    Ok(()) => {
                        info!("Selected date option: {}", option);
                        return;
                    }
                    Err(err) => debug!("Could not click date option: {}", err),
                }
            }
        }

        warn!("Option '{}' not found after opening the dates filter", option);
    }

    async fn scroll_results(&self, client: &Client) -> Result<(), CmdError> {
        let mut previous_height = 0;

        for _ in 0..self.config.scroll_count {
            client.execute("window.scrollBy(0, 3000);", vec![]).await?;
            tokio::time::sleep(SCROLL_DELAY).await;

            let height = client
                .execute("return document.body.scrollHeight;", vec![])
                .await?
                .as_u64()
                .unwrap_or_default();

            if height == previous_height {
                break;
            }

            previous_height = height;
        }

        Ok(())
    }

    async fn event_links(
        &self,
        client: &Client,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<String>, CmdError> {
        let mut hrefs = Vec::new();

        for anchor in client.find_all(Locator::Css(EVENT_LINK_SELECTOR)).await? {
            if let Some(href) = anchor.attr("href").await? {
                hrefs.push(href);
            }
        }

        let links = collect_event_links(hrefs, &self.config.base_url, seen);

        debug!("Collected {} new event links", links.len());

        Ok(links)
    }

    #[instrument(skip(self, client, keyword, city))]
    async fn scrape_event_page(
        &self,
        client: &Client,
        link: &str,
        keyword: &str,
        city: &str,
    ) -> Result<RawEventCard, CmdError> {
        info!("Visiting event page");

        client.goto(link).await?;

        if let Ok(see_more) = client.find(Locator::XPath(SEE_MORE_XPATH)).await {
            if see_more.click().await.is_ok() {
                tokio::time::sleep(SETTLE_DELAY).await;
            }
        }

        let html = client.source().await?;

        Ok(extract_event_card(
            &html,
            link,
            keyword,
            city,
            &self.calendar,
        ))
    }
}

#[async_trait]
impl EventSource for FacebookAPI {
    #[instrument(skip(self))]
    async fn fetch_event_cards(
        &self,
        keywords: &[String],
        city: &str,
    ) -> Result<Vec<RawEventCard>, NavigationError> {
        let client = self.open_session().await?;

        let result = self.scrape_with(&client, keywords, city).await;

        if let Err(err) = client.close().await {
            warn!("Failed to close the browser session: {}", err);
        }

        result
    }
}
