use super::model::RawEventCard;
use crate::dates::FrenchCalendar;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

const BLOCK_SELECTOR: &str = "div[role='button'][tabindex='0']";
const DESCRIPTION_SELECTORS: [&str; 2] = [
    "div[data-testid='event-permalink-details']",
    "div[role='article']",
];
const COVER_PHOTO_SELECTOR: &str = "img[data-imgperflogname='profileCoverPhoto']";

/// Longer texts are descriptions, not labels
const MAX_LABEL_LENGTH: usize = 80;

lazy_static! {
    static ref BLOCKS: Selector = Selector::parse(BLOCK_SELECTOR).unwrap();
    static ref SPANS: Selector = Selector::parse("span").unwrap();
    static ref AUTO_SPANS: Selector = Selector::parse("span[dir='auto']").unwrap();
    static ref HEADINGS: Selector = Selector::parse("h1").unwrap();
    static ref COVER_PHOTO: Selector = Selector::parse(COVER_PHOTO_SELECTOR).unwrap();
    static ref EVENT_PATH: Regex = Regex::new(r"^/events/\d+").unwrap();
    static ref FREE: Regex = Regex::new(r"(?i)^(gratuit|gratuite|free|entrée libre)$").unwrap();
    static ref PRICE: Regex =
        Regex::new(r"(\d+(?:[.,]\d{1,2})?\s?€|€\s?\d+(?:[.,]\d{1,2})?)").unwrap();
    static ref EVENT_TYPE: Regex = Regex::new(
        r"(?i)^(événement (public|privé|en ligne)|(public|private|online) event|public\s*·.*)$"
    )
    .unwrap();
}

/**
Pulls the raw fields of an event out of the rendered event page.

Every field is looked up with a list of fallbacks, a field that none of them finds
is logged and left empty.
*/
pub fn extract_event_card(
    html: &str,
    link: &str,
    keyword: &str,
    city: &str,
    calendar: &FrenchCalendar,
) -> RawEventCard {
    let document = Html::parse_document(html);
    let blocks: Vec<ElementRef> = document.select(&BLOCKS).collect();

    let card = RawEventCard {
        title: extract_title(&document, &blocks, keyword),
        date: extract_date(&document, &blocks, calendar),
        location: extract_location(&document, city),
        description: extract_description(&document),
        image: extract_image(&document),
        link: link.to_string(),
        cost: extract_cost(&document),
        event_type: extract_event_type(&document),
    };

    report_gaps(&card);

    card
}

/// Cleans the hrefs found on a search page into absolute event links not seen before
pub fn collect_event_links(
    hrefs: impl IntoIterator<Item = String>,
    base_url: &str,
    seen: &mut HashSet<String>,
) -> Vec<String> {
    let base_url = base_url.trim_end_matches('/');

    hrefs
        .into_iter()
        .filter_map(|href| {
            let href = href.split(['?', '#']).next().unwrap_or_default();
            let path = href.strip_prefix(base_url).unwrap_or(href);

            if !EVENT_PATH.is_match(path) {
                return None;
            }

            let link = format!("{}{}", base_url, path);

            seen.insert(link.clone()).then_some(link)
        })
        .collect()
}

fn extract_title(document: &Html, blocks: &[ElementRef], keyword: &str) -> String {
    let keyword = keyword.to_lowercase();

    blocks
        .iter()
        .filter_map(|block| {
            shortest_text(block.select(&SPANS), |text| {
                text.to_lowercase().contains(&keyword)
            })
        })
        .next()
        .or_else(|| document.select(&HEADINGS).map(element_text).find(|t| !t.is_empty()))
        .or_else(|| meta_content(document, "og:title"))
        .unwrap_or_default()
}

fn extract_date(document: &Html, blocks: &[ElementRef], calendar: &FrenchCalendar) -> String {
    blocks
        .iter()
        .filter_map(|block| {
            block
                .select(&AUTO_SPANS)
                .map(element_text)
                .find(|text| calendar.looks_like_date(text))
        })
        .next()
        .or_else(|| {
            document
                .select(&AUTO_SPANS)
                .map(element_text)
                .find(|text| text.len() <= MAX_LABEL_LENGTH && calendar.looks_like_date(text))
        })
        .unwrap_or_default()
}

fn extract_location(document: &Html, city: &str) -> String {
    let city = voca_rs::case::capitalize(city.trim(), true);
    let in_city = format!("à {} ({})", city, city);
    let in_france = format!("{}, France", city);

    shortest_text(document.select(&SPANS), |text| {
        text.contains(&in_city) || text.contains(&in_france)
    })
    .unwrap_or_default()
}

fn extract_description(document: &Html) -> String {
    DESCRIPTION_SELECTORS
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| {
                    element
                        .text()
                        .map(str::trim)
                        .filter(|text| !text.is_empty())
                        .join("\n")
                })
                .filter(|text| !text.trim().is_empty())
        })
        .or_else(|| meta_content(document, "og:description"))
        .unwrap_or_default()
}

fn extract_image(document: &Html) -> String {
    document
        .select(&COVER_PHOTO)
        .next()
        .and_then(|image| {
            image
                .value()
                .attr("srcset")
                .and_then(largest_srcset_entry)
                .or_else(|| image.value().attr("src").map(str::to_string))
        })
        .or_else(|| meta_content(document, "og:image"))
        .unwrap_or_default()
}

fn extract_cost(document: &Html) -> String {
    let labels: Vec<String> = document
        .select(&SPANS)
        .map(element_text)
        .filter(|text| !text.is_empty() && text.len() <= MAX_LABEL_LENGTH)
        .collect();

    if labels.iter().any(|label| FREE.is_match(label)) {
        return "Free".to_string();
    }

    labels
        .iter()
        .find_map(|label| PRICE.find(label).map(|price| price.as_str().to_string()))
        .unwrap_or_default()
}

fn extract_event_type(document: &Html) -> String {
    document
        .select(&SPANS)
        .map(element_text)
        .find(|text| EVENT_TYPE.is_match(text))
        .unwrap_or_default()
}

/// Nested spans repeat their children's text, the innermost match is the cleanest
fn shortest_text<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    predicate: impl Fn(&str) -> bool,
) -> Option<String> {
    elements
        .map(element_text)
        .filter(|text| !text.is_empty() && predicate(text.as_str()))
        .min_by_key(|text| text.len())
}

fn element_text(element: ElementRef) -> String {
    element.text().join(" ").split_whitespace().join(" ")
}

fn meta_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property='{}']", property)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// `srcset` reads as "url1 320w, url2 640w", the last entry is the largest
fn largest_srcset_entry(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .last()
        .map(str::to_string)
}

fn report_gaps(card: &RawEventCard) {
    let fields = [
        ("title", &card.title),
        ("date", &card.date),
        ("location", &card.location),
        ("description", &card.description),
        ("image", &card.image),
        ("cost", &card.cost),
        ("type", &card.event_type),
    ];

    let missing = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect::<Vec<&str>>();

    if missing.is_empty() {
        debug!(link = %card.link, "Extracted every field");
    } else {
        warn!(link = %card.link, "Fields not found: {}", missing.join(", "));
    }
}
