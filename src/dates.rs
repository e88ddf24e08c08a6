use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use itertools::Itertools;
use regex::Regex;
use std::collections::HashMap;
use tracing::trace;

const FRENCH_MONTHS: [(&str, u32); 25] = [
    ("janvier", 1),
    ("janv", 1),
    ("février", 2),
    ("fevrier", 2),
    ("févr", 2),
    ("mars", 3),
    ("mar", 3),
    ("avril", 4),
    ("avr", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("juil", 7),
    ("août", 8),
    ("aout", 8),
    ("septembre", 9),
    ("sept", 9),
    ("octobre", 10),
    ("oct", 10),
    ("novembre", 11),
    ("nov", 11),
    ("décembre", 12),
    ("decembre", 12),
    ("déc", 12),
    ("dec", 12),
];

/// Monday first, so the index matches `Weekday::num_days_from_monday`
const FRENCH_WEEKDAYS: [(&str, Weekday); 7] = [
    ("lundi", Weekday::Mon),
    ("mardi", Weekday::Tue),
    ("mercredi", Weekday::Wed),
    ("jeudi", Weekday::Thu),
    ("vendredi", Weekday::Fri),
    ("samedi", Weekday::Sat),
    ("dimanche", Weekday::Sun),
];

const FRENCH_RELATIVE_DAYS: [(&str, i64); 3] =
    [("aujourd'hui", 0), ("aujourd’hui", 0), ("demain", 1)];

/// Start and end of an event, resolved against a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/**
French date vocabulary and the patterns Facebook uses to display event dates.

It is built once and passed to whoever needs it, the host locale is never consulted.

Recognized shapes (matched on the lower-cased text):
* `du 18 déc. 20:00 au 22 déc. 03:00`
* `Vendredi 19 septembre 2025 à 21:00`
* `mercredi à 20:00`, `demain à 20:00`
* `Samedi 11 avril 2026 de 20:00 à 01:30`, `Demain de 19:00 à 23:00`, `samedi de 20:00 à 01:30`
*/
#[derive(Debug, Clone)]
pub struct FrenchCalendar {
    months: HashMap<&'static str, u32>,
    weekdays: HashMap<&'static str, Weekday>,
    relative_days: HashMap<&'static str, i64>,
    range: Regex,
    full_date_time: Regex,
    day_at_time: Regex,
    day_time_range: Regex,
    time_range: Regex,
    full_date: Regex,
    day_word: Regex,
}

impl Default for FrenchCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl FrenchCalendar {
    pub fn new() -> Self {
        let day_words = FRENCH_RELATIVE_DAYS
            .iter()
            .map(|(word, _)| *word)
            .chain(FRENCH_WEEKDAYS.iter().map(|(word, _)| *word))
            .map(regex::escape)
            .join("|");

        Self {
            months: FRENCH_MONTHS.into_iter().collect(),
            weekdays: FRENCH_WEEKDAYS.into_iter().collect(),
            relative_days: FRENCH_RELATIVE_DAYS.into_iter().collect(),
            range: Regex::new(
                r"du (\d{1,2}) ([\p{L}.]+) (\d{1,2}:\d{2}) au (\d{1,2}) ([\p{L}.]+) (\d{1,2}:\d{2})",
            )
            .expect("Failed to create range regex"),
            full_date_time: Regex::new(r"(\d{1,2}) ([\p{L}.]+) (\d{4}) à (\d{1,2}:\d{2})")
                .expect("Failed to create full date regex"),
            day_at_time: Regex::new(&format!(r"\b({day_words})\s*à\s*(\d{{1,2}}:\d{{2}})"))
                .expect("Failed to create day at time regex"),
            day_time_range: Regex::new(r"[\p{L}.]+\s+de\s+\d{1,2}:\d{2}\s+à\s+\d{1,2}:\d{2}")
                .expect("Failed to create day time range regex"),
            time_range: Regex::new(r"(\d{1,2}:\d{2})\s*à\s*(\d{1,2}:\d{2})")
                .expect("Failed to create time range regex"),
            full_date: Regex::new(r"(\d{1,2})\s+([\p{L}.]+)\s+(\d{4})")
                .expect("Failed to create date regex"),
            day_word: Regex::new(&format!(r"\b({day_words})\b"))
                .expect("Failed to create day word regex"),
        }
    }

    /// Whether the text reads like one of the displayed event date shapes
    pub fn looks_like_date(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();

        self.day_time_range.is_match(&text)
            || self.full_date.is_match(&text)
            || self.full_date_time.is_match(&text)
            || self.day_at_time.is_match(&text)
            || self.range.is_match(&text)
    }

    pub fn parse(&self, text: &str, reference: NaiveDateTime) -> Option<Schedule> {
        let text = text.trim().to_lowercase();

        if text.is_empty() {
            return None;
        }

        if let Some(caps) = self.range.captures(&text) {
            trace!("Parsing '{}' as a date range", text);
            return self.resolve_range(&caps, reference);
        }

        if let Some(caps) = self.full_date_time.captures(&text) {
            trace!("Parsing '{}' as a full date", text);
            let year = caps[3].parse().ok()?;
            let start = self
                .date_in_year(&caps[1], &caps[2], year)?
                .and_time(parse_time(&caps[4])?);

            return Some(Schedule { start, end: start });
        }

        if let Some(caps) = self.day_at_time.captures(&text) {
            trace!("Parsing '{}' as a day and time", text);
            let start = self
                .resolve_day(&caps[1], reference.date())?
                .and_time(parse_time(&caps[2])?);

            return Some(Schedule { start, end: start });
        }

        let caps = self.time_range.captures(&text)?;
        trace!("Parsing '{}' as a time range", text);

        let start_time = parse_time(&caps[1])?;
        let end_time = parse_time(&caps[2])?;

        let date = self
            .full_date
            .captures(&text)
            .and_then(|date| {
                let year = date[3].parse().ok()?;
                self.date_in_year(&date[1], &date[2], year)
            })
            .or_else(|| {
                self.day_word
                    .captures(&text)
                    .and_then(|day| self.resolve_day(&day[1], reference.date()))
            })
            .unwrap_or(reference.date());

        let start = date.and_time(start_time);
        let mut end = date.and_time(end_time);

        // overnight events end on the following day
        if end <= start {
            end += Duration::days(1);
        }

        Some(Schedule { start, end })
    }

    /// Renders the text as `Vendredi - 20h00 à 23h00`, or returns it trimmed when unrecognized
    pub fn normalize(&self, text: &str, reference: NaiveDateTime) -> String {
        match self.parse(text, reference) {
            Some(schedule) => self.describe(&schedule),
            None => text.trim().to_string(),
        }
    }

    pub fn describe(&self, schedule: &Schedule) -> String {
        format!(
            "{} - {} à {}",
            self.weekday_name(schedule.start.weekday()),
            schedule.start.format("%Hh%M"),
            schedule.end.format("%Hh%M")
        )
    }

    pub fn weekday_name(&self, weekday: Weekday) -> String {
        let (name, _) = FRENCH_WEEKDAYS[weekday.num_days_from_monday() as usize];

        voca_rs::case::capitalize(name, true)
    }

    pub fn month(&self, word: &str) -> Option<u32> {
        self.months.get(word.trim_matches('.')).copied()
    }

    fn resolve_range(&self, caps: &regex::Captures, reference: NaiveDateTime) -> Option<Schedule> {
        let year = reference.year();

        let mut start = self
            .date_in_year(&caps[1], &caps[2], year)?
            .and_time(parse_time(&caps[3])?);
        let mut end = self
            .date_in_year(&caps[4], &caps[5], year)?
            .and_time(parse_time(&caps[6])?);

        // a range crossing new year
        if end < start {
            end = end.with_year(year + 1)?;
        }

        if end < reference {
            start = start.with_year(start.year() + 1)?;
            end = end.with_year(end.year() + 1)?;
        }

        Some(Schedule { start, end })
    }

    fn resolve_day(&self, word: &str, reference: NaiveDate) -> Option<NaiveDate> {
        if let Some(offset) = self.relative_days.get(word) {
            return Some(reference + Duration::days(*offset));
        }

        let weekday = self.weekdays.get(word)?;
        let days_ahead = (7 + weekday.num_days_from_monday() as i64
            - reference.weekday().num_days_from_monday() as i64)
            % 7;

        Some(reference + Duration::days(days_ahead))
    }

    fn date_in_year(&self, day: &str, month: &str, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month(month)?, day.parse().ok()?)
    }
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDateTime {
        // a Wednesday
        NaiveDate::from_ymd_opt(2025, 9, 17)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test_log::test]
    fn should_parse_full_date_with_time() {
        let schedule = FrenchCalendar::new()
            .parse("Vendredi 19 septembre 2025 à 21:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 19, 21, 0));
        assert_eq!(schedule.end, schedule.start);
    }

    #[test_log::test]
    fn should_parse_full_date_with_overnight_time_range() {
        let schedule = FrenchCalendar::new()
            .parse("Samedi 11 avril 2026 de 20:00 à 01:30", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2026, 4, 11, 20, 0));
        assert_eq!(schedule.end, at(2026, 4, 12, 1, 30));
    }

    #[test_log::test]
    fn should_resolve_tomorrow_with_time_range() {
        let schedule = FrenchCalendar::new()
            .parse("Demain de 19:00 à 23:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 18, 19, 0));
        assert_eq!(schedule.end, at(2025, 9, 18, 23, 0));
    }

    #[test_log::test]
    fn should_resolve_next_weekday_with_time_range() {
        let schedule = FrenchCalendar::new()
            .parse("samedi de 20:00 à 01:30", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 20, 20, 0));
        assert_eq!(schedule.end, at(2025, 9, 21, 1, 30));
    }

    #[test_log::test]
    fn should_resolve_monday_with_time_range() {
        let schedule = FrenchCalendar::new()
            .parse("lundi de 18:00 à 20:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 22, 18, 0));
    }

    #[test_log::test]
    fn should_resolve_same_weekday_as_today() {
        let schedule = FrenchCalendar::new()
            .parse("mercredi à 20:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 17, 20, 0));
    }

    #[test_log::test]
    fn should_resolve_tomorrow_at_time() {
        let schedule = FrenchCalendar::new()
            .parse("demain à 20:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 9, 18, 20, 0));
    }

    #[test_log::test]
    fn should_parse_abbreviated_range() {
        let schedule = FrenchCalendar::new()
            .parse("du 18 déc. 20:00 au 22 déc. 03:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 12, 18, 20, 0));
        assert_eq!(schedule.end, at(2025, 12, 22, 3, 0));
    }

    #[test_log::test]
    fn when_a_range_crosses_new_year_should_end_next_year() {
        let schedule = FrenchCalendar::new()
            .parse("du 28 déc. 20:00 au 2 janv. 03:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2025, 12, 28, 20, 0));
        assert_eq!(schedule.end, at(2026, 1, 2, 3, 0));
    }

    #[test_log::test]
    fn when_a_range_is_already_over_should_move_to_next_year() {
        let schedule = FrenchCalendar::new()
            .parse("du 2 mars 20:00 au 4 mars 23:00", reference())
            .unwrap();

        assert_eq!(schedule.start, at(2026, 3, 2, 20, 0));
        assert_eq!(schedule.end, at(2026, 3, 4, 23, 0));
    }

    #[test_log::test]
    fn when_the_month_is_unknown_should_not_parse() {
        let schedule =
            FrenchCalendar::new().parse("du 18 brumaire 20:00 au 22 brumaire 03:00", reference());

        assert_eq!(schedule, None);
    }

    #[test_log::test]
    fn should_normalize_to_weekday_and_hours() {
        let result =
            FrenchCalendar::new().normalize("Vendredi 19 septembre 2025 à 21:00", reference());

        assert_eq!(result, "Vendredi - 21h00 à 21h00");
    }

    #[test_log::test]
    fn when_already_normalized_should_keep_day_and_hour_markers() {
        let result = FrenchCalendar::new().normalize("Vendredi - 20H à 23H", reference());

        assert!(result.contains("Vendredi"));
        assert!(result.contains("20H"));
        assert!(result.contains("23H"));
    }

    #[test_log::test]
    fn when_unrecognized_should_return_text_unchanged() {
        let result = FrenchCalendar::new().normalize("TBD", reference());

        assert_eq!(result, "TBD");
    }

    #[test_log::test]
    fn should_detect_date_lines() {
        let calendar = FrenchCalendar::new();

        assert!(calendar.looks_like_date("Samedi 11 avril 2026 de 20:00 à 01:30"));
        assert!(calendar.looks_like_date("mercredi de 23:00 à 05:00"));
        assert!(calendar.looks_like_date("du 18 déc. 20:00 au 22 déc. 03:00"));
        assert!(calendar.looks_like_date("Demain à 20:00"));
        assert!(calendar.looks_like_date("mercredi à 20:00"));
        assert!(!calendar.looks_like_date("Public · Tout le monde"));
    }
}
