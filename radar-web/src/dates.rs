//! Free-text Ukrainian date parsing.
//!
//! Every naive value is read as Europe/Kyiv wall-clock time and returned as a
//! UTC instant. Recognized forms, tried in order:
//!
//! 1. ISO-8601 (`2025-10-23T14:13:00+03:00`, `2025-10-23 14:13`, `2025-10-23`)
//! 2. numeric `23.10.2025 14:13` (also `/` and `-` separators)
//! 3. time only `14:13`, `14:13 год.`, `вчора о 14:13`, resolved against a reference instant
//! 4. `23 жовтня 2025 р. о 14:13`, full or abbreviated month names
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use radar_web::dates;
//!
//! let parsed = dates::parse("23 жовт. 2025 14:13", None).unwrap();
//! assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap());
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Kyiv;
use regex::Regex;

use crate::text::normalize_spaces;

static YEAR_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(р\.|р|року)(\s|$)").expect("year suffix regex"));
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("time regex"));
static TIME_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?:\s*год\.?)?$").expect("time-only regex"));
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d{1,2})[./-](\d{1,2})[./-](\d{4})(?:\s|$)").expect("numeric date regex")
});
static WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d{1,2})\s+(\p{Cyrillic}+)\.?\s+(\d{4})(?:\s|$)").expect("word date regex")
});
static DATE_ONLY_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s+(\p{Cyrillic}+)\.?(?:\s+\d{4})?(?:\s+\d{1,2}:\d{2}(?:\s*год\.?)?)?$")
        .expect("date-only regex")
});
static DATE_ONLY_NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}[./-]\d{1,2}[./-]\d{2,4}(?:\s+\d{1,2}:\d{2})?$").expect("numeric date-only regex")
});
static CONTAINS_WORD_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)\d{1,2}\s+(\p{Cyrillic}+)\.?(?:\s|$)").expect("embedded date regex")
});

const MONTHS: &[(&str, u32)] = &[
    ("січня", 1),
    ("січ", 1),
    ("лютого", 2),
    ("лют", 2),
    ("березня", 3),
    ("берез", 3),
    ("бер", 3),
    ("квітня", 4),
    ("квіт", 4),
    ("травня", 5),
    ("трав", 5),
    ("червня", 6),
    ("черв", 6),
    ("липня", 7),
    ("лип", 7),
    ("серпня", 8),
    ("серп", 8),
    ("вересня", 9),
    ("верес", 9),
    ("вер", 9),
    ("жовтня", 10),
    ("жовт", 10),
    ("жов", 10),
    ("листопада", 11),
    ("листоп", 11),
    ("лист", 11),
    ("грудня", 12),
    ("груд", 12),
];

/// Month number for a full or abbreviated genitive month name.
pub fn month_number(word: &str) -> Option<u32> {
    let word = word.trim().trim_end_matches('.').to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, month)| *month)
}

struct Prepared {
    text: String,
    yesterday: bool,
}

fn prepare(raw: &str) -> Prepared {
    let mut text = normalize_spaces(raw).to_lowercase();
    let yesterday = text.contains("вчора");
    text = text.replace("сьогодні", " ").replace("вчора", " ");
    text = text.replace(',', " ");
    let padded = format!(" {} ", text.split_whitespace().collect::<Vec<_>>().join(" "));
    let padded = padded.replace(" о ", " ");
    let stripped = YEAR_SUFFIX_RE.replace_all(&padded, " ");
    Prepared {
        text: stripped.split_whitespace().collect::<Vec<_>>().join(" "),
        yesterday,
    }
}

/// Interpret a naive wall-clock time as Kyiv local time.
///
/// Ambiguous times (autumn fall-back) take the earlier instant; times inside
/// the spring-forward gap move one hour ahead.
pub fn kyiv_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match Kyiv.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => Kyiv
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

fn time_in(text: &str) -> Option<Option<NaiveTime>> {
    match TIME_RE.captures(text) {
        None => Some(None),
        Some(caps) => {
            let hour = caps[1].parse().ok()?;
            let minute = caps[2].parse().ok()?;
            NaiveTime::from_hms_opt(hour, minute, 0).map(Some)
        }
    }
}

fn at(date: NaiveDate, time: Option<NaiveTime>) -> Option<DateTime<Utc>> {
    let naive = match time {
        Some(time) => date.and_time(time),
        None => date.and_hms_opt(0, 0, 0)?,
    };
    kyiv_to_utc(naive)
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return kyiv_to_utc(naive);
        }
    }
    let naive_utc = raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z'))?;
    NaiveDateTime::parse_from_str(naive_utc, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| at(date, None))
}

fn parse_numeric(text: &str) -> Option<DateTime<Utc>> {
    let caps = NUMERIC_RE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    at(date, time_in(text)?)
}

fn parse_time_only(
    text: &str,
    yesterday: bool,
    reference: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let caps = TIME_ONLY_RE.captures(text)?;
    let time = NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)?;
    let now = reference.unwrap_or_else(Utc::now).with_timezone(&Kyiv);
    let mut date = now.date_naive();
    if yesterday {
        date = date.pred_opt()?;
    }
    at(date, Some(time))
}

fn parse_words(text: &str) -> Option<DateTime<Utc>> {
    let caps = WORDS_RE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    at(date, time_in(&text[caps.get(0)?.end()..])?)
}

/// Parse a free-text date into UTC. `reference` anchors time-only and
/// "вчора" forms; it defaults to the current instant.
///
/// Returns `None` for anything unrecognized or calendar-invalid.
pub fn parse(text: &str, reference: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    let raw = normalize_spaces(text);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(dt) = parse_iso(raw).or_else(|| parse_iso_date(raw)) {
        return Some(dt);
    }

    let prepared = prepare(raw);
    if prepared.text.is_empty() {
        return None;
    }
    if NUMERIC_RE.is_match(&prepared.text) {
        return parse_numeric(&prepared.text);
    }
    if TIME_ONLY_RE.is_match(&prepared.text) {
        return parse_time_only(&prepared.text, prepared.yesterday, reference);
    }
    parse_words(&prepared.text)
}

/// The whole text is a date (optionally with a time) and nothing else.
/// Used to drop "published at" lines from article bodies.
pub fn is_date_only(text: &str) -> bool {
    let prepared = prepare(text);
    let s = prepared.text.as_str();
    if s.is_empty() {
        return false;
    }
    if DATE_ONLY_NUMERIC_RE.is_match(s) || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return true;
    }
    DATE_ONLY_WORDS_RE
        .captures(s)
        .is_some_and(|caps| month_number(&caps[2]).is_some())
}

/// A short line that carries a Ukrainian calendar date, e.g. "27 жовтня 2025"
/// or "Опубліковано 27.10.2025".
pub fn looks_like_ua_date(line: &str) -> bool {
    let prepared = prepare(line);
    let s = prepared.text.as_str();
    if s.is_empty() || s.chars().count() > 60 {
        return false;
    }
    if is_date_only(s) || NUMERIC_RE.is_match(s) {
        return true;
    }
    CONTAINS_WORD_DATE_RE
        .captures_iter(s)
        .any(|caps| month_number(&caps[1]).is_some())
}
