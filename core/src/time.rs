use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Kick-off time used when a match date is given without a time of day.
const DEFAULT_KICKOFF_HOUR: u32 = 20;

/// Calendar month of dues, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month {} in month key", month));
        }
        if !(0..=9999).contains(&year) {
            return Err(anyhow!("Invalid year {} in month key", year));
        }
        Ok(Self { year, month })
    }

    /// Month containing `now`, in UTC.
    pub fn from_datetime(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (year_str, month_str) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("Month key '{}' must look like YYYY-MM", s))?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(anyhow!("Month key '{}' must look like YYYY-MM", s));
        }
        let year: i32 = year_str
            .parse()
            .map_err(|_| anyhow!("Invalid year in month key '{}'", s))?;
        let month: u32 = month_str
            .parse()
            .map_err(|_| anyhow!("Invalid month in month key '{}'", s))?;
        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// The twelve month keys of `year`, January first.
pub fn months_of_year(year: i32) -> impl Iterator<Item = MonthKey> {
    (1..=12).map(move |month| MonthKey { year, month })
}

/// Parses a match date relative to `now`.
///
/// Accepted forms: `today`, `tomorrow`, `+3d`, `+2w`, weekday names (`sat`,
/// `2:sat` for the one after next), `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` and
/// RFC 3339. Date-only forms kick off at 20:00 UTC.
pub fn parse_match_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date string"));
    }
    let today = now.date_naive();

    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(kickoff(today)),
        "tomorrow" | "tom" => return Ok(kickoff(today + Duration::days(1))),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix('+') {
        return relative_date(today, rest)
            .ok_or_else(|| anyhow!("Invalid relative format: {}", input));
    }

    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target_weekday) = parse_weekday_str(day_str) {
            let mut days_needed = target_weekday.num_days_from_sunday() as i64
                - today.weekday().num_days_from_sunday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            // Nth occurrence
            return (count - 1)
                .checked_mul(7)
                .and_then(|extra| days_needed.checked_add(extra))
                .and_then(|days| shift_days(today, days))
                .ok_or_else(|| anyhow!("Invalid relative format: {}", input));
        }
    }

    parse_timestamp(input)
}

/// Parses an absolute timestamp: RFC 3339, `YYYY-MM-DD HH:MM[:SS]`,
/// `YYYY-MM-DDTHH:MM` (read as UTC) or a bare date (20:00 UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(kickoff(d));
    }

    Err(anyhow!("Could not parse date: {}", input))
}

/// `3d` or `2w` after `today`. None on a bad unit, count or overflow.
fn relative_date(today: NaiveDate, rest: &str) -> Option<DateTime<Utc>> {
    let unit = rest.chars().last()?;
    let count: i64 = rest[..rest.len() - unit.len_utf8()].parse().ok()?;
    let days = match unit {
        'd' => count,
        'w' => count.checked_mul(7)?,
        _ => return None,
    };
    shift_days(today, days)
}

fn shift_days(date: NaiveDate, days: i64) -> Option<DateTime<Utc>> {
    let delta = Duration::try_days(days)?;
    date.checked_add_signed(delta).map(kickoff)
}

fn kickoff(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(DEFAULT_KICKOFF_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time).and_utc()
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => {
            let count = count.parse::<i64>().ok()?;
            (count >= 1).then_some((count, day))
        }
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
