use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// en-US `toLocaleString` shape, e.g. `3/7/2026, 9:05:00 PM`.
pub const DISPLAY_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    Today,
    Yesterday,
}

impl DateRange {
    /// Half-open `[start, end)` interval of local midnights in the zone of `now`.
    pub fn bounds<Tz: TimeZone>(self, now: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
        let tz = now.timezone();
        let today = now.date_naive();
        let (start, end) = match self {
            Self::Today => (today, today.succ_opt().unwrap_or(NaiveDate::MAX)),
            Self::Yesterday => (today.pred_opt().unwrap_or(NaiveDate::MIN), today),
        };
        (local_midnight(&tz, start), local_midnight(&tz, end))
    }

    pub fn contains<Tz: TimeZone>(self, now: &DateTime<Tz>, instant: &DateTime<Tz>) -> bool {
        let (start, end) = self.bounds(now);
        *instant >= start && *instant < end
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
        }
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            other => Err(format!("invalid date range: {other}")),
        }
    }
}

/// Render a Gmail `internalDate` (epoch milliseconds) in `tz`.
pub fn format_display_time<Tz>(epoch_millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(epoch_millis)
        .earliest()
        .or_else(|| tz.timestamp_millis_opt(0).earliest())
        .map(|dt| dt.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Inverse of [`format_display_time`]. Returns `None` for anything that is
/// not in the display format.
pub fn parse_display_time<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), DISPLAY_TIME_FORMAT).ok()?;
    tz.from_local_datetime(&naive).earliest()
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    // a DST gap can swallow midnight; take the first instant that exists
    let mut candidate = midnight;
    for _ in 0..(24 * 4) {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved;
        }
        candidate += Duration::minutes(15);
    }
    tz.from_utc_datetime(&midnight)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone, Utc};

    use super::{format_display_time, parse_display_time, DateRange};

    #[test]
    fn date_range_parses_case_insensitively() {
        assert_eq!("Today".parse::<DateRange>(), Ok(DateRange::Today));
        assert_eq!(" yesterday ".parse::<DateRange>(), Ok(DateRange::Yesterday));
        assert!("tomorrow".parse::<DateRange>().is_err());
    }

    #[test]
    fn today_bounds_are_local_midnights() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 3, 7, 15, 30, 0).unwrap();
        let (start, end) = DateRange::Today.bounds(&now);
        assert_eq!(start, tz.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap());
        assert_eq!(end, tz.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap());

        let (start, end) = DateRange::Yesterday.bounds(&now);
        assert_eq!(start, tz.with_ymd_and_hms(2026, 3, 6, 0, 0, 0).unwrap());
        assert_eq!(end, tz.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap());
    }

    #[test]
    fn midnight_belongs_to_the_new_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap();
        assert!(DateRange::Today.contains(&now, &midnight));
        assert!(!DateRange::Yesterday.contains(&now, &midnight));
    }

    #[test]
    fn display_time_uses_locale_shape() {
        let millis = Utc
            .with_ymd_and_hms(2026, 3, 7, 21, 5, 9)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_display_time(millis, &Utc), "3/7/2026, 9:05:09 PM");

        let midnight = Utc
            .with_ymd_and_hms(2026, 11, 30, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_display_time(midnight, &Utc), "11/30/2026, 12:00:00 AM");
    }

    #[test]
    fn display_time_parses_back() {
        let parsed = parse_display_time("3/7/2026, 9:05:09 PM", &Utc).expect("parse display time");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 7, 21, 5, 9).unwrap());
        assert!(parse_display_time("Invalid Date", &Utc).is_none());
    }
}
