use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
    Weekday,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_WINDOW_MINUTES: i64 = 240;
pub const DEFAULT_MAINTENANCE_LABEL: &str = "Weekly Maintenance";

const DEFAULT_MAINTENANCE_WEEKDAY: Weekday = Weekday::Sat;
const DEFAULT_MAINTENANCE_HOUR: u32 = 1;
const DEFAULT_MAINTENANCE_DURATION_MINUTES: i64 = 30;

const LOCAL_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Day-of-week plus time-of-day, recomputed relative to "now" on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRecurrence {
    #[serde(default, deserialize_with = "lenient_number")]
    pub weekday: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hour: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub minute: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub window_minutes: Option<i64>,
}

impl WeeklyRecurrence {
    pub fn weekday(&self) -> Weekday {
        self.weekday
            .and_then(weekday_from_sunday_index)
            .unwrap_or(Weekday::Sun)
    }

    pub fn time_of_day(&self) -> NaiveTime {
        time_of_day(self.hour, self.minute, 0)
    }

    pub fn window_minutes(&self) -> i64 {
        self.window_minutes
            .filter(|minutes| *minutes >= 0)
            .unwrap_or(DEFAULT_WINDOW_MINUTES)
    }
}

/// A window bounded by explicit timestamps. `from` already carries the
/// "modal from, else date" fallback; `date` is the event instant itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneTimeWindow {
    pub from: Option<String>,
    pub until: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSpec {
    Weekly(WeeklyRecurrence),
    OneTime(OneTimeWindow),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSpec {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weekday: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hour: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub minute: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub duration_minutes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
}

impl MaintenanceSpec {
    pub fn weekday(&self) -> Weekday {
        self.weekday
            .and_then(weekday_from_sunday_index)
            .unwrap_or(DEFAULT_MAINTENANCE_WEEKDAY)
    }

    pub fn time_of_day(&self) -> NaiveTime {
        time_of_day(self.hour, self.minute, DEFAULT_MAINTENANCE_HOUR)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
            .filter(|minutes| *minutes >= 0)
            .unwrap_or(DEFAULT_MAINTENANCE_DURATION_MINUTES)
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_MAINTENANCE_LABEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub starts_at: Option<String>,
}

/// Parses a resource timestamp in the zone of evaluation. Returns `None` for
/// anything that is not RFC 3339, a local date-time, or a bare date.
pub fn parse_instant<Tz: TimeZone>(input: &str, timezone: &Tz) -> Option<DateTime<Tz>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(timezone));
    }
    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            let fallback = timezone.offset_from_utc_datetime(&naive).fix();
            return Some(resolve_wall_clock(timezone, naive, fallback));
        }
    }
    // Bare dates are UTC midnight, like ECMAScript date-only forms.
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .map(|utc| utc.with_timezone(timezone))
}

/// Maps a wall-clock time onto the zone. Ambiguous times take the earlier
/// instant; times inside a DST gap are read with `fallback`.
pub(crate) fn resolve_wall_clock<Tz: TimeZone>(
    timezone: &Tz,
    naive: NaiveDateTime,
    fallback: chrono::FixedOffset,
) -> DateTime<Tz> {
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _second) => first,
        LocalResult::None => {
            let utc = naive - Duration::seconds(i64::from(fallback.local_minus_utc()));
            timezone.from_utc_datetime(&utc)
        }
    }
}

pub fn weekday_from_sunday_index(index: i64) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

fn time_of_day(hour: Option<i64>, minute: Option<i64>, default_hour: u32) -> NaiveTime {
    let hour = hour
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value < 24)
        .unwrap_or(default_hour);
    let minute = minute
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value < 60)
        .unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Integral JSON numbers only; any other value reads as absent.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite() && number.fract() == 0.0)
            .map(|number| number as i64)
    }))
}

/// Non-empty strings only.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) if !text.is_empty() => Some(text),
        _ => None,
    })
}

/// Strings or numbers, rendered as display text.
pub(crate) fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) if number.as_f64().is_some_and(|n| n != 0.0) => {
            Some(number.to_string())
        }
        _ => None,
    })
}

/// Any nested value of the wrong shape reads as absent instead of failing
/// the whole document.
pub(crate) fn lenient_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
