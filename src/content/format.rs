use std::fmt::Display;

use chrono::{DateTime, Offset, TimeZone, Weekday};
use serde::Serialize;

use crate::schedule::model::WeeklyRecurrence;

/// `Jan 5, 2026, 7:30 PM`
pub fn short_date_time<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// `Weekly • Sun • 7:00 PM`
pub fn weekly_label(weekly: &WeeklyRecurrence) -> String {
    format!(
        "Weekly • {} • {}",
        short_day_name(weekly.weekday()),
        weekly.time_of_day().format("%-I:%M %p")
    )
}

/// RFC 3339 with the numeric offset of the evaluation zone.
pub fn iso<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&at.offset().fix()).to_rfc3339()
}

pub fn short_day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteSeason {
    Spring,
    Summer,
    Fall,
    Winter,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct SeasonTheme {
    pub season: SiteSeason,
    pub emoji: &'static str,
    pub message: &'static str,
}

/// Hero chip theme for a calendar month (1 = January).
pub fn season_theme(month: u32) -> SeasonTheme {
    match month {
        3..=5 => SeasonTheme {
            season: SiteSeason::Spring,
            emoji: "🌸",
            message: "spring timeee.",
        },
        6..=8 => SeasonTheme {
            season: SiteSeason::Summer,
            emoji: "☀️",
            message: "summer timeee.",
        },
        9..=11 => SeasonTheme {
            season: SiteSeason::Fall,
            emoji: "🍂",
            message: "falllll timeeee.",
        },
        _ => SeasonTheme {
            season: SiteSeason::Winter,
            emoji: "❄",
            message: "winter timeee, when christmas arrives, i hope you have a good one",
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn short_date_time_uses_twelve_hour_clock() {
        let central = FixedOffset::west_opt(6 * 3600).expect("offset");
        let at = central
            .with_ymd_and_hms(2026, 1, 5, 19, 30, 0)
            .single()
            .expect("valid");
        assert_eq!(short_date_time(&at), "Jan 5, 2026, 7:30 PM");
        assert_eq!(iso(&at), "2026-01-05T19:30:00-06:00");
    }

    #[test]
    fn weekly_label_names_day_and_time() {
        let weekly = WeeklyRecurrence {
            weekday: Some(5),
            hour: Some(0),
            minute: Some(5),
            window_minutes: None,
        };
        assert_eq!(weekly_label(&weekly), "Weekly • Fri • 12:05 AM");
        assert_eq!(
            weekly_label(&WeeklyRecurrence::default()),
            "Weekly • Sun • 12:00 AM"
        );
    }

    #[test]
    fn season_theme_follows_meteorological_seasons() {
        assert_eq!(season_theme(2).season, SiteSeason::Winter);
        assert_eq!(season_theme(3).season, SiteSeason::Spring);
        assert_eq!(season_theme(8).season, SiteSeason::Summer);
        assert_eq!(season_theme(10).season, SiteSeason::Fall);
        assert_eq!(season_theme(12).season, SiteSeason::Winter);
    }
}
