use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Offset, TimeZone, Weekday};

use crate::schedule::model::{
    MaintenanceSpec, OneTimeWindow, Season, WeeklyRecurrence, WindowSpec, parse_instant,
    resolve_wall_clock,
};

const MS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowContext<Tz: TimeZone> {
    pub event_at: Option<DateTime<Tz>>,
    pub in_window: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceContext<Tz: TimeZone> {
    pub next_start: DateTime<Tz>,
    pub next_end: DateTime<Tz>,
    /// Positive; a start equal to `now` has already rolled a week ahead.
    pub time_until_ms: i64,
    pub is_ongoing: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonContext<'a, Tz: TimeZone> {
    pub season: &'a Season,
    pub target: DateTime<Tz>,
    pub diff_ms: i64,
}

/// Next instant at `weekly`'s weekday and time, never earlier than `now`.
/// Only a candidate strictly before `now` rolls to the following week.
pub fn next_weekly_occurrence<Tz: TimeZone>(
    weekly: &WeeklyRecurrence,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    let time = weekly.time_of_day();
    let date = shift_days(now.date_naive(), days_until(weekly.weekday(), now.weekday()));
    let candidate = wall_clock_at(date, time, now);
    if candidate < *now {
        wall_clock_at(shift_days(date, 7), time, now)
    } else {
        candidate
    }
}

pub fn announcement_window_context<Tz: TimeZone>(
    spec: &WindowSpec,
    now: &DateTime<Tz>,
) -> WindowContext<Tz> {
    match spec {
        WindowSpec::Weekly(weekly) => weekly_window_context(weekly, now),
        WindowSpec::OneTime(window) => one_time_window_context(window, now),
    }
}

fn weekly_window_context<Tz: TimeZone>(
    weekly: &WeeklyRecurrence,
    now: &DateTime<Tz>,
) -> WindowContext<Tz> {
    let event_at = next_weekly_occurrence(weekly, now);
    let diff_ms = event_at.timestamp_millis() - now.timestamp_millis();
    let window_ms = weekly.window_minutes().saturating_mul(MS_PER_MINUTE);
    WindowContext {
        in_window: (0..=window_ms).contains(&diff_ms),
        event_at: Some(event_at),
    }
}

fn one_time_window_context<Tz: TimeZone>(
    window: &OneTimeWindow,
    now: &DateTime<Tz>,
) -> WindowContext<Tz> {
    let timezone = now.timezone();
    let parse = |raw: &Option<String>| {
        raw.as_deref()
            .and_then(|value| parse_instant(value, &timezone))
    };

    let event_at = parse(&window.date);
    let until = parse(&window.until);
    let in_window = match parse(&window.from) {
        Some(from) => *now >= from && until.is_none_or(|until| *now <= until),
        None => false,
    };
    WindowContext {
        event_at,
        in_window,
    }
}

/// Upcoming occurrence of the weekly maintenance block.
///
/// A candidate equal to `now` rolls forward a week, unlike
/// [`next_weekly_occurrence`].
pub fn maintenance_context<Tz: TimeZone>(
    maintenance: &MaintenanceSpec,
    now: &DateTime<Tz>,
) -> Option<MaintenanceContext<Tz>> {
    if !maintenance.enabled {
        return None;
    }

    let time = maintenance.time_of_day();
    let duration = chrono::Duration::milliseconds(
        maintenance
            .duration_minutes()
            .saturating_mul(MS_PER_MINUTE),
    );

    let start_date = shift_days(
        now.date_naive(),
        days_until(maintenance.weekday(), now.weekday()),
    );
    let mut next_start = wall_clock_at(start_date, time, now);
    if next_start <= *now {
        next_start = wall_clock_at(shift_days(start_date, 7), time, now);
    }

    let next_end = next_start
        .clone()
        .checked_add_signed(duration)
        .unwrap_or_else(|| next_start.clone());
    let is_ongoing = *now >= next_start && *now <= next_end;
    Some(MaintenanceContext {
        time_until_ms: next_start.timestamp_millis() - now.timestamp_millis(),
        next_start,
        next_end,
        is_ongoing,
        label: maintenance.label().to_string(),
    })
}

/// Earliest season starting strictly after `now`.
pub fn next_season_context<'a, Tz: TimeZone>(
    seasons: &'a [Season],
    now: &DateTime<Tz>,
) -> Option<SeasonContext<'a, Tz>> {
    let timezone = now.timezone();
    let mut best: Option<SeasonContext<'a, Tz>> = None;
    for season in seasons {
        let Some(target) = season
            .starts_at
            .as_deref()
            .and_then(|raw| parse_instant(raw, &timezone))
        else {
            continue;
        };
        if target <= *now {
            continue;
        }
        let is_earlier = best
            .as_ref()
            .is_none_or(|current| target < current.target);
        if is_earlier {
            best = Some(SeasonContext {
                season,
                diff_ms: target.timestamp_millis() - now.timestamp_millis(),
                target,
            });
        }
    }
    best
}

fn days_until(target: Weekday, current: Weekday) -> u64 {
    u64::from((target.num_days_from_sunday() + 7 - current.num_days_from_sunday()) % 7)
}

fn shift_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

fn wall_clock_at<Tz: TimeZone>(date: NaiveDate, time: NaiveTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    resolve_wall_clock(&now.timezone(), date.and_time(time), now.offset().fix())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, NaiveDate, Timelike, Utc};
    use chrono_tz::America::New_York;

    use super::*;

    fn weekly(weekday: i64, hour: i64, minute: i64) -> WeeklyRecurrence {
        WeeklyRecurrence {
            weekday: Some(weekday),
            hour: Some(hour),
            minute: Some(minute),
            window_minutes: None,
        }
    }

    fn monday_noon() -> DateTime<Utc> {
        // 2026-10-19 is a Monday.
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .single()
            .expect("valid")
    }

    fn maintenance(weekday: i64, hour: i64, minute: i64, duration: i64) -> MaintenanceSpec {
        MaintenanceSpec {
            enabled: true,
            weekday: Some(weekday),
            hour: Some(hour),
            minute: Some(minute),
            duration_minutes: Some(duration),
            label: None,
        }
    }

    #[test]
    fn weekly_occurrence_is_never_before_now_and_lands_on_weekday() {
        let now = monday_noon();
        for weekday in 0..7 {
            for hour in [0, 11, 12, 13, 23] {
                let spec = weekly(weekday, hour, 30);
                let next = next_weekly_occurrence(&spec, &now);
                assert!(next >= now, "{weekday} {hour}");
                assert_eq!(next.weekday(), spec.weekday());
                assert!(next - now <= Duration::days(7));
            }
        }
    }

    #[test]
    fn weekly_occurrence_later_today_stays_today() {
        let now = monday_noon();
        let next = next_weekly_occurrence(&weekly(1, 19, 0), &now);
        assert_eq!(next.date_naive(), now.date_naive());
        assert_eq!(next.hour(), 19);
    }

    #[test]
    fn weekly_occurrence_earlier_today_rolls_a_week() {
        let now = monday_noon();
        let next = next_weekly_occurrence(&weekly(1, 11, 59), &now);
        assert_eq!(
            next.date_naive(),
            NaiveDate::from_ymd_opt(2026, 10, 26).expect("date")
        );
    }

    #[test]
    fn weekly_occurrence_at_exact_instant_is_not_rolled() {
        let now = monday_noon();
        assert_eq!(next_weekly_occurrence(&weekly(1, 12, 0), &now), now);

        let just_after = now + Duration::milliseconds(1);
        let next = next_weekly_occurrence(&weekly(1, 12, 0), &just_after);
        assert_eq!(next, now + Duration::days(7));
    }

    #[test]
    fn weekly_occurrence_defaults_to_sunday_midnight() {
        let now = monday_noon();
        let next = next_weekly_occurrence(&WeeklyRecurrence::default(), &now);
        assert_eq!(
            next.naive_utc(),
            NaiveDate::from_ymd_opt(2026, 10, 25)
                .expect("date")
                .and_hms_opt(0, 0, 0)
                .expect("time")
        );
    }

    #[test]
    fn weekly_occurrence_keeps_wall_clock_across_dst() {
        // Saturday before the US fall-back transition on 2026-11-01.
        let now = New_York
            .with_ymd_and_hms(2026, 10, 31, 20, 0, 0)
            .single()
            .expect("valid");
        let next = next_weekly_occurrence(&weekly(0, 19, 0), &now);
        assert_eq!(next.hour(), 19);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 11, 1).expect("date"));
    }

    #[test]
    fn spring_forward_gap_resolves_with_current_offset() {
        let now = New_York
            .with_ymd_and_hms(2026, 3, 8, 0, 30, 0)
            .single()
            .expect("valid");
        let next = next_weekly_occurrence(&weekly(0, 2, 30), &now);
        assert_eq!(next.hour(), 3);
        assert_eq!(next.minute(), 30);
        assert!(next > now);
    }

    #[test]
    fn weekly_window_opens_ahead_of_event() {
        let now = monday_noon();
        let mut spec = weekly(1, 15, 0);
        spec.window_minutes = Some(240);
        let ctx = announcement_window_context(&WindowSpec::Weekly(spec.clone()), &now);
        assert!(ctx.in_window);
        assert_eq!(ctx.event_at.map(|at| at.hour()), Some(15));

        spec.window_minutes = Some(120);
        let ctx = announcement_window_context(&WindowSpec::Weekly(spec), &now);
        assert!(!ctx.in_window);
    }

    #[test]
    fn zero_minute_weekly_window_only_matches_the_event_instant() {
        let now = monday_noon();
        let mut spec = weekly(1, 12, 0);
        spec.window_minutes = Some(0);
        let at_event = announcement_window_context(&WindowSpec::Weekly(spec.clone()), &now);
        assert!(at_event.in_window);

        let before = now - Duration::seconds(1);
        let ctx = announcement_window_context(&WindowSpec::Weekly(spec), &before);
        assert!(!ctx.in_window);
    }

    #[test]
    fn one_time_window_respects_from_and_until() {
        let window = WindowSpec::OneTime(OneTimeWindow {
            from: Some("2026-10-19T10:00:00Z".to_string()),
            until: Some("2026-10-19T14:00:00Z".to_string()),
            date: Some("2026-10-19T14:00:00Z".to_string()),
        });
        let from = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).single().expect("valid");
        let until = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).single().expect("valid");

        let before = announcement_window_context(&window, &(from - Duration::seconds(1)));
        assert!(!before.in_window);
        assert_eq!(before.event_at, Some(until));
        assert!(announcement_window_context(&window, &from).in_window);
        assert!(announcement_window_context(&window, &until).in_window);
        assert!(!announcement_window_context(&window, &(until + Duration::seconds(1))).in_window);
    }

    #[test]
    fn one_time_window_without_until_stays_open() {
        let window = WindowSpec::OneTime(OneTimeWindow {
            from: Some("2026-10-01T00:00:00Z".to_string()),
            until: Some("whenever".to_string()),
            date: None,
        });
        let ctx = announcement_window_context(&window, &monday_noon());
        assert!(ctx.in_window);
        assert_eq!(ctx.event_at, None);
    }

    #[test]
    fn one_time_window_with_bad_from_is_closed() {
        let window = WindowSpec::OneTime(OneTimeWindow {
            from: Some("next tuesday".to_string()),
            until: None,
            date: Some("2026-10-19T00:00:00Z".to_string()),
        });
        let ctx = announcement_window_context(&window, &monday_noon());
        assert!(!ctx.in_window);
        assert!(ctx.event_at.is_some());

        let empty = WindowSpec::OneTime(OneTimeWindow::default());
        assert!(!announcement_window_context(&empty, &monday_noon()).in_window);
    }

    #[test]
    fn disabled_maintenance_has_no_context() {
        let mut spec = maintenance(6, 1, 0, 30);
        spec.enabled = false;
        assert!(maintenance_context(&spec, &monday_noon()).is_none());
    }

    #[test]
    fn maintenance_finds_next_saturday() {
        let now = monday_noon();
        let spec = MaintenanceSpec {
            enabled: true,
            ..MaintenanceSpec::default()
        };
        let ctx = maintenance_context(&spec, &now).expect("context");
        let expected = Utc.with_ymd_and_hms(2026, 10, 24, 1, 0, 0).single().expect("valid");
        assert_eq!(ctx.next_start, expected);
        assert_eq!(ctx.next_end, expected + Duration::minutes(30));
        assert_eq!(ctx.time_until_ms, (expected - now).num_milliseconds());
        assert!(!ctx.is_ongoing);
        assert_eq!(ctx.label, "Weekly Maintenance");
    }

    #[test]
    fn maintenance_at_its_exact_start_rolls_a_week() {
        let start = Utc.with_ymd_and_hms(2026, 10, 24, 1, 0, 0).single().expect("valid");
        let spec = maintenance(6, 1, 0, 30);
        let ctx = maintenance_context(&spec, &start).expect("context");
        assert_eq!(
            ctx.next_start,
            Utc.with_ymd_and_hms(2026, 10, 31, 1, 0, 0).single().expect("valid")
        );
        assert_eq!(ctx.time_until_ms, 7 * 24 * 60 * 60 * 1000);
        assert!(!ctx.is_ongoing);
    }

    #[test]
    fn maintenance_just_before_start_is_upcoming() {
        let start = Utc.with_ymd_and_hms(2026, 10, 24, 1, 0, 0).single().expect("valid");
        let spec = maintenance(6, 1, 0, 30);
        let ctx = maintenance_context(&spec, &(start - Duration::milliseconds(1)))
            .expect("context");
        assert_eq!(ctx.next_start, start);
        assert_eq!(ctx.next_end, start + Duration::minutes(30));
        assert_eq!(ctx.time_until_ms, 1);
        assert!(!ctx.is_ongoing);
    }

    #[test]
    fn maintenance_inside_its_window_points_at_next_week() {
        let start = Utc.with_ymd_and_hms(2026, 10, 24, 1, 0, 0).single().expect("valid");
        let spec = maintenance(6, 1, 0, 30);
        for offset in [1, 29, 30, 31] {
            let now = start + Duration::minutes(offset);
            let ctx = maintenance_context(&spec, &now).expect("context");
            assert_eq!(ctx.next_start, start + Duration::days(7), "offset {offset}");
            assert!(ctx.time_until_ms > 0);
            assert!(!ctx.is_ongoing);
        }
    }

    #[test]
    fn maintenance_respects_fixed_offset_zone() {
        let central = FixedOffset::west_opt(5 * 3600).expect("offset");
        let now = central
            .with_ymd_and_hms(2026, 10, 23, 23, 0, 0)
            .single()
            .expect("valid");
        let ctx = maintenance_context(&maintenance(6, 1, 0, 30), &now).expect("context");
        assert_eq!(ctx.next_start.hour(), 1);
        assert_eq!(ctx.time_until_ms, 2 * 60 * 60 * 1000);
    }

    #[test]
    fn next_season_picks_earliest_future_start() {
        let now = monday_noon();
        let seasons = vec![
            Season {
                name: Some("tomorrow".to_string()),
                description: None,
                starts_at: Some((now + Duration::days(1)).to_rfc3339()),
            },
            Season {
                name: Some("yesterday".to_string()),
                description: None,
                starts_at: Some((now - Duration::days(1)).to_rfc3339()),
            },
            Season {
                name: Some("later".to_string()),
                description: None,
                starts_at: Some((now + Duration::days(3)).to_rfc3339()),
            },
        ];
        let ctx = next_season_context(&seasons, &now).expect("season");
        assert_eq!(ctx.season.name.as_deref(), Some("tomorrow"));
        assert_eq!(ctx.target, now + Duration::days(1));
        assert_eq!(ctx.diff_ms, 86_400_000);
    }

    #[test]
    fn next_season_ignores_bad_and_current_starts() {
        let now = monday_noon();
        let seasons = vec![
            Season {
                name: Some("broken".to_string()),
                description: None,
                starts_at: Some("someday".to_string()),
            },
            Season {
                name: Some("now".to_string()),
                description: None,
                starts_at: Some(now.to_rfc3339()),
            },
            Season::default(),
        ];
        assert!(next_season_context(&seasons, &now).is_none());
        assert!(next_season_context(&seasons[..0], &now).is_none());
    }

    #[test]
    fn evaluation_is_repeatable() {
        let now = monday_noon();
        let spec = maintenance(3, 22, 15, 45);
        assert_eq!(maintenance_context(&spec, &now), maintenance_context(&spec, &now));
        let weekly = weekly(5, 18, 0);
        assert_eq!(
            next_weekly_occurrence(&weekly, &now),
            next_weekly_occurrence(&weekly, &now)
        );
    }
}
