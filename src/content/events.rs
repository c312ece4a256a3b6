use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::content::format::{day_name, iso, short_date_time};
use crate::schedule::countdown::countdown_text;
use crate::schedule::model::{MaintenanceSpec, Season, lenient_text, lenient_value, parse_instant};
use crate::schedule::scheduler::{
    MaintenanceContext, SeasonContext, maintenance_context, next_season_context,
};

/// Maintenance this close to starting takes the banner over a season launch.
pub const BANNER_MAINTENANCE_LEAD_MS: i64 = 48 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsDocument {
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub maintenance: Option<MaintenanceSpec>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsPageView {
    pub banner: BannerView,
    pub season_countdown: SeasonCountdownView,
    pub maintenance_summary: String,
    pub events: EventsListView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeasonCountdownView {
    Scheduled {
        title: String,
        description: String,
        target: String,
        diff_ms: i64,
        countdown: String,
    },
    Empty {
        message: &'static str,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsListView {
    pub cards: Vec<EventCard>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCard {
    pub title: String,
    pub when: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BannerView {
    Hidden,
    Maintenance {
        badge: &'static str,
        text: String,
        countdown: String,
        starts_at: String,
        ends_at: String,
        ongoing: bool,
    },
    Season {
        badge: &'static str,
        text: String,
        countdown: String,
        starts_at: String,
    },
}

pub fn events_page_view<Tz>(
    document: &EventsDocument,
    now: &DateTime<Tz>,
    timezone_label: &str,
) -> EventsPageView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let maintenance = document
        .maintenance
        .as_ref()
        .and_then(|spec| maintenance_context(spec, now));
    let season = next_season_context(&document.seasons, now);

    EventsPageView {
        banner: banner_view(maintenance.as_ref(), season.as_ref(), now),
        season_countdown: season_countdown_view(season.as_ref(), now),
        maintenance_summary: maintenance_summary(document.maintenance.as_ref(), timezone_label),
        events: events_list_view(&document.events, now),
    }
}

pub fn season_countdown_view<Tz>(
    season: Option<&SeasonContext<'_, Tz>>,
    now: &DateTime<Tz>,
) -> SeasonCountdownView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(context) = season else {
        return SeasonCountdownView::Empty {
            message: "No upcoming seasons are scheduled yet.",
        };
    };
    SeasonCountdownView::Scheduled {
        title: season_title(context),
        description: context.season.description.clone().unwrap_or_else(|| {
            "Get ready to hop on around launch time with everyone else.".to_string()
        }),
        target: iso(&context.target),
        diff_ms: context.diff_ms,
        countdown: countdown_text(&context.target, now, "starts in", "live now!"),
    }
}

pub fn maintenance_summary(maintenance: Option<&MaintenanceSpec>, timezone_label: &str) -> String {
    let Some(spec) = maintenance.filter(|spec| spec.enabled) else {
        return "No recurring maintenance schedule is configured.".to_string();
    };
    format!(
        "{}: Every {} at around {} for about {} minutes ({timezone_label}).",
        spec.label(),
        day_name(spec.weekday()),
        spec.time_of_day().format("%I:%M %p"),
        spec.duration_minutes()
    )
}

/// Dated events, soonest first. Entries without a date are left out.
pub fn events_list_view<Tz>(events: &[EventEntry], now: &DateTime<Tz>) -> EventsListView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if events.is_empty() {
        return EventsListView {
            cards: Vec::new(),
            empty_message: Some("No special events are scheduled right now."),
        };
    }

    let timezone = now.timezone();
    let mut dated = events
        .iter()
        .filter_map(|event| {
            let raw = event.date.as_deref()?;
            Some((event, parse_instant(raw, &timezone)))
        })
        .collect::<Vec<_>>();
    dated.sort_by_key(|(_, at)| at.as_ref().map_or(0, DateTime::timestamp_millis));

    let cards = dated
        .into_iter()
        .map(|(event, at)| EventCard {
            title: event.title.clone().unwrap_or_else(|| "Event".to_string()),
            when: match at {
                Some(at) if at < *now => format!("Happened {}", short_date_time(&at)),
                Some(at) => format!("On {}", short_date_time(&at)),
                None => "Date: TBD".to_string(),
            },
            description: event
                .description
                .clone()
                .unwrap_or_else(|| "Details coming soon.".to_string()),
        })
        .collect();

    EventsListView {
        cards,
        empty_message: None,
    }
}

/// Running maintenance, then maintenance inside the lead window, then the
/// next season launch.
pub fn banner_view<Tz>(
    maintenance: Option<&MaintenanceContext<Tz>>,
    season: Option<&SeasonContext<'_, Tz>>,
    now: &DateTime<Tz>,
) -> BannerView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(context) = maintenance
        && (context.is_ongoing || context.time_until_ms <= BANNER_MAINTENANCE_LEAD_MS)
    {
        let text = if context.is_ongoing {
            format!("{} is currently in progress.", context.label)
        } else {
            format!("{} starts soon.", context.label)
        };
        return BannerView::Maintenance {
            badge: "Maintenance",
            text,
            countdown: countdown_text(&context.next_start, now, "in", "now!"),
            starts_at: iso(&context.next_start),
            ends_at: iso(&context.next_end),
            ongoing: context.is_ongoing,
        };
    }

    match season {
        Some(context) => BannerView::Season {
            badge: "Season Launch",
            text: season_title(context),
            countdown: countdown_text(&context.target, now, "in", "live now!"),
            starts_at: iso(&context.target),
        },
        None => BannerView::Hidden,
    }
}

fn season_title<Tz>(context: &SeasonContext<'_, Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{} starts at {}",
        context.season.name.as_deref().unwrap_or("Next Season"),
        short_date_time(&context.target)
    )
}
