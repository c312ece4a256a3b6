use std::cmp::Ordering;
use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::content::format::{iso, short_date_time, weekly_label};
use crate::dismiss::{DismissStore, dismiss_key, dismissal_day};
use crate::schedule::model::{
    OneTimeWindow, WeeklyRecurrence, WindowSpec, lenient_flag, lenient_text, lenient_value,
    parse_instant,
};
use crate::schedule::scheduler::announcement_window_context;

const EMPTY_MESSAGE: &str = "No announcements right now. Check back later!";
const DEFAULT_TITLE: &str = "Announcement";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementsDocument {
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub show_on_home_modal: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub modal_from: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub modal_until: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub weekly: Option<WeeklyRecurrence>,
}

impl Announcement {
    /// Weekly items remind ahead of their next occurrence; everything else
    /// uses the explicit modal window, falling back to the item's date.
    pub fn window_spec(&self) -> WindowSpec {
        match &self.weekly {
            Some(weekly) => WindowSpec::Weekly(weekly.clone()),
            None => WindowSpec::OneTime(OneTimeWindow {
                from: self.modal_from.clone().or_else(|| self.date.clone()),
                until: self.modal_until.clone(),
                date: self.date.clone(),
            }),
        }
    }

    pub fn modal_id(&self) -> &str {
        self.id.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementsView {
    pub cards: Vec<AnnouncementCard>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementCard {
    pub id: Option<String>,
    pub pinned: bool,
    pub date_label: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModalEntry {
    pub id: String,
    pub pinned: bool,
    pub badge: &'static str,
    pub title: String,
    pub body: String,
    pub meta: String,
    pub event_at: Option<String>,
    pub dismiss_key: String,
}

/// Pinned first, then newest first. Undated items sort as the epoch.
pub fn announcements_view<Tz>(document: &AnnouncementsDocument, now: &DateTime<Tz>) -> AnnouncementsView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if document.announcements.is_empty() {
        return AnnouncementsView {
            cards: Vec::new(),
            empty_message: Some(EMPTY_MESSAGE),
        };
    }

    let timezone = now.timezone();
    let mut items = document
        .announcements
        .iter()
        .map(|item| {
            let dated = item
                .date
                .as_deref()
                .and_then(|raw| parse_instant(raw, &timezone));
            (item, dated)
        })
        .collect::<Vec<_>>();
    items.sort_by(|(a, a_date), (b, b_date)| {
        pinned_first(a.pinned, b.pinned).then_with(|| millis_or_zero(b_date).cmp(&millis_or_zero(a_date)))
    });

    let cards = items
        .into_iter()
        .map(|(item, dated)| AnnouncementCard {
            id: item.id.clone(),
            pinned: item.pinned,
            date_label: match (&item.weekly, dated) {
                (Some(weekly), _) => weekly_label(weekly),
                (None, Some(dated)) => short_date_time(&dated),
                (None, None) => String::new(),
            },
            title: item.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            summary: item.summary.clone(),
            body: item.body.clone(),
        })
        .collect();

    AnnouncementsView {
        cards,
        empty_message: None,
    }
}

/// Home-page modals due right now and not muted for today, pinned first,
/// then soonest event first.
pub fn modal_queue<Tz>(
    document: &AnnouncementsDocument,
    now: &DateTime<Tz>,
    dismissed: &DismissStore,
) -> Vec<ModalEntry>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let today = dismissal_day(now);
    let mut due = document
        .announcements
        .iter()
        .filter(|item| item.show_on_home_modal)
        .filter_map(|item| {
            let context = announcement_window_context(&item.window_spec(), now);
            context.in_window.then_some((item, context.event_at))
        })
        .filter(|(item, _)| !dismissed.is_dismissed(item.modal_id(), today))
        .collect::<Vec<_>>();

    due.sort_by(|(a, a_event), (b, b_event)| {
        pinned_first(a.pinned, b.pinned)
            .then_with(|| millis_or_zero(a_event).cmp(&millis_or_zero(b_event)))
    });

    due.into_iter()
        .map(|(item, event_at)| ModalEntry {
            id: item.modal_id().to_string(),
            pinned: item.pinned,
            badge: if item.level.as_deref() == Some("warning") {
                "Maintenance"
            } else {
                "Announcement"
            },
            title: item.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: item
                .body
                .clone()
                .or_else(|| item.summary.clone())
                .unwrap_or_default(),
            meta: event_at
                .as_ref()
                .map(|at| format!("When: {}", short_date_time(at)))
                .unwrap_or_default(),
            event_at: event_at.as_ref().map(iso),
            dismiss_key: dismiss_key(item.modal_id(), today),
        })
        .collect()
}

fn pinned_first(a: bool, b: bool) -> Ordering {
    b.cmp(&a)
}

fn millis_or_zero<Tz: TimeZone>(at: &Option<DateTime<Tz>>) -> i64 {
    at.as_ref().map_or(0, DateTime::timestamp_millis)
}
