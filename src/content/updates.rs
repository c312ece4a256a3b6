use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::content::format::short_date_time;
use crate::schedule::model::{lenient_text, lenient_value, parse_instant};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatesDocument {
    #[serde(default)]
    pub updates: Vec<UpdateEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub changes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatesView {
    pub cards: Vec<UpdateCard>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCard {
    pub version: Option<String>,
    pub date_label: String,
    pub title: String,
    pub summary: Option<String>,
    pub changes: Vec<String>,
}

/// Newest first.
pub fn updates_view<Tz>(document: &UpdatesDocument, now: &DateTime<Tz>) -> UpdatesView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if document.updates.is_empty() {
        return UpdatesView {
            cards: Vec::new(),
            empty_message: Some("No updates logged yet."),
        };
    }

    let timezone = now.timezone();
    let mut entries = document
        .updates
        .iter()
        .map(|entry| {
            let dated = entry
                .date
                .as_deref()
                .and_then(|raw| parse_instant(raw, &timezone));
            (entry, dated)
        })
        .collect::<Vec<_>>();
    entries.sort_by_key(|(_, dated)| {
        std::cmp::Reverse(dated.as_ref().map_or(0, DateTime::timestamp_millis))
    });

    UpdatesView {
        cards: entries
            .into_iter()
            .map(|(entry, dated)| UpdateCard {
                version: entry.version.clone(),
                date_label: dated.as_ref().map(short_date_time).unwrap_or_default(),
                title: entry.title.clone().unwrap_or_else(|| "Update".to_string()),
                summary: entry.summary.clone(),
                changes: entry.changes.clone().unwrap_or_default(),
            })
            .collect(),
        empty_message: None,
    }
}
