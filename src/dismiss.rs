use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const KEY_PREFIX: &str = "cbhs_modal_dismiss_";

/// Key under which a modal is muted for one UTC calendar day.
pub fn dismiss_key(id: &str, day: NaiveDate) -> String {
    format!("{KEY_PREFIX}{id}_{}", day.format("%Y-%m-%d"))
}

pub fn dismissal_day<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    now.with_timezone(&Utc).date_naive()
}

/// "Don't show again today" flags for announcement modals.
#[derive(Debug, Default)]
pub struct DismissStore {
    path: Option<PathBuf>,
    entries: BTreeSet<(NaiveDate, String)>,
}

impl DismissStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A missing file is an empty store that will be created on first write.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path: Some(path.to_path_buf()),
                    entries: BTreeSet::new(),
                });
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("unable to read dismiss store {}", path.display()));
            }
        };

        let raw = serde_json::from_str::<DismissFile>(&content).map_err(|err| {
            let line = err.line();
            let column = err.column();
            anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
        })?;
        if raw.version != 1 {
            bail!(
                "unsupported dismiss store version {}; expected version 1",
                raw.version
            );
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries: raw
                .dismissed
                .into_iter()
                .map(|entry| (entry.day, entry.id))
                .collect(),
        })
    }

    pub fn is_dismissed(&self, id: &str, day: NaiveDate) -> bool {
        self.entries.contains(&(day, id.to_string()))
    }

    /// Records the dismissal, drops entries from earlier days, and persists.
    /// The store is unchanged when the write fails.
    pub fn dismiss(&mut self, id: &str, day: NaiveDate) -> Result<()> {
        let mut next = self.entries.clone();
        next.retain(|(entry_day, _)| *entry_day >= day);
        next.insert((day, id.to_string()));
        self.save(&next)?;
        self.entries = next;
        info!(id, %day, key = %dismiss_key(id, day), "modal dismissed for the day");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self, entries: &BTreeSet<(NaiveDate, String)>) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let dismissed = entries
            .iter()
            .map(|(day, id)| json!({ "id": id, "day": day.format("%Y-%m-%d").to_string() }))
            .collect::<Vec<_>>();
        let payload = json!({
            "version": 1,
            "dismissed": dismissed,
        });
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(path, format!("{text}\n"))
            .with_context(|| format!("unable to write dismiss store {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DismissFile {
    version: u32,
    #[serde(default)]
    dismissed: Vec<DismissEntryFile>,
}

#[derive(Debug, Deserialize)]
struct DismissEntryFile {
    id: String,
    day: NaiveDate,
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).expect("date")
    }

    #[test]
    fn key_combines_id_and_day() {
        assert_eq!(
            dismiss_key("restart", day(19)),
            "cbhs_modal_dismiss_restart_2026-10-19"
        );
    }

    #[test]
    fn dismissal_day_is_the_utc_date() {
        let central = chrono::FixedOffset::west_opt(5 * 3600).expect("offset");
        let late_evening = central
            .with_ymd_and_hms(2026, 10, 19, 21, 0, 0)
            .single()
            .expect("valid");
        assert_eq!(dismissal_day(&late_evening), day(20));
    }

    #[test]
    fn dismissal_only_lasts_for_its_day() {
        let mut store = DismissStore::in_memory();
        store.dismiss("restart", day(19)).expect("dismiss");
        assert!(store.is_dismissed("restart", day(19)));
        assert!(!store.is_dismissed("restart", day(20)));
        assert!(!store.is_dismissed("other", day(19)));
    }

    #[test]
    fn persists_and_prunes_earlier_days() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dismissed.json");

        let mut store = DismissStore::load(&path).expect("missing file is empty");
        assert!(store.is_empty());
        store.dismiss("restart", day(18)).expect("dismiss");
        store.dismiss("event", day(19)).expect("dismiss");
        assert_eq!(store.len(), 1);

        let reloaded = DismissStore::load(&path).expect("reload");
        assert!(reloaded.is_dismissed("event", day(19)));
        assert!(!reloaded.is_dismissed("restart", day(18)));
    }

    #[test]
    fn failed_write_leaves_modal_visible() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("dismissed.json");
        let mut store = DismissStore::load(&path).expect("missing file is empty");

        let err = store.dismiss("restart", day(19)).expect_err("parent dir is missing");
        assert!(err.to_string().contains("unable to write dismiss store"));
        assert!(!store.is_dismissed("restart", day(19)));
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dismissed.json");
        fs::write(&path, r#"{ "version": 2, "dismissed": [] }"#).expect("write");
        let err = DismissStore::load(&path).expect_err("version 2");
        assert!(err.to_string().contains("unsupported dismiss store version"));
    }
}
