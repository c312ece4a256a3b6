use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// `"{prefix} {d}d {hh}h {mm}m {ss}s"` until `target`, `done_text` afterwards.
pub fn countdown_text<Tz: TimeZone, Tz2: TimeZone>(
    target: &DateTime<Tz>,
    now: &DateTime<Tz2>,
    prefix: &str,
    done_text: &str,
) -> String {
    format_remaining(
        target.timestamp_millis() - now.timestamp_millis(),
        prefix,
        done_text,
    )
}

fn format_remaining(diff_ms: i64, prefix: &str, done_text: &str) -> String {
    if diff_ms <= 0 {
        return done_text.to_string();
    }

    let total_seconds = diff_ms / 1000;
    let days = total_seconds / SECONDS_PER_DAY;
    let hours = (total_seconds % SECONDS_PER_DAY) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    parts.push(format!("{hours:02}h"));
    parts.push(format!("{minutes:02}m"));
    parts.push(format!("{seconds:02}s"));

    let body = parts.join(" ");
    if prefix.is_empty() {
        body
    } else {
        format!("{prefix} {body}")
    }
}

#[derive(Debug, Clone)]
struct CountdownTask {
    target: DateTime<Utc>,
    prefix: String,
    done_text: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CountdownUpdate {
    pub key: String,
    pub text: String,
    pub finished: bool,
}

/// Repeating countdowns keyed by the display slot they write to. A task is
/// dropped on the tick that reaches its target, or when cancelled.
#[derive(Debug, Default)]
pub struct CountdownRegistry {
    tasks: BTreeMap<String, CountdownTask>,
}

impl CountdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any countdown already running under `key`.
    pub fn start<Tz: TimeZone>(
        &mut self,
        key: impl Into<String>,
        target: &DateTime<Tz>,
        prefix: &str,
        done_text: &str,
    ) {
        self.tasks.insert(
            key.into(),
            CountdownTask {
                target: target.with_timezone(&Utc),
                prefix: prefix.to_string(),
                done_text: done_text.to_string(),
            },
        );
    }

    pub fn target(&self, key: &str) -> Option<DateTime<Utc>> {
        self.tasks.get(key).map(|task| task.target)
    }

    pub fn cancel(&mut self, key: &str) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<CountdownUpdate> {
        let now_ms = now.timestamp_millis();
        let mut updates = Vec::with_capacity(self.tasks.len());
        self.tasks.retain(|key, task| {
            let diff_ms = task.target.timestamp_millis() - now_ms;
            let finished = diff_ms <= 0;
            updates.push(CountdownUpdate {
                key: key.clone(),
                text: format_remaining(diff_ms, &task.prefix, &task.done_text),
                finished,
            });
            !finished
        });
        updates
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
