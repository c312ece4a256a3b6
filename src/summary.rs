use std::fmt::Write as _;
use std::io::Write as _;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::content::Resource;
use crate::content::events::{BannerView, EventsDocument, SeasonCountdownView};
use crate::content::format::short_date_time;
use crate::dismiss::DismissStore;
use crate::schedule::countdown::CountdownRegistry;
use crate::schedule::scheduler::{maintenance_context, next_season_context};
use crate::site::Site;

const SEASON_KEY: &str = "season";
const MAINTENANCE_KEY: &str = "maintenance";

/// Plain-text digest of what the home and events pages would show.
pub fn render_summary(site: &Site, dismissed: &DismissStore) -> Result<String> {
    let now = site.now();
    let mut out = String::new();

    let theme = site.theme();
    writeln!(out, "{} {}", theme.emoji, theme.message)?;
    writeln!(out, "Now: {}", short_date_time(&now))?;

    let status = site.status();
    writeln!(out, "Status: {} [{}] {}", status.label, status.tag, status.player_count)?;
    if !status.motd.is_empty() {
        writeln!(out, "MOTD: {}", status.motd)?;
    }

    match site.events_document() {
        Ok(document) => {
            let events = site.events_view(&document, &now);
            match events.banner {
                BannerView::Hidden => writeln!(out, "Banner: none")?,
                BannerView::Maintenance {
                    badge,
                    text,
                    countdown,
                    ..
                }
                | BannerView::Season {
                    badge,
                    text,
                    countdown,
                    ..
                } => writeln!(out, "Banner: [{badge}] {text} ({countdown})")?,
            }
            match events.season_countdown {
                SeasonCountdownView::Scheduled {
                    title, countdown, ..
                } => writeln!(out, "Season: {title} ({countdown})")?,
                SeasonCountdownView::Empty { message } => writeln!(out, "Season: {message}")?,
            }
            writeln!(out, "Maintenance: {}", events.maintenance_summary)?;
            if let Some(context) = document
                .maintenance
                .as_ref()
                .and_then(|spec| maintenance_context(spec, &now))
            {
                let state = if context.is_ongoing { "in progress" } else { "next" };
                writeln!(
                    out,
                    "Maintenance window: {state} {} to {}",
                    short_date_time(&context.next_start),
                    short_date_time(&context.next_end)
                )?;
            }
        }
        Err(err) => {
            warn!(error = %err, "events unavailable for summary");
            writeln!(out, "Events: {}", Resource::Events.unavailable_message())?;
        }
    }

    match site.modal_queue(dismissed) {
        Ok(queue) if queue.is_empty() => writeln!(out, "Modals: none")?,
        Ok(queue) => {
            writeln!(out, "Modals:")?;
            for entry in queue {
                let pin = if entry.pinned { " (pinned)" } else { "" };
                write!(out, "  - [{}] {}{pin}", entry.badge, entry.title)?;
                if !entry.meta.is_empty() {
                    write!(out, " | {}", entry.meta)?;
                }
                writeln!(out)?;
            }
        }
        Err(err) => {
            warn!(error = %err, "announcements unavailable for summary");
            writeln!(out, "Modals: {}", Resource::Announcements.unavailable_message())?;
        }
    }

    Ok(out)
}

/// Prints the season and maintenance countdowns once a second until both
/// have reached their targets. Time advances from the site clock's instant.
///
/// `events.json` is re-read on every tick, see [`resync_countdowns`].
pub fn follow_countdowns(site: &Site) -> Result<()> {
    let document = site
        .events_document()
        .with_context(|| format!("failed to load {}", Resource::Events.file_name()))?;
    let start = site.now();

    let mut registry = CountdownRegistry::new();
    for (key, target) in countdown_targets(&document, &start) {
        if let Some(target) = target {
            let (prefix, done_text) = countdown_texts(key);
            registry.start(key, &target, prefix, done_text);
        }
    }
    if registry.is_empty() {
        info!("nothing to count down");
        return Ok(());
    }
    info!(countdowns = registry.len(), "following countdowns");

    let started = Instant::now();
    let stdout = std::io::stdout();
    loop {
        let elapsed = chrono::Duration::from_std(started.elapsed())
            .context("elapsed time out of range")?;
        let now = start + elapsed;

        match site.events_document() {
            Ok(document) => resync_countdowns(&mut registry, &document, &now),
            Err(err) => warn!(error = %err, "keeping previous countdowns"),
        }

        let mut handle = stdout.lock();
        for update in registry.tick(&now) {
            writeln!(handle, "{}: {}", update.key, update.text)?;
            if update.finished {
                info!(key = %update.key, "countdown reached its target");
            }
        }
        handle.flush()?;
        drop(handle);

        if registry.is_empty() {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(1));
    }
}

/// Restarts a running countdown whose target moved and cancels one whose
/// entry disappeared. Countdowns that already reached their target are left
/// for the next tick to report as done; finished ones are never re-added.
fn resync_countdowns(
    registry: &mut CountdownRegistry,
    document: &EventsDocument,
    now: &DateTime<Local>,
) {
    for (key, target) in countdown_targets(document, now) {
        let Some(running) = registry.target(key) else {
            continue;
        };
        if running.timestamp_millis() <= now.timestamp_millis() {
            continue;
        }
        match target {
            Some(target) if target.timestamp_millis() != running.timestamp_millis() => {
                info!(key, %target, "countdown target moved");
                let (prefix, done_text) = countdown_texts(key);
                registry.start(key, &target, prefix, done_text);
            }
            Some(_) => {}
            None => {
                info!(key, "countdown target removed");
                registry.cancel(key);
            }
        }
    }
}

fn countdown_targets(
    document: &EventsDocument,
    now: &DateTime<Local>,
) -> [(&'static str, Option<DateTime<Local>>); 2] {
    let season = next_season_context(&document.seasons, now).map(|context| context.target);
    let maintenance = document
        .maintenance
        .as_ref()
        .and_then(|spec| maintenance_context(spec, now))
        .filter(|context| !context.is_ongoing)
        .map(|context| context.next_start);
    [(SEASON_KEY, season), (MAINTENANCE_KEY, maintenance)]
}

fn countdown_texts(key: &str) -> (&'static str, &'static str) {
    if key == SEASON_KEY {
        ("starts in", "live now!")
    } else {
        ("in", "now!")
    }
}
