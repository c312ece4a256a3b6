use chrono::{DateTime, Datelike, Local};
use tracing::warn;

use crate::content::announcements::{
    AnnouncementsDocument, AnnouncementsView, ModalEntry, announcements_view, modal_queue,
};
use crate::content::events::{EventsDocument, EventsPageView, events_page_view};
use crate::content::format::{SeasonTheme, season_theme};
use crate::content::players::{PlayersDocument, PlayersView, players_view};
use crate::content::rules::{RulesDocument, RulesView, rules_view};
use crate::content::status::{
    LiveStatus, StatusDocument, StatusView, apply_live_status, status_view,
    unavailable_status_view,
};
use crate::content::updates::{UpdatesDocument, UpdatesView, updates_view};
use crate::content::vote::{VoteDocument, VoteView, vote_view};
use crate::content::{ContentError, Resource, ResourceDir};
use crate::dismiss::DismissStore;

#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Local>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Local> {
        match self {
            Clock::System => Local::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Every page of the site, rebuilt from the resources directory on each call.
#[derive(Debug, Clone)]
pub struct Site {
    resources: ResourceDir,
    clock: Clock,
    timezone_label: String,
}

impl Site {
    pub fn new(resources: ResourceDir, clock: Clock, timezone_label: impl Into<String>) -> Self {
        Self {
            resources,
            clock,
            timezone_label: timezone_label.into(),
        }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn resources(&self) -> &ResourceDir {
        &self.resources
    }

    pub fn theme(&self) -> SeasonTheme {
        season_theme(self.now().month())
    }

    /// Never fails: a broken `status.json` renders as "status unavailable",
    /// and `live-status.json` is only merged when present and valid.
    pub fn status(&self) -> StatusView {
        let mut view = match self.resources.load::<StatusDocument>(Resource::Status) {
            Ok(document) => status_view(&document),
            Err(err) => {
                warn!(error = %err, "status resource unavailable");
                return unavailable_status_view();
            }
        };
        match self
            .resources
            .load_optional::<LiveStatus>(Resource::LiveStatus)
        {
            Ok(Some(live)) => apply_live_status(&mut view, &live),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring live status"),
        }
        view
    }

    pub fn rules(&self) -> Result<RulesView, ContentError> {
        let document = self.resources.load::<RulesDocument>(Resource::Rules)?;
        Ok(rules_view(&document))
    }

    pub fn announcements(&self) -> Result<AnnouncementsView, ContentError> {
        let document = self
            .resources
            .load::<AnnouncementsDocument>(Resource::Announcements)?;
        Ok(announcements_view(&document, &self.now()))
    }

    pub fn modal_queue(&self, dismissed: &DismissStore) -> Result<Vec<ModalEntry>, ContentError> {
        let document = self
            .resources
            .load::<AnnouncementsDocument>(Resource::Announcements)?;
        Ok(modal_queue(&document, &self.now(), dismissed))
    }

    pub fn updates(&self) -> Result<UpdatesView, ContentError> {
        let document = self.resources.load::<UpdatesDocument>(Resource::Updates)?;
        Ok(updates_view(&document, &self.now()))
    }

    pub fn vote(&self) -> Result<VoteView, ContentError> {
        let document = self.resources.load::<VoteDocument>(Resource::Vote)?;
        Ok(vote_view(&document))
    }

    pub fn players(&self, server: Option<&str>) -> Result<PlayersView, ContentError> {
        let document = self.resources.load::<PlayersDocument>(Resource::Players)?;
        Ok(players_view(&document, server))
    }

    pub fn events_document(&self) -> Result<EventsDocument, ContentError> {
        self.resources.load(Resource::Events)
    }

    pub fn events(&self) -> Result<EventsPageView, ContentError> {
        let document = self.events_document()?;
        Ok(self.events_view(&document, &self.now()))
    }

    /// Events page for a document the caller already loaded.
    pub fn events_view(&self, document: &EventsDocument, now: &DateTime<Local>) -> EventsPageView {
        events_page_view(document, now, &self.timezone_label)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::content::status::ServerState;

    fn pinned() -> Clock {
        Clock::Fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
                .single()
                .expect("valid")
                .with_timezone(&Local),
        )
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = pinned();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn status_falls_back_and_merges_live_ping() {
        let dir = tempdir().expect("tempdir");
        let site = Site::new(ResourceDir::new(dir.path()), pinned(), "UTC");
        assert_eq!(site.status().label, "status unavailable");

        fs::write(
            dir.path().join("status.json"),
            r#"{ "status": "offline", "playersOnline": 0, "maxPlayers": 20 }"#,
        )
        .expect("write status");
        fs::write(
            dir.path().join("live-status.json"),
            r#"{ "online": true, "players": { "online": 4, "max": 20 }, "motd": { "clean": "hi" } }"#,
        )
        .expect("write live status");

        let status = site.status();
        assert_eq!(status.state, ServerState::Online);
        assert_eq!(status.player_count, "4 / 20");
        assert_eq!(status.motd, "hi");

        fs::write(dir.path().join("live-status.json"), "{ broken").expect("write broken");
        assert_eq!(site.status().state, ServerState::Offline);
    }

    #[test]
    fn missing_resources_surface_content_errors() {
        let dir = tempdir().expect("tempdir");
        let site = Site::new(ResourceDir::new(dir.path()), pinned(), "UTC");
        assert!(matches!(site.rules(), Err(ContentError::Read { .. })));
        assert!(matches!(site.events(), Err(ContentError::Read { .. })));

        fs::write(dir.path().join("vote.json"), "[1,").expect("write vote");
        assert!(matches!(site.vote(), Err(ContentError::Parse { .. })));
    }

    #[test]
    fn theme_tracks_the_clock_month() {
        let dir = tempdir().expect("tempdir");
        let site = Site::new(ResourceDir::new(dir.path()), pinned(), "UTC");
        assert_eq!(site.theme().message, "falllll timeeee.");
    }
}
