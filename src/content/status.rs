use serde::{Deserialize, Serialize};

use crate::schedule::model::{lenient_flag, lenient_number, lenient_text, lenient_value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub players_online: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_players: Option<i64>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub snapshot: Option<StatusSnapshot>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub motd: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "lenient_text")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_players_joined: Option<i64>,
}

/// Cached response of the public Minecraft status API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveStatus {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub online: bool,
    #[serde(default, deserialize_with = "lenient_value")]
    pub players: Option<LivePlayers>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub motd: Option<LiveMotd>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LivePlayers {
    #[serde(default, deserialize_with = "lenient_number")]
    pub online: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveMotd {
    #[serde(default, deserialize_with = "lenient_text")]
    pub clean: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Online,
    Maintenance,
    Offline,
    Unknown,
}

impl ServerState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "online" => ServerState::Online,
            "maintenance" => ServerState::Maintenance,
            "offline" => ServerState::Offline,
            _ => ServerState::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServerState::Online => "online",
            ServerState::Maintenance => "under maintenance",
            ServerState::Offline => "offline",
            ServerState::Unknown => "unknown",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ServerState::Online => "Open",
            ServerState::Maintenance => "Maintenance",
            ServerState::Offline => "Closed",
            ServerState::Unknown => "Unknown",
        }
    }

    /// Unknown states are styled as offline.
    pub fn pill_class(self) -> &'static str {
        match self {
            ServerState::Online => "pill-status-online",
            ServerState::Maintenance => "pill-status-maintenance",
            ServerState::Offline | ServerState::Unknown => "pill-status-offline",
        }
    }

    pub fn dot_class(self) -> &'static str {
        match self {
            ServerState::Online => "dot-online",
            ServerState::Maintenance => "dot-maintenance",
            ServerState::Offline | ServerState::Unknown => "dot-offline",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub state: ServerState,
    pub label: String,
    pub tag: &'static str,
    pub pill_class: &'static str,
    pub dot_class: &'static str,
    pub player_count: String,
    pub season: Option<String>,
    pub total_players_joined: Option<i64>,
    pub motd: String,
}

pub fn status_view(document: &StatusDocument) -> StatusView {
    let state = ServerState::parse(document.status.as_deref().unwrap_or_default());
    let snapshot = document.snapshot.clone().unwrap_or_default();
    StatusView {
        state,
        label: document
            .label
            .clone()
            .unwrap_or_else(|| state.label().to_string()),
        tag: state.tag(),
        pill_class: state.pill_class(),
        dot_class: state.dot_class(),
        player_count: player_count_text(document.players_online, document.max_players)
            .unwrap_or_else(|| "-- / --".to_string()),
        season: snapshot.season,
        total_players_joined: snapshot.total_players_joined,
        motd: document.motd.clone().unwrap_or_default(),
    }
}

/// Shown when `status.json` could not be loaded.
pub fn unavailable_status_view() -> StatusView {
    let state = ServerState::Offline;
    StatusView {
        state,
        label: "status unavailable".to_string(),
        tag: state.tag(),
        pill_class: state.pill_class(),
        dot_class: state.dot_class(),
        player_count: "-- / --".to_string(),
        season: None,
        total_players_joined: None,
        motd: String::new(),
    }
}

/// Overlays a live ping on the configured status. A server marked for
/// maintenance keeps its state; counts and MOTD still update.
pub fn apply_live_status(view: &mut StatusView, live: &LiveStatus) {
    if let Some(motd) = live
        .motd
        .as_ref()
        .and_then(|motd| motd.clean.as_ref().or(motd.text.as_ref()).or(motd.raw.as_ref()))
    {
        view.motd = motd.clone();
    }

    let players = live.players.clone().unwrap_or_default();
    if let Some(count) = player_count_text(players.online, players.max) {
        view.player_count = count;
    }

    if view.state == ServerState::Maintenance {
        return;
    }
    let state = if live.online {
        ServerState::Online
    } else {
        ServerState::Offline
    };
    view.state = state;
    view.label = state.label().to_string();
    view.tag = state.tag();
    view.pill_class = state.pill_class();
    view.dot_class = state.dot_class();
}

fn player_count_text(online: Option<i64>, max: Option<i64>) -> Option<String> {
    match (online, max) {
        (Some(online), Some(max)) => Some(format!("{online} / {max}")),
        (Some(online), None) => Some(format!("{online} online")),
        _ => None,
    }
}
