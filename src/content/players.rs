use serde::{Deserialize, Serialize};

use crate::schedule::model::{lenient_flag, lenient_text, lenient_value};

pub const ALL_SERVERS: &str = "all";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayersDocument {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    #[serde(default)]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pronouns: Option<String>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub servers: Option<ServerList>,
}

/// A player's membership, written either as one id or a list of ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerList {
    One(String),
    Many(Vec<String>),
}

impl ServerList {
    pub fn contains(&self, server_id: &str) -> bool {
        match self {
            ServerList::One(id) => id == server_id,
            ServerList::Many(ids) => ids.iter().any(|id| id == server_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayersView {
    pub active_server_id: String,
    pub options: Vec<ServerOption>,
    pub players: Vec<PlayerCard>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerOption {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerCard {
    pub display_name: String,
    pub handle: String,
    pub pronouns: Option<String>,
    pub avatar_url: String,
    pub avatar_alt: String,
}

/// Roster filtered to `requested`, else the default server, else the first
/// listed server, else everyone.
pub fn players_view(document: &PlayersDocument, requested: Option<&str>) -> PlayersView {
    let active_server_id = requested
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            document
                .servers
                .iter()
                .find(|server| server.default)
                .and_then(|server| server.id.clone())
        })
        .or_else(|| document.servers.first().and_then(|server| server.id.clone()))
        .unwrap_or_else(|| ALL_SERVERS.to_string());

    let mut options = vec![ServerOption {
        id: ALL_SERVERS.to_string(),
        name: "All Servers".to_string(),
        active: active_server_id == ALL_SERVERS,
    }];
    options.extend(document.servers.iter().filter_map(|server| {
        let id = server.id.clone()?;
        Some(ServerOption {
            name: server.name.clone().unwrap_or_else(|| id.clone()),
            active: id == active_server_id,
            id,
        })
    }));

    let players = document
        .players
        .iter()
        .filter(|player| {
            active_server_id == ALL_SERVERS
                || player
                    .servers
                    .as_ref()
                    .is_some_and(|servers| servers.contains(&active_server_id))
        })
        .filter_map(player_card)
        .collect::<Vec<_>>();

    PlayersView {
        empty_message: players
            .is_empty()
            .then_some("No players found for this server yet."),
        active_server_id,
        options,
        players,
    }
}

fn player_card(player: &Player) -> Option<PlayerCard> {
    let username = player.username.as_deref()?;
    Some(PlayerCard {
        display_name: player
            .first_name
            .clone()
            .unwrap_or_else(|| username.to_string()),
        handle: format!("@{username}"),
        pronouns: player.pronouns.clone(),
        avatar_url: format!(
            "https://mc-heads.net/avatar/{}/48",
            urlencoding::encode(username)
        ),
        avatar_alt: format!("Head of {username}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
  "servers": [
    { "id": "smp", "name": "Survival" },
    { "id": "creative", "name": "Creative", "default": true }
  ],
  "players": [
    { "username": "Steve", "firstName": "Sam", "servers": ["smp", "creative"], "pronouns": "he/him" },
    { "username": "Alex_01", "servers": "smp" },
    { "username": "Build er", "servers": ["creative"] },
    { "firstName": "Nobody" }
  ]
}"#;

    fn document() -> PlayersDocument {
        serde_json::from_str(DOCUMENT).expect("players json")
    }

    #[test]
    fn default_server_is_selected_first() {
        let view = players_view(&document(), None);
        assert_eq!(view.active_server_id, "creative");
        let names = view
            .players
            .iter()
            .map(|card| card.display_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Sam", "Build er"]);
        assert!(view.options.iter().any(|option| option.id == "creative" && option.active));
        assert!(!view.options[0].active);
    }

    #[test]
    fn requested_server_filters_single_and_list_membership() {
        let view = players_view(&document(), Some("smp"));
        let handles = view
            .players
            .iter()
            .map(|card| card.handle.as_str())
            .collect::<Vec<_>>();
        assert_eq!(handles, ["@Steve", "@Alex_01"]);
    }

    #[test]
    fn all_servers_lists_everyone_with_a_username() {
        let view = players_view(&document(), Some(ALL_SERVERS));
        assert_eq!(view.players.len(), 3);
        assert_eq!(
            view.players[2].avatar_url,
            "https://mc-heads.net/avatar/Build%20er/48"
        );
        assert_eq!(view.players[0].avatar_alt, "Head of Steve");
        assert_eq!(view.players[0].pronouns.as_deref(), Some("he/him"));
    }

    #[test]
    fn unknown_server_yields_empty_message() {
        let view = players_view(&document(), Some("minigames"));
        assert!(view.players.is_empty());
        assert_eq!(
            view.empty_message,
            Some("No players found for this server yet.")
        );
    }

    #[test]
    fn no_servers_means_everyone() {
        let document: PlayersDocument =
            serde_json::from_str(r#"{ "players": [ { "username": "Solo" } ] }"#).expect("json");
        let view = players_view(&document, None);
        assert_eq!(view.active_server_id, ALL_SERVERS);
        assert_eq!(view.options.len(), 1);
        assert_eq!(view.players.len(), 1);
    }
}
