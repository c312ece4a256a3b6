use serde::{Deserialize, Serialize};

use crate::schedule::model::{lenient_flag, lenient_number, lenient_text};

const DEFAULT_TITLE: &str = "CBHS Minecraft Server Voting";
const DEFAULT_DESCRIPTION: &str =
    "Use these polls to vote on events, features, and other server decisions.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteDocument {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub polls: Vec<Poll>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub open: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub form_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub auto_redirect_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteView {
    pub title: String,
    pub description: String,
    pub polls: Vec<PollCard>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollCard {
    pub title: String,
    pub open: bool,
    pub status_text: &'static str,
    pub description: Option<String>,
    pub form_url: Option<String>,
    pub button_enabled: bool,
    pub note: String,
    /// Set only for the poll the page should redirect to on its own.
    pub auto_redirect_seconds: Option<i64>,
}

pub fn vote_view(document: &VoteDocument) -> VoteView {
    let title = document
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = document
        .description
        .clone()
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    if document.polls.is_empty() {
        return VoteView {
            title,
            description,
            polls: Vec::new(),
            note: "No available polls right now. Check back later.".to_string(),
        };
    }

    let mut open_count = 0;
    let mut polls = Vec::with_capacity(document.polls.len());
    for (index, poll) in document.polls.iter().enumerate() {
        if poll.open {
            open_count += 1;
        }
        let form_url = poll.form_url.clone().filter(|url| url != "#");
        let auto_seconds = poll.auto_redirect_seconds.unwrap_or(0);
        let redirects =
            poll.open && auto_seconds > 0 && form_url.is_some() && open_count == 1 && index == 0;

        let note = if redirects {
            format!("You will be redirected in about {auto_seconds} seconds…")
        } else if !poll.open {
            "This poll is closed.".to_string()
        } else {
            String::new()
        };

        polls.push(PollCard {
            title: poll
                .label
                .clone()
                .unwrap_or_else(|| format!("Poll {}", index + 1)),
            open: poll.open,
            status_text: if poll.open { "Open" } else { "Closed" },
            description: poll.description.clone(),
            button_enabled: poll.open && form_url.is_some(),
            form_url,
            note,
            auto_redirect_seconds: redirects.then_some(auto_seconds),
        });
    }

    let note = if open_count == 0 {
        "No available polls right now. All polls are currently closed.".to_string()
    } else {
        String::new()
    };

    VoteView {
        title,
        description,
        polls,
        note,
    }
}
