pub mod announcements;
pub mod events;
pub mod format;
pub mod players;
pub mod rules;
pub mod status;
pub mod updates;
pub mod vote;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {} at line {line}, column {column}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        source: serde_json::Error,
    },
}

/// The static JSON documents the site is driven by.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resource {
    Status,
    Rules,
    Announcements,
    Updates,
    Vote,
    Players,
    Events,
    LiveStatus,
}

impl Resource {
    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Status => "status.json",
            Resource::Rules => "rules.json",
            Resource::Announcements => "announcements.json",
            Resource::Updates => "updates.json",
            Resource::Vote => "vote.json",
            Resource::Players => "players.json",
            Resource::Events => "events.json",
            Resource::LiveStatus => "live-status.json",
        }
    }

    /// Fallback shown in place of a section whose resource failed to load.
    pub fn unavailable_message(self) -> &'static str {
        match self {
            Resource::Status | Resource::LiveStatus => "status unavailable",
            Resource::Rules => {
                "Could not load rules. Please try again later or contact a staff member."
            }
            Resource::Announcements => "Could not load announcements. Please try again later.",
            Resource::Updates => "Could not load updates. Please try again later.",
            Resource::Vote => "Could not load voting info. Please try again later.",
            Resource::Players => "Could not load players list. Please try again later.",
            Resource::Events => "Could not load events. Please try again later.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDir {
    root: PathBuf,
}

impl ResourceDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, resource: Resource) -> PathBuf {
        self.root.join(resource.file_name())
    }

    /// Reads and parses the resource fresh from disk on every call.
    pub fn load<T: DeserializeOwned>(&self, resource: Resource) -> Result<T, ContentError> {
        let path = self.path_of(resource);
        let content = fs::read_to_string(&path).map_err(|source| ContentError::Read {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "loaded resource");
        parse_document(&path, &content)
    }

    /// Like [`ResourceDir::load`], but a missing file is `Ok(None)`.
    pub fn load_optional<T: DeserializeOwned>(
        &self,
        resource: Resource,
    ) -> Result<Option<T>, ContentError> {
        match self.load(resource) {
            Ok(document) => Ok(Some(document)),
            Err(ContentError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

pub fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ContentError> {
    serde_json::from_str::<T>(content).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        line: source.line(),
        column: source.column(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct NamedDoc {
        name: String,
    }

    #[test]
    fn loads_resource_from_directory() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("rules.json"), r#"{ "name": "rules" }"#).expect("write");
        let resources = ResourceDir::new(dir.path());
        let doc: NamedDoc = resources.load(Resource::Rules).expect("load");
        assert_eq!(doc.name, "rules");
    }

    #[test]
    fn parse_error_reports_line_and_column() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("vote.json"), "{\n  \"name\": ,\n}").expect("write");
        let resources = ResourceDir::new(dir.path());
        let err = resources
            .load::<NamedDoc>(Resource::Vote)
            .expect_err("invalid json");
        let message = err.to_string();
        assert!(message.contains("invalid JSON"), "{message}");
        assert!(message.contains("line 2"), "{message}");
    }

    #[test]
    fn optional_resource_may_be_missing() {
        let dir = tempdir().expect("tempdir");
        let resources = ResourceDir::new(dir.path());
        let missing = resources
            .load_optional::<NamedDoc>(Resource::LiveStatus)
            .expect("missing is fine");
        assert!(missing.is_none());
        assert!(matches!(
            resources.load::<NamedDoc>(Resource::Players),
            Err(ContentError::Read { .. })
        ));
    }
}
