//! Roster file source.
//!
//! Reads players and their scores from a TOML or JSON file and returns the
//! ones marked present for this game:
//!
//! ```toml
//! [[players]]
//! id = "wilko"
//! name = "Wilko"
//! score = 1210
//!
//! [[players]]
//! id = "sam"
//! score = 980
//! present = false
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::ParticipantSource;
use crate::types::Participant;

#[derive(Debug, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    pub score: i64,
    /// Whether the player is in this game.
    #[serde(default = "default_present")]
    pub present: bool,
}

fn default_present() -> bool {
    true
}

impl Roster {
    /// Parse roster text. JSON when `json` is set, TOML otherwise.
    pub fn parse(contents: &str, json: bool) -> Result<Self> {
        if json {
            serde_json::from_str(contents).context("Invalid JSON roster")
        } else {
            toml::from_str(contents).context("Invalid TOML roster")
        }
    }

    /// Participants marked present, in file order.
    pub fn present(&self) -> Vec<Participant> {
        self.players
            .iter()
            .filter(|e| e.present)
            .map(|e| {
                let name = e.name.clone().unwrap_or_else(|| e.id.clone());
                Participant::new(e.id.clone(), name, e.score)
            })
            .collect()
    }
}

/// Roster stored on the local filesystem.
pub struct RosterFile {
    path: PathBuf,
}

impl RosterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

#[async_trait]
impl ParticipantSource for RosterFile {
    async fn fetch_participants(&self) -> Result<Vec<Participant>> {
        let path = self.path.display().to_string();
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read roster: {path}"))?;

        let roster = Roster::parse(&contents, self.is_json())
            .with_context(|| format!("Failed to parse roster: {path}"))?;

        let present = roster.present();
        debug!(%path, listed = roster.players.len(), present = present.len(), "Roster parsed");

        if present.is_empty() {
            bail!("No players selected in roster {path}");
        }

        info!(%path, players = present.len(), "Roster loaded");
        Ok(present)
    }

    fn name(&self) -> &str {
        "roster-file"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(ext: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("teambalance_roster_{}.{ext}", uuid::Uuid::new_v4()));
        p
    }

    const TOML_ROSTER: &str = r#"
[[players]]
id = "wilko"
name = "Wilko"
score = 1210

[[players]]
id = "sam"
score = 980
present = false

[[players]]
id = "jo"
score = 1105
"#;

    #[test]
    fn test_parse_toml_defaults() {
        let roster = Roster::parse(TOML_ROSTER, false).unwrap();
        assert_eq!(roster.players.len(), 3);
        assert!(roster.players[1].name.is_none());
        assert!(roster.players[2].present);
    }

    #[test]
    fn test_present_filters_and_names() {
        let roster = Roster::parse(TOML_ROSTER, false).unwrap();
        let present = roster.present();
        assert_eq!(present.len(), 2);
        assert_eq!(present[0].display_name, "Wilko");
        assert_eq!(present[1].id, "jo");
        assert_eq!(present[1].display_name, "jo");
        assert_eq!(present[1].score, 1105);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"players": [{"id": "a", "score": 5}, {"id": "b", "name": "Bee", "score": 7, "present": true}]}"#;
        let roster = Roster::parse(json, true).unwrap();
        let present = roster.present();
        assert_eq!(present.len(), 2);
        assert_eq!(present[1].display_name, "Bee");
    }

    #[test]
    fn test_missing_score_rejected() {
        let toml = "[[players]]\nid = \"a\"\n";
        assert!(Roster::parse(toml, false).is_err());
    }

    #[tokio::test]
    async fn test_roster_file_roundtrip() {
        let path = temp_path("toml");
        std::fs::write(&path, TOML_ROSTER).unwrap();

        let source = RosterFile::new(&path);
        let players = source.fetch_participants().await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(source.name(), "roster-file");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_roster_file_json_by_extension() {
        let path = temp_path("JSON");
        std::fs::write(&path, r#"{"players": [{"id": "a", "score": 1}]}"#).unwrap();

        let players = RosterFile::new(&path).fetch_participants().await.unwrap();
        assert_eq!(players[0].id, "a");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_nobody_present_is_an_error() {
        let path = temp_path("toml");
        std::fs::write(&path, "[[players]]\nid = \"a\"\nscore = 1\npresent = false\n").unwrap();

        let err = RosterFile::new(&path).fetch_participants().await.unwrap_err();
        assert!(format!("{err}").contains("No players selected"));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let err = RosterFile::new(temp_path("toml")).fetch_participants().await.unwrap_err();
        assert!(format!("{err}").contains("Failed to read roster"));
    }
}
