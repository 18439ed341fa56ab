//! Mock participant source for integration testing.
//!
//! Returns a fixed, controllable player list entirely in memory and counts
//! how often it was asked.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use teambalance::source::ParticipantSource;
use teambalance::types::Participant;

pub struct MockSource {
    name: String,
    players: Vec<Participant>,
    fetches: Arc<Mutex<usize>>,
    /// If set, every fetch returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    pub fn new(name: &str, players: Vec<Participant>) -> Self {
        Self {
            name: name.to_string(),
            players,
            fetches: Arc::new(Mutex::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// The usual Saturday lobby.
    pub fn lobby() -> Self {
        Self::new(
            "mock-lobby",
            vec![
                Participant::new("wilko", "Wilko", 1210),
                Participant::new("jo", "Jo", 1105),
                Participant::new("sam", "Sam", 980),
                Participant::new("kit", "Kit", 1340),
                Participant::new("ray", "Ray", 890),
                Participant::new("lu", "Lu", 1015),
            ],
        )
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl ParticipantSource for MockSource {
    async fn fetch_participants(&self) -> Result<Vec<Participant>> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(self.players.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
