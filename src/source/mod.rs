//! Participant sources.
//!
//! Defines the `ParticipantSource` trait and a file-backed roster
//! implementation. Sources hand the balancer the players selected for the
//! current game; the balancer itself never fetches anything.

pub mod roster;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Participant;

/// Abstraction over wherever player scores come from.
#[async_trait]
pub trait ParticipantSource: Send + Sync {
    /// Fetch the participants selected for this game.
    async fn fetch_participants(&self) -> Result<Vec<Participant>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}
