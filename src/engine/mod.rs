//! Balancer engine: fair partitioning of participants into teams.
//!
//! `compute_balanced_partitions` is the whole public contract: validate the
//! request, search every partition into exactly `num_teams` non-empty teams,
//! and return the `top_k` best by `(unfairness, canonical key)`.
//!
//! The search is exhaustive, so the participant count is capped by
//! `BalancerLimits::max_participants` and checked up front.

pub mod cancel;
mod search;

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::types::{score_in_range, BalanceError, Match, Participant, MAX_ABS_SCORE};
pub use cancel::CancelToken;

/// Default participant cap. S(12, k) stays well under a second for any k.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 12;

/// Hard ceiling for `max_participants`, whatever the configuration says.
pub const MAX_PARTICIPANTS_CEILING: usize = 16;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BalancerLimits {
    /// Largest participant set accepted by `balance`.
    pub max_participants: usize,
}

impl Default for BalancerLimits {
    fn default() -> Self {
        Self {
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Balancer
// ---------------------------------------------------------------------------

/// Stateless balancer. Cheap to clone and safe to share between threads.
#[derive(Debug, Clone, Default)]
pub struct Balancer {
    limits: BalancerLimits,
}

impl Balancer {
    pub fn new(limits: BalancerLimits) -> Self {
        let mut limits = limits;
        if limits.max_participants > MAX_PARTICIPANTS_CEILING {
            warn!(
                requested = limits.max_participants,
                ceiling = MAX_PARTICIPANTS_CEILING,
                "max_participants above ceiling, clamping"
            );
            limits.max_participants = MAX_PARTICIPANTS_CEILING;
        }
        Self { limits }
    }

    pub fn limits(&self) -> &BalancerLimits {
        &self.limits
    }

    /// Rank the `top_k` fairest partitions of `participants` into
    /// `num_teams` teams.
    ///
    /// Returns fewer than `top_k` matches when fewer distinct partitions
    /// exist. Fails without a partial result on invalid input, an invalid
    /// request, or cancellation.
    pub fn balance(
        &self,
        participants: &[Participant],
        num_teams: usize,
        top_k: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Match>, BalanceError> {
        self.validate(participants, num_teams, top_k)?;

        let mut sorted = participants.to_vec();
        sorted.sort();

        debug!(
            participants = sorted.len(),
            num_teams,
            search_space = %partition_count(sorted.len(), num_teams),
            "Starting partition search"
        );

        let started = Instant::now();
        let outcome = match search::search(&sorted, num_teams, top_k, cancel) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Partition search aborted");
                return Err(e);
            }
        };

        info!(
            participants = sorted.len(),
            num_teams,
            top_k,
            explored = outcome.explored,
            returned = outcome.matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Balancing complete"
        );

        Ok(outcome.matches)
    }

    fn validate(&self, participants: &[Participant], num_teams: usize, top_k: usize) -> Result<(), BalanceError> {
        if participants.is_empty() {
            return Err(BalanceError::InvalidInput("participant set is empty".into()));
        }

        let mut ids = HashSet::with_capacity(participants.len());
        for p in participants {
            if p.id.trim().is_empty() {
                return Err(BalanceError::InvalidInput("participant id must not be empty".into()));
            }
            if !score_in_range(p.score) {
                return Err(BalanceError::InvalidInput(format!(
                    "score {} of '{}' exceeds ±{MAX_ABS_SCORE}",
                    p.score, p.id
                )));
            }
            if !ids.insert(p.id.as_str()) {
                return Err(BalanceError::InvalidInput(format!("duplicate participant id '{}'", p.id)));
            }
        }

        if num_teams < 2 {
            return Err(BalanceError::InvalidPartitionRequest(format!(
                "num_teams must be at least 2, got {num_teams}"
            )));
        }
        if num_teams > participants.len() {
            return Err(BalanceError::InvalidPartitionRequest(format!(
                "num_teams ({num_teams}) exceeds participant count ({})",
                participants.len()
            )));
        }
        if top_k < 1 {
            return Err(BalanceError::InvalidPartitionRequest("top_k must be at least 1".into()));
        }
        if participants.len() > self.limits.max_participants {
            return Err(BalanceError::InvalidPartitionRequest(format!(
                "{} participants exceeds the limit of {}",
                participants.len(),
                self.limits.max_participants
            )));
        }
        Ok(())
    }
}

/// Rank the `top_k` fairest partitions with default limits and no
/// cancellation.
pub fn compute_balanced_partitions(
    participants: &[Participant],
    num_teams: usize,
    top_k: usize,
) -> Result<Vec<Match>, BalanceError> {
    Balancer::default().balance(participants, num_teams, top_k, &CancelToken::new())
}

/// Number of ways to split `n` participants into `k` non-empty unordered
/// teams (Stirling number of the second kind).
pub fn partition_count(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    // row[j] = S(i, j)
    let mut row = vec![0u128; k + 1];
    row[0] = 1;
    for i in 1..=n {
        for j in (1..=k.min(i)).rev() {
            row[j] = (j as u128) * row[j] + row[j - 1];
        }
        row[0] = 0;
    }
    row[k]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
