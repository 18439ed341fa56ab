//! Exhaustive partition search with bounded top-K ranking.
//!
//! Participants are assigned one by one to labelled slots using
//! restricted-growth assignment: participant `i` joins an already opened
//! slot or opens the next one. Every unordered partition into exactly `k`
//! non-empty teams is visited once, so no duplicate orderings are generated
//! and empty teams never occur.
//!
//! Complete assignments feed an ordered set keyed by
//! `(deviation, canonical key, member groups)`. Set membership deduplicates
//! structurally identical partitions and the set is trimmed to `top_k`
//! after every insert.

use std::collections::BTreeSet;

use tracing::debug;

use super::cancel::CancelToken;
use crate::types::{BalanceError, Match, Participant, Team};

/// Complete assignments visited between cancellation checks.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Result of a finished search.
#[derive(Debug)]
pub(crate) struct SearchOutcome {
    pub matches: Vec<Match>,
    /// Complete assignments visited.
    pub explored: u64,
}

/// A ranked partition before it is materialised as a `Match`.
/// Field order gives the ranking order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    deviation: i64,
    key: String,
    /// Participant indices per team, teams in canonical order.
    groups: Vec<Vec<usize>>,
}

struct Search<'a> {
    participants: &'a [Participant],
    cancel: &'a CancelToken,
    k: usize,
    top_k: usize,
    total: i64,
    labels: Vec<usize>,
    sums: Vec<i64>,
    ranked: BTreeSet<Candidate>,
    explored: u64,
}

/// Run the search. `participants` must be sorted by id, validated, and hold
/// at least `num_teams` entries.
pub(crate) fn search(
    participants: &[Participant],
    num_teams: usize,
    top_k: usize,
    cancel: &CancelToken,
) -> Result<SearchOutcome, BalanceError> {
    if cancel.is_cancelled() {
        return Err(BalanceError::Cancelled { explored: 0 });
    }

    let mut state = Search {
        participants,
        cancel,
        k: num_teams,
        top_k,
        total: participants.iter().map(|p| p.score).sum(),
        labels: vec![0; participants.len()],
        sums: vec![0; num_teams],
        ranked: BTreeSet::new(),
        explored: 0,
    };
    state.assign(0, 0)?;

    debug!(explored = state.explored, kept = state.ranked.len(), "Search exhausted");

    let matches = state
        .ranked
        .iter()
        .map(|c| state.materialise(c))
        .collect();

    Ok(SearchOutcome {
        matches,
        explored: state.explored,
    })
}

impl Search<'_> {
    /// Place participant `idx`, given that slots `0..opened` are in use.
    fn assign(&mut self, idx: usize, opened: usize) -> Result<(), BalanceError> {
        let n = self.participants.len();
        if idx == n {
            return self.visit();
        }

        let remaining = n - idx;
        let score = self.participants[idx].score;

        // Joining an open slot must still leave enough people for the unopened ones.
        if remaining > self.k - opened {
            for slot in 0..opened {
                self.labels[idx] = slot;
                self.sums[slot] += score;
                let result = self.assign(idx + 1, opened);
                self.sums[slot] -= score;
                result?;
            }
        }

        if opened < self.k {
            self.labels[idx] = opened;
            self.sums[opened] += score;
            let result = self.assign(idx + 1, opened + 1);
            self.sums[opened] -= score;
            result?;
        }

        Ok(())
    }

    /// Score a complete assignment and offer it to the ranking.
    fn visit(&mut self) -> Result<(), BalanceError> {
        self.explored += 1;
        if self.explored % CANCEL_POLL_INTERVAL == 0 && self.cancel.is_cancelled() {
            return Err(BalanceError::Cancelled {
                explored: self.explored,
            });
        }

        let k = self.k as i64;
        let deviation: i64 = self.sums.iter().map(|&s| (k * s - self.total).abs()).sum();

        if self.ranked.len() >= self.top_k {
            if let Some(worst) = self.ranked.last() {
                if deviation > worst.deviation {
                    return Ok(());
                }
            }
        }

        let candidate = self.candidate(deviation);
        self.ranked.insert(candidate);
        if self.ranked.len() > self.top_k {
            self.ranked.pop_last();
        }
        Ok(())
    }

    fn candidate(&self, deviation: i64) -> Candidate {
        let mut groups = vec![Vec::new(); self.k];
        for (idx, &slot) in self.labels.iter().enumerate() {
            groups[slot].push(idx);
        }

        let mut keyed: Vec<(String, Vec<usize>)> = groups
            .into_iter()
            .enumerate()
            .map(|(slot, members)| (self.team_key(self.sums[slot], &members), members))
            .collect();
        keyed.sort();

        let key = keyed
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let groups = keyed.into_iter().map(|(_, members)| members).collect();

        Candidate {
            deviation,
            key,
            groups,
        }
    }

    /// Same format as `Team::canonical_key`. Indices ascend, and so do ids.
    fn team_key(&self, score: i64, members: &[usize]) -> String {
        let mut key = score.to_string();
        for &idx in members {
            key.push(',');
            key.push_str(&self.participants[idx].id);
        }
        key
    }

    fn materialise(&self, candidate: &Candidate) -> Match {
        let teams = candidate
            .groups
            .iter()
            .map(|members| Team::new(members.iter().map(|&i| self.participants[i].clone()).collect()))
            .collect();
        Match::from_canonical(teams, candidate.deviation)
    }
}
