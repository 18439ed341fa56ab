//! Shared types for the team balancer.
//!
//! Participants, teams and matches are plain values: built once per
//! balancing call, compared structurally by participant id, and never
//! mutated afterwards.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Largest absolute score accepted for a single participant.
/// Keeps `teams × score` sums comfortably inside `i64`.
pub const MAX_ABS_SCORE: i64 = 1_000_000_000_000;

/// Whether `score` lies within `±MAX_ABS_SCORE`.
pub fn score_in_range(score: i64) -> bool {
    (-MAX_ABS_SCORE..=MAX_ABS_SCORE).contains(&score)
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A scored player. Identity is the `id` alone.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub score: i64,
}

impl Participant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, score: i64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            score,
        }
    }

    /// Participant whose display name is its id.
    pub fn named(id: impl Into<String>, score: i64) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            score,
        }
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Participant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Participant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.score)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A group of participants. Members are kept sorted by id and the score is
/// always the sum of member scores.
#[derive(Debug, Clone)]
pub struct Team {
    members: Vec<Participant>,
    score: i64,
}

impl Team {
    pub fn new(mut members: Vec<Participant>) -> Self {
        members.sort();
        // Saturates so oversized caller-built teams fail in `Match::new` instead of panicking.
        let score = members.iter().fold(0i64, |acc, p| acc.saturating_add(p.score));
        Self { members, score }
    }

    /// Members in ascending id order.
    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `"{score},{id},{id},..."` with ids ascending.
    pub fn canonical_key(&self) -> String {
        let mut key = self.score.to_string();
        for member in &self.members {
            key.push(',');
            key.push_str(&member.id);
        }
        key
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for Team {}

impl Hash for Team {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.members.hash(state);
    }
}

impl PartialOrd for Team {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Team {
    fn cmp(&self, other: &Self) -> Ordering {
        self.members.cmp(&other.members)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.score)?;
        for (i, member) in self.members.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}", member.display_name)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// One candidate partition of the participants into teams.
///
/// Teams are stored in canonical order (ascending team key), so two matches
/// with the same teams compare equal however they were produced.
#[derive(Debug, Clone)]
pub struct Match {
    teams: Vec<Team>,
    deviation: i64,
    unfairness: Decimal,
}

impl Match {
    /// Build a match, rejecting empty teams, participants that appear in
    /// more than one team, and scores outside `±MAX_ABS_SCORE`.
    pub fn new(teams: Vec<Team>) -> Result<Self, BalanceError> {
        if teams.is_empty() {
            return Err(BalanceError::InvalidInput("a match needs at least one team".into()));
        }
        let mut seen = HashSet::new();
        for (i, team) in teams.iter().enumerate() {
            if team.is_empty() {
                return Err(BalanceError::InvalidInput(format!("team {} has no members", i + 1)));
            }
            for member in team.members() {
                if !score_in_range(member.score) {
                    return Err(BalanceError::InvalidInput(format!(
                        "score {} of '{}' exceeds ±{MAX_ABS_SCORE}",
                        member.score, member.id
                    )));
                }
                if !seen.insert(member.id.as_str()) {
                    return Err(BalanceError::InvalidInput(format!(
                        "participant '{}' appears in more than one team",
                        member.id
                    )));
                }
            }
        }

        let deviation = deviation_of(teams.iter().map(Team::score))
            .ok_or_else(|| BalanceError::InvalidInput("team scores overflow the unfairness metric".into()))?;
        Ok(Self::from_canonical(canonical_order(teams), deviation))
    }

    /// Assemble from teams already in canonical order with a precomputed
    /// deviation. Used by the search, which has validated both.
    pub(crate) fn from_canonical(teams: Vec<Team>, deviation: i64) -> Self {
        let unfairness = Decimal::from(deviation) / Decimal::from(teams.len() as i64);
        Self {
            teams,
            deviation,
            unfairness,
        }
    }

    /// Teams in canonical order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn participant_count(&self) -> usize {
        self.teams.iter().map(Team::len).sum()
    }

    /// Sum of absolute deviations of team scores from the mean team score.
    pub fn unfairness(&self) -> Decimal {
        self.unfairness
    }

    /// `unfairness × team_count`, an exact integer used for ranking.
    pub fn deviation(&self) -> i64 {
        self.deviation
    }

    /// Team keys in ascending order joined with `,`.
    pub fn canonical_key(&self) -> String {
        self.teams
            .iter()
            .map(Team::canonical_key)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Teams ordered by ascending score, ties kept in canonical order.
    pub fn teams_by_score(&self) -> Vec<&Team> {
        let mut teams: Vec<&Team> = self.teams.iter().collect();
        teams.sort_by_key(|t| t.score());
        teams
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.teams == other.teams
    }
}

impl Eq for Match {}

impl Hash for Match {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.teams.hash(state);
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scores: Vec<String> = self.teams_by_score().iter().map(|t| t.score().to_string()).collect();
        write!(f, "{} (unfairness {})", scores.join(" vs "), self.unfairness.normalize())
    }
}

/// `Σ |k·score - total|` over `k` team scores. `None` on overflow.
pub(crate) fn deviation_of(mut scores: impl Iterator<Item = i64> + Clone) -> Option<i64> {
    let k = i64::try_from(scores.clone().count()).ok()?;
    let total = scores.clone().try_fold(0i64, |acc, s| acc.checked_add(s))?;
    scores.try_fold(0i64, |acc, s| {
        let dev = k.checked_mul(s)?.checked_sub(total)?.checked_abs()?;
        acc.checked_add(dev)
    })
}

/// Sort teams by canonical key, falling back to member ids when two keys
/// happen to coincide.
pub(crate) fn canonical_order(teams: Vec<Team>) -> Vec<Team> {
    let mut keyed: Vec<(String, Team)> = teams.into_iter().map(|t| (t.canonical_key(), t)).collect();
    keyed.sort();
    keyed.into_iter().map(|(_, t)| t).collect()
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures surfaced by the balancer. None of them carry a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid partition request: {0}")]
    InvalidPartitionRequest(String),

    #[error("Partition search cancelled after {explored} candidates")]
    Cancelled { explored: u64 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
