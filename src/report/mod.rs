//! Rendering of ranked matches for people and machines.
//!
//! Text output mirrors the old team-generator page: one option per block,
//! teams listed weakest first, players weakest first within a team.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

use crate::types::{Match, Participant, Team};

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Human-readable listing of every option in rank order.
pub fn render_text(matches: &[Match]) -> String {
    if matches.is_empty() {
        return "No team options found.\n".to_string();
    }

    let mut out = String::new();
    for (i, m) in matches.iter().enumerate() {
        let teams = m.teams_by_score();
        let scores: Vec<String> = teams.iter().map(|t| t.score().to_string()).collect();
        let _ = writeln!(
            out,
            "Option {}: {} (unfairness {})",
            i + 1,
            scores.join(" vs "),
            m.unfairness().normalize()
        );
        for team in teams {
            let roster: Vec<String> = members_by_score(team).iter().map(|p| p.to_string()).collect();
            let _ = writeln!(out, "  Team {}: {}", team.score(), roster.join(", "));
        }
        out.push('\n');
    }
    out
}

fn members_by_score(team: &Team) -> Vec<&Participant> {
    let mut members: Vec<&Participant> = team.members().iter().collect();
    members.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.id.cmp(&b.id)));
    members
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub generated_at: DateTime<Utc>,
    pub participants: usize,
    pub num_teams: usize,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub rank: usize,
    pub unfairness: Decimal,
    pub canonical_key: String,
    pub teams: Vec<TeamView>,
}

#[derive(Debug, Serialize)]
pub struct TeamView {
    pub score: i64,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub score: i64,
}

impl BalanceReport {
    pub fn new(matches: &[Match], participants: usize, num_teams: usize) -> Self {
        let options = matches
            .iter()
            .enumerate()
            .map(|(i, m)| OptionView {
                rank: i + 1,
                unfairness: m.unfairness().normalize(),
                canonical_key: m.canonical_key(),
                teams: m
                    .teams_by_score()
                    .into_iter()
                    .map(|t| TeamView {
                        score: t.score(),
                        members: members_by_score(t)
                            .into_iter()
                            .map(|p| MemberView {
                                id: p.id.clone(),
                                name: p.display_name.clone(),
                                score: p.score,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            participants,
            num_teams,
            options,
        }
    }
}

pub fn render_json(report: &BalanceReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialise balance report")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
