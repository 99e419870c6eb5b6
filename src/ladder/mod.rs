// src/ladder/mod.rs
//! Metro League ladder as returned by the competition API (Airtable records,
//! "string" response formatting).

pub mod client;
pub mod detector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub use client::{LadderClient, LadderQuery};
pub use detector::LadderDetector;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    #[serde(default)]
    pub records: Vec<LadderRecord>,
    #[serde(default)]
    pub offset: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LadderRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fields: LadderFields,
}

/// Ladder columns. Only the identity key, rank and competition points (plus the
/// display name, optionally) matter for change detection; the remaining
/// columns (set/point ratios, duty counts, fixtures...) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderFields {
    #[serde(rename = "TeamNameLookup")]
    pub team_name_lookup: String,
    #[serde(rename = "TeamName")]
    pub team_name: String,
    #[serde(rename = "Rank")]
    pub rank: String,
    #[serde(rename = "Competition Points")]
    pub competition_points: String,
    #[serde(rename = "NextMatch_Detail")]
    pub next_match_detail: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LadderRecord {
    /// Minimal record, handy for fixtures and tests.
    pub fn new(team: &str, rank: &str, points: &str) -> Self {
        Self {
            id: String::new(),
            fields: LadderFields {
                team_name_lookup: team.to_string(),
                team_name: team.to_string(),
                rank: rank.to_string(),
                competition_points: points.to_string(),
                ..LadderFields::default()
            },
        }
    }

    pub fn team(&self) -> &str {
        &self.fields.team_name_lookup
    }
}

impl Ladder {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Ranked summary posted to channels when the ladder moves.
    pub fn render(&self, link: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Ladder: {link} ```");
        out.push('\n');

        for team in &self.records {
            let f = &team.fields;
            let _ = writeln!(out, "{}. {}", f.rank, f.team_name);
            let _ = writeln!(out, "\tpoints: {}", f.competition_points);
            let _ = writeln!(out, "\tnext game: {}", f.next_match_detail);
            out.push('\n');
        }

        out.push_str("```");
        out
    }
}
