// src/ladder/detector.rs
use std::collections::HashMap;

use super::{Ladder, LadderRecord};
use crate::change_detector::ChangeDetector;

/// Field-level ladder comparison keyed by team.
///
/// Only rank and competition points are significant (plus the display name
/// when `compare_team_name` is set). Record order is ignored; rank is the
/// authoritative position signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LadderDetector {
    pub compare_team_name: bool,
}

impl LadderDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team_name(mut self, on: bool) -> Self {
        self.compare_team_name = on;
        self
    }

    pub fn records_changed(&self, old: &[LadderRecord], new: &[LadderRecord]) -> bool {
        if old.len() != new.len() {
            return true;
        }

        // first occurrence wins on duplicate keys
        let mut by_team: HashMap<&str, &LadderRecord> = HashMap::with_capacity(new.len());
        for rec in new {
            by_team.entry(rec.team()).or_insert(rec);
        }

        for old_rec in old {
            let Some(new_rec) = by_team.get(old_rec.team()) else {
                tracing::info!(
                    team = old_rec.team(),
                    rank = %old_rec.fields.rank,
                    "ladder record not found in new ladder"
                );
                return true;
            };

            let (a, b) = (&old_rec.fields, &new_rec.fields);
            if a.rank != b.rank || a.competition_points != b.competition_points {
                return true;
            }
            if self.compare_team_name && a.team_name != b.team_name {
                return true;
            }
        }

        false
    }
}

impl ChangeDetector<Ladder> for LadderDetector {
    fn has_changed(&self, old: &Ladder, new: &Ladder) -> bool {
        self.records_changed(&old.records, &new.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn rec(team: &str, rank: &str, pts: &str) -> LadderRecord {
        LadderRecord::new(team, rank, pts)
    }

    fn base() -> Vec<LadderRecord> {
        vec![rec("Aces", "1", "10"), rec("APG", "2", "9")]
    }

    #[test]
    fn identical_ladders_are_unchanged() {
        assert!(!LadderDetector::new().records_changed(&base(), &base()));
    }

    #[test]
    fn insignificant_columns_are_ignored() {
        let mut new = base();
        new[0]
            .fields
            .extra
            .insert("TotalSetsA".into(), Value::String("14".into()));
        new[1].fields.next_match_detail = "R6 vs Aces @ 7:45pm".into();
        new[1].id = "other-record-id".into();

        assert!(!LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn swapped_ranks_are_a_change() {
        let new = vec![rec("APG", "1", "9"), rec("Aces", "2", "10")];
        assert!(LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn rank_swap_keeping_positions_is_a_change() {
        // same list order, only the Rank values swap
        let new = vec![rec("Aces", "2", "10"), rec("APG", "1", "9")];
        assert!(LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn reordering_with_same_ranks_is_not_a_change() {
        let new = vec![rec("APG", "2", "9"), rec("Aces", "1", "10")];
        assert!(!LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn points_change_is_detected() {
        let new = vec![rec("Aces", "1", "13"), rec("APG", "2", "9")];
        assert!(LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn removed_record_is_a_change() {
        let new = vec![rec("Aces", "1", "10")];
        assert!(LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn renamed_team_is_a_change() {
        let new = vec![rec("Aces", "1", "10"), rec("APG Volley", "2", "9")];
        assert!(LadderDetector::new().records_changed(&base(), &new));
    }

    #[test]
    fn display_name_only_matters_when_enabled() {
        let mut new = base();
        new[0].fields.team_name = "Aces (Div 1)".into();

        assert!(!LadderDetector::new().records_changed(&base(), &new));
        assert!(LadderDetector::new()
            .with_team_name(true)
            .records_changed(&base(), &new));
    }

    #[test]
    fn works_through_the_detector_seam() {
        let old = Ladder {
            records: base(),
            offset: String::new(),
        };
        let mut new = old.clone();
        new.offset = "page-2".into();
        assert!(!LadderDetector::new().has_changed(&old, &new));
    }
}
