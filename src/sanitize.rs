//! Replace non-finite floats with `0.0` before output leaves the core.
//!
//! JSON has no NaN or Infinity, and a predictor or a degenerate division
//! may still produce one, so every float leaf of a report is walked.

use std::collections::BTreeMap;

use crate::analytics::decision::{DecisionSummary, GameFeatures, WhatIf};
use crate::models::{
    Inflection, MatchReport, ParticipantState, PlayerScore, Position, Snapshot, TeamPair,
    TeamTotals,
};

pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        if !self.is_finite() {
            *self = 0.0;
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(inner) = self {
            inner.sanitize();
        }
    }
}

impl<K: Ord, T: Sanitize> Sanitize for BTreeMap<K, T> {
    fn sanitize(&mut self) {
        self.values_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for TeamPair<T> {
    fn sanitize(&mut self) {
        self.team_a.sanitize();
        self.team_b.sanitize();
    }
}

impl Sanitize for TeamTotals {
    fn sanitize(&mut self) {
        self.primary.sanitize();
        self.secondary.sanitize();
    }
}

impl Sanitize for Position {
    fn sanitize(&mut self) {
        self.x.sanitize();
        self.y.sanitize();
    }
}

impl Sanitize for ParticipantState {
    fn sanitize(&mut self) {
        self.primary_resource.sanitize();
        self.secondary_resource.sanitize();
        self.auxiliary_counters.sanitize();
        self.position.sanitize();
    }
}

impl Sanitize for Snapshot {
    fn sanitize(&mut self) {
        self.resource_diff.sanitize();
        self.secondary_diff.sanitize();
        self.team_totals.sanitize();
        self.participants.sanitize();
    }
}

impl Sanitize for Inflection {
    fn sanitize(&mut self) {
        self.magnitude.sanitize();
    }
}

impl Sanitize for PlayerScore {
    fn sanitize(&mut self) {
        self.score.sanitize();
        self.resource_per_minute.sanitize();
        self.secondary_metric.sanitize();
    }
}

impl Sanitize for GameFeatures {
    fn sanitize(&mut self) {
        for value in [
            &mut self.gold_diff,
            &mut self.xp_diff,
            &mut self.towers_diff,
            &mut self.dragons_diff,
            &mut self.barons_diff,
            &mut self.time_seconds,
            &mut self.team100_kills,
            &mut self.team200_kills,
        ] {
            value.sanitize();
        }
    }
}

impl Sanitize for WhatIf {
    fn sanitize(&mut self) {
        self.current_probability.sanitize();
        self.modified_probability.sanitize();
        self.delta.sanitize();
    }
}

impl Sanitize for DecisionSummary {
    fn sanitize(&mut self) {
        self.features.sanitize();
        self.win_probability.sanitize();
        self.contributions.sanitize();
        self.what_if.sanitize();
    }
}

impl Sanitize for MatchReport {
    fn sanitize(&mut self) {
        self.snapshots.sanitize();
        self.inflections.sanitize();
        self.scores.sanitize();
        self.decision.sanitize();
    }
}

impl MatchReport {
    /// Coerce every non-finite float in the report to `0.0`.
    pub fn sanitize(mut self) -> Self {
        Sanitize::sanitize(&mut self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameKind;

    #[test]
    fn test_non_finite_leaves_become_zero() {
        let mut snapshot = Snapshot::empty(0);
        snapshot.resource_diff = f64::NAN;
        snapshot.team_totals.team_b.primary = f64::INFINITY;
        let mut counters = BTreeMap::new();
        counters.insert("wardsPlaced".to_string(), f64::NEG_INFINITY);
        snapshot.participants.insert(
            "1".to_string(),
            ParticipantState {
                id: "1".to_string(),
                name: None,
                team: None,
                primary_resource: 12.5,
                secondary_resource: f64::NAN,
                auxiliary_counters: counters,
                position: Some(Position {
                    x: f64::NAN,
                    y: 3.0,
                }),
            },
        );
        let report = MatchReport {
            game_kind: GameKind::LeagueOfLegends,
            synthetic: false,
            snapshots: vec![snapshot],
            events: Vec::new(),
            inflections: Vec::new(),
            deaths: Vec::new(),
            scores: Vec::new(),
            objectives: Vec::new(),
            decision: None,
        }
        .sanitize();

        let s = &report.snapshots[0];
        assert_eq!(s.resource_diff, 0.0);
        assert_eq!(s.team_totals.team_b.primary, 0.0);
        let p = &s.participants["1"];
        assert_eq!(p.primary_resource, 12.5);
        assert_eq!(p.secondary_resource, 0.0);
        assert_eq!(p.auxiliary_counters["wardsPlaced"], 0.0);
        assert_eq!(p.position, Some(Position { x: 0.0, y: 3.0 }));
        assert!(serde_json::to_string(&report).is_ok());
    }
}
