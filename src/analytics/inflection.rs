//! Strategic inflection detection.
//!
//! Two passes over the canonical artifacts:
//! - resource swing: consecutive `resource_diff` deltas above a threshold
//!   (halved for sequences shorter than [`SPARSE_SNAPSHOTS`])
//! - notable events: allow-listed objectives and round-deciding actions
//!
//! When neither pass flags anything, a two-entry baseline narrative is
//! returned so a non-empty snapshot sequence never yields an empty list.

use tracing::debug;

use crate::game::{GameKind, GameProfile};
use crate::models::{Event, Inflection, InflectionKind, Snapshot, Team};
use crate::normalize::snapshot::{is_notable, objective_key};

/// Below this many snapshots the swing threshold is halved.
pub const SPARSE_SNAPSHOTS: usize = 10;

pub struct InflectionDetector {
    profile: &'static GameProfile,
    threshold: f64,
}

impl InflectionDetector {
    /// Detector using the title's default swing threshold.
    pub fn for_game(kind: GameKind) -> Self {
        let profile = kind.profile();
        InflectionDetector {
            profile,
            threshold: profile.swing_threshold,
        }
    }

    /// Override the swing threshold; `None` keeps the current one.
    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        if let Some(t) = threshold {
            self.threshold = t;
        }
        self
    }

    /// Threshold applied to a sequence of `len` snapshots.
    pub fn effective_threshold(&self, len: usize) -> f64 {
        if len < SPARSE_SNAPSHOTS {
            self.threshold / 2.0
        } else {
            self.threshold
        }
    }

    /// Inflections ordered by timestamp; equal timestamps keep swing-pass
    /// entries ahead of event-pass entries.
    pub fn detect(&self, snapshots: &[Snapshot], events: &[Event]) -> Vec<Inflection> {
        let mut found = self.resource_swings(snapshots);
        found.extend(self.notable_events(events));
        found.sort_by_key(|i| i.timestamp);

        if found.is_empty() {
            if let Some(last) = snapshots.last() {
                debug!("No inflection crossed threshold; emitting baseline narrative");
                return self.baseline(last);
            }
        }
        found
    }

    fn resource_swings(&self, snapshots: &[Snapshot]) -> Vec<Inflection> {
        let threshold = self.effective_threshold(snapshots.len());
        snapshots
            .windows(2)
            .filter_map(|pair| {
                let delta = pair[1].resource_diff - pair[0].resource_diff;
                if !delta.is_finite() || delta.abs() <= threshold {
                    return None;
                }
                let team = if delta > 0.0 { Team::A } else { Team::B };
                Some(Inflection {
                    timestamp: pair[1].timestamp,
                    kind: InflectionKind::ResourceSwing,
                    magnitude: delta.abs(),
                    team: Some(team),
                    description: format!(
                        "Significant {} swing of {:.0} towards {} Advantage",
                        self.profile.resource_label,
                        delta.abs(),
                        team.label()
                    ),
                })
            })
            .collect()
    }

    fn notable_events(&self, events: &[Event]) -> Vec<Inflection> {
        events
            .iter()
            .filter(|e| is_notable(self.profile, &e.event_type, e.objective_subtype.as_deref()))
            .map(|e| Inflection {
                timestamp: e.timestamp,
                kind: InflectionKind::NotableEvent,
                magnitude: 0.0,
                team: e.team,
                description: match e.team {
                    Some(team) => format!("{} secured by {}", objective_key(e), team.label()),
                    None => format!("{} occurred", objective_key(e)),
                },
            })
            .collect()
    }

    fn baseline(&self, last: &Snapshot) -> Vec<Inflection> {
        let label = self.profile.resource_label;
        let diff = last.resource_diff;
        let leader = if diff > 0.0 {
            Some(Team::A)
        } else if diff < 0.0 {
            Some(Team::B)
        } else {
            None
        };
        let momentum = match leader {
            Some(team) => format!("{} leads by {:.0} {}", team.label(), diff.abs(), label),
            None => format!("Teams are level on {}", label),
        };
        vec![
            Inflection {
                timestamp: 0,
                kind: InflectionKind::StrategicBaseline,
                magnitude: 0.0,
                team: None,
                description: format!(
                    "Strategic baseline: no {} swing or major objective stood out",
                    label
                ),
            },
            Inflection {
                timestamp: last.timestamp,
                kind: InflectionKind::CurrentMomentum,
                magnitude: diff.abs(),
                team: leader,
                description: momentum,
            },
        ]
    }
}

/// Detect with the title's default threshold.
pub fn detect(snapshots: &[Snapshot], events: &[Event], kind: GameKind) -> Vec<Inflection> {
    InflectionDetector::for_game(kind).detect(snapshots, events)
}
