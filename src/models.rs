use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::decision::DecisionSummary;
use crate::game::GameKind;

/// One of the two sides in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    #[serde(rename = "TEAM_A")]
    A,
    #[serde(rename = "TEAM_B")]
    B,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// +1 for team A, -1 for team B (differentials are always A − B).
    pub fn sign(self) -> i64 {
        match self {
            Team::A => 1,
            Team::B => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::A => "Team A",
            Team::B => "Team B",
        }
    }
}

/// A value held once per team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPair<T> {
    pub team_a: T,
    pub team_b: T,
}

impl<T> TeamPair<T> {
    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamTotals {
    /// Gold or credits
    pub primary: f64,
    /// XP or loadout value
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Canonical per-participant state inside one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub id: String,
    pub name: Option<String>,
    /// `None` when the source names a team that maps onto neither side.
    pub team: Option<Team>,
    pub primary_resource: f64,
    pub secondary_resource: f64,
    /// Minions / jungle / wards for League, kills / headshots for Valorant.
    pub auxiliary_counters: BTreeMap<String, f64>,
    pub position: Option<Position>,
}

impl ParticipantState {
    /// First counter present among `names`.
    pub fn counter(&self, names: &[&str]) -> Option<f64> {
        names
            .iter()
            .find_map(|n| self.auxiliary_counters.get(*n).copied())
    }
}

/// Canonical point-in-time game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Milliseconds since match start
    pub timestamp: u64,
    /// team A primary total − team B primary total
    pub resource_diff: f64,
    pub secondary_diff: f64,
    pub team_totals: TeamPair<TeamTotals>,
    /// Signed capture differential per objective kind (+ = team A).
    pub cumulative_objective_counts: BTreeMap<String, i64>,
    /// Per-team capture tallies per objective kind; never decrease.
    pub objective_captures: BTreeMap<String, TeamPair<u32>>,
    pub cumulative_kills: TeamPair<u32>,
    pub participants: BTreeMap<String, ParticipantState>,
    /// Set when the snapshot was synthesized from summary data.
    pub synthetic: bool,
}

impl Snapshot {
    pub fn empty(timestamp: u64) -> Self {
        Snapshot {
            timestamp,
            resource_diff: 0.0,
            secondary_diff: 0.0,
            team_totals: TeamPair::default(),
            cumulative_objective_counts: BTreeMap::new(),
            objective_captures: BTreeMap::new(),
            cumulative_kills: TeamPair::default(),
            participants: BTreeMap::new(),
            synthetic: false,
        }
    }

    /// Sum of signed objective differentials whose kind contains any of `needles`.
    pub fn objective_diff(&self, needles: &[&str]) -> i64 {
        self.cumulative_objective_counts
            .iter()
            .filter(|(kind, _)| needles.iter().any(|n| kind.contains(n)))
            .map(|(_, v)| *v)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Kill,
    ObjectiveCapture,
    Tactical,
}

/// Canonical match event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Source type string as it appeared in the feed (e.g. "CHAMPION_KILL")
    pub event_type: String,
    pub timestamp: u64,
    /// Empty when the source names no actor (e.g. a minion execution).
    pub actor_id: String,
    pub target_id: Option<String>,
    pub objective_subtype: Option<String>,
    /// Team that executed the event
    pub team: Option<Team>,
    #[serde(default)]
    pub assists: Vec<String>,
    pub headshot: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    High,
}

/// Outcome of trade analysis for one death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub participant: String,
    pub team: Option<Team>,
    pub timestamp: u64,
    pub killer: String,
    pub is_traded: bool,
    /// Teammate whose kill traded this death
    pub traded_by: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflectionKind {
    ResourceSwing,
    NotableEvent,
    StrategicBaseline,
    CurrentMomentum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inflection {
    pub timestamp: u64,
    pub kind: InflectionKind,
    /// Absolute swing for resource swings, 0 otherwise.
    pub magnitude: f64,
    /// Team the moment favoured, when one did.
    pub team: Option<Team>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub participant: String,
    pub team: Option<Team>,
    /// Composite in [0, 100]
    pub score: f64,
    pub resource_per_minute: f64,
    pub kills: u32,
    /// Vision per minute (League) or headshot ratio (Valorant)
    pub secondary_metric: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveControl {
    pub timestamp: u64,
    pub objective: String,
    pub team: Option<Team>,
    pub actor_id: String,
}

/// Everything the pipeline produces for one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub game_kind: GameKind,
    /// True when snapshots or events came from the fallback synthesizer
    pub synthetic: bool,
    pub snapshots: Vec<Snapshot>,
    pub events: Vec<Event>,
    pub inflections: Vec<Inflection>,
    pub deaths: Vec<DeathRecord>,
    pub scores: Vec<PlayerScore>,
    pub objectives: Vec<ObjectiveControl>,
    pub decision: Option<DecisionSummary>,
}
