//! Snapshot construction.
//!
//! Building is a fold: `(Cumulative, frame) -> (Cumulative', Snapshot)`.
//! Cumulative objective and kill counters are carried from one frame to the
//! next and never reset, so building a prefix of the frames yields a prefix
//! of the snapshots.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::game::{GameKind, GameProfile};
use crate::models::{
    Event, EventKind, ParticipantState, Position, Snapshot, Team, TeamPair, TeamTotals,
};

use super::events::canonical_event;
use super::lookup::{
    as_timestamp, field_identifier, field_numeric, field_str, id_sort_key, numeric, resolve_first,
    Strategy,
};
use super::team::{
    sorted_numeric_ids, team_by_rank, Attribution, TeamLabels, TeamResolver, RIFT_TEAMS,
    VALORANT_TEAMS,
};

const ID_KEYS: &[&str] = &["id", "participantId", "playerId"];
const TEAM_FIELD_KEYS: &[&str] = &["teamId", "team", "side", "teamSide", "team_id"];
const NAME_KEYS: &[&str] = &["name", "summonerName", "nickname", "riotId", "playerName"];

/// Counters carried across frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cumulative {
    pub objectives: BTreeMap<String, i64>,
    pub captures: BTreeMap<String, TeamPair<u32>>,
    pub kills: TeamPair<u32>,
}

/// One participant as found in the frame, before canonicalization.
struct RawParticipant<'a> {
    id: String,
    body: &'a Value,
    /// Team inherited from an enclosing `teams[]` entry
    inherited: Option<Team>,
}

/// Builds canonical snapshots for one title.
pub struct SnapshotBuilder<'r> {
    kind: GameKind,
    profile: &'static GameProfile,
    teams: &'r dyn TeamResolver,
}

impl SnapshotBuilder<'static> {
    pub fn new(kind: GameKind) -> Self {
        SnapshotBuilder::with_resolver(kind, kind.team_resolver())
    }
}

impl<'r> SnapshotBuilder<'r> {
    /// Builder with an injected team resolver.
    pub fn with_resolver(kind: GameKind, teams: &'r dyn TeamResolver) -> Self {
        SnapshotBuilder {
            kind,
            profile: kind.profile(),
            teams,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// One snapshot per frame, in input order.
    pub fn build(&self, frames: &[&Value]) -> Vec<Snapshot> {
        self.build_from(Cumulative::default(), frames).1
    }

    /// Continue a build from previously carried counters.
    pub fn build_from(&self, start: Cumulative, frames: &[&Value]) -> (Cumulative, Vec<Snapshot>) {
        frames
            .iter()
            .fold((start, Vec::with_capacity(frames.len())), |(acc, mut out), frame| {
                let (next, snapshot) = self.step(acc, frame);
                out.push(snapshot);
                (next, out)
            })
    }

    /// Fold step: canonicalize one frame and advance the counters.
    pub fn step(&self, acc: Cumulative, frame: &Value) -> (Cumulative, Snapshot) {
        let timestamp = frame_timestamp(frame);
        let participants = self.participants(frame);

        let mut totals: TeamPair<TeamTotals> = TeamPair::default();
        for state in participants.values() {
            if let Some(team) = state.team {
                let t = totals.get_mut(team);
                t.primary += state.primary_resource;
                t.secondary += state.secondary_resource;
            }
        }

        let roster = participants
            .iter()
            .map(|(id, state)| (id.clone(), state.team))
            .collect();
        let next = self.apply_events(acc, frame, timestamp, &Attribution::with_roster(self.teams, roster));

        let snapshot = Snapshot {
            timestamp,
            resource_diff: totals.team_a.primary - totals.team_b.primary,
            secondary_diff: totals.team_a.secondary - totals.team_b.secondary,
            team_totals: totals,
            cumulative_objective_counts: next.objectives.clone(),
            objective_captures: next.captures.clone(),
            cumulative_kills: next.kills,
            participants,
            synthetic: false,
        };
        (next, snapshot)
    }

    fn apply_events(
        &self,
        mut acc: Cumulative,
        frame: &Value,
        timestamp: u64,
        attribution: &Attribution<'_>,
    ) -> Cumulative {
        let Some(raw_events) = frame.get("events").and_then(Value::as_array) else {
            return acc;
        };
        for raw in raw_events {
            let Some(event) = canonical_event(raw, timestamp, attribution) else {
                continue;
            };
            let Some(team) = event.team else {
                continue;
            };
            match event.kind {
                EventKind::Kill => *acc.kills.get_mut(team) += 1,
                EventKind::ObjectiveCapture => record_capture(&mut acc, objective_key(&event), team),
                EventKind::Tactical => {
                    if is_notable(self.profile, &event.event_type, event.objective_subtype.as_deref()) {
                        record_capture(&mut acc, objective_key(&event), team);
                    }
                }
            }
        }
        acc
    }

    /// Canonical participants of one frame keyed by id.
    fn participants(&self, frame: &Value) -> BTreeMap<String, ParticipantState> {
        let mut raw = resolve_first(frame, &participant_strategies())
            .map(|(_, list)| list)
            .unwrap_or_default();
        raw.sort_by_key(|p| id_sort_key(&p.id));

        let labels: Vec<String> = raw
            .iter()
            .filter(|p| p.inherited.is_none())
            .filter_map(|p| field_identifier(p.body, TEAM_FIELD_KEYS))
            .collect();
        let labels = TeamLabels::from_labels(self.teams, labels.iter().map(String::as_str));
        let numeric_ids = sorted_numeric_ids(raw.iter().map(|p| p.id.as_str()));

        raw.into_iter()
            .map(|p| {
                let name = field_str(p.body, NAME_KEYS).map(str::to_string);
                let team = match (p.inherited, field_identifier(p.body, TEAM_FIELD_KEYS)) {
                    (Some(team), _) => Some(team),
                    (None, Some(label)) => labels.get(&label),
                    (None, None) => team_by_rank(&p.id, &numeric_ids)
                        .or_else(|| name.as_deref().and_then(|n| self.teams.from_slug(n)))
                        .or_else(|| self.teams.from_slug(&p.id))
                        .or(Some(Team::A)),
                };
                let state = self.participant_state(&p, name, team);
                (p.id, state)
            })
            .collect()
    }

    fn participant_state(
        &self,
        raw: &RawParticipant<'_>,
        name: Option<String>,
        team: Option<Team>,
    ) -> ParticipantState {
        let auxiliary_counters = self
            .profile
            .counter_fields
            .iter()
            .filter_map(|f| field_numeric(raw.body, &[*f]).map(|v| (f.to_string(), v)))
            .collect();
        ParticipantState {
            id: raw.id.clone(),
            name,
            team,
            primary_resource: field_numeric(raw.body, self.profile.primary_fields).unwrap_or(0.0),
            secondary_resource: field_numeric(raw.body, self.profile.secondary_fields)
                .unwrap_or(0.0),
            auxiliary_counters,
            position: position(raw.body),
        }
    }
}

/// Convenience: build with the title's default team resolver.
pub fn build(frames: &[&Value], kind: GameKind) -> Vec<Snapshot> {
    SnapshotBuilder::new(kind).build(frames)
}

/// Participant id to team across every snapshot. The first resolved team
/// of an id wins; ids never placed on a side map to `None`.
pub fn roster<'s>(
    snapshots: impl IntoIterator<Item = &'s Snapshot>,
) -> BTreeMap<String, Option<Team>> {
    let mut out: BTreeMap<String, Option<Team>> = BTreeMap::new();
    for snapshot in snapshots {
        for (id, state) in &snapshot.participants {
            let slot = out.entry(id.clone()).or_insert(None);
            if slot.is_none() {
                *slot = state.team;
            }
        }
    }
    out
}

/// Frame time: `timestamp`, `clock.timestamp`, `clock.currentSeconds`, else 0.
pub fn frame_timestamp(frame: &Value) -> u64 {
    resolve_first(frame, &timestamp_strategies())
        .map(|(_, ts)| ts)
        .unwrap_or(0)
}

fn timestamp_strategies<'a>() -> [Strategy<'a, u64>; 3] {
    [
        Strategy {
            name: "timestamp",
            run: |f| f.get("timestamp").and_then(as_timestamp),
        },
        Strategy {
            name: "clock_timestamp",
            run: |f| f.get("clock")?.get("timestamp").and_then(as_timestamp),
        },
        Strategy {
            name: "clock_seconds",
            run: |f| {
                let secs = numeric(f.get("clock")?.get("currentSeconds")?, &[])?;
                Some((secs.max(0.0) * 1000.0).round() as u64)
            },
        },
    ]
}

/// Whether an event type/subtype is on the title's notable allow-list.
pub fn is_notable(profile: &GameProfile, event_type: &str, subtype: Option<&str>) -> bool {
    let ty = event_type.to_lowercase();
    let sub = subtype.map(str::to_lowercase).unwrap_or_default();
    profile
        .notable_events
        .iter()
        .any(|n| ty.contains(n) || (!sub.is_empty() && sub.contains(n)))
}

/// Key an objective is tallied under: its subtype, else its type.
pub fn objective_key(event: &Event) -> String {
    event
        .objective_subtype
        .clone()
        .unwrap_or_else(|| event.event_type.to_lowercase())
}

fn record_capture(acc: &mut Cumulative, key: String, team: Team) {
    *acc.captures.entry(key.clone()).or_default().get_mut(team) += 1;
    *acc.objectives.entry(key).or_default() += team.sign();
}

fn position(body: &Value) -> Option<Position> {
    let pos = body.get("position")?;
    let x = numeric(pos.get("x")?, &[])?;
    let y = numeric(pos.get("y")?, &[])?;
    Some(Position { x, y })
}

// ── Participant shapes ───────────────────────────────────────────────────────

fn participant_strategies<'a>() -> [Strategy<'a, Vec<RawParticipant<'a>>>; 5] {
    [
        Strategy {
            name: "participant_frames",
            run: |f| keyed_map(f.get("participantFrames")?),
        },
        Strategy {
            name: "participant_map",
            run: |f| keyed_map(f.get("participants")?),
        },
        Strategy {
            name: "participant_list",
            run: |f| keyed_list(f.get("participants")?, None),
        },
        Strategy {
            name: "player_list",
            run: |f| keyed_list(f.get("players")?, None),
        },
        Strategy {
            name: "team_rosters",
            run: team_rosters,
        },
    ]
}

fn non_empty<T>(list: Vec<T>) -> Option<Vec<T>> {
    (!list.is_empty()).then_some(list)
}

fn keyed_map(value: &Value) -> Option<Vec<RawParticipant<'_>>> {
    let map = value.as_object()?;
    non_empty(
        map.iter()
            .filter(|(_, body)| body.is_object())
            .map(|(id, body)| RawParticipant {
                id: id.clone(),
                body,
                inherited: None,
            })
            .collect(),
    )
}

fn keyed_list(value: &Value, inherited: Option<Team>) -> Option<Vec<RawParticipant<'_>>> {
    let list = value.as_array()?;
    non_empty(
        list.iter()
            .filter(|body| body.is_object())
            .enumerate()
            .map(|(idx, body)| RawParticipant {
                id: field_identifier(body, ID_KEYS).unwrap_or_else(|| (idx + 1).to_string()),
                body,
                inherited,
            })
            .collect(),
    )
}

/// `teams[]` each holding `players[]`; players inherit their team's side.
fn team_rosters(frame: &Value) -> Option<Vec<RawParticipant<'_>>> {
    let teams = frame.get("teams")?.as_array()?;
    let labels: Vec<String> = teams
        .iter()
        .filter_map(|t| field_identifier(t, &["side", "id", "teamId"]))
        .collect();
    // Resolver-independent here: titles agree on blue/red and positional order.
    let sides = TeamLabels::from_labels(&SideOnly, labels.iter().map(String::as_str));

    let mut out = Vec::new();
    for (idx, team) in teams.iter().enumerate() {
        let side = field_identifier(team, &["side", "id", "teamId"])
            .and_then(|label| sides.get(&label))
            .or_else(|| field_str(team, &["name"]).and_then(|n| SideOnly.from_slug(n)))
            .or(match idx {
                0 => Some(Team::A),
                1 => Some(Team::B),
                _ => None,
            });
        if let Some(players) = team.get("players").and_then(|p| keyed_list(p, side)) {
            out.extend(players);
        }
    }
    non_empty(out)
}

/// Label normalization shared by every title for `teams[]` entries.
struct SideOnly;

impl TeamResolver for SideOnly {
    fn normalize_label(&self, label: &str) -> Option<Team> {
        RIFT_TEAMS
            .normalize_label(label)
            .or_else(|| VALORANT_TEAMS.normalize_label(label))
    }
}
