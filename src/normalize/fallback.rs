//! Fallback synthesis for sparse or frame-less payloads.
//!
//! When a feed only carries end-of-game statistics, a multi-point snapshot
//! curve and a synthetic event list are derived from them so downstream
//! detectors always have a trend to work with. With no statistics at all a
//! single neutral baseline snapshot is produced.

use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::game::{GameKind, GameProfile};
use crate::models::{Event, EventKind, ParticipantState, Snapshot, Team, TeamPair, TeamTotals};

use super::lookup::{
    field_array, field_identifier, field_numeric, field_str, numeric, resolve_first, Strategy,
};
use super::schema::games_recent_first;
use super::team::{Attribution, TeamLabels, TeamResolver};

/// Minimum number of synthetic progress points.
pub const MIN_POINTS: usize = 6;

/// Shape of the synthetic curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    /// Number of evenly spaced progress points (at least [`MIN_POINTS`])
    pub points: usize,
    /// Exponent `k` applied as `progress^k` to resource totals
    pub growth_exponent: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        SynthesisParams {
            points: 8,
            growth_exponent: 1.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSummary {
    pub primary: f64,
    pub secondary: f64,
    pub kills: u32,
    /// Final capture count per objective kind
    pub objectives: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub id: String,
    pub name: Option<String>,
    pub team: Option<Team>,
    pub kills: u32,
    pub primary: f64,
    pub secondary: f64,
}

/// End-of-game statistics for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub duration_ms: u64,
    pub teams: TeamPair<TeamSummary>,
    pub players: Vec<PlayerSummary>,
}

/// Team-stat fields that map onto an objective kind.
const OBJECTIVE_STAT_FIELDS: &[(&str, &str)] = &[
    ("towersDestroyed", "tower"),
    ("turretsDestroyed", "tower"),
    ("dragonsKilled", "dragon"),
    ("baronsKilled", "baron"),
    ("heraldsKilled", "herald"),
    ("inhibitorsDestroyed", "inhibitor"),
    ("roundsWon", "round"),
];

const TEAM_LABEL_KEYS: &[&str] = &["teamId", "id", "side"];
const PLAYER_ID_KEYS: &[&str] = &["playerId", "participantId", "id"];
const PLAYER_NAME_KEYS: &[&str] = &["name", "nickname", "summonerName", "playerName"];
const DURATION_KEYS: &[&str] = &["duration", "gameDuration", "durationSeconds", "length"];

// ── Summary readers ──────────────────────────────────────────────────────────

/// Read summary statistics from whichever summary shape the payload has.
pub fn summary_stats(payload: &Value, kind: GameKind) -> Option<SummaryStats> {
    let (strategy, container) = resolve_first(payload, &summary_strategies())?;
    let stats = read_summary(container, kind)?;
    debug!(
        "Summary statistics read via '{}' ({} player(s), {} ms)",
        strategy,
        stats.players.len(),
        stats.duration_ms
    );
    Some(stats)
}

fn summary_strategies<'a>() -> [Strategy<'a, &'a Value>; 3] {
    [
        Strategy {
            name: "series_stats",
            run: |p| {
                let stats = p
                    .get("data")
                    .and_then(|d| d.get("seriesStats"))
                    .or_else(|| p.get("seriesStats"))?;
                field_array(stats, &["games"])?
                    .iter()
                    .rev()
                    .find(|g| has_summary(g))
            },
        },
        Strategy {
            name: "root_summary",
            run: |p| p.get("summary").filter(|s| has_summary(s)),
        },
        Strategy {
            name: "series_state_teams",
            run: |p| games_recent_first(p).into_iter().find(|g| has_summary(g)),
        },
    ]
}

fn has_summary(obj: &Value) -> bool {
    field_array(obj, &["teamStats", "teams", "playerStats", "players"]).is_some()
}

fn read_summary(obj: &Value, kind: GameKind) -> Option<SummaryStats> {
    let profile = kind.profile();
    let resolver = kind.team_resolver();
    let team_list = field_array(obj, &["teamStats", "teams"]).map_or(&[][..], Vec::as_slice);
    let player_list = field_array(obj, &["playerStats", "players"]).map_or(&[][..], Vec::as_slice);

    let mut labels: Vec<String> = team_list
        .iter()
        .filter_map(|t| field_identifier(t, TEAM_LABEL_KEYS))
        .collect();
    labels.extend(
        player_list
            .iter()
            .filter_map(|p| field_identifier(p, &["teamId", "team", "side"])),
    );
    let labels = TeamLabels::from_labels(resolver, labels.iter().map(String::as_str));
    let attribution = Attribution::new(resolver);

    let mut teams: TeamPair<TeamSummary> = TeamPair::default();
    let mut players = Vec::new();
    let mut team_reported = TeamPair::<(bool, bool)>::default();

    for (idx, raw_team) in team_list.iter().enumerate() {
        let side = field_identifier(raw_team, TEAM_LABEL_KEYS)
            .and_then(|l| labels.get(&l))
            .or_else(|| field_str(raw_team, &["name"]).and_then(|n| resolver.from_slug(n)))
            .or(match idx {
                0 => Some(Team::A),
                1 => Some(Team::B),
                _ => None,
            });
        let Some(side) = side else { continue };

        let summary = teams.get_mut(side);
        let reported = team_reported.get_mut(side);
        if let Some(v) = field_numeric(raw_team, profile.primary_fields) {
            summary.primary = v;
            reported.0 = true;
        }
        summary.secondary = field_numeric(raw_team, profile.secondary_fields).unwrap_or(0.0);
        if let Some(k) = field_numeric(raw_team, &["kills"]) {
            summary.kills = count(k);
            reported.1 = true;
        }
        summary.objectives = team_objectives(raw_team);

        if let Some(nested) = field_array(raw_team, &["players"]) {
            players.extend(
                nested
                    .iter()
                    .enumerate()
                    .filter_map(|(i, p)| read_player(p, i, Some(side), profile)),
            );
        }
    }

    for (idx, raw_player) in player_list.iter().enumerate() {
        let Some(mut player) = read_player(raw_player, idx, None, profile) else {
            continue;
        };
        player.team = field_identifier(raw_player, &["teamId", "team", "side"])
            .map(|l| labels.get(&l))
            .unwrap_or_else(|| attribution.participant_team(&player.id));
        players.push(player);
    }

    if team_list.is_empty() && players.is_empty() {
        return None;
    }

    // Team totals the feed did not report are the sum of their players.
    for side in [Team::A, Team::B] {
        let (has_primary, has_kills) = *team_reported.get(side);
        let mine = players.iter().filter(|p| p.team == Some(side));
        let summary = teams.get_mut(side);
        if !has_primary {
            summary.primary = mine.clone().map(|p| p.primary).sum();
            if summary.secondary == 0.0 {
                summary.secondary = mine.clone().map(|p| p.secondary).sum();
            }
        }
        if !has_kills {
            summary.kills = mine.map(|p| p.kills).sum();
        }
    }

    Some(SummaryStats {
        duration_ms: duration_ms(obj).unwrap_or(profile.default_duration_ms),
        teams,
        players,
    })
}

fn read_player(
    raw: &Value,
    idx: usize,
    team: Option<Team>,
    profile: &GameProfile,
) -> Option<PlayerSummary> {
    if !raw.is_object() {
        return None;
    }
    Some(PlayerSummary {
        id: field_identifier(raw, PLAYER_ID_KEYS).unwrap_or_else(|| (idx + 1).to_string()),
        name: field_str(raw, PLAYER_NAME_KEYS).map(str::to_string),
        team,
        kills: field_numeric(raw, &["kills"]).map(count).unwrap_or(0),
        primary: field_numeric(raw, profile.primary_fields).unwrap_or(0.0),
        secondary: field_numeric(raw, profile.secondary_fields).unwrap_or(0.0),
    })
}

fn team_objectives(raw_team: &Value) -> BTreeMap<String, u32> {
    let mut out: BTreeMap<String, u32> = BTreeMap::new();
    for (field, kind) in OBJECTIVE_STAT_FIELDS {
        if let Some(n) = field_numeric(raw_team, &[*field]) {
            *out.entry(kind.to_string()).or_default() += count(n);
        }
    }
    // Series-state form: [{"type": "slayDragon", "completionCount": 2}]
    if let Some(list) = field_array(raw_team, &["objectives"]) {
        for objective in list {
            let Some(name) = field_str(objective, &["type", "id", "name"]) else {
                continue;
            };
            let n = field_numeric(objective, &["completionCount", "count"]).unwrap_or(1.0);
            *out.entry(objective_kind(name)).or_default() += count(n);
        }
    }
    out
}

/// Collapse a free-form objective name onto a short kind.
fn objective_kind(name: &str) -> String {
    let lower = name.to_lowercase();
    ["tower", "turret", "dragon", "baron", "herald", "inhibitor", "nexus", "round"]
        .iter()
        .find(|k| lower.contains(**k))
        .map(|k| if *k == "turret" { "tower" } else { *k })
        .map_or(lower.clone(), str::to_string)
}

fn count(n: f64) -> u32 {
    n.max(0.0).round() as u32
}

fn duration_ms(obj: &Value) -> Option<u64> {
    DURATION_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(parse_duration_ms))
        .or_else(|| {
            let secs = numeric(obj.get("clock")?.get("currentSeconds")?, &[])?;
            Some((secs.max(0.0) * 1000.0).round() as u64)
        })
        .filter(|ms| *ms > 0)
}

/// Parse a match duration into milliseconds.
///
/// Accepts plain seconds (number or numeric string), ISO-8601-like
/// `PT32M15S`, `32m15s`, and clock forms `32:15` / `1:02:03`.
pub fn parse_duration_ms(value: &Value) -> Option<u64> {
    if let Some(secs) = numeric(value, &[]) {
        return Some((secs.max(0.0) * 1000.0).round() as u64);
    }
    let text = value.as_str()?.trim();
    let secs = clock_seconds(text).or_else(|| unit_seconds(text))?;
    Some((secs * 1000.0).round() as u64)
}

static RE_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d+):(\d+(?:\.\d+)?)$").expect("valid clock regex")
});
static RE_UNITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P?T?\s*(?:(\d+(?:\.\d+)?)\s*H)?\s*(?:(\d+(?:\.\d+)?)\s*M)?\s*(?:(\d+(?:\.\d+)?)\s*S)?$",
    )
    .expect("valid duration regex")
});

/// `mm:ss` or `hh:mm:ss`.
fn clock_seconds(text: &str) -> Option<f64> {
    let caps = RE_CLOCK.captures(text)?;
    Some(sum_groups(&caps, &[3600.0, 60.0, 1.0]))
}

/// ISO-8601-like `PT1H2M3S` or a bare `32m15s`; at least one unit required.
fn unit_seconds(text: &str) -> Option<f64> {
    let caps = RE_UNITS.captures(text)?;
    (1..=3)
        .any(|i| caps.get(i).is_some())
        .then(|| sum_groups(&caps, &[3600.0, 60.0, 1.0]))
}

fn sum_groups(caps: &Captures<'_>, scales: &[f64; 3]) -> f64 {
    scales
        .iter()
        .enumerate()
        .filter_map(|(i, scale)| {
            let n: f64 = caps.get(i + 1)?.as_str().parse().ok()?;
            Some(n * scale)
        })
        .sum()
}

// ── Synthesis ────────────────────────────────────────────────────────────────

/// Neutral single snapshot used when nothing else is available.
pub fn baseline(kind: GameKind) -> Snapshot {
    let start = kind.profile().starting_team_resource;
    let mut snapshot = Snapshot::empty(0);
    snapshot.team_totals = TeamPair {
        team_a: TeamTotals {
            primary: start,
            secondary: 0.0,
        },
        team_b: TeamTotals {
            primary: start,
            secondary: 0.0,
        },
    };
    snapshot.synthetic = true;
    snapshot
}

/// Synthetic snapshot curve from summary statistics, or the baseline.
pub fn synthesize(
    summary: Option<&SummaryStats>,
    kind: GameKind,
    params: &SynthesisParams,
) -> Vec<Snapshot> {
    let Some(summary) = summary else {
        return vec![baseline(kind)];
    };
    let n = params.points.max(MIN_POINTS);
    (0..n)
        .map(|i| {
            let progress = i as f64 / (n - 1) as f64;
            synthetic_point(summary, progress, params.growth_exponent)
        })
        .collect()
}

fn synthetic_point(summary: &SummaryStats, progress: f64, k: f64) -> Snapshot {
    let growth = progress.powf(k);
    let scaled = |c: u32| (c as f64 * progress).floor() as u32;
    let mut snapshot = Snapshot::empty((summary.duration_ms as f64 * progress).round() as u64);

    for side in [Team::A, Team::B] {
        let team = summary.teams.get(side);
        *snapshot.team_totals.get_mut(side) = TeamTotals {
            primary: team.primary * growth,
            secondary: team.secondary * growth,
        };
        *snapshot.cumulative_kills.get_mut(side) = scaled(team.kills);
        for (objective, total) in &team.objectives {
            let taken = scaled(*total);
            *snapshot
                .objective_captures
                .entry(objective.clone())
                .or_default()
                .get_mut(side) = taken;
            *snapshot
                .cumulative_objective_counts
                .entry(objective.clone())
                .or_default() += side.sign() * taken as i64;
        }
    }
    snapshot.resource_diff = snapshot.team_totals.team_a.primary - snapshot.team_totals.team_b.primary;
    snapshot.secondary_diff =
        snapshot.team_totals.team_a.secondary - snapshot.team_totals.team_b.secondary;

    snapshot.participants = summary
        .players
        .iter()
        .map(|p| {
            let mut counters = BTreeMap::new();
            counters.insert("kills".to_string(), scaled(p.kills) as f64);
            let state = ParticipantState {
                id: p.id.clone(),
                name: p.name.clone(),
                team: p.team,
                primary_resource: p.primary * growth,
                secondary_resource: p.secondary * growth,
                auxiliary_counters: counters,
                position: None,
            };
            (p.id.clone(), state)
        })
        .collect();
    snapshot.synthetic = true;
    snapshot
}

/// Synthetic kill and objective events spread evenly across the match.
///
/// Each player's kills are paired with the least-targeted opponent so far
/// (ties go to roster order); without a known opponent the target is the
/// opposing team itself. Output is sorted by timestamp, stable.
pub fn synthesize_events(summary: &SummaryStats, kind: GameKind) -> Vec<Event> {
    let profile = kind.profile();
    let duration = summary.duration_ms as f64;
    let spread = |j: u32, total: u32| (duration * (j + 1) as f64 / (total + 1) as f64).round() as u64;
    let mut targeted: BTreeMap<&str, u32> = BTreeMap::new();
    let mut events = Vec::new();

    let has_player_kills = summary.players.iter().any(|p| p.kills > 0);
    for player in &summary.players {
        let side = player.team.unwrap_or(Team::A);
        for j in 0..player.kills {
            let victim = summary
                .players
                .iter()
                .filter(|o| o.team == Some(side.opponent()))
                .min_by_key(|o| targeted.get(o.id.as_str()).copied().unwrap_or(0));
            let target_id = match victim {
                Some(v) => {
                    *targeted.entry(v.id.as_str()).or_default() += 1;
                    v.id.clone()
                }
                None => side.opponent().label().to_string(),
            };
            events.push(synthetic_event(
                EventKind::Kill,
                profile.kill_event_type,
                spread(j, player.kills),
                player.id.clone(),
                Some(target_id),
                None,
                side,
            ));
        }
    }

    for side in [Team::A, Team::B] {
        let team = summary.teams.get(side);
        if !has_player_kills {
            for j in 0..team.kills {
                events.push(synthetic_event(
                    EventKind::Kill,
                    profile.kill_event_type,
                    spread(j, team.kills),
                    side.label().to_string(),
                    Some(side.opponent().label().to_string()),
                    None,
                    side,
                ));
            }
        }
        for (objective, total) in &team.objectives {
            for j in 0..*total {
                events.push(synthetic_event(
                    EventKind::ObjectiveCapture,
                    profile.objective_event_type,
                    spread(j, *total),
                    side.label().to_string(),
                    None,
                    Some(objective.clone()),
                    side,
                ));
            }
        }
    }

    events.sort_by_key(|e| e.timestamp);
    events
}

fn synthetic_event(
    kind: EventKind,
    event_type: &str,
    timestamp: u64,
    actor_id: String,
    target_id: Option<String>,
    objective_subtype: Option<String>,
    team: Team,
) -> Event {
    Event {
        kind,
        event_type: event_type.to_string(),
        timestamp,
        actor_id,
        target_id,
        objective_subtype,
        team: Some(team),
        assists: Vec::new(),
        headshot: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn grid_stats() -> Value {
        json!({"data": {"seriesStats": {"games": [
            {"duration": "PT10M0S",
             "teamStats": [
                {"teamId": "100", "goldEarned": 9000, "kills": 2, "towersDestroyed": 3, "dragonsKilled": 1},
                {"teamId": "200", "goldEarned": 6000, "kills": 1, "baronsKilled": 1}
             ],
             "playerStats": [
                {"playerId": "1", "teamId": "100", "kills": 2, "goldEarned": 5000},
                {"playerId": "2", "teamId": "100", "kills": 0, "goldEarned": 4000},
                {"playerId": "6", "teamId": "200", "kills": 1, "goldEarned": 3000},
                {"playerId": "7", "teamId": "200", "kills": 0, "goldEarned": 3000}
             ]}
        ]}}})
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration_ms(&json!("PT32M15S")), Some(1_935_000));
        assert_eq!(parse_duration_ms(&json!("32m15s")), Some(1_935_000));
        assert_eq!(parse_duration_ms(&json!("32:15")), Some(1_935_000));
        assert_eq!(parse_duration_ms(&json!("1:00:00")), Some(3_600_000));
        assert_eq!(parse_duration_ms(&json!(90)), Some(90_000));
        assert_eq!(parse_duration_ms(&json!("1935")), Some(1_935_000));
        assert_eq!(parse_duration_ms(&json!("soon")), None);
        assert_eq!(parse_duration_ms(&json!("PT")), None);
        assert_eq!(parse_duration_ms(&json!("PT1H2M3.5S")), Some(3_723_500));
        assert_eq!(parse_duration_ms(&json!("pt45s")), Some(45_000));
        assert_eq!(parse_duration_ms(&json!("15S32M")), None);
        assert_eq!(parse_duration_ms(&json!("1:2:3:4")), None);
    }

    #[test]
    fn test_series_stats_summary() {
        let stats = summary_stats(&grid_stats(), GameKind::LeagueOfLegends).unwrap();
        assert_eq!(stats.duration_ms, 600_000);
        assert_relative_eq!(stats.teams.team_a.primary, 9000.0);
        assert_eq!(stats.teams.team_a.kills, 2);
        assert_eq!(stats.teams.team_a.objectives["tower"], 3);
        assert_eq!(stats.teams.team_b.objectives["baron"], 1);
        assert_eq!(stats.players.len(), 4);
        assert_eq!(stats.players[2].team, Some(Team::B));
    }

    #[test]
    fn test_series_state_team_summary() {
        let payload = json!({"seriesState": {"games": [{
            "clock": {"currentSeconds": 1200},
            "teams": [
                {"id": "t1", "name": "Blue", "objectives": [{"type": "slayDragon", "completionCount": 2}],
                 "players": [{"id": "p1", "kills": 3, "netWorth": 7000}]},
                {"id": "t2", "name": "Red", "players": [{"id": "p2", "kills": 1, "netWorth": 5000}]}
            ]
        }]}});
        let stats = summary_stats(&payload, GameKind::LeagueOfLegends).unwrap();
        assert_eq!(stats.duration_ms, 1_200_000);
        assert_eq!(stats.teams.team_a.objectives["dragon"], 2);
        // team totals derived from players
        assert_relative_eq!(stats.teams.team_a.primary, 7000.0);
        assert_eq!(stats.teams.team_b.kills, 1);
        assert_eq!(stats.players[0].team, Some(Team::A));
    }

    #[test]
    fn test_no_summary() {
        assert!(summary_stats(&json!({"frames": []}), GameKind::Valorant).is_none());
    }

    #[test]
    fn test_baseline_without_summary() {
        let snaps = synthesize(None, GameKind::LeagueOfLegends, &SynthesisParams::default());
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].resource_diff, 0.0);
        assert_eq!(snaps[0].timestamp, 0);
        assert!(snaps[0].synthetic);
        assert!(snaps[0].team_totals.team_a.primary > 0.0);
    }

    #[test]
    fn test_synthetic_curve_shape() {
        let stats = summary_stats(&grid_stats(), GameKind::LeagueOfLegends).unwrap();
        let params = SynthesisParams {
            points: 3,
            growth_exponent: 1.2,
        };
        let snaps = synthesize(Some(&stats), GameKind::LeagueOfLegends, &params);
        assert_eq!(snaps.len(), MIN_POINTS);
        assert_eq!(snaps[0].timestamp, 0);
        assert_eq!(snaps[5].timestamp, 600_000);
        assert_relative_eq!(snaps[0].resource_diff, 0.0);
        assert_relative_eq!(snaps[5].resource_diff, 3000.0);
        // non-linear: midpoint below the straight line
        let mid = snaps[2].team_totals.team_a.primary;
        assert!(mid < 9000.0 * 0.4);
        assert_eq!(snaps[5].cumulative_objective_counts["tower"], 3);
        assert_eq!(snaps[5].cumulative_objective_counts["baron"], -1);
        for pair in snaps.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
            assert!(pair[0].cumulative_kills.team_a <= pair[1].cumulative_kills.team_a);
            assert!(pair[0].objective_captures.get("tower").map_or(0, |c| c.team_a)
                <= pair[1].objective_captures.get("tower").map_or(0, |c| c.team_a));
        }
    }

    #[test]
    fn test_synthetic_kills_pair_least_targeted() {
        let stats = summary_stats(&grid_stats(), GameKind::LeagueOfLegends).unwrap();
        let events = synthesize_events(&stats, GameKind::LeagueOfLegends);
        let kills: Vec<&Event> = events.iter().filter(|e| e.kind == EventKind::Kill).collect();
        assert_eq!(kills.len(), 3);
        let by_one: Vec<_> = kills.iter().filter(|e| e.actor_id == "1").collect();
        assert_eq!(by_one.len(), 2);
        assert_eq!(by_one[0].target_id.as_deref(), Some("6"));
        assert_eq!(by_one[1].target_id.as_deref(), Some("7"));
        assert_eq!(by_one[0].timestamp, 200_000);
        assert!(kills.iter().all(|e| e.target_id.is_some()));
        let objectives = events.iter().filter(|e| e.kind == EventKind::ObjectiveCapture).count();
        assert_eq!(objectives, 5);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_team_only_kills_have_placeholder_actors() {
        let stats = SummaryStats {
            duration_ms: 1000,
            teams: TeamPair {
                team_a: TeamSummary {
                    kills: 1,
                    ..TeamSummary::default()
                },
                team_b: TeamSummary::default(),
            },
            players: Vec::new(),
        };
        let events = synthesize_events(&stats, GameKind::Valorant);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_id, "Team A");
        assert_eq!(events[0].target_id.as_deref(), Some("Team B"));
        assert_eq!(events[0].event_type, "kill");
    }
}
