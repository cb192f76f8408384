//! Typed event extraction.
//!
//! Walks frames, series-state segments and round lists independently of
//! snapshot construction. Output keeps scan order (frames, then segments,
//! then rounds); callers that need time order sort it themselves.

use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::game::GameKind;
use crate::models::{Event, EventKind, Team};

use super::lookup::{as_timestamp, field_array, field_identifier, field_str, identifier};
use super::schema::{active_game, game_frames, segment_frames};
use super::team::Attribution;

const TYPE_KEYS: &[&str] = &["type", "eventType", "event", "action"];
const ACTOR_KEYS: &[&str] = &[
    "killerId",
    "actorId",
    "killer",
    "actor",
    "playerId",
    "participantId",
    "creatorId",
];
const TARGET_KEYS: &[&str] = &["victimId", "targetId", "victim", "target"];
const SUBTYPE_KEYS: &[&str] = &[
    "monsterType",
    "monsterSubType",
    "buildingType",
    "towerType",
    "objectiveType",
    "subtype",
    "subType",
];
const TIME_KEYS: &[&str] = &["timestamp", "time", "gameTime"];
const KILLER_TEAM_KEYS: &[&str] = &["killerTeamId", "killerTeam"];
const TEAM_KEYS: &[&str] = &["teamId", "team", "side"];

/// Type-string fragments that mark an objective capture.
const OBJECTIVE_MARKERS: &[&str] = &[
    "OBJECTIVE",
    "MONSTER",
    "BUILDING",
    "TOWER",
    "TURRET",
    "INHIBITOR",
    "NEXUS",
    "DRAGON",
    "BARON",
    "HERALD",
];

/// Extract every event in `payload` whose type matches `type_filter`.
///
/// `type_filter` holds case-insensitive substrings; an event matches when its
/// type contains a term or is contained by one. An empty filter matches
/// everything. A repeated `(kind, timestamp, actor)` occurrence is dropped;
/// the first copy wins, however its type is spelled.
pub fn extract(payload: &Value, kind: GameKind, type_filter: &[String]) -> Vec<Event> {
    extract_with(payload, type_filter, &Attribution::new(kind.team_resolver()))
}

/// [`extract`] with actors placed by `attribution`, usually carrying the
/// roster of the built snapshots.
pub fn extract_with(
    payload: &Value,
    type_filter: &[String],
    attribution: &Attribution<'_>,
) -> Vec<Event> {
    let mut seen: HashSet<(EventKind, u64, String)> = HashSet::new();
    let mut out = Vec::new();
    let mut duplicates = 0usize;

    for container in event_containers(payload) {
        let container_ts = container_timestamp(container);
        let Some(raw_events) = container.get("events").and_then(Value::as_array) else {
            continue;
        };
        for raw in raw_events {
            let Some(event) = canonical_event(raw, container_ts, attribution) else {
                continue;
            };
            if !matches_filter(&event.event_type, type_filter) {
                continue;
            }
            if seen.insert(dedup_key(&event)) {
                out.push(event);
            } else {
                duplicates += 1;
            }
        }
    }

    if duplicates > 0 {
        debug!("Dropped {} duplicate event occurrence(s)", duplicates);
    }
    out
}

/// Symmetric, case-insensitive substring match against the filter terms.
pub fn matches_filter(event_type: &str, type_filter: &[String]) -> bool {
    let terms: Vec<String> = type_filter
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return true;
    }
    let ty = event_type.to_lowercase();
    if ty.is_empty() {
        return false;
    }
    terms
        .iter()
        .any(|term| ty.contains(term.as_str()) || term.contains(ty.as_str()))
}

fn dedup_key(event: &Event) -> (EventKind, u64, String) {
    (event.kind, event.timestamp, event.actor_id.clone())
}

/// Objects that may carry an `events` list, in scan order.
fn event_containers(payload: &Value) -> Vec<&Value> {
    let mut containers: Vec<&Value> = Vec::new();

    // Frames at the root
    if let Some(frames) = field_array(payload, &["frames"])
        .or_else(|| payload.get("payload").and_then(|p| field_array(p, &["frames"])))
    {
        containers.extend(frames.iter());
    }

    // Series-state game: frames, then each segment and its frames
    let game = active_game(payload);
    if let Some(game) = game {
        if field_array(game, &["frames"]).is_some() {
            containers.extend(game_frames(game));
        } else if let Some(segments) = game.get("segments").and_then(Value::as_array) {
            for segment in segments {
                containers.push(segment);
                containers.extend(segment_frames(segment));
            }
        }
        containers.push(game);
    }

    // Rounds, at the root and inside the game
    for rounds in [
        field_array(payload, &["rounds"]),
        game.and_then(|g| field_array(g, &["rounds"])),
    ]
    .into_iter()
    .flatten()
    {
        containers.extend(rounds.iter());
    }

    containers
}

fn container_timestamp(container: &Value) -> u64 {
    TIME_KEYS
        .iter()
        .chain(["startTime", "start"].iter())
        .find_map(|k| container.get(*k).and_then(as_timestamp))
        .or_else(|| {
            container
                .get("clock")
                .and_then(|c| c.get("timestamp"))
                .and_then(as_timestamp)
        })
        .unwrap_or(0)
}

/// Classify a source type string.
pub fn classify(event_type: &str) -> EventKind {
    let upper = event_type.to_uppercase();
    if OBJECTIVE_MARKERS.iter().any(|m| upper.contains(m)) {
        EventKind::ObjectiveCapture
    } else if upper.contains("KILL") {
        EventKind::Kill
    } else {
        EventKind::Tactical
    }
}

/// Canonicalize one raw event. Untyped or non-object entries yield `None`.
///
/// The executing team comes from, in order: an explicit `killerTeamId`, the
/// actor's roster/id-range/slug team, a generic `teamId`/`team` label, and
/// finally the team-A default for unplaceable actors.
pub fn canonical_event(
    raw: &Value,
    fallback_ts: u64,
    attribution: &Attribution<'_>,
) -> Option<Event> {
    if !raw.is_object() {
        return None;
    }
    let event_type = field_str(raw, TYPE_KEYS)?.to_string();
    let kind = classify(&event_type);
    let timestamp = TIME_KEYS
        .iter()
        .find_map(|k| raw.get(*k).and_then(as_timestamp))
        .unwrap_or(fallback_ts);
    let actor_id = field_identifier(raw, ACTOR_KEYS).unwrap_or_default();
    let target_id = field_identifier(raw, TARGET_KEYS);
    let objective_subtype = field_str(raw, SUBTYPE_KEYS).map(str::to_lowercase);
    let assists = field_array(raw, &["assistingParticipantIds", "assists", "assisters"])
        .map(|list| list.iter().filter_map(identifier).collect())
        .unwrap_or_default();
    let headshot = ["headshot", "isHeadshot"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_bool));

    let team = label_team(raw, attribution, KILLER_TEAM_KEYS)
        .or_else(|| attribution.known_team(&actor_id))
        .or_else(|| label_team(raw, attribution, TEAM_KEYS))
        .or_else(|| attribution.participant_team(&actor_id));

    Some(Event {
        kind,
        event_type,
        timestamp,
        actor_id,
        target_id,
        objective_subtype,
        team,
        assists,
        headshot,
    })
}

fn label_team(raw: &Value, attribution: &Attribution<'_>, keys: &[&str]) -> Option<Team> {
    field_identifier(raw, keys).and_then(|label| attribution.resolver().normalize_label(&label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_filter() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("CHAMPION_KILL"), EventKind::Kill);
        assert_eq!(classify("kill"), EventKind::Kill);
        assert_eq!(classify("ELITE_MONSTER_KILL"), EventKind::ObjectiveCapture);
        assert_eq!(classify("BUILDING_KILL"), EventKind::ObjectiveCapture);
        assert_eq!(classify("team-destroyed-tower"), EventKind::ObjectiveCapture);
        assert_eq!(classify("spike_planted"), EventKind::Tactical);
        assert_eq!(classify("WARD_PLACED"), EventKind::Tactical);
    }

    #[test]
    fn test_filter_is_symmetric_and_case_insensitive() {
        let filter = vec!["kill".to_string()];
        assert!(matches_filter("CHAMPION_KILL", &filter));
        let filter = vec!["CHAMPION_KILL_SPECIAL".to_string()];
        assert!(matches_filter("champion_kill", &filter));
        let filter = vec!["ward".to_string()];
        assert!(!matches_filter("CHAMPION_KILL", &filter));
        assert!(matches_filter("anything", &[]));
        assert!(matches_filter("anything", &["  ".to_string()]));
    }

    #[test]
    fn test_extract_frames_then_rounds() {
        let payload = json!({
            "frames": [
                {"timestamp": 60000, "events": [
                    {"type": "CHAMPION_KILL", "timestamp": 61000, "killerId": 1, "victimId": 7,
                     "assistingParticipantIds": [2, 3]}
                ]}
            ],
            "rounds": [
                {"events": [{"type": "spike_planted", "timestamp": 5000, "playerId": "6"}]}
            ]
        });
        let events = extract(&payload, GameKind::LeagueOfLegends, &no_filter());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Kill);
        assert_eq!(events[0].actor_id, "1");
        assert_eq!(events[0].target_id.as_deref(), Some("7"));
        assert_eq!(events[0].team, Some(Team::A));
        assert_eq!(events[0].assists, vec!["2".to_string(), "3".to_string()]);
        // scan order, not time order
        assert_eq!(events[1].timestamp, 5000);
        assert_eq!(events[1].team, Some(Team::B));
    }

    #[test]
    fn test_extract_applies_filter() {
        let payload = json!({"frames": [{"timestamp": 0, "events": [
            {"type": "CHAMPION_KILL", "timestamp": 1, "killerId": 1},
            {"type": "WARD_PLACED", "timestamp": 2, "creatorId": 1}
        ]}]});
        let events = extract(&payload, GameKind::LeagueOfLegends, &["kill".to_string()]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "CHAMPION_KILL");
    }

    #[test]
    fn test_frame_and_segment_copies_collapse() {
        let kill = json!({"type": "CHAMPION_KILL", "timestamp": 1000, "killerId": 2, "victimId": 8});
        let payload = json!({
            "frames": [{"timestamp": 0, "events": [kill.clone()]}],
            "seriesState": {"games": [{"segments": [{"events": [kill]}]}]}
        });
        let events = extract(&payload, GameKind::LeagueOfLegends, &no_filter());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_copies_spelled_differently_collapse() {
        let payload = json!({
            "frames": [{"timestamp": 0, "events": [
                {"type": "CHAMPION_KILL", "timestamp": 1000, "killerId": 2, "victimId": 8}
            ]}],
            "seriesState": {"games": [{"segments": [{"events": [
                {"type": "player-killed-player", "timestamp": 1000, "actorId": "2", "targetId": "8"}
            ]}]}]}
        });
        let events = extract(&payload, GameKind::LeagueOfLegends, &no_filter());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "CHAMPION_KILL");
    }

    #[test]
    fn test_same_instant_different_actors_are_kept() {
        let payload = json!({"frames": [{"timestamp": 0, "events": [
            {"type": "ITEM_PURCHASED", "timestamp": 500, "participantId": 4},
            {"type": "ITEM_PURCHASED", "timestamp": 500, "participantId": 5},
            {"type": "SKILL_LEVEL_UP", "timestamp": 501, "participantId": 4}
        ]}]});
        assert_eq!(extract(&payload, GameKind::LeagueOfLegends, &no_filter()).len(), 3);
    }

    #[test]
    fn test_roster_places_actors_outside_id_range() {
        let payload = json!({"frames": [{"timestamp": 0, "events": [
            {"type": "CHAMPION_KILL", "timestamp": 1000, "killerId": 106, "victimId": 101},
            {"type": "CHAMPION_KILL", "timestamp": 2000, "killerId": 102, "victimId": 107}
        ]}]});
        let roster = [("101", Team::A), ("102", Team::A), ("106", Team::B), ("107", Team::B)]
            .into_iter()
            .map(|(id, team)| (id.to_string(), Some(team)))
            .collect();
        let attribution = Attribution::with_roster(GameKind::LeagueOfLegends.team_resolver(), roster);
        let events = extract_with(&payload, &no_filter(), &attribution);
        assert_eq!(events[0].team, Some(Team::B));
        assert_eq!(events[1].team, Some(Team::A));
    }

    #[test]
    fn test_objective_team_prefers_killer_team() {
        let attribution = Attribution::new(GameKind::LeagueOfLegends.team_resolver());
        let raw = json!({"type": "ELITE_MONSTER_KILL", "timestamp": 900000, "killerId": 2,
                         "killerTeamId": 200, "monsterType": "DRAGON"});
        let event = canonical_event(&raw, 0, &attribution).unwrap();
        assert_eq!(event.team, Some(Team::B));
        assert_eq!(event.objective_subtype.as_deref(), Some("dragon"));
    }

    #[test]
    fn test_event_timestamp_falls_back_to_container() {
        let payload = json!({"rounds": [{"startTime": 42000, "events": [
            {"type": "kill", "killer": {"id": "p9"}, "victim": "p1", "headshot": true}
        ]}]});
        let events = extract(&payload, GameKind::Valorant, &no_filter());
        assert_eq!(events[0].timestamp, 42000);
        assert_eq!(events[0].actor_id, "p9");
        assert_eq!(events[0].headshot, Some(true));
    }

    #[test]
    fn test_untyped_events_skipped() {
        let payload = json!({"frames": [{"events": [{"timestamp": 1}, "junk", 4]}]});
        assert!(extract(&payload, GameKind::LeagueOfLegends, &no_filter()).is_empty());
    }
}
