//! Per-participant efficiency scoring.
//!
//! Composite in `[0, 100]`:
//! ```text
//!   resource   min(resource_per_minute / resource_per_point, 50)
//!   secondary  League: min(vision_per_minute * 10, 20)
//!              Valorant: headshot_ratio * 20
//!   kills      min(kills * 3, 30)
//! ```

use std::collections::BTreeMap;

use crate::game::{GameKind, SecondaryStat};
use crate::models::{Event, EventKind, ParticipantState, PlayerScore, Snapshot};
use crate::normalize::lookup::id_sort_key;

const RESOURCE_CAP: f64 = 50.0;
const SECONDARY_CAP: f64 = 20.0;
const KILL_POINTS: f64 = 3.0;
const KILL_CAP: f64 = 30.0;
const SCORE_CAP: f64 = 100.0;

/// Score every participant seen anywhere in `history`, as of its last
/// snapshot. Only events at or before that snapshot count.
///
/// # Arguments
/// * `history` – snapshots up to and including the scoring instant
/// * `events`  – canonical events; later ones are ignored
pub fn score(history: &[Snapshot], events: &[Event], kind: GameKind) -> Vec<PlayerScore> {
    let Some(latest) = history.last() else {
        return Vec::new();
    };
    let profile = kind.profile();
    let minutes = (latest.timestamp as f64 / 60_000.0).max(1.0);
    let events: Vec<&Event> = events
        .iter()
        .filter(|e| e.timestamp <= latest.timestamp)
        .collect();

    // Latest observation of each participant across the whole history.
    let mut observed: BTreeMap<&str, &ParticipantState> = BTreeMap::new();
    for snapshot in history {
        for (id, state) in &snapshot.participants {
            observed.insert(id.as_str(), state);
        }
    }

    let mut scores: Vec<PlayerScore> = observed
        .into_iter()
        .map(|(id, state)| {
            let kills: Vec<&&Event> = events
                .iter()
                .filter(|e| e.kind == EventKind::Kill && e.actor_id == id)
                .collect();
            let kill_count = kills.len() as u32;

            let resource_per_minute = state.primary_resource / minutes;
            let resource_points = (resource_per_minute / profile.resource_per_point)
                .clamp(0.0, RESOURCE_CAP);

            let (secondary_metric, secondary_points) = match profile.secondary_stat {
                SecondaryStat::VisionPerMinute(fields) => {
                    let per_minute = state.counter(fields).unwrap_or(0.0) / minutes;
                    (per_minute, (per_minute * 10.0).clamp(0.0, SECONDARY_CAP))
                }
                SecondaryStat::HeadshotRatio => {
                    let ratio = headshot_ratio(state, &kills);
                    (ratio, ratio * SECONDARY_CAP)
                }
            };

            let kill_points = (kill_count as f64 * KILL_POINTS).min(KILL_CAP);
            let total = (resource_points + secondary_points + kill_points).min(SCORE_CAP);

            PlayerScore {
                participant: id.to_string(),
                team: state.team,
                score: if total.is_finite() { total } else { 0.0 },
                resource_per_minute,
                kills: kill_count,
                secondary_metric,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| id_sort_key(&a.participant).cmp(&id_sort_key(&b.participant)))
    });
    scores
}

/// Headshot kills over kills, from flagged kill events when any carry the
/// flag, else from the participant's own counters.
fn headshot_ratio(state: &ParticipantState, kills: &[&&Event]) -> f64 {
    let flagged: Vec<bool> = kills.iter().filter_map(|e| e.headshot).collect();
    let ratio = if !flagged.is_empty() {
        flagged.iter().filter(|h| **h).count() as f64 / flagged.len() as f64
    } else {
        match (state.counter(&["headshots"]), state.counter(&["kills"])) {
            (Some(hs), Some(k)) if k > 0.0 => hs / k,
            _ => 0.0,
        }
    };
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Team;
    use approx::assert_relative_eq;

    fn participant(id: &str, team: Team, primary: f64, counters: &[(&str, f64)]) -> ParticipantState {
        ParticipantState {
            id: id.to_string(),
            name: None,
            team: Some(team),
            primary_resource: primary,
            secondary_resource: 0.0,
            auxiliary_counters: counters.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            position: None,
        }
    }

    fn snapshot(ts: u64, players: Vec<ParticipantState>) -> Snapshot {
        let mut s = Snapshot::empty(ts);
        s.participants = players.into_iter().map(|p| (p.id.clone(), p)).collect();
        s
    }

    fn kill(ts: u64, actor: &str, headshot: Option<bool>) -> Event {
        Event {
            kind: EventKind::Kill,
            event_type: "kill".to_string(),
            timestamp: ts,
            actor_id: actor.to_string(),
            target_id: Some("x".to_string()),
            objective_subtype: None,
            team: None,
            assists: Vec::new(),
            headshot,
        }
    }

    #[test]
    fn test_league_components() {
        // 10 minutes, 4000 gold → 400 gpm → 40 points; 20 wards → 2/min → 20 points
        let history = vec![snapshot(
            600_000,
            vec![participant("1", Team::A, 4000.0, &[("wardsPlaced", 20.0)])],
        )];
        let events = vec![kill(1_000, "1", None), kill(2_000, "1", None)];
        let scores = score(&history, &events, GameKind::LeagueOfLegends);
        assert_relative_eq!(scores[0].resource_per_minute, 400.0);
        assert_relative_eq!(scores[0].secondary_metric, 2.0);
        assert_eq!(scores[0].kills, 2);
        assert_relative_eq!(scores[0].score, 40.0 + 20.0 + 6.0);
    }

    #[test]
    fn test_score_is_capped() {
        let history = vec![snapshot(
            60_000,
            vec![participant("1", Team::A, 100_000.0, &[("visionScore", 500.0)])],
        )];
        let events: Vec<Event> = (0..20).map(|i| kill(i, "1", None)).collect();
        let scores = score(&history, &events, GameKind::LeagueOfLegends);
        assert_relative_eq!(scores[0].score, 100.0);
    }

    #[test]
    fn test_participants_from_earlier_snapshots_are_scored() {
        let history = vec![
            snapshot(0, vec![participant("7", Team::B, 500.0, &[])]),
            snapshot(60_000, vec![participant("1", Team::A, 600.0, &[])]),
        ];
        let scores = score(&history, &[], GameKind::LeagueOfLegends);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].participant, "1");
        assert_eq!(scores[1].participant, "7");
    }

    #[test]
    fn test_events_after_snapshot_ignored() {
        let history = vec![snapshot(60_000, vec![participant("1", Team::A, 0.0, &[])])];
        let events = vec![kill(60_000, "1", None), kill(60_001, "1", None)];
        assert_eq!(score(&history, &events, GameKind::LeagueOfLegends)[0].kills, 1);
    }

    #[test]
    fn test_valorant_headshot_ratio_from_events() {
        let history = vec![snapshot(120_000, vec![participant("p1", Team::A, 0.0, &[])])];
        let events = vec![
            kill(1_000, "p1", Some(true)),
            kill(2_000, "p1", Some(false)),
            kill(3_000, "p1", Some(true)),
            kill(4_000, "p1", Some(true)),
        ];
        let scores = score(&history, &events, GameKind::Valorant);
        assert_relative_eq!(scores[0].secondary_metric, 0.75);
        assert_relative_eq!(scores[0].score, 15.0 + 12.0);
    }

    #[test]
    fn test_valorant_headshot_ratio_from_counters() {
        let history = vec![snapshot(
            60_000,
            vec![participant("p1", Team::A, 0.0, &[("kills", 4.0), ("headshots", 1.0)])],
        )];
        let scores = score(&history, &[], GameKind::Valorant);
        assert_relative_eq!(scores[0].secondary_metric, 0.25);
    }

    #[test]
    fn test_ties_break_by_id() {
        let history = vec![snapshot(
            60_000,
            vec![
                participant("10", Team::B, 0.0, &[]),
                participant("2", Team::A, 0.0, &[]),
            ],
        )];
        let ids: Vec<String> = score(&history, &[], GameKind::LeagueOfLegends)
            .into_iter()
            .map(|s| s.participant)
            .collect();
        assert_eq!(ids, vec!["2".to_string(), "10".to_string()]);
    }

    #[test]
    fn test_empty_history() {
        assert!(score(&[], &[], GameKind::LeagueOfLegends).is_empty());
    }
}
