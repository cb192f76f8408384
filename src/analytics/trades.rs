//! Trade / isolation classification of deaths.
//!
//! A death is traded when a teammate of the victim scores a kill strictly
//! after the death and strictly before `death + window`. Otherwise the
//! death is isolated and reported with high severity.

use tracing::debug;

use crate::game::GameKind;
use crate::models::{DeathRecord, Event, EventKind, Severity, Team};
use crate::normalize::team::Attribution;

/// Classify every death in `events` using the title's trade window.
pub fn classify(events: &[Event], kind: GameKind) -> Vec<DeathRecord> {
    classify_with_window(
        events,
        &Attribution::new(kind.team_resolver()),
        kind.profile().trade_window_ms,
    )
}

/// Classify deaths against an explicit window in milliseconds.
///
/// Victims are placed by `attribution`, which should carry the roster the
/// snapshots resolved. `events` is searched in the order given; when several
/// kills qualify as the reprisal, the first one in that order is reported.
pub fn classify_with_window(
    events: &[Event],
    attribution: &Attribution<'_>,
    window_ms: u64,
) -> Vec<DeathRecord> {
    let kills: Vec<&Event> = events.iter().filter(|e| e.kind == EventKind::Kill).collect();

    let deaths: Vec<DeathRecord> = kills
        .iter()
        .filter_map(|kill| {
            let victim = kill.target_id.as_deref().filter(|v| !v.is_empty())?;
            let victim_team = victim_team(kill, victim, attribution);
            let death_ts = kill.timestamp;
            let horizon = death_ts.saturating_add(window_ms);

            let reprisal = kills.iter().find(|other| {
                other.timestamp > death_ts
                    && other.timestamp < horizon
                    && killer_team(other, attribution) == Some(victim_team)
            });

            Some(DeathRecord {
                participant: victim.to_string(),
                team: Some(victim_team),
                timestamp: death_ts,
                killer: kill.actor_id.clone(),
                is_traded: reprisal.is_some(),
                traded_by: reprisal.map(|r| r.actor_id.clone()),
                severity: if reprisal.is_some() {
                    Severity::Low
                } else {
                    Severity::High
                },
            })
        })
        .collect();

    let isolated = deaths.iter().filter(|d| !d.is_traded).count();
    debug!(
        "Classified {} death(s): {} traded, {} isolated",
        deaths.len(),
        deaths.len() - isolated,
        isolated
    );
    deaths
}

/// Victim side: roster, id range or slug, else the killer's opponent, else team A.
fn victim_team(kill: &Event, victim: &str, attribution: &Attribution<'_>) -> Team {
    attribution
        .known_team(victim)
        .or_else(|| kill.team.map(Team::opponent))
        .unwrap_or(Team::A)
}

fn killer_team(kill: &Event, attribution: &Attribution<'_>) -> Option<Team> {
    kill.team
        .or_else(|| attribution.participant_team(&kill.actor_id))
}
