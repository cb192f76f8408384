pub mod decision;
pub mod efficiency;
pub mod inflection;
pub mod trades;

pub use decision::{assess, what_if, DecisionSummary, GameFeatures, LinearLogitModel, WinPredictor};
pub use inflection::InflectionDetector;

use crate::models::{Event, EventKind, ObjectiveControl};
use crate::normalize::snapshot::objective_key;

/// Every objective capture in timestamp order (stable for equal times).
pub fn objective_control(events: &[Event]) -> Vec<ObjectiveControl> {
    let mut out: Vec<ObjectiveControl> = events
        .iter()
        .filter(|e| e.kind == EventKind::ObjectiveCapture)
        .map(|e| ObjectiveControl {
            timestamp: e.timestamp,
            objective: objective_key(e),
            team: e.team,
            actor_id: e.actor_id.clone(),
        })
        .collect();
    out.sort_by_key(|o| o.timestamp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Team;

    fn event(kind: EventKind, ts: u64, event_type: &str, subtype: Option<&str>) -> Event {
        Event {
            kind,
            event_type: event_type.to_string(),
            timestamp: ts,
            actor_id: "4".to_string(),
            target_id: None,
            objective_subtype: subtype.map(str::to_string),
            team: Some(Team::A),
            assists: Vec::new(),
            headshot: None,
        }
    }

    #[test]
    fn test_objective_control_orders_captures() {
        let events = vec![
            event(EventKind::ObjectiveCapture, 900, "BUILDING_KILL", Some("tower_building")),
            event(EventKind::Kill, 100, "CHAMPION_KILL", None),
            event(EventKind::ObjectiveCapture, 300, "ELITE_MONSTER_KILL", Some("dragon")),
            event(EventKind::ObjectiveCapture, 300, "OBJECTIVE_CAPTURE", None),
        ];
        let control = objective_control(&events);
        assert_eq!(control.len(), 3);
        assert_eq!(control[0].objective, "dragon");
        assert_eq!(control[1].objective, "objective_capture");
        assert_eq!(control[2].objective, "tower_building");
        assert_eq!(control[2].team, Some(Team::A));
    }
}
