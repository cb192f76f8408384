//! Locates the time-ordered frame list inside an arbitrarily shaped payload.
//!
//! Shapes, tried in order:
//! ```text
//!  (a) { "frames": [...] }                      root (or root "payload")
//!  (b) { "data": { "seriesState": { "games": [
//!        { "frames": [...] }                    per game
//!        { "segments": [ { "frames" | "snapshots" | "states": [...] },
//!                        { "payload": { "frames": [...] } } ] }
//!      ] } } }
//!  (c) a game carrying teams/participants but no frames → one frame
//! ```

use serde_json::Value;
use tracing::debug;

use super::lookup::{field_array, field_numeric, resolve_first, Strategy};

/// Keys under which a segment may carry its frames.
pub const FRAME_KEYS: &[&str] = &["frames", "snapshots", "states"];

/// Keys whose presence marks an object as carrying roster data.
const ROSTER_KEYS: &[&str] = &["teams", "participants", "players", "participantFrames"];

/// Resolve the ordered frame-like objects in `payload`.
///
/// Returns an empty list only when no known shape matches. Pure apart from
/// debug logging; calling it twice yields the same frames.
pub fn resolve(payload: &Value) -> Vec<&Value> {
    match resolve_first(payload, &frame_strategies()) {
        Some((strategy, frames)) => {
            debug!("Resolved {} frame(s) via '{}'", frames.len(), strategy);
            frames
        }
        None => {
            debug!("No frame-bearing shape found in payload");
            Vec::new()
        }
    }
}

fn frame_strategies<'a>() -> [Strategy<'a, Vec<&'a Value>>; 3] {
    [
        Strategy {
            name: "root_frames",
            run: root_frames,
        },
        Strategy {
            name: "series_state_games",
            run: series_game_frames,
        },
        Strategy {
            name: "game_as_frame",
            run: game_as_frame,
        },
    ]
}

fn root_frames(payload: &Value) -> Option<Vec<&Value>> {
    let list = field_array(payload, &["frames"])
        .or_else(|| payload.get("payload").and_then(|p| field_array(p, &["frames"])))?;
    Some(list.iter().collect())
}

fn series_game_frames(payload: &Value) -> Option<Vec<&Value>> {
    games_recent_first(payload)
        .into_iter()
        .map(game_frames)
        .find(|frames| !frames.is_empty())
}

fn game_as_frame(payload: &Value) -> Option<Vec<&Value>> {
    games_recent_first(payload)
        .into_iter()
        .find(|g| carries_roster(g))
        .map(|g| vec![g])
}

/// The series-state object, wherever the envelope put it.
pub fn series_state(payload: &Value) -> Option<&Value> {
    let wrapped = payload
        .get("data")
        .and_then(|d| d.get("seriesState"))
        .or_else(|| payload.get("seriesState"))
        .or_else(|| payload.get("series_state"));
    match wrapped {
        Some(state) if state.is_object() => Some(state),
        _ if payload.get("games").is_some_and(Value::is_array) => Some(payload),
        _ => None,
    }
}

/// Games ordered most recent first: by `sequenceNumber` when present,
/// otherwise by reverse position in the list.
pub fn games_recent_first(payload: &Value) -> Vec<&Value> {
    let Some(games) = series_state(payload).and_then(|s| s.get("games")).and_then(Value::as_array)
    else {
        return Vec::new();
    };
    let mut ranked: Vec<(i64, usize, &Value)> = games
        .iter()
        .enumerate()
        .filter(|(_, g)| g.is_object())
        .map(|(idx, g)| {
            let seq = field_numeric(g, &["sequenceNumber", "matchNumber", "number"])
                .map(|n| n as i64)
                .unwrap_or(idx as i64);
            (seq, idx, g)
        })
        .collect();
    ranked.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    ranked.into_iter().map(|(_, _, g)| g).collect()
}

/// The game events are read from: the most recent one with frames, else
/// the most recent one carrying a roster, else the most recent game.
pub fn active_game(payload: &Value) -> Option<&Value> {
    let games = games_recent_first(payload);
    games
        .iter()
        .find(|g| !game_frames(g).is_empty())
        .or_else(|| games.iter().find(|g| carries_roster(g)))
        .or_else(|| games.first())
        .copied()
}

/// Frames of one game: its own `frames`, else every segment's frames
/// concatenated in segment order.
pub fn game_frames(game: &Value) -> Vec<&Value> {
    if let Some(frames) = field_array(game, &["frames"]) {
        return frames.iter().collect();
    }
    game.get("segments")
        .and_then(Value::as_array)
        .map(|segments| segments.iter().flat_map(segment_frames).collect())
        .unwrap_or_default()
}

/// A segment's frames at segment level, else one level under `payload`.
pub fn segment_frames(segment: &Value) -> Vec<&Value> {
    field_array(segment, FRAME_KEYS)
        .or_else(|| segment.get("payload").and_then(|p| field_array(p, FRAME_KEYS)))
        .map(|list| list.iter().collect())
        .unwrap_or_default()
}

fn carries_roster(obj: &Value) -> bool {
    ROSTER_KEYS.iter().any(|k| match obj.get(*k) {
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        _ => false,
    })
}
