//! Normalization and heuristic analytics for esports match telemetry.
//!
//! ```text
//!  payload ─► schema::resolve ─► SnapshotBuilder ─┬─► (fallback) ─► snapshots
//!          └► events::extract ────────────────────┴─► trades / inflection /
//!                                                     efficiency / decision
//! ```
//!
//! [`analyze`] runs the whole pipeline on one payload. It is synchronous,
//! performs no I/O and shares no state between calls.

pub mod analytics;
pub mod error;
pub mod game;
pub mod models;
pub mod normalize;
pub mod sanitize;

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub use analytics::decision::{LinearLogitModel, WinPredictor};
pub use error::PipelineError;
pub use game::GameKind;
pub use models::MatchReport;
pub use normalize::SynthesisParams;

use analytics::{efficiency, inflection::InflectionDetector, trades};
use error::json_type_name;
use models::{Event, Snapshot};
use normalize::events::matches_filter;
use normalize::fallback;
use normalize::team::Attribution;

/// Per-call tuning. Everything else is read from the title's profile.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Forces the title; detected from the payload when `None`
    pub game_kind: Option<GameKind>,
    /// Case-insensitive event type substrings; empty keeps every event
    pub event_filter: Vec<String>,
    /// Overrides the title's resource-swing threshold
    pub swing_threshold: Option<f64>,
    pub synthesis: SynthesisParams,
}

/// Run the full pipeline over one payload.
///
/// Only a non-object root is an error; every other shape problem resolves
/// to a default. When no predictor is given the default
/// [`LinearLogitModel`] is used.
pub fn analyze(
    payload: &Value,
    options: &AnalysisOptions,
    predictor: Option<&dyn WinPredictor>,
) -> Result<MatchReport, PipelineError> {
    if !payload.is_object() {
        return Err(PipelineError::MalformedPayload(json_type_name(payload)));
    }
    let kind = options.game_kind.unwrap_or_else(|| GameKind::detect(payload));
    debug!("Analyzing payload as {}", kind);

    let frames = normalize::resolve(payload);
    let built = normalize::SnapshotBuilder::new(kind).build(&frames);
    let summary = fallback::summary_stats(payload, kind);
    let mut roster = normalize::roster(&built);
    let (snapshots, synthetic_snapshots) = choose_snapshots(built, summary.as_ref(), kind, options);
    for (id, team) in normalize::roster(&snapshots) {
        roster.entry(id).or_insert(team);
    }
    let attribution = Attribution::with_roster(kind.team_resolver(), roster);

    // Extraction order is kept for trade correlation; the report is time-ordered.
    let mut events = normalize::extract_with(payload, &options.event_filter, &attribution);
    let mut synthetic_events = false;
    if events.is_empty() {
        if let Some(summary) = &summary {
            events = fallback::synthesize_events(summary, kind)
                .into_iter()
                .filter(|e| matches_filter(&e.event_type, &options.event_filter))
                .collect();
            synthetic_events = !events.is_empty();
        }
    }
    let window_ms = kind.profile().trade_window_ms;
    let deaths = trades::classify_with_window(&events, &attribution, window_ms);
    events.sort_by_key(|e| e.timestamp);

    let inflections = InflectionDetector::for_game(kind)
        .with_threshold(options.swing_threshold)
        .detect(&snapshots, &events);
    let scores = efficiency::score(&snapshots, &events, kind);
    let objectives = analytics::objective_control(&events);

    let fallback_model = LinearLogitModel::default();
    let predictor = predictor.unwrap_or(&fallback_model);
    let decision = snapshots
        .last()
        .map(|last| analytics::assess(predictor, last, kind));

    info!(
        "Analyzed {} payload: {} snapshot(s), {} event(s), {} inflection(s), {} death(s)",
        kind,
        snapshots.len(),
        events.len(),
        inflections.len(),
        deaths.len()
    );

    Ok(MatchReport {
        game_kind: kind,
        synthetic: synthetic_snapshots || synthetic_events,
        snapshots,
        events,
        inflections,
        deaths,
        scores,
        objectives,
        decision,
    }
    .sanitize())
}

/// [`analyze`] over raw JSON text.
pub fn analyze_str(
    text: &str,
    options: &AnalysisOptions,
    predictor: Option<&dyn WinPredictor>,
) -> Result<MatchReport, PipelineError> {
    let payload: Value = serde_json::from_str(text)?;
    analyze(&payload, options, predictor)
}

/// Keep built snapshots when they show a trend; otherwise synthesize from
/// summary statistics, or fall back to a single baseline.
fn choose_snapshots(
    built: Vec<Snapshot>,
    summary: Option<&fallback::SummaryStats>,
    kind: GameKind,
    options: &AnalysisOptions,
) -> (Vec<Snapshot>, bool) {
    let distinct: BTreeSet<u64> = built.iter().map(|s| s.timestamp).collect();
    if distinct.len() >= 2 {
        return (built, false);
    }
    match summary {
        Some(summary) => {
            info!(
                "Only {} distinct timestamp(s) across {} frame(s); synthesizing from summary statistics",
                distinct.len(),
                built.len()
            );
            (fallback::synthesize(Some(summary), kind, &options.synthesis), true)
        }
        None if built.is_empty() => {
            info!("No frames or summary statistics; using neutral baseline");
            (fallback::synthesize(None, kind, &options.synthesis), true)
        }
        None => (built, false),
    }
}

/// Events at or before `timestamp`, for scoring a point inside a match.
pub fn events_up_to(events: &[Event], timestamp: u64) -> Vec<Event> {
    events
        .iter()
        .filter(|e| e.timestamp <= timestamp)
        .cloned()
        .collect()
}
