//! Win-probability features, the predictor seam and what-if analysis.
//!
//! The trained model is an opaque collaborator: anything implementing
//! [`WinPredictor`] can be plugged in. [`LinearLogitModel`] is the fixed
//! weight stand-in used when none is supplied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::game::GameKind;
use crate::models::Snapshot;

/// Feature names in model order.
pub const FEATURE_NAMES: [&str; 8] = [
    "gold_diff",
    "xp_diff",
    "towers_diff",
    "dragons_diff",
    "barons_diff",
    "time_seconds",
    "team100_kills",
    "team200_kills",
];

/// The eight named model inputs, always from team A's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFeatures {
    pub gold_diff: f64,
    pub xp_diff: f64,
    pub towers_diff: f64,
    pub dragons_diff: f64,
    pub barons_diff: f64,
    pub time_seconds: f64,
    pub team100_kills: f64,
    pub team200_kills: f64,
}

impl GameFeatures {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        GameFeatures {
            gold_diff: snapshot.resource_diff,
            xp_diff: snapshot.secondary_diff,
            towers_diff: snapshot.objective_diff(&["tower", "turret"]) as f64,
            dragons_diff: snapshot.objective_diff(&["dragon"]) as f64,
            barons_diff: snapshot.objective_diff(&["baron"]) as f64,
            time_seconds: snapshot.timestamp as f64 / 1000.0,
            team100_kills: snapshot.cumulative_kills.team_a as f64,
            team200_kills: snapshot.cumulative_kills.team_b as f64,
        }
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; 8] {
        [
            self.gold_diff,
            self.xp_diff,
            self.towers_diff,
            self.dragons_diff,
            self.barons_diff,
            self.time_seconds,
            self.team100_kills,
            self.team200_kills,
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = FEATURE_NAMES.iter().position(|n| *n == name)?;
        Some(self.values()[idx])
    }

    /// Set a feature by name. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "gold_diff" => &mut self.gold_diff,
            "xp_diff" => &mut self.xp_diff,
            "towers_diff" => &mut self.towers_diff,
            "dragons_diff" => &mut self.dragons_diff,
            "barons_diff" => &mut self.barons_diff,
            "time_seconds" => &mut self.time_seconds,
            "team100_kills" => &mut self.team100_kills,
            "team200_kills" => &mut self.team200_kills,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Black-box win-probability oracle for team A.
pub trait WinPredictor: Send + Sync {
    /// Probability in `[0, 1]` that team A wins.
    fn predict(&self, features: &GameFeatures) -> f64;

    /// Signed per-feature contribution to the prediction.
    fn explain(&self, features: &GameFeatures) -> BTreeMap<String, f64>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// `p = sigmoid(bias + Σ wᵢ·xᵢ)`; contributions are the individual `wᵢ·xᵢ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearLogitModel {
    pub bias: f64,
    /// Weights in [`FEATURE_NAMES`] order
    pub weights: [f64; 8],
}

impl Default for LinearLogitModel {
    fn default() -> Self {
        LinearLogitModel {
            bias: 0.0,
            // 1k gold ≈ +0.4 logit, a baron ≈ two dragons
            weights: [0.0004, 0.0002, 0.3, 0.35, 0.8, 0.0, 0.05, -0.05],
        }
    }
}

impl LinearLogitModel {
    fn terms(&self, features: &GameFeatures) -> [f64; 8] {
        let values = features.values();
        let mut out = [0.0; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.weights[i] * values[i];
        }
        out
    }
}

impl WinPredictor for LinearLogitModel {
    fn predict(&self, features: &GameFeatures) -> f64 {
        let z = self.bias + self.terms(features).iter().sum::<f64>();
        sigmoid(z).clamp(0.0, 1.0)
    }

    fn explain(&self, features: &GameFeatures) -> BTreeMap<String, f64> {
        FEATURE_NAMES
            .iter()
            .zip(self.terms(features))
            .map(|(name, term)| (name.to_string(), term))
            .collect()
    }

    fn name(&self) -> &str {
        "linear-logit"
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Probability before and after a hypothetical change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhatIf {
    pub current_probability: f64,
    pub modified_probability: f64,
    pub delta: f64,
}

/// Compare the prediction for `features` with the prediction after
/// overriding the named features in `modification`. Unknown names are
/// ignored.
pub fn what_if(
    predictor: &dyn WinPredictor,
    features: &GameFeatures,
    modification: &[(&str, f64)],
) -> WhatIf {
    let current_probability = predictor.predict(features);
    let mut modified = *features;
    for (name, value) in modification {
        if !modified.set(name, *value) {
            debug!("Ignoring unknown what-if feature '{}'", name);
        }
    }
    let modified_probability = predictor.predict(&modified);
    WhatIf {
        current_probability,
        modified_probability,
        delta: modified_probability - current_probability,
    }
}

/// Decision view of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub predictor: String,
    pub features: GameFeatures,
    pub win_probability: f64,
    pub contributions: BTreeMap<String, f64>,
    /// Description of the hypothetical evaluated below
    pub scenario: String,
    pub what_if: WhatIf,
}

/// Predict, explain and evaluate one title-specific hypothetical on
/// `snapshot`: one more dragon on the Rift, one extra full buy in VALORANT.
pub fn assess(predictor: &dyn WinPredictor, snapshot: &Snapshot, kind: GameKind) -> DecisionSummary {
    let features = GameFeatures::from_snapshot(snapshot);
    let (scenario, modification) = match kind {
        GameKind::LeagueOfLegends => (
            "team A secures one more dragon".to_string(),
            ("dragons_diff", features.dragons_diff + 1.0),
        ),
        GameKind::Valorant => {
            let swing = kind.profile().swing_threshold;
            (
                format!("team A gains {:.0} more credits", swing),
                ("gold_diff", features.gold_diff + swing),
            )
        }
    };
    DecisionSummary {
        predictor: predictor.name().to_string(),
        features,
        win_probability: predictor.predict(&features),
        contributions: predictor.explain(&features),
        scenario,
        what_if: what_if(predictor, &features, &[modification]),
    }
}
