//! Supported titles and their per-title tuning tables.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::normalize::lookup::{field_identifier, resolve_first, Strategy};
use crate::normalize::team::{TeamResolver, RIFT_TEAMS, VALORANT_TEAMS};

/// GRID title id for League of Legends.
pub const LOL_TITLE_ID: u64 = 3;
/// GRID title id for VALORANT.
pub const VALORANT_TITLE_ID: u64 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    #[default]
    LeagueOfLegends,
    Valorant,
}

/// How the efficiency scorer reads a participant's secondary stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecondaryStat {
    /// Per-minute rate of the first counter present
    VisionPerMinute(&'static [&'static str]),
    /// Headshot kills / kills
    HeadshotRatio,
}

/// Read-only tuning for one title.
#[derive(Debug)]
pub struct GameProfile {
    /// Name of the primary resource in descriptions ("gold", "credits")
    pub resource_label: &'static str,
    pub primary_fields: &'static [&'static str],
    pub secondary_fields: &'static [&'static str],
    pub counter_fields: &'static [&'static str],
    pub secondary_stat: SecondaryStat,
    /// Primary resource per minute worth one efficiency point
    pub resource_per_point: f64,
    pub trade_window_ms: u64,
    pub swing_threshold: f64,
    /// Substrings of event types/subtypes that are inflections on their own
    pub notable_events: &'static [&'static str],
    pub starting_team_resource: f64,
    pub default_duration_ms: u64,
    pub kill_event_type: &'static str,
    pub objective_event_type: &'static str,
}

static LOL_PROFILE: GameProfile = GameProfile {
    resource_label: "gold",
    primary_fields: &[
        "totalGold",
        "gold",
        "goldEarned",
        "netWorth",
        "networth",
        "currentGold",
    ],
    secondary_fields: &["xp", "experience", "totalXp", "experiencePoints"],
    counter_fields: &[
        "minionsKilled",
        "jungleMinionsKilled",
        "wardsPlaced",
        "visionScore",
        "kills",
        "deaths",
        "assists",
        "level",
    ],
    secondary_stat: SecondaryStat::VisionPerMinute(&["wardsPlaced", "visionScore", "wards"]),
    resource_per_point: 10.0,
    trade_window_ms: 15_000,
    swing_threshold: 800.0,
    notable_events: &[
        "baron",
        "elder",
        "dragon",
        "herald",
        "inhibitor",
        "nexus",
    ],
    // 500 starting gold for each of five players
    starting_team_resource: 2_500.0,
    default_duration_ms: 30 * 60_000,
    kill_event_type: "CHAMPION_KILL",
    objective_event_type: "OBJECTIVE_CAPTURE",
};

static VALORANT_PROFILE: GameProfile = GameProfile {
    resource_label: "credits",
    primary_fields: &["credits", "money", "currentCredits", "economy"],
    secondary_fields: &[
        "loadoutValue",
        "loadout",
        "inventoryValue",
        "equipmentValue",
    ],
    counter_fields: &["kills", "deaths", "assists", "headshots", "score"],
    secondary_stat: SecondaryStat::HeadshotRatio,
    resource_per_point: 40.0,
    trade_window_ms: 5_000,
    swing_threshold: 2_000.0,
    notable_events: &[
        "spike_planted",
        "spike_defused",
        "spike_detonated",
        "bomb_planted",
        "bomb_defused",
        "bomb_exploded",
        "plant",
        "defuse",
    ],
    // 800 pistol-round credits for each of five players
    starting_team_resource: 4_000.0,
    default_duration_ms: 40 * 60_000,
    kill_event_type: "kill",
    objective_event_type: "objective_capture",
};

impl GameKind {
    pub fn from_title_id(id: u64) -> Option<GameKind> {
        match id {
            LOL_TITLE_ID => Some(GameKind::LeagueOfLegends),
            VALORANT_TITLE_ID => Some(GameKind::Valorant),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<GameKind> {
        match name.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "lol" | "league" | "league-of-legends" | "leagueoflegends" => {
                Some(GameKind::LeagueOfLegends)
            }
            "val" | "valorant" => Some(GameKind::Valorant),
            _ => None,
        }
    }

    /// Resolve the title from payload metadata, defaulting to League of Legends.
    pub fn detect(payload: &Value) -> GameKind {
        resolve_first(payload, &detection_strategies())
            .map(|(_, kind)| kind)
            .unwrap_or_default()
    }

    pub fn profile(self) -> &'static GameProfile {
        match self {
            GameKind::LeagueOfLegends => &LOL_PROFILE,
            GameKind::Valorant => &VALORANT_PROFILE,
        }
    }

    pub fn team_resolver(self) -> &'static dyn TeamResolver {
        match self {
            GameKind::LeagueOfLegends => &RIFT_TEAMS,
            GameKind::Valorant => &VALORANT_TEAMS,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::LeagueOfLegends => write!(f, "lol"),
            GameKind::Valorant => write!(f, "valorant"),
        }
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = GameKind::from_name(s) {
            return Ok(kind);
        }
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(GameKind::from_title_id)
            .ok_or_else(|| format!("unknown game '{}' (expected lol, valorant, 3 or 6)", s))
    }
}

// ── Detection strategies ─────────────────────────────────────────────────────

fn detection_strategies<'a>() -> [Strategy<'a, GameKind>; 4] {
    [
        Strategy {
            name: "metadata_game",
            run: metadata_game,
        },
        Strategy {
            name: "title_id",
            run: title_id,
        },
        Strategy {
            name: "series_state_title",
            run: series_state_title,
        },
        Strategy {
            name: "root_game",
            run: root_game,
        },
    ]
}

fn kind_from_identifier(raw: Option<String>) -> Option<GameKind> {
    let raw = raw?;
    GameKind::from_name(&raw).or_else(|| raw.parse::<u64>().ok().and_then(GameKind::from_title_id))
}

fn metadata_game(payload: &Value) -> Option<GameKind> {
    let metadata = payload.get("metadata")?;
    ["game", "title", "titleId"]
        .iter()
        .find_map(|key| kind_from_identifier(field_identifier(metadata, &[*key])))
}

fn title_id(payload: &Value) -> Option<GameKind> {
    kind_from_identifier(field_identifier(payload, &["titleId"])).or_else(|| {
        let title = payload.get("title")?;
        kind_from_identifier(field_identifier(title, &["id", "nameShortened", "name"]))
    })
}

fn series_state_title(payload: &Value) -> Option<GameKind> {
    let state = crate::normalize::schema::series_state(payload)?;
    let title = state.get("title")?;
    kind_from_identifier(field_identifier(title, &["id", "nameShortened", "name"]))
}

fn root_game(payload: &Value) -> Option<GameKind> {
    kind_from_identifier(field_identifier(payload, &["game"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_title_id() {
        assert_eq!(GameKind::from_title_id(3), Some(GameKind::LeagueOfLegends));
        assert_eq!(GameKind::from_title_id(6), Some(GameKind::Valorant));
        assert_eq!(GameKind::from_title_id(99), None);
    }

    #[test]
    fn test_detect_from_metadata() {
        let payload = json!({"metadata": {"game": "valorant"}, "frames": []});
        assert_eq!(GameKind::detect(&payload), GameKind::Valorant);
    }

    #[test]
    fn test_unknown_metadata_game_falls_through_to_title_id() {
        let payload = json!({"metadata": {"game": "unknown", "titleId": 6}});
        assert_eq!(GameKind::detect(&payload), GameKind::Valorant);
    }

    #[test]
    fn test_detect_from_series_state_title() {
        let payload = json!({"data": {"seriesState": {"title": {"nameShortened": "val"}, "games": []}}});
        assert_eq!(GameKind::detect(&payload), GameKind::Valorant);
    }

    #[test]
    fn test_detect_numeric_title_id() {
        let payload = json!({"titleId": "6"});
        assert_eq!(GameKind::detect(&payload), GameKind::Valorant);
    }

    #[test]
    fn test_detect_defaults_to_lol() {
        assert_eq!(GameKind::detect(&json!({})), GameKind::LeagueOfLegends);
        assert_eq!(
            GameKind::detect(&json!({"metadata": {"game": "chess"}})),
            GameKind::LeagueOfLegends
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("LoL".parse::<GameKind>(), Ok(GameKind::LeagueOfLegends));
        assert_eq!("6".parse::<GameKind>(), Ok(GameKind::Valorant));
        assert!("dota".parse::<GameKind>().is_err());
    }
}
