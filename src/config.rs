use clap::Parser;

use decision_lens::normalize::fallback::MIN_POINTS;
use decision_lens::{AnalysisOptions, GameKind, SynthesisParams};

/// Normalize esports match telemetry and report strategic insights
#[derive(Parser, Debug, Clone)]
#[command(name = "decision-lens", version, about)]
pub struct Config {
    /// Payload files to analyze (JSON)
    pub inputs: Vec<String>,

    /// GRID match ids to fetch and analyze (repeatable)
    #[arg(long = "match-id")]
    pub match_ids: Vec<String>,

    /// GRID API base URL
    #[arg(long, env = "GRID_BASE_URL", default_value = "https://api.grid.gg")]
    pub grid_base_url: String,

    /// GRID API key (required with --match-id)
    #[arg(long, env = "GRID_API_KEY")]
    pub grid_api_key: Option<String>,

    /// Force the title instead of detecting it (lol, valorant)
    #[arg(long, env = "GAME", conflicts_with = "title_id")]
    pub game: Option<GameKind>,

    /// Force the title by GRID title id (3 = lol, 6 = valorant)
    #[arg(long, env = "TITLE_ID")]
    pub title_id: Option<u64>,

    /// Comma-separated event type patterns; empty keeps every event
    #[arg(long, env = "EVENT_FILTER", value_delimiter = ',')]
    pub event_filter: Vec<String>,

    /// Resource swing threshold (defaults to the title's: 800 gold / 2000 credits)
    #[arg(long, env = "SWING_THRESHOLD")]
    pub swing_threshold: Option<f64>,

    /// Number of synthetic snapshots generated from summary statistics
    #[arg(long, env = "SYNTHETIC_POINTS", default_value = "8")]
    pub synthetic_points: usize,

    /// Growth exponent applied to synthetic resource curves
    #[arg(long, env = "GROWTH_EXPONENT", default_value = "1.2")]
    pub growth_exponent: f64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Pretty-print the JSON output
    #[arg(long, default_value = "false")]
    pub pretty: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.inputs.is_empty() && self.match_ids.is_empty() {
            anyhow::bail!("nothing to analyze: pass payload files or --match-id");
        }
        if !self.match_ids.is_empty() && self.grid_api_key.is_none() {
            anyhow::bail!("GRID_API_KEY is required when fetching matches with --match-id");
        }
        if let Some(id) = self.title_id {
            if GameKind::from_title_id(id).is_none() {
                anyhow::bail!("unknown title id {} (expected 3 or 6)", id);
            }
        }
        if let Some(t) = self.swing_threshold {
            if !t.is_finite() || t <= 0.0 {
                anyhow::bail!("swing_threshold must be a positive number");
            }
        }
        if self.synthetic_points < MIN_POINTS {
            anyhow::bail!("synthetic_points must be at least {}", MIN_POINTS);
        }
        if !self.growth_exponent.is_finite() || self.growth_exponent <= 0.0 {
            anyhow::bail!("growth_exponent must be positive");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            game_kind: self
                .game
                .or_else(|| self.title_id.and_then(GameKind::from_title_id)),
            event_filter: self
                .event_filter
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            swing_threshold: self.swing_threshold,
            synthesis: SynthesisParams {
                points: self.synthetic_points,
                growth_exponent: self.growth_exponent,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("decision-lens").chain(args.iter().copied()))
    }

    #[test]
    fn test_files_only_is_valid() {
        let config = parse(&["match.json"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis_options().game_kind, None);
    }

    #[test]
    fn test_match_id_requires_key() {
        let mut config = parse(&["--match-id", "2718"]);
        config.grid_api_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_too_few_points() {
        let config = parse(&["a.json", "--synthetic-points", "3"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_options_from_flags() {
        let config = parse(&[
            "a.json",
            "--title-id",
            "6",
            "--event-filter",
            "kill, plant,",
            "--swing-threshold",
            "1500",
        ]);
        assert!(config.validate().is_ok());
        let options = config.analysis_options();
        assert_eq!(options.game_kind, Some(GameKind::Valorant));
        assert_eq!(options.event_filter, vec!["kill".to_string(), "plant".to_string()]);
        assert_eq!(options.swing_threshold, Some(1500.0));
    }

    #[test]
    fn test_game_by_name() {
        let config = parse(&["a.json", "--game", "valorant"]);
        assert_eq!(config.game, Some(GameKind::Valorant));
    }
}
