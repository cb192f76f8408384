use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod config;
mod source;

use config::Config;
use decision_lens::{analyze, AnalysisOptions, MatchReport};
use source::{FileSource, GridSource, PayloadSource};

/// One analyzed payload as written to stdout.
#[derive(Serialize)]
struct ReportEnvelope<'a> {
    source: &'a str,
    generated_at: DateTime<Utc>,
    report: MatchReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let sources = build_sources(&config)?;
    info!("Analyzing {} payload source(s)", sources.len());

    let options = config.analysis_options();
    let fetch_futures: Vec<_> = sources
        .iter()
        .map(|s| {
            let s = Arc::clone(s);
            async move { (s.name().to_string(), s.fetch().await) }
        })
        .collect();
    let results = futures_util::future::join_all(fetch_futures).await;

    let mut failures = 0usize;
    for (name, fetched) in results {
        match fetched.and_then(|payload| render(&name, &payload, &options, config.pretty)) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!("Source '{}' failed: {:#}", name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        warn!("{} of {} source(s) failed", failures, sources.len());
        if failures == sources.len() {
            anyhow::bail!("every payload source failed");
        }
    }
    Ok(())
}

fn build_sources(config: &Config) -> Result<Vec<Arc<dyn PayloadSource>>> {
    let mut sources: Vec<Arc<dyn PayloadSource>> = config
        .inputs
        .iter()
        .map(|path| Arc::new(FileSource::new(path)) as Arc<dyn PayloadSource>)
        .collect();

    if !config.match_ids.is_empty() {
        let api_key = config
            .grid_api_key
            .as_deref()
            .context("GRID_API_KEY is required with --match-id")?;
        let timeout = Duration::from_secs(config.http_timeout_secs);
        for match_id in &config.match_ids {
            let grid = GridSource::new(&config.grid_base_url, api_key, match_id, timeout)?;
            info!("Source {} -> {}", grid.name(), grid.endpoint());
            sources.push(Arc::new(grid));
        }
    }
    Ok(sources)
}

/// Run the pipeline on one payload and serialize the envelope.
fn render(
    name: &str,
    payload: &serde_json::Value,
    options: &AnalysisOptions,
    pretty: bool,
) -> Result<String> {
    let report = analyze(payload, options, None)?;
    let envelope = ReportEnvelope {
        source: name,
        generated_at: Utc::now(),
        report,
    };
    let text = if pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    text.context("Failed to serialize report")
}
