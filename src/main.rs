use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hm_app::{EnginePorts, LoadOutcome, MarkerEngine};
use hm_core::ports::GeocoderPort;
use hm_core::{Coordinate, Region};
use hm_infra::{load_positions, load_records, HttpGeocoder, ScriptedPositionSource, TracingEventSink};
use tracing::{info, warn};

mod bootstrap;

use bootstrap::{init_tracing_subscriber, load_config, HostConfig};

#[derive(Parser, Debug)]
#[command(name = "historical-marker")]
#[command(about = "Show historical markers around a viewport and announce nearby ones", long_about = None)]
struct Cli {
    /// Marker records (JSON array)
    #[arg(short, long)]
    records: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport center as `lat,lon`
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    center: (f64, f64),

    /// Viewport span as `dlat,dlon`
    #[arg(long, value_parser = parse_pair, default_value = "0.2,0.2")]
    span: (f64, f64),

    /// Position track to replay (JSON array of `[lat, lon]`)
    #[arg(short, long)]
    positions: Option<PathBuf>,

    /// Delay between replayed positions
    #[arg(long, default_value_t = 1000)]
    position_interval_ms: u64,

    /// Keep pending markers pending instead of calling the geocoder
    #[arg(long)]
    no_geocode: bool,

    /// Stop after this many seconds (Ctrl-C stops earlier)
    #[arg(long, default_value_t = 30)]
    run_for_secs: u64,
}

fn parse_pair(value: &str) -> Result<(f64, f64), String> {
    let (first, second) = value
        .split_once(',')
        .ok_or_else(|| format!("expected two comma separated numbers, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid number `{}`: {err}", part.trim()))
    };
    Ok((parse(first)?, parse(second)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };

    run(cli, config).await
}

async fn run(cli: Cli, config: HostConfig) -> Result<()> {
    let batch = load_records(&cli.records)?;
    if batch.malformed > 0 {
        warn!(malformed = batch.malformed, "Skipped malformed marker records");
    }

    let geocoder: Option<Arc<dyn GeocoderPort>> = if cli.no_geocode {
        None
    } else {
        Some(Arc::new(HttpGeocoder::new(&config.geocoder)?))
    };

    let (engine, join) = MarkerEngine::spawn(
        config.engine,
        EnginePorts {
            geocoder,
            events: Arc::new(TracingEventSink),
        },
    )?;

    match engine.load(batch.records).await? {
        LoadOutcome::Loaded(summary) => info!(
            resolved = summary.resolved,
            pending = summary.pending,
            dropped = summary.dropped,
            "Markers loaded"
        ),
        LoadOutcome::AlreadyLoaded => warn!("Marker store was already loaded"),
    }

    let (latitude, longitude) = cli.center;
    let (latitude_delta, longitude_delta) = cli.span;
    engine
        .update_viewport(Region::new(
            Coordinate::new(latitude, longitude),
            latitude_delta,
            longitude_delta,
        ))
        .await?;

    let scheduled = engine.start_geocoding().await?;
    info!(scheduled, "Geocoding batch started");

    if let Some(path) = &cli.positions {
        let track = load_positions(path)
            .with_context(|| format!("Failed to load positions: {}", path.display()))?;
        let source = ScriptedPositionSource::new(track, Duration::from_millis(cli.position_interval_ms));
        engine.attach_position_source(Arc::new(source)).await?;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = tokio::time::sleep(Duration::from_secs(cli.run_for_secs)) => {}
    }

    let stats = engine.stats().await?;
    if let Some(visible) = engine.visible_set().await? {
        for id in &visible.marker_ids {
            println!("{id}");
        }
    }
    println!(
        "loaded={} resolved={} pending={} dropped={} visible={} announced={}",
        stats.loaded, stats.resolved, stats.pending, stats.dropped, stats.visible, stats.announced
    );

    engine.shutdown().await?;
    join.await.context("Engine task failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("30.25,-97.75"), Ok((30.25, -97.75)));
        assert_eq!(parse_pair(" 1 , 2 "), Ok((1.0, 2.0)));
        assert!(parse_pair("30.25").is_err());
        assert!(parse_pair("a,b").is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "historical-marker",
            "--records",
            "markers.json",
            "--center",
            "30.25,-97.75",
            "--no-geocode",
        ])
        .unwrap();

        assert_eq!(cli.records, PathBuf::from("markers.json"));
        assert_eq!(cli.center, (30.25, -97.75));
        assert_eq!(cli.span, (0.2, 0.2));
        assert!(cli.no_geocode);
        assert_eq!(cli.position_interval_ms, 1000);
        assert!(cli.positions.is_none());
    }

    #[test]
    fn test_cli_requires_records_and_center() {
        assert!(Cli::try_parse_from(["historical-marker", "--center", "1,2"]).is_err());
        assert!(Cli::try_parse_from(["historical-marker", "--records", "m.json"]).is_err());
    }
}
