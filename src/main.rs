//! CLI entry point for route_pulse.
//!
//! Runs the realtime feed relay, looks up or watches the live status of a
//! route, and summarises static schedule data for route verification.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use route_pulse::config::{PollerConfig, RelayConfig, UPSTREAM_CONNECT_TIMEOUT};
use route_pulse::fetch::auth::UrlParam;
use route_pulse::fetch::{BasicClient, fetch_bytes};
use route_pulse::output::{print_json, status_line};
use route_pulse::poller::{IntervalTicker, LogNotifier, PollSnapshot, PollState, PollerHandle};
use route_pulse::realtime::RealtimeClient;
use route_pulse::schedule::{
    GtfsDirectory, ScheduleSource, Sourced, demo, route_options, verify_route, with_fallback,
};
use route_pulse::status::decode_and_filter;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "route_pulse")]
#[command(about = "Verify transit routes against static schedules and live vehicle positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the realtime feed relay, keeping the vendor API key server-side
    Relay,
    /// Print the current live status of a route
    Status {
        /// Route identifier to look up
        route_id: String,

        /// Path to a feed file or URL to fetch (defaults to RELAY_URL)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,
    },
    /// Poll the live status of a route until interrupted
    Watch {
        /// Route identifier to watch
        route_id: String,

        /// Seconds between polls (defaults to POLL_INTERVAL_SECS or 30)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
    /// List routes from a GTFS static directory
    Routes {
        /// Directory containing routes.txt, trips.txt and shapes.txt
        #[arg(short, long, value_name = "DIR")]
        gtfs_dir: PathBuf,

        /// Serve demo data, marked as degraded, if the schedule cannot be read
        #[arg(long, default_value_t = false)]
        demo_fallback: bool,
    },
    /// Summarise headsigns and shapes for a route
    Verify {
        /// Route identifier to verify
        route_id: String,

        /// Directory containing routes.txt, trips.txt and shapes.txt
        #[arg(short, long, value_name = "DIR")]
        gtfs_dir: PathBuf,

        /// Serve demo data, marked as degraded, if the schedule cannot be read
        #[arg(long, default_value_t = false)]
        demo_fallback: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/route_pulse.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("route_pulse.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Relay => serve_relay(RelayConfig::from_env()?).await?,
        Commands::Status { route_id, source } => {
            let source = match source {
                Some(source) => source,
                None => PollerConfig::from_env()?.feed_url,
            };
            let bytes = fetcher(&source).await?;
            let status = decode_and_filter(&bytes, &route_id)?;
            info!("{}", status_line(&status));
            print_json(&status)?;
        }
        Commands::Watch { route_id, interval } => {
            let mut config = PollerConfig::from_env()?;
            if let Some(secs) = interval {
                config.interval = Duration::from_secs(secs);
            }
            watch_route(config, route_id).await;
        }
        Commands::Routes {
            gtfs_dir,
            demo_fallback,
        } => {
            let result = match GtfsDirectory::load(&gtfs_dir) {
                Ok(schedule) => schedule.routes().await.map(|routes| route_options(&routes)),
                Err(err) => Err(err),
            };
            let routes = if demo_fallback {
                with_fallback(result, demo::route_options)
            } else {
                Sourced::live(result?)
            };
            info!(routes = routes.data.len(), degraded = routes.is_degraded(), "Routes listed");
            print_json(&routes)?;
        }
        Commands::Verify {
            route_id,
            gtfs_dir,
            demo_fallback,
        } => {
            let result = match GtfsDirectory::load(&gtfs_dir) {
                Ok(schedule) => verify_route(&schedule, &route_id).await,
                Err(err) => Err(err),
            };
            let verification = if demo_fallback {
                with_fallback(result, || demo::verification(&route_id))
            } else {
                Sourced::live(result?)
            };
            info!(
                route_id = %route_id,
                headsigns = verification.data.headsigns.len(),
                shapes = verification.data.shapes.len(),
                degraded = verification.is_degraded(),
                "Route verified"
            );
            print_json(&verification)?;
        }
    }

    Ok(())
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}

/// Serves the relay until the process is interrupted.
async fn serve_relay(config: RelayConfig) -> Result<()> {
    info!(config = ?config, "Starting feed relay");

    let client = Arc::new(UrlParam {
        inner: BasicClient::with_timeouts(config.upstream_timeout, UPSTREAM_CONNECT_TIMEOUT)?,
        param_name: config.api_key_param.clone(),
        key: config.api_key.clone(),
    });
    let app = route_pulse::relay::router(client, &config.upstream_url);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Relay stopped");
    Ok(())
}

/// Polls `route_id` and logs each new snapshot until Ctrl+C.
#[tracing::instrument(skip(config), fields(feed_url = %config.feed_url, interval_secs = config.interval.as_secs()))]
async fn watch_route(config: PollerConfig, route_id: String) {
    let source = Arc::new(RealtimeClient::new(BasicClient::new(), config.feed_url.clone()));
    let handle = PollerHandle::spawn(source, IntervalTicker::new(config.interval), LogNotifier);
    let mut updates = handle.subscribe();

    handle.select(Some(route_id));
    info!("Watching route. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                report(&snapshot);
            }
        }
    }

    handle.shutdown().await;
    info!("Stopped watching");
}

fn report(snapshot: &PollSnapshot) {
    match (snapshot.state, &snapshot.status) {
        (PollState::Ready, Some(status)) => info!("{}", status_line(status)),
        (PollState::Failed, _) => warn!(
            error = snapshot.error.as_deref().unwrap_or("unknown"),
            "Route status unavailable"
        ),
        (state, _) => debug!(state = ?state, "Poller state changed"),
    }
}
