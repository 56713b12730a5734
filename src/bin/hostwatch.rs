use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hostwatch::{
    commands::{CommandHandler, parse_command},
    config::{Config, read_config_file},
    detect::{Detection, Detector},
    notify,
    probe::{PingProber, Prober},
    registry::{Origin, Registry},
    resolver, settings,
    tracker::Tracker,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// User name attached to everything typed on the console
const CONSOLE_USER: &str = "console";

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Watch hosts until they are back online")]
struct Args {
    /// Config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Probe a single host once and exit (0 = reachable)
    #[arg(long, value_name = "ADDR")]
    ping: Option<String>,

    /// Serve the HTTP snapshot endpoint on this address
    #[arg(long, value_name = "ADDR")]
    http: Option<SocketAddr>,

    /// Log everything down to trace level
    #[arg(short, long)]
    verbose: bool,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("hostwatch", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = match &args.config {
        Some(path) => read_config_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let prober: Arc<dyn Prober> = Arc::new(PingProber::new(config.ping_timeout()));

    if let Some(query) = &args.ping {
        return ping_once(prober.as_ref(), query).await;
    }

    let store = settings::open(&config.settings)
        .await
        .context("failed to open settings store")?;
    let notifier = notify::from_config(&config.notifier);
    let registry = Registry::new();
    let tracker = Tracker::new(registry.clone(), prober, notifier, config.monitor_settings());

    start_http(&args, &config, registry.clone(), store.clone()).await?;

    let commands = CommandHandler::new(tracker.clone(), store.clone(), config.reaction_trigger.clone());
    let detector = Detector::new(
        tracker,
        store,
        config.reaction_trigger.clone(),
        config.incoming_channel.clone(),
    );

    info!("reading messages from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no: u64 = 0;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        line_no += 1;
        let origin = Origin::new(CONSOLE_USER, "", line_no.to_string());

        if let Some(command) = parse_command(&line) {
            let reply = commands.handle(&origin, &command).await;
            if !reply.is_empty() {
                println!("{}", reply.trim_end());
            }
            continue;
        }

        match detector.on_message(&origin, &line).await {
            Ok(detections) => report(&detections),
            Err(e) => warn!("unable to load settings for {CONSOLE_USER}: {e}"),
        }
    }

    let cancelled = registry.glob_remove("", "").await?;
    info!("shutting down, cancelled {cancelled} checks");

    Ok(ExitCode::SUCCESS)
}

async fn ping_once(prober: &dyn Prober, query: &str) -> anyhow::Result<ExitCode> {
    let resolved = resolver::resolve(query).await?;

    if prober.check(resolved.address).await {
        println!("{} online", resolved.address);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} offline", resolved.address);
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(feature = "api")]
async fn start_http(
    args: &Args,
    config: &Config,
    registry: Registry,
    store: Arc<dyn settings::SettingsStore>,
) -> anyhow::Result<()> {
    use hostwatch::api::{ApiConfig, ApiState, spawn_api_server};
    use hostwatch::util::{get_http_addr, get_http_token};

    let bind = match (args.http, &config.http) {
        (Some(addr), _) => addr,
        (None, Some(http)) => http.bind,
        (None, None) => return Ok(()),
    };

    let api_config = ApiConfig {
        bind_addr: get_http_addr(bind),
        auth_token: get_http_token().or_else(|| config.http.as_ref().and_then(|http| http.token.clone())),
        enable_cors: false,
    };

    if let Err(e) = spawn_api_server(api_config, ApiState::new(registry, store)).await {
        tracing::error!("failed to start HTTP endpoint: {e}");
        return Err(e);
    }

    Ok(())
}

#[cfg(not(feature = "api"))]
async fn start_http(
    args: &Args,
    config: &Config,
    _registry: Registry,
    _store: Arc<dyn settings::SettingsStore>,
) -> anyhow::Result<()> {
    if args.http.is_some() || config.http.is_some() {
        warn!("built without the api feature, not serving HTTP");
    }
    Ok(())
}

fn report(detections: &[Detection]) {
    for detection in detections {
        match detection {
            Detection::Started { key, address } => println!("watching {key} ({address})"),
            Detection::AlreadyTracked { address, source } => {
                println!("{address} already monitored, ignoring ({source})")
            }
            Detection::WatcherUpdated { .. } => {}
        }
    }
}
