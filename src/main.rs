//! RACING-ODDS: live WIN odds aggregator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! primes one update cycle, then runs the polling scheduler and the read
//! API side by side until Ctrl+C.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use racing_odds::api::{self, ApiState};
use racing_odds::config::AppConfig;
use racing_odds::engine::scheduler::{Cadence, RacingWindow, Scheduler, SystemClock};
use racing_odds::engine::updater::Updater;
use racing_odds::providers::bet365::Bet365Client;
use racing_odds::providers::http::FeedCredentials;
use racing_odds::providers::william_hill::WilliamHillClient;
use racing_odds::providers::OddsSource;
use racing_odds::store;

const BANNER: &str = r#"
  ____   _    ____ ___ _   _  ____    ___  ____  ____  ____
 |  _ \ / \  / ___|_ _| \ | |/ ___|  / _ \|  _ \|  _ \/ ___|
 | |_) / _ \| |    | ||  \| | |  _  | | | | | | | | | \___ \
 |  _ < ___ \ |___ | || |\  | |_| | | |_| | |_| | |_| |___) |
 |_| \_\_/ \_\____|___|_| \_|\____|  \___/|____/|____/|____/

  Live WIN odds: Bet365 + William Hill
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        bind = %cfg.server.bind,
        port = cfg.server.port,
        start_hour = cfg.schedule.start_hour,
        end_hour = cfg.schedule.end_hour,
        "RACING-ODDS starting up"
    );

    // -- Feeds -----------------------------------------------------------

    let sources = build_sources(&cfg)?;
    if sources.is_empty() {
        warn!("No feeds enabled; the API will only ever serve empty lists");
    }

    let (writer, reader) = store::channel();
    let updater = Updater::new(sources, writer);

    if cfg.schedule.prime_on_startup {
        info!("Priming odds before serving");
        if let Err(e) = updater.run_cycle().await {
            error!(error = %e, "Startup update failed, serving empty snapshot");
        }
    }

    // -- Scheduler + API -------------------------------------------------

    let window = RacingWindow::new(cfg.schedule.start_hour, cfg.schedule.end_hour);
    let clock = Arc::new(SystemClock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(updater, window, Cadence::from(&cfg.schedule), clock.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let addr: SocketAddr = format!("{}:{}", cfg.server.bind, cfg.server.port)
        .parse()
        .with_context(|| format!("Invalid server address {}:{}", cfg.server.bind, cfg.server.port))?;
    let listener = api::bind(addr).await?;
    let state = Arc::new(ApiState {
        snapshots: reader,
        window,
        clock,
    });
    let server_task = tokio::spawn(api::serve(listener, state, shutdown_rx));

    info!("Running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Shutdown signal received.");

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(Duration::from_secs(30), scheduler_task).await {
        Ok(Err(e)) => error!(error = %e, "Scheduler task failed"),
        Err(_) => warn!("Scheduler did not stop within 30s"),
        Ok(Ok(())) => {}
    }
    match server_task.await {
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task failed"),
        Ok(Ok(())) => {}
    }

    info!("RACING-ODDS shut down cleanly.");
    Ok(())
}

/// Build one client per enabled feed, sharing the proxy credentials.
fn build_sources(cfg: &AppConfig) -> Result<Vec<Arc<dyn OddsSource>>> {
    let providers = &cfg.providers;
    if !providers.bet365.enabled && !providers.william_hill.enabled {
        return Ok(Vec::new());
    }

    let secret = SecretString::new(AppConfig::resolve_env(&providers.secret_env)?);
    let credentials = FeedCredentials::new(&providers.secret_header, &secret)?;
    info!(header = %credentials.header_name(), "Proxy credentials loaded");
    let timeout = Duration::from_secs(providers.timeout_secs);

    let mut sources: Vec<Arc<dyn OddsSource>> = Vec::new();
    if providers.bet365.enabled {
        info!(url = %providers.bet365.url, "Bet365 feed enabled");
        sources.push(Arc::new(Bet365Client::new(
            &providers.bet365.url,
            credentials.clone(),
            timeout,
        )?));
    }
    if providers.william_hill.enabled {
        info!(url = %providers.william_hill.url, "William Hill feed enabled");
        sources.push(Arc::new(WilliamHillClient::new(
            &providers.william_hill.url,
            credentials,
            timeout,
        )?));
    }
    Ok(sources)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("racing_odds=info"));

    let json_logging = std::env::var("RACING_ODDS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
