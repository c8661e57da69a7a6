use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use preempt_lifecycle::cli::Args;
use preempt_lifecycle::clock::SystemClock;
use preempt_lifecycle::cluster::{build_client, KubeGateway, PoolFilter};
use preempt_lifecycle::config::Config;
use preempt_lifecycle::logging::setup_logging;
use preempt_lifecycle::peakhour::PeakCalendar;
use preempt_lifecycle::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Grace time after boot before the first tick, so the controller doesn't
/// act on a cluster view from before the node-list watch cache has filled.
/// Skipped when `debug` is set so local iteration isn't slowed down.
const SETTLING_DELAY: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_logging(args.tracing_format, args.debug);
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    setup_logging(args.tracing_format, args.debug || config.debug);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "fatal error during startup");
            ExitCode::FAILURE
        }
    }
}

/// Everything past "config is loaded and logging is installed". Each
/// fallible startup step is wrapped in `anyhow::Context` so a failure
/// anywhere in client/calendar construction carries a clear "what was being
/// attempted" message.
async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "starting preempt-lifecycle"
    );

    let clock: Arc<dyn preempt_lifecycle::clock::Clock> = Arc::new(SystemClock);

    let calendar = PeakCalendar::parse(&config.peak_hour_ranges, clock.clone())
        .context("failed to parse peak hour ranges")?;

    let client = build_client(config.environment)
        .await
        .context("failed to build cluster client")?;

    let pool_filter = match (&config.included_pool, &config.excluded_pool) {
        (Some(pool), _) => PoolFilter::Include(pool.clone()),
        (None, Some(pool)) => PoolFilter::Exclude(pool.clone()),
        (None, None) => PoolFilter::None,
    };
    let gateway = Arc::new(KubeGateway::new(client, pool_filter, config.debug));

    let scheduler = Scheduler::new(
        calendar,
        gateway,
        clock,
        config.graceful_period(),
        config.near_peak_window(),
    );

    if config.debug {
        info!("debug mode: skipping initial settling delay");
    } else {
        info!(seconds = SETTLING_DELAY.as_secs(), "waiting for cluster state to settle before first tick");
        tokio::time::sleep(SETTLING_DELAY).await;
    }

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        signal_shutdown.cancel();
    });

    scheduler.run(shutdown).await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
