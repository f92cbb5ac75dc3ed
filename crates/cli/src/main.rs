use anyhow::Context;
use clap::{Parser, Subcommand};
use oi_alert_bybit::BybitOpenInterestSource;
use oi_alert_coingecko::CoinGeckoMarketSource;
use oi_alert_core::{
    AppConfig, ConfigLoader, HealthState, Notifier, TelegramCredentials, DEFAULT_CONFIG_PATH,
};
use oi_alert_scheduler::{AlertScheduler, JobRunner};
use oi_alert_telegram::{LogNotifier, TelegramNotifier};
use oi_alert_web_api::ApiServer;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "oi-alert")]
#[command(
    about = "Alerts when Bybit open interest is large relative to market cap",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduled checks with the liveness API
    Run {
        /// Config file path
        #[arg(short, long, env = "OI_ALERT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Perform a single check and exit
    Once {
        /// Config file path
        #[arg(short, long, env = "OI_ALERT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        /// Log the alert message instead of sending it (no Telegram secrets needed)
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            run_service(&config).await?;
        }
        Commands::Once { config, dry_run } => {
            run_once(&config, dry_run).await?;
        }
    }

    Ok(())
}

fn build_runner(config: &AppConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<JobRunner> {
    let market = CoinGeckoMarketSource::from_config(&config.coingecko)?;
    let open_interest = BybitOpenInterestSource::from_config(&config.bybit)?;

    Ok(JobRunner::new(
        Arc::new(market),
        Arc::new(open_interest),
        notifier,
        config.alert.clone(),
    ))
}

fn telegram_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let credentials = TelegramCredentials::from_env()?;
    Ok(Arc::new(TelegramNotifier::new(&config.telegram, credentials)?))
}

async fn run_service(config_path: &str) -> anyhow::Result<()> {
    tracing::info!("Starting OI/MC alert service with config: {}", config_path);

    let config = ConfigLoader::load_from(config_path)?;
    let notifier = telegram_notifier(&config).context("Refusing to start")?;
    let runner = Arc::new(build_runner(&config, notifier)?);
    let health = Arc::new(HealthState::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = ApiServer::new(health.clone(), config.schedule.interval_secs);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let server_shutdown = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(&addr, server_shutdown).await {
            tracing::error!("Server error: {}", e);
        }
    });

    let scheduler = AlertScheduler::new(runner, health, config.schedule.clone());
    let mut scheduler_handle = tokio::spawn(scheduler.run_until(shutdown_rx));

    // Wait for shutdown signal (SIGINT or SIGTERM), or the scheduler dying on its own
    let scheduler_exited = tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            false
        }
        result = &mut scheduler_handle => {
            log_scheduler_exit(result);
            true
        }
    };

    shutdown_tx.send_replace(true);
    if !scheduler_exited {
        log_scheduler_exit(scheduler_handle.await);
    }
    if let Err(e) = server_handle.await {
        tracing::error!("Server task failed: {}", e);
    }

    tracing::info!("OI/MC alert service stopped");
    Ok(())
}

fn log_scheduler_exit(result: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Scheduler error: {:#}", e),
        Err(e) => tracing::error!("Scheduler task failed: {}", e),
    }
}

async fn shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
    }
    Ok(())
}

async fn run_once(config_path: &str, dry_run: bool) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    let notifier: Arc<dyn Notifier> = if dry_run {
        Arc::new(LogNotifier)
    } else {
        telegram_notifier(&config)?
    };

    let runner = Arc::new(build_runner(&config, notifier)?);
    let report = runner.run_isolated().await;

    println!("[{}] {}", report.outcome.label(), report.summary());
    Ok(())
}
