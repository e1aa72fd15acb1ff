//! Double Grid Deployment Binary
//!
//! Fetches recent candles, derives an aggressive and a conservative grid,
//! stores both on the Hummingbot API, deploys a bot running them and waits
//! until it reports RUNNING.
//!
//! ## Setup
//!
//! 1. Optionally create a `config.toml` (every section is optional; without the
//!    file the built-in defaults and `APP__` environment variables are used):
//!    ```toml
//!    [api]
//!    base_url = "http://localhost:8000"
//!
//!    [deploy]
//!    trading_pair = "ERA-USDT"
//!
//!    [poll]
//!    interval_secs = 5
//!    ```
//!
//! 2. Put credentials in `.env` or the environment:
//!    ```
//!    APP__API__USERNAME=admin
//!    APP__API__PASSWORD=admin
//!    ```
//!
//! 3. Run:
//!    ```bash
//!    cargo run --bin deploy_grid -- config.toml [TRADING_PAIR] [INTERVAL_SECS]
//!    ```

use std::sync::Arc;

use log::{error, info, warn};

use grid_deployer::{
    config::Settings,
    deploy::{cancel_pair, DeployPlan, LogListener, Orchestrator},
    Error, HummingbotClient,
};

#[tokio::main]
async fn main() {
    // Load .env file
    let dotenv = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let default_config = "config.toml".to_string();
    let config_path = args.get(1).unwrap_or(&default_config);
    let config_exists = std::path::Path::new(config_path).exists();

    let loaded = if config_exists {
        Settings::new(config_path)
    } else {
        Settings::from_env()
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log.level.as_str()),
    )
    .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from: {}", path.display()),
        Err(_) => info!("No .env file found, using system environment variables"),
    }
    if !config_exists {
        info!("Config file '{}' not found, using defaults", config_path);
    }

    if let Some(pair) = args.get(2) {
        settings.deploy.trading_pair = pair.clone();
    }
    if let Some(interval) = args.get(3) {
        match interval.parse() {
            Ok(secs) => settings.poll.interval_secs = secs,
            Err(e) => {
                error!("Invalid polling interval '{}': {}", interval, e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = run(settings).await {
        error!("Deployment failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<(), Error> {
    let plan = DeployPlan::from_settings(&settings);
    info!(
        "Deploying {} for {} via {}",
        plan.instance_name, plan.trading_pair, settings.api.base_url
    );

    let client = HummingbotClient::new(&settings.api, plan.instance_name.clone())?;
    let orchestrator = Orchestrator::new(client, Arc::new(LogListener), plan);

    let (handle, mut token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping status polling");
            handle.cancel();
        }
    });

    let report = orchestrator.synthesize_and_deploy(&mut token).await?;
    info!(
        "Bot {} is {} ({} status checks)",
        orchestrator.plan().instance_name,
        report.status.status,
        report.attempts
    );
    Ok(())
}
