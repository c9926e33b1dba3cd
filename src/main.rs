//! Comet Borrower Monitor
//!
//! Tracks borrower risk across Compound III (Comet) deployments.
//! Features:
//! - Borrower discovery from Withdraw logs, re-checked every cycle
//! - Multicall3-batched position reads
//! - Percent-to-liquidation and liquidation price per borrower
//! - Hourly full sync plus debounced read-through refresh

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use comet_monitor_chain::{CometReader, ProviderManager};
use comet_monitor_core::{
    config_dir, schedule_ticker, InstanceRegistry, MonitorConfig, SyncOrchestrator,
};

/// Environment variable names.
mod env {
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

#[tokio::main]
async fn main() -> Result<()> {
    // Print startup banner
    print_banner();

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config_dir = config_dir();
    let config = MonitorConfig::from_dir(&config_dir)
        .with_context(|| format!("Failed to load monitor config from {}", config_dir.display()))?;
    config.log_config();

    let registry = InstanceRegistry::load_from_dir(&config_dir, &config)
        .context("Failed to load instance registry")?;
    if registry.is_empty() {
        anyhow::bail!("No instances configured in {}", config_dir.join("instances").display());
    }

    let orchestrator = Arc::new(SyncOrchestrator::new(config.account_batch_size));
    for instance in registry {
        let provider = match ProviderManager::new(&instance.rpc) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(instance = %instance.id, error = %e, "Skipping instance with invalid RPC endpoint");
                continue;
            }
        };

        // Endpoint problems are not fatal; the instance is retried every cycle
        match provider.health_check().await {
            Ok(true) => info!(instance = %instance.id, market = %instance.market, "Endpoint healthy"),
            Ok(false) => warn!(instance = %instance.id, "Endpoint reports block 0"),
            Err(e) => warn!(instance = %instance.id, error = %e, "Endpoint health check failed"),
        }

        let reader = CometReader::new(instance.market, instance.multicall, provider);
        orchestrator.register(instance, Arc::new(reader))?;
    }

    let tracked = orchestrator.instance_ids();
    if tracked.is_empty() {
        anyhow::bail!("No instance has a usable RPC endpoint");
    }
    info!(instances = ?tracked, "Starting Comet borrower monitor");

    tokio::spawn(Arc::clone(&orchestrator).run(config.auto_sync_interval()));
    tokio::spawn(report_cycle(
        Arc::clone(&orchestrator),
        config.report_interval(),
        config.report_top_n,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, exiting");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,comet_monitor_core=debug,comet_monitor_chain=info")
    });

    let json = std::env::var(env::LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Periodically log the borrowers closest to liquidation per instance.
async fn report_cycle(orchestrator: Arc<SyncOrchestrator>, period: Duration, top_n: usize) {
    let mut ticker = schedule_ticker(period);
    // The first tick would fire before the boot sync finished
    ticker.tick().await;

    loop {
        ticker.tick().await;

        for id in orchestrator.instance_ids() {
            let Ok(report) = orchestrator.report(&id) else {
                continue;
            };

            info!(
                instance = %id,
                block = report.last_synced_block,
                borrowers = report.borrowers.len(),
                liquidatable = report.liquidatable().count(),
                "At-risk summary"
            );

            for borrower in report.borrowers.iter().take(top_n) {
                info!(
                    instance = %id,
                    account = %borrower.account,
                    borrow_balance = borrower.position.borrow_balance,
                    percent_to_liquidation = borrower.position.percent_to_liquidation,
                    liquidatable = borrower.position.is_liquidatable,
                    "At-risk borrower"
                );
            }
        }
    }
}

fn print_banner() {
    println!(
        r#"
    ╔═╗┌─┐┌┬┐┌─┐┌┬┐  ╔╦╗┌─┐┌┐┌┬┌┬┐┌─┐┬─┐
    ║  │ ││││├┤  │   ║║║│ │││││ │ │ │├┬┘
    ╚═╝└─┘┴ ┴└─┘ ┴   ╩ ╩└─┘┘└┘┴ ┴ └─┘┴└─
    Borrower Monitor v0.1.0
    "#
    );
}
