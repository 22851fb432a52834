mod args;

use std::sync::Arc;

use anyhow::Context;
use battmon_core::config::{ConfigError, MonitorCfg};
use battmon_core::environment::{PoweroffControl, SysfsPowerSource};
use battmon_core::runtime::Runtime;
use battmon_notify::webhook::DiscordWebhook;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let cfg = match MonitorCfg::load_or_seed(&args.config) {
        Ok(cfg) => cfg,
        Err(e @ ConfigError::Seeded(_)) => {
            tracing::warn!(path = %args.config.display(), "{e}");
            return Err(e.into());
        }
        Err(e) => return Err(e).context("failed to load config"),
    };
    let thresholds = cfg
        .validate()
        .with_context(|| format!("invalid config {}", args.config.display()))?;
    tracing::info!(
        path = %args.config.display(),
        minimal = thresholds.minimal(),
        critical = thresholds.critical(),
        "config loaded"
    );

    let source = SysfsPowerSource::new(&cfg.power_supply_path);
    let notifier = DiscordWebhook::new(cfg.webhook_target(), cfg.notifications.clone())
        .context("failed to build webhook client")?;
    let control = PoweroffControl::from_command(&cfg.shutdown_command)
        .context("invalid shutdownCommand")?;

    let mut runtime = Runtime::new(
        thresholds,
        Arc::new(source),
        Arc::new(notifier),
        Arc::new(control),
    );
    runtime.run().await;
    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` selects debug.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
