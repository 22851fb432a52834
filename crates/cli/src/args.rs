use std::path::PathBuf;

use battmon_core::config::DEFAULT_CONFIG_PATH;
use clap::Parser;

/// Watch the host battery, report threshold crossings to a Discord webhook and
/// power off at the critical level.
#[derive(Debug, Parser)]
#[command(name = "batterymonitor", version)]
pub struct Args {
    /// Config file; created with defaults when missing.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log every decision (trend changes, skips, webhook attempts).
    #[arg(short = 'v', long = "debug", visible_alias = "verbose")]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Default filter when `RUST_LOG` is unset. HTTP internals stay quiet even
    /// in debug mode.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug,hyper=info,hyper_util=info,reqwest=info"
        } else {
            "info"
        }
    }
}
