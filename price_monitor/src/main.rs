use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use connectors_common::ReqwestTransport;
use env_logger::{Builder, Env};
use log::{info, warn};
use price_monitor::{Config, Monitor};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "price_monitor", about = "Polls exchange prices and pushes threshold and change alerts")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(buf, "[{} {:<5} {}] {}", ts, record.level(), record.target(), record.args())
        })
        .init();

    let args = Args::parse();
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let transport = ReqwestTransport::new(config.monitor.request_timeout()).context("building http client")?;
    let monitor = Monitor::new(config, Arc::new(transport));

    info!("crypto price monitor starting");
    monitor.log_rules();

    if args.once {
        let report = monitor.tick(Utc::now()).await;
        if report.source.is_none() {
            warn!("no price data available");
        }
        return Ok(());
    }

    monitor
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    Ok(())
}
