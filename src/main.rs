//! HiMama bridge - childcare daily reports as home-automation sensors
//!
//! Logs into HiMama, scrapes the child's daily reports, reduces them to the
//! latest value per category and publishes the result as MQTT sensor
//! entities on a fixed poll interval.
//!
//! Module structure:
//! - `domain/` - Report data model and error taxonomy
//! - `io/` - External interfaces (HiMama session, report index, MQTT)
//! - `services/` - Pipeline (line parser, report parser, reducer, query, entities)
//! - `infra/` - Configuration

use anyhow::Context;
use clap::Parser;
use himama_bridge::domain::ChildData;
use himama_bridge::infra::Config;
use himama_bridge::io::{EgressMessage, EntityPublisher};
use himama_bridge::services::{build_entities, query};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// HiMama bridge - publishes daily report data over MQTT
#[derive(Parser, Debug)]
#[command(name = "himama-bridge", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Run a single query, print the result as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default INFO level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), git = env!("GIT_HASH"), "himama-bridge starting");

    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Cannot start without a usable config file ({})", args.config))?;

    info!(
        config_file = %config.config_file(),
        base_url = %config.site().base_url,
        child_id = %config.credentials().child_id,
        poll_interval_secs = %config.poll_interval_secs(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        topic_prefix = %config.mqtt_topic_prefix(),
        "config_loaded"
    );

    if args.once {
        let data = run_query(&config).await?;
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let mut publisher = EntityPublisher::new(&config);
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs()));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                match run_query(&config).await {
                    Ok(data) => publisher.publish(EgressMessage::Snapshot(build_entities(&data))).await,
                    Err(e) => {
                        error!(error = %format!("{:#}", e), "query_failed");
                        publisher.publish(EgressMessage::Unavailable).await;
                    }
                }
            }
        }
    }

    info!("himama-bridge shutdown complete");
    Ok(())
}

/// Run one full query off the async runtime
async fn run_query(config: &Config) -> anyhow::Result<ChildData> {
    let site = config.site().clone();
    let credentials = config.credentials().clone();

    let data = tokio::task::spawn_blocking(move || query(&site, &credentials))
        .await
        .context("query task failed")??;
    Ok(data)
}
