//! NextGCore NWDAF (Network Data Analytics Function)
//!
//! Registers with the NRF, subscribes to AMF, SMF and UDM event exposure
//! and collects the resulting notifications (TS 23.288).

use anyhow::{Context, Result};
use clap::Parser;
use nextgcore_nwdafd::{NwdafConfig, NwdafSmContext};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// NextGCore NWDAF - Network Data Analytics Function
#[derive(Parser, Debug)]
#[command(name = "nextgcore-nwdafd")]
#[command(author = "NextGCore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "5G Core Network Data Analytics Function (TS 23.288)", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/nextgcore/nwdaf.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, default_value = "info")]
    log_level: String,

    /// SBI bind address (overrides sbi.bindingIPv4)
    #[arg(long)]
    sbi_addr: Option<String>,

    /// SBI port (overrides sbi.port)
    #[arg(long)]
    sbi_port: Option<u16>,

    /// NRF URI (overrides nrfUri)
    #[arg(long)]
    nrf_uri: Option<String>,

    /// NF instance ID (overrides nfId)
    #[arg(long)]
    nf_instance_id: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut NwdafConfig) {
        if let Some(ref addr) = self.sbi_addr {
            config.sbi.binding_ipv4 = addr.clone();
        }
        if let Some(port) = self.sbi_port {
            config.sbi.port = port;
        }
        if let Some(ref uri) = self.nrf_uri {
            config.nrf_uri = uri.clone();
        }
        if let Some(ref id) = self.nf_instance_id {
            config.nf_id = Some(id.clone());
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn setup_signal_handlers(shutdown: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })
    .expect("Failed to set signal handler");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    log::info!("NextGCore NWDAF v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Network Data Analytics Function (3GPP TS 23.288)");

    let mut config = NwdafConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config))?;
    args.apply(&mut config);

    let mut nwdaf = NwdafSmContext::from_config(&config).context("Failed to initialize NWDAF")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone());

    let report = nwdaf.start().await.context("NWDAF startup failed")?;
    for (peer, outcome) in report.outcomes() {
        match outcome {
            Ok(ack) => log::info!("[{peer}] subscribed (status={})", ack.status),
            Err(e) => log::warn!("[{peer}] not subscribed: {e}"),
        }
    }

    log::info!(
        "NextGCore NWDAF ready (instance: {})",
        nwdaf.identity().nf_instance_id
    );

    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    log::info!("Shutting down...");
    nwdaf
        .terminate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to terminate NWDAF: {e}"))?;

    log::info!("NWDAF shutdown complete");

    Ok(())
}
