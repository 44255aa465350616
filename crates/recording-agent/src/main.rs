//! Call recording agent binary: loads configuration, drives one switching
//! function (OSBiz/Avaya AES, via the reconnect supervisor) or the passive
//! capture pipeline, and logs finished recordings as they reach the
//! upload queue.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cra_agent_config::{
    load_devices, AgentConfig, ChannelUploadQueue, DeviceStore, InMemoryDeviceStore, LogSettings, PbxType,
    UploadQueue,
};
use cra_passive_capture::PassiveRecorder;
use cra_pbx_adapters::{AvayaAesAdapter, OsbizAdapter, PbxAdapter};
use cra_rtp_recorder::RecorderPool;
use cra_supervisor::Supervisor;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recording-agent", about = "CSTA/ACSE call recording agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the agent's configuration file (YAML or TOML).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Path to the configured device list (YAML or TOML).
    #[arg(long, global = true)]
    devices: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the recording agent in the foreground (default).
    Run,
    /// Load and print the resolved configuration, then exit.
    ConfigCheck,
}

fn init_logging(log: &LogSettings) {
    let filter = EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref()).context("failed to load agent configuration")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::ConfigCheck => {
            println!("{config:#?}");
            Ok(())
        }
        Command::Run => run(config, cli.devices.as_deref()).await,
    }
}

async fn run(config: AgentConfig, devices_path: Option<&str>) -> Result<()> {
    init_logging(&config.log);
    info!(pbx_type = ?config.pbx_type, "starting call recording agent");

    std::fs::create_dir_all(&config.recordings_dir).context("failed to create recordings directory")?;
    let recordings_dir = PathBuf::from(&config.recordings_dir);

    let cancel = CancellationToken::new();

    let devices = load_devices(devices_path).context("failed to load device list")?;
    let device_store: Arc<dyn DeviceStore> = Arc::new(InMemoryDeviceStore::new(devices));

    let (upload_queue, mut uploads) = ChannelUploadQueue::new(64);
    let upload_queue: Arc<dyn UploadQueue> = Arc::new(upload_queue);
    tokio::spawn(async move {
        while let Some(record) = uploads.recv().await {
            info!(
                file_path = %record.file_path,
                record_type = record.record_type.as_str(),
                "recording ready for upload"
            );
        }
    });

    let shutdown = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("received shutdown signal");
                cancel.cancel();
            }
        })
    };

    match config.pbx_type {
        PbxType::Passive => {
            let mut recorder = PassiveRecorder::new(recordings_dir, upload_queue);
            let interface_name = config.passive_monitoring.interface_name.clone();
            let capture_cancel = cancel.clone();
            tokio::task::spawn_blocking(move || recorder.run(&interface_name, capture_cancel))
                .await
                .context("passive capture task panicked")?
                .context("passive capture failed")?;
        }
        PbxType::Osbiz => {
            let adapter: Arc<dyn PbxAdapter> = Arc::new(OsbizAdapter::new(
                config.pbx_address.clone(),
                config.pbx_username.clone(),
                config.pbx_password.clone(),
                config.application_id.clone(),
                cancel.clone(),
            ));
            let recorder_pool = Arc::new(
                RecorderPool::bind(&config.rtp.recorder_address, config.rtp.recorder_count, cancel.clone())
                    .await
                    .context("failed to bind RTP recorder pool")?,
            );
            Supervisor::new(adapter, recorder_pool, device_store, cancel.clone())
                .run()
                .await;
        }
        PbxType::AvayaAes => {
            let adapter: Arc<dyn PbxAdapter> = Arc::new(AvayaAesAdapter::new(
                config.pbx_address.clone(),
                config.pbx_username.clone(),
                config.pbx_password.clone(),
                config.application_id.clone(),
                config.pbx_switch_name.clone(),
                recordings_dir.clone(),
                cancel.clone(),
                upload_queue,
            ));
            let recorder_pool = Arc::new(
                RecorderPool::bind(&config.rtp.recorder_address, config.rtp.recorder_count, cancel.clone())
                    .await
                    .context("failed to bind RTP recorder pool")?,
            );
            Supervisor::new(adapter, recorder_pool, device_store, cancel.clone())
                .run()
                .await;
        }
    }

    shutdown.abort();
    info!("call recording agent stopped");
    Ok(())
}
