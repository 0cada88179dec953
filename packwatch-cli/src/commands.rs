use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use packwatch_api::{AppState, DeviceRelay};
use packwatch_config::PackwatchConfig;
use packwatch_core::sink::JsonlSink;
use packwatch_core::EnvelopeStore;
use packwatch_ingest::{IngestPipeline, Normalizer, TcpIngestServer, TcpServerConfig};
use packwatch_telemetry::MetricsRecorder;

#[derive(Parser)]
#[command(name = "packwatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay (HTTP surface plus optional raw TCP ingress)
    Serve(ServeArgs),
    /// Load and validate a configuration file, then exit
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file; the default hierarchy (config/packwatch.yaml,
    /// environment overrides, PACKWATCH_* variables) applies when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    #[arg(short, long)]
    pub config: PathBuf,
}

pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PackwatchConfig::load_from_path(path)?,
        None => PackwatchConfig::load()?,
    };

    let metrics = Arc::new(MetricsRecorder::new());
    let store = Arc::new(EnvelopeStore::with_mode(
        config.store.mode,
        config.store.capacity,
    ));
    info!(mode = ?config.store.mode, capacity = config.store.capacity, "store ready");

    let mut normalizer = Normalizer::new(&config.ingest.form_field);
    if config.ingest.schema_guard.enabled {
        normalizer = normalizer.with_guard(&config.ingest.schema_guard.key);
        info!(key = %config.ingest.schema_guard.key, "schema guard enabled");
    }

    let sink = if config.sink.enabled {
        Some(Arc::new(
            JsonlSink::open(&config.sink.dir).context("opening sink directory")?,
        ))
    } else {
        None
    };

    let mut pipeline = IngestPipeline::new(normalizer, store, metrics);
    if let Some(sink) = &sink {
        pipeline = pipeline.with_sink(sink.clone(), &config.sink.kind);
    }
    let pipeline = Arc::new(pipeline);

    let mut state = AppState::new(pipeline.clone());
    if let Some(sink) = sink {
        state = state.with_sink(sink, &config.sink.kind);
    }
    if config.relay.enabled {
        let relay = DeviceRelay::new(
            config.relay.device_url(),
            Duration::from_secs(config.relay.timeout_secs),
        )
        .context("building relay client")?;
        state = state.with_relay(Arc::new(relay));
        info!(device = %config.relay.device_url(), "config relay enabled");
    }

    let tcp_task = if config.server.tcp.enabled {
        let server = TcpIngestServer::bind(
            TcpServerConfig {
                bind: config.server.tcp.bind.parse()?,
                max_connections: config.server.tcp.max_connections,
                read_timeout: Duration::from_secs(config.server.tcp.read_timeout_secs),
            },
            pipeline.clone(),
        )
        .await
        .context("binding tcp ingress")?;
        Some(tokio::spawn(server.serve()))
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind(&config.server.http_bind)
        .await
        .context("binding http listener")?;
    info!(addr = %listener.local_addr()?, "http surface listening");

    let app = packwatch_api::router(state);
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Some(task) = tcp_task {
        task.abort();
    }
    result?;
    info!("shutdown complete");
    Ok(())
}

pub fn run_check_config(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = PackwatchConfig::load_from_path(&args.config)?;
    println!(
        "ok: http={} tcp={} store={:?}/{} relay={} sink={}",
        config.server.http_bind,
        if config.server.tcp.enabled {
            config.server.tcp.bind.as_str()
        } else {
            "disabled"
        },
        config.store.mode,
        config.store.capacity,
        config.relay.enabled,
        config.sink.enabled,
    );
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
