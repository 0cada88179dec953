//! Raw TCP ingress listener.
//!
//! Devices that cannot speak HTTP push frames over a plain socket. Each
//! frame (one read) is normalized and acknowledged with `ACK\n` on the same
//! connection. The listener bounds concurrency with a semaphore and applies
//! an idle read timeout, so a slow or stuck device cannot pin resources.
//!
//! Per-connection state machine: read ≥1 byte → normalize → store → ack →
//! read again. Zero-byte read, timeout, I/O failure, or a rejected payload
//! closes the connection. TCP offers no structured error channel, so
//! rejection is visible to the peer only as a missing acknowledgment.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::pipeline::IngestPipeline;

const ACK: &[u8] = b"ACK\n";
const READ_CHUNK: usize = 4096;

/// Listener parameters, resolved by the caller from its config layer.
#[derive(Clone, Debug)]
pub struct TcpServerConfig {
    pub bind: SocketAddr,
    pub max_connections: usize,
    pub read_timeout: Duration,
}

/// Bound listener ready to serve device connections.
pub struct TcpIngestServer {
    listener: TcpListener,
    config: TcpServerConfig,
    pipeline: Arc<IngestPipeline>,
}

impl TcpIngestServer {
    /// Binds the listener. Binding to port 0 picks an ephemeral port,
    /// readable afterwards via [`local_addr`](Self::local_addr).
    pub async fn bind(
        config: TcpServerConfig,
        pipeline: Arc<IngestPipeline>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        info!(addr = %listener.local_addr()?, "tcp ingress listening");
        Ok(Self {
            listener,
            config,
            pipeline,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; runs until the task is dropped or accept fails fatally.
    pub async fn serve(self) -> std::io::Result<()> {
        let permits = Arc::new(Semaphore::new(self.config.max_connections));
        loop {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .expect("connection semaphore never closes");
            let (socket, peer) = self.listener.accept().await?;
            debug!(%peer, "connection accepted");

            let pipeline = self.pipeline.clone();
            let read_timeout = self.config.read_timeout;
            tokio::spawn(async move {
                pipeline.metrics().tcp_connection_opened();
                serve_connection(pipeline.clone(), socket, peer, read_timeout).await;
                pipeline.metrics().tcp_connection_closed();
                drop(permit);
            });
        }
    }
}

async fn serve_connection(
    pipeline: Arc<IngestPipeline>,
    mut socket: TcpStream,
    peer: SocketAddr,
    read_timeout: Duration,
) {
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buf.clear();
        match timeout(read_timeout, socket.read_buf(&mut buf)).await {
            Err(_) => {
                debug!(%peer, "idle timeout, closing");
                return;
            }
            Ok(Err(e)) => {
                // Connection reset mid-read; previously stored envelopes stand.
                let err = crate::IngestError::Transport(e);
                pipeline.metrics().inc_rejected(err.kind());
                debug!(%peer, error = %err, "read failed");
                return;
            }
            Ok(Ok(0)) => {
                debug!(%peer, "peer closed stream");
                return;
            }
            Ok(Ok(n)) => {
                match pipeline.ingest_tcp(&buf[..n], peer) {
                    Ok(position) => {
                        if let Err(e) = socket.write_all(ACK).await {
                            debug!(%peer, error = %e, "ack write failed");
                            return;
                        }
                        debug!(%peer, position, "frame acknowledged");
                    }
                    Err(e) => {
                        warn!(%peer, error = %e, "rejected tcp frame, closing");
                        return;
                    }
                }
            }
        }
    }
}
