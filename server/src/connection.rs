use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::sender::Outbound;

/// Shared UDP socket: one receive loop, one sender task
pub struct Connection {
    socket: Arc<UdpSocket>,
}

impl Connection {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind UDP socket on {}", addr))?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("Failed to read local address")
    }

    /// Receive one datagram into `buf`
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket
            .recv_from(buf)
            .await
            .context("Failed to receive datagram")
    }

    pub async fn send(&self, outbound: &Outbound) -> Result<()> {
        self.socket
            .send_to(outbound.text.as_bytes(), outbound.to)
            .await
            .with_context(|| format!("Failed to send datagram to {}", outbound.to))?;
        Ok(())
    }

    /// Drain `outgoing` onto the socket until every outbox is dropped.
    ///
    /// Send failures are logged and skipped; UDP delivery is best effort.
    pub fn spawn_sender(&self, mut outgoing: mpsc::Receiver<Outbound>) -> JoinHandle<()> {
        let connection = Connection {
            socket: Arc::clone(&self.socket),
        };
        tokio::spawn(async move {
            while let Some(outbound) = outgoing.recv().await {
                if let Err(e) = connection.send(&outbound).await {
                    tracing::warn!(to = %outbound.to, error = %e, "Dropping outbound datagram");
                }
            }
        })
    }
}
