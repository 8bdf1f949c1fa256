//! UDP front end for the pokeduel battle service.
//!
//! One task per inbound datagram runs the [`Dispatcher`]; everything it
//! produces goes through an [`Outbox`] to a single sender task that owns the
//! socket's write side.

mod config;
mod connection;
mod dispatcher;
mod sender;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use pokeduel_battle::{Arena, PokemonStore, Roster};
use tokio::sync::mpsc;

pub use config::ServerConfig;
pub use connection::Connection;
pub use dispatcher::Dispatcher;
pub use sender::{Outbound, Outbox};

pub struct Server {
    connection: Connection,
    dispatcher: Dispatcher,
    config: ServerConfig,
}

impl Server {
    /// Load the data files named in `config` and bind the socket
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let roster = Roster::load(&config.pokedex_path)?;
        let store = PokemonStore::load(&config.players_path)?;
        tracing::info!(
            species = roster.len(),
            players = store.owners().count(),
            "Loaded battle data"
        );

        let mut arena = Arena::new(roster, store);
        if let Some(seed) = config.seed {
            arena = arena.with_seed(seed);
        }
        Self::with_arena(config, arena).await
    }

    /// Bind the socket around an already built arena
    pub async fn with_arena(config: ServerConfig, arena: Arena) -> Result<Self> {
        let connection = Connection::bind(config.bind).await?;
        Ok(Self {
            connection,
            dispatcher: Dispatcher::new(Arc::new(arena))
                .with_required_token(config.require_token),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.connection.local_addr()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer);
        let outbox = Outbox::new(tx);
        let sender = self.connection.spawn_sender(rx);

        let mut buf = vec![0u8; self.config.max_datagram];
        tokio::pin!(shutdown);

        loop {
            let (len, source) = tokio::select! {
                _ = &mut shutdown => break,
                received = self.connection.recv(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        tracing::warn!(error = %e, "Receive failed");
                        continue;
                    }
                },
            };

            let datagram = String::from_utf8_lossy(&buf[..len]).into_owned();
            let dispatcher = self.dispatcher.clone();
            let outbox = outbox.clone();
            tokio::spawn(async move {
                let outbound = dispatcher.handle(&datagram, source);
                if let Err(e) = outbox.send_all(outbound).await {
                    tracing::warn!(%source, error = %e, "Failed to queue replies");
                }
            });
        }

        tracing::info!("Shutting down");
        drop(outbox);
        sender.abort();
        Ok(())
    }
}
