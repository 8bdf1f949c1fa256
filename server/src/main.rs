//! pokeduel server entry point.
use anyhow::Result;
use pokeduel_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env();
    let server = Server::bind(config).await?;
    tracing::info!(addr = %server.local_addr()?, "Listening for datagrams");

    server.run().await
}
