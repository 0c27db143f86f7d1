use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::content::Resolver;
use crate::http::connection::{Connection, ConnectionSettings};

/// A bound socket plus everything a connection task needs.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    resolver: Arc<Resolver>,
    settings: ConnectionSettings,
    permits: Arc<Semaphore>,
}

impl Listener {
    pub fn bind(cfg: &Config, resolver: Arc<Resolver>) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", cfg.listen_addr))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("failed to bind {addr}"))?;
        let inner = socket.listen(cfg.backlog)?;

        info!("Listening on {}", inner.local_addr()?);

        Ok(Self {
            inner,
            resolver,
            settings: ConnectionSettings::from_config(cfg),
            permits: Arc::new(Semaphore::new(cfg.max_connections)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accepts forever, one task per connection.
    ///
    /// A connection slot is claimed before `accept`, so at most
    /// `max_connections` peers are served while the rest wait in the backlog.
    pub async fn serve(self) -> anyhow::Result<()> {
        loop {
            let permit = Arc::clone(&self.permits).acquire_owned().await?;

            let (socket, peer) = match self.inner.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            info!("Accepted connection from {}", peer);

            let resolver = Arc::clone(&self.resolver);
            let settings = self.settings.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let mut conn = Connection::new(socket, resolver, settings);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let resolver = Arc::new(Resolver::from_config(cfg)?);
    Listener::bind(cfg, resolver)?.serve().await
}
