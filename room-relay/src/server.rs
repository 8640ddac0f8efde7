use std::{future::Future, net::SocketAddr};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{api, relay::Relay};

pub struct Server {
    listener: TcpListener,
    relay: Relay,
}

impl Server {
    pub fn new(listener: TcpListener, relay: Relay) -> Self {
        Self { listener, relay }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Serves HTTP and WebSocket traffic until `shutdown` resolves. Connected
    /// clients are told the relay is going away before in-flight requests
    /// are drained.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { listener, relay } = self;
        let app = api::router(relay.clone());

        let shutdown = async move {
            shutdown.await;
            info!("relay shutting down");
            relay.shutdown().await;
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("relay server failed")
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}
