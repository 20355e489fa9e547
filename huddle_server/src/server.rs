//! TCP accept loop

use crate::config::RelayConfig;
use crate::dispatcher::EventDispatcher;
use crate::handler::handle_connection;
use crate::router::SignalingRouter;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// A bound relay, ready to accept WebSocket clients
pub struct RelayServer {
    listener: TcpListener,
    dispatcher: EventDispatcher,
    outbound_buffer: usize,
}

impl RelayServer {
    pub async fn bind(config: &RelayConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self {
            listener,
            dispatcher: EventDispatcher::new(Arc::new(SignalingRouter::new())),
            outbound_buffer: config.outbound_buffer,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn router(&self) -> &Arc<SignalingRouter> {
        self.dispatcher.router()
    }

    /// Accept clients until `shutdown` resolves.
    ///
    /// Sessions already running are detached and end when their sockets close.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> std::io::Result<()> {
        info!("Signaling relay listening on ws://{}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, peer_addr)) => {
                        debug!(%peer_addr, "accepted TCP connection");
                        let dispatcher = self.dispatcher.clone();
                        let outbound_buffer = self.outbound_buffer;
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, dispatcher, outbound_buffer).await {
                                error!(%peer_addr, error = %e, "WebSocket connection error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },
                _ = &mut shutdown => {
                    info!("Signaling relay shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}
