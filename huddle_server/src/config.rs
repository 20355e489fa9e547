//! Command-line and environment configuration

use clap::Parser;
use std::net::SocketAddr;

/// Room-scoped WebRTC signaling relay
///
/// Clients connect over WebSocket, join rooms and exchange offers, answers and
/// ICE candidates with the other members of those rooms.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RelayConfig {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0", env = "HUDDLE_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8081, env = "HUDDLE_PORT")]
    pub port: u16,

    /// Frames queued per client before further frames to it are dropped
    #[arg(long, default_value_t = 64, env = "HUDDLE_OUTBOUND_BUFFER")]
    pub outbound_buffer: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", env = "HUDDLE_LOG")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            outbound_buffer: 64,
            log_level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// `host:port`, as accepted by `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        match self.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}
