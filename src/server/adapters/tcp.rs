//! TCP reachability probe.

use crate::server::{
    domain::Server,
    ports::{ConnectivityProbe, ProbeReport, ProbeResult},
};
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Port assumed when a server has none configured.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Probe that opens a TCP connection to the server's SSH endpoint.
///
/// Resolution and connection failures become failed reports carrying the
/// error text. The coordinator bounds the attempt with its probe timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectivityProbe;

impl TcpConnectivityProbe {
    /// Creates a TCP probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn probe(&self, server: &Server) -> ProbeResult<ProbeReport> {
        let Some(host) = server.ip_address().map(str::trim).filter(|host| !host.is_empty())
        else {
            return Ok(ProbeReport::failed("no ip address configured"));
        };
        let port = server.port().unwrap_or(DEFAULT_SSH_PORT);
        let endpoint = format!("{host}:{port}");

        match TcpStream::connect((host, port)).await {
            Ok(_) => Ok(ProbeReport::successful(format!("connected to {endpoint}"))),
            Err(err) => Ok(ProbeReport::failed(format!(
                "failed to connect to {endpoint}: {err}"
            ))),
        }
    }
}
