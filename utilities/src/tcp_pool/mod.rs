use std::{io, time::Duration};

use tokio::net::TcpStream;
use tracing::trace;

/// Opens the one-shot connections every request/reply exchange runs on.
#[derive(Clone, Copy, Debug)]
pub struct TcpPool {
    connect_timeout: Duration,
}
impl TcpPool {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
    pub async fn get_connection(&self, tcp_address: &str) -> io::Result<TcpStream> {
        trace!(%tcp_address, "Opening tcp connection");
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(tcp_address)).await {
            Ok(stream) => stream,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connecting to {tcp_address} timed out"),
            )),
        }
    }
}

impl Default for TcpPool {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
