use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::relay::DEFAULT_OUTBOX_CAPACITY;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Interface the relay binds to.
    #[arg(long, env = "RELAY_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port serving both the HTTP listings and the WebSocket endpoint. Use 0
    /// for an ephemeral port.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Events buffered per client before broadcasts to it are dropped.
    #[arg(long, env = "RELAY_OUTBOX_CAPACITY", default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    pub outbox_capacity: usize,
}

impl Cli {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
