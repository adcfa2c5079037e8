use std::env;
use std::net::SocketAddr;
use tracing::warn;

pub const BIND_ADDR_ENV: &str = "ANONCHAT_BIND_ADDR";

/// Settings for the room store service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(BIND_ADDR_ENV) {
            match raw.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(
                    "Ignoring {}={:?}: {}; using {}",
                    BIND_ADDR_ENV, raw, e, config.bind_addr
                ),
            }
        }

        config
    }
}
