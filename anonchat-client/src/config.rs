use anonchat_core::IceServerConfig;
use std::env;
use tracing::warn;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub const STUN_URLS_ENV: &str = "ANONCHAT_STUN_URLS";
pub const TURN_URL_ENV: &str = "ANONCHAT_TURN_URL";
pub const TURN_USERNAME_ENV: &str = "ANONCHAT_TURN_USERNAME";
pub const TURN_CREDENTIAL_ENV: &str = "ANONCHAT_TURN_CREDENTIAL";
pub const MAX_CLAIM_ATTEMPTS_ENV: &str = "ANONCHAT_MAX_CLAIM_ATTEMPTS";

/// Client-side settings for one chat session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// STUN/TURN servers handed to every new peer connection.
    pub ice_servers: Vec<IceServerConfig>,
    pub audio: bool,
    pub video: bool,
    /// Capacity of the per-connection transport event channel.
    pub event_capacity: usize,
    /// Lost claims tolerated before a search stops scanning and opens its own room.
    pub max_claim_attempts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            audio: true,
            video: true,
            event_capacity: 256,
            max_claim_attempts: 3,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `ANONCHAT_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(STUN_URLS_ENV) {
            let urls: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned)
                .collect();
            if urls.is_empty() {
                warn!("{} is set but empty, keeping default STUN server", STUN_URLS_ENV);
            } else {
                config.ice_servers = vec![IceServerConfig {
                    urls,
                    username: None,
                    credential: None,
                }];
            }
        }

        if let Ok(turn_url) = env::var(TURN_URL_ENV) {
            config.ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: env::var(TURN_USERNAME_ENV).ok(),
                credential: env::var(TURN_CREDENTIAL_ENV).ok(),
            });
        }

        if let Ok(raw) = env::var(MAX_CLAIM_ATTEMPTS_ENV) {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.max_claim_attempts = n,
                _ => warn!(
                    "Ignoring {}={:?}, keeping {}",
                    MAX_CLAIM_ATTEMPTS_ENV, raw, config.max_claim_attempts
                ),
            }
        }

        config
    }

    /// Configuration without ICE servers, for loopback connections.
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
            ..Self::default()
        }
    }
}
