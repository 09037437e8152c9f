use std::net::SocketAddr;

use http::HeaderValue;

use crate::ServiceConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Largest accepted request body in bytes
    pub body_limit: usize,
    // Origins allowed by CORS; empty means any
    pub cors_origins: Vec<HeaderValue>,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, body_limit: usize, cors_origins: &[String]) -> Self {
        let cors_origins = cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, body_limit={}, cors_origins={:?}",
            listen_addr,
            body_limit,
            cors_origins
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            body_limit,
            cors_origins,
        }
    }
}

impl From<&ServiceConfig> for Config {
    fn from(service_config: &ServiceConfig) -> Self {
        let mut config = Self::new(
            service_config.listen_addr,
            service_config.body_limit,
            &service_config.cors_origins,
        );
        config.log_level = service_config.log_level;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}
