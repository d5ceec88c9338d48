//! Process configuration read from the environment.

use thiserror::Error;

pub const ENV_BROKER_URL: &str = "GLUED_STORE_AMQP";
pub const ENV_BUS_NAME: &str = "GLUED_STORE_BUS";
pub const ENV_STORAGE_CONFIG: &str = "GLUED_STORE_RETHINKDB";
pub const ENV_HTTP_HOST: &str = "GLUED_STORE_HOST";
pub const ENV_HTTP_PORT: &str = "GLUED_STORE_PORT";
pub const ENV_RPC_SERVICE: &str = "GLUED_STORE_RPC_SERVICE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid GLUED_STORE_PORT value {0:?}")]
    InvalidPort(String),
}

/// Addresses and names of the store's collaborators. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub broker_url: String,
    pub bus_name: String,
    /// Path to a storage connection config file, if any.
    pub storage_config: Option<String>,
    pub http_host: String,
    pub http_port: u16,
    pub rpc_service: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broker_url: "amqp://localhost".to_string(),
            bus_name: "glued_message_bus".to_string(),
            storage_config: None,
            http_host: "127.0.0.1".to_string(),
            http_port: 9210,
            rpc_service: crate::binding::rpc::DEFAULT_SERVICE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let http_port = match get(ENV_HTTP_PORT) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.http_port,
        };

        Ok(Self {
            broker_url: get(ENV_BROKER_URL).unwrap_or(defaults.broker_url),
            bus_name: get(ENV_BUS_NAME).unwrap_or(defaults.bus_name),
            storage_config: get(ENV_STORAGE_CONFIG),
            http_host: get(ENV_HTTP_HOST).unwrap_or(defaults.http_host),
            http_port,
            rpc_service: get(ENV_RPC_SERVICE).unwrap_or(defaults.rpc_service),
        })
    }

    /// `host:port` for the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
