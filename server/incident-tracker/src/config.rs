//! Service configuration with sane defaults, overridable from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Interface to bind. Internal service, so loopback by default.
  pub host: IpAddr,
  pub port: u16,
  /// Postgres connection string. `None` selects the in-memory backend.
  pub database_url: Option<String>,
  pub max_connections: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      host: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: 5005,
      database_url: None,
      max_connections: 5,
    }
  }
}

impl Config {
  /// Read `HOST`, `PORT`, `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Same as `from_env`, but with an injectable variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();

    if let Some(raw) = lookup("HOST") {
      config.host = raw
        .parse()
        .map_err(|e| ConfigError::invalid("HOST", &raw, e))?;
    }
    if let Some(raw) = lookup("PORT") {
      config.port = raw
        .parse()
        .map_err(|e| ConfigError::invalid("PORT", &raw, e))?;
    }
    if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
      config.max_connections = match raw.parse::<u32>() {
        Ok(0) => return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &raw, "must be > 0")),
        Ok(n) => n,
        Err(e) => return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &raw, e)),
      };
    }
    config.database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

    Ok(config)
  }

  pub fn bind_addr(&self) -> SocketAddr {
    SocketAddr::new(self.host, self.port)
  }
}
