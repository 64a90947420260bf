use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Process configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Versioned prefix every route lives under.
    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let port = var("MIRROR_PORT", "3000");
        let port = port
            .parse()
            .with_context(|| format!("MIRROR_PORT is not a valid port: {port}"))?;

        Ok(Self {
            db_path: PathBuf::from(var("MIRROR_DB_PATH", "mirror.db")),
            host: var("MIRROR_HOST", "0.0.0.0"),
            port,
            api_prefix: var("MIRROR_API_PREFIX", "/api/v1"),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
