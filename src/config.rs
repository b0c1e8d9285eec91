use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct Config {
    /// Server-held TMDB credential. Absence is reported per proxied request.
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Duration,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY").ok().filter(|s| !s.trim().is_empty());
        let tmdb_base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3146")?;
        let upstream_timeout = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let data_dir = env::var("DHAVAFLIX_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: tmdb_base_url.trim_end_matches('/').to_string(),
            bind_addr,
            upstream_timeout,
            data_dir,
        })
    }
}

pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}
