//! Process configuration.
//!
//! Every setting can come from a flag or an environment variable; `main`
//! loads a `.env` file first so local runs can keep them there.

use clap::{Parser, ValueEnum};
use redis::{ConnectionInfo, IntoConnectionInfo, RedisResult};
use std::time::Duration;

/// Which `OrderRepository` backend to run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Redis,
    Memory,
}

/// Command-line arguments for the order service.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Redis endpoint as host:port
    #[arg(long, env = "REDIS_ADDR", default_value = "localhost:6379")]
    pub redis_addr: String,

    #[arg(long, env = "REDIS_USERNAME")]
    pub redis_username: Option<String>,

    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "SERVER_PORT", default_value_t = 3000)]
    pub server_port: u16,

    /// Upper bound on a single store round-trip, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Index entries visited per list page
    #[arg(long, env = "PAGE_SIZE", default_value_t = 50)]
    pub page_size: u64,

    /// Attempts per status update when the stored revision keeps moving
    #[arg(long, env = "UPDATE_ATTEMPTS", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub update_attempts: u32,

    #[arg(long, env = "STORAGE", value_enum, default_value_t = StorageKind::Redis)]
    pub storage: StorageKind,

    /// Default tracing filter; RUST_LOG takes precedence when set
    #[arg(long, env = "LOG_LEVEL", default_value = "info,order_service=debug")]
    pub log_level: String,
}

impl Config {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Connection settings for the Redis backend. Empty credentials count as unset.
    pub fn redis_connection_info(&self) -> RedisResult<ConnectionInfo> {
        let mut info = format!("redis://{}", self.redis_addr).into_connection_info()?;
        info.redis.username = non_empty(&self.redis_username);
        info.redis.password = non_empty(&self.redis_password);
        Ok(info)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
