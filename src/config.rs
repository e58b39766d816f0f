//! Configuration for momo-keygen
//!
//! CLI arguments and environment variable handling using clap.
//! A `.env` file is loaded by `main` before parsing.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default MTN MoMo sandbox base URL
pub const DEFAULT_GATEWAY_URL: &str = "https://sandbox.momodeveloper.mtn.com";

/// Callback host used when the caller leaves it empty
pub const DEFAULT_CALLBACK_HOST: &str = "example.com";

/// momo-keygen - MTN MoMo sandbox credential provisioning
#[derive(Parser, Debug, Clone)]
#[command(name = "momo-keygen")]
#[command(about = "Provision MTN MoMo sandbox API users and API keys")]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Base URL of the MoMo gateway (identity, key and token endpoints hang off it)
    #[arg(long, env = "MOMO_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Callback host registered when the request does not carry one
    #[arg(long, env = "DEFAULT_CALLBACK_HOST", default_value = DEFAULT_CALLBACK_HOST)]
    pub default_callback_host: String,

    /// Timeout for each gateway call in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Comma-separated list of origins allowed by CORS
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "http://localhost:3000")]
    pub allowed_origins: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            default_callback_host: DEFAULT_CALLBACK_HOST.to_string(),
            request_timeout_ms: 10_000,
            allowed_origins: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Args {
    /// Socket address the server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Gateway base URL without a trailing slash
    pub fn gateway_base(&self) -> &str {
        self.gateway_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the list of allowed CORS origins
    pub fn allowed_origin_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://")) {
            return Err(format!(
                "MOMO_GATEWAY_URL must start with http:// or https:// (got {})",
                self.gateway_url
            ));
        }

        if self.default_callback_host.trim().is_empty() {
            return Err("DEFAULT_CALLBACK_HOST must not be empty".to_string());
        }

        Ok(())
    }
}
