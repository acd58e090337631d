//! Server configuration from the command line and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Parser, ValueEnum};
use serde::Serialize;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default path of the real-time WebSocket endpoint.
pub const DEFAULT_WS_PATH: &str = "/ws/editor";

/// Deployment mode, reported by `/health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local development.
    #[default]
    Development,
    /// Deployed instance.
    Production,
}

impl Mode {
    /// Label used in logs and health output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Command-line arguments for overlay-canvas.
#[derive(Debug, Clone, Parser)]
#[command(name = "overlay-canvas")]
#[command(about = "Real-time canvas sync server for editors and overlays")]
#[command(version)]
pub struct CliArgs {
    /// Address to bind
    #[arg(long, env = "OVERLAY_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to bind
    #[arg(long, env = "OVERLAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path of the WebSocket endpoint
    #[arg(long, env = "OVERLAY_WS_PATH", default_value = DEFAULT_WS_PATH)]
    pub ws_path: String,

    /// Deployment mode
    #[arg(long, env = "OVERLAY_MODE", value_enum, default_value_t = Mode::Development)]
    pub mode: Mode,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin", env = "OVERLAY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port to bind.
    pub port: u16,
    /// Path of the WebSocket endpoint, always starting with `/`.
    pub ws_path: String,
    /// Deployment mode.
    pub mode: Mode,
    /// Origins allowed by CORS. Empty means localhost on the bound port.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            ws_path: DEFAULT_WS_PATH.to_string(),
            mode: Mode::Development,
            cors_origins: Vec::new(),
        }
    }

    /// Socket address to bind.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Origins the CORS layer should allow.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        if !self.cors_origins.is_empty() {
            return self.cors_origins.clone();
        }
        vec![
            format!("http://localhost:{}", self.port),
            format!("http://127.0.0.1:{}", self.port),
        ]
    }
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        let ws_path = if args.ws_path.starts_with('/') {
            args.ws_path
        } else {
            format!("/{}", args.ws_path)
        };
        Self {
            host: args.host,
            port: args.port,
            ws_path,
            mode: args.mode,
            cors_origins: args
                .cors_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }
}
