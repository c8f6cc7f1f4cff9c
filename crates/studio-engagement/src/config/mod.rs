use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Runtime stage the service runs in, controlling operational defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, read from `STUDIO_*` environment variables with
/// an optional `.env` file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engagement: EngagementConfig,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&env_or("STUDIO_ENV", "development"));

        let host = env_or("STUDIO_HOST", "127.0.0.1");
        let port = env_or("STUDIO_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("STUDIO_LOG_LEVEL", "info");

        let sweep_chunk_size = env_or("STUDIO_SWEEP_CHUNK", "100")
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or(ConfigError::InvalidSweepChunk)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engagement: EngagementConfig { sweep_chunk_size },
        })
    }
}

/// HTTP listener binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        // "localhost" is accepted as a convenience alias for the loopback
        // address; everything else must be a literal IP.
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filtering controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tuning knobs for the engagement engine itself.
#[derive(Debug, Clone)]
pub struct EngagementConfig {
    /// Page size used when sweeping a tenant's clients for badge checks.
    pub sweep_chunk_size: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSweepChunk,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "STUDIO_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "STUDIO_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSweepChunk => {
                write!(f, "STUDIO_SWEEP_CHUNK must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSweepChunk => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
