//! Configuration management for the Leadflow gateway.

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use leadflow_logging::LogMode;
use leadflow_publish::{Destination, PublisherConfig, TransportConfig};
use leadflow_schema::LEAD_SCHEMA_REF;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Queue URLs have no default; the service refuses to start without the
/// leads queue, and without a distinct log queue when logs go remote.
///
/// # Example
///
/// ```no_run
/// use leadflow_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Database
    /// PostgreSQL connection URL.
    ///
    /// Environment variable: `DATABASE_URL`
    #[serde(default = "default_database_url", alias = "DATABASE_URL")]
    pub database_url: String,
    /// Maximum number of database connections in the pool.
    ///
    /// Environment variable: `DATABASE_MAX_CONNECTIONS`
    #[serde(default = "default_max_connections", alias = "DATABASE_MAX_CONNECTIONS")]
    pub database_max_connections: u32,
    /// Minimum number of connections to maintain in the pool.
    ///
    /// Environment variable: `DATABASE_MIN_CONNECTIONS`
    #[serde(default = "default_min_connections", alias = "DATABASE_MIN_CONNECTIONS")]
    pub database_min_connections: u32,
    /// Database connection acquire timeout in seconds.
    ///
    /// Environment variable: `DATABASE_CONNECTION_TIMEOUT`
    #[serde(default = "default_acquire_timeout", alias = "DATABASE_CONNECTION_TIMEOUT")]
    pub database_connection_timeout: u64,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Queue
    /// SQS-compatible service endpoint, e.g. LocalStack.
    ///
    /// Environment variable: `AWS_ENDPOINT`
    #[serde(default, alias = "AWS_ENDPOINT")]
    pub aws_endpoint: Option<String>,
    /// Queue region.
    ///
    /// Environment variable: `AWS_DEFAULT_REGION`
    #[serde(default = "default_region", alias = "AWS_DEFAULT_REGION")]
    pub aws_default_region: String,
    /// Queue receiving lead-created events.
    ///
    /// Environment variable: `AWS_SQS_QUEUE_URL`
    #[serde(default, alias = "AWS_SQS_QUEUE_URL")]
    pub aws_sqs_queue_url: String,
    /// Queue receiving forwarded log entries.
    ///
    /// Environment variable: `AWS_SQS_LOG_QUEUE_URL`
    #[serde(default, alias = "AWS_SQS_LOG_QUEUE_URL")]
    pub aws_sqs_log_queue_url: String,
    /// Per-send transport timeout in seconds.
    ///
    /// Environment variable: `QUEUE_TIMEOUT_SECONDS`
    #[serde(default = "default_queue_timeout", alias = "QUEUE_TIMEOUT_SECONDS")]
    pub queue_timeout_seconds: u64,

    // Application logging
    /// Where business log entries go: `local`, `remote` or `both`.
    ///
    /// Environment variable: `LOG_MODE`
    #[serde(default = "default_log_mode", alias = "LOG_MODE")]
    pub log_mode: String,

    // Schemas
    /// Directory schema references are resolved against.
    ///
    /// Environment variable: `SCHEMA_ROOT`
    #[serde(default = "default_schema_root", alias = "SCHEMA_ROOT")]
    pub schema_root: String,
    /// Schema reference leads are validated against.
    ///
    /// Environment variable: `LEAD_SCHEMA`
    #[serde(default = "default_lead_schema", alias = "LEAD_SCHEMA")]
    pub lead_schema: String,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns error if a source cannot be parsed or the merged values fail
    /// validation.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Application log routing mode. Unknown values fall back to local.
    pub fn log_mode(&self) -> LogMode {
        LogMode::parse(&self.log_mode)
    }

    /// Convert to the publisher's destination settings.
    pub fn to_publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            leads_destination: Destination::new(self.aws_sqs_queue_url.as_str()),
            log_destination: Destination::new(self.aws_sqs_log_queue_url.as_str()),
        }
    }

    /// Convert to the queue transport settings.
    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            endpoint: self
                .aws_endpoint
                .as_deref()
                .map(str::trim)
                .filter(|endpoint| !endpoint.is_empty())
                .map(String::from),
            region: self.aws_default_region.clone(),
            timeout: Duration::from_secs(self.queue_timeout_seconds),
        }
    }

    /// Directory the file schema loader reads from.
    pub fn schema_root(&self) -> PathBuf {
        PathBuf::from(&self.schema_root)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns error if host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Get database URL with password masked for logging.
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let mut masked = self.database_url.clone();
                masked.replace_range(colon_pos + 1..at_pos, "***");
                return masked;
            }
        }
        self.database_url.clone()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.database_min_connections > self.database_max_connections {
            anyhow::bail!("database min_connections cannot exceed max_connections");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.queue_timeout_seconds == 0 {
            anyhow::bail!("queue_timeout_seconds must be greater than 0");
        }

        if self.lead_schema.trim().is_empty() {
            anyhow::bail!("lead_schema must not be empty");
        }

        let publisher = self.to_publisher_config();

        if publisher.leads_destination.is_empty() {
            anyhow::bail!("aws_sqs_queue_url must be set");
        }
        publisher.leads_destination.check().context("aws_sqs_queue_url is not usable")?;

        if self.log_mode().uses_remote() {
            if publisher.log_destination.is_empty() {
                anyhow::bail!(
                    "aws_sqs_log_queue_url must be set when log_mode is {}",
                    self.log_mode()
                );
            }
            publisher.log_destination.check().context("aws_sqs_log_queue_url is not usable")?;

            if publisher.log_destination == publisher.leads_destination {
                anyhow::bail!("aws_sqs_log_queue_url must differ from aws_sqs_queue_url");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            database_max_connections: default_max_connections(),
            database_min_connections: default_min_connections(),
            database_connection_timeout: default_acquire_timeout(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            aws_endpoint: None,
            aws_default_region: default_region(),
            aws_sqs_queue_url: String::new(),
            aws_sqs_log_queue_url: String::new(),
            queue_timeout_seconds: default_queue_timeout(),
            log_mode: default_log_mode(),
            schema_root: default_schema_root(),
            lead_schema: default_lead_schema(),
            rust_log: default_log_level(),
        }
    }
}

fn default_database_url() -> String {
    "postgresql://localhost/leadflow".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_queue_timeout() -> u64 {
    5
}

fn default_log_mode() -> String {
    LogMode::Local.as_str().to_string()
}

fn default_schema_root() -> String {
    ".".to_string()
}

fn default_lead_schema() -> String {
    LEAD_SCHEMA_REF.to_string()
}

fn default_log_level() -> String {
    "info,leadflow=debug,tower_http=debug".to_string()
}
