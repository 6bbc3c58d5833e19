use anyhow::{Context, Result};
use clap::Parser;
use std::fmt;

/// Default Genesys Cloud region (Middle East, UAE)
pub const DEFAULT_REGION: &str = "mec1.pure.cloud";

/// Genesys Bridge - credential broker and API proxy for Genesys Cloud
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8000")]
    pub port: u16,

    /// OAuth client id for the Genesys Cloud client-credentials grant
    #[arg(long, env = "GENESYS_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth client secret for the Genesys Cloud client-credentials grant
    #[arg(long, env = "GENESYS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Genesys Cloud region domain (e.g. mypurecloud.com, mec1.pure.cloud)
    #[arg(short = 'r', long, env = "GENESYS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Override for the identity base URL (default: https://login.{region})
    #[arg(long, env = "GENESYS_LOGIN_URL")]
    pub login_url: Option<String>,

    /// Override for the API base URL (default: https://api.{region})
    #[arg(long, env = "GENESYS_API_URL")]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub http_connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,

    /// Max idle pooled connections per upstream host
    #[arg(long, env = "HTTP_MAX_CONNECTIONS", default_value = "20")]
    pub http_max_connections: usize,
}

/// Upstream account settings.
///
/// Credentials stay optional here: a missing id or secret is reported per
/// token request rather than at startup.
#[derive(Clone, Default)]
pub struct GenesysSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: String,
    pub login_url: Option<String>,
    pub api_url: Option<String>,
}

impl GenesysSettings {
    /// Settings for the given region with no credentials or overrides
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        non_empty(&self.client_id).is_some() && non_empty(&self.client_secret).is_some()
    }
}

// Never print the secret, only whether it is present.
impl fmt::Debug for GenesysSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenesysSettings")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("region", &self.region)
            .field("login_url", &self.login_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Genesys account
    pub genesys: GenesysSettings,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Self::from_args(CliArgs::parse()))
    }

    /// Build configuration from already parsed arguments
    pub fn from_args(args: CliArgs) -> Self {
        Config {
            server_host: args.host,
            server_port: args.port,

            genesys: GenesysSettings {
                client_id: args.client_id,
                client_secret: args.client_secret,
                region: args.region,
                login_url: args.login_url.map(|u| trim_base_url(&u)),
                api_url: args.api_url.map(|u| trim_base_url(&u)),
            },

            http_max_connections: args.http_max_connections,
            http_connect_timeout: args.http_connect_timeout,
            http_request_timeout: args.http_timeout,

            log_level: args.log_level,
            log_format: parse_log_format(&args.log_format),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }

        if self.genesys.region.trim().is_empty() {
            anyhow::bail!("GENESYS_REGION must not be empty");
        }

        for (name, value) in [
            ("GENESYS_LOGIN_URL", &self.genesys.login_url),
            ("GENESYS_API_URL", &self.genesys.api_url),
        ] {
            if let Some(url) = value {
                reqwest::Url::parse(url)
                    .with_context(|| format!("{} is not a valid URL: {}", name, url))?;
            }
        }

        Ok(())
    }
}

/// Treat an empty string the same as an unset value
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Strip trailing slashes so paths can be appended directly
fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Parse log format from string
fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
