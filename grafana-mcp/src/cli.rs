//! Command-line surface of the `mcp-grafana` binary

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use grafana_mcp_core::config::{DEFAULT_ADDRESS, DEFAULT_ENDPOINT_PATH, DEFAULT_GRAFANA_URL};
use grafana_mcp_core::{Category, ConfigResult, ServerConfig, TlsConfig, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mcp-grafana")]
#[command(about = "Model Context Protocol server for Grafana")]
#[command(version)]
pub struct Cli {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Listen address for the HTTP transports
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Base path for the HTTP transports
    #[arg(long, default_value = "")]
    pub base_path: String,

    /// Endpoint path for the streamable HTTP transport
    #[arg(long, default_value = DEFAULT_ENDPOINT_PATH)]
    pub endpoint_path: String,

    /// Verbose logging, including every Grafana request
    #[arg(long)]
    pub debug: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, env = "GRAFANA_URL", default_value = DEFAULT_GRAFANA_URL)]
    pub grafana_url: String,

    #[arg(long, env = "GRAFANA_SERVICE_ACCOUNT_TOKEN", hide_env_values = true)]
    pub service_account_token: Option<String>,

    #[arg(long, env = "GRAFANA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "GRAFANA_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "GRAFANA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// On-behalf-of access token
    #[arg(long, env = "GRAFANA_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// On-behalf-of ID token
    #[arg(long, env = "GRAFANA_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,

    /// Client certificate (PEM) for mutual TLS
    #[arg(long)]
    pub tls_cert_file: Option<PathBuf>,

    /// Client key (PEM) for mutual TLS
    #[arg(long)]
    pub tls_key_file: Option<PathBuf>,

    /// Extra CA certificate (PEM) to trust
    #[arg(long)]
    pub tls_ca_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub tls_skip_verify: bool,

    /// Per-request timeout for Grafana calls
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long)]
    pub disable_search: bool,
    #[arg(long)]
    pub disable_dashboard: bool,
    #[arg(long)]
    pub disable_datasource: bool,
    #[arg(long)]
    pub disable_prometheus: bool,
    #[arg(long)]
    pub disable_loki: bool,
    #[arg(long)]
    pub disable_incident: bool,
    #[arg(long)]
    pub disable_alerting: bool,
    #[arg(long)]
    pub disable_oncall: bool,
    #[arg(long)]
    pub disable_sift: bool,
    #[arg(long)]
    pub disable_pyroscope: bool,
    #[arg(long)]
    pub disable_navigation: bool,
    #[arg(long)]
    pub disable_asserts: bool,
    #[arg(long)]
    pub disable_admin: bool,
}

impl Cli {
    /// Categories switched off on the command line
    pub fn disabled_categories(&self) -> Vec<Category> {
        [
            (self.disable_search, Category::Search),
            (self.disable_dashboard, Category::Dashboard),
            (self.disable_datasource, Category::Datasource),
            (self.disable_prometheus, Category::Prometheus),
            (self.disable_loki, Category::Loki),
            (self.disable_incident, Category::Incident),
            (self.disable_alerting, Category::Alerting),
            (self.disable_oncall, Category::Oncall),
            (self.disable_sift, Category::Sift),
            (self.disable_pyroscope, Category::Pyroscope),
            (self.disable_navigation, Category::Navigation),
            (self.disable_asserts, Category::Asserts),
            (self.disable_admin, Category::Admin),
        ]
        .into_iter()
        .filter_map(|(disabled, category)| disabled.then_some(category))
        .collect()
    }

    /// Default `EnvFilter` directive; `RUST_LOG` still wins
    pub fn log_directive(&self) -> String {
        let level = if self.debug {
            LogLevel::Debug
        } else {
            self.log_level
        };
        format!(
            "grafana_mcp={level},grafana_mcp_core={level}",
            level = level.as_str()
        )
    }

    /// Validate into a [`ServerConfig`]
    pub fn to_config(&self) -> ConfigResult<ServerConfig> {
        let mut builder = ServerConfig::builder()
            .transport(self.transport)
            .address(&self.address)
            .base_path(&self.base_path)
            .endpoint_path(&self.endpoint_path)
            .url(&self.grafana_url)
            .tls(TlsConfig {
                cert_file: self.tls_cert_file.clone(),
                key_file: self.tls_key_file.clone(),
                ca_file: self.tls_ca_file.clone(),
                skip_verify: self.tls_skip_verify,
            })
            .debug(self.debug)
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(token) = &self.service_account_token {
            builder = builder.service_account_token(token);
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(username) = &self.username {
            builder = builder.username(username);
        }
        if let Some(password) = &self.password {
            builder = builder.password(password);
        }
        if let Some(token) = &self.access_token {
            builder = builder.access_token(token);
        }
        if let Some(token) = &self.id_token {
            builder = builder.id_token(token);
        }
        for category in self.disabled_categories() {
            builder = builder.disable(category);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_mcp_core::Credentials;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mcp-grafana").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_build_config() {
        let cli = parse(&[
            "--grafana-url",
            "https://grafana.example.com/",
            "--api-key",
            "secret",
            "--disable-admin",
            "--disable-loki",
            "--timeout-secs",
            "5",
        ]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.backend.url, "https://grafana.example.com");
        assert_eq!(config.backend.credentials, Credentials::ApiKey("secret".into()));
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert!(!config.enabled_categories.contains(&Category::Admin));
        assert!(!config.enabled_categories.contains(&Category::Loki));
        assert!(config.enabled_categories.contains(&Category::Search));
    }

    #[test]
    fn test_transport_values() {
        let cli = parse(&["-t", "streamable-http"]);
        assert_eq!(cli.transport, Transport::StreamableHttp);

        assert!(Cli::try_parse_from(["mcp-grafana", "--transport", "websocket"]).is_err());
    }

    #[test]
    fn test_debug_raises_log_directive() {
        let cli = parse(&["--debug"]);
        assert_eq!(cli.log_directive(), "grafana_mcp=debug,grafana_mcp_core=debug");

        let cli = parse(&["--log-level", "warn"]);
        assert_eq!(cli.log_directive(), "grafana_mcp=warn,grafana_mcp_core=warn");
    }
}
