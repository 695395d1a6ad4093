//! Configuration management for godfs
//!
//! Startup flags are layered over environment variables (`GODFS_*`) and an
//! optional TOML file. The merged configuration is validated once at startup
//! and shared read-only by every request handler.

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::FileServerError;

pub const DEFAULT_CONFIG_FILE: &str = "godfs.toml";
const ENV_PREFIX: &str = "GODFS";

/// Command line flags
#[derive(Debug, Clone, Parser)]
#[command(
    name = "godfs",
    version,
    about = "Date-partitioned HTTP file storage",
    after_help = "Once started, upload with POST /upload and fetch files with GET /<path>, e.g. http://127.0.0.1:8080"
)]
pub struct Cli {
    /// Configuration file (TOML, optional)
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Storage root directory
    #[arg(short = 'D', long = "data-dir")]
    pub data_dir: Option<String>,

    /// External domain used to build remote paths
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Listening port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Group name substituted for the domain in remote paths
    #[arg(short = 'g', long)]
    pub group: Option<String>,

    /// Listening address
    #[arg(short = 'b', long = "bind")]
    pub bind_address: Option<String>,

    /// Directory for dated log files; empty logs to stderr
    #[arg(short = 'l', long = "log-dir")]
    pub log_dir: Option<String>,
}

/// Immutable server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Root directory of the date-partitioned storage tree
    pub data_dir: String,

    /// Externally reachable base URL, e.g. `http://127.0.0.1:8080`
    pub domain: String,

    /// Optional group segment, replaces the domain in remote paths
    #[serde(default)]
    pub group: Option<String>,

    /// Directory for `server.YYYY.MM.DD.log` files
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Upload size cap in MB, 0 disables the check
    pub max_file_size_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: "data".to_string(),
            domain: "http://127.0.0.1:8080".to_string(),
            group: None,
            log_dir: Some("logs".to_string()),
            max_file_size_mb: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration: defaults, then the TOML file, then the
    /// environment, then command line flags.
    pub fn load(cli: &Cli) -> Result<Self, FileServerError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("data_dir", defaults.data_dir)?
            .set_default("domain", defaults.domain)?
            .set_default("log_dir", defaults.log_dir.unwrap_or_default())?
            .set_default("max_file_size_mb", defaults.max_file_size_mb as i64)?
            .add_source(File::from(cli.config.as_path()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Flags win over every other source
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(domain) = &cli.domain {
            self.domain = domain.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(group) = &cli.group {
            self.group = Some(group.clone());
        }
        if let Some(bind_address) = &cli.bind_address {
            self.bind_address = bind_address.clone();
        }
        if let Some(log_dir) = &cli.log_dir {
            self.log_dir = Some(log_dir.clone());
        }
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.data_dir.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "data_dir cannot be empty".into(),
            ));
        }

        if self.domain.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "domain cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_addr(&self) -> Result<SocketAddr, FileServerError> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        addr.parse()
            .map_err(|_| FileServerError::InvalidAddress(addr))
    }

    /// Get storage root as PathBuf
    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Domain without trailing slashes
    pub fn domain_base(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Configured group, if non-empty
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }

    /// Log directory, if file logging is enabled
    pub fn log_dir_path(&self) -> Option<PathBuf> {
        self.log_dir
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
    }

    /// Get maximum file size in bytes, `None` when unlimited
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        match self.max_file_size_mb {
            0 => None,
            mb => Some(mb * 1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_flags() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 8080);
        assert_eq!(c.data_dir, "data");
        assert_eq!(c.domain, "http://127.0.0.1:8080");
        assert!(c.group_name().is_none());
        assert!(c.max_file_size_bytes().is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "godfs",
            "-c",
            dir.path().join("absent.toml").to_str().unwrap(),
            "-D",
            "/srv/files",
            "-d",
            "https://files.example.com/",
            "-p",
            "9090",
            "-g",
            "group1",
        ]);

        let c = ServerConfig::load(&cli).unwrap();
        assert_eq!(c.data_dir, "/srv/files");
        assert_eq!(c.domain_base(), "https://files.example.com");
        assert_eq!(c.port, 9090);
        assert_eq!(c.group_name(), Some("group1"));
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("godfs.toml");
        std::fs::write(
            &path,
            "data_dir = \"/var/godfs\"\nmax_file_size_mb = 5\nlog_dir = \"\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from(["godfs", "-c", path.to_str().unwrap()]);
        let c = ServerConfig::load(&cli).unwrap();
        assert_eq!(c.data_dir, "/var/godfs");
        assert_eq!(c.max_file_size_bytes(), Some(5 * 1024 * 1024));
        assert!(c.log_dir_path().is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let c = ServerConfig {
            data_dir: " ".into(),
            ..Default::default()
        };
        assert!(c.validate().is_err());

        let c = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn empty_group_is_ignored() {
        let c = ServerConfig {
            group: Some(String::new()),
            ..Default::default()
        };
        assert!(c.group_name().is_none());
    }

    #[test]
    fn listen_addr_parses() {
        let c = ServerConfig {
            bind_address: "127.0.0.1".into(),
            port: 8081,
            ..Default::default()
        };
        assert_eq!(c.listen_addr().unwrap(), "127.0.0.1:8081".parse().unwrap());

        let c = ServerConfig {
            bind_address: "not-an-ip".into(),
            ..Default::default()
        };
        assert!(c.listen_addr().is_err());
    }
}
