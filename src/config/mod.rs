//! Configuration management
//!
//! Settings come from flags, environment variables (the usual way in a CI
//! pipeline) or an optional TOML file, in that order of precedence. Every
//! check runs here, before anything touches the network.

use crate::matcher::ExclusionSet;
use crate::remote::Credentials;
use crate::types::{normalize_separators, RemotePath, SyncError};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "ftpdeploy", version, about = "Upload a local directory tree to an FTP server")]
pub struct Cli {
    /// FTP server, `host` or `host:port`
    #[arg(short, long, env = "FTP_SERVER")]
    pub server: Option<String>,

    /// Port used when the server address carries none
    #[arg(short, long, env = "FTP_PORT")]
    pub port: Option<u16>,

    #[arg(short, long, env = "FTP_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "FTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Local directory to upload [default: .]
    #[arg(short, long = "local-dir", env = "LOCAL_DIR")]
    pub local_dir: Option<PathBuf>,

    /// Remote base directory, created if missing [default: server root]
    #[arg(short, long = "remote-path", env = "FTP_REMOTE_PATH")]
    pub remote_path: Option<String>,

    /// Extra exclusion rule (glob; trailing `/` for directories), repeatable
    #[arg(short, long = "exclude")]
    pub exclude: Vec<String>,

    /// Comma-separated exclusion rules; commas inside `{}` or `[]` stay in the rule
    #[arg(long = "exclude-list", env = "FTP_EXCLUDE", value_name = "RULES")]
    pub exclude_list: Option<String>,

    /// Connect/read timeout in seconds [default: 30]
    #[arg(long, env = "FTP_TIMEOUT")]
    pub timeout: Option<u64>,

    /// TOML file with the same settings
    #[arg(short, long, env = "FTPDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Walk and match, but do not connect or upload
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Settings read from a `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub remote_path: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub timeout: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            SyncError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

/// FTP server endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Parse `host`, `host:port` or `[v6]:port`; `default_port` fills the gap
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, SyncError> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("ftp://").unwrap_or(raw).trim_end_matches('/');
        let invalid = || SyncError::Config(format!("Invalid server address '{}'", raw));

        if let Some(rest) = raw.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail.strip_prefix(':') {
                Some(port) => port.parse().map_err(|_| invalid())?,
                None if tail.is_empty() => default_port,
                None => return Err(invalid()),
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        let (host, port) = match raw.rsplit_once(':') {
            // More than one colon without brackets: bare IPv6 literal
            Some((host, _)) if host.contains(':') => (raw, default_port),
            Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
            None => (raw, default_port),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Validated configuration for one deployment run
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerAddress,

    pub credentials: Credentials,

    /// Local directory whose contents are uploaded
    pub local_root: PathBuf,

    /// Remote directory the tree lands in
    pub remote_base: RemotePath,

    pub exclusions: ExclusionSet,

    /// Connect and socket timeout
    pub timeout: Duration,

    /// Simulate against an in-memory remote
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerAddress {
                host: "localhost".to_string(),
                port: DEFAULT_PORT,
            },
            credentials: Credentials::default(),
            local_root: PathBuf::from("."),
            remote_base: RemotePath::root(),
            exclusions: ExclusionSet::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            dry_run: false,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.local_root.exists() {
            return Err(SyncError::Config(format!(
                "Local directory does not exist: {}",
                self.local_root.display()
            )));
        }
        if !self.local_root.is_dir() {
            return Err(SyncError::Config(format!(
                "Local path is not a directory: {}",
                self.local_root.display()
            )));
        }
        if self.timeout.is_zero() {
            return Err(SyncError::Config("Timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated rule list
///
/// Commas inside `{a,b}` alternations, `[...]` classes or after a `\` are
/// part of the rule.
pub fn split_rule_list(raw: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut current = String::new();
    let mut braces = 0usize;
    let mut in_class = false;
    let mut escaped = false;

    for ch in raw.chars() {
        if escaped {
            escaped = false;
        } else {
            match ch {
                '\\' => escaped = true,
                '[' if !in_class => in_class = true,
                ']' if in_class => in_class = false,
                '{' if !in_class => braces += 1,
                '}' if !in_class => braces = braces.saturating_sub(1),
                ',' if !in_class && braces == 0 => {
                    rules.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
        }
        current.push(ch);
    }
    rules.push(current);
    rules
}

/// Exclusion rule for a config file that lives inside the uploaded tree
///
/// The file may hold the password, so it must never reach the server.
fn config_file_rule(config_file: &Path, local_root: &Path) -> Option<String> {
    let file = config_file.canonicalize().ok()?;
    let root = local_root.canonicalize().ok()?;
    let relative = file.strip_prefix(&root).ok()?;
    let rule = normalize_separators(&relative.to_string_lossy());
    Some(globset::escape(&rule))
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let server = non_blank(cli.server).or(non_blank(file.server));
        let username = non_blank(cli.username).or(non_blank(file.username));
        let password = non_blank(cli.password).or(non_blank(file.password));

        let missing: Vec<&str> = [
            ("FTP_SERVER", server.is_none()),
            ("FTP_USERNAME", username.is_none()),
            ("FTP_PASSWORD", password.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(server), Some(username), Some(password)) = (server, username, password) else {
            return Err(SyncError::Config(format!(
                "Missing required setting(s): {} (set the environment variables or pass --server/--username/--password)",
                missing.join(", ")
            )));
        };

        let port = cli.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let timeout = cli.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let local_root = cli
            .local_dir
            .or(file.local_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let remote_path = cli.remote_path.or(file.remote_path).unwrap_or_default();

        let env_rules = cli
            .exclude_list
            .as_deref()
            .map(split_rule_list)
            .unwrap_or_default();
        let config_rule = cli
            .config
            .as_deref()
            .and_then(|path| config_file_rule(path, &local_root));
        if let Some(rule) = &config_rule {
            debug!(%rule, "Config file is inside the local tree, excluding it");
        }

        let config = Config {
            server: ServerAddress::parse(&server, port)?,
            credentials: Credentials::new(username, password),
            local_root,
            remote_base: RemotePath::base(&remote_path),
            exclusions: ExclusionSet::with_defaults(
                file.exclude
                    .iter()
                    .chain(&env_rules)
                    .chain(&cli.exclude)
                    .chain(&config_rule),
            ),
            timeout: Duration::from_secs(timeout),
            dry_run: cli.dry_run,
        };
        config.validate()?;
        Ok(config)
    }
}
