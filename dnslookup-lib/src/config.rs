//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and the
//! environment, and merging them into a [`LookupConfig`] with proper
//! precedence rules: environment, then local file, then global file, then
//! XDG file, then built-in defaults.

use crate::error::LookupError;
use crate::types::{LookupConfig, WhoisTransportKind};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// WHOIS transport settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisSection>,

    /// DNS resolver settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsSection>,
}

/// The `[whois]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WhoisSection {
    /// "socket" or "command"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    /// Timeout as a string, e.g. "10s", "1m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Root referral server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_referrals: Option<bool>,
}

/// The `[dns]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DnsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Nameserver IP addresses; empty means the system configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    local_dir: PathBuf,
    home_dir: Option<PathBuf>,
    xdg_config_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a configuration manager rooted at the current directory,
    /// `$HOME` and `$XDG_CONFIG_HOME`.
    pub fn new() -> Self {
        let home_dir = env::var_os("HOME").map(PathBuf::from);
        let xdg_config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home_dir.as_ref().map(|home| home.join(".config")));

        Self {
            local_dir: PathBuf::from("."),
            home_dir,
            xdg_config_dir,
        }
    }

    /// Create a configuration manager with explicit search directories.
    pub fn with_dirs<P: Into<PathBuf>>(
        local_dir: P,
        home_dir: Option<PathBuf>,
        xdg_config_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            local_dir: local_dir.into(),
            home_dir,
            xdg_config_dir,
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if reading, parsing or
    /// validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, LookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            LookupError::config(format!(
                "Failed to parse TOML configuration in {}: {}",
                path.display(),
                e
            ))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are skipped with a warning.
    ///
    /// # Returns
    ///
    /// Merged configuration from all discovered files.
    pub fn discover_and_load(&self) -> FileConfig {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded configuration from {}", path.display());
                    merged_config = merge_configs(merged_config, config);
                }
                Err(e) => {
                    tracing::warn!("Ignoring configuration file {}: {}", path.display(), e);
                }
            }
        }

        merged_config
    }

    /// Discover files, read the environment and build the effective
    /// lookup configuration.
    pub fn load(&self) -> Result<LookupConfig, LookupError> {
        let file_config = self.discover_and_load();
        let env_config = load_env_config();
        build_lookup_config(&file_config, &env_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        first_existing(&self.local_dir, &["dnslookup.toml", ".dnslookup.toml"])
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = self.home_dir.as_ref()?;
        first_existing(home, &[".dnslookup.toml", "dnslookup.toml"])
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = self.xdg_config_dir.as_ref()?;
        first_existing(&config_dir.join("dnslookup"), &["config.toml"])
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), LookupError> {
        if let Some(whois) = &config.whois {
            if let Some(transport) = &whois.transport {
                transport
                    .parse::<WhoisTransportKind>()
                    .map_err(LookupError::config)?;
            }

            if let Some(timeout) = &whois.timeout {
                validate_timeout("whois.timeout", timeout)?;
            }

            if let Some(server) = &whois.server {
                if server.trim().is_empty() {
                    return Err(LookupError::config("whois.server cannot be empty"));
                }
            }
        }

        if let Some(dns) = &config.dns {
            if let Some(timeout) = &dns.timeout {
                validate_timeout("dns.timeout", timeout)?;
            }

            if let Some(nameservers) = &dns.nameservers {
                parse_nameservers(nameservers)?;
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

fn validate_timeout(key: &str, value: &str) -> Result<(), LookupError> {
    match parse_timeout_string(value) {
        Some(_) => Ok(()),
        None => Err(LookupError::config(format!(
            "Invalid {} '{}'. Use a non-zero value like '5s', '30s', '2m'",
            key, value
        ))),
    }
}

fn parse_nameservers<S: AsRef<str>>(values: &[S]) -> Result<Vec<IpAddr>, LookupError> {
    values
        .iter()
        .map(|value| {
            let value = value.as_ref().trim();
            value.parse::<IpAddr>().map_err(|_| {
                LookupError::config(format!("Invalid nameserver address '{}'", value))
            })
        })
        .collect()
}

/// Merge two configurations with proper precedence.
///
/// Values from `higher` take precedence over values from `lower`.
pub fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        whois: match (lower.whois, higher.whois) {
            (Some(lower_whois), Some(higher_whois)) => Some(WhoisSection {
                transport: higher_whois.transport.or(lower_whois.transport),
                timeout: higher_whois.timeout.or(lower_whois.timeout),
                server: higher_whois.server.or(lower_whois.server),
                follow_referrals: higher_whois.follow_referrals.or(lower_whois.follow_referrals),
            }),
            (lower_whois, higher_whois) => higher_whois.or(lower_whois),
        },
        dns: match (lower.dns, higher.dns) {
            (Some(lower_dns), Some(higher_dns)) => Some(DnsSection {
                timeout: higher_dns.timeout.or(lower_dns.timeout),
                nameservers: higher_dns.nameservers.or(lower_dns.nameservers),
            }),
            (lower_dns, higher_dns) => higher_dns.or(lower_dns),
        },
    }
}

/// Environment variable configuration.
///
/// This represents configuration values that can be set via DNSLOOKUP_*
/// environment variables. Every value is already validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub whois_timeout: Option<Duration>,
    pub whois_transport: Option<WhoisTransportKind>,
    pub whois_server: Option<String>,
    pub follow_referrals: Option<bool>,
    pub dns_timeout: Option<Duration>,
    pub nameservers: Option<Vec<IpAddr>>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from an arbitrary variable lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // DNSLOOKUP_WHOIS_TIMEOUT - per-query WHOIS timeout
    if let Some(val) = lookup("DNSLOOKUP_WHOIS_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => env_config.whois_timeout = Some(timeout),
            None => tracing::warn!(
                "Invalid DNSLOOKUP_WHOIS_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    // DNSLOOKUP_WHOIS_TRANSPORT - socket or command
    if let Some(val) = lookup("DNSLOOKUP_WHOIS_TRANSPORT") {
        match val.parse::<WhoisTransportKind>() {
            Ok(transport) => env_config.whois_transport = Some(transport),
            Err(e) => tracing::warn!("Invalid DNSLOOKUP_WHOIS_TRANSPORT: {}", e),
        }
    }

    // DNSLOOKUP_WHOIS_SERVER - root referral server
    if let Some(server) = lookup("DNSLOOKUP_WHOIS_SERVER") {
        if !server.trim().is_empty() {
            env_config.whois_server = Some(server.trim().to_string());
        }
    }

    // DNSLOOKUP_FOLLOW_REFERRALS - follow registrar referrals
    if let Some(val) = lookup("DNSLOOKUP_FOLLOW_REFERRALS") {
        match parse_bool(&val) {
            Some(enabled) => env_config.follow_referrals = Some(enabled),
            None => tracing::warn!(
                "Invalid DNSLOOKUP_FOLLOW_REFERRALS='{}', use true/false",
                val
            ),
        }
    }

    // DNSLOOKUP_DNS_TIMEOUT - per-query DNS timeout
    if let Some(val) = lookup("DNSLOOKUP_DNS_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => env_config.dns_timeout = Some(timeout),
            None => tracing::warn!(
                "Invalid DNSLOOKUP_DNS_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    // DNSLOOKUP_NAMESERVERS - comma-separated IP addresses
    if let Some(val) = lookup("DNSLOOKUP_NAMESERVERS") {
        let entries: Vec<&str> = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if !entries.is_empty() {
            match parse_nameservers(&entries) {
                Ok(nameservers) => env_config.nameservers = Some(nameservers),
                Err(e) => tracing::warn!("Invalid DNSLOOKUP_NAMESERVERS='{}': {}", val, e),
            }
        }
    }

    env_config
}

/// Combine file and environment configuration over the defaults.
pub fn build_lookup_config(
    file: &FileConfig,
    env: &EnvConfig,
) -> Result<LookupConfig, LookupError> {
    let mut config = LookupConfig::default();

    if let Some(whois) = &file.whois {
        if let Some(transport) = &whois.transport {
            config.whois_transport = transport.parse().map_err(LookupError::config)?;
        }
        if let Some(timeout) = &whois.timeout {
            config.whois_timeout = parse_timeout_string(timeout).ok_or_else(|| {
                LookupError::config(format!("Invalid whois.timeout '{}'", timeout))
            })?;
        }
        if let Some(server) = &whois.server {
            config.whois_server = server.trim().to_string();
        }
        if let Some(enabled) = whois.follow_referrals {
            config.follow_referrals = enabled;
        }
    }

    if let Some(dns) = &file.dns {
        if let Some(timeout) = &dns.timeout {
            let timeout = parse_timeout_string(timeout).ok_or_else(|| {
                LookupError::config(format!("Invalid dns.timeout '{}'", timeout))
            })?;
            config.dns_timeout = Some(timeout);
        }
        if let Some(nameservers) = &dns.nameservers {
            config.nameservers = parse_nameservers(nameservers)?;
        }
    }

    if let Some(transport) = env.whois_transport {
        config.whois_transport = transport;
    }
    if let Some(timeout) = env.whois_timeout {
        config.whois_timeout = timeout;
    }
    if let Some(server) = &env.whois_server {
        config.whois_server = server.clone();
    }
    if let Some(enabled) = env.follow_referrals {
        config.follow_referrals = enabled;
    }
    if let Some(timeout) = env.dns_timeout {
        config.dns_timeout = Some(timeout);
    }
    if let Some(nameservers) = &env.nameservers {
        config.nameservers = nameservers.clone();
    }

    Ok(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into a duration.
///
/// Bare numbers are seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let seconds = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.trim().parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    if seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(seconds))
    }
}
