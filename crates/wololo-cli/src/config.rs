//! Configuration loading and validation

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wololo_core::DeviceCache;
use wololo_discovery::arp::matcher_by_name;
use wololo_discovery::{
    ArpCommand, Broadcaster, DiscoveryService, InterfaceEnumerator, PingProber,
    ReachabilityChecker, ResolutionTableReader, ServiceConfig, TableParser,
    DEFAULT_PROBE_TIMEOUT_MS, WAKE_PORT,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub arp: ArpConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub wake: WakeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the device cache file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("wololo.db.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArpConfig {
    /// Command that dumps the resolution table
    #[serde(default = "default_arp_program")]
    pub program: String,
    #[serde(default = "default_arp_args")]
    pub args: Vec<String>,
    /// Hardware-address formats to recognize, tried in order
    #[serde(default = "default_matchers")]
    pub matchers: Vec<String>,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            program: default_arp_program(),
            args: default_arp_args(),
            matchers: default_matchers(),
        }
    }
}

fn default_arp_program() -> String {
    "arp".to_string()
}

fn default_arp_args() -> Vec<String> {
    vec!["-a".to_string()]
}

fn default_matchers() -> Vec<String> {
    ["colon", "dash", "short-colon"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_ping_program")]
    pub program: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            program: default_ping_program(),
            timeout_ms: default_probe_timeout(),
        }
    }
}

fn default_ping_program() -> String {
    "ping".to_string()
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeConfig {
    /// Destination UDP port for wake packets
    #[serde(default = "default_wake_port")]
    pub port: u16,
    /// Re-enumerate interfaces for every wake instead of once at startup
    #[serde(default)]
    pub rescan_interfaces: bool,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            port: default_wake_port(),
            rescan_interfaces: false,
        }
    }
}

fn default_wake_port() -> u16 {
    WAKE_PORT
}

impl Config {
    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            wake_port: self.wake.port,
            probe_timeout_ms: self.probe.timeout_ms,
            rescan_interfaces: self.wake.rescan_interfaces,
        }
    }

    /// Build the table parser from the configured matcher names
    pub fn table_parser(&self) -> Result<TableParser> {
        if self.arp.matchers.is_empty() {
            bail!("arp.matchers must name at least one hardware-address format");
        }
        let matchers = self
            .arp
            .matchers
            .iter()
            .map(|name| match matcher_by_name(name) {
                Some(matcher) => Ok(matcher),
                None => bail!("Unknown hardware-address matcher {name:?} (expected colon, dash, or short-colon)"),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TableParser::new(matchers))
    }

    /// Open the cache and assemble the discovery service
    pub fn build_service(&self) -> Result<DiscoveryService> {
        let service_config = self.to_service_config();
        let cache = DeviceCache::open(&self.store.path)?;
        let reader = ResolutionTableReader::new(
            Arc::new(ArpCommand::new(&self.arp.program, self.arp.args.iter().cloned())),
            self.table_parser()?,
        );
        let checker = ReachabilityChecker::new(
            Arc::new(PingProber::new(&self.probe.program)),
            Duration::from_millis(service_config.probe_timeout_ms),
        );

        Ok(DiscoveryService::from_parts(
            cache,
            reader,
            checker,
            InterfaceEnumerator::default(),
            Broadcaster::new(service_config.wake_port),
            service_config.rescan_interfaces,
        )?)
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.wake.port, 7331);
        assert_eq!(config.probe.timeout_ms, 1000);
        assert_eq!(config.arp.program, "arp");
        assert_eq!(config.arp.args, vec!["-a"]);
        assert!(!config.wake.rescan_interfaces);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wololo.toml");
        std::fs::write(&path, "[wake]\nport = 9\n\n[arp]\nmatchers = [\"dash\"]\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.wake.port, 9);
        assert_eq!(config.arp.program, "arp");
        assert_eq!(config.table_parser().unwrap().matcher_names(), vec!["dash"]);
        assert_eq!(config.store.path, PathBuf::from("wololo.db.json"));
    }

    #[test]
    fn test_default_config_round_trips_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wololo.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.arp.matchers, default_matchers());
        assert_eq!(config.to_service_config().wake_port, WAKE_PORT);
    }

    #[test]
    fn test_unknown_matcher_is_rejected() {
        let mut config = Config::default();
        config.arp.matchers = vec!["colon".to_string(), "eui64".to_string()];
        assert!(config.table_parser().is_err());

        config.arp.matchers.clear();
        assert!(config.table_parser().is_err());
    }
}
