//! Configuration file support for fast-reboot-dump
//!
//! Loads settings from a TOML file. Every field has a default, and a missing
//! file means "all defaults".
//! Default location: /etc/sonic/fast-reboot-dump.toml

use crate::error::{DumpError, Result};
use crate::store::Namespace;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/fast-reboot-dump.toml";

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database number for APPL_DB
    #[serde(default = "default_appl_db")]
    pub appl_db: u32,

    /// Redis database number for ASIC_DB
    #[serde(default = "default_asic_db")]
    pub asic_db: u32,

    /// Connection timeout in seconds (single attempt)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// COUNT hint for each SCAN page over FDB entries
    #[serde(default = "default_scan_count")]
    pub scan_count: usize,
}

/// Announcement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnounceConfig {
    /// Send ARP/NDP announcements after the dump
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Send Neighbor Solicitations for IPv6 neighbors
    #[serde(default = "default_true")]
    pub ndp: bool,
}

/// Output artifact file names, relative to the target directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fdb_file")]
    pub fdb_file: String,

    #[serde(default = "default_arp_file")]
    pub arp_file: String,

    #[serde(default = "default_routes_file")]
    pub routes_file: String,
}

/// Complete fast-reboot-dump configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DumpConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub announce: AnnounceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_appl_db() -> u32 {
    0
}

fn default_asic_db() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_scan_count() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_fdb_file() -> String {
    "fdb.json".to_string()
}

fn default_arp_file() -> String {
    "arp.json".to_string()
}

fn default_routes_file() -> String {
    "default_routes.json".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            appl_db: default_appl_db(),
            asic_db: default_asic_db(),
            connect_timeout_secs: default_connect_timeout(),
            scan_count: default_scan_count(),
        }
    }
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ndp: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fdb_file: default_fdb_file(),
            arp_file: default_arp_file(),
            routes_file: default_routes_file(),
        }
    }
}

impl DatabaseConfig {
    /// Redis database number backing `namespace`
    pub fn db_number(&self, namespace: Namespace) -> u32 {
        match namespace {
            Namespace::ApplDb => self.appl_db,
            Namespace::AsicDb => self.asic_db,
        }
    }

    /// Connection URL for `namespace`
    pub fn url(&self, namespace: Namespace) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host,
            self.redis_port,
            self.db_number(namespace)
        )
    }
}

impl DumpConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                DumpError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(DumpError::Io(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.redis_host.is_empty() {
            return Err(DumpError::Config("redis_host must not be empty".into()));
        }
        if self.database.redis_port == 0 {
            return Err(DumpError::Config("redis_port must be > 0".into()));
        }
        if self.database.appl_db == self.database.asic_db {
            return Err(DumpError::Config(
                "appl_db and asic_db must be different databases".into(),
            ));
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(DumpError::Config("connect_timeout_secs must be > 0".into()));
        }
        if self.database.scan_count == 0 {
            return Err(DumpError::Config("scan_count must be > 0".into()));
        }

        let files = [
            &self.output.fdb_file,
            &self.output.arp_file,
            &self.output.routes_file,
        ];
        for file in files {
            if file.is_empty() || file.contains('/') {
                return Err(DumpError::Config(format!(
                    "output file name '{}' must be a plain file name",
                    file
                )));
            }
        }
        if files[0] == files[1] || files[0] == files[2] || files[1] == files[2] {
            return Err(DumpError::Config("output file names must be distinct".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DumpConfig::default();
        assert_eq!(config.database.redis_host, "127.0.0.1");
        assert_eq!(config.database.redis_port, 6379);
        assert_eq!(config.database.appl_db, 0);
        assert_eq!(config.database.asic_db, 1);
        assert_eq!(config.database.scan_count, 50);
        assert!(config.announce.enabled);
        assert_eq!(config.output.fdb_file, "fdb.json");
        assert_eq!(config.output.arp_file, "arp.json");
        assert_eq!(config.output.routes_file, "default_routes.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_urls() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url(Namespace::ApplDb), "redis://127.0.0.1:6379/0");
        assert_eq!(config.url(Namespace::AsicDb), "redis://127.0.0.1:6379/1");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DumpConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DumpConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.toml");
        fs::write(
            &path,
            "[database]\nredis_port = 6380\nscan_count = 500\n\n[announce]\nndp = false\n",
        )
        .unwrap();

        let config = DumpConfig::load_or_default(&path).unwrap();
        assert_eq!(config.database.redis_port, 6380);
        assert_eq!(config.database.scan_count, 500);
        assert_eq!(config.database.redis_host, "127.0.0.1");
        assert!(config.announce.enabled);
        assert!(!config.announce.ndp);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.toml");
        fs::write(&path, "this is not toml [").unwrap();

        let err = DumpConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, DumpError::Config(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = DumpConfig::default();
        config.database.scan_count = 0;
        assert!(config.validate().is_err());

        let mut config = DumpConfig::default();
        config.database.asic_db = 0;
        assert!(config.validate().is_err());

        let mut config = DumpConfig::default();
        config.output.arp_file = "../arp.json".to_string();
        assert!(config.validate().is_err());

        let mut config = DumpConfig::default();
        config.output.routes_file = "fdb.json".to_string();
        assert!(config.validate().is_err());
    }
}
