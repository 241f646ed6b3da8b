//! Configuration loader for memscan
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::memory::scanner::{ScanOptions, SignatureDefinition, SignatureSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_memory")]
    pub memory: MemoryConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub signatures: Vec<SignatureDefinition>,
}

/// Memory access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Check physical residency of every page before reading
    #[serde(default = "default_verify_residency")]
    pub verify_residency: bool,
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Include the event target in log lines
    #[serde(default = "default_log_target")]
    pub target: bool,
}

impl Config {
    /// Scan options derived from the `[scanner]` section
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            chunk_size: self.scanner.chunk_size,
        }
    }

    /// The `[[signatures]]` entries as a set
    pub fn signature_set(&self) -> SignatureSet {
        SignatureSet {
            signatures: self.signatures.clone(),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if file doesn't exist
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_default()
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    Ok(ConfigLoader::new("memscan.toml").load_or_default())
}

// Default functions for serde
fn default_memory() -> MemoryConfig {
    MemoryConfig {
        verify_residency: default_config().memory.verify_residency,
    }
}

fn default_scanner() -> ScannerConfig {
    ScannerConfig {
        chunk_size: default_config().scanner.chunk_size,
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        target: defaults.logging.target,
    }
}

// Individual field defaults
fn default_verify_residency() -> bool {
    default_config().memory.verify_residency
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_log_target() -> bool {
    default_config().logging.target
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory: default_memory(),
            scanner: default_scanner(),
            logging: default_logging(),
            signatures: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::scanner::{LeaKind, Modifier};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.memory.verify_residency);
        assert_eq!(config.scanner.chunk_size, 4096);
        assert!(config.signatures.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("memscan.toml");

        let mut config = Config::default();
        config.memory.verify_residency = true;
        config.signatures.push(
            SignatureDefinition::new("Call", "E8 ?? ?? ?? ??").with_modifier(Modifier::Lea(LeaKind::E8)),
        );
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert!(loaded.memory.verify_residency);
        assert_eq!(loaded.signatures, config.signatures);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [scanner]
            chunk_size = 65536

            [[signatures]]
            name = "PlayerBase"
            pattern = "48 8B 05 ?? ?? ?? ??"
            modifiers = [{ lea = "relative_plus8" }]

            [[signatures]]
            name = "Tick"
            pattern = "90 90"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scan_options().chunk_size, 65536);
        // Check defaults are applied
        assert!(!config.memory.verify_residency);
        assert_eq!(config.logging.level, "info");

        let set = config.signature_set();
        assert_eq!(set.signatures.len(), 2);
        assert_eq!(
            set.get("PlayerBase").unwrap().modifiers,
            vec![Modifier::Lea(LeaKind::RelativePlus8)]
        );
        assert!(set.get("Tick").unwrap().modifiers.is_empty());
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[scanner\nchunk_size = ").unwrap();

        let result = ConfigLoader::new(&config_path).load();
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}
