//! Configuration validator for memscan
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ScannerConfig};
use crate::memory::scanner::{SignatureDefinition, MIN_CHUNK_SIZE};
use std::collections::HashSet;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_logging(&config.logging)?;
        Self::validate_signatures(&config.signatures)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if scanner.chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Chunk size must be at least {}",
                MIN_CHUNK_SIZE
            )));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }

    /// Validates signature names and patterns
    fn validate_signatures(signatures: &[SignatureDefinition]) -> Result<(), ConfigError> {
        let mut names = HashSet::new();

        for signature in signatures {
            if signature.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "Signature name cannot be empty".to_string(),
                ));
            }

            if !names.insert(signature.name.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate signature name: {}",
                    signature.name
                )));
            }

            signature.compile().map_err(|e| {
                ConfigError::Invalid(format!("Signature '{}': {}", signature.name, e))
            })?;
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
