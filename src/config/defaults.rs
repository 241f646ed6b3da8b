//! Default configuration values for memscan

use crate::memory::scanner::MIN_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub memory: MemoryDefaults,
    pub scanner: ScannerDefaults,
    pub logging: LoggingDefaults,
}

/// Default memory access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDefaults {
    pub verify_residency: bool,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub chunk_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub target: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        memory: MemoryDefaults {
            verify_residency: false,
        },
        scanner: ScannerDefaults {
            chunk_size: MIN_CHUNK_SIZE,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            target: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(!config.memory.verify_residency);
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.target);
    }

    #[test]
    fn test_serialization() {
        let config = default_config();
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("chunk_size"));
        assert!(serialized.contains("verify_residency"));

        let deserialized: ConfigDefaults = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.scanner.chunk_size, config.scanner.chunk_size);
        assert_eq!(deserialized.logging.level, config.logging.level);
    }
}
