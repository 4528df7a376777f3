//! Configuration management for sealkit

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key derivation configuration (Argon2id cost parameters)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_iterations: u32,

    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        KdfConfig {
            argon2_memory_kib: 65536, // 64 MiB
            argon2_iterations: 3,
            argon2_parallelism: 4,
        }
    }
}

impl KdfConfig {
    /// Load configuration from a JSON file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::InvalidConfig(format!("Failed to read config file: {}", e))
        })?;

        let mut config: KdfConfig = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!("Failed to parse config file: {}", e))
        })?;

        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Create a config from defaults plus environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = KdfConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(memory) = std::env::var("SEALKIT_ARGON2_MEMORY_KIB") {
            if let Ok(kib) = memory.trim().parse::<u32>() {
                self.argon2_memory_kib = kib;
            }
        }

        if let Ok(iterations) = std::env::var("SEALKIT_ARGON2_ITERATIONS") {
            if let Ok(t) = iterations.trim().parse::<u32>() {
                self.argon2_iterations = t;
            }
        }

        if let Ok(parallelism) = std::env::var("SEALKIT_ARGON2_PARALLELISM") {
            if let Ok(p) = parallelism.trim().parse::<u32>() {
                self.argon2_parallelism = p;
            }
        }
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            Error::InvalidConfig(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::InvalidConfig(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.argon2_iterations == 0 {
            return Err(Error::InvalidConfig(
                "Argon2 iterations must be greater than 0".to_string(),
            ));
        }

        if self.argon2_parallelism == 0 {
            return Err(Error::InvalidConfig(
                "Argon2 parallelism must be greater than 0".to_string(),
            ));
        }

        // Argon2 requires at least 8 KiB of memory per lane
        if self.argon2_memory_kib < 8 * self.argon2_parallelism {
            return Err(Error::InvalidConfig(format!(
                "Argon2 memory cost too low: {} KiB for {} lanes",
                self.argon2_memory_kib, self.argon2_parallelism
            )));
        }

        Ok(())
    }
}
