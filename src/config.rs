use serde::{Deserialize, Serialize};

use crate::error::{Result, SecretError};

/// Lowest PBKDF2 iteration count accepted for share protection
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Processing mode for polynomial evaluation and interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Process data sequentially
    #[default]
    Sequential,
    /// Spread work across the rayon thread pool
    Parallel,
}

/// Configuration options for sealing, splitting and share protection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Processing mode
    pub mode: SplitMode,
    /// PBKDF2-HMAC-SHA256 iterations used by share protection
    pub kdf_iterations: u32,
    /// Whether sealing returns a key fingerprint to check after combination
    pub key_fingerprint: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: SplitMode::default(),
            kdf_iterations: MIN_KDF_ITERATIONS,
            key_fingerprint: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the processing mode
    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the KDF iteration count
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Result<Self> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(too_few_iterations(iterations));
        }
        self.kdf_iterations = iterations;
        Ok(self)
    }

    /// Enables or disables the key fingerprint layer
    pub fn with_key_fingerprint(mut self, enabled: bool) -> Self {
        self.key_fingerprint = enabled;
        self
    }

    /// Validates the configuration
    ///
    /// Needed for configurations that were deserialized rather than built.
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(too_few_iterations(self.kdf_iterations));
        }
        Ok(())
    }
}

fn too_few_iterations(iterations: u32) -> SecretError {
    SecretError::InvalidConfig(format!(
        "KDF iterations {iterations} below minimum {MIN_KDF_ITERATIONS}"
    ))
}
