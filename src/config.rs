//! Configuration for packfs
//!
//! Centralized configuration with sensible defaults.

/// Configuration for opening an [`Archive`](crate::Archive)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Open Behavior
    // -------------------------------------------------------------------------
    /// Create the backing file (with an empty root folder) if it does
    /// not exist. When false, opening a missing path is an error.
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Chunk size for bulk stream copies (payload append, reclaim
    /// shifting, extraction).
    pub copy_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            copy_buffer_size: 64 * 1024, // 64 KB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set whether a missing archive file is created on open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the chunk size for bulk stream copies (in bytes)
    pub fn copy_buffer_size(mut self, size: usize) -> Self {
        self.config.copy_buffer_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
