//! In-memory configuration store.
//!
//! Implements [`ConfigPort`] by keeping the configuration as a postcard
//! blob, the same encoding a flash-backed store would write.  Values are
//! validated before they are accepted.

use std::cell::RefCell;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored bytes verbatim (e.g. to simulate corruption).
    pub fn set_raw(&self, bytes: Vec<u8>) {
        *self.blob.borrow_mut() = Some(bytes);
    }

    /// Load the stored config, falling back to defaults when nothing
    /// usable is stored.
    pub fn load_or_default(&self) -> SystemConfig {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                info!("Config load failed ({}), using defaults", e);
                SystemConfig::default()
            }
        }
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let blob = self.blob.borrow();
        let bytes = blob.as_deref().ok_or(ConfigError::NotFound)?;
        let config: SystemConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        *self.blob.borrow_mut() = Some(bytes);
        info!("Config stored");
        Ok(())
    }
}
