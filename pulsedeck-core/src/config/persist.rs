//! Flash persistence for the deck configuration
//!
//! The stored form is the postcard encoding of [`DeckConfig`]. Anything
//! that fails to decode, carries another layout version or fails
//! validation is discarded in favour of the built-in default.

use super::types::{DeckConfig, ValidationError};

/// Largest encoded configuration accepted from flash
pub const MAX_CONFIG_SIZE: usize = 4096;

/// Errors that can occur when storing or loading the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Buffer too small for the encoding
    Serialize,
    /// Stored bytes are not a configuration
    Deserialize,
    /// Stored configuration decoded but is not usable
    Invalid(ValidationError),
}

/// Encode a configuration into `buf`, returning the used prefix
pub fn to_bytes<'b>(config: &DeckConfig, buf: &'b mut [u8]) -> Result<&'b mut [u8], PersistError> {
    postcard::to_slice(config, buf).map_err(|_| PersistError::Serialize)
}

/// Decode and validate a stored configuration
pub fn from_bytes(bytes: &[u8]) -> Result<DeckConfig, PersistError> {
    let config: DeckConfig = postcard::from_bytes(bytes).map_err(|_| PersistError::Deserialize)?;
    config.validate().map_err(PersistError::Invalid)?;
    Ok(config)
}

/// Load the stored configuration, or the built-in default
pub fn load_or_default(stored: Option<&[u8]>) -> DeckConfig {
    let Some(bytes) = stored else {
        info!("No stored config, using built-in default");
        return DeckConfig::default();
    };

    match from_bytes(bytes) {
        Ok(config) => {
            info!("Loaded stored config ({} bytes)", bytes.len());
            config
        }
        Err(e) => {
            warn!("Stored config unusable ({:?}), using built-in default", e);
            DeckConfig::default()
        }
    }
}
