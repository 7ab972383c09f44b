//! Configuration validation.

use super::{Config, CryptoMode};
use crate::core::identifier::validate_identifier;
use crate::error::{Result, TranslateError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.store.page_size == 0 {
        return Err(TranslateError::Config(
            "store.page_size must be at least 1".into(),
        ));
    }
    if config.store.mutate_batch_size == 0 {
        return Err(TranslateError::Config(
            "store.mutate_batch_size must be at least 1".into(),
        ));
    }
    validate_identifier(&config.store.id_column)
        .map_err(|e| TranslateError::Config(format!("store.id_column: {}", e)))?;

    if config.crypto.mode == CryptoMode::AesGcm
        && config.crypto.key_env.as_deref().map_or(true, str::is_empty)
    {
        return Err(TranslateError::Config(
            "crypto.key_env is required when crypto.mode is 'aes-gcm'".into(),
        ));
    }

    Ok(())
}
