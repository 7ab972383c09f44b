//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::ddl::DdlOptions;
use crate::error::Result;
use crate::mutation::{BatchLimits, DEFAULT_MUTATE_BATCH_SIZE, DEFAULT_PAGE_SIZE};
use crate::query::DEFAULT_ID_COLUMN;

/// Root configuration structure. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote store ceilings and identifier column.
    #[serde(default)]
    pub store: StoreConfig,

    /// Schema emitter options.
    #[serde(default)]
    pub ddl: DdlOptions,

    /// Value cipher.
    #[serde(default)]
    pub crypto: CryptoConfig,
}

/// Remote store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum records per query page (default: 2000).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum identifiers per mutate call (default: 200).
    #[serde(default = "default_mutate_batch_size")]
    pub mutate_batch_size: usize,

    /// Record identifier column (default: "Id").
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            mutate_batch_size: default_mutate_batch_size(),
            id_column: default_id_column(),
        }
    }
}

impl StoreConfig {
    /// Batch limits described by this section.
    pub fn limits(&self) -> Result<BatchLimits> {
        BatchLimits::new(self.page_size, self.mutate_batch_size)
    }
}

/// Cipher selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CryptoMode {
    /// Values pass through unencrypted.
    #[default]
    None,

    /// AES-256-GCM with a key read from the environment.
    AesGcm,
}

/// Cipher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    #[serde(default)]
    pub mode: CryptoMode,

    /// Environment variable holding the hex-encoded 256-bit key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_env: Option<String>,
}

// Default value functions for serde
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_mutate_batch_size() -> usize {
    DEFAULT_MUTATE_BATCH_SIZE
}

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_string()
}
