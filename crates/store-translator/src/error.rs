//! Error types for the translator library.

use thiserror::Error;

/// Main error type for translator operations.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The command or condition does not have the shape required by the
    /// path being taken (for example an ID-only fast path invoked on a
    /// condition that is not an identifier equality test).
    #[error("Translation error: {0}")]
    Translation(String),

    /// Failure reported by the remote record store while issuing a query,
    /// fetching a page, or dispatching a batch mutation.
    #[error("Remote store error during {operation}: {message}")]
    RemoteStore {
        operation: &'static str,
        message: String,
    },

    /// Malformed table/column model handed to the schema emitter.
    #[error("Invalid schema model: {0}")]
    Schema(String),

    /// Configuration error (invalid YAML, out-of-range limits, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cipher failure (bad key, bad ciphertext)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TranslateError {
    /// Create a Translation error.
    pub fn translation(message: impl Into<String>) -> Self {
        TranslateError::Translation(message.into())
    }

    /// Create a RemoteStore error for the named store operation.
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        TranslateError::RemoteStore {
            operation,
            message: message.into(),
        }
    }

    /// Whether the error came from the remote store transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, TranslateError::RemoteStore { .. })
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            TranslateError::Config(_) | TranslateError::Yaml(_) | TranslateError::Json(_) => 2,
            TranslateError::Translation(_) | TranslateError::Schema(_) => 3,
            TranslateError::RemoteStore { .. } => 4,
            TranslateError::Crypto(_) => 5,
            TranslateError::Io(_) => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for translator operations.
pub type Result<T> = std::result::Result<T, TranslateError>;
