use thiserror::Error;

/// Top-level error type for the Sara assistant.
///
/// Subsystem crates define their own error enums and convert into this one
/// where a failure has to cross a crate boundary (configuration loading,
/// audit persistence, startup).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Audit error: {0}")]
    Audit(String),
}

impl From<toml::de::Error> for SaraError {
    fn from(err: toml::de::Error) -> Self {
        SaraError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SaraError {
    fn from(err: toml::ser::Error) -> Self {
        SaraError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SaraError {
    fn from(err: serde_json::Error) -> Self {
        SaraError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sara operations.
pub type Result<T> = std::result::Result<T, SaraError>;
