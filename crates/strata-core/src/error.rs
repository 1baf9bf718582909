//! Error types for Strata

use thiserror::Error;

/// The main error type for Strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("Weight mismatch in category '{category}': {candidates} candidates but {weights} weights")]
    WeightMismatch {
        category: String,
        candidates: usize,
        weights: usize,
    },

    #[error("Invalid weights in category '{category}': {reason}")]
    InvalidWeights { category: String, reason: String },

    #[error("Category '{0}' has no candidates")]
    EmptyCategory(String),

    #[error("Invalid hex color '{0}'")]
    ColorFormat(String),

    #[error("Invalid color channel: expected integer or float, got {0}")]
    ColorType(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;

impl From<toml::de::Error> for StrataError {
    fn from(err: toml::de::Error) -> Self {
        StrataError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for StrataError {
    fn from(err: toml::ser::Error) -> Self {
        StrataError::TomlSerError(err.to_string())
    }
}

impl From<image::ImageError> for StrataError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => StrataError::IoError(e),
            other => StrataError::Image(other.to_string()),
        }
    }
}
