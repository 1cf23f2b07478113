//! Error types for criteria compilation

use thiserror::Error;

/// Criteria compilation errors
#[derive(Error, Debug)]
pub enum CriteriaError {
    /// A link carries entries but names no field to apply them to.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
