//! Error types for the texure engine.
//!
//! The two document transforms and the sanitizer are total and never return
//! these. Errors only surface at the fallible edges: math backends and
//! configuration loading.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while loading editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(String),

    #[error("Unknown math backend: {0}")]
    UnknownMathBackend(String),
}

/// Errors that occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math rendering error: {0}")]
    Math(String),
}
