//! Error handling for j2subst.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error as ThisError;

/// Custom error types for j2subst operations.
///
/// Low-level collaborators (parsers, filesystem calls) return these; the config
/// aggregator and the render driver turn most of them into logged per-item
/// failures. `StrictModeError` is the one variant that callers always propagate.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors in configuration sources that are not parse failures
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Failed to parse YAML: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}.")]
    TomlError(#[from] toml::de::Error),

    /// Represents errors raised by the template engine
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Template lookup or output target problems for a single render
    #[error("Render error: {0}.")]
    RenderError(String),

    /// Dictionary name which is not usable as a template identifier
    #[error("Invalid dictionary name: {0:?}.")]
    InvalidDictName(String),

    /// A recoverable condition escalated because strict mode is enabled
    #[error("Strict mode: {0}.")]
    StrictModeError(String),
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
