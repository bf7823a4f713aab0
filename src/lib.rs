//! j2subst expands templates against a configuration dictionary merged from
//! YAML, JSON and TOML documents, plus a filtered view of the process
//! environment.

/// Command-line interface module for the j2subst application
pub mod cli;

/// Configuration aggregation and dump mode
/// Supports YAML (multi-document), JSON and TOML sources
pub mod config;

/// Common constants and defaults
pub mod constants;

/// Environment passthrough and CI detection
pub mod env;

/// Error types and handling for the j2subst application
pub mod error;

/// Path normalization and standard stream detection
pub mod files;

/// Logger initialization from verbosity and debug flags
pub mod logger;

/// Recursive merge of configuration dictionaries
pub mod merge;

/// Template processing orchestration
/// Resolves inputs and outputs and renders files, stdin and directories
pub mod processor;

/// Template functions and filters
pub mod registry;

/// Template rendering functionality
pub mod renderer;

/// Warning/info sink with strict mode escalation
pub mod report;

/// Template search path resolution
/// Handles @{CWD} and @{ORIGIN} placeholders
pub mod search;
