//! Unified error types for powermon
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from hardware access (sensor tool, sysfs, i2c)
    #[error("Hardware error: {0}")]
    Hardware(#[from] HwError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Configuration describes no device to monitor
    #[error("No devices configured for monitoring")]
    NoDevices,

    /// A notification channel could not deliver an event
    #[error("Notification error: {0}")]
    Notification(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from external tools and sysfs access
#[derive(Error, Debug)]
pub enum HwError {
    /// External command could not be started
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// External command did not finish in time
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// External command exited with a failure status
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Sysfs node or hwmon directory does not exist
    #[error("Hardware node not found: {0}")]
    NotFound(String),

    /// Output of a tool or sysfs file could not be parsed
    #[error("Unexpected hardware output: {0}")]
    Parse(String),

    /// Writing a firmware threshold failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Chip name does not follow `<driver>-i2c-<bus>-<addr>`
    #[error("Invalid sensor chip name: {0} (expected <driver>-i2c-<bus>-<addr>)")]
    InvalidChipName(String),

}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
