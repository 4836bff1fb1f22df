//! Error types for template discovery and cataloging

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering, parsing or watching templates
///
/// Only [`CatalogError::DirectoryNotFound`], configuration and watcher errors
/// reach callers of the catalog; per-file errors are absorbed by discovery.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Discovery root does not exist or is not a directory
    #[error("Template directory not found: {}", path.display())]
    DirectoryNotFound {
        /// The requested root
        path: PathBuf,
    },

    /// Template metadata could not be parsed
    #[error("Failed to parse template {}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying parser message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem watcher error
    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Invalid or unreadable catalog configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// A blocking or background task failed to complete
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl CatalogError {
    /// Create a parse error for a file
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
