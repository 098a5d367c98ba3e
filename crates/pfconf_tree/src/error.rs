//! Error types for configuration tree operations.

use std::io;
use thiserror::Error;

/// Result type for tree and store operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while loading, navigating or persisting a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The XML document could not be parsed or written.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document parsed but does not have the expected shape.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// A required container element is missing from the root.
    #[error("container <{name}> not found in configuration")]
    MissingContainer {
        /// Tag of the missing container.
        name: String,
    },

    /// Another process holds the configuration lock.
    #[error("configuration locked: another process has exclusive access")]
    Locked,

    /// A unique identifier could not be generated.
    #[error("could not generate unique id: {0}")]
    IdGeneration(String),
}

impl TreeError {
    /// Creates an XML error from any displayable parser or writer error.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }

    /// Creates a malformed configuration error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a missing container error.
    pub fn missing_container(name: impl Into<String>) -> Self {
        Self::MissingContainer { name: name.into() }
    }
}
