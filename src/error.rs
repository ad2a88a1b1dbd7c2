//! Error types for the magnetic circuit solver.
//!
//! This module provides a unified error type [`EmcError`] that covers
//! all error conditions that can occur during circuit construction,
//! material-table loading, and solving.

use thiserror::Error;

/// Result type alias using [`EmcError`].
pub type Result<T> = std::result::Result<T, EmcError>;

/// Unified error type for all EMC operations.
#[derive(Error, Debug)]
pub enum EmcError {
    // ============ Circuit Construction Errors ============
    /// Node name already registered
    #[error("Impossible to create new node '{node}': node exists")]
    DuplicateNode { node: String },

    /// Node not found in circuit
    #[error("Node '{node}' not found in circuit")]
    NodeNotFound { node: String },

    /// Duplicate element identifier
    #[error("Duplicate element name '{name}'")]
    DuplicateElement { name: String },

    /// Element not found in circuit
    #[error("Element '{name}' not found")]
    ElementNotFound { name: String },

    /// Invalid element parameter value
    #[error("Invalid parameter '{param}' for element '{element}': {message}")]
    InvalidParameter {
        element: String,
        param: String,
        message: String,
    },

    /// Undefined model reference
    #[error("Undefined model '{model}' referenced by element '{element}'")]
    UndefinedModel { model: String, element: String },

    /// Unknown model kind
    #[error("Unknown model type '{kind}'")]
    UnknownModelKind { kind: String },

    /// Invalid circuit topology
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ Material Data Errors ============
    /// Error reading a B-H table
    #[error("Could not open the B-H curve file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed row in a B-H table
    #[error("Malformed B-H data at line {line}: {message}")]
    MalformedData { line: usize, message: String },

    /// B-H samples that cannot be interpolated
    #[error("Invalid B-H data: {message}")]
    InvalidBhData { message: String },

    // ============ Solver Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix - circuit may have a floating node or an MMF source loop")]
    SingularMatrix,

    /// Invalid solver parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },
}

impl EmcError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        element: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            element: element.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a malformed data error
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedData {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid B-H data error
    pub fn invalid_bh(message: impl Into<String>) -> Self {
        Self::InvalidBhData {
            message: message.into(),
        }
    }

    /// Create an invalid topology error
    pub fn topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }
}
