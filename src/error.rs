//! Error types for the loading and parsing entry points.
//!
//! Interactive operations (hit testing, coordinate conversion, thumbnail
//! resolution) never fail; they degrade to empty results. Only the places
//! that ingest external data return these errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while ingesting resources, annotations or configuration.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// I/O error while reading input files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource graph could not be read
    #[error("Resource error: {0}")]
    Resource(#[from] iiif_resource::ResourceError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Annotation JSON without a usable id or target
    #[error("Invalid annotation: {message}")]
    InvalidAnnotation {
        /// What was wrong with it
        message: String,
    },

    /// Referenced canvas is not part of the current world
    #[error("Canvas not found: {id}")]
    UnknownCanvas {
        /// The missing canvas id
        id: String,
    },

    /// Input file does not exist
    #[error("File not found: {path:?}")]
    FileNotFound {
        /// Path that was requested
        path: PathBuf,
    },
}

impl ViewerError {
    /// Create an invalid annotation error with a message.
    pub fn invalid_annotation(message: impl Into<String>) -> Self {
        Self::InvalidAnnotation {
            message: message.into(),
        }
    }

    /// Create an unknown canvas error.
    pub fn unknown_canvas(id: impl Into<String>) -> Self {
        Self::UnknownCanvas { id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
