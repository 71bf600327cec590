//! Error handling for streamchain
//!
//! This module defines the error type shared by the stream primitive, the
//! connection layer and every stage, plus a Result alias.

use crate::stream::id::NodeId;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for streamchain operations.
///
/// Errors travel along pipelines and may be observed by several nodes, so the
/// type is `Clone`; non-clonable sources are held behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// A caller-supplied transform, predicate or per-item callback failed
    #[error("Transform error in {stage}: {message}")]
    Transform { stage: String, message: String },

    /// The producer side of a connection has no readable half
    #[error("Node {0} is not readable")]
    NotReadable(NodeId),

    /// The consumer side of a connection has no writable half
    #[error("Node {0} is not writable")]
    NotWritable(NodeId),

    /// A foreign target reached the primitive with conversion disabled
    #[error("Connection target is not a stream node and conversion is disabled")]
    NotAStream,

    /// A chunk arrived after the writable side was ended
    #[error("Write after end on node {0}")]
    WriteAfterEnd(NodeId),

    /// A completion handle was dropped without being settled
    #[error("Completion callback of {0} dropped before it was called")]
    CallbackDropped(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StreamError>,
    },
}

impl StreamError {
    /// Build a transform failure from anything printable.
    pub fn transform(stage: impl Into<String>, message: impl std::fmt::Display) -> Self {
        StreamError::Transform {
            stage: stage.into(),
            message: message.to_string(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StreamError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

/// Result type alias for streamchain operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> StreamResult<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> StreamResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for StreamResult<T> {
    fn context(self, context: impl Into<String>) -> StreamResult<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> StreamResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> StreamResult<T> {
        self.map_err(|e| StreamError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> StreamResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| StreamError::from(e).with_context(f()))
    }
}
