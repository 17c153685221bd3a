//! Report Error Types
//!
//! This module defines the [`ReportError`] enum, which covers every failure
//! mode of the report pipeline: record parsing, statistics, chart rendering,
//! narrative generation, and document assembly. Each variant carries a
//! descriptive message for error reporting at the front-end boundary.
//!
//! Field-level absence in the input record is never an error (the normalizer
//! substitutes documented defaults); only a top-level shape problem produces
//! [`ReportError::InvalidRecord`].

use std::fmt;

/// Represents all error types that can occur in the report pipeline.
#[derive(Debug)]
pub enum ReportError {
    /// The top-level record is not an object or a non-empty array of objects.
    InvalidRecord(String),
    /// JSON is malformed or does not match an expected schema.
    InvalidJson(String),
    /// The external narrative service failed or returned unusable output.
    NarrativeError(String),
    /// A chart could not be rendered.
    ChartError(String),
    /// The PDF document could not be assembled.
    RenderError(String),
    /// I/O error (file not found, unreadable, etc.).
    IoError(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::InvalidRecord(msg) => write!(f, "invalid exam record: {msg}"),
            ReportError::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            ReportError::NarrativeError(msg) => write!(f, "narrative generation failed: {msg}"),
            ReportError::ChartError(msg) => write!(f, "chart rendering failed: {msg}"),
            ReportError::RenderError(msg) => write!(f, "document assembly failed: {msg}"),
            ReportError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::InvalidJson(err.to_string())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::IoError(err.to_string())
    }
}
