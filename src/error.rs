//! Error types for record parsing and pipeline setup.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single input line could not be turned into a movement record.
///
/// These are never fatal: the dispatcher drops the line and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A whitespace-separated token has no `:` separator.
    #[error("Record is not a movement: token {token:?} has no ':' separator")]
    MalformedRecord { token: String },

    /// The `ammount` value is not a non-negative integer.
    #[error("Unable to parse ammount: {value:?}")]
    InvalidAmount { value: String },

    /// One of `user`, `type` or `ammount` never appeared on the line.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Failures that abort a run before (or instead of) producing a result.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A pipeline setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input source could not be opened.
    #[error("Failed to open input {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },

    #[error("Dispatcher panicked")]
    DispatcherPanicked,

    #[error("Worker supervisor panicked")]
    SupervisorPanicked,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
