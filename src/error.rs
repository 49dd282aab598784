use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the aggregation pipeline and the mesh analyses.
///
/// Per-case failures are collected by the aggregator and never abort a run;
/// command handlers wrap these in `anyhow` with context when they are fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to parse {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("{table} is missing required columns: {}", .missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    #[error(
        "Pin count ({pins}) does not match the number of electron-density fields ({fields})"
    )]
    CountMismatch { pins: usize, fields: usize },

    #[error("{0}")]
    EmptyData(String),

    #[error("no electron density fields were found in the mesh")]
    NoFieldsFound,

    #[error("field '{0}' contains no finite values")]
    EmptyField(String),

    #[error("mesh error: {0}")]
    Mesh(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn parse(what: impl Into<String>, detail: impl ToString) -> Self {
        PipelineError::Parse {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
