//! CLI errors
//!
//! Every variant ends the process with exit status 1.

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum CliError {
    /// Config file missing, unreadable or inconsistent
    #[error("config error: {0}")]
    Config(String),

    /// Bad argument or stdin payload
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Record file unreadable or not a list of objects
    #[error("data error: {0}")]
    Data(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
