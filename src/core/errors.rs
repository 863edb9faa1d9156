use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Structured record of a failed external-tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecError {
    pub tool: String,
    pub args: Vec<String>,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
    pub duration_ms: u128,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid target on line {line}: {reason}")]
    TargetParse { line: usize, reason: String },

    #[error("probe unavailable: {0}")]
    ProbeUnavailable(String),

    #[error("probe timed out after {0:?}")]
    ProbeTimeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cache io error: {0}")]
    CacheIo(String),

    #[error("configuration error: {0}")]
    FatalConfig(String),

    #[error("execution failed: {0:?}")]
    Exec(ExecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
