use std::io;

/// All error types for the surf-view tool.
#[derive(thiserror::Error, Debug)]
pub enum SurfViewError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("Degenerate range: {0}")]
    DegenerateRange(String),
    #[error("Input error: {0}")]
    Input(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SurfViewError>;
