//! Error types for lineage-parser

use thiserror::Error;

/// Lineage parsing errors
#[derive(Error, Debug)]
pub enum LineageError {
    /// SQL parse error (L001)
    #[error("[L001] SQL parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Tokenizer error (L002)
    #[error("[L002] SQL tokenize error: {0}")]
    Tokenize(String),
}

/// Result type alias for LineageError
pub type LineageResult<T> = Result<T, LineageError>;
