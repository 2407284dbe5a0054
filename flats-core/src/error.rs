use thiserror::Error;

/// Errors raised by the compiler pipeline. The first error aborts the
/// run; there is no recovery or batching.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lex error at line {line}: {message}")]
    Lex { line: usize, message: String },
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("semantic error: {0}")]
    Semantic(String),
}
