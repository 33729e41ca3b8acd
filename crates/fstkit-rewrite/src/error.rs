// Errors for rule compilation and application.

use fstkit_core::FstError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
    #[error(transparent)]
    Fst(#[from] FstError),

    /// The rule has no output for the input.
    #[error("composition failure: rule does not apply to the input")]
    CompositionFailure,

    /// A batch item was skipped because its token was cancelled.
    #[error("cancelled")]
    Cancelled,

    #[error("thread pool: {0}")]
    ThreadPool(String),
}
