/// Convenience result type used across the crate.
pub type GifweaveResult<T> = Result<T, GifweaveError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum GifweaveError {
    /// Invalid user-provided or model data: mismatched counts, empty
    /// sequences, out-of-range parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while parsing or applying a template document.
    #[error("template error: {0}")]
    Template(String),

    /// Per-item failure raised inside batch processing; callers of
    /// `process_batch` receive these folded into the report, never raised.
    #[error("batch error: {0}")]
    Batch(String),

    /// External optimizer ran and failed, or left no output behind.
    #[error("optimizer error: {0}")]
    Optimizer(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GifweaveError {
    /// Build a [`GifweaveError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GifweaveError::Template`] value.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Build a [`GifweaveError::Batch`] value.
    pub fn batch(msg: impl Into<String>) -> Self {
        Self::Batch(msg.into())
    }

    /// Build a [`GifweaveError::Optimizer`] value.
    pub fn optimizer(msg: impl Into<String>) -> Self {
        Self::Optimizer(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
