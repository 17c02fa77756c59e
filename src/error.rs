//! Separation errors

use thiserror::Error;

use crate::parse::ParseError;

/// Separation result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to build the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("separation was interrupted")]
    Interrupted,
}
