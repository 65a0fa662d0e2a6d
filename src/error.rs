use thiserror::Error;

use crate::light::LightContext;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Misaligned or zero sizes, malformed hashes, mismatched epochs.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: u64 },

    #[error("dataset storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset generation cancelled")]
    Cancelled,

    /// The size scheduler ran past the configured growth ceiling.
    #[error("epoch {epoch} exceeds the configured maximum of {max}")]
    EpochOutOfRange { epoch: u64, max: u64 },

    #[cfg(feature = "parallel")]
    #[error("worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameters(msg.into())
    }
}

/// A failed [`FullContext`](crate::FullContext) construction.
///
/// The light context passed in is handed back untouched, so the caller keeps
/// ownership of its cache.
#[derive(Debug)]
pub struct AdoptError {
    pub error: Error,
    pub light: LightContext,
}

impl AdoptError {
    pub fn into_parts(self) -> (Error, LightContext) {
        (self.error, self.light)
    }
}

impl std::fmt::Display for AdoptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for AdoptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<AdoptError> for Error {
    fn from(e: AdoptError) -> Self {
        e.error
    }
}
