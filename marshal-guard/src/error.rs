//! Error types for the guard service.

use thiserror::Error;

/// Guard-level errors.
///
/// Configuration problems are fatal at startup. Reaper I/O failures never
/// surface here at all; cleanup is best-effort and logs its own warnings.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Unusable configuration (bad env value, no trust anchor).
    #[error("configuration error: {0}")]
    Config(String),

    /// Error from the validation core.
    #[error(transparent)]
    License(#[from] marshal_license::LicenseError),

    /// I/O failure outside the best-effort cleanup path.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
