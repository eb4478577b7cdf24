//! Error types for the license validation core.

use thiserror::Error;

/// License validation errors.
///
/// `Config` is fatal at construction time (missing or unparsable trust
/// anchor). Every other kind is folded into a [`crate::Verdict`] reason by
/// `validate_license()` and never crosses the core boundary as an error.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Trust anchor or validator configuration is unusable. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure reading an artifact.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// License package JSON is malformed.
    #[error("malformed license package: {0}")]
    Json(#[from] serde_json::Error),

    /// PEM or DER decoding failed.
    #[error("certificate decode error: {0}")]
    CertificateDecode(String),

    /// Certificate is structurally valid but fails a check (unsupported
    /// algorithm, non-RSA key, bad CA signature).
    #[error("certificate error: {0}")]
    Certificate(String),

    /// RSA-PSS signature verification failed.
    #[error("{0}")]
    Signature(String),

    /// A date field does not match the variant's expected format.
    #[error("invalid expiration date {value:?}, expected format {format}")]
    DateFormat { value: String, format: &'static str },
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
