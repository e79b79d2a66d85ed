//! Error kinds surfaced by the resolve/download/upload pipeline.

use std::fmt;
use std::path::PathBuf;

/// Why a network operation failed.
#[derive(Debug)]
pub enum NetworkFailure {
    /// Curl reported an error (timeout, connection refused, DNS, ...).
    Curl(curl::Error),
    /// The server answered with a non-2xx status.
    Status(u32),
    /// Body ended before `Content-Length` bytes arrived.
    PartialTransfer { expected: u64, received: u64 },
    /// Response arrived but its body was not what the API promises.
    UnexpectedBody(String),
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::Curl(e) => write!(f, "{}", e),
            NetworkFailure::Status(code) => write!(f, "HTTP {}", code),
            NetworkFailure::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            NetworkFailure::UnexpectedBody(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for NetworkFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkFailure::Curl(e) => Some(e),
            _ => None,
        }
    }
}

/// Top-level pipeline error. Every variant terminates the run; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Address not understood, or the metadata lookup found nothing to download.
    #[error("cannot resolve {address}: {reason}")]
    Resolution { address: String, reason: String },

    #[error("network error on {url}: {failure}")]
    Network {
        url: String,
        #[source]
        failure: NetworkFailure,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Credential rejected by the target service (HTTP 401/403).
    #[error("credentials rejected by {url} (HTTP {status})")]
    Auth { url: String, status: u32 },
}

impl TransferError {
    pub fn resolution(address: impl Into<String>, reason: impl Into<String>) -> Self {
        let address: String = address.into();
        TransferError::Resolution {
            address: crate::redact::redact_url(&address),
            reason: reason.into(),
        }
    }

    pub fn network(url: &str, failure: NetworkFailure) -> Self {
        TransferError::Network {
            url: crate::redact::redact_url(url),
            failure,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransferError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransferError::Resolution { .. } => 2,
            TransferError::Network { .. } => 3,
            TransferError::Io { .. } => 4,
            TransferError::Auth { .. } => 5,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u32> {
        match self {
            TransferError::Network {
                failure: NetworkFailure::Status(code),
                ..
            } => Some(*code),
            TransferError::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
