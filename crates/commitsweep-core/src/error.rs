//! Error types for commitsweep-core

use std::fmt;

/// Result type alias for commitsweep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for commitsweep operations
#[derive(Debug)]
pub enum Error {
    /// Feed, commit metadata, raw file or quota endpoint failure
    Retrieval(String),

    /// External analyzer could not be spawned or exited non-zero
    Scan(String),

    /// Invalid configuration
    Config(String),

    /// One-time initialization failed
    Provision(String),

    /// I/O error
    Io(std::io::Error),

    /// Shutdown requested while waiting on the API quota
    Interrupted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Retrieval(msg) => write!(f, "Retrieval error: {}", msg),
            Error::Scan(msg) => write!(f, "Scan error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Provision(msg) => write!(f, "Provisioning error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Interrupted => write!(f, "Interrupted while waiting for quota reset"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors carry the URL, never request headers
        Error::Retrieval(err.to_string())
    }
}

impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Error::Config(format!("invalid extension pattern: {}", err))
    }
}

/// Fieldless error category for cheap matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Retrieval error
    Retrieval,
    /// Analyzer error
    Scan,
    /// Configuration error
    Config,
    /// Provisioning error
    Provision,
    /// I/O operation error
    Io,
    /// Shutdown requested
    Interrupted,
}

impl Error {
    /// Get the error kind
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Retrieval(_) => ErrorKind::Retrieval,
            Error::Scan(_) => ErrorKind::Scan,
            Error::Config(_) => ErrorKind::Config,
            Error::Provision(_) => ErrorKind::Provision,
            Error::Io(_) => ErrorKind::Io,
            Error::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Borrow the error message
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Retrieval(msg)
            | Error::Scan(msg)
            | Error::Config(msg)
            | Error::Provision(msg) => msg,
            Error::Io(_) => "I/O error",
            Error::Interrupted => "interrupted",
        }
    }
}
