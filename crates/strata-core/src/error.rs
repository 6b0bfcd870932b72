//! Error types for strata operations.

use std::fmt;
use std::io;

/// All possible strata errors.
///
/// Callers dispatch on the variant; message text is for humans only.
#[derive(Debug)]
pub enum StrataError {
    /// The directory is not a strata repository.
    NotInitialized,
    /// A strata repository already exists here.
    AlreadyInitialized,
    /// The file to add or commit does not exist (or is a directory).
    FileNotFound(String),
    /// The filename is already present in the current snapshot.
    AlreadyTracked(String),
    /// The filename is not present in the current snapshot.
    NotTracked(String),
    /// Not a non-negative integer, or no snapshot exists for it.
    InvalidVersion(String),
    /// Persisted state could not be parsed (e.g. a mangled pointer file).
    Corrupt(String),
    /// An I/O error occurred.
    Io(io::Error),
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::NotInitialized => {
                write!(f, "current directory is not initialized (missing .strata/)")
            }
            StrataError::AlreadyInitialized => {
                write!(f, "current directory is already initialized")
            }
            StrataError::FileNotFound(name) => write!(f, "file not found: {name}"),
            StrataError::AlreadyTracked(name) => write!(f, "file already tracked: {name}"),
            StrataError::NotTracked(name) => write!(f, "file is not tracked: {name}"),
            StrataError::InvalidVersion(v) => write!(f, "invalid version number: {v}"),
            StrataError::Corrupt(msg) => write!(f, "corrupt repository state: {msg}"),
            StrataError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for StrataError {}

impl From<io::Error> for StrataError {
    fn from(e: io::Error) -> Self {
        StrataError::Io(e)
    }
}

/// Convenience alias used throughout strata.
pub type StrataResult<T> = Result<T, StrataError>;
