//! Ctxweave error types.
//!
//! All errors are typed and provide root cause information.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ctxweave operations.
#[derive(Error, Debug)]
pub enum WeaveError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A locator output line did not have the `line:offset:text` shape.
    #[error("Malformed locator output line: {line:?}")]
    MalformedLocator {
        /// The raw line that failed to parse.
        line: String,
    },

    /// A reference-finder output line did not have the
    /// `path:startLine.startOffset-endLine.endOffset:message` shape.
    #[error("Malformed referrer output line: {line:?}")]
    MalformedReferrer {
        /// The raw line that failed to parse.
        line: String,
    },

    /// The target identifier could not be located on a line the locator
    /// reported it on.
    #[error("Could not locate identifier '{identifier}' in line: {line:?}")]
    IdentifierNotFound {
        /// The identifier being searched for.
        identifier: String,
        /// The line text that was searched.
        line: String,
    },

    /// A reference points at a line number past the end of its file.
    #[error("Line {line} out of range for {path}")]
    LineOutOfRange {
        /// The file the reference points into.
        path: PathBuf,
        /// The out-of-range 0-based line index.
        line: usize,
    },

    /// An external collaborator binary is not installed.
    #[error("Required tool '{tool}' not found on PATH")]
    ToolNotFound {
        /// The binary name that could not be resolved.
        tool: String,
    },

    /// An external collaborator ran but reported failure.
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed {
        /// The binary that failed.
        tool: String,
        /// Captured stderr or a description of the failure.
        message: String,
    },

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for WeaveError {
    fn from(err: std::io::Error) -> Self {
        WeaveError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

/// Result type alias for ctxweave operations.
pub type Result<T> = std::result::Result<T, WeaveError>;
