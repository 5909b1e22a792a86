// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.

use thiserror::Error;

/// Top-level error type for all Quire operations.
///
/// Missing stories, chapters, shortcode targets and unusable images are not
/// errors: the pipeline recovers from those locally. What remains here is
/// either the caller's fault (`UnsupportedFormat`) or a failure to assemble
/// or write the final document.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Request errors --
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    // -- Document errors --
    #[error("DOCX assembly failed: {0}")]
    Docx(String),

    // -- Storage / configuration --
    #[error("entity store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuireError {
    /// Whether the error was caused by the request rather than by the server.
    ///
    /// An HTTP front end maps `true` to a 4xx response and everything else to
    /// a 5xx response.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unsupported_format_is_a_client_error() {
        assert!(QuireError::UnsupportedFormat("odt".into()).is_client_error());
        assert!(!QuireError::Docx("zip".into()).is_client_error());
        assert!(!QuireError::Io(std::io::Error::other("disk full")).is_client_error());
    }

    #[test]
    fn messages_carry_context() {
        let err = QuireError::UnsupportedFormat("odt".into());
        assert_eq!(err.to_string(), "unsupported export format: odt");
    }
}
