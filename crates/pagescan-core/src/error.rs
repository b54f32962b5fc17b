// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagescan.

use thiserror::Error;

/// Top-level error type for all Pagescan operations.
///
/// Every stage fails fast with one of these; no stage retries internally and
/// no stage returns a partially built raster or matrix alongside an error.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Caller contract --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Codec errors --
    #[error("decode failed: {0}")]
    DecodeFailure(String),

    #[error("encode failed: {0}")]
    EncodeFailure(String),

    // -- Geometry --
    #[error("transform failed: {0}")]
    TransformFailure(String),

    // -- Configuration loading --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Identifiable failure category, independent of the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    DecodeFailure,
    EncodeFailure,
    TransformFailure,
    /// Reading or parsing a configuration file failed.
    Config,
}

impl ScanError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ScanError::DecodeFailure(_) => ErrorKind::DecodeFailure,
            ScanError::EncodeFailure(_) => ErrorKind::EncodeFailure,
            ScanError::TransformFailure(_) => ErrorKind::TransformFailure,
            ScanError::Io(_) | ScanError::Serialization(_) => ErrorKind::Config,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            ScanError::InvalidArgument("quality 101".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            ScanError::DecodeFailure("truncated".into()).kind(),
            ErrorKind::DecodeFailure
        );
        assert_eq!(
            ScanError::EncodeFailure("layout".into()).kind(),
            ErrorKind::EncodeFailure
        );
        assert_eq!(
            ScanError::TransformFailure("overflow".into()).kind(),
            ErrorKind::TransformFailure
        );
    }

    #[test]
    fn io_errors_report_as_config() {
        let err: ScanError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn display_carries_detail() {
        let err = ScanError::TransformFailure("canvas too large".into());
        assert_eq!(err.to_string(), "transform failed: canvas too large");
    }
}
