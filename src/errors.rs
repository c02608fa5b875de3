// SPDX-License-Identifier: MPL-2.0

//! Error types for the compositor application

use crate::backends::types::{BackendError, ImStatus};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// A capture, encoder or ISP channel could not be brought up
    ChannelSetup(BackendError),
    /// Configuration errors
    Config(ConfigError),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Fatal errors raised while processing a single frame
///
/// Every variant aborts the run: the pipeline drops the frames it holds,
/// raises the termination flag and leaves teardown to the main thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The allocator could not provide a buffer
    Allocation(String),
    /// A raster operation returned a non-success status
    Operation {
        /// Name of the failing operation (e.g. "blend")
        op: &'static str,
        /// Status reported by the raster primitive
        status: ImStatus,
    },
}

/// Invalid run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Compositing mode outside 0..=3
    InvalidMode(u32),
    /// Source dimensions are zero or not even
    InvalidSourceSize { width: u32, height: u32 },
    /// OSD rectangle does not fit inside the source frame
    OsdOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// OSD rectangle has no area
    EmptyOsd,
    /// JPEG quality outside 1..=100
    InvalidQuality(u8),
    /// Capture pool must hold at least one buffer
    InvalidBufferCount(u32),
}

impl AppError {
    /// Process exit code for a run that ended with this error
    ///
    /// Invalid configuration exits cleanly after printing usage; anything
    /// that kept a channel from coming up exits with -1.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 0,
            _ => -1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ChannelSetup(e) => write!(f, "Channel setup failed: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Allocation(what) => write!(f, "Buffer allocation failed: {}", what),
            PipelineError::Operation { op, status } => {
                write!(f, "{} failed: {}", op, status.str_error())
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMode(mode) => {
                write!(f, "Invalid mode {} (expected 0, 1, 2 or 3)", mode)
            }
            ConfigError::InvalidSourceSize { width, height } => write!(
                f,
                "Invalid source size {}x{} (dimensions must be even and non-zero)",
                width, height
            ),
            ConfigError::OsdOutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "OSD rectangle {}x{} at ({}, {}) exceeds the source frame",
                width, height, x, y
            ),
            ConfigError::EmptyOsd => write!(f, "OSD rectangle has zero area"),
            ConfigError::InvalidQuality(q) => write!(f, "JPEG quality {} out of range 1-100", q),
            ConfigError::InvalidBufferCount(n) => {
                write!(f, "Capture buffer count {} (at least 1 required)", n)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PipelineError {}
impl std::error::Error for ConfigError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::ChannelSetup(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_mentions_status() {
        let err = PipelineError::Operation {
            op: "blend",
            status: ImStatus::InvalidParam,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("blend failed"));
        assert!(msg.contains(ImStatus::InvalidParam.str_error()));
    }

    #[test]
    fn test_backend_error_maps_to_setup() {
        let err: AppError = BackendError::DeviceNotFound("vi0".into()).into();
        assert!(matches!(err, AppError::ChannelSetup(_)));
    }

    #[test]
    fn test_exit_codes() {
        let setup: AppError = BackendError::InitializationFailed("venc".into()).into();
        assert_eq!(setup.exit_code(), -1);
        assert_eq!(AppError::from(ConfigError::InvalidMode(7)).exit_code(), 0);
        assert_eq!(AppError::from(ConfigError::EmptyOsd).exit_code(), 0);
        assert_eq!(AppError::Storage("disk full".into()).exit_code(), -1);
    }
}
