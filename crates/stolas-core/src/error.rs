//! Error types for compression operations.

use thiserror::Error;

/// Result type alias for compression operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Compression error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Context rejected before any stage ran.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Outlier count exceeds the gatherer workspace.
    #[error("outlier capacity exceeded: {nnz} non-zeros, workspace holds {capacity}")]
    CapacityExceeded { nnz: usize, capacity: usize },

    /// A Huffman code does not fit the configured word width.
    ///
    /// Recoverable exactly once: the orchestrator retries with the 8-byte
    /// codec when the 4-byte attempt reports this.
    #[error("Huffman code length {max_len} exceeds {limit} bits at word width {width}")]
    CodeTooLong { max_len: u32, width: usize, limit: u32 },

    /// The archive would be larger than the reserved output buffer.
    #[error("compressed output {compressed} bytes exceeds reserved {reserved} bytes")]
    OutputInflation { compressed: usize, reserved: usize },

    /// Archive header or subfile failed validation on decompress.
    #[error("invalid header: {0}")]
    HeaderInvalid(String),

    /// A stage surfaced a device-runtime failure.
    #[error("device failure in {stage}: {message}")]
    Device {
        stage: &'static str,
        message: String,
    },

    /// Requested feature is declared but not implemented.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// I/O error from the host-side file layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::ConfigInvalid(message.into())
    }

    /// Create a header validation error.
    pub fn header(message: impl Into<String>) -> Self {
        Error::HeaderInvalid(message.into())
    }

    /// Create a device failure for a named stage.
    pub fn device(stage: &'static str, message: impl Into<String>) -> Self {
        Error::Device {
            stage,
            message: message.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// Check if the error is recoverable by retrying at a wider code word.
    ///
    /// Only the code-length overflow qualifies; every other kind is fatal
    /// for the current call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::CodeTooLong { .. })
    }

    /// Get error category for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::ConfigInvalid(_) => "config_invalid",
            Error::CapacityExceeded { .. } => "capacity_exceeded",
            Error::CodeTooLong { .. } => "code_too_long",
            Error::OutputInflation { .. } => "output_inflation",
            Error::HeaderInvalid(_) => "header_invalid",
            Error::Device { .. } => "device_failure",
            Error::Unsupported(_) => "unsupported",
            Error::Io(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_too_long_is_the_only_recoverable_kind() {
        let e = Error::CodeTooLong {
            max_len: 33,
            width: 4,
            limit: 31,
        };
        assert!(e.is_recoverable());

        assert!(!Error::config("radius").is_recoverable());
        assert!(!Error::CapacityExceeded {
            nnz: 10,
            capacity: 4
        }
        .is_recoverable());
        assert!(!Error::OutputInflation {
            compressed: 100,
            reserved: 50
        }
        .is_recoverable());
        assert!(!Error::header("bad magic").is_recoverable());
    }

    #[test]
    fn categories_are_stable() {
        assert_eq!(Error::config("x").category(), "config_invalid");
        assert_eq!(Error::header("x").category(), "header_invalid");
        assert_eq!(Error::device("predict", "x").category(), "device_failure");
    }
}
