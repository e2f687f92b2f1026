use thiserror::Error;

/// Errors that can occur while starting, using or stopping a siscom device.
///
/// Unknown write commands and truncated reads are not errors: the former
/// disables the selection, the latter is a successful partial delivery.
#[derive(Error, Debug)]
pub enum Error {
    /// A pin, pin set or device node could not be claimed, sampled or driven.
    #[error("Resource unavailable '{resource}': {reason}")]
    ResourceUnavailable {
        /// Logical name of the pin, pin set or node involved.
        resource: String,
        /// What went wrong.
        reason: String,
    },
    /// A session is already open and the device admits a single client.
    #[error("Device busy: a session is already open")]
    Busy,
    /// The device has been shut down.
    #[error("Device is not running")]
    NotRunning,
    /// The configuration was rejected before any resource was touched.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Line number is outside the range a backend supports.
    #[error("GPIO line {line} out of range: {message}")]
    PinArgumentOutOfRange {
        /// The offending line number.
        line: u8,
        /// Detailed error message explaining the constraint.
        message: String,
    },
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// HID feature report operation failed.
    #[error("Feature report error while accessing register 0x{reg_addr:04X}")]
    FeatureReportError {
        /// The register address that was being accessed.
        reg_addr: u16,
    },
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for siscom operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unavailable(resource: impl Into<String>, reason: impl ToString) -> Self {
        Error::ResourceUnavailable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::Busy => std::io::Error::new(ErrorKind::WouldBlock, err),
            Error::NotRunning => std::io::Error::new(ErrorKind::NotConnected, err),
            Error::InvalidConfig(_) | Error::PinArgumentOutOfRange { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err)
            }
            other => std::io::Error::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds() {
        let busy: std::io::Error = Error::Busy.into();
        assert_eq!(busy.kind(), std::io::ErrorKind::WouldBlock);

        let stopped: std::io::Error = Error::NotRunning.into();
        assert_eq!(stopped.kind(), std::io::ErrorKind::NotConnected);

        let missing: std::io::Error = Error::unavailable("LED 1", "line absent").into();
        assert_eq!(missing.kind(), std::io::ErrorKind::Other);
        assert!(missing.to_string().contains("LED 1"));
    }
}
