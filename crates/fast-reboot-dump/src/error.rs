//! Error types for fast-reboot-dump
//!
//! Only fatal conditions are represented here. Lookup misses and malformed
//! store records are dropped where they are found and never surface as errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit code when the run was interrupted by SIGINT.
pub const EXIT_INTERRUPTED: u8 = 1;
/// Process exit code for any other failure.
pub const EXIT_FAILURE: u8 = 2;
/// Process exit code when the target directory does not exist.
pub const EXIT_TARGET_NOT_FOUND: u8 = 3;

/// Errors that abort a dump run
#[derive(Debug, Error)]
pub enum DumpError {
    /// Redis connection or command failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Connection attempt to a database did not complete in time
    #[error("Timed out connecting to {db} after {secs} seconds")]
    ConnectTimeout {
        /// Database name (e.g. "ASIC_DB")
        db: &'static str,
        /// Configured timeout
        secs: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Artifact serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target directory for the artifacts does not exist
    #[error("Target directory '{}' not found", .0.display())]
    TargetDirNotFound(PathBuf),

    /// Host network interface does not exist
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// Host network interface has no address of the requested kind
    #[error("Interface {interface} has no {family} address")]
    AddressNotFound {
        /// Interface name
        interface: String,
        /// "IPv4", "IPv6" or "MAC"
        family: &'static str,
    },

    /// Raw socket creation, bind or send failed
    #[error("Raw socket {operation} failed on {interface}: {source}")]
    Socket {
        /// The operation that failed ("open", "bind", "send")
        operation: &'static str,
        /// Interface name
        interface: String,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    /// Run cancelled by SIGINT
    #[error("Interrupted")]
    Interrupted,
}

impl DumpError {
    /// Creates a socket error for `interface`.
    pub fn socket(operation: &'static str, interface: impl Into<String>, source: io::Error) -> Self {
        Self::Socket {
            operation,
            interface: interface.into(),
            source,
        }
    }

    /// Creates an address-not-found error for `interface`.
    pub fn address_not_found(interface: impl Into<String>, family: &'static str) -> Self {
        Self::AddressNotFound {
            interface: interface.into(),
            family,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::TargetDirNotFound(_) => EXIT_TARGET_NOT_FOUND,
            DumpError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result type alias for fast-reboot-dump operations
pub type Result<T> = std::result::Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DumpError::TargetDirNotFound(PathBuf::from("/no/such/dir"));
        assert_eq!(err.to_string(), "Target directory '/no/such/dir' not found");

        let err = DumpError::address_not_found("Vlan1000", "IPv4");
        assert_eq!(err.to_string(), "Interface Vlan1000 has no IPv4 address");
    }

    #[test]
    fn test_socket_error_display() {
        let err = DumpError::socket(
            "bind",
            "Ethernet0",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.contains("bind"));
        assert!(msg.contains("Ethernet0"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DumpError::TargetDirNotFound(PathBuf::new()).exit_code(), 3);
        assert_eq!(DumpError::Interrupted.exit_code(), 1);
        assert_eq!(DumpError::Config("bad".into()).exit_code(), 2);
        assert_eq!(
            DumpError::InterfaceNotFound("Ethernet4".into()).exit_code(),
            EXIT_FAILURE
        );
    }
}
