//! Error types for the RTU slave
//!
//! Framing and protocol problems on the wire are never errors here: framing
//! errors are dropped and protocol errors become Modbus exception responses.
//! `SlaveError` covers the local side only: configuration, register
//! registration and the register accessors supplied by the application.

use thiserror::Error;

/// Slave-side error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlaveError {
    /// Invalid slave configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A register binding was rejected at registration time
    #[error("Invalid register binding at 0x{base_address:04X}: {message}")]
    InvalidBinding { base_address: u16, message: String },

    /// A register accessor refused the address or value
    #[error("Register access failed at 0x{address:04X}: {message}")]
    Access { address: u16, message: String },
}

impl SlaveError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_binding(base_address: u16, message: impl Into<String>) -> Self {
        Self::InvalidBinding {
            base_address,
            message: message.into(),
        }
    }

    pub fn access(address: u16, message: impl Into<String>) -> Self {
        Self::Access {
            address,
            message: message.into(),
        }
    }
}

/// Result alias used across the crate
pub type SlaveResult<T> = std::result::Result<T, SlaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_address_in_hex() {
        let err = SlaveError::access(0x006B, "out of range");
        assert_eq!(
            err.to_string(),
            "Register access failed at 0x006B: out of range"
        );

        let err = SlaveError::invalid_binding(0x0100, "count must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid register binding at 0x0100: count must be non-zero"
        );
    }

    #[test]
    fn test_configuration_helper() {
        let err = SlaveError::configuration("station 0 is broadcast");
        assert!(matches!(err, SlaveError::Configuration { .. }));
    }
}
