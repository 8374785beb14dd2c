//! # Slave Configuration
//!
//! Identity and capacity of an RTU slave.
//!
//! - **Station address**: 1-247. Address 0 is the broadcast address, which
//!   this slave does not serve. 248-255 are reserved by the Modbus serial
//!   line rules and are rejected on purpose, even though a station byte in
//!   that range would frame and checksum like any other.
//! - **Max stream registers**: largest register count a single request may
//!   carry. It sizes the slave's scratch buffers and may not exceed
//!   [`MAX_READ_REGISTERS`], the largest read response an RTU frame can hold.

use crate::constants::{MAX_READ_REGISTERS, RESPONSE_OVERHEAD};
use crate::error::{SlaveError, SlaveResult};
use crate::protocol::SlaveId;

/// Default station address.
pub const DEFAULT_STATION_ADDRESS: SlaveId = 1;

/// Default per-request register capacity (Modbus specification limit).
pub const DEFAULT_MAX_STREAM_REGISTERS: usize = MAX_READ_REGISTERS;

/// Highest assignable station address.
pub const MAX_STATION_ADDRESS: SlaveId = 247;

/// RTU slave configuration.
///
/// # Example
///
/// ```rust
/// use modbus_rtu_slave::SlaveConfig;
///
/// let config = SlaveConfig::new(0x11).with_max_stream_registers(16);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_stream_registers, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveConfig {
    /// Station address this slave answers to.
    pub station_address: SlaveId,
    /// Maximum registers per request.
    pub max_stream_registers: usize,
}

impl SlaveConfig {
    /// Configuration for `station_address` with the default capacity.
    pub fn new(station_address: SlaveId) -> Self {
        Self {
            station_address,
            ..Self::default()
        }
    }

    /// Set maximum registers per request.
    pub fn with_max_stream_registers(mut self, count: usize) -> Self {
        self.max_stream_registers = count;
        self
    }

    /// Check station address and capacity.
    pub fn validate(&self) -> SlaveResult<()> {
        if self.station_address == 0 || self.station_address > MAX_STATION_ADDRESS {
            return Err(SlaveError::configuration(format!(
                "station address {} outside 1-{}",
                self.station_address, MAX_STATION_ADDRESS
            )));
        }
        if self.max_stream_registers > MAX_READ_REGISTERS {
            return Err(SlaveError::configuration(format!(
                "max stream registers {} exceeds {}",
                self.max_stream_registers, MAX_READ_REGISTERS
            )));
        }
        Ok(())
    }

    /// Size of the largest response this configuration can produce.
    pub fn response_capacity(&self) -> usize {
        self.max_stream_registers * 2 + RESPONSE_OVERHEAD
    }
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            station_address: DEFAULT_STATION_ADDRESS,
            max_stream_registers: DEFAULT_MAX_STREAM_REGISTERS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SlaveConfig::default();
        assert_eq!(config.station_address, DEFAULT_STATION_ADDRESS);
        assert_eq!(config.max_stream_registers, DEFAULT_MAX_STREAM_REGISTERS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SlaveConfig::new(0x11).with_max_stream_registers(8);

        assert_eq!(config.station_address, 0x11);
        assert_eq!(config.max_stream_registers, 8);
        assert_eq!(config.response_capacity(), 21);
    }

    #[test]
    fn test_rejects_broadcast_and_reserved_stations() {
        assert!(SlaveConfig::new(0).validate().is_err());
        assert!(SlaveConfig::new(248).validate().is_err());
        assert!(SlaveConfig::new(247).validate().is_ok());
    }

    #[test]
    fn test_rejects_capacity_above_frame_limit() {
        let config = SlaveConfig::new(1).with_max_stream_registers(MAX_READ_REGISTERS + 1);
        assert!(matches!(
            config.validate(),
            Err(SlaveError::Configuration { .. })
        ));
    }

    #[test]
    fn test_zero_capacity_is_allowed() {
        // Every request with a non-zero count is refused
        assert!(SlaveConfig::new(1)
            .with_max_stream_registers(0)
            .validate()
            .is_ok());
    }
}
