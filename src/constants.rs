//! Modbus RTU protocol constants used by the slave
//!
//! Function and exception codes follow the official Modbus application
//! protocol specification. Frame geometry follows the RTU serial line
//! framing: Slave Address(1) + PDU + CRC(2, low byte first).

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Length of the RTU CRC trailer
pub const RTU_CRC_LEN: usize = 2;

/// Frames shorter than this are dropped before the CRC check
///
/// A well-formed FC03 request is Station(1) + Function(1) + Address(2) +
/// Count(2) + CRC(2) = 8 bytes. The gate is one byte looser; a 7 byte frame
/// still has to pass the CRC check.
pub const MIN_REQUEST_FRAME_LEN: usize = 7;

/// Offset of the first register value in a write multiple registers request
/// Station(1) + Function(1) + Address(2) + Count(2) + Byte Count(1) = 7
pub const WRITE_PAYLOAD_OFFSET: usize = 7;

/// Bytes surrounding the register data of a read response
/// Station(1) + Function(1) + Byte Count(1) + CRC(2) = 5
pub const RESPONSE_OVERHEAD: usize = 5;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03 (Read Holding Registers)
///
/// Calculation for response PDU:
/// - Function Code: 1 byte
/// - Byte Count: 1 byte
/// - Register Data: N × 2 bytes
/// - Total: 1 + 1 + (N × 2) ≤ 253
/// - Therefore: N ≤ (253 - 2) / 2 = 125.5 → 125 registers
pub const MAX_READ_REGISTERS: usize = 125;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Write Multiple Registers (FC16)
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Bit set on the function code of an exception response
pub const EXCEPTION_FUNCTION_MASK: u8 = 0x80;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal Data Value
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(WRITE_PAYLOAD_OFFSET, 1 + 1 + 2 + 2 + 1);
        assert_eq!(RESPONSE_OVERHEAD, 1 + 1 + 1 + RTU_CRC_LEN);
    }

    #[test]
    fn test_read_limit_fits_byte_count() {
        // The byte count field is a single byte
        assert!(MAX_READ_REGISTERS * 2 <= u8::MAX as usize);
        // Full ADU stays within 256 bytes
        assert!(MAX_READ_REGISTERS * 2 + RESPONSE_OVERHEAD <= 256);
    }
}
