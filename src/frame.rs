//! RTU frame decoding and encoding
//!
//! Requests are decoded in place from the caller's buffer through
//! [`RequestFrame`], a borrowed view that only exists once the framing checks
//! have passed. Responses are assembled in a [`ResponseFrame`], a byte buffer
//! owned by the slave and reused across calls so that steady-state processing
//! does not allocate.
//!
//! ## Wire format
//!
//! | Frame | Layout |
//! |-------|--------|
//! | Read request | `station, 0x03, addr(BE16), count(BE16), crc(LE16)` |
//! | Write request | `station, 0x10, addr(BE16), count(BE16), byte_count, values(BE16)…, crc(LE16)` |
//! | Read response | `station, 0x03, byte_count, values(BE16)…, crc(LE16)` |
//! | Write ack | `station, 0x10, addr(BE16), count(BE16), crc(LE16)` |
//! | Exception | `station, function \| 0x80, code, crc(LE16)` |

use std::fmt;

use tracing::debug;

use crate::checksum;
use crate::constants::{
    EXCEPTION_FUNCTION_MASK, MIN_REQUEST_FRAME_LEN, RTU_CRC_LEN, WRITE_PAYLOAD_OFFSET,
};
use crate::protocol::{ModbusException, ModbusFunction, SlaveId};

/// Why a frame was dropped without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// Fewer bytes than the shortest request
    TooShort { len: usize },
    /// Addressed to another station
    WrongStation { station: SlaveId },
    /// CRC over the whole frame is not zero
    CrcMismatch,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "frame too short: {} bytes", len),
            Self::WrongStation { station } => write!(f, "addressed to station {}", station),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
        }
    }
}

/// Borrowed view of a request that passed length, station and CRC checks
#[derive(Debug, Clone, Copy)]
pub struct RequestFrame<'a> {
    data: &'a [u8],
}

impl<'a> RequestFrame<'a> {
    /// Run the framing checks in order: length, station, CRC
    pub fn parse(data: &'a [u8], station: SlaveId) -> Result<Self, DropReason> {
        if data.len() < MIN_REQUEST_FRAME_LEN {
            return Err(DropReason::TooShort { len: data.len() });
        }
        if data[0] != station {
            return Err(DropReason::WrongStation { station: data[0] });
        }
        if !checksum::is_intact(data) {
            return Err(DropReason::CrcMismatch);
        }

        let frame = Self { data };
        debug!(
            "RTU request parsed: station={}, FC={:02X} ({}), len={}",
            data[0],
            frame.function_code(),
            ModbusFunction::description(frame.function_code()),
            data.len()
        );
        Ok(frame)
    }

    #[inline]
    pub fn station(&self) -> SlaveId {
        self.data[0]
    }

    #[inline]
    pub fn function_code(&self) -> u8 {
        self.data[1]
    }

    /// Starting register address (big-endian, bytes 2..4)
    #[inline]
    pub fn address(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Register count (big-endian, bytes 4..6)
    #[inline]
    pub fn count(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// Register values of a write request
    ///
    /// Returns `None` when the bytes between the byte count field and the
    /// CRC cannot hold `count` registers. The byte count field itself is not
    /// consulted.
    pub fn write_values(&self, count: usize) -> Option<impl Iterator<Item = u16> + 'a> {
        let data: &'a [u8] = self.data;
        let payload = data
            .get(WRITE_PAYLOAD_OFFSET..data.len() - RTU_CRC_LEN)?
            .get(..count * 2)?;
        Some(
            payload
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

/// Reusable response buffer
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    data: Vec<u8>,
}

impl ResponseFrame {
    /// Buffer preallocated for `capacity` bytes
    ///
    /// See [`SlaveConfig::response_capacity`](crate::SlaveConfig::response_capacity)
    /// for the size that fits every response a slave can send.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    /// Push u16 in big-endian
    #[inline]
    pub fn push_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    /// Append the CRC and return the finished frame
    pub fn finish(&mut self) -> &[u8] {
        checksum::append(&mut self.data);
        &self.data
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// `station, function, byte_count, values…, crc`
    pub fn encode_read_response(
        &mut self,
        station: SlaveId,
        function: ModbusFunction,
        values: &[u16],
    ) -> &[u8] {
        self.clear();
        self.push(station);
        self.push(function.to_u8());
        self.push((values.len() * 2) as u8);
        for &value in values {
            self.push_u16(value);
        }
        self.finish()
    }

    /// `station, function, address, count, crc`
    pub fn encode_write_ack(
        &mut self,
        station: SlaveId,
        function: ModbusFunction,
        address: u16,
        count: u16,
    ) -> &[u8] {
        self.clear();
        self.push(station);
        self.push(function.to_u8());
        self.push_u16(address);
        self.push_u16(count);
        self.finish()
    }

    /// `station, function | 0x80, exception, crc`
    ///
    /// Takes the raw function code so unsupported functions can be restated.
    pub fn encode_exception(
        &mut self,
        station: SlaveId,
        function_code: u8,
        exception: ModbusException,
    ) -> &[u8] {
        self.clear();
        self.push(station);
        self.push(function_code | EXCEPTION_FUNCTION_MASK);
        self.push(exception.to_u8());
        self.finish()
    }
}
