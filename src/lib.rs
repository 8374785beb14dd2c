//! # Modbus RTU Slave - Holding Register Frame Processor
//!
//! **License:** MIT
//!
//! A Modbus RTU slave core in pure Rust: it takes one already-delimited RTU
//! frame, validates it, serves it from a configurable map of holding register
//! ranges and hands a CRC-terminated response to a sink.
//!
//! ## Features
//!
//! - **Allocation-free steady state**: scratch buffers sized once from the
//!   configuration and reused for every frame
//! - **Correct RTU silence**: frames for other stations, short frames and CRC
//!   failures are never answered
//! - **Deterministic register map**: first-match-wins in registration order
//! - **Pluggable accessors**: closures or any type implementing
//!   [`Readable`] / [`Writable`], plus a shared in-memory [`RegisterBank`]
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Slave |
//! |------|----------|-------|
//! | 0x03 | Read Holding Registers | ✅ |
//! | 0x10 | Write Multiple Registers | ✅ |
//!
//! Every other function code is answered with exception 0x01.
//!
//! ## Quick Start
//!
//! ```rust
//! use modbus_rtu_slave::{
//!     checksum, RegisterBank, RegisterBinding, RtuSlave, SlaveConfig, SlaveResult,
//! };
//!
//! fn main() -> SlaveResult<()> {
//!     let bank = RegisterBank::new(0x0000, 16);
//!
//!     let mut slave = RtuSlave::new(SlaveConfig::new(0x11), |frame: &[u8]| {
//!         // write `frame` to the serial port
//!         println!("TX {:02X?}", frame);
//!     })?;
//!     slave.register(
//!         RegisterBinding::new(0x0000, 16)
//!             .with_read(bank.clone())
//!             .with_write(bank.clone()),
//!     )?;
//!
//!     // One frame, as delimited by the serial driver
//!     let mut request = vec![0x11, 0x03, 0x00, 0x00, 0x00, 0x02];
//!     checksum::append(&mut request);
//!     slave.process(&request);
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Modbus protocol constants based on official specification
pub mod constants;

/// Typed function and exception codes
pub mod protocol;

/// Modbus CRC16 engine
pub mod checksum;

/// RTU request decoding and response encoding
pub mod frame;

/// Register bindings, accessor traits and the ordered register map
pub mod register;

/// Shared in-memory register storage
pub mod bank;

/// Slave configuration
pub mod config;

/// The frame processor
pub mod slave;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Core slave API ===
pub use slave::{ProcessOutcome, ResponseSink, RtuSlave, SlaveStats};

// === Error handling ===
pub use error::{SlaveError, SlaveResult};

// === Core types ===
pub use config::SlaveConfig;
pub use frame::{DropReason, RequestFrame, ResponseFrame};
pub use protocol::{Access, ModbusException, ModbusFunction, SlaveId};
pub use register::{Readable, RegisterBinding, RegisterMap, Writable};

// === Storage ===
pub use bank::RegisterBank;

// === Protocol limits (commonly needed constants) ===
pub use constants::{FC_READ_HOLDING_REGISTERS, FC_WRITE_MULTIPLE_REGISTERS, MAX_READ_REGISTERS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
