//! Typed Modbus function and exception codes
//!
//! Only the holding register subset is served: FC03 and FC16. Anything else
//! is answered with [`ModbusException::IllegalFunction`].

use std::fmt;

use crate::constants::{
    EXCEPTION_ILLEGAL_DATA_ADDRESS, EXCEPTION_ILLEGAL_DATA_VALUE, EXCEPTION_ILLEGAL_FUNCTION,
    FC_READ_HOLDING_REGISTERS, FC_WRITE_MULTIPLE_REGISTERS,
};

/// Station (slave) address
pub type SlaveId = u8;

/// Which accessor a request needs from a register binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
}

/// Function codes served by the slave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModbusFunction {
    /// FC03
    ReadHoldingRegisters,
    /// FC16
    WriteMultipleRegisters,
}

impl ModbusFunction {
    /// Decode a function code, `None` for anything the slave does not serve
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            FC_READ_HOLDING_REGISTERS => Some(Self::ReadHoldingRegisters),
            FC_WRITE_MULTIPLE_REGISTERS => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => FC_READ_HOLDING_REGISTERS,
            Self::WriteMultipleRegisters => FC_WRITE_MULTIPLE_REGISTERS,
        }
    }

    /// Accessor a binding must provide to serve this function
    #[inline]
    pub fn access(self) -> Access {
        match self {
            Self::ReadHoldingRegisters => Access::Read,
            Self::WriteMultipleRegisters => Access::Write,
        }
    }

    /// Get human-readable function code description
    pub fn description(code: u8) -> &'static str {
        match code & 0x7F {
            0x01 => "Read Coils",
            0x02 => "Read Discrete Inputs",
            0x03 => "Read Holding Registers",
            0x04 => "Read Input Registers",
            0x05 => "Write Single Coil",
            0x06 => "Write Single Register",
            0x0F => "Write Multiple Coils",
            0x10 => "Write Multiple Registers",
            0x17 => "Read/Write Multiple Registers",
            _ => "Unknown Function",
        }
    }
}

/// Exception codes the slave can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModbusException {
    /// 0x01: function code not served
    IllegalFunction,
    /// 0x02: range not covered by a binding, or larger than the slave capacity
    IllegalDataAddress,
    /// 0x03: request payload shorter than its register count
    IllegalDataValue,
}

impl ModbusException {
    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => EXCEPTION_ILLEGAL_FUNCTION,
            Self::IllegalDataAddress => EXCEPTION_ILLEGAL_DATA_ADDRESS,
            Self::IllegalDataValue => EXCEPTION_ILLEGAL_DATA_VALUE,
        }
    }
}

impl fmt::Display for ModbusException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IllegalFunction => "Illegal Function",
            Self::IllegalDataAddress => "Illegal Data Address",
            Self::IllegalDataValue => "Illegal Data Value",
        };
        write!(f, "{} (0x{:02X})", name, self.to_u8())
    }
}
