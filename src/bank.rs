//! In-memory holding register storage
//!
//! [`RegisterBank`] is a shared block of registers that implements both
//! accessor traits, so one bank can back the read and the write side of a
//! binding and writes become visible to later reads. Clones share storage.
//!
//! ```rust
//! use modbus_rtu_slave::{RegisterBank, RegisterBinding};
//!
//! let bank = RegisterBank::new(0x0100, 8);
//! let binding = RegisterBinding::new(bank.base_address(), bank.len() as u16)
//!     .with_read(bank.clone())
//!     .with_write(bank.clone());
//!
//! bank.set(0x0101, 42).unwrap();
//! assert_eq!(bank.get(0x0101).unwrap(), 42);
//! # drop(binding);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::error::{SlaveError, SlaveResult};
use crate::register::{Readable, Writable};

/// Shared block of holding registers starting at `base_address`
#[derive(Debug, Clone)]
pub struct RegisterBank {
    base_address: u16,
    registers: Arc<Mutex<Vec<u16>>>,
}

impl RegisterBank {
    /// Zero-initialised bank of `count` registers
    pub fn new(base_address: u16, count: usize) -> Self {
        Self::from_values(base_address, vec![0; count])
    }

    pub fn from_values(base_address: u16, values: Vec<u16>) -> Self {
        Self {
            base_address,
            registers: Arc::new(Mutex::new(values)),
        }
    }

    #[inline]
    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    pub fn len(&self) -> usize {
        self.lock().map(|registers| registers.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, address: u16) -> SlaveResult<u16> {
        let index = self.index(address)?;
        let registers = self.lock_at(address)?;
        registers
            .get(index)
            .copied()
            .ok_or_else(|| out_of_range(address))
    }

    pub fn set(&self, address: u16, value: u16) -> SlaveResult<()> {
        let index = self.index(address)?;
        let mut registers = self.lock_at(address)?;
        let slot = registers
            .get_mut(index)
            .ok_or_else(|| out_of_range(address))?;
        *slot = value;
        Ok(())
    }

    /// Copy of all register values
    pub fn snapshot(&self) -> Vec<u16> {
        self.lock()
            .map(|registers| registers.clone())
            .unwrap_or_default()
    }

    fn index(&self, address: u16) -> SlaveResult<usize> {
        address
            .checked_sub(self.base_address)
            .map(usize::from)
            .ok_or_else(|| out_of_range(address))
    }

    fn lock(&self) -> Option<MutexGuard<'_, Vec<u16>>> {
        self.registers.lock().ok()
    }

    fn lock_at(&self, address: u16) -> SlaveResult<MutexGuard<'_, Vec<u16>>> {
        self.lock()
            .ok_or_else(|| SlaveError::access(address, "register bank lock poisoned"))
    }
}

fn out_of_range(address: u16) -> SlaveError {
    SlaveError::access(address, "address outside register bank")
}

impl Readable for RegisterBank {
    fn read(&mut self, address: u16) -> SlaveResult<u16> {
        let value = self.get(address)?;
        trace!("Bank read: 0x{:04X} -> 0x{:04X}", address, value);
        Ok(value)
    }
}

impl Writable for RegisterBank {
    fn write(&mut self, address: u16, value: u16) -> SlaveResult<()> {
        self.set(address, value)?;
        trace!("Bank write: 0x{:04X} <- 0x{:04X}", address, value);
        Ok(())
    }
}
