//! Register bindings and the register map
//!
//! A [`RegisterBinding`] exposes a contiguous range of holding registers
//! through optional [`Readable`] and [`Writable`] accessors. The
//! [`RegisterMap`] keeps bindings in registration order and resolves each
//! request with a linear, first-match-wins scan: when ranges overlap, the
//! binding registered first serves the request.
//!
//! # Example
//!
//! ```rust
//! use modbus_rtu_slave::{RegisterBinding, RegisterMap, Access};
//!
//! let mut map = RegisterMap::new();
//! map.push(RegisterBinding::new(0x0000, 4).with_read_fn(|address| Ok(address * 10)))
//!     .unwrap();
//!
//! let binding = map.find_mut(0x0001, 2, Access::Read).unwrap();
//! assert_eq!(binding.read(0x0002).unwrap(), 20);
//! assert!(map.find_mut(0x0003, 2, Access::Read).is_none());
//! ```

use std::fmt;

use tracing::{debug, warn};

use crate::error::{SlaveError, SlaveResult};
use crate::protocol::Access;

/// Number of addressable holding registers
const ADDRESS_SPACE: u32 = 0x1_0000;

/// Read capability for a register range
pub trait Readable: Send {
    fn read(&mut self, address: u16) -> SlaveResult<u16>;
}

/// Write capability for a register range
pub trait Writable: Send {
    fn write(&mut self, address: u16, value: u16) -> SlaveResult<()>;
}

impl<F> Readable for F
where
    F: FnMut(u16) -> SlaveResult<u16> + Send,
{
    fn read(&mut self, address: u16) -> SlaveResult<u16> {
        self(address)
    }
}

impl<F> Writable for F
where
    F: FnMut(u16, u16) -> SlaveResult<()> + Send,
{
    fn write(&mut self, address: u16, value: u16) -> SlaveResult<()> {
        self(address, value)
    }
}

/// A contiguous range of holding registers: `[base_address, base_address + count)`
pub struct RegisterBinding {
    base_address: u16,
    count: u16,
    reader: Option<Box<dyn Readable>>,
    writer: Option<Box<dyn Writable>>,
}

impl RegisterBinding {
    /// Binding without accessors; add at least one before registering it
    pub fn new(base_address: u16, count: u16) -> Self {
        Self {
            base_address,
            count,
            reader: None,
            writer: None,
        }
    }

    pub fn with_read(mut self, reader: impl Readable + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn with_write(mut self, writer: impl Writable + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Closure form of [`with_read`](Self::with_read)
    pub fn with_read_fn<F>(self, reader: F) -> Self
    where
        F: FnMut(u16) -> SlaveResult<u16> + Send + 'static,
    {
        self.with_read(reader)
    }

    /// Closure form of [`with_write`](Self::with_write)
    pub fn with_write_fn<F>(self, writer: F) -> Self
    where
        F: FnMut(u16, u16) -> SlaveResult<()> + Send + 'static,
    {
        self.with_write(writer)
    }

    #[inline]
    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Whether the accessor needed for `access` is present
    #[inline]
    pub fn supports(&self, access: Access) -> bool {
        match access {
            Access::Read => self.is_readable(),
            Access::Write => self.is_writable(),
        }
    }

    /// Registration rules: non-empty range inside the 16-bit address space
    /// and at least one accessor
    pub fn validate(&self) -> SlaveResult<()> {
        if self.count == 0 {
            return Err(SlaveError::invalid_binding(
                self.base_address,
                "register count must be non-zero",
            ));
        }
        if u32::from(self.base_address) + u32::from(self.count) > ADDRESS_SPACE {
            return Err(SlaveError::invalid_binding(
                self.base_address,
                "register range runs past 0xFFFF",
            ));
        }
        if self.reader.is_none() && self.writer.is_none() {
            return Err(SlaveError::invalid_binding(
                self.base_address,
                "binding needs a read or a write accessor",
            ));
        }
        Ok(())
    }

    /// Whether `[address, address + count)` lies entirely inside this binding
    pub fn contains(&self, address: u16, count: u16) -> bool {
        let start = u32::from(self.base_address);
        let end = start + u32::from(self.count);
        let address = u32::from(address);

        address >= start && address < end && address + u32::from(count) <= end
    }

    /// Read one register through the read accessor
    pub fn read(&mut self, address: u16) -> SlaveResult<u16> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(address),
            None => Err(SlaveError::access(address, "register range is not readable")),
        }
    }

    /// Write one register through the write accessor
    pub fn write(&mut self, address: u16, value: u16) -> SlaveResult<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(address, value),
            None => Err(SlaveError::access(address, "register range is not writable")),
        }
    }
}

impl fmt::Debug for RegisterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterBinding")
            .field("base_address", &self.base_address)
            .field("count", &self.count)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Ordered, append-only collection of register bindings
#[derive(Debug, Default)]
pub struct RegisterMap {
    bindings: Vec<RegisterBinding>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding after validating it
    ///
    /// A rejected binding is not stored.
    pub fn push(&mut self, binding: RegisterBinding) -> SlaveResult<()> {
        if let Err(e) = binding.validate() {
            warn!("Register binding rejected: {}", e);
            return Err(e);
        }

        debug!(
            "Register binding added: base=0x{:04X}, count={}, read={}, write={}",
            binding.base_address,
            binding.count,
            binding.is_readable(),
            binding.is_writable()
        );
        self.bindings.push(binding);
        Ok(())
    }

    /// First binding, in registration order, that fully contains the range
    /// and has the accessor `access` needs
    pub fn find_mut(
        &mut self,
        address: u16,
        count: u16,
        access: Access,
    ) -> Option<&mut RegisterBinding> {
        self.bindings
            .iter_mut()
            .find(|binding| binding.contains(address, count) && binding.supports(access))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterBinding> {
        self.bindings.iter()
    }
}
