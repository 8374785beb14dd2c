//! Modbus RTU slave frame processor
//!
//! [`RtuSlave`] takes one already-delimited RTU frame at a time and answers
//! through a [`ResponseSink`]. Each call to [`RtuSlave::process`] is a
//! complete transaction:
//!
//! ```text
//! validate ──drop──────────────────────────────► (no response)
//!    │
//! decode ──unsupported FC──────────────────────► exception 0x01
//!    │   ──count > capacity───────────────────► exception 0x02
//!    │
//! match binding ──none─────────────────────────► exception 0x02
//!    │
//! execute ──FC03──► read response (even if an accessor fails part way)
//!         ──FC16──► write acknowledgement (even if an accessor fails part way)
//! ```
//!
//! Serial I/O, inter-frame silence detection and turnaround delays belong to
//! the caller. The slave owns its scratch buffers, and `process` takes
//! `&mut self`, so two contexts can only share a slave through external
//! synchronisation.
//!
//! # Example
//!
//! ```rust
//! use modbus_rtu_slave::{checksum, ProcessOutcome, RegisterBinding, RtuSlave, SlaveConfig};
//!
//! let mut sent = Vec::new();
//! let mut slave = RtuSlave::new(SlaveConfig::new(0x11), |frame: &[u8]| {
//!     sent.push(frame.to_vec())
//! })
//! .unwrap();
//! slave
//!     .register(RegisterBinding::new(0x0000, 4).with_read_fn(|address| Ok(address * 10)))
//!     .unwrap();
//!
//! let mut request = vec![0x11, 0x03, 0x00, 0x00, 0x00, 0x02];
//! checksum::append(&mut request);
//!
//! let outcome = slave.process(&request);
//! assert_eq!(outcome, ProcessOutcome::ReadResponse { address: 0, count: 2 });
//! drop(slave);
//! assert_eq!(&sent[0][..7], &[0x11, 0x03, 0x04, 0x00, 0x00, 0x00, 0x0A]);
//! ```

use tracing::{debug, trace, warn};

use crate::config::SlaveConfig;
use crate::error::SlaveResult;
use crate::frame::{DropReason, RequestFrame, ResponseFrame};
use crate::protocol::{ModbusException, ModbusFunction, SlaveId};
use crate::register::{RegisterBinding, RegisterMap};

/// Destination for outgoing frames
///
/// Called at most once per processed request, with a complete frame
/// including its CRC.
pub trait ResponseSink {
    fn respond(&mut self, frame: &[u8]);
}

impl<F> ResponseSink for F
where
    F: FnMut(&[u8]),
{
    fn respond(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// Terminal outcome of one `process` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcessOutcome {
    /// Framing error, nothing was sent
    Dropped(DropReason),
    /// Exception response sent for `function_code`
    Exception {
        function_code: u8,
        exception: ModbusException,
    },
    /// FC03 response sent
    ReadResponse { address: u16, count: u16 },
    /// FC16 acknowledgement sent
    WriteAck { address: u16, count: u16 },
}

impl ProcessOutcome {
    /// Whether the sink was invoked
    #[inline]
    pub fn responded(&self) -> bool {
        !matches!(self, Self::Dropped(_))
    }
}

/// Slave statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlaveStats {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub responses_sent: u64,
    pub exceptions_sent: u64,
    /// Register accessor calls that returned an error
    pub accessor_failures: u64,
}

/// Modbus RTU slave
pub struct RtuSlave<S> {
    config: SlaveConfig,
    registers: RegisterMap,
    /// Decoded register values of the current read; never cleared
    stream_registers: Vec<u16>,
    response: ResponseFrame,
    sink: S,
    stats: SlaveStats,
}

impl<S: ResponseSink> RtuSlave<S> {
    /// Create a slave with scratch buffers sized from `config`
    pub fn new(config: SlaveConfig, sink: S) -> SlaveResult<Self> {
        config.validate()?;

        debug!(
            "RTU slave created: station={}, max_stream_registers={}",
            config.station_address, config.max_stream_registers
        );

        Ok(Self {
            config,
            registers: RegisterMap::new(),
            stream_registers: vec![0; config.max_stream_registers],
            response: ResponseFrame::with_capacity(config.response_capacity()),
            sink,
            stats: SlaveStats::default(),
        })
    }

    /// Append a register binding
    ///
    /// Bindings are matched in the order they were registered. A binding
    /// with an empty range, a range running past 0xFFFF, or no accessors is
    /// rejected and not stored.
    pub fn register(&mut self, binding: RegisterBinding) -> SlaveResult<()> {
        self.registers.push(binding)
    }

    #[inline]
    pub fn station_address(&self) -> SlaveId {
        self.config.station_address
    }

    #[inline]
    pub fn config(&self) -> &SlaveConfig {
        &self.config
    }

    #[inline]
    pub fn registers(&self) -> &RegisterMap {
        &self.registers
    }

    #[inline]
    pub fn stats(&self) -> &SlaveStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SlaveStats::default();
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one RTU frame, answering through the sink at most once
    pub fn process(&mut self, frame: &[u8]) -> ProcessOutcome {
        self.stats.frames_processed += 1;
        trace!("RTU frame received: {}", format_hex(frame));

        let request = match RequestFrame::parse(frame, self.config.station_address) {
            Ok(request) => request,
            Err(reason) => {
                self.stats.frames_dropped += 1;
                debug!("RTU frame dropped: {}", reason);
                return ProcessOutcome::Dropped(reason);
            }
        };

        let function_code = request.function_code();
        let Some(function) = ModbusFunction::from_u8(function_code) else {
            return self.send_exception(function_code, ModbusException::IllegalFunction);
        };

        let address = request.address();
        let count = request.count();
        if usize::from(count) > self.config.max_stream_registers {
            debug!(
                "Request count {} exceeds capacity {}",
                count, self.config.max_stream_registers
            );
            return self.send_exception(function_code, ModbusException::IllegalDataAddress);
        }

        match function {
            ModbusFunction::ReadHoldingRegisters => self.read_holding_registers(address, count),
            ModbusFunction::WriteMultipleRegisters => {
                self.write_multiple_registers(&request, address, count)
            }
        }
    }

    fn read_holding_registers(&mut self, address: u16, count: u16) -> ProcessOutcome {
        let function = ModbusFunction::ReadHoldingRegisters;
        let len = usize::from(count);

        let Some(binding) = self.registers.find_mut(address, count, function.access()) else {
            return self.send_exception(function.to_u8(), ModbusException::IllegalDataAddress);
        };

        // An accessor failure ends collection; the remaining slots keep
        // whatever an earlier request left there and are sent anyway.
        for (offset, slot) in self.stream_registers[..len].iter_mut().enumerate() {
            let register = address + offset as u16;
            match binding.read(register) {
                Ok(value) => {
                    trace!("Read 0x{:04X} -> 0x{:04X}", register, value);
                    *slot = value;
                }
                Err(e) => {
                    warn!("Read accessor failed, sending partial response: {}", e);
                    self.stats.accessor_failures += 1;
                    break;
                }
            }
        }

        let frame = self.response.encode_read_response(
            self.config.station_address,
            function,
            &self.stream_registers[..len],
        );
        emit(&mut self.sink, frame);
        self.stats.responses_sent += 1;

        ProcessOutcome::ReadResponse { address, count }
    }

    fn write_multiple_registers(
        &mut self,
        request: &RequestFrame<'_>,
        address: u16,
        count: u16,
    ) -> ProcessOutcome {
        let function = ModbusFunction::WriteMultipleRegisters;
        let values = request.write_values(usize::from(count));

        let exception = match (
            self.registers.find_mut(address, count, function.access()),
            values,
        ) {
            (None, _) => Some(ModbusException::IllegalDataAddress),
            (Some(_), None) => Some(ModbusException::IllegalDataValue),
            (Some(binding), Some(values)) => {
                // The acknowledgement goes out even when a write fails
                for (offset, value) in values.enumerate() {
                    let register = address + offset as u16;
                    if let Err(e) = binding.write(register, value) {
                        warn!("Write accessor failed, acknowledging anyway: {}", e);
                        self.stats.accessor_failures += 1;
                        break;
                    }
                    trace!("Write 0x{:04X} <- 0x{:04X}", register, value);
                }
                None
            }
        };

        if let Some(exception) = exception {
            return self.send_exception(function.to_u8(), exception);
        }

        let frame =
            self.response
                .encode_write_ack(self.config.station_address, function, address, count);
        emit(&mut self.sink, frame);
        self.stats.responses_sent += 1;

        ProcessOutcome::WriteAck { address, count }
    }

    fn send_exception(&mut self, function_code: u8, exception: ModbusException) -> ProcessOutcome {
        debug!(
            "Exception response: FC={:02X} ({}), {}",
            function_code,
            ModbusFunction::description(function_code),
            exception
        );

        let frame =
            self.response
                .encode_exception(self.config.station_address, function_code, exception);
        emit(&mut self.sink, frame);
        self.stats.exceptions_sent += 1;

        ProcessOutcome::Exception {
            function_code,
            exception,
        }
    }
}

fn emit<S: ResponseSink>(sink: &mut S, frame: &[u8]) {
    debug!("RTU response sent: {}", format_hex(frame));
    sink.respond(frame);
}

/// Format raw bytes as hex string for packet logging
fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::RegisterBank;
    use crate::checksum;
    use crate::error::SlaveError;

    /// Records every frame handed to the sink
    #[derive(Debug, Default)]
    struct Recorder(Vec<Vec<u8>>);

    impl ResponseSink for Recorder {
        fn respond(&mut self, frame: &[u8]) {
            self.0.push(frame.to_vec());
        }
    }

    fn recording_slave(station: u8, max: usize) -> RtuSlave<Recorder> {
        RtuSlave::new(
            SlaveConfig::new(station).with_max_stream_registers(max),
            Recorder::default(),
        )
        .unwrap()
    }

    fn request(bytes: &[u8]) -> Vec<u8> {
        let mut frame = bytes.to_vec();
        checksum::append(&mut frame);
        frame
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = RtuSlave::new(SlaveConfig::new(0), Recorder::default());
        assert!(matches!(result, Err(SlaveError::Configuration { .. })));
    }

    #[test]
    fn test_scratch_buffers_sized_from_config() {
        let slave = recording_slave(1, 10);
        assert_eq!(slave.stream_registers.len(), 10);
        assert!(slave.response.capacity() >= slave.config().response_capacity());
        assert!(slave.response.capacity() >= 25);
    }

    #[test]
    fn test_register_rejects_invalid_binding() {
        let mut slave = recording_slave(1, 4);
        assert!(slave.register(RegisterBinding::new(0, 0).with_read_fn(|_| Ok(0))).is_err());
        assert!(slave.register(RegisterBinding::new(0, 4)).is_err());
        assert!(slave.registers().is_empty());
    }

    #[test]
    fn test_dropped_frames_are_counted() {
        let mut slave = recording_slave(1, 4);
        let outcome = slave.process(&[0x01, 0x03]);

        assert_eq!(outcome, ProcessOutcome::Dropped(DropReason::TooShort { len: 2 }));
        assert!(!outcome.responded());
        assert_eq!(slave.stats().frames_dropped, 1);
        assert!(slave.sink().0.is_empty());
    }

    #[test]
    fn test_capacity_exception_keeps_requested_function() {
        let mut slave = recording_slave(1, 2);
        slave
            .register(RegisterBinding::new(0, 10).with_write_fn(|_, _| Ok(())))
            .unwrap();

        let outcome = slave.process(&request(&[
            0x01, 0x10, 0x00, 0x00, 0x00, 0x03, 0x06, 0, 1, 0, 2, 0, 3,
        ]));

        assert_eq!(
            outcome,
            ProcessOutcome::Exception {
                function_code: 0x10,
                exception: ModbusException::IllegalDataAddress,
            }
        );
        assert_eq!(&slave.sink().0[0][..3], &[0x01, 0x90, 0x02]);
    }

    #[test]
    fn test_read_failure_keeps_stale_scratch_values() {
        let bank = RegisterBank::from_values(0, vec![7, 8, 9]);
        let mut slave = recording_slave(1, 4);
        slave
            .register(RegisterBinding::new(0, 3).with_read(bank.clone()))
            .unwrap();
        slave
            .register(RegisterBinding::new(10, 3).with_read_fn(|address| {
                if address == 11 {
                    Err(SlaveError::access(address, "sensor offline"))
                } else {
                    Ok(100)
                }
            }))
            .unwrap();

        slave.process(&request(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x03]));
        let outcome = slave.process(&request(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x03]));

        // Register 10 read fresh, 11 failed, 12 never read: 8 and 9 are stale
        assert_eq!(outcome, ProcessOutcome::ReadResponse { address: 10, count: 3 });
        assert_eq!(
            &slave.sink().0[1][..9],
            &[0x01, 0x03, 0x06, 0x00, 100, 0x00, 8, 0x00, 9]
        );
        assert_eq!(slave.stats().accessor_failures, 1);
    }

    #[test]
    fn test_truncated_write_payload_is_illegal_data_value() {
        let bank = RegisterBank::new(0, 4);
        let mut slave = recording_slave(1, 4);
        slave
            .register(RegisterBinding::new(0, 4).with_write(bank.clone()))
            .unwrap();

        let outcome = slave.process(&request(&[
            0x01, 0x10, 0x00, 0x00, 0x00, 0x02, 0x04, 0x00, 0x05,
        ]));

        assert_eq!(
            outcome,
            ProcessOutcome::Exception {
                function_code: 0x10,
                exception: ModbusException::IllegalDataValue,
            }
        );
        assert_eq!(bank.snapshot(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_count_read_answers_with_empty_payload() {
        let mut slave = recording_slave(1, 4);
        slave
            .register(RegisterBinding::new(0, 4).with_read_fn(|_| Ok(1)))
            .unwrap();

        let outcome = slave.process(&request(&[0x01, 0x03, 0x00, 0x01, 0x00, 0x00]));

        assert_eq!(outcome, ProcessOutcome::ReadResponse { address: 1, count: 0 });
        assert_eq!(slave.sink().0[0].len(), 5);
        assert_eq!(&slave.sink().0[0][..3], &[0x01, 0x03, 0x00]);
    }

    #[test]
    fn test_stats_track_outcomes() {
        let mut slave = recording_slave(1, 4);
        slave
            .register(RegisterBinding::new(0, 4).with_read_fn(|_| Ok(1)))
            .unwrap();

        slave.process(&request(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]));
        slave.process(&request(&[0x01, 0x06, 0x00, 0x00, 0x00, 0x01]));
        slave.process(&request(&[0x02, 0x03, 0x00, 0x00, 0x00, 0x01]));

        let stats = slave.stats().clone();
        assert_eq!(stats.frames_processed, 3);
        assert_eq!(stats.responses_sent, 1);
        assert_eq!(stats.exceptions_sent, 1);
        assert_eq!(stats.frames_dropped, 1);

        slave.reset_stats();
        assert_eq!(slave.stats(), &SlaveStats::default());
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x01, 0xAB, 0x00]), "01 AB 00");
        assert_eq!(format_hex(&[]), "");
    }
}
