#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modbus_rtu_slave::{checksum, RegisterBank, RegisterBinding, RtuSlave, SlaveConfig};

#[derive(Debug, Arbitrary)]
struct Input {
    max_stream_registers: u8,
    bindings: Vec<(u16, u16, bool, bool)>,
    /// Fix up the CRC so most inputs get past the framing checks
    seal: bool,
    frame: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let config = SlaveConfig::new(0x01)
        .with_max_stream_registers(usize::from(input.max_stream_registers) % 126);

    let mut slave = match RtuSlave::new(config, |frame: &[u8]| {
        assert!(checksum::is_intact(frame));
        assert!(frame.len() <= 125 * 2 + 5);
    }) {
        Ok(slave) => slave,
        Err(_) => return,
    };

    for (base, count, read, write) in input.bindings.into_iter().take(8) {
        let bank = RegisterBank::new(base, usize::from(count));
        let mut binding = RegisterBinding::new(base, count);
        if read {
            binding = binding.with_read(bank.clone());
        }
        if write {
            binding = binding.with_write(bank);
        }
        let _ = slave.register(binding);
    }

    let mut frame = input.frame;
    if input.seal {
        if let Some(station) = frame.first_mut() {
            *station = 0x01;
        }
        checksum::append(&mut frame);
    }

    let outcome = slave.process(&frame);
    let stats = slave.stats();
    assert_eq!(stats.frames_processed, 1);
    assert_eq!(
        outcome.responded(),
        stats.responses_sent + stats.exceptions_sent == 1
    );
});
