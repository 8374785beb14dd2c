//! Modbus CRC16 engine
//!
//! CRC-16/MODBUS: reflected polynomial 0xA001, initial value 0xFFFF, no final
//! xor. The checksum is transmitted low byte first, which makes the CRC over
//! an intact frame (trailer included) come out as zero.

use ::crc::{Crc, CRC_16_MODBUS};

use crate::constants::RTU_CRC_LEN;

/// CRC calculator for RTU
const CRC_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the Modbus CRC16 of `data`
#[inline]
pub fn compute(data: &[u8]) -> u16 {
    CRC_MODBUS.checksum(data)
}

/// Check a complete frame whose last two bytes are its CRC
#[inline]
pub fn is_intact(frame: &[u8]) -> bool {
    frame.len() >= RTU_CRC_LEN && compute(frame) == 0
}

/// Append the CRC of `buf` to `buf`, low byte first
#[inline]
pub fn append(buf: &mut Vec<u8>) {
    let crc = compute(buf);
    buf.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Shift-and-xor loop the table driven engine must agree with
    fn reference_crc(data: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for &byte in data {
            crc ^= u16::from(byte);
            for _ in 0..8 {
                if crc & 0x0001 != 0 {
                    crc = (crc >> 1) ^ 0xA001;
                } else {
                    crc >>= 1;
                }
            }
        }
        crc
    }

    #[test]
    fn test_canonical_vector() {
        let crc = compute(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(crc, 0x0A84);
        assert_eq!(crc.to_le_bytes(), [0x84, 0x0A]);
    }

    #[test]
    fn test_specification_example_frame() {
        // Read 3 holding registers at 0x006B from station 0x11
        let frame = [0x11, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x76, 0x87];
        assert_eq!(compute(&frame[..6]), 0x8776);
        assert!(is_intact(&frame));
    }

    #[test]
    fn test_corrupted_frame_is_not_intact() {
        let mut frame = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        append(&mut frame);
        assert!(is_intact(&frame));

        frame[7] ^= 0x01;
        assert!(!is_intact(&frame));
    }

    #[test]
    fn test_short_input_is_not_intact() {
        assert!(!is_intact(&[]));
        assert!(!is_intact(&[0x00]));
    }

    proptest! {
        #[test]
        fn prop_matches_reference(data in proptest::collection::vec(any::<u8>(), 0..300)) {
            prop_assert_eq!(compute(&data), reference_crc(&data));
        }

        #[test]
        fn prop_appended_frame_has_zero_residue(data in proptest::collection::vec(any::<u8>(), 0..300)) {
            let mut frame = data.clone();
            append(&mut frame);
            prop_assert_eq!(frame.len(), data.len() + RTU_CRC_LEN);
            prop_assert_eq!(compute(&frame), 0);
            prop_assert!(is_intact(&frame));
        }
    }
}
