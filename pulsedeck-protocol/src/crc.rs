//! Frame integrity check
//!
//! CRC-8 with polynomial 0x07, initial value 0x00, no reflection and no
//! final XOR (catalogued as CRC-8/SMBUS). It covers LENGTH, TYPE and
//! PAYLOAD; the START byte is excluded.

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Compute the checksum byte for a frame's header fields and payload
pub fn frame_crc(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
    let mut digest = CRC8.digest();
    digest.update(&[length, msg_type]);
    digest.update(payload);
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_check_value() {
        assert_eq!(CRC8.checksum(b"123456789"), 0xF4);
    }

    #[test]
    fn test_single_bit_is_polynomial() {
        // 0x01 shifted through eight rounds leaves exactly the polynomial
        assert_eq!(CRC8.checksum(&[0x01]), 0x07);
        assert_eq!(CRC8.checksum(&[0x00]), 0x00);
    }

    #[test]
    fn test_frame_crc_matches_contiguous_checksum() {
        let payload = [0x10, 0x20, 0x30];
        let contiguous = CRC8.checksum(&[3, 0x07, 0x10, 0x20, 0x30]);
        assert_eq!(frame_crc(3, 0x07, &payload), contiguous);
    }
}
