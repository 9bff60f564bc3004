//! RTCM 10403.3 message helpers: length/message-number extraction and
//! whole-message validation, layered on top of the CRC-24Q primitive in
//! [`crate::checksum`]. The framer ([`crate::framer::RtcmFramer`]) already
//! validates the CRC while extracting a message byte-by-byte; these helpers
//! exist for callers that receive an already-framed buffer (e.g. off a
//! [`crate::datagram::Datagram`]) and need to re-derive its metadata without
//! re-running the whole state machine.

use crate::checksum::crc24q;
use crate::constants::{RTCM_CRC_LEN, RTCM_HEADER_SIZE, RTCM_LENGTH_MASK};

/// A minimum-length (6-byte) RTCM frame with zero-length payload: preamble
/// `0xD3`, reserved+length word `0x00 0x00`, CRC-24Q of those three bytes.
/// Used to punch NAT holes and signal liveness between cooperating
/// instances.
pub const KEEPALIVE: [u8; 6] = [0xd3, 0x00, 0x00, 0x47, 0xea, 0x4b];

/// Extracts the 10-bit payload length from the 2-byte big-endian length
/// word at offset 1 and returns the total framed size: header (3) + payload
/// + CRC (3). Returns `None` if `buf` is too short to hold the header.
pub fn length(buf: &[u8]) -> Option<usize> {
    if buf.len() < RTCM_HEADER_SIZE {
        return None;
    }
    let word = u16::from_be_bytes([buf[1], buf[2]]) & RTCM_LENGTH_MASK;
    Some(RTCM_HEADER_SIZE + usize::from(word) + RTCM_CRC_LEN)
}

/// Extracts the message number: the first 12 bits of the payload, i.e. of
/// the 2 bytes immediately following the 3-byte header. A zero-length
/// payload (as in [`KEEPALIVE`]) reports message number `0`, its
/// conventional value. Returns `None` only if `buf` is too short to hold
/// the framed size `length()` computed.
pub fn message_number(buf: &[u8]) -> Option<u16> {
    let total = length(buf)?;
    if buf.len() < total {
        return None;
    }
    let payload = &buf[RTCM_HEADER_SIZE..total - RTCM_CRC_LEN];
    if payload.len() < 2 {
        return Some(0);
    }
    Some(u16::from_be_bytes([payload[0], payload[1]]) >> 4)
}

/// Recomputes the CRC-24Q over `header + payload` and compares it against
/// the trailing three bytes. Returns `false` on any length mismatch as well
/// as on a CRC mismatch.
pub fn validate(buf: &[u8]) -> bool {
    let Some(total) = length(buf) else {
        return false;
    };
    if buf.len() != total {
        return false;
    }
    let body = &buf[..total - RTCM_CRC_LEN];
    let trailer = &buf[total - RTCM_CRC_LEN..total];
    let expected = crc24q(body);
    let got = (u32::from(trailer[0]) << 16) | (u32::from(trailer[1]) << 8) | u32::from(trailer[2]);
    expected == got
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_length_is_six() {
        assert_eq!(length(&KEEPALIVE), Some(6));
    }

    #[test]
    fn keepalive_message_number_is_zero_per_scenario_5() {
        assert_eq!(message_number(&KEEPALIVE), Some(0));
    }

    #[test]
    fn keepalive_validates() {
        assert!(validate(&KEEPALIVE));
    }

    #[test]
    fn corrupted_keepalive_fails_validation() {
        let mut bad = KEEPALIVE;
        bad[5] ^= 0xff;
        assert!(!validate(&bad));
    }

    #[test]
    fn message_number_extracts_top_twelve_bits() {
        // length=2, payload bytes encode message number 1005 (0x3ED) in the
        // top 12 bits: 0x3ED << 4 = 0x3ED0.
        let mut buf = vec![0xd3, 0x00, 0x02, 0x3e, 0xd0];
        let crc = crc24q(&buf);
        buf.push((crc >> 16) as u8);
        buf.push((crc >> 8) as u8);
        buf.push(crc as u8);
        assert_eq!(length(&buf), Some(8));
        assert_eq!(message_number(&buf), Some(1005));
        assert!(validate(&buf));
    }
}
