pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;
pub(crate) const UBX_SYNC_SIZE: usize = 2;
pub(crate) const UBX_PAYLOAD_SIZE_LEN: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_HEADER_LEN: usize =
    UBX_SYNC_SIZE + UBX_PAYLOAD_SIZE_LEN + UBX_CLASS_LEN + UBX_ID_LEN;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

pub(crate) const UBX_CLASS_OFFSET: usize = 2; // After SYNC_CHAR_1, SYNC_CHAR_2
pub(crate) const UBX_MSG_ID_OFFSET: usize = 3; // After CLASS

pub const NMEA_SYNC_CHAR: u8 = 0x24; // '$'
pub const NMEA_ALT_SYNC_CHAR: u8 = 0x21; // '!' (encapsulation sentences)
pub const NMEA_END_CHAR_1: u8 = 0x0d; // '\r' (<CR>)
pub const NMEA_END_CHAR_2: u8 = 0x0a; // '\n' (<LF>)
/// Shortest legal sentence: `$` + 2-char talker + 3-char message + `*HH` + `<CR><LF>`.
pub const NMEA_MIN_SENTENCE_LEN: usize = 9;

pub const RTCM_SYNC_CHAR: u8 = 0xd3;
pub(crate) const RTCM_HEADER_SIZE: usize = 3; // sync char (1) + length field (2)
pub(crate) const RTCM_LENGTH_MASK: u16 = 0x03ff; // 10 bits for length (6 bits reserved)
pub(crate) const RTCM_CRC_LEN: usize = 3;
pub const RTCM_MIN_FRAME_LEN: usize = RTCM_HEADER_SIZE + RTCM_CRC_LEN; // 6-byte keepalive

/// Largest framed unit of each protocol, per the wire-format budget in use on cooperating
/// receivers: 512-byte NMEA sentences, 1024-byte UBX payloads, 1029-byte RTCM messages.
pub const NMEA_MAX_FRAME_LEN: usize = 512;
pub const UBX_MAX_FRAME_LEN: usize = 1024;
pub const RTCM_MAX_FRAME_LEN: usize = 1029;

/// Largest payload the datagram envelope (`crate::datagram`) ever has to carry.
pub const DATAGRAM_MAX_PAYLOAD_LEN: usize = {
    let a = if NMEA_MAX_FRAME_LEN > UBX_MAX_FRAME_LEN {
        NMEA_MAX_FRAME_LEN
    } else {
        UBX_MAX_FRAME_LEN
    };
    if a > RTCM_MAX_FRAME_LEN {
        a
    } else {
        RTCM_MAX_FRAME_LEN
    }
};
