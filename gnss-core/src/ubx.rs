//! UBX binary packet parsers. A UBX payload begins at
//! byte offset 6 in a framed buffer (as produced by
//! [`crate::framer::UbxFramer`]): two sync bytes, a class byte, an id byte,
//! and a little-endian 16-bit payload length. Every parser here validates
//! class, id and the exact framed length before touching anything, and
//! byte-swaps every little-endian field at the point it is read; there is
//! no separate "decode then convert" pass.
//!
//! Five of the twelve messages (NAV-HPPOSLLH, MON-HW, NAV-STATUS, NAV-SVIN,
//! RXM-RTCM) feed [`crate::db::Database`] records directly, mirroring the
//! "apply in an all-or-nothing manner" discipline the NMEA sentence parsers
//! in [`crate::nmea`] already follow: fields are fully decoded into locals
//! before anything is written to the destination record. The rest
//! (ACK-ACK/ACK-NAK, CFG-VALGET, MON-VER, MON-COMMS, NAV-ATT, NAV-ODO,
//! NAV-PVT) have no per-system home in the database model and are
//! returned as plain structs for the caller to act on.
//!
//! UBX NAV/MON/RXM solutions are not tagged per-constellation on the wire;
//! a receiver blends every tracked system into one navigation filter, so
//! the five database-mutating parsers below always target
//! [`crate::db::System::Gnss`].

use crate::constants::{UBX_CHECKSUM_LEN, UBX_CLASS_OFFSET, UBX_HEADER_LEN, UBX_MSG_ID_OFFSET};
use crate::db::{BaseSurvey, Database, HardwareMonitor, HighPrecision, NavStatus, Rover, System, DEFAULT_EXPIRY};
use crate::error::{CoreError, CoreResult, Outcome, StructuralErrorKind};

fn wrong_message() -> CoreError {
    CoreError::Structural(StructuralErrorKind::WrongMessage)
}

fn truncated() -> CoreError {
    CoreError::Structural(StructuralErrorKind::Truncated)
}

/// Validates `class`/`id`/length and returns the payload slice (offset 6,
/// exactly `fixed_len` bytes). `buf` may carry a trailing NUL as
/// [`crate::framer::UbxFramer`] appends, or the two checksum bytes only;
/// either is accepted as long as the payload itself is intact.
fn fixed_payload<'a>(buf: &'a [u8], class: u8, id: u8, fixed_len: usize) -> Result<&'a [u8], CoreError> {
    if buf.len() < UBX_HEADER_LEN + UBX_CHECKSUM_LEN {
        return Err(truncated());
    }
    if buf[UBX_CLASS_OFFSET] != class || buf[UBX_MSG_ID_OFFSET] != id {
        return Err(wrong_message());
    }
    let payload_len = u16::from_le_bytes([buf[4], buf[5]]) as usize;
    if payload_len != fixed_len {
        return Err(truncated());
    }
    if buf.len() < UBX_HEADER_LEN + payload_len + UBX_CHECKSUM_LEN {
        return Err(truncated());
    }
    Ok(&buf[UBX_HEADER_LEN..UBX_HEADER_LEN + payload_len])
}

/// Same as [`fixed_payload`] but for messages whose payload length is only
/// bounded below (MON-VER, MON-COMMS, CFG-VALGET's TLV tail).
fn variable_payload<'a>(buf: &'a [u8], class: u8, id: u8, min_len: usize) -> Result<&'a [u8], CoreError> {
    if buf.len() < UBX_HEADER_LEN + UBX_CHECKSUM_LEN {
        return Err(truncated());
    }
    if buf[UBX_CLASS_OFFSET] != class || buf[UBX_MSG_ID_OFFSET] != id {
        return Err(wrong_message());
    }
    let payload_len = u16::from_le_bytes([buf[4], buf[5]]) as usize;
    if payload_len < min_len {
        return Err(truncated());
    }
    if buf.len() < UBX_HEADER_LEN + payload_len + UBX_CHECKSUM_LEN {
        return Err(truncated());
    }
    Ok(&buf[UBX_HEADER_LEN..UBX_HEADER_LEN + payload_len])
}

fn le_i32(p: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}

fn le_u32(p: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}

fn le_u16(p: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([p[at], p[at + 1]])
}

fn le_i16(p: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([p[at], p[at + 1]])
}

/// NAV-HPPOSLLH (class 0x01, id 0x14): high-precision geodetic position.
/// Drops (no error, record untouched) when the `invalidLlh` flag is set.
/// `lat`/`lon` arrive as two components (a coarse 1e-7 degree field and a
/// 1e-9 degree "hp" refinement in `[-99, 99]`) that combine exactly into
/// nanodegrees: `nanodegrees = coarse * 100 + hp`. `height`/`height_msl`
/// combine the same way into tenths-of-a-millimeter (`coarse * 10 + hp`):
/// their hp refinement is a `[-9, 9]` tenths-of-mm remainder, so folding it
/// into whole millimeters would always round it away.
pub fn nav_hp_pos_llh(buf: &[u8], db: &mut Database) -> CoreResult {
    let p = fixed_payload(buf, 0x01, 0x14, 36)?;
    let flags = p[3];
    if flags & 0x01 != 0 {
        return Ok(Outcome::Dropped);
    }
    let lon = le_i32(p, 8);
    let lat = le_i32(p, 12);
    let height = le_i32(p, 16);
    let height_msl = le_i32(p, 20);
    let lon_hp = p[24] as i8;
    let lat_hp = p[25] as i8;
    let height_hp = p[26] as i8;
    let height_msl_hp = p[27] as i8;
    let horizontal_accuracy = le_u32(p, 28);
    let vertical_accuracy = le_u32(p, 32);

    let records = db.get_mut(System::Gnss);
    records.high_precision = HighPrecision {
        lon_nanodegrees: i64::from(lon) * 100 + i64::from(lon_hp),
        lat_nanodegrees: i64::from(lat) * 100 + i64::from(lat_hp),
        height_tenths_mm: height * 10 + i32::from(height_hp),
        height_msl_tenths_mm: height_msl * 10 + i32::from(height_msl_hp),
        horizontal_accuracy_mm: horizontal_accuracy / 10,
        vertical_accuracy_mm: vertical_accuracy / 10,
        invalid: false,
        expiry: DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

/// MON-HW (class 0x0a, id 0x09): hardware/antenna health.
pub fn mon_hw(buf: &[u8], db: &mut Database) -> CoreResult {
    let p = fixed_payload(buf, 0x0a, 0x09, 60)?;
    let noise_level = le_u16(p, 16);
    let agc_count = le_u16(p, 18);
    let ant_status = p[20];
    let ant_power = p[21];
    let jamming_indicator = p[45];

    let records = db.get_mut(System::Gnss);
    records.hardware = HardwareMonitor {
        noise_level,
        agc_count,
        jamming_indicator,
        ant_status,
        ant_power,
        expiry: DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

/// NAV-STATUS (class 0x01, id 0x03): fix validity, TTFF, spoof-detection
/// state. `flags2` packs `psmState` in bits 1:0 and `spoofDetState` in bits
/// 3:2; only the latter is modeled in [`crate::db::NavStatus`].
pub fn nav_status(buf: &[u8], db: &mut Database) -> CoreResult {
    let p = fixed_payload(buf, 0x01, 0x03, 16)?;
    let flags = p[5];
    let flags2 = p[7];
    let ttff_ms = le_u32(p, 8);
    let msss_ms = le_u32(p, 12);

    let records = db.get_mut(System::Gnss);
    records.nav_status = NavStatus {
        fix_valid: flags & 0x01 != 0,
        ttff_ms,
        msss_ms,
        spoof_detection_state: (flags2 >> 2) & 0x03,
        expiry: DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

/// NAV-SVIN (class 0x01, id 0x3b): base-station survey-in progress. The
/// ECEF mean position this message also carries is not represented in
/// [`crate::db::BaseSurvey`] (which tracks only duration, accuracy,
/// observation count, active and valid) and is intentionally not decoded.
pub fn nav_svin(buf: &[u8], db: &mut Database) -> CoreResult {
    let p = fixed_payload(buf, 0x01, 0x3b, 40)?;
    let duration_s = le_u32(p, 4);
    let mean_accuracy_raw = le_u32(p, 28); // 0.1 mm units
    let observations = le_u32(p, 32);
    let valid = p[36] != 0;
    let active = p[37] != 0;

    let records = db.get_mut(System::Gnss);
    records.base_survey = BaseSurvey {
        duration_s,
        mean_accuracy_mm: mean_accuracy_raw / 10,
        observations,
        active,
        valid,
        expiry: DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

/// RXM-RTCM (class 0x02, id 0x32): per-message RTCM reception report on a
/// rover. `flags` bit 0 is `crcFailed`; bits 2:1 are `msgUsed`
/// (0=unknown, 1=notUsed, 2=used, 3=reserved).
pub fn rxm_rtcm(buf: &[u8], db: &mut Database) -> CoreResult {
    let p = fixed_payload(buf, 0x02, 0x32, 8)?;
    let flags = p[1];
    let msg_type = le_u16(p, 6);

    let records = db.get_mut(System::Gnss);
    records.rover = Rover {
        message_number: msg_type,
        crc_failed: flags & 0x01 != 0,
        used: (flags >> 1) & 0x03 == 2,
        expiry: DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

/// Which of the two acknowledgement messages was framed, and which request
/// it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub ack: bool,
    pub request_class: u8,
    pub request_id: u8,
}

/// ACK-ACK (class 0x05, id 0x01) or ACK-NAK (class 0x05, id 0x00), both a
/// 2-byte payload naming the class/id of the request being acknowledged.
pub fn ack(buf: &[u8]) -> Result<Ack, CoreError> {
    if let Ok(p) = fixed_payload(buf, 0x05, 0x01, 2) {
        return Ok(Ack { ack: true, request_class: p[0], request_id: p[1] });
    }
    let p = fixed_payload(buf, 0x05, 0x00, 2)?;
    Ok(Ack { ack: false, request_class: p[0], request_id: p[1] })
}

/// One key/value pair out of a CFG-VALGET response, per the configuration
/// item's own size code (bits 30:28 of the key: 1=1 bit, 2=1 byte, 3=2
/// bytes, 4=4 bytes, 5=8 bytes, stored as the 1/2/4/8 raw bytes regardless).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgValEntry<'a> {
    pub key: u32,
    pub value: &'a [u8],
}

fn cfg_value_size(key: u32) -> Option<usize> {
    match (key >> 28) & 0x7 {
        1 => Some(1), // stored as a whole byte on the wire despite being a single bit
        2 => Some(1),
        3 => Some(2),
        4 => Some(4),
        5 => Some(8),
        _ => None,
    }
}

/// Non-destructive iterator over a CFG-VALGET response's TLV tail. Refuses
/// to advance past the buffer end or past a key whose size code it does not
/// recognize.
pub struct CfgValIter<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for CfgValIter<'a> {
    type Item = CfgValEntry<'a>;

    fn next(&mut self) -> Option<CfgValEntry<'a>> {
        if self.data.len() < 4 {
            return None;
        }
        let key = u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]]);
        let size = cfg_value_size(key)?;
        if self.data.len() < 4 + size {
            return None;
        }
        let value = &self.data[4..4 + size];
        self.data = &self.data[4 + size..];
        Some(CfgValEntry { key, value })
    }
}

/// A CFG-VALGET response (class 0x06, id 0x8b): message version, the
/// configuration layer it was read from, and an iterator over its key/value
/// pairs.
#[derive(Debug, Clone, Copy)]
pub struct CfgValGet<'a> {
    pub version: u8,
    pub layer: u8,
    position: &'a [u8],
}

impl<'a> CfgValGet<'a> {
    pub fn entries(&self) -> CfgValIter<'a> {
        CfgValIter { data: self.position }
    }
}

/// Parses a CFG-VALGET response. The payload must hold at least the
/// 4-byte header (version, layer, 2-byte position); the TLV tail may be
/// empty (zero keys matched).
pub fn cfg_valget(buf: &[u8]) -> Result<CfgValGet<'_>, CoreError> {
    let p = variable_payload(buf, 0x06, 0x8b, 4)?;
    Ok(CfgValGet { version: p[0], layer: p[1], position: &p[4..] })
}

fn cstr(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Non-destructive iterator over a MON-VER response's extension strings,
/// each a 30-byte NUL-terminated chunk.
pub struct MonVerExtensions<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for MonVerExtensions<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let chunk = self.data.get(..30)?;
        self.data = &self.data[30..];
        Some(cstr(chunk))
    }
}

/// MON-VER (class 0x0a, id 0x04): software version, hardware version, and a
/// variable tail of 30-byte extension strings (`"FWVER=..."`,
/// `"PROTVER=..."`, the enabled-constellation list, ...).
#[derive(Debug, Clone, Copy)]
pub struct MonVer<'a> {
    software_version: &'a [u8],
    hardware_version: &'a [u8],
    extensions: &'a [u8],
}

impl<'a> MonVer<'a> {
    pub fn software_version(&self) -> &'a str {
        cstr(self.software_version)
    }

    pub fn hardware_version(&self) -> &'a str {
        cstr(self.hardware_version)
    }

    pub fn extensions(&self) -> MonVerExtensions<'a> {
        MonVerExtensions { data: self.extensions }
    }
}

/// Parses a MON-VER response. The extension tail must be a whole multiple
/// of 30 bytes; a dangling partial chunk is treated as truncated.
pub fn mon_ver(buf: &[u8]) -> Result<MonVer<'_>, CoreError> {
    let p = variable_payload(buf, 0x0a, 0x04, 40)?;
    let extensions = &p[40..];
    if extensions.len() % 30 != 0 {
        return Err(truncated());
    }
    Ok(MonVer { software_version: &p[0..30], hardware_version: &p[30..40], extensions })
}

/// One communication port's traffic counters out of a MON-COMMS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommsPort {
    pub port_id: u16,
    pub tx_pending: u16,
    pub tx_bytes: u32,
    pub tx_usage_pct: u8,
    pub tx_peak_usage_pct: u8,
    pub rx_pending: u16,
    pub rx_bytes: u32,
    pub rx_usage_pct: u8,
    pub rx_peak_usage_pct: u8,
    pub overrun_errors: u16,
    pub skipped_bytes: u32,
}

/// Non-destructive iterator over a MON-COMMS response's 40-byte-per-port
/// tail.
pub struct CommsPorts<'a> {
    data: &'a [u8],
}

impl Iterator for CommsPorts<'_> {
    type Item = CommsPort;

    fn next(&mut self) -> Option<CommsPort> {
        let chunk = self.data.get(..40)?;
        self.data = &self.data[40..];
        Some(CommsPort {
            port_id: le_u16(chunk, 0),
            tx_pending: le_u16(chunk, 2),
            tx_bytes: le_u32(chunk, 4),
            tx_usage_pct: chunk[8],
            tx_peak_usage_pct: chunk[9],
            rx_pending: le_u16(chunk, 10),
            rx_bytes: le_u32(chunk, 12),
            rx_usage_pct: chunk[16],
            rx_peak_usage_pct: chunk[17],
            overrun_errors: le_u16(chunk, 18),
            skipped_bytes: le_u32(chunk, 36),
        })
    }
}

/// MON-COMMS (class 0x0a, id 0x36): per-port buffer usage and traffic
/// counters, prefixed by a port count and the protocol-id table.
#[derive(Debug, Clone, Copy)]
pub struct MonComms<'a> {
    pub version: u8,
    pub num_ports: u8,
    pub tx_errors: u8,
    ports: &'a [u8],
}

impl<'a> MonComms<'a> {
    pub fn ports(&self) -> CommsPorts<'a> {
        CommsPorts { data: self.ports }
    }
}

pub fn mon_comms(buf: &[u8]) -> Result<MonComms<'_>, CoreError> {
    let p = variable_payload(buf, 0x0a, 0x36, 8)?;
    let ports = &p[8..];
    if ports.len() % 40 != 0 {
        return Err(truncated());
    }
    Ok(MonComms { version: p[0], num_ports: p[1], tx_errors: p[2], ports })
}

/// NAV-ATT (class 0x01, id 0x05): vehicle attitude. Angles and accuracies
/// both arrive scaled ×1e-5 degrees; this module keeps the raw integer
/// count rather than converting to a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavAtt {
    pub roll_hundred_microdeg: i32,
    pub pitch_hundred_microdeg: i32,
    pub heading_hundred_microdeg: i32,
    pub roll_accuracy_hundred_microdeg: u32,
    pub pitch_accuracy_hundred_microdeg: u32,
    pub heading_accuracy_hundred_microdeg: u32,
}

pub fn nav_att(buf: &[u8]) -> Result<NavAtt, CoreError> {
    let p = fixed_payload(buf, 0x01, 0x05, 32)?;
    Ok(NavAtt {
        roll_hundred_microdeg: le_i32(p, 4),
        pitch_hundred_microdeg: le_i32(p, 8),
        heading_hundred_microdeg: le_i32(p, 12),
        roll_accuracy_hundred_microdeg: le_u32(p, 16),
        pitch_accuracy_hundred_microdeg: le_u32(p, 20),
        heading_accuracy_hundred_microdeg: le_u32(p, 24),
    })
}

/// NAV-ODO (class 0x01, id 0x09): odometer solution, distances in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOdo {
    pub distance_m: u32,
    pub total_distance_m: u32,
    pub distance_std_m: u32,
}

pub fn nav_odo(buf: &[u8]) -> Result<NavOdo, CoreError> {
    let p = fixed_payload(buf, 0x01, 0x09, 20)?;
    Ok(NavOdo {
        distance_m: le_u32(p, 8),
        total_distance_m: le_u32(p, 12),
        distance_std_m: le_u32(p, 16),
    })
}

/// NAV-PVT (class 0x01, id 0x07): the full navigation position/velocity/
/// time solution. Not written into [`crate::db::Database`], which only
/// keeps a per-system [`crate::db::Position`] populated by NMEA/PUBX
/// sentences, so this is returned to the caller as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavPvt {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub valid: u8,
    pub nanosecond: i32,
    pub fix_type: u8,
    pub flags: u8,
    pub num_satellites: u8,
    pub lon_nanodegrees: i64,
    pub lat_nanodegrees: i64,
    pub height_mm: i32,
    pub height_msl_mm: i32,
    pub horizontal_accuracy_mm: u32,
    pub vertical_accuracy_mm: u32,
    pub ground_speed_mm_s: i32,
    pub heading_motion_hundred_microdeg: i32,
    pub pdop_x100: u16,
}

pub fn nav_pvt(buf: &[u8]) -> Result<NavPvt, CoreError> {
    let p = fixed_payload(buf, 0x01, 0x07, 92)?;
    Ok(NavPvt {
        year: le_u16(p, 4),
        month: p[6],
        day: p[7],
        hour: p[8],
        minute: p[9],
        second: p[10],
        valid: p[11],
        nanosecond: le_i32(p, 16),
        fix_type: p[20],
        flags: p[21],
        num_satellites: p[23],
        lon_nanodegrees: i64::from(le_i32(p, 24)) * 100,
        lat_nanodegrees: i64::from(le_i32(p, 28)) * 100,
        height_mm: le_i32(p, 32),
        height_msl_mm: le_i32(p, 36),
        horizontal_accuracy_mm: le_u32(p, 40),
        vertical_accuracy_mm: le_u32(p, 44),
        ground_speed_mm_s: le_i32(p, 60),
        heading_motion_hundred_microdeg: le_i32(p, 64),
        pdop_x100: le_u16(p, 76),
    })
}
