//! The multi-constellation database model: one record set per [`System`],
//! updated additively by the NMEA ([`crate::nmea`]) and UBX parsers, expired
//! on a tick, and read by downstream reporting/forwarding code that lives
//! outside this crate.
//!
//! Every record carries its own `expiry` tick counter, decremented by
//! [`Database::expire`]; a record whose expiry has reached zero is stale and
//! should not be reported, but is not eagerly removed; the next parser
//! update simply refills it.

use crate::error::{CoreError, CoreResult, Outcome, SemanticErrorKind};

/// One of the nine constellations the receiver may report, or the
/// multi-system blended solution tagged `GN` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum System {
    Gnss,
    Gps,
    Glonass,
    Galileo,
    Beidou,
    Sbas,
    Imes,
    Qzss,
    Navic,
}

/// All nine systems, in the order they are laid out inside [`Database`].
pub const SYSTEMS: [System; 9] = [
    System::Gnss,
    System::Gps,
    System::Glonass,
    System::Galileo,
    System::Beidou,
    System::Sbas,
    System::Imes,
    System::Qzss,
    System::Navic,
];

impl System {
    const fn index(self) -> usize {
        match self {
            System::Gnss => 0,
            System::Gps => 1,
            System::Glonass => 2,
            System::Galileo => 3,
            System::Beidou => 4,
            System::Sbas => 5,
            System::Imes => 6,
            System::Qzss => 7,
            System::Navic => 8,
        }
    }

    /// Classifies a satellite ID using the NMEA GSA-fallback ranges.
    /// `15` and `5` are both accepted as deprecated QZSS aliases; we keep
    /// the tolerance since removing it silently changes routing for
    /// receivers still emitting it.
    pub const fn from_nmea_satellite_id(id: u16) -> Option<System> {
        match id {
            1..=32 => Some(System::Gps),
            33..=64 => Some(System::Sbas),
            65..=96 => Some(System::Glonass),
            120..=158 => Some(System::Sbas),
            173..=182 => Some(System::Imes),
            193..=197 => Some(System::Qzss),
            201..=235 => Some(System::Beidou),
            301..=336 => Some(System::Galileo),
            401..=437 => Some(System::Beidou),
            _ => None,
        }
    }

    /// Classifies a satellite ID using the PUBX,03 ranges, which differ from
    /// the plain-NMEA GSA ranges.
    pub const fn from_pubx_satellite_id(id: u16) -> Option<System> {
        match id {
            1..=32 => Some(System::Gps),
            33..=64 => Some(System::Beidou),
            65..=96 => Some(System::Glonass),
            120..=158 => Some(System::Sbas),
            159..=163 => Some(System::Beidou),
            173..=182 => Some(System::Imes),
            193..=202 => Some(System::Qzss),
            211..=246 => Some(System::Galileo),
            255 => Some(System::Glonass),
            _ => None,
        }
    }
}

/// Fix quality, shared between GGA's numeric quality field and RMC/PUBX's
/// mode-indicator letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quality {
    NoFix,
    Autonomous,
    Differential,
    Precise,
    RTK,
    RTKFloat,
    Estimated,
    Manual,
    Simulator,
}

/// Safety/integrity classification carried alongside a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Safety {
    Safe,
    Caution,
    Unsafe,
    Void,
}

/// 2-D/3-D navigation mode as reported by GSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavMode {
    NoFix,
    Fix2D,
    Fix3D,
}

/// u-blox PUBX,00 navigation-status code, distinct from (and more detailed
/// than) the plain NMEA GSA [`NavMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PubxNavStatus {
    DeadReckoning,
    Fix2D,
    Fix3D,
    Combined,
    Dgnss2D,
    Dgnss3D,
    TimeOnly,
}

/// How many meaningful digits the source sentence supplied for a field, so
/// that callers can format the value back out without implying false
/// precision. `0` means the field was empty in the source.
pub type Digits = u8;

/// Per-system position record.
///
/// Mutated by GGA/RMC/GLL/VTG/ZDA/PUBX,00/PUBX,04. Every field a given
/// sentence does not touch is left exactly as a previous sentence set it;
/// this cross-sentence aggregation is deliberate.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Monotonic total timestamp, nanoseconds since the POSIX epoch.
    pub tot_ns: i64,
    /// Previous `tot_ns`, retained to enforce monotonicity.
    pub old_ns: i64,
    /// Most recent UTC-of-day, nanoseconds since local midnight.
    pub utc_ns: i64,
    /// Most recent date, nanoseconds since the POSIX epoch at 00:00 UTC.
    pub dmy_ns: i64,
    /// Time zone offset, if the source ever reported one (ZDA).
    pub tz_ns: Option<i64>,
    /// Signed nanominutes, range ±5.4e12.
    pub lat_nanominutes: i64,
    pub lat_digits: Digits,
    /// Signed nanominutes, range ±1.08e13.
    pub lon_nanominutes: i64,
    pub lon_digits: Digits,
    /// Signed millimeters.
    pub altitude_mm: i32,
    pub altitude_digits: Digits,
    /// Signed millimeters, geoid separation.
    pub sep_mm: i32,
    pub sep_digits: Digits,
    /// Signed micro-knots.
    pub sog_microknots: i64,
    /// Signed millimeters per hour.
    pub sog_mm_per_hour: i64,
    pub sog_digits: Digits,
    /// Signed nanodegrees, true course, range ±3.6e11.
    pub cog_nanodegrees: i64,
    pub cog_digits: Digits,
    /// Signed nanodegrees, magnetic heading.
    pub heading_nanodegrees: i64,
    pub heading_digits: Digits,
    pub sats_used: u8,
    pub quality: Quality,
    pub safety: Safety,
    /// Set only by PUBX,00; `None` for positions last touched by a plain
    /// NMEA sentence.
    pub pubx_nav_status: Option<PubxNavStatus>,
    /// 3-character message name that last updated this record (e.g. `"GGA"`).
    pub source: &'static str,
    pub expiry: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            tot_ns: 0,
            old_ns: 0,
            utc_ns: 0,
            dmy_ns: 0,
            tz_ns: None,
            lat_nanominutes: 0,
            lat_digits: 0,
            lon_nanominutes: 0,
            lon_digits: 0,
            altitude_mm: 0,
            altitude_digits: 0,
            sep_mm: 0,
            sep_digits: 0,
            sog_microknots: 0,
            sog_mm_per_hour: 0,
            sog_digits: 0,
            cog_nanodegrees: 0,
            cog_digits: 0,
            heading_nanodegrees: 0,
            heading_digits: 0,
            sats_used: 0,
            quality: Quality::NoFix,
            safety: Safety::Void,
            pubx_nav_status: None,
            source: "",
            expiry: 0,
        }
    }
}

/// Default number of ticks a record stays valid after being touched. One
/// tick corresponds to one worker-loop iteration; callers choose the
/// tick rate.
pub const DEFAULT_EXPIRY: u16 = 10;

impl Position {
    /// Stamps a new total time, enforcing the monotonicity invariant: if
    /// `new_tot_ns` would go backwards, the update is rejected and the
    /// record is left untouched, matching "parsers never mutate output
    /// records on error".
    pub fn stamp_time(&mut self, new_tot_ns: i64) -> CoreResult {
        if new_tot_ns < self.tot_ns {
            return Err(CoreError::Semantic(SemanticErrorKind::InvalidField));
        }
        self.old_ns = self.tot_ns;
        self.tot_ns = new_tot_ns;
        Ok(Outcome::Updated)
    }

    /// True once the clock has been set at least once and has never gone
    /// backwards (`dmyokay`/`totokay` in the design notes, folded into one
    /// predicate since both conditions are checked together everywhere they
    /// are used).
    pub const fn has_valid_time(&self) -> bool {
        self.tot_ns >= self.old_ns && self.utc_ns != 0 && self.dmy_ns != 0
    }

    pub(crate) fn touch(&mut self, source: &'static str) {
        self.source = source;
        self.expiry = DEFAULT_EXPIRY;
    }
}

/// Per-system DOP / active-satellite solution.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Active {
    pub ids: [u16; 12],
    pub num_ids: u8,
    /// DOP values scaled ×100, clamped to [0, 9999].
    pub pdop: u16,
    pub hdop: u16,
    pub vdop: u16,
    pub mode: NavMode,
    pub expiry: u16,
}

impl Default for Active {
    fn default() -> Self {
        Self {
            ids: [0; 12],
            num_ids: 0,
            pdop: 0,
            hdop: 0,
            vdop: 0,
            mode: NavMode::NoFix,
            expiry: 0,
        }
    }
}

/// One satellite's entry in a [`View`] signal band.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SatelliteView {
    pub id: u16,
    pub elevation_deg: i16,
    pub azimuth_deg: u16,
    pub snr_dbhz: i16,
    /// Elevation/azimuth were empty in the source.
    pub phantom: bool,
    /// SNR was empty in the source (not currently being tracked).
    pub untracked: bool,
}

const MAX_SIGNAL_BANDS: usize = 16;
const MAX_SATS_PER_BAND: usize = 32;

/// Per-system satellites-in-view table, one slot per signal
/// band, assembled incrementally across a GSV tuple.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct View {
    pub bands: [[SatelliteView; MAX_SATS_PER_BAND]; MAX_SIGNAL_BANDS],
    pub visible: [u8; MAX_SIGNAL_BANDS],
    /// Signal band currently being assembled (index into `bands`).
    pub signal: usize,
    /// Sentences still expected before the in-progress tuple completes.
    pub pending: u8,
    pub channels: u8,
    pub expiry: u16,
}

impl Default for View {
    fn default() -> Self {
        Self {
            bands: [[SatelliteView::default(); MAX_SATS_PER_BAND]; MAX_SIGNAL_BANDS],
            visible: [0; MAX_SIGNAL_BANDS],
            signal: 0,
            pending: 0,
            channels: 0,
            expiry: 0,
        }
    }
}

impl View {
    /// Appends one satellite to the signal band currently being assembled,
    /// at `offset` (the running count from prior sentences in this tuple).
    /// Silently ignores satellites past `MAX_SATS_PER_BAND`.
    pub fn push(&mut self, offset: u8, sat: SatelliteView) {
        let idx = offset as usize;
        if self.signal < MAX_SIGNAL_BANDS && idx < MAX_SATS_PER_BAND {
            self.bands[self.signal][idx] = sat;
            self.visible[self.signal] = self.visible[self.signal].max(offset + 1);
        }
    }

    /// Total satellites recorded across all signal bands, clamped the same
    /// way as any individual band.
    pub fn total_channels(&self) -> u32 {
        self.visible.iter().map(|&v| u32::from(v)).sum()
    }
}

/// High-precision position solution (UBX NAV-HPPOSLLH).
///
/// `height_tenths_mm`/`height_msl_tenths_mm` combine the coarse millimeter
/// field and its `[-9, 9]` hp refinement into tenths-of-a-millimeter, the
/// same way `lat_nanodegrees`/`lon_nanodegrees` combine their coarse and hp
/// components into nanodegrees: scaling up before adding keeps the
/// refinement from being truncated away.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighPrecision {
    pub lat_nanodegrees: i64,
    pub lon_nanodegrees: i64,
    pub height_tenths_mm: i32,
    pub height_msl_tenths_mm: i32,
    pub horizontal_accuracy_mm: u32,
    pub vertical_accuracy_mm: u32,
    pub invalid: bool,
    pub expiry: u16,
}

/// Receiver hardware health (UBX MON-HW).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareMonitor {
    pub noise_level: u16,
    pub agc_count: u16,
    pub jamming_indicator: u8,
    pub ant_status: u8,
    pub ant_power: u8,
    pub expiry: u16,
}

/// UBX NAV-STATUS snapshot.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavStatus {
    pub fix_valid: bool,
    pub ttff_ms: u32,
    pub msss_ms: u32,
    pub spoof_detection_state: u8,
    pub expiry: u16,
}

/// Base-station survey-in progress (UBX NAV-SVIN).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseSurvey {
    pub duration_s: u32,
    pub mean_accuracy_mm: u32,
    pub observations: u32,
    pub active: bool,
    pub valid: bool,
    pub expiry: u16,
}

/// Per-message RTCM reception report on a rover (UBX RXM-RTCM).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rover {
    pub message_number: u16,
    pub crc_failed: bool,
    pub used: bool,
    pub expiry: u16,
}

/// A single RTCM message of interest, tracked for liveness (message number
/// plus a tick counter, not the raw payload; ownership of the framed bytes
/// belongs to the caller).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtcmObservation {
    pub message_number: u16,
    pub expiry: u16,
}

/// Fault/integrity report (NMEA GBS).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fault {
    pub utc_ns: i64,
    pub lat_residual_mm: i32,
    pub lon_residual_mm: i32,
    pub alt_residual_mm: i32,
    pub failed_satellite_id: Option<u16>,
    pub probability: u16,
    pub expected_error_mm: u32,
    pub std_deviation_mm: u32,
    pub system: Option<System>,
    pub signal: Option<u8>,
    pub expiry: u16,
}

/// Per-system bundle of every record kind, indexed by [`System`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemRecords {
    pub position: Position,
    pub active: Active,
    pub view: View,
    pub high_precision: HighPrecision,
    pub hardware: HardwareMonitor,
    pub nav_status: NavStatus,
    pub base_survey: BaseSurvey,
    pub rover: Rover,
    pub rtcm: RtcmObservation,
    pub fault: Fault,
}

/// The complete database: one [`SystemRecords`] bundle per [`System`].
///
/// A plain fixed-size array indexed by system enum; no back-pointers are
/// needed.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Database {
    systems: [SystemRecords; 9],
}

impl Default for Database {
    fn default() -> Self {
        Self {
            systems: Default::default(),
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, system: System) -> &SystemRecords {
        &self.systems[system.index()]
    }

    pub fn get_mut(&mut self, system: System) -> &mut SystemRecords {
        &mut self.systems[system.index()]
    }

    /// Decrements every record's expiry by `elapsed_ticks`, clamping at
    /// zero. A record at zero is stale; it is not removed, only
    /// marked, so the next parser update can refill it without reallocating.
    pub fn expire(&mut self, elapsed_ticks: u16) {
        for records in &mut self.systems {
            records.position.expiry = records.position.expiry.saturating_sub(elapsed_ticks);
            records.active.expiry = records.active.expiry.saturating_sub(elapsed_ticks);
            records.view.expiry = records.view.expiry.saturating_sub(elapsed_ticks);
            records.high_precision.expiry =
                records.high_precision.expiry.saturating_sub(elapsed_ticks);
            records.hardware.expiry = records.hardware.expiry.saturating_sub(elapsed_ticks);
            records.nav_status.expiry = records.nav_status.expiry.saturating_sub(elapsed_ticks);
            records.base_survey.expiry = records.base_survey.expiry.saturating_sub(elapsed_ticks);
            records.rover.expiry = records.rover.expiry.saturating_sub(elapsed_ticks);
            records.rtcm.expiry = records.rtcm.expiry.saturating_sub(elapsed_ticks);
            records.fault.expiry = records.fault.expiry.saturating_sub(elapsed_ticks);
        }
    }

    /// `true` if any system's position has a monotonic, fully-set clock.
    pub fn has_valid_time(&self) -> bool {
        self.systems.iter().any(|r| r.position.has_valid_time())
    }

    pub(crate) fn touch_position(&mut self, system: System, source: &'static str) -> &mut Position {
        let records = self.get_mut(system);
        records.position.touch(source);
        &mut records.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satellite_id_ranges_route_to_expected_systems() {
        assert_eq!(System::from_nmea_satellite_id(19), Some(System::Gps));
        assert_eq!(System::from_nmea_satellite_id(70), Some(System::Glonass));
        assert_eq!(System::from_nmea_satellite_id(320), Some(System::Galileo));
        assert_eq!(System::from_nmea_satellite_id(410), Some(System::Beidou));
        assert_eq!(System::from_nmea_satellite_id(9999), None);
    }

    #[test]
    fn pubx_ranges_differ_from_nmea_ranges_for_beidou() {
        assert_eq!(System::from_pubx_satellite_id(40), Some(System::Beidou));
        assert_eq!(System::from_nmea_satellite_id(40), Some(System::Sbas));
    }

    #[test]
    fn position_rejects_backwards_time() {
        let mut p = Position::default();
        p.stamp_time(1_000).unwrap();
        assert_eq!(p.tot_ns, 1_000);
        let err = p.stamp_time(500).unwrap_err();
        assert_eq!(err, CoreError::Semantic(SemanticErrorKind::InvalidField));
        assert_eq!(p.tot_ns, 1_000, "rejected update must leave the record untouched");
    }

    #[test]
    fn position_monotonicity_holds_across_a_non_decreasing_sequence() {
        let mut p = Position::default();
        for t in [100_i64, 100, 250, 9_000] {
            p.stamp_time(t).unwrap();
            assert!(p.tot_ns >= p.old_ns);
        }
    }

    #[test]
    fn expire_clamps_at_zero() {
        let mut db = Database::new();
        db.touch_position(System::Gps, "GGA");
        assert_eq!(db.get(System::Gps).position.expiry, DEFAULT_EXPIRY);
        db.expire(DEFAULT_EXPIRY + 5);
        assert_eq!(db.get(System::Gps).position.expiry, 0);
    }

    #[test]
    fn view_tuple_assembly_tracks_total_channels() {
        let mut v = View::default();
        v.push(
            0,
            SatelliteView {
                id: 1,
                ..Default::default()
            },
        );
        v.push(
            1,
            SatelliteView {
                id: 2,
                ..Default::default()
            },
        );
        assert_eq!(v.total_channels(), 2);
    }
}
