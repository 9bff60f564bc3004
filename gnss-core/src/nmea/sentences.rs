//! Per-sentence record parsers. Each function validates every field
//! it needs before touching the database, applying changes in an
//! all-or-nothing manner, and returns [`CoreResult`] so structural/semantic
//! failures and policy drops share one `?`-friendly shape with the rest of
//! the crate.

#[cfg(all(feature = "alloc", not(feature = "std")))]
use alloc::vec::Vec;

use super::fields::{
    altitude_mm, degrees_nanodegrees, dmy_from_parts_ns, dmy_ns, dop_x100, lat_lon_nanominutes,
    speed_over_ground, utc_ns,
};
use super::tokenizer::Sentence;
use crate::db::{
    Database, Fault, NavMode, Position, PubxNavStatus, Quality, Safety, SatelliteView, System,
    SYSTEMS,
};
use crate::error::{CoreError, CoreResult, Outcome, SemanticErrorKind, StructuralErrorKind};

fn invalid() -> CoreError {
    CoreError::Semantic(SemanticErrorKind::InvalidField)
}

fn missing() -> CoreError {
    CoreError::Semantic(SemanticErrorKind::MissingField)
}

fn wrong_message() -> CoreError {
    CoreError::Structural(StructuralErrorKind::WrongMessage)
}

fn truncated() -> CoreError {
    CoreError::Structural(StructuralErrorKind::Truncated)
}

fn quality_from_gga_code(code: &str) -> Option<Quality> {
    match code {
        "0" => None, // nofix: caller drops before this is even consulted
        "1" => Some(Quality::Autonomous),
        "2" => Some(Quality::Differential),
        "3" => Some(Quality::Precise),
        "4" => Some(Quality::RTK),
        "5" => Some(Quality::RTKFloat),
        "6" => Some(Quality::Estimated),
        "7" => Some(Quality::Manual),
        "8" => Some(Quality::Simulator),
        _ => None,
    }
}

fn quality_from_mode_indicator(mode: char) -> Option<Quality> {
    match mode {
        'A' => Some(Quality::Autonomous),
        'D' => Some(Quality::Differential),
        'E' => Some(Quality::Estimated),
        'F' => Some(Quality::RTKFloat),
        'M' => Some(Quality::Manual),
        'P' => Some(Quality::Precise),
        'R' => Some(Quality::RTK),
        'S' => Some(Quality::Simulator),
        'N' => None,
        _ => None,
    }
}

fn safety_from_letter(letter: char) -> Safety {
    match letter {
        'S' => Safety::Safe,
        'C' => Safety::Caution,
        'U' => Safety::Unsafe,
        _ => Safety::Void,
    }
}

/// Routes a GN-talker GSA's active-satellite IDs to a system when no NMEA
/// 4.10 System ID field is present. Any non-SBAS system is preferred over
/// SBAS; two *different* non-SBAS systems among the IDs is a genuine
/// constellation mix and falls back to blended `GNSS` rather than picking
/// one arbitrarily.
fn system_from_active_ids(ids: &[&str]) -> System {
    let mut non_sbas: Option<System> = None;
    let mut sbas_seen = false;
    let mut conflict = false;
    for id in ids.iter().filter(|s| !s.is_empty()) {
        let Some(system) = id.parse::<u16>().ok().and_then(System::from_nmea_satellite_id) else {
            continue;
        };
        if system == System::Sbas {
            sbas_seen = true;
            continue;
        }
        match non_sbas {
            None => non_sbas = Some(system),
            Some(existing) if existing != system => conflict = true,
            _ => {},
        }
    }
    if conflict {
        System::Gnss
    } else if let Some(system) = non_sbas {
        system
    } else if sbas_seen {
        System::Sbas
    } else {
        System::Gnss
    }
}

/// GGA: fix, quality, altitude, separation.
pub fn gga(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "GGA" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 14 {
        return Err(truncated());
    }
    let (time, lat, ns, lon, ew, quality_code, numsv, _hdop, alt, alt_unit, sep, sep_unit) =
        (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7], t[8], t[9], t[10], t[11]);

    if quality_code == "0" || numsv.parse::<u32>().unwrap_or(0) == 0 {
        return Ok(Outcome::Dropped);
    }
    let quality = quality_from_gga_code(quality_code).ok_or_else(invalid)?;

    let utc = utc_ns(time).ok_or_else(missing)?;
    let (lat_nm, lat_digits) = lat_lon_nanominutes(lat, ns, false).ok_or_else(missing)?;
    let (lon_nm, lon_digits) = lat_lon_nanominutes(lon, ew, true).ok_or_else(missing)?;
    let (alt_mm, alt_digits) = altitude_mm(alt, alt_unit).ok_or_else(missing)?;
    let (sep_mm, sep_digits) = altitude_mm(sep, sep_unit).ok_or_else(missing)?;
    let sats_used: u8 = numsv.parse().map_err(|_| invalid())?;

    let position = db.touch_position(System::Gps, "GGA");
    position.utc_ns = utc;
    position.lat_nanominutes = lat_nm;
    position.lat_digits = lat_digits;
    position.lon_nanominutes = lon_nm;
    position.lon_digits = lon_digits;
    position.altitude_mm = alt_mm;
    position.altitude_digits = alt_digits;
    position.sep_mm = sep_mm;
    position.sep_digits = sep_digits;
    position.sats_used = sats_used;
    position.quality = quality;
    Ok(Outcome::Updated)
}

/// RMC: position, speed, course, date, mode indicator, nav status.
pub fn rmc(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "RMC" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 9 {
        return Err(truncated());
    }
    let (time, status, lat, ns, lon, ew, sog, cog, date) =
        (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7], t[8]);
    let mode = t.get(11).copied().unwrap_or("");

    let active = status == "A" || mode == "A" || mode == "D";
    if !active {
        return Ok(Outcome::Dropped);
    }

    let quality = if !mode.is_empty() {
        match quality_from_mode_indicator(mode.chars().next().unwrap()) {
            Some(q) => q,
            None => return Ok(Outcome::Dropped),
        }
    } else {
        Quality::Autonomous
    };

    let utc = utc_ns(time).ok_or_else(missing)?;
    let dmy = dmy_ns(date).ok_or_else(missing)?;
    let (lat_nm, lat_digits) = lat_lon_nanominutes(lat, ns, false).ok_or_else(missing)?;
    let (lon_nm, lon_digits) = lat_lon_nanominutes(lon, ew, true).ok_or_else(missing)?;
    let (microknots, mm_per_hour, sog_digits) = speed_over_ground(sog).ok_or_else(missing)?;
    let (cog_nanodeg, cog_digits) = degrees_nanodegrees(cog).ok_or_else(missing)?;

    let position = db.touch_position(System::Gps, "RMC");
    position.utc_ns = utc;
    position.dmy_ns = dmy;
    position.lat_nanominutes = lat_nm;
    position.lat_digits = lat_digits;
    position.lon_nanominutes = lon_nm;
    position.lon_digits = lon_digits;
    position.sog_microknots = microknots;
    position.sog_mm_per_hour = mm_per_hour;
    position.sog_digits = sog_digits;
    position.cog_nanodegrees = cog_nanodeg;
    position.cog_digits = cog_digits;
    position.quality = quality;
    Ok(Outcome::Updated)
}

/// GLL: position, UTC. Accepted only if status is `A`.
pub fn gll(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "GLL" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 6 {
        return Err(truncated());
    }
    let (lat, ns, lon, ew, time, status) = (t[0], t[1], t[2], t[3], t[4], t[5]);
    if status != "A" {
        return Ok(Outcome::Dropped);
    }

    let utc = utc_ns(time).ok_or_else(missing)?;
    let (lat_nm, lat_digits) = lat_lon_nanominutes(lat, ns, false).ok_or_else(missing)?;
    let (lon_nm, lon_digits) = lat_lon_nanominutes(lon, ew, true).ok_or_else(missing)?;

    let position = db.touch_position(System::Gps, "GLL");
    position.utc_ns = utc;
    position.lat_nanominutes = lat_nm;
    position.lat_digits = lat_digits;
    position.lon_nanominutes = lon_nm;
    position.lon_digits = lon_digits;
    Ok(Outcome::Updated)
}

/// VTG: true heading, magnetic heading, SOG. Dropped if mode is `N`.
pub fn vtg(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "VTG" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 8 {
        return Err(truncated());
    }
    let (cog_true, _t_unit, cog_mag, _m_unit, sog_knots, _n_unit, _sog_kmh, _k_unit) =
        (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]);
    if t.get(8) == Some(&"N") {
        return Ok(Outcome::Dropped);
    }

    let (cog_nanodeg, cog_digits) = degrees_nanodegrees(cog_true).ok_or_else(missing)?;
    let (heading_nanodeg, heading_digits) = if cog_mag.is_empty() {
        (0, 0)
    } else {
        degrees_nanodegrees(cog_mag).ok_or_else(missing)?
    };
    let (microknots, mm_per_hour, sog_digits) = speed_over_ground(sog_knots).ok_or_else(missing)?;

    let position = db.touch_position(System::Gps, "VTG");
    position.cog_nanodegrees = cog_nanodeg;
    position.cog_digits = cog_digits;
    position.heading_nanodegrees = heading_nanodeg;
    position.heading_digits = heading_digits;
    position.sog_microknots = microknots;
    position.sog_mm_per_hour = mm_per_hour;
    position.sog_digits = sog_digits;
    Ok(Outcome::Updated)
}

/// ZDA: UTC, day, month, year, zone hours, zone minutes. Unlike the other
/// time-bearing sentences, ZDA updates the monotonic total time even
/// without a fix, since some receivers keep publishing it from an internal
/// clock alone.
pub fn zda(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "ZDA" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 6 {
        return Err(truncated());
    }
    let (time, day, month, year, zone_hh, zone_mm) = (t[0], t[1], t[2], t[3], t[4], t[5]);

    let utc = utc_ns(time).ok_or_else(missing)?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i64 = year.parse().map_err(|_| invalid())?;
    let dmy = dmy_from_parts_ns(day, month, year).ok_or_else(invalid)?;
    let tz_ns = if zone_hh.is_empty() {
        None
    } else {
        let hh: i64 = zone_hh.parse().map_err(|_| invalid())?;
        let mm: i64 = if zone_mm.is_empty() {
            0
        } else {
            zone_mm.parse().map_err(|_| invalid())?
        };
        Some((hh * 3600 + mm * 60) * 1_000_000_000)
    };

    let position = db.touch_position(System::Gps, "ZDA");
    position.utc_ns = utc;
    position.dmy_ns = dmy;
    position.tz_ns = tz_ns;
    let total_ns = dmy + utc;
    position.stamp_time(total_ns)?;
    Ok(Outcome::Updated)
}

/// GSA: DOP and active satellites. GN fallback routes by satellite-ID range
/// when no NMEA 4.10 system-id field is present.
pub fn gsa(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "GSA" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 15 {
        return Err(truncated());
    }
    let (_mode1, mode2, ids, rest) = (t[0], t[1], &t[2..14], &t[14..]);

    let mode = match mode2 {
        "1" => NavMode::NoFix,
        "2" => NavMode::Fix2D,
        "3" => NavMode::Fix3D,
        _ => return Err(invalid()),
    };
    let pdop = dop_x100(rest[0]).ok_or_else(missing)?;
    let hdop = dop_x100(rest[1]).ok_or_else(missing)?;
    let vdop = rest.get(2).copied().unwrap_or("");
    let vdop = dop_x100(vdop).ok_or_else(missing)?;
    let system_id_hex = rest.get(3).copied().unwrap_or("");

    let system = if !system_id_hex.is_empty() {
        let code = u8::from_str_radix(system_id_hex, 16).map_err(|_| invalid())?;
        match code {
            1 => System::Gps,
            2 => System::Glonass,
            3 => System::Galileo,
            4 => System::Beidou,
            5 | 15 => System::Qzss,
            6 => System::Navic,
            _ => System::Gnss,
        }
    } else if sentence.talker.is_blended() {
        system_from_active_ids(ids)
    } else {
        sentence.talker.system()
    };

    let mut parsed_ids = [0u16; 12];
    let mut count = 0u8;
    for id in ids {
        if id.is_empty() {
            continue;
        }
        let value: u16 = id.parse().map_err(|_| invalid())?;
        if (count as usize) < parsed_ids.len() {
            parsed_ids[count as usize] = value;
            count += 1;
        }
    }

    let records = db.get_mut(system);
    records.active.ids = parsed_ids;
    records.active.num_ids = count;
    records.active.pdop = pdop;
    records.active.hdop = hdop;
    records.active.vdop = vdop;
    records.active.mode = mode;
    records.active.expiry = crate::db::DEFAULT_EXPIRY;
    Ok(Outcome::Updated)
}

/// GSV: satellites in view, assembled across an M-of-N tuple.
pub fn gsv(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "GSV" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 3 {
        return Err(truncated());
    }
    let total_sentences: u8 = t[0].parse().map_err(|_| invalid())?;
    let sentence_num: u8 = t[1].parse().map_err(|_| invalid())?;
    let _sats_in_view: u16 = t[2].parse().unwrap_or(0);

    // Optional trailing signal-id: present when the remaining tokens after
    // the quadruplets don't divide evenly by 4.
    let quad_tokens = &t[3..];
    let (quads, signal_id) = if quad_tokens.len() % 4 == 1 {
        (&quad_tokens[..quad_tokens.len() - 1], quad_tokens.last().copied())
    } else {
        (quad_tokens, None)
    };
    let signal = signal_id
        .filter(|s| !s.is_empty())
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .unwrap_or(0) as usize;

    let system = sentence.talker.system();
    let records = db.get_mut(system);
    if sentence_num == 1 {
        records.view.signal = signal;
    }
    records.view.signal = signal;
    records.view.pending = total_sentences.saturating_sub(sentence_num);

    let base_offset = records.view.visible.get(signal).copied().unwrap_or(0);
    let offset = if sentence_num == 1 { 0 } else { base_offset };

    for (i, chunk) in quads.chunks(4).enumerate() {
        if chunk.len() < 4 {
            break;
        }
        let id_tok = chunk[0];
        if id_tok.is_empty() {
            continue;
        }
        let id: u16 = id_tok.parse().map_err(|_| invalid())?;
        let elv_empty = chunk[1].is_empty();
        let azm_empty = chunk[2].is_empty();
        let snr_empty = chunk[3].is_empty();
        let elevation_deg = chunk[1].parse().unwrap_or(0);
        let azimuth_deg = chunk[2].parse().unwrap_or(0);
        let snr_dbhz = chunk[3].parse().unwrap_or(0);
        let sat = SatelliteView {
            id,
            elevation_deg,
            azimuth_deg,
            snr_dbhz,
            phantom: elv_empty || azm_empty,
            untracked: snr_empty,
        };
        records.view.push(offset + i as u8, sat);
    }

    if records.view.pending == 0 {
        records.view.channels = records.view.total_channels().min(32) as u8;
        records.view.expiry = crate::db::DEFAULT_EXPIRY;
    }
    Ok(Outcome::Updated)
}

/// TXT: recognized only. The payload is logged, nothing in the database is
/// touched.
pub fn txt(sentence: &Sentence) -> CoreResult {
    if sentence.message != "TXT" {
        return Err(wrong_message());
    }
    if let Some(text) = sentence.tokens().last() {
        log::info!("gnss-core: NMEA TXT: {text}");
    }
    Ok(Outcome::Dropped)
}

/// GBS: fault detection.
pub fn gbs(sentence: &Sentence, db: &mut Database) -> CoreResult {
    if sentence.message != "GBS" {
        return Err(wrong_message());
    }
    let t: Vec<&str> = sentence.tokens().collect();
    if t.len() < 8 {
        return Err(truncated());
    }
    let (time, err_lat, err_lon, err_alt, failed_id, prob, expected_err, stddev) =
        (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]);
    let system_id_hex = t.get(8).copied().unwrap_or("");
    let signal_id_hex = t.get(9).copied().unwrap_or("");

    let utc = utc_ns(time).ok_or_else(missing)?;
    let (lat_residual_mm, _) = altitude_mm(err_lat, "")
        .or_else(|| altitude_mm(err_lat, "M"))
        .ok_or_else(missing)?;
    let (lon_residual_mm, _) = altitude_mm(err_lon, "")
        .or_else(|| altitude_mm(err_lon, "M"))
        .ok_or_else(missing)?;
    let (alt_residual_mm, _) = altitude_mm(err_alt, "")
        .or_else(|| altitude_mm(err_alt, "M"))
        .ok_or_else(missing)?;
    let failed_satellite_id = if failed_id.is_empty() {
        None
    } else {
        Some(failed_id.parse().map_err(|_| invalid())?)
    };
    let probability = dop_x100(prob).ok_or_else(missing)?;
    let (expected_error_mm, _) = altitude_mm(expected_err, "").ok_or_else(missing)?;
    let (std_deviation_mm, _) = altitude_mm(stddev, "").ok_or_else(missing)?;
    let system = if system_id_hex.is_empty() {
        sentence.talker.system()
    } else {
        u8::from_str_radix(system_id_hex, 16)
            .ok()
            .map(|code| match code {
                1 => System::Gps,
                2 => System::Glonass,
                3 => System::Galileo,
                4 => System::Beidou,
                _ => System::Gnss,
            })
            .unwrap_or(System::Gnss)
    };
    let signal = if signal_id_hex.is_empty() {
        None
    } else {
        u8::from_str_radix(signal_id_hex, 16).ok()
    };

    let records = db.get_mut(system);
    records.fault = Fault {
        utc_ns: utc,
        lat_residual_mm,
        lon_residual_mm,
        alt_residual_mm,
        failed_satellite_id,
        probability,
        expected_error_mm: expected_error_mm.unsigned_abs(),
        std_deviation_mm: std_deviation_mm.unsigned_abs(),
        system: Some(system),
        signal,
        expiry: crate::db::DEFAULT_EXPIRY,
    };
    Ok(Outcome::Updated)
}

fn pubx_nav_status_and_quality(code: &str) -> Option<(PubxNavStatus, Quality)> {
    match code {
        "NF" => None,
        "DR" => Some((PubxNavStatus::DeadReckoning, Quality::Estimated)),
        "G2" => Some((PubxNavStatus::Fix2D, Quality::Autonomous)),
        "G3" => Some((PubxNavStatus::Fix3D, Quality::Autonomous)),
        "RK" => Some((PubxNavStatus::Combined, Quality::Estimated)),
        "D2" => Some((PubxNavStatus::Dgnss2D, Quality::Differential)),
        "D3" => Some((PubxNavStatus::Dgnss3D, Quality::Differential)),
        "TT" => Some((PubxNavStatus::TimeOnly, Quality::Autonomous)),
        _ => None,
    }
}

/// PUBX,00 (u-blox POSITION). `sentence.tokens()` starts at the sub-type
/// field (`"00"`), which the caller is expected to have dispatched on
/// already; this function skips it.
pub fn pubx00(sentence: &Sentence, db: &mut Database) -> CoreResult {
    let t: Vec<&str> = sentence.tokens().skip(1).collect();
    if t.len() < 9 {
        return Err(truncated());
    }
    let (time, lat, ns, lon, ew, _alt_ref, nav_stat) = (t[0], t[1], t[2], t[3], t[4], t[5], t[6]);

    let Some((pubx_status, quality)) = pubx_nav_status_and_quality(nav_stat) else {
        return Ok(Outcome::Dropped);
    };

    let utc = utc_ns(time).ok_or_else(missing)?;
    let position_fields = if pubx_status == PubxNavStatus::TimeOnly {
        None
    } else {
        let (lat_nm, lat_digits) = lat_lon_nanominutes(lat, ns, false).ok_or_else(missing)?;
        let (lon_nm, lon_digits) = lat_lon_nanominutes(lon, ew, true).ok_or_else(missing)?;
        Some((lat_nm, lat_digits, lon_nm, lon_digits))
    };

    let system = sentence.talker.system();
    let position = db.touch_position(system, "UBX,00");
    position.utc_ns = utc;
    position.quality = quality;
    position.pubx_nav_status = Some(pubx_status);
    if let Some((lat_nm, lat_digits, lon_nm, lon_digits)) = position_fields {
        position.lat_nanominutes = lat_nm;
        position.lat_digits = lat_digits;
        position.lon_nanominutes = lon_nm;
        position.lon_digits = lon_digits;
    }
    Ok(Outcome::Updated)
}

/// PUBX,03 (u-blox SVSTATUS): one 6-tuple per satellite
/// (id, status, azimuth, elevation, snr, lock-time). `U` (used for ranging)
/// entries are appended to that system's Active list; `e` (ephemeris only)
/// and `-` (unused) are tracked only in the View; anything else is marked
/// phantom: untracked and unused.
pub fn pubx03(sentence: &Sentence, db: &mut Database) -> CoreResult {
    let t: Vec<&str> = sentence.tokens().skip(1).collect();
    if t.is_empty() {
        return Err(truncated());
    }
    let num_sats: usize = t[0].parse().map_err(|_| invalid())?;
    let entries = &t[1..];
    if entries.len() < num_sats * 6 {
        return Err(truncated());
    }

    // Parse every entry before touching the database: a sentence with one
    // unparsable id must leave the whole snapshot untouched.
    let mut parsed = [(0u16, false, false, 0i16, 0u16, 0i16); 32];
    let mut parsed_len = 0;
    for chunk in entries.chunks(6).take(num_sats) {
        let [id_tok, status, azm, elv, snr, _lock] = chunk else {
            continue;
        };
        let id: u16 = id_tok.parse().map_err(|_| invalid())?;
        if parsed_len < parsed.len() {
            parsed[parsed_len] = (
                id,
                *status == "U",
                *status == "e",
                elv.parse().unwrap_or(0),
                azm.parse().unwrap_or(0),
                snr.parse().unwrap_or(0),
            );
            parsed_len += 1;
        }
    }

    // Every PUBX,03 sentence is a complete snapshot, not a tuple assembled
    // across sentences like GSV, so each system's band 0 starts over from
    // scratch instead of appending to whatever the last report left.
    for system in SYSTEMS {
        let records = db.get_mut(system);
        records.view.signal = 0;
        records.view.visible[0] = 0;
        records.active.num_ids = 0;
    }

    for &(id, used, ephemeris_only, elevation_deg, azimuth_deg, snr_dbhz) in &parsed[..parsed_len] {
        let system = System::from_pubx_satellite_id(id).unwrap_or(System::Gnss);

        let records = db.get_mut(system);
        let sat = SatelliteView {
            id,
            elevation_deg,
            azimuth_deg,
            snr_dbhz,
            phantom: !used && !ephemeris_only,
            untracked: !used,
        };
        let offset = records.view.visible[0];
        records.view.push(offset, sat);
        records.view.expiry = crate::db::DEFAULT_EXPIRY;

        if used && (records.active.num_ids as usize) < records.active.ids.len() {
            let idx = records.active.num_ids as usize;
            records.active.ids[idx] = id;
            records.active.num_ids += 1;
            records.active.expiry = crate::db::DEFAULT_EXPIRY;
        }
    }
    Ok(Outcome::Updated)
}

/// PUBX,04 (u-blox TIME): UTC and date only.
pub fn pubx04(sentence: &Sentence, db: &mut Database) -> CoreResult {
    let t: Vec<&str> = sentence.tokens().skip(1).collect();
    if t.len() < 2 {
        return Err(truncated());
    }
    let (time, date) = (t[0], t[1]);
    let utc = utc_ns(time).ok_or_else(missing)?;
    let dmy = dmy_ns(date).ok_or_else(missing)?;

    let system = sentence.talker.system();
    let position = db.touch_position(system, "UBX,04");
    position.utc_ns = utc;
    position.dmy_ns = dmy;
    Ok(Outcome::Updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmea::tokenizer::Sentence;

    fn sentence(raw: &str) -> Sentence<'_> {
        Sentence::parse(raw).expect("valid test sentence")
    }

    #[test]
    fn gga_matches_scenario_1() {
        let s = sentence(
            "$GPGGA,172814.0,3723.46587704,N,12202.26957864,W,2,6,1.2,18.893,M,-25.669,M,2.0,0031*4F\r\n",
        );
        let mut db = Database::new();
        assert_eq!(gga(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_eq!(p.lat_nanominutes, 2_243_465_877_040);
        assert_eq!(p.lon_nanominutes, -7_322_269_578_640);
        assert_eq!(p.altitude_mm, 18_893);
        assert_eq!(p.sep_mm, -25_669);
        assert_eq!(p.quality, Quality::Differential);
        assert_eq!(p.sats_used, 6);
    }

    #[test]
    fn gga_drops_on_nofix_without_mutating() {
        let s = sentence("$GPGGA,172814.0,,,,,0,0,,,,,,,*00\r\n");
        let mut db = Database::new();
        assert_eq!(gga(&s, &mut db), Ok(Outcome::Dropped));
        assert_eq!(db.get(System::Gps).position.quality, Quality::NoFix);
    }

    #[test]
    fn rmc_matches_scenario_2() {
        let s = sentence("$GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E*68\r\n");
        let mut db = Database::new();
        assert_eq!(rmc(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_eq!(p.cog_nanodegrees, 54_700_000_000);
        assert_eq!(p.sog_microknots, 500_000);
        assert_eq!(p.quality, Quality::Autonomous);
        assert_ne!(p.utc_ns, 0);
        assert_ne!(p.dmy_ns, 0);
    }

    #[test]
    fn rmc_rejects_void_status() {
        let s = sentence("$GPRMC,225446,V,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E*00\r\n");
        let mut db = Database::new();
        assert_eq!(rmc(&s, &mut db), Ok(Outcome::Dropped));
    }

    #[test]
    fn rmc_void_status_overridden_by_mode_a_or_d() {
        let a = sentence("$GPRMC,225446,V,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E,A*00\r\n");
        let mut db = Database::new();
        assert_eq!(rmc(&a, &mut db), Ok(Outcome::Updated));
        assert_eq!(db.get(System::Gps).position.quality, Quality::Autonomous);

        let d = sentence("$GPRMC,225446,V,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E,D*00\r\n");
        let mut db2 = Database::new();
        assert_eq!(rmc(&d, &mut db2), Ok(Outcome::Updated));
        assert_eq!(db2.get(System::Gps).position.quality, Quality::Differential);
    }

    #[test]
    fn rmc_quality_mapping_r_and_f_and_n() {
        let rtk = sentence("$GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E,R*00\r\n");
        let mut db = Database::new();
        rmc(&rtk, &mut db).unwrap();
        assert_eq!(db.get(System::Gps).position.quality, Quality::RTK);

        let float = sentence("$GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E,F*00\r\n");
        let mut db2 = Database::new();
        rmc(&float, &mut db2).unwrap();
        assert_eq!(db2.get(System::Gps).position.quality, Quality::RTKFloat);

        let dropped = sentence("$GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E,N*00\r\n");
        let mut db3 = Database::new();
        assert_eq!(rmc(&dropped, &mut db3), Ok(Outcome::Dropped));
    }

    #[test]
    fn gll_updates_position_on_valid_status() {
        let s = sentence("$GPGLL,4916.45,N,12311.12,W,225446,A*1D\r\n");
        let mut db = Database::new();
        assert_eq!(gll(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_ne!(p.utc_ns, 0);
        assert_ne!(p.lat_nanominutes, 0);
        assert_ne!(p.lon_nanominutes, 0);
    }

    #[test]
    fn gll_drops_on_void_status_without_mutating() {
        let s = sentence("$GPGLL,4916.45,N,12311.12,W,225446,V*2E\r\n");
        let mut db = Database::new();
        assert_eq!(gll(&s, &mut db), Ok(Outcome::Dropped));
        assert_eq!(db.get(System::Gps).position.utc_ns, 0);
    }

    #[test]
    fn vtg_populates_course_and_speed() {
        let s = sentence("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n");
        let mut db = Database::new();
        assert_eq!(vtg(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_eq!(p.cog_nanodegrees, 54_700_000_000);
        assert_eq!(p.sog_microknots, 5_500_000);
    }

    #[test]
    fn vtg_drops_on_mode_n() {
        let s = sentence("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,N*49\r\n");
        let mut db = Database::new();
        assert_eq!(vtg(&s, &mut db), Ok(Outcome::Dropped));
    }

    #[test]
    fn zda_stamps_total_time_even_without_a_fix() {
        let s = sentence("$GPZDA,172809.456,12,07,1996,00,00*57\r\n");
        let mut db = Database::new();
        assert_eq!(zda(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_ne!(p.utc_ns, 0);
        assert_ne!(p.dmy_ns, 0);
        assert_ne!(p.tot_ns, 0);
        assert_eq!(p.tz_ns, Some(0));
    }

    #[test]
    fn zda_time_zone_offset_does_not_overflow() {
        let s = sentence("$GPZDA,172809.456,12,07,1996,05,30*57\r\n");
        let mut db = Database::new();
        assert_eq!(zda(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_eq!(p.tz_ns, Some(19_800_000_000_000));
    }

    #[test]
    fn gsa_matches_scenario_3() {
        let s = sentence("$GPGSA,A,3,19,28,14,18,27,22,31,39,,,,,1.7,1.0,1.3*34\r\n");
        let mut db = Database::new();
        assert_eq!(gsa(&s, &mut db), Ok(Outcome::Updated));
        let active = db.get(System::Gps).active;
        assert_eq!(&active.ids[..8], &[19, 28, 14, 18, 27, 22, 31, 39]);
        assert_eq!(active.num_ids, 8);
        assert_eq!(active.mode, NavMode::Fix3D);
        assert_eq!(active.pdop, 170);
        assert_eq!(active.hdop, 100);
        assert_eq!(active.vdop, 130);
    }

    #[test]
    fn gsa_nmea410_system_id_maps_qzss_and_navic() {
        let qzss = sentence("$GNGSA,A,3,,,,,,,,,,,,,1.7,1.0,1.3,5*00\r\n");
        let mut db = Database::new();
        gsa(&qzss, &mut db).unwrap();
        assert_eq!(db.get(System::Qzss).active.mode, NavMode::Fix3D);

        let qzss2 = sentence("$GNGSA,A,3,,,,,,,,,,,,,1.7,1.0,1.3,F*00\r\n");
        let mut db2 = Database::new();
        gsa(&qzss2, &mut db2).unwrap();
        assert_eq!(db2.get(System::Qzss).active.mode, NavMode::Fix3D);

        let navic = sentence("$GNGSA,A,3,,,,,,,,,,,,,1.7,1.0,1.3,6*00\r\n");
        let mut db3 = Database::new();
        gsa(&navic, &mut db3).unwrap();
        assert_eq!(db3.get(System::Navic).active.mode, NavMode::Fix3D);
    }

    #[test]
    fn gsa_under_gn_talker_routes_by_satellite_id() {
        let s = sentence("$GNGSA,A,3,65,66,,,,,,,,,,,1.7,1.0,1.3*00\r\n");
        let mut db = Database::new();
        gsa(&s, &mut db).unwrap();
        assert_eq!(db.get(System::Glonass).active.num_ids, 2);
    }

    #[test]
    fn gsa_under_gn_talker_prefers_non_sbas_over_sbas() {
        let s = sentence("$GNGSA,A,3,33,19,,,,,,,,,,,1.7,1.0,1.3*00\r\n");
        let mut db = Database::new();
        gsa(&s, &mut db).unwrap();
        assert_eq!(db.get(System::Gps).active.num_ids, 2);
        assert_eq!(db.get(System::Sbas).active.num_ids, 0);
    }

    #[test]
    fn gsa_under_gn_talker_falls_back_to_gnss_on_conflicting_systems() {
        let s = sentence("$GNGSA,A,3,19,70,,,,,,,,,,,1.7,1.0,1.3*00\r\n");
        let mut db = Database::new();
        gsa(&s, &mut db).unwrap();
        assert_eq!(db.get(System::Gnss).active.num_ids, 2);
        assert_eq!(db.get(System::Gps).active.num_ids, 0);
        assert_eq!(db.get(System::Glonass).active.num_ids, 0);
    }

    #[test]
    fn gsv_assembles_a_two_sentence_tuple() {
        let mut db = Database::new();
        let s1 = sentence("$GPGSV,2,1,07,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*75\r\n");
        gsv(&s1, &mut db).unwrap();
        assert_eq!(db.get(System::Gps).view.pending, 1);

        let s2 = sentence("$GPGSV,2,2,07,15,09,042,30,18,33,182,38,21,24,310,00*74\r\n");
        gsv(&s2, &mut db).unwrap();
        let view = &db.get(System::Gps).view;
        assert_eq!(view.pending, 0);
        assert_eq!(view.total_channels(), 7);
    }

    #[test]
    fn gbs_populates_fault_record() {
        let s = sentence("$GPGBS,014829.00,9.0,14.7,21.1,08,0.0,-0.043,0.0*45\r\n");
        let mut db = Database::new();
        assert_eq!(gbs(&s, &mut db), Ok(Outcome::Updated));
        let fault = db.get(System::Gps).fault;
        assert_eq!(fault.failed_satellite_id, Some(8));
        assert_eq!(fault.signal, None);
    }

    #[test]
    fn gbs_parses_optional_system_and_signal() {
        let s = sentence("$GNGBS,014829.00,9.0,14.7,21.1,08,0.0,-0.043,0.0,1,3*00\r\n");
        let mut db = Database::new();
        assert_eq!(gbs(&s, &mut db), Ok(Outcome::Updated));
        let fault = db.get(System::Gps).fault;
        assert_eq!(fault.system, Some(System::Gps));
        assert_eq!(fault.signal, Some(3));
    }

    #[test]
    fn pubx00_maps_nav_status_to_quality() {
        let s = sentence("$PUBX,00,113817.00,5306.0108,N,00700.9163,E,7.18,D3,517.64,0.09,2.83,0.29,1.98,1.41,0.83,19,0,0*1D\r\n");
        let mut db = Database::new();
        assert_eq!(pubx00(&s, &mut db), Ok(Outcome::Updated));
        let p = db.get(System::Gps).position;
        assert_eq!(p.quality, Quality::Differential);
        assert_eq!(p.pubx_nav_status, Some(PubxNavStatus::Dgnss3D));
    }

    #[test]
    fn pubx00_drops_on_nf() {
        let s = sentence("$PUBX,00,113817.00,,,,,,NF,,,,,,,,19,0,0*00\r\n");
        let mut db = Database::new();
        assert_eq!(pubx00(&s, &mut db), Ok(Outcome::Dropped));
    }

    #[test]
    fn pubx03_populates_view_and_active_for_used_satellites() {
        let s = sentence("$PUBX,03,2,23,U,225,70,037,,24,U,084,32,039,*00\r\n");
        let mut db = Database::new();
        assert_eq!(pubx03(&s, &mut db), Ok(Outcome::Updated));
        let records = db.get(System::Gps);
        assert_eq!(records.view.total_channels(), 2);
        assert_eq!(records.active.num_ids, 2);
        assert_eq!(&records.active.ids[..2], &[23, 24]);
    }

    #[test]
    fn pubx03_replaces_the_previous_snapshot_instead_of_appending() {
        let first = sentence("$PUBX,03,2,23,U,225,70,037,,24,U,084,32,039,*00\r\n");
        let mut db = Database::new();
        pubx03(&first, &mut db).unwrap();
        assert_eq!(db.get(System::Gps).view.total_channels(), 2);

        let second = sentence("$PUBX,03,1,25,U,090,45,040,*00\r\n");
        pubx03(&second, &mut db).unwrap();
        let records = db.get(System::Gps);
        assert_eq!(records.view.total_channels(), 1);
        assert_eq!(records.active.num_ids, 1);
        assert_eq!(records.active.ids[0], 25);
    }

    #[test]
    fn pubx03_routes_unrecognized_satellite_ids_to_gnss() {
        let s = sentence("$PUBX,03,1,999,U,225,70,037,*00\r\n");
        let mut db = Database::new();
        assert_eq!(pubx03(&s, &mut db), Ok(Outcome::Updated));
        let records = db.get(System::Gnss);
        assert_eq!(records.view.total_channels(), 1);
        assert_eq!(records.active.num_ids, 1);
        assert_eq!(records.active.ids[0], 999);
    }
}
