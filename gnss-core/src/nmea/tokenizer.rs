//! Non-destructive split of a framed NMEA sentence into a talker id, message
//! name and field tokens, grounded on the `nom`-combinator style already in
//! use by several sentence-protocol crates in this ecosystem.
//!
//! Nothing here allocates or mutates the input: every token borrows from the
//! original frame. The checksum/CR/LF trailer produced by
//! [`crate::framer::NmeaFramer`] is not re-validated here: the framer
//! already did that byte-by-byte, so [`Sentence::parse`] only cares about
//! the region between the leading `$`/`!` and the `*`.

use nom::bytes::complete::{take, take_till};
use nom::character::complete::char;
use nom::combinator::opt;
use nom::sequence::preceded;
use nom::IResult;

/// The source identifier preceding the message name: either a 2-character
/// NMEA talker (`"GP"`, `"GN"`, ...) or, for a proprietary `$P<PREFIX>`
/// sentence, the single byte `P` with the second slot left `0` (no real
/// talker is two printable ASCII letters with a NUL second byte, so this
/// sentinel never collides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Talker(pub [u8; 2]);

impl Talker {
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("??")
    }

    /// `true` for the `GN` talker, which blends multiple constellations and
    /// needs the satellite-ID fallback routing.
    pub fn is_blended(&self) -> bool {
        &self.0 == b"GN"
    }

    /// The constellation this talker identifies, per the glossary's talker
    /// list. Talkers with no natural GNSS system (`ZV`, `II`, `IN`, `LC`,
    /// `CD`, `EC`: Loran-C, integrated instrumentation, electronic chart
    /// systems that happen to share the NMEA wire format) fall back to the
    /// blended `Gnss` slot rather than being rejected outright. A
    /// proprietary `$P...` sentence (only `PUBX` is decoded further, by
    /// [`super::sentences`]) routes to `Gps`, matching the single-receiver
    /// position these sentences have historically reported.
    pub fn system(&self) -> crate::db::System {
        use crate::db::System;
        match &self.0 {
            b"GP" => System::Gps,
            b"GL" => System::Glonass,
            b"GA" => System::Galileo,
            b"GB" => System::Beidou,
            b"GI" => System::Navic,
            b"GQ" => System::Qzss,
            [b'P', _] => System::Gps,
            _ => System::Gnss,
        }
    }
}

/// A parsed sentence: talker, 3-character message name, and the raw,
/// still-comma-separated field string (without the leading comma that
/// follows the message name, and without the trailing `*HH`).
#[derive(Debug, Clone, Copy)]
pub struct Sentence<'a> {
    pub talker: Talker,
    pub message: &'a str,
    fields: &'a str,
}

/// Standard sentences are `<TT><MMM>`: a 2-character talker then a
/// 3-character message name. Proprietary sentences are `P<PREFIX>` where
/// `PREFIX` (`UBX`/`MTK`/`SRF`) takes the message name's slot and there is
/// no 2-character talker to speak of.
fn parse_header(i: &[u8]) -> IResult<&[u8], (Talker, &[u8])> {
    let (i, _) = opt(char('$'))(i)?;
    let (i, _) = opt(char('!'))(i)?;
    if i.first() == Some(&b'P') {
        let (i, p) = take(1usize)(i)?;
        let (i, message) = take(3usize)(i)?;
        return Ok((i, (Talker([p[0], 0]), message)));
    }
    let (i, talker) = take(2usize)(i)?;
    let (i, message) = take(3usize)(i)?;
    Ok((
        i,
        (
            Talker([talker[0], talker[1]]),
            message,
        ),
    ))
}

fn parse_body(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(opt(char(',')), take_till(|b| b == b'*' || b == b'\r'))(i)
}

impl<'a> Sentence<'a> {
    /// Parses `raw`, which may still carry the leading sync char, the
    /// trailing `*HH`, and `<CR><LF>` (all are tolerated and ignored; only
    /// the talker/message/field region is extracted).
    pub fn parse(raw: &'a str) -> Option<Sentence<'a>> {
        let bytes = raw.as_bytes();
        let (rest, (talker, message)) = parse_header(bytes).ok()?;
        let (_, field_bytes) = parse_body(rest).ok()?;
        let message = core::str::from_utf8(message).ok()?;
        let fields = core::str::from_utf8(field_bytes).ok()?;
        Some(Sentence {
            talker,
            message,
            fields,
        })
    }

    /// A proprietary sentence's sub-identifier, e.g. `"00"` for `$PUBX,00,...`.
    /// Only meaningful when `message` is a recognized proprietary prefix
    /// (`"UBX"`, `"MTK"`, `"SRF"`); the sub-id is the first field.
    pub fn proprietary_subtype(&self) -> Option<&'a str> {
        self.tokens().next()
    }

    /// Iterates the comma-separated fields after the message name (or, for
    /// proprietary sentences, after the sub-identifier; callers that need
    /// that behavior should call `.tokens().skip(1)`).
    pub fn tokens(&self) -> Tokens<'a> {
        Tokens { rest: Some(self.fields) }
    }
}

/// Lazy, non-destructive iterator over comma-separated field slices.
/// An empty field yields `Some("")`, distinct from the end of the list.
pub struct Tokens<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(',') {
            Some(idx) => {
                self.rest = Some(&rest[idx + 1..]);
                Some(&rest[..idx])
            },
            None => {
                self.rest = None;
                Some(rest)
            },
        }
    }
}

impl<'a> Tokens<'a> {
    /// Fetches the `n`th token (0-indexed) without consuming the iterator,
    /// convenient for sentence parsers that need to branch before
    /// committing to a full sequential walk (e.g. PUBX sub-type dispatch).
    pub fn nth_copy(&self, n: usize) -> Option<&'a str> {
        let rest = self.rest?;
        rest.split(',').nth(n)
    }
}
