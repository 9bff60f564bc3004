//! NMEA 0183 sentence handling: a non-destructive tokenizer, fixed-point
//! field parsers, and per-sentence record parsers that mutate a
//! [`crate::db::Database`] in place.
//!
//! A framed sentence (as produced by [`crate::framer::NmeaFramer`]) is first
//! split by [`tokenizer::Sentence::parse`] into a talker id, a 3-character
//! message name, and a comma-separated field list, without copying or
//! mutating the input buffer. The message name selects a parser from
//! [`sentences`], which walks the field list with the helpers in [`fields`]
//! and, only once every field has validated, commits the result to the
//! database all at once: a sentence that fails partway through never
//! leaves a half-updated record behind.

mod fields;
mod sentences;
mod tokenizer;

pub use fields::*;
pub use sentences::*;
pub use tokenizer::{Sentence, Talker, Tokens};
