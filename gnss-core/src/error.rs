use core::fmt;

/// Reasons a sentence/message/packet parser declined to update a record,
/// distinct from a framing or checksum failure (those never reach a field
/// parser at all; see [`crate::framer`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// Right protocol, wrong message type for this parser (`ENOMSG`): the
    /// caller should try the next parser in its dispatch table.
    WrongMessage,
    /// Right message type, but the framed length does not match what the
    /// message's own length field (or the table of known fixed lengths)
    /// demands (`ENODATA`): truncated or padded, record left unchanged.
    Truncated,
}

/// A field failed validation once the parser was already committed to this
/// message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    /// A field held non-numeric text where a number was required, or a
    /// well-formed number outside the field's valid range (`EINVAL`/`ERANGE`
    /// are not distinguished further here; both leave the record untouched).
    InvalidField,
    /// A required field was present but empty where the sentence grammar
    /// does not allow it to be.
    MissingField,
}

/// The core error taxonomy from the error-handling design: framing/integrity
/// failures are handled entirely inside the framer state machines and never
/// surface here. What a field-level parser can report is structural
/// (wrong message / truncated) or semantic (bad field). A policy drop (the
/// message parsed cleanly but carries no actionable fix, e.g. GGA quality 0,
/// RMC status `V`) is not modeled as an error at all: it is reported via
/// `Ok(Outcome::Dropped)`, since it is not a failure the caller needs to
/// handle any differently than "nothing to update this time".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    Structural(StructuralErrorKind),
    Semantic(SemanticErrorKind),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Structural(StructuralErrorKind::WrongMessage) => {
                f.write_str("wrong message type for this parser")
            },
            CoreError::Structural(StructuralErrorKind::Truncated) => {
                f.write_str("message truncated or malformed length")
            },
            CoreError::Semantic(SemanticErrorKind::InvalidField) => {
                f.write_str("field failed validation")
            },
            CoreError::Semantic(SemanticErrorKind::MissingField) => {
                f.write_str("required field missing")
            },
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/// What happened to the destination record as a result of a successful parse.
/// `Dropped` is the "policy drop" outcome from the error-handling design
/// (no-fix, `V` status, mode `N`, ...): parsed cleanly, nothing actionable,
/// record left untouched, no error raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Dropped,
}

/// Result alias used throughout [`crate::nmea`], [`crate::rtcm`] and the UBX
/// parsers that feed [`crate::db`]: on `Err` the destination record is always
/// left exactly as it was, per the "parsers never mutate output records on
/// error" policy.
pub type CoreResult = Result<Outcome, CoreError>;
