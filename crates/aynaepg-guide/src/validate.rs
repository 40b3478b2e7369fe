//! Raw program time validation.

use crate::time::parse_epoch;

/// Validated start and end of a program, in epoch seconds.
///
/// Invariant: `0 < start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramWindow {
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
}

/// Validates raw start and end fields.
///
/// Both must parse as integers with `start > 0` and `end > start`.
/// Anything else yields `None`; the program is then dropped.
#[must_use]
pub fn validate_program(start: Option<&str>, end: Option<&str>) -> Option<ProgramWindow> {
    let start = parse_epoch(start?)?;
    let end = parse_epoch(end?)?;
    (start > 0 && end > start).then_some(ProgramWindow { start, end })
}
