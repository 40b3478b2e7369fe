//! Epoch seconds to XMLTV timestamp conversion.

use chrono::{DateTime, Datelike, FixedOffset};

/// UTC offset of the guide timezone (Asia/Dhaka, UTC+06:00, no DST).
pub const GUIDE_UTC_OFFSET_SECS: i32 = 6 * 3600;

/// XMLTV timestamp format (`YYYYMMDDHHmmss ±HHMM`).
const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Largest year representable with the four-digit XMLTV year field.
const MAX_XMLTV_YEAR: i32 = 9999;

/// Parses a raw epoch field as base-10 integer seconds.
///
/// Surrounding whitespace is ignored. Returns `None` for anything else.
#[must_use]
pub fn parse_epoch(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Formats epoch seconds as an XMLTV timestamp in the guide timezone.
///
/// Returns `None` for non-positive values and for instants that cannot be
/// written with a four-digit year.
#[must_use]
pub fn format_epoch_secs(secs: i64) -> Option<String> {
    if secs <= 0 {
        return None;
    }
    let offset = FixedOffset::east_opt(GUIDE_UTC_OFFSET_SECS)?;
    let local = DateTime::from_timestamp(secs, 0)?.with_timezone(&offset);
    if local.year() > MAX_XMLTV_YEAR {
        return None;
    }
    Some(local.format(XMLTV_TIME_FORMAT).to_string())
}

/// Formats a raw epoch field (numeric text) as an XMLTV timestamp.
///
/// `None` means the value is unusable and the record carrying it must be
/// skipped.
#[must_use]
pub fn format_epoch(raw: &str) -> Option<String> {
    format_epoch_secs(parse_epoch(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_known_value() {
        // Arrange: 2023-11-14 22:13:20 UTC
        let raw = "1700000000";

        // Act
        let formatted = format_epoch(raw);

        // Assert
        assert_eq!(formatted.as_deref(), Some("20231115041320 +0600"));
    }

    #[test]
    fn test_format_epoch_crosses_date_boundary() {
        // Arrange: 2024-01-01 18:00:00 UTC is midnight in Dhaka
        let raw = "1704132000";

        // Act
        let formatted = format_epoch(raw);

        // Assert
        assert_eq!(formatted.as_deref(), Some("20240102000000 +0600"));
    }

    #[test]
    fn test_format_epoch_trims_whitespace() {
        // Arrange & Act & Assert
        assert_eq!(
            format_epoch(" 1700003600 ").as_deref(),
            Some("20231115051320 +0600")
        );
    }

    #[test]
    fn test_format_epoch_rejects_non_positive() {
        // Arrange & Act & Assert
        for raw in ["0", "-1", "-1700000000"] {
            assert_eq!(format_epoch(raw), None, "raw={raw}");
        }
    }

    #[test]
    fn test_format_epoch_rejects_non_numeric() {
        // Arrange & Act & Assert
        for raw in ["", "abc", "17abc", "1700000000.5", "1e9", "   "] {
            assert_eq!(format_epoch(raw), None, "raw={raw:?}");
        }
    }

    #[test]
    fn test_format_epoch_rejects_out_of_range() {
        // Arrange & Act & Assert
        assert_eq!(format_epoch("99999999999999999999"), None);
        assert_eq!(format_epoch_secs(i64::MAX), None);
        // Year 11476: representable by chrono, not by XMLTV
        assert_eq!(format_epoch_secs(300_000_000_000), None);
    }

    #[test]
    fn test_format_epoch_last_representable_year() {
        // Arrange: 9999-12-31 17:59:59 UTC is 23:59:59 local
        let secs = 253_402_279_199;

        // Act
        let formatted = format_epoch_secs(secs);

        // Assert
        assert_eq!(formatted.as_deref(), Some("99991231235959 +0600"));
    }
}
