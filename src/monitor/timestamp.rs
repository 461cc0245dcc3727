//! Timestamp extraction from a fixed character window of a log line.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::ParseError;

/// Timestamp carried by a log line. Log timestamps have no zone.
pub type Timestamp = NaiveDateTime;

/// Where a line keeps its timestamp and how to read it.
///
/// The default matches lines such as
/// `[2024-03-01 14:02:07][INFO] ...`: skip one character, read nineteen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimestampFormat {
    /// Characters to skip before the timestamp.
    pub offset: usize,
    /// Length of the timestamp in characters.
    pub width: usize,
    /// `chrono` format string.
    pub pattern: String,
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self {
            offset: 1,
            width: 19,
            pattern: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl TimestampFormat {
    /// Parse the timestamp window of `line`.
    ///
    /// Offsets count characters, so a multi-byte character before the
    /// window shifts it by one position, not by its byte length.
    pub fn parse(&self, line: &str) -> Result<Timestamp, ParseError> {
        let window = char_window(line, self.offset, self.width)
            .ok_or_else(|| ParseError::for_line(line))?;
        NaiveDateTime::parse_from_str(window, &self.pattern).map_err(|_| ParseError::for_line(line))
    }
}

/// Slice `width` characters starting at character `offset`, or `None` if
/// the line is too short.
fn char_window(line: &str, offset: usize, width: usize) -> Option<&str> {
    let mut indices = line.char_indices().map(|(i, _)| i).chain(std::iter::once(line.len()));
    let start = indices.nth(offset)?;
    let end = if width == 0 {
        start
    } else {
        indices.nth(width - 1)?
    };
    Some(&line[start..end])
}

/// Parse a line with the default [`TimestampFormat`].
pub fn parse_timestamp(line: &str) -> Result<Timestamp, ParseError> {
    TimestampFormat::default().parse(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_parse_default_format() {
        let line = "[2024-03-01 14:02:07][PRICE] Bid: 1.08123 Ask: 1.08131";
        assert_eq!(parse_timestamp(line).unwrap(), ts(14, 2, 7));
    }

    #[test]
    fn test_parse_ignores_rest_of_line() {
        assert_eq!(parse_timestamp("[2024-03-01 00:00:01").unwrap(), ts(0, 0, 1));
        assert_eq!(parse_timestamp("x2024-03-01 00:00:01 anything").unwrap(), ts(0, 0, 1));
    }

    #[test]
    fn test_parse_rejects_non_data_lines() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("Starting price stream").is_err());
        assert!(parse_timestamp("[2024-03-01 14:02").is_err());
        assert!(parse_timestamp("[2024-13-01 14:02:07]").is_err());
    }

    #[test]
    fn test_parse_error_carries_excerpt() {
        let err = parse_timestamp("garbage line").unwrap_err();
        assert_eq!(err.excerpt, "garbage line");
    }

    #[test]
    fn test_offsets_count_characters() {
        let line = "é2024-03-01 14:02:07 multibyte prefix";
        assert_eq!(parse_timestamp(line).unwrap(), ts(14, 2, 7));
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat {
            offset: 0,
            width: 8,
            pattern: "%H:%M:%S".to_string(),
        };
        // Time-only patterns have no date, so chrono rejects them as datetimes
        assert!(format.parse("14:02:07 tick").is_err());

        let format = TimestampFormat {
            offset: 4,
            width: 19,
            pattern: "%d/%m/%Y %H:%M:%S".to_string(),
        };
        assert_eq!(format.parse("INFO01/03/2024 14:02:07 tick").unwrap(), ts(14, 2, 7));
    }

    #[test]
    fn test_char_window() {
        assert_eq!(char_window("abcdef", 1, 3), Some("bcd"));
        assert_eq!(char_window("abcdef", 3, 3), Some("def"));
        assert_eq!(char_window("abcdef", 4, 3), None);
        assert_eq!(char_window("abc", 3, 0), Some(""));
    }
}
