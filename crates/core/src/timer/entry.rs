//! Time entry methods and typed-in times

use std::fmt;

use serde::{Deserialize, Serialize};

use super::InputSource;
use crate::error::{Error, Result};

/// How the local user records solves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeEntry {
    #[default]
    Stopwatch,
    Keyboard,
    Stackmat,
}

impl TimeEntry {
    /// Next method in the toggle cycle
    pub fn next(self) -> Self {
        match self {
            TimeEntry::Stopwatch => TimeEntry::Keyboard,
            TimeEntry::Keyboard => TimeEntry::Stackmat,
            TimeEntry::Stackmat => TimeEntry::Stopwatch,
        }
    }

    /// Whether events from `source` drive the timer under this method.
    /// Keyboard entry takes typed times only.
    pub fn accepts(self, source: InputSource) -> bool {
        matches!(
            (self, source),
            (TimeEntry::Stopwatch, InputSource::Manual)
                | (TimeEntry::Stackmat, InputSource::Stackmat)
        )
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeEntry::Stopwatch => "stopwatch",
            TimeEntry::Keyboard => "keyboard",
            TimeEntry::Stackmat => "stackmat",
        };
        f.write_str(name)
    }
}

/// Parse a typed time (`12`, `12.3`, `12.34`, `12.345`, `1:02.345`) into
/// milliseconds.
pub fn parse_time_entry(text: &str) -> Result<u64> {
    let invalid = || Error::InvalidTimeEntry(text.to_string());
    let text = text.trim();

    let (minutes, rest) = match text.split_once(':') {
        Some((m, rest)) => (Some(parse_digits(m).ok_or_else(invalid)?), rest),
        None => (None, text),
    };

    let (whole, fraction) = match rest.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (rest, ""),
    };

    let seconds = parse_digits(whole).ok_or_else(invalid)?;
    if minutes.is_some() && (whole.len() != 2 || seconds >= 60) {
        return Err(invalid());
    }

    let millis = match fraction.len() {
        0 if !rest.contains('.') => 0,
        1..=3 => {
            let digits = parse_digits(fraction).ok_or_else(invalid)?;
            digits * 10u64.pow(3 - fraction.len() as u32)
        }
        _ => return Err(invalid()),
    };

    let total = minutes
        .unwrap_or(0)
        .checked_mul(60_000)
        .and_then(|m| seconds.checked_mul(1000)?.checked_add(m))
        .and_then(|t| t.checked_add(millis))
        .ok_or_else(invalid)?;
    if total == 0 {
        return Err(invalid());
    }
    Ok(total)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_cycle() {
        let start = TimeEntry::default();
        assert_eq!(start, TimeEntry::Stopwatch);
        assert_eq!(start.next(), TimeEntry::Keyboard);
        assert_eq!(start.next().next(), TimeEntry::Stackmat);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_entry_selects_input_source() {
        assert!(TimeEntry::Stopwatch.accepts(InputSource::Manual));
        assert!(!TimeEntry::Stopwatch.accepts(InputSource::Stackmat));
        assert!(!TimeEntry::Keyboard.accepts(InputSource::Manual));
        assert!(!TimeEntry::Keyboard.accepts(InputSource::Stackmat));
        assert!(TimeEntry::Stackmat.accepts(InputSource::Stackmat));
        assert!(!TimeEntry::Stackmat.accepts(InputSource::Manual));
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_time_entry("12").unwrap(), 12_000);
        assert_eq!(parse_time_entry("12.3").unwrap(), 12_300);
        assert_eq!(parse_time_entry("12.34").unwrap(), 12_340);
        assert_eq!(parse_time_entry(" 12.345 ").unwrap(), 12_345);
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_time_entry("1:02.345").unwrap(), 62_345);
        assert_eq!(parse_time_entry("2:00").unwrap(), 120_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let garbage = [
            "",
            "abc",
            "1.2345",
            "12.",
            "1:2.3",
            "1:75.000",
            "-3",
            "0",
            "1:x",
            "99999999999999999",
            "99999999999999999:00",
        ];
        for text in garbage {
            assert!(
                matches!(parse_time_entry(text), Err(Error::InvalidTimeEntry(_))),
                "{text:?} should be rejected"
            );
        }
    }
}
