//! Text rendering of times

use crate::models::{Penalty, PenaltyName, Solve};

/// `--` for a missing time, `DNF` for infinity, otherwise seconds to the
/// millisecond.
pub fn display_time(time_ms: Option<f64>) -> String {
    match time_ms {
        None => "--".to_string(),
        Some(t) if t.is_infinite() => "DNF".to_string(),
        Some(t) => format!("{:.3}", t / 1000.0),
    }
}

/// A solve as shown in the times table; +2 solves get a trailing `+`
pub fn display_solve(solve: Option<&Solve>, penalty: Option<&Penalty>) -> String {
    let Some(solve) = solve else {
        return display_time(None);
    };
    let time = solve.time_ms as f64;
    match penalty.map(|p| p.name) {
        Some(PenaltyName::Ok) | None => display_time(Some(time)),
        Some(PenaltyName::PlusTwo) => format!("{}+", display_time(Some(time + 2000.0))),
        Some(PenaltyName::Dnf) => display_time(Some(f64::INFINITY)),
    }
}

/// Clock face: `S.mmm` below a minute, `M:SS.mmm` above. While `live`
/// only the decisecond digit is shown.
pub fn format_clock(ms: u64, live: bool) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;

    let fraction = if live {
        (millis / 100).to_string()
    } else {
        format!("{millis:03}")
    };

    if ms < 60_000 {
        format!("{seconds}.{fraction}")
    } else {
        format!("{minutes}:{seconds:02}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PenaltyId, SolveId, UserId};

    fn solve(time_ms: u64) -> Solve {
        Solve {
            id: SolveId(1),
            user_id: UserId(1),
            time_ms,
            penalty_id: PenaltyId(1),
        }
    }

    fn penalty(name: PenaltyName) -> Penalty {
        Penalty {
            id: PenaltyId(1),
            name,
        }
    }

    #[test]
    fn test_display_time() {
        assert_eq!(display_time(None), "--");
        assert_eq!(display_time(Some(f64::INFINITY)), "DNF");
        assert_eq!(display_time(Some(12345.0)), "12.345");
        assert_eq!(display_time(Some(75981.0)), "75.981");
    }

    #[test]
    fn test_display_solve() {
        assert_eq!(display_solve(None, None), "--");
        assert_eq!(
            display_solve(Some(&solve(4321)), Some(&penalty(PenaltyName::Ok))),
            "4.321"
        );
        assert_eq!(
            display_solve(Some(&solve(59723)), Some(&penalty(PenaltyName::PlusTwo))),
            "61.723+"
        );
        assert_eq!(
            display_solve(Some(&solve(4321)), Some(&penalty(PenaltyName::Dnf))),
            "DNF"
        );
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0, false), "0.000");
        assert_eq!(format_clock(9_876, false), "9.876");
        assert_eq!(format_clock(9_876, true), "9.8");
        assert_eq!(format_clock(60_000, false), "1:00.000");
        assert_eq!(format_clock(75_981, false), "1:15.981");
        assert_eq!(format_clock(75_981, true), "1:15.9");
    }
}
