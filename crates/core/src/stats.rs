//! Trimmed averages over a user's solves
//!
//! Times are milliseconds as `f64`. `f64::INFINITY` stands for a DNF and
//! `None` for "not enough solves yet".

use serde::Serialize;

use crate::models::{Penalty, PenaltyName, Solve, UserId};
use crate::store::RoomStore;

/// Penalized time of a solve. No solve counts as a DNF; a solve whose
/// penalty could not be resolved is taken at face value.
pub fn actual_time(solve: Option<&Solve>, penalty: Option<&Penalty>) -> f64 {
    let Some(solve) = solve else {
        return f64::INFINITY;
    };
    let time = solve.time_ms as f64;
    match penalty.map(|p| p.name) {
        Some(PenaltyName::Ok) | None => time,
        Some(PenaltyName::PlusTwo) => time + 2000.0,
        Some(PenaltyName::Dnf) => f64::INFINITY,
    }
}

/// Average of the first `n` times with the best and worst dropped.
///
/// Only the first occurrence of the minimum and of the maximum is removed,
/// so a window with two DNFs averages to infinity.
pub fn average_of_n(times: &[f64], n: usize) -> Option<f64> {
    if times.len() < n || n <= 2 {
        return None;
    }

    let mut window: Vec<f64> = times[..n].to_vec();
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if let Some(idx) = window.iter().position(|t| *t == min) {
        window.remove(idx);
    }
    if let Some(idx) = window.iter().position(|t| *t == max) {
        window.remove(idx);
    }

    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// A user's penalized times, newest first.
///
/// The current round is still in progress, so it only counts once the user
/// has recorded a solve for it.
pub fn user_time_series(store: &RoomStore, user_id: UserId) -> Vec<f64> {
    let Some(session) = store.session() else {
        return Vec::new();
    };

    let skip = usize::from(!store.has_solve_in_current_round(user_id));
    session
        .round_ids
        .iter()
        .skip(skip)
        .map(|round_id| store.actual_time_for(user_id, *round_id))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub ao5: Option<f64>,
    pub ao12: Option<f64>,
}

pub fn session_stats(store: &RoomStore, user_id: UserId) -> SessionStats {
    let times = user_time_series(store, user_id);
    SessionStats {
        ao5: average_of_n(&times, 5),
        ao12: average_of_n(&times, 12),
    }
}

/// Averages for arbitrary window sizes, in the order given
pub fn averages_for(
    store: &RoomStore,
    user_id: UserId,
    windows: &[usize],
) -> Vec<(usize, Option<f64>)> {
    let times = user_time_series(store, user_id);
    windows
        .iter()
        .map(|n| (*n, average_of_n(&times, *n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PenaltyId, PuzzleTypeId, SessionId, SolveId};
    use crate::payload::{
        PenaltyPayload, PuzzleTypePayload, RoundPayload, SessionPayload, SolvePayload,
    };

    const DNF: f64 = f64::INFINITY;

    fn solve(time_ms: u64) -> Solve {
        Solve {
            id: SolveId(1),
            user_id: UserId(2),
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
    fn test_actual_time() {
        let s = solve(1421);
        assert_eq!(actual_time(Some(&s), Some(&penalty(PenaltyName::Ok))), 1421.0);
        assert_eq!(actual_time(Some(&s), Some(&penalty(PenaltyName::PlusTwo))), 3421.0);
        assert_eq!(actual_time(Some(&s), Some(&penalty(PenaltyName::Dnf))), DNF);
        assert_eq!(actual_time(None, Some(&penalty(PenaltyName::Ok))), DNF);
        assert_eq!(actual_time(None, None), DNF);
    }

    #[test]
    fn test_average_of_5() {
        let times = [1100.0, 2000.0, 3000.0, 4600.0, 7200.0];
        assert_eq!(average_of_n(&times, 5), Some(3200.0));
    }

    #[test]
    fn test_average_with_one_dnf() {
        let times = [1100.0, 2300.0, DNF, 4600.0, 7200.0];
        assert_eq!(average_of_n(&times, 5), Some(4700.0));
    }

    #[test]
    fn test_average_with_two_dnfs() {
        let times = [1100.0, 2300.0, DNF, 4600.0, DNF];
        assert_eq!(average_of_n(&times, 5), Some(DNF));
    }

    #[test]
    fn test_average_of_10() {
        let times = [
            5664.0, 4028.0, 5607.0, 10824.0, 6475.0, 7093.0, 2311.0, 6130.0, 2057.0, 4075.0,
        ];
        assert_eq!(average_of_n(&times, 10), Some(5172.875));
    }

    #[test]
    fn test_average_uses_first_n_only() {
        let times = [1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 1.0, 999_999.0];
        assert_eq!(average_of_n(&times, 5), Some(3000.0));
    }

    #[test]
    fn test_average_with_too_few_times() {
        assert_eq!(average_of_n(&[1000.0, 2000.0], 5), None);
        assert_eq!(average_of_n(&[], 12), None);
    }

    #[test]
    fn test_average_of_identical_times() {
        assert_eq!(average_of_n(&[2000.0; 5], 5), Some(2000.0));
    }

    fn store_with_rounds(rounds: Vec<RoundPayload>) -> RoomStore {
        let mut store = RoomStore::new();
        store
            .apply_snapshot(&SessionPayload {
                id: Some(SessionId(1)),
                name: "room".to_string(),
                cube_type: Some(PuzzleTypePayload {
                    id: Some(PuzzleTypeId(1)),
                    name: "3x3".to_string(),
                }),
                room_messages: Vec::new(),
                rounds,
            })
            .unwrap();
        store
    }

    fn ok(id: i64, user: i64, time: u64) -> SolvePayload {
        SolvePayload::new(id, user, time, PenaltyPayload::new(1, PenaltyName::Ok))
    }

    #[test]
    fn test_series_skips_unsolved_current_round() {
        let mut rounds = vec![RoundPayload::new(10, "current")];
        for i in 0..5 {
            let time = 1000 * (i as u64 + 1);
            rounds.push(RoundPayload::new(9 - i, "x").with_solves(vec![ok(100 + i, 2, time)]));
        }
        let store = store_with_rounds(rounds);

        let series = user_time_series(&store, UserId(2));
        assert_eq!(series, vec![1000.0, 2000.0, 3000.0, 4000.0, 5000.0]);
        assert_eq!(session_stats(&store, UserId(2)).ao5, Some(3000.0));
        assert_eq!(session_stats(&store, UserId(2)).ao12, None);
    }

    #[test]
    fn test_series_includes_solved_current_round() {
        let store = store_with_rounds(vec![
            RoundPayload::new(2, "current").with_solves(vec![ok(20, 2, 4000)]),
            RoundPayload::new(1, "x").with_solves(vec![ok(10, 2, 3000)]),
        ]);
        assert_eq!(user_time_series(&store, UserId(2)), vec![4000.0, 3000.0]);
    }

    #[test]
    fn test_missed_rounds_count_as_dnf() {
        let store = store_with_rounds(vec![
            RoundPayload::new(3, "current"),
            RoundPayload::new(2, "x"),
            RoundPayload::new(1, "x").with_solves(vec![ok(10, 2, 3000)]),
        ]);
        assert_eq!(user_time_series(&store, UserId(2)), vec![DNF, 3000.0]);
        assert!(user_time_series(&RoomStore::new(), UserId(2)).is_empty());
    }

    #[test]
    fn test_averages_for_windows() {
        let store = store_with_rounds(vec![
            RoundPayload::new(3, "x").with_solves(vec![ok(30, 2, 3000)]),
            RoundPayload::new(2, "x").with_solves(vec![ok(20, 2, 2000)]),
            RoundPayload::new(1, "x").with_solves(vec![ok(10, 2, 1000)]),
        ]);
        assert_eq!(
            averages_for(&store, UserId(2), &[3, 5]),
            vec![(3, Some(2000.0)), (5, None)]
        );
    }
}
