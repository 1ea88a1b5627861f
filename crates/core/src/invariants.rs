//! Developer guardrails and invariants
//!
//! Debug assertions over the normalized entity graph. They are run after
//! every store write in debug builds and compiled out in release builds.

use std::collections::HashSet;

use crate::models::Session;
use crate::store::Tables;

/// Validate that the session and its tables are internally consistent
pub fn assert_store_invariants(session: &Session, tables: &Tables) {
    let mut seen_rounds = HashSet::new();
    for round_id in &session.round_ids {
        debug_assert!(
            seen_rounds.insert(*round_id),
            "Session {} lists round {} twice",
            session.id,
            round_id
        );

        let round = tables.rounds.get(round_id);
        debug_assert!(
            round.is_some(),
            "Session {} references missing round {}",
            session.id,
            round_id
        );
        let Some(round) = round else { continue };

        let mut users = HashSet::new();
        for solve_id in &round.solve_ids {
            let solve = tables.solves.get(solve_id);
            debug_assert!(
                solve.is_some(),
                "Round {} references missing solve {}",
                round.id,
                solve_id
            );
            let Some(solve) = solve else { continue };

            debug_assert!(
                users.insert(solve.user_id),
                "Round {} has more than one solve for user {}",
                round.id,
                solve.user_id
            );
        }
    }

    for solve in tables.solves.values() {
        debug_assert!(
            tables.penalties.contains_key(&solve.penalty_id),
            "Solve {} has unresolved penalty {}",
            solve.id,
            solve.penalty_id
        );
    }

    for message_id in &session.message_ids {
        debug_assert!(
            tables.messages.contains_key(message_id),
            "Session {} references missing message {}",
            session.id,
            message_id
        );
    }
}
