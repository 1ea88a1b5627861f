//! Entity tables and merge rules

use std::collections::HashMap;

use tracing::{debug, warn};

use super::normalize::Batch;
use crate::models::{
    MessageId, Penalty, PenaltyId, PenaltyName, PuzzleType, PuzzleTypeId, RoomMessage, Round,
    RoundId, Solve, SolveId, User, UserId,
};

/// One id-to-record map per entity kind
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub(crate) puzzle_types: HashMap<PuzzleTypeId, PuzzleType>,
    pub(crate) rounds: HashMap<RoundId, Round>,
    pub(crate) solves: HashMap<SolveId, Solve>,
    pub(crate) penalties: HashMap<PenaltyId, Penalty>,
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) messages: HashMap<MessageId, RoomMessage>,
    /// Round each linked solve belongs to
    pub(crate) solve_rounds: HashMap<SolveId, RoundId>,
}

impl Tables {
    pub(crate) fn penalty_by_name(&self, name: PenaltyName) -> Option<&Penalty> {
        self.penalties.values().find(|p| p.name == name)
    }

    /// Union a normalized batch into the tables
    pub(crate) fn merge(&mut self, batch: Batch) {
        for puzzle_type in batch.puzzle_types {
            self.puzzle_types.insert(puzzle_type.id, puzzle_type);
        }

        for penalty in batch.penalties {
            self.penalties.insert(penalty.id, penalty);
        }

        for user in batch.users {
            self.users.insert(user.id, user);
        }

        for solve in batch.solves {
            self.merge_solve(solve);
        }

        for round in batch.rounds {
            self.merge_round(round);
        }

        for message in batch.messages {
            self.messages.entry(message.id).or_insert(message);
        }
    }

    fn merge_solve(&mut self, mut solve: Solve) {
        if let Some(existing) = self.solves.get(&solve.id) {
            if existing.user_id != solve.user_id {
                warn!(
                    solve_id = %solve.id,
                    kept = %existing.user_id,
                    received = %solve.user_id,
                    "Solve update tried to change its owner"
                );
                solve.user_id = existing.user_id;
            }
        }
        self.solves.insert(solve.id, solve);
    }

    fn merge_round(&mut self, round: Round) {
        let Round {
            id,
            scramble,
            solve_ids,
        } = round;

        match self.rounds.get_mut(&id) {
            Some(existing) => {
                debug!(round_id = %id, "Merging round already known");
                existing.scramble = scramble;
            }
            None => {
                self.rounds.insert(id, Round::new(id, scramble));
            }
        }

        for solve_id in solve_ids {
            self.link_solve(id, solve_id);
        }
    }

    /// Attach a solve to a round, keeping one solve per user per round.
    /// Returns false when the solve was not linked.
    pub(crate) fn link_solve(&mut self, round_id: RoundId, solve_id: SolveId) -> bool {
        if let Some(owner) = self.solve_rounds.get(&solve_id) {
            if *owner != round_id {
                debug!(
                    solve_id = %solve_id,
                    round_id = %owner,
                    "Solve already belongs to another round"
                );
            }
            return false;
        }

        let Some(user_id) = self.solves.get(&solve_id).map(|s| s.user_id) else {
            warn!(solve_id = %solve_id, "Cannot link unknown solve");
            return false;
        };

        let Some(round) = self.rounds.get_mut(&round_id) else {
            warn!(round_id = %round_id, "Cannot link solve to unknown round");
            return false;
        };

        let taken = round.solve_ids.iter().any(|id| {
            self.solves
                .get(id)
                .map(|s| s.user_id == user_id)
                .unwrap_or(false)
        });
        if taken {
            warn!(
                round_id = %round_id,
                user_id = %user_id,
                solve_id = %solve_id,
                "User already has a solve in this round; ignoring"
            );
            return false;
        }

        round.solve_ids.push(solve_id);
        self.solve_rounds.insert(solve_id, round_id);
        true
    }
}
