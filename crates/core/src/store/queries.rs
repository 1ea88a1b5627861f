//! Read-only queries over the store

use super::RoomStore;
use crate::display::display_solve;
use crate::models::{
    ChatLine, MessageId, Penalty, PuzzleType, RoomMessage, Round, RoundId, Session, Solve,
    SolveId, User, UserId,
};
use crate::stats::actual_time;

/// One row of the times table: a round and each listed user's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimesRow {
    pub round_id: RoundId,
    /// 1-based, oldest round is 1
    pub number: usize,
    pub cells: Vec<String>,
}

impl RoomStore {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_round(&self) -> Option<&Round> {
        let round_id = self.session()?.current_round_id()?;
        self.tables.rounds.get(&round_id)
    }

    pub fn current_scramble(&self) -> Option<&str> {
        self.current_round().map(|r| r.scramble.as_str())
    }

    pub fn puzzle_type(&self) -> Option<&PuzzleType> {
        let session = self.session()?;
        self.tables.puzzle_types.get(&session.puzzle_type_id)
    }

    pub fn puzzle_name(&self) -> Option<&str> {
        self.puzzle_type().map(|p| p.name.as_str())
    }

    pub fn round(&self, id: RoundId) -> Option<&Round> {
        self.tables.rounds.get(&id)
    }

    pub fn solve(&self, id: SolveId) -> Option<&Solve> {
        self.tables.solves.get(&id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.tables.users.get(&id)
    }

    pub fn message(&self, id: MessageId) -> Option<&RoomMessage> {
        self.tables.messages.get(&id)
    }

    pub fn penalty_of(&self, solve: &Solve) -> Option<&Penalty> {
        self.tables.penalties.get(&solve.penalty_id)
    }

    /// Round a linked solve belongs to
    pub fn round_of(&self, solve_id: SolveId) -> Option<RoundId> {
        self.tables.solve_rounds.get(&solve_id).copied()
    }

    /// The user's solve in a round, if they recorded one
    pub fn solve_for_user(&self, user_id: UserId, round_id: RoundId) -> Option<&Solve> {
        self.round(round_id)?
            .solve_ids
            .iter()
            .filter_map(|id| self.tables.solves.get(id))
            .find(|s| s.user_id == user_id)
    }

    pub fn has_solve_in_current_round(&self, user_id: UserId) -> bool {
        self.current_round()
            .map(|r| self.solve_for_user(user_id, r.id).is_some())
            .unwrap_or(false)
    }

    /// Every solve the user recorded this session, newest round first
    pub fn solve_history(&self, user_id: UserId) -> Vec<(RoundId, &Solve)> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        session
            .round_ids
            .iter()
            .filter_map(|round_id| {
                self.solve_for_user(user_id, *round_id)
                    .map(|solve| (*round_id, solve))
            })
            .collect()
    }

    /// Penalized time in milliseconds; `INFINITY` for DNF or no solve
    pub fn actual_time_for(&self, user_id: UserId, round_id: RoundId) -> f64 {
        let solve = self.solve_for_user(user_id, round_id);
        actual_time(solve, solve.and_then(|s| self.penalty_of(s)))
    }

    /// The user's result in a round as the times table shows it
    pub fn displayed_solve(&self, user_id: UserId, round_id: RoundId) -> String {
        let solve = self.solve_for_user(user_id, round_id);
        display_solve(solve, solve.and_then(|s| self.penalty_of(s)))
    }

    /// Chat history in order, joined with authors
    pub fn chat_lines(&self) -> Vec<ChatLine<'_>> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        session
            .message_ids
            .iter()
            .filter_map(|id| self.tables.messages.get(id))
            .map(|message| ChatLine {
                message,
                author: self.tables.users.get(&message.user_id),
            })
            .collect()
    }

    /// Newest round first, one cell per requested user
    pub fn times_table(&self, users: &[UserId]) -> Vec<TimesRow> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        let total = session.round_ids.len();
        session
            .round_ids
            .iter()
            .enumerate()
            .map(|(idx, round_id)| TimesRow {
                round_id: *round_id,
                number: total - idx,
                cells: users
                    .iter()
                    .map(|user_id| self.displayed_solve(*user_id, *round_id))
                    .collect(),
            })
            .collect()
    }
}
