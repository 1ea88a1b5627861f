//! Session, round and puzzle type models

use serde::{Deserialize, Serialize};

use super::{MessageId, PuzzleTypeId, RoundId, SessionId, SolveId};

/// One timing room instance with its rounds and chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub puzzle_type_id: PuzzleTypeId,
    /// Newest first; `round_ids[0]` is the current round
    pub round_ids: Vec<RoundId>,
    /// Chronological
    pub message_ids: Vec<MessageId>,
}

impl Session {
    pub fn current_round_id(&self) -> Option<RoundId> {
        self.round_ids.first().copied()
    }

    /// 1-based round number, counting the oldest round as 1
    pub fn round_number(&self, round_id: RoundId) -> Option<usize> {
        let idx = self.round_ids.iter().position(|id| *id == round_id)?;
        Some(self.round_ids.len() - idx)
    }
}

/// One timed attempt slot shared by everyone in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub scramble: String,
    /// At most one solve per user
    pub solve_ids: Vec<SolveId>,
}

impl Round {
    pub fn new(id: RoundId, scramble: String) -> Self {
        Self {
            id,
            scramble,
            solve_ids: Vec::new(),
        }
    }
}

/// Puzzle being solved in a session, e.g. "3x3"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleType {
    pub id: PuzzleTypeId,
    pub name: String,
}
