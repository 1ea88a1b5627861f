//! Flattening nested payloads into entity records
//!
//! A whole payload is normalized into a `Batch` before anything touches the
//! store, so a missing id anywhere in it leaves the store as it was.

use crate::error::{Error, Result};
use crate::models::{
    MessageId, Penalty, PenaltyId, PuzzleType, PuzzleTypeId, RoomMessage, Round, RoundId,
    Session, Solve, SolveId, User, UserId,
};
use crate::payload::{
    MessagePayload, PenaltyPayload, PuzzleTypePayload, RoundPayload, SessionPayload, SolvePayload,
    UserPayload,
};

use super::tables::Tables;

/// Records produced from one payload, not yet merged
#[derive(Debug, Default)]
pub(crate) struct Batch {
    pub session: Option<Session>,
    pub puzzle_types: Vec<PuzzleType>,
    pub rounds: Vec<Round>,
    pub solves: Vec<Solve>,
    pub penalties: Vec<Penalty>,
    pub users: Vec<User>,
    pub messages: Vec<RoomMessage>,
}

/// Normalizes payloads, resolving id-less penalties against `known`
pub(crate) struct Normalizer<'a> {
    known: &'a Tables,
    batch: Batch,
}

impl<'a> Normalizer<'a> {
    pub fn new(known: &'a Tables) -> Self {
        Self {
            known,
            batch: Batch::default(),
        }
    }

    pub fn finish(self) -> Batch {
        self.batch
    }

    pub fn session(&mut self, payload: &SessionPayload) -> Result<()> {
        let id = payload.id.ok_or(Error::MissingId {
            entity: "session",
            field: "id",
        })?;
        let puzzle_type_id = self.puzzle_type(payload.cube_type.as_ref())?;

        let mut round_ids = Vec::with_capacity(payload.rounds.len());
        for round in &payload.rounds {
            let round_id = self.round(round)?;
            if !round_ids.contains(&round_id) {
                round_ids.push(round_id);
            }
        }

        let mut message_ids = Vec::with_capacity(payload.room_messages.len());
        for message in &payload.room_messages {
            let message_id = self.message(message)?;
            if !message_ids.contains(&message_id) {
                message_ids.push(message_id);
            }
        }

        self.batch.session = Some(Session {
            id,
            name: payload.name.clone(),
            puzzle_type_id,
            round_ids,
            message_ids,
        });
        Ok(())
    }

    fn puzzle_type(&mut self, payload: Option<&PuzzleTypePayload>) -> Result<PuzzleTypeId> {
        let payload = payload.ok_or(Error::MissingId {
            entity: "session",
            field: "cube_type.id",
        })?;
        let id = payload.id.ok_or(Error::MissingId {
            entity: "puzzle type",
            field: "id",
        })?;
        self.batch.puzzle_types.push(PuzzleType {
            id,
            name: payload.name.clone(),
        });
        Ok(id)
    }

    pub fn round(&mut self, payload: &RoundPayload) -> Result<RoundId> {
        let id = payload.id.ok_or(Error::MissingId {
            entity: "round",
            field: "id",
        })?;

        let mut solve_ids = Vec::with_capacity(payload.solves.len());
        for solve in &payload.solves {
            let solve_id = self.solve(solve)?;
            if !solve_ids.contains(&solve_id) {
                solve_ids.push(solve_id);
            }
        }

        self.batch.rounds.push(Round {
            id,
            scramble: payload.scramble.clone(),
            solve_ids,
        });
        Ok(id)
    }

    pub fn solve(&mut self, payload: &SolvePayload) -> Result<SolveId> {
        let id = payload.id.ok_or(Error::MissingId {
            entity: "solve",
            field: "id",
        })?;
        let user_id = payload.user_id.ok_or(Error::MissingId {
            entity: "solve",
            field: "user_id",
        })?;
        let penalty = payload.penalty.as_ref().ok_or(Error::MissingId {
            entity: "solve",
            field: "penalty.id",
        })?;
        let penalty_id = self.penalty(penalty)?;

        self.batch.solves.push(Solve {
            id,
            user_id,
            time_ms: payload.time,
            penalty_id,
        });
        Ok(id)
    }

    fn penalty(&mut self, payload: &PenaltyPayload) -> Result<PenaltyId> {
        if let Some(id) = payload.id {
            self.push_penalty(Penalty {
                id,
                name: payload.name,
            });
            return Ok(id);
        }

        if let Some(known) = self.batch.penalties.iter().find(|p| p.name == payload.name) {
            return Ok(known.id);
        }

        match self.known.penalty_by_name(payload.name) {
            Some(known) => {
                let known = *known;
                self.push_penalty(known);
                Ok(known.id)
            }
            None => Err(Error::MissingId {
                entity: "penalty",
                field: "id",
            }),
        }
    }

    fn push_penalty(&mut self, penalty: Penalty) {
        if !self.batch.penalties.contains(&penalty) {
            self.batch.penalties.push(penalty);
        }
    }

    pub fn message(&mut self, payload: &MessagePayload) -> Result<MessageId> {
        let id = payload.id.ok_or(Error::MissingId {
            entity: "message",
            field: "id",
        })?;
        let user = payload.user.as_ref().ok_or(Error::MissingId {
            entity: "message",
            field: "user.id",
        })?;
        let user_id = self.user(user)?;

        self.batch.messages.push(RoomMessage {
            id,
            user_id,
            text: payload.message.clone(),
        });
        Ok(id)
    }

    fn user(&mut self, payload: &UserPayload) -> Result<UserId> {
        let id = payload.id.ok_or(Error::MissingId {
            entity: "user",
            field: "id",
        })?;
        self.batch.users.push(User {
            id,
            username: payload.username.clone(),
            email: payload.email.clone(),
        });
        Ok(id)
    }
}
