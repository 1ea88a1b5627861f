//! Nested payload shapes as the room channel delivers them
//!
//! Ids are optional here so that a payload missing one decodes fine and is
//! rejected by the store with `Error::MissingId` instead of failing the
//! whole channel frame.

use serde::{Deserialize, Serialize};

use crate::models::{
    MessageId, PenaltyId, PenaltyName, PuzzleTypeId, RoundId, SessionId, SolveId, UserId,
};

/// Full session snapshot sent on join
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub id: Option<SessionId>,
    #[serde(default)]
    pub name: String,
    pub cube_type: Option<PuzzleTypePayload>,
    #[serde(default)]
    pub room_messages: Vec<MessagePayload>,
    /// Newest first
    #[serde(default)]
    pub rounds: Vec<RoundPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PuzzleTypePayload {
    pub id: Option<PuzzleTypeId>,
    #[serde(default)]
    pub name: String,
}

/// Round as sent in the snapshot and in `round_created`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundPayload {
    pub id: Option<RoundId>,
    #[serde(default)]
    pub scramble: String,
    #[serde(default)]
    pub solves: Vec<SolvePayload>,
}

/// Solve as sent in rounds and in `solve_created` / `solve_updated`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolvePayload {
    pub id: Option<SolveId>,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub time: u64,
    pub penalty: Option<PenaltyPayload>,
}

/// Penalty inline with a solve. The id may be left out, in which case the
/// store resolves the name against penalties it already knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyPayload {
    #[serde(default)]
    pub id: Option<PenaltyId>,
    pub name: PenaltyName,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: Option<MessageId>,
    #[serde(default)]
    pub message: String,
    pub user: Option<UserPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl PenaltyPayload {
    pub fn new(id: i64, name: PenaltyName) -> Self {
        Self {
            id: Some(PenaltyId(id)),
            name,
        }
    }

    pub fn by_name(name: PenaltyName) -> Self {
        Self { id: None, name }
    }
}

impl SolvePayload {
    pub fn new(id: i64, user_id: i64, time: u64, penalty: PenaltyPayload) -> Self {
        Self {
            id: Some(SolveId(id)),
            user_id: Some(UserId(user_id)),
            time,
            penalty: Some(penalty),
        }
    }
}

impl RoundPayload {
    pub fn new(id: i64, scramble: impl Into<String>) -> Self {
        Self {
            id: Some(RoundId(id)),
            scramble: scramble.into(),
            solves: Vec::new(),
        }
    }

    pub fn with_solves(mut self, solves: Vec<SolvePayload>) -> Self {
        self.solves = solves;
        self
    }
}

impl UserPayload {
    pub fn new(id: i64, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Some(UserId(id)),
            username: username.into(),
            email: email.into(),
        }
    }
}

impl MessagePayload {
    pub fn new(id: i64, message: impl Into<String>, user: UserPayload) -> Self {
        Self {
            id: Some(MessageId(id)),
            message: message.into(),
            user: Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_solve_without_penalty_id() {
        let json = r#"{"id":112,"user_id":2,"time":9264,"penalty":{"name":"+2"}}"#;
        let solve: SolvePayload = serde_json::from_str(json).unwrap();
        assert_eq!(solve.id, Some(SolveId(112)));
        assert_eq!(solve.penalty, Some(PenaltyPayload::by_name(PenaltyName::PlusTwo)));
    }

    #[test]
    fn test_decode_snapshot() {
        let json = r#"{
            "id": 9,
            "name": "test room",
            "cube_type": {"id": 3, "name": "2x2"},
            "room_messages": [
                {"id": 82, "message": "hi", "user": {"id": 2, "username": "testuser1", "email": "a@example.com"}}
            ],
            "rounds": [{"id": 181, "scramble": "R U", "solves": []}]
        }"#;
        let session: SessionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, Some(SessionId(9)));
        assert_eq!(session.cube_type.unwrap().name, "2x2");
        assert_eq!(session.room_messages.len(), 1);
        assert_eq!(session.rounds[0].id, Some(RoundId(181)));
    }

    #[test]
    fn test_missing_id_still_decodes() {
        let round: RoundPayload = serde_json::from_str(r#"{"scramble":"F2"}"#).unwrap();
        assert_eq!(round.id, None);
        assert!(round.solves.is_empty());
    }
}
