//! Room channel envelopes
//!
//! Every frame carries one JSON envelope of the form
//! `{"event": "<name>", "payload": {...}}`.

use serde::{Deserialize, Serialize};

use timeroom_core::{
    MessagePayload, PenaltyName, PresenceDiff, PresenceMap, RoundPayload, SessionPayload,
    SolvePayload,
};

/// Events the server pushes to the client, in delivery order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Inbound {
    /// Full session, sent once on join
    Snapshot(SessionPayload),
    RoundCreated(RoundPayload),
    SolveCreated(SolvePayload),
    SolveUpdated(SolvePayload),
    MessageCreated(MessagePayload),
    PresenceState(PresenceMap),
    PresenceDiff(PresenceDiff),
}

/// Requests the client sends to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Push {
    NewRound,
    NewSolve { time: u64 },
    ChangePenalty { penalty: PenaltyName },
    SendMessage { message: String },
}

impl Inbound {
    pub fn name(&self) -> &'static str {
        match self {
            Inbound::Snapshot(_) => "snapshot",
            Inbound::RoundCreated(_) => "round_created",
            Inbound::SolveCreated(_) => "solve_created",
            Inbound::SolveUpdated(_) => "solve_updated",
            Inbound::MessageCreated(_) => "message_created",
            Inbound::PresenceState(_) => "presence_state",
            Inbound::PresenceDiff(_) => "presence_diff",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Push {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
