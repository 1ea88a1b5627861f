//! Error types for Timeroom Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing id: {entity} payload has no {field}")]
    MissingId {
        entity: &'static str,
        field: &'static str,
    },

    #[error("No session: the room snapshot has not been applied")]
    NoSession,

    #[error("No current round in session {0}")]
    NoCurrentRound(crate::models::SessionId),

    #[error("Unknown penalty: {0}")]
    UnknownPenalty(String),

    #[error("Invalid time entry: {0}")]
    InvalidTimeEntry(String),

    #[error("Malformed packet: {0}")]
    Packet(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
