//! Entity identifiers
//!
//! The server hands out integer ids. Each entity kind gets its own newtype
//! so a solve id can never be used to look up a round.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a timing session (one per room connection)
    SessionId
);
entity_id!(
    /// Identifier of a round
    RoundId
);
entity_id!(SolveId);
entity_id!(PenaltyId);
entity_id!(UserId);
entity_id!(MessageId);
entity_id!(PuzzleTypeId);
