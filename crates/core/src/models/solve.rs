//! Solve and penalty models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PenaltyId, SolveId, UserId};
use crate::error::Error;

/// Penalty applied to a recorded time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyName {
    #[serde(rename = "OK")]
    Ok,
    /// Two seconds added
    #[serde(rename = "+2")]
    PlusTwo,
    /// Did not finish
    #[serde(rename = "DNF")]
    Dnf,
}

impl PenaltyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyName::Ok => "OK",
            PenaltyName::PlusTwo => "+2",
            PenaltyName::Dnf => "DNF",
        }
    }

    pub fn all() -> &'static [PenaltyName] {
        &[PenaltyName::Ok, PenaltyName::PlusTwo, PenaltyName::Dnf]
    }
}

impl fmt::Display for PenaltyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PenaltyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PenaltyName::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPenalty(s.to_string()))
    }
}

/// Penalty reference entity (never mutated once known)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: PenaltyId,
    pub name: PenaltyName,
}

/// A user's recorded time for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solve {
    pub id: SolveId,
    pub user_id: UserId,
    /// Raw recorded duration, before any penalty
    pub time_ms: u64,
    pub penalty_id: PenaltyId,
}
