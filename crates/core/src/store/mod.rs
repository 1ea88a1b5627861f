//! Session synchronization store
//!
//! Holds the normalized entity graph for the room this client is connected
//! to. The graph is built from the join snapshot and then grows through the
//! four incremental `apply_*` operations, which are the only writers.
//!
//! Events are applied in the order the channel delivers them. Each merge is
//! idempotent per entity, so redelivering an event is harmless.

mod normalize;
mod queries;
mod tables;

use tracing::debug;

use crate::error::{Error, Result};
use crate::invariants::assert_store_invariants;
use crate::models::{MessageId, RoundId, Session, SolveId};
use crate::payload::{MessagePayload, RoundPayload, SessionPayload, SolvePayload};

use normalize::Normalizer;
pub use queries::TimesRow;
pub use tables::Tables;

/// Client-side store for the current room session
#[derive(Debug, Default)]
pub struct RoomStore {
    session: Option<Session>,
    tables: Tables,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a full session snapshot
    pub fn apply_snapshot(&mut self, payload: &SessionPayload) -> Result<()> {
        let mut normalizer = Normalizer::new(&self.tables);
        normalizer.session(payload)?;
        let mut batch = normalizer.finish();

        let session = batch.session.take().ok_or(Error::MissingId {
            entity: "session",
            field: "id",
        })?;

        let mut tables = Tables::default();
        tables.merge(batch);

        debug!(
            session_id = %session.id,
            rounds = session.round_ids.len(),
            messages = session.message_ids.len(),
            "Applied session snapshot"
        );

        self.tables = tables;
        self.session = Some(session);
        self.check();
        Ok(())
    }

    /// Add a newly created round in front of the round list
    pub fn apply_round_created(&mut self, payload: &RoundPayload) -> Result<RoundId> {
        if self.session.is_none() {
            return Err(Error::NoSession);
        }

        let mut normalizer = Normalizer::new(&self.tables);
        let round_id = normalizer.round(payload)?;
        let batch = normalizer.finish();
        self.tables.merge(batch);

        let session = self.session.as_mut().ok_or(Error::NoSession)?;
        if session.round_ids.contains(&round_id) {
            debug!(round_id = %round_id, "Round already in session; not prepending again");
        } else {
            session.round_ids.insert(0, round_id);
            debug!(round_id = %round_id, "Applied round_created");
        }

        self.check();
        Ok(round_id)
    }

    /// Record a new solve against the current round.
    ///
    /// The event names no round: the solve belongs to whichever round is
    /// current when it is applied. This relies on the server creating rounds
    /// and their solves in strict order on one channel.
    pub fn apply_solve_created(&mut self, payload: &SolvePayload) -> Result<SolveId> {
        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        let round_id = session
            .current_round_id()
            .ok_or(Error::NoCurrentRound(session.id))?;

        let mut normalizer = Normalizer::new(&self.tables);
        let solve_id = normalizer.solve(payload)?;
        let batch = normalizer.finish();
        self.tables.merge(batch);

        if self.tables.link_solve(round_id, solve_id) {
            debug!(solve_id = %solve_id, round_id = %round_id, "Applied solve_created");
        }

        self.check();
        Ok(solve_id)
    }

    /// Replace a solve's time and penalty in place
    pub fn apply_solve_updated(&mut self, payload: &SolvePayload) -> Result<SolveId> {
        if self.session.is_none() {
            return Err(Error::NoSession);
        }

        let mut normalizer = Normalizer::new(&self.tables);
        let solve_id = normalizer.solve(payload)?;
        let batch = normalizer.finish();

        if !self.tables.solves.contains_key(&solve_id) {
            debug!(solve_id = %solve_id, "solve_updated for a solve not seen before");
        }
        self.tables.merge(batch);
        debug!(solve_id = %solve_id, "Applied solve_updated");

        self.check();
        Ok(solve_id)
    }

    /// Append a chat message
    pub fn apply_message_created(&mut self, payload: &MessagePayload) -> Result<MessageId> {
        if self.session.is_none() {
            return Err(Error::NoSession);
        }

        let mut normalizer = Normalizer::new(&self.tables);
        let message_id = normalizer.message(payload)?;
        let batch = normalizer.finish();
        self.tables.merge(batch);

        let session = self.session.as_mut().ok_or(Error::NoSession)?;
        if !session.message_ids.contains(&message_id) {
            session.message_ids.push(message_id);
            debug!(message_id = %message_id, "Applied message_created");
        }

        self.check();
        Ok(message_id)
    }

    fn check(&self) {
        if cfg!(debug_assertions) {
            if let Some(session) = &self.session {
                assert_store_invariants(session, &self.tables);
            }
        }
    }
}
