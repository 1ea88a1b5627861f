//! Client-side room state: store, presence, and the local timer together

use tracing::{debug, instrument, trace};

use timeroom_core::store::RoomStore;
use timeroom_core::{
    parse_time_entry, session_stats, Clock, InputSource, PenaltyName, Presence, RoomConfig,
    SessionStats, TimeEntry, Timer, TimerEvent, TimerState, TimesRow, UserId,
};

use crate::error::Result;
use crate::protocol::{Inbound, Push};

/// Everything the client knows about the room it is in, for one local user
#[derive(Debug)]
pub struct RoomSession<C: Clock> {
    user_id: UserId,
    store: RoomStore,
    presence: Presence,
    timer: Timer<C>,
    time_entry: TimeEntry,
}

impl<C: Clock> RoomSession<C> {
    pub fn new(user_id: UserId, clock: C, config: &RoomConfig) -> Self {
        Self {
            user_id,
            store: RoomStore::new(),
            presence: Presence::new(),
            timer: Timer::new(clock, config.timer_settings()),
            time_entry: config.time_entry,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    pub fn time_entry(&self) -> TimeEntry {
        self.time_entry
    }

    /// Apply one server event
    #[instrument(skip_all, fields(event = event.name()))]
    pub fn handle_inbound(&mut self, event: Inbound) -> Result<()> {
        match event {
            Inbound::Snapshot(payload) => {
                self.store.apply_snapshot(&payload)?;
                self.sync_current_solve();
            }
            Inbound::RoundCreated(payload) => {
                self.store.apply_round_created(&payload)?;
                if self.timer.state() == TimerState::Solved {
                    self.timer.reset();
                }
                self.sync_current_solve();
            }
            Inbound::SolveCreated(payload) => {
                self.store.apply_solve_created(&payload)?;
                self.sync_current_solve();
            }
            Inbound::SolveUpdated(payload) => {
                self.store.apply_solve_updated(&payload)?;
            }
            Inbound::MessageCreated(payload) => {
                self.store.apply_message_created(&payload)?;
            }
            Inbound::PresenceState(state) => self.presence.apply_state(&state),
            Inbound::PresenceDiff(diff) => self.presence.apply_diff(&diff),
        }
        Ok(())
    }

    /// Feed a manual or hardware timer event. Events from a source the
    /// current time entry method does not use are dropped. Deadlines
    /// already due fire first. A finished solve becomes a `new_solve` push.
    pub fn handle_input(&mut self, source: InputSource, event: TimerEvent) -> Option<Push> {
        if !self.time_entry.accepts(source) {
            trace!(?source, ?event, entry = %self.time_entry, "Input not used by entry method");
            return None;
        }
        self.timer.poll();
        let stopped = self.timer.handle(event)?;
        debug!(elapsed_ms = stopped.elapsed_ms, "Submitting solve");
        Some(Push::NewSolve {
            time: stopped.elapsed_ms,
        })
    }

    pub fn poll_timer(&mut self) {
        self.timer.poll();
    }

    pub fn time_until_deadline(&self) -> Option<u64> {
        self.timer.time_until_deadline()
    }

    pub fn set_input_focused(&mut self, focused: bool) {
        self.timer.set_input_focused(focused);
    }

    /// Switch to the next entry method. Refused while a solve is running;
    /// a hold in progress is dropped.
    pub fn cycle_time_entry(&mut self) -> TimeEntry {
        match self.timer.state() {
            TimerState::Solving => {
                debug!(entry = %self.time_entry, "Solve running; keeping entry method");
                return self.time_entry;
            }
            TimerState::Preparing | TimerState::Ready => {
                self.timer.reset();
            }
            TimerState::Neutral | TimerState::Solved => {}
        }
        self.time_entry = self.time_entry.next();
        debug!(entry = %self.time_entry, "Time entry method changed");
        self.time_entry
    }

    pub fn new_round(&self) -> Push {
        Push::NewRound
    }

    /// Change the penalty on the local user's solve for the current round
    pub fn change_penalty(&self, penalty: PenaltyName) -> Option<Push> {
        if !self.store.has_solve_in_current_round(self.user_id) {
            debug!(%penalty, "No solve in the current round to penalize");
            return None;
        }
        Some(Push::ChangePenalty { penalty })
    }

    pub fn send_message(&self, text: &str) -> Option<Push> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        Some(Push::SendMessage {
            message: message.to_string(),
        })
    }

    /// Submit a typed-in time. Only used with keyboard entry.
    pub fn submit_keyboard_time(&self, text: &str) -> Result<Option<Push>> {
        let time = parse_time_entry(text)?;
        if self.time_entry != TimeEntry::Keyboard {
            debug!(entry = %self.time_entry, "Typed time outside keyboard entry");
            return Ok(None);
        }
        if self.store.has_solve_in_current_round(self.user_id) {
            debug!("Already solved this round; not submitting");
            return Ok(None);
        }
        Ok(Some(Push::NewSolve { time }))
    }

    /// Times table columns are the users currently present
    pub fn times_table(&self) -> Vec<TimesRow> {
        self.store.times_table(&self.presence.user_ids())
    }

    pub fn stats(&self) -> SessionStats {
        session_stats(&self.store, self.user_id)
    }

    fn sync_current_solve(&mut self) {
        let solve = self
            .store
            .current_round()
            .and_then(|round| self.store.solve_for_user(self.user_id, round.id));

        match solve {
            Some(solve) => {
                self.timer.set_has_current_solve(true);
                if self.timer.state() == TimerState::Neutral {
                    self.timer.preset(solve.time_ms);
                }
            }
            None => self.timer.set_has_current_solve(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeroom_core::{
        ManualClock, MessagePayload, PenaltyPayload, PresenceEntry, PresenceMap, PuzzleTypeId,
        PuzzleTypePayload, RoundPayload, SessionId, SessionPayload, SolvePayload, User,
        UserPayload,
    };

    fn snapshot() -> SessionPayload {
        SessionPayload {
            id: Some(SessionId(9)),
            name: "test room".to_string(),
            cube_type: Some(PuzzleTypePayload {
                id: Some(PuzzleTypeId(1)),
                name: "3x3".to_string(),
            }),
            room_messages: Vec::new(),
            rounds: vec![RoundPayload::new(181, "R U R'")],
        }
    }

    fn session() -> (RoomSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let mut room = RoomSession::new(UserId(2), clock.clone(), &RoomConfig::default());
        room.handle_inbound(Inbound::Snapshot(snapshot())).unwrap();
        (room, clock)
    }

    fn solve_by(user: i64, id: i64, time: u64) -> SolvePayload {
        SolvePayload::new(id, user, time, PenaltyPayload::new(1, PenaltyName::Ok))
    }

    fn run_solve(
        room: &mut RoomSession<ManualClock>,
        clock: &ManualClock,
        ms: u64,
    ) -> Option<Push> {
        room.handle_input(InputSource::Manual, TimerEvent::Engage);
        clock.advance(500);
        room.poll_timer();
        room.handle_input(InputSource::Manual, TimerEvent::Release);
        clock.advance(ms);
        room.handle_input(InputSource::Manual, TimerEvent::Engage)
    }

    #[test]
    fn test_local_solve_becomes_push() {
        let (mut room, clock) = session();
        let push = run_solve(&mut room, &clock, 8_123);
        assert_eq!(push, Some(Push::NewSolve { time: 8_123 }));
    }

    #[test]
    fn test_keyboard_entry_ignores_timer_input() {
        let (mut room, clock) = session();
        assert_eq!(room.cycle_time_entry(), TimeEntry::Keyboard);
        assert_eq!(run_solve(&mut room, &clock, 1_000), None);
        assert_eq!(room.timer().state(), TimerState::Neutral);
    }

    #[test]
    fn test_stackmat_entry_takes_only_device_events() {
        let (mut room, clock) = session();
        room.cycle_time_entry();
        assert_eq!(room.cycle_time_entry(), TimeEntry::Stackmat);
        assert_eq!(run_solve(&mut room, &clock, 1_000), None);
        assert_eq!(room.timer().state(), TimerState::Neutral);

        let device = InputSource::Stackmat;
        room.handle_input(device, TimerEvent::Engage);
        clock.advance(600);
        room.handle_input(device, TimerEvent::Release);
        assert_eq!(room.timer().state(), TimerState::Solving);
        room.handle_input(device, TimerEvent::HardwareTick(4_000));
        assert_eq!(
            room.handle_input(device, TimerEvent::HardwareStop(4_321)),
            Some(Push::NewSolve { time: 4_321 })
        );
    }

    #[test]
    fn test_stopwatch_entry_ignores_device_events() {
        let (mut room, clock) = session();
        assert_eq!(room.time_entry(), TimeEntry::Stopwatch);
        room.handle_input(InputSource::Stackmat, TimerEvent::Engage);
        clock.advance(600);
        room.handle_input(InputSource::Stackmat, TimerEvent::Release);
        assert_eq!(room.timer().state(), TimerState::Neutral);
        assert_eq!(run_solve(&mut room, &clock, 2_000), Some(Push::NewSolve { time: 2_000 }));
    }

    #[test]
    fn test_entry_method_kept_while_solving() {
        let (mut room, clock) = session();
        room.handle_input(InputSource::Manual, TimerEvent::Engage);
        clock.advance(500);
        room.handle_input(InputSource::Manual, TimerEvent::Release);
        assert_eq!(room.timer().state(), TimerState::Solving);
        assert_eq!(room.cycle_time_entry(), TimeEntry::Stopwatch);

        clock.advance(700);
        assert_eq!(
            room.handle_input(InputSource::Manual, TimerEvent::Engage),
            Some(Push::NewSolve { time: 700 })
        );
    }

    #[test]
    fn test_own_solve_during_hold_presets_timer() {
        let (mut room, clock) = session();
        room.handle_input(InputSource::Manual, TimerEvent::Engage);
        clock.advance(500);
        room.poll_timer();
        assert_eq!(room.timer().state(), TimerState::Ready);

        room.handle_inbound(Inbound::SolveCreated(solve_by(2, 110, 8_123)))
            .unwrap();
        assert_eq!(room.timer().state(), TimerState::Solved);
        assert_eq!(room.timer().display(), "8.123");
    }

    #[test]
    fn test_own_solve_blocks_timer_until_next_round() {
        let (mut room, clock) = session();
        room.handle_inbound(Inbound::SolveCreated(solve_by(2, 110, 8_123)))
            .unwrap();
        assert!(room.timer().has_current_solve());
        assert_eq!(run_solve(&mut room, &clock, 1_000), None);

        room.handle_inbound(Inbound::RoundCreated(RoundPayload::new(182, "F")))
            .unwrap();
        assert!(!room.timer().has_current_solve());
        assert_eq!(room.timer().state(), TimerState::Neutral);
        assert!(run_solve(&mut room, &clock, 1_000).is_some());
    }

    #[test]
    fn test_other_users_solve_does_not_block() {
        let (mut room, clock) = session();
        room.handle_inbound(Inbound::SolveCreated(solve_by(6, 111, 5_000)))
            .unwrap();
        assert!(run_solve(&mut room, &clock, 1_000).is_some());
    }

    #[test]
    fn test_snapshot_with_own_solve_presets_timer() {
        let clock = ManualClock::new(0);
        let mut room = RoomSession::new(UserId(2), clock, &RoomConfig::default());
        let mut payload = snapshot();
        payload.rounds[0].solves.push(solve_by(2, 110, 12_345));
        room.handle_inbound(Inbound::Snapshot(payload)).unwrap();

        assert_eq!(room.timer().state(), TimerState::Solved);
        assert_eq!(room.timer().display(), "12.345");
    }

    #[test]
    fn test_change_penalty_needs_a_solve() {
        let (mut room, _clock) = session();
        assert_eq!(room.change_penalty(PenaltyName::Dnf), None);

        room.handle_inbound(Inbound::SolveCreated(solve_by(2, 110, 8_123)))
            .unwrap();
        assert_eq!(
            room.change_penalty(PenaltyName::Dnf),
            Some(Push::ChangePenalty {
                penalty: PenaltyName::Dnf
            })
        );
    }

    #[test]
    fn test_send_message_trims_and_skips_empty() {
        let (room, _clock) = session();
        assert_eq!(room.send_message("   "), None);
        assert_eq!(
            room.send_message(" gg "),
            Some(Push::SendMessage {
                message: "gg".to_string()
            })
        );
    }

    #[test]
    fn test_keyboard_time() {
        let (mut room, _clock) = session();
        assert_eq!(room.submit_keyboard_time("12.000").unwrap(), None);
        assert_eq!(room.cycle_time_entry(), TimeEntry::Keyboard);
        assert_eq!(
            room.submit_keyboard_time("1:02.345").unwrap(),
            Some(Push::NewSolve { time: 62_345 })
        );
        assert!(room.submit_keyboard_time("fast").is_err());
    }

    #[test]
    fn test_times_table_follows_presence() {
        let (mut room, _clock) = session();
        let entry = |id: i64, name: &str| {
            (
                id.to_string(),
                PresenceEntry {
                    user: User::new(UserId(id), name),
                    metas: Vec::new(),
                },
            )
        };
        room.handle_inbound(Inbound::PresenceState(PresenceMap::from([
            entry(6, "b"),
            entry(2, "a"),
        ])))
        .unwrap();
        room.handle_inbound(Inbound::SolveCreated(solve_by(6, 111, 5_000)))
            .unwrap();

        let rows = room.times_table();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["--", "5.000"]);
    }

    #[test]
    fn test_messages_and_errors_surface() {
        let (mut room, _clock) = session();
        room.handle_inbound(Inbound::MessageCreated(MessagePayload::new(
            1,
            "hi",
            UserPayload::new(2, "a", ""),
        )))
        .unwrap();
        assert_eq!(room.store().chat_lines()[0].display_line(), "a: hi");

        let bad = MessagePayload {
            user: None,
            ..MessagePayload::new(2, "x", UserPayload::new(2, "a", ""))
        };
        assert!(room.handle_inbound(Inbound::MessageCreated(bad)).is_err());
    }
}
