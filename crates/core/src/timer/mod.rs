//! Solve timing state machine
//!
//! `Timer` is driven by three kinds of input: [`TimerEvent`]s from the
//! manual or hardware adapters, [`Timer::poll`] when a scheduled deadline
//! is due, and the two guard flags. It never sleeps itself. Whoever owns
//! it asks [`Timer::next_deadline`] and calls `poll` at or after that
//! time.

mod clock;
mod entry;
mod input;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{parse_time_entry, TimeEntry};
pub use input::{gesture_event, Gesture, InputSource, Key};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::display::format_clock;

pub const DEFAULT_HOLD_THRESHOLD_MS: u64 = 500;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    Neutral,
    /// Held down, waiting out the hold threshold
    Preparing,
    /// Armed; releasing starts the solve
    Ready,
    Solving,
    Solved,
}

/// Input shared by the manual and hardware adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Engage,
    Release,
    /// Running time reported by the device
    HardwareTick(u64),
    /// Device stopped with its final time
    HardwareStop(u64),
    HardwareReset,
    /// The device stopped sending
    SignalLost,
}

/// Emitted once per solve when timing stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveStopped {
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerColor {
    Neutral,
    Preparing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub hold_threshold_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            hold_threshold_ms: DEFAULT_HOLD_THRESHOLD_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

#[derive(Debug)]
pub struct Timer<C: Clock> {
    clock: C,
    settings: TimerSettings,
    state: TimerState,
    elapsed_ms: u64,
    /// Clock reading the accumulator was last synced to
    mark_ms: Option<u64>,
    hold_deadline: Option<u64>,
    tick_deadline: Option<u64>,
    /// Lost the clock or device mid-solve; elapsed is frozen
    degraded: bool,
    input_focused: bool,
    has_current_solve: bool,
}

impl<C: Clock> Timer<C> {
    pub fn new(clock: C, settings: TimerSettings) -> Self {
        Self {
            clock,
            settings,
            state: TimerState::Neutral,
            elapsed_ms: 0,
            mark_ms: None,
            hold_deadline: None,
            tick_deadline: None,
            degraded: false,
            input_focused: false,
            has_current_solve: false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn has_current_solve(&self) -> bool {
        self.has_current_solve
    }

    /// Focus moved into (or out of) a text input. A hold in progress is
    /// abandoned.
    pub fn set_input_focused(&mut self, focused: bool) {
        self.input_focused = focused;
        if focused {
            self.abort_hold();
        }
    }

    /// Whether the local user already has a solve in the current round
    pub fn set_has_current_solve(&mut self, has_solve: bool) {
        self.has_current_solve = has_solve;
        if has_solve {
            self.abort_hold();
        }
    }

    /// Apply one input event. Returns the stop fact when this event ended
    /// a solve.
    pub fn handle(&mut self, event: TimerEvent) -> Option<SolveStopped> {
        match event {
            TimerEvent::Engage | TimerEvent::Release if self.blocked() => {
                trace!(?event, "Timer input ignored by guard");
                None
            }
            TimerEvent::Engage => self.engage(),
            TimerEvent::Release => {
                self.release();
                None
            }
            TimerEvent::HardwareTick(ms) => {
                self.hardware_tick(ms);
                None
            }
            TimerEvent::HardwareStop(ms) => self.hardware_stop(ms),
            TimerEvent::HardwareReset => {
                if self.state == TimerState::Solving {
                    warn!("Hardware reset while solving; ignoring");
                } else {
                    self.reset();
                }
                None
            }
            TimerEvent::SignalLost => {
                if self.state == TimerState::Solving && !self.degraded {
                    warn!(elapsed_ms = self.elapsed_ms, "Timing signal lost; freezing");
                    self.enter_degraded();
                }
                None
            }
        }
    }

    /// Fire whichever deadlines are due
    pub fn poll(&mut self) {
        let Some(now) = self.clock.now_ms() else {
            if self.state == TimerState::Solving && !self.degraded {
                warn!(elapsed_ms = self.elapsed_ms, "Clock unavailable; freezing");
                self.enter_degraded();
            }
            return;
        };

        self.arm_if_held(now);

        if let Some(deadline) = self.tick_deadline {
            if now >= deadline && self.state == TimerState::Solving {
                self.catch_up(now);
                self.tick_deadline = Some(now + self.settings.tick_interval_ms);
                trace!(elapsed_ms = self.elapsed_ms, "Tick");
            }
        }
    }

    /// Earliest pending deadline, in clock milliseconds
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.hold_deadline, self.tick_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Milliseconds until the next deadline is due; zero when overdue or
    /// when the clock cannot be read
    pub fn time_until_deadline(&self) -> Option<u64> {
        let deadline = self.next_deadline()?;
        Some(
            self.clock
                .now_ms()
                .map(|now| deadline.saturating_sub(now))
                .unwrap_or(0),
        )
    }

    /// Back to a zeroed `Neutral`, e.g. when the next round starts. Refused
    /// while a solve is running.
    pub fn reset(&mut self) -> bool {
        if self.state == TimerState::Solving {
            return false;
        }
        self.cancel_deadlines();
        self.state = TimerState::Neutral;
        self.elapsed_ms = 0;
        self.mark_ms = None;
        self.degraded = false;
        true
    }

    /// Show a time that is already recorded for the current round
    pub fn preset(&mut self, time_ms: u64) {
        if self.state == TimerState::Solving {
            warn!("Cannot preset a running timer");
            return;
        }
        self.cancel_deadlines();
        self.state = TimerState::Solved;
        self.elapsed_ms = time_ms;
        self.mark_ms = None;
        self.has_current_solve = true;
    }

    pub fn display(&self) -> String {
        format_clock(self.elapsed_ms, self.state == TimerState::Solving)
    }

    pub fn color(&self) -> TimerColor {
        match self.state {
            TimerState::Preparing => TimerColor::Preparing,
            TimerState::Ready => TimerColor::Ready,
            _ => TimerColor::Neutral,
        }
    }

    fn blocked(&self) -> bool {
        self.input_focused || self.has_current_solve
    }

    fn engage(&mut self) -> Option<SolveStopped> {
        match self.state {
            TimerState::Neutral => {
                let Some(now) = self.clock.now_ms() else {
                    warn!("Clock unavailable; cannot start a hold");
                    return None;
                };
                self.hold_deadline = Some(now + self.settings.hold_threshold_ms);
                self.state = TimerState::Preparing;
                debug!("Timer preparing");
                None
            }
            TimerState::Solving => Some(self.stop()),
            _ => None,
        }
    }

    fn arm_if_held(&mut self, now: u64) {
        if let Some(deadline) = self.hold_deadline {
            if now >= deadline && self.state == TimerState::Preparing {
                self.hold_deadline = None;
                self.elapsed_ms = 0;
                self.state = TimerState::Ready;
                debug!("Timer ready");
            }
        }
    }

    fn release(&mut self) {
        if let Some(now) = self.clock.now_ms() {
            self.arm_if_held(now);
        }
        match self.state {
            TimerState::Preparing => {
                self.hold_deadline = None;
                self.state = TimerState::Neutral;
                debug!("Released before hold threshold");
            }
            TimerState::Ready => self.start(),
            _ => {}
        }
    }

    fn start(&mut self) {
        self.state = TimerState::Solving;
        self.elapsed_ms = 0;
        match self.clock.now_ms() {
            Some(now) => {
                self.mark_ms = Some(now);
                self.tick_deadline = Some(now + self.settings.tick_interval_ms);
                self.degraded = false;
            }
            None => {
                warn!("Clock unavailable at start; waiting for an explicit stop");
                self.mark_ms = None;
                self.degraded = true;
            }
        }
        debug!("Timer started");
    }

    fn stop(&mut self) -> SolveStopped {
        if !self.degraded {
            match self.clock.now_ms() {
                Some(now) => self.catch_up(now),
                None => warn!("Clock unavailable at stop; using last elapsed"),
            }
        }
        self.finish()
    }

    fn hardware_tick(&mut self, ms: u64) {
        if self.state != TimerState::Solving {
            trace!(ms, state = ?self.state, "Hardware tick outside a solve");
            return;
        }
        self.elapsed_ms = ms;
        if let Some(now) = self.clock.now_ms() {
            self.mark_ms = Some(now);
        }
    }

    fn hardware_stop(&mut self, ms: u64) -> Option<SolveStopped> {
        if self.state != TimerState::Solving {
            debug!(ms, state = ?self.state, "Hardware stop outside a solve; ignoring");
            return None;
        }
        self.elapsed_ms = ms;
        Some(self.finish())
    }

    fn finish(&mut self) -> SolveStopped {
        self.cancel_deadlines();
        self.mark_ms = None;
        self.state = TimerState::Solved;
        debug!(elapsed_ms = self.elapsed_ms, degraded = self.degraded, "Timer stopped");
        SolveStopped {
            elapsed_ms: self.elapsed_ms,
        }
    }

    fn catch_up(&mut self, now: u64) {
        if let Some(mark) = self.mark_ms {
            self.elapsed_ms += now.saturating_sub(mark);
        }
        self.mark_ms = Some(now);
    }

    fn enter_degraded(&mut self) {
        self.degraded = true;
        self.tick_deadline = None;
        self.mark_ms = None;
    }

    fn abort_hold(&mut self) {
        if matches!(self.state, TimerState::Preparing | TimerState::Ready) {
            debug!(state = ?self.state, "Hold aborted");
            self.hold_deadline = None;
            self.state = TimerState::Neutral;
        }
    }

    fn cancel_deadlines(&mut self) {
        self.hold_deadline = None;
        self.tick_deadline = None;
    }
}
