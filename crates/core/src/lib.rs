//! Timeroom Core Library
//!
//! Entity models, the session synchronization store, solve statistics, and
//! the timing state machine with its manual and Stackmat input adapters.

pub mod config;
pub mod display;
pub mod error;
pub mod invariants;
pub mod models;
pub mod payload;
pub mod presence;
pub mod stackmat;
pub mod stats;
pub mod store;
pub mod timer;

pub use config::RoomConfig;
pub use display::{display_solve, display_time, format_clock};
pub use error::{Error, Result};
pub use models::*;
pub use payload::*;
pub use presence::{Presence, PresenceDiff, PresenceEntry, PresenceMap};
pub use stackmat::{Packet, PacketDecoder, PacketStatus, StackmatAdapter};
pub use stats::{actual_time, average_of_n, session_stats, user_time_series, SessionStats};
pub use store::{RoomStore, TimesRow};
pub use timer::{
    gesture_event, parse_time_entry, Clock, Gesture, InputSource, Key, ManualClock, SolveStopped,
    SystemClock, TimeEntry, Timer, TimerColor, TimerEvent, TimerSettings, TimerState,
};
