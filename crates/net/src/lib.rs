//! Timeroom Network Library
//!
//! Connects a client to a timing room.
//!
//! # Architecture
//!
//! - **Protocol**: `{"event", "payload"}` envelopes, length-prefixed JSON
//!   frames on the wire
//! - **RoomSession**: store, presence and timer for the local user
//! - **RoomLink**: background task pumping envelopes into a `RoomSession`
//!
//! # Usage
//!
//! ```ignore
//! let room = RoomSession::new(user_id, SystemClock::new(), &config);
//! let mut link = RoomLink::connect(addr, room).await?;
//!
//! link.input(InputSource::Manual, TimerEvent::Engage).await?;
//! while let Some(update) = link.next_update().await {
//!     match update {
//!         LinkUpdate::Applied { event } => { /* re-render */ }
//!         _ => {}
//!     }
//! }
//! ```

pub mod error;
mod frame;
pub mod link;
pub mod protocol;
pub mod room;

pub use error::{Error, Result};
pub use frame::{read_frame, write_frame};
pub use link::{LinkUpdate, RoomLink};
pub use protocol::{Inbound, Push};
pub use room::RoomSession;
