//! Data models for Timeroom
//!
//! Every entity is stored once and referenced by id. Nested copies only
//! exist in wire payloads (see `crate::payload`).

mod ids;
mod message;
mod session;
mod solve;
mod user;

pub use ids::*;
pub use message::*;
pub use session::*;
pub use solve::*;
pub use user::*;
