//! Apply a recorded event log to a room

use std::io::BufRead;

use timeroom_core::Clock;
use timeroom_net::{Inbound, Result, RoomSession};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

/// Feed every line of `reader` to the room. Bad lines are counted and
/// skipped; only read failures abort.
pub fn replay<R: BufRead, C: Clock>(
    reader: R,
    room: &mut RoomSession<C>,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event = match Inbound::from_bytes(line.as_bytes()) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping malformed envelope");
                summary.malformed += 1;
                continue;
            }
        };

        let name = event.name();
        match room.handle_inbound(event) {
            Ok(()) => {
                debug!(line = idx + 1, event = name, "Replayed");
                summary.applied += 1;
            }
            Err(e) => {
                warn!(line = idx + 1, event = name, error = %e, "Event rejected");
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}
