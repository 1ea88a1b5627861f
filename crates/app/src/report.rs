//! Plain-text rendering of a room

use std::fmt::Write;

use timeroom_core::stats::averages_for;
use timeroom_core::{display_time, Clock, UserId};
use timeroom_net::RoomSession;

const COLUMN_WIDTH: usize = 12;

/// Header, times table, stats and chat as printable text
pub fn render<C: Clock>(room: &RoomSession<C>, stats_windows: &[usize]) -> String {
    let store = room.store();
    let mut out = String::new();

    let Some(session) = store.session() else {
        return "Not in a room\n".to_string();
    };

    let _ = writeln!(
        out,
        "{} ({})",
        session.name,
        store.puzzle_name().unwrap_or("unknown puzzle")
    );
    let _ = writeln!(out, "Scramble: {}", store.current_scramble().unwrap_or("--"));
    let _ = writeln!(out, "Timer: {}", room.timer().display());
    out.push('\n');

    let columns = columns(room);
    let _ = write!(out, "{:<8}", "Round");
    for (_, name) in &columns {
        let _ = write!(out, "{:<width$}", name, width = COLUMN_WIDTH);
    }
    out.push('\n');

    let ids: Vec<UserId> = columns.iter().map(|(id, _)| *id).collect();
    for row in store.times_table(&ids) {
        let _ = write!(out, "{:<8}", format!("#{}", row.number));
        for cell in &row.cells {
            let _ = write!(out, "{:<width$}", cell, width = COLUMN_WIDTH);
        }
        out.push('\n');
    }
    out.push('\n');

    for (n, average) in averages_for(store, room.user_id(), stats_windows) {
        let _ = writeln!(out, "ao{}: {}", n, display_time(average));
    }

    let chat = store.chat_lines();
    if !chat.is_empty() {
        out.push_str("\nChat\n");
        for line in chat {
            let _ = writeln!(out, "{}", line.display_line());
        }
    }

    out
}

/// Present users, or just the local user when presence is unknown
fn columns<C: Clock>(room: &RoomSession<C>) -> Vec<(UserId, String)> {
    let present = room.presence().users();
    if !present.is_empty() {
        return present
            .into_iter()
            .map(|u| (u.id, u.username.clone()))
            .collect();
    }

    let me = room.user_id();
    let name = room
        .store()
        .user(me)
        .map(|u| u.username.clone())
        .unwrap_or_else(|| format!("user {me}"));
    vec![(me, name)]
}
