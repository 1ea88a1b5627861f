//! Room chat message model

use serde::{Deserialize, Serialize};

use super::{MessageId, User, UserId};

/// A chat message in a room. Append-only: never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub id: MessageId,
    pub user_id: UserId,
    pub text: String,
}

/// Message joined with its author for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLine<'a> {
    pub message: &'a RoomMessage,
    pub author: Option<&'a User>,
}

impl ChatLine<'_> {
    /// `username: message`, with `?` standing in for an unknown author
    pub fn display_line(&self) -> String {
        let name = self.author.map(|u| u.username.as_str()).unwrap_or("?");
        format!("{}: {}", name, self.message.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line() {
        let user = User::new(UserId(2), "testuser1");
        let message = RoomMessage {
            id: MessageId(82),
            user_id: UserId(2),
            text: "test message".to_string(),
        };
        let line = ChatLine {
            message: &message,
            author: Some(&user),
        };
        assert_eq!(line.display_line(), "testuser1: test message");

        let orphan = ChatLine {
            message: &message,
            author: None,
        };
        assert_eq!(orphan.display_line(), "?: test message");
    }
}
