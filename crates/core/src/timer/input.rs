//! Manual input adapter: keyboard and pointer gestures to timer events

use super::TimerEvent;

/// Where a timer event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Keyboard or pointer gestures
    Manual,
    Stackmat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    KeyDown(Key),
    KeyUp(Key),
    /// Touch or mouse press on the timer area
    PointerDown,
    PointerUp,
}

/// Map a gesture to the event the timer understands. Only the space bar and
/// the timer area drive the timer.
pub fn gesture_event(gesture: Gesture) -> Option<TimerEvent> {
    match gesture {
        Gesture::KeyDown(Key::Space) | Gesture::PointerDown => Some(TimerEvent::Engage),
        Gesture::KeyUp(Key::Space) | Gesture::PointerUp => Some(TimerEvent::Release),
        Gesture::KeyDown(Key::Other) | Gesture::KeyUp(Key::Other) => None,
    }
}
