//! Key events and what they do in the strip.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Left,
    Right,
    Up,
    Down,
    Delete,
    Enter,
    Escape,
    Other(u32),
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 1 << 1;
        const CTRL = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SnapRelative { delta: isize, cycle: bool },
    DismissCurrent,
    LaunchCurrent,
    ReturnHome,
}

/// Maps a key press to the same operations touch gestures produce.
pub fn action_for_key(event: KeyEvent, rtl: bool) -> Option<KeyAction> {
    let action = match event.key {
        Key::Tab => KeyAction::SnapRelative {
            delta: if event.modifiers.contains(Modifiers::SHIFT) {
                -1
            } else {
                1
            },
            cycle: event.modifiers.contains(Modifiers::ALT),
        },
        Key::Left => KeyAction::SnapRelative {
            delta: if rtl { 1 } else { -1 },
            cycle: false,
        },
        Key::Right => KeyAction::SnapRelative {
            delta: if rtl { -1 } else { 1 },
            cycle: false,
        },
        Key::Delete => KeyAction::DismissCurrent,
        Key::Enter => KeyAction::LaunchCurrent,
        Key::Escape => KeyAction::ReturnHome,
        Key::Up | Key::Down | Key::Other(_) => return None,
    };

    Some(action)
}
