//! Key events from the text field

/// Keys the composer cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Backspace,
    Escape,
    Other,
}

/// A key press with the Shift modifier state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key, shift: bool) -> Self {
        Self { key, shift }
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter, false)
    }

    pub fn shift_enter() -> Self {
        Self::new(Key::Enter, true)
    }

    /// Enter without Shift submits; Shift+Enter inserts a newline
    pub fn is_submit(&self) -> bool {
        self.key == Key::Enter && !self.shift
    }
}

/// What the text field should do with a key press
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Suppress the field's default handling (newline insertion)
    pub prevent_default: bool,
    /// A message was handed to the host
    pub submitted: bool,
}
