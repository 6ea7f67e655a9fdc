//! Payload types shared by the input actions.

use serde::{Deserialize, Serialize};

/// Mouse button used by a `click` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Middle => f.write_str("middle"),
        }
    }
}

/// A point on the screen, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: u64,
    pub y: u64,
}

/// Key press with optional modifiers, as recorded by a `pressKeyboard` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCombination {
    pub hold_ctrl: bool,
    pub hold_shift: bool,
    pub hold_alt: bool,
    /// Platform key code of the pressed key.
    pub key_code: u64,
    /// Printable name of the key (`"a"`, `"Enter"`, `"F5"`, …).
    pub key_name: String,
}

impl KeyCombination {
    /// Key code sent between lines of a multi-line `write`.
    pub const ENTER_KEY_CODE: u64 = 13;

    /// A bare Enter key press.
    #[must_use]
    pub fn enter() -> Self {
        Self {
            hold_ctrl: false,
            hold_shift: false,
            hold_alt: false,
            key_code: Self::ENTER_KEY_CODE,
            key_name: "Enter".to_string(),
        }
    }

    /// Single-character keys are typed through their unicode value,
    /// everything else through the key code.
    #[must_use]
    pub fn use_unicode(&self) -> bool {
        self.key_name.chars().count() == 1
    }
}

impl std::fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hold_ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.hold_shift {
            f.write_str("Shift+")?;
        }
        if self.hold_alt {
            f.write_str("Alt+")?;
        }
        if self.use_unicode() {
            write!(f, "{}", self.key_name.to_uppercase())
        } else {
            f.write_str(&self.key_name)
        }
    }
}
